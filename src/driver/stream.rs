//! Record Stream
//!
//! 배압(backpressure)을 지원하는 레코드 스트림
//!
//! 백그라운드 태스크가 읽기 트랜잭션을 소유하고 `fetch_size` 단위로 PULL 한다.
//! 레코드는 용량이 `fetch_size` 인 채널을 거쳐 소비자에게 간다. 소비자가 읽지
//! 않으면 채널이 차고, 채널이 차면 다음 PULL 이 나가지 않는다.
//!
//! # Example
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let mut stream = client.query_stream("MATCH (n:Person) RETURN n", None).await?;
//! while let Some(record) = stream.next().await {
//!     println!("{}", record?);
//! }
//! ```

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Sink, SinkExt, Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::{DriverError, DriverResult};
use super::query::Query;
use super::record::{Keys, Record};
use super::transaction::Transaction;

// ============================================================================
// StreamState - 스트림 상태
// ============================================================================

/// 스트림 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// 레코드를 가져오는 중
    Streaming,
    /// 일시 정지 (PULL 중단)
    Paused,
    /// 모든 레코드를 가져옴
    Exhausted,
    /// 취소됨
    Cancelled,
    /// 에러로 종료
    Failed,
}

impl StreamState {
    /// 종료 상태 여부
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Cancelled | Self::Failed)
    }
}

type SharedState = Arc<Mutex<StreamState>>;

fn transition(state: &SharedState, next: StreamState) {
    let mut current = state.lock();
    if !current.is_terminal() {
        *current = next;
    }
}

// ============================================================================
// RecordStream - 레코드 스트림
// ============================================================================

/// 레코드 스트림
///
/// `futures::Stream<Item = DriverResult<Record>>` 를 구현한다. drop 하면 취소된다.
pub struct RecordStream {
    keys: Keys,
    receiver: ReceiverStream<DriverResult<Record>>,
    paused: watch::Sender<bool>,
    cancel: CancellationToken,
    state: SharedState,
    task: Option<JoinHandle<()>>,
    log_leaks: bool,
}

impl RecordStream {
    /// 열린 트랜잭션에서 쿼리를 시작하고 스트림 생성
    ///
    /// 키가 확정되면 바로 돌아온다. 레코드는 기다리지 않는다.
    pub(crate) async fn open(mut tx: Transaction, query: Query, log_leaks: bool) -> DriverResult<Self> {
        let keys = tx.start_stream(&query).await?;
        let capacity = tx.fetch_size();

        let (sender, receiver) = mpsc::channel(capacity);
        let (paused, paused_rx) = watch::channel(false);
        let cancel = CancellationToken::new();
        let state = Arc::new(Mutex::new(StreamState::Streaming));

        let producer = Producer {
            tx,
            keys: Arc::clone(&keys),
            sender,
            paused: paused_rx,
            cancel: cancel.clone(),
            state: Arc::clone(&state),
        };
        let task = tokio::spawn(producer.run());

        debug!(query = %query, fetch_size = capacity, "Record stream opened");
        Ok(Self {
            keys,
            receiver: ReceiverStream::new(receiver),
            paused,
            cancel,
            state,
            task: Some(task),
            log_leaks,
        })
    }

    /// 컬럼 키
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 현재 상태
    pub fn state(&self) -> StreamState {
        *self.state.lock()
    }

    /// 다음 레코드
    pub async fn next_record(&mut self) -> Option<DriverResult<Record>> {
        self.next().await
    }

    /// 남은 레코드를 모두 수집 (첫 에러에서 중단)
    pub async fn try_collect(mut self) -> DriverResult<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(item) = self.next().await {
            records.push(item?);
        }
        Ok(records)
    }

    /// PULL 일시 정지
    ///
    /// 진행 중인 PULL 은 끝까지 받는다. 이미 받은 레코드는 계속 읽을 수 있다.
    pub fn pause(&self) {
        transition(&self.state, StreamState::Paused);
        self.paused.send_replace(true);
    }

    /// PULL 재개
    pub fn resume(&self) {
        {
            let mut current = self.state.lock();
            if *current == StreamState::Paused {
                *current = StreamState::Streaming;
            }
        }
        self.paused.send_replace(false);
    }

    /// 스트림 취소
    ///
    /// 남은 결과를 버리고 읽기 트랜잭션을 롤백한 뒤 연결을 반환한다.
    /// 반환 후에는 스트림 끝이 보인다.
    pub async fn cancel(&mut self) {
        transition(&self.state, StreamState::Cancelled);
        self.cancel.cancel();
        self.receiver.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Record stream producer ended abnormally: {}", e);
            }
        }
    }

    /// Sink 로 모든 레코드를 보낸다
    ///
    /// Sink 가 준비되지 않으면 소비가 멈추고, 따라서 PULL 도 멈춘다.
    /// 모든 레코드가 받아들여지고 Sink 가 닫히면 완료된다.
    /// Sink 가 실패하면 스트림을 취소하고 `StreamCancelled` 로 실패한다.
    pub async fn pipe_to<S>(mut self, mut sink: S) -> DriverResult<()>
    where
        S: Sink<Record> + Unpin,
        S::Error: fmt::Display,
    {
        while let Some(item) = self.next().await {
            let record = item?;
            if let Err(e) = sink.feed(record).await {
                self.cancel().await;
                return Err(DriverError::stream_cancelled(format!("Sink rejected a record: {}", e)));
            }
        }

        if let Err(e) = sink.close().await {
            return Err(DriverError::stream_cancelled(format!("Sink failed to close: {}", e)));
        }
        Ok(())
    }
}

impl Stream for RecordStream {
    type Item = DriverResult<Record>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.receiver.poll_next_unpin(cx)
    }
}

impl fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStream")
            .field("keys", &self.keys)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        if self.log_leaks && !self.state().is_terminal() {
            warn!(keys = ?self.keys, "Record stream dropped before it was consumed; cancelling it");
        }
        transition(&self.state, StreamState::Cancelled);
        self.cancel.cancel();
    }
}

// ============================================================================
// Producer - PULL 태스크
// ============================================================================

struct Producer {
    tx: Transaction,
    keys: Keys,
    sender: mpsc::Sender<DriverResult<Record>>,
    paused: watch::Receiver<bool>,
    cancel: CancellationToken,
    state: SharedState,
}

impl Producer {
    async fn run(mut self) {
        match self.pump().await {
            Ok(true) => self.finish_exhausted().await,
            Ok(false) => self.finish_cancelled().await,
            Err(e) => {
                // 실패한 PULL 은 트랜잭션이 이미 정리했다
                transition(&self.state, StreamState::Failed);
                let _ = self.sender.send(Err(e)).await;
            }
        }
    }

    /// 끝까지 읽으면 `Ok(true)`, 취소되면 `Ok(false)`
    async fn pump(&mut self) -> DriverResult<bool> {
        loop {
            if !self.wait_while_paused().await {
                return Ok(false);
            }

            let batch = self.tx.pull_batch(&self.keys).await?;
            if self.cancel.is_cancelled() {
                return Ok(false);
            }

            for record in batch.records {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Ok(false),
                    sent = self.sender.send(Ok(record)) => {
                        if sent.is_err() {
                            return Ok(false);
                        }
                    }
                }
            }

            if !batch.has_more {
                return Ok(true);
            }
        }
    }

    /// 정지 상태면 재개나 취소를 기다린다. 취소되면 false.
    async fn wait_while_paused(&mut self) -> bool {
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            let paused = *self.paused.borrow_and_update();
            if !paused {
                return true;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                changed = self.paused.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    async fn finish_exhausted(&mut self) {
        match self.tx.commit().await {
            Ok(()) => transition(&self.state, StreamState::Exhausted),
            Err(e) => {
                transition(&self.state, StreamState::Failed);
                let _ = self.sender.send(Err(e)).await;
            }
        }
    }

    async fn finish_cancelled(&mut self) {
        transition(&self.state, StreamState::Cancelled);
        if self.tx.state().is_terminated() {
            return;
        }
        if let Err(e) = self.tx.rollback().await {
            warn!("Rollback of cancelled stream failed: {}", e);
        }
        debug!("Record stream cancelled");
    }
}

// ============================================================================
// Tests
// ============================================================================
