//! Transaction API
//!
//! 트랜잭션 관리
//!
//! 트랜잭션은 연결 하나를 처음부터 끝까지 독점한다. 쿼리는 `&mut self` 로만
//! 보낼 수 있으므로 제출 순서대로 실행된다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::connection::{Transport, TransportState};
use super::error::{DriverError, DriverResult};
use super::pool::PooledConnection;
use super::query::{AccessMode, Bookmark, Query, QueryResult};
use super::record::{Keys, Record};
use super::summary::ResultSummary;
use super::types::{Params, Value};

/// 커밋 북마크를 세션과 공유하는 슬롯
pub(crate) type BookmarkSlot = Arc<RwLock<Option<Bookmark>>>;

// ============================================================================
// TransactionConfig - 트랜잭션 설정
// ============================================================================

/// 트랜잭션 설정
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionConfig {
    /// 타임아웃
    pub timeout: Option<Duration>,
    /// 메타데이터
    pub metadata: HashMap<String, Value>,
}

impl TransactionConfig {
    /// 기본 설정
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 시작
    pub fn builder() -> TransactionConfigBuilder {
        TransactionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// 트랜잭션 설정 빌더
#[derive(Debug, Clone)]
pub struct TransactionConfigBuilder {
    config: TransactionConfig,
}

impl TransactionConfigBuilder {
    /// 타임아웃 설정
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// 메타데이터 추가
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.metadata.insert(key.into(), value.into());
        self
    }

    /// 설정 빌드
    pub fn build(self) -> TransactionConfig {
        self.config
    }
}

// ============================================================================
// TransactionState - 트랜잭션 상태
// ============================================================================

/// 트랜잭션 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// 열림
    Open,
    /// 커밋됨
    Committed,
    /// 롤백됨
    RolledBack,
    /// 실패
    Failed,
}

impl TransactionState {
    /// 종료 상태 여부
    pub fn is_terminated(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// 한 번의 PULL 로 받은 레코드
pub(crate) struct PulledBatch {
    pub records: Vec<Record>,
    pub has_more: bool,
}

// ============================================================================
// Transaction - 트랜잭션
// ============================================================================

/// 명시적 트랜잭션
///
/// `commit` 또는 `rollback` 으로 끝내야 한다. 열린 채로 drop 하면 연결을 깨진
/// 것으로 보고 닫으며, 서버는 그 트랜잭션을 롤백한다.
pub struct Transaction {
    /// 연결 (종료 후 None)
    connection: Option<PooledConnection>,
    /// 접근 모드
    mode: AccessMode,
    /// PULL 당 레코드 수
    fetch_size: usize,
    /// 상태
    state: TransactionState,
    /// 커밋 북마크
    bookmark: Option<Bookmark>,
    /// 세션 북마크 슬롯
    session_bookmark: Option<BookmarkSlot>,
}

impl Transaction {
    /// 트랜잭션 시작 (BEGIN)
    ///
    /// BEGIN 이 실패하면 연결을 반환하고 에러를 돌려준다.
    pub(crate) async fn begin(
        mut connection: PooledConnection,
        mode: AccessMode,
        bookmarks: &[Bookmark],
        config: &TransactionConfig,
        fetch_size: usize,
    ) -> DriverResult<Self> {
        let result = match connection.transport() {
            Ok(transport) => transport.begin(mode, bookmarks, config).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            if e.is_connection_error() {
                connection.mark_broken();
            } else if let Ok(transport) = connection.transport() {
                let _ = transport.reset().await;
            }
            connection.release().await;
            return Err(e);
        }

        debug!(connection_id = connection.id(), ?mode, "Transaction started");
        Ok(Self {
            connection: Some(connection),
            mode,
            fetch_size,
            state: TransactionState::Open,
            bookmark: None,
            session_bookmark: None,
        })
    }

    pub(crate) fn with_bookmark_slot(mut self, slot: BookmarkSlot) -> Self {
        self.session_bookmark = Some(slot);
        self
    }

    /// 쿼리 실행 후 요약만 반환 (RUN + DISCARD)
    pub async fn query(
        &mut self,
        query: impl Into<Query>,
        params: Option<Params>,
    ) -> DriverResult<ResultSummary> {
        let query = Query::prepare(query, params);
        self.ensure_open()?;

        let result = async {
            let transport = self.transport()?;
            transport.run(&query).await?;
            transport.discard().await
        }
        .await;
        self.guard(result).await
    }

    /// 쿼리 실행 후 레코드 수집
    pub async fn read_query(&mut self, query: impl Into<Query>) -> DriverResult<Vec<Record>> {
        Ok(self.run(query, None).await?.records)
    }

    /// 쿼리 실행 후 키, 레코드, 요약 반환
    ///
    /// 레코드는 `fetch_size` 단위로 끌어온다.
    pub async fn run(
        &mut self,
        query: impl Into<Query>,
        params: Option<Params>,
    ) -> DriverResult<QueryResult> {
        let query = Query::prepare(query, params);
        self.ensure_open()?;

        let result = Self::collect(self.fetch_size, self.connection.as_mut(), &query).await;
        self.guard(result).await
    }

    async fn collect(
        fetch_size: usize,
        connection: Option<&mut PooledConnection>,
        query: &Query,
    ) -> DriverResult<QueryResult> {
        let transport = connection
            .ok_or_else(|| DriverError::transaction_state("No connection available"))?
            .transport()?;

        let run = transport.run(query).await?;
        let keys: Keys = Arc::from(run.keys);
        let mut records = Vec::new();
        loop {
            let batch = transport.pull(fetch_size).await?;
            for values in batch.records {
                records.push(Record::new(Arc::clone(&keys), values)?);
            }
            if !batch.has_more {
                let summary = batch.summary.unwrap_or_else(|| ResultSummary {
                    query_text: query.text.clone(),
                    ..ResultSummary::default()
                });
                return Ok(QueryResult {
                    keys,
                    records,
                    summary,
                });
            }
        }
    }

    /// 스트리밍 시작 (RUN 만 보내고 키 반환)
    pub(crate) async fn start_stream(&mut self, query: &Query) -> DriverResult<Keys> {
        self.ensure_open()?;
        let result = async {
            let run = self.transport()?.run(query).await?;
            Ok::<Keys, DriverError>(Arc::from(run.keys))
        }
        .await;
        self.guard(result).await
    }

    /// 스트리밍 중인 결과에서 한 배치 PULL
    pub(crate) async fn pull_batch(&mut self, keys: &Keys) -> DriverResult<PulledBatch> {
        self.ensure_open()?;
        let fetch_size = self.fetch_size;
        let result = async {
            let batch = self.transport()?.pull(fetch_size).await?;
            let records = batch
                .records
                .into_iter()
                .map(|values| Record::new(Arc::clone(keys), values))
                .collect::<DriverResult<Vec<_>>>()?;
            Ok::<_, DriverError>(PulledBatch {
                records,
                has_more: batch.has_more,
            })
        }
        .await;
        self.guard(result).await
    }

    /// 커밋
    ///
    /// 서버에서 실패해도 트랜잭션은 `Failed` 로 끝나고 연결은 반환된다.
    pub async fn commit(&mut self) -> DriverResult<()> {
        self.ensure_open()?;

        let result = async { self.transport()?.commit().await }.await;
        match result {
            Ok(bookmark) => {
                self.state = TransactionState::Committed;
                if let (Some(slot), Some(bm)) = (&self.session_bookmark, &bookmark) {
                    *slot.write() = Some(bm.clone());
                }
                self.bookmark = bookmark;
                self.finish(false).await;
                Ok(())
            }
            Err(e) => {
                self.state = TransactionState::Failed;
                self.finish(e.is_connection_error()).await;
                Err(e)
            }
        }
    }

    /// 롤백
    pub async fn rollback(&mut self) -> DriverResult<()> {
        self.ensure_open()?;

        let result = self.send_rollback().await;
        self.state = match result {
            Ok(()) => TransactionState::RolledBack,
            Err(_) => TransactionState::Failed,
        };
        self.finish(result.is_err()).await;
        result
    }

    /// 트랜잭션 닫기 (열려 있으면 롤백)
    pub async fn close(mut self) -> DriverResult<()> {
        if self.state.is_terminated() {
            return Ok(());
        }
        self.rollback().await
    }

    async fn send_rollback(&mut self) -> DriverResult<()> {
        let transport = self.transport()?;
        if transport.state() == TransportState::Streaming {
            transport.discard().await?;
        }
        transport.rollback().await
    }

    /// 쿼리 결과 처리: 실패면 트랜잭션을 끝내고 연결을 반환한다
    async fn guard<T>(&mut self, result: DriverResult<T>) -> DriverResult<T> {
        let error = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        self.state = TransactionState::Failed;
        let mut broken = error.is_connection_error();
        if !broken {
            if let Err(rollback_error) = self.send_rollback().await {
                warn!("Rollback after failed query did not succeed: {}", rollback_error);
                broken = true;
            }
        }
        self.finish(broken).await;
        Err(error)
    }

    async fn finish(&mut self, broken: bool) {
        if let Some(mut connection) = self.connection.take() {
            if broken {
                connection.mark_broken();
            }
            debug!(connection_id = connection.id(), state = ?self.state, "Transaction finished");
            connection.release().await;
        }
    }

    fn transport(&mut self) -> DriverResult<&mut dyn Transport> {
        self.connection
            .as_mut()
            .ok_or_else(|| DriverError::transaction_state("No connection available"))?
            .transport()
    }

    /// 열린 상태 확인
    fn ensure_open(&self) -> DriverResult<()> {
        match self.state {
            TransactionState::Open => Ok(()),
            TransactionState::Committed => {
                Err(DriverError::transaction_state("Transaction already committed"))
            }
            TransactionState::RolledBack => {
                Err(DriverError::transaction_state("Transaction already rolled back"))
            }
            TransactionState::Failed => {
                Err(DriverError::transaction_state("Transaction has failed"))
            }
        }
    }

    /// 트랜잭션 상태
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// PULL 당 레코드 수
    pub fn fetch_size(&self) -> usize {
        self.fetch_size
    }

    /// 접근 모드
    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    /// 커밋 북마크
    pub fn bookmark(&self) -> Option<&Bookmark> {
        self.bookmark.as_ref()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("connection", &self.connection.as_ref().map(PooledConnection::id))
            .finish()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            // 비동기 롤백이 불가능하므로 연결을 버려 서버가 롤백하게 한다
            debug!(connection_id = connection.id(), "Open transaction dropped");
            connection.mark_broken();
            drop(connection);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
