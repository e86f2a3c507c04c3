//! Session Management
//!
//! 세션 관리: 트랜잭션 시작, 자동 커밋 실행, 북마크 체인

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::error::{DriverError, DriverResult};
use super::pool::ConnectionPool;
use super::query::{AccessMode, Bookmark, Query, QueryResult};
use super::stream::RecordStream;
use super::transaction::{BookmarkSlot, Transaction, TransactionConfig};
use super::types::Params;

// ============================================================================
// SessionConfig - 세션 설정
// ============================================================================

/// 세션 설정
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    /// PULL 당 레코드 수 (None 이면 클라이언트 기본값)
    pub fetch_size: Option<usize>,
    /// 기본 접근 모드
    pub default_access_mode: AccessMode,
    /// 시작 북마크
    pub bookmarks: Vec<Bookmark>,
}

impl SessionConfig {
    /// 기본 설정
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 시작
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// 읽기 세션 설정
    pub fn read() -> Self {
        Self::builder().with_read_access().build()
    }

    /// 쓰기 세션 설정
    pub fn write() -> Self {
        Self::builder().with_write_access().build()
    }
}

/// 세션 설정 빌더
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// 새 빌더
    pub fn new() -> Self {
        Self::default()
    }

    /// PULL 당 레코드 수 설정
    pub fn with_fetch_size(mut self, size: usize) -> Self {
        self.config.fetch_size = Some(size);
        self
    }

    /// 읽기 모드
    pub fn with_read_access(mut self) -> Self {
        self.config.default_access_mode = AccessMode::Read;
        self
    }

    /// 쓰기 모드
    pub fn with_write_access(mut self) -> Self {
        self.config.default_access_mode = AccessMode::Write;
        self
    }

    /// 북마크 목록 설정
    pub fn with_bookmarks(mut self, bookmarks: Vec<Bookmark>) -> Self {
        self.config.bookmarks = bookmarks;
        self
    }

    /// 북마크 추가
    pub fn with_bookmark(mut self, bookmark: Bookmark) -> Self {
        self.config.bookmarks.push(bookmark);
        self
    }

    /// 설정 빌드
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

// ============================================================================
// Session - 세션
// ============================================================================

/// 데이터베이스 세션
///
/// 세션은 연결을 쥐고 있지 않다. 트랜잭션이나 스트림이 필요할 때 풀에서
/// 빌려온다. 커밋마다 받은 북마크를 기억했다가 다음 BEGIN 에 넘긴다.
pub struct Session {
    /// 연결 풀
    pool: Arc<ConnectionPool>,
    /// 세션 설정
    config: SessionConfig,
    /// 실제 사용하는 PULL 크기
    fetch_size: usize,
    /// 마지막 커밋 북마크
    last_bookmark: BookmarkSlot,
    /// 열린 상태
    open: AtomicBool,
}

/// 관리형 실행에서 실패한 위치
struct ManagedFailure {
    index: Option<usize>,
    error: DriverError,
}

impl Session {
    /// 새 세션 생성
    pub(crate) fn new(
        pool: Arc<ConnectionPool>,
        config: SessionConfig,
        default_fetch_size: usize,
    ) -> DriverResult<Self> {
        let fetch_size = config.fetch_size.unwrap_or(default_fetch_size);
        if fetch_size == 0 {
            return Err(DriverError::configuration("Fetch size must be positive"));
        }

        Ok(Self {
            pool,
            config,
            fetch_size,
            last_bookmark: Arc::new(RwLock::new(None)),
            open: AtomicBool::new(true),
        })
    }

    /// 트랜잭션 시작 (세션 기본 접근 모드)
    pub async fn begin_transaction(
        &self,
        config: Option<TransactionConfig>,
    ) -> DriverResult<Transaction> {
        self.begin_with_mode(self.config.default_access_mode, config).await
    }

    /// 지정한 접근 모드로 트랜잭션 시작
    pub async fn begin_with_mode(
        &self,
        mode: AccessMode,
        config: Option<TransactionConfig>,
    ) -> DriverResult<Transaction> {
        self.ensure_open()?;

        let conn = self.pool.acquire().await?;
        let config = config.unwrap_or_default();
        let bookmarks = self.last_bookmarks();

        let tx = Transaction::begin(conn, mode, &bookmarks, &config, self.fetch_size).await?;
        Ok(tx.with_bookmark_slot(Arc::clone(&self.last_bookmark)))
    }

    /// 쿼리 실행 (auto-commit, 세션 기본 접근 모드)
    pub async fn run(
        &self,
        query: impl Into<Query>,
        params: Option<Params>,
    ) -> DriverResult<QueryResult> {
        let query = Query::prepare(query, params);
        self.run_managed(self.config.default_access_mode, query).await
    }

    /// 쿼리 하나를 자동 커밋 트랜잭션으로 실행
    pub(crate) async fn run_managed(&self, mode: AccessMode, query: Query) -> DriverResult<QueryResult> {
        self.execute_all(mode, vec![query])
            .await
            .map_err(|failure| failure.error)?
            .pop()
            .ok_or_else(|| DriverError::transaction_state("Query produced no result"))
    }

    /// 쿼리 목록을 하나의 자동 커밋 트랜잭션으로 실행
    ///
    /// 쿼리 하나라도 실패하면 전체가 롤백되고 `BatchFailure` 로 실패한다.
    pub(crate) async fn run_batch(
        &self,
        mode: AccessMode,
        queries: Vec<Query>,
    ) -> DriverResult<Vec<QueryResult>> {
        self.execute_all(mode, queries).await.map_err(|failure| match failure.index {
            Some(index) => DriverError::batch(index, failure.error),
            None => failure.error,
        })
    }

    async fn execute_all(
        &self,
        mode: AccessMode,
        queries: Vec<Query>,
    ) -> Result<Vec<QueryResult>, ManagedFailure> {
        let fail = |error| ManagedFailure { index: None, error };
        let mut tx = self.begin_with_mode(mode, None).await.map_err(fail)?;

        let mut results = Vec::with_capacity(queries.len());
        for (index, query) in queries.into_iter().enumerate() {
            // 실패한 쿼리는 트랜잭션을 롤백하고 연결을 반환한다
            match tx.run(query, None).await {
                Ok(result) => results.push(result),
                Err(error) => {
                    return Err(ManagedFailure {
                        index: Some(index),
                        error,
                    })
                }
            }
        }

        tx.commit().await.map_err(fail)?;
        Ok(results)
    }

    /// 읽기 트랜잭션에서 결과를 스트리밍
    pub async fn stream(
        &self,
        query: impl Into<Query>,
        params: Option<Params>,
    ) -> DriverResult<RecordStream> {
        let query = Query::prepare(query, params);
        let tx = self.begin_with_mode(AccessMode::Read, None).await?;
        RecordStream::open(tx, query, self.pool.config().log_leaks).await
    }

    /// 마지막 북마크
    pub fn last_bookmark(&self) -> Option<Bookmark> {
        self.last_bookmark.read().clone()
    }

    /// 다음 BEGIN 에 넘길 북마크
    pub fn last_bookmarks(&self) -> Vec<Bookmark> {
        match self.last_bookmark() {
            Some(bookmark) => vec![bookmark],
            None => self.config.bookmarks.clone(),
        }
    }

    /// 세션 닫기
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// 열린 상태 여부
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// 열린 상태 확인
    fn ensure_open(&self) -> DriverResult<()> {
        if self.pool.is_closed() {
            return Err(DriverError::ClientClosed);
        }
        if self.is_open() {
            Ok(())
        } else {
            Err(DriverError::transaction_state("Session is closed"))
        }
    }

    /// 세션 설정
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// PULL 크기
    pub fn fetch_size(&self) -> usize {
        self.fetch_size
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.config.default_access_mode)
            .field("fetch_size", &self.fetch_size)
            .field("open", &self.is_open())
            .field("last_bookmark", &self.last_bookmark())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
