//! Neo4j Client
//!
//! 클라이언트 파사드: 풀, 세션, 스트림을 하나의 진입점으로 묶는다.
//!
//! # 예제
//!
//! ```rust,ignore
//! use neo4j_async_client::driver::{ClientOptions, MemoryConnector, MemoryDatabase, Neo4jClient};
//!
//! let db = MemoryDatabase::new();
//! let client = Neo4jClient::connect(ClientOptions::default(), MemoryConnector::new(db)).await?;
//!
//! let people = client.find("MATCH (p:Person) RETURN p.name AS name", None).await?;
//! client.close().await?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::callback::OnComplete;
use super::connection::{ConnectContext, Connector};
use super::error::{DriverError, DriverResult};
use super::options::ClientOptions;
use super::pool::{ConnectionPool, PoolMetrics};
use super::query::{AccessMode, Query, QueryResult};
use super::record::Record;
use super::session::{Session, SessionConfig};
use super::stream::RecordStream;
use super::summary::{Counters, ResultSummary};
use super::transaction::Transaction;
use super::types::Params;

/// 공유 클라이언트 기본 이름
pub const DEFAULT_POOL_NAME: &str = "DEFAULT_NEO4J_POOL";

// ============================================================================
// Shared registry - 이름 붙은 공유 풀
// ============================================================================

struct SharedEntry {
    inner: Arc<ClientInner>,
    ref_count: usize,
}

fn shared_clients() -> &'static Mutex<HashMap<String, SharedEntry>> {
    static SHARED: OnceLock<Mutex<HashMap<String, SharedEntry>>> = OnceLock::new();
    SHARED.get_or_init(|| Mutex::new(HashMap::new()))
}

// ============================================================================
// Neo4jClient - 클라이언트
// ============================================================================

struct ClientInner {
    options: ClientOptions,
    pool: Arc<ConnectionPool>,
    shared_name: Option<String>,
    operations: AtomicU64,
    failed_operations: AtomicU64,
    streams_opened: AtomicU64,
}

/// Neo4j 비동기 클라이언트
///
/// 복제는 같은 풀을 가리키는 핸들을 하나 더 만든다. 핸들은 동시에 써도 안전하다.
/// 공유 클라이언트(`create_shared`)는 이름별 참조 카운트를 가지며 마지막 핸들이
/// 닫힐 때 풀이 닫힌다.
#[derive(Clone)]
pub struct Neo4jClient {
    inner: Arc<ClientInner>,
    closed: Arc<AtomicBool>,
}

impl Neo4jClient {
    /// 새 클라이언트 생성 (연결은 첫 작업 때 열린다)
    pub fn new(options: ClientOptions, connector: impl Connector + 'static) -> DriverResult<Self> {
        let inner = Self::build_inner(options, Arc::new(connector), None)?;
        Ok(Self::from_inner(inner))
    }

    /// 클라이언트 생성 후 연결 확인
    pub async fn connect(options: ClientOptions, connector: impl Connector + 'static) -> DriverResult<Self> {
        let client = Self::new(options, connector)?;
        if let Err(e) = client.verify_connectivity().await {
            client.inner.pool.close().await;
            return Err(e);
        }
        Ok(client)
    }

    /// 이름으로 공유되는 클라이언트
    ///
    /// 같은 이름이 이미 있으면 그 풀을 재사용하고 `options` 는 무시된다.
    pub fn create_shared(
        name: impl Into<String>,
        options: ClientOptions,
        connector: impl Connector + 'static,
    ) -> DriverResult<Self> {
        let name = name.into();
        let mut registry = shared_clients().lock();

        if let Some(entry) = registry.get_mut(&name) {
            entry.ref_count += 1;
            debug!(name = %name, ref_count = entry.ref_count, "Reusing shared client");
            return Ok(Self::from_inner(Arc::clone(&entry.inner)));
        }

        let inner = Self::build_inner(options, Arc::new(connector), Some(name.clone()))?;
        registry.insert(
            name,
            SharedEntry {
                inner: Arc::clone(&inner),
                ref_count: 1,
            },
        );
        Ok(Self::from_inner(inner))
    }

    fn from_inner(inner: Arc<ClientInner>) -> Self {
        Self {
            inner,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn build_inner(
        options: ClientOptions,
        connector: Arc<dyn Connector>,
        shared_name: Option<String>,
    ) -> DriverResult<Arc<ClientInner>> {
        options.validate()?;
        debug!(options = ?options, "Creating Neo4j client");

        if options.is_cluster_mode() {
            info!(nodes = ?options.cluster_node_uris, "Using cluster mode");
        } else {
            info!(uri = %options.single_node_uri(), "Using single node mode");
        }

        let addresses = options.addresses()?;
        let context = ConnectContext {
            address: addresses[0].clone(),
            auth: options.auth_options.auth_token(),
            encryption: options.encrypted.then(|| options.encryption_options.clone()),
            user_agent: options.user_agent.clone(),
        };
        let pool = ConnectionPool::new(addresses, context, connector, options.pool_config())?;

        Ok(Arc::new(ClientInner {
            options,
            pool: Arc::new(pool),
            shared_name,
            operations: AtomicU64::new(0),
            failed_operations: AtomicU64::new(0),
            streams_opened: AtomicU64::new(0),
        }))
    }

    /// 세션 생성
    pub fn session(&self, config: SessionConfig) -> DriverResult<Session> {
        self.ensure_open()?;
        Session::new(Arc::clone(&self.inner.pool), config, self.inner.options.fetch_size)
    }

    /// 쓰기 트랜잭션 시작
    pub async fn begin(&self) -> DriverResult<Transaction> {
        self.track(async {
            self.session(SessionConfig::write())?
                .begin_transaction(None)
                .await
        })
        .await
    }

    /// 쓰기 쿼리 실행 (레코드와 요약)
    pub async fn query(&self, query: impl Into<Query>, params: Option<Params>) -> DriverResult<QueryResult> {
        let query = Query::prepare(query, params);
        self.track(self.run_implicit(AccessMode::Write, query)).await
    }

    /// 쓰기 쿼리 실행 (요약만)
    pub async fn execute(&self, query: impl Into<Query>, params: Option<Params>) -> DriverResult<ResultSummary> {
        let query = Query::prepare(query, params);
        self.track(async {
            self.run_implicit(AccessMode::Write, query)
                .await
                .map(|result| result.summary)
        })
        .await
    }

    /// 레코드 하나만 조회
    ///
    /// 0 개면 `NoResult`, 둘 이상이면 `MultipleResults`.
    pub async fn find_one(&self, query: impl Into<Query>, params: Option<Params>) -> DriverResult<Record> {
        let query = Query::prepare(query, params);
        self.track(async { self.run_implicit(AccessMode::Read, query).await?.single() })
            .await
    }

    /// 레코드 전체 조회
    pub async fn find(&self, query: impl Into<Query>, params: Option<Params>) -> DriverResult<Vec<Record>> {
        let query = Query::prepare(query, params);
        self.track(async {
            self.run_implicit(AccessMode::Read, query)
                .await
                .map(|result| result.records)
        })
        .await
    }

    /// 삭제 쿼리 실행
    pub async fn delete(&self, query: impl Into<Query>, params: Option<Params>) -> DriverResult<Vec<Record>> {
        let query = Query::prepare(query, params);
        self.track(async {
            self.run_implicit(AccessMode::Write, query)
                .await
                .map(|result| result.records)
        })
        .await
    }

    /// 쿼리 목록을 하나의 트랜잭션으로 실행하고 카운터 합산
    ///
    /// 하나라도 실패하면 전체가 롤백되고 `BatchFailure { index, .. }` 로 실패한다.
    pub async fn bulk_write(&self, queries: Vec<Query>) -> DriverResult<Counters> {
        self.track(async {
            let session = self.session(SessionConfig::write())?;
            let results = session.run_batch(AccessMode::Write, queries).await?;
            Ok::<Counters, DriverError>(results.iter().map(|r| r.summary.counters).sum())
        })
        .await
    }

    /// 결과 스트리밍 (읽기 트랜잭션)
    pub async fn query_stream(&self, query: impl Into<Query>, params: Option<Params>) -> DriverResult<RecordStream> {
        self.track(async {
            let stream = self.session(SessionConfig::read())?.stream(query, params).await?;
            self.inner.streams_opened.fetch_add(1, Ordering::Relaxed);
            Ok::<_, DriverError>(stream)
        })
        .await
    }

    /// 연결 확인
    pub async fn verify_connectivity(&self) -> DriverResult<()> {
        self.ensure_open()?;
        self.inner.pool.verify_connectivity().await
    }

    /// 콜백 형태로 작업 실행
    ///
    /// `op` 은 클라이언트 핸들을 소유한 채 실행되고 결과는 `handler` 로 한 번 전달된다.
    pub fn with_callback<T, Op, Fut, H>(&self, op: Op, handler: H) -> JoinHandle<()>
    where
        Op: FnOnce(Neo4jClient) -> Fut,
        Fut: Future<Output = DriverResult<T>> + Send + 'static,
        T: Send + 'static,
        H: FnOnce(DriverResult<T>) + Send + 'static,
    {
        op(self.clone()).on_complete(handler)
    }

    /// 클라이언트 종료
    ///
    /// 공유 클라이언트는 참조 카운트가 0 이 될 때만 풀을 닫는다.
    pub async fn close(&self) -> DriverResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(name) = &self.inner.shared_name {
            let last = {
                let mut registry = shared_clients().lock();
                match registry.get_mut(name) {
                    Some(entry) if Arc::ptr_eq(&entry.inner, &self.inner) => {
                        entry.ref_count -= 1;
                        if entry.ref_count == 0 {
                            registry.remove(name);
                            true
                        } else {
                            false
                        }
                    }
                    _ => false,
                }
            };
            if !last {
                debug!(name = %name, "Released shared client handle");
                return Ok(());
            }
        }

        self.inner.pool.close().await;
        Ok(())
    }

    /// 닫힘 여부
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.inner.pool.is_closed()
    }

    /// 클라이언트 설정
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// 메트릭 조회 (메트릭이 꺼져 있으면 None)
    pub fn metrics(&self) -> Option<ClientMetrics> {
        if !self.inner.options.metrics_enabled {
            return None;
        }
        Some(ClientMetrics {
            pool: self.inner.pool.metrics(),
            operations: self.inner.operations.load(Ordering::Relaxed),
            failed_operations: self.inner.failed_operations.load(Ordering::Relaxed),
            streams_opened: self.inner.streams_opened.load(Ordering::Relaxed),
        })
    }

    async fn run_implicit(&self, mode: AccessMode, query: Query) -> DriverResult<QueryResult> {
        let session = self.session(SessionConfig::new())?;
        session.run_managed(mode, query).await
    }

    async fn track<T>(&self, operation: impl Future<Output = DriverResult<T>>) -> DriverResult<T> {
        self.ensure_open()?;
        self.inner.operations.fetch_add(1, Ordering::Relaxed);
        let result = operation.await;
        if result.is_err() {
            self.inner.failed_operations.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.is_closed() {
            Err(DriverError::ClientClosed)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for Neo4jClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jClient")
            .field("addresses", &self.inner.pool.addresses())
            .field("shared_name", &self.inner.shared_name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// 설정의 이벤트 루프 스레드 수로 멀티 스레드 런타임 생성
pub fn build_runtime(options: &ClientOptions) -> DriverResult<Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if options.event_loop_threads > 0 {
        builder.worker_threads(options.event_loop_threads);
    }
    Ok(builder.enable_time().thread_name("neo4j-client").build()?)
}

// ============================================================================
// ClientMetrics - 클라이언트 메트릭
// ============================================================================

/// 클라이언트 메트릭
#[derive(Debug, Clone, Default)]
pub struct ClientMetrics {
    /// 연결 풀 메트릭
    pub pool: PoolMetrics,
    /// 실행한 작업 수
    pub operations: u64,
    /// 실패한 작업 수
    pub failed_operations: u64,
    /// 열린 스트림 수
    pub streams_opened: u64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;

    use super::*;
    use crate::driver::memory::fixtures::*;
    use crate::driver::memory::{MemoryConnector, MemoryDatabase};
    use crate::driver::options::AuthOptions;
    use crate::driver::types::Value;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn options() -> ClientOptions {
        ClientOptions::builder()
            .with_max_connection_pool_size(4)
            .with_fetch_size(100)
            .build()
            .unwrap()
    }

    fn client(db: &MemoryDatabase, options: ClientOptions) -> Neo4jClient {
        Neo4jClient::new(options, MemoryConnector::new(db.clone())).unwrap()
    }

    fn count(n: i64) -> Params {
        let mut params = Params::new();
        params.insert("count".into(), Value::from(n));
        params
    }

    #[tokio::test]
    async fn test_construct_and_close_leaves_no_connections() {
        init_tracing();
        let db = people_database();
        let client = Neo4jClient::connect(options(), MemoryConnector::new(db.clone()))
            .await
            .unwrap();
        client.execute(CREATE_PERSON, Some(name("Ann"))).await.unwrap();
        assert!(db.open_connections() > 0);

        client.close().await.unwrap();
        assert_eq!(db.open_connections(), 0);
        assert!(client.is_closed());
    }

    #[tokio::test]
    async fn test_operations_after_close_fail() {
        let db = people_database();
        let client = client(&db, options());
        client.close().await.unwrap();

        assert!(matches!(client.find(LIST_PEOPLE, None).await, Err(DriverError::ClientClosed)));
        assert!(matches!(client.begin().await, Err(DriverError::ClientClosed)));
        assert!(matches!(client.session(SessionConfig::new()), Err(DriverError::ClientClosed)));
        assert!(matches!(
            client.query_stream(RANGE, Some(count(3))).await,
            Err(DriverError::ClientClosed)
        ));
        // 두 번 닫아도 된다
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_fails_waiting_operations() {
        init_tracing();
        let db = people_database();
        let client = client(&db, ClientOptions::builder().with_max_connection_pool_size(1).build().unwrap());

        let mut tx = client.begin().await.unwrap();
        let waiter = {
            let client = client.clone();
            tokio::spawn(async move { client.find(LIST_PEOPLE, None).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        client.close().await.unwrap();
        assert!(matches!(waiter.await.unwrap(), Err(DriverError::ClientClosed)));

        tx.rollback().await.unwrap();
        assert_eq!(db.open_connections(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquisition_timeout() {
        let db = people_database();
        let options = ClientOptions::builder()
            .with_max_connection_pool_size(1)
            .with_connection_acquisition_timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let client = client(&db, options);

        let _tx = client.begin().await.unwrap();
        let result = client.find(LIST_PEOPLE, None).await;
        assert!(matches!(
            result,
            Err(DriverError::ConnectionAcquisitionTimeout(d)) if d == Duration::from_secs(2)
        ));
    }

    #[tokio::test]
    async fn test_find_one() {
        let db = people_database();
        let client = client(&db, options());

        let result = client.find_one(FIND_PERSON, Some(name("Ann"))).await;
        assert!(matches!(result, Err(DriverError::NoResult)));

        client.execute(CREATE_PERSON, Some(name("Ann"))).await.unwrap();
        let record = client.find_one(FIND_PERSON, Some(name("Ann"))).await.unwrap();
        assert_eq!(record.keys(), ["name".to_string()]);
        assert_eq!(record.get_string("name").unwrap(), "Ann");

        client.execute(CREATE_PERSON, Some(name("Bob"))).await.unwrap();
        let result = client.find_one(LIST_PEOPLE, None).await;
        assert!(matches!(result, Err(DriverError::MultipleResults(2))));
    }

    #[tokio::test]
    async fn test_query_execute_delete() {
        let db = people_database();
        let client = client(&db, options());

        let result = client.query(CREATE_PERSON, Some(name("Ann"))).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.summary.counters.nodes_created, 1);

        let summary = client.execute(CREATE_PERSON, Some(name("Bob"))).await.unwrap();
        assert_eq!(summary.counters.labels_added, 1);
        assert_eq!(client.find(LIST_PEOPLE, None).await.unwrap().len(), 2);

        let deleted = client.delete(DELETE_PERSON, Some(name("Ann"))).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(db.count_label("Person"), 1);

        // 실패해도 연결은 반환된다
        let result = client.execute(CREATE_PERSON, Some(name("Bob"))).await;
        assert_eq!(result.unwrap_err().code(), Some("Neo.ClientError.Schema.ConstraintValidationFailed"));
        assert!(db.open_connections() <= 4);
        let metrics = client.inner.pool.metrics();
        assert_eq!(metrics.in_use, 0);
    }

    #[tokio::test]
    async fn test_bulk_write_failure_rolls_back_everything() {
        let db = people_database();
        let client = client(&db, options());

        let queries = vec![
            Query::new(CREATE_PERSON).with_params(name("Ann")),
            Query::new(CREATE_PERSON).with_params(name("Ann")),
            Query::new(CREATE_PERSON).with_params(name("Bob")),
        ];
        match client.bulk_write(queries).await {
            Err(DriverError::BatchFailure { index, source }) => {
                assert_eq!(index, 1);
                assert_eq!(source.code(), Some("Neo.ClientError.Schema.ConstraintValidationFailed"));
            }
            other => panic!("Expected BatchFailure, got {:?}", other),
        }
        assert_eq!(db.count_label("Person"), 0);
        assert_eq!(client.inner.pool.in_use_count(), 0);
    }

    #[tokio::test]
    async fn test_bulk_write_aggregates_counters() {
        let db = people_database();
        let client = client(&db, options());

        let counters = client
            .bulk_write(vec![
                Query::new(CREATE_PERSON).with_params(name("Ann")),
                Query::new(CREATE_PERSON).with_params(name("Bob")),
                Query::new(DELETE_PERSON).with_params(name("Ann")),
            ])
            .await
            .unwrap();

        assert_eq!(counters.nodes_created, 2);
        assert_eq!(counters.properties_set, 2);
        assert_eq!(counters.nodes_deleted, 1);
        assert_eq!(db.count_label("Person"), 1);

        assert_eq!(client.bulk_write(Vec::new()).await.unwrap(), Counters::default());
    }

    #[tokio::test]
    async fn test_query_stream_large_result() {
        let db = people_database();
        let client = client(&db, options());

        let mut stream = client.query_stream(RANGE, Some(count(10_000))).await.unwrap();
        assert_eq!(stream.keys(), ["i".to_string()]);

        let mut expected = 1;
        while let Some(record) = stream.next().await {
            assert_eq!(record.unwrap().get_int("i").unwrap(), expected);
            expected += 1;
        }
        assert_eq!(expected, 10_001);

        let pulls = db.stats().pull_requests;
        assert!((100..=101).contains(&pulls), "pulls = {}", pulls);
        assert_eq!(client.inner.pool.in_use_count(), 0);
    }

    #[tokio::test]
    async fn test_transaction_read_your_writes() {
        let db = people_database();
        let client = client(&db, options());

        let mut tx = client.begin().await.unwrap();
        tx.query(CREATE_PERSON, Some(name("Ann"))).await.unwrap();
        let inside = tx.read_query(LIST_PEOPLE).await.unwrap();
        assert_eq!(inside.len(), 1);
        assert_eq!(client.find(LIST_PEOPLE, None).await.unwrap().len(), 0);

        tx.commit().await.unwrap();
        assert_eq!(client.find(LIST_PEOPLE, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shared_client_ref_count() {
        init_tracing();
        let db = people_database();
        let name_a = "test-shared-ref-count";

        let first = Neo4jClient::create_shared(name_a, options(), MemoryConnector::new(db.clone())).unwrap();
        let second = Neo4jClient::create_shared(name_a, options(), MemoryConnector::new(db.clone())).unwrap();
        assert!(Arc::ptr_eq(&first.inner, &second.inner));

        first.close().await.unwrap();
        assert!(matches!(first.find(LIST_PEOPLE, None).await, Err(DriverError::ClientClosed)));
        assert!(second.find(LIST_PEOPLE, None).await.is_ok());

        second.close().await.unwrap();
        assert!(second.is_closed());
        assert_eq!(db.open_connections(), 0);

        let third = Neo4jClient::create_shared(name_a, options(), MemoryConnector::new(db.clone())).unwrap();
        assert!(!Arc::ptr_eq(&third.inner, &second.inner));
        assert!(third.find(LIST_PEOPLE, None).await.is_ok());
        third.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics() {
        let db = people_database();
        let disabled = client(&db, options());
        assert!(disabled.metrics().is_none());

        let enabled = client(
            &db,
            ClientOptions::builder().with_metrics_enabled(true).build().unwrap(),
        );
        enabled.execute(CREATE_PERSON, Some(name("Ann"))).await.unwrap();
        let _ = enabled.execute(CREATE_PERSON, Some(name("Ann"))).await;
        enabled.query_stream(RANGE, Some(count(3))).await.unwrap().try_collect().await.unwrap();

        let metrics = enabled.metrics().unwrap();
        assert_eq!(metrics.operations, 3);
        assert_eq!(metrics.failed_operations, 1);
        assert_eq!(metrics.streams_opened, 1);
        assert_eq!(metrics.pool.in_use, 0);
        assert!(metrics.pool.total_acquisitions >= 3);
    }

    #[tokio::test]
    async fn test_connect_unavailable() {
        let db = people_database();
        db.set_unavailable(true);

        let result = Neo4jClient::connect(options(), MemoryConnector::new(db.clone())).await;
        assert!(matches!(result, Err(DriverError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_connect_wrong_credentials() {
        let db = people_database();
        db.require_credentials("neo4j", "secret");

        let wrong = ClientOptions::builder()
            .with_auth(AuthOptions::basic("neo4j", "wrong"))
            .build()
            .unwrap();
        let result = Neo4jClient::connect(wrong, MemoryConnector::new(db.clone())).await;
        assert!(matches!(result, Err(DriverError::Authentication(_))));

        let right = ClientOptions::builder()
            .with_auth(AuthOptions::basic("neo4j", "secret"))
            .build()
            .unwrap();
        let client = Neo4jClient::connect(right, MemoryConnector::new(db)).await.unwrap();
        client.close().await.unwrap();
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut options = ClientOptions::default();
        options.fetch_size = 0;
        let result = Neo4jClient::new(options, MemoryConnector::new(MemoryDatabase::new()));
        assert!(matches!(result, Err(DriverError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_with_callback() {
        let db = people_database();
        let client = client(&db, options());
        let (tx, rx) = tokio::sync::oneshot::channel();

        client
            .with_callback(
                |c| async move { c.execute(CREATE_PERSON, Some(name("Ann"))).await },
                move |result| {
                    let _ = tx.send(result.map(|summary| summary.counters.nodes_created));
                },
            )
            .await
            .unwrap();

        assert_eq!(rx.await.unwrap().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_clones() {
        let db = people_database();
        let client = client(&db, options());

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let client = client.clone();
                tokio::spawn(async move {
                    let person = format!("person-{}", i);
                    client.execute(CREATE_PERSON, Some(name(&person))).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(db.count_label("Person"), 20);
        assert!(db.stats().total_connections <= 4);
        client.close().await.unwrap();
    }

    #[test]
    fn test_build_runtime() {
        let options = ClientOptions::builder().with_event_loop_threads(2).build().unwrap();
        let runtime = build_runtime(&options).unwrap();

        let db = people_database();
        let found = runtime.block_on(async {
            let client = Neo4jClient::new(options.clone(), MemoryConnector::new(db.clone()))?;
            client.execute(CREATE_PERSON, Some(name("Ann"))).await?;
            let found = client.find(LIST_PEOPLE, None).await?;
            client.close().await?;
            Ok::<_, DriverError>(found)
        });
        assert_eq!(found.unwrap().len(), 1);
    }
}
