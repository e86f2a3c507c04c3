//! In-memory backend
//!
//! 네트워크 서버 없이 [`Connector`] 를 구현하는 인메모리 데이터베이스.
//!
//! Cypher 를 해석하지 않는다. 쿼리 텍스트마다 핸들러를 등록하고, 핸들러가
//! [`MemoryGraph`] 를 읽거나 바꾼다. 트랜잭션은 BEGIN 시점의 스냅샷 위에서
//! 실행되고, COMMIT 은 쓰기 쿼리를 공유 그래프에 다시 적용하며, ROLLBACK 은
//! 스냅샷을 버린다.
//!
//! ```
//! use neo4j_async_client::driver::{MemoryDatabase, QueryOutcome, Value};
//!
//! let db = MemoryDatabase::new();
//! db.register("RETURN 1 AS one", |_graph, _params| {
//!     Ok(QueryOutcome::rows(["one"], vec![vec![Value::Integer(1)]]))
//! });
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::connection::{
    ConnectContext, Connector, PullResponse, RunResponse, Transport, TransportState,
};
use super::error::{DriverError, DriverResult};
use super::options::{AuthToken, ServerAddress};
use super::query::{AccessMode, Bookmark, Query};
use super::summary::{Counters, QueryType, ResultSummary};
use super::transaction::TransactionConfig;
use super::types::{Node, Params, Value};

/// 쿼리 핸들러
pub type QueryHandler =
    Arc<dyn Fn(&mut MemoryGraph, &Params) -> DriverResult<QueryOutcome> + Send + Sync>;

// ============================================================================
// MemoryGraph - 노드 저장소
// ============================================================================

/// 레이블과 속성을 가진 노드 저장소
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    nodes: BTreeMap<i64, Node>,
    next_id: i64,
}

impl MemoryGraph {
    /// 노드 생성
    pub fn create_node(&mut self, labels: &[&str], properties: Params) -> Node {
        let id = self.next_id;
        self.next_id += 1;
        let node = Node::new(id, labels.iter().map(|l| l.to_string()).collect(), properties);
        self.nodes.insert(id, node.clone());
        node
    }

    /// 레이블로 노드 조회 (ID 순)
    pub fn nodes_with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.values().filter(move |n| n.has_label(label))
    }

    /// 레이블과 속성 값으로 노드 조회
    pub fn find(&self, label: &str, key: &str, value: &Value) -> Option<&Node> {
        self.nodes
            .values()
            .find(|n| n.has_label(label) && n.get(key) == Some(value))
    }

    /// 조건에 맞는 노드 삭제
    pub fn delete_where(&mut self, mut predicate: impl FnMut(&Node) -> bool) -> Vec<Node> {
        let ids: Vec<i64> = self
            .nodes
            .values()
            .filter(|n| predicate(n))
            .map(|n| n.id)
            .collect();
        ids.into_iter().filter_map(|id| self.nodes.remove(&id)).collect()
    }

    /// 전체 노드 수
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 빈 그래프 여부
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ============================================================================
// QueryOutcome - 핸들러 결과
// ============================================================================

/// 핸들러 실행 결과
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    /// 컬럼 키
    pub keys: Vec<String>,
    /// 행
    pub rows: Vec<Vec<Value>>,
    /// 변경 카운터
    pub counters: Counters,
    /// 쿼리 타입
    pub query_type: QueryType,
}

impl QueryOutcome {
    /// 행이 없는 결과
    pub fn empty() -> Self {
        Self::default()
    }

    /// 읽기 결과
    pub fn rows<K: Into<String>>(keys: impl IntoIterator<Item = K>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            rows,
            ..Self::default()
        }
    }

    /// 쓰기로 표시하고 카운터 설정
    pub fn with_counters(mut self, counters: Counters) -> Self {
        self.counters = counters;
        self.query_type = if self.rows.is_empty() {
            QueryType::WriteOnly
        } else {
            QueryType::ReadWrite
        };
        self
    }

    fn is_write(&self) -> bool {
        self.query_type != QueryType::ReadOnly
    }
}

// ============================================================================
// MemoryDatabase - 공유 데이터베이스
// ============================================================================

/// 인메모리 데이터베이스 통계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// 현재 열린 연결 수
    pub open_connections: usize,
    /// 지금까지 연 연결 수
    pub total_connections: u64,
    /// PULL 왕복 수
    pub pull_requests: u64,
    /// 헬스 체크 (RESET) 수
    pub health_checks: u64,
    /// 커밋 수
    pub commits: u64,
    /// 롤백 수
    pub rollbacks: u64,
}

struct DatabaseInner {
    graph: Mutex<MemoryGraph>,
    handlers: RwLock<HashMap<String, QueryHandler>>,
    credentials: RwLock<Option<(String, String)>>,
    unavailable: AtomicBool,
    failing_health_checks: AtomicBool,
    generation: AtomicU64,
    pull_delay: Mutex<Option<Duration>>,
    bookmark_seq: AtomicU64,
    open_connections: AtomicUsize,
    total_connections: AtomicU64,
    pull_requests: AtomicU64,
    health_checks: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
}

/// 인메모리 데이터베이스 핸들 (복제해도 같은 데이터베이스)
#[derive(Clone)]
pub struct MemoryDatabase {
    inner: Arc<DatabaseInner>,
}

impl MemoryDatabase {
    /// 빈 데이터베이스 생성
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                graph: Mutex::new(MemoryGraph::default()),
                handlers: RwLock::new(HashMap::new()),
                credentials: RwLock::new(None),
                unavailable: AtomicBool::new(false),
                failing_health_checks: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                pull_delay: Mutex::new(None),
                bookmark_seq: AtomicU64::new(0),
                open_connections: AtomicUsize::new(0),
                total_connections: AtomicU64::new(0),
                pull_requests: AtomicU64::new(0),
                health_checks: AtomicU64::new(0),
                commits: AtomicU64::new(0),
                rollbacks: AtomicU64::new(0),
            }),
        }
    }

    /// 쿼리 핸들러 등록 (같은 텍스트는 교체)
    pub fn register<F>(&self, text: impl Into<String>, handler: F)
    where
        F: Fn(&mut MemoryGraph, &Params) -> DriverResult<QueryOutcome> + Send + Sync + 'static,
    {
        self.inner.handlers.write().insert(text.into(), Arc::new(handler));
    }

    /// 고정된 행을 돌려주는 읽기 쿼리 등록
    pub fn register_rows<K: Into<String>>(
        &self,
        text: impl Into<String>,
        keys: impl IntoIterator<Item = K>,
        rows: Vec<Vec<Value>>,
    ) {
        let outcome = QueryOutcome::rows(keys, rows);
        self.register(text, move |_, _| Ok(outcome.clone()));
    }

    /// Basic 인증 요구
    pub fn require_credentials(&self, username: impl Into<String>, password: impl Into<String>) {
        *self.inner.credentials.write() = Some((username.into(), password.into()));
    }

    /// 새 연결 거부 여부 설정
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// 헬스 체크 실패 여부 설정
    pub fn set_health_check_failing(&self, failing: bool) {
        self.inner.failing_health_checks.store(failing, Ordering::SeqCst);
    }

    /// 현재 열린 모든 연결을 끊는다 (다음 요청부터 실패)
    pub fn break_connections(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// PULL 마다 지연 설정
    pub fn set_pull_delay(&self, delay: Option<Duration>) {
        *self.inner.pull_delay.lock() = delay;
    }

    /// 그래프 읽기
    pub fn read_graph<R>(&self, f: impl FnOnce(&MemoryGraph) -> R) -> R {
        f(&self.inner.graph.lock())
    }

    /// 레이블별 노드 수
    pub fn count_label(&self, label: &str) -> usize {
        self.read_graph(|g| g.nodes_with_label(label).count())
    }

    /// 현재 열린 연결 수
    pub fn open_connections(&self) -> usize {
        self.inner.open_connections.load(Ordering::SeqCst)
    }

    /// 통계
    pub fn stats(&self) -> MemoryStats {
        let i = &self.inner;
        MemoryStats {
            open_connections: i.open_connections.load(Ordering::SeqCst),
            total_connections: i.total_connections.load(Ordering::SeqCst),
            pull_requests: i.pull_requests.load(Ordering::SeqCst),
            health_checks: i.health_checks.load(Ordering::SeqCst),
            commits: i.commits.load(Ordering::SeqCst),
            rollbacks: i.rollbacks.load(Ordering::SeqCst),
        }
    }

    fn handler(&self, text: &str) -> DriverResult<QueryHandler> {
        self.inner.handlers.read().get(text).cloned().ok_or_else(|| {
            DriverError::query(
                "Neo.ClientError.Statement.SyntaxError",
                format!("No handler registered for query '{}'", text),
            )
        })
    }

    fn authenticate(&self, token: &AuthToken) -> DriverResult<()> {
        let required = self.inner.credentials.read();
        let Some((user, pass)) = required.as_ref() else {
            return Ok(());
        };
        match token {
            AuthToken::Basic { username, password, .. } if username == user && password == pass => Ok(()),
            other => Err(DriverError::authentication(format!(
                "The client is unauthorized due to authentication failure (scheme '{}')",
                other.scheme()
            ))),
        }
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDatabase")
            .field("nodes", &self.inner.graph.lock().len())
            .field("handlers", &self.inner.handlers.read().len())
            .field("stats", &self.stats())
            .finish()
    }
}

// ============================================================================
// MemoryConnector - 커넥터
// ============================================================================

/// 인메모리 데이터베이스용 커넥터
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    database: MemoryDatabase,
}

impl MemoryConnector {
    /// 새 커넥터 생성
    pub fn new(database: MemoryDatabase) -> Self {
        Self { database }
    }

    /// 대상 데이터베이스
    pub fn database(&self) -> &MemoryDatabase {
        &self.database
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, ctx: &ConnectContext) -> DriverResult<Box<dyn Transport>> {
        let db = &self.database;
        if db.inner.unavailable.load(Ordering::SeqCst) {
            return Err(DriverError::service_unavailable(format!(
                "Unable to connect to {}",
                ctx.address
            )));
        }
        db.authenticate(&ctx.auth)?;

        db.inner.open_connections.fetch_add(1, Ordering::SeqCst);
        db.inner.total_connections.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemoryTransport {
            db: db.clone(),
            address: ctx.address.clone(),
            generation: db.inner.generation.load(Ordering::SeqCst),
            state: TransportState::Ready,
            tx: None,
            cursor: None,
            closed: false,
        }))
    }
}

// ============================================================================
// MemoryTransport - 연결 하나
// ============================================================================

struct OpenTransaction {
    snapshot: MemoryGraph,
    writes: Vec<Query>,
}

struct Cursor {
    query_text: String,
    rows: VecDeque<Vec<Value>>,
    counters: Counters,
    query_type: QueryType,
    started: Instant,
    available_after: Duration,
}

struct MemoryTransport {
    db: MemoryDatabase,
    address: ServerAddress,
    generation: u64,
    state: TransportState,
    tx: Option<OpenTransaction>,
    cursor: Option<Cursor>,
    closed: bool,
}

impl MemoryTransport {
    fn check_alive(&mut self) -> DriverResult<()> {
        if self.closed {
            return Err(DriverError::broken("Connection already closed"));
        }
        if self.db.inner.generation.load(Ordering::SeqCst) != self.generation {
            self.state = TransportState::Disconnected;
            return Err(DriverError::broken(format!(
                "Connection to {} reset by peer",
                self.address
            )));
        }
        Ok(())
    }

    fn invalid(&mut self, message: &str) -> DriverError {
        self.state = TransportState::Failed;
        DriverError::query("Neo.ClientError.Request.Invalid", message)
    }

    fn summary(&self, cursor: Cursor) -> ResultSummary {
        ResultSummary {
            query_text: cursor.query_text,
            query_type: cursor.query_type,
            counters: cursor.counters,
            result_available_after: cursor.available_after,
            result_consumed_after: cursor.started.elapsed(),
            database: None,
            server: Some(self.address.clone()),
            notifications: Vec::new(),
        }
    }

    fn finish_cursor(&mut self) -> Option<ResultSummary> {
        let cursor = self.cursor.take()?;
        self.state = TransportState::InTransaction;
        Some(self.summary(cursor))
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("address", &self.address)
            .field("state", &self.state)
            .finish()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn begin(
        &mut self,
        _mode: AccessMode,
        _bookmarks: &[Bookmark],
        _config: &TransactionConfig,
    ) -> DriverResult<()> {
        self.check_alive()?;
        if self.state != TransportState::Ready {
            return Err(self.invalid("BEGIN is only allowed on a ready connection"));
        }
        let snapshot = self.db.inner.graph.lock().clone();
        self.tx = Some(OpenTransaction {
            snapshot,
            writes: Vec::new(),
        });
        self.state = TransportState::InTransaction;
        Ok(())
    }

    async fn run(&mut self, query: &Query) -> DriverResult<RunResponse> {
        self.check_alive()?;
        if self.state == TransportState::Streaming {
            self.finish_cursor();
        }
        if self.state != TransportState::InTransaction {
            return Err(self.invalid("RUN requires an open transaction"));
        }

        let handler = match self.db.handler(&query.text) {
            Ok(h) => h,
            Err(e) => {
                self.state = TransportState::Failed;
                return Err(e);
            }
        };

        let started = Instant::now();
        let tx = self
            .tx
            .as_mut()
            .ok_or_else(|| DriverError::broken("Transaction state lost"))?;
        let outcome = match handler(&mut tx.snapshot, &query.parameters) {
            Ok(o) => o,
            Err(e) => {
                self.state = TransportState::Failed;
                return Err(e);
            }
        };
        if outcome.is_write() {
            tx.writes.push(query.clone());
        }

        let keys = outcome.keys.clone();
        let available_after = started.elapsed();
        self.cursor = Some(Cursor {
            query_text: query.text.clone(),
            rows: outcome.rows.into(),
            counters: outcome.counters,
            query_type: outcome.query_type,
            started,
            available_after,
        });
        self.state = TransportState::Streaming;

        Ok(RunResponse { keys, available_after })
    }

    async fn pull(&mut self, n: usize) -> DriverResult<PullResponse> {
        self.check_alive()?;
        let delay = *self.db.inner.pull_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
            self.check_alive()?;
        }
        self.db.inner.pull_requests.fetch_add(1, Ordering::SeqCst);

        let Some(cursor) = self.cursor.as_mut() else {
            return Err(self.invalid("PULL without an open result"));
        };
        let take = n.min(cursor.rows.len());
        let records: Vec<Vec<Value>> = cursor.rows.drain(..take).collect();
        let has_more = !cursor.rows.is_empty();
        let summary = if has_more { None } else { self.finish_cursor() };

        Ok(PullResponse {
            records,
            has_more,
            summary,
        })
    }

    async fn discard(&mut self) -> DriverResult<ResultSummary> {
        self.check_alive()?;
        match self.finish_cursor() {
            Some(summary) => Ok(summary),
            None => Err(self.invalid("DISCARD without an open result")),
        }
    }

    async fn commit(&mut self) -> DriverResult<Option<Bookmark>> {
        self.check_alive()?;
        if self.state == TransportState::Streaming {
            self.finish_cursor();
        }
        if self.state != TransportState::InTransaction {
            return Err(self.invalid("COMMIT requires an open transaction"));
        }
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DriverError::broken("Transaction state lost"))?;

        let replayed = {
            let mut graph = self.db.inner.graph.lock();
            let mut next = graph.clone();
            let result = tx.writes.iter().try_for_each(|query| {
                let handler = self.db.handler(&query.text)?;
                handler(&mut next, &query.parameters).map(|_| ())
            });
            if result.is_ok() {
                *graph = next;
            }
            result
        };

        self.state = TransportState::Ready;
        replayed?;
        self.db.inner.commits.fetch_add(1, Ordering::SeqCst);
        let seq = self.db.inner.bookmark_seq.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(Bookmark::new(format!("memory:bookmark:{}", seq))))
    }

    async fn rollback(&mut self) -> DriverResult<()> {
        self.check_alive()?;
        if self.tx.take().is_none() {
            return Err(self.invalid("ROLLBACK requires an open transaction"));
        }
        self.cursor = None;
        self.state = TransportState::Ready;
        self.db.inner.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reset(&mut self) -> DriverResult<()> {
        self.check_alive()?;
        self.db.inner.health_checks.fetch_add(1, Ordering::SeqCst);
        if self.db.inner.failing_health_checks.load(Ordering::SeqCst) {
            self.state = TransportState::Disconnected;
            return Err(DriverError::broken(format!(
                "Health check against {} failed",
                self.address
            )));
        }
        self.tx = None;
        self.cursor = None;
        self.state = TransportState::Ready;
        Ok(())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state = TransportState::Disconnected;
            self.db.inner.open_connections.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn state(&self) -> TransportState {
        self.state
    }

    fn server_agent(&self) -> Option<&str> {
        Some("Neo4j/memory")
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        if !self.closed {
            self.db.inner.open_connections.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// Test fixtures
// ============================================================================

/// 테스트 공용 쿼리 세트
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub const CREATE_PERSON: &str = "CREATE (p:Person {name: $name}) RETURN p.name AS name";
    pub const LIST_PEOPLE: &str = "MATCH (p:Person) RETURN p.name AS name ORDER BY name";
    pub const FIND_PERSON: &str = "MATCH (p:Person {name: $name}) RETURN p.name AS name";
    pub const DELETE_PERSON: &str = "MATCH (p:Person {name: $name}) DELETE p RETURN $name AS name";
    pub const COUNT_PEOPLE: &str = "MATCH (p:Person) RETURN count(p) AS count";
    pub const RANGE: &str = "UNWIND range(1, $count) AS i RETURN i";

    fn name_param(params: &Params) -> DriverResult<Value> {
        params
            .get("name")
            .cloned()
            .ok_or_else(|| DriverError::query("Neo.ClientError.Statement.ParameterMissing", "Expected parameter(s): name"))
    }

    /// `Person` 노드를 다루는 핸들러가 등록된 데이터베이스
    ///
    /// 이름은 유일해야 하며 중복 생성은 제약 위반으로 실패한다.
    pub fn people_database() -> MemoryDatabase {
        let db = MemoryDatabase::new();

        db.register(CREATE_PERSON, |graph, params| {
            let name = name_param(params)?;
            if graph.find("Person", "name", &name).is_some() {
                return Err(DriverError::query(
                    "Neo.ClientError.Schema.ConstraintValidationFailed",
                    format!("Node with label `Person` and property `name` = {} already exists", name),
                ));
            }
            let mut props = Params::new();
            props.insert("name".into(), name.clone());
            graph.create_node(&["Person"], props);
            Ok(QueryOutcome::rows(["name"], vec![vec![name]]).with_counters(Counters {
                nodes_created: 1,
                properties_set: 1,
                labels_added: 1,
                ..Counters::default()
            }))
        });

        db.register(LIST_PEOPLE, |graph, _| {
            let mut names: Vec<Value> = graph
                .nodes_with_label("Person")
                .filter_map(|n| n.get("name").cloned())
                .collect();
            names.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
            Ok(QueryOutcome::rows(["name"], names.into_iter().map(|n| vec![n]).collect()))
        });

        db.register(FIND_PERSON, |graph, params| {
            let name = name_param(params)?;
            let rows = graph
                .nodes_with_label("Person")
                .filter(|n| n.get("name") == Some(&name))
                .map(|_| vec![name.clone()])
                .collect();
            Ok(QueryOutcome::rows(["name"], rows))
        });

        db.register(DELETE_PERSON, |graph, params| {
            let name = name_param(params)?;
            let deleted = graph.delete_where(|n| n.has_label("Person") && n.get("name") == Some(&name));
            let rows = deleted.iter().map(|_| vec![name.clone()]).collect();
            Ok(QueryOutcome::rows(["name"], rows).with_counters(Counters {
                nodes_deleted: deleted.len() as i64,
                ..Counters::default()
            }))
        });

        db.register(COUNT_PEOPLE, |graph, _| {
            let count = graph.nodes_with_label("Person").count() as i64;
            Ok(QueryOutcome::rows(["count"], vec![vec![Value::Integer(count)]]))
        });

        db.register(RANGE, |_, params| {
            let count = params.get("count").and_then(Value::as_int).unwrap_or(0);
            Ok(QueryOutcome::rows(
                ["i"],
                (1..=count).map(|i| vec![Value::Integer(i)]).collect(),
            ))
        });

        db
    }

    /// 파라미터 맵 하나 만들기
    pub fn name(value: &str) -> Params {
        let mut params = Params::new();
        params.insert("name".into(), Value::from(value));
        params
    }

    /// 기본 접속 정보
    pub fn context() -> ConnectContext {
        ConnectContext {
            address: ServerAddress::new("localhost", 7687),
            auth: AuthToken::None,
            encryption: None,
            user_agent: "test".into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    async fn open(db: &MemoryDatabase) -> Box<dyn Transport> {
        MemoryConnector::new(db.clone()).connect(&context()).await.unwrap()
    }

    async fn run_all(t: &mut Box<dyn Transport>, text: &str, params: Params) -> DriverResult<Vec<Vec<Value>>> {
        t.run(&Query::new(text).with_params(params)).await?;
        Ok(t.pull(usize::MAX).await?.records)
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let db = people_database();
        let mut t = open(&db).await;
        let config = TransactionConfig::default();

        t.begin(AccessMode::Write, &[], &config).await.unwrap();
        run_all(&mut t, CREATE_PERSON, name("Alice")).await.unwrap();
        assert_eq!(db.count_label("Person"), 0);

        let rows = run_all(&mut t, LIST_PEOPLE, Params::new()).await.unwrap();
        assert_eq!(rows, vec![vec![Value::from("Alice")]]);

        let bookmark = t.commit().await.unwrap();
        assert!(bookmark.is_some());
        assert_eq!(db.count_label("Person"), 1);
        assert_eq!(t.state(), TransportState::Ready);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let db = people_database();
        let mut t = open(&db).await;

        t.begin(AccessMode::Write, &[], &TransactionConfig::default()).await.unwrap();
        run_all(&mut t, CREATE_PERSON, name("Bob")).await.unwrap();
        t.rollback().await.unwrap();

        assert_eq!(db.count_label("Person"), 0);
        assert_eq!(db.stats().rollbacks, 1);
    }

    #[tokio::test]
    async fn test_pull_in_batches() {
        let db = people_database();
        let mut t = open(&db).await;
        let mut params = Params::new();
        params.insert("count".into(), Value::Integer(25));

        t.begin(AccessMode::Read, &[], &TransactionConfig::default()).await.unwrap();
        let run = t.run(&Query::new(RANGE).with_params(params)).await.unwrap();
        assert_eq!(run.keys, vec!["i".to_string()]);

        let first = t.pull(10).await.unwrap();
        assert_eq!(first.records.len(), 10);
        assert!(first.has_more);
        assert!(first.summary.is_none());

        t.pull(10).await.unwrap();
        let last = t.pull(10).await.unwrap();
        assert_eq!(last.records.len(), 5);
        assert!(!last.has_more);
        assert!(last.summary.is_some());
        assert_eq!(db.stats().pull_requests, 3);
    }

    #[tokio::test]
    async fn test_unknown_query_fails_transaction() {
        let db = people_database();
        let mut t = open(&db).await;

        t.begin(AccessMode::Write, &[], &TransactionConfig::default()).await.unwrap();
        let err = t.run(&Query::new("MATCH (n) RETURN m")).await.unwrap_err();
        assert_eq!(err.code(), Some("Neo.ClientError.Statement.SyntaxError"));
        assert_eq!(t.state(), TransportState::Failed);

        t.rollback().await.unwrap();
        assert_eq!(t.state(), TransportState::Ready);
    }

    #[tokio::test]
    async fn test_connection_counting_and_faults() {
        let db = people_database();
        let connector = MemoryConnector::new(db.clone());

        let mut a = connector.connect(&context()).await.unwrap();
        let b = connector.connect(&context()).await.unwrap();
        assert_eq!(db.open_connections(), 2);

        a.close().await;
        drop(b);
        assert_eq!(db.open_connections(), 0);

        db.set_unavailable(true);
        let err = connector.connect(&context()).await.unwrap_err();
        assert!(matches!(err, DriverError::ServiceUnavailable(_)));
        db.set_unavailable(false);

        let mut c = connector.connect(&context()).await.unwrap();
        db.break_connections();
        assert!(c.reset().await.unwrap_err().is_connection_error());
    }

    #[tokio::test]
    async fn test_authentication_required() {
        let db = MemoryDatabase::new();
        db.require_credentials("neo4j", "secret");
        let connector = MemoryConnector::new(db.clone());

        let err = connector.connect(&context()).await.unwrap_err();
        assert!(matches!(err, DriverError::Authentication(_)));

        let mut ctx = context();
        ctx.auth = AuthToken::Basic {
            username: "neo4j".into(),
            password: "secret".into(),
            realm: None,
        };
        assert!(connector.connect(&ctx).await.is_ok());
    }

    #[test]
    fn test_graph_find_by_label_and_property() {
        let mut graph = MemoryGraph::default();
        graph.create_node(&["Person"], name("Ann"));
        graph.create_node(&["Robot"], name("Bob"));
        let bob = graph.create_node(&["Person"], name("Bob"));

        let label = String::from("Person");
        let found = graph.find(&label, "name", &Value::from("Bob")).cloned();
        drop(label);
        assert_eq!(found.map(|n| n.id), Some(bob.id));

        assert!(graph.find("Robot", "name", &Value::from("Ann")).is_none());
        assert_eq!(graph.nodes_with_label("Person").count(), 2);
        assert_eq!(graph.len(), 3);
    }
}
