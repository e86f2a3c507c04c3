//! Driver Module
//!
//! Neo4j 비동기 클라이언트: 연결 풀, 세션, 트랜잭션, 레코드 스트림
//!
//! # 구성
//!
//! - 연결 풀링 (ConnectionPool, PoolConfig)
//! - 세션/트랜잭션 (Session, Transaction, Bookmark)
//! - 레코드 스트림 (RecordStream, 배압 지원)
//! - 클라이언트 파사드 (Neo4jClient, ClientOptions)
//! - 트랜스포트 경계 (Connector, Transport) 와 인메모리 백엔드
//!
//! # Example
//!
//! ```ignore
//! use neo4j_async_client::driver::{ClientOptions, MemoryConnector, MemoryDatabase, Neo4jClient};
//! use neo4j_async_client::params;
//!
//! let client = Neo4jClient::connect(ClientOptions::default(), MemoryConnector::new(db)).await?;
//!
//! // 자동 커밋
//! client.execute("CREATE (p:Person {name: $name})", Some(params!{"name" => "Alice"})).await?;
//!
//! // 명시적 트랜잭션
//! let mut tx = client.begin().await?;
//! tx.query("CREATE (p:Person {name: $name})", Some(params!{"name" => "Bob"})).await?;
//! tx.commit().await?;
//!
//! // 스트리밍
//! let mut stream = client.query_stream("MATCH (p:Person) RETURN p.name AS name", None).await?;
//! while let Some(record) = stream.next_record().await {
//!     println!("{:?}", record?);
//! }
//!
//! client.close().await?;
//! ```

mod callback;
mod client;
mod connection;
mod error;
mod memory;
mod options;
mod pool;
mod query;
mod record;
mod session;
mod stream;
mod summary;
mod transaction;
mod types;

// Re-exports
pub use callback::OnComplete;
pub use client::{build_runtime, ClientMetrics, Neo4jClient, DEFAULT_POOL_NAME};
pub use connection::{ConnectContext, Connector, PullResponse, RunResponse, Transport, TransportState};
pub use error::{DriverError, DriverResult};
pub use memory::{
    MemoryConnector, MemoryDatabase, MemoryGraph, MemoryStats, QueryHandler, QueryOutcome,
};
pub use options::{
    AuthOptions, AuthOptionsBuilder, AuthScheme, AuthToken, ClientOptions, ClientOptionsBuilder,
    EncryptionOptions, EncryptionOptionsBuilder, ServerAddress, TrustStrategy, DEFAULT_HOST,
    DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_USERNAME,
};
pub use pool::{
    ConnectionPool, ConnectionState, PoolConfig, PoolConfigBuilder, PoolMetrics, PooledConnection,
};
pub use query::{AccessMode, Bookmark, Query, QueryResult};
pub use record::{Keys, Record};
pub use session::{Session, SessionConfig, SessionConfigBuilder};
pub use stream::{RecordStream, StreamState};
pub use summary::{Counters, Notification, QueryType, ResultSummary};
pub use transaction::{Transaction, TransactionConfig, TransactionConfigBuilder, TransactionState};
pub use types::{Duration, Node, Params, Path, Point, Relationship, Value};

/// 파라미터 맵 생성 매크로
///
/// ```
/// use neo4j_async_client::params;
///
/// let params = params! { "name" => "Alice", "age" => 42 };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::driver::Params::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::driver::Params::new();
        $(
            map.insert(::std::string::String::from($key), $crate::driver::Value::from($value));
        )+
        map
    }};
}
