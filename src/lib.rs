//! # Neo4j Async Client
//!
//! An asynchronous client facade for [Neo4j](https://neo4j.com) built on Tokio.
//!
//! ## Features
//!
//! - **Connection Pooling** - Bounded pool with FIFO waiters, lifetime limits and idle health checks
//! - **Sessions & Transactions** - Explicit transactions and auto-committed implicit operations
//! - **Record Streams** - Lazy result streams with backpressure, pause/resume and cancellation
//! - **Shared Clients** - Named, reference-counted clients sharing a single pool
//! - **Pluggable Transport** - The wire protocol sits behind the [`Connector`] trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neo4j_async_client::{params, AuthOptions, ClientOptions, MemoryConnector, MemoryDatabase, Neo4jClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ClientOptions::builder()
//!         .with_host("localhost")
//!         .with_auth(AuthOptions::basic("neo4j", "password"))
//!         .build()?;
//!
//!     let db = MemoryDatabase::new();
//!     let client = Neo4jClient::connect(options, MemoryConnector::new(db)).await?;
//!
//!     let summary = client
//!         .execute("CREATE (p:Person {name: $name})", Some(params! { "name" => "Alice" }))
//!         .await?;
//!     println!("created {} nodes", summary.counters.nodes_created);
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Transactions
//!
//! ```rust,no_run
//! # use neo4j_async_client::Neo4jClient;
//! # async fn example(client: Neo4jClient) -> Result<(), Box<dyn std::error::Error>> {
//! let mut tx = client.begin().await?;
//! tx.query("CREATE (n:Node {id: 1})", None).await?;
//! tx.query("CREATE (n:Node {id: 2})", None).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! # use neo4j_async_client::Neo4jClient;
//! use futures::StreamExt;
//!
//! # async fn example(client: Neo4jClient) -> Result<(), Box<dyn std::error::Error>> {
//! let mut stream = client.query_stream("MATCH (n:Node) RETURN n.id AS id", None).await?;
//! while let Some(record) = stream.next().await {
//!     println!("{}", record?.get_int("id")?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`driver`] - Client, pool, session, transaction and stream types
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod driver;

// Re-exports for convenience
pub use driver::{
    AccessMode, AuthOptions, AuthToken, Bookmark, ClientMetrics, ClientOptions, Connector,
    Counters, DriverError, DriverResult, EncryptionOptions, MemoryConnector, MemoryDatabase,
    Neo4jClient, OnComplete, Query, QueryResult, Record, RecordStream, ResultSummary, Session,
    SessionConfig, Transaction, TransactionConfig, Transport, Value,
};

/// Options alias for convenience
pub type Config = ClientOptions;
