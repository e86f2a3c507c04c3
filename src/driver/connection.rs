//! Server transport seam.
//!
//! A [`Connector`] opens authenticated [`Transport`]s to a single server. The
//! pool, sessions, transactions and record streams only ever talk to a server
//! through these two traits, so the wire protocol can be swapped without
//! touching the client layer. [`MemoryConnector`](super::memory::MemoryConnector)
//! is the in-process implementation.
//!
//! A transport follows the usual Bolt message flow:
//!
//! ```text
//! BEGIN -> RUN -> PULL(n)* | DISCARD -> ... -> COMMIT | ROLLBACK
//! ```
//!
//! `RESET` returns a transport to the ready state and doubles as the liveness
//! check run by the pool before reusing a long-idle connection.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use super::error::DriverResult;
use super::options::{AuthToken, EncryptionOptions, ServerAddress};
use super::query::{AccessMode, Bookmark, Query};
use super::summary::ResultSummary;
use super::transaction::TransactionConfig;
use super::types::Value;

/// Transport state as tracked by an implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Authenticated, no open transaction
    Ready,
    /// Inside an explicit transaction
    InTransaction,
    /// A result is open and can be pulled or discarded
    Streaming,
    /// The last request failed; needs RESET or ROLLBACK
    Failed,
    /// Closed or lost
    Disconnected,
}

/// Everything a connector needs to open one connection.
#[derive(Debug, Clone)]
pub struct ConnectContext {
    /// Target server
    pub address: ServerAddress,
    /// Credentials, already resolved from the auth options
    pub auth: AuthToken,
    /// TLS settings, `None` when encryption is disabled
    pub encryption: Option<EncryptionOptions>,
    /// User agent announced to the server
    pub user_agent: String,
}

/// Response to RUN.
#[derive(Debug, Clone, Default)]
pub struct RunResponse {
    /// Column names
    pub keys: Vec<String>,
    /// Server-side time until the first record was available
    pub available_after: Duration,
}

/// Response to PULL.
#[derive(Debug, Clone, Default)]
pub struct PullResponse {
    /// Raw rows, in key order
    pub records: Vec<Vec<Value>>,
    /// More rows remain on the server
    pub has_more: bool,
    /// Present once the result is exhausted
    pub summary: Option<ResultSummary>,
}

/// One authenticated channel to one server.
///
/// Errors of the connection kind (see
/// [`DriverError::is_connection_error`](super::DriverError::is_connection_error))
/// mean the transport can no longer be trusted; the owner must not return it
/// to the pool.
#[async_trait]
pub trait Transport: Send + fmt::Debug {
    /// Open an explicit transaction.
    async fn begin(
        &mut self,
        mode: AccessMode,
        bookmarks: &[Bookmark],
        config: &TransactionConfig,
    ) -> DriverResult<()>;

    /// Submit a query inside the open transaction.
    async fn run(&mut self, query: &Query) -> DriverResult<RunResponse>;

    /// Pull up to `n` rows of the open result.
    async fn pull(&mut self, n: usize) -> DriverResult<PullResponse>;

    /// Drop the remaining rows of the open result and return its summary.
    async fn discard(&mut self) -> DriverResult<ResultSummary>;

    /// Commit the open transaction.
    async fn commit(&mut self) -> DriverResult<Option<Bookmark>>;

    /// Roll back the open transaction.
    async fn rollback(&mut self) -> DriverResult<()>;

    /// Return to the ready state. Also used as a liveness check.
    async fn reset(&mut self) -> DriverResult<()>;

    /// Close the channel. Never fails; errors are only logged.
    async fn close(&mut self);

    /// Current state.
    fn state(&self) -> TransportState;

    /// Server agent string, if the server announced one.
    fn server_agent(&self) -> Option<&str> {
        None
    }
}

/// Opens transports.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug + 'static {
    /// Connect and authenticate.
    async fn connect(&self, ctx: &ConnectContext) -> DriverResult<Box<dyn Transport>>;
}
