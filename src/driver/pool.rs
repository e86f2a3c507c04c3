//! Connection Pool
//!
//! 연결 풀링
//!
//! 체크아웃된 연결은 세마포어 퍼밋을 하나씩 쥐고 있다. 유휴 연결은 퍼밋 없이
//! 큐에 남고, 새 연결은 유휴 큐가 비었을 때만 만든다. 그래서 열린 연결 수는
//! `max_size` 를 넘지 않는다. 세마포어는 공정(FIFO)하므로 대기자는 도착 순서대로
//! 연결을 받는다.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::connection::{ConnectContext, Connector, Transport, TransportState};
use super::error::{DriverError, DriverResult};
use super::options::ServerAddress;

// ============================================================================
// PoolConfig - 풀 설정
// ============================================================================

/// 연결 풀 설정
///
/// | 필드 | 기본값 | 설명 |
/// |------|--------|------|
/// | `max_size` | 100 | 최대 연결 수 |
/// | `acquisition_timeout` | 60초 | 연결 획득 타임아웃 |
/// | `max_lifetime` | 1시간 | 연결 최대 수명 (`None` 이면 무제한) |
/// | `idle_before_test` | `None` | 재사용 전 검사할 유휴 시간 |
/// | `log_leaks` | false | 반환되지 않은 연결 경고 |
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// 최대 연결 수
    pub max_size: usize,
    /// 연결 획득 타임아웃
    pub acquisition_timeout: Duration,
    /// 연결 최대 수명
    pub max_lifetime: Option<Duration>,
    /// 이 시간 이상 유휴 상태였던 연결은 재사용 전에 RESET 으로 검사
    pub idle_before_test: Option<Duration>,
    /// 반환되지 않은 연결 경고 로그
    pub log_leaks: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            acquisition_timeout: Duration::from_secs(60),
            max_lifetime: Some(Duration::from_secs(3600)),
            idle_before_test: None,
            log_leaks: false,
        }
    }
}

impl PoolConfig {
    /// 빌더 패턴으로 풀 설정 생성
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }
}

/// 풀 설정 빌더
#[derive(Debug, Clone, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// 최대 연결 수 설정
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.config.max_size = size;
        self
    }

    /// 획득 타임아웃 설정
    pub fn with_acquisition_timeout(mut self, timeout: Duration) -> Self {
        self.config.acquisition_timeout = timeout;
        self
    }

    /// 연결 최대 수명 설정
    pub fn with_max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.config.max_lifetime = lifetime;
        self
    }

    /// 유휴 검사 임계값 설정
    pub fn with_idle_before_test(mut self, idle: Option<Duration>) -> Self {
        self.config.idle_before_test = idle;
        self
    }

    /// 누수 경고 설정
    pub fn with_log_leaks(mut self, enabled: bool) -> Self {
        self.config.log_leaks = enabled;
        self
    }

    /// 설정 빌드
    pub fn build(self) -> PoolConfig {
        self.config
    }
}

// ============================================================================
// ConnectionState - 연결 상태
// ============================================================================

/// 연결 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 유휴 상태
    Idle,
    /// 사용 중
    InUse,
    /// 깨짐 (반환 시 닫힘)
    Broken,
    /// 닫힘
    Closed,
}

// ============================================================================
// PooledConnection - 풀링된 연결
// ============================================================================

struct IdleConnection {
    id: u64,
    address: ServerAddress,
    transport: Box<dyn Transport>,
    created_at: Instant,
    idle_since: Instant,
}

/// 체크아웃된 연결
///
/// [`release`](Self::release) 로 반환해야 한다. 반환하지 않고 drop 하면 깨진
/// 연결로 보고 닫는다.
pub struct PooledConnection {
    id: u64,
    address: ServerAddress,
    created_at: Instant,
    state: ConnectionState,
    transport: Option<Box<dyn Transport>>,
    permit: Option<OwnedSemaphorePermit>,
    pool: Arc<ConnectionPool>,
}

impl PooledConnection {
    /// 연결 ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 서버 주소
    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    /// 연결 상태
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// 연결 나이
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// 트랜스포트
    pub fn transport(&mut self) -> DriverResult<&mut dyn Transport> {
        match self.transport.as_deref_mut() {
            Some(transport) => Ok(transport),
            None => Err(DriverError::broken("Connection already released")),
        }
    }

    /// 깨진 연결로 표시
    pub fn mark_broken(&mut self) {
        self.state = ConnectionState::Broken;
    }

    /// 풀로 반환
    pub async fn release(self) {
        let pool = Arc::clone(&self.pool);
        pool.release(self).await;
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("state", &self.state)
            .field("age", &self.created_at.elapsed())
            .finish()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };

        self.pool.in_use.fetch_sub(1, Ordering::SeqCst);
        self.pool.total_closed.fetch_add(1, Ordering::Relaxed);
        if self.pool.config.log_leaks {
            warn!(
                connection_id = self.id,
                address = %self.address,
                "Connection was dropped without being released; closing it"
            );
        }

        spawn_close(transport, self.permit.take());
    }
}

/// 백그라운드에서 트랜스포트를 닫는다
///
/// 퍼밋은 닫기가 끝난 뒤에 놓는다. 열린 연결 수가 `max_size` 를 넘지 않는다.
fn spawn_close(mut transport: Box<dyn Transport>, permit: Option<OwnedSemaphorePermit>) {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(async move {
            transport.close().await;
            drop(permit);
        });
    }
}

/// 재사용 검사 중인 유휴 연결
///
/// 검사 도중 획득이 취소되면(타임아웃) drop 에서 연결을 닫는다.
struct Reviving<'a> {
    pool: &'a ConnectionPool,
    conn: Option<IdleConnection>,
}

impl Drop for Reviving<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            debug!(connection_id = conn.id, "Acquisition cancelled during revive; closing connection");
            self.pool.total_closed.fetch_add(1, Ordering::Relaxed);
            spawn_close(conn.transport, None);
        }
    }
}

// ============================================================================
// PoolMetrics - 풀 메트릭
// ============================================================================

/// 풀 메트릭
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    /// 최대 크기
    pub max_size: usize,
    /// 현재 크기
    pub size: usize,
    /// 유휴 연결 수
    pub idle: usize,
    /// 사용 중인 연결 수
    pub in_use: usize,
    /// 총 획득 횟수
    pub total_acquisitions: u64,
    /// 총 반환 횟수
    pub total_releases: u64,
    /// 총 생성 횟수
    pub total_created: u64,
    /// 총 닫힌 연결 수
    pub total_closed: u64,
    /// 총 타임아웃 횟수
    pub total_timeouts: u64,
    /// 실패한 헬스 체크 수
    pub failed_health_checks: u64,
}

// ============================================================================
// ConnectionPool - 연결 풀
// ============================================================================

/// 연결 풀
pub struct ConnectionPool {
    /// 연결 대상 주소 (라운드 로빈)
    addresses: Vec<ServerAddress>,
    /// 주소 외 접속 정보
    context: ConnectContext,
    /// 커넥터
    connector: Arc<dyn Connector>,
    /// 풀 설정
    config: PoolConfig,
    /// 유휴 연결들
    idle_connections: Mutex<VecDeque<IdleConnection>>,
    /// 세마포어 (체크아웃 수 제한)
    semaphore: Arc<Semaphore>,
    /// 다음 주소 인덱스
    next_address: AtomicUsize,
    /// 다음 연결 ID
    next_id: AtomicU64,
    /// 사용 중인 연결 수
    in_use: AtomicUsize,
    /// 총 획득 횟수
    total_acquisitions: AtomicU64,
    /// 총 반환 횟수
    total_releases: AtomicU64,
    /// 총 생성 횟수
    total_created: AtomicU64,
    /// 총 닫힌 횟수
    total_closed: AtomicU64,
    /// 총 타임아웃 횟수
    total_timeouts: AtomicU64,
    /// 실패한 헬스 체크 수
    failed_health_checks: AtomicU64,
    /// 닫힘 여부
    closed: AtomicBool,
}

impl ConnectionPool {
    /// 새 연결 풀 생성
    ///
    /// `context` 의 주소는 무시되고 `addresses` 를 차례로 사용한다.
    pub fn new(
        addresses: Vec<ServerAddress>,
        context: ConnectContext,
        connector: Arc<dyn Connector>,
        config: PoolConfig,
    ) -> DriverResult<Self> {
        if addresses.is_empty() {
            return Err(DriverError::configuration("At least one server address is required"));
        }
        if config.max_size == 0 {
            return Err(DriverError::configuration("Max pool size must be positive"));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(config.max_size)),
            addresses,
            context,
            connector,
            config,
            idle_connections: Mutex::new(VecDeque::new()),
            next_address: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            in_use: AtomicUsize::new(0),
            total_acquisitions: AtomicU64::new(0),
            total_releases: AtomicU64::new(0),
            total_created: AtomicU64::new(0),
            total_closed: AtomicU64::new(0),
            total_timeouts: AtomicU64::new(0),
            failed_health_checks: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// 풀 설정
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// 연결 대상 주소
    pub fn addresses(&self) -> &[ServerAddress] {
        &self.addresses
    }

    /// 닫힘 여부
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 연결 획득
    ///
    /// 타임아웃 안에 연결을 못 얻으면 `ConnectionAcquisitionTimeout`.
    pub async fn acquire(self: &Arc<Self>) -> DriverResult<PooledConnection> {
        if self.is_closed() {
            return Err(DriverError::ClientClosed);
        }

        let timeout = self.config.acquisition_timeout;
        match tokio::time::timeout(timeout, self.acquire_inner()).await {
            Ok(result) => result,
            Err(_) => {
                self.total_timeouts.fetch_add(1, Ordering::Relaxed);
                debug!(timeout_ms = timeout.as_millis() as u64, "Connection acquisition timed out");
                Err(DriverError::ConnectionAcquisitionTimeout(timeout))
            }
        }
    }

    async fn acquire_inner(self: &Arc<Self>) -> DriverResult<PooledConnection> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| DriverError::ClientClosed)?;

        while let Some(idle) = self.pop_idle() {
            if let Some(conn) = self.revive(idle).await {
                return Ok(self.checkout(conn, permit));
            }
        }

        let (address, transport) = self.connect_any().await?;
        let now = Instant::now();
        let conn = IdleConnection {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            address,
            transport,
            created_at: now,
            idle_since: now,
        };
        self.total_created.fetch_add(1, Ordering::Relaxed);
        debug!(connection_id = conn.id, address = %conn.address, "Opened new connection");

        Ok(self.checkout(conn, permit))
    }

    fn pop_idle(&self) -> Option<IdleConnection> {
        self.idle_connections.lock().pop_front()
    }

    /// 유휴 연결을 재사용할 수 있으면 돌려주고, 아니면 닫는다
    async fn revive(&self, conn: IdleConnection) -> Option<IdleConnection> {
        let mut guard = Reviving {
            pool: self,
            conn: Some(conn),
        };
        let current = guard.conn.as_mut()?;

        let reusable = if self.expired(current.created_at) {
            debug!(connection_id = current.id, "Retiring connection past its max lifetime");
            false
        } else if self
            .config
            .idle_before_test
            .map_or(false, |threshold| current.idle_since.elapsed() >= threshold)
        {
            match current.transport.reset().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(connection_id = current.id, address = %current.address, "Idle connection failed health check: {}", e);
                    self.failed_health_checks.fetch_add(1, Ordering::Relaxed);
                    false
                }
            }
        } else {
            true
        };

        let mut conn = guard.conn.take()?;
        if reusable {
            Some(conn)
        } else {
            self.close_transport(&mut conn.transport).await;
            None
        }
    }

    fn checkout(self: &Arc<Self>, conn: IdleConnection, permit: OwnedSemaphorePermit) -> PooledConnection {
        self.in_use.fetch_add(1, Ordering::SeqCst);
        self.total_acquisitions.fetch_add(1, Ordering::Relaxed);
        trace!(connection_id = conn.id, address = %conn.address, "Connection acquired");

        PooledConnection {
            id: conn.id,
            address: conn.address,
            created_at: conn.created_at,
            state: ConnectionState::InUse,
            transport: Some(conn.transport),
            permit: Some(permit),
            pool: Arc::clone(self),
        }
    }

    /// 주소를 라운드 로빈으로 돌며 연결. 인증 실패는 바로 반환한다.
    async fn connect_any(&self) -> DriverResult<(ServerAddress, Box<dyn Transport>)> {
        let count = self.addresses.len();
        let start = self.next_address.fetch_add(1, Ordering::Relaxed) % count;
        let mut last_error = None;

        for offset in 0..count {
            let address = &self.addresses[(start + offset) % count];
            let ctx = ConnectContext {
                address: address.clone(),
                ..self.context.clone()
            };
            match self.connector.connect(&ctx).await {
                Ok(transport) => return Ok((address.clone(), transport)),
                Err(e @ DriverError::Authentication(_)) => return Err(e),
                Err(e) => {
                    warn!(address = %address, "Failed to connect: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(DriverError::service_unavailable(match last_error {
            Some(e) if count == 1 => e.to_string(),
            Some(e) => format!("Unable to connect to any of {} servers, last error: {}", count, e),
            None => "No servers to connect to".to_string(),
        }))
    }

    fn expired(&self, created_at: Instant) -> bool {
        self.config
            .max_lifetime
            .map_or(false, |lifetime| created_at.elapsed() >= lifetime)
    }

    async fn close_transport(&self, transport: &mut Box<dyn Transport>) {
        self.total_closed.fetch_add(1, Ordering::Relaxed);
        transport.close().await;
    }

    /// 연결 반환
    ///
    /// 깨졌거나 수명이 지났거나 트랜스포트가 준비 상태가 아니면 닫는다.
    pub async fn release(&self, mut conn: PooledConnection) {
        let Some(mut transport) = conn.transport.take() else {
            return;
        };
        let permit = conn.permit.take();
        self.in_use.fetch_sub(1, Ordering::SeqCst);
        self.total_releases.fetch_add(1, Ordering::Relaxed);
        trace!(connection_id = conn.id, state = ?conn.state, "Connection released");

        let reusable = !self.is_closed()
            && conn.state != ConnectionState::Broken
            && transport.state() == TransportState::Ready
            && !self.expired(conn.created_at);

        if reusable {
            self.idle_connections.lock().push_back(IdleConnection {
                id: conn.id,
                address: conn.address.clone(),
                transport,
                created_at: conn.created_at,
                idle_since: Instant::now(),
            });
        } else {
            debug!(connection_id = conn.id, state = ?conn.state, "Closing released connection");
            conn.state = ConnectionState::Closed;
            self.close_transport(&mut transport).await;
        }

        // 유휴 큐에 넣은 뒤에 퍼밋을 놓아야 대기자가 그 연결을 받는다
        drop(permit);
    }

    /// 풀 닫기
    ///
    /// 대기 중인 획득은 `ClientClosed` 로 끝나고 유휴 연결은 모두 닫힌다.
    /// 사용 중인 연결은 반환될 때 닫힌다.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.semaphore.close();

        let idle: Vec<IdleConnection> = self.idle_connections.lock().drain(..).collect();
        let count = idle.len();
        for mut conn in idle {
            self.close_transport(&mut conn.transport).await;
        }
        info!(closed_idle = count, in_use = self.in_use_count(), "Connection pool closed");
    }

    /// 연결 확인 (획득 후 RESET)
    pub async fn verify_connectivity(self: &Arc<Self>) -> DriverResult<()> {
        let mut conn = self.acquire().await?;
        let result = conn.transport()?.reset().await;
        if result.is_err() {
            conn.mark_broken();
        }
        conn.release().await;
        result
    }

    /// 연결 풀 워밍업
    ///
    /// 유휴 연결을 `count` 개까지 미리 만든다 (`max_size` 로 제한).
    /// 첫 연결부터 실패하면 에러, 일부 성공하면 만든 개수를 돌려준다.
    pub async fn warmup(&self, count: usize) -> DriverResult<usize> {
        if self.is_closed() {
            return Err(DriverError::ClientClosed);
        }

        let target = count.min(self.config.max_size);
        let mut created = 0;

        while self.size() < target {
            let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
                break;
            };
            match self.connect_any().await {
                Ok((address, transport)) => {
                    let now = Instant::now();
                    self.idle_connections.lock().push_back(IdleConnection {
                        id: self.next_id.fetch_add(1, Ordering::Relaxed),
                        address,
                        transport,
                        created_at: now,
                        idle_since: now,
                    });
                    self.total_created.fetch_add(1, Ordering::Relaxed);
                    created += 1;
                    drop(permit);
                }
                Err(e) => {
                    warn!("Warmup connection failed: {}", e);
                    if created == 0 {
                        return Err(e);
                    }
                    break;
                }
            }
        }

        Ok(created)
    }

    /// 메트릭 조회
    pub fn metrics(&self) -> PoolMetrics {
        let idle = self.idle_count();
        let in_use = self.in_use_count();

        PoolMetrics {
            max_size: self.config.max_size,
            size: idle + in_use,
            idle,
            in_use,
            total_acquisitions: self.total_acquisitions.load(Ordering::Relaxed),
            total_releases: self.total_releases.load(Ordering::Relaxed),
            total_created: self.total_created.load(Ordering::Relaxed),
            total_closed: self.total_closed.load(Ordering::Relaxed),
            total_timeouts: self.total_timeouts.load(Ordering::Relaxed),
            failed_health_checks: self.failed_health_checks.load(Ordering::Relaxed),
        }
    }

    /// 풀 크기
    pub fn size(&self) -> usize {
        self.idle_count() + self.in_use_count()
    }

    /// 유휴 연결 수
    pub fn idle_count(&self) -> usize {
        self.idle_connections.lock().len()
    }

    /// 사용 중인 연결 수
    pub fn in_use_count(&self) -> usize {
        self.in_use.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("addresses", &self.addresses)
            .field("size", &self.size())
            .field("idle", &self.idle_count())
            .field("in_use", &self.in_use_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
