//! Client Options
//!
//! 클라이언트 설정, 인증, 암호화 옵션
//!
//! 모든 옵션은 빌더로 만들고 `build()` 시점에 한꺼번에 검증한다.
//! JSON 키는 camelCase 이며 시간 값은 밀리초로 표현한다.
//!
//! ```
//! use neo4j_async_client::driver::{AuthOptions, ClientOptions};
//! use std::time::Duration;
//!
//! let options = ClientOptions::builder()
//!     .with_host("db.internal")
//!     .with_auth(AuthOptions::basic("neo4j", "secret"))
//!     .with_max_connection_pool_size(20)
//!     .with_connection_acquisition_timeout(Duration::from_secs(5))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(options.single_node_uri(), "bolt://db.internal:7687");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{DriverError, DriverResult};
use super::pool::PoolConfig;
use super::types::Value;

/// 기본 단일 노드 호스트
pub const DEFAULT_HOST: &str = "localhost";
/// 기본 Bolt 포트
pub const DEFAULT_PORT: u16 = 7687;
/// 기본 사용자명
pub const DEFAULT_USERNAME: &str = "neo4j";
/// 기본 비밀번호
pub const DEFAULT_PASSWORD: &str = "neo4j";

const SUPPORTED_SCHEMES: &[&str] = &[
    "bolt",
    "bolt+s",
    "bolt+ssc",
    "bolt+routing",
    "neo4j",
    "neo4j+s",
    "neo4j+ssc",
];

// ============================================================================
// ServerAddress - 서버 주소
// ============================================================================

/// 서버 주소
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    /// 호스트
    pub host: String,
    /// 포트
    pub port: u16,
}

impl ServerAddress {
    /// 새 서버 주소 생성
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `scheme://host[:port]` 형식의 URI 파싱
    pub fn from_uri(uri: &str) -> DriverResult<Self> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| DriverError::configuration(format!("Invalid Neo4j node URI '{}'", uri)))?;

        if !SUPPORTED_SCHEMES.contains(&scheme) {
            return Err(DriverError::configuration(format!(
                "Unsupported URI scheme '{}' in '{}'",
                scheme, uri
            )));
        }

        let authority = rest.split(['/', '?']).next().unwrap_or_default();
        let (host, port) = match authority.strip_prefix('[') {
            Some(v6) => {
                let (host, tail) = v6
                    .split_once(']')
                    .ok_or_else(|| DriverError::configuration(format!("Invalid IPv6 host in '{}'", uri)))?;
                (host, tail.strip_prefix(':'))
            }
            None => match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            },
        };

        if host.is_empty() {
            return Err(DriverError::configuration(format!("Missing host in '{}'", uri)));
        }

        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| DriverError::configuration(format!("Invalid port in '{}'", uri)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

// ============================================================================
// AuthToken - 커넥터에 전달되는 인증 정보
// ============================================================================

/// 인증 토큰
#[derive(Clone, PartialEq)]
pub enum AuthToken {
    /// 인증 없음
    None,
    /// Basic 인증
    Basic {
        username: String,
        password: String,
        realm: Option<String>,
    },
    /// Bearer 토큰
    Bearer { token: String },
    /// Kerberos (base64 티켓)
    Kerberos { ticket: String },
    /// 커스텀 스킴
    Custom {
        principal: String,
        credentials: String,
        realm: Option<String>,
        scheme: String,
        parameters: HashMap<String, Value>,
    },
}

impl AuthToken {
    /// 인증 스킴 이름
    pub fn scheme(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } => "bearer",
            Self::Kerberos { .. } => "kerberos",
            Self::Custom { scheme, .. } => scheme,
        }
    }

    /// 주체 (사용자명)
    pub fn principal(&self) -> Option<&str> {
        match self {
            Self::Basic { username, .. } => Some(username),
            Self::Custom { principal, .. } => Some(principal),
            _ => None,
        }
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("AuthToken");
        s.field("scheme", &self.scheme());
        if let Some(principal) = self.principal() {
            s.field("principal", &principal);
        }
        s.finish_non_exhaustive()
    }
}

// ============================================================================
// AuthOptions - 인증 옵션
// ============================================================================

/// 인증 스킴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthScheme {
    /// 인증 없음
    None,
    /// 사용자명/비밀번호
    #[default]
    Basic,
    /// Kerberos 티켓
    Kerberos,
    /// Bearer 토큰
    Bearer,
    /// 커스텀 스킴
    Custom,
}

/// 인증 옵션
///
/// `Debug` 와 JSON 직렬화 모두 비밀번호를 내보내지 않는다.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthOptions {
    /// 인증 스킴
    pub auth_scheme: AuthScheme,
    /// 사용자명 (custom 스킴의 principal)
    pub username: String,
    /// 비밀번호 (custom 스킴의 credentials)
    #[serde(skip_serializing)]
    pub password: String,
    /// custom 스킴 이름
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// realm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    /// 스킴별 파라미터
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub parameters: HashMap<String, Value>,
    /// Kerberos 티켓 또는 Bearer 토큰
    #[serde(rename = "base64EncodedTicket", skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,
}

impl AuthOptions {
    /// 빌더 시작
    pub fn builder() -> AuthOptionsBuilder {
        AuthOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Basic 인증
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth_scheme: AuthScheme::Basic,
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// 인증 없음
    pub fn none() -> Self {
        Self {
            auth_scheme: AuthScheme::None,
            ..Self::default()
        }
    }

    /// Kerberos 인증
    pub fn kerberos(base64_ticket: impl Into<String>) -> Self {
        Self {
            auth_scheme: AuthScheme::Kerberos,
            ticket: Some(base64_ticket.into()),
            ..Self::default()
        }
    }

    /// Bearer 인증
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            auth_scheme: AuthScheme::Bearer,
            ticket: Some(token.into()),
            ..Self::default()
        }
    }

    /// 옵션 검증
    pub fn validate(&self) -> DriverResult<()> {
        match self.auth_scheme {
            AuthScheme::None => Ok(()),
            AuthScheme::Basic if self.username.is_empty() => {
                Err(DriverError::configuration("Basic auth requires a username"))
            }
            AuthScheme::Basic => Ok(()),
            AuthScheme::Kerberos | AuthScheme::Bearer => match self.ticket.as_deref() {
                Some(t) if !t.is_empty() => Ok(()),
                _ => Err(DriverError::configuration(format!(
                    "{:?} auth requires a ticket",
                    self.auth_scheme
                ))),
            },
            AuthScheme::Custom => match self.scheme.as_deref() {
                Some(s) if !s.is_empty() => Ok(()),
                _ => Err(DriverError::configuration("Custom auth requires a scheme name")),
            },
        }
    }

    /// 커넥터에 넘길 인증 토큰
    pub fn auth_token(&self) -> AuthToken {
        let ticket = self.ticket.clone().unwrap_or_default();
        match self.auth_scheme {
            AuthScheme::None => AuthToken::None,
            AuthScheme::Basic => AuthToken::Basic {
                username: self.username.clone(),
                password: self.password.clone(),
                realm: self.realm.clone(),
            },
            AuthScheme::Kerberos => AuthToken::Kerberos { ticket },
            AuthScheme::Bearer => AuthToken::Bearer { token: ticket },
            AuthScheme::Custom => AuthToken::Custom {
                principal: self.username.clone(),
                credentials: self.password.clone(),
                realm: self.realm.clone(),
                scheme: self.scheme.clone().unwrap_or_default(),
                parameters: self.parameters.clone(),
            },
        }
    }
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            auth_scheme: AuthScheme::Basic,
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            scheme: None,
            realm: None,
            parameters: HashMap::new(),
            ticket: None,
        }
    }
}

impl fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.parameters.keys().collect();
        keys.sort();
        f.debug_struct("AuthOptions")
            .field("auth_scheme", &self.auth_scheme)
            .field("username", &self.username)
            .field("password", &"***")
            .field("scheme", &self.scheme)
            .field("realm", &self.realm)
            .field("parameter_keys", &keys)
            .field("ticket", &self.ticket.as_ref().map(|_| "***"))
            .finish()
    }
}

/// 인증 옵션 빌더
pub struct AuthOptionsBuilder {
    options: AuthOptions,
}

impl AuthOptionsBuilder {
    /// 인증 스킴 설정
    pub fn with_scheme(mut self, scheme: AuthScheme) -> Self {
        self.options.auth_scheme = scheme;
        self
    }

    /// 사용자명/비밀번호 설정
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.options.username = username.into();
        self.options.password = password.into();
        self
    }

    /// custom 스킴 이름 설정
    pub fn with_custom_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.options.auth_scheme = AuthScheme::Custom;
        self.options.scheme = Some(scheme.into());
        self
    }

    /// realm 설정
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.options.realm = Some(realm.into());
        self
    }

    /// 티켓 (Kerberos) 또는 토큰 (Bearer) 설정
    pub fn with_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.options.ticket = Some(ticket.into());
        self
    }

    /// 스킴 파라미터 추가 (같은 키는 덮어씀)
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.parameters.insert(key.into(), value.into());
        self
    }

    /// 빌드
    pub fn build(self) -> DriverResult<AuthOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}

// ============================================================================
// EncryptionOptions - 암호화 옵션
// ============================================================================

/// TLS 신뢰 전략
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustStrategy {
    /// 모든 인증서 신뢰
    TrustAllCertificates,
    /// 지정한 CA 가 서명한 인증서만 신뢰
    TrustCustomCaSignedCertificates,
    /// 시스템 CA 가 서명한 인증서 신뢰
    #[default]
    TrustSystemCaSignedCertificates,
}

/// 암호화 옵션
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncryptionOptions {
    /// 신뢰 전략
    pub strategy: TrustStrategy,
    /// 인증서 파일 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_file_path: Option<PathBuf>,
    /// 호스트명 검증
    pub hostname_verification: bool,
}

impl EncryptionOptions {
    /// 빌더 시작
    pub fn builder() -> EncryptionOptionsBuilder {
        EncryptionOptionsBuilder {
            options: Self::default(),
        }
    }

    /// 옵션 검증
    pub fn validate(&self) -> DriverResult<()> {
        if self.strategy == TrustStrategy::TrustCustomCaSignedCertificates
            && self.certificate_file_path.is_none()
        {
            return Err(DriverError::configuration(
                "Custom CA trust strategy requires a certificate file path",
            ));
        }
        Ok(())
    }
}

impl Default for EncryptionOptions {
    fn default() -> Self {
        Self {
            strategy: TrustStrategy::default(),
            certificate_file_path: None,
            hostname_verification: true,
        }
    }
}

/// 암호화 옵션 빌더
pub struct EncryptionOptionsBuilder {
    options: EncryptionOptions,
}

impl EncryptionOptionsBuilder {
    /// 신뢰 전략 설정
    pub fn with_strategy(mut self, strategy: TrustStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    /// 인증서 경로 설정
    pub fn with_certificate_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.certificate_file_path = Some(path.into());
        self
    }

    /// 호스트명 검증 설정
    pub fn with_hostname_verification(mut self, enabled: bool) -> Self {
        self.options.hostname_verification = enabled;
        self
    }

    /// 빌드
    pub fn build(self) -> DriverResult<EncryptionOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}

// ============================================================================
// ClientOptions - 클라이언트 설정
// ============================================================================

/// 클라이언트 설정 (생성 후 불변)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientOptions {
    /// 단일 노드 호스트
    pub host: String,
    /// 단일 노드 포트
    pub port: u16,
    /// 클러스터 노드 URI (비어있지 않으면 클러스터 모드)
    #[serde(rename = "clusterNodeURIs", skip_serializing_if = "Vec::is_empty")]
    pub cluster_node_uris: Vec<String>,
    /// 인증 옵션
    pub auth_options: AuthOptions,
    /// 암호화 사용 여부
    #[serde(rename = "encryptionEnabled")]
    pub encrypted: bool,
    /// 암호화 옵션
    pub encryption_options: EncryptionOptions,
    /// 연결 풀 최대 크기
    pub max_connection_pool_size: usize,
    /// 연결 획득 타임아웃
    #[serde(rename = "connectionAcquisitionTimeout", with = "millis")]
    pub connection_acquisition_timeout: Duration,
    /// 연결 최대 수명 (None 이면 무제한)
    #[serde(rename = "maxConnectionLifetime", with = "optional_millis")]
    pub max_connection_lifetime: Option<Duration>,
    /// 이 시간 이상 유휴 상태인 연결은 재사용 전에 검사 (None 이면 검사 안 함)
    #[serde(with = "optional_millis")]
    pub idle_time_before_connection_test: Option<Duration>,
    /// 이벤트 루프 스레드 수 (0 이면 런타임 기본값)
    #[serde(rename = "numberOfEventLoopThreads")]
    pub event_loop_threads: usize,
    /// 스트리밍 시 한 번에 가져오는 레코드 수
    pub fetch_size: usize,
    /// 메트릭 활성화
    #[serde(rename = "driverMetricsEnabled")]
    pub metrics_enabled: bool,
    /// 누수된 세션 로깅
    pub log_leaked_sessions: bool,
    /// User Agent
    pub user_agent: String,
}

impl ClientOptions {
    /// 빌더 시작
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder {
            options: Self::default(),
        }
    }

    /// JSON 에서 읽기 (누락된 키는 기본값)
    pub fn from_json(json: &str) -> DriverResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// JSON 으로 쓰기 (비밀번호 제외)
    pub fn to_json(&self) -> DriverResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 전체 옵션 검증
    pub fn validate(&self) -> DriverResult<()> {
        if self.host.trim().is_empty() {
            return Err(DriverError::configuration("Host must not be empty"));
        }
        if self.port == 0 {
            return Err(DriverError::configuration("Port must be positive"));
        }
        if self.max_connection_pool_size == 0 {
            return Err(DriverError::configuration("Max connection pool size must be positive"));
        }
        if self.connection_acquisition_timeout.is_zero() {
            return Err(DriverError::configuration(
                "Connection acquisition timeout must be positive",
            ));
        }
        if self.fetch_size == 0 {
            return Err(DriverError::configuration("Fetch size must be positive"));
        }
        if matches!(self.max_connection_lifetime, Some(d) if d.is_zero()) {
            return Err(DriverError::configuration(
                "Max connection lifetime must be positive when set",
            ));
        }
        for uri in &self.cluster_node_uris {
            ServerAddress::from_uri(uri)?;
        }
        self.auth_options.validate()?;
        if self.encrypted {
            self.encryption_options.validate()?;
        }
        Ok(())
    }

    /// 클러스터 모드 여부
    pub fn is_cluster_mode(&self) -> bool {
        !self.cluster_node_uris.is_empty()
    }

    /// 단일 노드 URI
    pub fn single_node_uri(&self) -> String {
        format!("bolt://{}", ServerAddress::new(self.host.clone(), self.port))
    }

    /// 연결 대상 주소 목록
    pub fn addresses(&self) -> DriverResult<Vec<ServerAddress>> {
        if self.is_cluster_mode() {
            self.cluster_node_uris
                .iter()
                .map(|uri| ServerAddress::from_uri(uri))
                .collect()
        } else {
            Ok(vec![ServerAddress::new(self.host.clone(), self.port)])
        }
    }

    /// 풀 설정으로 변환
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::builder()
            .with_max_size(self.max_connection_pool_size)
            .with_acquisition_timeout(self.connection_acquisition_timeout)
            .with_max_lifetime(self.max_connection_lifetime)
            .with_idle_before_test(self.idle_time_before_connection_test)
            .with_log_leaks(self.log_leaked_sessions)
            .build()
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cluster_node_uris: Vec::new(),
            auth_options: AuthOptions::default(),
            encrypted: false,
            encryption_options: EncryptionOptions::default(),
            max_connection_pool_size: 100,
            connection_acquisition_timeout: Duration::from_secs(60),
            max_connection_lifetime: Some(Duration::from_secs(3600)),
            idle_time_before_connection_test: None,
            event_loop_threads: 0,
            fetch_size: 1000,
            metrics_enabled: false,
            log_leaked_sessions: false,
            user_agent: format!("neo4j-async-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// ============================================================================
// ClientOptionsBuilder - 설정 빌더
// ============================================================================

/// 클라이언트 설정 빌더
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    /// 호스트 설정
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.options.host = host.into();
        self
    }

    /// 포트 설정
    pub fn with_port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// 클러스터 노드 URI 추가 (중복은 무시)
    pub fn add_cluster_node_uri(mut self, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        if !self.options.cluster_node_uris.contains(&uri) {
            self.options.cluster_node_uris.push(uri);
        }
        self
    }

    /// 인증 옵션 설정
    pub fn with_auth(mut self, auth: AuthOptions) -> Self {
        self.options.auth_options = auth;
        self
    }

    /// 암호화 사용 여부 설정
    pub fn with_encrypted(mut self, encrypted: bool) -> Self {
        self.options.encrypted = encrypted;
        self
    }

    /// 암호화 옵션 설정
    pub fn with_encryption(mut self, encryption: EncryptionOptions) -> Self {
        self.options.encryption_options = encryption;
        self
    }

    /// 연결 풀 크기 설정
    pub fn with_max_connection_pool_size(mut self, size: usize) -> Self {
        self.options.max_connection_pool_size = size;
        self
    }

    /// 연결 획득 타임아웃 설정
    pub fn with_connection_acquisition_timeout(mut self, timeout: Duration) -> Self {
        self.options.connection_acquisition_timeout = timeout;
        self
    }

    /// 연결 최대 수명 설정
    pub fn with_max_connection_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.options.max_connection_lifetime = lifetime;
        self
    }

    /// 유휴 연결 검사 기준 설정
    pub fn with_idle_time_before_connection_test(mut self, idle: Option<Duration>) -> Self {
        self.options.idle_time_before_connection_test = idle;
        self
    }

    /// 이벤트 루프 스레드 수 설정
    pub fn with_event_loop_threads(mut self, threads: usize) -> Self {
        self.options.event_loop_threads = threads;
        self
    }

    /// Fetch Size 설정
    pub fn with_fetch_size(mut self, size: usize) -> Self {
        self.options.fetch_size = size;
        self
    }

    /// 메트릭 설정
    pub fn with_metrics_enabled(mut self, enabled: bool) -> Self {
        self.options.metrics_enabled = enabled;
        self
    }

    /// 누수 세션 로깅 설정
    pub fn with_log_leaked_sessions(mut self, enabled: bool) -> Self {
        self.options.log_leaked_sessions = enabled;
        self
    }

    /// User Agent 설정
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = user_agent.into();
        self
    }

    /// 검증 후 빌드
    pub fn build(self) -> DriverResult<ClientOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}

// ============================================================================
// serde helpers
// ============================================================================

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// `null`, 0, 음수는 "사용 안 함"
mod optional_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_i64(d.as_millis() as i64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let millis = Option::<i64>::deserialize(deserializer)?;
        Ok(millis
            .filter(|m| *m > 0)
            .map(|m| Duration::from_millis(m as u64)))
    }
}

// ============================================================================
// Tests
// ============================================================================
