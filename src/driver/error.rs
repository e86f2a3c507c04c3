//! Driver Error Types
//!
//! 클라이언트 에러 정의

use std::io;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// DriverError - 클라이언트 에러
// ============================================================================

/// 클라이언트 에러
#[derive(Error, Debug)]
pub enum DriverError {
    /// 연결 획득 타임아웃 (풀 고갈)
    #[error("Connection acquisition timed out after {0:?}")]
    ConnectionAcquisitionTimeout(Duration),

    /// 끊어진 연결 (헬스 체크 실패 또는 사용 중 장애)
    #[error("Connection broken: {0}")]
    ConnectionBroken(String),

    /// 연결 에러
    #[error("Connection error: {0}")]
    Connection(String),

    /// 서비스 불가
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 인증 에러
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// 서버가 보고한 쿼리 실패
    #[error("Query error: {code} - {message}")]
    Query {
        /// Neo4j 상태 코드
        code: String,
        /// 서버 메시지
        message: String,
    },

    /// 종료된 트랜잭션에 대한 작업
    #[error("Transaction state error: {0}")]
    TransactionState(String),

    /// 소비자가 스트림을 중단함
    #[error("Stream cancelled: {0}")]
    StreamCancelled(String),

    /// 닫힌 클라이언트
    #[error("Client closed")]
    ClientClosed,

    /// 결과 없음
    #[error("Expected exactly one record but the query returned none")]
    NoResult,

    /// 결과가 둘 이상
    #[error("Expected exactly one record but the query returned {0}")]
    MultipleResults(usize),

    /// 배치 실패 (실패한 쿼리 인덱스 포함)
    #[error("Batch failed at query {index}: {source}")]
    BatchFailure {
        /// 실패한 쿼리 인덱스
        index: usize,
        /// 원래 에러
        #[source]
        source: Box<DriverError>,
    },

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 타입 변환 에러
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// 직렬화 에러
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DriverError {
    /// 연결 에러 생성
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// 끊어진 연결 에러 생성
    pub fn broken(msg: impl Into<String>) -> Self {
        Self::ConnectionBroken(msg.into())
    }

    /// 인증 에러 생성
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// 쿼리 에러 생성
    pub fn query(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 트랜잭션 상태 에러 생성
    pub fn transaction_state(msg: impl Into<String>) -> Self {
        Self::TransactionState(msg.into())
    }

    /// 스트림 취소 에러 생성
    pub fn stream_cancelled(msg: impl Into<String>) -> Self {
        Self::StreamCancelled(msg.into())
    }

    /// 설정 에러 생성
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 서비스 불가 에러 생성
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// 타입 변환 에러 생성
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }

    /// 배치 실패로 감싸기
    pub fn batch(index: usize, source: DriverError) -> Self {
        Self::BatchFailure {
            index,
            source: Box::new(source),
        }
    }

    /// 서버 에러 코드 (쿼리 실패인 경우)
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Query { code, .. } => Some(code),
            Self::BatchFailure { source, .. } => source.code(),
            _ => None,
        }
    }

    /// 연결 수준 에러 여부
    ///
    /// 이 에러를 겪은 연결은 풀로 돌아가지 않고 폐기된다.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::ConnectionBroken(_) | Self::Io(_)
        )
    }

    /// 재시도 가능 여부
    ///
    /// 클라이언트는 스스로 재시도하지 않는다. 호출자가 판단할 때 쓴다.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_)
            | Self::ConnectionBroken(_)
            | Self::ConnectionAcquisitionTimeout(_)
            | Self::ServiceUnavailable(_) => true,
            Self::Query { code, .. } => is_retryable_code(code),
            Self::BatchFailure { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// 클라이언트 에러 여부
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Authentication(_)
            | Self::Configuration(_)
            | Self::TypeConversion(_)
            | Self::TransactionState(_)
            | Self::NoResult
            | Self::MultipleResults(_) => true,
            Self::Query { code, .. } => code.starts_with("Neo.ClientError"),
            _ => false,
        }
    }
}

/// 재시도 가능한 에러 코드 확인
fn is_retryable_code(code: &str) -> bool {
    code.starts_with("Neo.TransientError")
        || code == "Neo.ClientError.Cluster.NotALeader"
        || code == "Neo.ClientError.General.ForbiddenOnReadOnlyDatabase"
}

// ============================================================================
// Result Type
// ============================================================================

/// 클라이언트 결과 타입
pub type DriverResult<T> = Result<T, DriverError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_creation() {
        let err = DriverError::connection("Connection refused");
        assert!(matches!(err, DriverError::Connection(_)));

        let err = DriverError::authentication("Invalid credentials");
        assert!(matches!(err, DriverError::Authentication(_)));

        let err = DriverError::query("Neo.ClientError.Statement.SyntaxError", "Invalid syntax");
        assert!(matches!(err, DriverError::Query { .. }));
    }

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::connection("Connection refused");
        assert_eq!(err.to_string(), "Connection error: Connection refused");

        let err = DriverError::query("Neo.ClientError.Statement.SyntaxError", "Invalid syntax");
        assert_eq!(
            err.to_string(),
            "Query error: Neo.ClientError.Statement.SyntaxError - Invalid syntax"
        );

        assert_eq!(DriverError::ClientClosed.to_string(), "Client closed");
        assert_eq!(
            DriverError::MultipleResults(3).to_string(),
            "Expected exactly one record but the query returned 3"
        );
    }

    #[test]
    fn test_batch_failure_keeps_index_and_source() {
        let err = DriverError::batch(
            1,
            DriverError::query("Neo.ClientError.Schema.ConstraintValidationFailed", "exists"),
        );

        match &err {
            DriverError::BatchFailure { index, source } => {
                assert_eq!(*index, 1);
                assert!(matches!(**source, DriverError::Query { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.code(), Some("Neo.ClientError.Schema.ConstraintValidationFailed"));
        assert!(err.to_string().starts_with("Batch failed at query 1"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_driver_error_retryable() {
        assert!(DriverError::connection("Connection refused").is_retryable());
        assert!(DriverError::ConnectionAcquisitionTimeout(Duration::from_secs(1)).is_retryable());
        assert!(!DriverError::authentication("Invalid credentials").is_retryable());
        assert!(!DriverError::ClientClosed.is_retryable());

        let err = DriverError::query("Neo.TransientError.General.TemporarilyUnavailable", "Server busy");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_driver_error_client_error() {
        assert!(DriverError::authentication("Invalid credentials").is_client_error());
        assert!(DriverError::configuration("Invalid URI").is_client_error());
        assert!(DriverError::NoResult.is_client_error());
        assert!(!DriverError::connection("Connection refused").is_client_error());
        assert!(!DriverError::query("Neo.DatabaseError.General.UnknownError", "boom").is_client_error());
    }

    #[test]
    fn test_connection_error_classification() {
        assert!(DriverError::broken("reset failed").is_connection_error());
        assert!(DriverError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe")).is_connection_error());
        assert!(!DriverError::query("Neo.ClientError.Statement.SyntaxError", "x").is_connection_error());
        assert!(!DriverError::transaction_state("committed").is_connection_error());
    }
}
