//! Query
//!
//! 쿼리, 접근 모드, 북마크, 결과 묶음

use std::fmt;

use super::error::{DriverError, DriverResult};
use super::record::{Keys, Record};
use super::summary::ResultSummary;
use super::types::{Params, Value};

// ============================================================================
// AccessMode - 접근 모드
// ============================================================================

/// 접근 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// 읽기
    Read,
    /// 쓰기
    #[default]
    Write,
}

// ============================================================================
// Bookmark - 북마크
// ============================================================================

/// 커밋된 트랜잭션을 가리키는 북마크 (인과적 연결용)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bookmark(String);

impl Bookmark {
    /// 새 북마크 생성
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 북마크 값
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Bookmark {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// Query - 쿼리
// ============================================================================

/// Cypher 쿼리와 파라미터
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// 쿼리 텍스트
    pub text: String,
    /// 파라미터 (키는 유일)
    pub parameters: Params,
}

impl Query {
    /// 새 쿼리 생성
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Params::new(),
        }
    }

    /// 파라미터 추가 (같은 키는 덮어씀)
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// 파라미터 여러 개 추가
    pub fn with_params(mut self, params: Params) -> Self {
        self.parameters.extend(params);
        self
    }

    /// 선택적 파라미터를 붙여서 쿼리 생성
    pub(crate) fn prepare(query: impl Into<Query>, params: Option<Params>) -> Self {
        let query = query.into();
        match params {
            Some(p) => query.with_params(p),
            None => query,
        }
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ============================================================================
// QueryResult - 쿼리 결과
// ============================================================================

/// 모두 수집된 쿼리 결과
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// 컬럼 키
    pub keys: Keys,
    /// 레코드
    pub records: Vec<Record>,
    /// 결과 요약
    pub summary: ResultSummary,
}

impl QueryResult {
    /// 레코드 수
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 빈 결과 여부
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 정확히 하나의 레코드
    ///
    /// 0개면 `NoResult`, 2개 이상이면 `MultipleResults`.
    pub fn single(mut self) -> DriverResult<Record> {
        match self.records.len() {
            0 => Err(DriverError::NoResult),
            1 => Ok(self.records.remove(0)),
            n => Err(DriverError::MultipleResults(n)),
        }
    }

    /// 첫 번째 레코드
    pub fn first(self) -> Option<Record> {
        self.records.into_iter().next()
    }
}

impl IntoIterator for QueryResult {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn result_with(rows: i64) -> QueryResult {
        let keys: Keys = Arc::from(vec!["n".to_string()]);
        QueryResult {
            records: (0..rows)
                .map(|i| Record::new(Arc::clone(&keys), vec![Value::Integer(i)]).unwrap())
                .collect(),
            keys,
            summary: ResultSummary::default(),
        }
    }

    #[test]
    fn test_query_params() {
        let query = Query::new("MATCH (n {name: $name}) RETURN n")
            .with_param("name", "Alice")
            .with_param("name", "Bob");

        assert_eq!(query.parameters.len(), 1);
        assert_eq!(query.parameters.get("name"), Some(&Value::from("Bob")));
        assert_eq!(query.to_string(), "MATCH (n {name: $name}) RETURN n");
    }

    #[test]
    fn test_prepare_merges_params() {
        let mut params = Params::new();
        params.insert("limit".into(), Value::Integer(5));

        let query = Query::prepare("RETURN $limit", Some(params));
        assert_eq!(query.parameters.get("limit"), Some(&Value::Integer(5)));

        let query = Query::prepare(String::from("RETURN 1"), None);
        assert!(query.parameters.is_empty());
    }

    #[test]
    fn test_single_record_policy() {
        assert!(matches!(result_with(0).single(), Err(DriverError::NoResult)));
        assert_eq!(result_with(1).single().unwrap().get_int("n").unwrap(), 0);
        assert!(matches!(result_with(3).single(), Err(DriverError::MultipleResults(3))));
    }

    #[test]
    fn test_access_mode_default_is_write() {
        assert_eq!(AccessMode::default(), AccessMode::Write);
        assert_eq!(Bookmark::from("bm:1").value(), "bm:1");
    }
}
