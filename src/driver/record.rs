//! Record - 쿼리 결과 레코드
//!
//! 결과 행 하나. 같은 결과의 레코드들은 키 목록을 공유한다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::{DriverError, DriverResult};
use super::types::{Node, Value};

/// 결과 컬럼 키 (레코드 간 공유)
pub type Keys = Arc<[String]>;

// ============================================================================
// Record - 단일 레코드
// ============================================================================

/// 쿼리 결과 레코드 (불변)
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    keys: Keys,
    values: Vec<Value>,
}

impl Record {
    /// 새 레코드 생성
    ///
    /// 값의 개수는 키의 개수와 같아야 한다.
    pub fn new(keys: Keys, values: Vec<Value>) -> DriverResult<Self> {
        if keys.len() != values.len() {
            return Err(DriverError::type_conversion(format!(
                "Record has {} keys but {} values",
                keys.len(),
                values.len()
            )));
        }
        Ok(Self { keys, values })
    }

    /// 키-값 쌍에서 레코드 생성
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let (keys, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            keys: keys.into(),
            values,
        }
    }

    /// 키 목록
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 공유 키 핸들
    pub fn shared_keys(&self) -> Keys {
        Arc::clone(&self.keys)
    }

    /// 값 목록
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// 컬럼 수
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 빈 레코드 여부
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 키 존재 여부
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// 키로 값 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|i| &self.values[i])
    }

    /// 인덱스로 값 조회
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// 키로 값 조회 (타입 변환)
    pub fn get_as<T>(&self, key: &str) -> DriverResult<T>
    where
        T: TryFrom<Value, Error = DriverError>,
    {
        let value = self
            .get(key)
            .cloned()
            .ok_or_else(|| DriverError::type_conversion(format!("Key '{}' not found", key)))?;
        T::try_from(value)
    }

    /// 정수 값
    pub fn get_int(&self, key: &str) -> DriverResult<i64> {
        self.get_as(key)
    }

    /// 문자열 값
    pub fn get_string(&self, key: &str) -> DriverResult<String> {
        self.get_as(key)
    }

    /// 노드 값
    pub fn get_node(&self, key: &str) -> DriverResult<Node> {
        self.get_as(key)
    }

    /// Null 이거나 없는 키는 None
    pub fn get_optional<T>(&self, key: &str) -> DriverResult<Option<T>>
    where
        T: TryFrom<Value, Error = DriverError>,
    {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => T::try_from(v.clone()).map(Some),
        }
    }

    /// 맵으로 변환
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.keys
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }

    /// 값 소유권 가져오기
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.keys.iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        write!(f, "}}")
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::iter::Zip<std::slice::Iter<'a, String>, std::slice::Iter<'a, Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter().zip(self.values.iter())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Keys {
        names.iter().map(|s| s.to_string()).collect::<Vec<_>>().into()
    }

    #[test]
    fn test_record_lookup() {
        let record = Record::new(
            keys(&["name", "age", "nickname"]),
            vec![Value::from("Alice"), Value::Integer(30), Value::Null],
        )
        .unwrap();

        assert_eq!(record.len(), 3);
        assert_eq!(record.get_string("name").unwrap(), "Alice");
        assert_eq!(record.get_int("age").unwrap(), 30);
        assert_eq!(record.get_optional::<String>("nickname").unwrap(), None);
        assert_eq!(record.get_optional::<i64>("missing").unwrap(), None);
        assert_eq!(record.get_by_index(1), Some(&Value::Integer(30)));
        assert!(record.contains_key("age"));
        assert!(record.get_int("name").is_err());
    }

    #[test]
    fn test_record_arity_mismatch() {
        let err = Record::new(keys(&["a", "b"]), vec![Value::Integer(1)]).unwrap_err();
        assert!(matches!(err, DriverError::TypeConversion(_)));
    }

    #[test]
    fn test_records_share_keys() {
        let shared = keys(&["n"]);
        let a = Record::new(Arc::clone(&shared), vec![Value::Integer(1)]).unwrap();
        let b = Record::new(Arc::clone(&shared), vec![Value::Integer(2)]).unwrap();

        assert!(Arc::ptr_eq(&a.shared_keys(), &b.shared_keys()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_display_and_iter() {
        let record = Record::from_pairs([("x", Value::Integer(1)), ("y", Value::from("b"))]);

        assert_eq!(record.to_string(), "{x: 1, y: \"b\"}");

        let keys: Vec<&String> = (&record).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["x", "y"]);

        let map = record.to_map();
        assert_eq!(map.get("y"), Some(&Value::from("b")));
    }
}
