//! Value Types
//!
//! 쿼리 파라미터와 결과 레코드에 쓰이는 값 모델

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::error::{DriverError, DriverResult};

/// 쿼리 파라미터 맵 (키는 유일)
pub type Params = HashMap<String, Value>;

// ============================================================================
// Value - 그래프 값
// ============================================================================

/// 클라이언트가 표현할 수 있는 값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null
    Null,
    /// Boolean
    Boolean(bool),
    /// Integer (i64)
    Integer(i64),
    /// Float (f64)
    Float(f64),
    /// String
    String(String),
    /// Bytes
    Bytes(Vec<u8>),
    /// List
    List(Vec<Value>),
    /// Map
    Map(HashMap<String, Value>),
    /// Node
    Node(Node),
    /// Relationship
    Relationship(Relationship),
    /// Path
    Path(Path),
    /// Point
    Point(Point),
    /// Date
    Date(NaiveDate),
    /// LocalTime
    LocalTime(NaiveTime),
    /// DateTime
    DateTime(DateTime<FixedOffset>),
    /// LocalDateTime
    LocalDateTime(NaiveDateTime),
    /// Duration
    Duration(Duration),
}

impl Value {
    /// Null 여부
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// bool 참조
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// i64 참조
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// f64 참조 (정수는 승격)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// 문자열 참조
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// 리스트 참조
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// 맵 참조
    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// 노드 참조
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    /// 타입 이름
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Node(_) => "Node",
            Value::Relationship(_) => "Relationship",
            Value::Path(_) => "Path",
            Value::Point(_) => "Point",
            Value::Date(_) => "Date",
            Value::LocalTime(_) => "LocalTime",
            Value::DateTime(_) => "DateTime",
            Value::LocalDateTime(_) => "LocalDateTime",
            Value::Duration(_) => "Duration",
        }
    }

    /// JSON 값에서 파라미터 값으로 변환
    ///
    /// 정수로 표현 가능한 숫자는 Integer, 나머지는 Float가 된다.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => write!(f, "{{{} entries}}", m.len()),
            Value::Node(n) => write!(f, "{}", n),
            Value::Relationship(r) => write!(f, "{}", r),
            Value::Path(p) => write!(f, "<path of {}>", p.len()),
            Value::Point(p) => write!(f, "point({}, {}, {})", p.srid, p.x, p.y),
            Value::Date(d) => write!(f, "{}", d),
            Value::LocalTime(t) => write!(f, "{}", t),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::LocalDateTime(dt) => write!(f, "{}", dt),
            Value::Duration(d) => write!(f, "{}", d),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )+
    };
}

value_from! {
    bool => Boolean,
    i64 => Integer,
    i32 => Integer,
    u32 => Integer,
    f64 => Float,
    String => String,
    &str => String,
    Node => Node,
    Relationship => Relationship,
    Point => Point,
    NaiveDate => Date,
    NaiveDateTime => LocalDateTime,
    DateTime<FixedOffset> => DateTime,
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(m: HashMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

macro_rules! value_try_into {
    ($($ty:ty => |$v:ident| $extract:expr),+ $(,)?) => {
        $(
            impl TryFrom<Value> for $ty {
                type Error = DriverError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    let name = value.type_name();
                    let $v = value;
                    let extracted: Option<$ty> = $extract;
                    extracted.ok_or_else(|| {
                        DriverError::type_conversion(format!(
                            "Cannot convert {} to {}",
                            name,
                            stringify!($ty)
                        ))
                    })
                }
            }
        )+
    };
}

value_try_into! {
    bool => |v| v.as_bool(),
    i64 => |v| v.as_int(),
    f64 => |v| v.as_float(),
    String => |v| match v { Value::String(s) => Some(s), _ => None },
    Node => |v| match v { Value::Node(n) => Some(n), _ => None },
    Relationship => |v| match v { Value::Relationship(r) => Some(r), _ => None },
    Path => |v| match v { Value::Path(p) => Some(p), _ => None },
}

// ============================================================================
// Node - 그래프 노드
// ============================================================================

/// 그래프 노드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// 노드 ID
    pub id: i64,
    /// 레이블
    pub labels: Vec<String>,
    /// 속성
    pub properties: HashMap<String, Value>,
}

impl Node {
    /// 새 노드 생성
    pub fn new(id: i64, labels: Vec<String>, properties: HashMap<String, Value>) -> Self {
        Self { id, labels, properties }
    }

    /// 레이블 포함 여부
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// 속성 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// 속성 조회 (타입 변환)
    pub fn get_as<T: TryFrom<Value, Error = DriverError>>(&self, key: &str) -> DriverResult<T> {
        let value = self
            .properties
            .get(key)
            .cloned()
            .ok_or_else(|| DriverError::type_conversion(format!("Property '{}' not found", key)))?;
        T::try_from(value)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.id)?;
        for label in &self.labels {
            write!(f, ":{}", label)?;
        }
        write!(f, ")")
    }
}

// ============================================================================
// Relationship / Path
// ============================================================================

/// 그래프 관계
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// 관계 ID
    pub id: i64,
    /// 시작 노드 ID
    pub start_node_id: i64,
    /// 끝 노드 ID
    pub end_node_id: i64,
    /// 관계 타입
    #[serde(rename = "type")]
    pub rel_type: String,
    /// 속성
    pub properties: HashMap<String, Value>,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({})-[{}:{}]->({})",
            self.start_node_id, self.id, self.rel_type, self.end_node_id
        )
    }
}

/// 그래프 경로
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// 노드들
    pub nodes: Vec<Node>,
    /// 관계들
    pub relationships: Vec<Relationship>,
}

impl Path {
    /// 경로 길이 (관계 수)
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// 빈 경로 여부
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

// ============================================================================
// Point / Duration
// ============================================================================

/// 공간 좌표
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// SRID
    pub srid: i32,
    /// X 좌표
    pub x: f64,
    /// Y 좌표
    pub y: f64,
    /// Z 좌표
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Point {
    /// WGS84 2D 포인트 (경도, 위도)
    pub fn wgs84(longitude: f64, latitude: f64) -> Self {
        Self { srid: 4326, x: longitude, y: latitude, z: None }
    }

    /// Cartesian 2D 포인트
    pub fn cartesian(x: f64, y: f64) -> Self {
        Self { srid: 7203, x, y, z: None }
    }
}

/// 시간 간격 (월/일/초/나노초)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i32,
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}M{}DT{}", self.months, self.days, self.seconds)?;
        if self.nanoseconds != 0 {
            write!(f, ".{:09}", self.nanoseconds)?;
        }
        write!(f, "S")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_int(), Some(42));
        assert_eq!(Value::Integer(2).as_float(), Some(2.0));
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));
        assert_eq!(Value::Float(1.5).as_int(), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::String("hello".into()).to_string(), "\"hello\"");
        assert_eq!(
            Value::from(vec![1i64, 2, 3]).to_string(),
            "[1, 2, 3]"
        );
        let d = Duration { months: 1, days: 2, seconds: 3, nanoseconds: 5 };
        assert_eq!(d.to_string(), "P1M2DT3.000000005S");
    }

    #[test]
    fn test_value_from() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(42i32), Value::Integer(42));
        assert_eq!(Value::from("hello"), Value::String("hello".into()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_value_try_from() {
        assert!(bool::try_from(Value::Boolean(true)).unwrap());
        assert_eq!(i64::try_from(Value::Integer(42)).unwrap(), 42);
        assert_eq!(String::try_from(Value::from("x")).unwrap(), "x");

        let err = i64::try_from(Value::String("42".into())).unwrap_err();
        assert!(matches!(err, DriverError::TypeConversion(_)));
        assert_eq!(err.to_string(), "Type conversion error: Cannot convert String to i64");
    }

    #[test]
    fn test_value_from_json() {
        let json = serde_json::json!({
            "name": "Alice",
            "age": 30,
            "score": 1.5,
            "tags": ["a", "b"],
            "manager": null
        });

        let value = Value::from_json(json);
        let map = value.as_map().unwrap();
        assert_eq!(map.get("name"), Some(&Value::String("Alice".into())));
        assert_eq!(map.get("age"), Some(&Value::Integer(30)));
        assert_eq!(map.get("score"), Some(&Value::Float(1.5)));
        assert_eq!(map.get("tags").and_then(Value::as_list).map(|l| l.len()), Some(2));
        assert_eq!(map.get("manager"), Some(&Value::Null));
    }

    #[test]
    fn test_node() {
        let mut props = HashMap::new();
        props.insert("name".into(), Value::String("Alice".into()));

        let node = Node::new(1, vec!["Person".into(), "Admin".into()], props);

        assert!(node.has_label("Person"));
        assert!(!node.has_label("Company"));
        assert_eq!(node.get_as::<String>("name").unwrap(), "Alice");
        assert!(node.get_as::<i64>("age").is_err());
        assert_eq!(node.to_string(), "(1:Person:Admin)");
    }

    #[test]
    fn test_path_len() {
        let rel = Relationship {
            id: 7,
            start_node_id: 1,
            end_node_id: 2,
            rel_type: "KNOWS".into(),
            properties: HashMap::new(),
        };
        assert_eq!(rel.to_string(), "(1)-[7:KNOWS]->(2)");

        let path = Path { nodes: vec![], relationships: vec![rel] };
        assert_eq!(path.len(), 1);
        assert!(!path.is_empty());
    }
}
