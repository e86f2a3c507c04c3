//! Result Summary
//!
//! 쿼리 완료 후 생성되는 요약과 변경 카운터

use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::time::Duration;

use super::options::ServerAddress;

// ============================================================================
// ResultSummary - 결과 요약
// ============================================================================

/// 결과 요약 (생성 후 불변)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSummary {
    /// 실행된 쿼리 텍스트
    pub query_text: String,
    /// 쿼리 타입
    pub query_type: QueryType,
    /// 카운터
    pub counters: Counters,
    /// 첫 결과까지 걸린 시간
    pub result_available_after: Duration,
    /// 결과 소비까지 걸린 시간
    pub result_consumed_after: Duration,
    /// 데이터베이스 이름
    pub database: Option<String>,
    /// 쿼리를 처리한 서버
    pub server: Option<ServerAddress>,
    /// 알림
    pub notifications: Vec<Notification>,
}

/// 쿼리 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryType {
    /// 읽기 전용
    #[default]
    ReadOnly,
    /// 읽기/쓰기
    ReadWrite,
    /// 쓰기 전용
    WriteOnly,
    /// 스키마 변경
    SchemaWrite,
}

/// 서버 알림
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub code: String,
    pub title: String,
    pub description: String,
    pub severity: String,
}

// ============================================================================
// Counters - 변경 카운터
// ============================================================================

/// 변경 카운터
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// 생성된 노드 수
    pub nodes_created: i64,
    /// 삭제된 노드 수
    pub nodes_deleted: i64,
    /// 생성된 관계 수
    pub relationships_created: i64,
    /// 삭제된 관계 수
    pub relationships_deleted: i64,
    /// 설정된 속성 수
    pub properties_set: i64,
    /// 추가된 레이블 수
    pub labels_added: i64,
    /// 제거된 레이블 수
    pub labels_removed: i64,
    /// 생성된 인덱스 수
    pub indexes_added: i64,
    /// 제거된 인덱스 수
    pub indexes_removed: i64,
    /// 추가된 제약조건 수
    pub constraints_added: i64,
    /// 제거된 제약조건 수
    pub constraints_removed: i64,
    /// 시스템 데이터베이스 변경 수
    pub system_updates: i64,
}

impl Counters {
    /// 데이터 변경 존재 여부
    pub fn contains_updates(&self) -> bool {
        self.nodes_created > 0
            || self.nodes_deleted > 0
            || self.relationships_created > 0
            || self.relationships_deleted > 0
            || self.properties_set > 0
            || self.labels_added > 0
            || self.labels_removed > 0
            || self.indexes_added > 0
            || self.indexes_removed > 0
            || self.constraints_added > 0
            || self.constraints_removed > 0
    }

    /// 시스템 변경 존재 여부
    pub fn contains_system_updates(&self) -> bool {
        self.system_updates > 0
    }

    /// 두 카운터를 필드별로 더한다
    pub fn merge(&self, other: &Counters) -> Counters {
        Counters {
            nodes_created: self.nodes_created + other.nodes_created,
            nodes_deleted: self.nodes_deleted + other.nodes_deleted,
            relationships_created: self.relationships_created + other.relationships_created,
            relationships_deleted: self.relationships_deleted + other.relationships_deleted,
            properties_set: self.properties_set + other.properties_set,
            labels_added: self.labels_added + other.labels_added,
            labels_removed: self.labels_removed + other.labels_removed,
            indexes_added: self.indexes_added + other.indexes_added,
            indexes_removed: self.indexes_removed + other.indexes_removed,
            constraints_added: self.constraints_added + other.constraints_added,
            constraints_removed: self.constraints_removed + other.constraints_removed,
            system_updates: self.system_updates + other.system_updates,
        }
    }
}

impl Add for Counters {
    type Output = Counters;

    fn add(self, rhs: Counters) -> Counters {
        self.merge(&rhs)
    }
}

impl AddAssign for Counters {
    fn add_assign(&mut self, rhs: Counters) {
        *self = self.merge(&rhs);
    }
}

impl Sum for Counters {
    fn sum<I: Iterator<Item = Counters>>(iter: I) -> Counters {
        iter.fold(Counters::default(), Add::add)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_aggregate_every_field() {
        let a = Counters {
            nodes_created: 1,
            nodes_deleted: 2,
            relationships_created: 3,
            relationships_deleted: 4,
            properties_set: 5,
            labels_added: 6,
            labels_removed: 7,
            indexes_added: 8,
            indexes_removed: 9,
            constraints_added: 10,
            constraints_removed: 11,
            system_updates: 12,
        };

        let doubled = a + a;
        assert_eq!(doubled.nodes_created, 2);
        assert_eq!(doubled.labels_removed, 14);
        assert_eq!(doubled.constraints_removed, 22);
        assert_eq!(doubled.system_updates, 24);

        let total: Counters = vec![a, a, Counters::default()].into_iter().sum();
        assert_eq!(total, doubled);
    }

    #[test]
    fn test_contains_updates() {
        assert!(!Counters::default().contains_updates());

        let mut c = Counters::default();
        c += Counters { indexes_added: 1, ..Counters::default() };
        assert!(c.contains_updates());
        assert!(!c.contains_system_updates());

        let s = Counters { system_updates: 1, ..Counters::default() };
        assert!(s.contains_system_updates());
    }
}
