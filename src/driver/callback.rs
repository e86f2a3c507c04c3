//! Callback Completion
//!
//! 비동기 작업을 스폰하고 완료 결과를 핸들러로 전달하는 어댑터

use std::future::Future;

use tokio::task::JoinHandle;

use super::error::DriverResult;

/// 완료 콜백 확장
///
/// `DriverResult` 를 내는 모든 future 에 붙는다. 핸들러는 정확히 한 번 호출된다.
pub trait OnComplete<T>: Future<Output = DriverResult<T>> + Sized {
    /// future 를 스폰하고 결과를 `handler` 로 전달
    fn on_complete<F>(self, handler: F) -> JoinHandle<()>
    where
        Self: Send + 'static,
        T: Send + 'static,
        F: FnOnce(DriverResult<T>) + Send + 'static,
    {
        tokio::spawn(async move { handler(self.await) })
    }
}

impl<T, Fut> OnComplete<T> for Fut where Fut: Future<Output = DriverResult<T>> {}
