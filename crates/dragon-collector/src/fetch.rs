//! 재시도·속도 제한 호출 엔진.
//!
//! 모든 공급자 호출은 이 모듈을 거칩니다. 매 시도 전에 속도 예산을
//! 확보하므로 재시도도 예산을 소모합니다.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dragon_provider::{ProviderError, RateLimiter};
use tracing::warn;

use crate::config::{RateConfig, RetryConfig};

/// 재시도 정책 (고정 간격)
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 요청당 최대 시도 횟수
    pub max_attempts: u32,
    /// 재시도 간 대기 시간
    pub delay: Duration,
}

impl RetryPolicy {
    /// 새 재시도 정책을 생성합니다. 시도 횟수는 최소 1로 보정합니다.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// 설정에서 재시도 정책을 만듭니다.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay())
    }
}

/// 배치 실패 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 일시 오류가 재시도 한도까지 지속됨
    TransientExhausted,
    /// 재시도가 무의미한 영구 오류
    Permanent,
}

impl FailureKind {
    /// 로그 필드용 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientExhausted => "transient-exhausted",
            Self::Permanent => "permanent",
        }
    }
}

/// 호출 엔진이 반환한 에러를 실패 종류로 분류합니다.
pub fn classify_failure(err: &ProviderError) -> FailureKind {
    if err.is_retryable() {
        FailureKind::TransientExhausted
    } else {
        FailureKind::Permanent
    }
}

/// 속도 제한과 재시도를 적용해 공급자 호출을 실행하는 엔진
pub struct Fetcher {
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl Fetcher {
    /// 속도 제한기와 재시도 정책으로 엔진을 생성합니다.
    pub fn new(limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self { limiter, policy }
    }

    /// 설정에서 엔진을 만듭니다.
    pub fn from_config(rate: &RateConfig, retry: &RetryConfig) -> Self {
        Self::new(
            Arc::new(RateLimiter::new(rate.max_requests, rate.window())),
            RetryPolicy::from_config(retry),
        )
    }

    /// 지금까지 소모한 API 호출 수 (재시도 포함)
    pub fn api_calls(&self) -> u64 {
        self.limiter.total_requests()
    }

    /// 공급자 호출을 실행합니다.
    ///
    /// 매 시도 전에 속도 예산을 확보합니다. 일시 오류는 고정 간격으로
    /// 재시도하고, 영구 오류는 즉시 반환합니다. 한도 소진 시 마지막
    /// 에러를 반환합니다.
    pub async fn call<T, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 1u32;
        loop {
            self.limiter.acquire().await;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    warn!(
                        op = op_name,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "호출 실패, 재시도 대기"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fetcher(max_attempts: u32) -> Fetcher {
        Fetcher::new(
            Arc::new(RateLimiter::new(1000, Duration::from_secs(60))),
            RetryPolicy::new(max_attempts, Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn test_transient_error_retried_until_success() {
        let engine = fetcher(5);
        let calls = AtomicU32::new(0);

        // 4번 연속 일시 오류, 5번째 시도에서 성공
        let result = engine
            .call("daily", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 4 {
                        Err(ProviderError::Server(500))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(engine.api_calls(), 5);
    }

    #[tokio::test]
    async fn test_permanent_error_fails_without_retry() {
        let engine = fetcher(5);
        let calls = AtomicU32::new(0);

        let result: Result<u32, _> = engine
            .call("stock_basic", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::Unauthorized("权限不足".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(ProviderError::Unauthorized(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let engine = fetcher(3);
        let calls = AtomicU32::new(0);

        let result: Result<u32, _> = engine
            .call("daily", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::Server(503)) }
            })
            .await;

        assert!(matches!(result, Err(ProviderError::Server(503))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_failure_classification() {
        let transient = ProviderError::RateLimited("每分钟最多".to_string());
        assert_eq!(classify_failure(&transient), FailureKind::TransientExhausted);

        let permanent = ProviderError::Parse("missing field".to_string());
        assert_eq!(classify_failure(&permanent), FailureKind::Permanent);
    }
}
