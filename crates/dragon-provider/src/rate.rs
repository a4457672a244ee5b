//! 슬라이딩 윈도우 호출 빈도 제한기.
//!
//! Tushare는 포인트 등급별로 분당 호출 수를 제한하므로, 최근 호출 시각을
//! 큐에 기록하고 한도에 도달하면 가장 오래된 호출이 윈도우를 벗어날 때까지
//! 대기합니다. 수집 실행마다 하나의 제한기를 만들어 모든 호출 경로가
//! 공유합니다.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// 제한기 운영 통계.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterStats {
    /// 지금까지 발행한 총 호출 수
    pub total_requests: u64,
    /// 현재 윈도우 내 호출 수
    pub in_window: usize,
}

/// 트레일링 윈도우 기준 최대 호출 수를 강제하는 제한기.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
    total_requests: AtomicU64,
}

impl RateLimiter {
    /// 새 제한기를 생성합니다.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(max_requests)),
            total_requests: AtomicU64::new(0),
        }
    }

    /// 호출 슬롯을 확보할 때까지 대기한 뒤 호출 시각을 기록합니다.
    ///
    /// 실패하지 않으며 한도에 도달한 경우에만 지연됩니다. 만료된 기록은
    /// 호출 때마다 정리되므로 큐 길이는 `max_requests`를 넘지 않습니다.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut timestamps = self.timestamps.lock().await;
                let now = Instant::now();
                while let Some(&oldest) = timestamps.front() {
                    if now.duration_since(oldest) >= self.window {
                        timestamps.pop_front();
                    } else {
                        break;
                    }
                }
                if timestamps.len() < self.max_requests {
                    timestamps.push_back(now);
                    self.total_requests.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                let oldest = timestamps[0];
                let wait = self.window - now.duration_since(oldest);
                tracing::debug!(
                    wait_ms = wait.as_millis() as u64,
                    in_window = timestamps.len(),
                    "호출 빈도 한도 도달, 대기"
                );
                wait
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// 현재 운영 통계를 반환합니다.
    pub async fn stats(&self) -> RateLimiterStats {
        let timestamps = self.timestamps.lock().await;
        RateLimiterStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            in_window: timestamps.len(),
        }
    }

    /// 지금까지 발행한 총 호출 수를 반환합니다.
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }
}
