//! 환경변수 기반 설정 모듈.

use crate::Result;
use std::time::Duration;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// Tushare API 설정
    pub tushare: TushareConfig,
    /// 요청 속도 제한 설정
    pub rate: RateConfig,
    /// 재시도 설정
    pub retry: RetryConfig,
    /// 수집 동작 설정
    pub collect: CollectConfig,
}

/// Tushare API 설정
#[derive(Debug, Clone)]
pub struct TushareConfig {
    /// API 토큰
    pub token: String,
    /// 기본 URL 재정의 (고포인트 전용 도메인 등)
    pub base_url: Option<String>,
    /// HTTP 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

/// 요청 속도 제한 설정
#[derive(Debug, Clone)]
pub struct RateConfig {
    /// 윈도우당 최대 요청 수
    pub max_requests: usize,
    /// 슬라이딩 윈도우 길이 (초)
    pub window_secs: u64,
}

/// 재시도 설정
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 요청당 최대 시도 횟수
    pub max_attempts: u32,
    /// 재시도 간 고정 대기 시간 (초)
    pub delay_secs: u64,
}

/// 수집 동작 설정
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// 단일 API 호출에 담을 최대 거래일 수
    pub max_periods_per_call: usize,
    /// ST 종목 수집 포함 여부
    pub include_st: bool,
    /// 캘린더 확보 실패 시 주중 날짜로 대체 허용 여부
    pub weekday_fallback: bool,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            crate::error::CollectorError::Config(
                "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        let token = std::env::var("TUSHARE_TOKEN").map_err(|_| {
            crate::error::CollectorError::Config(
                "TUSHARE_TOKEN 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        Ok(Self {
            database_url,
            tushare: TushareConfig {
                token,
                base_url: std::env::var("TUSHARE_BASE_URL").ok(),
                timeout_secs: env_var_parse("TUSHARE_TIMEOUT_SECS", 30),
            },
            rate: RateConfig {
                max_requests: env_var_parse("RATE_MAX_REQUESTS", 180),
                window_secs: env_var_parse("RATE_WINDOW_SECS", 60),
            },
            retry: RetryConfig {
                max_attempts: env_var_parse("RETRY_MAX_ATTEMPTS", 5),
                delay_secs: env_var_parse("RETRY_DELAY_SECS", 2),
            },
            collect: CollectConfig {
                max_periods_per_call: env_var_parse("MAX_PERIODS_PER_CALL", 6000),
                include_st: env_var_bool("COLLECT_INCLUDE_ST", false),
                weekday_fallback: env_var_bool("CALENDAR_WEEKDAY_FALLBACK", false),
            },
        })
    }
}

impl TushareConfig {
    /// HTTP 요청 타임아웃을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RateConfig {
    /// 슬라이딩 윈도우 길이를 Duration으로 반환
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl RetryConfig {
    /// 재시도 간 대기 시간을 Duration으로 반환
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
