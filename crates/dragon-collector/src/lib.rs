//! Standalone A-share data collector.
//!
//! 이 crate는 Tushare Pro에서 A주 시장 데이터를 수집하는 바이너리를
//! 제공합니다:
//! - 종목 기본 정보 동기화 (stock_basic)
//! - 일봉 수집 (daily)
//! - 일별 재무 지표 수집 (daily_basic)
//! - 1분봉 수집 (stk_mins)
//!
//! 수집은 거래 캘린더 기준으로 누락 구간만 배치로 묶어 요청하며,
//! 속도 제한과 재시도를 거쳐 멱등 업서트로 저장합니다. 같은 명령을
//! 다시 실행하면 이미 저장된 구간은 건너뛰고 이어서 수집합니다.

pub mod calendar;
pub mod config;
pub mod error;
pub mod fetch;
pub mod modules;
pub mod plan;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use fetch::{Fetcher, RetryPolicy};
pub use stats::CollectionStats;
