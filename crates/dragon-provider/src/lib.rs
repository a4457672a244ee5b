//! # Dragon Provider
//!
//! Tushare Pro 데이터 공급자 연동을 제공합니다.
//!
//! 이 크레이트는 수집 파이프라인의 외부 공급자 경계를 담당합니다:
//! - `TushareClient` - 엔드포인트별 타입 래퍼 (거래 캘린더, 일봉, 분봉, 재무 지표)
//! - `RateLimiter` - 슬라이딩 윈도우 호출 빈도 제한
//! - `ProviderError` - 일시적/영구적 에러 분류

pub mod error;
pub mod rate;
pub mod tushare;

pub use error::*;
pub use rate::*;
pub use tushare::*;
