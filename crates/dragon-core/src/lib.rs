//! # Dragon Core
//!
//! A주 시장 데이터 파이프라인의 핵심 도메인 모델을 제공합니다.
//!
//! 이 크레이트는 수집 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 종목 정보 및 시계열 레코드 (일봉, 분봉, 재무 지표)
//! - 거래소 및 보드(시장 구분) 분류
//! - 등락폭 제한(상한가/하한가) 규칙

pub mod market;
pub mod types;

pub use market::*;
pub use types::*;
