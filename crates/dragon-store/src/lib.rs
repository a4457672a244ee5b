//! # Dragon Store
//!
//! 수집된 시장 데이터의 저장소 계층을 제공합니다.
//!
//! ## 주요 기능
//!
//! - **MarketStore**: 키 기반 멱등 업서트 저장소 인터페이스
//! - **PgStore**: PostgreSQL 구현 (UNNEST 일괄 업서트)
//! - **MemoryStore**: 인메모리 구현 (테스트용)

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::MarketStore;
