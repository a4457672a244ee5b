//! 에러 타입 정의.

use std::fmt;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 저장소 에러
    Store(dragon_store::StoreError),
    /// 데이터 공급자 에러
    Provider(dragon_provider::ProviderError),
    /// 설정 에러
    Config(String),
    /// 거래 캘린더 확보 실패
    Calendar(String),
    /// 종료 신호로 실행이 중단됨
    Interrupted,
    /// 일반 에러
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "Store error: {}", e),
            Self::Provider(e) => write!(f, "Provider error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Calendar(msg) => write!(f, "Calendar error: {}", msg),
            Self::Interrupted => write!(f, "Run interrupted by signal"),
            Self::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<dragon_store::StoreError> for CollectorError {
    fn from(err: dragon_store::StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<dragon_provider::ProviderError> for CollectorError {
    fn from(err: dragon_provider::ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<std::env::VarError> for CollectorError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CollectorError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
