//! 저장소 계층 에러 타입 정의

use thiserror::Error;

/// 저장소 계층 에러
#[derive(Error, Debug)]
pub enum StoreError {
    /// 데이터베이스 연결 실패
    #[error("Database connection error: {0}")]
    Connection(String),

    /// 쿼리 실행 실패
    #[error("Query error: {0}")]
    Query(String),

    /// 데이터 삽입 실패
    #[error("Insert error: {0}")]
    Insert(String),

    /// 스키마 초기화 실패
    #[error("Schema error: {0}")]
    Schema(String),

    /// 데이터 없음
    #[error("Not found: {0}")]
    NotFound(String),

    /// 연결 풀 고갈
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// 저장소 Result 타입 별칭
pub type Result<T> = std::result::Result<T, StoreError>;
