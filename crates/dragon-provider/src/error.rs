//! 데이터 공급자 에러 타입.

use thiserror::Error;

/// 데이터 공급자 관련 에러.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// HTTP 서버 에러 (5xx)
    #[error("Server error: HTTP {0}")]
    Server(u16),

    /// 호출 빈도 제한 초과
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// 인증/권한/포인트 부족 에러
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// API 에러 코드 (공급자가 요청을 거부함)
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    Parse(String),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// 재시도 가능한(일시적) 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_)
                | ProviderError::Timeout(_)
                | ProviderError::Server(_)
                | ProviderError::RateLimited(_)
        )
    }

    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ProviderError::Unauthorized(_))
    }

    /// Tushare 응답의 비정상 `code`/`msg`를 에러로 분류합니다.
    ///
    /// Tushare는 실패 사유를 HTTP 상태가 아니라 메시지 본문으로 전달하므로
    /// 메시지 내용으로 빈도 제한과 권한 문제를 구분합니다.
    pub fn classify_api(code: i64, message: String) -> Self {
        let lower = message.to_lowercase();
        if message.contains("频率") || message.contains("每分钟") || lower.contains("frequency") {
            ProviderError::RateLimited(message)
        } else if lower.contains("token") || message.contains("积分") || message.contains("权限")
        {
            ProviderError::Unauthorized(message)
        } else {
            ProviderError::Api { code, message }
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_connect() {
            ProviderError::Network(err.to_string())
        } else {
            ProviderError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Timeout("t".into()).is_retryable());
        assert!(ProviderError::Network("n".into()).is_retryable());
        assert!(ProviderError::Server(502).is_retryable());
        assert!(ProviderError::RateLimited("r".into()).is_retryable());

        assert!(!ProviderError::Unauthorized("u".into()).is_retryable());
        assert!(!ProviderError::Parse("p".into()).is_retryable());
        assert!(!ProviderError::Api {
            code: 40001,
            message: "bad".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_classify_api_messages() {
        let err = ProviderError::classify_api(40203, "抱歉，您每分钟最多访问该接口500次".into());
        assert!(matches!(err, ProviderError::RateLimited(_)));

        let err = ProviderError::classify_api(40203, "Frequency limit exceeded".into());
        assert!(matches!(err, ProviderError::RateLimited(_)));

        let err = ProviderError::classify_api(2002, "积分不足，无权限访问该接口".into());
        assert!(matches!(err, ProviderError::Unauthorized(_)));

        let err = ProviderError::classify_api(2002, "token无效".into());
        assert!(matches!(err, ProviderError::Unauthorized(_)));

        let err = ProviderError::classify_api(40001, "参数错误".into());
        assert!(matches!(err, ProviderError::Api { code: 40001, .. }));
    }
}
