//! 거래 캘린더 확보 모듈.
//!
//! 수집 계획은 거래 캘린더를 기준으로 누락 거래일을 계산하므로
//! 캘린더 확보 실패는 기본적으로 실행 전체를 중단시킵니다.

use chrono::{Datelike, NaiveDate, Weekday};
use dragon_provider::TushareClient;
use tracing::warn;

use crate::error::{CollectorError, Result};
use crate::fetch::Fetcher;

/// 거래 캘린더를 확보합니다.
///
/// 공급자 조회가 재시도 한도까지 실패하면 치명적 에러를 반환합니다.
/// `weekday_fallback`이 켜져 있으면 대신 경고를 남기고 주중 날짜로
/// 대체합니다. 대체 캘린더는 휴장일을 포함할 수 있어 빈 조회가
/// 늘어납니다.
pub async fn resolve_calendar(
    fetcher: &Fetcher,
    client: &TushareClient,
    start: NaiveDate,
    end: NaiveDate,
    weekday_fallback: bool,
) -> Result<Vec<NaiveDate>> {
    match fetcher
        .call("trade_cal", || client.fetch_trade_calendar(start, end))
        .await
    {
        Ok(dates) => Ok(dates),
        Err(e) if weekday_fallback => {
            let fallback = weekdays_between(start, end);
            warn!(
                error = %e,
                start = %start,
                end = %end,
                count = fallback.len(),
                "거래 캘린더 확보 실패, 주중 날짜로 대체합니다 (휴장일 포함 가능)"
            );
            Ok(fallback)
        }
        Err(e) => Err(CollectorError::Calendar(format!(
            "거래 캘린더 확보 실패 ({} ~ {}): {}",
            start, end, e
        ))),
    }
}

/// 구간 내 주중(월~금) 날짜 목록
pub fn weekdays_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        day = day + chrono::Duration::days(1);
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RetryPolicy;
    use dragon_provider::RateLimiter;
    use std::sync::Arc;
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_fetcher() -> Fetcher {
        Fetcher::new(
            Arc::new(RateLimiter::new(1000, Duration::from_secs(60))),
            RetryPolicy::new(2, Duration::from_millis(1)),
        )
    }

    #[test]
    fn test_weekdays_between_skips_weekends() {
        // 2024-01-05는 금요일, 01-06/07은 주말입니다.
        let days = weekdays_between(date(2024, 1, 5), date(2024, 1, 9));
        assert_eq!(
            days,
            vec![date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 9)]
        );
    }

    #[tokio::test]
    async fn test_resolve_calendar_passes_provider_dates() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{
            "code": 0,
            "msg": "",
            "data": {
                "fields": ["cal_date","is_open"],
                "items": [["20240102","1"],["20240103","1"]]
            }
        }"#;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = TushareClient::new("test-token").with_base_url(server.url());
        let dates = resolve_calendar(
            &test_fetcher(),
            &client,
            date(2024, 1, 2),
            date(2024, 1, 3),
            false,
        )
        .await
        .unwrap();

        assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 3)]);
    }

    #[tokio::test]
    async fn test_resolve_calendar_exhaustion_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let client = TushareClient::new("test-token").with_base_url(server.url());
        let result = resolve_calendar(
            &test_fetcher(),
            &client,
            date(2024, 1, 2),
            date(2024, 1, 3),
            false,
        )
        .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(CollectorError::Calendar(_))));
    }

    #[tokio::test]
    async fn test_resolve_calendar_weekday_fallback_opt_in() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(500)
            .create_async()
            .await;

        let client = TushareClient::new("test-token").with_base_url(server.url());
        let dates = resolve_calendar(
            &test_fetcher(),
            &client,
            date(2024, 1, 5),
            date(2024, 1, 9),
            true,
        )
        .await
        .unwrap();

        // 주말을 제외한 주중 날짜로 대체됩니다.
        assert_eq!(
            dates,
            vec![date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 9)]
        );
    }
}
