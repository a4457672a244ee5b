//! Tushare Pro API 클라이언트.
//!
//! Tushare Pro HTTP API를 통해 A주 시장 데이터를 수집합니다.
//!
//! 모든 엔드포인트는 단일 POST 엔벨로프를 공유합니다. 요청은
//! `{api_name, token, params, fields}`, 응답은 `{code, msg, data: {fields,
//! items}}` 형태이며 `items`의 각 행은 `fields` 순서를 따르는 위치 기반
//! 배열입니다. 행 디코딩은 `FieldIndex`가 필드명을 위치로 변환해 처리합니다.
//!
//! # 지원 엔드포인트
//!
//! - `trade_cal` - 거래 캘린더
//! - `daily` - 일봉 (종목별 기간 조회 / 일자별 전종목 조회)
//! - `daily_basic` - 일별 재무 지표 (일자별 전종목)
//! - `stk_mins` - 분봉 (종목·일자별)
//! - `stock_basic` - 상장 종목 목록

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::ProviderError;

/// Tushare Pro 기본 URL.
pub const DEFAULT_BASE_URL: &str = "http://api.tushare.pro";

/// Tushare 날짜 형식 (YYYYMMDD).
pub const TUSHARE_DATE_FORMAT: &str = "%Y%m%d";

/// 분봉 조회 주기.
const MINUTE_FREQ: &str = "1min";

/// Tushare Pro API 클라이언트.
#[derive(Clone)]
pub struct TushareClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

/// 일봉 원시 행.
#[derive(Debug, Clone)]
pub struct DailyRow {
    /// 종목 코드
    pub ts_code: String,
    /// 거래일
    pub trade_date: NaiveDate,
    /// 시가
    pub open: Option<Decimal>,
    /// 고가
    pub high: Option<Decimal>,
    /// 저가
    pub low: Option<Decimal>,
    /// 종가
    pub close: Option<Decimal>,
    /// 전일 종가
    pub pre_close: Option<Decimal>,
    /// 등락률 (%)
    pub pct_chg: Option<Decimal>,
    /// 거래량 (手)
    pub vol: Option<Decimal>,
    /// 거래대금 (千元)
    pub amount: Option<Decimal>,
}

/// 일별 재무 지표 원시 행.
#[derive(Debug, Clone)]
pub struct IndicatorRow {
    /// 종목 코드
    pub ts_code: String,
    /// 거래일
    pub trade_date: NaiveDate,
    /// 회전율 (%)
    pub turnover_rate: Option<Decimal>,
    /// 유통주 기준 회전율 (%)
    pub turnover_rate_f: Option<Decimal>,
    /// 거래량 비율
    pub volume_ratio: Option<Decimal>,
    /// PER
    pub pe: Option<Decimal>,
    /// PER (TTM)
    pub pe_ttm: Option<Decimal>,
    /// PBR
    pub pb: Option<Decimal>,
    /// 총 주식수 (万股)
    pub total_share: Option<Decimal>,
    /// 유통 주식수 (万股)
    pub float_share: Option<Decimal>,
    /// 시가총액 (万元)
    pub total_mv: Option<Decimal>,
    /// 유통 시가총액 (万元)
    pub circ_mv: Option<Decimal>,
}

/// 분봉 원시 행.
#[derive(Debug, Clone)]
pub struct MinuteRow {
    /// 종목 코드
    pub ts_code: String,
    /// 체결 시각
    pub trade_time: NaiveDateTime,
    /// 시가
    pub open: Option<Decimal>,
    /// 고가
    pub high: Option<Decimal>,
    /// 저가
    pub low: Option<Decimal>,
    /// 종가
    pub close: Option<Decimal>,
    /// 거래량 (手)
    pub vol: Option<Decimal>,
    /// 거래대금 (元)
    pub amount: Option<Decimal>,
}

/// 상장 종목 원시 행.
#[derive(Debug, Clone)]
pub struct StockBasicRow {
    /// 종목 코드
    pub ts_code: String,
    /// 종목명
    pub name: String,
    /// 업종
    pub industry: Option<String>,
    /// 상장일
    pub list_date: Option<NaiveDate>,
}

/// API 응답 엔벨로프.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: i64,
    msg: Option<String>,
    data: Option<ApiData>,
}

/// 위치 기반 행 집합.
#[derive(Debug, Deserialize)]
struct ApiData {
    fields: Vec<String>,
    items: Vec<Vec<Value>>,
}

/// `fields` 배열의 위치를 이름으로 찾아주는 인덱스.
struct FieldIndex(HashMap<String, usize>);

impl FieldIndex {
    fn new(fields: &[String]) -> Self {
        Self(
            fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.clone(), i))
                .collect(),
        )
    }

    fn value<'a>(&self, row: &'a [Value], name: &str) -> Result<&'a Value, ProviderError> {
        self.0
            .get(name)
            .and_then(|&i| row.get(i))
            .ok_or_else(|| ProviderError::Parse(format!("응답에 {} 필드가 없습니다", name)))
    }

    fn string(&self, row: &[Value], name: &str) -> Result<String, ProviderError> {
        match self.value(row, name)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(ProviderError::Parse(format!(
                "{} 필드가 문자열이 아닙니다: {}",
                name, other
            ))),
        }
    }

    fn string_opt(&self, row: &[Value], name: &str) -> Result<Option<String>, ProviderError> {
        match self.value(row, name)? {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(ProviderError::Parse(format!(
                "{} 필드가 문자열이 아닙니다: {}",
                name, other
            ))),
        }
    }

    fn decimal_opt(&self, row: &[Value], name: &str) -> Result<Option<Decimal>, ProviderError> {
        match self.value(row, name)? {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .to_string()
                .parse::<Decimal>()
                .map(Some)
                .map_err(|e| ProviderError::Parse(format!("{} 필드 숫자 변환 실패: {}", name, e))),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => s
                .replace(',', "")
                .parse::<Decimal>()
                .map(Some)
                .map_err(|e| ProviderError::Parse(format!("{} 필드 숫자 변환 실패: {}", name, e))),
            other => Err(ProviderError::Parse(format!(
                "{} 필드가 숫자가 아닙니다: {}",
                name, other
            ))),
        }
    }

    fn date(&self, row: &[Value], name: &str) -> Result<NaiveDate, ProviderError> {
        let s = self.string(row, name)?;
        NaiveDate::parse_from_str(&s, TUSHARE_DATE_FORMAT)
            .map_err(|e| ProviderError::Parse(format!("{} 필드 날짜 변환 실패 ({}): {}", name, s, e)))
    }

    fn date_opt(&self, row: &[Value], name: &str) -> Result<Option<NaiveDate>, ProviderError> {
        match self.string_opt(row, name)? {
            None => Ok(None),
            Some(s) => NaiveDate::parse_from_str(&s, TUSHARE_DATE_FORMAT)
                .map(Some)
                .map_err(|e| {
                    ProviderError::Parse(format!("{} 필드 날짜 변환 실패 ({}): {}", name, s, e))
                }),
        }
    }

    fn datetime(&self, row: &[Value], name: &str) -> Result<NaiveDateTime, ProviderError> {
        let s = self.string(row, name)?;
        NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| ProviderError::Parse(format!("{} 필드 시각 변환 실패 ({}): {}", name, s, e)))
    }
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(TUSHARE_DATE_FORMAT).to_string()
}

impl TushareClient {
    /// 새 클라이언트를 생성합니다. 기본 타임아웃은 30초입니다.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_timeout(token, Duration::from_secs(30))
    }

    /// 요청 타임아웃을 지정해 클라이언트를 생성합니다.
    pub fn with_timeout(token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("HTTP 클라이언트 생성 실패"),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// 기본 URL을 변경합니다 (고포인트 사용자 전용 도메인, 테스트 서버).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 환경변수 `TUSHARE_TOKEN`에서 토큰을 읽어 클라이언트를 생성합니다.
    pub fn from_env() -> Option<Self> {
        std::env::var("TUSHARE_TOKEN").ok().map(Self::new)
    }

    /// API 요청을 실행하고 행 집합을 반환합니다.
    async fn call(
        &self,
        api_name: &str,
        params: Value,
        fields: &[&str],
    ) -> Result<ApiData, ProviderError> {
        let payload = json!({
            "api_name": api_name,
            "token": self.token,
            "params": params,
            "fields": fields,
        });

        tracing::debug!(api_name, "Tushare API 요청");

        let response = self.client.post(&self.base_url).json(&payload).send().await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ProviderError::Server(status.as_u16()));
        }
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                code: i64::from(status.as_u16()),
                message: body,
            });
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if envelope.code != 0 {
            let msg = envelope.msg.unwrap_or_else(|| "未知错误".to_string());
            return Err(ProviderError::classify_api(envelope.code, msg));
        }

        envelope
            .data
            .ok_or_else(|| ProviderError::Parse("응답에 data가 없습니다".to_string()))
    }

    /// 거래 캘린더를 조회합니다. 개장일만 오름차순으로 반환합니다.
    pub async fn fetch_trade_calendar(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, ProviderError> {
        let data = self
            .call(
                "trade_cal",
                json!({
                    "exchange": "SSE",
                    "start_date": fmt_date(start),
                    "end_date": fmt_date(end),
                    "is_open": "1",
                }),
                &["cal_date", "is_open"],
            )
            .await?;

        let idx = FieldIndex::new(&data.fields);
        let mut dates = Vec::with_capacity(data.items.len());
        for row in &data.items {
            if parse_is_open(&idx, row)? {
                dates.push(idx.date(row, "cal_date")?);
            }
        }
        dates.sort_unstable();
        dates.dedup();

        tracing::info!(
            start = %start,
            end = %end,
            count = dates.len(),
            "거래 캘린더 조회 완료"
        );
        Ok(dates)
    }

    /// 종목별 일봉을 기간 조회합니다.
    pub async fn fetch_daily_range(
        &self,
        ts_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyRow>, ProviderError> {
        let data = self
            .call(
                "daily",
                json!({
                    "ts_code": ts_code,
                    "start_date": fmt_date(start),
                    "end_date": fmt_date(end),
                }),
                DAILY_FIELDS,
            )
            .await?;
        let rows = decode_daily_rows(&data)?;
        tracing::debug!(ts_code, count = rows.len(), "일봉 기간 조회 완료");
        Ok(rows)
    }

    /// 일자별 전종목 일봉을 조회합니다.
    pub async fn fetch_daily_by_date(
        &self,
        trade_date: NaiveDate,
    ) -> Result<Vec<DailyRow>, ProviderError> {
        let data = self
            .call(
                "daily",
                json!({ "trade_date": fmt_date(trade_date) }),
                DAILY_FIELDS,
            )
            .await?;
        let rows = decode_daily_rows(&data)?;
        tracing::debug!(trade_date = %trade_date, count = rows.len(), "전종목 일봉 조회 완료");
        Ok(rows)
    }

    /// 일자별 전종목 재무 지표를 조회합니다.
    pub async fn fetch_daily_basic(
        &self,
        trade_date: NaiveDate,
    ) -> Result<Vec<IndicatorRow>, ProviderError> {
        let data = self
            .call(
                "daily_basic",
                json!({ "trade_date": fmt_date(trade_date) }),
                &[
                    "ts_code",
                    "trade_date",
                    "turnover_rate",
                    "turnover_rate_f",
                    "volume_ratio",
                    "pe",
                    "pe_ttm",
                    "pb",
                    "total_share",
                    "float_share",
                    "total_mv",
                    "circ_mv",
                ],
            )
            .await?;

        let idx = FieldIndex::new(&data.fields);
        let mut rows = Vec::with_capacity(data.items.len());
        for row in &data.items {
            rows.push(IndicatorRow {
                ts_code: idx.string(row, "ts_code")?,
                trade_date: idx.date(row, "trade_date")?,
                turnover_rate: idx.decimal_opt(row, "turnover_rate")?,
                turnover_rate_f: idx.decimal_opt(row, "turnover_rate_f")?,
                volume_ratio: idx.decimal_opt(row, "volume_ratio")?,
                pe: idx.decimal_opt(row, "pe")?,
                pe_ttm: idx.decimal_opt(row, "pe_ttm")?,
                pb: idx.decimal_opt(row, "pb")?,
                total_share: idx.decimal_opt(row, "total_share")?,
                float_share: idx.decimal_opt(row, "float_share")?,
                total_mv: idx.decimal_opt(row, "total_mv")?,
                circ_mv: idx.decimal_opt(row, "circ_mv")?,
            });
        }
        tracing::debug!(trade_date = %trade_date, count = rows.len(), "재무 지표 조회 완료");
        Ok(rows)
    }

    /// 종목·일자별 1분봉을 조회합니다. 하루 장중 구간만 요청합니다.
    pub async fn fetch_minute_bars(
        &self,
        ts_code: &str,
        trade_date: NaiveDate,
    ) -> Result<Vec<MinuteRow>, ProviderError> {
        let day = trade_date.format("%Y-%m-%d");
        let data = self
            .call(
                "stk_mins",
                json!({
                    "ts_code": ts_code,
                    "freq": MINUTE_FREQ,
                    "start_date": format!("{} 09:00:00", day),
                    "end_date": format!("{} 15:30:00", day),
                }),
                &[
                    "ts_code",
                    "trade_time",
                    "open",
                    "high",
                    "low",
                    "close",
                    "vol",
                    "amount",
                ],
            )
            .await?;

        let idx = FieldIndex::new(&data.fields);
        let mut rows = Vec::with_capacity(data.items.len());
        for row in &data.items {
            rows.push(MinuteRow {
                ts_code: idx.string(row, "ts_code")?,
                trade_time: idx.datetime(row, "trade_time")?,
                open: idx.decimal_opt(row, "open")?,
                high: idx.decimal_opt(row, "high")?,
                low: idx.decimal_opt(row, "low")?,
                close: idx.decimal_opt(row, "close")?,
                vol: idx.decimal_opt(row, "vol")?,
                amount: idx.decimal_opt(row, "amount")?,
            });
        }
        tracing::debug!(ts_code, trade_date = %trade_date, count = rows.len(), "분봉 조회 완료");
        Ok(rows)
    }

    /// 상장 종목 목록을 조회합니다.
    pub async fn fetch_stock_basic(&self) -> Result<Vec<StockBasicRow>, ProviderError> {
        let data = self
            .call(
                "stock_basic",
                json!({ "list_status": "L" }),
                &["ts_code", "name", "industry", "list_date"],
            )
            .await?;

        let idx = FieldIndex::new(&data.fields);
        let mut rows = Vec::with_capacity(data.items.len());
        for row in &data.items {
            rows.push(StockBasicRow {
                ts_code: idx.string(row, "ts_code")?,
                name: idx.string(row, "name")?,
                industry: idx.string_opt(row, "industry")?,
                list_date: idx.date_opt(row, "list_date")?,
            });
        }
        tracing::info!(count = rows.len(), "상장 종목 목록 조회 완료");
        Ok(rows)
    }
}

const DAILY_FIELDS: &[&str] = &[
    "ts_code",
    "trade_date",
    "open",
    "high",
    "low",
    "close",
    "pre_close",
    "pct_chg",
    "vol",
    "amount",
];

fn decode_daily_rows(data: &ApiData) -> Result<Vec<DailyRow>, ProviderError> {
    let idx = FieldIndex::new(&data.fields);
    let mut rows = Vec::with_capacity(data.items.len());
    for row in &data.items {
        rows.push(DailyRow {
            ts_code: idx.string(row, "ts_code")?,
            trade_date: idx.date(row, "trade_date")?,
            open: idx.decimal_opt(row, "open")?,
            high: idx.decimal_opt(row, "high")?,
            low: idx.decimal_opt(row, "low")?,
            close: idx.decimal_opt(row, "close")?,
            pre_close: idx.decimal_opt(row, "pre_close")?,
            pct_chg: idx.decimal_opt(row, "pct_chg")?,
            vol: idx.decimal_opt(row, "vol")?,
            amount: idx.decimal_opt(row, "amount")?,
        });
    }
    Ok(rows)
}

/// `is_open` 필드를 읽습니다. 숫자/문자열 양쪽 표기를 허용합니다.
fn parse_is_open(idx: &FieldIndex, row: &[Value]) -> Result<bool, ProviderError> {
    match idx.value(row, "is_open")? {
        Value::Number(n) => Ok(n.as_i64() == Some(1)),
        Value::String(s) => Ok(s == "1"),
        other => Err(ProviderError::Parse(format!(
            "is_open 필드 해석 실패: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> TushareClient {
        TushareClient::new("test-token").with_base_url(server.url())
    }

    #[tokio::test]
    async fn test_fetch_daily_range_decodes_rows() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{
            "code": 0,
            "msg": "",
            "data": {
                "fields": ["ts_code","trade_date","open","high","low","close","pre_close","pct_chg","vol","amount"],
                "items": [
                    ["600000.SH","20240105",10.5,10.8,10.4,10.6,10.5,0.95,123456.0,130000.5],
                    ["600000.SH","20240104",10.2,10.6,10.1,10.5,10.2,2.94,98765.0,102000.0]
                ]
            }
        }"#;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = client_for(&server);
        let rows = client
            .fetch_daily_range(
                "600000.SH",
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ts_code, "600000.SH");
        assert_eq!(
            rows[0].trade_date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(rows[0].close, Some("10.6".parse().unwrap()));
        assert_eq!(rows[1].pct_chg, Some("2.94".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_trade_calendar_sorted_and_filtered() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{
            "code": 0,
            "msg": "",
            "data": {
                "fields": ["cal_date","is_open"],
                "items": [
                    ["20240108",1],
                    ["20240105",1],
                    ["20240106",0],
                    ["20240105",1]
                ]
            }
        }"#;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = client_for(&server);
        let dates = client
            .fetch_trade_calendar(
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_message_is_classified() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{"code":40203,"msg":"抱歉，您每分钟最多访问该接口500次","data":null}"#;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_daily_by_date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::RateLimited(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_auth_message_is_permanent() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{"code":2002,"msg":"抱歉，您没有访问该接口的权限","data":null}"#;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.fetch_stock_basic().await.unwrap_err();

        assert!(matches!(err, ProviderError::Unauthorized(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(502)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_daily_by_date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Server(502)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_field_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{
            "code": 0,
            "msg": "",
            "data": {
                "fields": ["ts_code","trade_date"],
                "items": [["600000.SH","20240105"]]
            }
        }"#;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_daily_by_date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Parse(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_minute_bars_decode_trade_time() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{
            "code": 0,
            "msg": "",
            "data": {
                "fields": ["ts_code","trade_time","open","high","low","close","vol","amount"],
                "items": [
                    ["600000.SH","2024-01-05 09:31:00",10.5,10.55,10.48,10.52,1200.0,1262400.0]
                ]
            }
        }"#;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = client_for(&server);
        let rows = client
            .fetch_minute_bars("600000.SH", NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].trade_time,
            NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(9, 31, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_from_env_requires_token() {
        std::env::remove_var("TUSHARE_TOKEN");
        assert!(TushareClient::from_env().is_none());

        std::env::set_var("TUSHARE_TOKEN", "env-token");
        assert!(TushareClient::from_env().is_some());
        std::env::remove_var("TUSHARE_TOKEN");
    }
}
