//! 시장 데이터 레코드 타입.
//!
//! 이 모듈은 수집 파이프라인이 저장소에 기록하는 레코드를 정의합니다:
//! - `InstrumentInfo` - 종목 기본 정보
//! - `DailyBar` - 일봉 (OHLCV + 상한가/하한가 플래그)
//! - `DailyIndicator` - 일별 재무 지표
//! - `MinuteBar` - 분봉

use crate::market::{is_st_name, Exchange};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 종목 기본 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    /// Tushare 종목 코드 (예: 600000.SH)
    pub ts_code: String,
    /// 종목명
    pub name: String,
    /// 업종 (선택)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// 상장일 (선택)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_date: Option<NaiveDate>,
    /// ST(관리종목) 여부. 종목명에서 파생됩니다.
    pub is_st: bool,
}

impl InstrumentInfo {
    /// 새 종목 정보를 생성합니다. ST 여부는 종목명에서 파생됩니다.
    pub fn new(
        ts_code: impl Into<String>,
        name: impl Into<String>,
        industry: Option<String>,
        list_date: Option<NaiveDate>,
    ) -> Self {
        let name = name.into();
        let is_st = is_st_name(&name);
        Self {
            ts_code: ts_code.into(),
            name,
            industry,
            list_date,
            is_st,
        }
    }

    /// 종목 코드에서 파생된 소속 거래소를 반환합니다.
    pub fn exchange(&self) -> Exchange {
        Exchange::of(&self.ts_code)
    }
}

/// 일봉 데이터.
///
/// 가격은 위안(元), 거래량은 수(手), 거래대금은 천위안(千元) 단위로
/// 공급자 응답을 그대로 따릅니다. 상한가/하한가 플래그는 정규화 시점에
/// 보드별 등락폭 제한 규칙으로 계산됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Tushare 종목 코드
    pub ts_code: String,
    /// 거래일
    pub trade_date: NaiveDate,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 전일 종가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_close: Option<Decimal>,
    /// 등락률 (%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_chg: Option<Decimal>,
    /// 거래량 (手)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vol: Option<Decimal>,
    /// 거래대금 (千元)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// 상한가 마감 여부
    pub is_limit_up: bool,
    /// 하한가 마감 여부
    pub is_limit_down: bool,
}

/// 일별 재무 지표 (daily_basic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyIndicator {
    /// Tushare 종목 코드
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

/// 분봉 데이터. (ts_code, trade_date, trade_time)으로 식별됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteBar {
    /// Tushare 종목 코드
    pub ts_code: String,
    /// 거래일
    pub trade_date: NaiveDate,
    /// 체결 시각 (거래소 현지 시간)
    pub trade_time: NaiveTime,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량 (手)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vol: Option<Decimal>,
    /// 거래대금 (元)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_st_derivation() {
        let normal = InstrumentInfo::new("600000.SH", "浦发银行", None, None);
        assert!(!normal.is_st);

        let st = InstrumentInfo::new("600123.SH", "ST兰花", None, None);
        assert!(st.is_st);

        let star_st = InstrumentInfo::new("600077.SH", "*ST宋都", None, None);
        assert!(star_st.is_st);
    }

    #[test]
    fn test_instrument_exchange() {
        let info = InstrumentInfo::new("000001.SZ", "平安银行", None, None);
        assert_eq!(info.exchange(), Exchange::Shenzhen);
    }
}
