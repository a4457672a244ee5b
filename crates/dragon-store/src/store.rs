//! 시장 데이터 저장소 인터페이스

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use dragon_core::{DailyBar, DailyIndicator, InstrumentInfo, MinuteBar};

use crate::error::Result;

/// 시장 데이터 저장소 인터페이스
///
/// 모든 쓰기는 자연 키 기준 업서트로 동작하며, 같은 배치를 두 번
/// 저장해도 최종 상태는 동일합니다. 존재 확인 조회는 날짜 단위로
/// 제공되어 수집기가 이미 저장된 구간을 건너뛸 수 있습니다.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// 종목 기본 정보를 업서트합니다 (키: ts_code).
    async fn upsert_instruments(&self, rows: &[InstrumentInfo]) -> Result<usize>;

    /// 상장 종목 목록을 조회합니다.
    ///
    /// `include_st`가 false이면 ST 종목을 제외합니다.
    async fn active_instruments(&self, include_st: bool) -> Result<Vec<InstrumentInfo>>;

    /// 지정한 종목 코드들의 기본 정보를 조회합니다.
    async fn instruments_by_codes(&self, codes: &[String]) -> Result<Vec<InstrumentInfo>>;

    /// 일봉 데이터를 업서트합니다 (키: ts_code + trade_date).
    async fn upsert_daily_bars(&self, bars: &[DailyBar]) -> Result<usize>;

    /// 특정 종목의 일봉이 저장된 날짜 집합을 조회합니다.
    async fn daily_dates_present(
        &self,
        ts_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>>;

    /// 일별 지표 데이터를 업서트합니다 (키: ts_code + trade_date).
    async fn upsert_indicators(&self, rows: &[DailyIndicator]) -> Result<usize>;

    /// 지표가 하나라도 저장된 날짜 집합을 조회합니다.
    ///
    /// 지표는 날짜 단위 전체 시장 조회로 수집되므로 날짜에 행이
    /// 존재하면 해당 날짜는 수집 완료로 간주합니다.
    async fn indicator_dates_covered(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>>;

    /// 분봉 데이터를 업서트합니다 (키: ts_code + trade_date + trade_time).
    async fn upsert_minute_bars(&self, bars: &[MinuteBar]) -> Result<usize>;

    /// 특정 종목의 분봉이 저장된 날짜 집합을 조회합니다.
    async fn minute_dates_present(
        &self,
        ts_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>>;
}
