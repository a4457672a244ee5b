//! 인메모리 저장소 구현
//!
//! 데이터베이스 없이 수집 파이프라인을 검증하기 위한 테스트용
//! 구현입니다. PostgreSQL 구현과 동일한 키 규칙으로 업서트합니다.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use dragon_core::{DailyBar, DailyIndicator, InstrumentInfo, MinuteBar};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::MarketStore;

#[derive(Default)]
struct MemoryInner {
    instruments: BTreeMap<String, InstrumentInfo>,
    daily: BTreeMap<(String, NaiveDate), DailyBar>,
    indicators: BTreeMap<(String, NaiveDate), DailyIndicator>,
    minutes: BTreeMap<(String, NaiveDate, NaiveTime), MinuteBar>,
}

/// 인메모리 시장 데이터 저장소
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 날짜 존재 확인 쿼리의 실패를 시뮬레이션합니다.
    ///
    /// 존재 확인 실패 시 수집기가 보수적으로 재수집하는지
    /// 검증할 때 사용합니다. 종목 조회와 쓰기는 영향받지 않습니다.
    pub fn set_fail_date_queries(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_date_queries(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Query("simulated read failure".to_string()));
        }
        Ok(())
    }

    /// 저장된 일봉 전체를 키 순서로 반환합니다.
    pub async fn daily_bars(&self) -> Vec<DailyBar> {
        self.inner.read().await.daily.values().cloned().collect()
    }

    /// 저장된 종목 정보 전체를 코드 순서로 반환합니다.
    pub async fn instruments(&self) -> Vec<InstrumentInfo> {
        self.inner
            .read()
            .await
            .instruments
            .values()
            .cloned()
            .collect()
    }

    /// 저장된 일별 지표 전체를 키 순서로 반환합니다.
    pub async fn indicators(&self) -> Vec<DailyIndicator> {
        self.inner
            .read()
            .await
            .indicators
            .values()
            .cloned()
            .collect()
    }

    /// 저장된 분봉 전체를 키 순서로 반환합니다.
    pub async fn minute_bars(&self) -> Vec<MinuteBar> {
        self.inner.read().await.minutes.values().cloned().collect()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn upsert_instruments(&self, rows: &[InstrumentInfo]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        for row in rows {
            inner.instruments.insert(row.ts_code.clone(), row.clone());
        }
        Ok(rows.len())
    }

    async fn active_instruments(&self, include_st: bool) -> Result<Vec<InstrumentInfo>> {
        let inner = self.inner.read().await;
        Ok(inner
            .instruments
            .values()
            .filter(|i| include_st || !i.is_st)
            .cloned()
            .collect())
    }

    async fn instruments_by_codes(&self, codes: &[String]) -> Result<Vec<InstrumentInfo>> {
        let inner = self.inner.read().await;
        Ok(codes
            .iter()
            .filter_map(|c| inner.instruments.get(c).cloned())
            .collect())
    }

    async fn upsert_daily_bars(&self, bars: &[DailyBar]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        for bar in bars {
            inner
                .daily
                .insert((bar.ts_code.clone(), bar.trade_date), bar.clone());
        }
        Ok(bars.len())
    }

    async fn daily_dates_present(
        &self,
        ts_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>> {
        self.check_date_queries()?;
        let inner = self.inner.read().await;
        Ok(inner
            .daily
            .keys()
            .filter(|(code, date)| code == ts_code && (from..=to).contains(date))
            .map(|(_, date)| *date)
            .collect())
    }

    async fn upsert_indicators(&self, rows: &[DailyIndicator]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        for row in rows {
            inner
                .indicators
                .insert((row.ts_code.clone(), row.trade_date), row.clone());
        }
        Ok(rows.len())
    }

    async fn indicator_dates_covered(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>> {
        self.check_date_queries()?;
        let inner = self.inner.read().await;
        Ok(inner
            .indicators
            .keys()
            .filter(|(_, date)| (from..=to).contains(date))
            .map(|(_, date)| *date)
            .collect())
    }

    async fn upsert_minute_bars(&self, bars: &[MinuteBar]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        for bar in bars {
            inner.minutes.insert(
                (bar.ts_code.clone(), bar.trade_date, bar.trade_time),
                bar.clone(),
            );
        }
        Ok(bars.len())
    }

    async fn minute_dates_present(
        &self,
        ts_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>> {
        self.check_date_queries()?;
        let inner = self.inner.read().await;
        Ok(inner
            .minutes
            .keys()
            .filter(|(code, date, _)| code == ts_code && (from..=to).contains(date))
            .map(|(_, date, _)| *date)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bar(ts_code: &str, trade_date: NaiveDate) -> DailyBar {
        DailyBar {
            ts_code: ts_code.to_string(),
            trade_date,
            open: dec!(10.0),
            high: dec!(10.5),
            low: dec!(9.8),
            close: dec!(10.2),
            pre_close: Some(dec!(10.0)),
            pct_chg: Some(dec!(2.0)),
            vol: Some(dec!(120000)),
            amount: Some(dec!(122400)),
            is_limit_up: false,
            is_limit_down: false,
        }
    }

    #[tokio::test]
    async fn test_upsert_daily_idempotent() {
        let store = MemoryStore::new();
        let bars = vec![
            bar("600000.SH", date(2024, 1, 2)),
            bar("600000.SH", date(2024, 1, 3)),
        ];

        assert_eq!(store.upsert_daily_bars(&bars).await.unwrap(), 2);
        assert_eq!(store.upsert_daily_bars(&bars).await.unwrap(), 2);

        let stored = store.daily_bars().await;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].trade_date, date(2024, 1, 2));
    }

    #[tokio::test]
    async fn test_daily_dates_present_respects_range_and_code() {
        let store = MemoryStore::new();
        let bars = vec![
            bar("600000.SH", date(2024, 1, 2)),
            bar("600000.SH", date(2024, 1, 3)),
            bar("600000.SH", date(2024, 1, 10)),
            bar("000001.SZ", date(2024, 1, 4)),
        ];
        store.upsert_daily_bars(&bars).await.unwrap();

        let dates = store
            .daily_dates_present("600000.SH", date(2024, 1, 2), date(2024, 1, 5))
            .await
            .unwrap();

        assert_eq!(dates.len(), 2);
        assert!(dates.contains(&date(2024, 1, 2)));
        assert!(dates.contains(&date(2024, 1, 3)));
        assert!(!dates.contains(&date(2024, 1, 10)));
    }

    #[tokio::test]
    async fn test_active_instruments_filters_st() {
        let store = MemoryStore::new();
        let rows = vec![
            InstrumentInfo::new("600000.SH", "浦发银行", Some("银行".to_string()), None),
            InstrumentInfo::new("600823.SH", "ST兰花", None, None),
        ];
        store.upsert_instruments(&rows).await.unwrap();

        let without_st = store.active_instruments(false).await.unwrap();
        assert_eq!(without_st.len(), 1);
        assert_eq!(without_st[0].ts_code, "600000.SH");

        let with_st = store.active_instruments(true).await.unwrap();
        assert_eq!(with_st.len(), 2);
    }

    #[tokio::test]
    async fn test_fail_date_queries_spares_writes_and_instruments() {
        let store = MemoryStore::new();
        store.set_fail_date_queries(true);

        let result = store
            .daily_dates_present("600000.SH", date(2024, 1, 2), date(2024, 1, 5))
            .await;
        assert!(matches!(result, Err(StoreError::Query(_))));

        // 쓰기와 종목 조회는 계속 동작해야 합니다.
        let written = store
            .upsert_daily_bars(&[bar("600000.SH", date(2024, 1, 2))])
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert!(store.active_instruments(true).await.is_ok());

        store.set_fail_date_queries(false);
        let dates = store
            .daily_dates_present("600000.SH", date(2024, 1, 2), date(2024, 1, 5))
            .await
            .unwrap();
        assert_eq!(dates.len(), 1);
    }

    #[tokio::test]
    async fn test_minute_key_includes_trade_time() {
        let store = MemoryStore::new();
        let day = date(2024, 1, 2);
        let bars = vec![
            MinuteBar {
                ts_code: "600000.SH".to_string(),
                trade_date: day,
                trade_time: NaiveTime::from_hms_opt(9, 31, 0).unwrap(),
                open: dec!(10.0),
                high: dec!(10.1),
                low: dec!(10.0),
                close: dec!(10.1),
                vol: Some(dec!(1200)),
                amount: Some(dec!(12100)),
            },
            MinuteBar {
                ts_code: "600000.SH".to_string(),
                trade_date: day,
                trade_time: NaiveTime::from_hms_opt(9, 32, 0).unwrap(),
                open: dec!(10.1),
                high: dec!(10.2),
                low: dec!(10.1),
                close: dec!(10.2),
                vol: Some(dec!(900)),
                amount: Some(dec!(9150)),
            },
        ];

        store.upsert_minute_bars(&bars).await.unwrap();
        assert_eq!(store.minute_bars().await.len(), 2);

        let dates = store
            .minute_dates_present("600000.SH", day, day)
            .await
            .unwrap();
        assert_eq!(dates.len(), 1);
    }
}
