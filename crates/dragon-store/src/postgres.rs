//! PostgreSQL 저장소 구현
//!
//! 모든 쓰기는 UNNEST 일괄 업서트로 처리하고, 한 배치는 하나의
//! 트랜잭션 안에서 커밋됩니다.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use dragon_core::{DailyBar, DailyIndicator, InstrumentInfo, MinuteBar};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::error::{Result, StoreError};
use crate::store::MarketStore;

/// UNNEST 일괄 업서트 청크 크기
const UPSERT_CHUNK: usize = 500;

/// 수집 테이블 DDL (존재하면 무시)
const SCHEMA_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS stock_info (
        ts_code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        industry TEXT,
        list_date DATE,
        is_st BOOLEAN NOT NULL DEFAULT FALSE,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stock_daily (
        ts_code TEXT NOT NULL,
        trade_date DATE NOT NULL,
        open NUMERIC NOT NULL,
        high NUMERIC NOT NULL,
        low NUMERIC NOT NULL,
        close NUMERIC NOT NULL,
        pre_close NUMERIC,
        pct_chg NUMERIC,
        vol NUMERIC,
        amount NUMERIC,
        is_limit_up BOOLEAN NOT NULL DEFAULT FALSE,
        is_limit_down BOOLEAN NOT NULL DEFAULT FALSE,
        fetched_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (ts_code, trade_date)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_stock_daily_trade_date
        ON stock_daily (trade_date)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stock_indicator (
        ts_code TEXT NOT NULL,
        trade_date DATE NOT NULL,
        turnover_rate NUMERIC,
        turnover_rate_f NUMERIC,
        volume_ratio NUMERIC,
        pe NUMERIC,
        pe_ttm NUMERIC,
        pb NUMERIC,
        total_share NUMERIC,
        float_share NUMERIC,
        total_mv NUMERIC,
        circ_mv NUMERIC,
        fetched_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (ts_code, trade_date)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_stock_indicator_trade_date
        ON stock_indicator (trade_date)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stock_minute (
        ts_code TEXT NOT NULL,
        trade_date DATE NOT NULL,
        trade_time TIME NOT NULL,
        open NUMERIC NOT NULL,
        high NUMERIC NOT NULL,
        low NUMERIC NOT NULL,
        close NUMERIC NOT NULL,
        vol NUMERIC,
        amount NUMERIC,
        fetched_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (ts_code, trade_date, trade_time)
    )
    "#,
];

/// PostgreSQL 기반 시장 데이터 저장소
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// stock_info 테이블 레코드
#[derive(Debug, sqlx::FromRow)]
struct InstrumentRecord {
    ts_code: String,
    name: String,
    industry: Option<String>,
    list_date: Option<NaiveDate>,
    is_st: bool,
}

impl InstrumentRecord {
    fn into_info(self) -> InstrumentInfo {
        InstrumentInfo {
            ts_code: self.ts_code,
            name: self.name,
            industry: self.industry,
            list_date: self.list_date,
            is_st: self.is_st,
        }
    }
}

impl PgStore {
    /// 연결 풀로 저장소를 생성합니다.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 수집 테이블과 인덱스를 생성합니다.
    ///
    /// 이미 존재하는 객체는 건너뛰므로 기동 시마다 호출해도 안전합니다.
    pub async fn init_schema(&self) -> Result<()> {
        for ddl in SCHEMA_DDL {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Schema(e.to_string()))?;
        }
        info!("저장소 스키마 초기화 완료");
        Ok(())
    }
}

#[async_trait]
impl MarketStore for PgStore {
    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn upsert_instruments(&self, rows: &[InstrumentInfo]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        for chunk in rows.chunks(UPSERT_CHUNK) {
            let ts_codes: Vec<&str> = chunk.iter().map(|r| r.ts_code.as_str()).collect();
            let names: Vec<&str> = chunk.iter().map(|r| r.name.as_str()).collect();
            let industries: Vec<Option<&str>> = chunk.iter().map(|r| r.industry.as_deref()).collect();
            let list_dates: Vec<Option<NaiveDate>> = chunk.iter().map(|r| r.list_date).collect();
            let is_sts: Vec<bool> = chunk.iter().map(|r| r.is_st).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO stock_info
                    (ts_code, name, industry, list_date, is_st, updated_at)
                SELECT * FROM UNNEST(
                    $1::text[], $2::text[], $3::text[], $4::date[], $5::boolean[]
                ), NOW()
                ON CONFLICT (ts_code) DO UPDATE SET
                    name = EXCLUDED.name,
                    industry = EXCLUDED.industry,
                    list_date = EXCLUDED.list_date,
                    is_st = EXCLUDED.is_st,
                    updated_at = NOW()
                "#,
            )
            .bind(&ts_codes)
            .bind(&names)
            .bind(&industries)
            .bind(&list_dates)
            .bind(&is_sts)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

            written += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

        info!(written = written, "종목 정보 업서트 완료");
        Ok(written)
    }

    async fn active_instruments(&self, include_st: bool) -> Result<Vec<InstrumentInfo>> {
        let records: Vec<InstrumentRecord> = sqlx::query_as(
            r#"
            SELECT ts_code, name, industry, list_date, is_st
            FROM stock_info
            WHERE $1 OR NOT is_st
            ORDER BY ts_code ASC
            "#,
        )
        .bind(include_st)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.into_info()).collect())
    }

    async fn instruments_by_codes(&self, codes: &[String]) -> Result<Vec<InstrumentInfo>> {
        let records: Vec<InstrumentRecord> = sqlx::query_as(
            r#"
            SELECT ts_code, name, industry, list_date, is_st
            FROM stock_info
            WHERE ts_code = ANY($1)
            ORDER BY ts_code ASC
            "#,
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.into_info()).collect())
    }

    #[instrument(skip(self, bars), fields(count = bars.len()))]
    async fn upsert_daily_bars(&self, bars: &[DailyBar]) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        // UNNEST 패턴으로 일괄 업서트 (N+1 쿼리 방지)
        for chunk in bars.chunks(UPSERT_CHUNK) {
            let ts_codes: Vec<&str> = chunk.iter().map(|b| b.ts_code.as_str()).collect();
            let trade_dates: Vec<NaiveDate> = chunk.iter().map(|b| b.trade_date).collect();
            let opens: Vec<Decimal> = chunk.iter().map(|b| b.open).collect();
            let highs: Vec<Decimal> = chunk.iter().map(|b| b.high).collect();
            let lows: Vec<Decimal> = chunk.iter().map(|b| b.low).collect();
            let closes: Vec<Decimal> = chunk.iter().map(|b| b.close).collect();
            let pre_closes: Vec<Option<Decimal>> = chunk.iter().map(|b| b.pre_close).collect();
            let pct_chgs: Vec<Option<Decimal>> = chunk.iter().map(|b| b.pct_chg).collect();
            let vols: Vec<Option<Decimal>> = chunk.iter().map(|b| b.vol).collect();
            let amounts: Vec<Option<Decimal>> = chunk.iter().map(|b| b.amount).collect();
            let limit_ups: Vec<bool> = chunk.iter().map(|b| b.is_limit_up).collect();
            let limit_downs: Vec<bool> = chunk.iter().map(|b| b.is_limit_down).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO stock_daily
                    (ts_code, trade_date, open, high, low, close,
                     pre_close, pct_chg, vol, amount,
                     is_limit_up, is_limit_down, fetched_at)
                SELECT * FROM UNNEST(
                    $1::text[], $2::date[],
                    $3::numeric[], $4::numeric[], $5::numeric[], $6::numeric[],
                    $7::numeric[], $8::numeric[], $9::numeric[], $10::numeric[],
                    $11::boolean[], $12::boolean[]
                ), NOW()
                ON CONFLICT (ts_code, trade_date) DO UPDATE SET
                    open = EXCLUDED.open,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low,
                    close = EXCLUDED.close,
                    pre_close = EXCLUDED.pre_close,
                    pct_chg = EXCLUDED.pct_chg,
                    vol = EXCLUDED.vol,
                    amount = EXCLUDED.amount,
                    is_limit_up = EXCLUDED.is_limit_up,
                    is_limit_down = EXCLUDED.is_limit_down,
                    fetched_at = NOW()
                "#,
            )
            .bind(&ts_codes)
            .bind(&trade_dates)
            .bind(&opens)
            .bind(&highs)
            .bind(&lows)
            .bind(&closes)
            .bind(&pre_closes)
            .bind(&pct_chgs)
            .bind(&vols)
            .bind(&amounts)
            .bind(&limit_ups)
            .bind(&limit_downs)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

            written += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

        info!(written = written, "일봉 데이터 업서트 완료");
        Ok(written)
    }

    async fn daily_dates_present(
        &self,
        ts_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar(
            r#"
            SELECT trade_date FROM stock_daily
            WHERE ts_code = $1 AND trade_date BETWEEN $2 AND $3
            "#,
        )
        .bind(ts_code)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(dates.into_iter().collect())
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn upsert_indicators(&self, rows: &[DailyIndicator]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        for chunk in rows.chunks(UPSERT_CHUNK) {
            let ts_codes: Vec<&str> = chunk.iter().map(|r| r.ts_code.as_str()).collect();
            let trade_dates: Vec<NaiveDate> = chunk.iter().map(|r| r.trade_date).collect();
            let turnover_rates: Vec<Option<Decimal>> = chunk.iter().map(|r| r.turnover_rate).collect();
            let turnover_rate_fs: Vec<Option<Decimal>> =
                chunk.iter().map(|r| r.turnover_rate_f).collect();
            let volume_ratios: Vec<Option<Decimal>> = chunk.iter().map(|r| r.volume_ratio).collect();
            let pes: Vec<Option<Decimal>> = chunk.iter().map(|r| r.pe).collect();
            let pe_ttms: Vec<Option<Decimal>> = chunk.iter().map(|r| r.pe_ttm).collect();
            let pbs: Vec<Option<Decimal>> = chunk.iter().map(|r| r.pb).collect();
            let total_shares: Vec<Option<Decimal>> = chunk.iter().map(|r| r.total_share).collect();
            let float_shares: Vec<Option<Decimal>> = chunk.iter().map(|r| r.float_share).collect();
            let total_mvs: Vec<Option<Decimal>> = chunk.iter().map(|r| r.total_mv).collect();
            let circ_mvs: Vec<Option<Decimal>> = chunk.iter().map(|r| r.circ_mv).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO stock_indicator
                    (ts_code, trade_date, turnover_rate, turnover_rate_f, volume_ratio,
                     pe, pe_ttm, pb, total_share, float_share, total_mv, circ_mv, fetched_at)
                SELECT * FROM UNNEST(
                    $1::text[], $2::date[],
                    $3::numeric[], $4::numeric[], $5::numeric[],
                    $6::numeric[], $7::numeric[], $8::numeric[],
                    $9::numeric[], $10::numeric[], $11::numeric[], $12::numeric[]
                ), NOW()
                ON CONFLICT (ts_code, trade_date) DO UPDATE SET
                    turnover_rate = EXCLUDED.turnover_rate,
                    turnover_rate_f = EXCLUDED.turnover_rate_f,
                    volume_ratio = EXCLUDED.volume_ratio,
                    pe = EXCLUDED.pe,
                    pe_ttm = EXCLUDED.pe_ttm,
                    pb = EXCLUDED.pb,
                    total_share = EXCLUDED.total_share,
                    float_share = EXCLUDED.float_share,
                    total_mv = EXCLUDED.total_mv,
                    circ_mv = EXCLUDED.circ_mv,
                    fetched_at = NOW()
                "#,
            )
            .bind(&ts_codes)
            .bind(&trade_dates)
            .bind(&turnover_rates)
            .bind(&turnover_rate_fs)
            .bind(&volume_ratios)
            .bind(&pes)
            .bind(&pe_ttms)
            .bind(&pbs)
            .bind(&total_shares)
            .bind(&float_shares)
            .bind(&total_mvs)
            .bind(&circ_mvs)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

            written += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

        info!(written = written, "일별 지표 업서트 완료");
        Ok(written)
    }

    async fn indicator_dates_covered(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT trade_date FROM stock_indicator
            WHERE trade_date BETWEEN $1 AND $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(dates.into_iter().collect())
    }

    #[instrument(skip(self, bars), fields(count = bars.len()))]
    async fn upsert_minute_bars(&self, bars: &[MinuteBar]) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        for chunk in bars.chunks(UPSERT_CHUNK) {
            let ts_codes: Vec<&str> = chunk.iter().map(|b| b.ts_code.as_str()).collect();
            let trade_dates: Vec<NaiveDate> = chunk.iter().map(|b| b.trade_date).collect();
            let trade_times: Vec<NaiveTime> = chunk.iter().map(|b| b.trade_time).collect();
            let opens: Vec<Decimal> = chunk.iter().map(|b| b.open).collect();
            let highs: Vec<Decimal> = chunk.iter().map(|b| b.high).collect();
            let lows: Vec<Decimal> = chunk.iter().map(|b| b.low).collect();
            let closes: Vec<Decimal> = chunk.iter().map(|b| b.close).collect();
            let vols: Vec<Option<Decimal>> = chunk.iter().map(|b| b.vol).collect();
            let amounts: Vec<Option<Decimal>> = chunk.iter().map(|b| b.amount).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO stock_minute
                    (ts_code, trade_date, trade_time, open, high, low, close,
                     vol, amount, fetched_at)
                SELECT * FROM UNNEST(
                    $1::text[], $2::date[], $3::time[],
                    $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[],
                    $8::numeric[], $9::numeric[]
                ), NOW()
                ON CONFLICT (ts_code, trade_date, trade_time) DO UPDATE SET
                    open = EXCLUDED.open,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low,
                    close = EXCLUDED.close,
                    vol = EXCLUDED.vol,
                    amount = EXCLUDED.amount,
                    fetched_at = NOW()
                "#,
            )
            .bind(&ts_codes)
            .bind(&trade_dates)
            .bind(&trade_times)
            .bind(&opens)
            .bind(&highs)
            .bind(&lows)
            .bind(&closes)
            .bind(&vols)
            .bind(&amounts)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

            written += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

        info!(written = written, "분봉 데이터 업서트 완료");
        Ok(written)
    }

    async fn minute_dates_present(
        &self,
        ts_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT trade_date FROM stock_minute
            WHERE ts_code = $1 AND trade_date BETWEEN $2 AND $3
            "#,
        )
        .bind(ts_code)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(dates.into_iter().collect())
    }
}
