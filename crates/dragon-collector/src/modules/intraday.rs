//! 분봉 수집 모듈.
//!
//! 분봉은 종목·거래일 단위로 한 번에 하루치씩 조회합니다.
//! 전 종목 분봉은 호출 수가 매우 크므로 보통 `--codes`로 대상을
//! 좁혀 실행합니다.

use std::collections::BTreeSet;
use std::time::Instant;

use chrono::NaiveDate;
use dragon_core::{InstrumentInfo, MinuteBar};
use dragon_provider::{MinuteRow, TushareClient};
use dragon_store::MarketStore;
use tokio_util::sync::CancellationToken;

use crate::calendar::resolve_calendar;
use crate::config::CollectorConfig;
use crate::fetch::{classify_failure, Fetcher};
use crate::plan::{plan_by_instrument, BatchScope, Traversal};
use crate::{CollectionStats, Result};

/// 분봉 수집 옵션
#[derive(Debug, Clone)]
pub struct IntradayCollectOptions {
    /// 수집 시작일
    pub start: NaiveDate,
    /// 수집 종료일
    pub end: NaiveDate,
    /// 특정 종목만 수집 (없으면 저장된 전 종목)
    pub codes: Option<Vec<String>>,
    /// 존재 확인을 건너뛰고 전체 재수집
    pub force: bool,
    /// 배치 순회 방향
    pub traversal: Traversal,
}

/// 1분봉 데이터를 수집합니다.
pub async fn collect_intraday(
    store: &dyn MarketStore,
    client: &TushareClient,
    fetcher: &Fetcher,
    config: &CollectorConfig,
    opts: &IntradayCollectOptions,
    cancel: &CancellationToken,
) -> Result<CollectionStats> {
    let run_start = Instant::now();
    let calls_before = fetcher.api_calls();
    let mut stats = CollectionStats::new();

    tracing::info!(
        start = %opts.start,
        end = %opts.end,
        force = opts.force,
        "분봉 수집 시작"
    );

    let calendar = resolve_calendar(
        fetcher,
        client,
        opts.start,
        opts.end,
        config.collect.weekday_fallback,
    )
    .await?;
    if calendar.is_empty() {
        tracing::info!("구간 내 거래일이 없습니다");
        stats.elapsed = run_start.elapsed();
        return Ok(stats);
    }

    let instruments =
        super::select_instruments(store, opts.codes.as_deref(), config.collect.include_st).await?;
    if instruments.is_empty() {
        tracing::warn!("수집할 종목이 없습니다 (sync-instruments를 먼저 실행하세요)");
        stats.elapsed = run_start.elapsed();
        return Ok(stats);
    }

    let missing = missing_targets(store, &instruments, &calendar, opts, &mut stats).await;

    // 분봉 조회는 하루 단위이므로 배치당 거래일을 1로 고정합니다.
    let batches = plan_by_instrument(&missing, &calendar, 1, opts.traversal);
    tracing::info!(
        instruments = instruments.len(),
        trading_days = calendar.len(),
        skipped = stats.skipped,
        batches = batches.len(),
        "수집 계획 수립 완료"
    );

    for batch in &batches {
        if cancel.is_cancelled() {
            stats.interrupted = true;
            tracing::warn!(
                completed = stats.total,
                remaining = batches.len() - stats.total,
                "중단 신호 수신, 남은 배치를 종료합니다"
            );
            break;
        }

        let BatchScope::Instrument(ts_code) = &batch.scope else {
            continue;
        };
        let Some((trade_date, _)) = batch.date_range() else {
            continue;
        };

        stats.total += 1;
        match fetcher
            .call("stk_mins", || client.fetch_minute_bars(ts_code, trade_date))
            .await
        {
            Ok(rows) => {
                let bars: Vec<MinuteBar> = rows.into_iter().filter_map(to_minute_bar).collect();
                if bars.is_empty() {
                    stats.empty += 1;
                    tracing::debug!(ts_code = %ts_code, trade_date = %trade_date, "데이터 없음");
                    continue;
                }
                match store.upsert_minute_bars(&bars).await {
                    Ok(written) => {
                        stats.success += 1;
                        stats.records += written;
                    }
                    Err(e) => {
                        stats.errors += 1;
                        tracing::error!(ts_code = %ts_code, error = %e, "분봉 저장 실패");
                    }
                }
            }
            Err(e) => {
                if e.is_auth_error() {
                    return Err(e.into());
                }
                stats.errors += 1;
                tracing::error!(
                    ts_code = %ts_code,
                    trade_date = %trade_date,
                    kind = classify_failure(&e).as_str(),
                    error = %e,
                    "분봉 배치 조회 실패"
                );
            }
        }
    }

    stats.api_calls = (fetcher.api_calls() - calls_before) as usize;
    stats.elapsed = run_start.elapsed();
    Ok(stats)
}

/// 종목별 누락 거래일을 계산합니다.
async fn missing_targets(
    store: &dyn MarketStore,
    instruments: &[InstrumentInfo],
    calendar: &[NaiveDate],
    opts: &IntradayCollectOptions,
    stats: &mut CollectionStats,
) -> Vec<(String, Vec<NaiveDate>)> {
    let mut missing = Vec::new();
    for inst in instruments {
        let dates: Vec<NaiveDate> = if opts.force {
            calendar.to_vec()
        } else {
            let present = match store
                .minute_dates_present(&inst.ts_code, opts.start, opts.end)
                .await
            {
                Ok(present) => present,
                Err(e) => {
                    tracing::warn!(
                        ts_code = %inst.ts_code,
                        error = %e,
                        "존재 확인 실패, 전체 구간을 재수집합니다"
                    );
                    BTreeSet::new()
                }
            };
            stats.skipped += calendar.iter().filter(|d| present.contains(d)).count();
            calendar
                .iter()
                .copied()
                .filter(|d| !present.contains(d))
                .collect()
        };
        if !dates.is_empty() {
            missing.push((inst.ts_code.clone(), dates));
        }
    }
    missing
}

/// 원시 분봉 행을 저장 레코드로 변환합니다. OHLC가 불완전한 행은 제외합니다.
fn to_minute_bar(row: MinuteRow) -> Option<MinuteBar> {
    Some(MinuteBar {
        ts_code: row.ts_code,
        trade_date: row.trade_time.date(),
        trade_time: row.trade_time.time(),
        open: row.open?,
        high: row.high?,
        low: row.low?,
        close: row.close?,
        vol: row.vol,
        amount: row.amount,
    })
}
