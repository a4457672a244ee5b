//! 일별 재무 지표 수집 모듈.
//!
//! 지표는 일자별 전종목 조회로만 수집합니다. 한 날짜에 지표 행이
//! 하나라도 저장되어 있으면 그 날짜는 수집 완료로 간주합니다.

use std::collections::BTreeSet;
use std::time::Instant;

use chrono::NaiveDate;
use dragon_core::DailyIndicator;
use dragon_provider::{IndicatorRow, TushareClient};
use dragon_store::MarketStore;
use tokio_util::sync::CancellationToken;

use crate::calendar::resolve_calendar;
use crate::config::CollectorConfig;
use crate::fetch::{classify_failure, Fetcher};
use crate::plan::{plan_by_date, Traversal};
use crate::{CollectionStats, Result};

/// 지표 수집 옵션
#[derive(Debug, Clone)]
pub struct BasicCollectOptions {
    /// 수집 시작일
    pub start: NaiveDate,
    /// 수집 종료일
    pub end: NaiveDate,
    /// 존재 확인을 건너뛰고 전체 재수집
    pub force: bool,
    /// 배치 순회 방향
    pub traversal: Traversal,
}

/// 일별 재무 지표를 수집합니다.
pub async fn collect_basic(
    store: &dyn MarketStore,
    client: &TushareClient,
    fetcher: &Fetcher,
    config: &CollectorConfig,
    opts: &BasicCollectOptions,
    cancel: &CancellationToken,
) -> Result<CollectionStats> {
    let run_start = Instant::now();
    let calls_before = fetcher.api_calls();
    let mut stats = CollectionStats::new();

    tracing::info!(
        start = %opts.start,
        end = %opts.end,
        force = opts.force,
        "재무 지표 수집 시작"
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

    let covered: BTreeSet<NaiveDate> = if opts.force {
        BTreeSet::new()
    } else {
        match store.indicator_dates_covered(opts.start, opts.end).await {
            Ok(covered) => covered,
            Err(e) => {
                tracing::warn!(error = %e, "존재 확인 실패, 전체 구간을 재수집합니다");
                BTreeSet::new()
            }
        }
    };
    stats.skipped = calendar.iter().filter(|d| covered.contains(d)).count();

    let missing: Vec<NaiveDate> = calendar
        .iter()
        .copied()
        .filter(|d| !covered.contains(d))
        .collect();
    let batches = plan_by_date(&missing, opts.traversal);
    tracing::info!(
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

        let Some((trade_date, _)) = batch.date_range() else {
            continue;
        };

        stats.total += 1;
        match fetcher
            .call("daily_basic", || client.fetch_daily_basic(trade_date))
            .await
        {
            Ok(rows) => {
                let indicators: Vec<DailyIndicator> =
                    rows.into_iter().map(to_indicator).collect();
                if indicators.is_empty() {
                    stats.empty += 1;
                    tracing::debug!(trade_date = %trade_date, "데이터 없음");
                    continue;
                }
                match store.upsert_indicators(&indicators).await {
                    Ok(written) => {
                        stats.success += 1;
                        stats.records += written;
                    }
                    Err(e) => {
                        stats.errors += 1;
                        tracing::error!(trade_date = %trade_date, error = %e, "지표 저장 실패");
                    }
                }
            }
            Err(e) => {
                if e.is_auth_error() {
                    return Err(e.into());
                }
                stats.errors += 1;
                tracing::error!(
                    trade_date = %trade_date,
                    kind = classify_failure(&e).as_str(),
                    error = %e,
                    "지표 배치 조회 실패"
                );
            }
        }
    }

    stats.api_calls = (fetcher.api_calls() - calls_before) as usize;
    stats.elapsed = run_start.elapsed();
    Ok(stats)
}

fn to_indicator(row: IndicatorRow) -> DailyIndicator {
    DailyIndicator {
        ts_code: row.ts_code,
        trade_date: row.trade_date,
        turnover_rate: row.turnover_rate,
        turnover_rate_f: row.turnover_rate_f,
        volume_ratio: row.volume_ratio,
        pe: row.pe,
        pe_ttm: row.pe_ttm,
        pb: row.pb,
        total_share: row.total_share,
        float_share: row.float_share,
        total_mv: row.total_mv,
        circ_mv: row.circ_mv,
    }
}
