//! 일봉 수집 모듈.
//!
//! 수집은 세 단계로 진행됩니다:
//! 1. 계획: 캘린더·종목·존재 확인으로 누락 대상을 계산해 배치로 묶기
//! 2. 배치 수집: 배치 단위 조회 → 정규화 → 트랜잭션 업서트
//! 3. 보고: 통계 집계
//!
//! 배치 실패는 해당 배치에만 영향을 주고 나머지는 계속 진행합니다.
//! 인증 오류만 실행 전체를 중단합니다.

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use chrono::NaiveDate;
use dragon_core::market::{self, Board};
use dragon_core::{DailyBar, InstrumentInfo};
use dragon_provider::{DailyRow, ProviderError, TushareClient};
use dragon_store::MarketStore;
use tokio_util::sync::CancellationToken;

use crate::calendar::resolve_calendar;
use crate::config::CollectorConfig;
use crate::fetch::{classify_failure, Fetcher};
use crate::plan::{plan_batches, Batch, BatchGrouping, BatchScope, Traversal};
use crate::{CollectionStats, Result};

/// 일봉 수집 옵션
#[derive(Debug, Clone)]
pub struct DailyCollectOptions {
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
    /// 배치 묶음 방식
    pub grouping: BatchGrouping,
}

/// 일봉 데이터를 수집합니다.
pub async fn collect_daily(
    store: &dyn MarketStore,
    client: &TushareClient,
    fetcher: &Fetcher,
    config: &CollectorConfig,
    opts: &DailyCollectOptions,
    cancel: &CancellationToken,
) -> Result<CollectionStats> {
    let run_start = Instant::now();
    let calls_before = fetcher.api_calls();
    let mut stats = CollectionStats::new();

    tracing::info!(
        start = %opts.start,
        end = %opts.end,
        force = opts.force,
        "일봉 수집 시작"
    );

    // 1단계: 계획 수립
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

    let by_code: HashMap<&str, &InstrumentInfo> = instruments
        .iter()
        .map(|i| (i.ts_code.as_str(), i))
        .collect();

    let missing = missing_targets(store, &instruments, &calendar, opts, &mut stats).await;
    let targets: usize = missing.iter().map(|(_, dates)| dates.len()).sum();

    let (batches, grouping) = plan_batches(
        opts.grouping,
        &missing,
        &calendar,
        config.collect.max_periods_per_call,
        opts.traversal,
    );
    tracing::info!(
        instruments = instruments.len(),
        trading_days = calendar.len(),
        targets = targets,
        skipped = stats.skipped,
        batches = batches.len(),
        grouping = %grouping,
        traversal = %opts.traversal,
        "수집 계획 수립 완료"
    );

    // 2단계: 배치 수집
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

        stats.total += 1;
        match fetch_batch(client, fetcher, batch).await {
            Ok(rows) => {
                let bars = normalize_rows(rows, &by_code);
                if bars.is_empty() {
                    stats.empty += 1;
                    tracing::debug!(scope = ?batch.scope, "데이터 없음");
                    continue;
                }
                match store.upsert_daily_bars(&bars).await {
                    Ok(written) => {
                        stats.success += 1;
                        stats.records += written;
                    }
                    Err(e) => {
                        stats.errors += 1;
                        tracing::error!(scope = ?batch.scope, error = %e, "일봉 저장 실패");
                    }
                }
            }
            Err(e) => {
                if e.is_auth_error() {
                    return Err(e.into());
                }
                stats.errors += 1;
                tracing::error!(
                    scope = ?batch.scope,
                    kind = classify_failure(&e).as_str(),
                    error = %e,
                    "일봉 배치 조회 실패"
                );
            }
        }
    }

    // 3단계: 보고
    stats.api_calls = (fetcher.api_calls() - calls_before) as usize;
    stats.elapsed = run_start.elapsed();
    Ok(stats)
}

/// 종목별 누락 거래일을 계산합니다.
///
/// 존재 확인 쿼리가 실패하면 해당 종목은 전체 구간을 다시 수집합니다.
/// 업서트가 멱등이므로 중복 수집은 데이터에 영향이 없습니다.
async fn missing_targets(
    store: &dyn MarketStore,
    instruments: &[InstrumentInfo],
    calendar: &[NaiveDate],
    opts: &DailyCollectOptions,
    stats: &mut CollectionStats,
) -> Vec<(String, Vec<NaiveDate>)> {
    let mut missing = Vec::new();
    for inst in instruments {
        let dates: Vec<NaiveDate> = if opts.force {
            calendar.to_vec()
        } else {
            let present = match store
                .daily_dates_present(&inst.ts_code, opts.start, opts.end)
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

/// 배치 범위에 맞는 공급자 호출을 실행합니다.
async fn fetch_batch(
    client: &TushareClient,
    fetcher: &Fetcher,
    batch: &Batch,
) -> std::result::Result<Vec<DailyRow>, ProviderError> {
    let Some((start, end)) = batch.date_range() else {
        return Ok(Vec::new());
    };
    match &batch.scope {
        BatchScope::Instrument(ts_code) => {
            fetcher
                .call("daily", || client.fetch_daily_range(ts_code, start, end))
                .await
        }
        BatchScope::AllInstruments => {
            fetcher
                .call("daily", || client.fetch_daily_by_date(start))
                .await
        }
    }
}

/// 원시 행을 저장 레코드로 정규화합니다.
///
/// 수집 대상에 없는 종목(전종목 조회의 나머지)과 OHLC가 불완전한
/// 행은 제외합니다.
fn normalize_rows(rows: Vec<DailyRow>, by_code: &HashMap<&str, &InstrumentInfo>) -> Vec<DailyBar> {
    rows.into_iter()
        .filter_map(|row| {
            let inst = by_code.get(row.ts_code.as_str())?;
            normalize_row(row, inst)
        })
        .collect()
}

/// 원시 행 하나를 일봉 레코드로 변환하고 상한가/하한가 플래그를 계산합니다.
fn normalize_row(row: DailyRow, inst: &InstrumentInfo) -> Option<DailyBar> {
    let open = row.open?;
    let high = row.high?;
    let low = row.low?;
    let close = row.close?;

    let board = Board::of(&row.ts_code);
    let (is_limit_up, is_limit_down) = match row.pre_close {
        Some(pre_close) => (
            market::is_limit_up(close, pre_close, board, inst.is_st),
            market::is_limit_down(close, pre_close, board, inst.is_st),
        ),
        None => (false, false),
    };

    Some(DailyBar {
        ts_code: row.ts_code,
        trade_date: row.trade_date,
        open,
        high,
        low,
        close,
        pre_close: row.pre_close,
        pct_chg: row.pct_chg,
        vol: row.vol,
        amount: row.amount,
        is_limit_up,
        is_limit_down,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(ts_code: &str, pre_close: Option<&str>, close: &str) -> DailyRow {
        DailyRow {
            ts_code: ts_code.to_string(),
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            open: Some(dec!(10.0)),
            high: Some(close.parse().unwrap()),
            low: Some(dec!(9.9)),
            close: Some(close.parse().unwrap()),
            pre_close: pre_close.map(|p| p.parse().unwrap()),
            pct_chg: None,
            vol: Some(dec!(1000)),
            amount: None,
        }
    }

    fn inst(ts_code: &str, name: &str) -> InstrumentInfo {
        InstrumentInfo::new(ts_code, name, None, None)
    }

    #[test]
    fn test_normalize_flags_main_board_limit_up() {
        let inst = inst("600000.SH", "浦发银行");
        let bar = normalize_row(row("600000.SH", Some("10.00"), "11.00"), &inst).unwrap();
        assert!(bar.is_limit_up);
        assert!(!bar.is_limit_down);
    }

    #[test]
    fn test_normalize_flags_star_board_needs_twenty_percent() {
        let inst = inst("688111.SH", "金山办公");
        // 10% 상승은 과학창업판 기준 상한가가 아닙니다.
        let bar = normalize_row(row("688111.SH", Some("10.00"), "11.00"), &inst).unwrap();
        assert!(!bar.is_limit_up);

        let bar = normalize_row(row("688111.SH", Some("10.00"), "12.00"), &inst).unwrap();
        assert!(bar.is_limit_up);
    }

    #[test]
    fn test_normalize_flags_st_five_percent() {
        let inst = inst("600823.SH", "ST兰花");
        let bar = normalize_row(row("600823.SH", Some("10.00"), "10.50"), &inst).unwrap();
        assert!(bar.is_limit_up);
    }

    #[test]
    fn test_normalize_without_pre_close_clears_flags() {
        let inst = inst("600000.SH", "浦发银行");
        let bar = normalize_row(row("600000.SH", None, "11.00"), &inst).unwrap();
        assert!(!bar.is_limit_up);
        assert!(!bar.is_limit_down);
    }

    #[test]
    fn test_normalize_drops_incomplete_rows() {
        let inst = inst("600000.SH", "浦发银行");
        let mut incomplete = row("600000.SH", Some("10.00"), "11.00");
        incomplete.close = None;
        assert!(normalize_row(incomplete, &inst).is_none());
    }

    #[test]
    fn test_normalize_rows_filters_to_pool() {
        let pool_inst = inst("600000.SH", "浦发银行");
        let by_code: HashMap<&str, &InstrumentInfo> =
            [("600000.SH", &pool_inst)].into_iter().collect();

        let rows = vec![
            row("600000.SH", Some("10.00"), "10.20"),
            row("000001.SZ", Some("10.00"), "10.20"),
        ];
        let bars = normalize_rows(rows, &by_code);

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].ts_code, "600000.SH");
    }
}
