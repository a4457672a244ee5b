//! 데이터 수집 모듈.

use std::collections::HashSet;

use dragon_core::market;
use dragon_core::InstrumentInfo;
use dragon_store::MarketStore;

use crate::Result;

pub mod daily;
pub mod daily_basic;
pub mod instrument_sync;
pub mod intraday;

pub use daily::{collect_daily, DailyCollectOptions};
pub use daily_basic::{collect_basic, BasicCollectOptions};
pub use instrument_sync::sync_instruments;
pub use intraday::{collect_intraday, IntradayCollectOptions};

/// 수집 대상 종목을 결정합니다.
///
/// 코드 목록이 주어지면 정규화 후 저장소에서 조회하고, 없으면 저장된
/// 전 종목을 사용합니다. ST 제외는 전 종목 선택에만 적용됩니다.
pub(crate) async fn select_instruments(
    store: &dyn MarketStore,
    codes: Option<&[String]>,
    include_st: bool,
) -> Result<Vec<InstrumentInfo>> {
    match codes {
        Some(codes) => {
            let normalized: Vec<String> =
                codes.iter().map(|c| market::normalize_ts_code(c)).collect();
            let found = store.instruments_by_codes(&normalized).await?;
            if found.len() < normalized.len() {
                let known: HashSet<&str> = found.iter().map(|i| i.ts_code.as_str()).collect();
                let unknown: Vec<&str> = normalized
                    .iter()
                    .map(|s| s.as_str())
                    .filter(|c| !known.contains(c))
                    .collect();
                tracing::warn!(unknown = ?unknown, "저장소에 없는 종목 코드는 건너뜁니다");
            }
            Ok(found)
        }
        None => Ok(store.active_instruments(include_st).await?),
    }
}
