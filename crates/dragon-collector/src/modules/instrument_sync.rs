//! 종목 정보 동기화 모듈.

use std::time::Instant;

use dragon_core::InstrumentInfo;
use dragon_provider::TushareClient;
use dragon_store::MarketStore;

use crate::fetch::{classify_failure, Fetcher};
use crate::{CollectionStats, Result};

/// 상장 종목 목록을 동기화합니다.
///
/// ST 종목도 저장합니다. ST 제외는 수집 대상 선정 시점에 적용되므로
/// 목록 자체는 항상 전체 유니버스를 담습니다.
pub async fn sync_instruments(
    store: &dyn MarketStore,
    client: &TushareClient,
    fetcher: &Fetcher,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let calls_before = fetcher.api_calls();
    let mut stats = CollectionStats::new();

    tracing::info!("종목 동기화 시작");
    stats.total = 1;

    match fetcher
        .call("stock_basic", || client.fetch_stock_basic())
        .await
    {
        Ok(rows) => {
            let instruments: Vec<InstrumentInfo> = rows
                .into_iter()
                .map(|r| InstrumentInfo::new(r.ts_code, r.name, r.industry, r.list_date))
                .collect();

            if instruments.is_empty() {
                stats.empty = 1;
                tracing::warn!("상장 종목 응답이 비어 있습니다");
            } else {
                let st_count = instruments.iter().filter(|i| i.is_st).count();
                match store.upsert_instruments(&instruments).await {
                    Ok(written) => {
                        stats.success = 1;
                        stats.records = written;
                        tracing::info!(
                            total = instruments.len(),
                            st = st_count,
                            written,
                            "종목 동기화 완료"
                        );
                    }
                    Err(e) => {
                        stats.errors = 1;
                        tracing::error!(error = %e, "종목 정보 저장 실패");
                    }
                }
            }
        }
        Err(e) => {
            if e.is_auth_error() {
                return Err(e.into());
            }
            stats.errors = 1;
            tracing::error!(
                kind = classify_failure(&e).as_str(),
                error = %e,
                "상장 종목 조회 실패"
            );
        }
    }

    stats.api_calls = (fetcher.api_calls() - calls_before) as usize;
    stats.elapsed = start.elapsed();
    Ok(stats)
}
