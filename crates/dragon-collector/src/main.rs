//! Standalone data collector CLI.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dragon_collector::modules::{
    self, BasicCollectOptions, DailyCollectOptions, IntradayCollectOptions,
};
use dragon_collector::plan::{BatchGrouping, Traversal};
use dragon_collector::{CollectorConfig, CollectorError, Fetcher};
use dragon_provider::{TushareClient, TUSHARE_DATE_FORMAT};
use dragon_store::PgStore;

#[derive(Parser)]
#[command(name = "dragon-collector")]
#[command(about = "Dragon A-Share Data Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 상장 종목 목록 동기화
    SyncInstruments,

    /// 일봉 수집
    CollectDaily {
        /// 수집 시작일 (YYYYMMDD, 생략 시 종료일로부터 --days)
        #[arg(long)]
        start: Option<String>,
        /// 수집 종료일 (YYYYMMDD, 기본: 오늘)
        #[arg(long)]
        end: Option<String>,
        /// 시작일 생략 시 거슬러 갈 일수
        #[arg(long, default_value_t = 30)]
        days: i64,
        /// 특정 종목만 수집 (쉼표로 구분, 예: "600000.SH,000001")
        #[arg(long)]
        codes: Option<String>,
        /// 존재 확인을 건너뛰고 전체 재수집
        #[arg(long)]
        force: bool,
        /// 배치 순회 방향 (newest-first | oldest-first)
        #[arg(long, default_value = "newest-first")]
        order: String,
        /// 배치 묶음 방식 (auto | by-instrument | by-date)
        #[arg(long, default_value = "auto")]
        grouping: String,
    },

    /// 일별 재무 지표 수집
    CollectBasic {
        /// 수집 시작일 (YYYYMMDD, 생략 시 종료일로부터 --days)
        #[arg(long)]
        start: Option<String>,
        /// 수집 종료일 (YYYYMMDD, 기본: 오늘)
        #[arg(long)]
        end: Option<String>,
        /// 시작일 생략 시 거슬러 갈 일수
        #[arg(long, default_value_t = 30)]
        days: i64,
        /// 존재 확인을 건너뛰고 전체 재수집
        #[arg(long)]
        force: bool,
        /// 배치 순회 방향 (newest-first | oldest-first)
        #[arg(long, default_value = "newest-first")]
        order: String,
    },

    /// 1분봉 수집
    CollectIntraday {
        /// 수집 시작일 (YYYYMMDD, 생략 시 종료일로부터 --days)
        #[arg(long)]
        start: Option<String>,
        /// 수집 종료일 (YYYYMMDD, 기본: 오늘)
        #[arg(long)]
        end: Option<String>,
        /// 시작일 생략 시 거슬러 갈 일수
        #[arg(long, default_value_t = 5)]
        days: i64,
        /// 특정 종목만 수집 (쉼표로 구분)
        #[arg(long)]
        codes: Option<String>,
        /// 존재 확인을 건너뛰고 전체 재수집
        #[arg(long)]
        force: bool,
        /// 배치 순회 방향 (newest-first | oldest-first)
        #[arg(long, default_value = "newest-first")]
        order: String,
    },

    /// 전체 워크플로우 실행 (종목 동기화 → 일봉 → 재무 지표)
    RunAll {
        /// 수집 시작일 (YYYYMMDD, 생략 시 종료일로부터 --days)
        #[arg(long)]
        start: Option<String>,
        /// 수집 종료일 (YYYYMMDD, 기본: 오늘)
        #[arg(long)]
        end: Option<String>,
        /// 시작일 생략 시 거슬러 갈 일수
        #[arg(long, default_value_t = 30)]
        days: i64,
        /// 존재 확인을 건너뛰고 전체 재수집
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("dragon_collector={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Dragon Data Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(database_url = %config.database_url, "설정 로드 완료");

    // DB 연결 및 스키마 준비
    let pool = sqlx::PgPool::connect(&config.database_url).await?;
    tracing::info!("데이터베이스 연결 성공");
    let store = PgStore::new(pool.clone());
    store.init_schema().await?;

    // 공급자 클라이언트와 호출 엔진
    let mut client = TushareClient::with_timeout(&config.tushare.token, config.tushare.timeout());
    if let Some(base_url) = &config.tushare.base_url {
        client = client.with_base_url(base_url);
    }
    let fetcher = Fetcher::from_config(&config.rate, &config.retry);

    // Ctrl+C 수신 시 현재 배치까지 끝내고 종료
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("종료 신호 수신, 현재 배치 완료 후 중단합니다");
                cancel.cancel();
            }
        });
    }

    // 명령 실행. 중단된 실행은 요약 출력 후 비정상 종료 코드로 끝냅니다.
    let interrupted = match cli.command {
        Commands::SyncInstruments => {
            let stats = modules::sync_instruments(&store, &client, &fetcher).await?;
            stats.log_summary("종목 동기화");
            stats.interrupted
        }
        Commands::CollectDaily {
            start,
            end,
            days,
            codes,
            force,
            order,
            grouping,
        } => {
            let (start, end) = resolve_range(start.as_deref(), end.as_deref(), days)?;
            let opts = DailyCollectOptions {
                start,
                end,
                codes: parse_codes(codes),
                force,
                traversal: parse_flag::<Traversal>(&order)?,
                grouping: parse_flag::<BatchGrouping>(&grouping)?,
            };
            let stats =
                modules::collect_daily(&store, &client, &fetcher, &config, &opts, &cancel).await?;
            stats.log_summary("일봉 수집");
            stats.interrupted
        }
        Commands::CollectBasic {
            start,
            end,
            days,
            force,
            order,
        } => {
            let (start, end) = resolve_range(start.as_deref(), end.as_deref(), days)?;
            let opts = BasicCollectOptions {
                start,
                end,
                force,
                traversal: parse_flag::<Traversal>(&order)?,
            };
            let stats =
                modules::collect_basic(&store, &client, &fetcher, &config, &opts, &cancel).await?;
            stats.log_summary("재무 지표 수집");
            stats.interrupted
        }
        Commands::CollectIntraday {
            start,
            end,
            days,
            codes,
            force,
            order,
        } => {
            let (start, end) = resolve_range(start.as_deref(), end.as_deref(), days)?;
            let opts = IntradayCollectOptions {
                start,
                end,
                codes: parse_codes(codes),
                force,
                traversal: parse_flag::<Traversal>(&order)?,
            };
            let stats =
                modules::collect_intraday(&store, &client, &fetcher, &config, &opts, &cancel)
                    .await?;
            stats.log_summary("분봉 수집");
            stats.interrupted
        }
        Commands::RunAll {
            start,
            end,
            days,
            force,
        } => {
            let (start, end) = resolve_range(start.as_deref(), end.as_deref(), days)?;
            tracing::info!("=== 전체 워크플로우 시작 ===");

            tracing::info!("Step 1/3: 종목 동기화");
            let sync_stats = modules::sync_instruments(&store, &client, &fetcher).await?;
            sync_stats.log_summary("종목 동기화");

            tracing::info!("Step 2/3: 일봉 수집");
            let daily_opts = DailyCollectOptions {
                start,
                end,
                codes: None,
                force,
                traversal: Traversal::NewestFirst,
                grouping: BatchGrouping::Auto,
            };
            let daily_stats =
                modules::collect_daily(&store, &client, &fetcher, &config, &daily_opts, &cancel)
                    .await?;
            daily_stats.log_summary("일봉 수집");

            if daily_stats.interrupted {
                tracing::warn!("중단 신호로 나머지 단계를 건너뜁니다");
                true
            } else {
                tracing::info!("Step 3/3: 재무 지표 수집");
                let basic_opts = BasicCollectOptions {
                    start,
                    end,
                    force,
                    traversal: Traversal::NewestFirst,
                };
                let basic_stats = modules::collect_basic(
                    &store, &client, &fetcher, &config, &basic_opts, &cancel,
                )
                .await?;
                basic_stats.log_summary("재무 지표 수집");

                tracing::info!("=== 전체 워크플로우 완료 ===");
                basic_stats.interrupted
            }
        }
    };

    pool.close().await;
    tracing::info!("Dragon Data Collector 종료");

    if interrupted {
        return Err(CollectorError::Interrupted.into());
    }
    Ok(())
}

/// YYYYMMDD 문자열과 `--days` 기본값으로 수집 구간을 결정합니다.
fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    days: i64,
) -> Result<(NaiveDate, NaiveDate), CollectorError> {
    let end_date = match end {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };
    let start_date = match start {
        Some(s) => parse_date(s)?,
        None => end_date - chrono::Duration::days(days.max(0)),
    };
    if start_date > end_date {
        return Err(CollectorError::Config(format!(
            "시작일이 종료일보다 늦습니다: {} > {}",
            start_date, end_date
        )));
    }
    Ok((start_date, end_date))
}

fn parse_date(s: &str) -> Result<NaiveDate, CollectorError> {
    NaiveDate::parse_from_str(s, TUSHARE_DATE_FORMAT).map_err(|e| {
        CollectorError::Config(format!("날짜는 YYYYMMDD 형식이어야 합니다 ({}): {}", s, e))
    })
}

fn parse_codes(codes: Option<String>) -> Option<Vec<String>> {
    codes.map(|s| {
        s.split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    })
}

fn parse_flag<T>(value: &str) -> Result<T, CollectorError>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(CollectorError::Config)
}
