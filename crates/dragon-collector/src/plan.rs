//! 배치 계획 수립 모듈.
//!
//! 수집 대상(종목·거래일 쌍)을 API 호출 단위 배치로 묶습니다.
//! 계획은 순수 함수로 수행되며 네트워크나 저장소에 접근하지 않습니다.
//!
//! 핵심 규칙:
//! - 한 배치의 거래일 수는 `cap`을 넘지 않습니다.
//! - 배치는 캘린더상 연속 구간만 담습니다. 중간 거래일이 이미 저장되어
//!   있으면 그 지점에서 배치를 끊어 기간 조회가 저장 구간을 다시
//!   요청하지 않게 합니다.
//! - 배치 내부 거래일은 항상 오름차순, 배치 목록은 순회 방향을 따릅니다.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

/// 배치 순회 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// 최신 거래일부터 수집 (기본값)
    NewestFirst,
    /// 과거 거래일부터 수집
    OldestFirst,
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewestFirst => write!(f, "newest-first"),
            Self::OldestFirst => write!(f, "oldest-first"),
        }
    }
}

impl FromStr for Traversal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest-first" => Ok(Self::NewestFirst),
            "oldest-first" => Ok(Self::OldestFirst),
            other => Err(format!(
                "지원하지 않는 순회 방향: {} (newest-first | oldest-first)",
                other
            )),
        }
    }
}

/// 배치 묶음 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchGrouping {
    /// 호출 수가 적은 쪽을 자동 선택
    Auto,
    /// 종목별 기간 조회
    ByInstrument,
    /// 일자별 전종목 조회
    ByDate,
}

impl fmt::Display for BatchGrouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::ByInstrument => write!(f, "by-instrument"),
            Self::ByDate => write!(f, "by-date"),
        }
    }
}

impl FromStr for BatchGrouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "by-instrument" => Ok(Self::ByInstrument),
            "by-date" => Ok(Self::ByDate),
            other => Err(format!(
                "지원하지 않는 배치 방식: {} (auto | by-instrument | by-date)",
                other
            )),
        }
    }
}

/// 배치가 담는 대상 범위
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchScope {
    /// 단일 종목 (기간 조회)
    Instrument(String),
    /// 전체 종목 (일자별 조회)
    AllInstruments,
}

/// API 호출 1회로 수집하는 단위
///
/// `dates`는 비어 있지 않으며 캘린더상 연속이고 오름차순입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 대상 범위
    pub scope: BatchScope,
    /// 담긴 거래일 목록
    pub dates: Vec<NaiveDate>,
}

impl Batch {
    /// 배치의 시작·종료 거래일을 반환합니다.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }
}

/// 종목별 누락 거래일을 배치로 묶습니다.
///
/// 각 종목의 누락 거래일을 캘린더상 연속 구간으로 나눈 뒤 구간을
/// `cap` 이하 조각으로 자릅니다. 최신 우선 순회에서는 구간의 최신
/// 쪽부터 자르므로 나머지 조각이 과거 끝에 생깁니다.
pub fn plan_by_instrument(
    missing: &[(String, Vec<NaiveDate>)],
    calendar: &[NaiveDate],
    cap: usize,
    traversal: Traversal,
) -> Vec<Batch> {
    let index: HashMap<NaiveDate, usize> = calendar
        .iter()
        .enumerate()
        .map(|(i, d)| (*d, i))
        .collect();
    let cap = cap.max(1);

    let mut batches = Vec::new();
    for (ts_code, dates) in missing {
        let mut sorted: Vec<NaiveDate> = dates
            .iter()
            .copied()
            .filter(|d| index.contains_key(d))
            .collect();
        sorted.sort_unstable();
        sorted.dedup();

        for run in contiguous_runs(&sorted, &index) {
            let chunks: Vec<Vec<NaiveDate>> = match traversal {
                Traversal::OldestFirst => run.chunks(cap).map(|c| c.to_vec()).collect(),
                Traversal::NewestFirst => run.rchunks(cap).map(|c| c.to_vec()).collect(),
            };
            for dates in chunks {
                batches.push(Batch {
                    scope: BatchScope::Instrument(ts_code.clone()),
                    dates,
                });
            }
        }
    }

    sort_batches(&mut batches, traversal);
    batches
}

/// 누락 거래일마다 전종목 배치 하나를 만듭니다.
pub fn plan_by_date(dates: &[NaiveDate], traversal: Traversal) -> Vec<Batch> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if traversal == Traversal::NewestFirst {
        sorted.reverse();
    }

    sorted
        .into_iter()
        .map(|d| Batch {
            scope: BatchScope::AllInstruments,
            dates: vec![d],
        })
        .collect()
}

/// 요청한 묶음 방식으로 배치를 계획합니다.
///
/// `Auto`는 양쪽 계획을 세운 뒤 배치 수가 적은 쪽을 택합니다.
/// 실제 택한 방식을 함께 반환합니다.
pub fn plan_batches(
    grouping: BatchGrouping,
    missing: &[(String, Vec<NaiveDate>)],
    calendar: &[NaiveDate],
    cap: usize,
    traversal: Traversal,
) -> (Vec<Batch>, BatchGrouping) {
    match grouping {
        BatchGrouping::ByInstrument => (
            plan_by_instrument(missing, calendar, cap, traversal),
            BatchGrouping::ByInstrument,
        ),
        BatchGrouping::ByDate => (
            plan_by_date(&missing_date_union(missing), traversal),
            BatchGrouping::ByDate,
        ),
        BatchGrouping::Auto => {
            let by_instrument = plan_by_instrument(missing, calendar, cap, traversal);
            let by_date = plan_by_date(&missing_date_union(missing), traversal);
            if by_date.len() < by_instrument.len() {
                (by_date, BatchGrouping::ByDate)
            } else {
                (by_instrument, BatchGrouping::ByInstrument)
            }
        }
    }
}

/// 전 종목에 걸친 누락 거래일의 합집합
fn missing_date_union(missing: &[(String, Vec<NaiveDate>)]) -> Vec<NaiveDate> {
    let union: BTreeSet<NaiveDate> = missing
        .iter()
        .flat_map(|(_, dates)| dates.iter().copied())
        .collect();
    union.into_iter().collect()
}

/// 정렬된 거래일 목록을 캘린더상 연속 구간으로 나눕니다.
fn contiguous_runs(sorted: &[NaiveDate], index: &HashMap<NaiveDate, usize>) -> Vec<Vec<NaiveDate>> {
    let mut runs: Vec<Vec<NaiveDate>> = Vec::new();
    for &date in sorted {
        let adjacent = runs
            .last()
            .and_then(|run| run.last())
            .map(|prev| index[&date] == index[prev] + 1)
            .unwrap_or(false);
        if adjacent {
            if let Some(run) = runs.last_mut() {
                run.push(date);
            }
        } else {
            runs.push(vec![date]);
        }
    }
    runs
}

/// 배치 목록을 순회 방향으로 정렬합니다 (안정 정렬).
fn sort_batches(batches: &mut [Batch], traversal: Traversal) {
    match traversal {
        Traversal::NewestFirst => {
            batches.sort_by_key(|b| std::cmp::Reverse(b.dates.last().copied()))
        }
        Traversal::OldestFirst => batches.sort_by_key(|b| b.dates.first().copied()),
    }
}
