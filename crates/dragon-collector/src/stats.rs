//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 작업 통계
///
/// 배치 단위 카운터(total/success/errors/empty)와 대상 단위
/// 카운터(skipped)를 함께 집계합니다. 한 배치가 실패해도 나머지
/// 배치는 계속 진행되므로 errors는 실행 중단을 의미하지 않습니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 시도한 배치 수
    pub total: usize,
    /// 성공한 배치 수
    pub success: usize,
    /// 실패한 배치 수
    pub errors: usize,
    /// 건너뛴 대상 수 (이미 저장된 종목·거래일 쌍)
    pub skipped: usize,
    /// 빈 배치 수 (조회 성공, 데이터 없음)
    pub empty: usize,
    /// 저장된 총 레코드 수
    pub records: usize,
    /// 소모한 API 호출 수 (재시도 포함)
    pub api_calls: usize,
    /// 중단 신호로 조기 종료 여부
    pub interrupted: bool,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            empty = self.empty,
            records = self.records,
            api_calls = self.api_calls,
            interrupted = self.interrupted,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
