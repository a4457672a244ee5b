//! A주 시장 분류 및 등락폭 제한 규칙.
//!
//! 이 모듈은 종목 코드 기반의 공통 판단 로직을 정의합니다:
//! - `Exchange` - 소속 거래소 (상하이/선전/베이징)
//! - `Board` - 보드 구분 (메인보드/촹예반/커촹반/북증)
//! - 등락폭 제한 비율과 상한가/하한가 판정
//!
//! 모든 스크립트가 동일한 판단을 내리도록 규칙을 한곳에 모았습니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 상한가/하한가 판정에 허용하는 가격 오차 (元).
pub const LIMIT_TOLERANCE: Decimal = dec!(0.01);

/// 소속 거래소.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exchange {
    /// 상하이 증권거래소
    Shanghai,
    /// 선전 증권거래소
    Shenzhen,
    /// 베이징 증권거래소
    Beijing,
}

impl Exchange {
    /// 종목 코드(순수 6자리 또는 접미사 포함)에서 거래소를 판별합니다.
    pub fn of(code: &str) -> Self {
        let bare = bare_code(code);
        if bare.starts_with('6') || bare.starts_with('5') {
            Exchange::Shanghai
        } else if bare.starts_with('8') || bare.starts_with('4') {
            Exchange::Beijing
        } else {
            Exchange::Shenzhen
        }
    }

    /// Tushare 종목 코드 접미사를 반환합니다.
    pub fn suffix(&self) -> &'static str {
        match self {
            Exchange::Shanghai => "SH",
            Exchange::Shenzhen => "SZ",
            Exchange::Beijing => "BJ",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// 보드(시장 구분).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Board {
    /// 메인보드
    Main,
    /// 촹예반 (창업판, 300/301)
    ChiNext,
    /// 커촹반 (과창판, 688)
    Star,
    /// 베이징 증권거래소 (8/4)
    Bse,
}

impl Board {
    /// 종목 코드에서 보드를 판별합니다.
    pub fn of(code: &str) -> Self {
        let bare = bare_code(code);
        if bare.starts_with("688") {
            Board::Star
        } else if bare.starts_with("300") || bare.starts_with("301") {
            Board::ChiNext
        } else if bare.starts_with('8') || bare.starts_with('4') {
            Board::Bse
        } else {
            Board::Main
        }
    }
}

/// 접미사가 있으면 제거한 순수 종목 코드를 반환합니다.
pub fn bare_code(code: &str) -> &str {
    match code.split_once('.') {
        Some((bare, _)) => bare,
        None => code,
    }
}

/// 순수 종목 코드를 Tushare 형식(코드.거래소)으로 변환합니다.
/// 이미 접미사가 있으면 대문자로 정규화해 그대로 반환합니다.
pub fn normalize_ts_code(code: &str) -> String {
    if code.contains('.') {
        return code.to_uppercase();
    }
    format!("{}.{}", code, Exchange::of(code).suffix())
}

/// 종목명에서 ST(관리종목) 여부를 판별합니다.
pub fn is_st_name(name: &str) -> bool {
    name.to_uppercase().contains("ST")
}

/// 보드와 ST 여부에 따른 일중 등락폭 제한 비율을 반환합니다.
///
/// ST 종목은 보드와 무관하게 5%를 우선 적용하고, 이후 커촹반/촹예반 20%,
/// 북증 30%, 메인보드 10% 순서로 적용합니다.
pub fn limit_rate(board: Board, is_st: bool) -> Decimal {
    if is_st {
        return dec!(0.05);
    }
    match board {
        Board::Star | Board::ChiNext => dec!(0.20),
        Board::Bse => dec!(0.30),
        Board::Main => dec!(0.10),
    }
}

/// 전일 종가 기준 상한가를 계산합니다. 거래소 규칙대로 소수 둘째 자리에서
/// 반올림합니다.
pub fn limit_up_price(pre_close: Decimal, rate: Decimal) -> Decimal {
    (pre_close * (Decimal::ONE + rate)).round_dp(2)
}

/// 전일 종가 기준 하한가를 계산합니다.
pub fn limit_down_price(pre_close: Decimal, rate: Decimal) -> Decimal {
    (pre_close * (Decimal::ONE - rate)).round_dp(2)
}

/// 상한가 마감 여부를 판정합니다. 호가 단위 오차를 흡수하기 위해
/// 상한가보다 1分 낮은 가격까지 상한가로 간주합니다.
pub fn is_limit_up(close: Decimal, pre_close: Decimal, board: Board, is_st: bool) -> bool {
    if pre_close <= Decimal::ZERO {
        return false;
    }
    let limit = limit_up_price(pre_close, limit_rate(board, is_st));
    close >= limit - LIMIT_TOLERANCE
}

/// 하한가 마감 여부를 판정합니다.
pub fn is_limit_down(close: Decimal, pre_close: Decimal, board: Board, is_st: bool) -> bool {
    if pre_close <= Decimal::ZERO {
        return false;
    }
    let limit = limit_down_price(pre_close, limit_rate(board, is_st));
    close <= limit + LIMIT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_of() {
        assert_eq!(Exchange::of("600000"), Exchange::Shanghai);
        assert_eq!(Exchange::of("510300"), Exchange::Shanghai);
        assert_eq!(Exchange::of("000001"), Exchange::Shenzhen);
        assert_eq!(Exchange::of("300750"), Exchange::Shenzhen);
        assert_eq!(Exchange::of("830799"), Exchange::Beijing);
        assert_eq!(Exchange::of("430047"), Exchange::Beijing);
        assert_eq!(Exchange::of("600000.SH"), Exchange::Shanghai);
    }

    #[test]
    fn test_board_of() {
        assert_eq!(Board::of("600000"), Board::Main);
        assert_eq!(Board::of("000001"), Board::Main);
        assert_eq!(Board::of("300750"), Board::ChiNext);
        assert_eq!(Board::of("301236"), Board::ChiNext);
        assert_eq!(Board::of("688981"), Board::Star);
        assert_eq!(Board::of("830799"), Board::Bse);
        assert_eq!(Board::of("688981.SH"), Board::Star);
    }

    #[test]
    fn test_normalize_ts_code() {
        assert_eq!(normalize_ts_code("600000"), "600000.SH");
        assert_eq!(normalize_ts_code("000001"), "000001.SZ");
        assert_eq!(normalize_ts_code("830799"), "830799.BJ");
        assert_eq!(normalize_ts_code("600000.sh"), "600000.SH");
        assert_eq!(normalize_ts_code("000001.SZ"), "000001.SZ");
    }

    #[test]
    fn test_limit_rate() {
        assert_eq!(limit_rate(Board::Main, false), dec!(0.10));
        assert_eq!(limit_rate(Board::ChiNext, false), dec!(0.20));
        assert_eq!(limit_rate(Board::Star, false), dec!(0.20));
        assert_eq!(limit_rate(Board::Bse, false), dec!(0.30));
        // ST는 보드보다 우선한다
        assert_eq!(limit_rate(Board::Main, true), dec!(0.05));
        assert_eq!(limit_rate(Board::ChiNext, true), dec!(0.05));
    }

    #[test]
    fn test_limit_prices_rounding() {
        assert_eq!(limit_up_price(dec!(10.00), dec!(0.10)), dec!(11.00));
        assert_eq!(limit_down_price(dec!(10.00), dec!(0.10)), dec!(9.00));
        // 12.34 * 1.2 = 14.808 -> 14.81
        assert_eq!(limit_up_price(dec!(12.34), dec!(0.20)), dec!(14.81));
        // 9.87 * 0.9 = 8.883 -> 8.88
        assert_eq!(limit_down_price(dec!(9.87), dec!(0.10)), dec!(8.88));
    }

    #[test]
    fn test_is_limit_up() {
        // 메인보드: 상한가 11.00, 10.99까지 허용
        assert!(is_limit_up(dec!(11.00), dec!(10.00), Board::Main, false));
        assert!(is_limit_up(dec!(10.99), dec!(10.00), Board::Main, false));
        assert!(!is_limit_up(dec!(10.98), dec!(10.00), Board::Main, false));
        // 촹예반 20%
        assert!(is_limit_up(dec!(12.00), dec!(10.00), Board::ChiNext, false));
        assert!(!is_limit_up(dec!(11.00), dec!(10.00), Board::ChiNext, false));
        // 전일 종가가 0 이하이면 판정하지 않는다
        assert!(!is_limit_up(dec!(11.00), Decimal::ZERO, Board::Main, false));
    }

    #[test]
    fn test_is_limit_down() {
        assert!(is_limit_down(dec!(9.00), dec!(10.00), Board::Main, false));
        assert!(is_limit_down(dec!(9.01), dec!(10.00), Board::Main, false));
        assert!(!is_limit_down(dec!(9.02), dec!(10.00), Board::Main, false));
        // ST 5%: 10.00 -> 하한가 9.50
        assert!(is_limit_down(dec!(9.50), dec!(10.00), Board::Main, true));
        assert!(!is_limit_down(dec!(9.52), dec!(10.00), Board::Main, true));
    }
}
