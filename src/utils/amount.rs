//! 金额换算
//!
//! 用户输入的十进制字符串 <-> 代币最小单位（U256）。
//! 所有比较和费用计算都在最小单位上进行，避免浮点误差。

use std::str::FromStr;

use ethers::types::U256;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount is not a number: {0}")]
    NotANumber(String),
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount has more than {0} decimal places")]
    TooPrecise(u8),
    #[error("amount overflows uint256")]
    Overflow,
}

/// 解析正数金额为最小单位
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let value =
        Decimal::from_str(trimmed).map_err(|_| AmountError::NotANumber(trimmed.to_string()))?;
    if value.is_sign_negative() || value.is_zero() {
        return Err(AmountError::NotPositive);
    }

    let value = value.normalize();
    let scale = value.scale();
    if scale > decimals as u32 {
        return Err(AmountError::TooPrecise(decimals));
    }

    let mantissa = u128::try_from(value.mantissa()).map_err(|_| AmountError::Overflow)?;
    let factor = U256::from(10u8)
        .checked_pow(U256::from(decimals as u32 - scale))
        .ok_or(AmountError::Overflow)?;
    U256::from(mantissa)
        .checked_mul(factor)
        .ok_or(AmountError::Overflow)
}

/// 全精度格式化（"1.5"、"0.000001"）
pub fn format_amount(raw: U256, decimals: u8) -> String {
    let scale = U256::exp10(decimals as usize);
    let integer = raw / scale;
    let fraction = raw % scale;

    if fraction.is_zero() || decimals == 0 {
        return format!("{}.0", integer);
    }

    let digits = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", integer, digits.trim_end_matches('0'))
}

/// 展示用格式化：保留两位小数，四舍五入（half-up）
pub fn format_display(raw: U256, decimals: u8) -> String {
    let scale = U256::exp10(decimals as usize);
    let half = scale / 2;
    let cents = raw
        .checked_mul(U256::from(100u8))
        .and_then(|v| v.checked_add(half))
        .map(|v| v / scale)
        // 溢出时退化为截断
        .unwrap_or_else(|| (raw / scale) * U256::from(100u8));

    let hundred = U256::from(100u8);
    format!("{}.{:02}", cents / hundred, (cents % hundred).as_u32())
}

/// `floor(amount * fee_bps / 10000)`，溢出返回 None
pub fn apply_basis_points(amount: U256, fee_bps: U256) -> Option<U256> {
    amount
        .checked_mul(fee_bps)
        .map(|v| v / U256::from(10_000u32))
}

/// 启发式费用：base_fee + amount * rate，四位小数
pub fn heuristic_fee(amount: &str, base_fee: Decimal, rate: Decimal) -> Option<String> {
    let amount = Decimal::from_str(amount.trim()).ok()?;
    if amount <= Decimal::ZERO {
        return None;
    }
    let fee = base_fee.checked_add(amount.checked_mul(rate)?)?;
    Some(format!("{:.4}", fee.round_dp(4)))
}
