//! Money Conversion Module
//!
//! Conversion between the internal `u128` minor-unit representation and
//! operator-facing decimal strings. All conversions go through this
//! module; the allocator and queue builder never see decimal strings.
//!
//! ## Design Principles
//! 1. Explicit Error Handling: no silent truncation on input
//! 2. Integer Only: `u128` covers 18-decimal assets end to end, which is
//!    past what 96-bit decimal types can represent, so scaling is done
//!    with checked integer arithmetic on the digit strings
//!
//! ## Usage
//! ```text
//! // Operator enters "1.5" of an 18-decimal asset
//! let internal = parse_amount("1.5", 18)?;   // 1_500_000_000_000_000_000
//!
//! // Display back
//! let display = format_amount(internal, 18, 4);  // "1.5000"
//! ```

use thiserror::Error;

use crate::core_types::AmountMinor;

/// Money conversion errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// Parse: Operator → Internal (String → u128)
// ============================================================================

/// Convert an operator-entered amount string to minor units.
///
/// # Errors
/// * `PrecisionOverflow` - more decimal places than the asset allows
/// * `InvalidAmount` - zero, or an explicit sign
/// * `Overflow` - result would not fit in `u128`
/// * `InvalidFormat` - anything else (empty, `.5`, `5.`, `1.2.3`, ...)
pub fn parse_amount(amount_str: &str, decimals: u32) -> Result<AmountMinor, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    if amount_str.starts_with('-') || amount_str.starts_with('+') {
        return Err(MoneyError::InvalidAmount);
    }

    let parts: Vec<&str> = amount_str.split('.').collect();
    let (whole, frac) = match parts.len() {
        1 => (parts[0], ""),
        2 => {
            // Strict: both sides of the dot must be non-empty, which
            // rejects ambiguous forms like ".5" and "5."
            if parts[0].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing leading zero (e.g., use 0.5 instead of .5)".into(),
                ));
            }
            if parts[1].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
                ));
            }
            if decimals == 0 {
                return Err(MoneyError::InvalidFormat(
                    "decimals is 0, but dot provided".into(),
                ));
            }
            (parts[0], parts[1])
        }
        _ => return Err(MoneyError::InvalidFormat("multiple decimal points".into())),
    };

    // Reject excess precision outright - no silent truncation
    if frac.len() > decimals as usize {
        return Err(MoneyError::PrecisionOverflow {
            provided: frac.len() as u32,
            max: decimals,
        });
    }

    let whole_num: AmountMinor = whole.parse().map_err(|e: std::num::ParseIntError| {
        let err_str = e.to_string();
        if err_str.contains("too large") || err_str.contains("overflow") {
            MoneyError::Overflow
        } else {
            MoneyError::InvalidFormat(format!("invalid character in whole part: {}", whole))
        }
    })?;

    let frac_num: AmountMinor = if frac.is_empty() {
        0
    } else {
        let frac_padded = format!("{:0<width$}", frac, width = decimals as usize);
        frac_padded
            .parse()
            .map_err(|_| MoneyError::InvalidFormat("invalid fractional part".into()))?
    };

    let multiplier = 10u128.checked_pow(decimals).ok_or(MoneyError::Overflow)?;
    let amount = whole_num
        .checked_mul(multiplier)
        .and_then(|v| v.checked_add(frac_num))
        .ok_or(MoneyError::Overflow)?;

    if amount == 0 {
        return Err(MoneyError::InvalidAmount);
    }

    Ok(amount)
}

// ============================================================================
// Format: Internal → Operator (u128 → String)
// ============================================================================

/// Convert minor units to a display string, truncated (never rounded) to
/// `display_decimals` places.
pub fn format_amount(value: AmountMinor, decimals: u32, display_decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = value / scale;
    if display_decimals == 0 {
        return whole.to_string();
    }

    let frac_digits = format!("{:0>width$}", value % scale, width = decimals as usize);
    let shown = if (display_decimals as usize) <= frac_digits.len() {
        frac_digits[..display_decimals as usize].to_string()
    } else {
        format!("{:0<width$}", frac_digits, width = display_decimals as usize)
    };
    format!("{}.{}", whole, shown)
}

/// Full-precision form, for logs and data exchange.
pub fn format_amount_full(value: AmountMinor, decimals: u32) -> String {
    format_amount(value, decimals, decimals)
}

// ============================================================================
// Unit Tests
// ============================================================================
