//! Type-safe price representation using decimal arithmetic.
//!
//! Shopify sends money amounts as decimal strings (`"29.99"`) next to an
//! ISO 4217 code. Amounts are parsed into [`Decimal`] so that discounts and
//! display rounding never go through floating point.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Parse a Shopify money pair. Returns `None` for a non-numeric amount
    /// or a currency this crate cannot format.
    #[must_use]
    pub fn parse(amount: &str, currency_code: &str) -> Option<Self> {
        let amount = parse_amount(amount)?;
        let currency_code = currency_code.parse().ok()?;
        Some(Self::new(amount, currency_code))
    }

    /// Format for display in the en-US locale (e.g., `$1,234.50`).
    #[must_use]
    pub fn display(&self) -> String {
        let sign = if self.amount.is_sign_negative() && !self.amount.is_zero() {
            "-"
        } else {
            ""
        };
        format!(
            "{sign}{}{}",
            self.currency_code.symbol(),
            group_thousands(self.amount.abs())
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Symbol used by en-US currency formatting.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::CAD => "CA$",
            Self::AUD => "A$",
        }
    }

    /// The three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unsupported currency code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

/// Format a Shopify money pair for display.
///
/// Known currencies use their en-US symbol. Unknown codes are written as a
/// prefix (`XYZ 5.00`). An amount that is not a number is echoed as-is
/// after the symbol so the page still shows what the backend sent.
#[must_use]
pub fn format_price(amount: &str, currency_code: &str) -> String {
    let prefix = currency_code.parse::<CurrencyCode>().map_or_else(
        |_| format!("{} ", currency_code.trim().to_ascii_uppercase()),
        |code| code.symbol().to_string(),
    );

    match parse_amount(amount) {
        Some(value) => {
            let sign = if value.is_sign_negative() && !value.is_zero() {
                "-"
            } else {
                ""
            };
            format!("{sign}{prefix}{}", group_thousands(value.abs()))
        }
        None => format!("{prefix}{}", amount.trim()),
    }
}

/// Percentage saved relative to the compare-at price, rounded to the
/// nearest whole percent.
///
/// Zero when there is no compare-at price, either amount is not a number,
/// the compare-at is not positive, or it is not strictly above the price.
#[must_use]
pub fn discount_percent(price: &str, compare_at: Option<&str>) -> u32 {
    let Some(compare_at) = compare_at.and_then(parse_amount) else {
        return 0;
    };
    let Some(price) = parse_amount(price) else {
        return 0;
    };
    if compare_at <= Decimal::ZERO || compare_at <= price {
        return 0;
    }

    let percent = ((compare_at - price) / compare_at * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    percent.to_u32().unwrap_or(0)
}

/// Parse a decimal amount string, tolerating surrounding whitespace.
#[must_use]
pub fn parse_amount(amount: &str) -> Option<Decimal> {
    Decimal::from_str(amount.trim()).ok()
}

/// Two decimal places with `,` thousands separators.
fn group_thousands(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{rounded:.2}");
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped}.{fraction}")
}
