//! Price and percentage value objects
//!
//! Market APIs hand back amounts as loosely formatted strings (or nothing at
//! all). These types parse them leniently and own the display rules used by
//! every screen: currency strings with thousands grouping and extra precision
//! for sub-unit prices, and signed percentages.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fractional digits for amounts of at least one unit
const STANDARD_PRICE_DP: u32 = 2;

/// Fractional digits for amounts below one unit
const SUB_UNIT_PRICE_DP: u32 = 6;

/// Fractional digits for percentages
const PERCENTAGE_DP: u32 = 2;

/// Fiat currencies prices can be quoted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    #[default]
    USD,
    /// Pound Sterling
    GBP,
    /// Euro
    EUR,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::GBP => "GBP",
            Currency::EUR => "EUR",
        }
    }

    /// Display symbol placed before formatted amounts
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::GBP => "£",
            Currency::EUR => "€",
        }
    }

    /// Coinranking reference currency uuid
    pub fn coinranking_uuid(&self) -> &'static str {
        match self {
            Currency::USD => "yhjMzLPhuIDl",
            Currency::GBP => "Hokyui45Z38f",
            Currency::EUR => "5k-_VTxqtCEI",
        }
    }

    /// CoinGecko `vs_currency` value
    pub fn coingecko_id(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::GBP => "gbp",
            Currency::EUR => "eur",
        }
    }

    /// Get all supported currencies
    pub fn all() -> &'static [Currency] {
        &[Currency::USD, Currency::GBP, Currency::EUR]
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::all()
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported currency: {}", s))
    }
}

/// Parses a wire amount, tolerating missing values and thousands separators.
///
/// Anything unparseable becomes zero.
pub(crate) fn parse_amount(raw: Option<&str>) -> Decimal {
    let Some(raw) = raw else {
        return Decimal::ZERO;
    };

    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .unwrap_or(Decimal::ZERO)
}

fn amount_from_f64(value: Option<f64>) -> Decimal {
    value.and_then(Decimal::from_f64).unwrap_or(Decimal::ZERO)
}

fn round_half_even(amount: Decimal, dp: u32) -> Decimal {
    amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
}

/// Inserts `,` between groups of three integer digits
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// A monetary amount in a fiat currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    amount: Decimal,
    currency: Currency,
}

impl Price {
    /// Create a price from an exact amount
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// A zero amount
    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Parse a price from a wire string, defaulting to zero
    pub fn parse(raw: Option<&str>, currency: Currency) -> Self {
        Self::new(parse_amount(raw), currency)
    }

    /// Build a price from a JSON number, defaulting to zero
    pub fn from_f64(value: Option<f64>, currency: Currency) -> Self {
        Self::new(amount_from_f64(value), currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Format as a currency string, e.g. `$27,000.44` or `$0.012345`
    ///
    /// Precision follows the amount as it would display at 6 dp, so
    /// `0.9999996` renders as `$1.00`.
    pub fn formatted(&self) -> String {
        let dp = if round_half_even(self.amount, SUB_UNIT_PRICE_DP).abs() < Decimal::ONE {
            SUB_UNIT_PRICE_DP
        } else {
            STANDARD_PRICE_DP
        };

        let rounded = round_half_even(self.amount, dp);
        let digits = format!("{:.*}", dp as usize, rounded.abs());
        let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        format!(
            "{}{}{}.{}",
            sign,
            self.currency.symbol(),
            group_thousands(integer),
            fraction
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// Sign of a percentage once rounded for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
    Zero,
}

/// A percentage change such as a 24h price move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Percentage {
    amount: Decimal,
}

impl Percentage {
    /// Create a percentage from an exact amount
    pub fn new(amount: Decimal) -> Self {
        Self { amount }
    }

    /// Parse a percentage from a wire string, defaulting to zero
    pub fn parse(raw: Option<&str>) -> Self {
        Self::new(parse_amount(raw))
    }

    /// Build a percentage from a JSON number, defaulting to zero
    pub fn from_f64(value: Option<f64>) -> Self {
        Self::new(amount_from_f64(value))
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    fn rounded(&self) -> Decimal {
        round_half_even(self.amount, PERCENTAGE_DP)
    }

    /// Classify the displayed value; anything rounding to 0.00 is `Zero`
    pub fn sign(&self) -> Sign {
        let rounded = self.rounded();
        if rounded.is_zero() {
            Sign::Zero
        } else if rounded.is_sign_negative() {
            Sign::Negative
        } else {
            Sign::Positive
        }
    }

    pub fn is_positive(&self) -> bool {
        self.sign() == Sign::Positive
    }

    pub fn is_negative(&self) -> bool {
        self.sign() == Sign::Negative
    }

    pub fn is_zero(&self) -> bool {
        self.sign() == Sign::Zero
    }

    /// Format with an explicit sign, e.g. `+1.23%` or `-25.93%`
    pub fn formatted(&self) -> String {
        let magnitude = self.rounded().abs();
        match self.sign() {
            Sign::Negative => format!("-{:.2}%", magnitude),
            Sign::Positive | Sign::Zero => format!("+{:.2}%", magnitude),
        }
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}
