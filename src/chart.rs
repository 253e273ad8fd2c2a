//! Statistics derived from a chart's price series

use crate::money::{Currency, Percentage, Price};
use crate::types::{ChartPoint, CoinChart};
use rust_decimal::Decimal;

/// Min, max and start-to-end change of a price series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSummary {
    pub min: Decimal,
    pub max: Decimal,
    pub change_percentage: Decimal,
}

/// Summarizes amounts ordered oldest to newest.
///
/// An empty series, one starting at zero, or a change too large to
/// represent reports a zero change.
pub fn summarize(amounts: &[Decimal]) -> PriceSummary {
    let (Some(first), Some(last)) = (amounts.first(), amounts.last()) else {
        return PriceSummary {
            min: Decimal::ZERO,
            max: Decimal::ZERO,
            change_percentage: Decimal::ZERO,
        };
    };

    let min = amounts.iter().copied().min().unwrap_or(Decimal::ZERO);
    let max = amounts.iter().copied().max().unwrap_or(Decimal::ZERO);

    let change_percentage = last
        .checked_sub(*first)
        .and_then(|delta| delta.checked_div(*first))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO);

    PriceSummary {
        min,
        max,
        change_percentage,
    }
}

impl CoinChart {
    /// Builds a chart from samples ordered oldest to newest
    pub fn from_points(prices: Vec<ChartPoint>, currency: Currency) -> Self {
        let amounts: Vec<Decimal> = prices.iter().map(|p| p.price.amount()).collect();
        let summary = summarize(&amounts);

        Self {
            prices,
            min_price: Price::new(summary.min, currency),
            max_price: Price::new(summary.max, currency),
            period_price_change_percentage: Percentage::new(summary.change_percentage),
        }
    }

    /// Whether the price ended the period at or above where it started
    pub fn is_trending_up(&self) -> bool {
        !self.period_price_change_percentage.is_negative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_summarize_price_series() {
        let amounts = [
            dec("27000.44"),
            dec("25000.89"),
            dec("30000.47"),
            dec("20000.20"),
        ];

        let summary = summarize(&amounts);

        assert_eq!(summary.min, dec("20000.20"));
        assert_eq!(summary.max, dec("30000.47"));
        assert_eq!(summary.change_percentage.round_dp(2), dec("-25.93"));
    }

    #[test]
    fn test_summarize_empty_series() {
        let summary = summarize(&[]);
        assert_eq!(summary.min, Decimal::ZERO);
        assert_eq!(summary.max, Decimal::ZERO);
        assert_eq!(summary.change_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_summarize_zero_start() {
        let summary = summarize(&[Decimal::ZERO, dec("5")]);
        assert_eq!(summary.change_percentage, Decimal::ZERO);
        assert_eq!(summary.max, dec("5"));
    }

    #[test]
    fn test_summarize_overflowing_change() {
        let summary = summarize(&[dec("0.0000000000000000000000000001"), dec("1")]);
        assert_eq!(summary.change_percentage, Decimal::ZERO);
        assert_eq!(summary.min, dec("0.0000000000000000000000000001"));
        assert_eq!(summary.max, dec("1"));
    }

    #[test]
    fn test_chart_from_points() {
        let points = ["27000.44", "25000.89", "30000.47", "20000.20"]
            .iter()
            .enumerate()
            .map(|(i, p)| ChartPoint {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 3600, 0).unwrap(),
                price: Price::parse(Some(*p), Currency::USD),
            })
            .collect();

        let chart = CoinChart::from_points(points, Currency::USD);

        assert_eq!(chart.min_price.formatted(), "$20,000.20");
        assert_eq!(chart.max_price.formatted(), "$30,000.47");
        assert_eq!(chart.period_price_change_percentage.formatted(), "-25.93%");
        assert!(!chart.is_trending_up());
    }

    #[test]
    fn test_empty_chart() {
        let chart = CoinChart::from_points(Vec::new(), Currency::EUR);
        assert_eq!(chart.min_price, Price::zero(Currency::EUR));
        assert_eq!(chart.max_price, Price::zero(Currency::EUR));
        assert_eq!(chart.period_price_change_percentage.formatted(), "+0.00%");
        assert!(chart.is_trending_up());
    }
}
