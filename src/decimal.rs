use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// decimal places used for currency amounts
pub const CURRENCY_SCALE: u32 = 2;

/// internal working precision
const WORKING_SCALE: u32 = 8;

/// Money type backed by a decimal, kept at 8 places internally and rounded to
/// cents wherever an amount becomes part of a schedule or ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(WORKING_SCALE))
    }

    /// create from decimal, rounded straight to cents
    pub fn from_decimal_currency(d: Decimal) -> Self {
        Money(d.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    /// parse a currency amount; sub-cent digits are rejected, not rounded
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        let parsed = Decimal::from_str(s)?;
        if parsed.normalize().scale() > CURRENCY_SCALE {
            return Err(rust_decimal::Error::ErrorString(format!(
                "{s} has more than {CURRENCY_SCALE} decimal places"
            )));
        }
        Ok(Money(parsed))
    }

    /// create from integer amount (dollars, euros, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (cents)
    pub fn from_minor(amount: i64) -> Self {
        Money(Decimal::new(amount, CURRENCY_SCALE))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// conventional currency rounding: two places, halves away from zero
    pub fn round_currency(&self) -> Self {
        Money::from_decimal_currency(self.0)
    }

    /// true when the amount carries no sub-cent digits
    pub fn is_currency_rounded(&self) -> bool {
        self.round_currency() == *self
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// check if strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// check if strictly negative
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(WORKING_SCALE))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(WORKING_SCALE);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(WORKING_SCALE))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = (self.0 - other.0).round_dp(WORKING_SCALE);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + *x)
    }
}

/// rate type for interest rates, stored as a fraction (0.05 for 5%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal fraction (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from whole percentage (e.g., 5 for 5%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::from(100))
    }

    /// create from a percentage quote such as 5.00 or 12.5
    pub fn from_percent(p: Decimal) -> Self {
        Rate(p / Decimal::from(100))
    }

    /// create from basis points (e.g., 500 for 5%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::from(bps) / Decimal::from(10000))
    }

    /// get as decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// get as percentage
    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::from(100)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// per-week rate from an annual rate, linear (no compounding)
    pub fn weekly_rate(&self, weeks_per_year: u32) -> Rate {
        Rate(self.0 / Decimal::from(weeks_per_year))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_rounding_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec!(500.965)).round_currency(), Money::from_minor(50097));
        assert_eq!(Money::from_decimal(dec!(500.975)).round_currency(), Money::from_minor(50098));
        assert_eq!(Money::from_decimal(dec!(500.9649)).round_currency(), Money::from_minor(50096));
        assert_eq!(Money::from_decimal(dec!(-0.005)).round_currency(), Money::from_decimal(dec!(-0.01)));
    }

    #[test]
    fn test_equality_ignores_trailing_zeros() {
        let a = Money::from_str_exact("1001.92").unwrap();
        let b = Money::from_str_exact("1001.920").unwrap();
        assert_eq!(a, b);
        assert!(a.is_currency_rounded());
        assert!(!Money::from_decimal(dec!(10.001)).is_currency_rounded());
    }

    #[test]
    fn test_parse_rejects_sub_cent_digits() {
        assert!(Money::from_str_exact("500.960000001").is_err());
        assert!(Money::from_str_exact("10.001").is_err());
        assert!("abc".parse::<Money>().is_err());
        assert_eq!("500.96".parse::<Money>().unwrap(), Money::from_minor(50096));
        assert_eq!(Money::from_str_exact("-0.50").unwrap(), Money::from_decimal(dec!(-0.5)));
    }

    #[test]
    fn test_sum() {
        let parts = vec![Money::from_minor(50096), Money::from_minor(50096)];
        let total: Money = parts.iter().sum();
        assert_eq!(total, Money::from_minor(100192));
    }

    #[test]
    fn test_weekly_rate() {
        let annual = Rate::from_percent(dec!(5.00));
        assert_eq!(annual.as_decimal(), dec!(0.05));

        let weekly = annual.weekly_rate(52);
        assert_eq!((weekly.as_decimal() * dec!(52)).round_dp(12), dec!(0.05));
        assert_eq!(annual.to_string(), "5%");
    }
}
