use anyhow::{anyhow, Result};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thousands::Separable;

/// An amount of money in cents
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd)]
pub struct Money(i64);

impl Money {
    pub fn zero() -> Self {
        Self(0)
    }

    pub fn from_major(amount: i64) -> Self {
        Self(amount * 100)
    }

    pub fn from_cents(amount: i64) -> Self {
        Self(amount)
    }

    pub fn as_major(self) -> i64 {
        self.0 / 100
    }

    pub fn as_cents(self) -> i64 {
        self.0
    }

    /// Bridge into f64 for the closed-form formulas (annuity, compounding,
    /// discounting). The float carries whole currency units, not cents.
    pub fn to_float(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Round a whole-unit float back to cents.
    pub fn from_float(amount: f64) -> Self {
        Self((amount * 100.0).round() as i64)
    }

    pub fn at_rate(&self, rate: Rate) -> Money {
        rate.at_rate(*self)
    }

    pub fn negate(&self) -> Self {
        Money(self.0 * -1)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let cents = self.as_cents();
        let remainder = (cents % 100).abs();
        // Truncating to major units loses the sign of amounts between -1
        // and 0, so restore it by hand.
        let sign = if cents < 0 && self.as_major() == 0 {
            "-"
        } else {
            ""
        };
        write!(
            f,
            "{}{}{}",
            sign,
            self.as_major().separate_with_commas(),
            if remainder != 0 {
                format!(".{:02}", remainder)
            } else {
                "".to_string()
            }
        )
    }
}

impl core::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl core::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl core::ops::Div for Money {
    type Output = Rate;

    fn div(self, rhs: Self) -> Self::Output {
        // Construct the Rate from the LHS first so it is stored at the
        // maximum precision we support before dividing by the RHS. Dividing
        // the cents first would round away most of the precision.
        Rate::from_percent(self.0 * 100) / rhs.0
    }
}

impl core::iter::Sum<Money> for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.map(|m| m.0).sum())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_float())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Money::from_float(f64::deserialize(deserializer)?))
    }
}

// The internal conversion ratio of rate. Used to scale the number of decimal
// places supported. More precision trades off against more overflows when
// performing rate calculations.
const RATE_PRECISION: u32 = 6;
const RATE_SCALE: i64 = (10 as i64).pow(RATE_PRECISION);

/// A percentage with a fixed amount of decimal places
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd)]
pub struct Rate(i64);

impl Rate {
    pub fn from_percent(pct: i64) -> Self {
        Self(pct * RATE_SCALE)
    }

    pub fn as_percent(&self) -> i64 {
        self.0 / RATE_SCALE
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn at_rate(&self, money: Money) -> Money {
        let tmp = (money.0 as i128) * (self.0 as i128);
        Money((tmp / RATE_SCALE as i128 / 100) as i64)
    }

    /// The rate as a fraction (10% => 0.1).
    pub fn to_float(&self) -> f64 {
        self.0 as f64 / RATE_SCALE as f64 / 100.0
    }

    /// The rate as a percentage float (10% => 10.0).
    pub fn as_percent_float(&self) -> f64 {
        self.0 as f64 / RATE_SCALE as f64
    }

    /// Build a rate from a percentage float (10.0 => 10%).
    pub fn from_float(pct: f64) -> Self {
        Rate((pct * RATE_SCALE as f64).round() as i64)
    }

    /// The monthly fraction of an annual percentage rate (12% => 0.01).
    pub fn monthly_fraction(&self) -> f64 {
        self.to_float() / 12.0
    }
}

impl core::ops::Add<Rate> for Rate {
    type Output = Rate;
    fn add(self, rhs: Self) -> Self::Output {
        Rate(self.0 + rhs.0)
    }
}

impl core::ops::Sub<Rate> for Rate {
    type Output = Rate;
    fn sub(self, rhs: Self) -> Self::Output {
        Rate(self.0 - rhs.0)
    }
}

impl core::ops::Div<i64> for Rate {
    type Output = Rate;
    fn div(self, rhs: i64) -> Self::Output {
        Rate(self.0 / rhs)
    }
}

impl std::str::FromStr for Rate {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clean = s.trim().trim_end_matches('%').trim();

        Ok(match clean.split_once('.') {
            Some((whole_str, points_str)) => {
                let _: f64 = clean.parse()?;
                let points: i64 = points_str.parse()?;
                if points >= RATE_SCALE {
                    return Err(anyhow!(
                        "Found more than {} decimal places for {} which isn't allowed",
                        RATE_PRECISION,
                        s
                    ));
                }
                if points < 0 {
                    return Err(anyhow!(
                        "Found negative number on right side of . somehow for {}",
                        s
                    ));
                }

                let digits = points_str.len() as u32;
                let whole: i64 = whole_str.parse()?;
                Rate(whole * RATE_SCALE + points * (10 as i64).pow(RATE_PRECISION - digits))
            }
            None => Rate::from_percent(clean.parse()?),
        })
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let remainder = self.0 % RATE_SCALE;
        write!(
            f,
            "{}{}%",
            self.0 / RATE_SCALE,
            if remainder != 0 {
                format!(".{:02}", remainder)
            } else {
                "".to_string()
            }
        )
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_percent_float())
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Rate::from_float(f64::deserialize(deserializer)?))
    }
}
