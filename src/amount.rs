use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal, RoundingStrategy,
};
use serde_with::DeserializeFromStr;
use thiserror::Error;

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

/// Number of decimal places used whenever an [`Amount`] leaves the program,
/// either as text or as JSON.
pub const PRECISION: u32 = 2;

/// Represents a non-negative quantity: hours worked, an hourly rate, or a
/// payout.
///
/// The value is stored internally as an exact [`Decimal`], so sums and
/// products never lose precision. Arithmetic is checked: a result too large
/// for a [`Decimal`] is `None`, never a panic. The [`Display`] implementation
/// rounds to [`PRECISION`] decimal places (half away from zero) and honours
/// width and alignment flags.
///
/// ```
/// # use payroll::Amount;
/// let hours: Amount = "7.5".parse().unwrap();
/// let rate: Amount = "1,200.125".parse().unwrap();
/// let payout = hours.checked_mul(rate).unwrap();
/// assert_eq!(format!("[{:>10}]", payout), "[   9000.94]");
/// ```
#[derive(Clone, Copy, Default, DeserializeFromStr, Eq, PartialEq, Ord, PartialOrd)]
pub struct Amount(Decimal);

/// Reasons an [`Amount`] fails to parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("{0:?} is not a number")]
    Invalid(String),
    #[error("{0:?} is negative")]
    Negative(String),
}

impl Amount {
    /// Returns the exact value.
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Returns the value rounded to [`PRECISION`] decimal places.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(PRECISION, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Adds two amounts, or returns `None` if the sum overflows.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Multiplies two amounts, or returns `None` if the product overflows.
    #[must_use]
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(Self)
    }

    /// Adds up `amounts`, or returns `None` if the total overflows.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::default(), Self::checked_add)
    }
}

impl Debug for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut value = self.rounded().0;
        value.rescale(PRECISION);
        f.pad(&value.to_string())
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses a plain decimal number. Commas are allowed only as thousands
    /// separators, so `1,200.50` is accepted and `1,5` is not.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || AmountError::Invalid(s.to_string());
        let digits = without_separators(s.trim()).ok_or_else(invalid)?;
        let value = Decimal::from_str(&digits).map_err(|_| invalid())?;
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(s.to_string()));
        }
        Ok(Self(value))
    }
}

/// Removes thousands separators from `s`, or returns `None` if a comma
/// appears anywhere other than between groups of three integer digits.
fn without_separators(s: &str) -> Option<String> {
    if !s.contains(',') {
        return Some(s.to_string());
    }
    let unsigned = s.trim_start_matches(['+', '-']);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if fraction.contains(',') {
        return None;
    }
    let mut groups = integer.split(',');
    let lead = groups.next()?;
    let grouped = (1..=3).contains(&lead.len()) && groups.all(|group| group.len() == 3);
    grouped.then(|| s.replace(',', ""))
}

/// Serializes amounts as JSON numbers rounded to [`PRECISION`] places.
///
/// Use with `#[serde(with = "crate::amount::json")]`. Reading a number back
/// yields the same rounded value for amounts of up to 15 significant digits
/// (for example `9999999999999.99`). JSON numbers are read and written as
/// `f64`, so larger amounts come back as the nearest `f64`, rounded.
pub(crate) mod json {
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};

    use super::{Amount, Decimal, FromPrimitive, ToPrimitive};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        let value = amount
            .rounded()
            .0
            .to_f64()
            .ok_or_else(|| S::Error::custom(format!("{amount:?} does not fit in a JSON number")))?;
        serializer.serialize_f64(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        let value = Decimal::from_f64(raw)
            .ok_or_else(|| D::Error::custom(format!("{raw} is not a valid amount")))?;
        if value < Decimal::ZERO {
            return Err(D::Error::custom(format!("{raw} is negative")));
        }
        Ok(Amount(value).rounded())
    }
}
