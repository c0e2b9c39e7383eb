use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "INR";
pub const DEFAULT_CURRENCY_CODE_LOWER: &str = "inr";

//--------------------------------------       Paise        ---------------------------------------------------------
/// An amount of money in the smallest currency unit (1/100th of a rupee).
///
/// All prices and totals move through the system as integer paise so that order arithmetic is exact. Conversion to
/// the display unit only happens at the formatting boundary.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Paise(i64);

op!(binary Paise, Add, add);
op!(binary Paise, Sub, sub);
op!(inplace Paise, SubAssign, sub_assign);
op!(unary Paise, Neg, neg);

impl Mul<i64> for Paise {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Paise {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paise: {0}")]
pub struct PaiseConversionError(String);

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Paise {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Paise {}

impl TryFrom<u64> for Paise {
    type Error = PaiseConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PaiseConversionError(format!("Value {} is too large to convert to Paise", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rupees = self.0 / 100;
        let paise = (self.0 % 100).abs();
        write!(f, "₹{rupees}.{paise:02}")
    }
}

impl Paise {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The payment gateway's documented contract: amounts are supplied in the major unit and multiplied by 100
    /// before being sent over the wire.
    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
mod test {
    use super::Paise;

    #[test]
    fn arithmetic() {
        let a = Paise::from(250);
        let b = Paise::from(150);
        assert_eq!(a + b, Paise::from(400));
        assert_eq!(a - b, Paise::from(100));
        assert_eq!(a * 3, Paise::from(750));
        assert_eq!(-(a), Paise::from(-250));
    }

    #[test]
    fn summing_line_totals() {
        let lines = [Paise::from(1000) * 2, Paise::from(550) * 3];
        let total: Paise = lines.into_iter().sum();
        assert_eq!(total, Paise::from(3650));
    }

    #[test]
    fn rupee_conversion() {
        assert_eq!(Paise::from_rupees(499), Paise::from(49_900));
    }

    #[test]
    fn display_formatting() {
        assert_eq!(Paise::from(49_950).to_string(), "₹499.50");
        assert_eq!(Paise::from(5).to_string(), "₹0.05");
    }
}
