use anyhow::bail;
use serde::{Deserialize, Serialize};

use std::{
    cmp::Ordering,
    fmt::{Debug, Display},
    ops::AddAssign,
    str::FromStr,
};

/// Represents a price, a sale amount, or a quantity.
///
/// Exports write numbers with thousands separators (`1,250.00`), so
/// [`FromStr`] strips every comma before parsing. The [`Display`]
/// implementation always shows two decimal places, right-aligned within any
/// requested width, while JSON carries a plain number. Only finite values
/// are accepted: JSON has no representation for `NaN` or infinity.
#[derive(Clone, Copy, Default, Deserialize, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Amount(f64);

impl Amount {
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Orders amounts with [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Debug for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = f.width().unwrap_or_default();
        write!(f, "{:>width$.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value: f64 = s.replace(',', "").trim().parse()?;
        if !value.is_finite() {
            bail!("{s:?} is not a finite number");
        }
        Ok(Self(value))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}
