//! Resource quantity arithmetic
//!
//! Enough of the Kubernetes quantity grammar to sum container requests,
//! compare them and express totals in the fixed units used by node and
//! tenant summaries (CPU cores, memory Mi, storage Gi).

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MEMORY_SCALE: i128 = 1024 * 1024;
pub const STORAGE_SCALE: i128 = 1024 * 1024 * 1024;

const BINARY_SUFFIXES: [(&str, u32); 6] = [
    ("Ei", 60),
    ("Pi", 50),
    ("Ti", 40),
    ("Gi", 30),
    ("Mi", 20),
    ("Ki", 10),
];

const DECIMAL_SUFFIXES: [(&str, i32); 9] = [
    ("E", 18),
    ("P", 15),
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
    ("m", -3),
    ("u", -6),
    ("n", -9),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quantity '{0}'")]
pub struct QuantityError(pub String);

/// A quantity held in thousandths of its base unit
#[derive(Debug, Clone, Copy)]
pub struct Quantity {
    millis: i128,
    binary: bool,
}

impl Quantity {
    pub fn zero() -> Self {
        Self {
            millis: 0,
            binary: false,
        }
    }

    pub fn millis(&self) -> i128 {
        self.millis
    }

    /// Whole base units, rounded up
    pub fn value(&self) -> i128 {
        self.millis.div_euclid(1000) + i128::from(self.millis.rem_euclid(1000) != 0)
    }

    pub fn cores(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    /// Whole multiples of `scale`, truncated
    pub fn scaled(&self, scale: i128) -> i64 {
        i64::try_from(self.value() / scale).unwrap_or(i64::MAX)
    }

    pub fn add(&mut self, other: &Quantity) {
        if self.millis == 0 {
            self.binary = other.binary;
        }
        self.millis = self.millis.saturating_add(other.millis);
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.millis == other.millis
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.millis.cmp(&other.millis)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || QuantityError(s.to_string());
        let s = s.trim();
        if s.is_empty() {
            return Err(err());
        }

        let number_end = s
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-')))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(number_end);

        let (negative, digits) = match number.as_bytes().first() {
            Some(b'-') => (true, &number[1..]),
            Some(b'+') => (false, &number[1..]),
            _ => (false, number),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(err());
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        // mantissa * 10^exp10 * 2^exp2
        let mantissa: i128 = format!("{}{}", whole, fraction)
            .parse::<i128>()
            .map_err(|_| err())?;
        let mut exp10 = -i32::try_from(fraction.len()).map_err(|_| err())?;
        let mut exp2 = 0u32;
        let mut binary = false;

        if let Some((_, shift)) = BINARY_SUFFIXES.iter().find(|(sfx, _)| *sfx == suffix) {
            exp2 = *shift;
            binary = true;
        } else if let Some((_, power)) = DECIMAL_SUFFIXES.iter().find(|(sfx, _)| *sfx == suffix) {
            exp10 = exp10.checked_add(*power).ok_or_else(err)?;
        } else if let Some(exponent) = suffix.strip_prefix(['e', 'E']) {
            let exponent = exponent.parse::<i32>().map_err(|_| err())?;
            exp10 = exp10.checked_add(exponent).ok_or_else(err)?;
        } else if !suffix.is_empty() {
            return Err(err());
        }

        // to millis
        exp10 = exp10.checked_add(3).ok_or_else(err)?;
        let mut scaled = mantissa.checked_mul(1i128 << exp2).ok_or_else(err)?;
        if exp10 >= 0 {
            scaled = scaled
                .checked_mul(10i128.checked_pow(exp10 as u32).ok_or_else(err)?)
                .ok_or_else(err)?;
        } else {
            let divisor = 10i128.checked_pow(exp10.unsigned_abs()).ok_or_else(err)?;
            // round up like the API server does for sub-milli precision
            scaled = scaled.div_euclid(divisor) + i128::from(scaled.rem_euclid(divisor) != 0);
        }

        Ok(Self {
            millis: if negative { -scaled } else { scaled },
            binary,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis % 1000 != 0 {
            return write!(f, "{}m", self.millis);
        }
        let value = self.millis / 1000;
        if value == 0 {
            return write!(f, "0");
        }
        if self.binary {
            for (suffix, shift) in BINARY_SUFFIXES {
                let unit = 1i128 << shift;
                if value % unit == 0 {
                    return write!(f, "{}{}", value / unit, suffix);
                }
            }
        } else {
            for (suffix, power) in DECIMAL_SUFFIXES.iter().filter(|(_, p)| *p > 0) {
                let unit = 10i128.pow(*power as u32);
                if value % unit == 0 {
                    return write!(f, "{}{}", value / unit, suffix);
                }
            }
        }
        write!(f, "{}", value)
    }
}

/// Parse a quantity string, treating empty or invalid input as zero
pub fn parse_or_zero(value: &str) -> Quantity {
    if value.is_empty() {
        return Quantity::zero();
    }
    value.parse().unwrap_or_else(|e: QuantityError| {
        tracing::warn!("{}, counting it as zero", e);
        Quantity::zero()
    })
}

pub fn cpu_cores(value: &str) -> f64 {
    parse_or_zero(value).cores()
}

pub fn memory_mi(value: &str) -> i64 {
    parse_or_zero(value).scaled(MEMORY_SCALE)
}

pub fn storage_gi(value: &str) -> i64 {
    parse_or_zero(value).scaled(STORAGE_SCALE)
}

pub fn count(value: &str) -> i64 {
    parse_or_zero(value).scaled(1)
}

/// Quantities keyed by resource name
pub type ResourceList = BTreeMap<String, Quantity>;

/// Add every entry of `other` into `total`
pub fn add_into(total: &mut ResourceList, other: &ResourceList) {
    for (name, quantity) in other {
        total.entry(name.clone()).or_insert_with(Quantity::zero).add(quantity);
    }
}

/// Raise every entry of `total` to at least the matching entry of `floor`
pub fn max_into(total: &mut ResourceList, floor: &ResourceList) {
    for (name, quantity) in floor {
        let entry = total.entry(name.clone()).or_insert(*quantity);
        if *quantity > *entry {
            *entry = *quantity;
        }
    }
}

pub fn to_string_map(list: &ResourceList) -> BTreeMap<String, String> {
    list.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
}
