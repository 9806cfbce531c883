// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::fmt;

pub const GIBIBYTE_SUFFIX: &str = "Gi";

/// A storage size in whole gibibytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gibibytes(u64);

impl Gibibytes {
    pub fn new(value: u64) -> Gibibytes {
        Gibibytes(value)
    }

    /// Parses exactly `^[0-9]+Gi$`. Whitespace, signs, fractions and other
    /// suffixes are rejected.
    pub fn parse_strict(text: &str) -> Option<Gibibytes> {
        let digits = text.strip_suffix(GIBIBYTE_SUFFIX)?;
        parse_digits(digits).map(Gibibytes)
    }

    /// Normalizes a claim quantity to gibibytes. Only binary suffixes that are
    /// whole multiples of a gibibyte are understood.
    pub fn from_quantity(text: &str) -> Option<Gibibytes> {
        const SCALES: [(&str, u64); 3] = [("Gi", 1), ("Ti", 1 << 10), ("Pi", 1 << 20)];
        SCALES.iter().find_map(|(suffix, scale)| {
            let digits = text.strip_suffix(suffix)?;
            parse_digits(digits)?.checked_mul(*scale).map(Gibibytes)
        })
    }

    pub fn to_quantity(self) -> Quantity {
        Quantity(self.to_string())
    }
}

impl fmt::Display for Gibibytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, GIBIBYTE_SUFFIX)
    }
}

fn parse_digits(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
