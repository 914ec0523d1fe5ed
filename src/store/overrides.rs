//! `key=value` entries supplied on the command line.

use std::fmt;
use std::str::FromStr;

use crate::error::TierError;

/// A single `key=value` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Override {
    pub key: u32,
    pub value: u32,
}

impl Override {
    pub fn new(key: u32, value: u32) -> Self {
        Self { key, value }
    }
}

impl FromStr for Override {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| TierError::Config(format!("expected KEY=VALUE, got '{}'", s)))?;

        let parse = |part: &str, what: &str| {
            part.trim().parse::<u32>().map_err(|e| {
                TierError::Config(format!("invalid {} '{}' in '{}': {}", what, part, s, e))
            })
        };

        Ok(Self {
            key: parse(key, "key")?,
            value: parse(value, "value")?,
        })
    }
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
