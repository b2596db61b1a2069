//! Ballot vocabulary
//!
//! The two-bit payload every request carries and the fixed catalogue of
//! vote options that map a human label onto it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A two-character bit string, one of `00`, `01`, `10`, `11`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TwoBits {
    Zero,
    One,
    Two,
    Three,
}

impl TwoBits {
    pub const ALL: [TwoBits; 4] = [TwoBits::Zero, TwoBits::One, TwoBits::Two, TwoBits::Three];

    pub fn as_str(self) -> &'static str {
        match self {
            TwoBits::Zero => "00",
            TwoBits::One => "01",
            TwoBits::Two => "10",
            TwoBits::Three => "11",
        }
    }

    /// Next value in `00 → 01 → 10 → 11 → 00` order
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            TwoBits::Zero => TwoBits::One,
            TwoBits::One => TwoBits::Two,
            TwoBits::Two => TwoBits::Three,
            TwoBits::Three => TwoBits::Zero,
        }
    }

    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            TwoBits::Zero => TwoBits::Three,
            TwoBits::One => TwoBits::Zero,
            TwoBits::Two => TwoBits::One,
            TwoBits::Three => TwoBits::Two,
        }
    }
}

impl fmt::Display for TwoBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid two-bit message {0:?}: use 00, 01, 10, or 11")]
pub struct InvalidBits(pub String);

impl FromStr for TwoBits {
    type Err = InvalidBits;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "00" => Ok(TwoBits::Zero),
            "01" => Ok(TwoBits::One),
            "10" => Ok(TwoBits::Two),
            "11" => Ok(TwoBits::Three),
            other => Err(InvalidBits(other.to_string())),
        }
    }
}

impl TryFrom<String> for TwoBits {
    type Error = InvalidBits;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TwoBits> for String {
    fn from(value: TwoBits) -> Self {
        value.as_str().to_string()
    }
}

/// A fixed ballot choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOption {
    pub id: &'static str,
    pub title: &'static str,
    pub sends: TwoBits,
    pub gate: &'static str,
}

pub const VOTE_OPTIONS: [VoteOption; 4] = [
    VoteOption {
        id: "deny",
        title: "DENY",
        sends: TwoBits::Zero,
        gate: "Z gate - flip the phase",
    },
    VoteOption {
        id: "postpone",
        title: "POSTPONE",
        sends: TwoBits::One,
        gate: "Y gate - flip both bit and phase",
    },
    VoteOption {
        id: "abstain",
        title: "ABSTAIN",
        sends: TwoBits::Two,
        gate: "No operation - maintain original state",
    },
    VoteOption {
        id: "approve",
        title: "APPROVE",
        sends: TwoBits::Three,
        gate: "X gate - flip the bit value",
    },
];

pub fn vote_option(id: &str) -> Option<VoteOption> {
    VOTE_OPTIONS.iter().copied().find(|option| option.id == id)
}

/// The option whose payload is `sends`
pub fn vote_option_for(sends: TwoBits) -> Option<VoteOption> {
    VOTE_OPTIONS.iter().copied().find(|option| option.sends == sends)
}
