use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower edge of the neutral band
pub const BAND_LOWER: f64 = -1.0;
/// Upper edge of the neutral band
pub const BAND_UPPER: f64 = 1.0;
/// Level the spread must cross for an open position to revert
pub const EXIT_LEVEL: f64 = 0.0;

/// Which side of the band a spread value sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extreme {
    /// value <= -1
    Low,
    /// value >= 1
    High,
}

impl Extreme {
    /// Classify a spread value; `None` for neutral or NaN values
    pub fn classify(value: f64) -> Option<Self> {
        if value <= BAND_LOWER {
            Some(Extreme::Low)
        } else if value >= BAND_UPPER {
            Some(Extreme::High)
        } else {
            None
        }
    }
}

/// True when the value lies strictly inside `(-1, 1)`
pub fn is_neutral(value: f64) -> bool {
    value > BAND_LOWER && value < BAND_UPPER
}

/// Enum representing the two kinds of band events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    Entry,
    Exit,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Entry => write!(f, "Entry"),
            SignalKind::Exit => write!(f, "Exit"),
        }
    }
}

/// A band crossing observed on the spread
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub value: f64,
    pub kind: SignalKind,
}

impl SignalEvent {
    pub fn entry(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            kind: SignalKind::Entry,
        }
    }

    pub fn exit(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            kind: SignalKind::Exit,
        }
    }

    /// Extreme side for entry events, `None` for exits
    pub fn extreme(&self) -> Option<Extreme> {
        match self.kind {
            SignalKind::Entry => Extreme::classify(self.value),
            SignalKind::Exit => None,
        }
    }
}

impl fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {:.4}", self.date, self.kind, self.value)
    }
}
