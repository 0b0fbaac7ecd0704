//! Analysed time windows

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed-length look-back periods understood by the scrobble service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "7day")]
    SevenDay,
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "3month")]
    ThreeMonth,
    #[serde(rename = "6month")]
    SixMonth,
    #[serde(rename = "12month")]
    TwelveMonth,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::SevenDay,
        Period::OneMonth,
        Period::ThreeMonth,
        Period::SixMonth,
        Period::TwelveMonth,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Period::SevenDay => "7day",
            Period::OneMonth => "1month",
            Period::ThreeMonth => "3month",
            Period::SixMonth => "6month",
            Period::TwelveMonth => "12month",
        }
    }

    /// Nominal length used as the per-day denominator
    pub fn days(&self) -> i64 {
        match self {
            Period::SevenDay => 7,
            Period::OneMonth => 30,
            Period::ThreeMonth => 90,
            Period::SixMonth => 180,
            Period::TwelveMonth => 365,
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        Period::ALL.into_iter().find(|p| p.token() == token)
    }
}

/// The window a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimeWindow {
    Predefined { period: Period },
    /// Since account registration
    Overall,
    /// Inclusive calendar range
    Custom { start: NaiveDate, end: NaiveDate },
}

impl TimeWindow {
    /// Period token accepted by the ranking endpoints, if any
    pub fn api_period(&self) -> Option<&'static str> {
        match self {
            TimeWindow::Predefined { period } => Some(period.token()),
            TimeWindow::Overall => Some("overall"),
            TimeWindow::Custom { .. } => None,
        }
    }
}
