//! Coded dimension normalization
//!
//! The card dataset encodes weekday, hour bucket and age bracket as small
//! integer codes. Depending on the pipeline that produced a file the same
//! code can arrive as `1`, `"1"`, `"01"` or `"1.0"`. Every representation is
//! parsed into one canonical integer first and only then mapped to a label,
//! so there is exactly one table per dimension.
//!
//! Labels and codes live in disjoint value spaces (no label parses as a
//! number), which makes [`Dimension::normalize`] idempotent: feeding it a
//! label returns that same label.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};

/// Label used for any code that has no mapping
pub const UNKNOWN_LABEL: &str = "알 수 없음";

const WEEKDAY_LABELS: [&str; 7] = [
    "월요일", "화요일", "수요일", "목요일", "금요일", "토요일", "일요일",
];

const HOUR_BUCKET_LABELS: [&str; 10] = [
    "00:00 ~ 06:59",
    "07:00 ~ 08:59",
    "09:00 ~ 10:59",
    "11:00 ~ 12:59",
    "13:00 ~ 14:59",
    "15:00 ~ 16:59",
    "17:00 ~ 18:59",
    "19:00 ~ 20:59",
    "21:00 ~ 22:59",
    "23:00 ~ 23:59",
];

const AGE_BRACKET_LABELS: [&str; 7] = [
    "10대 이하", "10대", "20대", "30대", "40대", "50대", "60대 이상",
];

/// A coded column of the card dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Weekday,
    HourBucket,
    AgeBracket,
}

impl Dimension {
    /// Codes start at 1 for every dimension
    fn table(&self) -> &'static [&'static str] {
        match self {
            Dimension::Weekday => &WEEKDAY_LABELS,
            Dimension::HourBucket => &HOUR_BUCKET_LABELS,
            Dimension::AgeBracket => &AGE_BRACKET_LABELS,
        }
    }

    /// Map an already-parsed integer code
    pub fn from_code(&self, code: i64) -> DimensionLabel {
        let table = self.table();
        match usize::try_from(code) {
            Ok(c) if (1..=table.len()).contains(&c) => DimensionLabel::Known {
                code: c as u8,
                label: table[c - 1],
            },
            _ => DimensionLabel::Unknown,
        }
    }

    /// Map a raw cell value (integer text, zero-padded text, float text or
    /// an existing label) to its canonical label
    pub fn normalize(&self, raw: &str) -> DimensionLabel {
        let raw = raw.trim();
        if let Some(code) = parse_code(raw) {
            return self.from_code(code);
        }
        // Already labeled input
        match self.table().iter().position(|l| *l == raw) {
            Some(idx) => DimensionLabel::Known {
                code: (idx + 1) as u8,
                label: self.table()[idx],
            },
            None => DimensionLabel::Unknown,
        }
    }

    /// Human-readable dimension name
    pub fn title(&self) -> &'static str {
        match self {
            Dimension::Weekday => "요일",
            Dimension::HourBucket => "시간대",
            Dimension::AgeBracket => "연령대",
        }
    }
}

/// Parse the integer behind a code cell: `7`, `"07"`, `" 7 "` and `"7.0"`
/// all yield `7`. Returns `None` for anything non-numeric or fractional.
pub fn parse_code(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}

/// Weekday label derived from a calendar date (Monday = code 1)
pub fn weekday_of(date: NaiveDate) -> DimensionLabel {
    Dimension::Weekday.from_code(date.weekday().number_from_monday() as i64)
}

/// Canonical label for a coded dimension value.
///
/// Ordering follows the dimension's natural domain order (ascending code),
/// with `Unknown` after every known code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DimensionLabel {
    Known { code: u8, label: &'static str },
    Unknown,
}

impl DimensionLabel {
    pub fn label(&self) -> &'static str {
        match self {
            DimensionLabel::Known { label, .. } => label,
            DimensionLabel::Unknown => UNKNOWN_LABEL,
        }
    }

    pub fn code(&self) -> Option<u8> {
        match self {
            DimensionLabel::Known { code, .. } => Some(*code),
            DimensionLabel::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, DimensionLabel::Known { .. })
    }
}

impl std::fmt::Display for DimensionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for DimensionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Normalize the gender column: trimmed, upper-case `M`/`F`, anything
/// empty becomes the unknown label
pub fn normalize_gender(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        trimmed.to_uppercase()
    }
}

/// Display name for a normalized gender value
pub fn gender_display(gender: &str) -> &str {
    match gender {
        "M" => "남성",
        "F" => "여성",
        other => other,
    }
}
