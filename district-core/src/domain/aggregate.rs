//! Grouped aggregation over a filtered view
//!
//! Produces plain summary data. Nothing here knows about charts; renderers
//! consume [`Summary`] rows in the order they are returned.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use super::dimension::{weekday_of, DimensionLabel};
use super::record::{TransactionRecord, YearMonth};
use super::result::{Error, Result};
use super::selection::FilteredView;

/// A dimension rows can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    MajorCategory,
    MinorCategory,
    Gender,
    Age,
    /// Weekday from the coded weekday column
    Weekday,
    /// Weekday derived from the transaction date
    DateWeekday,
    Hour,
    /// Calendar month, 1..=12, across years
    Month,
    YearMonth,
}

impl GroupKey {
    pub fn value_of(&self, record: &TransactionRecord) -> KeyValue {
        match self {
            GroupKey::MajorCategory => KeyValue::Text(record.major_category.clone()),
            GroupKey::MinorCategory => KeyValue::Text(record.minor_category.clone()),
            GroupKey::Gender => KeyValue::Text(record.gender.clone()),
            GroupKey::Age => KeyValue::Code(record.age),
            GroupKey::Weekday => KeyValue::Code(record.weekday),
            GroupKey::DateWeekday => KeyValue::Code(weekday_of(record.date)),
            GroupKey::Hour => KeyValue::Code(record.hour),
            GroupKey::Month => KeyValue::Month(record.month()),
            GroupKey::YearMonth => KeyValue::YearMonth(record.year_month()),
        }
    }

    /// Column heading used in tables and chart axes
    pub fn title(&self) -> &'static str {
        match self {
            GroupKey::MajorCategory => "업종 대분류",
            GroupKey::MinorCategory => "업종 소분류",
            GroupKey::Gender => "성별",
            GroupKey::Age => "연령대",
            GroupKey::Weekday | GroupKey::DateWeekday => "요일",
            GroupKey::Hour => "시간대",
            GroupKey::Month => "월",
            GroupKey::YearMonth => "년-월",
        }
    }
}

/// Value of one grouping dimension for a group
///
/// The derived ordering is the dimension's domain order: coded dimensions
/// by code, months numerically, year-months chronologically, text
/// lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Text(String),
    Code(DimensionLabel),
    Month(u32),
    YearMonth(YearMonth),
}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyValue::Text(s) => f.write_str(s),
            KeyValue::Code(label) => f.write_str(label.label()),
            KeyValue::Month(m) => write!(f, "{}월", m),
            KeyValue::YearMonth(ym) => write!(f, "{}", ym),
        }
    }
}

impl Serialize for KeyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            KeyValue::Month(m) => serializer.serialize_u32(*m),
            other => serializer.collect_str(other),
        }
    }
}

/// A numeric measure computed per group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    SumAmount,
    SumCount,
    MeanAmount,
}

impl Measure {
    pub fn title(&self) -> &'static str {
        match self {
            Measure::SumAmount => "매출 금액",
            Measure::SumCount => "소비 건수",
            Measure::MeanAmount => "평균 매출",
        }
    }
}

/// Computed value of one measure
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MeasureValue {
    Amount(Decimal),
    Count(u64),
    /// `None` when the group has no rows
    Mean(Option<Decimal>),
}

impl MeasureValue {
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            MeasureValue::Amount(d) => Some(*d),
            MeasureValue::Count(c) => Some(Decimal::from(*c)),
            MeasureValue::Mean(m) => *m,
        }
    }
}

/// One output group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub keys: Vec<KeyValue>,
    pub values: Vec<MeasureValue>,
    /// Number of input rows in this group
    pub rows: usize,
}

/// Grouped rollup of one filtered view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub group_keys: Vec<GroupKey>,
    pub measures: Vec<Measure>,
    pub rows: Vec<SummaryRow>,
}

impl Summary {
    /// Position of a measure in each row's `values`
    pub fn column(&self, measure: Measure) -> Option<usize> {
        self.measures.iter().position(|m| *m == measure)
    }

    /// `(keys, value)` pairs of one measure, in output order
    pub fn series(&self, measure: Measure) -> Vec<(&[KeyValue], Decimal)> {
        let Some(idx) = self.column(measure) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| row.values[idx].as_decimal().map(|v| (row.keys.as_slice(), v)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Default)]
struct Accumulator {
    amount: Decimal,
    count: u64,
    rows: usize,
}

/// Group `view` by `group_keys` and compute `measures` per group
///
/// Only combinations present in the view are emitted. Rows come back in
/// domain order of the key tuple. With no group keys the whole view forms a
/// single group (or none, if the view is empty).
pub fn aggregate(view: &FilteredView, group_keys: &[GroupKey], measures: &[Measure]) -> Result<Summary> {
    if measures.is_empty() {
        return Err(Error::validation("At least one measure is required"));
    }

    let mut groups: BTreeMap<Vec<KeyValue>, Accumulator> = BTreeMap::new();
    for record in view.rows() {
        let key: Vec<KeyValue> = group_keys.iter().map(|k| k.value_of(record)).collect();
        let acc = groups.entry(key).or_default();
        acc.amount += record.amount;
        acc.count += record.count;
        acc.rows += 1;
    }

    let rows = groups
        .into_iter()
        .map(|(keys, acc)| SummaryRow {
            values: measures.iter().map(|m| measure_value(*m, &acc)).collect(),
            keys,
            rows: acc.rows,
        })
        .collect();

    Ok(Summary {
        group_keys: group_keys.to_vec(),
        measures: measures.to_vec(),
        rows,
    })
}

fn measure_value(measure: Measure, acc: &Accumulator) -> MeasureValue {
    match measure {
        Measure::SumAmount => MeasureValue::Amount(acc.amount),
        Measure::SumCount => MeasureValue::Count(acc.count),
        Measure::MeanAmount => MeasureValue::Mean(if acc.rows == 0 {
            None
        } else {
            Some(acc.amount / Decimal::from(acc.rows as u64))
        }),
    }
}
