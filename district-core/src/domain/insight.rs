//! Scalar insights derived from one filtered view
//!
//! Every derived value keeps both its number and its display label so it
//! can be shown directly or substituted into report sentences.

use rust_decimal::Decimal;
use serde::Serialize;

use super::aggregate::{aggregate, GroupKey, KeyValue, Measure, Summary};
use super::dimension::{gender_display, DimensionLabel};
use super::record::YearMonth;
use super::result::Result;
use super::selection::{FilteredView, Selection};

/// Average sales over a view. An empty view has no average rather than zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum SalesAverage {
    Value(Decimal),
    NoData,
}

impl SalesAverage {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            SalesAverage::Value(v) => Some(*v),
            SalesAverage::NoData => None,
        }
    }
}

/// The bucket of a coded dimension with the highest summed amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub label: DimensionLabel,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    High,
    Low,
}

impl Season {
    pub fn label(&self) -> &'static str {
        match self {
            Season::High => "성수기",
            Season::Low => "비수기",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthSeason {
    pub month: YearMonth,
    pub amount: Decimal,
    pub season: Season,
}

/// Gender and age bracket with the highest summed amount
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub gender: String,
    pub age: DimensionLabel,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSet {
    pub selection: Selection,
    pub row_count: usize,
    pub total_sales: Decimal,
    pub average_sales: SalesAverage,
    pub peak_hour: Option<Peak>,
    pub peak_day: Option<Peak>,
    /// Mean of the per-month sums that seasonality is measured against
    pub monthly_mean: Option<Decimal>,
    pub seasonality: Vec<MonthSeason>,
    pub top_segment: Option<Segment>,
}

impl InsightSet {
    pub fn derive(view: &FilteredView) -> Result<Self> {
        let total_sales: Decimal = view.rows().map(|r| r.amount).sum();
        let average_sales = if view.is_empty() {
            SalesAverage::NoData
        } else {
            SalesAverage::Value(total_sales / Decimal::from(view.len() as u64))
        };

        let by_hour = aggregate(view, &[GroupKey::Hour], &[Measure::SumAmount])?;
        let by_day = aggregate(view, &[GroupKey::Weekday], &[Measure::SumAmount])?;
        let by_month = aggregate(view, &[GroupKey::YearMonth], &[Measure::SumAmount])?;
        let by_segment = aggregate(view, &[GroupKey::Gender, GroupKey::Age], &[Measure::SumAmount])?;

        let monthly: Vec<(YearMonth, Decimal)> = by_month
            .series(Measure::SumAmount)
            .into_iter()
            .filter_map(|(keys, amount)| match keys.first() {
                Some(KeyValue::YearMonth(ym)) => Some((*ym, amount)),
                _ => None,
            })
            .collect();
        let (monthly_mean, seasonality) = classify_seasons(&monthly);

        Ok(Self {
            selection: view.selection().clone(),
            row_count: view.len(),
            total_sales,
            average_sales,
            peak_hour: peak_of(&by_hour),
            peak_day: peak_of(&by_day),
            monthly_mean,
            seasonality,
            top_segment: top_segment(&by_segment),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn high_season_months(&self) -> Vec<YearMonth> {
        self.seasonality
            .iter()
            .filter(|m| m.season == Season::High)
            .map(|m| m.month)
            .collect()
    }

    pub fn low_season_months(&self) -> Vec<YearMonth> {
        self.seasonality
            .iter()
            .filter(|m| m.season == Season::Low)
            .map(|m| m.month)
            .collect()
    }

    /// Bullet sentences for the report's title page
    pub fn sentences(&self) -> Vec<String> {
        let mut lines = vec![format!("총 매출: {} 원", format_won(self.total_sales))];

        lines.push(match self.average_sales {
            SalesAverage::Value(avg) => format!("평균 매출: {} 원", format_won(avg)),
            SalesAverage::NoData => "평균 매출: 데이터 없음".to_string(),
        });

        lines.push(format!("최고 매출 시간대: {}", peak_text(self.peak_hour)));
        lines.push(format!("최고 매출 요일: {}", peak_text(self.peak_day)));

        if !self.seasonality.is_empty() {
            lines.push(format!(
                "성수기: {} / 비수기: {}",
                join_months(&self.high_season_months()),
                join_months(&self.low_season_months())
            ));
        }

        if let Some(segment) = &self.top_segment {
            lines.push(format!(
                "주요 고객층: {} {} ({} 원)",
                gender_display(&segment.gender),
                segment.age,
                format_won(segment.amount)
            ));
        }

        lines
    }

    /// Marketing suggestions templated from the insights
    pub fn campaign_ideas(&self) -> Vec<String> {
        let mut ideas = Vec::new();

        if let Some(peak) = self.peak_hour {
            ideas.push(format!(
                "특정 시간대 할인: {} 시간대에 맞춘 할인 캠페인 진행.",
                peak.label
            ));
        }
        if let Some(peak) = self.peak_day {
            ideas.push(format!(
                "특정 요일 회원 이벤트: {}에 회원 전용 이벤트 개최.",
                peak.label
            ));
        }

        let high = self.high_season_months();
        if !high.is_empty() {
            ideas.push(format!(
                "성수기 집중 프로모션: 성수기({})에 맞춰 광고와 프로모션 예산을 집중 배치.",
                join_months(&high)
            ));
        }

        if let Some(segment) = &self.top_segment {
            ideas.push(format!(
                "주요 고객층 공략: {} {} 고객층에 맞는 상품 구성을 강화합니다.",
                gender_display(&segment.gender),
                segment.age
            ));
        }

        ideas
    }
}

/// First bucket with the maximum summed amount, scanning in domain order.
/// Ties keep the earlier bucket.
pub fn peak_of(summary: &Summary) -> Option<Peak> {
    let mut best: Option<Peak> = None;
    for (keys, amount) in summary.series(Measure::SumAmount) {
        let Some(KeyValue::Code(label)) = keys.first() else {
            continue;
        };
        match best {
            Some(current) if amount <= current.amount => {}
            _ => {
                best = Some(Peak {
                    label: *label,
                    amount,
                })
            }
        }
    }
    best
}

/// Label each month high season when its sum is strictly greater than the
/// mean of all monthly sums, low season otherwise
pub fn classify_seasons(monthly: &[(YearMonth, Decimal)]) -> (Option<Decimal>, Vec<MonthSeason>) {
    if monthly.is_empty() {
        return (None, Vec::new());
    }
    let total: Decimal = monthly.iter().map(|(_, a)| *a).sum();
    let mean = total / Decimal::from(monthly.len() as u64);

    let seasons = monthly
        .iter()
        .map(|(month, amount)| MonthSeason {
            month: *month,
            amount: *amount,
            season: if *amount > mean { Season::High } else { Season::Low },
        })
        .collect();

    (Some(mean), seasons)
}

fn top_segment(summary: &Summary) -> Option<Segment> {
    let mut best: Option<Segment> = None;
    for (keys, amount) in summary.series(Measure::SumAmount) {
        let (Some(KeyValue::Text(gender)), Some(KeyValue::Code(age))) = (keys.first(), keys.get(1)) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| amount > b.amount) {
            best = Some(Segment {
                gender: gender.clone(),
                age: *age,
                amount,
            });
        }
    }
    best
}

fn peak_text(peak: Option<Peak>) -> String {
    match peak {
        Some(p) => format!("{} ({} 원)", p.label, format_won(p.amount)),
        None => "정보 없음".to_string(),
    }
}

fn join_months(months: &[YearMonth]) -> String {
    if months.is_empty() {
        return "없음".to_string();
    }
    months
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whole won with thousands separators, e.g. `1234567.5` -> `1,234,568`
pub fn format_won(amount: Decimal) -> String {
    let rounded = amount.round();
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dimension::Dimension;
    use crate::domain::record::{RegionDataset, RegionId, TransactionRecord};
    use chrono::NaiveDate;
    use std::sync::Arc;

    struct Row {
        weekday: i64,
        hour: i64,
        date: (i32, u32, u32),
        amount: i64,
    }

    fn view(rows: &[Row]) -> FilteredView {
        let records = rows
            .iter()
            .map(|r| TransactionRecord {
                date: NaiveDate::from_ymd_opt(r.date.0, r.date.1, r.date.2).unwrap(),
                region: "r".to_string(),
                major_category: "음식".to_string(),
                minor_category: "한식".to_string(),
                gender: "M".to_string(),
                age: Dimension::AgeBracket.from_code(4),
                weekday: Dimension::Weekday.from_code(r.weekday),
                hour: Dimension::HourBucket.from_code(r.hour),
                amount: Decimal::new(r.amount, 0),
                count: 1,
            })
            .collect();
        let dataset = Arc::new(RegionDataset::new(RegionId::Key("r".to_string()), records));
        FilteredView::new(dataset, Selection::single("음식", "한식").unwrap())
    }

    #[test]
    fn test_two_row_scenario() {
        let v = view(&[
            Row { weekday: 1, hour: 9, date: (2024, 1, 1), amount: 100 },
            Row { weekday: 2, hour: 9, date: (2024, 1, 2), amount: 300 },
        ]);
        let insights = InsightSet::derive(&v).unwrap();
        assert_eq!(insights.total_sales, Decimal::new(400, 0));
        assert_eq!(insights.average_sales, SalesAverage::Value(Decimal::new(200, 0)));
        assert_eq!(insights.peak_hour.unwrap().label.code(), Some(9));
        let day = insights.peak_day.unwrap();
        assert_eq!(day.label.label(), "화요일");
        assert_eq!(day.amount, Decimal::new(300, 0));
    }

    #[test]
    fn test_empty_view_has_no_average() {
        let v = view(&[]);
        let insights = InsightSet::derive(&v).unwrap();
        assert!(insights.is_empty());
        assert_eq!(insights.average_sales, SalesAverage::NoData);
        assert_eq!(insights.total_sales, Decimal::ZERO);
        assert!(insights.peak_hour.is_none());
        assert!(insights.sentences().iter().any(|s| s == "평균 매출: 데이터 없음"));
    }

    #[test]
    fn test_peak_tie_prefers_lower_hour_and_earlier_day() {
        let v = view(&[
            Row { weekday: 5, hour: 7, date: (2024, 1, 5), amount: 200 },
            Row { weekday: 3, hour: 3, date: (2024, 1, 3), amount: 200 },
            Row { weekday: 6, hour: 8, date: (2024, 1, 6), amount: 100 },
        ]);
        let insights = InsightSet::derive(&v).unwrap();
        assert_eq!(insights.peak_hour.unwrap().label.code(), Some(3));
        assert_eq!(insights.peak_day.unwrap().label.label(), "수요일");
    }

    #[test]
    fn test_month_equal_to_mean_is_low_season() {
        let jan = YearMonth { year: 2024, month: 1 };
        let feb = YearMonth { year: 2024, month: 2 };
        let mar = YearMonth { year: 2024, month: 3 };
        let (mean, seasons) = classify_seasons(&[
            (jan, Decimal::new(100, 0)),
            (feb, Decimal::new(200, 0)),
            (mar, Decimal::new(300, 0)),
        ]);
        assert_eq!(mean, Some(Decimal::new(200, 0)));
        assert_eq!(seasons[0].season, Season::Low);
        assert_eq!(seasons[1].season, Season::Low, "equal to mean must be low season");
        assert_eq!(seasons[2].season, Season::High);
    }

    #[test]
    fn test_seasonality_uses_year_month_sums() {
        let v = view(&[
            Row { weekday: 1, hour: 1, date: (2024, 1, 1), amount: 100 },
            Row { weekday: 1, hour: 1, date: (2024, 1, 8), amount: 100 },
            Row { weekday: 1, hour: 1, date: (2024, 2, 5), amount: 50 },
        ]);
        let insights = InsightSet::derive(&v).unwrap();
        assert_eq!(insights.seasonality.len(), 2);
        assert_eq!(insights.high_season_months(), vec![YearMonth { year: 2024, month: 1 }]);
        assert_eq!(insights.low_season_months(), vec![YearMonth { year: 2024, month: 2 }]);
    }

    #[test]
    fn test_sentences_and_campaign_ideas() {
        let v = view(&[
            Row { weekday: 1, hour: 9, date: (2024, 1, 1), amount: 1_234_567 },
            Row { weekday: 2, hour: 3, date: (2024, 2, 6), amount: 10 },
        ]);
        let insights = InsightSet::derive(&v).unwrap();
        let sentences = insights.sentences();
        assert_eq!(sentences[0], "총 매출: 1,234,577 원");
        assert!(sentences[2].starts_with("최고 매출 시간대: 21:00 ~ 22:59"));
        assert!(sentences[3].starts_with("최고 매출 요일: 월요일"));

        let ideas = insights.campaign_ideas();
        assert_eq!(ideas.len(), 4);
        assert!(ideas[1].contains("월요일"));
        assert!(ideas[2].contains("2024-01"));
        assert!(ideas[3].contains("남성 30대"));
    }

    #[test]
    fn test_format_won() {
        assert_eq!(format_won(Decimal::new(0, 0)), "0");
        assert_eq!(format_won(Decimal::new(999, 0)), "999");
        assert_eq!(format_won(Decimal::new(1000, 0)), "1,000");
        assert_eq!(format_won(Decimal::new(12345675, 1)), "1,234,568");
        assert_eq!(format_won(Decimal::new(-1500000, 0)), "-1,500,000");
    }
}
