//! Analysis service - chart data bundles for each view
//!
//! Each bundle is the full set of summaries one screen of the dashboard
//! draws. Chart rendering itself happens outside this crate.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::dimension::gender_display;
use crate::domain::insight::MonthSeason;
use crate::domain::result::{Error, Result};
use crate::domain::{aggregate, FilteredView, GroupKey, InsightSet, KeyValue, Measure, RegionDataset, Summary};

/// Major categories with their minor categories, both sorted
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCatalogue {
    pub region: String,
    pub categories: Vec<CategoryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryEntry {
    pub major: String,
    pub minors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderShare {
    pub gender: String,
    pub label: String,
    pub amount: Decimal,
    /// Share of the view's total amount, one decimal place
    pub percent: Decimal,
}

/// Major-category overview
#[derive(Debug, Clone, Serialize)]
pub struct OverviewBundle {
    pub selection: String,
    pub rows: usize,
    pub monthly: Summary,
    pub gender_share: Vec<GenderShare>,
    pub gender_age: Summary,
    pub weekday: Summary,
    pub hour: Summary,
}

/// Side-by-side subcategory comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonBundle {
    pub selection: String,
    pub rows: usize,
    pub year_month: Summary,
    pub gender: Summary,
    pub age: Summary,
    pub hour: Summary,
    pub weekday: Summary,
}

/// Everything the report screen shows for one subcategory
#[derive(Debug, Clone, Serialize)]
pub struct ReportBundle {
    pub insights: InsightSet,
    pub hour: Summary,
    pub weekday: Summary,
    pub weekday_hour: Summary,
    pub seasonality: Vec<MonthSeason>,
    pub campaign_ideas: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AnalysisService;

impl AnalysisService {
    pub fn new() -> Self {
        Self
    }

    pub fn categories(&self, dataset: &RegionDataset) -> Result<CategoryCatalogue> {
        if dataset.is_empty() {
            return Err(Error::precondition(format!(
                "No data loaded for region '{}'",
                dataset.region()
            )));
        }
        let categories = dataset
            .major_categories()
            .into_iter()
            .map(|major| CategoryEntry {
                minors: dataset.minor_categories(&major),
                major,
            })
            .collect();
        Ok(CategoryCatalogue {
            region: dataset.region().to_string(),
            categories,
        })
    }

    pub fn overview(&self, view: &FilteredView) -> Result<OverviewBundle> {
        view.require_rows()?;
        let amount = [Measure::SumAmount];
        let amount_and_count = [Measure::SumAmount, Measure::SumCount];

        let by_gender = aggregate(view, &[GroupKey::Gender], &amount)?;

        Ok(OverviewBundle {
            selection: view.selection().describe(),
            rows: view.len(),
            monthly: aggregate(view, &[GroupKey::Month], &amount)?,
            gender_share: gender_shares(&by_gender),
            gender_age: aggregate(view, &[GroupKey::Gender, GroupKey::Age], &amount)?,
            weekday: aggregate(view, &[GroupKey::Weekday], &amount_and_count)?,
            hour: aggregate(view, &[GroupKey::Hour], &amount_and_count)?,
        })
    }

    /// Requires a selection naming at least one subcategory
    pub fn comparison(&self, view: &FilteredView) -> Result<ComparisonBundle> {
        if view.selection().minors.is_empty() {
            return Err(Error::precondition("Select at least one subcategory."));
        }
        view.require_rows()?;
        let amount = [Measure::SumAmount];
        let by_minor = |key: GroupKey| aggregate(view, &[key, GroupKey::MinorCategory], &amount);

        Ok(ComparisonBundle {
            selection: view.selection().describe(),
            rows: view.len(),
            year_month: by_minor(GroupKey::YearMonth)?,
            gender: by_minor(GroupKey::Gender)?,
            age: by_minor(GroupKey::Age)?,
            hour: by_minor(GroupKey::Hour)?,
            weekday: by_minor(GroupKey::DateWeekday)?,
        })
    }

    pub fn report_bundle(&self, view: &FilteredView) -> Result<ReportBundle> {
        view.require_rows()?;
        let amount = [Measure::SumAmount];
        let insights = InsightSet::derive(view)?;

        Ok(ReportBundle {
            hour: aggregate(view, &[GroupKey::Hour], &amount)?,
            weekday: aggregate(view, &[GroupKey::Weekday], &amount)?,
            weekday_hour: aggregate(view, &[GroupKey::Weekday, GroupKey::Hour], &amount)?,
            seasonality: insights.seasonality.clone(),
            campaign_ideas: insights.campaign_ideas(),
            insights,
        })
    }
}

fn gender_shares(by_gender: &Summary) -> Vec<GenderShare> {
    let series = by_gender.series(Measure::SumAmount);
    let total: Decimal = series.iter().map(|(_, amount)| *amount).sum();

    series
        .into_iter()
        .filter_map(|(keys, amount)| {
            let KeyValue::Text(gender) = keys.first()? else {
                return None;
            };
            let percent = if total.is_zero() {
                Decimal::ZERO
            } else {
                (amount * Decimal::ONE_HUNDRED / total).round_dp(1)
            };
            Some(GenderShare {
                label: gender_display(gender).to_string(),
                gender: gender.clone(),
                amount,
                percent,
            })
        })
        .collect()
}
