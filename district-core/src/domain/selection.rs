//! Category selection and the filtered view it produces

use std::sync::Arc;

use serde::Serialize;

use super::record::{RegionDataset, TransactionRecord};
use super::result::{Error, Result};

/// Maximum number of subcategories compared side by side
pub const MAX_COMPARED_MINORS: usize = 3;

/// A business-category selection
///
/// An empty `minors` list selects the whole major category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub major: String,
    pub minors: Vec<String>,
}

impl Selection {
    /// Select every subcategory of a major category
    pub fn major(major: &str) -> Result<Self> {
        Ok(Self {
            major: require_major(major)?,
            minors: Vec::new(),
        })
    }

    /// Select exactly one subcategory
    pub fn single(major: &str, minor: &str) -> Result<Self> {
        let minor = minor.trim();
        if minor.is_empty() {
            return Err(Error::precondition("No subcategory selected."));
        }
        Ok(Self {
            major: require_major(major)?,
            minors: vec![minor.to_string()],
        })
    }

    /// Select between one and [`MAX_COMPARED_MINORS`] subcategories for comparison
    pub fn compare(major: &str, minors: &[String]) -> Result<Self> {
        let mut picked: Vec<String> = Vec::new();
        for m in minors {
            let m = m.trim();
            if !m.is_empty() && !picked.iter().any(|p| p == m) {
                picked.push(m.to_string());
            }
        }
        if picked.is_empty() {
            return Err(Error::precondition(
                "Select at least one subcategory.",
            ));
        }
        if picked.len() > MAX_COMPARED_MINORS {
            return Err(Error::precondition(format!(
                "At most {} subcategories can be compared, got {}",
                MAX_COMPARED_MINORS,
                picked.len()
            )));
        }
        Ok(Self {
            major: require_major(major)?,
            minors: picked,
        })
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        record.major_category == self.major
            && (self.minors.is_empty() || self.minors.iter().any(|m| *m == record.minor_category))
    }

    /// `대분류 > 소분류` style description
    pub fn describe(&self) -> String {
        if self.minors.is_empty() {
            self.major.clone()
        } else {
            format!("{} > {}", self.major, self.minors.join(", "))
        }
    }
}

fn require_major(major: &str) -> Result<String> {
    let major = major.trim();
    if major.is_empty() {
        return Err(Error::precondition("No business category selected."));
    }
    Ok(major.to_string())
}

/// Read-only subset of one region dataset for one selection
///
/// Holds row indices into the shared dataset, so every row of the view is
/// guaranteed to come from that dataset.
#[derive(Debug, Clone)]
pub struct FilteredView {
    dataset: Arc<RegionDataset>,
    selection: Selection,
    indices: Vec<usize>,
}

impl FilteredView {
    pub fn new(dataset: Arc<RegionDataset>, selection: Selection) -> Self {
        let indices = dataset
            .records()
            .iter()
            .enumerate()
            .filter(|(_, r)| selection.matches(r))
            .map(|(i, _)| i)
            .collect();
        Self {
            dataset,
            selection,
            indices,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &TransactionRecord> + '_ {
        let records = self.dataset.records();
        self.indices.iter().map(move |&i| &records[i])
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn dataset(&self) -> &Arc<RegionDataset> {
        &self.dataset
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Fail with an empty-selection error when the view has no rows
    pub fn require_rows(&self) -> Result<&Self> {
        if self.is_empty() {
            return Err(Error::empty_selection(format!(
                "{} in region {}",
                self.selection.describe(),
                self.dataset.region()
            )));
        }
        Ok(self)
    }
}
