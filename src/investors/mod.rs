//! Read-only investor catalog loaded from the JSON dataset at startup.

pub mod matching;

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Investor, InvestorMatch, UNKNOWN_LOCATION};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read investor dataset {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Investor dataset is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    ChequeDesc,
}

impl SortOrder {
    /// Unknown values fall back to name ascending.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("name_desc") => Self::NameDesc,
            Some("cheque_desc") => Self::ChequeDesc,
            _ => Self::NameAsc,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryQuery {
    /// `None` or `"All"` disables the filter.
    pub stage: Option<String>,
    pub hq: Option<String>,
    pub sort: SortOrder,
    pub skip: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryPage {
    pub investors: Vec<InvestorMatch>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub hqs: Vec<String>,
    pub stages: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InvestorCatalog {
    investors: Vec<Investor>,
}

impl InvestorCatalog {
    /// Build a catalog; when the dataset's ids are missing or clash, entries
    /// are numbered by position.
    pub fn new(mut investors: Vec<Investor>) -> Self {
        let mut seen = HashSet::new();
        let unique = investors.iter().all(|i| seen.insert(i.id));
        if !unique {
            for (idx, investor) in investors.iter_mut().enumerate() {
                investor.id = idx as u32;
            }
        }
        Self { investors }
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), investors = catalog.len(), "Investor catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.investors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.investors.is_empty()
    }

    pub fn all(&self) -> &[Investor] {
        &self.investors
    }

    pub fn get(&self, id: u32) -> Option<&Investor> {
        self.investors.iter().find(|i| i.id == id)
    }

    /// Distinct display HQs (unknown excluded) and distinct stages, sorted.
    pub fn filter_options(&self) -> FilterOptions {
        let hqs: BTreeSet<&str> = self
            .investors
            .iter()
            .map(Investor::display_hq)
            .filter(|hq| !hq.is_empty() && *hq != UNKNOWN_LOCATION)
            .collect();
        let stages: BTreeSet<&str> = self.investors.iter().flat_map(Investor::stages).collect();
        FilterOptions {
            hqs: hqs.into_iter().map(String::from).collect(),
            stages: stages.into_iter().map(String::from).collect(),
        }
    }

    /// Filter, sort and paginate the directory. Entries carry a zero score.
    pub fn directory(&self, query: &DirectoryQuery) -> DirectoryPage {
        let stage = active_filter(query.stage.as_deref());
        let hq = active_filter(query.hq.as_deref()).map(str::to_lowercase);

        let mut filtered: Vec<&Investor> = self
            .investors
            .iter()
            .filter(|i| stage.map_or(true, |s| i.invests_in_stage(s)))
            .filter(|i| {
                hq.as_deref()
                    .map_or(true, |h| i.global_hq.to_lowercase().contains(h))
            })
            .collect();

        match query.sort {
            SortOrder::NameAsc => filtered.sort_by(|a, b| a.name.cmp(&b.name)),
            SortOrder::NameDesc => filtered.sort_by(|a, b| b.name.cmp(&a.name)),
            // Unknown cheque sizes go last.
            SortOrder::ChequeDesc => filtered.sort_by(|a, b| {
                let a = a.first_cheque_maximum.unwrap_or(f64::NEG_INFINITY);
                let b = b.first_cheque_maximum.unwrap_or(f64::NEG_INFINITY);
                b.total_cmp(&a)
            }),
        }

        let limit = match query.limit {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        let total = filtered.len();
        let investors = filtered
            .into_iter()
            .skip(query.skip)
            .take(limit)
            .map(|i| InvestorMatch::from_investor(i, 0.0))
            .collect();

        DirectoryPage { investors, total }
    }
}

fn active_filter(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

#[cfg(test)]
pub(crate) fn sample_catalog() -> InvestorCatalog {
    InvestorCatalog::from_json(
        r#"[
        {"id": 0, "name": "Northwind Capital", "type": "VC", "global_hq": "San Francisco, CA, USA",
         "website": "https://northwind.vc", "stage_of_investment": "Seed | Series A",
         "first_cheque_minimum": 250000, "first_cheque_maximum": 1500000,
         "investment_thesis": "B2B SaaS and developer tools"},
        {"id": 1, "name": "Alpine Angels", "type": "Angel Network", "global_hq": "Zurich, Switzerland",
         "stage_of_investment": "Pre-Seed | Seed",
         "first_cheque_minimum": 25000, "first_cheque_maximum": 200000,
         "investment_thesis": "Deep tech and climate"},
        {"id": 2, "name": "Harbor Growth", "global_hq": "London, UK",
         "stage_of_investment": "Series A | Series B",
         "first_cheque_minimum": 3000000, "first_cheque_maximum": 10000000,
         "investment_thesis": "Fintech growth rounds"},
        {"id": 3, "name": "Mystery Fund", "stage_of_investment": "Seed"}
    ]"#,
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> DirectoryQuery {
        DirectoryQuery::default()
    }

    #[test]
    fn filter_options_are_sorted_and_distinct() {
        let options = sample_catalog().filter_options();
        assert_eq!(options.hqs, vec!["Switzerland", "UK", "USA"]);
        assert_eq!(options.stages, vec!["Pre-Seed", "Seed", "Series A", "Series B"]);
    }

    #[test]
    fn default_directory_is_name_ascending() {
        let page = sample_catalog().directory(&query());
        assert_eq!(page.total, 4);
        let names: Vec<_> = page.investors.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Alpine Angels", "Harbor Growth", "Mystery Fund", "Northwind Capital"]
        );
        assert!(page.investors.iter().all(|i| i.match_score == 0.0));
    }

    #[test]
    fn stage_and_hq_filters_are_case_insensitive() {
        let catalog = sample_catalog();
        let page = catalog.directory(&DirectoryQuery {
            stage: Some("series a".into()),
            ..query()
        });
        assert_eq!(page.total, 2);

        let page = catalog.directory(&DirectoryQuery {
            stage: Some("All".into()),
            hq: Some("usa".into()),
            ..query()
        });
        assert_eq!(page.total, 1);
        assert_eq!(page.investors[0].hq, "USA");
    }

    #[test]
    fn cheque_sort_puts_unknown_last() {
        let page = sample_catalog().directory(&DirectoryQuery {
            sort: SortOrder::ChequeDesc,
            ..query()
        });
        assert_eq!(page.investors[0].name, "Harbor Growth");
        assert_eq!(page.investors[3].name, "Mystery Fund");
    }

    #[test]
    fn pagination_reports_full_total() {
        let page = sample_catalog().directory(&DirectoryQuery {
            skip: 1,
            limit: 2,
            ..query()
        });
        assert_eq!(page.total, 4);
        assert_eq!(page.investors.len(), 2);
        assert_eq!(page.investors[0].name, "Harbor Growth");
    }

    #[test]
    fn duplicate_ids_are_renumbered() {
        let catalog = InvestorCatalog::from_json(r#"[{"name": "A"}, {"name": "B"}]"#).unwrap();
        assert_eq!(catalog.get(1).unwrap().name, "B");
    }

    #[test]
    fn sort_param_parsing() {
        assert_eq!(SortOrder::from_param(Some("cheque_desc")), SortOrder::ChequeDesc);
        assert_eq!(SortOrder::from_param(Some("bogus")), SortOrder::NameAsc);
        assert_eq!(SortOrder::from_param(None), SortOrder::NameAsc);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = InvestorCatalog::load(Path::new("/definitely/missing.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
