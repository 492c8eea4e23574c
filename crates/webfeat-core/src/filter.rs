//! Test-run query filters and their pagination.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const MASTER_LABEL: &str = "master";
pub const EXPERIMENTAL_LABEL: &str = "experimental";
pub const STABLE_LABEL: &str = "stable";

/// A browser, optionally narrowed by version prefix and labels.
///
/// Written as `name[-version][label,...]`, e.g. `chrome`, `firefox-120` or
/// `chrome[experimental,master]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSpec {
    pub browser_name: String,
    pub browser_version: Option<String>,
    pub labels: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProductSpecError(String);

impl fmt::Display for ParseProductSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid product spec `{}`", self.0)
    }
}

impl std::error::Error for ParseProductSpecError {}

impl FromStr for ProductSpec {
    type Err = ParseProductSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseProductSpecError(s.to_string());
        let spec = s.trim();

        let (product, labels) = match spec.find('[') {
            Some(start) => {
                let labels = spec[start + 1..].strip_suffix(']').ok_or_else(invalid)?;
                (&spec[..start], labels)
            }
            None => (spec, ""),
        };

        let (name, version) = match product.split_once('-') {
            Some((name, version)) if !version.is_empty() => (name, Some(version.to_string())),
            Some(_) => return Err(invalid()),
            None => (product, None),
        };

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid());
        }

        Ok(Self {
            browser_name: name.to_ascii_lowercase(),
            browser_version: version,
            labels: labels
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(String::from)
                .collect(),
        })
    }
}

impl fmt::Display for ProductSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.browser_name)?;
        if let Some(version) = &self.browser_version {
            write!(f, "-{version}")?;
        }
        if !self.labels.is_empty() {
            let labels: Vec<&str> = self.labels.iter().map(String::as_str).collect();
            write!(f, "[{}]", labels.join(","))?;
        }
        Ok(())
    }
}

impl Serialize for ProductSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProductSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub exclude_bad_ranges: bool,
}

/// A single run of the test suite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRun {
    pub id: i64,
    pub browser_name: String,
    pub browser_version: String,
    pub revision: String,
    pub time_start: DateTime<Utc>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

/// Runs loaded for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTestRuns {
    pub product: ProductSpec,
    pub test_runs: Vec<TestRun>,
}

/// A query over test runs.
///
/// `max_count` caps the runs per product, `offset` skips that many, and
/// `[from, to]` bounds the run start time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<ProductSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_opts: Option<QueryOptions>,
}

impl TestRunFilter {
    /// The filter for the page after `loaded_runs`, or `None` when there is
    /// nothing left to page through.
    pub fn next_page(&self, loaded_runs: &[ProductTestRuns]) -> Option<TestRunFilter> {
        self.next_page_at(loaded_runs, Utc::now())
    }

    /// [`Self::next_page`] with an explicit `now`, used when `to` is unset.
    pub fn next_page_at(
        &self,
        loaded_runs: &[ProductTestRuns],
        now: DateTime<Utc>,
    ) -> Option<TestRunFilter> {
        // A zero cap is no cap.
        if let Some(max_count) = self.max_count.filter(|&max| max > 0) {
            // A full page for any product means there may be more in this window.
            if loaded_runs
                .iter()
                .any(|runs| runs.test_runs.len() >= max_count)
            {
                return Some(TestRunFilter {
                    offset: Some(max_count + self.offset.unwrap_or(0)),
                    ..self.clone()
                });
            }
        }

        let from = self.from?;
        let to = self.to.unwrap_or(now);
        let span = to - from;

        Some(TestRunFilter {
            from: Some(from - span),
            to: Some(from - Duration::milliseconds(1)),
            offset: None,
            ..self.clone()
        })
    }
}
