//! The decoded web features mapping.

use std::{
    collections::{hash_map, BTreeMap, BTreeSet, HashMap, HashSet},
    io::Write,
};

use serde::{Serialize, Serializer};

/// The only manifest envelope version this crate understands.
pub const MANIFEST_VERSION: i64 = 1;

/// Feature identifiers mapped to the set of test paths exercising them.
///
/// Paths are relative to the root of the test repository, e.g.
/// `css/css-grid/grid-model/grid-inline-001.html`. Values are sets, so a path
/// listed twice for a feature is stored once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebFeaturesData {
    features: HashMap<String, HashSet<String>>,
}

impl WebFeaturesData {
    /// Test paths for `feature`, if the feature is present.
    pub fn get(&self, feature: &str) -> Option<&HashSet<String>> {
        self.features.get(feature)
    }

    pub fn contains_feature(&self, feature: &str) -> bool {
        self.features.contains_key(feature)
    }

    /// Feature identifiers in sorted order.
    pub fn features(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.features.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total number of (feature, test path) pairs.
    pub fn test_count(&self) -> usize {
        self.features.values().map(HashSet::len).sum()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, HashSet<String>> {
        self.features.iter()
    }

    /// Features listing `test_path`, sorted.
    pub fn features_for_test(&self, test_path: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .features
            .iter()
            .filter(|(_, tests)| tests.contains(test_path))
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Writes `self` in the manifest wire format, `{"version": 1, "data": ...}`.
    pub fn write_manifest<W: Write>(&self, writer: W, pretty: bool) -> serde_json::Result<()> {
        let envelope = Envelope {
            version: MANIFEST_VERSION,
            data: self,
        };

        if pretty {
            serde_json::to_writer_pretty(writer, &envelope)
        } else {
            serde_json::to_writer(writer, &envelope)
        }
    }
}

impl From<HashMap<String, HashSet<String>>> for WebFeaturesData {
    fn from(features: HashMap<String, HashSet<String>>) -> Self {
        Self { features }
    }
}

impl From<HashMap<String, Vec<String>>> for WebFeaturesData {
    fn from(raw: HashMap<String, Vec<String>>) -> Self {
        raw.into_iter()
            .map(|(id, tests)| (id, tests.into_iter().collect::<HashSet<_>>()))
            .collect::<HashMap<_, _>>()
            .into()
    }
}

impl<'a> IntoIterator for &'a WebFeaturesData {
    type Item = (&'a String, &'a HashSet<String>);
    type IntoIter = hash_map::Iter<'a, String, HashSet<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Serializes as a map with sorted feature ids and sorted paths, so output is
/// stable across runs.
impl Serialize for WebFeaturesData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sorted: BTreeMap<&str, BTreeSet<&str>> = self
            .features
            .iter()
            .map(|(id, tests)| (id.as_str(), tests.iter().map(String::as_str).collect()))
            .collect();
        sorted.serialize(serializer)
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: i64,
    data: &'a WebFeaturesData,
}
