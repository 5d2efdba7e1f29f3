//! Sample - the unit of data flowing through remote write
//!
//! Metric identity, label sets and the external-label overlay.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Pseudo-label that addresses the metric name
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Check whether `name` is a legal label name (`[a-zA-Z_][a-zA-Z0-9_]*`)
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Label name -> label value mapping
///
/// Keys are unique and iterate in sorted order, which keeps serialized
/// output and relabel source-label joins deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Create an empty label set
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Get label value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether a label with this name is present
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Insert or overwrite a label, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Remove a label, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// Keep only labels matching the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.0.retain(|k, v| keep(k, v));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of `self` with every label of `overlay` whose name is absent here
    ///
    /// Labels already present in `self` are never overwritten.
    pub fn merge_missing(&self, overlay: &LabelSet) -> LabelSet {
        let mut merged = self.clone();
        for (name, value) in &overlay.0 {
            if !merged.0.contains_key(name) {
                merged.0.insert(name.clone(), value.clone());
            }
        }
        merged
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value:?}")?;
        }
        write!(f, "}}")
    }
}

/// Metric identity: name + labels
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name
    pub name: String,

    /// Label set (never contains `__name__`)
    #[serde(default)]
    pub labels: LabelSet,
}

impl Metric {
    pub fn new(name: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    /// Label value, with `__name__` resolving to the metric name
    pub fn label_value(&self, name: &str) -> Option<&str> {
        if name == METRIC_NAME_LABEL {
            Some(self.name.as_str())
        } else {
            self.labels.get(name)
        }
    }

    /// Set a label, with `__name__` renaming the metric
    pub fn set_label(&mut self, name: &str, value: impl Into<String>) {
        if name == METRIC_NAME_LABEL {
            self.name = value.into();
        } else {
            self.labels.insert(name, value);
        }
    }

    /// Remove a label; the metric name itself cannot be removed
    pub fn remove_label(&mut self, name: &str) {
        if name != METRIC_NAME_LABEL {
            self.labels.remove(name);
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.labels)
    }
}

/// One metric observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Metric identity
    pub metric: Metric,

    /// Observed value
    pub value: f64,

    /// Unix timestamp in milliseconds
    pub timestamp_ms: i64,
}

impl Sample {
    pub fn new(metric: Metric, value: f64, timestamp_ms: i64) -> Self {
        Self {
            metric,
            value,
            timestamp_ms,
        }
    }

    /// Independent copy with external labels overlaid
    ///
    /// The copy carries every label of `self` unchanged plus each external
    /// label whose name `self` does not already carry.
    pub fn with_external_labels(&self, external: &LabelSet) -> Sample {
        Sample {
            metric: Metric {
                name: self.metric.name.clone(),
                labels: self.metric.labels.merge_missing(external),
            },
            value: self.value,
            timestamp_ms: self.timestamp_ms,
        }
    }
}
