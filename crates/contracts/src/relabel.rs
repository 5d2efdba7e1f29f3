//! Write relabeling rule definitions
//!
//! Only the declarative shape lives here; evaluation belongs to the queue worker.

use serde::{Deserialize, Serialize};

/// One relabeling rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelabelConfig {
    /// Labels whose values are joined to form the match input
    #[serde(default)]
    pub source_labels: Vec<String>,

    /// Separator placed between source label values
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Regex matched against the joined input (fully anchored)
    #[serde(default = "default_regex")]
    pub regex: String,

    /// Label written by `replace`
    #[serde(default)]
    pub target_label: Option<String>,

    /// Replacement template, `$1`-style group references
    #[serde(default = "default_replacement")]
    pub replacement: String,

    /// Rule action
    #[serde(default)]
    pub action: RelabelAction,
}

impl Default for RelabelConfig {
    fn default() -> Self {
        Self {
            source_labels: Vec::new(),
            separator: default_separator(),
            regex: default_regex(),
            target_label: None,
            replacement: default_replacement(),
            action: RelabelAction::default(),
        }
    }
}

impl RelabelConfig {
    /// Pattern as actually matched, anchored at both ends
    pub fn anchored_regex(&self) -> String {
        format!("^(?:{})$", self.regex)
    }
}

fn default_separator() -> String {
    ";".to_string()
}

fn default_regex() -> String {
    "(.*)".to_string()
}

fn default_replacement() -> String {
    "$1".to_string()
}

/// Relabeling action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelabelAction {
    /// Write the expanded replacement into `target_label`
    #[default]
    Replace,
    /// Drop the sample unless the input matches
    Keep,
    /// Drop the sample if the input matches
    Drop,
    /// Copy labels whose names match, renamed by the replacement
    LabelMap,
    /// Remove labels whose names match
    LabelDrop,
    /// Remove labels whose names do not match
    LabelKeep,
}
