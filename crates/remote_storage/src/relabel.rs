//! Write relabeling applied by each queue before samples are enqueued

use contracts::{is_valid_label_name, RelabelAction, RelabelConfig, Sample, METRIC_NAME_LABEL};
use regex::Regex;

/// A relabel rule with its regex compiled
#[derive(Debug, Clone)]
struct CompiledRule {
    source_labels: Vec<String>,
    separator: String,
    regex: Regex,
    target_label: Option<String>,
    replacement: String,
    action: RelabelAction,
}

impl CompiledRule {
    fn compile(config: &RelabelConfig) -> Result<Self, regex::Error> {
        // Anchor both ends so `foo` does not match `foobar`
        let regex = Regex::new(&config.anchored_regex())?;
        Ok(Self {
            source_labels: config.source_labels.clone(),
            separator: config.separator.clone(),
            regex,
            target_label: config.target_label.clone(),
            replacement: config.replacement.clone(),
            action: config.action,
        })
    }

    fn source_value(&self, sample: &Sample) -> String {
        self.source_labels
            .iter()
            .map(|name| sample.metric.label_value(name).unwrap_or(""))
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    /// Apply to `sample`; `false` means the sample is discarded
    fn apply(&self, sample: &mut Sample) -> bool {
        match self.action {
            RelabelAction::Keep => self.regex.is_match(&self.source_value(sample)),
            RelabelAction::Drop => !self.regex.is_match(&self.source_value(sample)),
            RelabelAction::Replace => {
                self.replace(sample);
                true
            }
            RelabelAction::LabelMap => {
                self.label_map(sample);
                true
            }
            RelabelAction::LabelDrop => {
                let regex = &self.regex;
                sample.metric.labels.retain(|name, _| !regex.is_match(name));
                true
            }
            RelabelAction::LabelKeep => {
                let regex = &self.regex;
                sample.metric.labels.retain(|name, _| regex.is_match(name));
                true
            }
        }
    }

    fn replace(&self, sample: &mut Sample) {
        let Some(target) = &self.target_label else {
            return;
        };
        let value = self.source_value(sample);
        let Some(caps) = self.regex.captures(&value) else {
            return;
        };

        let mut target_name = String::new();
        caps.expand(target, &mut target_name);
        if !is_valid_label_name(&target_name) {
            return;
        }

        let mut result = String::new();
        caps.expand(&self.replacement, &mut result);
        if result.is_empty() {
            sample.metric.remove_label(&target_name);
        } else {
            sample.metric.set_label(&target_name, result);
        }
    }

    fn label_map(&self, sample: &mut Sample) {
        let names = std::iter::once(METRIC_NAME_LABEL)
            .chain(sample.metric.labels.iter().map(|(name, _)| name));

        let mut mapped = Vec::new();
        for name in names {
            if let Some(caps) = self.regex.captures(name) {
                let mut new_name = String::new();
                caps.expand(&self.replacement, &mut new_name);
                if let Some(value) = sample.metric.label_value(name) {
                    mapped.push((new_name, value.to_string()));
                }
            }
        }

        for (name, value) in mapped {
            if is_valid_label_name(&name) {
                sample.metric.set_label(&name, value);
            }
        }
    }
}

/// Ordered set of compiled relabel rules
#[derive(Debug, Clone, Default)]
pub struct Relabeler {
    rules: Vec<CompiledRule>,
}

impl Relabeler {
    /// Compile rules in order
    ///
    /// # Errors
    /// Returns the first regex that fails to compile.
    pub fn new(configs: &[RelabelConfig]) -> Result<Self, regex::Error> {
        let rules = configs
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule over `sample`, returning `None` if a rule discards it
    pub fn process(&self, mut sample: Sample) -> Option<Sample> {
        for rule in &self.rules {
            if !rule.apply(&mut sample) {
                return None;
            }
        }
        Some(sample)
    }
}
