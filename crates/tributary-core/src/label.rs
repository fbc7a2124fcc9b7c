// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Dimensional labels and the two declaration/binding modes producers use.
//!
//! A producer declares its labels either as an ordered list of *names*
//! (values are supplied positionally at emission time) or as a mapping of
//! name to default value (call-time overrides win per key). Exactly one mode
//! is active per producer; the resolution functions here are pure and keep a
//! stable order: declaration order first, appended call-time keys after.

use crate::error::{MetricsError, MetricsResult};
use serde::Serialize;

/// The value carried by a single label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LabelValue {
    /// A textual value.
    Str(String),
    /// A floating point value.
    Float(f64),
    /// An integer value.
    Int(i64),
    /// A boolean value.
    Bool(bool),
}

impl From<&str> for LabelValue {
    fn from(value: &str) -> Self {
        LabelValue::Str(value.to_string())
    }
}

impl From<String> for LabelValue {
    fn from(value: String) -> Self {
        LabelValue::Str(value)
    }
}

impl From<f64> for LabelValue {
    fn from(value: f64) -> Self {
        LabelValue::Float(value)
    }
}

impl From<i64> for LabelValue {
    fn from(value: i64) -> Self {
        LabelValue::Int(value)
    }
}

impl From<bool> for LabelValue {
    fn from(value: bool) -> Self {
        LabelValue::Bool(value)
    }
}

/// A single `{name, value}` pair on an emitted metric.
///
/// The value may be unset: a declared label keeps its slot (and its position)
/// even when no value was supplied for a given emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    name: String,
    value: Option<LabelValue>,
}

impl Label {
    /// Creates a label with a value.
    pub fn new(name: impl Into<String>, value: impl Into<LabelValue>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Creates a label whose value is unset.
    pub fn unset(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// The label name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The label value, `None` when unset.
    pub fn value(&self) -> Option<&LabelValue> {
        self.value.as_ref()
    }
}

/// How a producer declared its labels.
#[derive(Debug, Clone, Default)]
pub enum LabelBinding {
    /// No labels declared. Positional values bind to nothing; named values
    /// are appended as-is.
    #[default]
    None,
    /// Ordered label names; values are supplied positionally at emission.
    Positional(Vec<String>),
    /// Label names with default values; call-time overrides merge by key.
    Defaults(Vec<(String, Option<LabelValue>)>),
}

/// Call-time label values for a single emission.
#[derive(Debug, Clone)]
pub enum LabelSet {
    /// Values bound by position to the declared label names.
    Positional(Vec<Option<LabelValue>>),
    /// `name = value` pairs merged key-wise with declared defaults.
    Named(Vec<(String, LabelValue)>),
}

impl LabelSet {
    /// Builds a positional value set.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<LabelValue>,
    {
        LabelSet::Positional(values.into_iter().map(|v| Some(v.into())).collect())
    }

    /// Builds a named value set.
    pub fn named<I, S, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<LabelValue>,
    {
        LabelSet::Named(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// Merges two optional call-time sets key-by-key (or slot-by-slot for
    /// positional sets); values from `overrides` win. Used by timers to
    /// combine start-time and end-time labels.
    pub fn merge(
        base: Option<LabelSet>,
        overrides: Option<LabelSet>,
    ) -> MetricsResult<Option<LabelSet>> {
        match (base, overrides) {
            (None, other) => Ok(other),
            (other, None) => Ok(other),
            (Some(LabelSet::Named(mut base)), Some(LabelSet::Named(overrides))) => {
                for (name, value) in overrides {
                    match base.iter_mut().find(|(n, _)| *n == name) {
                        Some(slot) => slot.1 = value,
                        None => base.push((name, value)),
                    }
                }
                Ok(Some(LabelSet::Named(base)))
            }
            (Some(LabelSet::Positional(mut base)), Some(LabelSet::Positional(overrides))) => {
                if overrides.len() > base.len() {
                    base.resize(overrides.len(), None);
                }
                for (slot, value) in base.iter_mut().zip(overrides) {
                    if value.is_some() {
                        *slot = value;
                    }
                }
                Ok(Some(LabelSet::Positional(base)))
            }
            _ => Err(MetricsError::LabelBindingMismatch),
        }
    }
}

/// Resolves a declared binding against call-time values into the ordered
/// label sequence emitted on a metric.
pub fn resolve_labels(binding: &LabelBinding, values: Option<&LabelSet>) -> MetricsResult<Vec<Label>> {
    match (binding, values) {
        (LabelBinding::None, None) => Ok(Vec::new()),
        // Nothing declared: positional values have no names to bind to.
        (LabelBinding::None, Some(LabelSet::Positional(_))) => Ok(Vec::new()),
        (LabelBinding::None, Some(LabelSet::Named(pairs))) => Ok(pairs
            .iter()
            .map(|(name, value)| Label::new(name.clone(), value.clone()))
            .collect()),
        (LabelBinding::Positional(names), None) => {
            Ok(names.iter().map(Label::unset).collect())
        }
        (LabelBinding::Positional(names), Some(LabelSet::Positional(values))) => Ok(names
            .iter()
            .enumerate()
            .map(|(i, name)| match values.get(i).and_then(|v| v.clone()) {
                Some(value) => Label::new(name, value),
                None => Label::unset(name),
            })
            .collect()),
        (LabelBinding::Defaults(defaults), None) => Ok(defaults
            .iter()
            .map(|(name, value)| Label {
                name: name.clone(),
                value: value.clone(),
            })
            .collect()),
        (LabelBinding::Defaults(defaults), Some(LabelSet::Named(pairs))) => {
            let declared: Vec<Label> = defaults
                .iter()
                .map(|(name, value)| Label {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect();
            let overrides: Vec<Label> = pairs
                .iter()
                .map(|(name, value)| Label::new(name.clone(), value.clone()))
                .collect();
            Ok(merge_labels(&declared, &overrides))
        }
        _ => Err(MetricsError::LabelBindingMismatch),
    }
}

/// Merges `overrides` into `base` key-wise: declared order is preserved,
/// overriding values win per key, and unknown keys are appended in call
/// order.
pub fn merge_labels(base: &[Label], overrides: &[Label]) -> Vec<Label> {
    let mut merged = base.to_vec();
    for label in overrides {
        match merged.iter_mut().find(|l| l.name == label.name) {
            Some(slot) => slot.value = label.value.clone(),
            None => merged.push(label.clone()),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_binding_zips_declared_order() {
        let binding = LabelBinding::Positional(vec!["method".into(), "status".into()]);
        let values = LabelSet::positional(["GET"]);

        let labels = resolve_labels(&binding, Some(&values)).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].name(), "method");
        assert_eq!(labels[0].value(), Some(&LabelValue::Str("GET".into())));
        assert_eq!(labels[1].name(), "status");
        assert_eq!(labels[1].value(), None);
    }

    #[test]
    fn defaults_binding_overrides_key_wise() {
        let binding = LabelBinding::Defaults(vec![
            ("region".into(), Some(LabelValue::Str("eu".into()))),
            ("zone".into(), None),
        ]);
        let values = LabelSet::named([("zone", "a"), ("extra", "yes")]);

        let labels = resolve_labels(&binding, Some(&values)).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].name(), "region");
        assert_eq!(labels[0].value(), Some(&LabelValue::Str("eu".into())));
        assert_eq!(labels[1].name(), "zone");
        assert_eq!(labels[1].value(), Some(&LabelValue::Str("a".into())));
        assert_eq!(labels[2].name(), "extra");
    }

    #[test]
    fn unspecified_keys_keep_declared_defaults() {
        let binding = LabelBinding::Defaults(vec![
            ("region".into(), Some(LabelValue::Str("eu".into()))),
            ("zone".into(), None),
        ]);

        let labels = resolve_labels(&binding, None).unwrap();
        assert_eq!(labels[0].value(), Some(&LabelValue::Str("eu".into())));
        assert_eq!(labels[1].value(), None);
    }

    #[test]
    fn mixed_modes_are_rejected() {
        let binding = LabelBinding::Positional(vec!["method".into()]);
        let values = LabelSet::named([("method", "GET")]);
        assert_eq!(
            resolve_labels(&binding, Some(&values)),
            Err(MetricsError::LabelBindingMismatch)
        );

        let binding = LabelBinding::Defaults(vec![("method".into(), None)]);
        let values = LabelSet::positional(["GET"]);
        assert_eq!(
            resolve_labels(&binding, Some(&values)),
            Err(MetricsError::LabelBindingMismatch)
        );
    }

    #[test]
    fn undeclared_named_labels_are_appended() {
        let labels = resolve_labels(
            &LabelBinding::None,
            Some(&LabelSet::named([("a", "x"), ("b", "y")])),
        )
        .unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].name(), "a");
        assert_eq!(labels[1].name(), "b");
    }

    #[test]
    fn label_set_merge_end_values_win() {
        let start = LabelSet::named([("hello", "world"), ("hi", "there")]);
        let end = LabelSet::named([("hello", "universe"), ("goodbye", "porkpie")]);

        let merged = LabelSet::merge(Some(start), Some(end)).unwrap().unwrap();
        match merged {
            LabelSet::Named(pairs) => {
                assert_eq!(pairs.len(), 3);
                assert_eq!(pairs[0], ("hello".into(), LabelValue::Str("universe".into())));
                assert_eq!(pairs[1], ("hi".into(), LabelValue::Str("there".into())));
                assert_eq!(pairs[2], ("goodbye".into(), LabelValue::Str("porkpie".into())));
            }
            LabelSet::Positional(_) => panic!("expected a named set"),
        }
    }

    #[test]
    fn label_set_merge_positional_by_slot() {
        let start = LabelSet::positional(["a", "b"]);
        let end = LabelSet::Positional(vec![None, Some(LabelValue::Str("c".into()))]);

        let merged = LabelSet::merge(Some(start), Some(end)).unwrap().unwrap();
        match merged {
            LabelSet::Positional(values) => {
                assert_eq!(values[0], Some(LabelValue::Str("a".into())));
                assert_eq!(values[1], Some(LabelValue::Str("c".into())));
            }
            LabelSet::Named(_) => panic!("expected a positional set"),
        }
    }
}
