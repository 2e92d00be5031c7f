//! The per-walk blackboard.
//!
//! A [`Blackboard`] maps stage names to the last value each stage produced
//! during one item's walk. It is created fresh when a walk enters the graph
//! and mutated only by the sequential walk itself and by the fan-out join's
//! single merge step, so each key has exactly one writer and replays are
//! deterministic.

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::StageKind;

/// Stage-name keyed map of produced values for one item's walk.
///
/// # Examples
///
/// ```rust
/// use relaygraph::blackboard::Blackboard;
/// use serde_json::json;
///
/// let mut board = Blackboard::new();
/// board.record(&"assess".into(), json!({"needs_action": true}));
///
/// assert_eq!(board.len(), 1);
/// assert!(board.value("assess").is_some());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blackboard {
    values: FxHashMap<String, Value>,
}

impl Blackboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` under the producing stage's name.
    ///
    /// Within one walk every key is written once; an overwrite indicates a
    /// graph that routes through the same stage twice and is logged.
    pub fn record(&mut self, stage: &StageKind, value: Value) {
        if self
            .values
            .insert(stage.name().to_string(), value)
            .is_some()
        {
            tracing::warn!(stage = %stage, "blackboard value overwritten within one walk");
        }
    }

    /// The raw value a stage produced, if it ran.
    #[must_use]
    pub fn value(&self, stage: &str) -> Option<&Value> {
        self.values.get(stage)
    }

    /// Decodes a stage's value into a typed form.
    ///
    /// Returns `None` when the stage has not run or its value does not
    /// decode; routing predicates rely on this to fail closed.
    #[must_use]
    pub fn decode<T: DeserializeOwned>(&self, stage: &str) -> Option<T> {
        self.values
            .get(stage)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Decodes a stage's value as a plain string.
    #[must_use]
    pub fn text(&self, stage: &str) -> Option<&str> {
        self.values.get(stage).and_then(Value::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over recorded `(stage, value)` pairs in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Flag {
        on: bool,
    }

    #[test]
    fn decode_returns_none_for_missing_or_mismatched() {
        let mut board = Blackboard::new();
        board.record(&"a".into(), json!({"on": true}));

        assert!(board.decode::<Flag>("a").is_some_and(|f| f.on));
        assert!(board.decode::<Flag>("missing").is_none());

        board.record(&"b".into(), json!("just text"));
        assert!(board.decode::<Flag>("b").is_none());
        assert_eq!(board.text("b"), Some("just text"));
    }

    #[test]
    fn record_replaces_prior_value() {
        let mut board = Blackboard::new();
        board.record(&"a".into(), json!(1));
        board.record(&"a".into(), json!(2));
        assert_eq!(board.value("a"), Some(&json!(2)));
        assert_eq!(board.len(), 1);
    }
}
