//! Core identifier types for the relaygraph workflow engine.
//!
//! [`StageKind`] names the stages of a workflow graph. `Start` and `End` are
//! virtual endpoints: `Start` anchors the single entry edge (and is the target
//! of the drain loop-back edge), `End` terminates an item's walk. Neither is
//! ever executed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a stage within a workflow graph.
///
/// # Examples
///
/// ```rust
/// use relaygraph::types::StageKind;
///
/// let entry: StageKind = "assess".into();
/// assert!(entry.is_custom());
/// assert_eq!(entry.to_string(), "assess");
/// assert!(StageKind::End.is_end());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    /// Virtual entry anchor. The single edge leaving `Start` selects the
    /// entry stage; an edge *to* `Start` marks the batch drain loop-back.
    Start,

    /// Virtual terminal. An edge to `End` (or a stage with no outgoing
    /// edges) ends an item's walk successfully.
    End,

    /// A user-defined stage, identified by a unique name within the graph.
    Custom(String),
}

impl StageKind {
    /// Returns `true` if this is the virtual [`Start`](Self::Start) anchor.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Returns `true` if this is the virtual [`End`](Self::End) terminal.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if this is a custom stage.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// The stage name as used for blackboard keys.
    ///
    /// Virtual endpoints never write to the blackboard, but they still
    /// render as `"Start"`/`"End"` in logs and errors.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Start => "Start",
            Self::End => "End",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Developer experience: allow string literals wherever a StageKind is expected.
impl From<&str> for StageKind {
    fn from(s: &str) -> Self {
        match s {
            "Start" => StageKind::Start,
            "End" => StageKind::End,
            other => StageKind::Custom(other.to_string()),
        }
    }
}

impl From<String> for StageKind {
    fn from(s: String) -> Self {
        StageKind::from(s.as_str())
    }
}
