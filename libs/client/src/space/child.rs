//! Space-child state events: the per-child assertions a space's room state
//! carries about its children.

use serde::{Deserialize, Serialize};

/// Longest order string the protocol allows; longer values are ignored.
const MAX_ORDER_LEN: usize = 50;

/// Content of a space-child state event.
///
/// An event whose content is empty (all fields absent) revokes the child
/// edge named by its state key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceChildContent {
    /// Candidate servers that can be used to join the child. Children
    /// without `via` carry no live edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<Vec<String>>,
    /// Sibling ordering hint. Lexicographic, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    /// Whether members of the space should auto-join this child.
    #[serde(default)]
    pub auto_join: bool,
    /// Whether the child should be advertised eagerly.
    #[serde(default)]
    pub suggested: bool,
}

impl SpaceChildContent {
    /// `true` when the content revokes the edge rather than asserting it.
    pub fn is_empty(&self) -> bool {
        self.via.is_none() && self.order.is_none() && !self.auto_join && !self.suggested
    }

    /// The order hint, with forbidden values filtered out.
    ///
    /// Orders longer than 50 characters, or containing characters outside
    /// printable ASCII (`0x20..=0x7E`), are ignored as if absent.
    pub fn valid_order(&self) -> Option<&str> {
        let order = self.order.as_deref()?;
        if order.len() > MAX_ORDER_LEN {
            return None;
        }
        if !order.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
            return None;
        }
        Some(order)
    }
}

/// One space-child state event, keyed by the child room id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceChildEvent {
    /// The child room id this assertion is about.
    pub state_key: String,
    /// `None` or empty content means the edge was removed.
    #[serde(default)]
    pub content: Option<SpaceChildContent>,
}

impl SpaceChildEvent {
    pub fn asserts(state_key: impl Into<String>, content: SpaceChildContent) -> Self {
        Self {
            state_key: state_key.into(),
            content: Some(content),
        }
    }

    pub fn revokes(state_key: impl Into<String>) -> Self {
        Self {
            state_key: state_key.into(),
            content: None,
        }
    }

    /// The live content, treating empty content as a removal.
    pub fn live_content(&self) -> Option<&SpaceChildContent> {
        self.content.as_ref().filter(|content| !content.is_empty())
    }
}
