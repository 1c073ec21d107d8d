//! Hierarchical conversation summaries.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Coarse categorization of a single extracted fact, used to group facts
/// when rendering the "Conversation Facts:" header.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactCategory {
    /// A named entity (person, place, product).
    Entity,
    /// A numeric value worth remembering verbatim.
    Numeric,
    /// Durable state ("the user's subscription tier is Pro").
    State,
    /// A decision made earlier in the conversation.
    Decision,
    /// Anything not covered by the above.
    General,
}

/// One `key = value` fact extracted from conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryFact {
    /// The fact's key, e.g. `"preferred_language"`.
    pub key: String,
    /// The fact's value.
    pub value: String,
    /// Coarse category, used only for grouping/ordering.
    pub category: FactCategory,
}

/// A three-layer compression of a long conversation: prose narrative,
/// structured facts, and the index up to which messages have been folded
/// into the above two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Prose summary of the conversation prior to `summarized_up_to_index`.
    pub narrative: String,
    /// Structured facts extracted from the same span.
    pub facts: Vec<SummaryFact>,
    /// Count of messages folded into `narrative`/`facts` so far.
    pub summarized_up_to_index: usize,
    /// When this summary was first created.
    pub created_at: SystemTime,
    /// When this summary was last refreshed.
    pub updated_at: SystemTime,
}

impl ConversationSummary {
    /// Construct a fresh summary with `created_at == updated_at == now`.
    pub fn new(narrative: impl Into<String>, facts: Vec<SummaryFact>, summarized_up_to_index: usize) -> Self {
        let now = SystemTime::now();
        Self {
            narrative: narrative.into(),
            facts,
            summarized_up_to_index,
            created_at: now,
            updated_at: now,
        }
    }

    /// Render the "Conversation Facts:" system message body. Empty when
    /// there are no facts.
    pub fn facts_block(&self) -> String {
        if self.facts.is_empty() {
            return String::new();
        }
        let mut out = String::from("Conversation Facts:\n");
        for fact in &self.facts {
            out.push_str(&fact.key);
            out.push('=');
            out.push_str(&fact.value);
            out.push('\n');
        }
        out
    }

    /// Render the "Conversation Summary:" system message body. Empty when
    /// the narrative is empty.
    pub fn narrative_block(&self) -> String {
        if self.narrative.is_empty() {
            return String::new();
        }
        format!("Conversation Summary:\n{}", self.narrative)
    }
}
