// keyword triage - decides if a message skips the model entirely

use super::rules::{Category, DangerRule, RuleSet};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub matched: bool,
    pub category: Option<Category>,
}

impl Classification {
    pub fn none() -> Self {
        Self {
            matched: false,
            category: None,
        }
    }

    fn hit(category: Category) -> Self {
        Self {
            matched: true,
            category: Some(category),
        }
    }
}

/// Checks an utterance against the rules in declared order. First hit wins.
pub fn classify(utterance: &str, rules: &RuleSet) -> Classification {
    first_match(utterance, rules)
        .map(|rule| Classification::hit(rule.category))
        .unwrap_or_else(Classification::none)
}

// same scan as classify, but hands back the rule so the router can answer
pub(crate) fn first_match<'a>(utterance: &str, rules: &'a RuleSet) -> Option<&'a DangerRule> {
    if utterance.trim().is_empty() {
        return None;
    }

    let text = utterance.to_lowercase();
    rules
        .rules()
        .iter()
        .find(|rule| rule.terms.iter().any(|term| text.contains(term.as_str())))
}
