//! Sorting assistant notification messages into alert categories.
//!
//! Rules are an ordered table evaluated top to bottom; the first match wins.
//! Matching is case-insensitive substring search.

use std::fmt;

/// What a notification message asks of the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// The assistant is idle and waiting; recorded, never alerted.
    WaitingForInput,
    PermissionRequired,
    ActionRequired,
    General,
}

impl Category {
    /// Alert subtitle for this category. `None` for categories that never alert.
    #[must_use]
    pub const fn subtitle(&self) -> Option<&'static str> {
        match self {
            Self::WaitingForInput => None,
            Self::PermissionRequired => Some("Permission Required"),
            Self::ActionRequired => Some("Action Required"),
            Self::General => Some("Notification"),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WaitingForInput => "waiting_for_input",
            Self::PermissionRequired => "permission_required",
            Self::ActionRequired => "action_required",
            Self::General => "general",
        };
        f.write_str(s)
    }
}

/// A classification rule: any of `phrases` appearing in the message selects `category`.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub phrases: &'static [&'static str],
    pub category: Category,
}

impl Rule {
    /// Checks the rule against an already lowercased message.
    pub fn matches(&self, message_lower: &str) -> bool {
        self.phrases
            .iter()
            .any(|phrase| message_lower.contains(phrase))
    }
}

/// Default rules, in priority order. Phrases are lowercase.
pub const RULES: &[Rule] = &[
    Rule {
        phrases: &["waiting for your input", "waiting for input"],
        category: Category::WaitingForInput,
    },
    Rule {
        phrases: &["permission"],
        category: Category::PermissionRequired,
    },
    Rule {
        phrases: &["approval", "choose an option"],
        category: Category::ActionRequired,
    },
];

/// Classifies `message` against `rules`, falling back to [`Category::General`].
pub fn classify_with(rules: &[Rule], message: &str) -> Category {
    let lower = message.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.matches(&lower))
        .map_or(Category::General, |rule| rule.category)
}

/// Classifies `message` with [`RULES`].
pub fn classify(message: &str) -> Category {
    classify_with(RULES, message)
}
