//! Element query model.
//!
//! The target app's markup is not stable across builds (ARIA roles,
//! accessible names and free text all drift), so element lookup is expressed
//! as data: a tagged query evaluated by the page implementation. Candidate
//! chains over these queries live in the intent-resolver crate.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How a textual property (accessible name, visible text) is matched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextMatch {
    /// Trimmed, case-sensitive equality.
    Exact(String),
    /// Case-insensitive substring.
    Contains(String),
    /// Case-insensitive regular expression over the whole text.
    Pattern(String),
    /// Matches any text, including empty.
    Any,
}

impl TextMatch {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextMatch::Exact(wanted) => text.trim() == wanted.trim(),
            TextMatch::Contains(wanted) => text
                .to_lowercase()
                .contains(wanted.trim().to_lowercase().as_str()),
            TextMatch::Pattern(pattern) => match Regex::new(&format!("(?i){pattern}")) {
                Ok(re) => re.is_match(text),
                Err(err) => {
                    // A malformed pattern must not abort a run; degrade to substring.
                    warn!(pattern, %err, "invalid text pattern, using substring match");
                    text.to_lowercase().contains(pattern.to_lowercase().as_str())
                }
            },
            TextMatch::Any => true,
        }
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextMatch::Exact(s) => write!(f, "={s:?}"),
            TextMatch::Contains(s) => write!(f, "~{s:?}"),
            TextMatch::Pattern(s) => write!(f, "/{s}/i"),
            TextMatch::Any => f.write_str("*"),
        }
    }
}

/// One locator strategy for one lookup, evaluated by the page implementation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ElementQuery {
    /// ARIA role plus accessible-name match.
    Role { role: String, name: TextMatch },
    /// Visible text (or accessible name) match anywhere on the page.
    Text(TextMatch),
    /// Raw CSS selector, for markup with no usable semantics.
    Css(String),
    /// `inner` evaluated only within subtrees matching `scope`.
    Within {
        scope: Box<ElementQuery>,
        inner: Box<ElementQuery>,
    },
    /// Positional pick among the matches of `base`.
    Nth {
        base: Box<ElementQuery>,
        index: usize,
    },
}

impl ElementQuery {
    pub fn role(role: impl Into<String>, name: TextMatch) -> Self {
        ElementQuery::Role {
            role: role.into(),
            name,
        }
    }

    pub fn text(name: TextMatch) -> Self {
        ElementQuery::Text(name)
    }

    pub fn css(selector: impl Into<String>) -> Self {
        ElementQuery::Css(selector.into())
    }

    pub fn within(scope: ElementQuery, inner: ElementQuery) -> Self {
        ElementQuery::Within {
            scope: Box::new(scope),
            inner: Box::new(inner),
        }
    }

    pub fn nth(base: ElementQuery, index: usize) -> Self {
        ElementQuery::Nth {
            base: Box::new(base),
            index,
        }
    }

    /// Human-readable form for logs and failure messages.
    pub fn describe(&self) -> String {
        match self {
            ElementQuery::Role { role, name } => format!("role={role}[name{name}]"),
            ElementQuery::Text(m) => format!("text{m}"),
            ElementQuery::Css(sel) => format!("css({sel})"),
            ElementQuery::Within { scope, inner } => {
                format!("{} >> {}", scope.describe(), inner.describe())
            }
            ElementQuery::Nth { base, index } => format!("{}#{}", base.describe(), index),
        }
    }
}
