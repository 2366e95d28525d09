//! # Structured Hints
//!
//! A [`Hint`] is a diagnostic tree: a primary message, an optional
//! [`Loc`], a [`Severity`], optional supporting data, and ordered child
//! hints that refine the parent. Container decoders attach one child per
//! failing element so a single error explains every violation found in
//! one pass.
//!
//! The serialized shape is stable:
//!
//! ```text
//! { "primary": str, "loc": Loc | null, "severity": "info" | "warning" | "error",
//!   "data": str | null, "children": [Hint] }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::loc::Loc;

/// Severity of a hint, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational context.
    Info,
    /// Suspicious but accepted input.
    Warning,
    /// Rejected input.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A tree-shaped diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hint {
    /// Human readable summary.
    pub primary: String,
    /// Where the problem was found.
    pub loc: Option<Loc>,
    /// How severe the problem is.
    pub severity: Severity,
    /// Supporting detail, usually the offending raw value.
    pub data: Option<String>,
    /// Refinements of this hint, in discovery order.
    pub children: Vec<Hint>,
}

impl Hint {
    pub fn new(severity: Severity, primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            loc: None,
            severity,
            data: None,
            children: Vec::new(),
        }
    }

    pub fn error(primary: impl Into<String>) -> Self {
        Self::new(Severity::Error, primary)
    }

    pub fn warning(primary: impl Into<String>) -> Self {
        Self::new(Severity::Warning, primary)
    }

    pub fn info(primary: impl Into<String>) -> Self {
        Self::new(Severity::Info, primary)
    }

    pub fn with_loc(mut self, loc: &Loc) -> Self {
        self.loc = Some(loc.clone());
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_child(mut self, child: Hint) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Hint>) -> Self {
        self.children.extend(children);
        self
    }

    /// Append a child in place.
    pub fn push(&mut self, child: Hint) {
        self.children.push(child);
    }

    /// Whether this hint has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Highest severity anywhere in the tree.
    pub fn max_severity(&self) -> Severity {
        self.children
            .iter()
            .map(Hint::max_severity)
            .fold(self.severity, Severity::max)
    }

    /// All leaf hints, depth first. A leaf is the most specific statement
    /// of a problem, so this is the list most callers want to display.
    pub fn leaves(&self) -> Vec<&Hint> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Hint>) {
        if self.children.is_empty() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }

    /// First hint in the tree (self included) located exactly at `loc`.
    pub fn find(&self, loc: &Loc) -> Option<&Hint> {
        if self.loc.as_ref() == Some(loc) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(loc))
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        write!(f, "{pad}{}: {}", self.severity, self.primary)?;
        if let Some(loc) = &self.loc {
            write!(f, " (at {loc})")?;
        }
        if let Some(data) = &self.data {
            write!(f, "\n{pad}  | {data}")?;
        }
        for child in &self.children {
            writeln!(f)?;
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
