use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of fact-bearing fragment
///
/// Declaration order is the merge priority order: earlier kinds are kept first
/// when a preservation strategy caps how many elements survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Statistic,
    Specification,
    Quote,
    Example,
    Definition,
}

impl ElementKind {
    pub const ALL: [ElementKind; 5] = [
        Self::Statistic,
        Self::Specification,
        Self::Quote,
        Self::Example,
        Self::Definition,
    ];

    /// Lower is more valuable
    pub fn priority(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statistic => write!(f, "statistic"),
            Self::Specification => write!(f, "specification"),
            Self::Quote => write!(f, "quote"),
            Self::Example => write!(f, "example"),
            Self::Definition => write!(f, "definition"),
        }
    }
}

/// Byte offsets into the source text, `start..end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuableElement {
    pub kind: ElementKind,
    /// Sentence text, verbatim from the source
    pub text: String,
    pub span: Span,
}

impl ValuableElement {
    pub fn new(kind: ElementKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Per-kind counts of elements carried into a section's final text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreservationReport {
    pub retained: BTreeMap<ElementKind, usize>,
    /// Elements not appended because the generated text already carries them
    pub already_present: usize,
    /// Elements left out by a top-K cap
    pub dropped: usize,
}

impl PreservationReport {
    /// Report that counts every element as retained
    pub fn full(elements: &[ValuableElement]) -> Self {
        let mut report = Self::default();
        for element in elements {
            report.record(element.kind);
        }
        report
    }

    pub fn record(&mut self, kind: ElementKind) {
        *self.retained.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: ElementKind) -> usize {
        self.retained.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_retained(&self) -> usize {
        self.retained.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_retained() == 0 && self.already_present == 0 && self.dropped == 0
    }
}

impl fmt::Display for PreservationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = ElementKind::ALL
            .iter()
            .filter(|k| self.count(**k) > 0)
            .map(|k| format!("{} {}", self.count(*k), k))
            .collect();
        if parts.is_empty() {
            write!(f, "nothing retained")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}
