//! Redaction of sensitive data in extraction results.
//!
//! Patterns are applied in a fixed order, so a span consumed by an earlier
//! category is never counted again by a later one.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Entry, ExtractionResult};

/// Which redactions to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeOptions {
    /// Redact e-mail addresses, phone, SSN, card and ID numbers
    pub redact_sensitive: bool,

    /// Redact every remaining run of four or more digits
    pub redact_numbers: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            redact_sensitive: true,
            redact_numbers: false,
        }
    }
}

impl SanitizeOptions {
    /// Sensitive patterns and bare numbers.
    pub fn strict() -> Self {
        Self {
            redact_sensitive: true,
            redact_numbers: true,
        }
    }
}

/// Kind of redacted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Email,
    Phone,
    Ssn,
    Card,
    Id,
    Number,
}

/// Counts of redacted matches per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeSummary {
    /// E-mail addresses
    pub emails: usize,
    /// Phone numbers
    pub phones: usize,
    /// Social security numbers
    pub ssns: usize,
    /// Payment card numbers
    pub cards: usize,
    /// National and generic ID numbers
    pub ids: usize,
    /// Other digit runs
    pub numbers: usize,
}

impl SanitizeSummary {
    /// Total number of redactions.
    pub fn total(&self) -> usize {
        self.emails + self.phones + self.ssns + self.cards + self.ids + self.numbers
    }

    fn add(&mut self, category: Category, count: usize) {
        let slot = match category {
            Category::Email => &mut self.emails,
            Category::Phone => &mut self.phones,
            Category::Ssn => &mut self.ssns,
            Category::Card => &mut self.cards,
            Category::Id => &mut self.ids,
            Category::Number => &mut self.numbers,
        };
        *slot += count;
    }
}

struct Rule {
    category: Category,
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    fn new(category: Category, pattern: &str, replacement: &'static str) -> Result<Self> {
        Ok(Self {
            category,
            pattern: Regex::new(pattern)?,
            replacement,
        })
    }
}

/// Sensitive-data rules in the order they are applied.
const SENSITIVE_RULES: &[(Category, &str, &str)] = &[
    (
        Category::Email,
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        "[EMAIL_REDACTED]",
    ),
    (
        Category::Phone,
        r"\b09\d{2}[-\s]?\d{3}[-\s]?\d{3}\b",
        "[PHONE_REDACTED]",
    ),
    (
        Category::Phone,
        r"(\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
        "[PHONE_REDACTED]",
    ),
    (Category::Ssn, r"\b\d{3}-\d{2}-\d{4}\b", "[SSN_REDACTED]"),
    (
        Category::Card,
        r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b",
        "[CARD_REDACTED]",
    ),
    (
        Category::Id,
        r"\b(?:\d{17}[\dXx]|\d{15})\b",
        "[ID_REDACTED]",
    ),
    (Category::Id, r"\b\d{6,12}\b", "[ID_REDACTED]"),
];

const NUMBER_RULE: (Category, &str, &str) = (Category::Number, r"\b\d{4,}\b", "[NUMBER_REDACTED]");

/// Applies redaction rules to text and tables.
pub struct Sanitizer {
    options: SanitizeOptions,
    sensitive: Vec<Rule>,
    numbers: Rule,
}

impl Sanitizer {
    /// Create a sanitizer with the given options.
    pub fn new(options: SanitizeOptions) -> Result<Self> {
        let sensitive = SENSITIVE_RULES
            .iter()
            .map(|&(category, pattern, replacement)| Rule::new(category, pattern, replacement))
            .collect::<Result<Vec<_>>>()?;
        let (category, pattern, replacement) = NUMBER_RULE;

        Ok(Self {
            options,
            sensitive,
            numbers: Rule::new(category, pattern, replacement)?,
        })
    }

    /// Redact one string, adding match counts to `summary`.
    pub fn sanitize_text(&self, text: &str, summary: &mut SanitizeSummary) -> String {
        let mut result = text.to_string();

        if self.options.redact_sensitive {
            for rule in &self.sensitive {
                result = apply(rule, &result, summary);
            }
        }

        if self.options.redact_numbers {
            result = apply(&self.numbers, &result, summary);
        }

        result
    }

    /// Redact every text entry and table cell in place.
    pub fn sanitize_result(&self, result: &mut ExtractionResult) -> SanitizeSummary {
        let mut summary = SanitizeSummary::default();

        for entry in &mut result.entries {
            match entry {
                Entry::Text { text, .. } => {
                    *text = self.sanitize_text(text, &mut summary);
                }
                Entry::Table { table, .. } => {
                    for cell in table.rows.iter_mut().flatten() {
                        *cell = self.sanitize_text(cell, &mut summary);
                    }
                }
            }
        }

        if summary.total() > 0 {
            log::debug!("Sanitizer redacted {} matches", summary.total());
        }

        summary
    }
}

fn apply(rule: &Rule, text: &str, summary: &mut SanitizeSummary) -> String {
    let count = rule.pattern.find_iter(text).count();
    if count == 0 {
        return text.to_string();
    }
    summary.add(rule.category, count);
    rule.pattern
        .replace_all(text, rule.replacement)
        .into_owned()
}
