//! Identifier classification rules.
//!
//! A deliberately small teaching model: ASCII letters, digits and underscore,
//! no accents, underscore-prefixed names allowed, and a penalty for generic
//! one- or two-letter names. It is not meant to track any real language.
//!
//! `classify` and `violation_reasons` are both built from the same character
//! tests below, so they can never disagree.

use std::collections::BTreeSet;
use std::fmt;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Single-letter loop/math names that count as poor practice.
pub const DEFAULT_GENERIC_NAMES: [&str; 11] = ["a", "b", "c", "x", "y", "z", "n", "m", "i", "j", "k"];

/// Names this short that are purely alphabetic are poor practice regardless of the generic set.
const SHORT_ALPHA_MAX_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Verdict {
    #[strum(to_string = "Valid")]
    Valid,
    #[strum(to_string = "Invalid")]
    Invalid,
    #[strum(to_string = "Valid, but poor practice")]
    ValidButPoorPractice,
}

impl Verdict {
    /// Choices offered to the learner, in display order.
    pub const CHOICES: [Verdict; 3] = [Verdict::Valid, Verdict::Invalid, Verdict::ValidButPoorPractice];

    /// Whether picking this verdict obliges the learner to justify it.
    pub fn needs_justification(&self) -> bool {
        !matches!(self, Verdict::Valid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::Display)]
pub enum ViolationReason {
    #[strum(to_string = "Empty name")]
    EmptyName,
    #[strum(to_string = "Starts with a number")]
    StartsWithDigit,
    #[strum(to_string = "Contains a space")]
    ContainsSpace,
    #[strum(to_string = "Contains an accent (not ASCII)")]
    ContainsAccent,
    #[strum(to_string = "Contains an invalid symbol/operator (+, -, *, /, %, etc.)")]
    ContainsInvalidSymbol,
    #[strum(to_string = "Generic or undescriptive")]
    GenericOrUndescriptive,
}

impl ViolationReason {
    /// Reasons that make an identifier invalid, in the order feedback lists them.
    pub const HARD: [ViolationReason; 4] = [
        ViolationReason::StartsWithDigit,
        ViolationReason::ContainsSpace,
        ViolationReason::ContainsAccent,
        ViolationReason::ContainsInvalidSymbol,
    ];
}

/// Verdict plus the reasons behind it, computed together for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub verdict: Verdict,
    pub reasons: BTreeSet<ViolationReason>,
}

/// The configurable part of the rule set: which names count as generic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    generic_names: BTreeSet<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::with_generic_names(DEFAULT_GENERIC_NAMES)
    }
}

impl RuleSet {
    pub fn with_generic_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            generic_names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_syntactically_valid(&self, identifier: &str) -> bool {
        matches_identifier_pattern(identifier) && !has_accent(identifier)
    }

    /// Only meaningful for identifiers that already passed `is_syntactically_valid`.
    pub fn is_poor_practice(&self, identifier: &str) -> bool {
        if self.generic_names.contains(identifier) {
            return true;
        }
        identifier.chars().count() <= SHORT_ALPHA_MAX_LEN
            && !identifier.is_empty()
            && identifier.chars().all(|c| c.is_ascii_alphabetic())
    }

    pub fn classify(&self, identifier: &str) -> Verdict {
        if !self.is_syntactically_valid(identifier) {
            Verdict::Invalid
        } else if self.is_poor_practice(identifier) {
            Verdict::ValidButPoorPractice
        } else {
            Verdict::Valid
        }
    }

    pub fn violation_reasons(&self, identifier: &str) -> BTreeSet<ViolationReason> {
        let mut reasons = BTreeSet::new();
        if identifier.is_empty() {
            reasons.insert(ViolationReason::EmptyName);
            return reasons;
        }
        if starts_with_digit(identifier) {
            reasons.insert(ViolationReason::StartsWithDigit);
        }
        if identifier.contains(' ') {
            reasons.insert(ViolationReason::ContainsSpace);
        }
        if has_accent(identifier) {
            reasons.insert(ViolationReason::ContainsAccent);
        }
        if has_invalid_symbol(identifier) {
            reasons.insert(ViolationReason::ContainsInvalidSymbol);
        }
        if self.is_syntactically_valid(identifier) && self.is_poor_practice(identifier) {
            reasons.insert(ViolationReason::GenericOrUndescriptive);
        }
        reasons
    }

    pub fn assess(&self, identifier: &str) -> Assessment {
        Assessment {
            verdict: self.classify(identifier),
            reasons: self.violation_reasons(identifier),
        }
    }
}

/// `^[A-Za-z_][A-Za-z0-9_]*$`
fn matches_identifier_pattern(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// True when compatibility decomposition changes the text (accents, combining marks).
fn has_accent(identifier: &str) -> bool {
    !identifier.nfkd().eq(identifier.chars()) || identifier.chars().any(is_combining_mark)
}

/// Any Unicode number counts, so `٣base` and `²x` start with a digit too.
fn starts_with_digit(identifier: &str) -> bool {
    identifier.chars().next().is_some_and(char::is_numeric)
}

/// Anything outside `[A-Za-z0-9_ ]` once accents are stripped, so an accented
/// letter reports only as an accent. Space has its own reason.
fn has_invalid_symbol(identifier: &str) -> bool {
    identifier
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == ' '))
}

pub fn is_syntactically_valid(identifier: &str) -> bool {
    RuleSet::default().is_syntactically_valid(identifier)
}

pub fn is_poor_practice(identifier: &str) -> bool {
    RuleSet::default().is_poor_practice(identifier)
}

pub fn classify(identifier: &str) -> Verdict {
    RuleSet::default().classify(identifier)
}

pub fn violation_reasons(identifier: &str) -> BTreeSet<ViolationReason> {
    RuleSet::default().violation_reasons(identifier)
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verdict)?;
        if !self.reasons.is_empty() {
            let labels: Vec<String> = self.reasons.iter().map(ToString::to_string).collect();
            write!(f, " ({})", labels.join("; "))?;
        }
        Ok(())
    }
}
