//! Justification options offered to the learner and how they map onto violation reasons.

use std::collections::BTreeSet;

use crate::rules::{Verdict, ViolationReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::Display)]
pub enum JustificationOption {
    // Invalid branch
    #[strum(to_string = "Starts with a number")]
    StartsWithNumber,
    #[strum(to_string = "Has a space")]
    HasSpace,
    #[strum(to_string = "Has an accent (not ASCII)")]
    HasAccent,
    #[strum(to_string = "Has an invalid symbol/operator (+, -, *, /, %, etc.)")]
    HasInvalidSymbol,

    // Poor-practice branch
    #[strum(to_string = "Is generic (a single letter or an uninformative name)")]
    IsGeneric,
    #[strum(to_string = "Is a confusing abbreviation")]
    ConfusingAbbreviation,
    #[strum(to_string = "Does not describe what it stores")]
    DoesNotDescribeContent,
}

pub const INVALID_OPTIONS: [JustificationOption; 4] = [
    JustificationOption::StartsWithNumber,
    JustificationOption::HasSpace,
    JustificationOption::HasAccent,
    JustificationOption::HasInvalidSymbol,
];

pub const POOR_PRACTICE_OPTIONS: [JustificationOption; 3] = [
    JustificationOption::IsGeneric,
    JustificationOption::ConfusingAbbreviation,
    JustificationOption::DoesNotDescribeContent,
];

impl JustificationOption {
    /// Reasons this option stands for. May be empty.
    pub fn reasons(&self) -> &'static [ViolationReason] {
        use JustificationOption::*;
        match self {
            StartsWithNumber => &[ViolationReason::StartsWithDigit],
            HasSpace => &[ViolationReason::ContainsSpace],
            HasAccent => &[ViolationReason::ContainsAccent],
            HasInvalidSymbol => &[ViolationReason::ContainsInvalidSymbol],
            IsGeneric | DoesNotDescribeContent => &[ViolationReason::GenericOrUndescriptive],
            ConfusingAbbreviation => &[],
        }
    }
}

/// Options the learner may pick to justify `verdict`; empty for `Valid`.
pub fn options_for(verdict: Verdict) -> &'static [JustificationOption] {
    match verdict {
        Verdict::Valid => &[],
        Verdict::Invalid => &INVALID_OPTIONS,
        Verdict::ValidButPoorPractice => &POOR_PRACTICE_OPTIONS,
    }
}

/// Union of the reasons behind every selected option.
pub fn translate(selected: &BTreeSet<JustificationOption>) -> BTreeSet<ViolationReason> {
    selected
        .iter()
        .flat_map(|option| option.reasons().iter().copied())
        .collect()
}

/// Lenient check: one shared reason is enough, unselected true reasons are not penalised.
pub fn matches(
    selected: &BTreeSet<JustificationOption>,
    true_reasons: &BTreeSet<ViolationReason>,
) -> bool {
    !translate(selected).is_disjoint(true_reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::violation_reasons;
    use JustificationOption::*;

    fn pick(options: &[JustificationOption]) -> BTreeSet<JustificationOption> {
        options.iter().copied().collect()
    }

    #[test]
    fn test_empty_selection_never_matches() {
        assert!(!matches(&BTreeSet::new(), &violation_reasons("3base")));
        assert!(!matches(&BTreeSet::new(), &BTreeSet::new()));
    }

    #[test]
    fn test_single_correct_option_matches() {
        assert!(matches(&pick(&[StartsWithNumber]), &violation_reasons("3base")));
        assert!(matches(&pick(&[HasSpace]), &violation_reasons("altura principal")));
        assert!(matches(&pick(&[HasAccent]), &violation_reasons("triângulo")));
        assert!(matches(&pick(&[HasInvalidSymbol]), &violation_reasons("valor-total")));
    }

    #[test]
    fn test_wrong_option_does_not_match() {
        assert!(!matches(&pick(&[HasSpace]), &violation_reasons("3base")));
        assert!(!matches(&pick(&[HasAccent, HasInvalidSymbol]), &violation_reasons("2nota")));
    }

    #[test]
    fn test_partial_overlap_is_enough() {
        let reasons = violation_reasons("2 nota+");
        assert!(matches(&pick(&[HasSpace]), &reasons));
        assert!(matches(&pick(&[HasAccent, HasSpace]), &reasons));
    }

    #[test]
    fn test_poor_practice_options() {
        let reasons = violation_reasons("x");
        assert!(matches(&pick(&[IsGeneric]), &reasons));
        assert!(matches(&pick(&[DoesNotDescribeContent]), &reasons));
        assert!(!matches(&pick(&[ConfusingAbbreviation]), &reasons));
    }

    #[test]
    fn test_options_for_each_verdict() {
        assert!(options_for(Verdict::Valid).is_empty());
        assert_eq!(options_for(Verdict::Invalid), &INVALID_OPTIONS);
        assert_eq!(options_for(Verdict::ValidButPoorPractice), &POOR_PRACTICE_OPTIONS);
    }

    #[test]
    fn test_translate_unions_reasons() {
        let reasons = translate(&pick(&[IsGeneric, DoesNotDescribeContent, HasSpace]));
        assert_eq!(
            reasons,
            [ViolationReason::ContainsSpace, ViolationReason::GenericOrUndescriptive]
                .into_iter()
                .collect()
        );
    }
}
