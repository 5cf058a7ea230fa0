//! Gene/Function Classifier.

use std::collections::BTreeSet;
use std::fmt;

use crate::annot::ConfirmedSet;
use crate::db::FunctionDef;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Completeness {
    /// No defined profile of the function is confirmed.
    NotApplicable,
    /// Fraction of distinct defined profiles confirmed, in (0, 1].
    Ratio(f64),
}

impl Completeness {
    pub fn ratio(&self) -> Option<f64> {
        match self {
            Self::NotApplicable => None,
            Self::Ratio(r) => Some(*r),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Ratio(_))
    }

    /// Every defined profile confirmed. Partial support does not count as
    /// carrying the function in occurrence or abundance tables.
    pub fn is_complete(&self) -> bool {
        self.ratio() == Some(1.0)
    }
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => write!(f, "NA"),
            Self::Ratio(r) => write!(f, "{:.6}", r),
        }
    }
}

/// Each defined profile counts once, however many proteins hit it.
pub fn function_completeness(def: &FunctionDef, confirmed: &ConfirmedSet) -> Completeness {
    let defined: BTreeSet<&str> = def.profiles.iter().map(|p| p.as_str()).collect();
    if defined.is_empty() {
        return Completeness::NotApplicable;
    }
    let found = defined.iter().filter(|p| confirmed.contains(**p)).count();
    if found == 0 {
        Completeness::NotApplicable
    } else {
        Completeness::Ratio(found as f64 / defined.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(profiles: &[&str]) -> FunctionDef {
        FunctionDef {
            name: "f".to_string(),
            category: None,
            profiles: profiles.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn set(profiles: &[&str]) -> ConfirmedSet {
        profiles.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn partial_and_full_support() {
        let d = def(&["A", "B", "C", "D"]);
        assert_eq!(function_completeness(&d, &set(&["A", "Z"])), Completeness::Ratio(0.25));
        assert_eq!(
            function_completeness(&d, &set(&["A", "B", "C", "D"])),
            Completeness::Ratio(1.0)
        );
    }

    #[test]
    fn only_full_support_is_complete() {
        let d = def(&["A", "B"]);
        assert!(!function_completeness(&d, &set(&["A"])).is_complete());
        assert!(function_completeness(&d, &set(&["A", "B"])).is_complete());
        assert!(!Completeness::NotApplicable.is_complete());
    }

    #[test]
    fn zero_support_is_not_applicable() {
        let d = def(&["A", "B"]);
        let c = function_completeness(&d, &set(&["C"]));
        assert_eq!(c, Completeness::NotApplicable);
        assert_eq!(c.to_string(), "NA");
        assert_eq!(function_completeness(&def(&[]), &set(&["A"])), Completeness::NotApplicable);
    }

    #[test]
    fn duplicated_profiles_counted_once() {
        let d = def(&["A", "A", "B"]);
        assert_eq!(function_completeness(&d, &set(&["A"])), Completeness::Ratio(0.5));
    }
}
