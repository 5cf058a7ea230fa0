//! Pathway Rule Evaluator.
//!
//! A combination holds when at least one of its required profiles is
//! confirmed and none of its excluded profiles is. Exclusions alone never
//! satisfy a combination. A rule holds when all of its combinations hold, so a
//! rule without combinations is vacuously satisfied.

use std::collections::BTreeMap;

use crate::annot::ConfirmedSet;
use crate::db::{Combination, RuleDef, RuleTable};

pub fn evaluate_combination(combination: &Combination, confirmed: &ConfirmedSet) -> bool {
    let supported = combination.required().any(|p| confirmed.contains(p));
    supported && !combination.excluded().any(|p| confirmed.contains(p))
}

pub fn evaluate_rule(def: &RuleDef, confirmed: &ConfirmedSet) -> bool {
    def.combinations
        .iter()
        .all(|c| evaluate_combination(c, confirmed))
}

/// Presence of every rule of `table`, keyed by rule name.
pub fn evaluate_all(table: &RuleTable, confirmed: &ConfirmedSet) -> BTreeMap<String, bool> {
    table
        .defs
        .iter()
        .map(|def| (def.name.clone(), evaluate_rule(def, confirmed)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::parse_combination_spec;

    fn rule(spec: &str) -> RuleDef {
        RuleDef {
            name: "P".to_string(),
            combinations: parse_combination_spec(spec).unwrap(),
        }
    }

    fn set(profiles: &[&str]) -> ConfirmedSet {
        profiles.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn exclusion_turns_rule_off() {
        let r = rule("A; B, NO|C");
        assert!(evaluate_rule(&r, &set(&["A", "B"])));
        assert!(!evaluate_rule(&r, &set(&["A", "B", "C"])));
    }

    #[test]
    fn or_within_and_across() {
        let r = rule("A, B; C");
        assert!(evaluate_rule(&r, &set(&["B", "C"])));
        assert!(!evaluate_rule(&r, &set(&["A", "B"])));
    }

    #[test]
    fn exclusions_alone_never_satisfy() {
        let r = rule("NO|C");
        assert!(!evaluate_rule(&r, &set(&[])));
        assert!(!evaluate_rule(&r, &set(&["A"])));
    }

    #[test]
    fn empty_rule_is_vacuously_true() {
        let r = rule("");
        assert!(evaluate_rule(&r, &set(&[])));
    }

    #[test]
    fn unknown_profile_is_never_confirmed() {
        let r = rule("ghost.hmm");
        assert!(!evaluate_rule(&r, &set(&["A"])));
    }

    #[test]
    fn monotone_without_exclusions() {
        let r = rule("A, B; C, D; E");
        let universe = ["A", "B", "C", "D", "E", "F"];
        for mask in 0u32..(1 << universe.len()) {
            let base: Vec<&str> = universe
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, p)| *p)
                .collect();
            if !evaluate_rule(&r, &set(&base)) {
                continue;
            }
            for extra in universe {
                let mut grown = set(&base);
                grown.insert(extra.to_string());
                assert!(evaluate_rule(&r, &grown));
            }
        }
    }
}
