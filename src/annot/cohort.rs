//! Cross-Organism Aggregator.

use crate::annot::classify::{Completeness, function_completeness};
use crate::annot::rules::evaluate_rule;
use crate::annot::{CohortAggregate, OrganismHits};
use crate::db::{FunctionDef, RuleTable};

/// Organisms x rules, 0/1. Rows keep cohort order, columns are sorted by name.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceMatrix {
    pub organisms: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<bool>>,
}

impl PresenceMatrix {
    pub fn is_present(&self, organism: usize, column: usize) -> bool {
        self.values[organism][column]
    }

    pub fn row(&self, organism: &str) -> Option<&[bool]> {
        self.organisms
            .iter()
            .position(|o| o == organism)
            .map(|i| self.values[i].as_slice())
    }

    pub fn totals(&self) -> Vec<CohortAggregate> {
        let total = self.organisms.len();
        self.columns
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let count = self.values.iter().filter(|row| row[j]).count();
                CohortAggregate {
                    name: name.clone(),
                    count,
                    coverage: coverage(count, total),
                }
            })
            .collect()
    }
}

/// Functions x organisms. Rows are sorted by function name.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessMatrix {
    pub functions: Vec<String>,
    pub organisms: Vec<String>,
    pub values: Vec<Vec<Completeness>>,
}

impl CompletenessMatrix {
    /// Fraction of organisms carrying every profile of the function.
    pub fn occurrence(&self) -> Vec<CohortAggregate> {
        let total = self.organisms.len();
        self.functions
            .iter()
            .zip(&self.values)
            .map(|(name, row)| {
                let count = row.iter().filter(|c| c.is_complete()).count();
                CohortAggregate {
                    name: name.clone(),
                    count,
                    coverage: coverage(count, total),
                }
            })
            .collect()
    }
}

/// `count / total`, or 0 for an empty cohort.
pub fn coverage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

pub fn presence_matrix(cohort: &[OrganismHits], table: &RuleTable) -> PresenceMatrix {
    let defs = table.sorted();
    let values = cohort
        .iter()
        .map(|org| {
            defs.iter()
                .map(|def| evaluate_rule(def, &org.confirmed))
                .collect()
        })
        .collect();
    PresenceMatrix {
        organisms: cohort.iter().map(|o| o.organism.clone()).collect(),
        columns: defs.iter().map(|d| d.name.clone()).collect(),
        values,
    }
}

pub fn completeness_matrix(cohort: &[OrganismHits], functions: &[FunctionDef]) -> CompletenessMatrix {
    let mut defs: Vec<&FunctionDef> = functions.iter().collect();
    defs.sort_by(|a, b| a.name.cmp(&b.name));
    let values = defs
        .iter()
        .map(|def| {
            cohort
                .iter()
                .map(|org| function_completeness(def, &org.confirmed))
                .collect()
        })
        .collect();
    CompletenessMatrix {
        functions: defs.iter().map(|d| d.name.clone()).collect(),
        organisms: cohort.iter().map(|o| o.organism.clone()).collect(),
        values,
    }
}
