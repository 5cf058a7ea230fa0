//! Abundance Aggregator.
//!
//! Sample abundances are first turned into per-unit weights. A unit is an
//! organism, or a taxon when observations are grouped through a taxon map.
//! Weighted abundance of a pathway (or function) in a sample is the sum of the
//! weights of the units that carry it.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, bail};

use crate::annot::cohort::{CompletenessMatrix, PresenceMatrix};

/// Observation x sample table of non-negative values.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceTable {
    pub samples: Vec<String>,
    pub rows: Vec<(String, Vec<f64>)>,
}

impl AbundanceTable {
    /// Checks row widths, value ranges and duplicate observations.
    pub fn new(samples: Vec<String>, rows: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if samples.is_empty() {
            bail!("abundance table has no sample column");
        }
        let mut seen = BTreeSet::new();
        for (name, values) in &rows {
            if !seen.insert(name.as_str()) {
                bail!("observation '{}' appears more than once", name);
            }
            if values.len() != samples.len() {
                bail!(
                    "observation '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    samples.len()
                );
            }
            if let Some(v) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
                bail!("observation '{}' has invalid abundance {}", name, v);
            }
        }
        Ok(Self { samples, rows })
    }

    pub fn sample_totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.samples.len()];
        for (_, values) in &self.rows {
            for (t, v) in totals.iter_mut().zip(values) {
                *t += v;
            }
        }
        totals
    }

    pub fn get(&self, observation: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .find(|(name, _)| name == observation)
            .map(|(_, v)| v.as_slice())
    }
}

/// observation name -> taxon id (an organism id of the cohort).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonMap {
    groups: BTreeMap<String, String>,
}

impl TaxonMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the observation was already mapped; the first mapping is kept.
    pub fn insert(&mut self, observation: String, taxon: String) -> bool {
        if self.groups.contains_key(&observation) {
            return false;
        }
        self.groups.insert(observation, taxon);
        true
    }

    pub fn taxon_of(&self, observation: &str) -> Option<&str> {
        self.groups.get(observation).map(|t| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Per-unit weight in every sample, plus the sample totals they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWeights {
    pub samples: Vec<String>,
    pub totals: Vec<f64>,
    pub units: BTreeMap<String, Vec<f64>>,
    /// True when weights are relative abundances (taxon grouping).
    pub relative: bool,
    /// Observations left out because the taxon map does not name them.
    pub unmapped: Vec<String>,
}

impl SampleWeights {
    pub fn weight(&self, unit: &str, sample: usize) -> f64 {
        self.units.get(unit).map_or(0.0, |w| w[sample])
    }

    /// Units with weight in the table but absent from `organisms`.
    pub fn unmatched<'a>(&'a self, organisms: &[String]) -> Vec<&'a str> {
        self.units
            .keys()
            .filter(|u| !organisms.contains(u))
            .map(|u| u.as_str())
            .collect()
    }
}

pub fn unit_weights(table: &AbundanceTable, taxa: Option<&TaxonMap>) -> SampleWeights {
    let totals = table.sample_totals();
    let Some(taxa) = taxa else {
        return SampleWeights {
            samples: table.samples.clone(),
            totals,
            units: table.rows.iter().cloned().collect(),
            relative: false,
            unmapped: Vec::new(),
        };
    };

    let mut units: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut unmapped = Vec::new();
    for (observation, values) in &table.rows {
        let Some(taxon) = taxa.taxon_of(observation) else {
            unmapped.push(observation.clone());
            continue;
        };
        let sums = units
            .entry(taxon.to_string())
            .or_insert_with(|| vec![0.0; values.len()]);
        for (s, v) in sums.iter_mut().zip(values) {
            *s += v;
        }
    }
    for sums in units.values_mut() {
        for (s, total) in sums.iter_mut().zip(&totals) {
            *s = if *total > 0.0 { *s / total } else { 0.0 };
        }
    }

    SampleWeights {
        samples: table.samples.clone(),
        totals,
        units,
        relative: true,
        unmapped,
    }
}

/// Rows (pathways or functions) x samples.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedMatrix {
    pub rows: Vec<String>,
    pub samples: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl WeightedMatrix {
    pub fn row(&self, name: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .position(|r| r == name)
            .map(|i| self.values[i].as_slice())
    }
}

pub fn weighted_pathway_abundance(weights: &SampleWeights, presence: &PresenceMatrix) -> WeightedMatrix {
    let values = (0..presence.columns.len())
        .map(|j| {
            (0..weights.samples.len())
                .map(|s| {
                    presence
                        .organisms
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| presence.is_present(*i, j))
                        .map(|(_, org)| weights.weight(org, s))
                        .sum::<f64>()
                })
                .collect()
        })
        .collect();
    WeightedMatrix {
        rows: presence.columns.clone(),
        samples: weights.samples.clone(),
        values,
    }
}

/// A unit carries a function only when every profile of it is confirmed.
pub fn weighted_function_abundance(
    weights: &SampleWeights,
    completeness: &CompletenessMatrix,
) -> WeightedMatrix {
    let values = completeness
        .values
        .iter()
        .map(|row| {
            (0..weights.samples.len())
                .map(|s| {
                    completeness
                        .organisms
                        .iter()
                        .zip(row)
                        .filter(|(_, c)| c.is_complete())
                        .map(|(org, _)| weights.weight(org, s))
                        .sum::<f64>()
                })
                .collect()
        })
        .collect();
    WeightedMatrix {
        rows: completeness.functions.clone(),
        samples: weights.samples.clone(),
        values,
    }
}

/// Per sample, the fraction of cohort units present in the sample (weight > 0)
/// that satisfy each pathway. 0 when no unit is present.
pub fn pathway_occurrence_per_sample(
    weights: &SampleWeights,
    presence: &PresenceMatrix,
) -> WeightedMatrix {
    let present: Vec<Vec<usize>> = (0..weights.samples.len())
        .map(|s| {
            presence
                .organisms
                .iter()
                .enumerate()
                .filter(|(_, org)| weights.weight(org, s) > 0.0)
                .map(|(i, _)| i)
                .collect()
        })
        .collect();
    let values = (0..presence.columns.len())
        .map(|j| {
            present
                .iter()
                .map(|orgs| {
                    if orgs.is_empty() {
                        return 0.0;
                    }
                    let count = orgs.iter().filter(|&&i| presence.is_present(i, j)).count();
                    count as f64 / orgs.len() as f64
                })
                .collect()
        })
        .collect();
    WeightedMatrix {
        rows: presence.columns.clone(),
        samples: weights.samples.clone(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(organisms: &[&str], column: &[bool]) -> PresenceMatrix {
        PresenceMatrix {
            organisms: organisms.iter().map(|o| o.to_string()).collect(),
            columns: vec!["X".to_string()],
            values: column.iter().map(|v| vec![*v]).collect(),
        }
    }

    fn table(rows: &[(&str, &[f64])]) -> AbundanceTable {
        AbundanceTable::new(
            vec!["S".to_string()],
            rows.iter().map(|(n, v)| (n.to_string(), v.to_vec())).collect(),
        )
        .unwrap()
    }

    #[test]
    fn raw_sums_of_satisfying_organisms() {
        let t = table(&[("org1", &[100.0]), ("org2", &[0.0]), ("org3", &[300.0])]);
        let weights = unit_weights(&t, None);
        let p = presence(&["org1", "org2", "org3"], &[true, false, true]);
        let m = weighted_pathway_abundance(&weights, &p);
        assert_eq!(m.values[0][0], 400.0);
        assert!(m.values[0][0] <= weights.totals[0]);
    }

    #[test]
    fn no_satisfying_organism_gives_zero() {
        let t = table(&[("org1", &[5.0])]);
        let weights = unit_weights(&t, None);
        let m = weighted_pathway_abundance(&weights, &presence(&["org1"], &[false]));
        assert_eq!(m.values[0][0], 0.0);
    }

    #[test]
    fn taxon_grouping_gives_relative_abundance() {
        let t = table(&[("asv1", &[100.0]), ("asv2", &[100.0]), ("asv3", &[0.0])]);
        let mut taxa = TaxonMap::new();
        taxa.insert("asv1".to_string(), "tax_a".to_string());
        taxa.insert("asv2".to_string(), "tax_b".to_string());
        taxa.insert("asv3".to_string(), "tax_b".to_string());
        let weights = unit_weights(&t, Some(&taxa));
        assert_eq!(weights.weight("tax_a", 0), 0.5);
        assert_eq!(weights.weight("tax_b", 0), 0.5);

        let p = presence(&["tax_a", "tax_b"], &[true, true]);
        let m = weighted_pathway_abundance(&weights, &p);
        assert!((m.values[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn occurrence_counts_only_present_units() {
        let t = table(&[("org1", &[10.0]), ("org2", &[0.0]), ("org3", &[10.0])]);
        let weights = unit_weights(&t, None);
        let p = presence(&["org1", "org2", "org3"], &[true, true, false]);
        let m = pathway_occurrence_per_sample(&weights, &p);
        assert_eq!(m.values[0][0], 0.5);
    }

    #[test]
    fn half_complete_function_carries_no_abundance() {
        use crate::annot::classify::Completeness;

        let t = table(&[("org1", &[10.0]), ("org2", &[30.0])]);
        let weights = unit_weights(&t, None);
        let completeness = CompletenessMatrix {
            functions: vec!["Nitrite reduction nirK".to_string()],
            organisms: vec!["org1".to_string(), "org2".to_string()],
            values: vec![vec![Completeness::Ratio(0.5), Completeness::Ratio(1.0)]],
        };
        let m = weighted_function_abundance(&weights, &completeness);
        assert_eq!(m.values[0][0], 30.0);
        assert_eq!(completeness.occurrence()[0].count, 1);
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let samples = vec!["S".to_string()];
        assert!(AbundanceTable::new(samples.clone(), vec![("a".to_string(), vec![-1.0])]).is_err());
        assert!(
            AbundanceTable::new(
                samples.clone(),
                vec![("a".to_string(), vec![1.0]), ("a".to_string(), vec![2.0])]
            )
            .is_err()
        );
        assert!(AbundanceTable::new(samples, vec![("a".to_string(), vec![1.0, 2.0])]).is_err());
    }
}
