//! Hit Filter: turns raw search hits into accepted hits and a confirmed profile set.

use std::collections::{BTreeSet, HashMap};

use crate::annot::{ConfirmedSet, HitRecord, confirmed_profiles};
use crate::db::{MotifRules, ProfileId, ThresholdTable};

/// Canonical e-value ceiling applied on top of per-profile score thresholds.
pub const DEFAULT_MAX_EVALUE: f64 = 1e-5;
/// E-value ceiling of the score-free legacy regime.
pub const LEGACY_MAX_EVALUE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutoffMode {
    /// `score >= threshold(profile)` and, when set, `evalue < max_evalue`.
    ProfileScore { max_evalue: Option<f64> },
    /// `evalue < max_evalue`, thresholds ignored.
    GlobalEvalue { max_evalue: f64 },
}

impl Default for CutoffMode {
    fn default() -> Self {
        Self::ProfileScore {
            max_evalue: Some(DEFAULT_MAX_EVALUE),
        }
    }
}

impl CutoffMode {
    pub fn label(&self) -> String {
        match self {
            Self::ProfileScore { max_evalue: Some(e) } => format!("profile_score+evalue<{:e}", e),
            Self::ProfileScore { max_evalue: None } => "profile_score".to_string(),
            Self::GlobalEvalue { max_evalue } => format!("evalue<{:e}", max_evalue),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Below,
    UnknownProfile,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub accepted: Vec<HitRecord>,
    pub unknown_profiles: BTreeSet<ProfileId>,
    pub below_threshold: usize,
    pub motif_rejected: usize,
    pub pair_rejected: usize,
}

impl FilterOutcome {
    pub fn confirmed(&self) -> ConfirmedSet {
        confirmed_profiles(&self.accepted)
    }
}

pub struct HitFilter<'a> {
    thresholds: &'a ThresholdTable,
    mode: CutoffMode,
    rules: Option<&'a MotifRules>,
}

impl<'a> HitFilter<'a> {
    pub fn new(thresholds: &'a ThresholdTable, mode: CutoffMode) -> Self {
        Self {
            thresholds,
            mode,
            rules: None,
        }
    }

    pub fn with_rules(mut self, rules: &'a MotifRules) -> Self {
        if !rules.is_empty() {
            self.rules = Some(rules);
        }
        self
    }

    pub fn verdict(&self, hit: &HitRecord) -> Verdict {
        let Some(threshold) = self.thresholds.get(&hit.profile) else {
            return Verdict::UnknownProfile;
        };
        let pass = match self.mode {
            CutoffMode::ProfileScore { max_evalue } => {
                hit.score >= threshold && max_evalue.is_none_or(|max| hit.evalue < max)
            }
            CutoffMode::GlobalEvalue { max_evalue } => hit.evalue < max_evalue,
        };
        if pass { Verdict::Pass } else { Verdict::Below }
    }

    /// Applies thresholds, then motif rules (only when `sequences` is given),
    /// then motif-pair arbitration. Input order of accepted hits is preserved.
    pub fn filter(
        &self,
        hits: Vec<HitRecord>,
        sequences: Option<&HashMap<String, Vec<u8>>>,
    ) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for hit in hits {
            match self.verdict(&hit) {
                Verdict::Pass => {}
                Verdict::Below => {
                    outcome.below_threshold += 1;
                    continue;
                }
                Verdict::UnknownProfile => {
                    outcome.unknown_profiles.insert(hit.profile.clone());
                    continue;
                }
            }
            if let (Some(rules), Some(seqs)) = (self.rules, sequences) {
                if let Some(patterns) = rules.motifs.get(&hit.profile) {
                    let carried = seqs
                        .get(&hit.protein)
                        .is_some_and(|seq| patterns.iter().any(|p| motif_matches(seq, p.as_bytes())));
                    if !carried {
                        outcome.motif_rejected += 1;
                        continue;
                    }
                }
            }
            outcome.accepted.push(hit);
        }

        if let Some(rules) = self.rules {
            if !rules.pairs.is_empty() {
                let before = outcome.accepted.len();
                outcome.accepted = arbitrate_pairs(outcome.accepted, &rules.pairs);
                outcome.pair_rejected = before - outcome.accepted.len();
            }
        }

        outcome
    }
}

/// For every protein passing both profiles of a pair, drops the hits of the
/// lower-scoring profile on that protein. Ties keep the first profile.
fn arbitrate_pairs(hits: Vec<HitRecord>, pairs: &[(ProfileId, ProfileId)]) -> Vec<HitRecord> {
    let mut best: HashMap<(&str, &str), f64> = HashMap::new();
    for hit in &hits {
        let entry = best
            .entry((hit.protein.as_str(), hit.profile.as_str()))
            .or_insert(f64::NEG_INFINITY);
        if hit.score > *entry {
            *entry = hit.score;
        }
    }

    let mut dropped: BTreeSet<(String, ProfileId)> = BTreeSet::new();
    let proteins: BTreeSet<&str> = hits.iter().map(|h| h.protein.as_str()).collect();
    for protein in proteins {
        for (a, b) in pairs {
            let (Some(sa), Some(sb)) = (
                best.get(&(protein, a.as_str())),
                best.get(&(protein, b.as_str())),
            ) else {
                continue;
            };
            let loser = if sa >= sb { b } else { a };
            dropped.insert((protein.to_string(), loser.clone()));
        }
    }

    if dropped.is_empty() {
        return hits;
    }
    hits.into_iter()
        .filter(|h| !dropped.contains(&(h.protein.clone(), h.profile.clone())))
        .collect()
}

/// Case-insensitive substring match where `X` in the pattern matches any residue.
pub fn motif_matches(seq: &[u8], pattern: &[u8]) -> bool {
    if pattern.is_empty() {
        return true;
    }
    if pattern.len() > seq.len() {
        return false;
    }
    seq.windows(pattern.len()).any(|w| {
        w.iter().zip(pattern).all(|(&r, &p)| {
            let p = p.to_ascii_uppercase();
            p == b'X' || r.to_ascii_uppercase() == p
        })
    })
}
