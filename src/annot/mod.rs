pub mod abundance;
pub mod classify;
pub mod cohort;
pub mod filter;
pub mod network;
pub mod rules;

use std::collections::BTreeSet;

use crate::db::ProfileId;

/// One row of a per-organism hit table.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    pub organism: String,
    pub protein: String,
    pub profile: ProfileId,
    pub evalue: f64,
    pub score: f64,
    pub length: u64,
}

/// Profiles with at least one accepted hit in an organism.
pub type ConfirmedSet = BTreeSet<ProfileId>;

#[derive(Debug, Clone, PartialEq)]
pub struct OrganismHits {
    pub organism: String,
    pub confirmed: ConfirmedSet,
}

/// Per-row count and cohort fraction for a pathway, phenotype or function.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortAggregate {
    pub name: String,
    pub count: usize,
    pub coverage: f64,
}

pub fn confirmed_profiles(hits: &[HitRecord]) -> ConfirmedSet {
    hits.iter().map(|h| h.profile.clone()).collect()
}
