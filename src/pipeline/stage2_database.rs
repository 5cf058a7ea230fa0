use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::db::{MotifRules, ThresholdTable, load_database, load_motif_pair_rules, load_motif_rules};
use crate::pipeline::Stage;

pub struct Stage2Database;

impl Stage2Database {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Database {
    fn name(&self) -> &'static str {
        "stage2_database"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let db = load_database(&ctx.database_path)?;
        info!(
            database = %db.root.display(),
            profiles = db.thresholds.len(),
            functions = db.functions.len(),
            pathways = db.pathways.len(),
            phenotypes = db.phenotypes.as_ref().map_or(0, |t| t.len()),
            network = db.network.is_some(),
            "database loaded"
        );

        let mut rules = MotifRules::default();
        if let Some(path) = &ctx.motif_path {
            rules.motifs = load_motif_rules(path)?;
        }
        if let Some(path) = &ctx.motif_pair_path {
            rules.pairs = load_motif_pair_rules(path)?;
        }
        let warnings = retain_known_profiles(&mut rules, &db.thresholds);
        for w in &warnings {
            warn!("{}", w);
        }
        if !rules.is_empty() {
            info!(
                motifs = rules.motifs.len(),
                pairs = rules.pairs.len(),
                "motif rules loaded"
            );
        }

        ctx.warnings.extend(db.warnings.iter().cloned());
        ctx.warnings.extend(warnings);
        ctx.motif_rules = rules;
        ctx.database = Some(db);
        Ok(())
    }
}

/// Drops rules naming profiles absent from the threshold table.
pub fn retain_known_profiles(rules: &mut MotifRules, thresholds: &ThresholdTable) -> Vec<String> {
    let mut warnings = Vec::new();
    rules.motifs.retain(|profile, _| {
        let known = thresholds.contains(profile);
        if !known {
            warnings.push(format!("motif rule for unknown profile '{}' ignored", profile));
        }
        known
    });
    rules.pairs.retain(|(a, b)| {
        let known = thresholds.contains(a) && thresholds.contains(b);
        if !known {
            warnings.push(format!("motif pair '{}'/'{}' names an unknown profile, ignored", a, b));
        }
        known
    });
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profiles_are_ignored() {
        let mut thresholds = ThresholdTable::new();
        thresholds.insert("a.hmm".to_string(), 1.0);
        thresholds.insert("b.hmm".to_string(), 1.0);
        let mut rules = MotifRules::default();
        rules.motifs.insert("a.hmm".to_string(), vec!["CXXC".to_string()]);
        rules.motifs.insert("z.hmm".to_string(), vec!["CXXC".to_string()]);
        rules.pairs.push(("a.hmm".to_string(), "b.hmm".to_string()));
        rules.pairs.push(("a.hmm".to_string(), "z.hmm".to_string()));
        let warnings = retain_known_profiles(&mut rules, &thresholds);
        assert_eq!(warnings.len(), 2);
        assert_eq!(rules.motifs.len(), 1);
        assert_eq!(rules.pairs.len(), 1);
    }
}
