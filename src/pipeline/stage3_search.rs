use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::annot::filter::{FilterOutcome, HitFilter};
use crate::ctx::{Ctx, Organism};
use crate::io::hits::write_hits;
use crate::pipeline::Stage;
use crate::schema::v1::Failure;
use crate::search::{HmmSearch, HmmsearchCommand, read_proteins, run_isolated, sequence_index};

pub struct Stage3Search;

impl Stage3Search {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
pub struct SearchReport {
    pub hits_path: PathBuf,
    pub proteins: usize,
    pub raw_hits: usize,
    pub filtered: FilterOutcome,
}

impl Stage for Stage3Search {
    fn name(&self) -> &'static str {
        "stage3_search"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let db = ctx.database()?;
        let searcher: Arc<dyn HmmSearch> = match &ctx.searcher {
            Some(searcher) => Arc::clone(searcher),
            None => Arc::new(HmmsearchCommand::prepare(
                ctx.hmmsearch.clone(),
                db.library()?,
                &db.thresholds,
            )?),
        };
        let filter = HitFilter::new(&db.thresholds, ctx.cutoff).with_rules(&ctx.motif_rules);
        let hits_dir = ctx.output.hits_dir.clone();

        let outcomes = run_isolated(
            ctx.cores,
            &ctx.organisms,
            |org| org.id.clone(),
            |org| search_organism(org, searcher.as_ref(), &filter, &hits_dir),
        )?;

        let mut warnings = Vec::new();
        let mut failures = Vec::new();
        for (org, outcome) in ctx.organisms.iter_mut().zip(outcomes) {
            match outcome.result {
                Ok(report) => {
                    let f = &report.filtered;
                    info!(
                        organism = %org.id,
                        proteins = report.proteins,
                        raw_hits = report.raw_hits,
                        accepted = f.accepted.len(),
                        below_threshold = f.below_threshold,
                        motif_rejected = f.motif_rejected,
                        pair_rejected = f.pair_rejected,
                        "organism searched"
                    );
                    if !f.unknown_profiles.is_empty() {
                        let w = unknown_profile_warning(&org.id, f);
                        warn!("{}", w);
                        warnings.push(w);
                    }
                    org.hits = Some(report.hits_path);
                }
                Err(failure) => {
                    // A stale table from an earlier run must not re-enter the cohort.
                    if let Some(w) = remove_stale_hits(&hits_dir.join(format!("{}.tsv", org.id))) {
                        warn!("{}", w);
                        warnings.push(w);
                    }
                    failures.push(Failure {
                        organism: failure.organism,
                        cause: failure.cause,
                    });
                }
            }
        }

        info!(
            searched = ctx.organisms.len() - failures.len(),
            failed = failures.len(),
            "search finished"
        );
        ctx.warnings.extend(warnings);
        ctx.failures.extend(failures);
        Ok(())
    }
}

fn search_organism(
    org: &Organism,
    searcher: &dyn HmmSearch,
    filter: &HitFilter<'_>,
    hits_dir: &Path,
) -> Result<SearchReport> {
    let proteins = read_proteins(&org.source)?;
    let raw = searcher.search(&org.id, &proteins)?;
    let raw_hits = raw.len();
    let sequences = sequence_index(&proteins);
    let mut filtered = filter.filter(raw, Some(&sequences));
    filtered.accepted.sort_by(|a, b| {
        a.protein
            .cmp(&b.protein)
            .then_with(|| a.profile.cmp(&b.profile))
            .then_with(|| b.score.total_cmp(&a.score))
    });

    let hits_path = hits_dir.join(format!("{}.tsv", org.id));
    write_hits(&hits_path, &filtered.accepted)?;
    Ok(SearchReport {
        hits_path,
        proteins: proteins.len(),
        raw_hits,
        filtered,
    })
}

/// Deletes a hit table left by an earlier run. Returns a warning when the
/// file exists but cannot be removed.
fn remove_stale_hits(path: &Path) -> Option<String> {
    match std::fs::remove_file(path) {
        Ok(()) => None,
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => Some(format!(
            "stale hit table {} could not be removed: {}",
            path.display(),
            err
        )),
    }
}

pub fn unknown_profile_warning(organism: &str, outcome: &FilterOutcome) -> String {
    let names: Vec<&str> = outcome.unknown_profiles.iter().map(|p| p.as_str()).collect();
    format!(
        "{}: hits on {} profiles without a threshold dropped: {}",
        organism,
        names.len(),
        names.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stale_table_is_removed_silently() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("org1.tsv");
        std::fs::write(&path, "stale").unwrap();
        assert_eq!(remove_stale_hits(&path), None);
        assert!(!path.exists());
        assert_eq!(remove_stale_hits(&path), None);
    }

    #[test]
    fn unremovable_table_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("org1.tsv");
        std::fs::create_dir(&path).unwrap();
        let warning = remove_stale_hits(&path).unwrap();
        assert!(warning.contains("could not be removed"));
        assert!(path.exists());
    }
}
