use anyhow::Result;
use tracing::{info, warn};

use crate::annot::OrganismHits;
use crate::annot::filter::HitFilter;
use crate::ctx::Ctx;
use crate::io::hits::read_hits;
use crate::pipeline::Stage;
use crate::pipeline::stage3_search::unknown_profile_warning;
use crate::schema::v1::Failure;

/// Barrier: the cohort is rebuilt from hit tables on disk, never from worker
/// memory.
pub struct Stage4Hits;

impl Stage4Hits {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Hits {
    fn name(&self) -> &'static str {
        "stage4_hits"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let db = ctx.database()?;
        let filter = HitFilter::new(&db.thresholds, ctx.cutoff).with_rules(&ctx.motif_rules);

        let mut cohort = Vec::new();
        let mut warnings = Vec::new();
        let mut failures = Vec::new();
        for org in &ctx.organisms {
            let Some(path) = &org.hits else {
                continue;
            };
            let hits = match read_hits(path, &org.id) {
                Ok(hits) => hits,
                Err(err) => {
                    let cause = format!("{:#}", err);
                    warn!(organism = %org.id, cause = %cause, "hit table unreadable, organism excluded");
                    warnings.push(format!("{}: hit table unreadable: {}", org.id, cause));
                    failures.push(Failure {
                        organism: org.id.clone(),
                        cause,
                    });
                    continue;
                }
            };
            let outcome = filter.filter(hits, None);
            if !outcome.unknown_profiles.is_empty() {
                let w = unknown_profile_warning(&org.id, &outcome);
                warn!("{}", w);
                warnings.push(w);
            }
            let confirmed = outcome.confirmed();
            info!(
                organism = %org.id,
                accepted = outcome.accepted.len(),
                confirmed = confirmed.len(),
                "hits loaded"
            );
            cohort.push(OrganismHits {
                organism: org.id.clone(),
                confirmed,
            });
        }

        info!(cohort = cohort.len(), "cohort assembled");
        ctx.cohort = cohort;
        ctx.warnings.extend(warnings);
        ctx.failures.extend(failures);
        Ok(())
    }
}
