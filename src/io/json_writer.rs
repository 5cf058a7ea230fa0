use std::path::Path;

use anyhow::Result;

use crate::annot::network::CycleGraph;
use crate::ctx::Ctx;
use crate::db::{HMM_TABLE_FILE, NETWORK_FILE, PATHWAY_FILE, PHENOTYPE_FILE};
use crate::io::write_json;
use crate::schema::v1::{DatabaseInfo, OrganismCounts, RunMetadataV1};

pub fn write_node_link(path: &Path, graph: &CycleGraph) -> Result<()> {
    write_json(path, graph)
}

pub fn build_report(ctx: &Ctx) -> Result<RunMetadataV1> {
    let db = ctx.database()?;
    let mut report = ctx.report.clone();

    report.database = DatabaseInfo {
        hmm_table: db.root.join(HMM_TABLE_FILE).display().to_string(),
        pathway_source: if db.root.join(PATHWAY_FILE).is_file() {
            db.root.join(PATHWAY_FILE).display().to_string()
        } else {
            db.root.join(NETWORK_FILE).display().to_string()
        },
        phenotypes: db
            .phenotypes
            .as_ref()
            .map(|_| db.root.join(PHENOTYPE_FILE).display().to_string()),
        network: db
            .network
            .as_ref()
            .map(|_| db.root.join(NETWORK_FILE).display().to_string()),
        profile_library: db.library.as_ref().map(|l| l.path().display().to_string()),
        profiles: db.thresholds.len(),
        functions: db.functions.len(),
        pathways: db.pathways.len(),
        phenotype_rules: db.phenotypes.as_ref().map_or(0, |t| t.len()),
    };
    report.organisms = OrganismCounts {
        input: ctx.organisms.len(),
        processed: ctx.cohort.len(),
        failed: ctx.failures.len(),
    };
    report.failures = ctx.failures.clone();
    report.warnings = ctx.warnings.clone();
    report.duration_s = ctx.started.elapsed().as_secs_f64();
    Ok(report)
}
