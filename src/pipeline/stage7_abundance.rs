use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::annot::abundance::{
    pathway_occurrence_per_sample, unit_weights, weighted_function_abundance,
    weighted_pathway_abundance,
};
use crate::ctx::{AbundanceResult, Ctx};
use crate::io::tables::{read_abundance_table, read_taxon_map};
use crate::pipeline::Stage;

pub struct Stage7Abundance;

impl Stage7Abundance {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage7Abundance {
    fn name(&self) -> &'static str {
        "stage7_abundance"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let Some(path) = &ctx.abundance_path else {
            info!("no abundance table, skipping");
            return Ok(());
        };
        let table = read_abundance_table(path)?;
        let mut warnings = Vec::new();

        let taxa = match &ctx.taxon_map_path {
            Some(map_path) => {
                let (map, map_warnings) = read_taxon_map(map_path)?;
                warnings.extend(map_warnings);
                Some(map)
            }
            None => None,
        };
        let weights = unit_weights(&table, taxa.as_ref());
        if !weights.unmapped.is_empty() {
            warnings.push(format!(
                "{} observations absent from the taxon map were ignored: {}",
                weights.unmapped.len(),
                weights.unmapped.join(",")
            ));
        }
        let cohort_ids: Vec<String> = ctx.cohort.iter().map(|o| o.organism.clone()).collect();
        let unmatched = weights.unmatched(&cohort_ids);
        if !unmatched.is_empty() {
            warnings.push(format!(
                "{} abundance units match no organism of the cohort: {}",
                unmatched.len(),
                unmatched.join(",")
            ));
        }

        let presence = ctx
            .pathway_presence
            .as_ref()
            .context("pathway presence missing")?;
        let completeness = ctx
            .completeness
            .as_ref()
            .context("function completeness missing")?;
        let pathways = weighted_pathway_abundance(&weights, presence);
        let functions = weighted_function_abundance(&weights, completeness);
        let occurrence = pathway_occurrence_per_sample(&weights, presence);

        let measures = match &ctx.measure_path {
            Some(p) => Some(read_abundance_table(p).context("invalid measurement file")?),
            None => None,
        };

        for w in &warnings {
            warn!("{}", w);
        }
        info!(
            samples = weights.samples.len(),
            units = weights.units.len(),
            relative = weights.relative,
            measures = measures.as_ref().map_or(0, |m| m.rows.len()),
            "abundance aggregated"
        );

        ctx.abundance = Some(AbundanceResult {
            weights,
            pathways,
            functions,
            occurrence,
            measures,
        });
        ctx.warnings.extend(warnings);
        Ok(())
    }
}
