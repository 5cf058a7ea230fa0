use anyhow::Result;
use tracing::info;

use crate::annot::cohort::presence_matrix;
use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage6Pathways;

impl Stage6Pathways {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6Pathways {
    fn name(&self) -> &'static str {
        "stage6_pathways"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let db = ctx.database()?;
        let pathways = presence_matrix(&ctx.cohort, &db.pathways);
        let totals = pathways.totals();
        let phenotypes = db
            .phenotypes
            .as_ref()
            .map(|table| presence_matrix(&ctx.cohort, table));

        info!(
            pathways = totals.len(),
            found = totals.iter().filter(|t| t.count > 0).count(),
            organisms = pathways.organisms.len(),
            phenotypes = phenotypes.as_ref().map_or(0, |p| p.columns.len()),
            "pathways evaluated"
        );

        ctx.pathway_totals = totals;
        ctx.pathway_presence = Some(pathways);
        ctx.phenotype_presence = phenotypes;
        Ok(())
    }
}
