use anyhow::Result;
use tracing::{info, warn};

use crate::annot::network::{annotate_abundance, bipartite_graph, coverage_graph, missing_pathways};
use crate::ctx::{CycleGraphs, Ctx};
use crate::pipeline::Stage;

pub struct Stage8Network;

impl Stage8Network {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage8Network {
    fn name(&self) -> &'static str {
        "stage8_network"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let db = ctx.database()?;
        let Some(network) = &db.network else {
            info!("database has no cycle network, skipping");
            return Ok(());
        };

        let missing = missing_pathways(network, &ctx.pathway_totals);
        let warning = (!missing.is_empty()).then(|| {
            format!(
                "cycle network steps without a pathway rule drawn with zero coverage: {}",
                missing.join(",")
            )
        });

        let coverage = coverage_graph(network, &ctx.pathway_totals);
        let bipartite = bipartite_graph(network, &ctx.pathway_totals);
        let abundance = ctx.abundance.as_ref().map(|a| {
            let mut graph = bipartite.clone();
            annotate_abundance(&mut graph, &a.pathways, a.measures.as_ref());
            graph
        });

        info!(
            nodes = coverage.nodes.len(),
            edges = coverage.edges.len(),
            abundance = abundance.is_some(),
            "cycle network annotated"
        );
        if let Some(w) = warning {
            warn!("{}", w);
            ctx.warnings.push(w);
        }
        ctx.graphs = Some(CycleGraphs {
            coverage,
            bipartite,
            abundance,
        });
        Ok(())
    }
}
