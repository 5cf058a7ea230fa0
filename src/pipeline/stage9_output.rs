use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::graphml::write_graphml;
use crate::io::json_writer::{build_report, write_node_link};
use crate::io::tsv_writer::{
    write_function_presence, write_occurrence, write_organism_diagrams, write_presence_matrix,
    write_totals, write_weighted_matrix,
};
use crate::io::write_json;
use crate::pipeline::Stage;

pub const FUNCTION_PRESENCE_FILE: &str = "function_presence.tsv";
pub const PATHWAY_PRESENCE_FILE: &str = "pathway_presence.tsv";
pub const PHENOTYPE_PRESENCE_FILE: &str = "phenotypes_presence.tsv";
pub const FUNCTION_OCCURRENCE_FILE: &str = "function_occurrence.tsv";
pub const TOTAL_DIAGRAM_FILE: &str = "Total.R_input.txt";
pub const CYCLE_ABUNDANCE_FILE: &str = "cycle_abundance_samples.tsv";
pub const FUNCTION_ABUNDANCE_FILE: &str = "function_abundance_samples.tsv";
pub const CYCLE_OCCURRENCE_FILE: &str = "cycle_occurrence_samples.tsv";
pub const GRAPH_JSON_FILE: &str = "cycle_diagram.json";
pub const GRAPH_FILE: &str = "cycle_diagram.graphml";
pub const BIPARTITE_FILE: &str = "cycle_diagram_bipartite.graphml";
pub const BIPARTITE_ABUNDANCE_FILE: &str = "cycle_diagram_bipartite_abundance.graphml";

pub struct Stage9Output;

impl Stage9Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage9Output {
    fn name(&self) -> &'static str {
        "stage9_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let out = ctx.output.out_dir.clone();
        let mut written: Vec<String> = Vec::new();
        let mut record = |path: &Path| {
            let rel = path.strip_prefix(&out).unwrap_or(path);
            written.push(rel.display().to_string());
        };

        let completeness = ctx
            .completeness
            .as_ref()
            .context("function completeness missing")?;
        let presence = ctx
            .pathway_presence
            .as_ref()
            .context("pathway presence missing")?;

        let path = out.join(FUNCTION_PRESENCE_FILE);
        write_function_presence(&path, completeness)?;
        record(&path);

        let path = out.join(FUNCTION_OCCURRENCE_FILE);
        write_occurrence(&path, &completeness.occurrence())?;
        record(&path);

        let path = out.join(PATHWAY_PRESENCE_FILE);
        write_presence_matrix(&path, presence)?;
        record(&path);

        if let Some(phenotypes) = &ctx.phenotype_presence {
            let path = out.join(PHENOTYPE_PRESENCE_FILE);
            write_presence_matrix(&path, phenotypes)?;
            record(&path);
        }

        let diagram_dir = &ctx.output.diagram_dir;
        for name in write_organism_diagrams(diagram_dir, presence)? {
            record(&diagram_dir.join(name));
        }
        let path = diagram_dir.join(TOTAL_DIAGRAM_FILE);
        write_totals(&path, &ctx.pathway_totals)?;
        record(&path);

        if let Some(abundance) = &ctx.abundance {
            let dir = &ctx.output.abundance_dir;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            for (file, label, matrix) in [
                (CYCLE_ABUNDANCE_FILE, "pathway", &abundance.pathways),
                (FUNCTION_ABUNDANCE_FILE, "function", &abundance.functions),
                (CYCLE_OCCURRENCE_FILE, "pathway", &abundance.occurrence),
            ] {
                let path = dir.join(file);
                write_weighted_matrix(&path, label, matrix)?;
                record(&path);
            }
        }

        if let Some(graphs) = &ctx.graphs {
            let path = out.join(GRAPH_JSON_FILE);
            write_node_link(&path, &graphs.coverage)?;
            record(&path);
            let path = out.join(GRAPH_FILE);
            write_graphml(&path, &graphs.coverage)?;
            record(&path);
            let path = out.join(BIPARTITE_FILE);
            write_graphml(&path, &graphs.bipartite)?;
            record(&path);
            if let Some(graph) = &graphs.abundance {
                let path = out.join(BIPARTITE_ABUNDANCE_FILE);
                write_graphml(&path, graph)?;
                record(&path);
            }
        }

        record(&ctx.output.metadata_path);
        ctx.report.outputs = written;
        let report = build_report(ctx)?;
        write_json(&ctx.output.metadata_path, &report)?;
        ctx.report = report;

        info!(
            out_dir = %out.display(),
            files = ctx.report.outputs.len(),
            "stage9_output_ready"
        );
        Ok(())
    }
}
