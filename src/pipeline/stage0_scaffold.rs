use anyhow::{Context, Result};
use std::fs;
use tracing::info;

use crate::ctx::{Ctx, RunMode};
use crate::pipeline::Stage;

pub struct Stage0Scaffold;

impl Stage0Scaffold {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage0Scaffold {
    fn name(&self) -> &'static str {
        "stage0_scaffold"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let mut dirs = vec![&ctx.output.out_dir, &ctx.output.diagram_dir];
        if ctx.run_mode == RunMode::Search {
            dirs.push(&ctx.output.hits_dir);
        }
        for dir in dirs {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        info!(
            out_dir = %ctx.output.out_dir.display(),
            "output_dir_ready"
        );
        ctx.record_parameters();
        Ok(())
    }
}
