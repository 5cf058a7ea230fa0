use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::ctx::{Ctx, RunMode};

pub mod stage0_scaffold;
pub mod stage1_input;
pub mod stage2_database;
pub mod stage3_search;
pub mod stage4_hits;
pub mod stage5_functions;
pub mod stage6_pathways;
pub mod stage7_abundance;
pub mod stage8_network;
pub mod stage9_output;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Every stage for `mode`; `analyze` has no search stage.
    pub fn for_mode(mode: RunMode) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(stage0_scaffold::Stage0Scaffold::new()),
            Box::new(stage1_input::Stage1Input::new()),
            Box::new(stage2_database::Stage2Database::new()),
        ];
        if mode == RunMode::Search {
            stages.push(Box::new(stage3_search::Stage3Search::new()));
        }
        stages.push(Box::new(stage4_hits::Stage4Hits::new()));
        stages.push(Box::new(stage5_functions::Stage5Functions::new()));
        stages.push(Box::new(stage6_pathways::Stage6Pathways::new()));
        stages.push(Box::new(stage7_abundance::Stage7Abundance::new()));
        stages.push(Box::new(stage8_network::Stage8Network::new()));
        stages.push(Box::new(stage9_output::Stage9Output::new()));
        Self::new(stages)
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        info!(
            mode = ?ctx.run_mode,
            cores = ctx.cores,
            cutoff = %ctx.cutoff.label(),
            "pipeline configured"
        );
        for stage in &self.stages {
            let start = Instant::now();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
        }
        Ok(())
    }
}
