use anyhow::Result;
use tracing::info;

use crate::annot::cohort::completeness_matrix;
use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage5Functions;

impl Stage5Functions {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Functions {
    fn name(&self) -> &'static str {
        "stage5_functions"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let db = ctx.database()?;
        let matrix = completeness_matrix(&ctx.cohort, &db.functions);
        let present = matrix
            .values
            .iter()
            .filter(|row| row.iter().any(|c| c.is_present()))
            .count();
        info!(
            functions = matrix.functions.len(),
            found = present,
            "functions classified"
        );
        ctx.completeness = Some(matrix);
        Ok(())
    }
}
