use anyhow::Result;

use crate::ctx::{Ctx, RunMode};

pub fn format_summary(ctx: &Ctx) -> Result<String> {
    let version = env!("CARGO_PKG_VERSION");
    let db = ctx.database()?;
    let mode = match ctx.run_mode {
        RunMode::Search => "run",
        RunMode::Analyze => "analyze",
    };

    let mut out = String::new();
    out.push_str(&format!("kira-cyclehmm v{}\n", version));
    out.push_str(&format!(
        "Input: {} organisms, mode={}, cutoff={}\n",
        ctx.organisms.len(),
        mode,
        ctx.cutoff.label()
    ));
    out.push_str(&format!(
        "Database: {} profiles, {} functions, {} pathways\n",
        db.thresholds.len(),
        db.functions.len(),
        db.pathways.len()
    ));

    let satisfied = ctx.pathway_totals.iter().filter(|t| t.count > 0).count();
    out.push_str(&format!(
        "Cohort: {} organisms, {}/{} pathways found\n",
        ctx.cohort.len(),
        satisfied,
        ctx.pathway_totals.len()
    ));

    if let Some(abundance) = &ctx.abundance {
        out.push_str(&format!(
            "Abundance: {} samples\n",
            abundance.weights.samples.len()
        ));
    }

    if ctx.failures.is_empty() {
        out.push_str("Failures: none\n");
    } else {
        let names: Vec<&str> = ctx.failures.iter().map(|f| f.organism.as_str()).collect();
        out.push_str(&format!("Failures: {}\n", names.join(", ")));
    }

    Ok(out)
}
