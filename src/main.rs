use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use kira_cyclehmm::cli::{AnalysisArgs, Cli, Commands, DatabaseCommand, cutoff_mode};
use kira_cyclehmm::ctx::{Ctx, RunMode};
use kira_cyclehmm::db::{self, Database};
use kira_cyclehmm::io;
use kira_cyclehmm::logging;
use kira_cyclehmm::pipeline::Pipeline;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let _guard = logging::init(Some(&args.common.out))?;
            let mut ctx = build_ctx(RunMode::Search, args.input, &args.common)?;
            ctx.cores = args.cores.max(1);
            ctx.hmmsearch = args.hmmsearch;
            ctx.motif_path = args.motif;
            run_pipeline(&mut ctx)?;
        }
        Commands::Analyze(args) => {
            let _guard = logging::init(Some(&args.common.out))?;
            let mut ctx = build_ctx(RunMode::Analyze, args.hits, &args.common)?;
            run_pipeline(&mut ctx)?;
        }
        Commands::Database(args) => match args.command {
            DatabaseCommand::Show(show) => {
                let _guard = logging::init(None)?;
                let database = db::load_database(&show.database)?;
                print_database(&database);
            }
        },
        Commands::Validate(args) => {
            let _guard = logging::init(None)?;
            let database = db::load_database(&args.database)?;
            print_validate_summary(&database);
        }
    }

    Ok(())
}

fn build_ctx(mode: RunMode, input: PathBuf, common: &AnalysisArgs) -> Result<Ctx> {
    let mut ctx = Ctx::new(
        mode,
        input,
        common.database.clone(),
        common.out.clone(),
        env!("CARGO_PKG_VERSION"),
    );
    ctx.cutoff = cutoff_mode(common.cutoff, common.max_evalue)?;
    ctx.motif_pair_path = common.motif_pair.clone();
    ctx.abundance_path = common.abundance.clone();
    ctx.taxon_map_path = common.taxon_map.clone();
    ctx.measure_path = common.measure_file.clone();
    Ok(ctx)
}

fn run_pipeline(ctx: &mut Ctx) -> Result<()> {
    let pipeline = Pipeline::for_mode(ctx.run_mode);
    pipeline.run(ctx)?;
    print_summary(ctx)
}

fn print_summary(ctx: &Ctx) -> Result<()> {
    let summary = io::summary::format_summary(ctx)?;
    print!("{}", summary);
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
    Ok(())
}

fn print_database(database: &Database) {
    println!("functions ({}):", database.functions.len());
    for def in &database.functions {
        println!(
            "{}\t{}\t{}",
            def.name,
            def.category.as_deref().unwrap_or("-"),
            def.profiles.join(",")
        );
    }
    println!("pathways ({}):", database.pathways.len());
    for def in database.pathways.sorted() {
        println!("{}\t{}", def.name, def.combinations.len());
    }
    if let Some(phenotypes) = &database.phenotypes {
        println!("phenotypes ({}):", phenotypes.len());
        for def in phenotypes.sorted() {
            println!("{}\t{}", def.name, def.combinations.len());
        }
    }
}

fn print_validate_summary(database: &Database) {
    println!("kira-cyclehmm validate ok");
    println!("profiles: {}", database.thresholds.len());
    println!("functions: {}", database.functions.len());
    println!("pathways: {}", database.pathways.len());
    println!(
        "phenotypes: {}",
        database.phenotypes.as_ref().map_or(0, |t| t.len())
    );
    println!("network: {}", if database.network.is_some() { "yes" } else { "no" });
    println!(
        "profile library: {}",
        database
            .library
            .as_ref()
            .map_or("none".to_string(), |l| l.path().display().to_string())
    );
    if !database.warnings.is_empty() {
        println!("warnings:");
        for warning in &database.warnings {
            println!("- {}", warning);
        }
    }
}
