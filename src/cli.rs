use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::annot::filter::{CutoffMode, DEFAULT_MAX_EVALUE, LEGACY_MAX_EVALUE};

#[derive(Debug, Parser)]
#[command(
    name = "kira-cyclehmm",
    version,
    about = "Biogeochemical cycle annotation from profile HMM searches"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search protein files against the profile library, then aggregate.
    Run(RunArgs),
    /// Aggregate an existing folder of per-organism hit tables.
    Analyze(AnalyzeArgs),
    Database(DatabaseArgs),
    /// Load and check a database without processing any organism.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, short = 'i', help = "Protein FASTA file or directory of FASTA files")]
    pub input: PathBuf,

    #[arg(long, default_value_t = 1, help = "Worker threads for per-organism searches")]
    pub cores: usize,

    #[arg(long, default_value = "hmmsearch", help = "hmmsearch executable")]
    pub hmmsearch: PathBuf,

    #[arg(long, help = "JSON motif rules: profile -> pattern or list of patterns")]
    pub motif: Option<PathBuf>,

    #[command(flatten)]
    pub common: AnalysisArgs,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(long, help = "Folder of <organism>.tsv hit tables")]
    pub hits: PathBuf,

    #[command(flatten)]
    pub common: AnalysisArgs,
}

#[derive(Debug, Args)]
pub struct AnalysisArgs {
    #[arg(long, short = 'd', help = "Database directory")]
    pub database: PathBuf,

    #[arg(long, short = 'o')]
    pub out: PathBuf,

    #[arg(long, value_enum, default_value_t = CutoffArg::Score)]
    pub cutoff: CutoffArg,

    #[arg(
        long,
        help = "E-value ceiling (default 1e-5 with --cutoff score, 0.005 with --cutoff evalue)"
    )]
    pub max_evalue: Option<f64>,

    #[arg(long, help = "JSON motif pair rules: profile_a -> profile_b")]
    pub motif_pair: Option<PathBuf>,

    #[arg(long, help = "Sample abundance table (.tsv/.csv, optionally .gz)")]
    pub abundance: Option<PathBuf>,

    #[arg(long, requires = "abundance", help = "observation_name -> tax_id_name table")]
    pub taxon_map: Option<PathBuf>,

    #[arg(long, requires = "abundance", help = "Metabolite measurements per sample")]
    pub measure_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DatabaseArgs {
    #[command(subcommand)]
    pub command: DatabaseCommand,
}

#[derive(Debug, Subcommand)]
pub enum DatabaseCommand {
    /// List functions and pathway rules of a database.
    Show(DatabaseShowArgs),
}

#[derive(Debug, Args)]
pub struct DatabaseShowArgs {
    #[arg(long, short = 'd')]
    pub database: PathBuf,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[arg(long, short = 'd')]
    pub database: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CutoffArg {
    /// Per-profile score threshold plus an e-value ceiling.
    Score,
    /// Global e-value cutoff only.
    Evalue,
}

pub fn cutoff_mode(cutoff: CutoffArg, max_evalue: Option<f64>) -> Result<CutoffMode> {
    if let Some(e) = max_evalue {
        if !e.is_finite() || e <= 0.0 {
            bail!("--max-evalue must be a positive number, got {}", e);
        }
    }
    Ok(match cutoff {
        CutoffArg::Score => CutoffMode::ProfileScore {
            max_evalue: Some(max_evalue.unwrap_or(DEFAULT_MAX_EVALUE)),
        },
        CutoffArg::Evalue => CutoffMode::GlobalEvalue {
            max_evalue: max_evalue.unwrap_or(LEGACY_MAX_EVALUE),
        },
    })
}
