use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::annot::abundance::{AbundanceTable, SampleWeights, WeightedMatrix};
use crate::annot::cohort::{CompletenessMatrix, PresenceMatrix};
use crate::annot::filter::CutoffMode;
use crate::annot::network::CycleGraph;
use crate::annot::{CohortAggregate, OrganismHits};
use crate::db::{Database, MotifRules};
use crate::schema::v1::{Command, Cutoff, Failure, Parameters, RunMetadataV1};
use crate::search::HmmSearch;

pub const HITS_DIR: &str = "hmm_results";
pub const DIAGRAM_DIR: &str = "diagram_input";
pub const ABUNDANCE_DIR: &str = "function_abundance";
pub const METADATA_FILE: &str = "run_metadata.json";
pub const LOG_FILE: &str = "kira-cyclehmm.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Search protein files, then aggregate.
    Search,
    /// Aggregate an existing folder of hit tables.
    Analyze,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Organism {
    pub id: String,
    /// Protein FASTA in search mode, hit table in analyze mode.
    pub source: PathBuf,
    /// Hit table once it exists on disk.
    pub hits: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub hits_dir: PathBuf,
    pub diagram_dir: PathBuf,
    pub abundance_dir: PathBuf,
    pub metadata_path: PathBuf,
}

impl OutputPaths {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            hits_dir: out_dir.join(HITS_DIR),
            diagram_dir: out_dir.join(DIAGRAM_DIR),
            abundance_dir: out_dir.join(ABUNDANCE_DIR),
            metadata_path: out_dir.join(METADATA_FILE),
            out_dir,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbundanceResult {
    pub weights: SampleWeights,
    pub pathways: WeightedMatrix,
    pub functions: WeightedMatrix,
    pub occurrence: WeightedMatrix,
    pub measures: Option<AbundanceTable>,
}

#[derive(Debug, Clone)]
pub struct CycleGraphs {
    pub coverage: CycleGraph,
    pub bipartite: CycleGraph,
    pub abundance: Option<CycleGraph>,
}

pub struct Ctx {
    pub run_mode: RunMode,
    pub input: PathBuf,
    pub database_path: PathBuf,
    pub cores: usize,
    pub cutoff: CutoffMode,
    pub hmmsearch: PathBuf,
    pub motif_path: Option<PathBuf>,
    pub motif_pair_path: Option<PathBuf>,
    pub abundance_path: Option<PathBuf>,
    pub taxon_map_path: Option<PathBuf>,
    pub measure_path: Option<PathBuf>,
    pub searcher: Option<Arc<dyn HmmSearch>>,
    pub organisms: Vec<Organism>,
    pub database: Option<Database>,
    pub motif_rules: MotifRules,
    pub failures: Vec<Failure>,
    pub cohort: Vec<OrganismHits>,
    pub completeness: Option<CompletenessMatrix>,
    pub pathway_presence: Option<PresenceMatrix>,
    pub phenotype_presence: Option<PresenceMatrix>,
    pub pathway_totals: Vec<CohortAggregate>,
    pub abundance: Option<AbundanceResult>,
    pub graphs: Option<CycleGraphs>,
    pub warnings: Vec<String>,
    pub output: OutputPaths,
    pub report: RunMetadataV1,
    pub started: Instant,
}

impl Ctx {
    pub fn new(
        run_mode: RunMode,
        input: PathBuf,
        database_path: PathBuf,
        out_dir: PathBuf,
        tool_version: &str,
    ) -> Self {
        let command = match run_mode {
            RunMode::Search => Command::Run,
            RunMode::Analyze => Command::Analyze,
        };
        let cutoff = CutoffMode::default();
        let parameters = Parameters {
            input: input.display().to_string(),
            database: database_path.display().to_string(),
            out: out_dir.display().to_string(),
            cores: 1,
            cutoff: cutoff_info(&cutoff),
            hmmsearch: None,
            motif: None,
            motif_pair: None,
            abundance: None,
            taxon_map: None,
            measure_file: None,
        };
        Self {
            run_mode,
            input,
            database_path,
            cores: 1,
            cutoff,
            hmmsearch: PathBuf::from(crate::search::hmmer::DEFAULT_PROGRAM),
            motif_path: None,
            motif_pair_path: None,
            abundance_path: None,
            taxon_map_path: None,
            measure_path: None,
            searcher: None,
            organisms: Vec::new(),
            database: None,
            motif_rules: MotifRules::default(),
            failures: Vec::new(),
            cohort: Vec::new(),
            completeness: None,
            pathway_presence: None,
            phenotype_presence: None,
            pathway_totals: Vec::new(),
            abundance: None,
            graphs: None,
            warnings: Vec::new(),
            report: RunMetadataV1::empty(tool_version, command, parameters),
            output: OutputPaths::new(out_dir),
            started: Instant::now(),
        }
    }

    pub fn database(&self) -> anyhow::Result<&Database> {
        self.database
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("database not loaded"))
    }

    /// Copies the run options into the metadata record.
    pub fn record_parameters(&mut self) {
        let p = &mut self.report.parameters;
        p.cores = self.cores;
        p.cutoff = cutoff_info(&self.cutoff);
        p.hmmsearch = match self.run_mode {
            RunMode::Search => Some(self.hmmsearch.display().to_string()),
            RunMode::Analyze => None,
        };
        p.motif = display(self.motif_path.as_deref());
        p.motif_pair = display(self.motif_pair_path.as_deref());
        p.abundance = display(self.abundance_path.as_deref());
        p.taxon_map = display(self.taxon_map_path.as_deref());
        p.measure_file = display(self.measure_path.as_deref());
    }
}

fn display(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.display().to_string())
}

pub fn cutoff_info(mode: &CutoffMode) -> Cutoff {
    match mode {
        CutoffMode::ProfileScore { max_evalue } => Cutoff {
            mode: "score".to_string(),
            max_evalue: *max_evalue,
        },
        CutoffMode::GlobalEvalue { max_evalue } => Cutoff {
            mode: "evalue".to_string(),
            max_evalue: Some(*max_evalue),
        },
    }
}
