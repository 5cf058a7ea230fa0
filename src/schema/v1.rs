use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Run,
    Analyze,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cutoff {
    pub mode: String,
    pub max_evalue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub input: String,
    pub database: String,
    pub out: String,
    pub cores: usize,
    pub cutoff: Cutoff,
    pub hmmsearch: Option<String>,
    pub motif: Option<String>,
    pub motif_pair: Option<String>,
    pub abundance: Option<String>,
    pub taxon_map: Option<String>,
    pub measure_file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub hmm_table: String,
    pub pathway_source: String,
    pub phenotypes: Option<String>,
    pub network: Option<String>,
    pub profile_library: Option<String>,
    pub profiles: usize,
    pub functions: usize,
    pub pathways: usize,
    pub phenotype_rules: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganismCounts {
    pub input: usize,
    pub processed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub organism: String,
    pub cause: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadataV1 {
    pub tool: String,
    pub version: String,
    pub command: Command,
    pub parameters: Parameters,
    pub database: DatabaseInfo,
    pub organisms: OrganismCounts,
    pub failures: Vec<Failure>,
    pub warnings: Vec<String>,
    pub outputs: Vec<String>,
    pub duration_s: f64,
}

impl RunMetadataV1 {
    pub fn empty(tool_version: &str, command: Command, parameters: Parameters) -> Self {
        Self {
            tool: "kira-cyclehmm".to_string(),
            version: tool_version.to_string(),
            command,
            parameters,
            database: DatabaseInfo::default(),
            organisms: OrganismCounts::default(),
            failures: Vec::new(),
            warnings: Vec::new(),
            outputs: Vec::new(),
            duration_s: 0.0,
        }
    }
}
