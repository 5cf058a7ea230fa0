mod loader;
mod motif;
mod network;
mod rules;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

pub use loader::{HmmTable, load_hmm_table, normalize_profile_id, parse_hmm_table};
pub use motif::{MotifRules, load_motif_pair_rules, load_motif_rules, parse_motif_pair_rules, parse_motif_rules};
pub use network::{CycleNetwork, NetworkEdge, NetworkNode, load_network, parse_network};
pub use rules::{load_rule_table, parse_combination_spec, parse_rule_table, rules_from_network};

pub const HMM_TABLE_FILE: &str = "hmm_table_template.tsv";
pub const PATHWAY_FILE: &str = "cycle_pathways.tsv";
pub const PHENOTYPE_FILE: &str = "phenotypes.tsv";
pub const NETWORK_FILE: &str = "cycle_network.json";
pub const PROFILE_DIR: &str = "hmm_files";
pub const PROFILE_ARCHIVE: &str = "hmm_files.zip";

/// Profile file name, e.g. `K00001.hmm`.
pub type ProfileId = String;

#[derive(Debug, Clone, Default)]
pub struct ThresholdTable {
    thresholds: HashMap<ProfileId, f64>,
}

impl ThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// First entry wins; returns false when the profile was already present.
    pub fn insert(&mut self, profile: ProfileId, threshold: f64) -> bool {
        if self.thresholds.contains_key(&profile) {
            return false;
        }
        self.thresholds.insert(profile, threshold);
        true
    }

    pub fn get(&self, profile: &str) -> Option<f64> {
        self.thresholds.get(profile).copied()
    }

    pub fn contains(&self, profile: &str) -> bool {
        self.thresholds.contains_key(profile)
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub category: Option<String>,
    pub profiles: Vec<ProfileId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Required,
    Excluded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleToken {
    pub kind: TokenKind,
    pub profile: ProfileId,
}

impl RuleToken {
    pub fn required(profile: impl Into<ProfileId>) -> Self {
        Self {
            kind: TokenKind::Required,
            profile: profile.into(),
        }
    }

    pub fn excluded(profile: impl Into<ProfileId>) -> Self {
        Self {
            kind: TokenKind::Excluded,
            profile: profile.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Combination {
    pub tokens: Vec<RuleToken>,
}

impl Combination {
    pub fn new(tokens: Vec<RuleToken>) -> Self {
        Self { tokens }
    }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Required)
            .map(|t| t.profile.as_str())
    }

    pub fn excluded(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Excluded)
            .map(|t| t.profile.as_str())
    }
}

/// A named pathway (or phenotype): satisfied when every combination holds.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDef {
    pub name: String,
    pub combinations: Vec<Combination>,
}

#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    pub defs: Vec<RuleDef>,
}

impl RuleTable {
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Definitions ordered by name, the column order of every output matrix.
    pub fn sorted(&self) -> Vec<&RuleDef> {
        let mut defs: Vec<&RuleDef> = self.defs.iter().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn profiles(&self) -> impl Iterator<Item = &str> {
        self.defs
            .iter()
            .flat_map(|d| d.combinations.iter())
            .flat_map(|c| c.tokens.iter())
            .map(|t| t.profile.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum ProfileLibrary {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl ProfileLibrary {
    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(p) | Self::Archive(p) => p,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pub root: PathBuf,
    pub thresholds: ThresholdTable,
    pub functions: Vec<FunctionDef>,
    pub pathways: RuleTable,
    pub phenotypes: Option<RuleTable>,
    pub network: Option<CycleNetwork>,
    pub library: Option<ProfileLibrary>,
    pub warnings: Vec<String>,
}

pub fn load_database(root: &Path) -> Result<Database> {
    if !root.is_dir() {
        bail!("database directory {} does not exist", root.display());
    }

    let hmm_table = load_hmm_table(&root.join(HMM_TABLE_FILE))?;
    let mut warnings = hmm_table.warnings;

    let network_path = root.join(NETWORK_FILE);
    let network = if network_path.is_file() {
        Some(load_network(&network_path)?)
    } else {
        None
    };

    let pathway_path = root.join(PATHWAY_FILE);
    let pathways = if pathway_path.is_file() {
        load_rule_table(&pathway_path)?
    } else if let Some(net) = &network {
        info!(network = %network_path.display(), "pathway rules taken from cycle network");
        rules_from_network(net)?
    } else {
        bail!(
            "database {} has neither {} nor {}",
            root.display(),
            PATHWAY_FILE,
            NETWORK_FILE
        );
    };

    let phenotype_path = root.join(PHENOTYPE_FILE);
    let phenotypes = if phenotype_path.is_file() {
        Some(load_rule_table(&phenotype_path)?)
    } else {
        None
    };

    let library = if root.join(PROFILE_DIR).is_dir() {
        Some(ProfileLibrary::Directory(root.join(PROFILE_DIR)))
    } else if root.join(PROFILE_ARCHIVE).is_file() {
        Some(ProfileLibrary::Archive(root.join(PROFILE_ARCHIVE)))
    } else {
        None
    };

    for def in pathways
        .defs
        .iter()
        .chain(phenotypes.iter().flat_map(|t| t.defs.iter()))
    {
        if def.combinations.is_empty() {
            warnings.push(format!(
                "rule '{}' has no HMM combination and is always satisfied",
                def.name
            ));
        }
    }

    let unknown = unknown_rule_profiles(&hmm_table.thresholds, &pathways);
    if !unknown.is_empty() {
        warnings.push(format!(
            "pathway rules reference {} profiles without a threshold: {}",
            unknown.len(),
            unknown.join(",")
        ));
    }

    for w in &warnings {
        warn!("{}", w);
    }

    Ok(Database {
        root: root.to_path_buf(),
        thresholds: hmm_table.thresholds,
        functions: hmm_table.functions,
        pathways,
        phenotypes,
        network,
        library,
        warnings,
    })
}

impl Database {
    pub fn library(&self) -> Result<&ProfileLibrary> {
        self.library.as_ref().with_context(|| {
            format!(
                "database {} has no {} directory or {} archive",
                self.root.display(),
                PROFILE_DIR,
                PROFILE_ARCHIVE
            )
        })
    }
}

fn unknown_rule_profiles(thresholds: &ThresholdTable, rules: &RuleTable) -> Vec<String> {
    let mut unknown: Vec<String> = rules
        .profiles()
        .filter(|p| !thresholds.contains(p))
        .map(|p| p.to_string())
        .collect();
    unknown.sort();
    unknown.dedup();
    unknown
}
