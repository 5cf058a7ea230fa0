//! `hmmsearch` (HMMER3) driven as an external process.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::annot::HitRecord;
use crate::db::{ProfileId, ProfileLibrary, ThresholdTable, normalize_profile_id};
use crate::search::{HmmSearch, Protein};

pub const DEFAULT_PROGRAM: &str = "hmmsearch";

pub struct HmmsearchCommand {
    program: PathBuf,
    library: NamedTempFile,
    names: HashMap<String, ProfileId>,
}

impl HmmsearchCommand {
    /// Concatenates every profile of `library` known to `thresholds` into one
    /// temporary model file.
    pub fn prepare(program: PathBuf, library: &ProfileLibrary, thresholds: &ThresholdTable) -> Result<Self> {
        let profiles = match library {
            ProfileLibrary::Directory(dir) => read_profile_dir(dir)?,
            ProfileLibrary::Archive(path) => read_profile_archive(path)?,
        };

        let mut merged = NamedTempFile::new().context("failed to create profile library file")?;
        let mut names = HashMap::new();
        let mut used = 0usize;
        let mut skipped = 0usize;
        for (file_name, content) in &profiles {
            let profile = normalize_profile_id(file_name);
            if !thresholds.contains(&profile) {
                skipped += 1;
                continue;
            }
            for name in model_names(content) {
                names.insert(name, profile.clone());
            }
            merged.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                merged.write_all(b"\n")?;
            }
            used += 1;
        }
        if used == 0 {
            bail!(
                "profile library {} has no profile listed in the HMM table",
                library.path().display()
            );
        }
        merged.flush()?;
        info!(
            library = %library.path().display(),
            profiles = used,
            skipped,
            "profile library prepared"
        );

        Ok(Self {
            program,
            library: merged,
            names,
        })
    }

    /// Unmapped model names fall back to `<name>.hmm`.
    fn profile_of(&self, query: &str) -> ProfileId {
        if let Some(profile) = self.names.get(query) {
            return profile.clone();
        }
        if query.ends_with(".hmm") {
            normalize_profile_id(query)
        } else {
            normalize_profile_id(&format!("{}.hmm", query))
        }
    }
}

impl HmmSearch for HmmsearchCommand {
    fn search(&self, organism: &str, proteins: &[Protein]) -> Result<Vec<HitRecord>> {
        let mut fasta = NamedTempFile::new().context("failed to create query FASTA")?;
        for p in proteins {
            writeln!(fasta, ">{}", p.id)?;
            fasta.write_all(&p.seq)?;
            writeln!(fasta)?;
        }
        fasta.flush()?;
        let tblout = NamedTempFile::new().context("failed to create tblout file")?;

        debug!(organism, proteins = proteins.len(), "running hmmsearch");
        let output = Command::new(&self.program)
            .arg("--cpu")
            .arg("1")
            .arg("--noali")
            .arg("--tblout")
            .arg(tblout.path())
            .arg(self.library.path())
            .arg(fasta.path())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to run {}", self.program.display()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("hmmsearch failed for {}: {}", organism, stderr.trim());
        }

        let lengths: HashMap<&str, u64> = proteins
            .iter()
            .map(|p| (p.id.as_str(), p.seq.len() as u64))
            .collect();
        let file = File::open(tblout.path())?;
        let rows = parse_tblout(BufReader::new(file))?;
        Ok(rows
            .into_iter()
            .map(|row| HitRecord {
                organism: organism.to_string(),
                length: lengths.get(row.target.as_str()).copied().unwrap_or(0),
                profile: self.profile_of(&row.query),
                protein: row.target,
                evalue: row.evalue,
                score: row.score,
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TbloutRow {
    pub target: String,
    pub query: String,
    pub evalue: f64,
    pub score: f64,
}

/// Per-sequence table: target, accession, query, accession, full E-value,
/// full score, ...
pub fn parse_tblout<R: BufRead>(reader: R) -> Result<Vec<TbloutRow>> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 6 {
            bail!("tblout line {}: expected at least 6 columns", idx + 1);
        }
        let evalue: f64 = cols[4]
            .parse()
            .with_context(|| format!("tblout line {}: invalid E-value", idx + 1))?;
        let score: f64 = cols[5]
            .parse()
            .with_context(|| format!("tblout line {}: invalid score", idx + 1))?;
        rows.push(TbloutRow {
            target: cols[0].to_string(),
            query: cols[2].to_string(),
            evalue,
            score,
        });
    }
    Ok(rows)
}

/// `NAME` fields of the models in a profile file.
pub fn model_names(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|l| l.strip_prefix("NAME"))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(|n| n.to_string())
        .collect()
}

fn read_profile_dir(dir: &Path) -> Result<Vec<(String, String)>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("hmm"))
        .collect();
    paths.sort();
    paths
        .into_iter()
        .map(|p| {
            let name = p
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let content = std::fs::read_to_string(&p)
                .with_context(|| format!("failed to read profile {}", p.display()))?;
            Ok((name, content))
        })
        .collect()
}

fn read_profile_archive(path: &Path) -> Result<Vec<(String, String)>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("invalid profile archive {}", path.display()))?;
    let mut profiles = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || !entry.name().ends_with(".hmm") {
            continue;
        }
        let name = Path::new(entry.name())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .with_context(|| format!("failed to read {} from {}", name, path.display()))?;
        profiles.push((name, content));
    }
    profiles.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(profiles)
}
