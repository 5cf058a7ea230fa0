use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::ctx::{Ctx, Organism, RunMode};
use crate::pipeline::Stage;

const FASTA_EXTENSIONS: &[&str] = &["faa", "fasta", "fa", "fas", "pep"];
const HITS_EXTENSION: &str = "tsv";

pub struct Stage1Input;

impl Stage1Input {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Input {
    fn name(&self) -> &'static str {
        "stage1_input"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let organisms = match ctx.run_mode {
            RunMode::Search => resolve_organisms(&ctx.input, FASTA_EXTENSIONS)?,
            RunMode::Analyze => {
                if !ctx.input.is_dir() {
                    bail!("hit folder {} is not a directory", ctx.input.display());
                }
                let mut organisms = resolve_organisms(&ctx.input, &[HITS_EXTENSION])?;
                for org in &mut organisms {
                    org.hits = Some(org.source.clone());
                }
                organisms
            }
        };
        info!(
            input = %ctx.input.display(),
            organisms = organisms.len(),
            "organisms resolved"
        );
        ctx.organisms = organisms;
        Ok(())
    }
}

/// One organism per file; a directory contributes every file with a matching
/// extension (optionally gzipped). Organisms are ordered by id.
pub fn resolve_organisms(input: &Path, extensions: &[&str]) -> Result<Vec<Organism>> {
    if !input.exists() {
        bail!("input path {} does not exist", input.display());
    }
    let files: Vec<PathBuf> = if input.is_dir() {
        std::fs::read_dir(input)
            .with_context(|| format!("failed to list {}", input.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_extension(p, extensions))
            .collect()
    } else {
        vec![input.to_path_buf()]
    };
    if files.is_empty() {
        bail!(
            "input folder {} has no file ending in {}",
            input.display(),
            extensions.join(", ")
        );
    }

    let mut organisms = Vec::with_capacity(files.len());
    let mut seen = HashSet::new();
    for path in files {
        let id = organism_id(&path);
        if id.is_empty() {
            bail!("cannot derive an organism name from {}", path.display());
        }
        if !seen.insert(id.clone()) {
            bail!("organism '{}' is provided by more than one file", id);
        }
        organisms.push(Organism {
            id,
            source: path,
            hits: None,
        });
    }
    organisms.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(organisms)
}

fn split_gz(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name.strip_suffix(".gz").unwrap_or(name).to_string()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let name = split_gz(path);
    Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// File name without `.gz` and its last extension.
pub fn organism_id(path: &Path) -> String {
    let name = split_gz(path);
    Path::new(&name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn directory_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["b.faa", "a.fasta.gz", "notes.txt", "c.FAA"] {
            std::fs::write(dir.path().join(name), ">p\nM\n").unwrap();
        }
        let orgs = resolve_organisms(dir.path(), FASTA_EXTENSIONS).unwrap();
        let ids: Vec<&str> = orgs.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn missing_and_empty_inputs_fail() {
        let dir = TempDir::new().unwrap();
        assert!(resolve_organisms(&dir.path().join("nope"), FASTA_EXTENSIONS).is_err());
        assert!(resolve_organisms(dir.path(), FASTA_EXTENSIONS).is_err());
    }

    #[test]
    fn duplicate_stems_fail() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.faa"), ">p\nM\n").unwrap();
        std::fs::write(dir.path().join("a.fasta"), ">p\nM\n").unwrap();
        assert!(resolve_organisms(dir.path(), FASTA_EXTENSIONS).is_err());
    }
}
