pub mod hmmer;
pub mod pool;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use needletail::parse_fastx_file;

use crate::annot::HitRecord;

pub use hmmer::HmmsearchCommand;
pub use pool::{TaskFailure, TaskOutcome, run_isolated};

#[derive(Debug, Clone, PartialEq)]
pub struct Protein {
    pub id: String,
    pub seq: Vec<u8>,
}

/// Profile search over one organism's proteins.
///
/// Implementations must be callable from several worker threads at once and
/// return every hit, unfiltered; thresholds are applied by the caller.
pub trait HmmSearch: Send + Sync {
    fn search(&self, organism: &str, proteins: &[Protein]) -> Result<Vec<HitRecord>>;
}

/// Reads a protein FASTA. The protein id is the first word of the header.
pub fn read_proteins(path: &Path) -> Result<Vec<Protein>> {
    let mut reader = parse_fastx_file(path)
        .with_context(|| format!("failed to open protein file {}", path.display()))?;
    let mut proteins = Vec::new();
    while let Some(record) = reader.next() {
        let record =
            record.with_context(|| format!("invalid FASTA record in {}", path.display()))?;
        let header = String::from_utf8_lossy(record.id());
        let id = header.split_whitespace().next().unwrap_or("").to_string();
        if id.is_empty() {
            bail!("{}: record without identifier", path.display());
        }
        let seq: Vec<u8> = record
            .seq()
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .copied()
            .collect();
        if seq.is_empty() {
            continue;
        }
        proteins.push(Protein { id, seq });
    }
    if proteins.is_empty() {
        bail!("{}: no protein sequence", path.display());
    }
    Ok(proteins)
}

pub fn sequence_index(proteins: &[Protein]) -> HashMap<String, Vec<u8>> {
    proteins
        .iter()
        .map(|p| (p.id.clone(), p.seq.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_first_header_word() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("org.faa");
        std::fs::write(&path, ">p1 some protein\nMKV\nLLA\n>p2\nMSS\n").unwrap();
        let proteins = read_proteins(&path).unwrap();
        assert_eq!(proteins.len(), 2);
        assert_eq!(proteins[0].id, "p1");
        assert_eq!(proteins[0].seq, b"MKVLLA".to_vec());
    }
}
