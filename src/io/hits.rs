use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::annot::HitRecord;
use crate::db::normalize_profile_id;
use crate::io::write_atomic;

pub const HITS_HEADER: &str = "organism\tprotein\tHMM\tevalue\tscore\tlength";

pub fn write_hits(path: &Path, hits: &[HitRecord]) -> Result<()> {
    write_atomic(path, |w| {
        writeln!(w, "{}", HITS_HEADER)?;
        for h in hits {
            writeln!(
                w,
                "{}\t{}\t{}\t{:e}\t{}\t{}",
                h.organism, h.protein, h.profile, h.evalue, h.score, h.length
            )?;
        }
        Ok(())
    })
}

/// Reads a hit table. Rows are attributed to `organism` whatever their first
/// column says.
pub fn read_hits(path: &Path, organism: &str) -> Result<Vec<HitRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read hit table {}", path.display()))?;
    parse_hits(&content, organism, &path.display().to_string())
}

pub fn parse_hits(content: &str, organism: &str, source: &str) -> Result<Vec<HitRecord>> {
    let mut lines = content.lines().enumerate();
    match lines.next() {
        Some((_, header)) if header.trim_end() == HITS_HEADER => {}
        Some((_, header)) => bail!("{}:1 unexpected header '{}'", source, header.trim_end()),
        None => bail!("{}: empty hit table", source),
    }

    let mut hits = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != 6 {
            bail!("{}:{} expected 6 columns, found {}", source, line_no, parts.len());
        }
        let evalue: f64 = parts[3]
            .parse()
            .with_context(|| format!("{}:{} invalid evalue", source, line_no))?;
        let score: f64 = parts[4]
            .parse()
            .with_context(|| format!("{}:{} invalid score", source, line_no))?;
        let length: u64 = parts[5]
            .parse()
            .with_context(|| format!("{}:{} invalid length", source, line_no))?;
        hits.push(HitRecord {
            organism: organism.to_string(),
            protein: parts[1].to_string(),
            profile: normalize_profile_id(parts[2]),
            evalue,
            score,
            length,
        });
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn written_table_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("org1.tsv");
        let hits = vec![HitRecord {
            organism: "org1".to_string(),
            protein: "p1".to_string(),
            profile: "K00001.hmm".to_string(),
            evalue: 1.5e-30,
            score: 105.25,
            length: 312,
        }];
        write_hits(&path, &hits).unwrap();
        assert!(!dir.path().join("org1.tsv.tmp").exists());
        assert_eq!(read_hits(&path, "org1").unwrap(), hits);
    }

    #[test]
    fn full_suffix_is_normalized() {
        let content = format!("{}\norg\tp1\tK00001_full.hmm\t1e-10\t50\t100\n", HITS_HEADER);
        let hits = parse_hits(&content, "org", "t").unwrap();
        assert_eq!(hits[0].profile, "K00001.hmm");
    }

    #[test]
    fn bad_rows_are_errors() {
        assert!(parse_hits("protein\tHMM\n", "org", "t").is_err());
        let content = format!("{}\norg\tp1\tA.hmm\tnot-a-number\t50\t100\n", HITS_HEADER);
        assert!(parse_hits(&content, "org", "t").is_err());
    }
}
