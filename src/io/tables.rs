//! Sample abundance, measurement and taxon-map readers.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::annot::abundance::{AbundanceTable, TaxonMap};
use crate::io::read_maybe_gz;

const COL_OBSERVATION: &str = "observation_name";
const COL_TAXON: &str = "tax_id_name";

/// Comma for `.csv` (optionally gzipped), tab otherwise.
pub fn delimiter_for(path: &Path) -> char {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    if name.ends_with(".csv") { ',' } else { '\t' }
}

pub fn read_abundance_table(path: &Path) -> Result<AbundanceTable> {
    let content = read_maybe_gz(path)?;
    parse_abundance_table(&content, delimiter_for(path), &path.display().to_string())
}

/// First column names the observation, every other column is a sample.
pub fn parse_abundance_table(content: &str, delim: char, source: &str) -> Result<AbundanceTable> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());
    let (_, header) = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("{}: abundance table is empty", source))?;
    let samples: Vec<String> = header
        .split(delim)
        .skip(1)
        .map(|s| s.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let mut parts = line.split(delim);
        let name = parts.next().unwrap_or("").trim();
        if name.is_empty() {
            bail!("{}:{} empty observation name", source, line_no);
        }
        let values = parts
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .with_context(|| format!("{}:{} invalid abundance '{}'", source, line_no, v))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push((name.to_string(), values));
    }

    AbundanceTable::new(samples, rows).with_context(|| format!("{}: invalid abundance table", source))
}

pub fn read_taxon_map(path: &Path) -> Result<(TaxonMap, Vec<String>)> {
    let content = read_maybe_gz(path)?;
    parse_taxon_map(&content, delimiter_for(path), &path.display().to_string())
}

/// Returns the map and warnings for observations mapped more than once.
pub fn parse_taxon_map(content: &str, delim: char, source: &str) -> Result<(TaxonMap, Vec<String>)> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());
    let (_, header) = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("{}: taxon map is empty", source))?;
    let columns: Vec<&str> = header.split(delim).map(|c| c.trim()).collect();
    let find_col = |name: &str| -> Result<usize> {
        columns
            .iter()
            .position(|&c| c == name)
            .ok_or_else(|| anyhow::anyhow!("{}: column '{}' not found", source, name))
    };
    let idx_obs = find_col(COL_OBSERVATION)?;
    let idx_tax = find_col(COL_TAXON)?;

    let mut map = TaxonMap::new();
    let mut warnings = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let parts: Vec<&str> = line.split(delim).map(|p| p.trim()).collect();
        let (Some(obs), Some(tax)) = (parts.get(idx_obs), parts.get(idx_tax)) else {
            bail!("{}:{} missing column", source, line_no);
        };
        if obs.is_empty() || tax.is_empty() {
            continue;
        }
        if !map.insert(obs.to_string(), tax.to_string()) {
            warnings.push(format!(
                "{}:{} observation '{}' mapped again, first mapping kept",
                source, line_no, obs
            ));
        }
    }
    if map.is_empty() {
        bail!("{}: taxon map has no entry", source);
    }
    Ok((map, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn reads_csv_and_tsv() {
        let t = parse_abundance_table("observation_name,S1,S2\nasv1,10,0\nasv2,5,2.5\n", ',', "t")
            .unwrap();
        assert_eq!(t.samples, vec!["S1", "S2"]);
        assert_eq!(t.sample_totals(), vec![15.0, 2.5]);
        assert_eq!(delimiter_for(Path::new("a/b.CSV.gz")), ',');
        assert_eq!(delimiter_for(Path::new("a/b.tsv")), '\t');
    }

    #[test]
    fn negative_and_duplicate_values_are_fatal() {
        assert!(parse_abundance_table("o\tS\na\t-1\n", '\t', "t").is_err());
        assert!(parse_abundance_table("o\tS\na\t1\na\t2\n", '\t', "t").is_err());
        assert!(parse_abundance_table("o\tS\na\tNaN\n", '\t', "t").is_err());
    }

    #[test]
    fn gzipped_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abundance.tsv.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        gz.write_all(b"observation_name\tS1\norg1\t3\n").unwrap();
        gz.finish().unwrap();
        let t = read_abundance_table(&path).unwrap();
        assert_eq!(t.get("org1"), Some(&[3.0][..]));
    }

    #[test]
    fn taxon_map_by_column_name() {
        let (map, warnings) = parse_taxon_map(
            "tax_id_name\tobservation_name\ntaxA\tasv1\ntaxB\tasv1\ntaxB\tasv2\n",
            '\t',
            "t",
        )
        .unwrap();
        assert_eq!(map.taxon_of("asv1"), Some("taxA"));
        assert_eq!(map.taxon_of("asv2"), Some("taxB"));
        assert_eq!(warnings.len(), 1);
    }
}
