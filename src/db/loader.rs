use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::db::{FunctionDef, ProfileId, ThresholdTable};

const COL_PROFILES: &str = "Hmm file";
const COL_THRESHOLD: &str = "Hmm detecting threshold";
const COL_FUNCTION: &str = "Function";
const COL_GENE: &str = "Gene abbreviation";
const COL_CATEGORY: &str = "Category";

#[derive(Debug, Clone)]
pub struct HmmTable {
    pub thresholds: ThresholdTable,
    pub functions: Vec<FunctionDef>,
    pub warnings: Vec<String>,
}

pub fn load_hmm_table(path: &Path) -> Result<HmmTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read HMM table {}", path.display()))?;
    parse_hmm_table(&content, &path.display().to_string())
}

/// Strips the `_full` marker some search outputs append to profile names.
pub fn normalize_profile_id(raw: &str) -> ProfileId {
    let raw = raw.trim();
    match raw.strip_suffix(".hmm") {
        Some(stem) => match stem.strip_suffix("_full") {
            Some(base) => format!("{}.hmm", base),
            None => raw.to_string(),
        },
        None => raw.strip_suffix("_full").unwrap_or(raw).to_string(),
    }
}

pub fn parse_hmm_table(content: &str, source: &str) -> Result<HmmTable> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.starts_with('#'));

    let (_, header) = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("{}: HMM table is empty", source))?;
    let columns: Vec<&str> = header.split('\t').map(|c| c.trim()).collect();
    let find_col = |name: &str| -> Result<usize> {
        columns
            .iter()
            .position(|&c| c == name)
            .ok_or_else(|| anyhow::anyhow!("{}: column '{}' not found", source, name))
    };
    let idx_profiles = find_col(COL_PROFILES)?;
    let idx_threshold = find_col(COL_THRESHOLD)?;
    let idx_function = find_col(COL_FUNCTION)?;
    let idx_gene = find_col(COL_GENE)?;
    let idx_category = columns.iter().position(|&c| c == COL_CATEGORY);

    let mut thresholds = ThresholdTable::new();
    let mut functions: HashMap<String, FunctionDef> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut warnings = Vec::new();
    let mut rows = 0usize;

    for (idx, line) in lines {
        let line_no = idx + 1;
        let parts: Vec<&str> = line.split('\t').map(|p| p.trim()).collect();
        let field = |i: usize| -> Result<&str> {
            parts
                .get(i)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("{}:{} missing column {}", source, line_no, i + 1))
        };

        let profiles: Vec<ProfileId> = field(idx_profiles)?
            .split(',')
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(normalize_profile_id)
            .collect();
        if profiles.is_empty() {
            bail!("{}:{} no HMM file listed", source, line_no);
        }

        let threshold = parse_threshold(field(idx_threshold)?)
            .with_context(|| format!("{}:{} invalid detection threshold", source, line_no))?;

        let function = field(idx_function)?;
        let gene = field(idx_gene)?;
        if function.is_empty() {
            bail!("{}:{} empty function name", source, line_no);
        }
        let name = if gene.is_empty() {
            function.to_string()
        } else {
            format!("{} {}", function, gene)
        };
        let category = idx_category
            .and_then(|i| parts.get(i))
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string());

        for profile in &profiles {
            if !thresholds.insert(profile.clone(), threshold) {
                let kept = thresholds.get(profile).unwrap_or(threshold);
                if kept != threshold {
                    warnings.push(format!(
                        "{}:{} profile '{}' listed again with threshold {} (kept {})",
                        source, line_no, profile, threshold, kept
                    ));
                }
            }
        }

        let def = functions.entry(name.clone()).or_insert_with(|| {
            order.push(name.clone());
            FunctionDef {
                name: name.clone(),
                category: category.clone(),
                profiles: Vec::new(),
            }
        });
        for profile in profiles {
            if !def.profiles.contains(&profile) {
                def.profiles.push(profile);
            }
        }
        rows += 1;
    }

    if rows == 0 {
        bail!("{}: HMM table has no data rows", source);
    }

    let functions = order
        .into_iter()
        .filter_map(|name| functions.remove(&name))
        .collect();

    Ok(HmmTable {
        thresholds,
        functions,
        warnings,
    })
}

/// Only the first `|`-separated alternative is used.
fn parse_threshold(raw: &str) -> Result<f64> {
    let first = raw.split('|').next().unwrap_or("").trim();
    let value: f64 = first
        .parse()
        .with_context(|| format!("'{}' is not a number", raw))?;
    if !value.is_finite() {
        bail!("threshold '{}' is not finite", raw);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "Hmm file\tHmm detecting threshold\tFunction\tGene abbreviation\tCategory\n\
K00001.hmm\t40|60\tAlcohol utilization\tadh\tCarbon\n\
pmoA.hmm, amoA_full.hmm\t120.5\tMethane oxidation\tpmo\tCarbon\n\
K00002.hmm\t35\tAlcohol utilization\tadh\tCarbon\n";

    #[test]
    fn parses_thresholds_and_functions() {
        let table = parse_hmm_table(TABLE, "test").unwrap();
        assert_eq!(table.thresholds.get("K00001.hmm"), Some(40.0));
        assert_eq!(table.thresholds.get("amoA.hmm"), Some(120.5));
        assert_eq!(table.functions.len(), 2);
        assert_eq!(table.functions[0].name, "Alcohol utilization adh");
        assert_eq!(table.functions[0].profiles, vec!["K00001.hmm", "K00002.hmm"]);
        assert_eq!(table.functions[1].category.as_deref(), Some("Carbon"));
    }

    #[test]
    fn missing_column_is_fatal() {
        let err = parse_hmm_table("Hmm file\tFunction\nA.hmm\tX\n", "bad").unwrap_err();
        assert!(err.to_string().contains("Hmm detecting threshold"));
    }

    #[test]
    fn header_only_is_fatal() {
        let header = "Hmm file\tHmm detecting threshold\tFunction\tGene abbreviation\n";
        assert!(parse_hmm_table(header, "empty").is_err());
    }

    #[test]
    fn normalizes_full_suffix() {
        assert_eq!(normalize_profile_id("K00001_full.hmm"), "K00001.hmm");
        assert_eq!(normalize_profile_id("K00001_full"), "K00001");
        assert_eq!(normalize_profile_id(" dsrA.hmm "), "dsrA.hmm");
    }
}
