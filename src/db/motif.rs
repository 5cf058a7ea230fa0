use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::db::{ProfileId, normalize_profile_id};

/// Rules that refine which hits count as confirmed.
///
/// `motifs`: a hit on the profile counts only if its protein carries one of
/// the residue patterns (`X` matches any residue).
/// `pairs`: when one protein passes for both profiles of a pair, only the
/// better-scoring profile is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotifRules {
    pub motifs: BTreeMap<ProfileId, Vec<String>>,
    pub pairs: Vec<(ProfileId, ProfileId)>,
}

impl MotifRules {
    pub fn is_empty(&self) -> bool {
        self.motifs.is_empty() && self.pairs.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MotifEntry {
    One(String),
    Many(Vec<String>),
}

pub fn load_motif_rules(path: &Path) -> Result<BTreeMap<ProfileId, Vec<String>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read motif file {}", path.display()))?;
    parse_motif_rules(&content).with_context(|| format!("invalid motif file {}", path.display()))
}

pub fn parse_motif_rules(content: &str) -> Result<BTreeMap<ProfileId, Vec<String>>> {
    let raw: BTreeMap<String, MotifEntry> = serde_json::from_str(content)?;
    let mut out = BTreeMap::new();
    for (profile, entry) in raw {
        let patterns = match entry {
            MotifEntry::One(p) => vec![p],
            MotifEntry::Many(ps) => ps,
        };
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.trim().to_ascii_uppercase())
            .filter(|p| !p.is_empty())
            .collect();
        if patterns.is_empty() {
            bail!("profile '{}' has no motif pattern", profile);
        }
        out.insert(normalize_profile_id(&profile), patterns);
    }
    Ok(out)
}

pub fn load_motif_pair_rules(path: &Path) -> Result<Vec<(ProfileId, ProfileId)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read motif pair file {}", path.display()))?;
    parse_motif_pair_rules(&content)
        .with_context(|| format!("invalid motif pair file {}", path.display()))
}

pub fn parse_motif_pair_rules(content: &str) -> Result<Vec<(ProfileId, ProfileId)>> {
    let raw: BTreeMap<String, String> = serde_json::from_str(content)?;
    let mut pairs = Vec::with_capacity(raw.len());
    for (a, b) in raw {
        let a = normalize_profile_id(&a);
        let b = normalize_profile_id(&b);
        if a == b {
            bail!("motif pair '{}' pairs a profile with itself", a);
        }
        pairs.push((a, b));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_and_list_patterns() {
        let motifs =
            parse_motif_rules(r#"{"dsrC.hmm": "gpxxc", "K00001.hmm": ["CXXC", "HXH"]}"#).unwrap();
        assert_eq!(motifs["dsrC.hmm"], vec!["GPXXC"]);
        assert_eq!(motifs["K00001.hmm"].len(), 2);
    }

    #[test]
    fn self_pair_is_rejected() {
        assert!(parse_motif_pair_rules(r#"{"a.hmm": "a.hmm"}"#).is_err());
        let pairs = parse_motif_pair_rules(r#"{"pmoA.hmm": "amoA.hmm"}"#).unwrap();
        assert_eq!(pairs, vec![("pmoA.hmm".to_string(), "amoA.hmm".to_string())]);
    }
}
