use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::db::{Combination, CycleNetwork, RuleDef, RuleTable, RuleToken, normalize_profile_id};

const EXCLUSION_MARKER: &str = "NO|";

pub fn load_rule_table(path: &Path) -> Result<RuleTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rule table {}", path.display()))?;
    parse_rule_table(&content, &path.display().to_string())
}

/// Parses a two-column `name<TAB>spec` table. A first row whose spec column
/// reads `HMMs` is treated as a header.
pub fn parse_rule_table(content: &str, source: &str) -> Result<RuleTable> {
    let mut defs = Vec::new();
    let mut seen = HashSet::new();
    let mut first_row = true;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '\t');
        let name = parts.next().unwrap_or("").trim();
        let spec = parts.next().unwrap_or("").trim();
        if std::mem::take(&mut first_row) && spec.eq_ignore_ascii_case("hmms") {
            continue;
        }
        if name.is_empty() {
            bail!("{}:{} empty rule name", source, line_no);
        }
        if !seen.insert(name.to_string()) {
            bail!("{}:{} duplicate rule '{}'", source, line_no, name);
        }
        let combinations = parse_combination_spec(spec)
            .with_context(|| format!("{}:{} invalid HMM combination", source, line_no))?;
        defs.push(RuleDef {
            name: name.to_string(),
            combinations,
        });
    }

    if defs.is_empty() {
        bail!("{}: rule table has no rules", source);
    }
    Ok(RuleTable { defs })
}

/// `A, B; C, NO|D` -> `[[A, B], [C, !D]]`. Empty segments are skipped, so an
/// empty spec yields no combinations.
pub fn parse_combination_spec(spec: &str) -> Result<Vec<Combination>> {
    let mut combinations = Vec::new();
    for segment in spec.split(';') {
        let mut tokens = Vec::new();
        for raw in segment.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let token = match raw.strip_prefix(EXCLUSION_MARKER) {
                Some(profile) => {
                    let profile = profile.trim();
                    if profile.is_empty() {
                        bail!("exclusion marker without profile in '{}'", segment.trim());
                    }
                    RuleToken::excluded(normalize_profile_id(profile))
                }
                None => RuleToken::required(normalize_profile_id(raw)),
            };
            tokens.push(token);
        }
        if !tokens.is_empty() {
            combinations.push(Combination::new(tokens));
        }
    }
    Ok(combinations)
}

/// First occurrence of each edge id wins.
pub fn rules_from_network(network: &CycleNetwork) -> Result<RuleTable> {
    let mut defs = Vec::new();
    let mut seen = HashSet::new();
    for edge in &network.edges {
        if !seen.insert(edge.id.clone()) {
            continue;
        }
        let combinations = parse_combination_spec(edge.hmm.as_deref().unwrap_or(""))
            .with_context(|| format!("cycle network edge '{}'", edge.id))?;
        defs.push(RuleDef {
            name: edge.id.clone(),
            combinations,
        });
    }
    if defs.is_empty() {
        bail!("cycle network has no edges to derive pathway rules from");
    }
    Ok(RuleTable { defs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TokenKind;

    #[test]
    fn parses_combinations_with_exclusions() {
        let combos = parse_combination_spec("A.hmm, B.hmm; C.hmm, NO|D.hmm").unwrap();
        assert_eq!(combos.len(), 2);
        assert_eq!(combos[0].required().collect::<Vec<_>>(), vec!["A.hmm", "B.hmm"]);
        assert_eq!(combos[1].tokens[1].kind, TokenKind::Excluded);
        assert_eq!(combos[1].excluded().collect::<Vec<_>>(), vec!["D.hmm"]);
    }

    #[test]
    fn empty_spec_has_no_combinations() {
        assert!(parse_combination_spec("").unwrap().is_empty());
        assert!(parse_combination_spec(" ; ").unwrap().is_empty());
    }

    #[test]
    fn bare_marker_is_rejected() {
        assert!(parse_combination_spec("A.hmm,NO|").is_err());
    }

    #[test]
    fn table_header_and_order() {
        let table = parse_rule_table(
            "Pathways\tHMMs\nZ step\tA.hmm\nA step\tB.hmm;C.hmm\n",
            "test",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.defs[0].name, "Z step");
        assert_eq!(table.sorted()[0].name, "A step");
    }

    #[test]
    fn duplicate_rule_is_fatal() {
        assert!(parse_rule_table("P\tA.hmm\nP\tB.hmm\n", "dup").is_err());
    }

    #[test]
    fn empty_table_is_fatal() {
        assert!(parse_rule_table("Pathways\tHMMs\n", "empty").is_err());
    }
}
