use kira_cyclehmm::annot::classify::{Completeness, function_completeness};
use kira_cyclehmm::annot::cohort::presence_matrix;
use kira_cyclehmm::annot::rules::evaluate_all;
use kira_cyclehmm::annot::{ConfirmedSet, OrganismHits};
use kira_cyclehmm::db::{FunctionDef, parse_hmm_table, parse_rule_table};

fn confirmed(profiles: &[&str]) -> ConfirmedSet {
    profiles.iter().map(|p| p.to_string()).collect()
}

#[test]
fn exclusion_marker_switches_pathway_off() {
    let table = parse_rule_table("Pathways\tHMMs\nP\tA.hmm; B.hmm, NO|C.hmm\n", "rules").unwrap();

    let with_c = evaluate_all(&table, &confirmed(&["A.hmm", "B.hmm", "C.hmm"]));
    assert!(!with_c["P"]);
    let without_c = evaluate_all(&table, &confirmed(&["A.hmm", "B.hmm"]));
    assert!(without_c["P"]);
    let only_a = evaluate_all(&table, &confirmed(&["A.hmm"]));
    assert!(!only_a["P"]);
}

#[test]
fn full_suffix_in_rules_matches_plain_profile() {
    let table = parse_rule_table("P\tK00001_full.hmm\n", "rules").unwrap();
    assert!(evaluate_all(&table, &confirmed(&["K00001.hmm"]))["P"]);
}

#[test]
fn completeness_ignores_profile_order() {
    let table = parse_hmm_table(
        "Hmm file\tHmm detecting threshold\tFunction\tGene abbreviation\n\
         A.hmm, B.hmm, C.hmm\t10\tStep\tg\n",
        "hmm",
    )
    .unwrap();
    let def = &table.functions[0];
    let reversed = FunctionDef {
        profiles: def.profiles.iter().rev().cloned().collect(),
        ..def.clone()
    };
    let set = confirmed(&["C.hmm", "A.hmm"]);
    assert_eq!(function_completeness(def, &set), function_completeness(&reversed, &set));
    assert_eq!(
        function_completeness(def, &set).ratio().map(|r| format!("{:.6}", r)),
        Some("0.666667".to_string())
    );
    assert_eq!(
        function_completeness(def, &confirmed(&["D.hmm"])),
        Completeness::NotApplicable
    );
}

#[test]
fn matrix_rows_follow_cohort_and_columns_are_sorted() {
    let table = parse_rule_table("Zeta\tA.hmm\nAlpha\tB.hmm\n", "rules").unwrap();
    let cohort = vec![
        OrganismHits {
            organism: "org1".to_string(),
            confirmed: confirmed(&["A.hmm"]),
        },
        OrganismHits {
            organism: "org2".to_string(),
            confirmed: confirmed(&["A.hmm", "B.hmm"]),
        },
    ];
    let matrix = presence_matrix(&cohort, &table);
    assert_eq!(matrix.columns, vec!["Alpha", "Zeta"]);
    assert_eq!(matrix.row("org1").unwrap(), &[false, true]);
    let totals = matrix.totals();
    assert_eq!(totals[0].count, 1);
    assert_eq!(totals[1].count, 2);
    assert_eq!(totals[1].coverage, 1.0);
}
