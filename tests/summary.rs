use std::path::PathBuf;

use kira_cyclehmm::annot::CohortAggregate;
use kira_cyclehmm::ctx::{Ctx, RunMode};
use kira_cyclehmm::db::{Database, RuleTable, ThresholdTable};
use kira_cyclehmm::io::summary::format_summary;
use kira_cyclehmm::schema::v1::Failure;

#[test]
fn summary_format() {
    let mut ctx = Ctx::new(
        RunMode::Search,
        PathBuf::from("proteins"),
        PathBuf::from("db"),
        PathBuf::from("out"),
        "0.0.0-test",
    );
    let mut thresholds = ThresholdTable::new();
    thresholds.insert("A.hmm".to_string(), 40.0);
    ctx.database = Some(Database {
        root: PathBuf::from("db"),
        thresholds,
        functions: Vec::new(),
        pathways: RuleTable::default(),
        phenotypes: None,
        network: None,
        library: None,
        warnings: Vec::new(),
    });
    ctx.pathway_totals = vec![
        CohortAggregate {
            name: "X".to_string(),
            count: 1,
            coverage: 0.5,
        },
        CohortAggregate {
            name: "Y".to_string(),
            count: 0,
            coverage: 0.0,
        },
    ];
    ctx.failures = vec![Failure {
        organism: "org3".to_string(),
        cause: "hmmsearch exited with status 1".to_string(),
    }];

    let s = format_summary(&ctx).unwrap();
    assert!(s.contains("kira-cyclehmm v"));
    assert!(s.contains("mode=run"));
    assert!(s.contains("Database: 1 profiles"));
    assert!(s.contains("1/2 pathways found"));
    assert!(s.contains("Failures: org3"));
}
