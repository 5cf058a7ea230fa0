use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use kira_cyclehmm::annot::HitRecord;
use kira_cyclehmm::ctx::{Ctx, RunMode};
use kira_cyclehmm::pipeline::Pipeline;
use kira_cyclehmm::search::{HmmSearch, Protein};
use tempfile::TempDir;

/// Canned hits per organism: `(protein, profile, score)`.
struct FakeSearch {
    hits: HashMap<String, Vec<(&'static str, &'static str, f64)>>,
}

impl HmmSearch for FakeSearch {
    fn search(&self, organism: &str, proteins: &[Protein]) -> Result<Vec<HitRecord>> {
        let Some(hits) = self.hits.get(organism) else {
            bail!("hmmsearch exited with status 1");
        };
        Ok(hits
            .iter()
            .map(|(protein, profile, score)| HitRecord {
                organism: organism.to_string(),
                protein: protein.to_string(),
                profile: profile.to_string(),
                evalue: 1e-30,
                score: *score,
                length: proteins
                    .iter()
                    .find(|p| p.id == *protein)
                    .map_or(0, |p| p.seq.len() as u64),
            })
            .collect())
    }
}

fn write_database(dir: &Path) {
    fs::write(
        dir.join("hmm_table_template.tsv"),
        "Hmm file\tHmm detecting threshold\tFunction\tGene abbreviation\tCategory\n\
         A.hmm\t40\tStep A\tgA\tCarbon\n\
         B.hmm\t40\tStep B\tgB\tCarbon\n\
         C.hmm\t40\tStep C\tgC\tSulfur\n",
    )
    .unwrap();
    fs::write(
        dir.join("cycle_pathways.tsv"),
        "Pathways\tHMMs\nX\tA.hmm; B.hmm\nY\tC.hmm\n",
    )
    .unwrap();
}

fn write_proteins(dir: &Path, organism: &str) {
    fs::write(
        dir.join(format!("{}.faa", organism)),
        ">p1 cytochrome c\nMKACGTCHLL\n>p2 hypothetical\nMSTAAAL\n",
    )
    .unwrap();
}

fn search_ctx(input: &Path, db: &Path, out: &Path) -> Ctx {
    let mut hits = HashMap::new();
    hits.insert(
        "org1".to_string(),
        vec![("p1", "A.hmm", 50.0), ("p2", "B.hmm", 39.9)],
    );
    hits.insert(
        "org2".to_string(),
        vec![
            ("p1", "A.hmm", 50.0),
            ("p2", "B.hmm", 45.0),
            ("p2", "C.hmm", 60.0),
        ],
    );
    let mut ctx = Ctx::new(
        RunMode::Search,
        input.to_path_buf(),
        db.to_path_buf(),
        out.to_path_buf(),
        "test",
    );
    ctx.cores = 2;
    ctx.searcher = Some(Arc::new(FakeSearch { hits }));
    ctx
}

#[test]
fn failed_organism_is_isolated_and_reported() {
    let db = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_database(db.path());
    for org in ["org1", "org2", "org3"] {
        write_proteins(input.path(), org);
    }

    let mut ctx = search_ctx(input.path(), db.path(), out.path());
    Pipeline::for_mode(RunMode::Search).run(&mut ctx).unwrap();

    assert_eq!(ctx.failures.len(), 1);
    assert_eq!(ctx.failures[0].organism, "org3");
    assert!(ctx.failures[0].cause.contains("status 1"));
    assert_eq!(ctx.cohort.len(), 2);
    assert_eq!(ctx.report.organisms.input, 3);
    assert_eq!(ctx.report.organisms.processed, 2);
    assert_eq!(ctx.report.organisms.failed, 1);

    let hits_dir = out.path().join("hmm_results");
    assert!(hits_dir.join("org1.tsv").exists());
    assert!(hits_dir.join("org2.tsv").exists());
    assert!(!hits_dir.join("org3.tsv").exists());

    // B.hmm at 39.9 stays below its threshold of 40.
    let org1 = fs::read_to_string(hits_dir.join("org1.tsv")).unwrap();
    assert_eq!(org1.lines().count(), 2);
    assert!(org1.contains("\tA.hmm\t"));
    assert!(!org1.contains("\tB.hmm\t"));

    let totals = fs::read_to_string(out.path().join("diagram_input/Total.R_input.txt")).unwrap();
    assert_eq!(totals, "X\t1\t0.500000\nY\t1\t0.500000\n");
}

#[test]
fn motif_rule_rejects_hits_without_pattern() {
    let db = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_database(db.path());
    write_proteins(input.path(), "org1");
    write_proteins(input.path(), "org2");
    let motifs = db.path().join("motif.json");
    fs::write(&motifs, r#"{"C.hmm": ["CXXCH"], "Z.hmm": "AAA"}"#).unwrap();

    let mut ctx = search_ctx(input.path(), db.path(), out.path());
    ctx.motif_path = Some(motifs);
    Pipeline::for_mode(RunMode::Search).run(&mut ctx).unwrap();

    // C.hmm only hits p2, which has no CXXCH motif.
    let presence = fs::read_to_string(out.path().join("pathway_presence.tsv")).unwrap();
    assert_eq!(presence, "organism\tX\tY\norg1\t0\t0\norg2\t1\t0\n");
    assert!(
        ctx.warnings
            .iter()
            .any(|w| w.contains("unknown profile 'Z.hmm'"))
    );
    let org2 = fs::read_to_string(out.path().join("hmm_results/org2.tsv")).unwrap();
    assert!(!org2.contains("C.hmm"));
}

#[test]
fn single_core_matches_parallel_run() {
    let db = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    let out_a = TempDir::new().unwrap();
    let out_b = TempDir::new().unwrap();
    write_database(db.path());
    write_proteins(input.path(), "org1");
    write_proteins(input.path(), "org2");

    let mut serial = search_ctx(input.path(), db.path(), out_a.path());
    serial.cores = 1;
    Pipeline::for_mode(RunMode::Search).run(&mut serial).unwrap();
    let mut parallel = search_ctx(input.path(), db.path(), out_b.path());
    parallel.cores = 4;
    Pipeline::for_mode(RunMode::Search).run(&mut parallel).unwrap();

    for file in [
        "function_presence.tsv",
        "pathway_presence.tsv",
        "hmm_results/org1.tsv",
        "hmm_results/org2.tsv",
    ] {
        assert_eq!(
            fs::read(out_a.path().join(file)).unwrap(),
            fs::read(out_b.path().join(file)).unwrap(),
            "{} differs",
            file
        );
    }
}
