use std::io::Write;
use std::path::Path;

use anyhow::{Result, bail};

use crate::annot::CohortAggregate;
use crate::annot::abundance::WeightedMatrix;
use crate::annot::cohort::{CompletenessMatrix, PresenceMatrix};
use crate::io::write_atomic;

/// Rows are functions, columns organisms; cells are ratios or `NA`.
pub fn write_function_presence(path: &Path, matrix: &CompletenessMatrix) -> Result<()> {
    write_atomic(path, |w| {
        write!(w, "function")?;
        for org in &matrix.organisms {
            write!(w, "\t{}", org)?;
        }
        writeln!(w)?;
        for (name, row) in matrix.functions.iter().zip(&matrix.values) {
            ensure_len(row.len(), matrix.organisms.len(), name)?;
            write!(w, "{}", name)?;
            for c in row {
                write!(w, "\t{}", c)?;
            }
            writeln!(w)?;
        }
        Ok(())
    })
}

/// Rows are organisms, columns rules; cells are 0/1.
pub fn write_presence_matrix(path: &Path, matrix: &PresenceMatrix) -> Result<()> {
    write_atomic(path, |w| {
        write!(w, "organism")?;
        for col in &matrix.columns {
            write!(w, "\t{}", col)?;
        }
        writeln!(w)?;
        for (org, row) in matrix.organisms.iter().zip(&matrix.values) {
            ensure_len(row.len(), matrix.columns.len(), org)?;
            write!(w, "{}", org)?;
            for v in row {
                write!(w, "\t{}", u8::from(*v))?;
            }
            writeln!(w)?;
        }
        Ok(())
    })
}

/// `name<TAB>count<TAB>coverage`, no header.
pub fn write_totals(path: &Path, totals: &[CohortAggregate]) -> Result<()> {
    write_atomic(path, |w| {
        for t in totals {
            writeln!(w, "{}\t{}\t{:.6}", t.name, t.count, t.coverage)?;
        }
        Ok(())
    })
}

/// One `<organism>.R_input.txt` per organism: `pathway<TAB>0|1`.
pub fn write_organism_diagrams(dir: &Path, matrix: &PresenceMatrix) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(matrix.organisms.len());
    for (org, row) in matrix.organisms.iter().zip(&matrix.values) {
        let file_name = format!("{}.R_input.txt", org);
        write_atomic(&dir.join(&file_name), |w| {
            for (col, v) in matrix.columns.iter().zip(row) {
                writeln!(w, "{}\t{}", col, u8::from(*v))?;
            }
            Ok(())
        })?;
        written.push(file_name);
    }
    Ok(written)
}

/// `function<TAB>ratio` with a header.
pub fn write_occurrence(path: &Path, occurrence: &[CohortAggregate]) -> Result<()> {
    write_atomic(path, |w| {
        writeln!(w, "function\tratio")?;
        for o in occurrence {
            writeln!(w, "{}\t{:.6}", o.name, o.coverage)?;
        }
        Ok(())
    })
}

pub fn write_weighted_matrix(path: &Path, label: &str, matrix: &WeightedMatrix) -> Result<()> {
    write_atomic(path, |w| {
        write!(w, "{}", label)?;
        for s in &matrix.samples {
            write!(w, "\t{}", s)?;
        }
        writeln!(w)?;
        for (name, row) in matrix.rows.iter().zip(&matrix.values) {
            ensure_len(row.len(), matrix.samples.len(), name)?;
            write!(w, "{}", name)?;
            for v in row {
                write!(w, "\t{:.6}", v)?;
            }
            writeln!(w)?;
        }
        Ok(())
    })
}

fn ensure_len(actual: usize, expected: usize, row: &str) -> Result<()> {
    if actual != expected {
        bail!("row '{}' has {} cells, expected {}", row, actual, expected);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annot::classify::Completeness;
    use tempfile::TempDir;

    #[test]
    fn function_presence_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("function_presence.tsv");
        let matrix = CompletenessMatrix {
            functions: vec!["Methanogenesis mcr".to_string()],
            organisms: vec!["org1".to_string(), "org2".to_string()],
            values: vec![vec![Completeness::Ratio(2.0 / 3.0), Completeness::NotApplicable]],
        };
        write_function_presence(&path, &matrix).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "function\torg1\torg2\nMethanogenesis mcr\t0.666667\tNA\n"
        );
    }

    #[test]
    fn presence_and_diagrams() {
        let dir = TempDir::new().unwrap();
        let matrix = PresenceMatrix {
            organisms: vec!["org1".to_string()],
            columns: vec!["A".to_string(), "B".to_string()],
            values: vec![vec![true, false]],
        };
        write_presence_matrix(&dir.path().join("p.tsv"), &matrix).unwrap();
        let text = std::fs::read_to_string(dir.path().join("p.tsv")).unwrap();
        assert_eq!(text, "organism\tA\tB\norg1\t1\t0\n");

        let files = write_organism_diagrams(dir.path(), &matrix).unwrap();
        assert_eq!(files, vec!["org1.R_input.txt"]);
        let text = std::fs::read_to_string(dir.path().join("org1.R_input.txt")).unwrap();
        assert_eq!(text, "A\t1\nB\t0\n");
    }
}
