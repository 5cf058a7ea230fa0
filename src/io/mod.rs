use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde::Serialize;

pub mod graphml;
pub mod hits;
pub mod json_writer;
pub mod summary;
pub mod tables;
pub mod tsv_writer;

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    write_atomic(path, |w| {
        serde_json::to_writer_pretty(&mut *w, value)?;
        writeln!(w)?;
        Ok(())
    })
}

/// Writes to `<path>.tmp` and renames it into place, so readers never see a
/// partial file.
pub fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    let file =
        File::create(tmp).with_context(|| format!("failed to create {}", tmp.display()))?;
    let mut w = BufWriter::new(file);
    fill(&mut w).with_context(|| format!("failed to write {}", path.display()))?;
    w.flush()?;
    drop(w);
    std::fs::rename(tmp, path)
        .with_context(|| format!("failed to move {} into place", path.display()))?;
    Ok(())
}

pub(crate) fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let decoder = GzDecoder::new(file);
        Ok(Box::new(decoder))
    } else {
        Ok(Box::new(file))
    }
}

pub(crate) fn read_maybe_gz(path: &Path) -> Result<String> {
    let mut content = String::new();
    open_maybe_gz(path)?
        .read_to_string(&mut content)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(content)
}
