//! Loader for indexed sample dumps: one `frame,receiver,chirp,sample,value`
//! row per real sample, under a header naming those columns.

use anyhow::Context;
use doacore::interface::SampleCube;
use log::{debug, warn};
use num_complex::Complex64;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct Row {
    frame: usize,
    receiver: usize,
    chirp: usize,
    sample: usize,
    value: f64,
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).trim(csv::Trim::All);
    builder
}

/// Reads every frame in the file into a cube of `shape`, ordered by frame index.
///
/// Rows outside the shape are skipped with a warning; a row that does not
/// decode is an error.
pub fn load_frames<P: AsRef<Path>>(
    path: P,
    shape: (usize, usize, usize),
) -> anyhow::Result<Vec<(usize, SampleCube)>> {
    let path_ref = path.as_ref();
    let reader = reader_builder()
        .from_path(path_ref)
        .with_context(|| format!("opening sample file {}", path_ref.display()))?;
    parse_frames(reader, shape).with_context(|| format!("reading {}", path_ref.display()))
}

fn parse_frames<R: Read>(
    mut reader: csv::Reader<R>,
    shape: (usize, usize, usize),
) -> anyhow::Result<Vec<(usize, SampleCube)>> {
    let (receivers, chirps, samples) = shape;
    let mut frames: BTreeMap<usize, SampleCube> = BTreeMap::new();
    let mut skipped = 0usize;
    let mut rows = 0usize;

    for (index, result) in reader.deserialize::<Row>().enumerate() {
        let row = result.with_context(|| format!("decoding sample row {}", index + 1))?;
        rows += 1;
        let cube = frames
            .entry(row.frame)
            .or_insert_with(|| SampleCube::zeros(receivers, chirps, samples));
        if row.receiver < receivers && row.chirp < chirps && row.sample < samples {
            cube[(row.receiver, row.chirp, row.sample)] = Complex64::new(row.value, 0.0);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        warn!("skipped {} rows outside {}x{}x{}", skipped, receivers, chirps, samples);
    }
    debug!("read {} rows into {} frames", rows, frames.len());
    Ok(frames.into_iter().collect())
}
