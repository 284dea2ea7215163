use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use log::debug;

use crate::error::{BetaError, Result};
use crate::sample_profile::SampleProfile;
use crate::taxon_filter::Rank;

// Profiles are small, 256KB covers most of them in one read
const BUFFER_SIZE: usize = 256 * 1024;

/// Reads an MPA-style profile (`<taxon path> <abundance>` per line) and
/// keeps the records that sit at `rank`.
///
/// The file handle is dropped on every return path, including a
/// malformed line halfway through the file.
pub fn parse_mpa_profile<P: AsRef<Path>>(path: P, sample_name: &str, rank: Rank) -> Result<SampleProfile> {
    let path = path.as_ref();
    let io_error = |source| BetaError::Io {
        path: path.to_path_buf(),
        source,
    };

    let start = Instant::now();
    let file = File::open(path).map_err(io_error)?;
    let reader = BufReader::with_capacity(BUFFER_SIZE, file);

    let mut profile = SampleProfile::new(sample_name, rank);
    let mut lines = 0usize;
    for line in reader.split(b'\n') {
        let bytes = line.map_err(io_error)?;
        let line = std::str::from_utf8(&bytes).map_err(|_| BetaError::MalformedLine {
            sample: sample_name.to_string(),
            line: String::from_utf8_lossy(&bytes).trim_end().to_string(),
        })?;
        profile.ingest_line(line)?;
        lines += 1;
    }

    debug!(
        "{}: {} lines, {} {} taxa from {} in {:.6}s",
        sample_name,
        lines,
        profile.abundances().len(),
        rank,
        path.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(profile)
}
