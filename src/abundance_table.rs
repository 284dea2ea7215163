use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::error::{BetaError, Result};
use crate::mpa_parser::parse_mpa_profile;
use crate::sample_profile::SampleProfile;
use crate::taxon_filter::Rank;

// Constants for optimization
const BUFFER_SIZE: usize = 256 * 1024; // 256KB buffer for writing

/// Taxa x samples abundance matrix for one tool at one rank.
///
/// Values are stored row-major; rows follow the order taxa were first
/// seen across the samples, columns follow the sample input order.
/// A taxon missing from a sample holds 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceTable {
    rank: Rank,
    taxa: Vec<String>,
    samples: Vec<String>,
    values: Vec<f64>,
}

impl AbundanceTable {
    /// Parses every `(sample, path)` profile in order and aligns them.
    /// The first unreadable or malformed file aborts the whole build.
    pub fn build(samples: &[(String, PathBuf)], rank: Rank) -> Result<Self> {
        let profiles = samples
            .iter()
            .map(|(name, path)| parse_mpa_profile(path, name, rank))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_profiles(&profiles, rank))
    }

    pub fn from_profiles(profiles: &[SampleProfile], rank: Rank) -> Self {
        let mut taxa: IndexSet<&str> = IndexSet::new();
        for profile in profiles {
            taxa.extend(profile.abundances().keys().map(String::as_str));
        }

        let n_samples = profiles.len();
        let mut values = vec![0.0; taxa.len() * n_samples];
        for (col, profile) in profiles.iter().enumerate() {
            for (taxon, &abundance) in profile.abundances() {
                // every key was inserted above
                if let Some(row) = taxa.get_index_of(taxon.as_str()) {
                    values[row * n_samples + col] = abundance;
                }
            }
        }

        Self {
            rank,
            taxa: taxa.into_iter().map(str::to_string).collect(),
            samples: profiles.iter().map(|p| p.name().to_string()).collect(),
            values,
        }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn taxa(&self) -> &[String] {
        &self.taxa
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn n_taxa(&self) -> usize {
        self.taxa.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Abundance of taxon row `row` in sample column `col`.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.n_taxa() && col < self.n_samples() {
            Some(self.values[row * self.n_samples() + col])
        } else {
            None
        }
    }

    /// All abundances of one sample, aligned to `taxa()`.
    pub fn column(&self, col: usize) -> Option<Vec<f64>> {
        if col >= self.n_samples() {
            return None;
        }
        Some(
            self.values
                .iter()
                .skip(col)
                .step_by(self.n_samples())
                .copied()
                .collect(),
        )
    }

    /// Writes the table in TSV format, one taxon per line.
    pub fn write_tsv<P: AsRef<Path>>(&self, output_file: P) -> Result<()> {
        let path = output_file.as_ref();
        self.write_tsv_inner(path).map_err(|source| BetaError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_tsv_inner(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::with_capacity(BUFFER_SIZE, file);

        // Write header
        write!(writer, "Taxon")?;
        for sample in &self.samples {
            write!(writer, "\t{}", sample)?;
        }
        writeln!(writer)?;

        // Write data
        for (row, taxon) in self.taxa.iter().enumerate() {
            write!(writer, "{}", taxon)?;
            let start = row * self.n_samples();
            for abundance in &self.values[start..start + self.n_samples()] {
                write!(writer, "\t{:.6}", abundance)?;
            }
            writeln!(writer)?;
        }

        writer.flush()
    }
}
