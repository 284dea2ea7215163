use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{BetaError, Result};

/// Structure to define generation parameters
#[derive(Debug, Clone)]
pub struct GeneratorParams {
    pub output_dir: PathBuf,
    pub num_samples: usize,
    pub num_genera: usize,
    pub species_per_genus: usize,
    /// Reads scattered over the species of each sample
    pub reads_per_sample: u64,
    /// Also write a `t__` strain line under every species
    pub with_strains: bool,
    /// Fixed seed for reproducible profiles
    pub seed: Option<u64>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("synthetic_profiles"),
            num_samples: 10,
            num_genera: 50,
            species_per_genus: 5,
            reads_per_sample: 100_000,
            with_strains: true,
            seed: None,
        }
    }
}

// Simple weighted distribution struct
struct WeightedDistribution {
    weights: Vec<f64>,
    total: f64,
}

impl WeightedDistribution {
    fn new<R: Rng>(count: usize, rng: &mut R) -> Self {
        let mut weights = Vec::with_capacity(count);
        let mut total = 0.0;

        for _ in 0..count {
            // A quarter of the taxa are absent from any given sample
            let weight = if rng.gen_bool(0.25) { 0.0 } else { rng.gen_range(1.0..10.0) };
            weights.push(weight);
            total += weight;
        }

        if total == 0.0 && count > 0 {
            weights[0] = 1.0;
            total = 1.0;
        }

        Self { weights, total }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let point = rng.gen_range(0.0..self.total);
        let mut sum = 0.0;

        for (i, &weight) in self.weights.iter().enumerate() {
            sum += weight;
            if sum > point {
                return i;
            }
        }

        self.weights.len() - 1 // Fallback
    }
}

/// Writes `num_samples` random MPA profiles into `output_dir` and returns
/// the `(sample, path)` pairs in generation order.
pub fn generate_profiles(params: &GeneratorParams) -> Result<Vec<(String, PathBuf)>> {
    let start = Instant::now();
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    fs::create_dir_all(&params.output_dir).map_err(|source| BetaError::Io {
        path: params.output_dir.clone(),
        source,
    })?;

    let mut samples = Vec::with_capacity(params.num_samples);
    for i in 0..params.num_samples {
        let name = format!("sample_{}", i + 1);
        let path = params.output_dir.join(format!("{}.mpa.txt", name));
        write_profile(&path, params, &mut rng).map_err(|source| BetaError::Io {
            path: path.clone(),
            source,
        })?;
        samples.push((name, path));
    }

    info!(
        "Generated {} profiles in {:.2?}",
        samples.len(),
        start.elapsed()
    );
    Ok(samples)
}

fn write_profile<R: Rng>(path: &Path, params: &GeneratorParams, rng: &mut R) -> std::io::Result<()> {
    let num_species = params.num_genera * params.species_per_genus;
    let distribution = WeightedDistribution::new(num_species, rng);

    let mut counts = vec![0u64; num_species];
    if num_species > 0 {
        for _ in 0..params.reads_per_sample {
            counts[distribution.sample(rng)] += 1;
        }
    }
    let total = params.reads_per_sample.max(1) as f64;

    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "#mpa_synthetic")?;
    writeln!(writer, "#SampleID\tMetaphlan_Analysis")?;
    writeln!(writer, "k__Bacteria\t100.0")?;

    for (g, species_counts) in counts.chunks(params.species_per_genus.max(1)).enumerate() {
        let genus_count: u64 = species_counts.iter().sum();
        if genus_count == 0 {
            continue;
        }
        let genus = format!("k__Bacteria|p__Firmicutes|g__Genus{}", g);
        writeln!(writer, "{}\t{:.5}", genus, genus_count as f64 / total * 100.0)?;

        for (s, &count) in species_counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let abundance = count as f64 / total * 100.0;
            let species = format!("{}|s__Genus{}_sp{}", genus, g, s);
            writeln!(writer, "{}\t{:.5}", species, abundance)?;
            if params.with_strains {
                writeln!(writer, "{}|t__Genus{}_sp{}_str1\t{:.5}", species, g, s, abundance)?;
            }
        }
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpa_parser::parse_mpa_profile;
    use crate::taxon_filter::Rank;

    #[test]
    fn test_generated_profiles_parse() {
        let dir = tempfile::tempdir().unwrap();
        let params = GeneratorParams {
            output_dir: dir.path().to_path_buf(),
            num_samples: 3,
            num_genera: 4,
            species_per_genus: 3,
            reads_per_sample: 1_000,
            seed: Some(7),
            ..Default::default()
        };
        let samples = generate_profiles(&params).unwrap();
        assert_eq!(samples.len(), 3);

        for (name, path) in &samples {
            let species = parse_mpa_profile(path, name, Rank::Species).unwrap();
            let genus = parse_mpa_profile(path, name, Rank::Genus).unwrap();
            assert!(!species.abundances().is_empty());
            assert!(!genus.abundances().is_empty());
            assert!(species.abundances().len() <= 12);
            assert!(genus.abundances().len() <= 4);

            let total: f64 = species.abundances().values().sum();
            assert!((total - 100.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let params = |dir: &Path| GeneratorParams {
            output_dir: dir.to_path_buf(),
            num_samples: 2,
            seed: Some(42),
            reads_per_sample: 500,
            ..Default::default()
        };

        let first = generate_profiles(&params(a.path())).unwrap();
        let second = generate_profiles(&params(b.path())).unwrap();
        for ((_, p1), (_, p2)) in first.iter().zip(&second) {
            assert_eq!(fs::read_to_string(p1).unwrap(), fs::read_to_string(p2).unwrap());
        }
    }
}
