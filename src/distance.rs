use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::abundance_table::AbundanceTable;
use crate::error::{BetaError, Result};

/// Pairwise dissimilarity measures between sample columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    JensenShannonDistance,
}

impl Metric {
    pub const ALL: [Metric; 1] = [Metric::JensenShannonDistance];

    pub fn name(self) -> &'static str {
        match self {
            Metric::JensenShannonDistance => "jensen_shannon_distance",
        }
    }

    /// Distance between two probability vectors aligned on the same taxa.
    pub fn distance(self, p: &[f64], q: &[f64]) -> f64 {
        match self {
            Metric::JensenShannonDistance => jensen_shannon_distance(p, q),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = BetaError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.name() == s)
            .ok_or_else(|| BetaError::UnsupportedMetric(s.to_string()))
    }
}

/// Scales a vector by its L1 norm. Returns `None` when the norm is zero.
///
/// Values are first divided by their largest magnitude so the sum stays
/// finite even for abundances near `f64::MAX`.
pub fn normalize_l1(values: &[f64]) -> Option<Vec<f64>> {
    let max = values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if max == 0.0 || !max.is_finite() {
        return None;
    }

    let scaled: Vec<f64> = values.iter().map(|v| v / max).collect();
    let norm: f64 = scaled.iter().map(|v| v.abs()).sum();
    Some(scaled.into_iter().map(|v| v / norm).collect())
}

/// Kullback-Leibler divergence D(a || b) in nats.
/// Terms where a_i is zero contribute nothing.
pub fn kl_divergence(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .filter(|&(&ai, _)| ai > 0.0)
        .map(|(&ai, &bi)| ai * (ai / bi).ln())
        .sum()
}

/// Jensen-Shannon distance between two probability vectors.
///
/// sqrt(0.5 KL(P || M) + 0.5 KL(Q || M)) with M = (P + Q) / 2.
/// Range [0, sqrt(ln 2)]; rounding noise below zero is clamped.
///
/// # Panics
///
/// Panics if `p` and `q` differ in length. Columns of one
/// [`AbundanceTable`] always have the same length.
pub fn jensen_shannon_distance(p: &[f64], q: &[f64]) -> f64 {
    assert_eq!(p.len(), q.len(), "Samples must have same length");

    let m: Vec<f64> = p.iter().zip(q).map(|(pi, qi)| 0.5 * (pi + qi)).collect();
    let divergence = 0.5 * (kl_divergence(p, &m) + kl_divergence(q, &m));
    divergence.max(0.0).sqrt()
}

/// Symmetric sample x sample distance matrix with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    samples: Vec<String>,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.len();
        if i < n && j < n {
            Some(self.values[i * n + j])
        } else {
            None
        }
    }

    /// Lookup by sample name.
    pub fn distance(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.samples.iter().position(|s| s == a)?;
        let j = self.samples.iter().position(|s| s == b)?;
        self.get(i, j)
    }
}

// {"s1": {"s1": 0.0, "s2": 0.41}, "s2": {...}}
impl Serialize for DistanceMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct Row<'a> {
            samples: &'a [String],
            values: &'a [f64],
        }

        impl Serialize for Row<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.samples.len()))?;
                for (sample, value) in self.samples.iter().zip(self.values) {
                    map.serialize_entry(sample, value)?;
                }
                map.end()
            }
        }

        let n = self.len();
        let mut map = serializer.serialize_map(Some(n))?;
        for (i, sample) in self.samples.iter().enumerate() {
            let row = Row {
                samples: &self.samples,
                values: &self.values[i * n..(i + 1) * n],
            };
            map.serialize_entry(sample, &row)?;
        }
        map.end()
    }
}

/// Computes `metric` between every pair of sample columns of `table`.
///
/// Every column is normalized first, so a sample with zero total
/// abundance fails with `InvalidSample` even in a single-sample table.
pub fn compute_matrix(table: &AbundanceTable, metric: Metric) -> Result<DistanceMatrix> {
    let n = table.n_samples();
    let samples = table.samples().to_vec();

    let mut distributions = Vec::with_capacity(n);
    for (col, sample) in samples.iter().enumerate() {
        let column = table.column(col).unwrap_or_default();
        let normalized = normalize_l1(&column).ok_or_else(|| BetaError::InvalidSample {
            sample: sample.clone(),
        })?;
        distributions.push(normalized);
    }

    let mut values = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = metric.distance(&distributions[i], &distributions[j]);
            values[i * n + j] = d;
            values[j * n + i] = d;
        }
    }

    Ok(DistanceMatrix { samples, values })
}
