use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use indexmap::IndexMap;
use log::info;
use rayon::prelude::*;
use serde::Serialize;

use crate::abundance_table::AbundanceTable;
use crate::distance::{compute_matrix, DistanceMatrix, Metric};
use crate::error::{BetaError, Result};
use crate::sample_set::ToolSampleSet;
use crate::taxon_filter::Rank;

/// Run settings taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct AnalysisParams {
    /// Worker threads; 0 keeps the rayon default.
    pub threads: usize,
    /// Where to dump every abundance table as TSV, if anywhere.
    pub tables_dir: Option<PathBuf>,
    pub pretty: bool,
}

/// Distance matrices of one rank, per metric and tool.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricResults {
    pub jensen_shannon_distance: IndexMap<String, DistanceMatrix>,
}

impl MetricResults {
    pub fn metric(&self, metric: Metric) -> &IndexMap<String, DistanceMatrix> {
        match metric {
            Metric::JensenShannonDistance => &self.jensen_shannon_distance,
        }
    }

    fn metric_mut(&mut self, metric: Metric) -> &mut IndexMap<String, DistanceMatrix> {
        match metric {
            Metric::JensenShannonDistance => &mut self.jensen_shannon_distance,
        }
    }
}

/// rank -> metric -> tool -> distance matrix
#[derive(Debug, Clone, Default, Serialize)]
pub struct BetaDiversityReport {
    pub species: MetricResults,
    pub genus: MetricResults,
}

impl BetaDiversityReport {
    pub fn rank(&self, rank: Rank) -> &MetricResults {
        match rank {
            Rank::Species => &self.species,
            Rank::Genus => &self.genus,
        }
    }

    fn rank_mut(&mut self, rank: Rank) -> &mut MetricResults {
        match rank {
            Rank::Species => &mut self.species,
            Rank::Genus => &mut self.genus,
        }
    }

    /// Writes the report as a single JSON document.
    pub fn write_json<W: Write>(&self, writer: W, pretty: bool) -> Result<()> {
        if pretty {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_json::to_writer(writer, self)?;
        }
        Ok(())
    }
}

struct JobOutput<'a> {
    rank: Rank,
    tool: &'a str,
    matrices: Vec<(Metric, DistanceMatrix)>,
}

/// Computes every metric for every tool set at every rank.
///
/// Each (rank, tool) pair is an independent job. All jobs finish before
/// the report is assembled and the first failure aborts the run.
pub fn compute_beta_diversity(sets: &[ToolSampleSet], params: &AnalysisParams) -> Result<BetaDiversityReport> {
    let mut seen = HashSet::new();
    for set in sets {
        set.validate()?;
        if !seen.insert(set.tool.as_str()) {
            return Err(BetaError::DuplicateTool(set.tool.clone()));
        }
    }

    let start = Instant::now();
    let outputs = if params.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(params.threads).build()?;
        pool.install(|| run_jobs(sets, params))?
    } else {
        run_jobs(sets, params)?
    };

    let mut report = BetaDiversityReport::default();
    for output in outputs {
        let results = report.rank_mut(output.rank);
        for (metric, matrix) in output.matrices {
            results.metric_mut(metric).insert(output.tool.to_string(), matrix);
        }
    }

    info!(
        "{} tool set(s) x {} rank(s) done in {:.3}s",
        sets.len(),
        Rank::ALL.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(report)
}

fn run_jobs<'a>(sets: &'a [ToolSampleSet], params: &AnalysisParams) -> Result<Vec<JobOutput<'a>>> {
    let jobs: Vec<(Rank, &ToolSampleSet)> = Rank::ALL
        .iter()
        .flat_map(|&rank| sets.iter().map(move |set| (rank, set)))
        .collect();

    jobs.par_iter()
        .map(|&(rank, set)| run_job(rank, set, params))
        .collect()
}

fn run_job<'a>(rank: Rank, set: &'a ToolSampleSet, params: &AnalysisParams) -> Result<JobOutput<'a>> {
    let table = AbundanceTable::build(&set.samples, rank)?;

    if let Some(dir) = &params.tables_dir {
        table.write_tsv(dir.join(format!("{}.{}.tsv", set.tool, table.rank())))?;
    }

    let matrices = Metric::ALL
        .iter()
        .map(|&metric| compute_matrix(&table, metric).map(|matrix| (metric, matrix)))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "{} / {}: {} taxa across {} samples",
        set.tool,
        table.rank(),
        table.n_taxa(),
        table.n_samples()
    );
    Ok(JobOutput {
        rank,
        tool: &set.tool,
        matrices,
    })
}
