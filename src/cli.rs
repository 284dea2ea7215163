use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::info;

use crate::beta_diversity::{compute_beta_diversity, AnalysisParams};
use crate::error::{BetaError, Result};
use crate::sample_set::ToolSampleSet;

pub fn build_cli() -> Command {
    Command::new("betaclip")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Jensen-Shannon beta diversity between MPA taxonomic profiles, per tool and rank")
        .arg(Arg::new("TOOL_SET")
            .help("Tool name followed by <sample> <profile> pairs; repeat once per tool")
            .short('t')
            .long("tool-set")
            .value_name("TOOL SAMPLE PROFILE")
            .num_args(1..)
            .action(ArgAction::Append)
            .required(true))
        .arg(Arg::new("THREADS")
            .help("Worker threads (0 = one per core)")
            .long("threads")
            .value_parser(value_parser!(usize))
            .default_value("0"))
        .arg(Arg::new("TABLES_DIR")
            .help("Also write every abundance table as <tool>.<rank>.tsv into this directory")
            .long("tables-dir")
            .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("PRETTY")
            .help("Pretty-print the JSON report")
            .long("pretty")
            .action(ArgAction::SetTrue))
}

/// Splits every `-t` occurrence into a tool set. No file is touched here.
pub fn parse_tool_sets(matches: &ArgMatches) -> Result<Vec<ToolSampleSet>> {
    let Some(occurrences) = matches.get_occurrences::<String>("TOOL_SET") else {
        return Ok(Vec::new());
    };

    occurrences
        .map(|values| {
            let tokens: Vec<&String> = values.collect();
            match tokens.split_first() {
                Some((tool, samples)) => ToolSampleSet::from_tokens(tool, samples),
                // num_args(1..) always yields the tool name
                None => Err(BetaError::EmptySampleSet(String::new())),
            }
        })
        .collect()
}

pub fn parse_params(matches: &ArgMatches) -> AnalysisParams {
    AnalysisParams {
        threads: matches.get_one::<usize>("THREADS").copied().unwrap_or(0),
        tables_dir: matches.get_one::<PathBuf>("TABLES_DIR").cloned(),
        pretty: matches.get_flag("PRETTY"),
    }
}

pub fn run_cli() -> Result<()> {
    let matches = build_cli().get_matches();
    run(&matches)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let sets = parse_tool_sets(matches)?;
    let params = parse_params(matches);

    if let Some(dir) = &params.tables_dir {
        fs::create_dir_all(dir).map_err(|source| BetaError::Io {
            path: dir.clone(),
            source,
        })?;
    }

    info!(
        "{} tool set(s), {} sample profile(s)",
        sets.len(),
        sets.iter().map(|set| set.samples.len()).sum::<usize>()
    );
    let report = compute_beta_diversity(&sets, &params)?;

    // Only a finished report reaches stdout.
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    report.write_json(&mut writer, params.pretty)?;
    writeln!(writer)
        .and_then(|_| writer.flush())
        .map_err(|source| BetaError::Io {
            path: PathBuf::from("<stdout>"),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(args: &[&str]) -> ArgMatches {
        build_cli().try_get_matches_from(args).unwrap()
    }

    #[test]
    fn test_tool_sets_stay_grouped() {
        let m = matches(&[
            "betaclip", "-t", "metaphlan", "s1", "a.txt", "s2", "b.txt", "--tool-set", "kraken", "s1", "c.txt",
        ]);
        let sets = parse_tool_sets(&m).unwrap();

        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].tool, "metaphlan");
        assert_eq!(sets[0].sample_names().collect::<Vec<_>>(), ["s1", "s2"]);
        assert_eq!(sets[1].tool, "kraken");
        assert_eq!(sets[1].samples, vec![("s1".to_string(), PathBuf::from("c.txt"))]);
    }

    #[test]
    fn test_odd_tokens_rejected_before_reading() {
        let m = matches(&["betaclip", "-t", "metaphlan", "s1", "/does/not/exist.txt", "s2"]);
        assert!(matches!(
            parse_tool_sets(&m),
            Err(BetaError::OddSampleTokens { count: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_sample_and_bad_tool_rejected_before_reading() {
        let m = matches(&["betaclip", "-t", "metaphlan", "s1", "/does/not/exist.txt", "s1", "/does/not/exist2.txt"]);
        assert!(matches!(
            parse_tool_sets(&m),
            Err(BetaError::DuplicateSample { ref sample, .. }) if sample == "s1"
        ));

        let m = matches(&["betaclip", "-t", "../metaphlan", "s1", "/does/not/exist.txt"]);
        assert!(matches!(parse_tool_sets(&m), Err(BetaError::InvalidToolName(_))));
    }

    #[test]
    fn test_params() {
        let m = matches(&["betaclip", "-t", "x", "s1", "a", "--threads", "4", "--tables-dir", "out", "--pretty"]);
        let params = parse_params(&m);
        assert_eq!(params.threads, 4);
        assert_eq!(params.tables_dir, Some(PathBuf::from("out")));
        assert!(params.pretty);

        let m = matches(&["betaclip", "-t", "x", "s1", "a"]);
        let params = parse_params(&m);
        assert_eq!(params.threads, 0);
        assert_eq!(params.tables_dir, None);
        assert!(!params.pretty);
    }

    #[test]
    fn test_tool_set_required() {
        assert!(build_cli().try_get_matches_from(["betaclip"]).is_err());
    }
}
