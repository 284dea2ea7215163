use indexmap::IndexMap;

use crate::error::{BetaError, Result};
use crate::taxon_filter::{matches_rank, Rank};

const COMMENT_CHAR: char = '#';

/// Abundances of one sample restricted to a single rank.
///
/// Taxa keep the position they were first seen at; a repeated taxon
/// overwrites the earlier value.
#[derive(Debug, Clone)]
pub struct SampleProfile {
    name: String,
    rank: Rank,
    abundances: IndexMap<String, f64>,
}

impl SampleProfile {
    pub fn new(name: &str, rank: Rank) -> Self {
        Self {
            name: name.to_string(),
            rank,
            abundances: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feeds one `<taxon> <abundance>` record into the profile.
    ///
    /// Blank lines and `#` headers are ignored. Any other line must hold
    /// exactly two fields with a non-negative finite abundance, otherwise
    /// the whole sample is rejected.
    pub fn ingest_line(&mut self, line: &str) -> Result<()> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_CHAR) {
            return Ok(());
        }

        let mut fields = trimmed.split_whitespace();
        let (taxon, abundance) = match (fields.next(), fields.next(), fields.next()) {
            (Some(taxon), Some(abundance), None) => (taxon, abundance),
            _ => return Err(self.malformed(line)),
        };

        let abundance = match fast_float::parse::<f64, _>(abundance) {
            Ok(value) if value.is_finite() && value >= 0.0 => value,
            _ => return Err(self.malformed(line)),
        };

        if matches_rank(taxon, self.rank) {
            self.abundances.insert(taxon.to_string(), abundance);
        }
        Ok(())
    }

    pub fn abundances(&self) -> &IndexMap<String, f64> {
        &self.abundances
    }

    fn malformed(&self, line: &str) -> BetaError {
        BetaError::MalformedLine {
            sample: self.name.clone(),
            line: line.trim_end().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_keeps_matching_rank_only() {
        let mut profile = SampleProfile::new("s1", Rank::Species);
        profile.ingest_line("k__Bacteria|g__Prevotella\t40.0").unwrap();
        profile.ingest_line("k__Bacteria|g__Prevotella|s__Prevotella_copri\t35.5").unwrap();
        profile.ingest_line("k__Bacteria|g__Prevotella|s__Prevotella_copri|t__X1\t35.5").unwrap();

        assert_eq!(profile.abundances().len(), 1);
        assert_eq!(profile.abundances()["k__Bacteria|g__Prevotella|s__Prevotella_copri"], 35.5);
    }

    #[test]
    fn test_last_write_wins() {
        let mut profile = SampleProfile::new("s1", Rank::Genus);
        profile.ingest_line("k__Bacteria|g__Bacteroides 12.0").unwrap();
        profile.ingest_line("k__Bacteria|g__Alistipes 3.0").unwrap();
        profile.ingest_line("k__Bacteria|g__Bacteroides 7.5").unwrap();

        let taxa: Vec<&String> = profile.abundances().keys().collect();
        assert_eq!(taxa, ["k__Bacteria|g__Bacteroides", "k__Bacteria|g__Alistipes"]);
        assert_eq!(profile.abundances()["k__Bacteria|g__Bacteroides"], 7.5);
    }

    #[test]
    fn test_headers_and_blank_lines_are_skipped() {
        let mut profile = SampleProfile::new("s1", Rank::Genus);
        profile.ingest_line("#mpa_v30_CHOCOPhlAn_201901").unwrap();
        profile.ingest_line("#SampleID\tMetaphlan_Analysis").unwrap();
        profile.ingest_line("   \n").unwrap();
        assert!(profile.abundances().is_empty());
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        let bad = [
            "k__Bacteria|g__Bacteroides",
            "k__Bacteria|g__Bacteroides 1.0 2.0",
            "k__Bacteria|g__Bacteroides abc",
            "k__Bacteria|g__Bacteroides -1.0",
            "k__Bacteria|g__Bacteroides inf",
        ];
        for line in bad {
            let mut profile = SampleProfile::new("s9", Rank::Genus);
            match profile.ingest_line(line) {
                Err(BetaError::MalformedLine { sample, line: reported }) => {
                    assert_eq!(sample, "s9");
                    assert_eq!(reported, line);
                }
                other => panic!("expected MalformedLine for '{}', got {:?}", line, other),
            }
        }
    }

    #[test]
    fn test_non_matching_lines_are_still_validated() {
        let mut profile = SampleProfile::new("s1", Rank::Species);
        assert!(profile.ingest_line("k__Bacteria|g__Bacteroides oops").is_err());
    }
}
