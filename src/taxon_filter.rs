use std::fmt;
use std::str::FromStr;

use crate::error::BetaError;

const GENUS_MARKER: &str = "g__";
const SPECIES_MARKER: &str = "s__";
const STRAIN_MARKER: &str = "t__";

/// Taxonomic ranks a distance matrix can be computed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Species,
    Genus,
}

impl Rank {
    /// Output order of the report.
    pub const ALL: [Rank; 2] = [Rank::Species, Rank::Genus];

    pub fn name(self) -> &'static str {
        match self {
            Rank::Species => "species",
            Rank::Genus => "genus",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rank {
    type Err = BetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "species" => Ok(Rank::Species),
            "genus" => Ok(Rank::Genus),
            _ => Err(BetaError::UnsupportedRank(s.to_string())),
        }
    }
}

/// Checks whether an MPA taxonomy path ends at `rank`.
///
/// A species path carries `s__` but no strain `t__` component, a genus
/// path carries `g__` but no `s__` component.
pub fn matches_rank(taxon: &str, rank: Rank) -> bool {
    match rank {
        Rank::Species => taxon.contains(SPECIES_MARKER) && !taxon.contains(STRAIN_MARKER),
        Rank::Genus => taxon.contains(GENUS_MARKER) && !taxon.contains(SPECIES_MARKER),
    }
}
