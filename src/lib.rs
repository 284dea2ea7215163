//! Beta diversity (Jensen-Shannon distance) between MPA taxonomic
//! profiles, computed per classification tool at species and genus rank.

pub mod abundance_table;
pub mod beta_diversity;
pub mod cli;
pub mod distance;
pub mod error;
pub mod generate_test_data;
pub mod mpa_parser;
pub mod sample_profile;
pub mod sample_set;
pub mod taxon_filter;

pub use abundance_table::AbundanceTable;
pub use beta_diversity::{compute_beta_diversity, AnalysisParams, BetaDiversityReport};
pub use distance::{compute_matrix, DistanceMatrix, Metric};
pub use error::{BetaError, Result};
pub use sample_profile::SampleProfile;
pub use sample_set::ToolSampleSet;
pub use taxon_filter::{matches_rank, Rank};
