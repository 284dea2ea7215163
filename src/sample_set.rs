use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::error::{BetaError, Result};

/// The samples one classification tool produced profiles for.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSampleSet {
    pub tool: String,
    pub samples: Vec<(String, PathBuf)>,
}

impl ToolSampleSet {
    pub fn new(tool: &str, samples: Vec<(String, PathBuf)>) -> Self {
        Self {
            tool: tool.to_string(),
            samples,
        }
    }

    /// Builds a set from a flat `<sample> <path> <sample> <path> ...` list.
    ///
    /// Nothing is opened here; an odd token count is rejected as a whole.
    pub fn from_tokens<S: AsRef<str>>(tool: &str, tokens: &[S]) -> Result<Self> {
        if tokens.is_empty() {
            return Err(BetaError::EmptySampleSet(tool.to_string()));
        }
        if tokens.len() % 2 != 0 {
            return Err(BetaError::OddSampleTokens {
                tool: tool.to_string(),
                count: tokens.len(),
            });
        }

        let samples = tokens
            .chunks_exact(2)
            .map(|pair| (pair[0].as_ref().to_string(), PathBuf::from(pair[1].as_ref())))
            .collect();
        let set = Self::new(tool, samples);
        set.validate()?;
        Ok(set)
    }

    /// Checks the tool name and that no sample name repeats.
    ///
    /// The tool name ends up in `<tool>.<rank>.tsv`, so it has to be a
    /// single plain path component.
    pub fn validate(&self) -> Result<()> {
        let mut components = Path::new(&self.tool).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(name)), None) if name == self.tool.as_str()
        );
        if !plain || self.tool.contains(['/', '\\']) {
            return Err(BetaError::InvalidToolName(self.tool.clone()));
        }

        let mut seen = HashSet::new();
        for name in self.sample_names() {
            if !seen.insert(name) {
                return Err(BetaError::DuplicateSample {
                    tool: self.tool.clone(),
                    sample: name.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn sample_names(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(|(name, _)| name.as_str())
    }
}
