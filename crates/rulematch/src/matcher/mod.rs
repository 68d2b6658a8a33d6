//! Matching engines and the line counting built on top of them.

pub mod candidate;
mod looping;
mod simple;

pub use candidate::{ActiveRules, Candidate, CandidateSet};
pub use looping::LoopingMatcher;
pub use simple::SimpleMatcher;

use crate::{
    error::{GrammarError, MatchError},
    grammar::{Grammar, RuleHandle},
};

/// Resource guards applied to every line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchLimits {
    /// Maximum nesting of rule references.
    pub max_depth: usize,
    /// Maximum size of any single candidate set, only the looping matcher produces sets.
    pub max_candidates: usize,
}

impl MatchLimits {
    pub const DEFAULT_MAX_DEPTH: usize = 512;
    pub const DEFAULT_MAX_CANDIDATES: usize = 1 << 16;
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_candidates: Self::DEFAULT_MAX_CANDIDATES,
        }
    }
}

pub trait Matcher {
    fn root(&self) -> RuleHandle;
    /// Whether the root rule can consume all of `line`.
    fn full_match(&self, line: &str) -> Result<bool, MatchError>;
}

pub(crate) fn root_rule(grammar: &Grammar, name: &str) -> Result<RuleHandle, GrammarError> {
    grammar
        .lookup(name)
        .ok_or_else(|| GrammarError::MissingRoot { name: name.into() })
}

/// Counts the lines fully matched by the root rule.
///
/// A line that trips a [`MatchLimits`] guard is logged and counted as not matching.
pub fn count_full_matches<M, S>(matcher: &M, lines: &[S]) -> usize
where
    M: Matcher + ?Sized,
    S: AsRef<str>,
{
    let mut count = 0;
    for line in lines {
        let line = line.as_ref();
        match matcher.full_match(line) {
            Ok(true) => {
                log::info!("matched line {line}");
                count += 1;
            }
            Ok(false) => log::trace!("no match for {line}"),
            Err(e) => log::warn!("gave up on line {line}: {e}"),
        }
    }
    count
}
