//! Recognizer for small rule grammars made of literals, rule references, sequences and
//! alternations.
//!
//! ```text
//! 0: 4 1 5
//! 1: 2 3 | 3 2
//! 2: 4 4 | 5 5
//! 3: 4 5 | 5 4
//! 4: "a"
//! 5: "b"
//! ```
//!
//! A [`Grammar`] is built with [`GrammarBuilder`], then matched line by line with either the
//! [`SimpleMatcher`] (first alternative wins) or the [`LoopingMatcher`] (all alternatives,
//! self referential rules allowed).

pub mod ast;
pub mod config;
pub mod error;
pub mod grammar;
pub mod input;
pub mod matcher;
pub mod node;
pub mod parse;
pub mod span;

pub use config::{GrammarSource, MatchConfig, Variant, PUZZLE_OVERRIDES};
pub use error::{GrammarError, GrammarErrors, MatchError};
pub use grammar::{Grammar, GrammarBuilder, Rule, RuleHandle};
pub use input::PuzzleInput;
pub use matcher::{
    count_full_matches, CandidateSet, LoopingMatcher, MatchLimits, Matcher, SimpleMatcher,
};
pub use node::{Alternation, Node, Sequence};
