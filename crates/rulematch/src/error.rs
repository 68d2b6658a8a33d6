use std::{cell::RefCell, fmt::Display};

use thiserror::Error;

use crate::{ast::RcString, span::Span};

/// A malformed or inconsistent grammar.
///
/// Spans point into the text the offending definition was loaded from, for overrides that is
/// the override text itself.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("expected `<rule>: <definition>`")]
    MissingSeparator { span: Span },
    #[error("rule name is empty")]
    EmptyRuleName { span: Span },
    #[error("rule `{rule}` has an empty alternative")]
    EmptyAlternative { rule: RcString, span: Span },
    #[error("empty literal")]
    EmptyLiteral { span: Span },
    #[error("literal is missing its closing quote")]
    UnterminatedLiteral { span: Span },
    #[error("rule `{name}` is defined more than once")]
    DuplicateRule { name: RcString, span: Span },
    #[error("rule `{referenced_by}` references undefined rule `{name}`")]
    UndefinedRule {
        name: RcString,
        referenced_by: RcString,
        span: Span,
    },
    #[error("root rule `{name}` is not defined")]
    MissingRoot { name: RcString },
}

impl GrammarError {
    pub fn span(&self) -> Option<Span> {
        match self {
            GrammarError::MissingSeparator { span }
            | GrammarError::EmptyRuleName { span }
            | GrammarError::EmptyAlternative { span, .. }
            | GrammarError::EmptyLiteral { span }
            | GrammarError::UnterminatedLiteral { span }
            | GrammarError::DuplicateRule { span, .. }
            | GrammarError::UndefinedRule { span, .. } => Some(*span),
            GrammarError::MissingRoot { .. } => None,
        }
    }
}

/// Every error found while loading a grammar, in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrammarErrors(pub Vec<GrammarError>);

impl GrammarErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, GrammarError> {
        self.0.iter()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for GrammarErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            match err.span() {
                Some(span) => write!(f, "{span}: {err}")?,
                None => write!(f, "{err}")?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for GrammarErrors {}

impl From<GrammarError> for GrammarErrors {
    fn from(value: GrammarError) -> Self {
        GrammarErrors(vec![value])
    }
}

impl<'a> IntoIterator for &'a GrammarErrors {
    type Item = &'a GrammarError;
    type IntoIter = std::slice::Iter<'a, GrammarError>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A resource guard tripped while matching a single line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("rule nesting exceeded the depth limit of {limit}")]
    DepthLimit { limit: usize },
    #[error("more than {limit} live match candidates")]
    CandidateLimit { limit: usize },
}

/// Collects errors while the loader keeps going, so a single pass reports all of them.
#[derive(Default)]
pub struct ErrorAccumulator {
    errors: RefCell<Vec<GrammarError>>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn error(&self, err: GrammarError) {
        log::debug!("grammar error: {err}");
        self.errors.borrow_mut().push(err);
    }
    pub fn finish<T>(self, value: T) -> Result<T, GrammarErrors> {
        let errors = RefCell::into_inner(self.errors);
        match errors.is_empty() {
            true => Ok(value),
            false => Err(GrammarErrors(errors)),
        }
    }
}
