use crate::{
    error::{GrammarError, MatchError},
    grammar::{Grammar, RuleHandle},
    node::{Alternation, Node, Sequence},
};

use super::{root_rule, MatchLimits, Matcher};

/// Recursive descent where the first succeeding alternative wins.
///
/// Nothing is retried once an alternative matched, so this recognizes exactly the lines whose
/// greedy left-to-right parse consumes everything. Self referential rules are not guarded and
/// only terminate through [`MatchLimits::max_depth`].
pub struct SimpleMatcher<'g> {
    grammar: &'g Grammar,
    root: RuleHandle,
    limits: MatchLimits,
}

impl<'g> SimpleMatcher<'g> {
    pub fn new(grammar: &'g Grammar, root: &str) -> Result<SimpleMatcher<'g>, GrammarError> {
        Ok(Self {
            grammar,
            root: root_rule(grammar, root)?,
            limits: MatchLimits::default(),
        })
    }

    pub fn with_limits(mut self, limits: MatchLimits) -> SimpleMatcher<'g> {
        self.limits = limits;
        self
    }

    /// Matches the root rule at the start of `line` and returns the input it left over.
    pub fn match_root<'a>(&self, line: &'a str) -> Result<Option<&'a str>, MatchError> {
        let body = &self.grammar[self.root].body;
        let end = self.alternation(body, line, 0, 0)?;
        Ok(end.map(|end| &line[end..]))
    }

    /// The position after `node`, `None` if it does not match at `pos`.
    fn node(
        &self,
        node: &Node,
        line: &str,
        pos: usize,
        depth: usize,
    ) -> Result<Option<usize>, MatchError> {
        match node {
            Node::Literal(text) => {
                let matched = line[pos..].starts_with(&**text);
                log::trace!("literal {text:?} at {pos}: {matched}");
                Ok(matched.then(|| pos + text.len()))
            }
            Node::Rule(handle) => {
                let depth = depth + 1;
                if depth > self.limits.max_depth {
                    return Err(MatchError::DepthLimit {
                        limit: self.limits.max_depth,
                    });
                }
                let rule = &self.grammar[*handle];
                log::trace!("entering rule {} at {pos}", rule.name);
                self.alternation(&rule.body, line, pos, depth)
            }
            Node::Sequence(sequence) => self.sequence(sequence, line, pos, depth),
            Node::Alternation(alternation) => self.alternation(alternation, line, pos, depth),
        }
    }

    fn sequence(
        &self,
        sequence: &Sequence,
        line: &str,
        pos: usize,
        depth: usize,
    ) -> Result<Option<usize>, MatchError> {
        let mut current = pos;
        for child in &sequence.0 {
            match self.node(child, line, current, depth)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    fn alternation(
        &self,
        alternation: &Alternation,
        line: &str,
        pos: usize,
        depth: usize,
    ) -> Result<Option<usize>, MatchError> {
        // every option starts from `pos`, a failed one leaves nothing behind
        for option in &alternation.0 {
            if let Some(end) = self.sequence(option, line, pos, depth)? {
                return Ok(Some(end));
            }
        }
        Ok(None)
    }
}

impl Matcher for SimpleMatcher<'_> {
    fn root(&self) -> RuleHandle {
        self.root
    }

    fn full_match(&self, line: &str) -> Result<bool, MatchError> {
        Ok(self.match_root(line)? == Some(""))
    }
}
