use crate::{
    error::{GrammarError, MatchError},
    grammar::{Grammar, RuleHandle},
    node::{Alternation, Node, Sequence},
};

use super::{
    candidate::{ActiveRules, Candidate, CandidateSet},
    root_rule, MatchLimits, Matcher,
};

/// Explores every alternative and carries all surviving hypotheses forward.
///
/// An alternative that succeeds locally may be the wrong one for the line as a whole, so
/// nothing is resolved until the root returns. A rule reference fails for a candidate that is
/// already expanding that rule without having consumed input since, which cuts every cycle
/// through self referential rules.
pub struct LoopingMatcher<'g> {
    grammar: &'g Grammar,
    root: RuleHandle,
    limits: MatchLimits,
}

impl<'g> LoopingMatcher<'g> {
    pub fn new(grammar: &'g Grammar, root: &str) -> Result<LoopingMatcher<'g>, GrammarError> {
        Ok(Self {
            grammar,
            root: root_rule(grammar, root)?,
            limits: MatchLimits::default(),
        })
    }

    pub fn with_limits(mut self, limits: MatchLimits) -> LoopingMatcher<'g> {
        self.limits = limits;
        self
    }

    /// Every way the root rule can match a prefix of `line`.
    pub fn match_root(&self, line: &str) -> Result<CandidateSet, MatchError> {
        let mut active = ActiveRules::new();
        active.insert(self.root);

        let start = Candidate::new(0, active);
        let mut out = CandidateSet::new();
        self.alternation(&self.grammar[self.root].body, &start, line, 0, &mut out)?;

        log::trace!("{} candidates for {line}", out.len());
        Ok(out)
    }

    fn push(&self, out: &mut CandidateSet, candidate: Candidate) -> Result<(), MatchError> {
        out.insert(candidate);
        if out.len() > self.limits.max_candidates {
            return Err(MatchError::CandidateLimit {
                limit: self.limits.max_candidates,
            });
        }
        Ok(())
    }

    /// Adds every candidate resulting from matching `node` against `candidate` to `out`.
    fn node(
        &self,
        node: &Node,
        candidate: &Candidate,
        line: &str,
        depth: usize,
        out: &mut CandidateSet,
    ) -> Result<(), MatchError> {
        match node {
            Node::Literal(text) => {
                if candidate.remaining(line).starts_with(&**text) {
                    self.push(out, candidate.consume(text.len()))?;
                }
                Ok(())
            }
            Node::Rule(handle) => {
                let Some(entered) = candidate.enter(*handle) else {
                    log::trace!(
                        "rule {} already active at {}",
                        handle.name(self.grammar),
                        candidate.position()
                    );
                    return Ok(());
                };

                let depth = depth + 1;
                if depth > self.limits.max_depth {
                    return Err(MatchError::DepthLimit {
                        limit: self.limits.max_depth,
                    });
                }

                let body = &self.grammar[*handle].body;
                self.alternation(body, &entered, line, depth, out)
            }
            Node::Sequence(sequence) => self.sequence(sequence, candidate, line, depth, out),
            Node::Alternation(alternation) => {
                self.alternation(alternation, candidate, line, depth, out)
            }
        }
    }

    fn sequence(
        &self,
        sequence: &Sequence,
        candidate: &Candidate,
        line: &str,
        depth: usize,
        out: &mut CandidateSet,
    ) -> Result<(), MatchError> {
        let mut live = CandidateSet::single(candidate.clone());

        for child in &sequence.0 {
            let mut next = CandidateSet::new();
            for candidate in &live {
                self.node(child, candidate, line, depth, &mut next)?;
            }
            if next.is_empty() {
                return Ok(());
            }
            live = next;
        }

        for candidate in live {
            self.push(out, candidate)?;
        }
        Ok(())
    }

    fn alternation(
        &self,
        alternation: &Alternation,
        candidate: &Candidate,
        line: &str,
        depth: usize,
        out: &mut CandidateSet,
    ) -> Result<(), MatchError> {
        for option in &alternation.0 {
            self.sequence(option, candidate, line, depth, out)?;
        }
        Ok(())
    }
}

impl Matcher for LoopingMatcher<'_> {
    fn root(&self) -> RuleHandle {
        self.root
    }

    fn full_match(&self, line: &str) -> Result<bool, MatchError> {
        Ok(self.match_root(line)?.any_complete(line))
    }
}
