use std::{
    collections::HashSet,
    fmt::Debug,
    hash::{Hash, Hasher},
};

use cranelift_bitset::CompoundBitSet;
use cranelift_entity::EntityRef;

use crate::grammar::RuleHandle;

/// Rules entered since the last literal was consumed.
///
/// Entering a rule that is already active would recurse without making progress.
#[derive(Clone)]
pub struct ActiveRules(CompoundBitSet);

impl ActiveRules {
    pub fn new() -> ActiveRules {
        ActiveRules(CompoundBitSet::new())
    }
    pub fn contains(&self, rule: RuleHandle) -> bool {
        self.0.contains(rule.index())
    }
    /// Returns false if the rule was already active.
    pub fn insert(&mut self, rule: RuleHandle) -> bool {
        if self.contains(rule) {
            return false;
        }
        self.0.insert(rule.index());
        true
    }
    pub fn len(&self) -> usize {
        self.0.iter().count()
    }
    pub fn is_empty(&self) -> bool {
        self.0.iter().next().is_none()
    }
    pub fn iter(&self) -> impl Iterator<Item = RuleHandle> + '_ {
        self.0.iter().map(RuleHandle::new)
    }
}

impl Default for ActiveRules {
    fn default() -> Self {
        Self::new()
    }
}

// the bitset may hold spare capacity, compare by members only
impl PartialEq for ActiveRules {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for ActiveRules {}

impl Hash for ActiveRules {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for rule in self.iter() {
            rule.hash(state);
        }
    }
}

impl Debug for ActiveRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// One hypothesis of the looping matcher: the input before `position` has been consumed.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Candidate {
    position: usize,
    active: ActiveRules,
}

impl Candidate {
    pub fn new(position: usize, active: ActiveRules) -> Candidate {
        Self { position, active }
    }
    pub fn position(&self) -> usize {
        self.position
    }
    pub fn active(&self) -> &ActiveRules {
        &self.active
    }
    pub fn remaining<'a>(&self, line: &'a str) -> &'a str {
        &line[self.position..]
    }
    pub fn is_complete(&self, line: &str) -> bool {
        self.position == line.len()
    }
    /// Consuming input makes entering any rule legitimate again.
    pub fn consume(&self, len: usize) -> Candidate {
        if len == 0 {
            return self.clone();
        }
        Candidate {
            position: self.position + len,
            active: ActiveRules::new(),
        }
    }
    /// A copy with `rule` marked active, `None` if it already was.
    pub fn enter(&self, rule: RuleHandle) -> Option<Candidate> {
        let mut active = self.active.clone();
        match active.insert(rule) {
            true => Some(Candidate {
                position: self.position,
                active,
            }),
            false => None,
        }
    }
}

/// Insertion ordered set of candidates, duplicates describe the same hypothesis and are dropped.
#[derive(Clone, Default)]
pub struct CandidateSet {
    order: Vec<Candidate>,
    seen: HashSet<Candidate>,
}

impl CandidateSet {
    pub fn new() -> CandidateSet {
        Self::default()
    }
    pub fn single(candidate: Candidate) -> CandidateSet {
        let mut set = Self::new();
        set.insert(candidate);
        set
    }
    /// Returns false if an equal candidate is already present.
    pub fn insert(&mut self, candidate: Candidate) -> bool {
        if self.seen.contains(&candidate) {
            return false;
        }
        self.seen.insert(candidate.clone());
        self.order.push(candidate);
        true
    }
    pub fn len(&self) -> usize {
        self.order.len()
    }
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.order.iter()
    }
    /// Positions reached, sorted and without duplicates.
    pub fn positions(&self) -> Vec<usize> {
        let mut positions: Vec<_> = self.order.iter().map(Candidate::position).collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }
    /// Whether some hypothesis consumed all of `line`.
    pub fn any_complete(&self, line: &str) -> bool {
        self.order.iter().any(|c| c.is_complete(line))
    }
}

impl Debug for CandidateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.order.iter()).finish()
    }
}

impl IntoIterator for CandidateSet {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;
    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;
    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(index: usize) -> RuleHandle {
        RuleHandle::new(index)
    }

    #[test]
    fn active_rules_compare_by_members() {
        let mut wide = ActiveRules::new();
        wide.insert(rule(200));
        wide.insert(rule(3));

        let mut narrow = ActiveRules::new();
        narrow.insert(rule(3));
        assert_ne!(wide, narrow);

        narrow.insert(rule(200));
        assert_eq!(wide, narrow);
        assert_eq!(wide.iter().collect::<Vec<_>>(), vec![rule(3), rule(200)]);
        assert!(!narrow.insert(rule(3)));
        assert_eq!(narrow.len(), 2);
    }

    #[test]
    fn consuming_clears_active_rules() {
        let start = Candidate::new(0, ActiveRules::new());
        let inside = start.enter(rule(0)).unwrap();
        assert!(inside.enter(rule(0)).is_none());

        let moved = inside.consume(2);
        assert_eq!(moved.position(), 2);
        assert!(moved.active().is_empty());
        assert!(moved.enter(rule(0)).is_some());

        // nothing consumed, nothing forgotten
        assert_eq!(inside.consume(0), inside);
    }

    #[test]
    fn set_drops_duplicates() {
        let a = Candidate::new(1, ActiveRules::new());
        let b = a.enter(rule(4)).unwrap();

        let mut set = CandidateSet::single(a.clone());
        assert!(!set.insert(a.clone()));
        assert!(set.insert(b));
        assert!(set.insert(Candidate::new(3, ActiveRules::new())));
        assert_eq!(set.len(), 3);
        assert_eq!(set.positions(), vec![1, 3]);
        assert!(set.any_complete("abc"));
        assert!(!set.any_complete("abcd"));
    }
}
