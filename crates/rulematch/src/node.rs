//! Resolved grammar nodes, references point into the [`Grammar`] arena.

use std::fmt::Write;

use crate::{
    ast::RcString,
    grammar::{Grammar, RuleHandle},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Literal(RcString),
    Rule(RuleHandle),
    Sequence(Sequence),
    Alternation(Alternation),
}

/// Children matched in order, each one starting where the previous stopped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sequence(pub Vec<Node>);

/// Options tried against the same starting state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Alternation(pub Vec<Sequence>);

impl Node {
    pub fn literal(text: &str) -> Node {
        Node::Literal(text.into())
    }
    pub fn visit(&self, fun: &mut dyn FnMut(&Node)) {
        fun(self);
        match self {
            Node::Literal(_) | Node::Rule(_) => {}
            Node::Sequence(sequence) => sequence.visit(fun),
            Node::Alternation(alternation) => alternation.visit(fun),
        }
    }
    pub fn display_into(&self, buf: &mut dyn Write, grammar: &Grammar) -> std::fmt::Result {
        match self {
            Node::Literal(text) => write!(buf, "{text:?}"),
            Node::Rule(handle) => buf.write_str(handle.name(grammar)),
            Node::Sequence(sequence) => {
                buf.write_char('(')?;
                sequence.display_into(buf, grammar)?;
                buf.write_char(')')
            }
            Node::Alternation(alternation) => {
                buf.write_char('(')?;
                alternation.display_into(buf, grammar)?;
                buf.write_char(')')
            }
        }
    }
}

impl Sequence {
    pub fn visit(&self, fun: &mut dyn FnMut(&Node)) {
        for node in &self.0 {
            node.visit(fun);
        }
    }
    pub fn display_into(&self, buf: &mut dyn Write, grammar: &Grammar) -> std::fmt::Result {
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                buf.write_char(' ')?;
            }
            node.display_into(buf, grammar)?;
        }
        Ok(())
    }
}

impl Alternation {
    pub fn visit(&self, fun: &mut dyn FnMut(&Node)) {
        for sequence in &self.0 {
            sequence.visit(fun);
        }
    }
    /// Every rule referenced anywhere below this node, in order of appearance.
    pub fn references(&self) -> Vec<RuleHandle> {
        let mut out = Vec::new();
        self.visit(&mut |node| {
            if let Node::Rule(handle) = node {
                out.push(*handle);
            }
        });
        out
    }
    pub fn display_into(&self, buf: &mut dyn Write, grammar: &Grammar) -> std::fmt::Result {
        for (i, sequence) in self.0.iter().enumerate() {
            if i > 0 {
                buf.write_str(" | ")?;
            }
            sequence.display_into(buf, grammar)?;
        }
        Ok(())
    }
}
