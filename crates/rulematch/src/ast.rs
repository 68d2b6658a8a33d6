//! Rule definitions as they appear in grammar text, before references are resolved.

use std::rc::Rc;

use crate::span::{Span, Spanned};

pub type RcString = Rc<str>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
    /// `"text"`, stored without the quotes
    Literal(RcString),
    /// bare rule identifier
    Ident(RcString),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub kind: ItemKind,
    pub span: Span,
}

impl Item {
    pub fn literal(text: &str, span: Span) -> Item {
        Item {
            kind: ItemKind::Literal(text.into()),
            span,
        }
    }
    pub fn ident(name: &str, span: Span) -> Item {
        Item {
            kind: ItemKind::Ident(name.into()),
            span,
        }
    }
}

/// One `|`-separated part of a definition.
pub type Alternative = Vec<Item>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleDef {
    pub name: Spanned<RcString>,
    pub alternatives: Vec<Alternative>,
}

impl RuleDef {
    pub fn name(&self) -> &RcString {
        &self.name.inner
    }
}
