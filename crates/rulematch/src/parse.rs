//! Loader for the line based grammar format.
//!
//! ```text
//! 0: 4 1 5
//! 1: 2 3 | 3 2
//! 4: "a"
//! ```
//!
//! Quoted tokens are literals, bare tokens reference other rules and `|` separates
//! alternatives. Errors are reported to an [`ErrorAccumulator`] and parsing continues with the
//! next line.

use crate::{
    ast::{Alternative, Item, RcString, RuleDef},
    error::{ErrorAccumulator, GrammarError},
    span::{Span, Spanned},
};

#[derive(Clone)]
struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Lexer<'a> {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn eat_while(&mut self, fun: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek() {
            if !fun(b) {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_spaces(&mut self) {
        self.eat_while(|b| b.is_ascii_whitespace());
    }
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'|' || b == b'"'
}

/// Parses every non-blank line of `src` as a rule definition.
pub fn parse_rules(src: &str, err: &ErrorAccumulator) -> Vec<RuleDef> {
    let mut rules = Vec::new();
    let mut offset = 0;

    for line in src.split_inclusive('\n') {
        let base = offset as u32;
        offset += line.len();

        if line.trim().is_empty() {
            continue;
        }
        if let Some(rule) = parse_rule_line(line, base, err) {
            rules.push(rule);
        }
    }

    rules
}

/// Parses `<rule>: <definition>`, `base` is the offset of `line` in the whole source.
pub fn parse_rule_line(line: &str, base: u32, err: &ErrorAccumulator) -> Option<RuleDef> {
    let leading = line.len() - line.trim_start().len();
    let base = base + leading as u32;
    let line = line.trim();

    let Some((name, definition)) = line.split_once(':') else {
        err.error(GrammarError::MissingSeparator {
            span: Span::from_local(base, 0, line.len()),
        });
        return None;
    };

    let name = name.trim_end();
    let name_span = Span::from_local(base, 0, name.len());
    if name.is_empty() {
        err.error(GrammarError::EmptyRuleName { span: name_span });
        return None;
    }
    if name.bytes().any(is_delimiter) {
        err.error(GrammarError::MissingSeparator { span: name_span });
        return None;
    }

    let name: RcString = name.into();
    let definition_base = base + (line.len() - definition.len()) as u32;
    let alternatives = parse_definition(&name, definition, definition_base, err)?;

    Some(RuleDef {
        name: Spanned::new(name, name_span),
        alternatives,
    })
}

/// Parses the right hand side of a rule, returns `None` if any error was reported.
pub fn parse_definition(
    rule: &RcString,
    src: &str,
    base: u32,
    err: &ErrorAccumulator,
) -> Option<Vec<Alternative>> {
    let mut l = Lexer::new(src);
    let mut alternatives = Vec::new();
    let mut current = Vec::new();
    let mut alternative_start = 0;
    // an alternative whose only items were rejected is already reported
    let mut poisoned = false;
    let mut ok = true;

    let empty_alternative = |start: usize, end: usize| GrammarError::EmptyAlternative {
        rule: rule.clone(),
        span: Span::from_local(base, start, end),
    };

    loop {
        l.skip_spaces();
        let start = l.pos;

        match l.peek() {
            None => break,
            Some(b'|') => {
                l.pos += 1;
                if current.is_empty() && !poisoned {
                    err.error(empty_alternative(alternative_start, l.pos));
                    ok = false;
                }
                alternatives.push(std::mem::take(&mut current));
                alternative_start = l.pos;
                poisoned = false;
            }
            Some(b'"') => {
                l.pos += 1;
                let Some(len) = l.rest().find('"') else {
                    err.error(GrammarError::UnterminatedLiteral {
                        span: Span::from_local(base, start, src.len()),
                    });
                    return None;
                };

                let text = &src[l.pos..l.pos + len];
                l.pos += len + 1;
                let span = Span::from_local(base, start, l.pos);

                if text.is_empty() {
                    err.error(GrammarError::EmptyLiteral { span });
                    poisoned = true;
                    ok = false;
                } else {
                    current.push(Item::literal(text, span));
                }
            }
            Some(_) => {
                l.eat_while(|b| !is_delimiter(b));
                let span = Span::from_local(base, start, l.pos);
                current.push(Item::ident(&src[start..l.pos], span));
            }
        }
    }

    if current.is_empty() && !poisoned {
        err.error(empty_alternative(alternative_start, src.len()));
        ok = false;
    }
    alternatives.push(current);

    ok.then_some(alternatives)
}
