use std::{
    collections::{hash_map::Entry, HashMap},
    fmt::Write,
    ops::Index,
};

use cranelift_entity::{entity_impl, EntitySet, PrimaryMap, SecondaryMap};

use crate::{
    ast::{ItemKind, RcString, RuleDef},
    error::{ErrorAccumulator, GrammarError, GrammarErrors},
    node::{Alternation, Node, Sequence},
    parse,
    span::{Span, Spanned},
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RuleHandle(u32);

entity_impl! { RuleHandle }

impl RuleHandle {
    pub fn name(self, grammar: &Grammar) -> &RcString {
        &grammar[self].name
    }
}

pub struct Rule {
    pub name: RcString,
    pub body: Alternation,
}

/// The rule table. Rules refer to each other through [`RuleHandle`]s which are only looked up
/// while matching, so self referential rules need no special treatment.
pub struct Grammar {
    rules: PrimaryMap<RuleHandle, Rule>,
    name_to_rule: HashMap<RcString, RuleHandle>,
}

impl Grammar {
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    /// Loads and resolves `src` without any overrides.
    pub fn parse(src: &str) -> Result<Grammar, GrammarErrors> {
        Self::builder().load(src)?.finish()
    }

    pub fn lookup(&self, name: &str) -> Option<RuleHandle> {
        self.name_to_rule.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> cranelift_entity::Iter<'_, RuleHandle, Rule> {
        self.rules.iter()
    }

    /// Rules that can reach themselves through references.
    pub fn recursive_rules(&self) -> Vec<RuleHandle> {
        let mut references: SecondaryMap<RuleHandle, Vec<RuleHandle>> = SecondaryMap::new();
        for (handle, rule) in self.iter() {
            references[handle] = rule.body.references();
        }

        self.rules
            .keys()
            .filter(|&start| {
                let mut visited = EntitySet::new();
                let mut stack: Vec<RuleHandle> = references[start].clone();
                while let Some(next) = stack.pop() {
                    if next == start {
                        return true;
                    }
                    if visited.contains(next) {
                        continue;
                    }
                    visited.insert(next);
                    stack.extend_from_slice(&references[next]);
                }
                false
            })
            .collect()
    }

    pub fn has_cycles(&self) -> bool {
        !self.recursive_rules().is_empty()
    }

    pub fn display_into(&self, buf: &mut dyn Write) -> std::fmt::Result {
        for (_, rule) in self.iter() {
            write!(buf, "{}: ", rule.name)?;
            rule.body.display_into(buf, self)?;
            buf.write_char('\n')?;
        }
        Ok(())
    }
}

impl Index<RuleHandle> for Grammar {
    type Output = Rule;
    fn index(&self, handle: RuleHandle) -> &Rule {
        &self.rules[handle]
    }
}

/// Builds a [`Grammar`] in two phases: [`load`](Self::load) the grammar text, then
/// [`override_rule`](Self::override_rule) individual rules. References are resolved in
/// [`finish`](Self::finish), so an override may introduce cycles or refer to rules loaded
/// later.
#[derive(Default)]
pub struct GrammarBuilder {
    defs: PrimaryMap<RuleHandle, RuleDef>,
    name_to_rule: HashMap<RcString, RuleHandle>,
}

impl GrammarBuilder {
    pub fn new() -> GrammarBuilder {
        Self::default()
    }

    pub fn load(mut self, src: &str) -> Result<GrammarBuilder, GrammarErrors> {
        let err = ErrorAccumulator::new();

        for def in parse::parse_rules(src, &err) {
            match self.name_to_rule.entry(def.name().clone()) {
                Entry::Occupied(_) => err.error(GrammarError::DuplicateRule {
                    name: def.name().clone(),
                    span: def.name.span,
                }),
                Entry::Vacant(v) => {
                    v.insert(self.defs.push(def));
                }
            }
        }

        log::debug!("loaded {} rules", self.defs.len());
        err.finish(self)
    }

    /// Replaces the definition of `name`, or adds it if it does not exist yet.
    pub fn override_rule(
        self,
        name: &str,
        definition: &str,
    ) -> Result<GrammarBuilder, GrammarErrors> {
        let err = ErrorAccumulator::new();

        let name: RcString = name.trim().into();
        if name.is_empty() {
            err.error(GrammarError::EmptyRuleName { span: Span::at(0) });
        }

        let def = parse::parse_definition(&name, definition, 0, &err).map(|alternatives| {
            RuleDef {
                name: Spanned::new(name, Span::at(0)),
                alternatives,
            }
        });

        self.apply_override(def, err)
    }

    /// Same as [`override_rule`](Self::override_rule) with a `<rule>: <definition>` line.
    pub fn override_line(self, line: &str) -> Result<GrammarBuilder, GrammarErrors> {
        let err = ErrorAccumulator::new();
        let def = parse::parse_rule_line(line, 0, &err);
        self.apply_override(def, err)
    }

    fn apply_override(
        self,
        def: Option<RuleDef>,
        err: ErrorAccumulator,
    ) -> Result<GrammarBuilder, GrammarErrors> {
        let mut this = err.finish(self)?;

        if let Some(def) = def {
            match this.name_to_rule.get(def.name()) {
                Some(&handle) => {
                    log::debug!("overriding rule {}", def.name());
                    this.defs[handle] = def;
                }
                None => {
                    log::debug!("adding rule {} through override", def.name());
                    let name = def.name().clone();
                    let handle = this.defs.push(def);
                    this.name_to_rule.insert(name, handle);
                }
            }
        }

        Ok(this)
    }

    /// Resolves every reference, the resulting grammar is immutable.
    pub fn finish(self) -> Result<Grammar, GrammarErrors> {
        let err = ErrorAccumulator::new();

        let mut rules = PrimaryMap::with_capacity(self.defs.len());
        for (handle, def) in self.defs.iter() {
            let body = self.resolve(def, &err);
            let pushed = rules.push(Rule {
                name: def.name().clone(),
                body,
            });
            debug_assert_eq!(handle, pushed);
        }

        err.finish(Grammar {
            rules,
            name_to_rule: self.name_to_rule,
        })
    }

    fn resolve(&self, def: &RuleDef, err: &ErrorAccumulator) -> Alternation {
        let options = def.alternatives.iter().map(|alternative| {
            let nodes = alternative.iter().map(|item| match &item.kind {
                ItemKind::Literal(text) => Node::Literal(text.clone()),
                ItemKind::Ident(name) => match self.name_to_rule.get(name) {
                    Some(&handle) => Node::Rule(handle),
                    None => {
                        err.error(GrammarError::UndefinedRule {
                            name: name.clone(),
                            referenced_by: def.name().clone(),
                            span: item.span,
                        });
                        // never observed, finish fails
                        Node::Sequence(Sequence::default())
                    }
                },
            });
            Sequence(nodes.collect())
        });
        Alternation(options.collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const GRAMMAR: &str = "0: 8 11\n8: 42\n11: 42 31\n42: \"a\"\n31: \"b\"\n";

    fn display(grammar: &Grammar) -> String {
        let mut buf = String::new();
        grammar.display_into(&mut buf).unwrap();
        buf
    }

    #[test]
    fn resolves_references() {
        let grammar = Grammar::parse(GRAMMAR).unwrap();
        assert_eq!(grammar.len(), 5);

        let zero = grammar.lookup("0").unwrap();
        let eight = grammar.lookup("8").unwrap();
        let eleven = grammar.lookup("11").unwrap();
        assert_eq!(
            grammar[zero].body,
            Alternation(vec![Sequence(vec![Node::Rule(eight), Node::Rule(eleven)])])
        );
        assert_eq!(
            grammar[grammar.lookup("42").unwrap()].body,
            Alternation(vec![Sequence(vec![Node::literal("a")])])
        );
        assert!(grammar.lookup("7").is_none());
        assert!(!grammar.has_cycles());
    }

    #[test]
    fn display_round_trips_the_text_form() {
        let grammar = Grammar::parse(GRAMMAR).unwrap();
        assert_eq!(display(&grammar), GRAMMAR);
    }

    #[test]
    fn overrides_replace_in_place() {
        let before = Grammar::parse(GRAMMAR).unwrap();
        let grammar = Grammar::builder()
            .load(GRAMMAR)
            .unwrap()
            .override_rule("8", "42 | 42 8")
            .unwrap()
            .override_line("11: 42 31 | 42 11 31")
            .unwrap()
            .finish()
            .unwrap();

        assert_eq!(grammar.len(), before.len());
        assert_eq!(grammar.lookup("8"), before.lookup("8"));
        assert_eq!(
            grammar.recursive_rules(),
            vec![grammar.lookup("8").unwrap(), grammar.lookup("11").unwrap()]
        );
        assert_eq!(
            display(&grammar),
            "0: 8 11\n8: 42 | 42 8\n11: 42 31 | 42 11 31\n42: \"a\"\n31: \"b\"\n"
        );
    }

    #[test]
    fn override_can_add_rules() {
        let grammar = Grammar::builder()
            .load("0: 1 2\n1: \"a\"\n")
            .unwrap()
            .override_rule("2", "\"b\" | 1 2")
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(grammar.len(), 3);
        assert_eq!(grammar.recursive_rules(), vec![grammar.lookup("2").unwrap()]);
    }

    #[test]
    fn undefined_rules_fail_at_finish() {
        let builder = Grammar::builder().load("0: 1 2\n1: \"a\" | 3\n").unwrap();
        let errors = builder.finish().err().unwrap();
        assert_eq!(errors.len(), 2);
        let names: Vec<_> = errors
            .iter()
            .map(|e| match e {
                GrammarError::UndefinedRule {
                    name, referenced_by, ..
                } => (name.to_string(), referenced_by.to_string()),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            names,
            vec![("2".to_owned(), "0".to_owned()), ("3".to_owned(), "1".to_owned())]
        );
    }

    #[test]
    fn override_resolves_against_whole_table() {
        let result = Grammar::builder()
            .load("0: 1\n1: \"a\"\n")
            .unwrap()
            .override_rule("1", "\"a\" | 9")
            .unwrap()
            .finish();
        assert!(matches!(
            result.err().unwrap().0[0],
            GrammarError::UndefinedRule { .. }
        ));
    }

    #[test]
    fn duplicate_rules_are_rejected() {
        let src = "0: 1\n1: \"a\"\n1: \"b\"\n";
        let errors = Grammar::builder().load(src).err().unwrap();
        let GrammarError::DuplicateRule { name, span } = &errors.0[0] else {
            panic!("unexpected {errors:?}");
        };
        assert_eq!(&**name, "1");
        assert_eq!(span.start(), 12);
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        let builder = || Grammar::builder().load("0: \"a\"\n").unwrap();
        assert!(builder().override_rule("", "0").is_err());
        assert!(builder().override_rule("1", "0 |").is_err());
        assert!(builder().override_line("1 0").is_err());
    }
}
