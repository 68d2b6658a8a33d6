use crate::{
    error::{GrammarError, GrammarErrors},
    grammar::{Grammar, GrammarBuilder},
    matcher::{LoopingMatcher, MatchLimits, Matcher, SimpleMatcher},
};

/// Rules replaced to turn the puzzle grammar into its looping form.
pub const PUZZLE_OVERRIDES: [&str; 2] = ["8: 42 | 42 8", "11: 42 31 | 42 11 31"];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Variant {
    /// first matching alternative wins
    #[default]
    Simple,
    /// all alternatives are explored, self reference is guarded
    Looping,
}

/// Text that a reported error's span points into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GrammarSource<'c> {
    /// the grammar text being built
    Text,
    /// one of [`MatchConfig::overrides`]
    Override(&'c str),
}

#[derive(Clone, Debug)]
pub struct MatchConfig {
    pub variant: Variant,
    pub root: String,
    pub limits: MatchLimits,
    /// `<rule>: <definition>` lines applied after loading, in order
    pub overrides: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Simple,
            root: "0".to_owned(),
            limits: MatchLimits::default(),
            overrides: Vec::new(),
        }
    }
}

impl MatchConfig {
    /// The looping variant with [`PUZZLE_OVERRIDES`] applied.
    pub fn looping() -> MatchConfig {
        Self {
            variant: Variant::Looping,
            overrides: PUZZLE_OVERRIDES.iter().map(|&o| o.to_owned()).collect(),
            ..Default::default()
        }
    }

    pub fn build_grammar(&self, src: &str) -> Result<Grammar, GrammarErrors> {
        self.build_grammar_with(src, &mut |_, _| {})
    }

    /// Loads `src`, applies the overrides and resolves the result, passing every error to
    /// `report` along with the text its span points into.
    pub fn build_grammar_with<'c>(
        &'c self,
        src: &str,
        report: &mut dyn FnMut(GrammarSource<'c>, &GrammarError),
    ) -> Result<Grammar, GrammarErrors> {
        let mut builder = Grammar::builder().load(src).map_err(|errors| {
            errors.iter().for_each(|err| report(GrammarSource::Text, err));
            errors
        })?;

        for line in &self.overrides {
            builder = builder.override_line(line).map_err(|errors| {
                errors
                    .iter()
                    .for_each(|err| report(GrammarSource::Override(line), err));
                errors
            })?;
        }

        self.finish_grammar(builder).map_err(|errors| {
            errors.iter().for_each(|err| report(self.source_of(err), err));
            errors
        })
    }

    /// Resolves the builder, warning when the simple variant is about to run on a cycle.
    pub fn finish_grammar(&self, builder: GrammarBuilder) -> Result<Grammar, GrammarErrors> {
        let grammar = builder.finish()?;

        if self.variant == Variant::Simple && grammar.has_cycles() {
            log::warn!("grammar is recursive, the simple matcher only stops at the depth limit");
        }

        Ok(grammar)
    }

    /// Unresolved references belong to the last override of the referencing rule, if any.
    fn source_of(&self, err: &GrammarError) -> GrammarSource<'_> {
        if let GrammarError::UndefinedRule { referenced_by, .. } = err {
            let overridden = self.overrides.iter().rev().find(|line| {
                line.split_once(':')
                    .is_some_and(|(name, _)| name.trim() == &**referenced_by)
            });
            if let Some(line) = overridden {
                return GrammarSource::Override(line);
            }
        }
        GrammarSource::Text
    }

    pub fn matcher<'g>(&self, grammar: &'g Grammar) -> Result<Box<dyn Matcher + 'g>, GrammarError> {
        Ok(match self.variant {
            Variant::Simple => {
                Box::new(SimpleMatcher::new(grammar, &self.root)?.with_limits(self.limits))
            }
            Variant::Looping => {
                Box::new(LoopingMatcher::new(grammar, &self.root)?.with_limits(self.limits))
            }
        })
    }
}
