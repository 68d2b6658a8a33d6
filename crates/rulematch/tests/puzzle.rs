use pretty_assertions::assert_eq;
use rulematch::{count_full_matches, GrammarError, MatchConfig, Matcher, PuzzleInput};

const ALTERNATING: &str = include_str!("data/alternating.txt");
const RECURSIVE: &str = include_str!("data/recursive_messages.txt");

fn run(src: &str, config: &MatchConfig) -> usize {
    let input = PuzzleInput::split(src);
    let grammar = config.build_grammar(input.grammar).unwrap();
    let matcher = config.matcher(&grammar).unwrap();
    count_full_matches(&*matcher, &input.lines)
}

fn accepted<'a>(src: &'a str, config: &MatchConfig) -> Vec<&'a str> {
    let input = PuzzleInput::split(src);
    let grammar = config.build_grammar(input.grammar).unwrap();
    let matcher = config.matcher(&grammar).unwrap();
    input
        .lines
        .iter()
        .copied()
        .filter(|line| matcher.full_match(line).unwrap())
        .collect()
}

fn looping_without_overrides() -> MatchConfig {
    MatchConfig {
        overrides: Vec::new(),
        ..MatchConfig::looping()
    }
}

#[test]
fn alternating_grammar() {
    let expected = vec!["ababbb", "abbbab"];
    assert_eq!(run(ALTERNATING, &MatchConfig::default()), 2);
    assert_eq!(accepted(ALTERNATING, &MatchConfig::default()), expected);

    assert_eq!(run(ALTERNATING, &looping_without_overrides()), 2);
    assert_eq!(accepted(ALTERNATING, &looping_without_overrides()), expected);
}

#[test]
fn puzzle_overrides_need_rules_42_and_31() {
    let input = PuzzleInput::split(ALTERNATING);
    let errors = MatchConfig::looping()
        .build_grammar(input.grammar)
        .err()
        .unwrap();

    let mut undefined: Vec<(&str, &str)> = errors
        .iter()
        .map(|err| match err {
            GrammarError::UndefinedRule {
                name,
                referenced_by,
                ..
            } => (&**name, &**referenced_by),
            other => panic!("unexpected error {other}"),
        })
        .collect();
    undefined.sort();
    undefined.dedup();
    assert_eq!(undefined, vec![("31", "11"), ("42", "11"), ("42", "8")]);
}

#[test]
fn recursive_grammar_before_overrides() {
    let expected = vec!["bbabbbbaabaabba", "ababaaaaaabaaab", "ababaaaaabbbaba"];
    assert_eq!(accepted(RECURSIVE, &MatchConfig::default()), expected);

    // no cycles yet, exploring every alternative changes nothing
    assert_eq!(accepted(RECURSIVE, &looping_without_overrides()), expected);
}

#[test]
fn recursive_grammar_with_overrides() {
    let config = MatchConfig::looping();
    assert_eq!(run(RECURSIVE, &config), 12);

    let input = PuzzleInput::split(RECURSIVE);
    let accepted = accepted(RECURSIVE, &config);
    let rejected: Vec<_> = input
        .lines
        .iter()
        .copied()
        .filter(|line| !accepted.contains(line))
        .collect();
    assert_eq!(
        rejected,
        vec![
            "abbbbbabbbaaaababbaabbbbabababbbabbbbbbabaaaa",
            "aaaabbaaaabbaaa",
            "babaaabbbaaabaababbaabababaaab",
        ]
    );
}

#[test]
fn matching_is_repeatable() {
    let config = MatchConfig::looping();
    let input = PuzzleInput::split(RECURSIVE);
    let grammar = config.build_grammar(input.grammar).unwrap();
    let matcher = config.matcher(&grammar).unwrap();

    let first = count_full_matches(&*matcher, &input.lines);
    let second = count_full_matches(&*matcher, &input.lines);
    assert_eq!(first, second);
}

#[test]
fn undefined_reference_is_a_load_error() {
    let config = MatchConfig::default();
    let errors = config.build_grammar("0: 1 2\n1: \"a\"\n").err().unwrap();
    assert_eq!(errors.to_string(), "5..6: rule `0` references undefined rule `2`");
}
