use std::{
    fmt::{Display, Write},
    path::PathBuf,
};

use anyhow::{anyhow, Context};
use clap::Parser;
use rulematch::{
    count_full_matches, Grammar, GrammarError, GrammarSource, MatchConfig, MatchLimits,
    PuzzleInput, Variant, PUZZLE_OVERRIDES,
};

/// Count the messages fully matched by the root rule of a grammar.
#[derive(Parser, Debug)]
#[command(name = "rulematch", version)]
struct Args {
    /// Rules, a blank line, then one message per line
    file: PathBuf,

    /// Explore every alternative and replace rules 8 and 11 with their looping forms
    #[arg(long)]
    loops: bool,

    /// Rule every message has to match completely
    #[arg(long, default_value = "0")]
    root: String,

    /// Replace or add a rule, `<ID>: <DEFINITION>`, applied after the puzzle overrides
    #[arg(long = "override", value_name = "RULE")]
    overrides: Vec<String>,

    #[arg(long, default_value_t = MatchLimits::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[arg(long, default_value_t = MatchLimits::DEFAULT_MAX_CANDIDATES)]
    max_candidates: usize,

    /// Print the resolved grammar before matching
    #[arg(long)]
    dump: bool,

    /// Falls back to `RUST_LOG`, then `warn`
    #[arg(long)]
    log_level: Option<log::LevelFilter>,
}

impl Args {
    fn config(&self) -> MatchConfig {
        let mut overrides = Vec::new();
        if self.loops {
            overrides.extend(PUZZLE_OVERRIDES.iter().map(|&o| o.to_owned()));
        }
        overrides.extend(self.overrides.iter().cloned());

        MatchConfig {
            variant: if self.loops {
                Variant::Looping
            } else {
                Variant::Simple
            },
            root: self.root.clone(),
            limits: MatchLimits {
                max_depth: self.max_depth,
                max_candidates: self.max_candidates,
            },
            overrides,
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logger(args.log_level);

    if let Err(e) = run(&args) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logger(level: Option<log::LevelFilter>) {
    let level = level.unwrap_or_else(|| {
        std::env::var("RUST_LOG")
            .ok()
            .and_then(|l| l.parse().ok())
            .unwrap_or(log::LevelFilter::Warn)
    });

    let result = simplelog::TermLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_time_format_custom(&[])
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Never,
    );
    if let Err(e) = result {
        eprintln!("failed to initialize logging: {e}");
    }
}

fn write_error(
    out: &mut dyn Write,
    file: &dyn Display,
    src: &str,
    source: GrammarSource<'_>,
    err: &GrammarError,
) -> std::fmt::Result {
    let text = match source {
        GrammarSource::Text => {
            write!(out, "{file}")?;
            src
        }
        GrammarSource::Override(text) => {
            write!(out, "override `{text}`")?;
            text
        }
    };
    match err.span() {
        Some(span) => {
            let (line, col) = span.line_col(text);
            writeln!(out, ":{line}:{col} {err}")
        }
        None => writeln!(out, " {err}"),
    }
}

/// Builds the grammar, writing `<source>:<line>:<col> <message>` to `diagnostics` for every
/// error.
fn load_grammar(
    file: &dyn Display,
    src: &str,
    config: &MatchConfig,
    diagnostics: &mut dyn Write,
) -> anyhow::Result<Grammar> {
    let mut written: std::fmt::Result = Ok(());
    let result = config.build_grammar_with(src, &mut |source, err: &GrammarError| {
        if written.is_ok() {
            written = write_error(diagnostics, file, src, source, err);
        }
    });
    written?;

    result.map_err(|errors| anyhow!("grammar has {} error(s)", errors.len()))
}

/// Matches every message of `src`, the dump and the count go to `out`.
fn execute(
    args: &Args,
    src: &str,
    out: &mut dyn Write,
    diagnostics: &mut dyn Write,
) -> anyhow::Result<usize> {
    let config = args.config();
    let file = args.file.display();

    let input = PuzzleInput::split(src);
    if input.lines.is_empty() {
        log::warn!("`{file}` contains no messages");
    }

    let grammar = load_grammar(&file, input.grammar, &config, diagnostics)?;
    if grammar.is_empty() {
        log::warn!("`{file}` defines no rules");
    }
    log::debug!(
        "loaded {} rules, {} recursive",
        grammar.len(),
        grammar.recursive_rules().len()
    );

    if args.dump {
        grammar.display_into(out)?;
    }

    // grammar errors hold `Rc` names, so they are rendered before crossing into anyhow
    let matcher = config
        .matcher(&grammar)
        .map_err(|err| anyhow!("{err}"))
        .with_context(|| format!("failed to select the {:?} matcher", config.variant))?;

    let count = count_full_matches(&*matcher, &input.lines);
    writeln!(out, "{count}")?;

    Ok(count)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let src = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read `{}`", args.file.display()))?;

    let mut out = String::new();
    let mut diagnostics = String::new();
    let result = execute(args, &src, &mut out, &mut diagnostics);

    eprint!("{diagnostics}");
    print!("{out}");
    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn loops_adds_puzzle_overrides_first() {
        let args = Args::parse_from([
            "rulematch",
            "--loops",
            "--override",
            "3: \"c\"",
            "input.txt",
        ]);
        let config = args.config();
        assert_eq!(config.variant, Variant::Looping);
        assert_eq!(config.overrides, vec![PUZZLE_OVERRIDES[0], PUZZLE_OVERRIDES[1], "3: \"c\""]);
        assert_eq!(config.limits, MatchLimits::default());
    }

    #[test]
    fn defaults() {
        let args = Args::parse_from(["rulematch", "input.txt"]);
        let config = args.config();
        assert_eq!(config.variant, Variant::Simple);
        assert_eq!(config.root, "0");
        assert!(config.overrides.is_empty());
        assert_eq!(args.log_level, None);
    }

    #[test]
    fn limits_and_level() {
        let args = Args::parse_from([
            "rulematch",
            "--max-depth",
            "8",
            "--max-candidates",
            "100",
            "--log-level",
            "debug",
            "--root",
            "42",
            "input.txt",
        ]);
        let config = args.config();
        assert_eq!(config.limits.max_depth, 8);
        assert_eq!(config.limits.max_candidates, 100);
        assert_eq!(config.root, "42");
        assert_eq!(args.log_level, Some(log::LevelFilter::Debug));
    }

    fn execute_args(argv: &[&str], src: &str) -> (anyhow::Result<usize>, String, String) {
        let args = Args::parse_from(argv);
        let mut out = String::new();
        let mut diagnostics = String::new();
        let result = execute(&args, src, &mut out, &mut diagnostics);
        (result, out, diagnostics)
    }

    #[test]
    fn malformed_line_is_reported_with_position() {
        let src = "0: 1\n1 \"a\"\n\na\n";
        let (result, out, diagnostics) = execute_args(&["rulematch", "input.txt"], src);

        assert_eq!(result.unwrap_err().to_string(), "grammar has 1 error(s)");
        assert_eq!(out, "");
        assert_eq!(diagnostics, "input.txt:2:1 expected `<rule>: <definition>`\n");
    }

    #[test]
    fn override_errors_point_into_the_override() {
        let src = "0: 1\n1: \"a\"\n\na\n";
        let argv = ["rulematch", "--override", "0: 1 9", "input.txt"];
        let (result, _, diagnostics) = execute_args(&argv, src);

        assert!(result.is_err());
        assert_eq!(
            diagnostics,
            "override `0: 1 9`:1:6 rule `0` references undefined rule `9`\n"
        );
    }

    #[test]
    fn dump_prints_grammar_before_count() {
        let src = "0: 1 2 | 2 1\n1: \"a\"\n2: \"b\"\n\nab\nba\nbb\n";
        let (result, out, diagnostics) = execute_args(&["rulematch", "--dump", "input.txt"], src);

        assert_eq!(result.unwrap(), 2);
        assert_eq!(out, "0: 1 2 | 2 1\n1: \"a\"\n2: \"b\"\n2\n");
        assert_eq!(diagnostics, "");
    }

    #[test]
    fn missing_root_names_the_variant() {
        let src = "1: \"a\"\n\na\n";
        let (result, _, _) = execute_args(&["rulematch", "input.txt"], src);

        assert_eq!(
            format!("{:#}", result.unwrap_err()),
            "failed to select the Simple matcher: root rule `0` is not defined"
        );
    }
}
