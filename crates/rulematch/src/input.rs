/// A puzzle input: rule definitions, a blank line, then one message per line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PuzzleInput<'a> {
    /// Starts at offset 0 of the source, spans reported for it apply to the whole file.
    pub grammar: &'a str,
    pub lines: Vec<&'a str>,
}

impl<'a> PuzzleInput<'a> {
    pub fn split(src: &'a str) -> PuzzleInput<'a> {
        let mut offset = 0;

        for line in src.split_inclusive('\n') {
            if line.trim().is_empty() {
                let rest = &src[offset + line.len()..];
                return PuzzleInput {
                    grammar: &src[..offset],
                    lines: rest
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .collect(),
                };
            }
            offset += line.len();
        }

        PuzzleInput {
            grammar: src,
            lines: Vec::new(),
        }
    }
}
