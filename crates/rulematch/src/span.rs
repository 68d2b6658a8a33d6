use std::{fmt::Display, ops::Deref};

/// Byte range into the grammar text a definition was loaded from.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Span {
        debug_assert!(start <= end);
        Self { start, end }
    }
    pub fn at(pos: u32) -> Span {
        Self {
            start: pos,
            end: pos,
        }
    }
    /// Builds a span from offsets local to a slice that starts at `base` in the full source.
    pub fn from_local(base: u32, start: usize, end: usize) -> Span {
        // grammar sources are small, offsets comfortably fit
        Self::new(base + start as u32, base + end as u32)
    }
    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }
    pub fn start(self) -> u32 {
        self.start
    }
    pub fn end(self) -> u32 {
        self.end
    }
    #[track_caller]
    pub fn as_str(self, src: &str) -> &str {
        &src[self.start as usize..self.end as usize]
    }
    /// One-based line and column of the span start, columns count chars.
    pub fn line_col(self, src: &str) -> (usize, usize) {
        let offset = (self.start as usize).min(src.len());
        let before = &src[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub inner: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Spanned<T> {
        Spanned { inner: value, span }
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[test]
fn test_line_col() {
    let src = "0: 1 2\n1: \"a\"\n2: \"b\"\n";
    assert_eq!(Span::at(0).line_col(src), (1, 1));
    assert_eq!(Span::at(3).line_col(src), (1, 4));
    assert_eq!(Span::at(10).line_col(src), (2, 4));
    assert_eq!(Span::new(14, 20).line_col(src), (3, 1));
    assert_eq!(Span::at(500).line_col(src), (4, 1));
}
