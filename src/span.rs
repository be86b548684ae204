/// A byte offset range into a model artifact's source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Convert a 1-based line/column position (as reported by `serde_json`)
    /// into a one-byte span. Positions past the end clamp to the last byte.
    pub fn from_line_col(source: &str, line: usize, column: usize) -> Self {
        let mut offset = 0usize;
        for (i, text) in source.split_inclusive('\n').enumerate() {
            if i + 1 == line {
                let col = column.saturating_sub(1).min(text.len());
                offset += col;
                break;
            }
            offset += text.len();
        }
        let offset = offset.min(source.len().saturating_sub(1));
        let end = (offset + 1).min(source.len());
        Span::new(offset as u32, end as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_line_col_first_line() {
        let span = Span::from_line_col("{\"a\": 1}", 1, 3);
        assert_eq!(span, Span::new(2, 3));
    }

    #[test]
    fn test_from_line_col_later_line() {
        let source = "{\n  \"a\": x\n}\n";
        let span = Span::from_line_col(source, 2, 8);
        assert_eq!(&source[span.start as usize..span.end as usize], "x");
    }

    #[test]
    fn test_from_line_col_clamps() {
        let span = Span::from_line_col("[1,", 9, 9);
        assert_eq!(span, Span::new(2, 3));
        assert_eq!(Span::from_line_col("", 1, 1), Span::new(0, 0));
    }
}
