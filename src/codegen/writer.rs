/// Line-oriented C source builder with brace-driven indentation.
pub(crate) struct CWriter {
    out: String,
    indent: usize,
}

impl CWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Emit a line ending in `{` and indent what follows.
    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    /// Dedent, then emit a closing line such as `}` or `} else {`.
    pub fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    /// `} else {`: close the current block and open the next at the same depth.
    pub fn reopen(&mut self, text: &str) {
        self.close(text);
        self.indent += 1;
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks() {
        let mut w = CWriter::new();
        w.open("int f(void) {");
        w.open("if (1) {");
        w.line("return 1;");
        w.reopen("} else {");
        w.line("return 0;");
        w.close("}");
        w.close("}");
        assert_eq!(
            w.finish(),
            "int f(void) {\n    if (1) {\n        return 1;\n    } else {\n        return 0;\n    }\n}\n"
        );
    }

    #[test]
    fn test_close_never_underflows() {
        let mut w = CWriter::new();
        w.close("}");
        w.blank();
        assert_eq!(w.finish(), "}\n\n");
    }
}
