// src/emit/writer.rs
//
// Indented text writer for native output. Lines open lazily: the first
// write on a fresh line lays down the indent, end_line closes it.

#[derive(Debug, Default)]
pub struct CxxWriter {
    out: String,
    indent: usize,
    line_open: bool,
}

impl CxxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        debug_assert!(self.indent > 0, "unbalanced dedent");
        self.indent = self.indent.saturating_sub(1);
    }

    /// Appends to the current line, opening it with indent when fresh.
    pub fn emit(&mut self, text: &str) {
        if !self.line_open {
            for _ in 0..self.indent {
                self.out.push_str("    ");
            }
            self.line_open = true;
        }
        self.out.push_str(text);
    }

    pub fn end_line(&mut self) {
        self.out.push('\n');
        self.line_open = false;
    }

    /// A complete line at the current indent.
    pub fn emit_line(&mut self, line: &str) {
        self.emit(line);
        self.end_line();
    }

    pub fn blank_line(&mut self) {
        if self.line_open {
            self.end_line();
        }
        self.out.push('\n');
    }

    pub fn open_block(&mut self) {
        self.emit_line("{");
        self.indent();
    }

    pub fn close_block(&mut self) {
        self.dedent();
        self.emit_line("}");
    }

    /// Closes a class/struct/enum body: `};`.
    pub fn close_block_stmt(&mut self) {
        self.dedent();
        self.emit_line("};");
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn finish(mut self) -> String {
        if self.line_open {
            self.end_line();
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_blocks_and_closes_open_lines() {
        let mut w = CxxWriter::new();
        w.emit_line("class Foo");
        w.open_block();
        w.emit("int32_t x");
        w.emit(";");
        w.end_line();
        w.close_block_stmt();
        assert_eq!(w.finish(), "class Foo\n{\n    int32_t x;\n};\n");
    }

    #[test]
    fn finish_terminates_a_dangling_line() {
        let mut w = CxxWriter::new();
        w.emit("namespace A { }");
        assert_eq!(w.finish(), "namespace A { }\n");
    }
}
