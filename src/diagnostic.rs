use crate::{ParseOutcome, Position, SyntaxError};
use std::fmt::Write;

/// Renders a caret-style message pointing at a position in a text source.
///
/// ```text
/// expected a value
///   --> input.txt:2:5
///   |
/// 2 | b = #;
///   |     ^ expected a value
/// ```
#[derive(Debug)]
pub struct ErrorMessageBuilder<'a> {
    text: &'a str,
    position: Position,
    message: String,
    filename: String,
}

impl<'a> ErrorMessageBuilder<'a> {
    pub fn new(text: &'a str, position: Position) -> Self {
        Self {
            text,
            position: Position::new(std::cmp::min(text.len(), position.get())),
            message: "unexpected input".to_owned(),
            filename: "<UNKNOWN>".to_owned(),
        }
    }

    /// Points at the furthest position a failed parse reached.
    pub fn from_outcome<Id>(text: &'a str, outcome: &ParseOutcome<Id>) -> Self {
        Self::new(text, outcome.furthest_position)
    }

    /// Points at a recovered syntax error, naming it by its id.
    pub fn from_syntax_error<Id: std::fmt::Debug>(text: &'a str, error: &SyntaxError<Id>) -> Self {
        Self::new(text, error.position()).message(&format!("syntax error: {:?}", error.id()))
    }

    pub fn filename(mut self, filename: &str) -> Self {
        self.filename = filename.to_owned();
        self
    }

    pub fn message(mut self, message: &str) -> Self {
        self.message = message.to_owned();
        self
    }

    pub fn build(self) -> String {
        self.try_build().expect("unreachable")
    }

    fn try_build(self) -> Result<String, std::fmt::Error> {
        let offset = self.position.get();
        let (line, column) = self.position.line_and_column(self.text);
        let line_start = self.text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line_text = self.text[line_start..].lines().next().unwrap_or("");

        let mut s = String::new();
        s += &self.message;
        if offset == self.text.len() {
            s += ", reached EOS";
        }
        s += "\n";

        writeln!(s, "  --> {}:{}:{}", self.filename, line, column)?;

        let line_len = line.to_string().len();
        writeln!(s, "{:line_len$} |", ' ')?;
        writeln!(s, "{} | {}", line, line_text)?;
        writeln!(s, "{:line_len$} | {:>column$} {}", ' ', '^', self.message)?;
        Ok(s)
    }
}
