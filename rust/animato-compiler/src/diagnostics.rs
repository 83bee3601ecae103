//! Error diagnostics with source snippets and fix hints.

use crate::compiler::expand::ExpandError;
use crate::compiler::lexer::LexError;
use crate::compiler::lower::LowerError;
use crate::compiler::parser::ParseError;
use crate::CompileError;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A rendered diagnostic with source context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub col: Option<usize>,
    pub source_line: Option<String>,
    pub underline: Option<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Render with ANSI colors for a terminal.
    pub fn render_ansi(&self) -> String {
        self.render(true)
    }

    /// Render without colors, for logs and tests.
    pub fn render_plain(&self) -> String {
        self.render(false)
    }

    fn render(&self, styled: bool) -> String {
        let paint = |text: &str, style: &str| {
            if styled {
                format!("\x1b[{}m{}\x1b[0m", style, text)
            } else {
                text.to_string()
            }
        };
        let mut out = String::new();

        // Header: error[E030]: message
        let label = match self.severity {
            Severity::Error => paint("error", "31"),
            Severity::Warning => paint("warning", "33"),
            Severity::Note => paint("note", "36"),
        };
        match &self.code {
            Some(code) => out.push_str(&format!("{}[{}]: ", label, paint(code, "1"))),
            None => out.push_str(&format!("{}: ", label)),
        }
        out.push_str(&paint(&self.message, "1"));
        out.push('\n');

        // Location: --> file:line:col
        if let (Some(file), Some(line)) = (&self.file, self.line) {
            match self.col {
                Some(col) => out.push_str(&format!(
                    "  {} {}:{}:{}\n",
                    paint("-->", "36"),
                    file,
                    line,
                    col
                )),
                None => out.push_str(&format!("  {} {}:{}\n", paint("-->", "36"), file, line)),
            }
        }

        // Source line with caret underline.
        if let (Some(line_num), Some(line_text), Some(underline)) =
            (self.line, &self.source_line, &self.underline)
        {
            out.push_str(&format!("   {}\n", paint("|", "36")));
            out.push_str(&format!(
                "{:>3} {} {}\n",
                paint(&line_num.to_string(), "36"),
                paint("|", "36"),
                line_text
            ));
            out.push_str(&format!(
                "   {} {}\n",
                paint("|", "36"),
                paint(underline, "31")
            ));
        }

        if !self.suggestions.is_empty() {
            out.push_str(&format!("   {}\n", paint("|", "36")));
            for suggestion in &self.suggestions {
                out.push_str(&format!(
                    "   {} {}: {}\n",
                    paint("=", "36"),
                    paint("help", "36"),
                    suggestion
                ));
            }
        }

        out
    }
}

fn get_source_line(source: &str, line: usize) -> Option<String> {
    source
        .lines()
        .nth(line.saturating_sub(1))
        .map(|s| s.to_string())
}

fn make_underline(col: usize, len: usize) -> String {
    format!(
        "{}{}",
        " ".repeat(col.saturating_sub(1)),
        "^".repeat(len.max(1))
    )
}

/// Convert a compile error plus source text into a diagnostic.
pub fn format_compile_error(error: &CompileError, source: &str, filename: &str) -> Diagnostic {
    match error {
        CompileError::Lex(e) => format_lex_error(e, source, filename),
        CompileError::Parse(e) => format_parse_error(e, source, filename),
        CompileError::Expand(e) => format_expand_error(e, source, filename),
    }
}

#[allow(clippy::too_many_arguments)]
fn diag(
    source: &str,
    filename: &str,
    code: &str,
    message: String,
    line: usize,
    col: usize,
    underline_len: usize,
    suggestions: Vec<String>,
) -> Diagnostic {
    let source_line = get_source_line(source, line);
    let underline = source_line
        .as_ref()
        .map(|_| make_underline(col, underline_len));
    Diagnostic {
        severity: Severity::Error,
        code: Some(code.to_string()),
        message,
        file: Some(filename.to_string()),
        line: Some(line),
        col: Some(col),
        source_line,
        underline,
        suggestions,
    }
}

fn format_lex_error(error: &LexError, source: &str, filename: &str) -> Diagnostic {
    match error {
        LexError::UnexpectedChar { ch, line, col } => diag(
            source,
            filename,
            "E001",
            format!("unexpected character '{}'", ch),
            *line,
            *col,
            1,
            vec![],
        ),
        LexError::UnterminatedString { line, col } => {
            let len = get_source_line(source, *line)
                .map(|l| l.len().saturating_sub(*col) + 1)
                .unwrap_or(1);
            diag(
                source,
                filename,
                "E002",
                "unterminated string literal".to_string(),
                *line,
                *col,
                len,
                vec!["add a closing quote".to_string()],
            )
        }
        LexError::UnterminatedComment { line, col } => diag(
            source,
            filename,
            "E003",
            "unterminated block comment".to_string(),
            *line,
            *col,
            2,
            vec!["close the comment with */".to_string()],
        ),
        LexError::InvalidNumber { line, col } => diag(
            source,
            filename,
            "E004",
            "invalid number literal".to_string(),
            *line,
            *col,
            1,
            vec![],
        ),
    }
}

fn format_parse_error(error: &ParseError, source: &str, filename: &str) -> Diagnostic {
    match error {
        ParseError::Unexpected {
            found,
            expected,
            line,
            col,
        } => diag(
            source,
            filename,
            "E010",
            format!("unexpected token '{}', expected {}", found, expected),
            *line,
            *col,
            found.chars().count().max(1),
            vec![],
        ),
        ParseError::ReservedWord { word, line, col } => diag(
            source,
            filename,
            "E012",
            format!("unsupported keyword '{}'", word),
            *line,
            *col,
            word.chars().count().max(1),
            vec!["loops and function declarations cannot appear in worklet files".to_string()],
        ),
        ParseError::UnexpectedEof => Diagnostic {
            severity: Severity::Error,
            code: Some("E011".to_string()),
            message: "unexpected end of input".to_string(),
            file: Some(filename.to_string()),
            line: None,
            col: None,
            source_line: None,
            underline: None,
            suggestions: vec!["check for an unclosed brace or parenthesis".to_string()],
        },
    }
}

fn format_expand_error(error: &ExpandError, source: &str, filename: &str) -> Diagnostic {
    match error {
        ExpandError::BadMacroCall { name, line, col } => diag(
            source,
            filename,
            "E020",
            format!("`{}` expects a single arrow function argument", name),
            *line,
            *col,
            name.chars().count(),
            vec!["pass a zero-parameter arrow: define(() => { ... })".to_string()],
        ),
        ExpandError::Lower(inner) => format_lower_error(inner, source, filename),
    }
}

fn format_lower_error(error: &LowerError, source: &str, filename: &str) -> Diagnostic {
    match error {
        LowerError::UnsupportedOperator { op, line, col } => {
            let suggestions = match op.as_str() {
                "==" => vec!["use '===' instead".to_string()],
                "!=" => vec!["use '!==' instead".to_string()],
                _ => vec![],
            };
            diag(
                source,
                filename,
                "E030",
                format!("operator `{}` has no engine equivalent", op),
                *line,
                *col,
                op.chars().count(),
                suggestions,
            )
        }
        LowerError::PatternTarget { line, col } => diag(
            source,
            filename,
            "E031",
            "destructuring assignment is not supported in a worklet".to_string(),
            *line,
            *col,
            1,
            vec!["assign each element with its own statement".to_string()],
        ),
        LowerError::InvalidAssignTarget { line, col } => diag(
            source,
            filename,
            "E032",
            "assignment target must be a plain identifier".to_string(),
            *line,
            *col,
            1,
            vec![],
        ),
        LowerError::AssignmentInExpression { line, col } => diag(
            source,
            filename,
            "E033",
            "assignment is only allowed as a statement".to_string(),
            *line,
            *col,
            1,
            vec!["give the assignment its own statement".to_string()],
        ),
        LowerError::UnsupportedConstruct { what, line, col } => diag(
            source,
            filename,
            "E034",
            format!("{} is not supported in a worklet", what),
            *line,
            *col,
            1,
            vec![],
        ),
    }
}
