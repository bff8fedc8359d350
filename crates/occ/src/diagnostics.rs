//! Diagnostic reporting utilities for the Overcast compiler.
//!
//! Compact, rustc-style error reports on stderr:
//!
//! ```text
//! error: expected SYMBOL `)`, found IDENTIFIER `b`
//!   --> main.oc:2:9
//!    |
//!  2 | if (a > b c) {
//!    |         ^
//! note: parse stage
//! ```
//!
//! Only the lex and parse stages carry a position; later stages print the
//! header and note only. Backend and verifier failures end with the
//! partially built module. Output can be silenced process-wide with
//! [`suppress`], which tests use to keep stderr clean.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

use crate::error::CompileError;

static DIAGNOSTICS_ENABLED: AtomicBool = AtomicBool::new(true);

/// A single reportable error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub file: Option<String>,
    pub note: Option<String>,
    /// 1-based line and column.
    pub position: Option<(usize, usize)>,
    pub module_dump: Option<String>,
}

impl Diagnostic {
    pub fn simple(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
            note: None,
            position: None,
            module_dump: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Colors follow `colored`'s global override.
    pub fn render(&self, source: Option<&str>) -> String {
        let mut out = format!("{}: {}\n", "error".red().bold(), self.message.bold());

        match (&self.file, self.position) {
            (Some(file), Some((line, col))) => {
                out.push_str(&format!("  {} {file}:{line}:{col}\n", "-->".blue().bold()));
            }
            (Some(file), None) => out.push_str(&format!("  {} {file}\n", "-->".blue().bold())),
            (None, _) => {}
        }

        if let (Some(src), Some((line, col))) = (source, self.position)
            && let Some(text) = src.lines().nth(line.saturating_sub(1))
        {
            let gutter = line.to_string();
            let pad = " ".repeat(gutter.len());
            let bar = "|".blue().bold();
            out.push_str(&format!(" {pad} {bar}\n"));
            out.push_str(&format!(" {} {bar} {text}\n", gutter.blue().bold()));
            let caret = format!("{}^", " ".repeat(col.saturating_sub(1)));
            out.push_str(&format!(" {pad} {bar} {}\n", caret.red().bold()));
        }

        if let Some(note) = &self.note {
            out.push_str(&format!("{}: {note}\n", "note".cyan().bold()));
        }
        if let Some(dump) = &self.module_dump {
            out.push_str(&format!("{}:\n{dump}", "partial module".cyan().bold()));
            if !dump.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(err: &CompileError) -> Self {
        Self {
            message: err.message(),
            file: None,
            note: Some(format!("{} stage", err.stage())),
            position: err.position(),
            module_dump: err.module_dump().map(str::to_string),
        }
    }
}

/// Prints `diagnostic` to stderr unless diagnostics are suppressed.
pub fn emit_diagnostic(diagnostic: &Diagnostic, source: Option<&str>) {
    if DIAGNOSTICS_ENABLED.load(Ordering::SeqCst) {
        eprint!("{}", diagnostic.render(source));
    }
}

/// Reports a pipeline error against the file it came from.
pub fn report_error(file: Option<&str>, source: Option<&str>, err: &CompileError) {
    let mut diagnostic = Diagnostic::from(err);
    if let Some(file) = file {
        diagnostic = diagnostic.with_file(file);
    }
    emit_diagnostic(&diagnostic, source);
}

/// Silences diagnostics until the returned guard is dropped.
pub fn suppress() -> SuppressGuard {
    let prev = DIAGNOSTICS_ENABLED.swap(false, Ordering::SeqCst);
    SuppressGuard { prev }
}

pub struct SuppressGuard {
    prev: bool,
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        DIAGNOSTICS_ENABLED.store(self.prev, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodeGenError;

    #[test]
    fn render_points_at_column() {
        colored::control::set_override(false);
        let diagnostic = Diagnostic {
            message: "unexpected token".to_string(),
            file: Some("main.oc".to_string()),
            note: None,
            position: Some((2, 5)),
            module_dump: None,
        };
        let text = diagnostic.render(Some("func main() -> void {\nlet @\n}"));
        assert!(text.starts_with("error: unexpected token\n"));
        assert!(text.contains("--> main.oc:2:5"));
        assert!(text.contains(" 2 | let @"));
        assert!(text.contains("   |     ^"));
    }

    #[test]
    fn render_without_position_has_no_snippet() {
        colored::control::set_override(false);
        let text = Diagnostic::simple("boom").with_note("bind stage").render(Some("x"));
        assert_eq!(text, "error: boom\nnote: bind stage\n");
    }

    #[test]
    fn verifier_failures_print_the_partial_module() {
        colored::control::set_override(false);
        let err = CompileError::CodeGen(CodeGenError::Verification {
            function: "f".to_string(),
            message: "block `entry` has no terminator".to_string(),
            module_dump: Some("; ModuleID = 'm'\ndefine i32 @f() {\nentry:\n}".to_string()),
        });
        let text = Diagnostic::from(&err).render(None);
        assert!(text.contains("note: codegen stage\npartial module:\n; ModuleID = 'm'\n"));
        assert!(text.ends_with("entry:\n}\n"), "{text}");
    }
}
