//! Error types for the compiler pipeline.
//!
//! Each stage has its own error type and stops at its first error. The
//! driver collects them in [`CompileError`].

use std::path::PathBuf;

use overcast_parser::{LexError, ParseError};
use thiserror::Error;

/// A binding or type-checking violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BindError {
    pub message: String,
}

impl BindError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failures while lowering to the IR backend.
///
/// The `Unknown*` variants cannot happen after a successful bind; they
/// indicate an inconsistency between the binder and the code generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeGenError {
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("unknown struct `{0}`")]
    UnknownStruct(String),

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("struct `{struct_name}` has no member `{member}`")]
    UnknownMember { struct_name: String, member: String },

    #[error("operand stack underflow")]
    OperandStackUnderflow,

    #[error("{count} operand(s) left on the stack after lowering `{function}`")]
    OperandStackResidue { function: String, count: usize },

    #[error("builder is not positioned inside a function")]
    NoInsertionPoint,

    #[error("cannot lower {0}")]
    Unsupported(String),

    #[error("function `{function}` failed verification: {message}")]
    Verification {
        function: String,
        message: String,
        module_dump: Option<String>,
    },

    #[error("backend fault: {message}")]
    Backend {
        message: String,
        /// Textual dump of the partially built module.
        module_dump: Option<String>,
    },
}

impl CodeGenError {
    pub fn backend(message: impl Into<String>) -> Self {
        CodeGenError::Backend {
            message: message.into(),
            module_dump: None,
        }
    }

    pub fn verification(function: impl Into<String>, message: impl Into<String>) -> Self {
        CodeGenError::Verification {
            function: function.into(),
            message: message.into(),
            module_dump: None,
        }
    }

    /// The partially built module, for backend and verifier failures.
    pub fn module_dump(&self) -> Option<&str> {
        match self {
            CodeGenError::Verification { module_dump, .. }
            | CodeGenError::Backend { module_dump, .. } => module_dump.as_deref(),
            _ => None,
        }
    }
}

/// Any error the pipeline can stop with.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(ParseError),

    #[error("bind error: {0}")]
    Bind(#[from] BindError),

    #[error("codegen error: {0}")]
    CodeGen(#[from] CodeGenError),

    #[error("failed to access `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Lex(lex) => CompileError::Lex(lex),
            other => CompileError::Parse(other),
        }
    }
}

impl CompileError {
    /// Source position, for the stages that track one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            CompileError::Lex(err) => Some((err.line, err.column)),
            CompileError::Parse(err) => Some(err.position()),
            _ => None,
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            CompileError::Lex(_) => "lex",
            CompileError::Parse(_) => "parse",
            CompileError::Bind(_) => "bind",
            CompileError::CodeGen(_) => "codegen",
            CompileError::Io { .. } => "io",
        }
    }

    pub fn module_dump(&self) -> Option<&str> {
        match self {
            CompileError::CodeGen(err) => err.module_dump(),
            _ => None,
        }
    }

    /// The message without the stage prefix.
    pub fn message(&self) -> String {
        match self {
            CompileError::Lex(err) => err.message.clone(),
            CompileError::Parse(err) => err.to_string(),
            CompileError::Bind(err) => err.message.clone(),
            CompileError::CodeGen(err) => err.to_string(),
            CompileError::Io { .. } => self.to_string(),
        }
    }
}
