// error.rs - Error types for pattern compilation and matching.
//
// All errors are flat, code-tagged values annotated with the 1-based byte
// position of the pattern field they originate from. Runtime errors may
// carry a lower-level cause (I/O or integer parsing), reachable through
// `std::error::Error::source` and appended to the rendered form as
// `"... caused by <cause>"`.

use std::fmt;
use std::io;
use std::num::ParseIntError;
use std::str::Utf8Error;

// === Compile errors ===

/// Error produced while compiling a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A directive field contained zero or more than one `:`.
    ColonExpected { pos: usize },
    /// A size reference named an integer variable with no prior declaration.
    VariableNotDefined { name: String, pos: usize },
    /// A suffix-terminated directive was not followed by a suffix field.
    SuffixExpected { pos: usize },
    /// A binding field contained more than one `/`.
    InvalidSlash { pos: usize },
    /// The token after `/` was neither `bin` nor `int`.
    InvalidType { pos: usize },
}

impl CompileError {
    /// 1-based byte position of the field the error was detected in.
    pub fn position(&self) -> usize {
        match self {
            CompileError::ColonExpected { pos }
            | CompileError::VariableNotDefined { pos, .. }
            | CompileError::SuffixExpected { pos }
            | CompileError::InvalidSlash { pos }
            | CompileError::InvalidType { pos } => *pos,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::ColonExpected { pos } => write!(f, "':' expected at {}", pos),
            CompileError::VariableNotDefined { name, pos } => {
                write!(f, "variable \"{}\" not defined at {}", name, pos)
            }
            CompileError::SuffixExpected { pos } => write!(f, "suffix expected at {}", pos),
            CompileError::InvalidSlash { pos } => {
                write!(f, "'/' appeared more than once at {}", pos)
            }
            CompileError::InvalidType { pos } => {
                write!(f, "\"bin\" or \"int\" expected after '/' at {}", pos)
            }
        }
    }
}

impl std::error::Error for CompileError {}

// === Match errors ===

/// Lower-level cause of a failed integer instruction.
#[derive(Debug)]
pub enum IntCause {
    /// The byte source failed (short read at end of input, or a transport
    /// error).
    Io(io::Error),
    /// The consumed bytes were not valid UTF-8.
    Utf8(Utf8Error),
    /// The consumed text was not a signed decimal integer in `i64` range.
    Parse(ParseIntError),
}

impl fmt::Display for IntCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntCause::Io(e) => e.fmt(f),
            IntCause::Utf8(e) => e.fmt(f),
            IntCause::Parse(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for IntCause {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntCause::Io(e) => Some(e),
            IntCause::Utf8(e) => Some(e),
            IntCause::Parse(e) => Some(e),
        }
    }
}

/// Error produced while executing a compiled matcher against a byte source.
///
/// The first failing instruction aborts the match; captures collected by
/// earlier instructions are discarded.
#[derive(Debug)]
pub enum MatchError {
    /// A constant field did not match the input, or the input ended before
    /// the constant could be read in full.
    ConstNotMatched {
        pos: usize,
        cause: Option<io::Error>,
    },
    /// A variable field could not be read in full, or its size cell held a
    /// negative value.
    VarNotMatched {
        pos: usize,
        cause: Option<io::Error>,
    },
    /// An integer field could not be read or did not parse as a decimal.
    IntVarNotMatched {
        pos: usize,
        cause: Option<IntCause>,
    },
    /// A suffix scan outgrew the configured maximum buffer size.
    VarExceedsMaxSize { pos: usize, max: usize },
}

impl MatchError {
    /// 1-based byte position of the pattern field whose instruction failed.
    pub fn position(&self) -> usize {
        match self {
            MatchError::ConstNotMatched { pos, .. }
            | MatchError::VarNotMatched { pos, .. }
            | MatchError::IntVarNotMatched { pos, .. }
            | MatchError::VarExceedsMaxSize { pos, .. } => *pos,
        }
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::ConstNotMatched { pos, cause } => {
                write!(f, "const not matched at {}", pos)?;
                render_cause(f, cause.as_ref().map(|c| c as &dyn fmt::Display))
            }
            MatchError::VarNotMatched { pos, cause } => {
                write!(f, "variable not matched at {}", pos)?;
                render_cause(f, cause.as_ref().map(|c| c as &dyn fmt::Display))
            }
            MatchError::IntVarNotMatched { pos, cause } => {
                write!(f, "integer variable not matched at {}", pos)?;
                render_cause(f, cause.as_ref().map(|c| c as &dyn fmt::Display))
            }
            MatchError::VarExceedsMaxSize { pos, max } => {
                write!(f, "variable size exceeded the maximum {} at {}", max, pos)
            }
        }
    }
}

fn render_cause(f: &mut fmt::Formatter<'_>, cause: Option<&dyn fmt::Display>) -> fmt::Result {
    match cause {
        Some(c) => write!(f, " caused by {}", c),
        None => Ok(()),
    }
}

impl std::error::Error for MatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MatchError::ConstNotMatched { cause, .. }
            | MatchError::VarNotMatched { cause, .. } => cause
                .as_ref()
                .map(|c| c as &(dyn std::error::Error + 'static)),
            MatchError::IntVarNotMatched { cause, .. } => cause
                .as_ref()
                .map(|c| c as &(dyn std::error::Error + 'static)),
            MatchError::VarExceedsMaxSize { .. } => None,
        }
    }
}
