// api.rs - Public facade: Matcher, MatcherBuilder.
//
// Wraps the compiler and executor with the two-call surface the crate is
// used through: compile once, match any number of byte sources.

use std::io::Read;

use crate::compile::compile;
use crate::error::{CompileError, MatchError};
use crate::exec::run;
use crate::program::{Program, DEFAULT_MAX_VAR_SIZE};

/// Ordered list of captured byte segments, one entry per capturing field.
pub type Captures = Vec<Vec<u8>>;

/// A compiled pattern.
///
/// A `Matcher` owns an immutable instruction sequence; all per-match state
/// lives in a frame allocated inside [`match_reader`](Matcher::match_reader),
/// so a single `Matcher` can be shared across threads and used for any
/// number of matches.
///
/// # Examples
///
/// ```
/// use wirepat::api::Matcher;
///
/// let m = Matcher::new("len/int,\r\n,body/bin:len").unwrap();
/// let caps = m.match_bytes(b"5\r\nhello").unwrap();
/// assert_eq!(caps, vec![b"5".to_vec(), b"hello".to_vec()]);
/// ```
///
/// A pattern made of a single non-directive field compiles to one constant
/// match with no captures:
///
/// ```
/// use wirepat::api::Matcher;
///
/// let m = Matcher::new("PING").unwrap();
/// assert!(m.match_bytes(b"PING").unwrap().is_empty());
/// assert!(m.match_bytes(b"PONG").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Matcher {
    program: Program,
}

impl Matcher {
    /// Compile a pattern using the default options
    /// (maximum variable size 4096).
    pub fn new(pattern: &str) -> Result<Matcher, CompileError> {
        Self::builder(pattern).build()
    }

    /// Create a [`MatcherBuilder`] for control over compilation options.
    pub fn builder(pattern: &str) -> MatcherBuilder {
        MatcherBuilder::new(pattern)
    }

    /// Execute the pattern against a byte source, consuming it in a single
    /// forward pass.
    ///
    /// Returns the captures of every `name/bin` and `name/int` field in
    /// pattern order, or the first error encountered. Partial reads from
    /// the source are retried; end of input mid-field is a match error
    /// with an `UnexpectedEof` cause.
    pub fn match_reader<R: Read>(&self, reader: R) -> Result<Captures, MatchError> {
        run(&self.program, reader)
    }

    /// Execute the pattern against an in-memory byte slice.
    pub fn match_bytes(&self, input: &[u8]) -> Result<Captures, MatchError> {
        self.match_reader(input)
    }

    /// Number of capturing fields in the pattern; every successful match
    /// returns exactly this many segments.
    pub fn captures_len(&self) -> usize {
        self.program.captures_len()
    }

    /// Number of compiled instructions.
    pub fn instructions_len(&self) -> usize {
        self.program.len()
    }

    /// Access the compiled program for introspection.
    pub fn as_program(&self) -> &Program {
        &self.program
    }
}

// === MatcherBuilder ===

/// Builder for compiling a [`Matcher`] with custom options.
///
/// # Examples
///
/// ```
/// use wirepat::api::Matcher;
///
/// let m = Matcher::builder("line/bin,\r\n")
///     .max_variable_size(64)
///     .build()
///     .unwrap();
/// let caps = m.match_bytes(b"hello\r\n").unwrap();
/// assert_eq!(caps[0], b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct MatcherBuilder {
    pattern: String,
    max_var_size: usize,
}

impl MatcherBuilder {
    /// Create a new builder for the given pattern.
    pub fn new(pattern: &str) -> Self {
        MatcherBuilder {
            pattern: pattern.to_string(),
            max_var_size: DEFAULT_MAX_VAR_SIZE,
        }
    }

    /// Bound the buffer used when scanning for a suffix, in bytes
    /// (default 4096). A suffix-terminated variable whose segment would
    /// outgrow this bound fails the match instead of growing further.
    pub fn max_variable_size(mut self, n: usize) -> Self {
        self.max_var_size = n;
        self
    }

    /// Compile the pattern into a [`Matcher`].
    pub fn build(self) -> Result<Matcher, CompileError> {
        let program = compile(&self.pattern, self.max_var_size)?;
        Ok(Matcher { program })
    }
}
