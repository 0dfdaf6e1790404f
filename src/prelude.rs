// prelude.rs - Convenient re-exports for the common case.
//
//! # Prelude
//!
//! ```
//! use wirepat::prelude::*;
//!
//! let m = Matcher::new("status/int, ,reason/bin,\r\n").unwrap();
//! let caps = m.match_bytes(b"200 OK\r\n").unwrap();
//! assert_eq!(caps, vec![b"200".to_vec(), b"OK".to_vec()]);
//! ```

pub use crate::api::{Captures, Matcher, MatcherBuilder};
pub use crate::error::{CompileError, IntCause, MatchError};
