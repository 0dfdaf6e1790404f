// wirepat - streaming text-pattern matcher for length-prefixed,
// delimiter-terminated wire formats.
//
// A pattern like "len/int,\r\n,body/bin:len" compiles into a linear
// instruction sequence; executing it against any io::Read validates the
// structure in a single forward pass and returns the captured segments.
//
// Module structure:
//   api.rs      -> Matcher, MatcherBuilder (public facade)
//   compile.rs  -> pattern text -> Program
//   exec.rs     -> Program x io::Read -> captures
//   program.rs  -> Inst, CellId, Program, Frame (internal representation)
//   error.rs    -> CompileError, MatchError

pub mod api;
pub mod compile;
pub mod error;
pub mod exec;
pub mod prelude;
pub mod program;
