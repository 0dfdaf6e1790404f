// exec.rs - Straight-line executor: Program x io::Read -> captures.
//
// One forward pass over the byte source, no seek, no pushback. Short reads
// are retried until each instruction has the bytes it asked for; Ok(0)
// before that point is end-of-input and surfaces as an UnexpectedEof cause
// on the failing instruction's error.

use std::io::{self, Read};

use crate::error::{IntCause, MatchError};
use crate::program::{Inst, Program, INIT_SCAN_BUF_SIZE};

/// Execute `prog` against `reader`, returning the ordered capture list.
///
/// The first failing instruction aborts the run; captures collected by
/// earlier instructions are discarded.
pub fn run<R: Read>(prog: &Program, mut reader: R) -> Result<Vec<Vec<u8>>, MatchError> {
    let mut frame = prog.new_frame();
    let mut captures = Vec::with_capacity(prog.captures_len());

    for inst in prog.insts() {
        match inst {
            Inst::Const { pos, bytes } => {
                let mut buf = vec![0u8; bytes.len()];
                fill(&mut reader, &mut buf).map_err(|e| MatchError::ConstNotMatched {
                    pos: *pos,
                    cause: Some(e),
                })?;
                if buf != *bytes {
                    return Err(MatchError::ConstNotMatched {
                        pos: *pos,
                        cause: None,
                    });
                }
            }
            Inst::Var { pos, size, capture } => {
                let n = frame.get(*size);
                if n < 0 {
                    return Err(MatchError::VarNotMatched {
                        pos: *pos,
                        cause: None,
                    });
                }
                let mut buf = vec![0u8; n as usize];
                fill(&mut reader, &mut buf).map_err(|e| MatchError::VarNotMatched {
                    pos: *pos,
                    cause: Some(e),
                })?;
                if *capture {
                    captures.push(buf);
                }
            }
            Inst::VarUntil {
                pos,
                suffix,
                capture,
            } => {
                let prefix =
                    scan_until(&mut reader, suffix, prog.max_var_size).map_err(|e| match e {
                        ScanError::Io(e) => MatchError::VarNotMatched {
                            pos: *pos,
                            cause: Some(e),
                        },
                        ScanError::Exceeded(max) => MatchError::VarExceedsMaxSize { pos: *pos, max },
                    })?;
                if *capture {
                    captures.push(prefix);
                }
            }
            Inst::Int { pos, size, out } => {
                let n = frame.get(*size);
                if n < 0 {
                    return Err(MatchError::IntVarNotMatched {
                        pos: *pos,
                        cause: None,
                    });
                }
                let mut buf = vec![0u8; n as usize];
                fill(&mut reader, &mut buf).map_err(|e| MatchError::IntVarNotMatched {
                    pos: *pos,
                    cause: Some(IntCause::Io(e)),
                })?;
                let value = parse_decimal(&buf).map_err(|c| MatchError::IntVarNotMatched {
                    pos: *pos,
                    cause: Some(c),
                })?;
                frame.set(*out, value);
                captures.push(buf);
            }
            Inst::IntUntil { pos, suffix, out } => {
                let prefix =
                    scan_until(&mut reader, suffix, prog.max_var_size).map_err(|e| match e {
                        ScanError::Io(e) => MatchError::IntVarNotMatched {
                            pos: *pos,
                            cause: Some(IntCause::Io(e)),
                        },
                        ScanError::Exceeded(max) => MatchError::VarExceedsMaxSize { pos: *pos, max },
                    })?;
                let value = parse_decimal(&prefix).map_err(|c| MatchError::IntVarNotMatched {
                    pos: *pos,
                    cause: Some(c),
                })?;
                frame.set(*out, value);
                captures.push(prefix);
            }
        }
    }

    Ok(captures)
}

/// Fill `buf` completely, retrying short reads. End of input before the
/// buffer is full is an `UnexpectedEof` error.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<()> {
    let mut nread = 0;
    while nread < buf.len() {
        match reader.read(&mut buf[nread..]) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => nread += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

enum ScanError {
    Io(io::Error),
    Exceeded(usize),
}

/// Read single bytes until `suffix` appears as the trailing window of the
/// buffer; return the prefix before the suffix.
///
/// The window candidate `midx` slides one byte per failed comparison, so
/// the scan is O(n * |suffix|) - fine for the short delimiters this DSL is
/// built for. The buffer starts at [`INIT_SCAN_BUF_SIZE`] and doubles;
/// doubling past `max` aborts the scan deterministically.
fn scan_until<R: Read>(reader: &mut R, suffix: &[u8], max: usize) -> Result<Vec<u8>, ScanError> {
    let mut cap = INIT_SCAN_BUF_SIZE;
    let mut buf = vec![0u8; cap];
    let mut idx = 0usize;
    let mut midx = 0usize;
    loop {
        fill(reader, &mut buf[idx..idx + 1]).map_err(ScanError::Io)?;
        idx += 1;
        if idx >= suffix.len() {
            if &buf[midx..midx + suffix.len()] == suffix {
                buf.truncate(midx);
                return Ok(buf);
            }
            midx += 1;
        }
        if idx == cap {
            cap *= 2;
            if cap > max {
                return Err(ScanError::Exceeded(max));
            }
            buf.resize(cap, 0);
        }
    }
}

fn parse_decimal(buf: &[u8]) -> Result<i64, IntCause> {
    let text = std::str::from_utf8(buf).map_err(IntCause::Utf8)?;
    text.parse::<i64>().map_err(IntCause::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{CellId, InstSeq, Program, DEFAULT_MAX_VAR_SIZE};

    fn program(insts: Vec<Inst>, cell_init: Vec<i64>, max_var_size: usize) -> Program {
        Program {
            insts: InstSeq::from_vec(insts),
            cell_init,
            max_var_size,
        }
    }

    fn single(inst: Inst, cell_init: Vec<i64>, max: usize) -> Program {
        program(vec![inst], cell_init, max)
    }

    // === Const ===

    #[test]
    fn const_matches_and_yields_nothing() {
        let prog = single(
            Inst::Const {
                pos: 1,
                bytes: b"foo".to_vec(),
            },
            vec![],
            DEFAULT_MAX_VAR_SIZE,
        );
        let caps = run(&prog, &b"foo"[..]).unwrap();
        assert!(caps.is_empty());
    }

    #[test]
    fn const_mismatch_has_no_cause() {
        let prog = single(
            Inst::Const {
                pos: 1,
                bytes: b"bar".to_vec(),
            },
            vec![],
            DEFAULT_MAX_VAR_SIZE,
        );
        let err = run(&prog, &b"foo"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::ConstNotMatched { pos: 1, cause: None }
        ));
    }

    #[test]
    fn const_short_input_carries_eof_cause() {
        let prog = single(
            Inst::Const {
                pos: 2,
                bytes: b"buzz".to_vec(),
            },
            vec![],
            DEFAULT_MAX_VAR_SIZE,
        );
        let err = run(&prog, &b"foo"[..]).unwrap_err();
        match err {
            MatchError::ConstNotMatched { pos: 2, cause: Some(e) } => {
                assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
            }
            other => panic!("expected ConstNotMatched with cause, got {other:?}"),
        }
    }

    // === Var (sized) ===

    #[test]
    fn sized_var_captures_exactly_n_bytes() {
        let prog = single(
            Inst::Var {
                pos: 1,
                size: CellId(0),
                capture: true,
            },
            vec![3],
            DEFAULT_MAX_VAR_SIZE,
        );
        let caps = run(&prog, &b"foobar"[..]).unwrap();
        assert_eq!(caps, vec![b"foo".to_vec()]);
    }

    #[test]
    fn sized_var_without_capture_yields_nothing() {
        let prog = single(
            Inst::Var {
                pos: 1,
                size: CellId(0),
                capture: false,
            },
            vec![3],
            DEFAULT_MAX_VAR_SIZE,
        );
        assert!(run(&prog, &b"foo"[..]).unwrap().is_empty());
    }

    #[test]
    fn sized_var_zero_reads_nothing_and_captures_empty() {
        let prog = program(
            vec![
                Inst::Var {
                    pos: 1,
                    size: CellId(0),
                    capture: true,
                },
                Inst::Const {
                    pos: 5,
                    bytes: b"rest".to_vec(),
                },
            ],
            vec![0],
            DEFAULT_MAX_VAR_SIZE,
        );
        let caps = run(&prog, &b"rest"[..]).unwrap();
        assert_eq!(caps, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn sized_var_negative_cell_is_rejected() {
        let prog = single(
            Inst::Var {
                pos: 1,
                size: CellId(0),
                capture: true,
            },
            vec![-4],
            DEFAULT_MAX_VAR_SIZE,
        );
        let err = run(&prog, &b"deadbeaf"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::VarNotMatched { pos: 1, cause: None }
        ));
    }

    #[test]
    fn sized_var_eof_carries_cause() {
        let prog = single(
            Inst::Var {
                pos: 2,
                size: CellId(0),
                capture: true,
            },
            vec![4],
            DEFAULT_MAX_VAR_SIZE,
        );
        let err = run(&prog, &b"foo"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::VarNotMatched { pos: 2, cause: Some(_) }
        ));
    }

    // === VarUntil (suffix scan) ===

    fn var_until(suffix: &[u8], capture: bool) -> Inst {
        Inst::VarUntil {
            pos: 1,
            suffix: suffix.to_vec(),
            capture,
        }
    }

    #[test]
    fn suffix_scan_captures_prefix() {
        let prog = single(var_until(b"bar", true), vec![], 1024);
        let caps = run(&prog, &b"foobar"[..]).unwrap();
        assert_eq!(caps, vec![b"foo".to_vec()]);
    }

    #[test]
    fn suffix_scan_without_capture() {
        let prog = single(var_until(b"bar", false), vec![], 1024);
        assert!(run(&prog, &b"foobar"[..]).unwrap().is_empty());
    }

    #[test]
    fn suffix_scan_grows_past_initial_capacity() {
        let prog = single(var_until(b"buzz", true), vec![], 1024);
        let caps = run(&prog, &b"foobarfoobarfoobarbuzz"[..]).unwrap();
        assert_eq!(caps, vec![b"foobarfoobarfoobar".to_vec()]);
    }

    #[test]
    fn suffix_scan_respects_max_size() {
        let prog = single(var_until(b"buzz", true), vec![], 16);
        let err = run(&prog, &b"foobarfoobarfoobarbuzz"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::VarExceedsMaxSize { pos: 1, max: 16 }
        ));
    }

    #[test]
    fn suffix_scan_missing_suffix_hits_eof() {
        let prog = single(var_until(b"buzz", true), vec![], 1024);
        let err = run(&prog, &b"foobar"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::VarNotMatched { pos: 1, cause: Some(_) }
        ));
    }

    #[test]
    fn suffix_scan_immediate_suffix_captures_empty() {
        let prog = single(var_until(b"\r\n", true), vec![], 1024);
        let caps = run(&prog, &b"\r\n"[..]).unwrap();
        assert_eq!(caps, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn suffix_overlapping_candidates_slide_one_byte() {
        // "aaab": the window must slide past the false starts.
        let prog = single(var_until(b"ab", true), vec![], 1024);
        let caps = run(&prog, &b"aaab"[..]).unwrap();
        assert_eq!(caps, vec![b"aa".to_vec()]);
    }

    // === Int (sized) ===

    #[test]
    fn sized_int_parses_and_stores() {
        let prog = program(
            vec![
                Inst::Int {
                    pos: 1,
                    size: CellId(0),
                    out: CellId(1),
                },
                Inst::Var {
                    pos: 9,
                    size: CellId(1),
                    capture: true,
                },
            ],
            vec![3, 0],
            DEFAULT_MAX_VAR_SIZE,
        );
        let caps = run(&prog, &b"003abc"[..]).unwrap();
        assert_eq!(caps, vec![b"003".to_vec(), b"abc".to_vec()]);
    }

    #[test]
    fn sized_int_parse_failure_carries_cause() {
        let prog = single(
            Inst::Int {
                pos: 1,
                size: CellId(0),
                out: CellId(1),
            },
            vec![3, 0],
            DEFAULT_MAX_VAR_SIZE,
        );
        let err = run(&prog, &b"foo"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::IntVarNotMatched {
                pos: 1,
                cause: Some(IntCause::Parse(_))
            }
        ));
    }

    #[test]
    fn sized_int_eof_carries_io_cause() {
        let prog = single(
            Inst::Int {
                pos: 2,
                size: CellId(0),
                out: CellId(1),
            },
            vec![4, 0],
            DEFAULT_MAX_VAR_SIZE,
        );
        let err = run(&prog, &b"foo"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::IntVarNotMatched {
                pos: 2,
                cause: Some(IntCause::Io(_))
            }
        ));
    }

    #[test]
    fn sized_int_zero_size_fails_to_parse_empty() {
        let prog = single(
            Inst::Int {
                pos: 1,
                size: CellId(0),
                out: CellId(1),
            },
            vec![0, 0],
            DEFAULT_MAX_VAR_SIZE,
        );
        let err = run(&prog, &b"anything"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::IntVarNotMatched {
                cause: Some(IntCause::Parse(_)),
                ..
            }
        ));
    }

    #[test]
    fn sized_int_non_utf8_carries_cause() {
        let prog = single(
            Inst::Int {
                pos: 1,
                size: CellId(0),
                out: CellId(1),
            },
            vec![2, 0],
            DEFAULT_MAX_VAR_SIZE,
        );
        let err = run(&prog, &[0xff, 0xfe, b'1'][..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::IntVarNotMatched {
                cause: Some(IntCause::Utf8(_)),
                ..
            }
        ));
    }

    #[test]
    fn negative_parsed_int_poisons_later_consumer() {
        let prog = program(
            vec![
                Inst::Int {
                    pos: 1,
                    size: CellId(0),
                    out: CellId(1),
                },
                Inst::Var {
                    pos: 9,
                    size: CellId(1),
                    capture: false,
                },
            ],
            vec![2, 0],
            DEFAULT_MAX_VAR_SIZE,
        );
        let err = run(&prog, &b"-4deadbeaf"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::VarNotMatched { pos: 9, cause: None }
        ));
    }

    // === IntUntil ===

    #[test]
    fn int_suffix_parses_prefix_and_stores() {
        let prog = program(
            vec![
                Inst::IntUntil {
                    pos: 7,
                    suffix: b"bar".to_vec(),
                    out: CellId(0),
                },
                Inst::Var {
                    pos: 11,
                    size: CellId(0),
                    capture: true,
                },
            ],
            vec![0],
            1024,
        );
        let caps = run(&prog, &b"3barxyz"[..]).unwrap();
        assert_eq!(caps, vec![b"3".to_vec(), b"xyz".to_vec()]);
    }

    #[test]
    fn int_suffix_parse_failure() {
        let prog = single(
            Inst::IntUntil {
                pos: 1,
                suffix: b"bar".to_vec(),
                out: CellId(0),
            },
            vec![0],
            1024,
        );
        let err = run(&prog, &b"foobar"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::IntVarNotMatched {
                pos: 1,
                cause: Some(IntCause::Parse(_))
            }
        ));
    }

    #[test]
    fn int_suffix_respects_max_size() {
        let prog = single(
            Inst::IntUntil {
                pos: 4,
                suffix: b"foobarbuzz".to_vec(),
                out: CellId(0),
            },
            vec![0],
            16,
        );
        let err = run(&prog, &b"1234567890foobarbuzz"[..]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::VarExceedsMaxSize { pos: 4, max: 16 }
        ));
    }

    // === fill ===

    #[test]
    fn fill_retries_short_reads() {
        struct TwoByteChunks<'a>(&'a [u8]);
        impl Read for TwoByteChunks<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let n = self.0.len().min(buf.len()).min(2);
                buf[..n].copy_from_slice(&self.0[..n]);
                self.0 = &self.0[n..];
                Ok(n)
            }
        }
        let mut buf = [0u8; 7];
        fill(&mut TwoByteChunks(b"abcdefg"), &mut buf).unwrap();
        assert_eq!(&buf, b"abcdefg");
    }
}
