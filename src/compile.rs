// compile.rs - Pattern compiler: DSL text -> Program.
//
// A pattern is split on ',' into fields. Directive fields emit one
// instruction each and allocate the cells it reads or writes. A directive
// without ':SIZE' leaves the parser in a pending state; the next field,
// whatever it looks like, is consumed as that directive's literal suffix.
// Everything else is a byte-exact constant.

use std::collections::HashMap;

use crate::error::CompileError;
use crate::program::{CellId, Inst, InstSeq, Program};

/// Carry-over between fields: the kind of suffix-terminated directive
/// still waiting for its suffix. Integer directives also carry the
/// variable name to bind once the suffix (and so the out-cell) exists.
enum Pending<'p> {
    None,
    Blind,
    Binary,
    Integer(&'p str),
}

/// Compile `pattern` into an executable [`Program`].
///
/// `max_var_size` bounds the growing buffer used by suffix-terminated
/// variables at match time.
pub fn compile(pattern: &str, max_var_size: usize) -> Result<Program, CompileError> {
    let mut insts = InstSeq::new();
    let mut cells: Vec<i64> = Vec::new();
    let mut binds: HashMap<&str, CellId> = HashMap::new();
    let mut pending = Pending::None;
    let mut pos = 1usize;

    let fields: Vec<&str> = pattern.split(',').collect();
    let last = fields.len() - 1;
    for (i, &field) in fields.iter().enumerate() {
        match std::mem::replace(&mut pending, Pending::None) {
            Pending::None => {
                parse_field(field, pos, &mut insts, &mut cells, &mut binds, &mut pending)?
            }
            kind => {
                // This field is the pending directive's suffix literal,
                // even if it looks like a directive itself.
                if field.is_empty() {
                    return Err(CompileError::SuffixExpected { pos });
                }
                let suffix = field.as_bytes().to_vec();
                match kind {
                    Pending::Blind => insts.push(Inst::VarUntil {
                        pos,
                        suffix,
                        capture: false,
                    }),
                    Pending::Binary => insts.push(Inst::VarUntil {
                        pos,
                        suffix,
                        capture: true,
                    }),
                    Pending::Integer(name) => {
                        let out = push_cell(&mut cells, 0);
                        binds.insert(name, out);
                        insts.push(Inst::IntUntil { pos, suffix, out });
                    }
                    Pending::None => unreachable!(),
                }
            }
        }
        if i < last {
            pos += field.len() + 1;
        }
    }

    // A dangling directive has no suffix to terminate it.
    if !matches!(pending, Pending::None) {
        return Err(CompileError::SuffixExpected { pos });
    }

    Ok(Program {
        insts,
        cell_init: cells,
        max_var_size,
    })
}

fn parse_field<'p>(
    field: &'p str,
    pos: usize,
    insts: &mut InstSeq,
    cells: &mut Vec<i64>,
    binds: &mut HashMap<&'p str, CellId>,
    pending: &mut Pending<'p>,
) -> Result<(), CompileError> {
    if field.starts_with('_') {
        // Blind directive: consume without capturing.
        if field.len() == 1 {
            *pending = Pending::Blind;
            return Ok(());
        }
        let tokens: Vec<&str> = field.split(':').collect();
        if tokens.len() != 2 {
            return Err(CompileError::ColonExpected { pos });
        }
        let size = resolve_size(tokens[1], cells, binds, pos)?;
        insts.push(Inst::Var {
            pos,
            size,
            capture: false,
        });
        return Ok(());
    }

    if field.contains('/') {
        // Binding directive: name/bin or name/int.
        let tokens: Vec<&str> = field.split('/').collect();
        if tokens.len() != 2 {
            return Err(CompileError::InvalidSlash { pos });
        }
        let (name, kind) = (tokens[0], tokens[1]);
        let sub: Vec<&str> = kind.split(':').collect();
        match sub[0] {
            "bin" => match sub.len() {
                1 => *pending = Pending::Binary,
                2 => {
                    let size = resolve_size(sub[1], cells, binds, pos)?;
                    insts.push(Inst::Var {
                        pos,
                        size,
                        capture: true,
                    });
                }
                _ => return Err(CompileError::ColonExpected { pos }),
            },
            "int" => match sub.len() {
                1 => *pending = Pending::Integer(name),
                2 => {
                    // Size resolves against earlier bindings only; the
                    // out-cell is appended after, so "N/int:N" with a fresh
                    // N is rejected, not self-referential.
                    let size = resolve_size(sub[1], cells, binds, pos)?;
                    let out = push_cell(cells, 0);
                    binds.insert(name, out);
                    insts.push(Inst::Int { pos, size, out });
                }
                _ => return Err(CompileError::ColonExpected { pos }),
            },
            _ => return Err(CompileError::InvalidType { pos }),
        }
        return Ok(());
    }

    // Pure constant.
    insts.push(Inst::Const {
        pos,
        bytes: field.as_bytes().to_vec(),
    });
    Ok(())
}

/// Resolve a `SIZE_REF` token: a decimal literal materializes a fresh
/// initialized cell; anything else is a reference to a bound integer
/// variable's producer cell.
fn resolve_size(
    token: &str,
    cells: &mut Vec<i64>,
    binds: &HashMap<&str, CellId>,
    pos: usize,
) -> Result<CellId, CompileError> {
    match token.parse::<i64>() {
        Ok(n) => Ok(push_cell(cells, n)),
        Err(_) => binds
            .get(token)
            .copied()
            .ok_or_else(|| CompileError::VariableNotDefined {
                name: token.to_string(),
                pos,
            }),
    }
}

fn push_cell(cells: &mut Vec<i64>, value: i64) -> CellId {
    cells.push(value);
    CellId(cells.len() - 1)
}
