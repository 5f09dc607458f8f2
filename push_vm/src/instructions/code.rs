// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Code-as-data and control flow.
//!
//! `code_*` instructions treat the `code` stack as data; `exec_*` instructions manipulate pending
//! work directly. Loops are expressed by pushing a block onto `exec` that re-invokes the loop
//! instruction through an [`Atom::JitInstruction`], which is resolved at dispatch time.
//!
//! Non-block atoms are treated as one-element blocks wherever a block is expected. Every
//! instruction that builds code reverts if the result would exceed
//! [`PushConfig::max_points`](crate::config::PushConfig::max_points).

use super::{InstrError, Instruction, InstructionSet};
use crate::atom::{Atom, CodeBlock, Literal, OPEN_PAREN};
use crate::config::PushConfig;
use crate::state::PushState;
use crate::types::StackId;
use crate::value::Value;

const CODE: StackId = StackId::CODE;
const EXEC: StackId = StackId::EXEC;
const INT: StackId = StackId::INT;
const BOOL: StackId = StackId::BOOL;

fn push_checked(
    st: &mut PushState,
    id: StackId,
    atom: Atom,
    cfg: &PushConfig,
) -> Result<(), InstrError> {
    if atom.size() > cfg.max_points {
        return Err(InstrError::Revert);
    }
    st.push_code(id, atom)
}

fn push_int(st: &mut PushState, n: usize) -> Result<(), InstrError> {
    let n = i64::try_from(n).map_err(|_| InstrError::Revert)?;
    st.push(INT, Value::Int(n))
}

fn wrap_index(n: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok().filter(|l| *l > 0)?;
    usize::try_from(n.rem_euclid(len)).ok()
}

/// `|n| mod len`, for point indices.
fn abs_mod(n: i64, len: usize) -> usize {
    let n = usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX);
    if len == 0 { 0 } else { n % len }
}

/// The block `do_range` leaves on `exec` to run the next iteration.
fn range_step(next: i64, dest: i64, body: Atom, on_code: bool) -> Atom {
    if on_code {
        Atom::block([
            Atom::int(next),
            Atom::int(dest),
            Atom::jit("code_from_exec"),
            body,
            Atom::jit("code_do_range"),
        ])
    } else {
        Atom::block([
            Atom::int(next),
            Atom::int(dest),
            Atom::jit("exec_do_range"),
            body,
        ])
    }
}

fn do_range(
    st: &mut PushState,
    cfg: &PushConfig,
    body: Atom,
    current: i64,
    dest: i64,
    on_code: bool,
) -> Result<(), InstrError> {
    if current != dest {
        let next = if dest > current {
            current + 1
        } else {
            current - 1
        };
        push_checked(st, EXEC, range_step(next, dest, body.clone(), on_code), cfg)?;
    }
    st.push(INT, Value::Int(current))?;
    st.push_code(EXEC, body)
}

/// Loop setup shared by `*_do_count` and `*_do_times`.
fn counted(
    st: &mut PushState,
    cfg: &PushConfig,
    body: Atom,
    n: i64,
    on_code: bool,
    hide_counter: bool,
) -> Result<(), InstrError> {
    if n < 1 {
        return Err(InstrError::Revert);
    }
    let body = if hide_counter {
        Atom::block([Atom::jit("int_pop"), body])
    } else {
        body
    };
    let start = if on_code {
        Atom::block([
            Atom::int(0),
            Atom::int(n - 1),
            Atom::jit("code_from_exec"),
            body,
            Atom::jit("code_do_range"),
        ])
    } else {
        Atom::block([Atom::int(0), Atom::int(n - 1), Atom::jit("exec_do_range"), body])
    };
    push_checked(st, EXEC, start, cfg)
}

fn register_structure(set: &mut InstructionSet) {
    set.register(Instruction::new("noop", &[], &[], |_, _| Ok(())));
    set.register(Instruction::new(OPEN_PAREN, &[], &[], |_, _| Ok(())).with_code_blocks(1));

    for (name, id) in [
        ("code_from_int", INT),
        ("code_from_float", StackId::FLOAT),
        ("code_from_bool", BOOL),
        ("code_from_char", StackId::CHAR),
        ("code_from_str", StackId::STR),
    ] {
        set.register(Instruction::new(name, &[id], &[CODE], move |st, cfg| {
            let v = st.pop(id)?;
            push_checked(st, CODE, Atom::Literal(Literal::new(v, id)), cfg)
        }));
    }
    set.register(
        Instruction::new("code_from_exec", &[EXEC], &[CODE], |st, cfg| {
            let a = st.pop_code(EXEC)?;
            push_checked(st, CODE, a, cfg)
        })
        .with_code_blocks(1),
    );

    set.register(Instruction::new(
        "code_append",
        &[CODE, CODE],
        &[CODE],
        |st, cfg| {
            let top = st.pop_code(CODE)?.into_block();
            let second = st.pop_code(CODE)?.into_block();
            push_checked(st, CODE, Atom::Block(top.concat(&second)), cfg)
        },
    ));
    set.register(Instruction::new(
        "code_combine",
        &[CODE, CODE],
        &[CODE],
        |st, cfg| {
            let top = st.pop_code(CODE)?.into_block();
            let second = st.pop_code(CODE)?.into_block();
            push_checked(st, CODE, Atom::Block(second.concat(&top)), cfg)
        },
    ));
    set.register(Instruction::new(
        "code_cons",
        &[CODE, CODE],
        &[CODE],
        |st, cfg| {
            let top = st.pop_code(CODE)?.into_block();
            let second = st.pop_code(CODE)?;
            let consed = CodeBlock::new(vec![second]).concat(&top);
            push_checked(st, CODE, Atom::Block(consed), cfg)
        },
    ));
    set.register(Instruction::new(
        "code_list",
        &[CODE, CODE],
        &[CODE],
        |st, cfg| {
            let top = st.pop_code(CODE)?;
            let second = st.pop_code(CODE)?;
            push_checked(st, CODE, Atom::block([second, top]), cfg)
        },
    ));
    set.register(Instruction::new("code_wrap", &[CODE], &[CODE], |st, cfg| {
        let top = st.pop_code(CODE)?;
        push_checked(st, CODE, Atom::block([top]), cfg)
    }));
}

fn register_access(set: &mut InstructionSet) {
    set.register(Instruction::new("code_car", &[CODE], &[CODE], |st, _| {
        let a = match st.pop_code(CODE)? {
            Atom::Block(b) if b.is_empty() => Atom::Block(b),
            Atom::Block(b) => b.atoms()[0].clone(),
            other => other,
        };
        st.push_code(CODE, a)
    }));
    set.register(Instruction::new("code_cdr", &[CODE], &[CODE], |st, _| {
        let rest = match st.pop_code(CODE)? {
            Atom::Block(b) => b.iter().skip(1).cloned().collect(),
            _ => CodeBlock::default(),
        };
        st.push_code(CODE, Atom::Block(rest))
    }));
    set.register(Instruction::new("code_first", &[CODE], &[CODE], |st, _| {
        let first = match st.pop_code(CODE)? {
            Atom::Block(b) => b.atoms().first().cloned(),
            _ => None,
        };
        st.push_code(CODE, first.ok_or(InstrError::Revert)?)
    }));
    set.register(Instruction::new("code_rest", &[CODE], &[CODE], |st, _| {
        let rest = match st.pop_code(CODE)? {
            Atom::Block(b) if !b.is_empty() => b.iter().skip(1).cloned().collect(),
            _ => return Err(InstrError::Revert),
        };
        st.push_code(CODE, Atom::Block(rest))
    }));
    set.register(Instruction::new(
        "code_nth",
        &[CODE, INT],
        &[CODE],
        |st, _| {
            let n = st.pop_int()?;
            let block = st.pop_code(CODE)?.into_block();
            let at = wrap_index(n, block.len()).ok_or(InstrError::Revert)?;
            st.push_code(CODE, block.atoms()[at].clone())
        },
    ));
    set.register(Instruction::new(
        "code_length",
        &[CODE],
        &[INT],
        |st, _| {
            let n = match st.pop_code(CODE)? {
                Atom::Block(b) => b.len(),
                _ => 1,
            };
            push_int(st, n)
        },
    ));
    set.register(Instruction::new("code_size", &[CODE], &[INT], |st, _| {
        let a = st.pop_code(CODE)?;
        push_int(st, a.size())
    }));
    set.register(Instruction::new("code_depth", &[CODE], &[INT], |st, _| {
        let a = st.pop_code(CODE)?;
        push_int(st, a.depth())
    }));
    set.register(Instruction::new(
        "code_extract",
        &[CODE, INT],
        &[CODE],
        |st, _| {
            let n = st.pop_int()?;
            let a = st.pop_code(CODE)?;
            let point = abs_mod(n, a.size());
            let sub = match &a {
                Atom::Block(b) => b.code_at_point(point).ok_or(InstrError::Revert)?,
                _ => a,
            };
            st.push_code(CODE, sub)
        },
    ));
    set.register(Instruction::new(
        "code_insert",
        &[CODE, CODE, INT],
        &[CODE],
        |st, cfg| {
            let n = st.pop_int()?;
            let target = st.pop_code(CODE)?.into_block();
            let item = st.pop_code(CODE)?;
            let point = abs_mod(n, target.size());
            let inserted = target.with_code_inserted_at_point(item, point);
            push_checked(st, CODE, Atom::Block(inserted), cfg)
        },
    ));
    set.register(Instruction::new(
        "code_member",
        &[CODE, CODE],
        &[BOOL],
        |st, _| {
            let container = st.pop_code(CODE)?.into_block();
            let item = st.pop_code(CODE)?;
            st.push(BOOL, Value::Bool(container.atoms().contains(&item)))
        },
    ));
    set.register(Instruction::new(
        "code_first_position",
        &[CODE, CODE],
        &[INT],
        |st, _| {
            let container = st.pop_code(CODE)?.into_block();
            let item = st.pop_code(CODE)?;
            match container.iter().position(|a| *a == item) {
                Some(i) => push_int(st, i),
                None => st.push(INT, Value::Int(-1)),
            }
        },
    ));
    set.register(Instruction::new("code_reverse", &[CODE], &[CODE], |st, _| {
        let a = match st.pop_code(CODE)? {
            Atom::Block(b) => Atom::Block(b.reversed()),
            other => other,
        };
        st.push_code(CODE, a)
    }));
    set.register(Instruction::new(
        "code_is_code_block",
        &[CODE],
        &[BOOL],
        |st, _| {
            let a = st.pop_code(CODE)?;
            st.push(BOOL, Value::Bool(matches!(a, Atom::Block(_))))
        },
    ));
    set.register(Instruction::new(
        "code_is_singular",
        &[CODE],
        &[BOOL],
        |st, _| {
            let a = st.pop_code(CODE)?;
            st.push(BOOL, Value::Bool(!matches!(a, Atom::Block(_))))
        },
    ));
}

fn register_control(set: &mut InstructionSet) {
    set.register(Instruction::new("code_do", &[CODE], &[EXEC], |st, _| {
        let body = st.peek_code(CODE)?.clone();
        st.push_code(EXEC, Atom::jit("code_pop"))?;
        st.push_code(EXEC, body)
    }));
    set.register(Instruction::new("code_do_star", &[CODE], &[EXEC], |st, _| {
        let body = st.pop_code(CODE)?;
        st.push_code(EXEC, body)
    }));

    set.register(Instruction::new(
        "code_do_range",
        &[CODE, INT, INT],
        &[EXEC, INT],
        |st, cfg| {
            let body = st.pop_code(CODE)?;
            let dest = st.pop_int()?;
            let current = st.pop_int()?;
            do_range(st, cfg, body, current, dest, true)
        },
    ));
    set.register(
        Instruction::new(
            "exec_do_range",
            &[EXEC, INT, INT],
            &[EXEC, INT],
            |st, cfg| {
                let body = st.pop_code(EXEC)?;
                let dest = st.pop_int()?;
                let current = st.pop_int()?;
                do_range(st, cfg, body, current, dest, false)
            },
        )
        .with_code_blocks(1),
    );

    for (verb, hide) in [("count", false), ("times", true)] {
        set.register(Instruction::new(
            format!("code_do_{verb}"),
            &[CODE, INT],
            &[EXEC],
            move |st, cfg| {
                let n = st.pop_int()?;
                let body = st.pop_code(CODE)?;
                counted(st, cfg, body, n, true, hide)
            },
        ));
        set.register(
            Instruction::new(
                format!("exec_do_{verb}"),
                &[EXEC, INT],
                &[EXEC],
                move |st, cfg| {
                    let n = st.pop_int()?;
                    let body = st.pop_code(EXEC)?;
                    counted(st, cfg, body, n, false, hide)
                },
            )
            .with_code_blocks(1),
        );
    }

    set.register(
        Instruction::new("exec_while", &[EXEC], &[EXEC], |st, _| {
            let body = st.pop_code(EXEC)?;
            if st.depth(BOOL) == 0 || !st.pop_bool()? {
                return Ok(());
            }
            st.push_code(EXEC, body.clone())?;
            st.push_code(EXEC, Atom::jit("exec_while"))?;
            st.push_code(EXEC, body)
        })
        .with_code_blocks(1),
    );
    set.register(
        Instruction::new("exec_do_while", &[EXEC], &[EXEC], |st, _| {
            let body = st.pop_code(EXEC)?;
            st.push_code(EXEC, body.clone())?;
            st.push_code(EXEC, Atom::jit("exec_while"))?;
            st.push_code(EXEC, body)
        })
        .with_code_blocks(1),
    );

    set.register(Instruction::new(
        "code_if",
        &[CODE, CODE, BOOL],
        &[EXEC],
        |st, _| {
            let cond = st.pop_bool()?;
            let first = st.pop_code(CODE)?;
            let second = st.pop_code(CODE)?;
            st.push_code(EXEC, if cond { second } else { first })
        },
    ));
    set.register(
        Instruction::new("exec_if", &[EXEC, EXEC, BOOL], &[EXEC], |st, _| {
            let cond = st.pop_bool()?;
            let then = st.pop_code(EXEC)?;
            let otherwise = st.pop_code(EXEC)?;
            st.push_code(EXEC, if cond { then } else { otherwise })
        })
        .with_code_blocks(2),
    );
    set.register(Instruction::new(
        "code_when",
        &[CODE, BOOL],
        &[EXEC],
        |st, _| {
            let cond = st.pop_bool()?;
            let body = st.pop_code(CODE)?;
            if cond {
                st.push_code(EXEC, body)?;
            }
            Ok(())
        },
    ));
    set.register(
        Instruction::new("exec_when", &[EXEC, BOOL], &[], |st, _| {
            if !st.pop_bool()? {
                st.pop(EXEC)?;
            }
            Ok(())
        })
        .with_code_blocks(1),
    );

    set.register(
        Instruction::new("code_map", &[CODE, EXEC], &[EXEC, CODE], |st, cfg| {
            let items = st.pop_code(CODE)?.into_block();
            let body = st.pop_code(EXEC)?;
            if items.is_empty() {
                return st.push_code(CODE, Atom::Block(items));
            }
            let mut plan = Vec::with_capacity(items.len() * 4);
            for item in items.iter() {
                plan.push(Atom::jit("code_from_exec"));
                plan.push(item.clone());
                plan.push(body.clone());
            }
            plan.push(Atom::jit("code_wrap"));
            plan.extend((1..items.len()).map(|_| Atom::jit("code_cons")));
            push_checked(st, EXEC, Atom::Block(CodeBlock::new(plan)), cfg)
        })
        .with_code_blocks(1),
    );
}

pub(super) fn register(set: &mut InstructionSet) {
    register_structure(set);
    register_access(set);
    register_control(set);
}
