// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vector instructions, generated once per element type.
//!
//! Every instruction here is generic over [`Element`], which ties an element stack (`int`) to its
//! vector stack (`vector_int`). Instructions that read both an index and an element of the same
//! stack (e.g. `vector_int_set_nth`) pop the index first.

use std::sync::Arc;

use super::{InstrError, Instruction, InstructionSet};
use crate::atom::{Atom, Literal};
use crate::state::PushState;
use crate::types::StackId;
use crate::value::{Element, Value};

const INT: StackId = StackId::INT;
const BOOL: StackId = StackId::BOOL;
const EXEC: StackId = StackId::EXEC;

fn clamp_index(n: i64, len: usize) -> usize {
    usize::try_from(n.max(0)).unwrap_or(usize::MAX).min(len)
}

fn wrap_index(n: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok().filter(|l| *l > 0)?;
    usize::try_from(n.rem_euclid(len)).ok()
}

fn push_capped<T: Element>(st: &mut PushState, v: Vec<T>, cap: usize) -> Result<(), InstrError> {
    if v.len() > cap {
        return Err(InstrError::Revert);
    }
    st.push_vec(v)
}

fn push_count(st: &mut PushState, n: usize) -> Result<(), InstrError> {
    let n = i64::try_from(n).map_err(|_| InstrError::Revert)?;
    st.push(INT, Value::Int(n))
}

/// Vector-to-vector instruction taking no other arguments.
fn map_vec<T: Element>(set: &mut InstructionSet, verb: &str, f: fn(Vec<T>) -> Vec<T>) {
    set.register(Instruction::new(
        format!("{}_{verb}", T::VECTOR_NAME),
        &[T::VECTOR],
        &[T::VECTOR],
        move |st, _| {
            let v = st.pop_vec::<T>()?;
            st.push_vec(f(v))
        },
    ));
}

fn register_for<T: Element>(set: &mut InstructionSet) {
    let v_id = T::VECTOR;
    let t_id = T::STACK;
    let name = |verb: &str| format!("{}_{verb}", T::VECTOR_NAME);

    set.register(Instruction::new(
        name("concat"),
        &[v_id, v_id],
        &[v_id],
        |st, cfg| {
            let b = st.pop_vec::<T>()?;
            let mut a = st.pop_vec::<T>()?;
            a.extend(b);
            push_capped(st, a, cfg.collection_size_cap)
        },
    ));
    set.register(Instruction::new(
        name("conj"),
        &[v_id, t_id],
        &[v_id],
        |st, cfg| {
            let x = st.pop_elem::<T>()?;
            let mut v = st.pop_vec::<T>()?;
            v.push(x);
            push_capped(st, v, cfg.collection_size_cap)
        },
    ));
    set.register(Instruction::new(
        name("take"),
        &[v_id, INT],
        &[v_id],
        |st, _| {
            let n = st.pop_int()?;
            let mut v = st.pop_vec::<T>()?;
            v.truncate(clamp_index(n, v.len()));
            st.push_vec(v)
        },
    ));
    set.register(Instruction::new(
        name("subvec"),
        &[v_id, INT, INT],
        &[v_id],
        |st, _| {
            let end = st.pop_int()?;
            let start = st.pop_int()?;
            let v = st.pop_vec::<T>()?;
            let (mut a, mut b) = (clamp_index(start, v.len()), clamp_index(end, v.len()));
            if a > b {
                core::mem::swap(&mut a, &mut b);
            }
            st.push_vec(v[a..b].to_vec())
        },
    ));
    set.register(Instruction::new(
        name("first"),
        &[v_id],
        &[t_id],
        |st, _| {
            let v = st.pop_vec::<T>()?;
            let x = v.into_iter().next().ok_or(InstrError::Revert)?;
            st.push_elem(x)
        },
    ));
    set.register(Instruction::new(
        name("last"),
        &[v_id],
        &[t_id],
        |st, _| {
            let mut v = st.pop_vec::<T>()?;
            let x = v.pop().ok_or(InstrError::Revert)?;
            st.push_elem(x)
        },
    ));
    set.register(Instruction::new(
        name("nth"),
        &[v_id, INT],
        &[t_id],
        |st, _| {
            let n = st.pop_int()?;
            let mut v = st.pop_vec::<T>()?;
            let at = wrap_index(n, v.len()).ok_or(InstrError::Revert)?;
            st.push_elem(v.swap_remove(at))
        },
    ));
    map_vec::<T>(set, "rest", |mut v| {
        if !v.is_empty() {
            v.remove(0);
        }
        v
    });
    map_vec::<T>(set, "but_last", |mut v| {
        v.pop();
        v
    });
    map_vec::<T>(set, "reverse", |mut v| {
        v.reverse();
        v
    });
    set.register(Instruction::new(
        name("length"),
        &[v_id],
        &[INT],
        |st, _| {
            let v = st.pop_vec::<T>()?;
            push_count(st, v.len())
        },
    ));
    set.register(Instruction::new(
        name("push_all"),
        &[v_id],
        &[t_id],
        |st, _| {
            let v = st.pop_vec::<T>()?;
            for x in v.into_iter().rev() {
                st.push_elem(x)?;
            }
            Ok(())
        },
    ));
    set.register(Instruction::new(
        name("empty_vector"),
        &[],
        &[v_id],
        |st, _| st.push_vec(Vec::<T>::new()),
    ));
    set.register(Instruction::new(
        name("contains"),
        &[v_id, t_id],
        &[BOOL],
        |st, _| {
            let x = st.pop_elem::<T>()?;
            let v = st.pop_vec::<T>()?;
            st.push(BOOL, Value::Bool(v.contains(&x)))
        },
    ));
    set.register(Instruction::new(
        name("index_of"),
        &[v_id, t_id],
        &[INT],
        |st, _| {
            let x = st.pop_elem::<T>()?;
            let v = st.pop_vec::<T>()?;
            match v.iter().position(|y| *y == x) {
                Some(i) => push_count(st, i),
                None => st.push(INT, Value::Int(-1)),
            }
        },
    ));
    set.register(Instruction::new(
        name("occurrences_of"),
        &[v_id, t_id],
        &[INT],
        |st, _| {
            let x = st.pop_elem::<T>()?;
            let v = st.pop_vec::<T>()?;
            push_count(st, v.iter().filter(|y| **y == x).count())
        },
    ));
    set.register(Instruction::new(
        name("set_nth"),
        &[v_id, t_id, INT],
        &[v_id],
        |st, _| {
            let n = st.pop_int()?;
            let x = st.pop_elem::<T>()?;
            let mut v = st.pop_vec::<T>()?;
            let at = wrap_index(n, v.len()).ok_or(InstrError::Revert)?;
            v[at] = x;
            st.push_vec(v)
        },
    ));
    set.register(Instruction::new(
        name("replace"),
        &[v_id, t_id, t_id],
        &[v_id],
        |st, _| {
            let new = st.pop_elem::<T>()?;
            let old = st.pop_elem::<T>()?;
            let v: Vec<T> = st
                .pop_vec::<T>()?
                .into_iter()
                .map(|y| if y == old { new.clone() } else { y })
                .collect();
            st.push_vec(v)
        },
    ));
    set.register(Instruction::new(
        name("replace_first"),
        &[v_id, t_id, t_id],
        &[v_id],
        |st, _| {
            let new = st.pop_elem::<T>()?;
            let old = st.pop_elem::<T>()?;
            let mut v = st.pop_vec::<T>()?;
            if let Some(i) = v.iter().position(|y| *y == old) {
                v[i] = new;
            }
            st.push_vec(v)
        },
    ));
    set.register(Instruction::new(
        name("remove"),
        &[v_id, t_id],
        &[v_id],
        |st, _| {
            let x = st.pop_elem::<T>()?;
            let mut v = st.pop_vec::<T>()?;
            v.retain(|y| *y != x);
            st.push_vec(v)
        },
    ));

    let iterate: Arc<str> = name("iterate").into();
    let again = iterate.clone();
    set.register(
        Instruction::new(iterate, &[v_id, EXEC], &[t_id, EXEC], move |st, _| {
            let v = st.pop_vec::<T>()?;
            let body = st.pop_code(EXEC)?;
            let mut items = v.into_iter();
            let Some(head) = items.next() else {
                return Ok(());
            };
            let rest: Vec<T> = items.collect();
            if !rest.is_empty() {
                let recur = Atom::block([
                    Atom::Literal(Literal::new(T::vec_into_value(rest), T::VECTOR)),
                    Atom::JitInstruction(again.clone()),
                    body.clone(),
                ]);
                st.push_code(EXEC, recur)?;
            }
            st.push_code(EXEC, body)?;
            st.push_elem(head)
        })
        .with_code_blocks(1),
    );
}

pub(super) fn register(set: &mut InstructionSet) {
    register_for::<bool>(set);
    register_for::<i64>(set);
    register_for::<f64>(set);
    register_for::<char>(set);
    register_for::<String>(set);
}
