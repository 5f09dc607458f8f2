// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stack manipulation instructions generated for every registered stack.

use super::{InstrError, Instruction, InstructionSet};
use crate::types::{PushType, StackId};
use crate::value::Value;

fn index_from(n: i64, max: usize) -> usize {
    usize::try_from(n.max(0)).unwrap_or(usize::MAX).min(max)
}

/// Code groups an `exec` variant of each common instruction opens.
fn exec_blocks(verb: &str) -> u8 {
    match verb {
        "swap" => 2,
        "rot" => 3,
        "dup" | "pop" | "shove" | "shove_dup" | "dup_times" => 1,
        _ => 0,
    }
}

pub(super) fn register(set: &mut InstructionSet, s: StackId, pt: &PushType) {
    let name = pt.name();
    let exec = s == StackId::EXEC;
    let mut add = |verb: &str, instr: Instruction| {
        let instr = if exec {
            instr.with_code_blocks(exec_blocks(verb))
        } else {
            instr
        };
        set.register(instr);
    };
    let int = StackId::INT;
    let flag = StackId::BOOL;

    add(
        "pop",
        Instruction::new(format!("{name}_pop"), &[s], &[], move |st, _| {
            st.pop(s).map(drop)
        }),
    );
    add(
        "dup",
        Instruction::new(format!("{name}_dup"), &[s], &[s], move |st, _| {
            let v = st.peek(s)?.clone();
            st.push(s, v)
        }),
    );
    add(
        "dup_times",
        Instruction::new(
            format!("{name}_dup_times"),
            &[int, s],
            &[s],
            move |st, cfg| {
                let n = st.pop_int()?;
                let v = st.pop(s)?;
                for _ in 0..index_from(n, cfg.collection_size_cap) {
                    st.push(s, v.clone())?;
                }
                Ok(())
            },
        ),
    );
    add(
        "swap",
        Instruction::new(format!("{name}_swap"), &[s, s], &[s], move |st, _| {
            let a = st.pop(s)?;
            let b = st.pop(s)?;
            st.push(s, a)?;
            st.push(s, b)
        }),
    );
    add(
        "rot",
        Instruction::new(format!("{name}_rot"), &[s, s, s], &[s], move |st, _| {
            let a = st.pop(s)?;
            let b = st.pop(s)?;
            let c = st.pop(s)?;
            st.push(s, b)?;
            st.push(s, a)?;
            st.push(s, c)
        }),
    );
    add(
        "flush",
        Instruction::new(format!("{name}_flush"), &[], &[], move |st, _| st.flush(s)),
    );
    add(
        "eq",
        Instruction::new(format!("{name}_eq"), &[s, s], &[flag], move |st, _| {
            let a = st.pop(s)?;
            let b = st.pop(s)?;
            st.push(flag, Value::Bool(a == b))
        }),
    );
    add(
        "stack_depth",
        Instruction::new(format!("{name}_stack_depth"), &[], &[int], move |st, _| {
            let d = i64::try_from(st.depth(s)).map_err(|_| InstrError::Revert)?;
            st.push(int, Value::Int(d))
        }),
    );
    add(
        "yank",
        Instruction::new(format!("{name}_yank"), &[int, s], &[s], move |st, _| {
            let n = st.pop_int()?;
            let last = st.depth(s).checked_sub(1).ok_or(InstrError::Revert)?;
            let v = st.yank(s, index_from(n, last))?;
            st.push(s, v)
        }),
    );
    add(
        "yank_dup",
        Instruction::new(format!("{name}_yank_dup"), &[int, s], &[s], move |st, _| {
            let n = st.pop_int()?;
            let last = st.depth(s).checked_sub(1).ok_or(InstrError::Revert)?;
            let v = st.peek_at(s, index_from(n, last))?.clone();
            st.push(s, v)
        }),
    );
    add(
        "shove",
        Instruction::new(format!("{name}_shove"), &[int, s], &[s], move |st, _| {
            let n = st.pop_int()?;
            let v = st.pop(s)?;
            let depth = index_from(n, st.depth(s));
            st.shove(s, depth, v)
        }),
    );
    add(
        "shove_dup",
        Instruction::new(format!("{name}_shove_dup"), &[int, s], &[s], move |st, _| {
            let n = st.pop_int()?;
            let v = st.peek(s)?.clone();
            let depth = index_from(n, st.depth(s));
            st.shove(s, depth, v)
        }),
    );
    add(
        "is_empty",
        Instruction::new(format!("{name}_is_empty"), &[], &[flag], move |st, _| {
            let empty = st.depth(s) == 0;
            st.push(flag, Value::Bool(empty))
        }),
    );
    if pt.is_collection() {
        add(
            "empty",
            Instruction::new(format!("{name}_empty"), &[s], &[flag], move |st, _| {
                let v = st.pop(s)?;
                let len = v.collection_len().ok_or(InstrError::Revert)?;
                st.push(flag, Value::Bool(len == 0))
            }),
        );
    }
}
