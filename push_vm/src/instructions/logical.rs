// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Boolean logic.

use super::{Instruction, InstructionSet};
use crate::types::StackId;
use crate::value::Value;

const BOOL: StackId = StackId::BOOL;

fn binary(set: &mut InstructionSet, verb: &str, f: fn(bool, bool) -> bool) {
    set.register(Instruction::new(
        format!("bool_{verb}"),
        &[BOOL, BOOL],
        &[BOOL],
        move |st, _| {
            let b = st.pop_bool()?;
            let a = st.pop_bool()?;
            st.push(BOOL, Value::Bool(f(a, b)))
        },
    ));
}

pub(super) fn register(set: &mut InstructionSet) {
    binary(set, "and", |a, b| a && b);
    binary(set, "or", |a, b| a || b);
    binary(set, "xor", |a, b| a != b);
    binary(set, "invert_first_then_and", |a, b| !a && b);
    binary(set, "invert_second_then_and", |a, b| a && !b);

    set.register(Instruction::new("bool_not", &[BOOL], &[BOOL], |st, _| {
        let a = st.pop_bool()?;
        st.push(BOOL, Value::Bool(!a))
    }));
    set.register(Instruction::new(
        "bool_from_int",
        &[StackId::INT],
        &[BOOL],
        |st, _| {
            let n = st.pop_int()?;
            st.push(BOOL, Value::Bool(n != 0))
        },
    ));
    set.register(Instruction::new(
        "bool_from_float",
        &[StackId::FLOAT],
        &[BOOL],
        |st, _| {
            let x = st.pop_float()?;
            st.push(BOOL, Value::Bool(x != 0.0))
        },
    ));
}
