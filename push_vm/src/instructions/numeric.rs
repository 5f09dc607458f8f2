// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arithmetic, comparison, and conversion on `int` and `float`.
//!
//! Integer arithmetic is computed in `i128` and clamped; float results pass through
//! [`reasonable_float`] and revert on NaN. Division and modulo by zero revert. Both are floored.

use super::{InstrError, Instruction, InstructionSet};
use crate::types::StackId;
use crate::value::{Value, reasonable_float, reasonable_int};

const INT: StackId = StackId::INT;
const FLOAT: StackId = StackId::FLOAT;
const BOOL: StackId = StackId::BOOL;

fn floor_div(a: i128, b: i128) -> Option<i128> {
    if b == 0 {
        return None;
    }
    let q = a / b;
    Some(if a % b != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    })
}

fn floor_mod(a: i128, b: i128) -> Option<i128> {
    if b == 0 {
        return None;
    }
    let r = a % b;
    Some(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
}

fn int_binary(set: &mut InstructionSet, verb: &str, f: fn(i128, i128) -> Option<i128>) {
    set.register(Instruction::new(
        format!("int_{verb}"),
        &[INT, INT],
        &[INT],
        move |st, _| {
            let b = st.pop_int()?;
            let a = st.pop_int()?;
            let r = f(i128::from(a), i128::from(b)).ok_or(InstrError::Revert)?;
            st.push(INT, Value::Int(reasonable_int(r)))
        },
    ));
}

fn int_unary(set: &mut InstructionSet, verb: &str, f: fn(i128) -> i128) {
    set.register(Instruction::new(
        format!("int_{verb}"),
        &[INT],
        &[INT],
        move |st, _| {
            let a = st.pop_int()?;
            st.push(INT, Value::Int(reasonable_int(f(i128::from(a)))))
        },
    ));
}

fn float_binary(set: &mut InstructionSet, verb: &str, f: fn(f64, f64) -> Option<f64>) {
    set.register(Instruction::new(
        format!("float_{verb}"),
        &[FLOAT, FLOAT],
        &[FLOAT],
        move |st, _| {
            let b = st.pop_float()?;
            let a = st.pop_float()?;
            let r = f(a, b).and_then(reasonable_float).ok_or(InstrError::Revert)?;
            st.push(FLOAT, Value::Float(r))
        },
    ));
}

fn float_unary(set: &mut InstructionSet, verb: &str, f: fn(f64) -> f64) {
    set.register(Instruction::new(
        format!("float_{verb}"),
        &[FLOAT],
        &[FLOAT],
        move |st, _| {
            let a = st.pop_float()?;
            let r = reasonable_float(f(a)).ok_or(InstrError::Revert)?;
            st.push(FLOAT, Value::Float(r))
        },
    ));
}

fn compare<T: PartialOrd + 'static>(
    set: &mut InstructionSet,
    prefix: &str,
    stack: StackId,
    pop: fn(&mut crate::state::PushState) -> Result<T, InstrError>,
) {
    let ops: [(&str, fn(&T, &T) -> bool); 4] = [
        ("lt", |a, b| a < b),
        ("lte", |a, b| a <= b),
        ("gt", |a, b| a > b),
        ("gte", |a, b| a >= b),
    ];
    for (verb, op) in ops {
        set.register(Instruction::new(
            format!("{prefix}_{verb}"),
            &[stack, stack],
            &[BOOL],
            move |st, _| {
                let b = pop(st)?;
                let a = pop(st)?;
                st.push(BOOL, Value::Bool(op(&a, &b)))
            },
        ));
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float-to-int truncation is the conversion"
)]
fn float_to_int(x: f64) -> i64 {
    reasonable_int(x.trunc() as i128)
}

pub(super) fn register(set: &mut InstructionSet) {
    int_binary(set, "add", |a, b| Some(a + b));
    int_binary(set, "sub", |a, b| Some(a - b));
    int_binary(set, "mult", |a, b| Some(a * b));
    int_binary(set, "div", floor_div);
    int_binary(set, "mod", floor_mod);
    int_binary(set, "min", |a, b| Some(a.min(b)));
    int_binary(set, "max", |a, b| Some(a.max(b)));
    int_unary(set, "inc", |a| a + 1);
    int_unary(set, "dec", |a| a - 1);
    compare(set, "int", INT, |st| st.pop_int());

    float_binary(set, "add", |a, b| Some(a + b));
    float_binary(set, "sub", |a, b| Some(a - b));
    float_binary(set, "mult", |a, b| Some(a * b));
    float_binary(set, "div", |a, b| (b != 0.0).then(|| a / b));
    float_binary(set, "mod", |a, b| {
        (b != 0.0).then(|| a - b * (a / b).floor())
    });
    float_binary(set, "min", |a, b| Some(a.min(b)));
    float_binary(set, "max", |a, b| Some(a.max(b)));
    float_unary(set, "inc", |a| a + 1.0);
    float_unary(set, "dec", |a| a - 1.0);
    float_unary(set, "sin", f64::sin);
    float_unary(set, "cos", f64::cos);
    float_unary(set, "tan", f64::tan);
    compare(set, "float", FLOAT, |st| st.pop_float());

    set.register(Instruction::new(
        "int_from_bool",
        &[BOOL],
        &[INT],
        |st, _| {
            let b = st.pop_bool()?;
            st.push(INT, Value::Int(i64::from(b)))
        },
    ));
    set.register(Instruction::new(
        "int_from_float",
        &[FLOAT],
        &[INT],
        |st, _| {
            let x = st.pop_float()?;
            st.push(INT, Value::Int(float_to_int(x)))
        },
    ));
    set.register(Instruction::new(
        "float_from_int",
        &[INT],
        &[FLOAT],
        |st, _| {
            let n = st.pop_int()?;
            st.push(FLOAT, Value::Float(n as f64))
        },
    ));
    set.register(Instruction::new(
        "float_from_bool",
        &[BOOL],
        &[FLOAT],
        |st, _| {
            let b = st.pop_bool()?;
            st.push(FLOAT, Value::Float(f64::from(u8::from(b))))
        },
    ));
}
