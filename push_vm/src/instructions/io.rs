// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output to the `stdout` buffer.

use super::{Instruction, InstructionSet};
use crate::types::StackId;

pub(super) fn register_print(set: &mut InstructionSet, s: StackId, name: &str) {
    let instr = Instruction::new(format!("print_{name}"), &[s], &[], move |st, cfg| {
        let v = st.pop(s)?;
        st.append_stdout(&v.to_string(), cfg.collection_size_cap)
    });
    let blocks = u8::from(s == StackId::EXEC);
    set.register(instr.with_code_blocks(blocks));
}

pub(super) fn register(set: &mut InstructionSet) {
    set.register(Instruction::new("print_newline", &[], &[], |st, cfg| {
        st.append_stdout("\n", cfg.collection_size_cap)
    }));
}
