// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! String and character instructions.
//!
//! Indices count characters, not bytes. Replacement and removal come in three families (first,
//! n-th, all) for both `str` and `char` patterns; the pattern arguments are popped after the
//! replacement, so `' ' '\n' str_replace_all_char` turns spaces into newlines.

use super::{InstrError, Instruction, InstructionSet};
use crate::state::PushState;
use crate::types::StackId;
use crate::value::{Value, reasonable_float, reasonable_int};

const STR: StackId = StackId::STR;
const CHAR: StackId = StackId::CHAR;
const INT: StackId = StackId::INT;
const FLOAT: StackId = StackId::FLOAT;
const BOOL: StackId = StackId::BOOL;

fn push_str(st: &mut PushState, s: String, cap: usize) -> Result<(), InstrError> {
    if s.chars().count() > cap {
        return Err(InstrError::Revert);
    }
    st.push(STR, Value::Str(s))
}

fn push_int(st: &mut PushState, n: usize) -> Result<(), InstrError> {
    let n = i64::try_from(n).map_err(|_| InstrError::Revert)?;
    st.push(INT, Value::Int(n))
}

fn char_index(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}

fn clamp_index(n: i64, len: usize) -> usize {
    usize::try_from(n.max(0)).unwrap_or(usize::MAX).min(len)
}

/// Wraps `n` into `0..len`; `None` if `len` is zero.
fn wrap_index(n: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok().filter(|l| *l > 0)?;
    usize::try_from(n.rem_euclid(len)).ok()
}

#[derive(Copy, Clone)]
enum Which {
    First,
    Nth,
    All,
}

impl Which {
    fn name(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Nth => "n",
            Self::All => "all",
        }
    }
}

#[derive(Copy, Clone)]
enum Pattern {
    Str,
    Char,
}

impl Pattern {
    fn name(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Char => "char",
        }
    }

    fn stack(self) -> StackId {
        match self {
            Self::Str => STR,
            Self::Char => CHAR,
        }
    }

    fn pop(self, st: &mut PushState) -> Result<String, InstrError> {
        match self {
            Self::Str => st.pop_str(),
            Self::Char => st.pop_char().map(String::from),
        }
    }
}

fn replace(s: &str, old: &str, new: &str, which: Which, n: i64) -> Result<String, InstrError> {
    if old.is_empty() {
        return Err(InstrError::Revert);
    }
    Ok(match which {
        Which::First => s.replacen(old, new, 1),
        Which::All => s.replace(old, new),
        Which::Nth => {
            let starts: Vec<usize> = s.match_indices(old).map(|(i, _)| i).collect();
            match wrap_index(n, starts.len()) {
                Some(k) => {
                    let at = starts[k];
                    format!("{}{new}{}", &s[..at], &s[at + old.len()..])
                }
                None => s.to_owned(),
            }
        }
    })
}

fn register_replace_family(set: &mut InstructionSet) {
    for pattern in [Pattern::Str, Pattern::Char] {
        let p = pattern.stack();
        for which in [Which::First, Which::Nth, Which::All] {
            let nth = matches!(which, Which::Nth);
            let extra: &[StackId] = if nth { &[INT] } else { &[] };

            let inputs: Vec<StackId> = [STR, p, p].iter().chain(extra).copied().collect();
            set.register(Instruction::new(
                format!("str_replace_{}_{}", which.name(), pattern.name()),
                &inputs,
                &[STR],
                move |st, cfg| {
                    let n = if nth { st.pop_int()? } else { 0 };
                    let new = pattern.pop(st)?;
                    let old = pattern.pop(st)?;
                    let s = st.pop_str()?;
                    push_str(st, replace(&s, &old, &new, which, n)?, cfg.collection_size_cap)
                },
            ));

            let inputs: Vec<StackId> = [STR, p].iter().chain(extra).copied().collect();
            set.register(Instruction::new(
                format!("str_remove_{}_{}", which.name(), pattern.name()),
                &inputs,
                &[STR],
                move |st, cfg| {
                    let n = if nth { st.pop_int()? } else { 0 };
                    let old = pattern.pop(st)?;
                    let s = st.pop_str()?;
                    push_str(st, replace(&s, &old, "", which, n)?, cfg.collection_size_cap)
                },
            ));
        }

        set.register(Instruction::new(
            format!("str_occurrences_of_{}", pattern.name()),
            &[STR, p],
            &[INT],
            move |st, _| {
                let pat = pattern.pop(st)?;
                let s = st.pop_str()?;
                let n = if pat.is_empty() {
                    0
                } else {
                    s.matches(pat.as_str()).count()
                };
                push_int(st, n)
            },
        ));
        set.register(Instruction::new(
            format!("str_contains_{}", pattern.name()),
            &[STR, p],
            &[BOOL],
            move |st, _| {
                let pat = pattern.pop(st)?;
                let s = st.pop_str()?;
                st.push(BOOL, Value::Bool(s.contains(pat.as_str())))
            },
        ));
        set.register(Instruction::new(
            format!("str_index_of_{}", pattern.name()),
            &[STR, p],
            &[INT],
            move |st, _| {
                let pat = pattern.pop(st)?;
                let s = st.pop_str()?;
                let at = match s.find(pat.as_str()) {
                    Some(byte) => {
                        i64::try_from(char_index(&s, byte)).map_err(|_| InstrError::Revert)?
                    }
                    None => -1,
                };
                st.push(INT, Value::Int(at))
            },
        ));
        set.register(Instruction::new(
            format!("str_split_on_{}", pattern.name()),
            &[STR, p],
            &[StackId::VECTOR_STR],
            move |st, cfg| {
                let sep = pattern.pop(st)?;
                let s = st.pop_str()?;
                if sep.is_empty() {
                    return Err(InstrError::Revert);
                }
                let parts: Vec<String> = s
                    .split(sep.as_str())
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect();
                if parts.len() > cfg.collection_size_cap {
                    return Err(InstrError::Revert);
                }
                st.push(StackId::VECTOR_STR, Value::StrVec(parts))
            },
        ));
    }

    set.register(Instruction::new(
        "str_split_on_space",
        &[STR],
        &[StackId::VECTOR_STR],
        |st, cfg| {
            let s = st.pop_str()?;
            let parts: Vec<String> = s.split_whitespace().map(String::from).collect();
            if parts.len() > cfg.collection_size_cap {
                return Err(InstrError::Revert);
            }
            st.push(StackId::VECTOR_STR, Value::StrVec(parts))
        },
    ));
}

fn str_map(set: &mut InstructionSet, name: &str, f: fn(&str) -> String) {
    set.register(Instruction::new(name, &[STR], &[STR], move |st, cfg| {
        let s = st.pop_str()?;
        push_str(st, f(&s), cfg.collection_size_cap)
    }));
}

fn str_with_int(set: &mut InstructionSet, name: &str, f: fn(&str, i64) -> String) {
    set.register(Instruction::new(name, &[STR, INT], &[STR], move |st, cfg| {
        let n = st.pop_int()?;
        let s = st.pop_str()?;
        push_str(st, f(&s, n), cfg.collection_size_cap)
    }));
}

fn char_predicate(set: &mut InstructionSet, name: &str, f: fn(char) -> bool) {
    set.register(Instruction::new(name, &[CHAR], &[BOOL], move |st, _| {
        let c = st.pop_char()?;
        st.push(BOOL, Value::Bool(f(c)))
    }));
}

fn register_access(set: &mut InstructionSet) {
    set.register(Instruction::new(
        "str_concat",
        &[STR, STR],
        &[STR],
        |st, cfg| {
            let b = st.pop_str()?;
            let a = st.pop_str()?;
            push_str(st, a + &b, cfg.collection_size_cap)
        },
    ));
    set.register(Instruction::new(
        "str_insert_str",
        &[STR, STR, INT],
        &[STR],
        |st, cfg| {
            let n = st.pop_int()?;
            let x = st.pop_str()?;
            let s = st.pop_str()?;
            let at = clamp_index(n, s.chars().count());
            let byte = s.char_indices().nth(at).map_or(s.len(), |(b, _)| b);
            push_str(
                st,
                format!("{}{x}{}", &s[..byte], &s[byte..]),
                cfg.collection_size_cap,
            )
        },
    ));
    set.register(Instruction::new(
        "str_insert_char",
        &[STR, CHAR, INT],
        &[STR],
        |st, cfg| {
            let n = st.pop_int()?;
            let c = st.pop_char()?;
            let mut chars: Vec<char> = st.pop_str()?.chars().collect();
            let at = clamp_index(n, chars.len());
            chars.insert(at, c);
            push_str(st, chars.into_iter().collect(), cfg.collection_size_cap)
        },
    ));
    set.register(Instruction::new(
        "str_first_char",
        &[STR],
        &[CHAR],
        |st, _| {
            let c = st.pop_str()?.chars().next().ok_or(InstrError::Revert)?;
            st.push(CHAR, Value::Char(c))
        },
    ));
    set.register(Instruction::new(
        "str_last_char",
        &[STR],
        &[CHAR],
        |st, _| {
            let c = st.pop_str()?.chars().next_back().ok_or(InstrError::Revert)?;
            st.push(CHAR, Value::Char(c))
        },
    ));
    set.register(Instruction::new(
        "str_nth_char",
        &[STR, INT],
        &[CHAR],
        |st, _| {
            let n = st.pop_int()?;
            let s = st.pop_str()?;
            let at = wrap_index(n, s.chars().count()).ok_or(InstrError::Revert)?;
            let c = s.chars().nth(at).ok_or(InstrError::Revert)?;
            st.push(CHAR, Value::Char(c))
        },
    ));
    set.register(Instruction::new(
        "str_length",
        &[STR],
        &[INT],
        |st, _| {
            let s = st.pop_str()?;
            push_int(st, s.chars().count())
        },
    ));

    str_map(set, "str_reverse", |s| s.chars().rev().collect());
    str_map(set, "str_rest", |s| s.chars().skip(1).collect());
    str_map(set, "str_but_last", |s| {
        let mut it = s.chars();
        it.next_back();
        it.collect()
    });
    str_map(set, "str_strip_whitespace", |s| s.trim().to_owned());
    str_with_int(set, "str_drop", |s, n| {
        s.chars().skip(clamp_index(n, usize::MAX)).collect()
    });
    str_with_int(set, "str_take", |s, n| {
        s.chars().take(clamp_index(n, usize::MAX)).collect()
    });

    char_predicate(set, "char_is_digit", |c| c.is_ascii_digit());
    char_predicate(set, "char_is_letter", char::is_alphabetic);
    char_predicate(set, "char_is_whitespace", char::is_whitespace);
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float-to-int truncation is the conversion"
)]
fn truncate(x: f64) -> i64 {
    reasonable_int(x.trunc() as i128)
}

/// ASCII character for `n` modulo 128.
fn ascii_char(n: i64) -> char {
    u8::try_from(n.rem_euclid(128)).map_or('\0', char::from)
}

fn register_conversions(set: &mut InstructionSet) {
    fn to_str<T: ToString + 'static>(
        set: &mut InstructionSet,
        name: &str,
        from: StackId,
        pop: fn(&mut PushState) -> Result<T, InstrError>,
    ) {
        set.register(Instruction::new(name, &[from], &[STR], move |st, cfg| {
            let s = pop(st)?.to_string();
            push_str(st, s, cfg.collection_size_cap)
        }));
    }
    to_str(set, "str_from_int", INT, PushState::pop_int);
    to_str(set, "str_from_bool", BOOL, PushState::pop_bool);
    to_str(set, "str_from_char", CHAR, PushState::pop_char);
    set.register(Instruction::new(
        "str_from_float",
        &[FLOAT],
        &[STR],
        |st, cfg| {
            let x = st.pop_float()?;
            push_str(st, Value::Float(x).to_string(), cfg.collection_size_cap)
        },
    ));

    set.register(Instruction::new(
        "char_from_int",
        &[INT],
        &[CHAR],
        |st, _| {
            let n = st.pop_int()?;
            st.push(CHAR, Value::Char(ascii_char(n)))
        },
    ));
    set.register(Instruction::new(
        "char_from_float",
        &[FLOAT],
        &[CHAR],
        |st, _| {
            let x = st.pop_float()?;
            st.push(CHAR, Value::Char(ascii_char(truncate(x))))
        },
    ));
    set.register(Instruction::new(
        "char_from_bool",
        &[BOOL],
        &[CHAR],
        |st, _| {
            let b = st.pop_bool()?;
            st.push(CHAR, Value::Char(if b { 'T' } else { 'F' }))
        },
    ));

    set.register(Instruction::new(
        "int_from_char",
        &[CHAR],
        &[INT],
        |st, _| {
            let c = st.pop_char()?;
            st.push(INT, Value::Int(i64::from(u32::from(c))))
        },
    ));
    set.register(Instruction::new(
        "int_from_str",
        &[STR],
        &[INT],
        |st, _| {
            let n: i128 = st
                .pop_str()?
                .trim()
                .parse()
                .map_err(|_| InstrError::Revert)?;
            st.push(INT, Value::Int(reasonable_int(n)))
        },
    ));
    set.register(Instruction::new(
        "float_from_char",
        &[CHAR],
        &[FLOAT],
        |st, _| {
            let c = st.pop_char()?;
            st.push(FLOAT, Value::Float(f64::from(u32::from(c))))
        },
    ));
    set.register(Instruction::new(
        "float_from_str",
        &[STR],
        &[FLOAT],
        |st, _| {
            let x: f64 = st
                .pop_str()?
                .trim()
                .parse()
                .map_err(|_| InstrError::Revert)?;
            let x = reasonable_float(x).ok_or(InstrError::Revert)?;
            st.push(FLOAT, Value::Float(x))
        },
    ));
}

pub(super) fn register(set: &mut InstructionSet) {
    register_access(set);
    register_replace_family(set);
    register_conversions(set);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::test_util::{apply, fresh, stack};

    fn with(values: &[Value], name: &str) -> (Result<(), InstrError>, PushState) {
        let (set, mut st) = fresh();
        for v in values {
            let id = v.core_stack().unwrap();
            st.push(id, v.clone()).unwrap();
        }
        let r = apply(&set, &mut st, name);
        (r, st)
    }

    fn top_str(st: &PushState) -> Option<Value> {
        st.top(STR).cloned()
    }

    #[test]
    fn replace_all_char_uses_old_then_new() {
        let (_, st) = with(
            &["hello world".into(), ' '.into(), '\n'.into()],
            "str_replace_all_char",
        );
        assert_eq!(top_str(&st), Some(Value::from("hello\nworld")));
    }

    #[test]
    fn replace_nth_wraps_occurrence_index() {
        let (_, st) = with(
            &["a-b-c".into(), "-".into(), "+".into(), Value::Int(3)],
            "str_replace_n_str",
        );
        assert_eq!(top_str(&st), Some(Value::from("a-b+c")));
        let (_, st) = with(&["a-b-c".into(), '-'.into(), Value::Int(0)], "str_remove_n_char");
        assert_eq!(top_str(&st), Some(Value::from("ab-c")));
    }

    #[test]
    fn remove_all_and_first() {
        let (_, st) = with(&["hello world".into(), ' '.into()], "str_remove_all_char");
        assert_eq!(top_str(&st), Some(Value::from("helloworld")));
        let (_, st) = with(&["aXbXc".into(), "X".into()], "str_remove_first_str");
        assert_eq!(top_str(&st), Some(Value::from("abXc")));
    }

    #[test]
    fn empty_pattern_reverts() {
        let (r, st) = with(&["abc".into(), "".into(), "x".into()], "str_replace_all_str");
        assert_eq!(r, Err(InstrError::Revert));
        assert_eq!(st.depth(STR), 3);
    }

    #[test]
    fn indices_count_chars() {
        let (_, st) = with(&["héllo".into(), 'l'.into()], "str_index_of_char");
        assert_eq!(st.top(INT), Some(&Value::Int(2)));
        let (_, st) = with(&["héllo".into(), 'z'.into()], "str_index_of_char");
        assert_eq!(st.top(INT), Some(&Value::Int(-1)));
        let (_, st) = with(&["héllo".into(), Value::Int(-1)], "str_nth_char");
        assert_eq!(st.top(CHAR), Some(&Value::Char('o')));
    }

    #[test]
    fn first_char_of_empty_reverts() {
        let (r, st) = with(&["".into()], "str_first_char");
        assert_eq!(r, Err(InstrError::Revert));
        assert_eq!(top_str(&st), Some(Value::from("")));
    }

    #[test]
    fn split_drops_empty_pieces() {
        let (_, st) = with(&["a  b c".into(), ' '.into()], "str_split_on_char");
        assert_eq!(
            st.top(StackId::VECTOR_STR),
            Some(&Value::StrVec(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn concat_past_cap_reverts() {
        let long = "x".repeat(600);
        let (r, st) = with(&[long.as_str().into(), long.as_str().into()], "str_concat");
        assert_eq!(r, Err(InstrError::Revert));
        assert_eq!(st.depth(STR), 2);
    }

    #[test]
    fn take_drop_and_insert() {
        let (_, st) = with(&["hello".into(), Value::Int(2)], "str_take");
        assert_eq!(top_str(&st), Some(Value::from("he")));
        let (_, st) = with(&["hello".into(), Value::Int(-4)], "str_drop");
        assert_eq!(top_str(&st), Some(Value::from("hello")));
        let (_, st) = with(
            &["hllo".into(), 'e'.into(), Value::Int(1)],
            "str_insert_char",
        );
        assert_eq!(top_str(&st), Some(Value::from("hello")));
    }

    #[test]
    fn conversions_and_predicates() {
        let (_, st) = with(&[Value::Float(2.0)], "str_from_float");
        assert_eq!(top_str(&st), Some(Value::from("2.0")));
        let (r, _) = with(&["12x".into()], "int_from_str");
        assert_eq!(r, Err(InstrError::Revert));
        let (_, st) = with(&[Value::Int(65 + 128)], "char_from_int");
        assert_eq!(st.top(CHAR), Some(&Value::Char('A')));
        let (_, st) = with(&['7'.into()], "char_is_digit");
        assert_eq!(stack(&st, BOOL), vec![Value::Bool(true)]);
    }
}
