// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON form of programs and genomes.
//!
//! Every atom is a tagged object; a nested block is a nested array:
//!
//! ```json
//! [{"a":"lit","t":"int","v":2}, [{"a":"input","i":0}], {"a":"instr","n":"int_add"}]
//! ```
//!
//! | tag        | fields                  | atom                        |
//! |------------|-------------------------|-----------------------------|
//! | `lit`      | `t` type name, `v` value | [`Atom::Literal`]          |
//! | `input`    | `i` index               | [`Atom::Input`]             |
//! | `instr`    | `n` name                | [`Atom::Instruction`]       |
//! | `jit-instr`| `n` name                | [`Atom::JitInstruction`]    |
//! | `close`    |                         | [`Atom::Closer`] (genomes)  |
//!
//! Genes add `"silent": true` and `"close": n` only when they differ from the defaults.
//!
//! Decoding needs the type library (to resolve `t`) and the instruction set (to recover each
//! instruction's `code_blocks`). Names missing from the set still decode; running them terminates
//! with [`Termination::UnknownInstruction`](crate::interpreter::Termination::UnknownInstruction).

use core::fmt;

use serde_json::{Map, Value as Json, json};

use crate::atom::{Atom, CodeBlock, InstructionMeta, Literal};
use crate::genome::{Gene, Genome};
use crate::instructions::InstructionSet;
use crate::types::{StackId, TypeRegistry};
use crate::value::{CustomValue, Value};

/// A JSON encoding or decoding failure.
#[derive(Debug)]
pub enum CodecError {
    /// Input was not valid JSON.
    Json(serde_json::Error),
    /// An object had an unrecognized `"a"` tag.
    UnknownAtomTag(Box<str>),
    /// A required field was missing or had the wrong JSON type.
    MissingField(&'static str),
    /// A literal value did not fit its declared type.
    BadValue {
        /// Declared type name.
        type_name: Box<str>,
        /// The offending JSON.
        value: Box<str>,
    },
    /// A literal named a type missing from the library.
    UnknownType(Box<str>),
    /// A program contained a closer.
    CloserInProgram,
    /// A genome contained a nested block.
    BlockInGenome,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "invalid json: {e}"),
            Self::UnknownAtomTag(tag) => write!(f, "unknown atom tag: {tag}"),
            Self::MissingField(field) => write!(f, "missing or malformed field: {field}"),
            Self::BadValue { type_name, value } => {
                write!(f, "value {value} is not a valid {type_name}")
            }
            Self::UnknownType(name) => write!(f, "unknown type: {name}"),
            Self::CloserInProgram => write!(f, "closer atom in a program"),
            Self::BlockInGenome => write!(f, "nested block in a genome"),
        }
    }
}

impl core::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Encodes and decodes programs against one type library and instruction set.
#[derive(Copy, Clone, Debug)]
pub struct Codec<'a> {
    registry: &'a TypeRegistry,
    instructions: &'a InstructionSet,
}

impl<'a> Codec<'a> {
    /// Creates a codec.
    pub fn new(registry: &'a TypeRegistry, instructions: &'a InstructionSet) -> Self {
        Self {
            registry,
            instructions,
        }
    }

    /// Encodes a program as a JSON string.
    pub fn encode_program(&self, code: &CodeBlock) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.program_to_json(code)?)?)
    }

    /// Decodes a program from a JSON string.
    pub fn decode_program(&self, text: &str) -> Result<CodeBlock, CodecError> {
        self.program_from_json(&serde_json::from_str(text)?)
    }

    /// Encodes a genome as a JSON string.
    pub fn encode_genome(&self, genome: &Genome) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.genome_to_json(genome)?)?)
    }

    /// Decodes a genome from a JSON string.
    pub fn decode_genome(&self, text: &str) -> Result<Genome, CodecError> {
        self.genome_from_json(&serde_json::from_str(text)?)
    }

    /// Encodes a program as a JSON array.
    pub fn program_to_json(&self, code: &CodeBlock) -> Result<Json, CodecError> {
        code.iter()
            .map(|a| self.atom_to_json(a))
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array)
    }

    /// Decodes a program from a JSON array.
    pub fn program_from_json(&self, json: &Json) -> Result<CodeBlock, CodecError> {
        let items = json.as_array().ok_or(CodecError::MissingField("program"))?;
        let atoms = items
            .iter()
            .map(|item| match item {
                Json::Array(_) => self.program_from_json(item).map(Atom::Block),
                _ => match self.atom_from_json(item)? {
                    Atom::Closer => Err(CodecError::CloserInProgram),
                    atom => Ok(atom),
                },
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CodeBlock::new(atoms))
    }

    /// Encodes a genome as a JSON array.
    pub fn genome_to_json(&self, genome: &Genome) -> Result<Json, CodecError> {
        let mut out = Vec::with_capacity(genome.len());
        for gene in genome.iter() {
            let mut obj = match self.atom_to_json(&gene.atom)? {
                Json::Object(obj) => obj,
                _ => return Err(CodecError::BlockInGenome),
            };
            if gene.is_silent {
                obj.insert("silent".into(), Json::Bool(true));
            }
            if gene.closes > 0 {
                obj.insert("close".into(), json!(gene.closes));
            }
            out.push(Json::Object(obj));
        }
        Ok(Json::Array(out))
    }

    /// Decodes a genome from a JSON array.
    pub fn genome_from_json(&self, json: &Json) -> Result<Genome, CodecError> {
        let items = json.as_array().ok_or(CodecError::MissingField("genome"))?;
        items
            .iter()
            .map(|item| -> Result<Gene, CodecError> {
                let obj = item.as_object().ok_or(CodecError::BlockInGenome)?;
                let atom = self.atom_from_json(item)?;
                let silent = obj.get("silent").and_then(Json::as_bool).unwrap_or(false);
                let closes = match obj.get("close") {
                    None => 0,
                    Some(n) => n
                        .as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or(CodecError::MissingField("close"))?,
                };
                Ok(Gene::new(atom).silent(silent).with_closes(closes))
            })
            .collect()
    }

    fn atom_to_json(&self, atom: &Atom) -> Result<Json, CodecError> {
        Ok(match atom {
            Atom::Literal(lit) => {
                let name = self.registry.name_of(lit.push_type).ok_or_else(|| {
                    CodecError::UnknownType(format!("#{}", lit.push_type.index()).into())
                })?;
                json!({"a": "lit", "t": name, "v": self.value_to_json(&lit.value)?})
            }
            Atom::Input(i) => json!({"a": "input", "i": i}),
            Atom::Instruction(meta) => json!({"a": "instr", "n": &*meta.name}),
            Atom::JitInstruction(name) => json!({"a": "jit-instr", "n": &**name}),
            Atom::Closer => json!({"a": "close"}),
            Atom::Block(block) => self.program_to_json(block)?,
        })
    }

    fn atom_from_json(&self, json: &Json) -> Result<Atom, CodecError> {
        let obj = json.as_object().ok_or(CodecError::MissingField("a"))?;
        let tag = str_field(obj, "a")?;
        Ok(match tag {
            "lit" => {
                let type_name = str_field(obj, "t")?;
                let v = obj.get("v").ok_or(CodecError::MissingField("v"))?;
                Atom::Literal(self.literal_from_json(type_name, v)?)
            }
            "input" => {
                let i = obj
                    .get("i")
                    .and_then(Json::as_u64)
                    .and_then(|i| usize::try_from(i).ok())
                    .ok_or(CodecError::MissingField("i"))?;
                Atom::Input(i)
            }
            "instr" => {
                let name = str_field(obj, "n")?;
                let meta = self
                    .instructions
                    .meta(name)
                    .unwrap_or_else(|| InstructionMeta::new(name, 0));
                Atom::Instruction(meta)
            }
            "jit-instr" => Atom::JitInstruction(str_field(obj, "n")?.into()),
            "close" => Atom::Closer,
            other => return Err(CodecError::UnknownAtomTag(other.into())),
        })
    }

    fn value_to_json(&self, value: &Value) -> Result<Json, CodecError> {
        Ok(match value {
            Value::Bool(b) => json!(b),
            Value::Int(n) => json!(n),
            Value::Float(x) => json!(x),
            Value::Char(c) => json!(c.to_string()),
            Value::Str(s) => json!(s),
            Value::BoolVec(v) => json!(v),
            Value::IntVec(v) => json!(v),
            Value::FloatVec(v) => json!(v),
            Value::CharVec(v) => Json::Array(v.iter().map(|c| json!(c.to_string())).collect()),
            Value::StrVec(v) => json!(v),
            Value::Code(atom) => self.atom_to_json(atom)?,
            Value::Custom(c) => c.data.clone(),
        })
    }

    fn literal_from_json(&self, type_name: &str, v: &Json) -> Result<Literal, CodecError> {
        let id = self
            .registry
            .id_of(type_name)
            .ok_or_else(|| CodecError::UnknownType(type_name.into()))?;
        let bad = || CodecError::BadValue {
            type_name: type_name.into(),
            value: v.to_string().into(),
        };
        let pt = self.registry.get(id).ok_or_else(bad)?;

        let natural = match id {
            StackId::EXEC | StackId::CODE => Some(Value::Code(Box::new(match v {
                Json::Array(_) => Atom::Block(self.program_from_json(v)?),
                _ => self.atom_from_json(v)?,
            }))),
            StackId::VECTOR_BOOL => collect(v, Json::as_bool).map(Value::BoolVec),
            StackId::VECTOR_INT => collect(v, Json::as_i64).map(Value::IntVec),
            StackId::VECTOR_FLOAT => collect(v, Json::as_f64).map(Value::FloatVec),
            StackId::VECTOR_CHAR => collect(v, json_char).map(Value::CharVec),
            StackId::VECTOR_STR => {
                collect(v, |s| s.as_str().map(str::to_owned)).map(Value::StrVec)
            }
            id if id.index() < StackId::CORE_COUNT => scalar(v),
            _ => Some(Value::Custom(CustomValue::new(pt.name(), v.clone()))),
        };
        let value = natural.ok_or_else(bad)?;
        let value = if pt.is_instance(&value) {
            value
        } else {
            pt.coerce(&value).ok_or_else(bad)?
        };
        Ok(Literal::new(value, id))
    }
}

fn str_field<'j>(obj: &'j Map<String, Json>, field: &'static str) -> Result<&'j str, CodecError> {
    obj.get(field)
        .and_then(Json::as_str)
        .ok_or(CodecError::MissingField(field))
}

fn collect<T>(v: &Json, f: impl Fn(&Json) -> Option<T>) -> Option<Vec<T>> {
    v.as_array()?.iter().map(f).collect()
}

fn json_char(v: &Json) -> Option<char> {
    let s = v.as_str()?;
    let mut it = s.chars();
    let c = it.next()?;
    it.next().is_none().then_some(c)
}

fn scalar(v: &Json) -> Option<Value> {
    match v {
        Json::Bool(b) => Some(Value::Bool(*b)),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float)),
        Json::String(s) => Some(Value::Str(s.clone())),
        _ => None,
    }
}
