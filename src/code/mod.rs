//! Decoding of a method's instruction bytes into symbolic instructions.

use std::{
    fmt::{self, Display, Formatter},
    iter::FusedIterator,
};

use crate::{
    fragment::constant_pool::{Constant, ConstantPool, FieldRef, InvokeDynamicRef, MethodRef},
    sized_io::ByteCursor,
    types::PrimitiveValueType,
    CrateResult,
};

mod opcode;
pub use opcode::{Opcode, OpcodeInfo, OperandKind};

/// A decoded operand with every constant pool index replaced by what it refers to.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A literal number: a pushed value, an `iinc` increment, or an `invokeinterface` count.
    Immediate(i32),
    LocalVariable(u16),
    /// The absolute offset of a branch target within the code array.
    BranchTarget(i64),
    /// A constant pushed by `ldc`, `ldc_w`, or `ldc2_w`.
    Constant(Constant),
    Class(String),
    Field(FieldRef),
    Method(MethodRef),
    InvokeDynamic(InvokeDynamicRef),
    /// The element type of a `newarray`.
    ArrayType(PrimitiveValueType),
    /// The number of dimensions created by `multianewarray`.
    Dimensions(u8),
    /// The opcode modified by `wide`.
    Widened(Opcode),
    TableSwitch {
        default: i64,
        low: i32,
        /// The target for `low`, `low + 1`, and so on.
        targets: Vec<i64>,
    },
    LookupSwitch {
        default: i64,
        /// `(key, target)` pairs in file order.
        pairs: Vec<(i32, i64)>,
    },
    /// A byte that could not be interpreted.
    Opaque(u8),
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(i) => write!(f, "{i}"),
            Self::LocalVariable(idx) => write!(f, "{idx}"),
            Self::BranchTarget(target) => write!(f, "{target}"),
            Self::Constant(c) => write!(f, "{c}"),
            Self::Class(name) => f.write_str(name),
            Self::Field(field) => write!(f, "{field}"),
            Self::Method(method) => write!(f, "{method}"),
            Self::InvokeDynamic(indy) => write!(f, "{indy}"),
            Self::ArrayType(ty) => f.write_str(ty.to_source_form()),
            Self::Dimensions(dims) => write!(f, "{dims}"),
            Self::Widened(opcode) => write!(f, "{opcode}"),
            Self::TableSwitch {
                default,
                low,
                targets,
            } => {
                f.write_str("{ ")?;
                for (key, target) in (i64::from(*low)..).zip(targets) {
                    write!(f, "{key}: {target}, ")?;
                }
                write!(f, "default: {default} }}")
            }
            Self::LookupSwitch { default, pairs } => {
                f.write_str("{ ")?;
                for (key, target) in pairs {
                    write!(f, "{key}: {target}, ")?;
                }
                write!(f, "default: {default} }}")
            }
            Self::Opaque(byte) => write!(f, "{byte:#04X}"),
        }
    }
}

/// One decoded instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pc: usize,
    raw_opcode: u8,
    /// `None` iff `raw_opcode` is not assigned.
    opcode: Option<Opcode>,
    operands: Vec<Operand>,
}

impl Instruction {
    fn opaque(pc: usize, raw_opcode: u8) -> Self {
        Self {
            pc,
            raw_opcode,
            opcode: None,
            operands: vec![Operand::Opaque(raw_opcode)],
        }
    }

    /// The offset of the opcode within the code array.
    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn raw_opcode(&self) -> u8 {
        self.raw_opcode
    }

    pub fn opcode(&self) -> Option<Opcode> {
        self.opcode
    }

    pub fn mnemonic(&self) -> &'static str {
        self.opcode.map_or("UNKNOWN", Opcode::mnemonic)
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())?;
        for (i, operand) in self.operands.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{operand}")?;
        }
        Ok(())
    }
}

/// A lazy, single-pass decode of a code array. Yields one item per instruction; after the first
/// error it yields nothing more.
#[derive(Clone, Debug)]
pub struct InstructionWalker<'a> {
    src: ByteCursor<'a>,
    pool: &'a ConstantPool,
    failed: bool,
}

impl<'a> InstructionWalker<'a> {
    /// Walk `code`, resolving operands against `pool`.
    pub fn new(code: &'a [u8], pool: &'a ConstantPool) -> Self {
        Self {
            src: ByteCursor::new(code),
            pool,
            failed: false,
        }
    }

    fn branch_target(pc: usize, offset: i32) -> i64 {
        // Code arrays are at most `u32::MAX` bytes long.
        pc as i64 + i64::from(offset)
    }

    /// Skip the 0-3 bytes that align switch operands to a multiple of four from the start of the
    /// code array.
    fn skip_switch_padding(src: &mut ByteCursor<'_>, pc: usize) -> CrateResult<()> {
        let padding = (4 - (pc + 1) % 4) % 4;
        src.read_bytes(padding)?;
        Ok(())
    }

    fn read_operands(&mut self, pc: usize, opcode: Opcode) -> CrateResult<Vec<Operand>> {
        let src = &mut self.src;
        let pool = self.pool;
        let operands = match opcode.info().operands {
            OperandKind::None => vec![],
            OperandKind::ImmediateI8 => vec![Operand::Immediate(src.read_i8()?.into())],
            OperandKind::ImmediateI16 => vec![Operand::Immediate(src.read_i16()?.into())],
            OperandKind::LocalU8 => vec![Operand::LocalVariable(src.read_u8()?.into())],
            OperandKind::ConstantU8 => {
                let idx = src.read_u8()?.into();
                vec![Operand::Constant(pool.get_loadable(idx)?.clone())]
            }
            OperandKind::ConstantU16 => {
                let idx = src.read_u16()?;
                vec![Operand::Constant(pool.get_loadable(idx)?.clone())]
            }
            OperandKind::Field => {
                let idx = src.read_u16()?;
                vec![Operand::Field(pool.get_field_ref(idx)?.clone())]
            }
            OperandKind::Method => {
                let idx = src.read_u16()?;
                vec![Operand::Method(pool.get_method_ref(idx)?.clone())]
            }
            OperandKind::InterfaceMethod => {
                let idx = src.read_u16()?;
                let count = src.read_u8()?;
                let _zero = src.read_u8()?;
                vec![
                    Operand::Method(pool.get_interface_method_ref(idx)?.clone()),
                    Operand::Immediate(count.into()),
                ]
            }
            OperandKind::InvokeDynamic => {
                let idx = src.read_u16()?;
                let _zeros = src.read_u16()?;
                vec![Operand::InvokeDynamic(pool.get_invoke_dynamic(idx)?.clone())]
            }
            OperandKind::Class => {
                let idx = src.read_u16()?;
                vec![Operand::Class(pool.get_class_name(idx)?.to_string())]
            }
            OperandKind::MultiANewArray => {
                let idx = src.read_u16()?;
                let dimensions = src.read_u8()?;
                vec![
                    Operand::Class(pool.get_class_name(idx)?.to_string()),
                    Operand::Dimensions(dimensions),
                ]
            }
            OperandKind::ArrayType => {
                let atype = src.read_u8()?;
                match PrimitiveValueType::try_from(atype) {
                    Ok(ty) => vec![Operand::ArrayType(ty)],
                    Err(_) => {
                        log::warn!("invalid newarray element type {atype} at {pc}");
                        vec![Operand::Opaque(atype)]
                    }
                }
            }
            OperandKind::Branch16 => {
                let offset = src.read_i16()?;
                vec![Operand::BranchTarget(Self::branch_target(pc, offset.into()))]
            }
            OperandKind::Branch32 => {
                let offset = src.read_i32()?;
                vec![Operand::BranchTarget(Self::branch_target(pc, offset))]
            }
            OperandKind::Iinc => {
                let idx = src.read_u8()?;
                let increment = src.read_i8()?;
                vec![
                    Operand::LocalVariable(idx.into()),
                    Operand::Immediate(increment.into()),
                ]
            }
            OperandKind::TableSwitch => {
                Self::skip_switch_padding(src, pc)?;
                let default = Self::branch_target(pc, src.read_i32()?);
                let low = src.read_i32()?;
                let high = src.read_i32()?;
                if high < low {
                    log::warn!("tableswitch at {pc} has low {low} above high {high}");
                }
                let mut targets = Vec::new();
                for _ in i64::from(low)..=i64::from(high) {
                    targets.push(Self::branch_target(pc, src.read_i32()?));
                }
                vec![Operand::TableSwitch {
                    default,
                    low,
                    targets,
                }]
            }
            OperandKind::LookupSwitch => {
                Self::skip_switch_padding(src, pc)?;
                let default = Self::branch_target(pc, src.read_i32()?);
                let npairs = src.read_i32()?;
                if npairs < 0 {
                    log::warn!("lookupswitch at {pc} has negative pair count {npairs}");
                }
                let mut pairs = Vec::new();
                for _ in 0..npairs.max(0) {
                    let key = src.read_i32()?;
                    let target = Self::branch_target(pc, src.read_i32()?);
                    pairs.push((key, target));
                }
                vec![Operand::LookupSwitch { default, pairs }]
            }
            OperandKind::Wide => {
                let modified = src.read_u8()?;
                match Opcode::try_from(modified) {
                    Ok(Opcode::Iinc) => {
                        let idx = src.read_u16()?;
                        let increment = src.read_i16()?;
                        vec![
                            Operand::Widened(Opcode::Iinc),
                            Operand::LocalVariable(idx),
                            Operand::Immediate(increment.into()),
                        ]
                    }
                    Ok(widened) if widened.is_widenable() => {
                        let idx = src.read_u16()?;
                        vec![Operand::Widened(widened), Operand::LocalVariable(idx)]
                    }
                    _ => {
                        log::warn!("wide at {pc} cannot modify opcode {modified:#04X}");
                        vec![Operand::Opaque(modified)]
                    }
                }
            }
        };
        Ok(operands)
    }

    fn decode_next(&mut self) -> CrateResult<Instruction> {
        let pc = self.src.position();
        let raw_opcode = self.src.read_u8()?;
        let opcode = match Opcode::try_from(raw_opcode) {
            Ok(opcode) => opcode,
            Err(_) => {
                log::warn!("unassigned opcode {raw_opcode:#04X} at {pc}");
                return Ok(Instruction::opaque(pc, raw_opcode));
            }
        };
        let operands = self.read_operands(pc, opcode)?;
        let instruction = Instruction {
            pc,
            raw_opcode,
            opcode: Some(opcode),
            operands,
        };
        log::trace!("{pc}: {instruction}");
        Ok(instruction)
    }
}

impl<'a> Iterator for InstructionWalker<'a> {
    type Item = CrateResult<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.src.is_empty() {
            return None;
        }
        let result = self.decode_next();
        self.failed = result.is_err();
        Some(result)
    }
}

impl<'a> FusedIterator for InstructionWalker<'a> {}
