//! Reading of Java class files.
//!
//! Decoding happens in two stages. [`RawClass::read`] performs the purely structural decode,
//! leaving every symbolic reference as a constant pool index. [`JavaClass::link`] then resolves
//! those indices into names, descriptors, and member references, producing the model the rest of
//! the crate works with. [`JavaClass::read`] runs both stages.
//!
//! ```no_run
//! # fn main() -> java_class_reader::CrateResult<()> {
//! let bytes = std::fs::read("Hello.class").expect("readable class file");
//! let class = java_class_reader::JavaClass::read(&bytes)?;
//! for line in java_class_reader::render::render_class(&class)? {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod sized_io;

pub mod code;
pub mod fragment;
pub mod parsers;
pub mod render;
pub mod types;

pub use code::{Instruction, InstructionWalker, Opcode, Operand};
pub use fragment::{
    access::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags},
    constant_pool::{
        CPEntry, CPEntryType, Constant, ConstantPool, FieldRef, MemberRef, MethodRef,
        RawConstantPool,
    },
    raw::RawClass,
    ClassFileVersion, Code, ConstantValue, ExceptionHandler, JavaAttribute, JavaClass, JavaField,
    JavaMethod,
};
pub use parsers::NomFlatError;
pub use sized_io::ByteCursor;
pub use types::{BaseType, JavaFieldType, JavaMethodType, PrimitiveValueType, ReturnType};

/// The four bytes every class file starts with.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Everything that can go wrong while decoding a class file.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClassParseError {
    /// A read needed more bytes than the input had left.
    #[error("needed {requested} bytes at offset {offset} but only {available} remain")]
    TruncatedInput {
        offset: usize,
        requested: usize,
        available: usize,
    },
    /// The input does not start with `0xCAFEBABE`.
    #[error("invalid magic number {actual:#010X}")]
    InvalidMagicNumber { actual: u32 },
    /// The constant pool could not be decoded at all.
    #[error("malformed constant pool at index {index}: {reason}")]
    MalformedConstantPool { index: u16, reason: String },
    /// A `Utf8` entry is not valid modified UTF-8.
    #[error("constant pool entry {index} is not valid modified UTF-8")]
    InvalidUtf8 { index: u16 },
    /// A constant pool index is out of range or names an entry of the wrong kind. `actual` is
    /// `None` when the index is out of range.
    #[error("constant pool index {index} should be {expected} but {}", describe_actual(.actual))]
    DanglingReference {
        index: u16,
        expected: &'static str,
        actual: Option<CPEntryType>,
    },
    /// A field or method descriptor could not be translated.
    #[error("invalid descriptor {descriptor:?}")]
    InvalidDescriptor {
        descriptor: String,
        #[source]
        source: NomFlatError,
    },
}

impl ClassParseError {
    pub(crate) fn dangling(
        index: u16,
        expected: &'static str,
        actual: Option<CPEntryType>,
    ) -> Self {
        Self::DanglingReference {
            index,
            expected,
            actual,
        }
    }
}

fn describe_actual(actual: &Option<CPEntryType>) -> String {
    match actual {
        Some(CPEntryType::After8Byte) => "is the unusable slot after a Long or Double".to_string(),
        Some(ty) => format!("is a {ty} entry"),
        None => "is out of range".to_string(),
    }
}

pub type CrateResult<T> = Result<T, ClassParseError>;
