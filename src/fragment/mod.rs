use std::fmt::{self, Display, Formatter};

use crate::{
    code::{Instruction, InstructionWalker},
    sized_io::ByteCursor,
    types::{JavaFieldType, JavaMethodType},
    ClassParseError, CrateResult,
};

pub mod access;
use access::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};

pub mod constant_pool;
pub use constant_pool::ConstantPool;
use constant_pool::Constant;

pub mod raw;
use raw::{RawAttribute, RawClass, RawCode, RawExceptionHandler, RawField, RawMethod};

/// A version number.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ClassFileVersion(u16, u16);

impl ClassFileVersion {
    /// Create a new version number.
    pub const fn new(major_version: u16, minor_version: u16) -> ClassFileVersion {
        ClassFileVersion(major_version, minor_version)
    }

    /// Get the major version number.
    pub const fn major_version(&self) -> u16 {
        self.0
    }

    /// Get the minor version number.
    pub const fn minor_version(&self) -> u16 {
        self.1
    }

    /// The Java platform release that introduced this major version, e.g. `8` for major version
    /// `52`. Versions before Java 5 report the `1.x` minor component.
    pub const fn java_release(&self) -> u16 {
        self.0.saturating_sub(44)
    }
}

impl Display for ClassFileVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// An exception handler for some function body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExceptionHandler {
    /// The program counter relative to the beginning of the associated "Code" attribute's code
    /// array at which this exception handler becomes active.
    start_pc: u16,
    /// The program counter relative to the beginning of the associated "Code" attribute's code
    /// array at which this exception handler becomes inactive.
    end_pc: u16,
    /// The program counter relative to the beginning of the associated "Code" attribute's code
    /// array to jump to if this exception handler is triggered.
    handler_pc: u16,
    catch_type_idx: u16,
    /// The type of exception that this exception handler can handle. If `catch_type` is `None`,
    /// this exception handler can handle *all* types of exception.
    catch_type: Option<String>,
}

impl ExceptionHandler {
    fn link(raw: &RawExceptionHandler, pool: &ConstantPool) -> CrateResult<ExceptionHandler> {
        let catch_type = match raw.catch_type_idx {
            0 => None,
            idx => Some(pool.get_class_name(idx)?.to_string()),
        };
        Ok(ExceptionHandler {
            start_pc: raw.start_pc,
            end_pc: raw.end_pc,
            handler_pc: raw.handler_pc,
            catch_type_idx: raw.catch_type_idx,
            catch_type,
        })
    }

    pub fn start_pc(&self) -> u16 {
        self.start_pc
    }

    pub fn end_pc(&self) -> u16 {
        self.end_pc
    }

    pub fn handler_pc(&self) -> u16 {
        self.handler_pc
    }

    /// The constant pool index of the caught class, `0` for a catch-all handler.
    pub fn catch_type_idx(&self) -> u16 {
        self.catch_type_idx
    }

    pub fn catch_type(&self) -> Option<&str> {
        self.catch_type.as_deref()
    }
}

/// A method body.
#[derive(Clone, Debug, PartialEq)]
pub struct Code {
    /// The maximum number of (4-byte) values on the argument stack of this function at any one
    /// time.
    max_stack: u16,
    /// The maximum number of local variables in use by this function at any one time.
    max_locals: u16,
    code: Vec<u8>,
    exception_handlers: Vec<ExceptionHandler>,
    /// Always `JavaAttribute::GenericAttribute`.
    attributes: Vec<JavaAttribute>,
}

impl Code {
    fn link(raw: RawCode, pool: &ConstantPool) -> CrateResult<Code> {
        let exception_handlers = raw
            .exception_handlers
            .iter()
            .map(|handler| ExceptionHandler::link(handler, pool))
            .collect::<CrateResult<_>>()?;
        let attributes = raw
            .attributes
            .into_iter()
            .map(|attribute| JavaAttribute::opaque(attribute, pool))
            .collect::<CrateResult<_>>()?;
        Ok(Code {
            max_stack: raw.max_stack,
            max_locals: raw.max_locals,
            code: raw.code,
            exception_handlers,
            attributes,
        })
    }

    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    /// The undecoded instruction bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.code
    }

    pub fn exception_handlers(&self) -> &[ExceptionHandler] {
        &self.exception_handlers
    }

    pub fn attributes(&self) -> &[JavaAttribute] {
        &self.attributes
    }

    /// Lazily decode the instructions of this body, resolving operands against `pool`.
    pub fn walk<'a>(&'a self, pool: &'a ConstantPool) -> InstructionWalker<'a> {
        InstructionWalker::new(&self.code, pool)
    }

    /// Decode every instruction of this body, failing if any instruction is cut short or refers
    /// to an unusable constant.
    pub fn instructions(&self, pool: &ConstantPool) -> CrateResult<Vec<Instruction>> {
        self.walk(pool).collect()
    }
}

/// The value of a `ConstantValue` attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstantValue {
    /// An `int`, `short`, `char`, `byte`, or `boolean` value.
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
}

impl ConstantValue {
    /// Format the value as a Java literal of type `ty`.
    pub fn to_literal(&self, ty: &JavaFieldType) -> String {
        use crate::types::PrimitiveValueType as P;

        match self {
            Self::Int(0) if ty.is_primitive(P::Bool) => "false".to_string(),
            Self::Int(1) if ty.is_primitive(P::Bool) => "true".to_string(),
            Self::Int(c) if ty.is_primitive(P::Char) => match char::from_u32(*c as u32) {
                Some(c) => format!("{c:?}"),
                None => c.to_string(),
            },
            Self::Int(i) => i.to_string(),
            Self::Float(x) => format!("{x:?}f"),
            Self::Long(l) => format!("{l}L"),
            Self::Double(d) => format!("{d:?}"),
            Self::String(s) => format!("{s:?}"),
        }
    }
}

/// An attribute of some object in a Java class file.
#[derive(Clone, Debug, PartialEq)]
pub enum JavaAttribute {
    /// The initial value of a static field.
    ConstantValue(ConstantValue),
    /// A method body.
    Code(Code),
    /// The filename of the file that this class was compiled from.
    SourceFile(String),
    /// An attribute that does not fall into any of the other categories.
    GenericAttribute {
        /// The name of the attribute.
        name: String,
        /// The value of the attribute.
        info: Vec<u8>,
    },
}

/// What kind of item an attribute is attached to. Each kind understands its own set of
/// attributes; everything else is kept opaque.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AttributeOwner {
    Class,
    Field,
    Method,
}

impl JavaAttribute {
    /// The name of the ConstantValue attribute.
    const CONSTANT_VALUE_NAME: &'static str = "ConstantValue";
    /// The name of the Code attribute.
    const CODE_NAME: &'static str = "Code";
    /// The name of the SourceFile attribute.
    const SOURCE_FILE_NAME: &'static str = "SourceFile";

    /// Get the name of the attribute as it appears in the class file.
    pub fn name(&self) -> &str {
        match self {
            Self::ConstantValue(_) => Self::CONSTANT_VALUE_NAME,
            Self::Code(_) => Self::CODE_NAME,
            Self::SourceFile(_) => Self::SOURCE_FILE_NAME,
            Self::GenericAttribute { name, .. } => name,
        }
    }

    fn opaque(raw: RawAttribute, pool: &ConstantPool) -> CrateResult<JavaAttribute> {
        Ok(Self::GenericAttribute {
            name: pool.get_utf8(raw.name_idx)?.to_string(),
            info: raw.info,
        })
    }

    fn link(
        raw: RawAttribute,
        pool: &ConstantPool,
        owner: AttributeOwner,
    ) -> CrateResult<JavaAttribute> {
        let name = pool.get_utf8(raw.name_idx)?;
        match (owner, name) {
            (AttributeOwner::Field, Self::CONSTANT_VALUE_NAME) => {
                // Structure:
                // {
                //     constantvalue_idx: u16,
                // }
                let mut src = ByteCursor::new(&raw.info);
                let value_idx = src.read_u16()?;
                warn_trailing(name, &src);
                let value = match pool.get(value_idx)? {
                    Constant::Integer(i) => ConstantValue::Int(*i),
                    Constant::Float(x) => ConstantValue::Float(*x),
                    Constant::Long(l) => ConstantValue::Long(*l),
                    Constant::Double(d) => ConstantValue::Double(*d),
                    Constant::String(s) => ConstantValue::String(s.clone()),
                    other => {
                        return Err(ClassParseError::dangling(
                            value_idx,
                            "a numeric or String constant",
                            Some(other.r#type()),
                        ))
                    }
                };
                Ok(Self::ConstantValue(value))
            }
            (AttributeOwner::Method, Self::CODE_NAME) => {
                Code::link(RawCode::read(&raw.info)?, pool).map(Self::Code)
            }
            (AttributeOwner::Class, Self::SOURCE_FILE_NAME) => {
                // Structure:
                // {
                //     sourcefile_idx: u16,
                // }
                let mut src = ByteCursor::new(&raw.info);
                let source_file_idx = src.read_u16()?;
                warn_trailing(name, &src);
                Ok(Self::SourceFile(pool.get_utf8(source_file_idx)?.to_string()))
            }
            _ => Self::opaque(raw, pool),
        }
    }
}

fn warn_trailing(attribute: &str, src: &ByteCursor<'_>) {
    if !src.is_empty() {
        log::warn!(
            "ignoring {} trailing bytes in {attribute} attribute",
            src.remaining()
        );
    }
}

fn link_attributes(
    raw: Vec<RawAttribute>,
    pool: &ConstantPool,
    owner: AttributeOwner,
) -> CrateResult<Vec<JavaAttribute>> {
    raw.into_iter()
        .map(|attribute| JavaAttribute::link(attribute, pool, owner))
        .collect()
}

/// A fully-owned Java field object.
#[derive(Clone, Debug, PartialEq)]
pub struct JavaField {
    access_flags: FieldAccessFlags,
    name: String,
    descriptor: JavaFieldType,
    attributes: Vec<JavaAttribute>,
}

impl JavaField {
    fn link(raw: RawField, pool: &ConstantPool) -> CrateResult<JavaField> {
        let name = pool.get_utf8(raw.name_idx)?.to_string();
        let descriptor = JavaFieldType::parse_descriptor(pool.get_utf8(raw.descriptor_idx)?)?;
        let attributes = link_attributes(raw.attributes, pool, AttributeOwner::Field)?;
        Ok(JavaField {
            access_flags: FieldAccessFlags::from_bits_truncate(raw.access_flags),
            name,
            descriptor,
            attributes,
        })
    }

    pub fn access_flags(&self) -> FieldAccessFlags {
        self.access_flags
    }

    /// Get the name of the field.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Get the type of the field.
    pub fn descriptor(&self) -> &JavaFieldType {
        &self.descriptor
    }

    /// Get the attributes of the field.
    pub fn attributes(&self) -> &[JavaAttribute] {
        &self.attributes[..]
    }

    /// Get the initial value of the field, if it has one.
    pub fn constant_value(&self) -> Option<&ConstantValue> {
        self.attributes.iter().find_map(|attribute| match attribute {
            JavaAttribute::ConstantValue(value) => Some(value),
            _ => None,
        })
    }
}

/// A fully-owned Java method object.
#[derive(Clone, Debug, PartialEq)]
pub struct JavaMethod {
    access_flags: MethodAccessFlags,
    name: String,
    descriptor: JavaMethodType,
    attributes: Vec<JavaAttribute>,
}

impl JavaMethod {
    fn link(raw: RawMethod, pool: &ConstantPool) -> CrateResult<JavaMethod> {
        let name = pool.get_utf8(raw.name_idx)?.to_string();
        let descriptor = JavaMethodType::parse_descriptor(pool.get_utf8(raw.descriptor_idx)?)?;
        let attributes = link_attributes(raw.attributes, pool, AttributeOwner::Method)?;
        Ok(JavaMethod {
            access_flags: MethodAccessFlags::from_bits_truncate(raw.access_flags),
            name,
            descriptor,
            attributes,
        })
    }

    pub fn access_flags(&self) -> MethodAccessFlags {
        self.access_flags
    }

    /// Get the name of the method.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Get the argument and return types of the method.
    pub fn descriptor(&self) -> &JavaMethodType {
        &self.descriptor
    }

    /// Get the attributes of the method.
    pub fn attributes(&self) -> &[JavaAttribute] {
        &self.attributes[..]
    }

    /// Get the body of the method. Abstract and native methods have none.
    pub fn code(&self) -> Option<&Code> {
        self.attributes.iter().find_map(|attribute| match attribute {
            JavaAttribute::Code(code) => Some(code),
            _ => None,
        })
    }
}

/// A class file with every constant pool reference resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct JavaClass {
    version: ClassFileVersion,
    constant_pool: ConstantPool,
    access_flags: ClassAccessFlags,
    name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<JavaField>,
    methods: Vec<JavaMethod>,
    attributes: Vec<JavaAttribute>,
}

impl JavaClass {
    /// Decode and link the class file in `bytes`.
    pub fn read(bytes: &[u8]) -> CrateResult<JavaClass> {
        Self::link(RawClass::read(bytes)?)
    }

    /// Resolve every constant pool reference in `raw`. Fails on the first reference that cannot be
    /// resolved; no partially linked class is ever produced.
    pub fn link(raw: RawClass) -> CrateResult<JavaClass> {
        let constant_pool = ConstantPool::link(&raw.constant_pool)?;
        let pool = &constant_pool;

        let name = pool.get_class_name(raw.this_class_idx)?.to_string();
        let super_name = match raw.super_class_idx {
            0 => None,
            idx => Some(pool.get_class_name(idx)?.to_string()),
        };
        let interfaces = raw
            .interface_idxs
            .iter()
            .map(|&idx| pool.get_class_name(idx).map(str::to_string))
            .collect::<CrateResult<_>>()?;
        let fields = raw
            .fields
            .into_iter()
            .map(|field| JavaField::link(field, pool))
            .collect::<CrateResult<_>>()?;
        let methods = raw
            .methods
            .into_iter()
            .map(|method| JavaMethod::link(method, pool))
            .collect::<CrateResult<_>>()?;
        let attributes = link_attributes(raw.attributes, pool, AttributeOwner::Class)?;
        log::debug!("linked class {name}");

        Ok(JavaClass {
            version: raw.version,
            access_flags: ClassAccessFlags::from_bits_truncate(raw.access_flags),
            name,
            super_name,
            interfaces,
            fields,
            methods,
            attributes,
            constant_pool,
        })
    }

    pub fn version(&self) -> ClassFileVersion {
        self.version
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.constant_pool
    }

    pub fn access_flags(&self) -> ClassAccessFlags {
        self.access_flags
    }

    /// Get the binary name of the class, e.g. `java/lang/String`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the binary name of the superclass. Only `java/lang/Object` and `module-info` have
    /// none.
    pub fn super_name(&self) -> Option<&str> {
        self.super_name.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn fields(&self) -> &[JavaField] {
        &self.fields
    }

    pub fn methods(&self) -> &[JavaMethod] {
        &self.methods
    }

    pub fn attributes(&self) -> &[JavaAttribute] {
        &self.attributes
    }

    /// Get the name of the source file this class was compiled from, if recorded.
    pub fn source_file(&self) -> Option<&str> {
        self.attributes.iter().find_map(|attribute| match attribute {
            JavaAttribute::SourceFile(name) => Some(name.as_str()),
            _ => None,
        })
    }
}
