use num_enum::{IntoPrimitive, TryFromPrimitive};

use std::fmt::{self, Debug, Display, Formatter};

use crate::{
    parsers::jvm8,
    sized_io::ByteCursor,
    types::{JavaFieldType, JavaMethodType},
    ClassParseError, CrateResult,
};

/// The kind of action a `CPEntry::MethodHandle` represents.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, PartialEq, TryFromPrimitive)]
pub enum ReferenceKind {
    /// Read an instance-specific (non-static) field of an object.
    ReadInstanceField = 1,
    /// Read a static field of a class.
    ReadStaticField = 2,
    /// Write an instance-specific (non-static) field of an object.
    WriteInstanceField = 3,
    /// Write a static field of a class.
    WriteStaticField = 4,
    /// Invoke an instance method by walking up the class hierarchy of the
    /// object the method is invoked on.
    InvokeVirtual = 5,
    /// Invoke a static method of a class.
    InvokeStatic = 6,
    /// Invoke an instance method by walking up the class hierarchy of the
    /// class specified in the associated `CPEntry::Methodref`.
    InvokeSpecial = 7,
    /// Invoke a method named `<init>`.
    InvokeNew = 8,
    /// Invoke a method from an interface.
    InvokeInterface = 9,
}

impl ReferenceKind {
    /// True iff the handle must point at a `Fieldref`.
    pub fn is_field_access(self) -> bool {
        matches!(
            self,
            Self::ReadInstanceField
                | Self::ReadStaticField
                | Self::WriteInstanceField
                | Self::WriteStaticField
        )
    }
}

/// The tag on a constant pool entry.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, PartialEq, TryFromPrimitive)]
pub enum CPEntryType {
    /// The entry is a string of Unicode codepoints encoded in modified UTF-8.
    Utf8 = 0x01,
    /// The entry is a 4-byte integer value.
    Integer = 0x03,
    /// The entry is a 4-byte floating point value.
    Float = 0x04,
    /// The entry is an 8-byte integer value.
    Long = 0x05,
    /// The entry is an 8-byte floating point value.
    Double = 0x06,
    /// The entry is a reference to an entry of type Utf8 which represents the fully-qualified name
    /// of a class.
    Class = 0x07,
    /// The entry is a reference to an entry of type Utf8 holding a string literal.
    String = 0x08,
    /// The entry is a pair of a reference to an entry of type Class and a reference to an entry of
    /// type NameAndType which refers to a field.
    Fieldref = 0x09,
    /// Like `Fieldref`, but the NameAndType refers to a method of a class.
    Methodref = 0x0A,
    /// Like `Fieldref`, but the NameAndType refers to a method of an interface.
    InterfaceMethodref = 0x0B,
    /// The entry is a pair of a reference to a name and a reference to a descriptor.
    NameAndType = 0x0C,
    /// The entry is a reference kind and a reference to a field or method.
    MethodHandle = 0x0F,
    /// The entry is a reference to an entry of type `Utf8` which represents a method type.
    MethodType = 0x10,
    /// A dynamically-computed constant: a bootstrap method index and a `NameAndType` whose
    /// descriptor is a field descriptor.
    Dynamic = 0x11,
    /// A dynamically-computed call site: a bootstrap method index and a `NameAndType` whose
    /// descriptor is a method descriptor.
    InvokeDynamic = 0x12,
    /// The entry is a reference to a Utf8 naming a module.
    Module = 0x13,
    /// The entry is a reference to a Utf8 naming a package.
    Package = 0x14,
    /// The entry follows a `Long` or `Double`.
    After8Byte = 0x00,
}

impl CPEntryType {
    /// The number of logical pool slots an entry with this tag occupies.
    pub fn width(self) -> usize {
        match self {
            Self::Long | Self::Double => 2,
            _ => 1,
        }
    }
}

impl Display for CPEntryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

/// An entry in the constant pool as it appears in the class file, with every cross-reference still
/// a 1-based index.
#[derive(Clone, Debug, PartialEq)]
pub enum CPEntry {
    /// The raw modified UTF-8 bytes. Decoding happens during linking.
    Utf8(Vec<u8>),
    /// An `int` value.
    Integer(i32),
    /// A `float` value.
    Float(f32),
    /// A `long` value.
    Long(i64),
    /// A `double` value.
    Double(f64),
    /// The index of the Utf8 entry holding a class name.
    Class(u16),
    /// The index of the Utf8 entry holding the contents of a string literal.
    String(u16),
    /// The index of the owning Class and the index of the NameAndType.
    Fieldref(u16, u16),
    /// The index of the owning Class and the index of the NameAndType.
    Methodref(u16, u16),
    /// The index of the owning Class and the index of the NameAndType.
    InterfaceMethodref(u16, u16),
    /// The index of the Utf8 name and the index of the Utf8 descriptor.
    NameAndType(u16, u16),
    /// The reference kind and the index of the referenced member.
    MethodHandle(ReferenceKind, u16),
    /// The index of the Utf8 method descriptor.
    MethodType(u16),
    /// The bootstrap method index and the index of the NameAndType.
    Dynamic(u16, u16),
    /// The bootstrap method index and the index of the NameAndType.
    InvokeDynamic(u16, u16),
    /// The index of the Utf8 module name.
    Module(u16),
    /// The index of the Utf8 package name.
    Package(u16),
    /// An empty constant pool entry representing the hole in the constant pool following the 8-byte
    /// constants Long and Double.
    After8Byte,
}

impl CPEntry {
    /// Get the entry type of `self`.
    pub fn r#type(&self) -> CPEntryType {
        match self {
            CPEntry::Utf8(_) => CPEntryType::Utf8,
            CPEntry::Integer(_) => CPEntryType::Integer,
            CPEntry::Float(_) => CPEntryType::Float,
            CPEntry::Long(_) => CPEntryType::Long,
            CPEntry::Double(_) => CPEntryType::Double,
            CPEntry::Class(_) => CPEntryType::Class,
            CPEntry::String(_) => CPEntryType::String,
            CPEntry::Fieldref(_, _) => CPEntryType::Fieldref,
            CPEntry::Methodref(_, _) => CPEntryType::Methodref,
            CPEntry::InterfaceMethodref(_, _) => CPEntryType::InterfaceMethodref,
            CPEntry::NameAndType(_, _) => CPEntryType::NameAndType,
            CPEntry::MethodHandle(_, _) => CPEntryType::MethodHandle,
            CPEntry::MethodType(_) => CPEntryType::MethodType,
            CPEntry::Dynamic(_, _) => CPEntryType::Dynamic,
            CPEntry::InvokeDynamic(_, _) => CPEntryType::InvokeDynamic,
            CPEntry::Module(_) => CPEntryType::Module,
            CPEntry::Package(_) => CPEntryType::Package,
            CPEntry::After8Byte => CPEntryType::After8Byte,
        }
    }

    /// Read the constant pool entry that will live at `index` from `src`.
    pub fn read(src: &mut ByteCursor<'_>, index: u16) -> CrateResult<CPEntry> {
        let tag = src.read_u8()?;
        let entry = match CPEntryType::try_from(tag) {
            Ok(CPEntryType::Utf8) => {
                let length = src.read_u16()?;
                CPEntry::Utf8(src.read_bytes(length.into())?.to_vec())
            }
            Ok(CPEntryType::Integer) => CPEntry::Integer(src.read_i32()?),
            Ok(CPEntryType::Float) => CPEntry::Float(src.read_f32()?),
            Ok(CPEntryType::Long) => CPEntry::Long(src.read_i64()?),
            Ok(CPEntryType::Double) => CPEntry::Double(src.read_f64()?),
            Ok(CPEntryType::Class) => CPEntry::Class(src.read_u16()?),
            Ok(CPEntryType::String) => CPEntry::String(src.read_u16()?),
            Ok(CPEntryType::Fieldref) => {
                let owner_idx = src.read_u16()?;
                let name_and_type_idx = src.read_u16()?;
                CPEntry::Fieldref(owner_idx, name_and_type_idx)
            }
            Ok(CPEntryType::Methodref) => {
                let owner_idx = src.read_u16()?;
                let name_and_type_idx = src.read_u16()?;
                CPEntry::Methodref(owner_idx, name_and_type_idx)
            }
            Ok(CPEntryType::InterfaceMethodref) => {
                let owner_idx = src.read_u16()?;
                let name_and_type_idx = src.read_u16()?;
                CPEntry::InterfaceMethodref(owner_idx, name_and_type_idx)
            }
            Ok(CPEntryType::NameAndType) => {
                let name_idx = src.read_u16()?;
                let type_idx = src.read_u16()?;
                CPEntry::NameAndType(name_idx, type_idx)
            }
            Ok(CPEntryType::MethodHandle) => {
                let raw_kind = src.read_u8()?;
                let rk = ReferenceKind::try_from(raw_kind).map_err(|_| {
                    ClassParseError::MalformedConstantPool {
                        index,
                        reason: format!("invalid method handle reference kind {raw_kind}"),
                    }
                })?;
                CPEntry::MethodHandle(rk, src.read_u16()?)
            }
            Ok(CPEntryType::MethodType) => CPEntry::MethodType(src.read_u16()?),
            Ok(CPEntryType::Dynamic) => {
                let bootstrap_method_idx = src.read_u16()?;
                let name_and_type_idx = src.read_u16()?;
                CPEntry::Dynamic(bootstrap_method_idx, name_and_type_idx)
            }
            Ok(CPEntryType::InvokeDynamic) => {
                let bootstrap_method_idx = src.read_u16()?;
                let name_and_type_idx = src.read_u16()?;
                CPEntry::InvokeDynamic(bootstrap_method_idx, name_and_type_idx)
            }
            Ok(CPEntryType::Module) => CPEntry::Module(src.read_u16()?),
            Ok(CPEntryType::Package) => CPEntry::Package(src.read_u16()?),
            Ok(CPEntryType::After8Byte) | Err(_) => {
                return Err(ClassParseError::MalformedConstantPool {
                    index,
                    reason: format!("unrecognized tag {tag}"),
                })
            }
        };
        Ok(entry)
    }
}

/// The constant pool exactly as decoded. All indexing operations are 1-based.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawConstantPool {
    pool: Vec<CPEntry>,
}

impl RawConstantPool {
    /// Read a constant pool from `src`: the 2-byte count followed by entries filling `count - 1`
    /// slots.
    pub fn read(src: &mut ByteCursor<'_>) -> CrateResult<Self> {
        let count = src.read_u16()?;
        if count == 0 {
            return Err(ClassParseError::MalformedConstantPool {
                index: 0,
                reason: "constant pool count must be at least 1".to_string(),
            });
        }
        let len = usize::from(count - 1);
        let mut pool = Vec::with_capacity(len);
        while pool.len() < len {
            // `pool.len() < len <= 0xFFFE`, so this cannot overflow.
            let index = pool.len() as u16 + 1;
            let entry = CPEntry::read(src, index)?;
            let width = entry.r#type().width();
            if pool.len() + width > len {
                return Err(ClassParseError::MalformedConstantPool {
                    index,
                    reason: format!(
                        "{} entry needs {width} slots but the pool declares only {len}",
                        entry.r#type()
                    ),
                });
            }
            pool.push(entry);
            if width == 2 {
                pool.push(CPEntry::After8Byte);
            }
        }
        log::debug!("decoded constant pool with {} slots", pool.len());
        Ok(Self { pool })
    }

    /// Get the number of slots in the constant pool, holes included.
    pub fn size(&self) -> u16 {
        // `read` never produces more than 0xFFFE slots.
        self.pool.len() as u16
    }

    /// Get a reference to the entry in the constant pool at index `idx`.
    pub fn get(&self, idx: u16) -> CrateResult<&CPEntry> {
        self.lookup(idx, "an entry")
    }

    fn lookup(&self, idx: u16, expected: &'static str) -> CrateResult<&CPEntry> {
        if idx == 0 || usize::from(idx) > self.pool.len() {
            return Err(ClassParseError::dangling(idx, expected, None));
        }
        Ok(&self.pool[usize::from(idx) - 1])
    }

    /// Iterate over `(index, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &CPEntry)> {
        (1..).zip(self.pool.iter())
    }
}

/// A symbolic reference to a field, flattened from `Fieldref -> (Class, NameAndType)`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FieldRef {
    owner: String,
    name: String,
    descriptor: JavaFieldType,
}

impl FieldRef {
    pub fn new(owner: String, name: String, descriptor: JavaFieldType) -> Self {
        Self {
            owner,
            name,
            descriptor,
        }
    }

    /// The binary name of the class declaring the field.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &JavaFieldType {
        &self.descriptor
    }
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} : {}", self.owner, self.name, self.descriptor)
    }
}

/// A symbolic reference to a method, flattened from `(Interface)Methodref -> (Class,
/// NameAndType)`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MethodRef {
    is_interface: bool,
    owner: String,
    name: String,
    descriptor: JavaMethodType,
}

impl MethodRef {
    pub fn new(
        is_interface: bool,
        owner: String,
        name: String,
        descriptor: JavaMethodType,
    ) -> Self {
        Self {
            is_interface,
            owner,
            name,
            descriptor,
        }
    }

    /// True iff this came from an `InterfaceMethodref`.
    pub fn is_interface_method(&self) -> bool {
        self.is_interface
    }

    /// The binary name of the class or interface declaring the method.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &JavaMethodType {
        &self.descriptor
    }
}

impl Display for MethodRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.owner, self.name)?;
        for (i, arg) in self.descriptor.arg_types().iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ") : {}", self.descriptor.ret_type())
    }
}

/// The target of a method handle.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum MemberRef {
    Field(FieldRef),
    Method(MethodRef),
}

impl Display for MemberRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => write!(f, "{field}"),
            Self::Method(method) => write!(f, "{method}"),
        }
    }
}

/// A call site produced by a bootstrap method.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct InvokeDynamicRef {
    /// Index into the class's `BootstrapMethods` attribute.
    pub bootstrap_method_idx: u16,
    pub name: String,
    pub descriptor: JavaMethodType,
}

impl Display for InvokeDynamicRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{}:{} : {}",
            self.bootstrap_method_idx, self.name, self.descriptor
        )
    }
}

/// A constant produced by a bootstrap method.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DynamicRef {
    /// Index into the class's `BootstrapMethods` attribute.
    pub bootstrap_method_idx: u16,
    pub name: String,
    pub descriptor: JavaFieldType,
}

impl Display for DynamicRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{}:{} : {}",
            self.bootstrap_method_idx, self.name, self.descriptor
        )
    }
}

/// A constant pool entry with every cross-reference replaced by the value it refers to.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    /// A class name, e.g. `java/lang/String` or `[Ljava/lang/String;` for an array class.
    Class(String),
    /// The contents of a string literal.
    String(String),
    Fieldref(FieldRef),
    Methodref(MethodRef),
    InterfaceMethodref(MethodRef),
    /// A name and its still untranslated descriptor text, which may be either a field or a method
    /// descriptor.
    NameAndType {
        name: String,
        descriptor: String,
    },
    MethodHandle {
        kind: ReferenceKind,
        member: MemberRef,
    },
    MethodType(JavaMethodType),
    Dynamic(DynamicRef),
    InvokeDynamic(InvokeDynamicRef),
    Module(String),
    Package(String),
    /// The second slot of a `Long` or `Double`.
    Unusable,
}

impl Constant {
    /// Get the tag of the raw entry this was resolved from.
    pub fn r#type(&self) -> CPEntryType {
        match self {
            Self::Utf8(_) => CPEntryType::Utf8,
            Self::Integer(_) => CPEntryType::Integer,
            Self::Float(_) => CPEntryType::Float,
            Self::Long(_) => CPEntryType::Long,
            Self::Double(_) => CPEntryType::Double,
            Self::Class(_) => CPEntryType::Class,
            Self::String(_) => CPEntryType::String,
            Self::Fieldref(_) => CPEntryType::Fieldref,
            Self::Methodref(_) => CPEntryType::Methodref,
            Self::InterfaceMethodref(_) => CPEntryType::InterfaceMethodref,
            Self::NameAndType { .. } => CPEntryType::NameAndType,
            Self::MethodHandle { .. } => CPEntryType::MethodHandle,
            Self::MethodType(_) => CPEntryType::MethodType,
            Self::Dynamic(_) => CPEntryType::Dynamic,
            Self::InvokeDynamic(_) => CPEntryType::InvokeDynamic,
            Self::Module(_) => CPEntryType::Module,
            Self::Package(_) => CPEntryType::Package,
            Self::Unusable => CPEntryType::After8Byte,
        }
    }

    /// True iff `ldc` and friends may push this constant.
    pub fn is_loadable(&self) -> bool {
        matches!(
            self,
            Self::Integer(_)
                | Self::Float(_)
                | Self::Long(_)
                | Self::Double(_)
                | Self::Class(_)
                | Self::String(_)
                | Self::MethodHandle { .. }
                | Self::MethodType(_)
                | Self::Dynamic(_)
        )
    }
}

impl Display for Constant {
    /// Renders the constant roughly as it would be written in Java source.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}f"),
            Self::Long(l) => write!(f, "{l}L"),
            Self::Double(d) => write!(f, "{d:?}"),
            Self::Class(name) => write!(f, "{name}.class"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Fieldref(field) => write!(f, "{field}"),
            Self::Methodref(method) | Self::InterfaceMethodref(method) => write!(f, "{method}"),
            Self::NameAndType { name, descriptor } => write!(f, "{name}:{descriptor}"),
            Self::MethodHandle { kind, member } => write!(f, "{kind:?} {member}"),
            Self::MethodType(t) => write!(f, "{t}"),
            Self::Dynamic(d) => write!(f, "{d}"),
            Self::InvokeDynamic(indy) => write!(f, "{indy}"),
            Self::Module(name) | Self::Package(name) => write!(f, "{name}"),
            Self::Unusable => write!(f, "<unusable>"),
        }
    }
}

/// Resolves index-based references in a raw pool. Construction runs the first pass, decoding every
/// `Utf8` entry; `resolve` is the second pass, which only ever looks at first-pass text and raw
/// indices and therefore never observes a half-resolved slot.
struct Linker<'p> {
    raw: &'p RawConstantPool,
    text: Vec<Option<String>>,
}

impl<'p> Linker<'p> {
    fn new(raw: &'p RawConstantPool) -> CrateResult<Self> {
        let text = raw
            .iter()
            .map(|(index, entry)| match entry {
                CPEntry::Utf8(bytes) => jvm8::decode(bytes)
                    .map(Some)
                    .ok_or(ClassParseError::InvalidUtf8 { index }),
                _ => Ok(None),
            })
            .collect::<CrateResult<Vec<_>>>()?;
        Ok(Self { raw, text })
    }

    fn utf8(&self, idx: u16) -> CrateResult<&str> {
        let entry = self.raw.lookup(idx, "a Utf8 entry")?;
        self.text[usize::from(idx) - 1]
            .as_deref()
            .ok_or_else(|| ClassParseError::dangling(idx, "a Utf8 entry", Some(entry.r#type())))
    }

    fn class_name(&self, idx: u16) -> CrateResult<&str> {
        match self.raw.lookup(idx, "a Class entry")? {
            CPEntry::Class(name_idx) => self.utf8(*name_idx),
            other => Err(ClassParseError::dangling(
                idx,
                "a Class entry",
                Some(other.r#type()),
            )),
        }
    }

    fn name_and_type(&self, idx: u16) -> CrateResult<(&str, &str)> {
        match self.raw.lookup(idx, "a NameAndType entry")? {
            CPEntry::NameAndType(name_idx, descriptor_idx) => {
                Ok((self.utf8(*name_idx)?, self.utf8(*descriptor_idx)?))
            }
            other => Err(ClassParseError::dangling(
                idx,
                "a NameAndType entry",
                Some(other.r#type()),
            )),
        }
    }

    fn field_ref(&self, owner_idx: u16, name_and_type_idx: u16) -> CrateResult<FieldRef> {
        let owner = self.class_name(owner_idx)?;
        let (name, descriptor) = self.name_and_type(name_and_type_idx)?;
        Ok(FieldRef::new(
            owner.to_owned(),
            name.to_owned(),
            JavaFieldType::parse_descriptor(descriptor)?,
        ))
    }

    fn method_ref(
        &self,
        is_interface: bool,
        owner_idx: u16,
        name_and_type_idx: u16,
    ) -> CrateResult<MethodRef> {
        let owner = self.class_name(owner_idx)?;
        let (name, descriptor) = self.name_and_type(name_and_type_idx)?;
        Ok(MethodRef::new(
            is_interface,
            owner.to_owned(),
            name.to_owned(),
            JavaMethodType::parse_descriptor(descriptor)?,
        ))
    }

    fn member(&self, kind: ReferenceKind, idx: u16) -> CrateResult<MemberRef> {
        let expected = if kind.is_field_access() {
            "a Fieldref entry"
        } else {
            "a Methodref or InterfaceMethodref entry"
        };
        match (kind.is_field_access(), self.raw.lookup(idx, expected)?) {
            (true, CPEntry::Fieldref(owner_idx, nat_idx)) => {
                self.field_ref(*owner_idx, *nat_idx).map(MemberRef::Field)
            }
            (false, CPEntry::Methodref(owner_idx, nat_idx)) => self
                .method_ref(false, *owner_idx, *nat_idx)
                .map(MemberRef::Method),
            (false, CPEntry::InterfaceMethodref(owner_idx, nat_idx)) => self
                .method_ref(true, *owner_idx, *nat_idx)
                .map(MemberRef::Method),
            (_, other) => Err(ClassParseError::dangling(idx, expected, Some(other.r#type()))),
        }
    }

    fn resolve(&self, idx: u16, entry: &CPEntry) -> CrateResult<Constant> {
        Ok(match entry {
            CPEntry::Utf8(_) => Constant::Utf8(self.utf8(idx)?.to_owned()),
            CPEntry::Integer(i) => Constant::Integer(*i),
            CPEntry::Float(x) => Constant::Float(*x),
            CPEntry::Long(l) => Constant::Long(*l),
            CPEntry::Double(d) => Constant::Double(*d),
            CPEntry::Class(name_idx) => Constant::Class(self.utf8(*name_idx)?.to_owned()),
            CPEntry::String(string_idx) => Constant::String(self.utf8(*string_idx)?.to_owned()),
            CPEntry::Fieldref(owner_idx, nat_idx) => {
                Constant::Fieldref(self.field_ref(*owner_idx, *nat_idx)?)
            }
            CPEntry::Methodref(owner_idx, nat_idx) => {
                Constant::Methodref(self.method_ref(false, *owner_idx, *nat_idx)?)
            }
            CPEntry::InterfaceMethodref(owner_idx, nat_idx) => {
                Constant::InterfaceMethodref(self.method_ref(true, *owner_idx, *nat_idx)?)
            }
            CPEntry::NameAndType(name_idx, descriptor_idx) => Constant::NameAndType {
                name: self.utf8(*name_idx)?.to_owned(),
                descriptor: self.utf8(*descriptor_idx)?.to_owned(),
            },
            CPEntry::MethodHandle(kind, member_idx) => Constant::MethodHandle {
                kind: *kind,
                member: self.member(*kind, *member_idx)?,
            },
            CPEntry::MethodType(descriptor_idx) => Constant::MethodType(
                JavaMethodType::parse_descriptor(self.utf8(*descriptor_idx)?)?,
            ),
            CPEntry::Dynamic(bootstrap_method_idx, nat_idx) => {
                let (name, descriptor) = self.name_and_type(*nat_idx)?;
                Constant::Dynamic(DynamicRef {
                    bootstrap_method_idx: *bootstrap_method_idx,
                    name: name.to_owned(),
                    descriptor: JavaFieldType::parse_descriptor(descriptor)?,
                })
            }
            CPEntry::InvokeDynamic(bootstrap_method_idx, nat_idx) => {
                let (name, descriptor) = self.name_and_type(*nat_idx)?;
                Constant::InvokeDynamic(InvokeDynamicRef {
                    bootstrap_method_idx: *bootstrap_method_idx,
                    name: name.to_owned(),
                    descriptor: JavaMethodType::parse_descriptor(descriptor)?,
                })
            }
            CPEntry::Module(name_idx) => Constant::Module(self.utf8(*name_idx)?.to_owned()),
            CPEntry::Package(name_idx) => Constant::Package(self.utf8(*name_idx)?.to_owned()),
            CPEntry::After8Byte => Constant::Unusable,
        })
    }
}

/// A constant pool in which every entry has been resolved to the value it denotes. All indexing
/// operations are 1-based, and asking for an entry of the wrong kind is an error rather than a
/// panic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstantPool {
    pool: Vec<Constant>,
}

impl ConstantPool {
    /// Resolve every entry of `raw`.
    pub fn link(raw: &RawConstantPool) -> CrateResult<Self> {
        let linker = Linker::new(raw)?;
        let pool = raw
            .iter()
            .map(|(idx, entry)| linker.resolve(idx, entry))
            .collect::<CrateResult<Vec<_>>>()?;
        log::debug!("linked {} constant pool slots", raw.size());
        Ok(Self { pool })
    }

    fn lookup(&self, idx: u16, expected: &'static str) -> CrateResult<&Constant> {
        if idx == 0 || usize::from(idx) > self.pool.len() {
            return Err(ClassParseError::dangling(idx, expected, None));
        }
        Ok(&self.pool[usize::from(idx) - 1])
    }

    /// Get a reference to the entry in the constant pool at index `idx`.
    pub fn get(&self, idx: u16) -> CrateResult<&Constant> {
        self.lookup(idx, "an entry")
    }

    /// Iterate over `(index, entry)` pairs, holes included.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        (1..).zip(self.pool.iter())
    }

    /// Get the text of the `Utf8` entry at `idx`.
    pub fn get_utf8(&self, idx: u16) -> CrateResult<&str> {
        match self.lookup(idx, "a Utf8 entry")? {
            Constant::Utf8(s) => Ok(s),
            other => Err(ClassParseError::dangling(idx, "a Utf8 entry", Some(other.r#type()))),
        }
    }

    /// Get the name of the class referred to by the `Class` entry at `idx`.
    pub fn get_class_name(&self, idx: u16) -> CrateResult<&str> {
        match self.lookup(idx, "a Class entry")? {
            Constant::Class(name) => Ok(name),
            other => Err(ClassParseError::dangling(idx, "a Class entry", Some(other.r#type()))),
        }
    }

    /// Get the field referred to by the `Fieldref` at `idx`.
    pub fn get_field_ref(&self, idx: u16) -> CrateResult<&FieldRef> {
        match self.lookup(idx, "a Fieldref entry")? {
            Constant::Fieldref(field) => Ok(field),
            other => Err(ClassParseError::dangling(
                idx,
                "a Fieldref entry",
                Some(other.r#type()),
            )),
        }
    }

    /// Get the method referred to by the `Methodref` or `InterfaceMethodref` at `idx`.
    pub fn get_method_ref(&self, idx: u16) -> CrateResult<&MethodRef> {
        const EXPECTED: &str = "a Methodref or InterfaceMethodref entry";
        match self.lookup(idx, EXPECTED)? {
            Constant::Methodref(method) | Constant::InterfaceMethodref(method) => Ok(method),
            other => Err(ClassParseError::dangling(idx, EXPECTED, Some(other.r#type()))),
        }
    }

    /// Get the method referred to by the `InterfaceMethodref` at `idx`.
    pub fn get_interface_method_ref(&self, idx: u16) -> CrateResult<&MethodRef> {
        match self.lookup(idx, "an InterfaceMethodref entry")? {
            Constant::InterfaceMethodref(method) => Ok(method),
            other => Err(ClassParseError::dangling(
                idx,
                "an InterfaceMethodref entry",
                Some(other.r#type()),
            )),
        }
    }

    /// Get the call site described by the `InvokeDynamic` at `idx`.
    pub fn get_invoke_dynamic(&self, idx: u16) -> CrateResult<&InvokeDynamicRef> {
        match self.lookup(idx, "an InvokeDynamic entry")? {
            Constant::InvokeDynamic(indy) => Ok(indy),
            other => Err(ClassParseError::dangling(
                idx,
                "an InvokeDynamic entry",
                Some(other.r#type()),
            )),
        }
    }

    /// Get the entry at `idx` if it may be pushed by `ldc`, `ldc_w`, or `ldc2_w`.
    pub fn get_loadable(&self, idx: u16) -> CrateResult<&Constant> {
        let entry = self.lookup(idx, "a loadable constant")?;
        if entry.is_loadable() {
            Ok(entry)
        } else {
            Err(ClassParseError::dangling(
                idx,
                "a loadable constant",
                Some(entry.r#type()),
            ))
        }
    }
}
