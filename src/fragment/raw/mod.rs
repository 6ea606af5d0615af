//! The structural decode of a class file. Everything here is exactly what the file says, with
//! every symbolic reference still a constant pool index and every attribute payload still opaque.

use crate::{
    fragment::{constant_pool::RawConstantPool, ClassFileVersion},
    sized_io::ByteCursor,
    ClassParseError, CrateResult, MAGIC,
};

/// An attribute whose payload has not been interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawAttribute {
    /// The index of the Utf8 entry holding the attribute's name.
    pub name_idx: u16,
    pub info: Vec<u8>,
}

impl RawAttribute {
    /// Read the name index, the 4-byte length, and then exactly that many bytes of payload.
    pub fn read(src: &mut ByteCursor<'_>) -> CrateResult<RawAttribute> {
        let name_idx = src.read_u16()?;
        let length = src.read_u32()?;
        // A length that does not fit in memory is certainly longer than what is left.
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        let info = src.read_bytes(length)?.to_vec();
        Ok(RawAttribute { name_idx, info })
    }
}

/// Read an attribute count followed by that many attributes.
pub fn read_attributes(src: &mut ByteCursor<'_>) -> CrateResult<Vec<RawAttribute>> {
    let num_attributes = src.read_u16()?;
    let mut ret = Vec::with_capacity(num_attributes.into());
    for _ in 0..num_attributes {
        ret.push(RawAttribute::read(src)?);
    }
    Ok(ret)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawExceptionHandler {
    /// The index in the associated "Code" attribute's code array at which this exception handler
    /// becomes active.
    pub start_pc: u16,
    /// The index in the associated "Code" attribute's code array at which this exception handler
    /// becomes inactive.
    pub end_pc: u16,
    /// The index in the associated "Code" attribute's code array to jump to if this exception
    /// handler is triggered.
    pub handler_pc: u16,
    /// The index in the constant pool of the type of exception that this exception handler can
    /// handle. If `catch_type_idx` is `0`, this exception handler can handle *all* types of
    /// exception.
    pub catch_type_idx: u16,
}

impl RawExceptionHandler {
    pub fn read(src: &mut ByteCursor<'_>) -> CrateResult<RawExceptionHandler> {
        Ok(RawExceptionHandler {
            start_pc: src.read_u16()?,
            end_pc: src.read_u16()?,
            handler_pc: src.read_u16()?,
            catch_type_idx: src.read_u16()?,
        })
    }
}

/// The payload of a `Code` attribute.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawCode {
    pub max_stack: u16,
    pub max_locals: u16,
    /// The instruction bytes, not yet decoded.
    pub code: Vec<u8>,
    pub exception_handlers: Vec<RawExceptionHandler>,
    /// Attributes of the code itself, such as `LineNumberTable`.
    pub attributes: Vec<RawAttribute>,
}

impl RawCode {
    /// Decode the `info` of a `Code` attribute.
    pub fn read(info: &[u8]) -> CrateResult<RawCode> {
        let mut src = ByteCursor::new(info);
        let max_stack = src.read_u16()?;
        let max_locals = src.read_u16()?;
        let code_length = src.read_u32()?;
        let code_length = usize::try_from(code_length).unwrap_or(usize::MAX);
        let code = src.read_bytes(code_length)?.to_vec();
        let num_handlers = src.read_u16()?;
        let mut exception_handlers = Vec::with_capacity(num_handlers.into());
        for _ in 0..num_handlers {
            exception_handlers.push(RawExceptionHandler::read(&mut src)?);
        }
        let attributes = read_attributes(&mut src)?;
        if !src.is_empty() {
            log::warn!(
                "ignoring {} trailing bytes in Code attribute",
                src.remaining()
            );
        }
        Ok(RawCode {
            max_stack,
            max_locals,
            code,
            exception_handlers,
            attributes,
        })
    }
}

/// A field record as it appears in the class file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawField {
    pub access_flags: u16,
    pub name_idx: u16,
    pub descriptor_idx: u16,
    pub attributes: Vec<RawAttribute>,
}

impl RawField {
    pub fn read(src: &mut ByteCursor<'_>) -> CrateResult<RawField> {
        Ok(RawField {
            access_flags: src.read_u16()?,
            name_idx: src.read_u16()?,
            descriptor_idx: src.read_u16()?,
            attributes: read_attributes(src)?,
        })
    }
}

/// A method record as it appears in the class file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawMethod {
    pub access_flags: u16,
    pub name_idx: u16,
    pub descriptor_idx: u16,
    pub attributes: Vec<RawAttribute>,
}

impl RawMethod {
    pub fn read(src: &mut ByteCursor<'_>) -> CrateResult<RawMethod> {
        Ok(RawMethod {
            access_flags: src.read_u16()?,
            name_idx: src.read_u16()?,
            descriptor_idx: src.read_u16()?,
            attributes: read_attributes(src)?,
        })
    }
}

/// A class file decoded structurally but not yet linked.
#[derive(Clone, Debug, PartialEq)]
pub struct RawClass {
    pub version: ClassFileVersion,
    pub constant_pool: RawConstantPool,
    pub access_flags: u16,
    pub this_class_idx: u16,
    /// `0` for `java/lang/Object` and `module-info`.
    pub super_class_idx: u16,
    pub interface_idxs: Vec<u16>,
    pub fields: Vec<RawField>,
    pub methods: Vec<RawMethod>,
    pub attributes: Vec<RawAttribute>,
}

impl RawClass {
    /// Decode the structure of the class file in `bytes`.
    pub fn read(bytes: &[u8]) -> CrateResult<RawClass> {
        let mut src = ByteCursor::new(bytes);

        let magic = src.read_u32()?;
        if magic != MAGIC {
            return Err(ClassParseError::InvalidMagicNumber { actual: magic });
        }
        let minor_version = src.read_u16()?;
        let major_version = src.read_u16()?;
        let version = ClassFileVersion::new(major_version, minor_version);
        log::debug!("class file version {major_version}.{minor_version}");

        let constant_pool = RawConstantPool::read(&mut src)?;

        let access_flags = src.read_u16()?;
        let this_class_idx = src.read_u16()?;
        let super_class_idx = src.read_u16()?;

        let num_interfaces = src.read_u16()?;
        let mut interface_idxs = Vec::with_capacity(num_interfaces.into());
        for _ in 0..num_interfaces {
            interface_idxs.push(src.read_u16()?);
        }

        let num_fields = src.read_u16()?;
        let mut fields = Vec::with_capacity(num_fields.into());
        for _ in 0..num_fields {
            fields.push(RawField::read(&mut src)?);
        }

        let num_methods = src.read_u16()?;
        let mut methods = Vec::with_capacity(num_methods.into());
        for _ in 0..num_methods {
            methods.push(RawMethod::read(&mut src)?);
        }

        let attributes = read_attributes(&mut src)?;
        log::debug!(
            "decoded {} interfaces, {} fields, {} methods, {} attributes",
            interface_idxs.len(),
            fields.len(),
            methods.len(),
            attributes.len()
        );
        if !src.is_empty() {
            log::warn!(
                "ignoring {} trailing bytes after the class attributes",
                src.remaining()
            );
        }

        Ok(RawClass {
            version,
            constant_pool,
            access_flags,
            this_class_idx,
            super_class_idx,
            interface_idxs,
            fields,
            methods,
            attributes,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn attribute_list_keeps_payloads_opaque() -> CrateResult<()> {
        let bytes = [
            0x00, 0x02, // count
            0x00, 0x07, 0x00, 0x00, 0x00, 0x03, 0xDE, 0xAD, 0xBE, // first
            0x00, 0x09, 0x00, 0x00, 0x00, 0x00, // second, empty
            0x42, // belongs to whoever reads next
        ];
        let mut src = ByteCursor::new(&bytes);
        let attributes = read_attributes(&mut src)?;
        assert_eq!(
            vec![
                RawAttribute {
                    name_idx: 7,
                    info: vec![0xDE, 0xAD, 0xBE],
                },
                RawAttribute {
                    name_idx: 9,
                    info: vec![],
                },
            ],
            attributes
        );
        assert_eq!(0x42, src.read_u8()?);
        Ok(())
    }

    #[test]
    fn overlong_attribute_is_truncated() {
        let bytes = [0x00, 0x01, 0x00, 0x07, 0x00, 0x00, 0x00, 0x08, 0x01, 0x02];
        assert!(matches!(
            read_attributes(&mut ByteCursor::new(&bytes)),
            Err(ClassParseError::TruncatedInput {
                requested: 8,
                available: 2,
                ..
            })
        ));
    }

    #[test]
    fn reads_code() -> CrateResult<()> {
        let info = [
            0x00, 0x02, // max_stack
            0x00, 0x01, // max_locals
            0x00, 0x00, 0x00, 0x02, 0x03, 0xAC, // iconst_0; ireturn
            0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, // one catch-all handler
            0x00, 0x00, // no attributes
        ];
        let code = RawCode::read(&info)?;
        assert_eq!(2, code.max_stack);
        assert_eq!(1, code.max_locals);
        assert_eq!(vec![0x03, 0xAC], code.code);
        assert_eq!(
            vec![RawExceptionHandler {
                start_pc: 0,
                end_pc: 1,
                handler_pc: 1,
                catch_type_idx: 0,
            }],
            code.exception_handlers
        );
        assert!(code.attributes.is_empty());
        Ok(())
    }

    #[test]
    fn short_code_array_is_truncated() {
        let info = [
            0x00, 0x00, 0x00, 0x01, // max_stack, max_locals
            0x00, 0x00, 0x00, 0x0A, // ten bytes of code...
            0xB1, 0xB1, 0xB1, 0xB1, 0xB1, // ...but only five supplied
        ];
        assert!(matches!(
            RawCode::read(&info),
            Err(ClassParseError::TruncatedInput {
                offset: 8,
                requested: 10,
                available: 5,
            })
        ));
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = [0xCA, 0xFE, 0xD0, 0x0D, 0x00, 0x00, 0x00, 0x34];
        assert_eq!(
            Err(ClassParseError::InvalidMagicNumber {
                actual: 0xCAFE_D00D
            }),
            RawClass::read(&bytes)
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            RawClass::read(&[]),
            Err(ClassParseError::TruncatedInput {
                offset: 0,
                requested: 4,
                available: 0,
            })
        ));
    }
}
