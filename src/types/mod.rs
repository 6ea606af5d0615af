//! Field and method descriptors.
//!
//! A field descriptor is zero or more `[` followed by one of the eight primitive codes or an object
//! name written `Lpath/to/Name;`. A method descriptor is `(` zero or more field descriptors `)`
//! followed by either `V` or a field descriptor.

use std::fmt::{self, Display, Formatter};

use nom::{branch, bytes::complete as bytes, combinator as comb, multi, sequence, IResult};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    parsers::{impl_from_str_for_nom_parse_cf, NomParse, NomParseContextFree},
    ClassParseError, CrateResult,
};

/// The greatest number of array dimensions a descriptor may declare.
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

/// An inhabited Java primitive type. The discriminants are the `atype` codes used by the
/// `newarray` instruction.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, IntoPrimitive, PartialEq, TryFromPrimitive)]
pub enum PrimitiveValueType {
    /// The Java equivalent to `bool`.
    Bool = 4,
    /// A UTF-16 character.
    Char = 5,
    /// The Java equivalent to `f32`.
    Float = 6,
    /// The Java equivalent to `f64`.
    Double = 7,
    /// The Java equivalent to `i8`.
    Byte = 8,
    /// The Java equivalent to `i16`.
    Short = 9,
    /// The Java equivalent to `i32`.
    Int = 10,
    /// The Java equivalent to `i64`.
    Long = 11,
}

impl PrimitiveValueType {
    /// The Java keyword naming the type.
    pub fn to_source_form(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
        }
    }
}

impl Display for PrimitiveValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_source_form())
    }
}

impl<'i> NomParse<(), &'i str> for PrimitiveValueType {
    fn nom_parse(_: (), s: &'i str) -> IResult<&'i str, Self> {
        branch::alt((
            comb::value(Self::Bool, bytes::tag("Z")),
            comb::value(Self::Char, bytes::tag("C")),
            comb::value(Self::Float, bytes::tag("F")),
            comb::value(Self::Double, bytes::tag("D")),
            comb::value(Self::Byte, bytes::tag("B")),
            comb::value(Self::Short, bytes::tag("S")),
            comb::value(Self::Int, bytes::tag("I")),
            comb::value(Self::Long, bytes::tag("J")),
        ))(s)
    }
}

/// The element type of a field descriptor once every array dimension has been stripped.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum BaseType {
    /// One of the eight primitive types.
    Primitive(PrimitiveValueType),
    /// A class or interface, by its slash-separated binary name.
    Object(String),
}

impl Display for BaseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{p}"),
            Self::Object(name) => f.write_str(name),
        }
    }
}

impl<'i> NomParse<(), &'i str> for BaseType {
    fn nom_parse(_: (), s: &'i str) -> IResult<&'i str, Self> {
        branch::alt((
            comb::map(PrimitiveValueType::nom_parse_cf, Self::Primitive),
            comb::map(
                sequence::delimited(bytes::tag("L"), bytes::is_not(";"), bytes::tag(";")),
                |name: &str| Self::Object(name.to_string()),
            ),
        ))(s)
    }
}

/// The type of a field, parameter, or local variable.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct JavaFieldType {
    base: BaseType,
    dimensions: usize,
}

impl JavaFieldType {
    /// A non-array type.
    pub fn new(base: BaseType) -> Self {
        Self {
            base,
            dimensions: 0,
        }
    }

    /// An array of `base` with `dimensions` levels of nesting.
    pub fn array_of(base: BaseType, dimensions: usize) -> Self {
        Self { base, dimensions }
    }

    /// A non-array class type.
    pub fn object(name: &str) -> Self {
        Self::new(BaseType::Object(name.to_string()))
    }

    /// A non-array primitive type.
    pub fn primitive(p: PrimitiveValueType) -> Self {
        Self::new(BaseType::Primitive(p))
    }

    /// The element type once every array dimension is stripped.
    pub fn base(&self) -> &BaseType {
        &self.base
    }

    /// The number of array dimensions; zero for a non-array type.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Test whether this is exactly the primitive `p`.
    pub fn is_primitive(&self, p: PrimitiveValueType) -> bool {
        self.dimensions == 0 && self.base == BaseType::Primitive(p)
    }

    /// Translate a field descriptor.
    pub fn parse_descriptor(descriptor: &str) -> CrateResult<Self> {
        descriptor
            .parse()
            .map_err(|source| ClassParseError::InvalidDescriptor {
                descriptor: descriptor.to_string(),
                source,
            })
    }
}

impl Display for JavaFieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        (0..self.dimensions).try_for_each(|_| f.write_str("[]"))
    }
}

impl<'i> NomParse<(), &'i str> for JavaFieldType {
    fn nom_parse(_: (), s: &'i str) -> IResult<&'i str, Self> {
        comb::map(
            sequence::pair(
                comb::verify(multi::many0_count(bytes::tag("[")), |dimensions: &usize| {
                    *dimensions <= MAX_ARRAY_DIMENSIONS
                }),
                BaseType::nom_parse_cf,
            ),
            |(dimensions, base)| Self { base, dimensions },
        )(s)
    }
}

impl_from_str_for_nom_parse_cf!(JavaFieldType);

/// The result type of a method.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ReturnType {
    /// The method returns nothing.
    Void,
    /// The method returns a value of the given type.
    Value(JavaFieldType),
}

impl Display for ReturnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Value(t) => write!(f, "{t}"),
        }
    }
}

impl<'i> NomParse<(), &'i str> for ReturnType {
    fn nom_parse(_: (), s: &'i str) -> IResult<&'i str, Self> {
        branch::alt((
            comb::value(Self::Void, bytes::tag("V")),
            comb::map(JavaFieldType::nom_parse_cf, Self::Value),
        ))(s)
    }
}

/// The parameter and return types of a method.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct JavaMethodType {
    arg_types: Vec<JavaFieldType>,
    ret_type: ReturnType,
}

impl JavaMethodType {
    pub fn new(arg_types: Vec<JavaFieldType>, ret_type: ReturnType) -> Self {
        Self {
            arg_types,
            ret_type,
        }
    }

    /// The parameter types, in declaration order.
    pub fn arg_types(&self) -> &[JavaFieldType] {
        &self.arg_types
    }

    pub fn ret_type(&self) -> &ReturnType {
        &self.ret_type
    }

    /// Translate a method descriptor.
    pub fn parse_descriptor(descriptor: &str) -> CrateResult<Self> {
        descriptor
            .parse()
            .map_err(|source| ClassParseError::InvalidDescriptor {
                descriptor: descriptor.to_string(),
                source,
            })
    }
}

impl Display for JavaMethodType {
    /// Renders as `ret(arg, arg)`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ret_type)?;
        for (i, arg) in self.arg_types.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

impl<'i> NomParse<(), &'i str> for JavaMethodType {
    fn nom_parse(_: (), s: &'i str) -> IResult<&'i str, Self> {
        comb::map(
            sequence::pair(
                sequence::delimited(
                    bytes::tag("("),
                    multi::many0(JavaFieldType::nom_parse_cf),
                    bytes::tag(")"),
                ),
                ReturnType::nom_parse_cf,
            ),
            |(arg_types, ret_type)| Self::new(arg_types, ret_type),
        )(s)
    }
}

impl_from_str_for_nom_parse_cf!(JavaMethodType);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parser_fails_on_empty() {
        assert!("".parse::<JavaFieldType>().is_err());
        assert!("".parse::<JavaMethodType>().is_err());
    }

    #[test]
    fn parses_every_primitive() {
        let cases = [
            ("Z", "boolean"),
            ("B", "byte"),
            ("C", "char"),
            ("D", "double"),
            ("F", "float"),
            ("I", "int"),
            ("J", "long"),
            ("S", "short"),
        ];
        for (src, expected) in cases {
            let result = JavaFieldType::parse_descriptor(src).unwrap();
            assert_eq!(0, result.dimensions());
            assert_eq!(expected, result.to_string());
        }
    }

    #[test]
    fn void_is_not_a_field_type() {
        assert!("V".parse::<JavaFieldType>().is_err());
        assert!("(V)V".parse::<JavaMethodType>().is_err());
    }

    #[allow(non_snake_case)]
    #[test]
    fn parses_class_name_Object() {
        let result = JavaFieldType::parse_descriptor("Ljava/lang/Object;").unwrap();
        assert_eq!(&BaseType::Object("java/lang/Object".to_string()), result.base());
        assert_eq!(0, result.dimensions());
        assert_eq!("java/lang/Object", result.to_string());
    }

    #[test]
    fn parses_class_name_default_package() {
        let result = JavaFieldType::parse_descriptor("LClass;").unwrap();
        assert_eq!(JavaFieldType::object("Class"), result);
    }

    #[test]
    fn parses_array_array_bool() {
        let result = JavaFieldType::parse_descriptor("[[Z").unwrap();
        assert_eq!(
            JavaFieldType::array_of(BaseType::Primitive(PrimitiveValueType::Bool), 2),
            result
        );
        assert_eq!("boolean[][]", result.to_string());
    }

    #[test]
    fn parses_deep_object_array() {
        let result = JavaFieldType::parse_descriptor("[[[[Ljava/lang/String;").unwrap();
        assert_eq!(4, result.dimensions());
        assert_eq!("java/lang/String[][][][]", result.to_string());
    }

    #[test]
    fn rejects_too_many_dimensions() {
        let ok = format!("{}I", "[".repeat(MAX_ARRAY_DIMENSIONS));
        let too_deep = format!("{}I", "[".repeat(MAX_ARRAY_DIMENSIONS + 1));
        assert!(JavaFieldType::parse_descriptor(&ok).is_ok());
        assert!(JavaFieldType::parse_descriptor(&too_deep).is_err());
    }

    #[test]
    fn parses_func_thunk() {
        let result = JavaMethodType::parse_descriptor("()V").unwrap();
        assert!(result.arg_types().is_empty());
        assert_eq!(&ReturnType::Void, result.ret_type());
    }

    #[test]
    fn parses_array_arg_and_object_return() {
        let result = JavaMethodType::parse_descriptor("([[I)Ljava/lang/String;").unwrap();
        assert_eq!(
            &[JavaFieldType::array_of(
                BaseType::Primitive(PrimitiveValueType::Int),
                2
            )],
            result.arg_types()
        );
        assert_eq!(
            &ReturnType::Value(JavaFieldType::object("java/lang/String")),
            result.ret_type()
        );
        assert_eq!("java/lang/String(int[][])", result.to_string());
    }

    #[test]
    fn parses_mixed_arguments() {
        let result = JavaMethodType::parse_descriptor("(IJ[Ljava/lang/Object;D)[[B").unwrap();
        let rendered: Vec<String> = result.arg_types().iter().map(|t| t.to_string()).collect();
        assert_eq!(
            vec!["int", "long", "java/lang/Object[]", "double"],
            rendered
        );
        assert_eq!("byte[][]", result.ret_type().to_string());
    }

    #[test]
    fn rejects_malformed_descriptors() {
        for src in ["L;", "Ljava/lang/Object", "[", "Q", "II"] {
            assert!(
                matches!(
                    JavaFieldType::parse_descriptor(src),
                    Err(ClassParseError::InvalidDescriptor { .. })
                ),
                "{src} should be rejected"
            );
        }
        for src in ["(I", "I)V", "()", "()VV", "(L;)V"] {
            assert!(
                matches!(
                    JavaMethodType::parse_descriptor(src),
                    Err(ClassParseError::InvalidDescriptor { .. })
                ),
                "{src} should be rejected"
            );
        }
    }

    #[test]
    fn primitive_codes_match_newarray_atypes() {
        assert_eq!(Some(PrimitiveValueType::Int), PrimitiveValueType::try_from(10u8).ok());
        assert_eq!(Some(PrimitiveValueType::Bool), PrimitiveValueType::try_from(4u8).ok());
        assert!(PrimitiveValueType::try_from(3u8).is_err());
    }
}
