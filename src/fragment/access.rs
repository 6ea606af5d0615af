//! Access and property flags of classes, fields, and methods. Bits the class file format leaves
//! reserved are dropped on decode.

use bitflags::bitflags;

bitflags! {
    /// The `access_flags` of a class or interface.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct ClassAccessFlags: u16 {
        /// Declared `public`; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared `final`; no subclasses allowed.
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked by `invokespecial`.
        const SUPER = 0x0020;
        /// Is an interface, not a class.
        const INTERFACE = 0x0200;
        /// Declared `abstract`; must not be instantiated.
        const ABSTRACT = 0x0400;
        /// Not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface.
        const ANNOTATION = 0x2000;
        /// Declared as an enum class.
        const ENUM = 0x4000;
        /// Is a module, not a class or interface.
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// The `access_flags` of a field.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        /// Cannot be cached.
        const VOLATILE = 0x0040;
        /// Not written or read by a persistent object manager.
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        /// Declared as an element of an enum class.
        const ENUM = 0x4000;
    }
}

bitflags! {
    /// The `access_flags` of a method.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        /// Invocation is wrapped by a monitor use.
        const SYNCHRONIZED = 0x0020;
        /// A bridge method, generated by the compiler.
        const BRIDGE = 0x0040;
        /// Declared with variable number of arguments.
        const VARARGS = 0x0080;
        /// Implemented in a language other than Java.
        const NATIVE = 0x0100;
        /// No implementation is provided.
        const ABSTRACT = 0x0400;
        /// Floating-point mode is FP-strict.
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

/// Java source keywords for `flags`, in the order the language conventionally writes them.
pub fn class_keywords(flags: ClassAccessFlags) -> Vec<&'static str> {
    let mut ret = Vec::new();
    if flags.contains(ClassAccessFlags::PUBLIC) {
        ret.push("public");
    }
    // Interfaces are implicitly abstract.
    if flags.contains(ClassAccessFlags::ABSTRACT) && !flags.contains(ClassAccessFlags::INTERFACE) {
        ret.push("abstract");
    }
    if flags.contains(ClassAccessFlags::FINAL) {
        ret.push("final");
    }
    if flags.contains(ClassAccessFlags::SYNTHETIC) {
        ret.push("/* synthetic */");
    }
    ret.push(if flags.contains(ClassAccessFlags::ANNOTATION) {
        "@interface"
    } else if flags.contains(ClassAccessFlags::INTERFACE) {
        "interface"
    } else if flags.contains(ClassAccessFlags::ENUM) {
        "enum"
    } else if flags.contains(ClassAccessFlags::MODULE) {
        "module"
    } else {
        "class"
    });
    ret
}

/// Java source keywords for `flags`, in the order the language conventionally writes them.
pub fn field_keywords(flags: FieldAccessFlags) -> Vec<&'static str> {
    [
        (FieldAccessFlags::PUBLIC, "public"),
        (FieldAccessFlags::PROTECTED, "protected"),
        (FieldAccessFlags::PRIVATE, "private"),
        (FieldAccessFlags::STATIC, "static"),
        (FieldAccessFlags::FINAL, "final"),
        (FieldAccessFlags::TRANSIENT, "transient"),
        (FieldAccessFlags::VOLATILE, "volatile"),
        (FieldAccessFlags::SYNTHETIC, "/* synthetic */"),
        (FieldAccessFlags::ENUM, "/* enum */"),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, keyword)| keyword)
    .collect()
}

/// Java source keywords for `flags`, in the order the language conventionally writes them.
pub fn method_keywords(flags: MethodAccessFlags) -> Vec<&'static str> {
    [
        (MethodAccessFlags::PUBLIC, "public"),
        (MethodAccessFlags::PROTECTED, "protected"),
        (MethodAccessFlags::PRIVATE, "private"),
        (MethodAccessFlags::ABSTRACT, "abstract"),
        (MethodAccessFlags::STATIC, "static"),
        (MethodAccessFlags::FINAL, "final"),
        (MethodAccessFlags::SYNCHRONIZED, "synchronized"),
        (MethodAccessFlags::NATIVE, "native"),
        (MethodAccessFlags::STRICT, "strictfp"),
        (MethodAccessFlags::BRIDGE, "/* bridge */"),
        (MethodAccessFlags::VARARGS, "/* varargs */"),
        (MethodAccessFlags::SYNTHETIC, "/* synthetic */"),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, keyword)| keyword)
    .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reserved_bits_are_dropped() {
        let flags = ClassAccessFlags::from_bits_truncate(0x0021 | 0x0002);
        assert_eq!(ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER, flags);
    }

    #[test]
    fn static_is_kept_for_members() {
        assert!(FieldAccessFlags::from_bits_truncate(0x0008).contains(FieldAccessFlags::STATIC));
        assert!(MethodAccessFlags::from_bits_truncate(0x0009).contains(MethodAccessFlags::STATIC));
    }

    #[test]
    fn keyword_order() {
        assert_eq!(
            vec!["public", "static", "final"],
            field_keywords(FieldAccessFlags::from_bits_truncate(0x0019))
        );
        assert_eq!(
            vec!["public", "abstract", "/* varargs */"],
            method_keywords(MethodAccessFlags::from_bits_truncate(0x0481))
        );
        assert_eq!(
            vec!["public", "interface"],
            class_keywords(ClassAccessFlags::from_bits_truncate(0x0601))
        );
        assert_eq!(
            vec!["public", "class"],
            class_keywords(ClassAccessFlags::from_bits_truncate(0x0021))
        );
    }
}
