use num_enum::{IntoPrimitive, TryFromPrimitive};

use std::fmt::{self, Display, Formatter};

/// The shape of the operand bytes following an opcode and how they are resolved.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OperandKind {
    None,
    /// One signed byte pushed as an `int`.
    ImmediateI8,
    /// Two signed bytes pushed as an `int`.
    ImmediateI16,
    /// One unsigned byte naming a local variable.
    LocalU8,
    /// One unsigned byte indexing a loadable constant.
    ConstantU8,
    /// Two bytes indexing a loadable constant.
    ConstantU16,
    /// Two bytes indexing a `Fieldref`.
    Field,
    /// Two bytes indexing a `Methodref` or `InterfaceMethodref`.
    Method,
    /// Two bytes indexing an `InterfaceMethodref`, an argument count, and a zero byte.
    InterfaceMethod,
    /// Two bytes indexing an `InvokeDynamic` followed by two zero bytes.
    InvokeDynamic,
    /// Two bytes indexing a `Class`.
    Class,
    /// Two bytes indexing a `Class` and one byte of dimension count.
    MultiANewArray,
    /// One byte naming a primitive array element type.
    ArrayType,
    /// A signed 2-byte offset relative to the opcode.
    Branch16,
    /// A signed 4-byte offset relative to the opcode.
    Branch32,
    /// One byte of local variable and one signed byte of increment.
    Iinc,
    TableSwitch,
    LookupSwitch,
    /// Another opcode whose local variable index (and `iinc` increment) is widened to two bytes.
    Wide,
}

/// The dispatch record for one opcode.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    pub operands: OperandKind,
}

macro_rules! opcodes {
    ($($name:ident = $byte:literal, $mnemonic:literal, $operands:ident;)*) => {
        /// Every opcode the JVM assigns, `0x00` through `0xC9`.
        #[repr(u8)]
        #[derive(Clone, Copy, Debug, Eq, Hash, IntoPrimitive, PartialEq, TryFromPrimitive)]
        pub enum Opcode {
            $($name = $byte,)*
        }

        impl Opcode {
            /// Look up the mnemonic and operand layout of `self`.
            pub const fn info(self) -> OpcodeInfo {
                match self {
                    $(Self::$name => OpcodeInfo {
                        mnemonic: $mnemonic,
                        operands: OperandKind::$operands,
                    },)*
                }
            }
        }
    };
}

opcodes! {
    Nop = 0x00, "NOP", None;
    AconstNull = 0x01, "ACONST_NULL", None;
    IconstM1 = 0x02, "ICONST_M1", None;
    Iconst0 = 0x03, "ICONST_0", None;
    Iconst1 = 0x04, "ICONST_1", None;
    Iconst2 = 0x05, "ICONST_2", None;
    Iconst3 = 0x06, "ICONST_3", None;
    Iconst4 = 0x07, "ICONST_4", None;
    Iconst5 = 0x08, "ICONST_5", None;
    Lconst0 = 0x09, "LCONST_0", None;
    Lconst1 = 0x0A, "LCONST_1", None;
    Fconst0 = 0x0B, "FCONST_0", None;
    Fconst1 = 0x0C, "FCONST_1", None;
    Fconst2 = 0x0D, "FCONST_2", None;
    Dconst0 = 0x0E, "DCONST_0", None;
    Dconst1 = 0x0F, "DCONST_1", None;
    Bipush = 0x10, "BIPUSH", ImmediateI8;
    Sipush = 0x11, "SIPUSH", ImmediateI16;
    Ldc = 0x12, "LDC", ConstantU8;
    LdcW = 0x13, "LDC_W", ConstantU16;
    Ldc2W = 0x14, "LDC2_W", ConstantU16;
    Iload = 0x15, "ILOAD", LocalU8;
    Lload = 0x16, "LLOAD", LocalU8;
    Fload = 0x17, "FLOAD", LocalU8;
    Dload = 0x18, "DLOAD", LocalU8;
    Aload = 0x19, "ALOAD", LocalU8;
    Iload0 = 0x1A, "ILOAD_0", None;
    Iload1 = 0x1B, "ILOAD_1", None;
    Iload2 = 0x1C, "ILOAD_2", None;
    Iload3 = 0x1D, "ILOAD_3", None;
    Lload0 = 0x1E, "LLOAD_0", None;
    Lload1 = 0x1F, "LLOAD_1", None;
    Lload2 = 0x20, "LLOAD_2", None;
    Lload3 = 0x21, "LLOAD_3", None;
    Fload0 = 0x22, "FLOAD_0", None;
    Fload1 = 0x23, "FLOAD_1", None;
    Fload2 = 0x24, "FLOAD_2", None;
    Fload3 = 0x25, "FLOAD_3", None;
    Dload0 = 0x26, "DLOAD_0", None;
    Dload1 = 0x27, "DLOAD_1", None;
    Dload2 = 0x28, "DLOAD_2", None;
    Dload3 = 0x29, "DLOAD_3", None;
    Aload0 = 0x2A, "ALOAD_0", None;
    Aload1 = 0x2B, "ALOAD_1", None;
    Aload2 = 0x2C, "ALOAD_2", None;
    Aload3 = 0x2D, "ALOAD_3", None;
    Iaload = 0x2E, "IALOAD", None;
    Laload = 0x2F, "LALOAD", None;
    Faload = 0x30, "FALOAD", None;
    Daload = 0x31, "DALOAD", None;
    Aaload = 0x32, "AALOAD", None;
    Baload = 0x33, "BALOAD", None;
    Caload = 0x34, "CALOAD", None;
    Saload = 0x35, "SALOAD", None;
    Istore = 0x36, "ISTORE", LocalU8;
    Lstore = 0x37, "LSTORE", LocalU8;
    Fstore = 0x38, "FSTORE", LocalU8;
    Dstore = 0x39, "DSTORE", LocalU8;
    Astore = 0x3A, "ASTORE", LocalU8;
    Istore0 = 0x3B, "ISTORE_0", None;
    Istore1 = 0x3C, "ISTORE_1", None;
    Istore2 = 0x3D, "ISTORE_2", None;
    Istore3 = 0x3E, "ISTORE_3", None;
    Lstore0 = 0x3F, "LSTORE_0", None;
    Lstore1 = 0x40, "LSTORE_1", None;
    Lstore2 = 0x41, "LSTORE_2", None;
    Lstore3 = 0x42, "LSTORE_3", None;
    Fstore0 = 0x43, "FSTORE_0", None;
    Fstore1 = 0x44, "FSTORE_1", None;
    Fstore2 = 0x45, "FSTORE_2", None;
    Fstore3 = 0x46, "FSTORE_3", None;
    Dstore0 = 0x47, "DSTORE_0", None;
    Dstore1 = 0x48, "DSTORE_1", None;
    Dstore2 = 0x49, "DSTORE_2", None;
    Dstore3 = 0x4A, "DSTORE_3", None;
    Astore0 = 0x4B, "ASTORE_0", None;
    Astore1 = 0x4C, "ASTORE_1", None;
    Astore2 = 0x4D, "ASTORE_2", None;
    Astore3 = 0x4E, "ASTORE_3", None;
    Iastore = 0x4F, "IASTORE", None;
    Lastore = 0x50, "LASTORE", None;
    Fastore = 0x51, "FASTORE", None;
    Dastore = 0x52, "DASTORE", None;
    Aastore = 0x53, "AASTORE", None;
    Bastore = 0x54, "BASTORE", None;
    Castore = 0x55, "CASTORE", None;
    Sastore = 0x56, "SASTORE", None;
    Pop = 0x57, "POP", None;
    Pop2 = 0x58, "POP2", None;
    Dup = 0x59, "DUP", None;
    DupX1 = 0x5A, "DUP_X1", None;
    DupX2 = 0x5B, "DUP_X2", None;
    Dup2 = 0x5C, "DUP2", None;
    Dup2X1 = 0x5D, "DUP2_X1", None;
    Dup2X2 = 0x5E, "DUP2_X2", None;
    Swap = 0x5F, "SWAP", None;
    Iadd = 0x60, "IADD", None;
    Ladd = 0x61, "LADD", None;
    Fadd = 0x62, "FADD", None;
    Dadd = 0x63, "DADD", None;
    Isub = 0x64, "ISUB", None;
    Lsub = 0x65, "LSUB", None;
    Fsub = 0x66, "FSUB", None;
    Dsub = 0x67, "DSUB", None;
    Imul = 0x68, "IMUL", None;
    Lmul = 0x69, "LMUL", None;
    Fmul = 0x6A, "FMUL", None;
    Dmul = 0x6B, "DMUL", None;
    Idiv = 0x6C, "IDIV", None;
    Ldiv = 0x6D, "LDIV", None;
    Fdiv = 0x6E, "FDIV", None;
    Ddiv = 0x6F, "DDIV", None;
    Irem = 0x70, "IREM", None;
    Lrem = 0x71, "LREM", None;
    Frem = 0x72, "FREM", None;
    Drem = 0x73, "DREM", None;
    Ineg = 0x74, "INEG", None;
    Lneg = 0x75, "LNEG", None;
    Fneg = 0x76, "FNEG", None;
    Dneg = 0x77, "DNEG", None;
    Ishl = 0x78, "ISHL", None;
    Lshl = 0x79, "LSHL", None;
    Ishr = 0x7A, "ISHR", None;
    Lshr = 0x7B, "LSHR", None;
    Iushr = 0x7C, "IUSHR", None;
    Lushr = 0x7D, "LUSHR", None;
    Iand = 0x7E, "IAND", None;
    Land = 0x7F, "LAND", None;
    Ior = 0x80, "IOR", None;
    Lor = 0x81, "LOR", None;
    Ixor = 0x82, "IXOR", None;
    Lxor = 0x83, "LXOR", None;
    Iinc = 0x84, "IINC", Iinc;
    I2l = 0x85, "I2L", None;
    I2f = 0x86, "I2F", None;
    I2d = 0x87, "I2D", None;
    L2i = 0x88, "L2I", None;
    L2f = 0x89, "L2F", None;
    L2d = 0x8A, "L2D", None;
    F2i = 0x8B, "F2I", None;
    F2l = 0x8C, "F2L", None;
    F2d = 0x8D, "F2D", None;
    D2i = 0x8E, "D2I", None;
    D2l = 0x8F, "D2L", None;
    D2f = 0x90, "D2F", None;
    I2b = 0x91, "I2B", None;
    I2c = 0x92, "I2C", None;
    I2s = 0x93, "I2S", None;
    Lcmp = 0x94, "LCMP", None;
    Fcmpl = 0x95, "FCMPL", None;
    Fcmpg = 0x96, "FCMPG", None;
    Dcmpl = 0x97, "DCMPL", None;
    Dcmpg = 0x98, "DCMPG", None;
    Ifeq = 0x99, "IFEQ", Branch16;
    Ifne = 0x9A, "IFNE", Branch16;
    Iflt = 0x9B, "IFLT", Branch16;
    Ifge = 0x9C, "IFGE", Branch16;
    Ifgt = 0x9D, "IFGT", Branch16;
    Ifle = 0x9E, "IFLE", Branch16;
    IfIcmpeq = 0x9F, "IF_ICMPEQ", Branch16;
    IfIcmpne = 0xA0, "IF_ICMPNE", Branch16;
    IfIcmplt = 0xA1, "IF_ICMPLT", Branch16;
    IfIcmpge = 0xA2, "IF_ICMPGE", Branch16;
    IfIcmpgt = 0xA3, "IF_ICMPGT", Branch16;
    IfIcmple = 0xA4, "IF_ICMPLE", Branch16;
    IfAcmpeq = 0xA5, "IF_ACMPEQ", Branch16;
    IfAcmpne = 0xA6, "IF_ACMPNE", Branch16;
    Goto = 0xA7, "GOTO", Branch16;
    Jsr = 0xA8, "JSR", Branch16;
    Ret = 0xA9, "RET", LocalU8;
    Tableswitch = 0xAA, "TABLESWITCH", TableSwitch;
    Lookupswitch = 0xAB, "LOOKUPSWITCH", LookupSwitch;
    Ireturn = 0xAC, "IRETURN", None;
    Lreturn = 0xAD, "LRETURN", None;
    Freturn = 0xAE, "FRETURN", None;
    Dreturn = 0xAF, "DRETURN", None;
    Areturn = 0xB0, "ARETURN", None;
    Return = 0xB1, "RETURN", None;
    Getstatic = 0xB2, "GETSTATIC", Field;
    Putstatic = 0xB3, "PUTSTATIC", Field;
    Getfield = 0xB4, "GETFIELD", Field;
    Putfield = 0xB5, "PUTFIELD", Field;
    Invokevirtual = 0xB6, "INVOKEVIRTUAL", Method;
    Invokespecial = 0xB7, "INVOKESPECIAL", Method;
    Invokestatic = 0xB8, "INVOKESTATIC", Method;
    Invokeinterface = 0xB9, "INVOKEINTERFACE", InterfaceMethod;
    Invokedynamic = 0xBA, "INVOKEDYNAMIC", InvokeDynamic;
    New = 0xBB, "NEW", Class;
    Newarray = 0xBC, "NEWARRAY", ArrayType;
    Anewarray = 0xBD, "ANEWARRAY", Class;
    Arraylength = 0xBE, "ARRAYLENGTH", None;
    Athrow = 0xBF, "ATHROW", None;
    Checkcast = 0xC0, "CHECKCAST", Class;
    Instanceof = 0xC1, "INSTANCEOF", Class;
    Monitorenter = 0xC2, "MONITORENTER", None;
    Monitorexit = 0xC3, "MONITOREXIT", None;
    Wide = 0xC4, "WIDE", Wide;
    Multianewarray = 0xC5, "MULTIANEWARRAY", MultiANewArray;
    Ifnull = 0xC6, "IFNULL", Branch16;
    Ifnonnull = 0xC7, "IFNONNULL", Branch16;
    GotoW = 0xC8, "GOTO_W", Branch32;
    JsrW = 0xC9, "JSR_W", Branch32;
}

impl Opcode {
    pub const fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }

    /// True iff `wide` may modify this opcode.
    pub fn is_widenable(self) -> bool {
        matches!(
            self,
            Self::Iload
                | Self::Lload
                | Self::Fload
                | Self::Dload
                | Self::Aload
                | Self::Istore
                | Self::Lstore
                | Self::Fstore
                | Self::Dstore
                | Self::Astore
                | Self::Ret
                | Self::Iinc
        )
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
