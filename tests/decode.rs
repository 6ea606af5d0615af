use java_class_reader::{
    render, BaseType, ClassAccessFlags, ClassParseError, Constant, ConstantValue, JavaAttribute,
    JavaClass, JavaFieldType, MethodAccessFlags, Opcode, Operand, PrimitiveValueType, RawClass,
    ReturnType,
};

/// Assembles a constant pool entry by entry, handing out the index of each.
struct Pool {
    bytes: Vec<u8>,
    next: u16,
}

impl Pool {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            next: 1,
        }
    }

    fn push(&mut self, entry: &[u8], width: u16) -> u16 {
        let idx = self.next;
        self.bytes.extend_from_slice(entry);
        self.next += width;
        idx
    }

    fn utf8(&mut self, s: &str) -> u16 {
        let mut entry = vec![0x01];
        entry.extend_from_slice(&(s.len() as u16).to_be_bytes());
        entry.extend_from_slice(s.as_bytes());
        self.push(&entry, 1)
    }

    fn with_index(&mut self, tag: u8, idx: u16) -> u16 {
        let mut entry = vec![tag];
        entry.extend_from_slice(&idx.to_be_bytes());
        self.push(&entry, 1)
    }

    fn with_indices(&mut self, tag: u8, a: u16, b: u16) -> u16 {
        let mut entry = vec![tag];
        entry.extend_from_slice(&a.to_be_bytes());
        entry.extend_from_slice(&b.to_be_bytes());
        self.push(&entry, 1)
    }

    fn class(&mut self, name: &str) -> u16 {
        let name_idx = self.utf8(name);
        self.with_index(0x07, name_idx)
    }

    fn string(&mut self, s: &str) -> u16 {
        let utf8_idx = self.utf8(s);
        self.with_index(0x08, utf8_idx)
    }

    fn integer(&mut self, i: i32) -> u16 {
        let mut entry = vec![0x03];
        entry.extend_from_slice(&i.to_be_bytes());
        self.push(&entry, 1)
    }

    fn long(&mut self, l: i64) -> u16 {
        let mut entry = vec![0x05];
        entry.extend_from_slice(&l.to_be_bytes());
        self.push(&entry, 2)
    }

    fn double(&mut self, d: f64) -> u16 {
        let mut entry = vec![0x06];
        entry.extend_from_slice(&d.to_be_bytes());
        self.push(&entry, 2)
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_idx = self.utf8(name);
        let descriptor_idx = self.utf8(descriptor);
        self.with_indices(0x0C, name_idx, descriptor_idx)
    }

    fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let owner_idx = self.class(owner);
        let nat_idx = self.name_and_type(name, descriptor);
        self.with_indices(0x09, owner_idx, nat_idx)
    }

    fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let owner_idx = self.class(owner);
        let nat_idx = self.name_and_type(name, descriptor);
        self.with_indices(0x0A, owner_idx, nat_idx)
    }
}

/// A field or method record.
struct Member {
    access_flags: u16,
    name_idx: u16,
    descriptor_idx: u16,
    attributes: Vec<(u16, Vec<u8>)>,
}

fn push_attributes(out: &mut Vec<u8>, attributes: &[(u16, Vec<u8>)]) {
    out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for (name_idx, info) in attributes {
        out.extend_from_slice(&name_idx.to_be_bytes());
        out.extend_from_slice(&(info.len() as u32).to_be_bytes());
        out.extend_from_slice(info);
    }
}

fn push_members(out: &mut Vec<u8>, members: &[Member]) {
    out.extend_from_slice(&(members.len() as u16).to_be_bytes());
    for member in members {
        out.extend_from_slice(&member.access_flags.to_be_bytes());
        out.extend_from_slice(&member.name_idx.to_be_bytes());
        out.extend_from_slice(&member.descriptor_idx.to_be_bytes());
        push_attributes(out, &member.attributes);
    }
}

struct ClassFile {
    pool: Pool,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    attributes: Vec<(u16, Vec<u8>)>,
}

impl ClassFile {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        out.extend_from_slice(&self.pool.next.to_be_bytes());
        out.extend_from_slice(&self.pool.bytes);
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for idx in &self.interfaces {
            out.extend_from_slice(&idx.to_be_bytes());
        }
        push_members(&mut out, &self.fields);
        push_members(&mut out, &self.methods);
        push_attributes(&mut out, &self.attributes);
        out
    }
}

/// The payload of a `Code` attribute with no exception handlers and no nested attributes.
fn code_info(max_stack: u16, max_locals: u16, code: &[u8]) -> Vec<u8> {
    let mut info = Vec::new();
    info.extend_from_slice(&max_stack.to_be_bytes());
    info.extend_from_slice(&max_locals.to_be_bytes());
    info.extend_from_slice(&(code.len() as u32).to_be_bytes());
    info.extend_from_slice(code);
    info.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    info
}

/// A public class with a single `public static void main(String[])` whose body is `code`.
fn main_class(mut pool: Pool, code: impl FnOnce(&mut Pool) -> Vec<u8>) -> ClassFile {
    let this_class = pool.class("Hello");
    let super_class = pool.class("java/lang/Object");
    let code_name = pool.utf8("Code");
    let main_name = pool.utf8("main");
    let main_descriptor = pool.utf8("([Ljava/lang/String;)V");
    let body = code(&mut pool);
    ClassFile {
        pool,
        access_flags: 0x0021,
        this_class,
        super_class,
        interfaces: vec![],
        fields: vec![],
        methods: vec![Member {
            access_flags: 0x0009,
            name_idx: main_name,
            descriptor_idx: main_descriptor,
            attributes: vec![(code_name, body)],
        }],
        attributes: vec![],
    }
}

fn hello_world() -> ClassFile {
    let mut class = main_class(Pool::new(), |pool| {
        let out = pool.field_ref("java/lang/System", "out", "Ljava/io/PrintStream;");
        let hello = pool.string("Hello, world");
        let println = pool.method_ref("java/io/PrintStream", "println", "(Ljava/lang/String;)V");
        let [out_hi, out_lo] = out.to_be_bytes();
        let [println_hi, println_lo] = println.to_be_bytes();
        let code = [
            0xB2, out_hi, out_lo, // getstatic
            0x12, hello as u8, // ldc
            0xB6, println_hi, println_lo, // invokevirtual
            0xB1, // return
        ];
        code_info(2, 1, &code)
    });
    let source_file_name = class.pool.utf8("SourceFile");
    let source_file = class.pool.utf8("Hello.java");
    class
        .attributes
        .push((source_file_name, source_file.to_be_bytes().to_vec()));
    class
}

#[test]
fn decodes_hello_world() -> Result<(), ClassParseError> {
    let class = JavaClass::read(&hello_world().to_bytes())?;
    assert_eq!("Hello", class.name());
    assert_eq!(Some("java/lang/Object"), class.super_name());
    assert_eq!(52, class.version().major_version());
    assert_eq!(
        ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
        class.access_flags()
    );
    assert_eq!(Some("Hello.java"), class.source_file());

    let main = &class.methods()[0];
    assert_eq!("main", main.name());
    assert_eq!(
        MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        main.access_flags()
    );
    assert_eq!(
        &[JavaFieldType::array_of(
            BaseType::Object("java/lang/String".to_string()),
            1
        )][..],
        main.descriptor().arg_types()
    );
    assert_eq!(&ReturnType::Void, main.descriptor().ret_type());

    let code = main.code().expect("main has a body");
    let instructions = code.instructions(class.constant_pool())?;
    let mnemonics = instructions
        .iter()
        .map(|instruction| instruction.mnemonic())
        .collect::<Vec<_>>();
    assert_eq!(vec!["GETSTATIC", "LDC", "INVOKEVIRTUAL", "RETURN"], mnemonics);
    assert_eq!(
        vec![0, 3, 5, 8],
        instructions.iter().map(|i| i.pc()).collect::<Vec<_>>()
    );
    match instructions[0].operands() {
        [Operand::Field(field)] => {
            assert_eq!("java/lang/System", field.owner());
            assert_eq!("out", field.name());
            assert_eq!(&JavaFieldType::object("java/io/PrintStream"), field.descriptor());
            assert_eq!(0, field.descriptor().dimensions());
        }
        other => panic!("Expected a field operand, found {:?}", other),
    }
    assert_eq!(
        &[Operand::Constant(Constant::String("Hello, world".to_string()))][..],
        instructions[1].operands()
    );
    match instructions[2].operands() {
        [Operand::Method(method)] => {
            assert_eq!("java/io/PrintStream", method.owner());
            assert_eq!("println", method.name());
            assert!(!method.is_interface_method());
        }
        other => panic!("Expected a method operand, found {:?}", other),
    }
    Ok(())
}

#[test]
fn return_only_body_yields_one_instruction() -> Result<(), ClassParseError> {
    let class = JavaClass::read(&main_class(Pool::new(), |_| code_info(0, 1, &[0xB1])).to_bytes())?;
    let code = class.methods()[0].code().expect("main has a body");
    assert_eq!(0, code.max_stack());
    assert_eq!(1, code.max_locals());
    let instructions = code
        .walk(class.constant_pool())
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(1, instructions.len());
    assert_eq!(Some(Opcode::Return), instructions[0].opcode());
    assert!(instructions[0].operands().is_empty());
    Ok(())
}

#[test]
fn unassigned_opcode_does_not_abort() -> Result<(), ClassParseError> {
    let class =
        JavaClass::read(&main_class(Pool::new(), |_| code_info(0, 1, &[0xFF, 0xB1])).to_bytes())?;
    let code = class.methods()[0].code().expect("main has a body");
    let instructions = code.instructions(class.constant_pool())?;
    assert_eq!(2, instructions.len());
    assert_eq!(None, instructions[0].opcode());
    assert_eq!(&[Operand::Opaque(0xFF)][..], instructions[0].operands());
    assert_eq!(1, instructions[1].pc());
    assert_eq!("RETURN", instructions[1].mnemonic());
    Ok(())
}

#[test]
fn short_code_array_is_truncated() {
    let bytes = main_class(Pool::new(), |_| {
        let mut info = vec![0x00, 0x00, 0x00, 0x01];
        info.extend_from_slice(&10u32.to_be_bytes());
        info.extend_from_slice(&[0xB1; 5]);
        info
    })
    .to_bytes();
    // The structure is intact; only the Code payload is short.
    assert!(RawClass::read(&bytes).is_ok());
    assert!(matches!(
        JavaClass::read(&bytes),
        Err(ClassParseError::TruncatedInput {
            requested: 10,
            available: 5,
            ..
        })
    ));
}

#[test]
fn boundary_indices_dangle() {
    let mut class = main_class(Pool::new(), |_| code_info(0, 1, &[0xB1]));
    class.this_class = 0;
    assert!(matches!(
        JavaClass::read(&class.to_bytes()),
        Err(ClassParseError::DanglingReference {
            index: 0,
            actual: None,
            ..
        })
    ));

    let mut class = main_class(Pool::new(), |_| code_info(0, 1, &[0xB1]));
    let past_end = class.pool.next;
    class.super_class = past_end;
    assert!(matches!(
        JavaClass::read(&class.to_bytes()),
        Err(ClassParseError::DanglingReference { index, actual: None, .. }) if index == past_end
    ));
}

#[test]
fn class_index_of_wrong_kind_dangles() {
    let mut class = main_class(Pool::new(), |_| code_info(0, 1, &[0xB1]));
    // Index 1 is the Utf8 "Hello", not the Class entry pointing at it.
    class.this_class = 1;
    assert!(matches!(
        JavaClass::read(&class.to_bytes()),
        Err(ClassParseError::DanglingReference {
            index: 1,
            actual: Some(java_class_reader::CPEntryType::Utf8),
            ..
        })
    ));
}

#[test]
fn decoding_is_deterministic() -> Result<(), ClassParseError> {
    let bytes = hello_world().to_bytes();
    assert_eq!(JavaClass::read(&bytes)?, JavaClass::read(&bytes)?);

    let raw = RawClass::read(&bytes)?;
    assert_eq!(raw, RawClass::read(&bytes)?);
    assert_eq!(JavaClass::link(raw.clone())?, JavaClass::link(raw)?);
    Ok(())
}

#[test]
fn wide_constants_shift_later_indices() -> Result<(), ClassParseError> {
    let mut pool = Pool::new();
    let long_idx = pool.long(1 << 40);
    let double_idx = pool.double(2.5);
    let int_idx = pool.integer(1);
    assert_eq!((1, 3, 5), (long_idx, double_idx, int_idx));

    let constant_value = pool.utf8("ConstantValue");
    let big_name = pool.utf8("BIG");
    let long_descriptor = pool.utf8("J");
    let debug_name = pool.utf8("DEBUG");
    let bool_descriptor = pool.utf8("Z");

    let mut class = main_class(pool, |_| code_info(0, 1, &[0xB1]));
    class.fields = vec![
        Member {
            access_flags: 0x0019,
            name_idx: big_name,
            descriptor_idx: long_descriptor,
            attributes: vec![(constant_value, long_idx.to_be_bytes().to_vec())],
        },
        Member {
            access_flags: 0x0019,
            name_idx: debug_name,
            descriptor_idx: bool_descriptor,
            attributes: vec![(constant_value, int_idx.to_be_bytes().to_vec())],
        },
    ];
    let linked = JavaClass::read(&class.to_bytes())?;
    assert_eq!("Hello", linked.name());
    assert_eq!(&Constant::Unusable, linked.constant_pool().get(2)?);
    assert_eq!(&Constant::Double(2.5), linked.constant_pool().get(3)?);
    assert_eq!(
        Some(&ConstantValue::Long(1 << 40)),
        linked.fields()[0].constant_value()
    );
    assert!(linked.fields()[1]
        .descriptor()
        .is_primitive(PrimitiveValueType::Bool));

    let lines = render::render_class(&linked)?;
    assert!(lines
        .iter()
        .any(|line| line == "    public static final boolean DEBUG = true;"));
    assert!(lines
        .iter()
        .any(|line| line == "    public static final long BIG = 1099511627776L;"));
    Ok(())
}

#[test]
fn unknown_attributes_are_preserved() -> Result<(), ClassParseError> {
    let mut class = main_class(Pool::new(), |_| code_info(0, 1, &[0xB1]));
    let name = class.pool.utf8("com.example.Custom");
    class.attributes.push((name, vec![1, 2, 3]));
    let linked = JavaClass::read(&class.to_bytes())?;
    assert_eq!(
        &[JavaAttribute::GenericAttribute {
            name: "com.example.Custom".to_string(),
            info: vec![1, 2, 3],
        }][..],
        linked.attributes()
    );
    Ok(())
}

#[test]
fn object_has_no_superclass() -> Result<(), ClassParseError> {
    let mut class = main_class(Pool::new(), |_| code_info(0, 1, &[0xB1]));
    class.super_class = 0;
    let linked = JavaClass::read(&class.to_bytes())?;
    assert_eq!(None, linked.super_name());
    let lines = render::render_class(&linked)?;
    assert!(lines.iter().any(|line| line == "public class Hello {"));
    Ok(())
}

#[test]
fn renders_listing() -> Result<(), ClassParseError> {
    let mut class = hello_world();
    let runnable = class.pool.class("java/lang/Runnable");
    let closeable = class.pool.class("java/io/Closeable");
    class.interfaces = vec![runnable, closeable];
    let linked = JavaClass::read(&class.to_bytes())?;
    let lines = render::render_class(&linked)?;
    assert_eq!("// Class Version: 8", lines[1]);
    assert_eq!("// Source File: Hello.java", lines[2]);
    assert_eq!(
        "public class Hello implements java/lang/Runnable, java/io/Closeable {",
        lines[3]
    );
    assert_eq!(
        vec![
            "",
            "    public static void main(java/lang/String[]) {",
            "           0: GETSTATIC java/lang/System.out : java/io/PrintStream",
            "           3: LDC \"Hello, world\"",
            "           5: INVOKEVIRTUAL java/io/PrintStream.println(java/lang/String) : void",
            "           8: RETURN",
            "    }",
            "}",
        ],
        lines[4..]
    );
    Ok(())
}

#[test]
fn rejects_bad_magic() {
    let mut bytes = hello_world().to_bytes();
    bytes[3] = 0xBF;
    assert_eq!(
        Err(ClassParseError::InvalidMagicNumber {
            actual: 0xCAFE_BABF
        }),
        JavaClass::read(&bytes)
    );
}

#[test]
fn exception_handler_names_caught_class() -> Result<(), ClassParseError> {
    let mut exception_idx = 0;
    let class = main_class(Pool::new(), |pool| {
        exception_idx = pool.class("java/lang/Exception");
        let mut info = vec![0x00, 0x01, 0x00, 0x01];
        info.extend_from_slice(&2u32.to_be_bytes());
        info.extend_from_slice(&[0x00, 0xB1]); // nop, return
        info.extend_from_slice(&2u16.to_be_bytes());
        for catch_type in [exception_idx, 0] {
            for field in [0u16, 1, 1, catch_type] {
                info.extend_from_slice(&field.to_be_bytes());
            }
        }
        info.extend_from_slice(&[0x00, 0x00]);
        info
    });
    let linked = JavaClass::read(&class.to_bytes())?;
    let handlers = linked.methods()[0]
        .code()
        .expect("main has a body")
        .exception_handlers();
    assert_eq!(2, handlers.len());
    let handler = &handlers[0];
    assert_eq!(
        (0, 1, 1),
        (handler.start_pc(), handler.end_pc(), handler.handler_pc())
    );
    assert_eq!(exception_idx, handlers[0].catch_type_idx());
    assert_eq!(Some("java/lang/Exception"), handlers[0].catch_type());
    assert_eq!(0, handlers[1].catch_type_idx());
    assert_eq!(None, handlers[1].catch_type());
    Ok(())
}
