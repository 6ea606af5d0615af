//! Formatting of a linked class as an approximate Java source listing, with each method body
//! shown as one instruction per line.

use crate::{
    fragment::{
        access::{self, ClassAccessFlags},
        JavaClass, JavaField, JavaMethod,
    },
    CrateResult,
};

const INDENT: &str = "    ";

/// Join `keywords` and `rest` with single spaces, skipping empty keyword lists.
fn declaration(keywords: &[&str], rest: &str) -> String {
    let mut ret = keywords.join(" ");
    if !ret.is_empty() {
        ret.push(' ');
    }
    ret.push_str(rest);
    ret
}

fn class_header(class: &JavaClass) -> String {
    let flags = class.access_flags();
    let mut line = declaration(&access::class_keywords(flags), class.name());
    let is_interface = flags.contains(ClassAccessFlags::INTERFACE);
    if let Some(super_name) = class.super_name() {
        if super_name != "java/lang/Object" {
            line.push_str(" extends ");
            line.push_str(super_name);
        }
    }
    if !class.interfaces().is_empty() {
        // An interface's superinterfaces are written with `extends`.
        line.push_str(if is_interface {
            " extends "
        } else {
            " implements "
        });
        line.push_str(&class.interfaces().join(", "));
    }
    line.push_str(" {");
    line
}

fn field_line(field: &JavaField) -> String {
    let mut line = declaration(
        &access::field_keywords(field.access_flags()),
        &format!("{} {}", field.descriptor(), field.name()),
    );
    if let Some(value) = field.constant_value() {
        line.push_str(" = ");
        line.push_str(&value.to_literal(field.descriptor()));
    }
    line.push(';');
    format!("{INDENT}{line}")
}

fn method_lines(
    class: &JavaClass,
    method: &JavaMethod,
    lines: &mut Vec<String>,
) -> CrateResult<()> {
    let descriptor = method.descriptor();
    let args = descriptor
        .arg_types()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let signature = format!("{} {}({args})", descriptor.ret_type(), method.name());
    let header = declaration(&access::method_keywords(method.access_flags()), &signature);
    match method.code() {
        Some(code) => {
            lines.push(format!("{INDENT}{header} {{"));
            for instruction in code.instructions(class.constant_pool())? {
                lines.push(format!(
                    "{INDENT}{INDENT}{:>4}: {instruction}",
                    instruction.pc()
                ));
            }
            lines.push(format!("{INDENT}}}"));
        }
        None => lines.push(format!("{INDENT}{header};")),
    }
    Ok(())
}

/// Render `class` as a sequence of lines. Fails without producing any output if a method body
/// cannot be decoded.
pub fn render_class(class: &JavaClass) -> CrateResult<Vec<String>> {
    let mut lines = vec![
        format!(
            "// Decoded with {} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
        format!("// Class Version: {}", class.version().java_release()),
    ];
    if let Some(source_file) = class.source_file() {
        lines.push(format!("// Source File: {source_file}"));
    }
    lines.push(class_header(class));

    if !class.fields().is_empty() {
        lines.push(String::new());
        lines.extend(class.fields().iter().map(field_line));
    }

    for method in class.methods() {
        lines.push(String::new());
        method_lines(class, method, &mut lines)?;
    }

    lines.push("}".to_string());
    Ok(lines)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn declarations() {
        assert_eq!("int x", declaration(&[], "int x"));
        assert_eq!(
            "public static void main(java/lang/String[])",
            declaration(&["public", "static"], "void main(java/lang/String[])")
        );
    }
}
