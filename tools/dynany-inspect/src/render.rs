// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Text rendering of a dynamic value tree.
//!
//! Values are walked with their own cursor (rewind, current component,
//! next) rather than decoded in one piece, so the output shows exactly what
//! the component handles hold.

use anyhow::{anyhow, Result};
use dynany::{DynAny, TypeKind};
use std::fmt::Write;

const INDENT: &str = "  ";

/// Render `value` as an indented tree, one component per line.
pub fn render(value: &DynAny) -> Result<String> {
    let mut out = String::new();
    let type_desc = value.type_desc()?;
    let name = if type_desc.name.is_empty() {
        value.kind()?.to_string()
    } else {
        type_desc.name.clone()
    };
    write!(out, "{name}")?;
    render_node(&mut out, value, 0)?;
    out.push('\n');
    Ok(out)
}

/// Lowercase hex, 16 bytes per line.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(16)
        .map(|line| {
            line.iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse hex text, ignoring whitespace.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(anyhow!("odd number of hex digits"));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair)?;
            u8::from_str_radix(pair, 16).map_err(|_| anyhow!("bad hex byte {pair:?}"))
        })
        .collect()
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn render_node(out: &mut String, value: &DynAny, depth: usize) -> Result<()> {
    let type_desc = value.type_desc()?;
    let real = type_desc
        .resolved()
        .ok_or_else(|| anyhow!("unresolved type {}", type_desc.name))?;

    match &real.kind {
        TypeKind::Primitive(_) => write!(out, " = {}", value.get_value()?)?,
        TypeKind::Enum(_) => write!(out, " = {}", value.get_as_string()?)?,
        TypeKind::Struct(_) | TypeKind::Exception(_) => render_members(out, value, depth)?,
        TypeKind::ValueType(_) => {
            if value.is_null()? {
                out.push_str(" = null");
            } else {
                render_members(out, value, depth)?;
            }
        }
        TypeKind::ValueBox(_) => {
            if value.is_null()? {
                out.push_str(" = null");
            } else {
                let boxed = value.get_boxed_value_as_dyn_any()?;
                newline(out, depth + 1);
                out.push_str("boxed");
                render_node(out, &boxed, depth + 1)?;
            }
        }
        TypeKind::Sequence(_) | TypeKind::Array(_) => {
            write!(out, " [{}]", value.component_count()?)?;
            render_elements(out, value, depth)?;
        }
        TypeKind::Union(_) => {
            let discriminator = value.get_discriminator()?;
            newline(out, depth + 1);
            out.push_str("discriminator");
            render_node(out, &discriminator, depth + 1)?;
            if !value.has_no_active_member()? {
                let name = value.member_name()?;
                let member = value.member()?;
                newline(out, depth + 1);
                out.push_str(&name);
                render_node(out, &member, depth + 1)?;
            }
        }
        TypeKind::Alias(_) | TypeKind::Recursive(_) => {
            return Err(anyhow!("{} did not resolve", type_desc.name));
        }
    }
    Ok(())
}

fn render_members(out: &mut String, value: &DynAny, depth: usize) -> Result<()> {
    if value.component_count()? == 0 {
        return Ok(());
    }
    value.rewind()?;
    loop {
        let name = value.current_member_name()?;
        if let Some(member) = value.current_component()? {
            newline(out, depth + 1);
            out.push_str(&name);
            render_node(out, &member, depth + 1)?;
        }
        if !value.next()? {
            break;
        }
    }
    value.rewind()?;
    Ok(())
}

fn render_elements(out: &mut String, value: &DynAny, depth: usize) -> Result<()> {
    if value.component_count()? == 0 {
        return Ok(());
    }
    value.rewind()?;
    let mut index = 0usize;
    loop {
        if let Some(element) = value.current_component()? {
            newline(out, depth + 1);
            write!(out, "[{index}]")?;
            render_node(out, &element, depth + 1)?;
        }
        index += 1;
        if !value.next()? {
            break;
        }
    }
    value.rewind()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRegistry;
    use dynany::{Any, DynAnyFactory, Value};

    const TYPES: &str = r#"{ "types": [
        { "kind": "enum", "name": "Color", "members": ["Red", "Green"] },
        { "kind": "struct", "name": "Pixel", "fields": [
            { "name": "x", "type": "short" },
            { "name": "color", "type": "Color" },
            { "name": "tags", "type": "sequence<string>" } ] },
        { "kind": "valuebox", "name": "Note", "boxed": "string" }
    ] }"#;

    #[test]
    fn test_render_struct_tree() {
        let registry = TypeRegistry::from_json(TYPES).expect("types");
        let pixel = registry.get("Pixel").expect("pixel");
        let value = Value::Struct(vec![
            Value::I16(-3),
            Value::Enum(1),
            Value::Sequence(vec![Value::String("hot".into())]),
        ]);
        let any = Any::new(pixel, &value).expect("encode");
        let dyn_any = DynAnyFactory::new()
            .create_from_any(&any, false)
            .expect("create");

        let text = render(&dyn_any).expect("render");
        assert_eq!(
            text,
            "Pixel\n  x = -3\n  color = Green\n  tags [1]\n    [0] = \"hot\"\n"
        );
    }

    #[test]
    fn test_render_null_box() {
        let registry = TypeRegistry::from_json(TYPES).expect("types");
        let note = registry.get("Note").expect("note");
        let dyn_any = DynAnyFactory::new()
            .create_from_type(&note)
            .expect("create");
        assert_eq!(render(&dyn_any).expect("render"), "Note = null\n");
    }

    #[test]
    fn test_hex_roundtrip() {
        let bytes: Vec<u8> = (0u8..20).collect();
        let dump = hex_dump(&bytes);
        assert_eq!(dump.lines().count(), 2);
        assert_eq!(parse_hex(&dump).expect("parse"), bytes);
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }
}
