/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * This file is part of the Ark Sovereign Compiler.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 *
 * 1. OPEN SOURCE: You may use this file under the terms of the GNU Affero
 * General Public License v3.0. If you link to this code, your ENTIRE
 * application must be open-sourced under AGPLv3.
 *
 * 2. COMMERCIAL: For proprietary use, you must obtain a Commercial License
 * from Sovereign Systems.
 *
 * PATENT NOTICE: Protected by US Patent App #63/935,467.
 * NO IMPLIED LICENSE to rights of Mohamad Al-Zawahreh or Sovereign Systems.
 */

//! C source synthesis for a compiled function.
//!
//! The translation unit holds two functions:
//!
//! - `xasm_body`, whose parameters are the role-ordered variables and whose
//!   body is one `__asm__` block. Every variable is bound as a register
//!   output (`"=r"`) and tied back as an input (`"<index>"`) so the register
//!   holds the current value when the block starts.
//!   Registers the instructions name or use implicitly, plus the flags, are
//!   listed as clobbers so no variable is allocated to them.
//! - `xasm_entry(void ** args)`, the fixed-name entry point. It unpacks one
//!   storage pointer per parameter and forwards to `xasm_body`.

use crate::instruction::{InstructionInstance, Label};
use crate::types::{DataType, NativeType};
use crate::variable::{Role, Variable};
use std::fmt::Write;

pub const BODY_SYMBOL: &str = "xasm_body";
pub const ENTRY_SYMBOL: &str = "xasm_entry";

/// A variable together with the role it was registered under. The slot is
/// the binding's position in the role-ordered list.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub variable: Variable,
    pub role: Role,
}

impl Binding {
    /// Output scalars are reached through their pointer.
    fn lvalue(&self) -> String {
        let by_pointer = self.role == Role::Output && !self.is_array();
        if by_pointer {
            format!("*{}", self.variable.symbol())
        } else {
            self.variable.symbol()
        }
    }

    fn is_array(&self) -> bool {
        matches!(self.variable.data_type(), DataType::Array(_))
    }

    fn declaration(&self) -> String {
        self.variable
            .data_type()
            .definition(&self.variable.symbol(), self.role == Role::Output)
    }
}

fn c_string(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render the full translation unit.
pub fn synthesize(
    instructions: &[InstructionInstance],
    labels: &[Label],
    bindings: &[Binding],
    signature: &[NativeType],
) -> String {
    let mut source = String::new();
    source.push_str(&body_function(instructions, labels, bindings));
    source.push('\n');
    source.push_str(&entry_function(signature));
    source
}

fn body_function(
    instructions: &[InstructionInstance],
    labels: &[Label],
    bindings: &[Binding],
) -> String {
    let params = if bindings.is_empty() {
        "void".to_string()
    } else {
        bindings
            .iter()
            .map(Binding::declaration)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut source = String::new();
    // Emitted once: the labels inside the block must not be duplicated by inlining.
    let _ = writeln!(
        source,
        "static __attribute__((noinline)) void {}({}) {{",
        BODY_SYMBOL, params
    );
    source.push_str("    __asm__ __volatile__ (\n");

    let mut lines: Vec<String> = instructions.iter().map(|i| c_string(&i.render())).collect();
    lines.extend(labels.iter().map(|l| c_string(&l.render())));
    if lines.is_empty() {
        lines.push(c_string(""));
    }
    for line in &lines {
        let _ = writeln!(source, "        {}", line);
    }

    let outputs = bindings
        .iter()
        .map(|b| format!("[{}] \"=r\" ({})", b.variable.symbol(), b.lvalue()))
        .collect::<Vec<_>>()
        .join(", ");
    let inputs = bindings
        .iter()
        .enumerate()
        .map(|(index, b)| format!("\"{}\" ({})", index, b.lvalue()))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(source, "        : {}", outputs);
    let _ = writeln!(source, "        : {}", inputs);
    let _ = writeln!(source, "        : {}", clobbers(instructions, labels).join(", "));

    source.push_str("    );\n}\n");
    source
}

/// Quoted clobber names, first-seen order, each once, then `"cc"`.
fn clobbers(instructions: &[InstructionInstance], labels: &[Label]) -> Vec<String> {
    let mut names: Vec<&'static str> = Vec::new();
    let all = instructions
        .iter()
        .chain(labels.iter().flat_map(|l| l.instructions().iter()));
    for instruction in all {
        for register in instruction.registers() {
            if let Some(name) = register.clobber_name() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names.push("cc");
    names.iter().map(|name| c_string(name)).collect()
}

fn entry_function(signature: &[NativeType]) -> String {
    let mut source = String::new();
    let _ = writeln!(source, "void {}(void ** args) {{", ENTRY_SYMBOL);
    if signature.is_empty() {
        source.push_str("    (void) args;\n");
    }
    let args = signature
        .iter()
        .enumerate()
        .map(|(index, ty)| match ty {
            NativeType::Scalar(t) => format!("*({} *) args[{}]", t.name(), index),
            _ => format!("args[{}]", index),
        })
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(source, "    {}({});", BODY_SYMBOL, args);
    source.push_str("}\n");
    source
}
