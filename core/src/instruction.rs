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

//! Operands, opcode signatures, instruction instances and labels.
//!
//! An [`Opcode`] is pure data: a mnemonic and one capability set per operand
//! slot. Applying operands checks the arity, then checks that every operand
//! is admitted by *at least one* capability of its slot.

use crate::error::{AsmError, Result};
use crate::register::Register;
use crate::variable::Variable;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_LABEL: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// Operands
// =============================================================================

/// Immediate operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i128),
    Float(f64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Register(Register),
    Variable(Variable),
    Label(Label),
    Literal(Literal),
}

impl Operand {
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Register(_) => "register",
            Operand::Variable(_) => "variable",
            Operand::Label(_) => "label",
            Operand::Literal(_) => "literal",
        }
    }

    /// Text of the operand inside the assembly block.
    pub fn render(&self) -> String {
        match self {
            Operand::Register(r) => r.name().to_string(),
            Operand::Variable(v) => v.token(),
            Operand::Label(l) => l.name(),
            Operand::Literal(lit) => lit.to_string(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<Register> for Operand {
    fn from(r: Register) -> Self {
        Operand::Register(r)
    }
}

impl From<Variable> for Operand {
    fn from(v: Variable) -> Self {
        Operand::Variable(v)
    }
}

impl From<&Variable> for Operand {
    fn from(v: &Variable) -> Self {
        Operand::Variable(v.clone())
    }
}

impl From<Label> for Operand {
    fn from(l: Label) -> Self {
        Operand::Label(l)
    }
}

impl From<&Label> for Operand {
    fn from(l: &Label) -> Self {
        Operand::Label(l.clone())
    }
}

impl From<Literal> for Operand {
    fn from(lit: Literal) -> Self {
        Operand::Literal(lit)
    }
}

macro_rules! impl_int_operand {
    ($($t:ty),*) => {
        $(impl From<$t> for Operand {
            fn from(v: $t) -> Self {
                Operand::Literal(Literal::Int(v as i128))
            }
        })*
    };
}

impl_int_operand!(i8, i16, i32, i64, i128, u8, u16, u32, u64, usize);

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Literal(Literal::Float(v))
    }
}

// =============================================================================
// Opcode Signatures
// =============================================================================

/// One admissible operand shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any register.
    Register,
    /// 8, 16 or 32-bit general purpose register.
    GeneralRegister,
    SegmentRegister,
    /// Only `cl`, the variable shift/rotate count register.
    CountRegister,
    Variable,
    Label,
    /// Integer literal.
    Number,
    /// Floating point literal. No built-in opcode admits one.
    Float,
}

impl Capability {
    pub fn admits(&self, operand: &Operand) -> bool {
        match (self, operand) {
            (Capability::Register, Operand::Register(_)) => true,
            (Capability::GeneralRegister, Operand::Register(r)) => r.is_general_purpose(),
            (Capability::SegmentRegister, Operand::Register(r)) => r.is_segment(),
            (Capability::CountRegister, Operand::Register(r)) => *r == Register::Cl,
            (Capability::Variable, Operand::Variable(_)) => true,
            (Capability::Label, Operand::Label(_)) => true,
            (Capability::Number, Operand::Literal(Literal::Int(_))) => true,
            (Capability::Float, Operand::Literal(Literal::Float(_))) => true,
            _ => false,
        }
    }
}

/// Capability set of one operand slot.
pub type Slot = &'static [Capability];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    name: &'static str,
    slots: &'static [Slot],
    implicit: &'static [Register],
}

impl Opcode {
    pub const fn new(name: &'static str, slots: &'static [Slot]) -> Opcode {
        Opcode {
            name,
            slots,
            implicit: &[],
        }
    }

    /// Registers the instruction reads or writes without naming them, e.g.
    /// `eax` and `edx` for `idiv`.
    pub const fn with_implicit(self, implicit: &'static [Register]) -> Opcode {
        Opcode { implicit, ..self }
    }

    pub fn implicit(&self) -> &'static [Register] {
        self.implicit
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &'static [Slot] {
        self.slots
    }

    pub fn apply(&self, operands: Vec<Operand>) -> Result<InstructionInstance> {
        if operands.len() != self.arity() {
            return Err(AsmError::arity(
                format!("{}: invalid number of operands", self.name),
                self.arity(),
                operands.len(),
            ));
        }

        for (index, (operand, slot)) in operands.iter().zip(self.slots).enumerate() {
            if !slot.iter().any(|cap| cap.admits(operand)) {
                return Err(AsmError::ArgumentType(format!(
                    "{}: unsupported {} operand with index {} (admits {:?})",
                    self.name,
                    operand.kind(),
                    index,
                    slot
                )));
            }
        }

        Ok(InstructionInstance {
            opcode: self.name,
            operands,
            implicit: self.implicit,
        })
    }
}

// =============================================================================
// Instructions
// =============================================================================

/// An opcode with its validated operands, e.g. `mov eax, 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionInstance {
    opcode: &'static str,
    operands: Vec<Operand>,
    implicit: &'static [Register],
}

impl InstructionInstance {
    pub fn name(&self) -> &'static str {
        self.opcode
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Variables used directly as operands.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.operands.iter().filter_map(|op| match op {
            Operand::Variable(v) => Some(v),
            _ => None,
        })
    }

    /// Registers this instruction touches: named operands first, then the
    /// opcode's implicit ones.
    pub fn registers(&self) -> Vec<Register> {
        self.operands
            .iter()
            .filter_map(|op| match op {
                Operand::Register(r) => Some(*r),
                _ => None,
            })
            .chain(self.implicit.iter().copied())
            .collect()
    }

    /// Labels used directly as operands.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.operands.iter().filter_map(|op| match op {
            Operand::Label(l) => Some(l),
            _ => None,
        })
    }

    /// Every variable this instruction touches, including through labels.
    pub fn referenced_variables(&self) -> Vec<Variable> {
        let mut out: Vec<Variable> = self.variables().cloned().collect();
        for label in self.referenced_labels() {
            out.extend(label.instructions().iter().flat_map(|i| i.variables().cloned()));
        }
        out
    }

    /// Every label reachable from this instruction, first-seen order, each once.
    pub fn referenced_labels(&self) -> Vec<Label> {
        let mut out = Vec::new();
        for label in self.labels() {
            label.collect_into(&mut out);
        }
        out
    }

    /// `op;`, `op a;` or `op a, b;`.
    pub fn render(&self) -> String {
        match self.operands.as_slice() {
            [] => format!("{};", self.opcode),
            [a] => format!("{} {};", self.opcode, a.render()),
            [a, b] => format!("{} {}, {};", self.opcode, a.render(), b.render()),
            rest => {
                let joined = rest.iter().map(Operand::render).collect::<Vec<_>>().join(", ");
                format!("{} {};", self.opcode, joined)
            }
        }
    }
}

impl fmt::Display for InstructionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

// =============================================================================
// Labels
// =============================================================================

#[derive(Debug)]
struct LabelData {
    handle: u64,
    instructions: Vec<InstructionInstance>,
}

/// A named jump target owning a non-empty run of instructions.
#[derive(Debug, Clone)]
pub struct Label {
    inner: Arc<LabelData>,
}

impl Label {
    pub fn new(instructions: Vec<InstructionInstance>) -> Result<Label> {
        if instructions.is_empty() {
            return Err(AsmError::ArgumentValue(
                "A label needs at least one instruction".to_string(),
            ));
        }
        Ok(Label {
            inner: Arc::new(LabelData {
                handle: NEXT_LABEL.fetch_add(1, Ordering::Relaxed),
                instructions,
            }),
        })
    }

    pub fn handle(&self) -> u64 {
        self.inner.handle
    }

    pub fn name(&self) -> String {
        format!("label{}", self.inner.handle)
    }

    pub fn instructions(&self) -> &[InstructionInstance] {
        &self.inner.instructions
    }

    /// All variables touched by this label and the labels it jumps to.
    pub fn variables(&self) -> Vec<Variable> {
        let mut labels = Vec::new();
        self.collect_into(&mut labels);
        labels
            .iter()
            .flat_map(|l| l.instructions().iter().flat_map(|i| i.variables().cloned()))
            .collect()
    }

    /// Labels reachable from this one (itself excluded).
    pub fn labels(&self) -> Vec<Label> {
        let mut labels = Vec::new();
        self.collect_into(&mut labels);
        labels.retain(|l| l != self);
        labels
    }

    fn collect_into(&self, seen: &mut Vec<Label>) {
        if seen.contains(self) {
            return;
        }
        seen.push(self.clone());
        for instruction in self.instructions() {
            for nested in instruction.labels() {
                nested.collect_into(seen);
            }
        }
    }

    /// `label7: inc eax;jmp label3;`
    pub fn render(&self) -> String {
        let body: String = self.instructions().iter().map(|i| i.render()).collect();
        format!("{}: {}", self.name(), body)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.inner.handle == other.inner.handle
    }
}

impl Eq for Label {}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name())?;
        for instruction in self.instructions() {
            writeln!(f, "    {}", instruction)?;
        }
        Ok(())
    }
}
