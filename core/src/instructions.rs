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

//! The fixed mnemonic table and one builder function per mnemonic.
//!
//! ```ignore
//! use xasm::instructions::{mov, shl};
//! let body = vec![mov(&out, &a)?, shl(&out, 4)?];
//! ```

use crate::error::{AsmError, Result};
use crate::instruction::{Capability, InstructionInstance, Opcode, Operand, Slot};
use crate::register::Register;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Writable operand: a general purpose register or a variable bound to one.
const DST: Slot = &[Capability::GeneralRegister, Capability::Variable];
/// Readable operand.
const SRC: Slot = &[
    Capability::GeneralRegister,
    Capability::Variable,
    Capability::Number,
];
/// `mov` also moves to and from segment registers.
const MOV_DST: Slot = &[
    Capability::GeneralRegister,
    Capability::SegmentRegister,
    Capability::Variable,
];
const MOV_SRC: Slot = &[
    Capability::GeneralRegister,
    Capability::SegmentRegister,
    Capability::Variable,
    Capability::Number,
];
/// Shift count: `cl` or an immediate.
const COUNT: Slot = &[Capability::CountRegister, Capability::Number];
const TARGET: Slot = &[Capability::Label];

macro_rules! opcodes {
    ($(
        $(#[$doc:meta])*
        $opcode:ident, $builder:ident = $mnemonic:literal ( $($arg:ident : $slot:ident),* )
        $(uses [$($reg:ident),*])?;
    )*) => {
        $(
            pub static $opcode: Opcode = Opcode::new($mnemonic, &[$($slot),*])
                .with_implicit(&[$($(Register::$reg),*)?]);

            $(#[$doc])*
            pub fn $builder($($arg: impl Into<Operand>),*) -> Result<InstructionInstance> {
                $opcode.apply(vec![$($arg.into()),*])
            }
        )*

        /// Every built-in opcode, in table order.
        pub static ALL: &[&Opcode] = &[$(&$opcode),*];
    };
}

opcodes! {
    MOV, mov = "mov"(dst: MOV_DST, src: MOV_SRC);
    AND, and = "and"(dst: DST, src: SRC);
    OR, or = "or"(dst: DST, src: SRC);
    XOR, xor = "xor"(dst: DST, src: SRC);
    NOT, not = "not"(dst: DST);
    NEG, neg = "neg"(dst: DST);
    SHL, shl = "shl"(dst: DST, count: COUNT);
    SHR, shr = "shr"(dst: DST, count: COUNT);
    SAL, sal = "sal"(dst: DST, count: COUNT);
    SAR, sar = "sar"(dst: DST, count: COUNT);
    XCHG, xchg = "xchg"(a: DST, b: DST);
    ADD, add = "add"(dst: DST, src: SRC);
    /// Add with carry.
    ADC, adc = "adc"(dst: DST, src: SRC);
    SUB, sub = "sub"(dst: DST, src: SRC);
    /// Subtract with borrow.
    SBB, sbb = "sbb"(dst: DST, src: SRC);
    INC, inc = "inc"(dst: DST);
    DEC, dec = "dec"(dst: DST);
    /// Sign-extend `al` into `ax`.
    CBW, cbw = "cbw"() uses [Eax];
    /// Sign-extend `ax` into `dx:ax`.
    CWD, cwd = "cwd"() uses [Eax, Edx];
    /// Sign-extend `eax` into `edx:eax`.
    CDQ, cdq = "cdq"() uses [Eax, Edx];
    /// Signed divide of `edx:eax` by the operand.
    IDIV, idiv = "idiv"(divisor: DST) uses [Eax, Edx];
    MUL, mul = "mul"(factor: DST) uses [Eax, Edx];
    DIV, div = "div"(divisor: DST) uses [Eax, Edx];
    /// Two-operand signed multiply.
    IMUL, imul = "imul"(dst: DST, src: SRC);
    BT, bt = "bt"(base: DST, bit: SRC);
    BTS, bts = "bts"(base: DST, bit: SRC);
    BTR, btr = "btr"(base: DST, bit: SRC);
    BTC, btc = "btc"(base: DST, bit: SRC);
    /// Bit scan forward.
    BSF, bsf = "bsf"(dst: DST, src: DST);
    /// Bit scan reverse.
    BSR, bsr = "bsr"(dst: DST, src: DST);
    CMP, cmp = "cmp"(a: DST, b: SRC);
    TEST, test = "test"(a: DST, b: SRC);
    JMP, jmp = "jmp"(target: TARGET);
    JE, je = "je"(target: TARGET);
    JNE, jne = "jne"(target: TARGET);
    JL, jl = "jl"(target: TARGET);
    JG, jg = "jg"(target: TARGET);
    NOP, nop = "nop"();
}

lazy_static! {
    static ref BY_MNEMONIC: HashMap<&'static str, &'static Opcode> =
        ALL.iter().map(|op| (op.name(), *op)).collect();
}

impl Opcode {
    /// Find a built-in opcode by mnemonic.
    pub fn lookup(mnemonic: &str) -> Option<&'static Opcode> {
        BY_MNEMONIC.get(mnemonic).copied()
    }
}

/// Build an instruction by mnemonic with a runtime operand list.
pub fn instruction(mnemonic: &str, operands: Vec<Operand>) -> Result<InstructionInstance> {
    let opcode = Opcode::lookup(mnemonic).ok_or_else(|| {
        AsmError::ArgumentValue(format!("Unknown instruction mnemonic '{}'", mnemonic))
    })?;
    opcode.apply(operands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Label;
    use crate::register::Register;
    use crate::types::Type;
    use crate::variable::Variable;

    #[test]
    fn test_table_is_consistent() {
        for op in ALL {
            assert_eq!(Opcode::lookup(op.name()), Some(*op));
        }
        assert_eq!(BY_MNEMONIC.len(), ALL.len());
        assert_eq!(MOV.arity(), 2);
        assert_eq!(INC.arity(), 1);
        assert_eq!(CBW.arity(), 0);
        assert!(Opcode::lookup("movq").is_none());
    }

    #[test]
    fn test_every_opcode_rejects_wrong_arity() {
        for op in ALL {
            let too_many = vec![Operand::from(1); op.arity() + 1];
            assert!(
                matches!(op.apply(too_many), Err(AsmError::ArgumentsNumber { .. })),
                "{}",
                op.name()
            );
        }
    }

    #[test]
    fn test_builders() {
        let out = Variable::new(Type::Int, None).unwrap();
        let a = Variable::new(Type::Int, None).unwrap();
        assert_eq!(
            mov(&out, &a).unwrap().render(),
            format!("mov {}, {};", out.token(), a.token())
        );
        assert_eq!(shl(&out, 4).unwrap().render(), format!("shl {}, 4;", out.token()));
        assert_eq!(cbw().unwrap().render(), "cbw;");
        assert!(matches!(
            shl(&out, &a),
            Err(AsmError::ArgumentType(_))
        ));
        assert!(matches!(
            mov(4, Register::Eax),
            Err(AsmError::ArgumentType(_))
        ));

        let target = Label::new(vec![inc(Register::Eax).unwrap()]).unwrap();
        assert!(jmp(&target).is_ok());
        assert!(matches!(jmp(Register::Eax), Err(AsmError::ArgumentType(_))));
    }

    #[test]
    fn test_instruction_by_name() {
        let i = instruction("xor", vec![Register::Eax.into(), Register::Eax.into()]).unwrap();
        assert_eq!(i.render(), "xor eax, eax;");
        assert!(matches!(
            instruction("frobnicate", vec![]),
            Err(AsmError::ArgumentValue(_))
        ));
        assert!(matches!(
            instruction("xor", vec![Register::Eax.into()]),
            Err(AsmError::ArgumentsNumber { .. })
        ));
    }

    #[test]
    fn test_register_classes_per_slot() {
        assert!(matches!(add(Register::Cs, 1), Err(AsmError::ArgumentType(_))));
        assert!(matches!(shl(Register::Mm0, 4), Err(AsmError::ArgumentType(_))));
        assert!(matches!(inc(Register::Ss), Err(AsmError::ArgumentType(_))));
        assert!(add(Register::Ax, 1).is_ok());
        assert!(mov(Register::Ax, Register::Ds).is_ok());
        assert!(mov(Register::Es, Register::Ax).is_ok());
        assert!(matches!(mov(Register::Eax, 2.5), Err(AsmError::ArgumentType(_))));
    }

    #[test]
    fn test_implicit_registers() {
        let v = Variable::new(Type::Int, None).unwrap();
        for op in [&CDQ, &CWD, &IDIV, &DIV, &MUL] {
            assert_eq!(op.implicit(), &[Register::Eax, Register::Edx], "{}", op.name());
        }
        assert_eq!(CBW.implicit(), &[Register::Eax]);
        assert!(MOV.implicit().is_empty());
        assert_eq!(
            idiv(&v).unwrap().registers(),
            vec![Register::Eax, Register::Edx]
        );
    }
}
