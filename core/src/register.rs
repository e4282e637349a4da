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

use crate::error::{AsmError, Result};
use std::fmt;
use std::str::FromStr;

/// x86 registers usable as operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    // 32-bit general purpose
    Eax,
    Ebx,
    Ecx,
    Edx,
    Esi,
    Edi,
    Ebp,
    Esp,
    // 16-bit general purpose
    Ax,
    Bx,
    Cx,
    Dx,
    Si,
    Di,
    Bp,
    Sp,
    // 8-bit halves
    Al,
    Ah,
    Bl,
    Bh,
    Cl,
    Ch,
    Dl,
    Dh,
    // Segment
    Cs,
    Ds,
    Es,
    Fs,
    Gs,
    Ss,
    // MMX
    Mm0,
    Mm1,
    Mm2,
    Mm3,
    Mm4,
    Mm5,
    Mm6,
    Mm7,
}

impl Register {
    pub const ALL: [Register; 38] = [
        Register::Eax,
        Register::Ebx,
        Register::Ecx,
        Register::Edx,
        Register::Esi,
        Register::Edi,
        Register::Ebp,
        Register::Esp,
        Register::Ax,
        Register::Bx,
        Register::Cx,
        Register::Dx,
        Register::Si,
        Register::Di,
        Register::Bp,
        Register::Sp,
        Register::Al,
        Register::Ah,
        Register::Bl,
        Register::Bh,
        Register::Cl,
        Register::Ch,
        Register::Dl,
        Register::Dh,
        Register::Cs,
        Register::Ds,
        Register::Es,
        Register::Fs,
        Register::Gs,
        Register::Ss,
        Register::Mm0,
        Register::Mm1,
        Register::Mm2,
        Register::Mm3,
        Register::Mm4,
        Register::Mm5,
        Register::Mm6,
        Register::Mm7,
    ];

    /// Factory by assembler name.
    pub fn new(name: &str) -> Result<Register> {
        Register::ALL
            .iter()
            .copied()
            .find(|r| r.name() == name)
            .ok_or_else(|| {
                AsmError::ArgumentValue(format!(
                    "Unknown register '{}'. Use Register::names() to list the available names",
                    name
                ))
            })
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        Register::ALL.iter().map(Register::name)
    }

    /// Name as written in Intel syntax.
    pub fn name(&self) -> &'static str {
        match self {
            Register::Eax => "eax",
            Register::Ebx => "ebx",
            Register::Ecx => "ecx",
            Register::Edx => "edx",
            Register::Esi => "esi",
            Register::Edi => "edi",
            Register::Ebp => "ebp",
            Register::Esp => "esp",
            Register::Ax => "ax",
            Register::Bx => "bx",
            Register::Cx => "cx",
            Register::Dx => "dx",
            Register::Si => "si",
            Register::Di => "di",
            Register::Bp => "bp",
            Register::Sp => "sp",
            Register::Al => "al",
            Register::Ah => "ah",
            Register::Bl => "bl",
            Register::Bh => "bh",
            Register::Cl => "cl",
            Register::Ch => "ch",
            Register::Dl => "dl",
            Register::Dh => "dh",
            Register::Cs => "cs",
            Register::Ds => "ds",
            Register::Es => "es",
            Register::Fs => "fs",
            Register::Gs => "gs",
            Register::Ss => "ss",
            Register::Mm0 => "mm0",
            Register::Mm1 => "mm1",
            Register::Mm2 => "mm2",
            Register::Mm3 => "mm3",
            Register::Mm4 => "mm4",
            Register::Mm5 => "mm5",
            Register::Mm6 => "mm6",
            Register::Mm7 => "mm7",
        }
    }

    /// Operand width in bits.
    pub fn width(&self) -> u32 {
        use Register::*;
        match self {
            Eax | Ebx | Ecx | Edx | Esi | Edi | Ebp | Esp => 32,
            Ax | Bx | Cx | Dx | Si | Di | Bp | Sp => 16,
            Al | Ah | Bl | Bh | Cl | Ch | Dl | Dh => 8,
            Cs | Ds | Es | Fs | Gs | Ss => 16,
            Mm0 | Mm1 | Mm2 | Mm3 | Mm4 | Mm5 | Mm6 | Mm7 => 64,
        }
    }

    pub fn is_segment(&self) -> bool {
        use Register::*;
        matches!(self, Cs | Ds | Es | Fs | Gs | Ss)
    }

    pub fn is_mmx(&self) -> bool {
        self.name().starts_with("mm")
    }

    pub fn is_general_purpose(&self) -> bool {
        !self.is_segment() && !self.is_mmx()
    }

    pub fn is_accumulator(&self) -> bool {
        use Register::*;
        matches!(self, Eax | Ax | Al | Ah)
    }

    pub fn is_base(&self) -> bool {
        use Register::*;
        matches!(self, Ebx | Bx | Bl | Bh)
    }

    pub fn is_counter(&self) -> bool {
        use Register::*;
        matches!(self, Ecx | Cx | Cl | Ch)
    }

    pub fn is_data(&self) -> bool {
        use Register::*;
        matches!(self, Edx | Dx | Dl | Dh)
    }

    pub fn is_source_index(&self) -> bool {
        matches!(self, Register::Esi | Register::Si)
    }

    pub fn is_destination_index(&self) -> bool {
        matches!(self, Register::Edi | Register::Di)
    }

    pub fn is_stack_pointer(&self) -> bool {
        matches!(self, Register::Esp | Register::Sp)
    }

    pub fn is_base_pointer(&self) -> bool {
        matches!(self, Register::Ebp | Register::Bp)
    }

    /// The 32-bit register a general purpose register is part of.
    pub fn family(&self) -> Register {
        use Register::*;
        match self {
            Ax | Al | Ah => Eax,
            Bx | Bl | Bh => Ebx,
            Cx | Cl | Ch => Ecx,
            Dx | Dl | Dh => Edx,
            Si => Esi,
            Di => Edi,
            Bp => Ebp,
            Sp => Esp,
            other => *other,
        }
    }

    /// Name for an inline asm clobber list, so the compiler keeps variables
    /// out of this register. Segment registers are never allocated and the
    /// stack and frame pointers can not be clobbered, so those have none.
    pub fn clobber_name(&self) -> Option<&'static str> {
        let family = self.family();
        if self.is_segment() || family.is_stack_pointer() || family.is_base_pointer() {
            None
        } else {
            Some(family.name())
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Register {
    type Err = AsmError;

    fn from_str(s: &str) -> Result<Self> {
        Register::new(s)
    }
}
