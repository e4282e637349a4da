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

//! Embedded x86 assembly with typed variables.
//!
//! Build [`Variable`]s, write instructions against them, then compile a
//! [`Function`]. Compilation synthesizes a C translation unit holding one
//! GCC inline assembly block, builds it as a shared object with the
//! configured toolchain and loads it into the process.
//!
//! ```no_run
//! use xasm::instructions::{mov, shl};
//! use xasm::{Function, Type, Value, Variable};
//!
//! let a = Variable::new(Type::Int, None)?;
//! let out = Variable::new(Type::Int, None)?;
//! let mut f = Function::new(vec![mov(&out, &a)?, shl(&out, 4)?]);
//! f.compile(&[a], &[], &[out])?;
//! assert_eq!(f.call(&[Value::Int(2)])?, Value::Int(32));
//! # Ok::<(), xasm::AsmError>(())
//! ```

pub mod bridge;
pub mod codegen;
pub mod config;
pub mod error;
pub mod ffi;
pub mod function;
pub mod instruction;
pub mod instructions;
pub mod register;
pub mod types;
pub mod value;
pub mod variable;

pub use bridge::{Artifact, NativeBridge, ToolchainBridge};
pub use config::{TargetWidth, ToolchainConfig};
pub use error::{AsmError, Result};
pub use ffi::{EntryPoint, NativeSlot};
pub use function::Function;
pub use instruction::{Capability, InstructionInstance, Label, Literal, Opcode, Operand};
pub use register::Register;
pub use types::{Array, DataType, NativeType, RangeWarning, Type};
pub use value::Value;
pub use variable::{Role, Variable};
