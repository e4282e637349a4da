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

use thiserror::Error;

/// Every failure the DSL can raise. Each one is returned synchronously by the
/// call that introduced it and names the offending index or slot.
#[derive(Error, Debug)]
pub enum AsmError {
    /// An operand or value failed a type's capability check.
    #[error("Argument type error: {0}")]
    ArgumentType(String),
    /// Opcode arity or invocation arity mismatch.
    #[error("Arguments number error: {context}: expected {expected}, got {actual}")]
    ArgumentsNumber {
        context: String,
        expected: usize,
        actual: usize,
    },
    /// Duplicate or invalid role, invalid size, unknown name.
    #[error("Argument value error: {0}")]
    ArgumentValue(String),
    #[error("Variable does not exist: instruction {instruction} references {variable}, which is not an input, local or output variable")]
    VariableDoesNotExist { instruction: usize, variable: String },
    /// The native toolchain failed. `status` is `None` when the process was
    /// killed (timeout or signal).
    #[error("Compilation error: {message} (exit status: {status:?})")]
    Compilation {
        status: Option<i32>,
        message: String,
    },
    #[error("Function is not compiled: call Function::compile() before invoking it")]
    FunctionIsNotCompiled,
    #[error("Load error: {0}")]
    Load(#[from] libloading::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AsmError>;

impl AsmError {
    pub(crate) fn arity(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        AsmError::ArgumentsNumber {
            context: context.into(),
            expected,
            actual,
        }
    }
}
