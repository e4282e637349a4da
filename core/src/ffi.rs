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

//! Argument marshalling for compiled entry points.
//!
//! Every parameter is backed by a [`NativeSlot`]: zeroed, 8-byte aligned
//! storage sized from its [`NativeType`]. The entry point receives an array
//! with one pointer per slot, so the only foreign signature ever called from
//! Rust is `void (*)(void **)`.

use crate::error::{AsmError, Result};
use crate::types::{Array, NativeType, RangeWarning, StorageClass, Type};
use crate::value::Value;
use std::ffi::c_void;

/// Fixed signature of the generated entry shim.
pub type EntryFn = unsafe extern "C" fn(*mut *mut c_void);

/// A callable bound to native code.
pub trait EntryPoint {
    /// Run the entry point.
    ///
    /// # Safety
    /// `args` must point to one valid storage pointer per parameter of the
    /// entry point, each laid out as the parameter's [`NativeType`] requires.
    unsafe fn invoke(&self, args: *mut *mut c_void);
}

/// Wraps a bare function pointer, e.g. one resolved from a loaded library or
/// an `extern "C"` function defined in Rust.
pub struct FnEntry(pub EntryFn);

impl EntryPoint for FnEntry {
    unsafe fn invoke(&self, args: *mut *mut c_void) {
        (self.0)(args)
    }
}

/// Storage for one entry point parameter.
#[derive(Debug, Clone)]
pub struct NativeSlot {
    ty: NativeType,
    words: Vec<u64>,
}

impl NativeSlot {
    pub fn new(ty: NativeType) -> NativeSlot {
        let size = ty.storage_size();
        NativeSlot {
            ty,
            words: vec![0u64; size.div_ceil(8).max(1)],
        }
    }

    pub fn with_value(ty: NativeType, value: &Value) -> Result<NativeSlot> {
        let mut slot = NativeSlot::new(ty);
        slot.store(value)?;
        Ok(slot)
    }

    pub fn native_type(&self) -> &NativeType {
        &self.ty
    }

    fn bytes(&self) -> &[u8] {
        let len = self.ty.storage_size();
        // SAFETY: `words` holds at least `len` bytes and u8 has no alignment needs.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr() as *const u8, len) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        let len = self.ty.storage_size();
        // SAFETY: as in `bytes`, and `self` is borrowed mutably.
        unsafe { std::slice::from_raw_parts_mut(self.words.as_mut_ptr() as *mut u8, len) }
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut c_void {
        self.words.as_mut_ptr() as *mut c_void
    }

    /// Validate `value` against the slot type and write it in native layout.
    /// Out-of-range integers wrap, as a C conversion would.
    pub fn store(&mut self, value: &Value) -> Result<Vec<RangeWarning>> {
        let element = self.ty.element();
        let mut warnings = Vec::new();
        let mut leaves = Vec::with_capacity(self.ty.element_count());

        match self.ty.pointee().clone() {
            NativeType::Array { dims, .. } => {
                let mut shape = Array::new(element, dims.last().copied())?;
                for dim in dims.iter().rev().skip(1) {
                    shape = Array::new(shape, Some(*dim))?;
                }
                let (_, found) = shape.resolve(value)?;
                warnings.extend(found);
                flatten(value, &mut leaves);
            }
            _ => {
                warnings.extend(element.check_value(value)?);
                leaves.push(value);
            }
        }

        let width = element.native_size();
        let bytes = self.bytes_mut();
        for (index, leaf) in leaves.into_iter().enumerate() {
            encode_scalar(element, leaf, &mut bytes[index * width..(index + 1) * width])?;
        }
        Ok(warnings)
    }

    /// Read the slot back as a host value (nested lists for arrays).
    pub fn load(&self) -> Value {
        let element = self.ty.element();
        let width = element.native_size();
        let leaves: Vec<Value> = self
            .bytes()
            .chunks_exact(width)
            .map(|chunk| decode_scalar(element, chunk))
            .collect();

        match self.ty.pointee() {
            NativeType::Array { dims, .. } => unflatten(&leaves, dims),
            _ => leaves.into_iter().next().unwrap_or(Value::Unit),
        }
    }
}

fn flatten<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::List(items) => items.iter().for_each(|item| flatten(item, out)),
        leaf => out.push(leaf),
    }
}

fn unflatten(leaves: &[Value], dims: &[usize]) -> Value {
    match dims {
        [] | [_] => Value::List(leaves.to_vec()),
        [_, rest @ ..] => {
            let stride: usize = rest.iter().product();
            Value::List(
                leaves
                    .chunks(stride)
                    .map(|chunk| unflatten(chunk, rest))
                    .collect(),
            )
        }
    }
}

fn encode_scalar(ty: Type, value: &Value, out: &mut [u8]) -> Result<()> {
    let mismatch = || {
        AsmError::ArgumentType(format!(
            "Can not store {} value in '{}'",
            value.kind(),
            ty
        ))
    };
    match ty.storage() {
        StorageClass::Signed(_) | StorageClass::Unsigned(_) => {
            let i = value.as_int().ok_or_else(mismatch)?;
            match out.len() {
                1 => out.copy_from_slice(&(i as i8).to_ne_bytes()),
                2 => out.copy_from_slice(&(i as i16).to_ne_bytes()),
                4 => out.copy_from_slice(&(i as i32).to_ne_bytes()),
                8 => out.copy_from_slice(&(i as i64).to_ne_bytes()),
                n => {
                    return Err(AsmError::ArgumentType(format!(
                        "Unsupported integer width {} for '{}'",
                        n, ty
                    )))
                }
            }
        }
        StorageClass::Float(4) => {
            let f = value.as_float().ok_or_else(mismatch)?;
            out.copy_from_slice(&(f as f32).to_ne_bytes());
        }
        StorageClass::Float(_) => {
            let f = value.as_float().ok_or_else(mismatch)?;
            out.copy_from_slice(&f.to_ne_bytes());
        }
        StorageClass::Character => {
            let c = match value {
                Value::Str(s) => s.chars().next().ok_or_else(mismatch)?,
                _ => return Err(mismatch()),
            };
            out[0] = c as u32 as u8;
        }
    }
    Ok(())
}

fn decode_scalar(ty: Type, bytes: &[u8]) -> Value {
    match ty.storage() {
        StorageClass::Signed(_) => Value::Int(match bytes.len() {
            1 => i8::from_ne_bytes([bytes[0]]) as i128,
            2 => i16::from_ne_bytes([bytes[0], bytes[1]]) as i128,
            4 => i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i128,
            _ => i64::from_ne_bytes(word(bytes)) as i128,
        }),
        StorageClass::Unsigned(_) => Value::Int(match bytes.len() {
            1 => bytes[0] as i128,
            2 => u16::from_ne_bytes([bytes[0], bytes[1]]) as i128,
            4 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i128,
            _ => u64::from_ne_bytes(word(bytes)) as i128,
        }),
        StorageClass::Float(4) => {
            Value::Float(f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64)
        }
        StorageClass::Float(_) => Value::Float(f64::from_ne_bytes(word(bytes))),
        StorageClass::Character => Value::Str(char::from(bytes[0]).to_string()),
    }
}

fn word(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&bytes[..8]);
    out
}

/// Invoke `entry` with one pointer per slot, in slot order.
///
/// The slots must be built from the same signature the entry point was
/// compiled for.
pub(crate) fn call(entry: &dyn EntryPoint, slots: &mut [NativeSlot]) {
    let mut args: Vec<*mut c_void> = slots.iter_mut().map(NativeSlot::as_mut_ptr).collect();
    // SAFETY: each pointer refers to live, zero-initialised storage sized and
    // aligned for its parameter, and `slots` outlives the call.
    unsafe { entry.invoke(args.as_mut_ptr()) }
}
