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
use crate::value::Value;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::mem::size_of;
use std::os::raw::{
    c_char, c_double, c_float, c_int, c_long, c_longlong, c_short, c_uint, c_ulong, c_ulonglong,
    c_ushort,
};
use std::str::FromStr;
use tracing::warn;

lazy_static! {
    static ref TYPE_NAME: Regex =
        Regex::new(r"^\s*([a-z][a-z ]*?)\s*((?:\[\s*\d*\s*\]\s*)*)$").expect("static regex");
    static ref DIMENSION: Regex = Regex::new(r"\[\s*(\d*)\s*\]").expect("static regex");
}

// =============================================================================
// Scalar Types
// =============================================================================

/// A C scalar type. Cheap to copy; any number of variables can share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Short,
    Int,
    Long,
    LongLong,
    UnsignedShort,
    UnsignedInt,
    UnsignedLong,
    UnsignedLongLong,
    Float,
    Double,
    Char,
}

/// How a scalar is stored natively. Widths are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Signed(usize),
    Unsigned(usize),
    Float(usize),
    Character,
}

/// Non-fatal: an integer literal does not fit its type and will wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeWarning {
    pub type_name: &'static str,
    pub value: i128,
    pub min: i128,
    pub max: i128,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is not in range of '{}' ([{}, {}])",
            self.value, self.type_name, self.min, self.max
        )
    }
}

impl Type {
    pub const ALL: [Type; 11] = [
        Type::Short,
        Type::Int,
        Type::Long,
        Type::LongLong,
        Type::UnsignedShort,
        Type::UnsignedInt,
        Type::UnsignedLong,
        Type::UnsignedLongLong,
        Type::Float,
        Type::Double,
        Type::Char,
    ];

    /// C spelling of the type.
    pub fn name(&self) -> &'static str {
        match self {
            Type::Short => "short",
            Type::Int => "int",
            Type::Long => "long",
            Type::LongLong => "long long",
            Type::UnsignedShort => "unsigned short",
            Type::UnsignedInt => "unsigned int",
            Type::UnsignedLong => "unsigned long",
            Type::UnsignedLongLong => "unsigned long long",
            Type::Float => "float",
            Type::Double => "double",
            Type::Char => "char",
        }
    }

    /// Look a type up by its C name. Redundant `int` suffixes
    /// (`short int`, `unsigned long int`, ...) are accepted.
    pub fn from_name(name: &str) -> Result<Type> {
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
        let canonical = match normalized.as_str() {
            "short int" => "short",
            "long int" => "long",
            "long long int" => "long long",
            "unsigned short int" => "unsigned short",
            "unsigned" => "unsigned int",
            "unsigned long int" => "unsigned long",
            "unsigned long long int" => "unsigned long long",
            other => other,
        };
        Type::ALL
            .iter()
            .copied()
            .find(|t| t.name() == canonical)
            .ok_or_else(|| AsmError::ArgumentValue(format!("Unknown name for C type: '{}'", name)))
    }

    pub fn storage(&self) -> StorageClass {
        match self {
            Type::Short => StorageClass::Signed(size_of::<c_short>()),
            Type::Int => StorageClass::Signed(size_of::<c_int>()),
            Type::Long => StorageClass::Signed(size_of::<c_long>()),
            Type::LongLong => StorageClass::Signed(size_of::<c_longlong>()),
            Type::UnsignedShort => StorageClass::Unsigned(size_of::<c_ushort>()),
            Type::UnsignedInt => StorageClass::Unsigned(size_of::<c_uint>()),
            Type::UnsignedLong => StorageClass::Unsigned(size_of::<c_ulong>()),
            Type::UnsignedLongLong => StorageClass::Unsigned(size_of::<c_ulonglong>()),
            Type::Float => StorageClass::Float(size_of::<c_float>()),
            Type::Double => StorageClass::Float(size_of::<c_double>()),
            Type::Char => StorageClass::Character,
        }
    }

    pub fn native_size(&self) -> usize {
        match self.storage() {
            StorageClass::Signed(n) | StorageClass::Unsigned(n) | StorageClass::Float(n) => n,
            StorageClass::Character => size_of::<c_char>(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.storage(),
            StorageClass::Signed(_) | StorageClass::Unsigned(_)
        )
    }

    /// Representable range of an integer type.
    pub fn range(&self) -> Option<(i128, i128)> {
        match self.storage() {
            StorageClass::Signed(n) => {
                let bits = (n * 8) as u32;
                Some((-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1))
            }
            StorageClass::Unsigned(n) => Some((0, (1i128 << (n * 8) as u32) - 1)),
            _ => None,
        }
    }

    /// Validate a value for this type. Integer literals outside the range are
    /// accepted with a warning.
    pub fn check_value(&self, value: &Value) -> Result<Option<RangeWarning>> {
        match (self.storage(), value) {
            (StorageClass::Signed(_) | StorageClass::Unsigned(_), Value::Int(i)) => {
                let (min, max) = self.range().unwrap_or((i128::MIN, i128::MAX));
                if *i < min || *i > max {
                    let warning = RangeWarning {
                        type_name: self.name(),
                        value: *i,
                        min,
                        max,
                    };
                    warn!(%warning, "integer literal out of range");
                    return Ok(Some(warning));
                }
                Ok(None)
            }
            (StorageClass::Signed(_) | StorageClass::Unsigned(_), other) => {
                Err(AsmError::ArgumentType(format!(
                    "Value is not of type '{}' (got {}, expected integer)",
                    self.name(),
                    other.kind()
                )))
            }
            (StorageClass::Float(_), Value::Int(_) | Value::Float(_)) => Ok(None),
            (StorageClass::Float(_), other) => Err(AsmError::ArgumentType(format!(
                "Value is not of type '{}' (got {}, expected integer or float)",
                self.name(),
                other.kind()
            ))),
            (StorageClass::Character, Value::Str(s)) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if (c as u32) <= 0xFF => Ok(None),
                    (Some(c), None) => Err(AsmError::ArgumentType(format!(
                        "Can not store {:?} in a single byte 'char'",
                        c
                    ))),
                    _ => Err(AsmError::ArgumentType(format!(
                        "Can not convert string with length {} to 'char' (expected length 1)",
                        s.chars().count()
                    ))),
                }
            }
            (StorageClass::Character, other) => Err(AsmError::ArgumentType(format!(
                "Value is not of type 'char' (got {}, expected string)",
                other.kind()
            ))),
        }
    }

    pub fn default_value(&self) -> Value {
        match self.storage() {
            StorageClass::Signed(_) | StorageClass::Unsigned(_) => Value::Int(0),
            StorageClass::Float(_) => Value::Float(0.0),
            StorageClass::Character => Value::Str("\0".to_string()),
        }
    }

    /// C parameter declaration for a variable of this type.
    pub(crate) fn definition(&self, name: &str, as_pointer: bool) -> String {
        if as_pointer {
            format!("{} * {}", self.name(), name)
        } else {
            format!("{} {}", self.name(), name)
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Type {
    type Err = AsmError;

    fn from_str(s: &str) -> Result<Self> {
        Type::from_name(s)
    }
}

// =============================================================================
// Arrays
// =============================================================================

/// A (possibly nested) C array. Dimensions are listed outermost first; `None`
/// marks a dimension that is inferred from the first literal bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Array {
    element: Type,
    dims: Vec<Option<usize>>,
}

impl Array {
    /// Wrap a scalar or an array in one more (outer) dimension.
    pub fn new(inner: impl Into<DataType>, size: Option<usize>) -> Result<Array> {
        if size == Some(0) {
            return Err(AsmError::ArgumentValue(
                "Invalid array size 0 (expected size > 0)".to_string(),
            ));
        }
        Ok(match inner.into() {
            DataType::Scalar(element) => Array {
                element,
                dims: vec![size],
            },
            DataType::Array(inner) => {
                let mut dims = Vec::with_capacity(inner.dims.len() + 1);
                dims.push(size);
                dims.extend(inner.dims);
                Array {
                    element: inner.element,
                    dims,
                }
            }
        })
    }

    pub fn element(&self) -> Type {
        self.element
    }

    pub fn dims(&self) -> &[Option<usize>] {
        &self.dims
    }

    pub fn is_resolved(&self) -> bool {
        self.dims.iter().all(Option::is_some)
    }

    pub fn resolved_dims(&self) -> Option<Vec<usize>> {
        self.dims.iter().copied().collect()
    }

    /// Validate a literal against this array and return the array with every
    /// unresolved dimension fixed to the observed length. Already-known
    /// dimensions must match exactly; every axis must be rectangular.
    pub fn resolve(&self, value: &Value) -> Result<(Array, Vec<RangeWarning>)> {
        let mut dims = self.dims.clone();
        let mut warnings = Vec::new();
        self.validate_axis(value, 0, &mut dims, &mut warnings)?;
        Ok((
            Array {
                element: self.element,
                dims,
            },
            warnings,
        ))
    }

    fn validate_axis(
        &self,
        value: &Value,
        axis: usize,
        dims: &mut [Option<usize>],
        warnings: &mut Vec<RangeWarning>,
    ) -> Result<()> {
        let items = match value {
            Value::List(items) => items,
            other => {
                return Err(AsmError::ArgumentType(format!(
                    "Can not convert {} to '{}' array",
                    other, self.element
                )))
            }
        };
        if items.is_empty() {
            return Err(AsmError::ArgumentType(format!(
                "Can not convert empty list to '{}' array",
                self.element
            )));
        }

        match dims[axis] {
            Some(expected) if items.len() != expected => {
                return Err(AsmError::ArgumentType(format!(
                    "Can not convert {} to '{}' array (got length {}, expected {})",
                    value,
                    self.element,
                    items.len(),
                    expected
                )));
            }
            Some(_) => {}
            None => dims[axis] = Some(items.len()),
        }

        if axis + 1 == dims.len() {
            for item in items {
                if let Some(warning) = self.element.check_value(item)? {
                    warnings.push(warning);
                }
            }
        } else {
            for item in items {
                self.validate_axis(item, axis + 1, dims, warnings)?;
            }
        }
        Ok(())
    }

    pub fn default_value(&self) -> Result<Value> {
        let dims = self.resolved_dims().ok_or_else(|| {
            AsmError::ArgumentType(format!(
                "One of the dimensions of {} is unknown, can not build its default value",
                self
            ))
        })?;
        let mut value = self.element.default_value();
        for dim in dims.iter().rev() {
            value = Value::List(vec![value; *dim]);
        }
        Ok(value)
    }

    /// Arrays are always passed by address, so the pointer form is the same.
    pub(crate) fn definition(&self, name: &str) -> String {
        let mut definition = format!("{} {}", self.element, name);
        for dim in &self.dims {
            match dim {
                Some(n) => definition.push_str(&format!("[{}]", n)),
                None => definition.push_str("[]"),
            }
        }
        definition
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.element)?;
        for dim in &self.dims {
            match dim {
                Some(n) => write!(f, "[{}]", n)?,
                None => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Data Types
// =============================================================================

/// The declared type of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Scalar(Type),
    Array(Array),
}

impl DataType {
    pub fn element(&self) -> Type {
        match self {
            DataType::Scalar(t) => *t,
            DataType::Array(a) => a.element(),
        }
    }

    /// Validate `value`, returning the data type with array dimensions
    /// resolved against it.
    pub fn check_value(&self, value: &Value) -> Result<(DataType, Vec<RangeWarning>)> {
        match self {
            DataType::Scalar(t) => {
                let warnings = t.check_value(value)?.into_iter().collect();
                Ok((DataType::Scalar(*t), warnings))
            }
            DataType::Array(a) => {
                let (resolved, warnings) = a.resolve(value)?;
                Ok((DataType::Array(resolved), warnings))
            }
        }
    }

    pub fn default_value(&self) -> Result<Value> {
        match self {
            DataType::Scalar(t) => Ok(t.default_value()),
            DataType::Array(a) => a.default_value(),
        }
    }

    /// Native storage descriptor. Fails while an array dimension is unknown.
    pub fn native_type(&self) -> Result<NativeType> {
        match self {
            DataType::Scalar(t) => Ok(NativeType::Scalar(*t)),
            DataType::Array(a) => {
                let dims = a.resolved_dims().ok_or_else(|| {
                    AsmError::ArgumentValue(format!(
                        "Array type {} has an unresolved dimension; bind a value or give every size",
                        a
                    ))
                })?;
                Ok(NativeType::Array {
                    element: a.element(),
                    dims,
                })
            }
        }
    }

    pub(crate) fn definition(&self, name: &str, as_pointer: bool) -> String {
        match self {
            DataType::Scalar(t) => t.definition(name, as_pointer),
            DataType::Array(a) => a.definition(name),
        }
    }
}

impl From<Type> for DataType {
    fn from(t: Type) -> Self {
        DataType::Scalar(t)
    }
}

impl From<Array> for DataType {
    fn from(a: Array) -> Self {
        DataType::Array(a)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Scalar(t) => write!(f, "{}", t),
            DataType::Array(a) => write!(f, "{}", a),
        }
    }
}

/// Parses C-like names: `int`, `unsigned long`, `int[]`, `double[2][3]`.
/// Empty brackets declare a dimension inferred from the bound value.
impl FromStr for DataType {
    type Err = AsmError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = TYPE_NAME
            .captures(s)
            .ok_or_else(|| AsmError::ArgumentValue(format!("Invalid type name: '{}'", s)))?;
        let element = Type::from_name(&caps[1])?;
        let suffix = caps.get(2).map_or("", |m| m.as_str());

        let mut sizes = Vec::new();
        for dim in DIMENSION.captures_iter(suffix) {
            let text = &dim[1];
            if text.is_empty() {
                sizes.push(None);
            } else {
                let n = text.parse::<usize>().map_err(|e| {
                    AsmError::ArgumentValue(format!("Invalid array size '{}': {}", text, e))
                })?;
                sizes.push(Some(n));
            }
        }

        let mut data_type = DataType::Scalar(element);
        for size in sizes.into_iter().rev() {
            data_type = DataType::Array(Array::new(data_type, size)?);
        }
        Ok(data_type)
    }
}

// =============================================================================
// Native Signature
// =============================================================================

/// Parameter type of the compiled entry point, as seen by the C ABI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeType {
    Scalar(Type),
    Array { element: Type, dims: Vec<usize> },
    Pointer(Box<NativeType>),
}

impl NativeType {
    pub fn pointer_to(inner: NativeType) -> NativeType {
        NativeType::Pointer(Box::new(inner))
    }

    /// The type whose storage backs this parameter.
    pub fn pointee(&self) -> &NativeType {
        match self {
            NativeType::Pointer(inner) => inner.pointee(),
            other => other,
        }
    }

    pub fn element(&self) -> Type {
        match self.pointee() {
            NativeType::Scalar(t) => *t,
            NativeType::Array { element, .. } => *element,
            NativeType::Pointer(_) => unreachable!("pointee never returns a pointer"),
        }
    }

    /// Number of elements in the backing storage.
    pub fn element_count(&self) -> usize {
        match self.pointee() {
            NativeType::Array { dims, .. } => dims.iter().product(),
            _ => 1,
        }
    }

    /// Bytes of backing storage.
    pub fn storage_size(&self) -> usize {
        self.element().native_size() * self.element_count()
    }

    /// True when the C parameter receives an address rather than a value.
    pub fn passed_by_address(&self) -> bool {
        !matches!(self, NativeType::Scalar(_))
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Scalar(t) => write!(f, "{}", t),
            NativeType::Array { element, dims } => {
                write!(f, "{}", element)?;
                for dim in dims {
                    write!(f, "[{}]", dim)?;
                }
                Ok(())
            }
            NativeType::Pointer(inner) => write!(f, "{} *", inner),
        }
    }
}
