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

use crate::error::Result;
use crate::types::{DataType, RangeWarning};
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_VARIABLE: AtomicU64 = AtomicU64::new(1);

/// Parameter-passing convention a variable takes inside one compiled function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Input,
    Output,
    Local,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Input => write!(f, "input"),
            Role::Output => write!(f, "output"),
            Role::Local => write!(f, "local"),
        }
    }
}

#[derive(Debug)]
struct VariableData {
    handle: u64,
    data_type: DataType,
    value: Option<Value>,
    warnings: Vec<RangeWarning>,
}

/// A typed slot referenced by instructions.
///
/// Cloning a `Variable` yields another handle to the *same* variable:
/// equality and hashing only look at the handle allocated at construction,
/// never at the type or value.
#[derive(Debug, Clone)]
pub struct Variable {
    inner: Arc<VariableData>,
}

impl Variable {
    /// Create a variable, validating `value` against `data_type` right away.
    /// Unresolved array dimensions are fixed from the value's shape; the
    /// caller's `Array` is not modified.
    pub fn new(data_type: impl Into<DataType>, value: Option<Value>) -> Result<Variable> {
        let declared = data_type.into();
        let (data_type, warnings) = match &value {
            Some(v) => declared.check_value(v)?,
            None => (declared, Vec::new()),
        };
        Ok(Variable {
            inner: Arc::new(VariableData {
                handle: NEXT_VARIABLE.fetch_add(1, Ordering::Relaxed),
                data_type,
                value,
                warnings,
            }),
        })
    }

    /// `Variable::declare("int[]", Some(vec![1, 2, 3].into()))`
    pub fn declare(type_name: &str, value: Option<Value>) -> Result<Variable> {
        Variable::new(type_name.parse::<DataType>()?, value)
    }

    pub fn handle(&self) -> u64 {
        self.inner.handle
    }

    pub fn data_type(&self) -> &DataType {
        &self.inner.data_type
    }

    pub fn has_value(&self) -> bool {
        self.inner.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.inner.value.as_ref()
    }

    /// Range warnings raised while validating the literal.
    pub fn warnings(&self) -> &[RangeWarning] {
        &self.inner.warnings
    }

    /// C identifier used for the parameter.
    pub fn symbol(&self) -> String {
        format!("v{}", self.inner.handle)
    }

    /// Symbolic operand inside the inline assembly block.
    pub fn token(&self) -> String {
        format!("%[v{}]", self.inner.handle)
    }

    /// Value the native slot starts with: the literal or zero.
    pub(crate) fn initial_value(&self) -> Result<Value> {
        match &self.inner.value {
            Some(v) => Ok(v.clone()),
            None => self.inner.data_type.default_value(),
        }
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.inner.handle == other.inner.handle
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.handle.hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.symbol(), self.inner.data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AsmError;
    use crate::types::{Array, Type};
    use std::collections::HashSet;

    #[test]
    fn test_identity_not_value_equality() {
        let a = Variable::new(Type::Int, Some(Value::Int(3))).unwrap();
        let b = Variable::new(Type::Int, Some(Value::Int(3))).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let set: HashSet<Variable> = [a.clone(), a.clone(), b.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_construction_validates_value() {
        assert!(matches!(
            Variable::new(Type::Int, Some(Value::Float(1.0))),
            Err(AsmError::ArgumentType(_))
        ));
        let v = Variable::new(Type::Int, None).unwrap();
        assert!(!v.has_value());
        assert_eq!(v.initial_value().unwrap(), Value::Int(0));
    }

    #[test]
    fn test_range_warning_is_kept() {
        let v = Variable::new(Type::Short, Some(Value::Int(100_000))).unwrap();
        assert!(v.has_value());
        assert_eq!(v.warnings().len(), 1);
    }

    #[test]
    fn test_bound_array_resolves_its_own_copy() {
        let open = Array::new(Type::Int, None).unwrap();
        let v = Variable::new(open.clone(), Some(Value::from(vec![1, 2, 3]))).unwrap();
        assert_eq!(v.data_type().to_string(), "int[3]");
        assert_eq!(open.dims(), &[None]);

        let w = Variable::new(open, Some(Value::from(vec![1, 2]))).unwrap();
        assert_eq!(w.data_type().to_string(), "int[2]");
    }

    #[test]
    fn test_declare_by_name() {
        let v = Variable::declare("char", Some(Value::from('z'))).unwrap();
        assert_eq!(v.data_type(), &DataType::Scalar(Type::Char));
        assert!(Variable::declare("string", None).is_err());
        assert_eq!(v.token(), format!("%[v{}]", v.handle()));
        assert_eq!(v.symbol(), format!("v{}", v.handle()));
    }
}
