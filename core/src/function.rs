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

//! The function compiler: role resolution, reachability, source synthesis
//! and binding, then marshalled invocation.

use crate::bridge::{NativeBridge, ToolchainBridge};
use crate::codegen::{self, Binding};
use crate::config::ToolchainConfig;
use crate::error::{AsmError, Result};
use crate::ffi::{self, EntryPoint, NativeSlot};
use crate::instruction::{InstructionInstance, Label};
use crate::types::NativeType;
use crate::value::Value;
use crate::variable::{Role, Variable};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// Everything a successful `compile()` produces. Replaced as a whole.
struct Compiled {
    bindings: Vec<Binding>,
    slots: HashMap<Variable, usize>,
    source: String,
    signature: Vec<NativeType>,
    entry: Box<dyn EntryPoint>,
}

/// An ordered instruction list that can be compiled to native code and
/// called with positional input values.
pub struct Function {
    instructions: Vec<InstructionInstance>,
    bridge: Option<Box<dyn NativeBridge>>,
    compiled: Option<Compiled>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("instructions", &self.instructions)
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

impl Function {
    /// Compiles through a [`ToolchainBridge`] configured from `XASM_*`
    /// environment variables, read when `compile()` runs.
    pub fn new(instructions: Vec<InstructionInstance>) -> Function {
        Function {
            instructions,
            bridge: None,
            compiled: None,
        }
    }

    pub fn with_config(instructions: Vec<InstructionInstance>, config: ToolchainConfig) -> Function {
        Function::with_bridge(instructions, Box::new(ToolchainBridge::new(config)))
    }

    pub fn with_bridge(
        instructions: Vec<InstructionInstance>,
        bridge: Box<dyn NativeBridge>,
    ) -> Function {
        Function {
            instructions,
            bridge: Some(bridge),
            compiled: None,
        }
    }

    pub fn instructions(&self) -> &[InstructionInstance] {
        &self.instructions
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    /// Synthesized C source of the current binding.
    pub fn source(&self) -> Option<&str> {
        self.compiled.as_ref().map(|c| c.source.as_str())
    }

    /// Entry point parameter types, in parameter order.
    pub fn signature(&self) -> Option<&[NativeType]> {
        self.compiled.as_ref().map(|c| c.signature.as_slice())
    }

    /// Role and parameter position of a variable in the current binding.
    pub fn role_of(&self, variable: &Variable) -> Option<(Role, usize)> {
        let compiled = self.compiled.as_ref()?;
        let slot = *compiled.slots.get(variable)?;
        Some((compiled.bindings[slot].role, slot))
    }

    /// Resolve roles, check every referenced variable, synthesize the source,
    /// build it and bind the entry point. On failure the function keeps
    /// whatever binding it had before.
    pub fn compile(
        &mut self,
        inputs: &[Variable],
        locals: &[Variable],
        outputs: &[Variable],
    ) -> Result<()> {
        let (bindings, slots) = resolve_roles(inputs, locals, outputs)?;
        debug!(
            outputs = outputs.len(),
            inputs = inputs.len(),
            locals = locals.len(),
            "roles resolved"
        );

        let labels = self.check_references(&slots)?;

        let signature = bindings
            .iter()
            .map(|binding| -> Result<NativeType> {
                let native = binding.variable.data_type().native_type().map_err(|e| match e {
                    AsmError::ArgumentValue(message) => AsmError::ArgumentValue(format!(
                        "{} variable {}: {}",
                        binding.role, binding.variable, message
                    )),
                    other => other,
                })?;
                Ok(match binding.role {
                    Role::Output => NativeType::pointer_to(native),
                    _ => native,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let source = codegen::synthesize(&self.instructions, &labels, &bindings, &signature);

        let env_bridge;
        let bridge: &dyn NativeBridge = match &self.bridge {
            Some(bridge) => bridge.as_ref(),
            None => {
                env_bridge = ToolchainBridge::from_env()?;
                &env_bridge
            }
        };
        let artifact = bridge.compile(&source)?;
        let entry = bridge.load(artifact, &signature)?;

        info!(
            instructions = self.instructions.len(),
            labels = labels.len(),
            params = signature.len(),
            "function compiled"
        );
        self.compiled = Some(Compiled {
            bindings,
            slots,
            source,
            signature,
            entry,
        });
        Ok(())
    }

    /// Every referenced variable must be registered. Returns the referenced
    /// labels, first-seen order, each once.
    fn check_references(&self, slots: &HashMap<Variable, usize>) -> Result<Vec<Label>> {
        let mut labels: Vec<Label> = Vec::new();
        for (index, instruction) in self.instructions.iter().enumerate() {
            if let Some(missing) = instruction
                .referenced_variables()
                .into_iter()
                .find(|v| !slots.contains_key(v))
            {
                return Err(AsmError::VariableDoesNotExist {
                    instruction: index,
                    variable: missing.to_string(),
                });
            }
            for label in instruction.referenced_labels() {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }
        Ok(labels)
    }

    /// Invoke the compiled code with one value per input variable.
    ///
    /// Returns `Value::Unit` without outputs, the bare value for one output
    /// and a `Value::Tuple` otherwise.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let compiled = self.compiled.as_ref().ok_or(AsmError::FunctionIsNotCompiled)?;

        let expected = compiled
            .bindings
            .iter()
            .filter(|b| b.role == Role::Input)
            .count();
        if args.len() != expected {
            return Err(AsmError::arity(
                "Function call: invalid number of arguments",
                expected,
                args.len(),
            ));
        }

        let mut inputs = args.iter().enumerate();
        let mut slots = Vec::with_capacity(compiled.bindings.len());
        for (binding, ty) in compiled.bindings.iter().zip(&compiled.signature) {
            let slot = match binding.role {
                Role::Input => {
                    let (index, value) = inputs.next().ok_or_else(|| {
                        AsmError::arity("Function call: invalid number of arguments", expected, args.len())
                    })?;
                    NativeSlot::with_value(ty.clone(), value).map_err(|e| match e {
                        AsmError::ArgumentType(message) => {
                            AsmError::ArgumentType(format!("argument {}: {}", index, message))
                        }
                        other => other,
                    })?
                }
                Role::Output | Role::Local => {
                    NativeSlot::with_value(ty.clone(), &binding.variable.initial_value()?)?
                }
            };
            slots.push(slot);
        }

        ffi::call(compiled.entry.as_ref(), &mut slots);

        let mut results: Vec<Value> = compiled
            .bindings
            .iter()
            .zip(&slots)
            .filter(|(b, _)| b.role == Role::Output)
            .map(|(_, slot)| slot.load())
            .collect();
        Ok(match results.len() {
            0 => Value::Unit,
            1 => results.remove(0),
            _ => Value::Tuple(results),
        })
    }
}

/// Outputs, then inputs, then locals. Each variable takes exactly one role.
fn resolve_roles(
    inputs: &[Variable],
    locals: &[Variable],
    outputs: &[Variable],
) -> Result<(Vec<Binding>, HashMap<Variable, usize>)> {
    let mut bindings: Vec<Binding> = Vec::new();
    let mut slots: HashMap<Variable, usize> = HashMap::new();

    let lists = [
        ("outputs", Role::Output, outputs),
        ("inputs", Role::Input, inputs),
        ("locals", Role::Local, locals),
    ];
    for (list, role, variables) in lists {
        for (index, variable) in variables.iter().enumerate() {
            if let Some(&slot) = slots.get(variable) {
                return Err(AsmError::ArgumentValue(format!(
                    "{}[{}]: variable {} is registered as {} and {}",
                    list, index, variable, bindings[slot].role, role
                )));
            }
            if role == Role::Input && variable.has_value() {
                return Err(AsmError::ArgumentValue(format!(
                    "{}[{}]: variable {} has a value and can not be an input",
                    list, index, variable
                )));
            }
            slots.insert(variable.clone(), bindings.len());
            bindings.push(Binding {
                variable: variable.clone(),
                role,
            });
        }
    }
    Ok((bindings, slots))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Artifact;
    use crate::ffi::FnEntry;
    use crate::instruction::Opcode;
    use crate::instructions::{add, cdq, idiv, inc, jmp, mov, nop, shl};
    use crate::register::Register;
    use crate::types::{Array, Type};
    use std::cell::{Cell, RefCell};
    use std::ffi::c_void;
    use std::os::raw::c_int;
    use std::rc::Rc;

    /// out = a << 4
    unsafe extern "C" fn shift_entry(args: *mut *mut c_void) {
        let out = *args.add(0) as *mut c_int;
        let a = *(*args.add(1) as *const c_int);
        *out = a << 4;
    }

    /// (sum, diff) = (a + b, a - b)
    unsafe extern "C" fn sum_diff_entry(args: *mut *mut c_void) {
        let sum = *args.add(0) as *mut c_int;
        let diff = *args.add(1) as *mut c_int;
        let a = *(*args.add(2) as *const c_int);
        let b = *(*args.add(3) as *const c_int);
        *sum = a + b;
        *diff = a - b;
    }

    unsafe extern "C" fn noop_entry(_args: *mut *mut c_void) {}

    #[derive(Clone)]
    struct MockBridge {
        entry: crate::ffi::EntryFn,
        fail: Rc<Cell<bool>>,
        sources: Rc<RefCell<Vec<String>>>,
        signatures: Rc<RefCell<Vec<Vec<NativeType>>>>,
    }

    impl MockBridge {
        fn new(entry: crate::ffi::EntryFn) -> MockBridge {
            MockBridge {
                entry,
                fail: Rc::new(Cell::new(false)),
                sources: Rc::new(RefCell::new(Vec::new())),
                signatures: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl NativeBridge for MockBridge {
        fn compile(&self, source: &str) -> Result<Artifact> {
            if self.fail.get() {
                return Err(AsmError::Compilation {
                    status: Some(1),
                    message: "mock failure".to_string(),
                });
            }
            self.sources.borrow_mut().push(source.to_string());
            Ok(Artifact::external("mock.so"))
        }

        fn load(&self, _artifact: Artifact, signature: &[NativeType]) -> Result<Box<dyn EntryPoint>> {
            self.signatures.borrow_mut().push(signature.to_vec());
            Ok(Box::new(FnEntry(self.entry)))
        }
    }

    fn int() -> Variable {
        Variable::new(Type::Int, None).unwrap()
    }

    fn shift_function(a: &Variable, out: &Variable) -> (Function, MockBridge) {
        let mock = MockBridge::new(shift_entry);
        let function = Function::with_bridge(
            vec![mov(out, a).unwrap(), shl(out, 4).unwrap()],
            Box::new(mock.clone()),
        );
        (function, mock)
    }

    #[test]
    fn test_compile_and_call() {
        let (a, out) = (int(), int());
        let (mut function, mock) = shift_function(&a, &out);
        function.compile(&[a.clone()], &[], &[out.clone()]).unwrap();

        assert!(function.is_compiled());
        assert_eq!(function.call(&[Value::Int(1)]).unwrap(), Value::Int(16));
        assert_eq!(function.call(&[Value::Int(2)]).unwrap(), Value::Int(32));

        assert_eq!(
            mock.signatures.borrow()[0],
            vec![
                NativeType::pointer_to(NativeType::Scalar(Type::Int)),
                NativeType::Scalar(Type::Int)
            ]
        );
        assert_eq!(function.role_of(&out), Some((Role::Output, 0)));
        assert_eq!(function.role_of(&a), Some((Role::Input, 1)));
        assert_eq!(function.role_of(&int()), None);
        assert_eq!(function.source(), Some(mock.sources.borrow()[0].as_str()));
    }

    #[test]
    fn test_several_outputs_make_a_tuple() {
        let (a, b, sum, diff) = (int(), int(), int(), int());
        let mock = MockBridge::new(sum_diff_entry);
        let mut function = Function::with_bridge(
            vec![mov(&sum, &a).unwrap(), add(&sum, &b).unwrap(), mov(&diff, &a).unwrap()],
            Box::new(mock),
        );
        function
            .compile(&[a.clone(), b.clone()], &[], &[sum.clone(), diff.clone()])
            .unwrap();
        assert_eq!(
            function.call(&[Value::Int(7), Value::Int(3)]).unwrap(),
            Value::Tuple(vec![Value::Int(10), Value::Int(4)])
        );
    }

    #[test]
    fn test_no_outputs_returns_unit() {
        let a = int();
        let mut function =
            Function::with_bridge(vec![inc(&a).unwrap()], Box::new(MockBridge::new(noop_entry)));
        function.compile(&[a], &[], &[]).unwrap();
        assert_eq!(function.call(&[Value::Int(5)]).unwrap(), Value::Unit);
    }

    #[test]
    fn test_call_before_compile() {
        let (a, out) = (int(), int());
        let (function, _) = shift_function(&a, &out);
        assert!(matches!(
            function.call(&[Value::Int(1)]),
            Err(AsmError::FunctionIsNotCompiled)
        ));
        assert!(function.source().is_none());
    }

    #[test]
    fn test_call_arity_and_argument_types() {
        let (a, b, out) = (int(), int(), int());
        let mut function = Function::with_bridge(
            vec![mov(&out, &a).unwrap(), add(&out, &b).unwrap()],
            Box::new(MockBridge::new(noop_entry)),
        );
        function.compile(&[a, b], &[], &[out]).unwrap();

        match function.call(&[Value::Int(1)]) {
            Err(AsmError::ArgumentsNumber { expected, actual, .. }) => {
                assert_eq!((expected, actual), (2, 1))
            }
            other => panic!("expected arity error, got {:?}", other),
        }
        match function.call(&[Value::Int(1), Value::from("x")]) {
            Err(AsmError::ArgumentType(message)) => assert!(message.starts_with("argument 1:")),
            other => panic!("expected type error, got {:?}", other),
        }
    }

    #[test]
    fn test_input_with_value_is_rejected() {
        let a = Variable::new(Type::Int, Some(Value::Int(3))).unwrap();
        let out = int();
        let (mut function, _) = shift_function(&a, &out);
        match function.compile(&[a], &[], &[out]) {
            Err(AsmError::ArgumentValue(message)) => assert!(message.starts_with("inputs[0]")),
            other => panic!("expected value error, got {:?}", other),
        }
        assert!(!function.is_compiled());
    }

    #[test]
    fn test_duplicate_roles_are_rejected() {
        let (a, out) = (int(), int());
        let (mut function, _) = shift_function(&a, &out);

        match function.compile(&[a.clone(), out.clone()], &[], &[out.clone()]) {
            Err(AsmError::ArgumentValue(message)) => {
                assert!(message.contains("inputs[1]"));
                assert!(message.contains("output and input"));
            }
            other => panic!("expected value error, got {:?}", other),
        }
        assert!(matches!(
            function.compile(&[a.clone()], &[a.clone()], &[out.clone()]),
            Err(AsmError::ArgumentValue(_))
        ));
        assert!(matches!(
            function.compile(&[a.clone(), a.clone()], &[], &[out.clone()]),
            Err(AsmError::ArgumentValue(_))
        ));
    }

    #[test]
    fn test_unregistered_variables() {
        let (a, out, stray) = (int(), int(), int());
        let mut function = Function::with_bridge(
            vec![mov(&out, &a).unwrap(), add(&out, &stray).unwrap()],
            Box::new(MockBridge::new(noop_entry)),
        );
        match function.compile(&[a.clone()], &[], &[out.clone()]) {
            Err(AsmError::VariableDoesNotExist { instruction, variable }) => {
                assert_eq!(instruction, 1);
                assert!(variable.starts_with(&stray.symbol()));
            }
            other => panic!("expected missing variable, got {:?}", other),
        }

        // hidden inside a nested label
        let inner = Label::new(vec![inc(&stray).unwrap()]).unwrap();
        let outer = Label::new(vec![jmp(&inner).unwrap()]).unwrap();
        let mut function = Function::with_bridge(
            vec![nop().unwrap(), jmp(&outer).unwrap()],
            Box::new(MockBridge::new(noop_entry)),
        );
        assert!(matches!(
            function.compile(&[], &[], &[]),
            Err(AsmError::VariableDoesNotExist { instruction: 1, .. })
        ));
        function.compile(&[], &[stray], &[]).unwrap();
    }

    #[test]
    fn test_labels_are_emitted_once() {
        let counter = int();
        let done = Label::new(vec![nop().unwrap()]).unwrap();
        let mock = MockBridge::new(noop_entry);
        let mut function = Function::with_bridge(
            vec![inc(&counter).unwrap(), jmp(&done).unwrap(), jmp(&done).unwrap()],
            Box::new(mock.clone()),
        );
        function.compile(&[], &[], &[counter]).unwrap();
        let source = function.source().unwrap();
        assert_eq!(source.matches(&format!("\"{}: nop;\"", done.name())).count(), 1);
    }

    #[test]
    fn test_unresolved_array_is_rejected() {
        let table = Variable::new(Array::new(Type::Int, None).unwrap(), None).unwrap();
        let mut function = Function::with_bridge(
            vec![mov(Register::Eax, &table).unwrap()],
            Box::new(MockBridge::new(noop_entry)),
        );
        assert!(matches!(
            function.compile(&[table], &[], &[]),
            Err(AsmError::ArgumentValue(_))
        ));
    }

    #[test]
    fn test_failed_recompile_keeps_binding() {
        let (a, out) = (int(), int());
        let (mut function, mock) = shift_function(&a, &out);
        function.compile(&[a.clone()], &[], &[out.clone()]).unwrap();
        let source = function.source().unwrap().to_string();

        mock.fail.set(true);
        assert!(matches!(
            function.compile(&[], &[a.clone()], &[out.clone()]),
            Err(AsmError::Compilation { status: Some(1), .. })
        ));
        assert_eq!(function.source(), Some(source.as_str()));
        assert_eq!(function.role_of(&a), Some((Role::Input, 1)));
        assert_eq!(function.call(&[Value::Int(3)]).unwrap(), Value::Int(48));
    }

    #[test]
    fn test_unknown_opcode_is_passed_through() {
        static FROBNICATE: Opcode = Opcode::new("frobnicate", &[]);
        let mock = MockBridge::new(noop_entry);
        let mut function =
            Function::with_bridge(vec![FROBNICATE.apply(vec![]).unwrap()], Box::new(mock.clone()));
        function.compile(&[], &[], &[]).unwrap();
        assert!(mock.sources.borrow()[0].contains("\"frobnicate;\""));
    }

    // =========================================================================
    // End to end, through the real toolchain
    // =========================================================================

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    mod native {
        use super::*;
        use std::process::{Command, Stdio};

        fn gcc_available() -> bool {
            Command::new("gcc")
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        }

        fn config(dir: &tempfile::TempDir) -> ToolchainConfig {
            ToolchainConfig {
                build_dir: Some(dir.path().to_path_buf()),
                ..ToolchainConfig::default()
            }
        }

        #[test]
        fn test_shift_left_by_four() {
            if !gcc_available() {
                eprintln!("SKIP: gcc not available");
                return;
            }
            let dir = tempfile::tempdir().unwrap();
            let (a, out) = (int(), int());
            let mut function = Function::with_config(
                vec![mov(&out, &a).unwrap(), shl(&out, 4).unwrap()],
                config(&dir),
            );
            function.compile(&[a], &[], &[out]).unwrap();
            assert_eq!(function.call(&[Value::Int(1)]).unwrap(), Value::Int(16));
            assert_eq!(function.call(&[Value::Int(2)]).unwrap(), Value::Int(32));
        }

        #[test]
        fn test_local_with_literal() {
            if !gcc_available() {
                eprintln!("SKIP: gcc not available");
                return;
            }
            let dir = tempfile::tempdir().unwrap();
            let (a, out) = (int(), int());
            let step = Variable::new(Type::Int, Some(Value::Int(5))).unwrap();
            let mut function = Function::with_config(
                vec![mov(&out, &a).unwrap(), add(&out, &step).unwrap()],
                config(&dir),
            );
            function.compile(&[a], &[step], &[out]).unwrap();
            assert_eq!(function.call(&[Value::Int(10)]).unwrap(), Value::Int(15));
        }

        #[test]
        fn test_zero_outputs() {
            if !gcc_available() {
                eprintln!("SKIP: gcc not available");
                return;
            }
            let dir = tempfile::tempdir().unwrap();
            let a = int();
            let mut function = Function::with_config(vec![inc(&a).unwrap()], config(&dir));
            function.compile(&[a], &[], &[]).unwrap();
            assert_eq!(function.call(&[Value::Int(1)]).unwrap(), Value::Unit);
        }

        #[test]
        fn test_recompile_gives_independent_artifacts() {
            if !gcc_available() {
                eprintln!("SKIP: gcc not available");
                return;
            }
            let dir = tempfile::tempdir().unwrap();
            let (a, out) = (int(), int());
            let body = vec![mov(&out, &a).unwrap(), shl(&out, 4).unwrap()];
            let mut first = Function::with_config(body.clone(), config(&dir));
            let mut second = Function::with_config(body, config(&dir));
            first.compile(&[a.clone()], &[], &[out.clone()]).unwrap();
            second.compile(&[a.clone()], &[], &[out.clone()]).unwrap();
            first.compile(&[a.clone()], &[], &[out.clone()]).unwrap();

            for n in [0, 3, -2] {
                assert_eq!(
                    first.call(&[Value::Int(n)]).unwrap(),
                    second.call(&[Value::Int(n)]).unwrap()
                );
            }
            drop(first);
            assert_eq!(second.call(&[Value::Int(1)]).unwrap(), Value::Int(16));
        }

        #[test]
        fn test_named_registers_do_not_overwrite_variables() {
            if !gcc_available() {
                eprintln!("SKIP: gcc not available");
                return;
            }
            let dir = tempfile::tempdir().unwrap();
            let (a, b, out) = (int(), int(), int());
            let mut function = Function::with_config(
                vec![
                    mov(Register::Eax, &a).unwrap(),
                    shl(Register::Eax, 4).unwrap(),
                    add(Register::Eax, &b).unwrap(),
                    mov(&out, Register::Eax).unwrap(),
                ],
                config(&dir),
            );
            function.compile(&[a, b], &[], &[out]).unwrap();
            assert!(function.source().unwrap().contains(": \"eax\", \"cc\""));
            assert_eq!(
                function.call(&[Value::Int(1), Value::Int(100)]).unwrap(),
                Value::Int(116)
            );
            assert_eq!(
                function.call(&[Value::Int(3), Value::Int(-8)]).unwrap(),
                Value::Int(40)
            );
        }

        #[test]
        fn test_implicit_registers_do_not_overwrite_variables() {
            if !gcc_available() {
                eprintln!("SKIP: gcc not available");
                return;
            }
            let dir = tempfile::tempdir().unwrap();
            let (a, b, quotient, remainder) = (int(), int(), int(), int());
            let mut function = Function::with_config(
                vec![
                    mov(Register::Eax, &a).unwrap(),
                    cdq().unwrap(),
                    idiv(&b).unwrap(),
                    mov(&quotient, Register::Eax).unwrap(),
                    mov(&remainder, Register::Edx).unwrap(),
                ],
                config(&dir),
            );
            function
                .compile(&[a, b], &[], &[quotient, remainder])
                .unwrap();
            assert_eq!(
                function.call(&[Value::Int(100), Value::Int(7)]).unwrap(),
                Value::Tuple(vec![Value::Int(14), Value::Int(2)])
            );
            assert_eq!(
                function.call(&[Value::Int(-9), Value::Int(2)]).unwrap(),
                Value::Tuple(vec![Value::Int(-4), Value::Int(-1)])
            );
        }

        #[test]
        fn test_toolchain_rejects_unknown_mnemonic() {
            if !gcc_available() {
                eprintln!("SKIP: gcc not available");
                return;
            }
            static FROBNICATE: Opcode = Opcode::new("frobnicate", &[]);
            let dir = tempfile::tempdir().unwrap();
            let mut function =
                Function::with_config(vec![FROBNICATE.apply(vec![]).unwrap()], config(&dir));
            match function.compile(&[], &[], &[]) {
                Err(AsmError::Compilation { status, .. }) => {
                    assert!(matches!(status, Some(code) if code != 0))
                }
                other => panic!("expected compilation error, got {:?}", other),
            }
            assert!(!function.is_compiled());
        }
    }
}
