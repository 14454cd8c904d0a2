// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JVM class-file emission.
//!
//! A small, language-agnostic writer for class files (version 52.0):
//! a deduplicating constant pool, a label-based code assembler, and an
//! abstract-interpretation pass that computes `max_stack`, `max_locals` and
//! the StackMapTable automatically from the assembled bytes. Computing those
//! frames doubles as structural verification: bytecode that does not
//! simulate cleanly is rejected instead of serialized.

mod code;
mod frames;
mod pool;

pub use code::{op, CodeBuilder, Label};
pub use pool::ConstantPool;

use frames::Analysis;
use thiserror::Error;

/// Class access flags.
pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_SUPER: u16 = 0x0020;

/// The class-file version emitted (Java 8).
const MAJOR_VERSION: u16 = 52;
const MINOR_VERSION: u16 = 0;

/// An inconsistency found while assembling or verifying a method.
///
/// These indicate defective bytecode handed to the writer, which for a
/// compiler front end means a code generation bug, not a user error.
#[derive(Debug, Clone, Error)]
pub enum VerifyError {
    #[error("branch to an unbound label in {method}")]
    UnboundLabel { method: String },

    #[error("branch out of range at offset {at} in {method}")]
    BranchOutOfRange { method: String, at: usize },

    #[error("operand stack underflow at offset {at} in {method}")]
    StackUnderflow { method: String, at: usize },

    #[error("wrong operand type at offset {at} in {method}")]
    WrongOperandType { method: String, at: usize },

    #[error("inconsistent stack frames merging into offset {at} in {method}")]
    FrameConflict { method: String, at: usize },

    #[error("invalid local variable {index} at offset {at} in {method}")]
    InvalidLocal { method: String, at: usize, index: u16 },

    #[error("unsupported opcode 0x{opcode:02x} at offset {at} in {method}")]
    UnknownOpcode { method: String, at: usize, opcode: u8 },

    #[error("unsupported constant pool operand at offset {at} in {method}")]
    UnsupportedConstant { method: String, at: usize },

    #[error("malformed type descriptor `{descriptor}` in {method}")]
    BadDescriptor { method: String, descriptor: String },

    #[error("execution can fall off the end of {method}")]
    FallsOffEnd { method: String },
}

struct FieldInfo {
    access: u16,
    name_index: u16,
    descriptor_index: u16,
}

struct MethodInfo {
    access: u16,
    name_index: u16,
    descriptor_index: u16,
    code: Vec<u8>,
    analysis: Analysis,
}

/// A class file under construction.
pub struct ClassFile {
    pool: ConstantPool,
    this_class: u16,
    super_class: u16,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    name: String,
}

impl ClassFile {
    /// Start a public class extending `java/lang/Object`.
    pub fn new(name: &str) -> Self {
        let mut pool = ConstantPool::new();
        let this_class = pool.class(name);
        let super_class = pool.class("java/lang/Object");

        Self {
            pool,
            this_class,
            super_class,
            fields: Vec::new(),
            methods: Vec::new(),
            name: name.to_string(),
        }
    }

    /// The class's constant pool, shared with code assembly.
    pub fn pool(&mut self) -> &mut ConstantPool {
        &mut self.pool
    }

    pub fn add_field(&mut self, access: u16, name: &str, descriptor: &str) {
        let name_index = self.pool.utf8(name);
        let descriptor_index = self.pool.utf8(descriptor);
        self.fields.push(FieldInfo { access, name_index, descriptor_index });
    }

    /// Attach an assembled method body.
    ///
    /// Branches are patched, frames computed, and the bytecode verified
    /// before the method is accepted.
    pub fn add_method(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        builder: CodeBuilder,
    ) -> Result<(), VerifyError> {
        let mut code = builder.resolve(name)?;

        let class_name = self.name.clone();
        let analysis = frames::analyze(
            &mut code,
            &mut self.pool,
            &class_name,
            access,
            name,
            descriptor,
        )?;

        // Interned up front so serialization is a pure write
        self.pool.utf8("Code");
        if analysis.stack_map.is_some() {
            self.pool.utf8("StackMapTable");
        }

        let name_index = self.pool.utf8(name);
        let descriptor_index = self.pool.utf8(descriptor);
        self.methods.push(MethodInfo { access, name_index, descriptor_index, code, analysis });

        Ok(())
    }

    /// Serialize the finished class. Deterministic: the same inputs always
    /// produce the same bytes.
    pub fn to_bytes(mut self) -> Vec<u8> {
        let code_attr = self.pool.utf8("Code");
        let stack_map_attr = if self.methods.iter().any(|m| m.analysis.stack_map.is_some()) {
            self.pool.utf8("StackMapTable")
        } else {
            0
        };

        let mut out = Vec::new();

        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&MINOR_VERSION.to_be_bytes());
        out.extend_from_slice(&MAJOR_VERSION.to_be_bytes());

        self.pool.serialize(&mut out);

        out.extend_from_slice(&(ACC_PUBLIC | ACC_SUPER).to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());

        // No interfaces
        out.extend_from_slice(&0u16.to_be_bytes());

        out.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            out.extend_from_slice(&field.access.to_be_bytes());
            out.extend_from_slice(&field.name_index.to_be_bytes());
            out.extend_from_slice(&field.descriptor_index.to_be_bytes());
            out.extend_from_slice(&0u16.to_be_bytes()); // no attributes
        }

        out.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            out.extend_from_slice(&method.access.to_be_bytes());
            out.extend_from_slice(&method.name_index.to_be_bytes());
            out.extend_from_slice(&method.descriptor_index.to_be_bytes());
            out.extend_from_slice(&1u16.to_be_bytes()); // the Code attribute

            let stack_map = method.analysis.stack_map.as_deref();
            let stack_map_len = stack_map.map(|b| 6 + b.len()).unwrap_or(0);
            let code_len = 2 + 2 + 4 + method.code.len() + 2 + 2 + stack_map_len;

            out.extend_from_slice(&code_attr.to_be_bytes());
            out.extend_from_slice(&(code_len as u32).to_be_bytes());
            out.extend_from_slice(&method.analysis.max_stack.to_be_bytes());
            out.extend_from_slice(&method.analysis.max_locals.to_be_bytes());
            out.extend_from_slice(&(method.code.len() as u32).to_be_bytes());
            out.extend_from_slice(&method.code);
            out.extend_from_slice(&0u16.to_be_bytes()); // no exception table

            match stack_map {
                Some(body) => {
                    out.extend_from_slice(&1u16.to_be_bytes());
                    out.extend_from_slice(&stack_map_attr.to_be_bytes());
                    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
                    out.extend_from_slice(body);
                }
                None => out.extend_from_slice(&0u16.to_be_bytes()),
            }
        }

        // No class attributes
        out.extend_from_slice(&0u16.to_be_bytes());

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_class_has_the_magic_header() {
        let class = ClassFile::new("Empty");
        let bytes = class.to_bytes();
        assert_eq!(&bytes[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
        // minor 0, major 52
        assert_eq!(&bytes[4..8], &[0, 0, 0, 52]);
    }

    #[test]
    fn straight_line_method() {
        let mut class = ClassFile::new("Main");
        let mut code = CodeBuilder::new();
        code.const_int(class.pool(), 2);
        code.const_int(class.pool(), 3);
        code.op(op::IADD);
        code.op(op::IRETURN);
        class.add_method(ACC_STATIC, "sum", "()I", code).expect("verification failed");

        let bytes = class.to_bytes();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn stack_underflow_is_rejected() {
        let mut class = ClassFile::new("Main");
        let mut code = CodeBuilder::new();
        code.op(op::IADD);
        code.op(op::RETURN);
        let err = class.add_method(ACC_STATIC, "bad", "()V", code).unwrap_err();
        assert!(matches!(err, VerifyError::StackUnderflow { .. }));
    }

    #[test]
    fn falling_off_the_end_is_rejected() {
        let mut class = ClassFile::new("Main");
        let mut code = CodeBuilder::new();
        code.const_int(class.pool(), 1);
        code.op(op::POP);
        let err = class.add_method(ACC_STATIC, "bad", "()V", code).unwrap_err();
        assert!(matches!(err, VerifyError::FallsOffEnd { .. }));
    }

    #[test]
    fn unbound_label_is_rejected() {
        let mut class = ClassFile::new("Main");
        let mut code = CodeBuilder::new();
        let nowhere = code.new_label();
        code.jump(op::GOTO, nowhere);
        let err = class.add_method(ACC_STATIC, "bad", "()V", code).unwrap_err();
        assert!(matches!(err, VerifyError::UnboundLabel { .. }));
    }

    #[test]
    fn branchy_method_gets_a_stack_map() {
        // if (a == 0) return 1; else return 2;  -- two frames' worth of joins
        let mut class = ClassFile::new("Main");
        let mut code = CodeBuilder::new();
        let else_branch = code.new_label();
        code.iload(0);
        code.jump(op::IFNE, else_branch);
        code.const_int(class.pool(), 1);
        code.op(op::IRETURN);
        code.bind(else_branch);
        code.const_int(class.pool(), 2);
        code.op(op::IRETURN);
        class.add_method(ACC_STATIC, "pick", "(I)I", code).expect("verification failed");

        let bytes = class.to_bytes();
        let needle = b"StackMapTable";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn serialization_is_deterministic() {
        let build = || {
            let mut class = ClassFile::new("Main");
            class.add_field(ACC_STATIC, "counter", "I");
            let mut code = CodeBuilder::new();
            code.field(class.pool(), op::GETSTATIC, "Main", "counter", "I");
            code.op(op::IRETURN);
            class.add_method(ACC_STATIC, "get", "()I", code).unwrap();
            class.to_bytes()
        };
        assert_eq!(build(), build());
    }
}
