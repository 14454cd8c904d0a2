// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Stack map frame computation.
//!
//! Runs a worklist abstract interpretation over an assembled method body,
//! producing `max_stack`, `max_locals`, and a StackMapTable with a
//! `full_frame` entry at every branch target. Unreachable instruction
//! ranges are rewritten to NOPs ending in ATHROW under a `[Throwable]`
//! frame, which keeps them verifiable without ever executing.
//!
//! Any simulation failure is a `VerifyError`: a frame computation that does
//! not converge cleanly is the verification step rejecting the bytecode.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::code::op;
use crate::pool::{ConstantPool, Loadable};
use crate::{VerifyError, ACC_STATIC};

/// Results of analyzing one method body.
#[derive(Debug)]
pub(crate) struct Analysis {
    pub max_stack: u16,
    pub max_locals: u16,
    /// Serialized StackMapTable attribute body (count + entries), when any
    /// frames are required.
    pub stack_map: Option<Vec<u8>>,
}

/// Verification types (JVMS §4.10.1.2), minus the categories this writer
/// never emits (floats, longs, null).
#[derive(Debug, Clone, PartialEq, Eq)]
enum VType {
    Top,
    Int,
    Double,
    Ref(String),
    UninitThis,
    /// A `new` result before its constructor ran; carries the offset of the
    /// `new` instruction.
    Uninit(u16),
}

impl VType {
    fn slots(&self) -> u16 {
        match self {
            VType::Double => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    /// Locals as a slot array: a double occupies its entry plus a Top.
    locals: Vec<VType>,
    stack: Vec<VType>,
}

impl Frame {
    fn stack_slots(&self) -> u16 {
        self.stack.iter().map(VType::slots).sum()
    }
}

struct Analyzer<'a> {
    method: String,
    class: &'a str,
    code: &'a [u8],
    pool: &'a mut ConstantPool,
    return_type: Option<VType>,
}

pub(crate) fn analyze(
    code: &mut Vec<u8>,
    pool: &mut ConstantPool,
    class: &str,
    access: u16,
    name: &str,
    descriptor: &str,
) -> Result<Analysis, VerifyError> {
    let method = format!("{}.{}{}", class, name, descriptor);

    if code.is_empty() {
        return Err(VerifyError::FallsOffEnd { method });
    }

    let (params, return_type) =
        parse_method_descriptor(descriptor).ok_or_else(|| VerifyError::BadDescriptor {
            method: method.clone(),
            descriptor: descriptor.to_string(),
        })?;

    // Entry frame from the access flags and descriptor
    let mut entry_locals = Vec::new();
    if access & ACC_STATIC == 0 {
        entry_locals.push(if name == "<init>" {
            VType::UninitThis
        } else {
            VType::Ref(class.to_string())
        });
    }
    for param in params {
        let wide = param == VType::Double;
        entry_locals.push(param);
        if wide {
            entry_locals.push(VType::Top);
        }
    }

    let starts = instruction_starts(code, &method)?;

    let mut analyzer = Analyzer {
        method,
        class,
        code: code.as_slice(),
        pool: &mut *pool,
        return_type,
    };

    let mut in_frames: BTreeMap<usize, Frame> = BTreeMap::new();
    in_frames.insert(0, Frame { locals: entry_locals.clone(), stack: Vec::new() });

    let mut worklist = VecDeque::from([0usize]);
    let mut branch_targets: BTreeSet<usize> = BTreeSet::new();
    let mut max_stack: u16 = 0;
    let mut max_locals = entry_locals.len() as u16;

    while let Some(pc) = worklist.pop_front() {
        let mut frame = in_frames[&pc].clone();

        let step = analyzer.exec(pc, &mut frame, &mut max_locals)?;

        max_stack = max_stack.max(frame.stack_slots());

        for &target in &step.jumps {
            if !starts.contains(&target) {
                return Err(VerifyError::BranchOutOfRange { method: analyzer.method.clone(), at: pc });
            }
            branch_targets.insert(target);
        }

        for succ in step.jumps.iter().copied().chain(step.fallthrough) {
            match in_frames.entry(succ) {
                std::collections::btree_map::Entry::Vacant(slot) => {
                    slot.insert(frame.clone());
                    worklist.push_back(succ);
                }
                std::collections::btree_map::Entry::Occupied(mut slot) => {
                    if merge(slot.get_mut(), &frame, succ, &analyzer.method)? {
                        worklist.push_back(succ);
                    }
                }
            }
        }
    }

    // Neutralize unreachable regions: NOPs ending in ATHROW, declared to
    // hold a Throwable so the linear verifier walk stays satisfied.
    let mut dead_frames: BTreeMap<usize, Frame> = BTreeMap::new();
    let mut region: Option<(usize, usize)> = None;
    let throwable = Frame {
        locals: Vec::new(),
        stack: vec![VType::Ref("java/lang/Throwable".to_string())],
    };

    let start_list: Vec<usize> = starts.iter().copied().collect();
    for (i, &pc) in start_list.iter().enumerate() {
        let end = start_list.get(i + 1).copied().unwrap_or(code.len());
        if in_frames.contains_key(&pc) {
            if let Some((from, to)) = region.take() {
                neutralize(code, from, to);
                dead_frames.insert(from, throwable.clone());
            }
        } else {
            region = Some(match region {
                Some((from, _)) => (from, end),
                None => (pc, end),
            });
        }
    }
    if let Some((from, to)) = region {
        neutralize(code, from, to);
        dead_frames.insert(from, throwable.clone());
    }
    if !dead_frames.is_empty() {
        max_stack = max_stack.max(1);
    }

    // Every branch target (plus every dead region start) gets a full frame
    let mut frames: BTreeMap<usize, Frame> = dead_frames;
    for target in branch_targets {
        frames.insert(target, in_frames[&target].clone());
    }

    let stack_map = if frames.is_empty() {
        None
    } else {
        Some(serialize_stack_map(&frames, pool))
    };

    Ok(Analysis { max_stack, max_locals, stack_map })
}

/// One executed instruction's control-flow consequences.
struct Step {
    fallthrough: Option<usize>,
    jumps: Vec<usize>,
}

impl<'a> Analyzer<'a> {
    /// Simulate the instruction at `pc`, mutating `frame` into its
    /// out-state.
    fn exec(&mut self, pc: usize, frame: &mut Frame, max_locals: &mut u16) -> Result<Step, VerifyError> {
        let opcode = self.code[pc];
        let mut jumps = Vec::new();
        let next = pc + instruction_length(opcode, pc, &self.method)?;
        let mut terminal = false;

        match opcode {
            op::NOP => {}

            op::ICONST_M1..=0x08 => frame.stack.push(VType::Int),
            op::BIPUSH | op::SIPUSH => frame.stack.push(VType::Int),

            op::LDC => {
                let index = self.code[pc + 1] as u16;
                match self.pool.loadable(index) {
                    Some(Loadable::Int) => frame.stack.push(VType::Int),
                    Some(Loadable::Str) => {
                        frame.stack.push(VType::Ref("java/lang/String".to_string()))
                    }
                    None => {
                        return Err(VerifyError::UnsupportedConstant {
                            method: self.method.clone(),
                            at: pc,
                        })
                    }
                }
            }

            op::ILOAD => self.load_int(frame, self.code[pc + 1] as u16, pc, max_locals)?,
            op::ILOAD_0..=0x1d => self.load_int(frame, (opcode - op::ILOAD_0) as u16, pc, max_locals)?,
            op::ALOAD => self.load_ref(frame, self.code[pc + 1] as u16, pc, max_locals)?,
            op::ALOAD_0..=0x2d => self.load_ref(frame, (opcode - op::ALOAD_0) as u16, pc, max_locals)?,

            op::ISTORE => self.store(frame, self.code[pc + 1] as u16, VType::Int, pc, max_locals)?,
            op::ISTORE_0..=0x3e => {
                self.store(frame, (opcode - op::ISTORE_0) as u16, VType::Int, pc, max_locals)?
            }
            op::ASTORE => {
                let value = self.pop_ref(frame, pc)?;
                self.put_local(frame, self.code[pc + 1] as u16, value, max_locals);
            }
            op::ASTORE_0..=0x4e => {
                let value = self.pop_ref(frame, pc)?;
                self.put_local(frame, (opcode - op::ASTORE_0) as u16, value, max_locals);
            }

            op::POP => {
                let value = self.pop(frame, pc)?;
                if value.slots() != 1 {
                    return Err(self.wrong_operand(pc));
                }
            }
            op::DUP => {
                let value = self.pop(frame, pc)?;
                if value.slots() != 1 {
                    return Err(self.wrong_operand(pc));
                }
                frame.stack.push(value.clone());
                frame.stack.push(value);
            }

            op::IADD | op::ISUB | op::IMUL | op::IDIV | op::IREM | op::ISHL | op::ISHR
            | op::IAND | op::IOR | op::IXOR => {
                self.pop_int(frame, pc)?;
                self.pop_int(frame, pc)?;
                frame.stack.push(VType::Int);
            }
            op::INEG => {
                self.pop_int(frame, pc)?;
                frame.stack.push(VType::Int);
            }

            op::I2D => {
                self.pop_int(frame, pc)?;
                frame.stack.push(VType::Double);
            }
            op::D2I => {
                match self.pop(frame, pc)? {
                    VType::Double => {}
                    _ => return Err(self.wrong_operand(pc)),
                }
                frame.stack.push(VType::Int);
            }

            op::IFEQ | op::IFNE => {
                self.pop_int(frame, pc)?;
                jumps.push(branch_target(self.code, pc));
            }
            op::IF_ICMPEQ..=0xa4 => {
                self.pop_int(frame, pc)?;
                self.pop_int(frame, pc)?;
                jumps.push(branch_target(self.code, pc));
            }
            op::IF_ACMPEQ | op::IF_ACMPNE => {
                self.pop_ref(frame, pc)?;
                self.pop_ref(frame, pc)?;
                jumps.push(branch_target(self.code, pc));
            }
            op::GOTO => {
                jumps.push(branch_target(self.code, pc));
                terminal = true;
            }

            op::IRETURN => {
                self.pop_int(frame, pc)?;
                if self.return_type != Some(VType::Int) {
                    return Err(self.wrong_operand(pc));
                }
                terminal = true;
            }
            op::ARETURN => {
                self.pop_ref(frame, pc)?;
                if !matches!(self.return_type, Some(VType::Ref(_))) {
                    return Err(self.wrong_operand(pc));
                }
                terminal = true;
            }
            op::RETURN => {
                if self.return_type.is_some() {
                    return Err(self.wrong_operand(pc));
                }
                terminal = true;
            }

            op::GETSTATIC => {
                let ty = self.field_type(pc)?;
                frame.stack.push(ty);
            }
            op::PUTSTATIC => {
                let ty = self.field_type(pc)?;
                let value = self.pop(frame, pc)?;
                if !assignable(&value, &ty) {
                    return Err(self.wrong_operand(pc));
                }
            }

            op::INVOKEVIRTUAL | op::INVOKESPECIAL | op::INVOKESTATIC => {
                let index = u16::from_be_bytes([self.code[pc + 1], self.code[pc + 2]]);
                let descriptor = self
                    .pool
                    .member_descriptor(index)
                    .ok_or_else(|| VerifyError::UnsupportedConstant {
                        method: self.method.clone(),
                        at: pc,
                    })?
                    .to_string();
                let member_name = self.pool.member_name(index).unwrap_or_default().to_string();
                let owner = self.pool.member_class(index).unwrap_or_default().to_string();

                let (params, ret) = parse_method_descriptor(&descriptor).ok_or_else(|| {
                    VerifyError::BadDescriptor {
                        method: self.method.clone(),
                        descriptor: descriptor.clone(),
                    }
                })?;

                for param in params.iter().rev() {
                    let value = self.pop(frame, pc)?;
                    if !assignable(&value, param) {
                        return Err(self.wrong_operand(pc));
                    }
                }

                if opcode != op::INVOKESTATIC {
                    let receiver = self.pop(frame, pc)?;
                    match receiver {
                        VType::Ref(_) => {}
                        VType::UninitThis | VType::Uninit(_)
                            if opcode == op::INVOKESPECIAL && member_name == "<init>" =>
                        {
                            // Construction initializes every alias of the
                            // receiver in the frame
                            let initialized = VType::Ref(match receiver {
                                VType::UninitThis => self.class.to_string(),
                                _ => owner,
                            });
                            for slot in frame.locals.iter_mut().chain(frame.stack.iter_mut()) {
                                if *slot == receiver {
                                    *slot = initialized.clone();
                                }
                            }
                        }
                        _ => return Err(self.wrong_operand(pc)),
                    }
                }

                if let Some(ret) = ret {
                    frame.stack.push(ret);
                }
            }

            op::NEW => {
                frame.stack.push(VType::Uninit(pc as u16));
            }

            op::ATHROW => {
                self.pop_ref(frame, pc)?;
                terminal = true;
            }

            other => {
                return Err(VerifyError::UnknownOpcode {
                    method: self.method.clone(),
                    at: pc,
                    opcode: other,
                })
            }
        }

        let fallthrough = if terminal {
            None
        } else if next >= self.code.len() {
            return Err(VerifyError::FallsOffEnd { method: self.method.clone() });
        } else {
            Some(next)
        };

        Ok(Step { fallthrough, jumps })
    }

    fn field_type(&mut self, pc: usize) -> Result<VType, VerifyError> {
        let index = u16::from_be_bytes([self.code[pc + 1], self.code[pc + 2]]);
        let descriptor = self.pool.member_descriptor(index).ok_or_else(|| {
            VerifyError::UnsupportedConstant { method: self.method.clone(), at: pc }
        })?;
        parse_field_type(descriptor).ok_or_else(|| VerifyError::BadDescriptor {
            method: self.method.clone(),
            descriptor: descriptor.to_string(),
        })
    }

    fn load_int(&self, frame: &mut Frame, slot: u16, pc: usize, max_locals: &mut u16) -> Result<(), VerifyError> {
        *max_locals = (*max_locals).max(slot + 1);
        match frame.locals.get(slot as usize) {
            Some(VType::Int) => {
                frame.stack.push(VType::Int);
                Ok(())
            }
            _ => Err(VerifyError::InvalidLocal { method: self.method.clone(), at: pc, index: slot }),
        }
    }

    fn load_ref(&self, frame: &mut Frame, slot: u16, pc: usize, max_locals: &mut u16) -> Result<(), VerifyError> {
        *max_locals = (*max_locals).max(slot + 1);
        match frame.locals.get(slot as usize) {
            Some(ty @ (VType::Ref(_) | VType::UninitThis | VType::Uninit(_))) => {
                let ty = ty.clone();
                frame.stack.push(ty);
                Ok(())
            }
            _ => Err(VerifyError::InvalidLocal { method: self.method.clone(), at: pc, index: slot }),
        }
    }

    fn store(&self, frame: &mut Frame, slot: u16, expected: VType, pc: usize, max_locals: &mut u16) -> Result<(), VerifyError> {
        let value = self.pop(frame, pc)?;
        if !assignable(&value, &expected) {
            return Err(self.wrong_operand(pc));
        }
        self.put_local(frame, slot, value, max_locals);
        Ok(())
    }

    fn put_local(&self, frame: &mut Frame, slot: u16, value: VType, max_locals: &mut u16) {
        *max_locals = (*max_locals).max(slot + 1);
        let slot = slot as usize;
        if frame.locals.len() <= slot {
            frame.locals.resize(slot + 1, VType::Top);
        }
        frame.locals[slot] = value;
    }

    fn pop(&self, frame: &mut Frame, pc: usize) -> Result<VType, VerifyError> {
        frame.stack.pop().ok_or_else(|| VerifyError::StackUnderflow {
            method: self.method.clone(),
            at: pc,
        })
    }

    fn pop_int(&self, frame: &mut Frame, pc: usize) -> Result<(), VerifyError> {
        match self.pop(frame, pc)? {
            VType::Int => Ok(()),
            _ => Err(self.wrong_operand(pc)),
        }
    }

    fn pop_ref(&self, frame: &mut Frame, pc: usize) -> Result<VType, VerifyError> {
        match self.pop(frame, pc)? {
            ty @ (VType::Ref(_) | VType::UninitThis | VType::Uninit(_)) => Ok(ty),
            _ => Err(self.wrong_operand(pc)),
        }
    }

    fn wrong_operand(&self, pc: usize) -> VerifyError {
        VerifyError::WrongOperandType { method: self.method.clone(), at: pc }
    }
}

/// Is `value` usable where `expected` is required? No class hierarchy is
/// modeled: any reference satisfies a reference expectation.
fn assignable(value: &VType, expected: &VType) -> bool {
    match expected {
        VType::Int => *value == VType::Int,
        VType::Double => *value == VType::Double,
        VType::Ref(_) => matches!(value, VType::Ref(_)),
        _ => value == expected,
    }
}

/// Merge `incoming` into the existing in-state at `at`. Returns whether the
/// state changed and the target needs revisiting.
fn merge(existing: &mut Frame, incoming: &Frame, at: usize, method: &str) -> Result<bool, VerifyError> {
    if existing.stack.len() != incoming.stack.len() {
        return Err(VerifyError::FrameConflict { method: method.to_string(), at });
    }

    let mut changed = false;

    for (have, new) in existing.stack.iter_mut().zip(&incoming.stack) {
        if *have == *new {
            continue;
        }
        let merged = match (&*have, new) {
            (VType::Ref(_), VType::Ref(_)) => VType::Ref("java/lang/Object".to_string()),
            _ => return Err(VerifyError::FrameConflict { method: method.to_string(), at }),
        };
        *have = merged;
        changed = true;
    }

    // Locals degrade gracefully: anything inconsistent becomes unusable
    if existing.locals.len() < incoming.locals.len() {
        existing.locals.resize(incoming.locals.len(), VType::Top);
    }
    for index in 0..existing.locals.len() {
        let new = incoming.locals.get(index).cloned().unwrap_or(VType::Top);
        let have = &mut existing.locals[index];
        if *have == new {
            continue;
        }
        let merged = match (&*have, &new) {
            (VType::Ref(_), VType::Ref(_)) => VType::Ref("java/lang/Object".to_string()),
            _ => VType::Top,
        };
        if *have != merged {
            *have = merged;
            changed = true;
        }
    }

    Ok(changed)
}

/// Overwrite a dead byte range with NOPs ending in an ATHROW.
fn neutralize(code: &mut [u8], from: usize, to: usize) {
    for byte in &mut code[from..to - 1] {
        *byte = op::NOP;
    }
    code[to - 1] = op::ATHROW;
}

fn branch_target(code: &[u8], pc: usize) -> usize {
    let offset = i16::from_be_bytes([code[pc + 1], code[pc + 2]]);
    (pc as i64 + offset as i64) as usize
}

/// Offsets of every instruction, by one linear decode from zero.
fn instruction_starts(code: &[u8], method: &str) -> Result<BTreeSet<usize>, VerifyError> {
    let mut starts = BTreeSet::new();
    let mut pc = 0;
    while pc < code.len() {
        starts.insert(pc);
        pc += instruction_length(code[pc], pc, method)?;
    }
    Ok(starts)
}

fn instruction_length(opcode: u8, at: usize, method: &str) -> Result<usize, VerifyError> {
    Ok(match opcode {
        op::NOP
        | op::ICONST_M1..=0x08
        | op::ILOAD_0..=0x1d
        | op::ALOAD_0..=0x2d
        | op::ISTORE_0..=0x3e
        | op::ASTORE_0..=0x4e
        | op::POP
        | op::DUP
        | op::IADD
        | op::ISUB
        | op::IMUL
        | op::IDIV
        | op::IREM
        | op::INEG
        | op::ISHL
        | op::ISHR
        | op::IAND
        | op::IOR
        | op::IXOR
        | op::I2D
        | op::D2I
        | op::IRETURN
        | op::ARETURN
        | op::RETURN
        | op::ATHROW => 1,

        op::BIPUSH | op::LDC | op::ILOAD | op::ALOAD | op::ISTORE | op::ASTORE => 2,

        op::SIPUSH
        | op::IFEQ
        | op::IFNE
        | op::IF_ICMPEQ..=0xa6
        | op::GOTO
        | op::GETSTATIC
        | op::PUTSTATIC
        | op::INVOKEVIRTUAL
        | op::INVOKESPECIAL
        | op::INVOKESTATIC
        | op::NEW => 3,

        other => {
            return Err(VerifyError::UnknownOpcode {
                method: method.to_string(),
                at,
                opcode: other,
            })
        }
    })
}

/// Parse a field descriptor into a verification type.
fn parse_field_type(descriptor: &str) -> Option<VType> {
    let mut chars = descriptor.chars();
    let ty = match chars.next()? {
        'I' | 'Z' | 'C' | 'B' | 'S' => VType::Int,
        'D' => VType::Double,
        'L' => {
            let name = descriptor.strip_prefix('L')?.strip_suffix(';')?;
            VType::Ref(name.to_string())
        }
        // Array classes are named by their whole descriptor
        '[' => VType::Ref(descriptor.to_string()),
        _ => return None,
    };
    Some(ty)
}

/// Parse `(args)ret` into parameter types and an optional return type.
fn parse_method_descriptor(descriptor: &str) -> Option<(Vec<VType>, Option<VType>)> {
    let inner = descriptor.strip_prefix('(')?;
    let close = inner.find(')')?;
    let (args, ret) = (&inner[..close], &inner[close + 1..]);

    let mut params = Vec::new();
    let mut rest = args;
    while !rest.is_empty() {
        let len = field_type_len(rest)?;
        params.push(parse_field_type(&rest[..len])?);
        rest = &rest[len..];
    }

    let return_type = match ret {
        "V" => None,
        other => Some(parse_field_type(other)?),
    };

    Some((params, return_type))
}

/// Length in characters of the first field type in `s`.
fn field_type_len(s: &str) -> Option<usize> {
    let mut len = 0;
    let bytes = s.as_bytes();
    while bytes.get(len) == Some(&b'[') {
        len += 1;
    }
    match bytes.get(len)? {
        b'L' => Some(len + s[len..].find(';')? + 1),
        b'I' | b'Z' | b'C' | b'B' | b'S' | b'D' | b'J' | b'F' => Some(len + 1),
        _ => None,
    }
}

/// Serialize frames as a StackMapTable attribute body: entry count followed
/// by `full_frame` entries in offset order.
fn serialize_stack_map(frames: &BTreeMap<usize, Frame>, pool: &mut ConstantPool) -> Vec<u8> {
    const FULL_FRAME: u8 = 255;

    let mut out = Vec::new();
    out.extend_from_slice(&(frames.len() as u16).to_be_bytes());

    let mut previous: Option<usize> = None;
    for (&offset, frame) in frames {
        let delta = match previous {
            None => offset,
            Some(prev) => offset - prev - 1,
        };
        previous = Some(offset);

        out.push(FULL_FRAME);
        out.extend_from_slice(&(delta as u16).to_be_bytes());

        let locals = compress_locals(&frame.locals);
        out.extend_from_slice(&(locals.len() as u16).to_be_bytes());
        for ty in &locals {
            serialize_vtype(ty, pool, &mut out);
        }

        out.extend_from_slice(&(frame.stack.len() as u16).to_be_bytes());
        for ty in &frame.stack {
            serialize_vtype(ty, pool, &mut out);
        }
    }

    out
}

/// Convert the slot-array view of locals to stack-map entries: a double's
/// padding slot disappears and trailing tops are trimmed.
fn compress_locals(locals: &[VType]) -> Vec<VType> {
    let mut entries = Vec::new();
    let mut iter = locals.iter().peekable();
    while let Some(ty) = iter.next() {
        if *ty == VType::Double {
            iter.next_if(|next| **next == VType::Top);
        }
        entries.push(ty.clone());
    }
    while entries.last() == Some(&VType::Top) {
        entries.pop();
    }
    entries
}

fn serialize_vtype(ty: &VType, pool: &mut ConstantPool, out: &mut Vec<u8>) {
    match ty {
        VType::Top => out.push(0),
        VType::Int => out.push(1),
        VType::Double => out.push(3),
        VType::UninitThis => out.push(6),
        VType::Ref(name) => {
            let index = pool.class(name);
            out.push(7);
            out.extend_from_slice(&index.to_be_bytes());
        }
        VType::Uninit(offset) => {
            out.push(8);
            out.extend_from_slice(&offset.to_be_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_descriptors_parse() {
        let (params, ret) = parse_method_descriptor("(IZLjava/lang/String;)V").unwrap();
        assert_eq!(
            params,
            vec![VType::Int, VType::Int, VType::Ref("java/lang/String".to_string())]
        );
        assert_eq!(ret, None);

        let (params, ret) = parse_method_descriptor("(DD)D").unwrap();
        assert_eq!(params, vec![VType::Double, VType::Double]);
        assert_eq!(ret, Some(VType::Double));

        let (params, ret) = parse_method_descriptor("([Ljava/lang/String;)V").unwrap();
        assert_eq!(params, vec![VType::Ref("[Ljava/lang/String;".to_string())]);
        assert_eq!(ret, None);
    }

    #[test]
    fn locals_compress_for_stack_maps() {
        let locals = vec![VType::Int, VType::Double, VType::Top, VType::Int, VType::Top];
        assert_eq!(
            compress_locals(&locals),
            vec![VType::Int, VType::Double, VType::Int]
        );
    }
}
