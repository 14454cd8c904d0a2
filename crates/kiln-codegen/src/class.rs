// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Whole-class generation: fields, initializers, methods, entry point.

use std::collections::HashMap;

use kiln_ast::expr::{Expr, ExprKind, Value};
use kiln_ast::symbol::{FnDecl, SymbolKind};
use kiln_ast::ty::Type;
use kiln_ast::Program;
use kiln_classfile::{op, ClassFile, CodeBuilder, ACC_PUBLIC, ACC_STATIC};
use kiln_types::TypeMap;

use crate::bytecode;
use crate::gen::CodeGen;
use crate::vars::Variables;
use crate::CodegenError;

/// Generates the output class for a checked program.
pub struct ClassGenerator<'a> {
    program: &'a Program,
    types: &'a TypeMap,
    class_name: &'a str,
}

impl<'a> ClassGenerator<'a> {
    pub fn new(program: &'a Program, types: &'a TypeMap, class_name: &'a str) -> Self {
        Self { program, types, class_name }
    }

    /// Emit and verify the class, returning its serialized bytes.
    pub fn run(self) -> Result<Vec<u8>, CodegenError> {
        let mut impls: Vec<&FnDecl> = Vec::new();
        let mut functions: HashMap<String, (Vec<Type>, Type)> = HashMap::new();
        let mut fields: HashMap<String, Type> = HashMap::new();
        let mut constants: HashMap<String, Value> = HashMap::new();
        // Emission order follows program order; the maps are for lookup
        let mut field_order: Vec<(&str, Type, &Expr)> = Vec::new();

        for symbol in &self.program.symbols {
            match &symbol.kind {
                SymbolKind::Static(global) => {
                    let ty = global.binding.ty.value;
                    fields.insert(global.binding.name.value.clone(), ty);
                    field_order.push((global.binding.name.value.as_str(), ty, &global.init));
                }
                SymbolKind::Const(global) => {
                    let ExprKind::Literal(value) = &global.init.kind else {
                        panic!("const {} initializer is not a literal", symbol.name());
                    };
                    constants.insert(global.binding.name.value.clone(), value.clone());
                }
                SymbolKind::Function(f) => {
                    functions.insert(f.name.value.clone(), f.signature());
                    impls.push(f);
                }
            }
        }

        let mut class = ClassFile::new(self.class_name);

        for &(name, ty, _) in &field_order {
            class.add_field(ACC_STATIC, name, bytecode::field_descriptor(ty));
        }

        self.gen_static_init(&mut class, &field_order, &functions, &fields, &constants)?;
        self.gen_constructor(&mut class)?;

        for f in &impls {
            self.gen_function(&mut class, f, &functions, &fields, &constants)?;
        }

        self.gen_entry_point(&mut class)?;

        Ok(class.to_bytes())
    }

    /// `<clinit>`: evaluate each static's initializer into its field.
    fn gen_static_init(
        &self,
        class: &mut ClassFile,
        field_order: &[(&str, Type, &Expr)],
        functions: &HashMap<String, (Vec<Type>, Type)>,
        fields: &HashMap<String, Type>,
        constants: &HashMap<String, Value>,
    ) -> Result<(), CodegenError> {
        let mut gen = CodeGen::new(
            self.class_name,
            functions,
            fields,
            constants,
            self.types,
            Type::Unit,
            class.pool(),
            Variables::new(true),
        );

        for &(name, ty, init) in field_order {
            gen.gen_expr(init);
            gen.store_static(name, ty);
        }

        gen.code.op(op::RETURN);

        let code = gen.code;
        class.add_method(ACC_STATIC, "<clinit>", "()V", code)?;
        Ok(())
    }

    /// The default constructor: delegate to `java/lang/Object`.
    fn gen_constructor(&self, class: &mut ClassFile) -> Result<(), CodegenError> {
        let mut code = CodeBuilder::new();

        code.aload(0);
        code.invoke(class.pool(), op::INVOKESPECIAL, "java/lang/Object", "<init>", "()V");
        code.op(op::RETURN);

        class.add_method(ACC_PUBLIC, "<init>", "()V", code)?;
        Ok(())
    }

    /// One instance method per user function.
    fn gen_function(
        &self,
        class: &mut ClassFile,
        f: &FnDecl,
        functions: &HashMap<String, (Vec<Type>, Type)>,
        fields: &HashMap<String, Type>,
        constants: &HashMap<String, Value>,
    ) -> Result<(), CodegenError> {
        let mut vars = Variables::new(false);
        vars.define_params(&f.params, f.body.id);

        let mut gen = CodeGen::new(
            self.class_name,
            functions,
            fields,
            constants,
            self.types,
            f.ret,
            class.pool(),
            vars,
        );

        gen.gen_block(&f.body);

        // A value-yielding tail returns it; everything else falls through to
        // a plain return. A body whose every path already returned leaves
        // this unreachable, which the verifier neutralizes.
        if !matches!(f.body.tail.kind, ExprKind::Unit) && f.ret != Type::Unit {
            gen.code.op(bytecode::return_op(f.ret));
        } else {
            gen.code.op(op::RETURN);
        }

        let (params, ret) = f.signature();
        let descriptor = bytecode::method_descriptor(&params, ret);

        let code = gen.code;
        class.add_method(0, &f.name.value, &descriptor, code)?;
        Ok(())
    }

    /// `public static main([Ljava/lang/String;)V`: instantiate the class and
    /// invoke the user's `main`.
    fn gen_entry_point(&self, class: &mut ClassFile) -> Result<(), CodegenError> {
        let mut code = CodeBuilder::new();

        code.new_object(class.pool(), self.class_name);
        code.op(op::DUP);
        code.invoke(class.pool(), op::INVOKESPECIAL, self.class_name, "<init>", "()V");
        code.invoke(class.pool(), op::INVOKEVIRTUAL, self.class_name, "main", "()V");
        code.op(op::RETURN);

        class.add_method(
            ACC_PUBLIC | ACC_STATIC,
            "main",
            "([Ljava/lang/String;)V",
            code,
        )?;
        Ok(())
    }
}
