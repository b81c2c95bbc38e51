//! AST → IR lowering.
//!
//! The generator consumes a type-checked, name-resolved program and the
//! symbol table, and linearizes structured control flow into basic
//! blocks with explicit predecessor/successor edges. Per-function state
//! is the current block and the loop-exit/loop-continue target stacks;
//! the block-name counter lives on the generator so block names are
//! unique across the module.
//!
//! Symbols declared in a module scope are mangled to
//! `<module>__<name>`; everything else keeps its source name. Edges are
//! recorded on both endpoints whenever a JUMP or BRANCH is emitted, so
//! the CFG is symmetric by construction, and instructions emitted into
//! an already-terminated block are dropped (they are unreachable), so
//! every block ends with exactly one terminator.

use crate::ir::{runtime, BasicBlock, BlockId, Function, GlobalVar, Inst, Module, Opcode, Operand};
use crate::target::{CompileMode, TargetTriple};
use hanc_par::ast::*;
use hanc_par::Type;
use hanc_sem::{SymbolKind, SymbolTable};
use hanc_util::{Symbol, SymbolId};

/// Generate an IR module from a checked program
pub fn generate_ir(
    program: &Program,
    table: &SymbolTable,
    target: TargetTriple,
    mode: CompileMode,
) -> Module {
    let mut generator = IrGen {
        table,
        block_counter: 0,
    };
    let mut module = Module::new(target, mode);

    for var in &program.globals {
        module.globals.push(lower_global(var, None));
    }
    for module_decl in &program.modules {
        for var in &module_decl.vars {
            module.globals.push(lower_global(var, Some(module_decl.name)));
        }
    }

    for module_decl in &program.modules {
        for func in &module_decl.functions {
            module
                .functions
                .push(generator.lower_function(func, Some(module_decl.name)));
        }
    }
    for func in &program.functions {
        module.functions.push(generator.lower_function(func, None));
    }

    module
}

fn mangle(module: Symbol, name: Symbol) -> Symbol {
    Symbol::intern(&format!("{module}__{name}"))
}

fn lower_global(var: &VarDecl, module: Option<Symbol>) -> GlobalVar {
    let name = match module {
        Some(module) => mangle(module, var.name),
        None => var.name,
    };
    let ty = var
        .declared_type
        .clone()
        .or_else(|| var.initializer.as_ref().and_then(|init| init.ty.clone()))
        .unwrap_or(Type::Int);
    GlobalVar {
        name,
        ty,
        initializer: var.initializer.clone(),
    }
}

/// Module-wide generator state
struct IrGen<'a> {
    table: &'a SymbolTable,
    /// Monotone counter appended to block-name hints
    block_counter: u32,
}

impl<'a> IrGen<'a> {
    fn block_name(&mut self, hint: &str) -> String {
        let n = self.block_counter;
        self.block_counter += 1;
        format!("{hint}_{n}")
    }

    fn lower_function(&mut self, decl: &FunctionDecl, module: Option<Symbol>) -> Function {
        let name = match module {
            Some(module) => mangle(module, decl.name),
            None => decl.name,
        };
        let return_type = decl.ret.clone().unwrap_or(Type::Int);
        let mut func = Function::new(name, return_type);
        func.is_interrupt_handler = decl.is_interrupt_handler;
        func.interrupt_vector = decl.interrupt_vector;
        for param in &decl.params {
            func.params.push(Operand::SymbolRef {
                name: param.name,
                ty: Some(param.ty.clone()),
            });
        }

        let entry = func.entry;
        let mut fn_gen = FnGen {
            generator: self,
            func,
            current: entry,
            loop_exit: Vec::new(),
            loop_continue: Vec::new(),
        };
        fn_gen.gen_block(&decl.body);

        // Seal the fall-through path.
        fn_gen.emit_ret(Operand::None);
        fn_gen.func
    }
}

/// Per-function lowering state
struct FnGen<'a, 'g> {
    generator: &'g mut IrGen<'a>,
    func: Function,
    current: BlockId,
    loop_exit: Vec<BlockId>,
    loop_continue: Vec<BlockId>,
}

impl<'a, 'g> FnGen<'a, 'g> {
    fn table(&self) -> &'a SymbolTable {
        self.generator.table
    }

    fn new_block(&mut self, hint: &str) -> BlockId {
        let name = self.generator.block_name(hint);
        self.func.add_block(name)
    }

    fn block(&self) -> &BasicBlock {
        &self.func.blocks[self.current]
    }

    fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Append an instruction to the current block
    ///
    /// Instructions after a terminator are unreachable and dropped.
    fn emit(&mut self, inst: Inst) {
        if self.block().is_terminated() {
            return;
        }
        self.func.blocks[self.current].insts.push(inst);
    }

    fn emit_jump(&mut self, target: BlockId) {
        if self.block().is_terminated() {
            return;
        }
        self.func.add_edge(self.current, target);
        self.func.blocks[self.current].insts.push(Inst::new(
            Opcode::Jump,
            Operand::Label(target),
            Operand::None,
            Operand::None,
        ));
    }

    fn emit_branch(&mut self, cond: Operand, then_block: BlockId, else_block: BlockId) {
        if self.block().is_terminated() {
            return;
        }
        self.func.add_edge(self.current, then_block);
        self.func.add_edge(self.current, else_block);
        self.func.blocks[self.current].insts.push(Inst::new(
            Opcode::Branch,
            Operand::Label(then_block),
            cond,
            Operand::Label(else_block),
        ));
    }

    fn emit_ret(&mut self, value: Operand) {
        self.emit(Inst::new(Opcode::Ret, Operand::None, value, Operand::None));
    }

    fn emit_call(&mut self, callee: Operand, args: Vec<Operand>, result: Option<Type>) -> Operand {
        let dest = match result {
            Some(ty) if !matches!(ty, Type::Void) => self.func.alloc_reg(ty),
            _ => Operand::None,
        };
        self.emit(
            Inst::new(Opcode::Call, dest.clone(), callee, Operand::None).with_extra(args),
        );
        dest
    }

    fn runtime_call(&mut self, name: &str, args: Vec<Operand>, result: Option<Type>) -> Operand {
        self.emit_call(Operand::symbol(name, None), args, result)
    }

    /// The addressable operand of a symbol, module-mangled when its
    /// declaring scope is a module scope
    fn symbol_operand(&self, id: SymbolId, ty: Option<Type>) -> Operand {
        let info = self.table().symbol(id);
        let name = match self.table().module_name_of(info.decl_scope) {
            Some(module) => mangle(module, info.name),
            None => info.name,
        };
        Operand::SymbolRef {
            name,
            ty: ty.or_else(|| Some(info.ty.clone())),
        }
    }

    fn expr_ty(expr: &Expr) -> Type {
        expr.ty.clone().unwrap_or(Type::Int)
    }

    // ===========================================================
    // Expressions
    // ===========================================================

    fn gen_expr(&mut self, expr: &Expr) -> Operand {
        match &expr.kind {
            ExprKind::IntLit(value) => Operand::ImmInt {
                value: *value,
                ty: Type::Int,
            },
            ExprKind::FloatLit(value) => Operand::ImmFloat { value: *value },
            ExprKind::BoolLit(value) => Operand::ImmInt {
                value: *value as i64,
                ty: Type::Bool,
            },
            ExprKind::StrLit(payload) => Operand::ImmStr(*payload),
            ExprKind::Null => Operand::ImmInt {
                value: 0,
                ty: Type::address(),
            },
            ExprKind::Ident { name, binding } => self.gen_ident(expr, *name, *binding),
            ExprKind::Binary { op, lhs, rhs } => self.gen_binary(expr, *op, lhs, rhs),
            ExprKind::Logical { op, lhs, rhs } => self.gen_logical(*op, lhs, rhs),
            ExprKind::Unary { op, operand } => self.gen_unary(expr, *op, operand),
            ExprKind::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                let cond = self.gen_expr(cond);
                let true_value = self.gen_expr(then_value);
                let false_value = self.gen_expr(else_value);
                let dest = self.func.alloc_reg(Self::expr_ty(expr));
                self.emit(
                    Inst::new(Opcode::Select, dest.clone(), cond, true_value)
                        .with_extra(vec![false_value]),
                );
                dest
            }
            ExprKind::Assign { target, value } => self.gen_assign(target, value),
            ExprKind::Call { callee, args } => self.gen_call(expr, callee, args),
            ExprKind::Index { base, index } => {
                let base = self.gen_expr(base);
                let index = self.gen_expr(index);
                self.runtime_call(
                    runtime::ARRAY_GET_ELEMENT,
                    vec![base, index, Operand::imm_int(8)],
                    Some(Self::expr_ty(expr)),
                )
            }
            ExprKind::Member {
                object,
                member,
                arrow,
            } => self.gen_member(expr, object, *member, *arrow),
            ExprKind::StructLit { .. } => Operand::AstExpr(Box::new(expr.clone())),
            ExprKind::ArrayLit(elements) => self.gen_array_literal(expr, elements),
            ExprKind::MemoryRead { addr } => {
                let addr = self.gen_expr(addr);
                let dest = self.func.alloc_reg(Self::expr_ty(expr));
                self.emit(Inst::new(Opcode::MemRead, dest.clone(), addr, Operand::None));
                dest
            }
            ExprKind::MemoryWrite { addr, value } => {
                let addr = self.gen_expr(addr);
                let value = self.gen_expr(value);
                self.emit(Inst::new(Opcode::MemWrite, Operand::None, addr, value));
                Operand::None
            }
            ExprKind::MemoryCopy { dest, src, size } => {
                let dest_op = self.gen_expr(dest);
                let src_op = self.gen_expr(src);
                let size_op = self.gen_expr(size);
                self.emit(
                    Inst::new(Opcode::MemCopy, Operand::None, dest_op, src_op)
                        .with_extra(vec![size_op]),
                );
                Operand::None
            }
            ExprKind::MemorySet { addr, value, size } => {
                let addr = self.gen_expr(addr);
                let value = self.gen_expr(value);
                let size = self.gen_expr(size);
                self.emit(
                    Inst::new(Opcode::MemSet, Operand::None, addr, value).with_extra(vec![size]),
                );
                Operand::None
            }
            ExprKind::MemoryMap {
                addr,
                size,
                prot,
                flags,
            } => {
                let addr = self.gen_expr(addr);
                let size = self.gen_expr(size);
                let prot = self.gen_expr(prot);
                let flags = self.gen_expr(flags);
                let dest = self.func.alloc_reg(Type::address());
                self.emit(
                    Inst::new(Opcode::MemMap, dest.clone(), addr, size)
                        .with_extra(vec![prot, flags]),
                );
                dest
            }
            ExprKind::MemoryUnmap { addr, size } => {
                let addr = self.gen_expr(addr);
                let size = self.gen_expr(size);
                self.emit(Inst::new(Opcode::MemUnmap, Operand::None, addr, size));
                Operand::None
            }
            ExprKind::InlineAsm {
                code,
                outputs,
                inputs,
                clobbers,
            } => {
                let code = self.gen_expr(code);
                let operands: Vec<Operand> = outputs
                    .iter()
                    .chain(inputs)
                    .chain(clobbers)
                    .map(|operand| self.gen_expr(operand))
                    .collect();
                self.emit(
                    Inst::new(Opcode::InlineAsm, Operand::None, code, Operand::None)
                        .with_extra(operands),
                );
                Operand::None
            }
        }
    }

    fn gen_ident(&mut self, expr: &Expr, name: Symbol, binding: Option<SymbolId>) -> Operand {
        let Some(id) = binding else {
            // Builtins reach lowering only as callees; anything else was
            // already reported.
            return Operand::SymbolRef {
                name,
                ty: expr.ty.clone(),
            };
        };
        let info = self.table().symbol(id);
        match info.kind {
            // Enum members fold to their integer value.
            SymbolKind::EnumMember { value } => Operand::ImmInt {
                value,
                ty: Type::Int,
            },
            // Function names are addresses, not loads.
            SymbolKind::Function => self.symbol_operand(id, Some(info.ty.clone())),
            _ => {
                let ty = Self::expr_ty(expr);
                let addr = self.symbol_operand(id, Some(ty.clone()));
                let dest = self.func.alloc_reg(ty);
                self.emit(Inst::new(Opcode::Load, dest.clone(), addr, Operand::None));
                dest
            }
        }
    }

    fn gen_binary(&mut self, expr: &Expr, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Operand {
        // `+` that produced a string is concatenation through the
        // runtime, converting non-string sides first.
        if op == BinaryOp::Add && matches!(expr.ty, Some(Type::Str)) {
            let lhs_op = self.gen_expr(lhs);
            let lhs_op = self.to_string_operand(lhs_op, &Self::expr_ty(lhs));
            let rhs_op = self.gen_expr(rhs);
            let rhs_op = self.to_string_operand(rhs_op, &Self::expr_ty(rhs));
            return self.runtime_call(
                runtime::STRING_CONCAT,
                vec![lhs_op, rhs_op],
                Some(Type::Str),
            );
        }

        let lhs_op = self.gen_expr(lhs);
        let rhs_op = self.gen_expr(rhs);
        let dest = self.func.alloc_reg(Self::expr_ty(expr));
        let opcode = match op {
            BinaryOp::Add => Opcode::Add,
            BinaryOp::Sub => Opcode::Sub,
            BinaryOp::Mul => Opcode::Mul,
            BinaryOp::Div => Opcode::Div,
            BinaryOp::Mod => Opcode::Mod,
            BinaryOp::Eq => Opcode::Eq,
            BinaryOp::Ne => Opcode::Ne,
            BinaryOp::Lt => Opcode::Lt,
            BinaryOp::Gt => Opcode::Gt,
            BinaryOp::Le => Opcode::Le,
            BinaryOp::Ge => Opcode::Ge,
            BinaryOp::BitAnd => Opcode::And,
            BinaryOp::BitOr => Opcode::Or,
            BinaryOp::BitXor => Opcode::Xor,
            BinaryOp::Shl => Opcode::Shl,
            BinaryOp::Shr => Opcode::Shr,
        };
        self.emit(Inst::new(opcode, dest.clone(), lhs_op, rhs_op));
        dest
    }

    fn to_string_operand(&mut self, operand: Operand, ty: &Type) -> Operand {
        let conversion = match ty {
            Type::Int => runtime::INT_TO_STRING,
            Type::Bool => runtime::BOOL_TO_STRING,
            Type::Float => runtime::FLOAT_TO_STRING,
            _ => return operand,
        };
        self.runtime_call(conversion, vec![operand], Some(Type::Str))
    }

    /// Short-circuit lowering: the right side is only evaluated in its
    /// own block
    fn gen_logical(&mut self, op: LogicalOp, lhs: &Expr, rhs: &Expr) -> Operand {
        let rhs_block = self.new_block("logic_rhs");
        let merge_block = self.new_block("logic_merge");

        let lhs_op = self.gen_expr(lhs);
        match op {
            // AND: a false left short-circuits past the right side.
            LogicalOp::And => self.emit_branch(lhs_op, rhs_block, merge_block),
            // OR: a true left short-circuits.
            LogicalOp::Or => self.emit_branch(lhs_op, merge_block, rhs_block),
        }

        self.switch_to(rhs_block);
        let rhs_op = self.gen_expr(rhs);
        self.emit_jump(merge_block);

        self.switch_to(merge_block);
        rhs_op
    }

    fn gen_unary(&mut self, expr: &Expr, op: UnaryOp, operand_expr: &Expr) -> Operand {
        match op {
            UnaryOp::Not | UnaryOp::BitNot => {
                let operand = self.gen_expr(operand_expr);
                let dest = self.func.alloc_reg(Self::expr_ty(expr));
                self.emit(Inst::new(Opcode::Not, dest.clone(), operand, Operand::None));
                dest
            }
            UnaryOp::Neg => {
                let operand = self.gen_expr(operand_expr);
                let dest = self.func.alloc_reg(Self::expr_ty(expr));
                self.emit(Inst::new(Opcode::Neg, dest.clone(), operand, Operand::None));
                dest
            }
            UnaryOp::AddrOf => {
                let dest = self.func.alloc_reg(Self::expr_ty(expr));
                if let Some(addr) = self.lvalue_symbol(operand_expr) {
                    self.emit(Inst::new(Opcode::AddressOf, dest.clone(), addr, Operand::None));
                }
                dest
            }
            UnaryOp::Deref => {
                let operand = self.gen_expr(operand_expr);
                let dest = self.func.alloc_reg(Self::expr_ty(expr));
                self.emit(Inst::new(Opcode::Deref, dest.clone(), operand, Operand::None));
                dest
            }
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                let operand = self.gen_expr(operand_expr);
                let ty = Self::expr_ty(expr);
                let one = Operand::ImmInt {
                    value: 1,
                    ty: ty.clone(),
                };
                let dest = self.func.alloc_reg(ty);
                let opcode = match op {
                    UnaryOp::PreInc | UnaryOp::PostInc => Opcode::Add,
                    _ => Opcode::Sub,
                };
                self.emit(Inst::new(opcode, dest.clone(), operand.clone(), one));
                if let Some(addr) = self.lvalue_symbol(operand_expr) {
                    self.emit(Inst::new(Opcode::Store, addr, dest.clone(), Operand::None));
                }
                // Prefix forms return the post-update value, postfix
                // forms the pre-update value.
                match op {
                    UnaryOp::PreInc | UnaryOp::PreDec => dest,
                    _ => operand,
                }
            }
        }
    }

    /// The address operand of an identifier lvalue
    fn lvalue_symbol(&self, expr: &Expr) -> Option<Operand> {
        if let ExprKind::Ident {
            name,
            binding,
        } = &expr.kind
        {
            return Some(match binding {
                Some(id) => self.symbol_operand(*id, expr.ty.clone()),
                None => Operand::SymbolRef {
                    name: *name,
                    ty: expr.ty.clone(),
                },
            });
        }
        None
    }

    fn gen_assign(&mut self, target: &Expr, value: &Expr) -> Operand {
        let value_op = self.gen_expr(value);
        match &target.kind {
            ExprKind::Ident { .. } => {
                if let Some(addr) = self.lvalue_symbol(target) {
                    self.emit(Inst::new(
                        Opcode::Store,
                        addr,
                        value_op.clone(),
                        Operand::None,
                    ));
                }
            }
            ExprKind::Index { base, index } => {
                let base = self.gen_expr(base);
                let index = self.gen_expr(index);
                self.runtime_call(
                    runtime::ARRAY_SET_ELEMENT,
                    vec![base, index, value_op.clone(), Operand::imm_int(8)],
                    None,
                );
            }
            ExprKind::Member {
                object,
                member,
                arrow,
            } => {
                let mut object_op = self.gen_expr(object);
                if *arrow {
                    let pointee = match Self::expr_ty(object) {
                        Type::Pointer(inner) => *inner,
                        other => other,
                    };
                    let deref = self.func.alloc_reg(pointee);
                    self.emit(Inst::new(Opcode::Deref, deref.clone(), object_op, Operand::None));
                    object_op = deref;
                }
                // Fold the member address, then store through it.
                let addr = self.func.alloc_reg(Self::expr_ty(target));
                let member_op = Operand::SymbolRef {
                    name: *member,
                    ty: None,
                };
                self.emit(Inst::new(
                    Opcode::MemberAccess,
                    addr.clone(),
                    object_op,
                    member_op,
                ));
                self.emit(Inst::new(Opcode::Store, addr, value_op.clone(), Operand::None));
            }
            ExprKind::Unary {
                op: UnaryOp::Deref,
                operand,
            } => {
                let addr = self.gen_expr(operand);
                self.emit(Inst::new(
                    Opcode::Store,
                    addr,
                    value_op.clone(),
                    Operand::None,
                ));
            }
            _ => {}
        }
        // The assignment's result is the stored value.
        value_op
    }

    fn gen_call(&mut self, expr: &Expr, callee: &Expr, args: &[Expr]) -> Operand {
        // Method-style `x.长度()` is rewritten to the function-style
        // form before lowering.
        if let ExprKind::Member { object, member, .. } = &callee.kind {
            if member.as_str() == "长度" {
                return self.gen_length_call(expr, object);
            }
        }

        if let ExprKind::Ident { name, binding } = &callee.kind {
            let is_user_symbol = binding.is_some();
            if !is_user_symbol {
                match name.as_str() {
                    "长度" if args.len() == 1 => {
                        return self.gen_length_call(expr, &args[0]);
                    }
                    "打印" if args.len() == 1 => {
                        let arg_ty = Self::expr_ty(&args[0]);
                        let print_fn = match arg_ty {
                            Type::Int => runtime::PRINT_INT,
                            Type::Bool => runtime::PRINT_BOOL,
                            Type::Float => runtime::PRINT_FLOAT,
                            _ => runtime::PRINT_STRING,
                        };
                        let arg = self.gen_expr(&args[0]);
                        return self.runtime_call(print_fn, vec![arg], None);
                    }
                    "打印整数" => {
                        let lowered = args.iter().map(|a| self.gen_expr(a)).collect();
                        return self.runtime_call(runtime::PRINT_INT, lowered, None);
                    }
                    "打印字符串" => {
                        let lowered = args.iter().map(|a| self.gen_expr(a)).collect();
                        return self.runtime_call(runtime::PRINT_STRING, lowered, None);
                    }
                    _ => {}
                }
            }
        }

        let callee_op = match &callee.kind {
            // A bound identifier callee is a direct symbol reference
            // (module-mangled when declared in a module scope).
            ExprKind::Ident {
                binding: Some(id), ..
            } => self.symbol_operand(*id, callee.ty.clone()),
            _ => self.gen_expr(callee),
        };
        let lowered: Vec<Operand> = args.iter().map(|arg| self.gen_expr(arg)).collect();
        self.emit_call(callee_op, lowered, expr.ty.clone())
    }

    fn gen_length_call(&mut self, expr: &Expr, operand_expr: &Expr) -> Operand {
        let runtime_fn = match Self::expr_ty(operand_expr) {
            Type::Array { .. } => runtime::ARRAY_LENGTH,
            _ => runtime::STRING_LENGTH,
        };
        let operand = self.gen_expr(operand_expr);
        self.runtime_call(runtime_fn, vec![operand], Some(Self::expr_ty(expr)))
    }

    fn gen_member(&mut self, expr: &Expr, object: &Expr, member: Symbol, arrow: bool) -> Operand {
        // Enum member access folds to the member's integer value.
        if let Some(Type::Enum { members, .. }) = &object.ty {
            if let Some(found) = members.iter().find(|m| m.name == member) {
                return Operand::ImmInt {
                    value: found.value,
                    ty: Type::Int,
                };
            }
        }
        if let ExprKind::Ident { binding, .. } = &object.kind {
            if let Some(info) = binding.map(|id| self.table().symbol(id)) {
                match info.kind {
                    SymbolKind::Enum => {
                        if let Type::Enum { members, .. } = &info.ty {
                            if let Some(found) = members.iter().find(|m| m.name == member) {
                                return Operand::ImmInt {
                                    value: found.value,
                                    ty: Type::Int,
                                };
                            }
                        }
                    }
                    // Module member access becomes the mangled symbol.
                    SymbolKind::Module { .. } | SymbolKind::ImportAlias { .. } => {
                        let module = match info.kind {
                            SymbolKind::Module { .. } => info.name,
                            _ => {
                                let SymbolKind::ImportAlias { target } = info.kind else {
                                    unreachable!()
                                };
                                self.table()
                                    .module_name_of(target)
                                    .unwrap_or(info.name)
                            }
                        };
                        return Operand::SymbolRef {
                            name: mangle(module, member),
                            ty: expr.ty.clone(),
                        };
                    }
                    _ => {}
                }
            }
        }

        // Struct member read.
        let mut object_op = self.gen_expr(object);
        if arrow {
            let pointee = match Self::expr_ty(object) {
                Type::Pointer(inner) => *inner,
                other => other,
            };
            let deref = self.func.alloc_reg(pointee);
            self.emit(Inst::new(Opcode::Deref, deref.clone(), object_op, Operand::None));
            object_op = deref;
        }
        let dest = self.func.alloc_reg(Self::expr_ty(expr));
        let member_op = Operand::SymbolRef {
            name: member,
            ty: None,
        };
        self.emit(Inst::new(
            Opcode::MemberAccess,
            dest.clone(),
            object_op,
            member_op,
        ));
        dest
    }

    fn gen_array_literal(&mut self, expr: &Expr, elements: &[Expr]) -> Operand {
        let array = self.runtime_call(
            runtime::ARRAY_ALLOC,
            vec![Operand::imm_int(8), Operand::imm_int(elements.len() as i64)],
            Some(Self::expr_ty(expr)),
        );
        for (index, element) in elements.iter().enumerate() {
            let value = self.gen_expr(element);
            self.runtime_call(
                runtime::ARRAY_SET_ELEMENT,
                vec![
                    array.clone(),
                    Operand::imm_int(index as i64),
                    value,
                    Operand::imm_int(8),
                ],
                None,
            );
        }
        array
    }

    // ===========================================================
    // Statements
    // ===========================================================

    fn gen_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.gen_stmt(stmt);
        }
    }

    fn gen_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl(decl) => {
                let ty = decl
                    .declared_type
                    .clone()
                    .or_else(|| decl.initializer.as_ref().and_then(|init| init.ty.clone()))
                    .unwrap_or(Type::Int);
                let addr = Operand::SymbolRef {
                    name: decl.name,
                    ty: Some(ty),
                };
                self.emit(Inst::new(
                    Opcode::Alloca,
                    addr.clone(),
                    Operand::None,
                    Operand::None,
                ));
                if let Some(init) = &decl.initializer {
                    let value = self.gen_expr(init);
                    self.emit(Inst::new(Opcode::Store, addr, value, Operand::None));
                }
            }
            StmtKind::Expr(expr) => {
                self.gen_expr(expr);
            }
            StmtKind::Return(value) => {
                let operand = match value {
                    Some(value) => self.gen_expr(value),
                    None => Operand::None,
                };
                self.emit_ret(operand);
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => self.gen_if(cond, then_block, else_block.as_ref()),
            StmtKind::While { cond, body } => self.gen_while(cond, body),
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => self.gen_for(init.as_deref(), cond.as_ref(), update.as_ref(), body),
            StmtKind::Switch { scrutinee, cases } => self.gen_switch(scrutinee, cases),
            StmtKind::Break => {
                if let Some(&target) = self.loop_exit.last() {
                    self.emit_jump(target);
                }
            }
            StmtKind::Continue => {
                if let Some(&target) = self.loop_continue.last() {
                    self.emit_jump(target);
                }
            }
            StmtKind::Block(block) => self.gen_block(block),
        }
    }

    fn gen_if(&mut self, cond: &Expr, then_block: &Block, else_block: Option<&Block>) {
        let then_bb = self.new_block("if_then");
        let else_bb = else_block.map(|_| self.new_block("if_else"));
        let merge_bb = self.new_block("if_merge");

        let cond_op = self.gen_expr(cond);
        let false_target = else_bb.unwrap_or(merge_bb);
        self.emit_branch(cond_op, then_bb, false_target);

        self.switch_to(then_bb);
        self.gen_block(then_block);
        self.emit_jump(merge_bb);

        if let (Some(else_bb), Some(else_block)) = (else_bb, else_block) {
            self.switch_to(else_bb);
            self.gen_block(else_block);
            self.emit_jump(merge_bb);
        }

        self.switch_to(merge_bb);
    }

    fn gen_while(&mut self, cond: &Expr, body: &Block) {
        let cond_bb = self.new_block("while_cond");
        let body_bb = self.new_block("while_body");
        let exit_bb = self.new_block("while_exit");

        self.emit_jump(cond_bb);

        self.switch_to(cond_bb);
        let cond_op = self.gen_expr(cond);
        self.emit_branch(cond_op, body_bb, exit_bb);

        self.loop_exit.push(exit_bb);
        self.loop_continue.push(cond_bb);

        self.switch_to(body_bb);
        self.gen_block(body);
        // The loop back edge.
        self.emit_jump(cond_bb);

        self.loop_exit.pop();
        self.loop_continue.pop();

        self.switch_to(exit_bb);
    }

    fn gen_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        update: Option<&Expr>,
        body: &Block,
    ) {
        if let Some(init) = init {
            self.gen_stmt(init);
        }

        let cond_bb = self.new_block("for_cond");
        let body_bb = self.new_block("for_body");
        let update_bb = self.new_block("for_update");
        let exit_bb = self.new_block("for_exit");

        self.emit_jump(cond_bb);

        self.switch_to(cond_bb);
        match cond {
            Some(cond) => {
                let cond_op = self.gen_expr(cond);
                self.emit_branch(cond_op, body_bb, exit_bb);
            }
            None => self.emit_jump(body_bb),
        }

        self.loop_exit.push(exit_bb);
        self.loop_continue.push(update_bb);

        self.switch_to(body_bb);
        self.gen_block(body);
        self.emit_jump(update_bb);

        self.switch_to(update_bb);
        if let Some(update) = update {
            self.gen_expr(update);
        }
        self.emit_jump(cond_bb);

        self.loop_exit.pop();
        self.loop_continue.pop();

        self.switch_to(exit_bb);
    }

    /// Switch lowers to a chain of equality tests; every case body jumps
    /// to the merge block (no fall-through). `中断` inside a case also
    /// targets the merge block.
    fn gen_switch(&mut self, scrutinee: &Expr, cases: &[SwitchCase]) {
        let scrutinee_op = self.gen_expr(scrutinee);
        let merge_bb = self.new_block("switch_merge");

        let case_blocks: Vec<BlockId> = cases
            .iter()
            .map(|case| {
                let hint = if case.value.is_none() {
                    "case_default"
                } else {
                    "case_body"
                };
                self.new_block(hint)
            })
            .collect();
        let default_bb = cases
            .iter()
            .position(|case| case.value.is_none())
            .map(|i| case_blocks[i]);

        // The test chain.
        let valued: Vec<usize> = (0..cases.len())
            .filter(|&i| cases[i].value.is_some())
            .collect();
        if valued.is_empty() {
            self.emit_jump(default_bb.unwrap_or(merge_bb));
        } else {
            for (chain_pos, &case_index) in valued.iter().enumerate() {
                let value = cases[case_index].value.as_ref().unwrap();
                let value_op = self.gen_expr(value);
                let cmp = self.func.alloc_reg(Type::Bool);
                self.emit(Inst::new(
                    Opcode::Eq,
                    cmp.clone(),
                    scrutinee_op.clone(),
                    value_op,
                ));
                let fallback = if chain_pos + 1 < valued.len() {
                    self.new_block("switch_check")
                } else {
                    // The final fallback is the default branch when
                    // present, the merge block otherwise.
                    default_bb.unwrap_or(merge_bb)
                };
                self.emit_branch(cmp, case_blocks[case_index], fallback);
                self.switch_to(fallback);
            }
        }

        self.loop_exit.push(merge_bb);
        for (case, &block) in cases.iter().zip(&case_blocks) {
            self.switch_to(block);
            self.gen_block(&case.body);
            self.emit_jump(merge_bb);
        }
        self.loop_exit.pop();

        self.switch_to(merge_bb);
    }
}
