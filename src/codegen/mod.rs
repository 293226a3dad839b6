//! AST walker: drives the emitter over the program in the fixed order its
//! contracts require, threading the symbol environment.
//!
//! All semantic checks live here (undefined or duplicate names, scalar vs
//! array kind mismatches, index rank, built-in arity); by the time the
//! emitter is called the request is known to be well-formed.
//!
//! Declarations are hoisted: entering a block pre-scans its immediate
//! statements and allocates every array declaration and every first
//! assignment before the block's code runs, so control-flow conditions are
//! evaluated with the block's slots already below them on the tape.

mod builtins;
mod expr;

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::emitter::{footprint, Emitter};
use crate::scope::{ScopeStack, Slot};
use crate::span::Spanned;

/// Result of a successful walk: the primitive stream plus any warnings.
#[derive(Debug)]
pub struct Output {
    pub code: String,
    pub warnings: Vec<Diagnostic>,
}

/// Compile a parsed program to the primitive stream.
pub fn generate(program: &Block, annotate: bool) -> Result<Output, Diagnostic> {
    let mut cg = CodeGen {
        emitter: if annotate {
            Emitter::with_annotations()
        } else {
            Emitter::new()
        },
        scopes: ScopeStack::new(),
        warnings: Vec::new(),
    };
    cg.gen_scoped_block(program)?;
    Ok(Output {
        code: cg.emitter.finish(),
        warnings: cg.warnings,
    })
}

pub(crate) struct CodeGen {
    pub(crate) emitter: Emitter,
    pub(crate) scopes: ScopeStack,
    pub(crate) warnings: Vec<Diagnostic>,
}

impl CodeGen {
    /// A block with its own scope: hoist declarations, walk the statements,
    /// then pop the scope's tape region.
    fn gen_scoped_block(&mut self, stmts: &Block) -> Result<(), Diagnostic> {
        let base = self.emitter.dp();
        self.scopes.enter(base);
        self.hoist(stmts)?;
        for stmt in stmts {
            self.gen_stmt(stmt)?;
        }
        self.emitter.pop(self.emitter.dp() - base);
        self.scopes.exit();
        Ok(())
    }

    /// Allocate every declaration introduced by the block's immediate
    /// statements: explicit array declarations and plain `=` assignments to
    /// names not visible in any enclosing scope.
    fn hoist(&mut self, stmts: &[Spanned<Stmt>]) -> Result<(), Diagnostic> {
        for stmt in stmts {
            match &stmt.node {
                Stmt::ArrayDecl { name, dims } => self.declare_array(name, dims)?,
                Stmt::Assign(assign) => self.hoist_assign(assign),
                _ => {}
            }
        }
        Ok(())
    }

    fn hoist_assign(&mut self, assign: &Assign) {
        if assign.op != AssignOp::Set {
            return;
        }
        if let Place::Var(name) = &assign.place.node {
            if !self.scopes.is_declared(name) {
                let pos = self.emitter.dp();
                self.scopes
                    .declare(name, Slot::Scalar { pos })
                    .expect("fresh name collided");
                self.emitter.load_constant(0);
            }
        }
    }

    fn declare_array(
        &mut self,
        name: &Spanned<String>,
        dims: &[Spanned<Expr>],
    ) -> Result<(), Diagnostic> {
        let mut shape = Vec::with_capacity(dims.len());
        for dim in dims {
            let size = const_eval(dim)?;
            if size == 0 {
                return Err(Diagnostic::error(
                    format!("array '{}' has a zero-sized dimension", name.node),
                    dim.span,
                )
                .with_help("every dimension must be at least 1"));
            }
            if size > 256 {
                self.warnings.push(
                    Diagnostic::warning(
                        format!("dimension {} of array '{}' is larger than 256", size, name.node),
                        dim.span,
                    )
                    .with_note("indices are bytes, so elements past index 255 cannot be reached"),
                );
            }
            shape.push(size);
        }
        let pos = self.emitter.dp();
        let total = footprint(&shape);
        if self
            .scopes
            .declare(
                &name.node,
                Slot::Array {
                    pos,
                    shape: shape.clone(),
                    footprint: total,
                },
            )
            .is_err()
        {
            return Err(Diagnostic::error(
                format!("'{}' is already declared in this scope", name.node),
                name.span,
            ));
        }
        self.emitter.push_multi_dim_array(&shape);
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<(), Diagnostic> {
        match &stmt.node {
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => self.gen_if(cond, then_body, else_body.as_ref()),
            Stmt::While { cond, body } => self.gen_while(cond, body),
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => self.gen_for(init.as_ref(), cond.as_ref(), step.as_ref(), body),
            Stmt::Assign(assign) => self.gen_assign(assign),
            // allocated during hoisting; nothing to emit here
            Stmt::ArrayDecl { .. } => Ok(()),
            Stmt::Call { name, args } => builtins::gen_call(self, name, args, true),
        }
    }

    /// `while`: allocate body-locals, then
    /// `cond; begin_while; body; cond; end_while; pop`.
    fn gen_while(&mut self, cond: &Spanned<Expr>, body: &Block) -> Result<(), Diagnostic> {
        let base = self.emitter.dp();
        self.scopes.enter(base);
        self.hoist(body)?;
        self.gen_expr(cond)?;
        self.emitter.begin_while();
        for stmt in body {
            self.gen_stmt(stmt)?;
        }
        self.gen_expr(cond)?;
        self.emitter.end_while();
        self.emitter.pop(self.emitter.dp() - base);
        self.scopes.exit();
        Ok(())
    }

    /// `if`: allocate the locals of both branches before the condition, then
    /// bracket each branch with its own scope. An absent else still emits
    /// the full `begin_if`/`begin_else`/`end_if` triple.
    fn gen_if(
        &mut self,
        cond: &Spanned<Expr>,
        then_body: &Block,
        else_body: Option<&Block>,
    ) -> Result<(), Diagnostic> {
        let base = self.emitter.dp();

        self.scopes.enter(base);
        self.hoist(then_body)?;
        let then_scope = self.scopes.exit();

        self.scopes.enter(self.emitter.dp());
        if let Some(body) = else_body {
            self.hoist(body)?;
        }
        let else_scope = self.scopes.exit();

        self.gen_expr(cond)?;
        self.emitter.begin_if();
        self.scopes.resume(then_scope);
        for stmt in then_body {
            self.gen_stmt(stmt)?;
        }
        self.scopes.exit();
        self.emitter.begin_else();
        self.scopes.resume(else_scope);
        if let Some(body) = else_body {
            for stmt in body {
                self.gen_stmt(stmt)?;
            }
        }
        self.scopes.exit();
        self.emitter.end_if();
        self.emitter.pop(self.emitter.dp() - base);
        Ok(())
    }

    /// `for (init; cond; step) { body }` desugars to
    /// `init; while (cond) { body; step; }` inside one scope. An omitted
    /// condition is constant true.
    fn gen_for(
        &mut self,
        init: Option<&Assign>,
        cond: Option<&Spanned<Expr>>,
        step: Option<&Assign>,
        body: &Block,
    ) -> Result<(), Diagnostic> {
        let base = self.emitter.dp();
        self.scopes.enter(base);
        if let Some(assign) = init {
            self.hoist_assign(assign);
        }
        self.hoist(body)?;
        if let Some(assign) = step {
            self.hoist_assign(assign);
        }

        if let Some(assign) = init {
            self.gen_assign(assign)?;
        }
        let gen_cond = |cg: &mut Self| match cond {
            Some(expr) => cg.gen_expr(expr),
            None => {
                cg.emitter.load_constant(1);
                Ok(())
            }
        };
        gen_cond(self)?;
        self.emitter.begin_while();
        for stmt in body {
            self.gen_stmt(stmt)?;
        }
        if let Some(assign) = step {
            self.gen_assign(assign)?;
        }
        gen_cond(self)?;
        self.emitter.end_while();
        self.emitter.pop(self.emitter.dp() - base);
        self.scopes.exit();
        Ok(())
    }

    fn gen_assign(&mut self, assign: &Assign) -> Result<(), Diagnostic> {
        let name = assign.place.node.name();
        let slot = match self.scopes.lookup(name) {
            Some(slot) => slot.clone(),
            None => {
                return Err(undefined_name(name, assign.place.span));
            }
        };

        match (&assign.place.node, slot) {
            (Place::Var(_), Slot::Scalar { pos }) => {
                if assign.op == AssignOp::Set {
                    self.gen_expr(&assign.value)?;
                } else {
                    self.emitter.load_variable(pos);
                    self.gen_expr(&assign.value)?;
                    self.apply_assign_op(assign.op);
                }
                self.emitter.store_variable(pos);
                Ok(())
            }
            (Place::Var(_), Slot::Array { .. }) => Err(Diagnostic::error(
                format!("'{}' is an array and cannot be assigned as a whole", name),
                assign.place.span,
            )
            .with_help(format!("assign to an element instead: {}[i] = ...", name))),
            (Place::Element(_, indices), Slot::Array { pos, shape, .. }) => {
                check_rank(name, &shape, indices, assign.place.span)?;
                if assign.op == AssignOp::Set {
                    self.gen_expr(&assign.value)?;
                } else {
                    for index in indices {
                        self.gen_expr(index)?;
                    }
                    self.emitter.multi_dim_load(pos, &shape);
                    self.gen_expr(&assign.value)?;
                    self.apply_assign_op(assign.op);
                }
                for index in indices {
                    self.gen_expr(index)?;
                }
                self.emitter.multi_dim_store(pos, &shape);
                Ok(())
            }
            (Place::Element(..), Slot::Scalar { .. }) => Err(Diagnostic::error(
                format!("'{}' is a scalar variable, not an array", name),
                assign.place.span,
            )),
        }
    }

    fn apply_assign_op(&mut self, op: AssignOp) {
        match op {
            AssignOp::Set => unreachable!("plain assignment has no operator"),
            AssignOp::Add => self.emitter.add(),
            AssignOp::Sub => self.emitter.subtract(),
            AssignOp::Mul => self.emitter.multiply(),
            AssignOp::Div => self.emitter.divide(),
            AssignOp::Rem => self.emitter.modulo(),
        }
    }
}

pub(crate) fn undefined_name(name: &str, span: crate::span::Span) -> Diagnostic {
    Diagnostic::error(format!("undefined variable or array '{}'", name), span)
        .with_help("assign to a name to declare a variable, or declare an array like a[10];")
}

pub(crate) fn check_rank(
    name: &str,
    shape: &[u32],
    indices: &[Spanned<Expr>],
    span: crate::span::Span,
) -> Result<(), Diagnostic> {
    if indices.len() != shape.len() {
        return Err(Diagnostic::error(
            format!(
                "array '{}' has {} dimension(s) but {} index(es) were given",
                name,
                shape.len(),
                indices.len()
            ),
            span,
        ));
    }
    Ok(())
}

/// Evaluate a constant expression (array dimensions). Mirrors the target's
/// wrapping byte arithmetic at every operator so that compile-time and
/// run-time values agree; bare literals pass through unwrapped.
pub(crate) fn const_eval(expr: &Spanned<Expr>) -> Result<u32, Diagnostic> {
    let not_constant = |what: &str| {
        Diagnostic::error(
            format!("array dimensions must be constant expressions ({})", what),
            expr.span,
        )
    };
    match &expr.node {
        Expr::Integer(n) => Ok(*n),
        Expr::Character(c) => Ok(*c as u32),
        Expr::Binary { op, lhs, rhs } => {
            let l = const_eval(lhs)? % 256;
            let r = const_eval(rhs)? % 256;
            let value = match op {
                BinOp::Or => ((l != 0) || (r != 0)) as u32,
                BinOp::And => ((l != 0) && (r != 0)) as u32,
                BinOp::Eq => (l == r) as u32,
                BinOp::Ne => (l != r) as u32,
                BinOp::Lt => (l < r) as u32,
                BinOp::Gt => (l > r) as u32,
                BinOp::Le => (l <= r) as u32,
                BinOp::Ge => (l >= r) as u32,
                BinOp::Add => (l + r) % 256,
                BinOp::Sub => (256 + l - r) % 256,
                BinOp::Mul => (l * r) % 256,
                BinOp::Div => {
                    if r == 0 {
                        return Err(Diagnostic::error(
                            "division by zero in constant expression",
                            expr.span,
                        ));
                    }
                    l / r
                }
                BinOp::Rem => {
                    if r == 0 {
                        return Err(Diagnostic::error(
                            "division by zero in constant expression",
                            expr.span,
                        ));
                    }
                    l % r
                }
            };
            Ok(value)
        }
        Expr::Unary { op, operand } => {
            let v = const_eval(operand)?;
            Ok(match op {
                UnaryOp::Plus => v,
                UnaryOp::Minus => (256 - v % 256) % 256,
                UnaryOp::Not => (v % 256 == 0) as u32,
            })
        }
        Expr::Var(_) | Expr::Element(..) => Err(not_constant("found a variable")),
        Expr::Call { .. } => Err(not_constant("found a function call")),
    }
}
