//! Expression walking. Evaluation is strictly left-to-right: every
//! sub-expression leaves exactly one value on the stack, and later
//! sub-expressions rely on the layout the earlier ones produced.

use super::{builtins, check_rank, undefined_name, CodeGen};
use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::scope::Slot;
use crate::span::Spanned;

impl CodeGen {
    /// Emit code that pushes the expression's value. Net Δdp = +1.
    pub(crate) fn gen_expr(&mut self, expr: &Spanned<Expr>) -> Result<(), Diagnostic> {
        match &expr.node {
            Expr::Integer(n) => {
                self.emitter.load_constant(*n);
                Ok(())
            }
            Expr::Character(c) => {
                self.emitter.load_constant(*c as u32);
                Ok(())
            }
            Expr::Var(name) => match self.scopes.lookup(name) {
                Some(Slot::Scalar { pos }) => {
                    let pos = *pos;
                    self.emitter.load_variable(pos);
                    Ok(())
                }
                Some(Slot::Array { .. }) => Err(Diagnostic::error(
                    format!("'{}' is an array, not a scalar value", name),
                    expr.span,
                )
                .with_help(format!("index it like {}[i], or print it with putarr", name))),
                None => Err(undefined_name(name, expr.span)),
            },
            Expr::Element(name, indices) => {
                let (pos, shape) = match self.scopes.lookup(name) {
                    Some(Slot::Array { pos, shape, .. }) => (*pos, shape.clone()),
                    Some(Slot::Scalar { .. }) => {
                        return Err(Diagnostic::error(
                            format!("'{}' is a scalar variable, not an array", name),
                            expr.span,
                        ));
                    }
                    None => return Err(undefined_name(name, expr.span)),
                };
                check_rank(name, &shape, indices, expr.span)?;
                for index in indices {
                    self.gen_expr(index)?;
                }
                self.emitter.multi_dim_load(pos, &shape);
                Ok(())
            }
            Expr::Binary { op, lhs, rhs } => {
                self.gen_expr(lhs)?;
                self.gen_expr(rhs)?;
                match op {
                    BinOp::Or => self.emitter.boolor(),
                    BinOp::And => self.emitter.booland(),
                    BinOp::Eq => self.emitter.equal(),
                    BinOp::Ne => self.emitter.notequal(),
                    BinOp::Lt => self.emitter.less_than(),
                    BinOp::Gt => self.emitter.greater_than(),
                    BinOp::Le => self.emitter.less_or_equal(),
                    BinOp::Ge => self.emitter.greater_or_equal(),
                    BinOp::Add => self.emitter.add(),
                    BinOp::Sub => self.emitter.subtract(),
                    BinOp::Mul => self.emitter.multiply(),
                    BinOp::Div => self.emitter.divide(),
                    BinOp::Rem => self.emitter.modulo(),
                }
                Ok(())
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Plus => self.gen_expr(operand),
                // (0 - x) mod 256, matching the run-time subtract
                UnaryOp::Minus => {
                    self.emitter.load_constant(0);
                    self.gen_expr(operand)?;
                    self.emitter.subtract();
                    Ok(())
                }
                UnaryOp::Not => {
                    self.gen_expr(operand)?;
                    self.emitter.boolnot();
                    Ok(())
                }
            },
            Expr::Call { name, args } => builtins::gen_call(self, name, args, false),
        }
    }
}
