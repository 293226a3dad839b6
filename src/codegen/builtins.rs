//! The fixed set of built-in calls, expanded inline into emitter operations.
//!
//! `putchar`, `putint`, `putarr`, and `swap` are statements; `getchar` and
//! `getint` produce a value and may appear in expressions (used as a bare
//! statement, the value is popped).

use super::{check_rank, undefined_name, CodeGen};
use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::scope::Slot;
use crate::span::{Span, Spanned};

pub(crate) fn gen_call(
    cg: &mut CodeGen,
    name: &Spanned<String>,
    args: &[Spanned<Expr>],
    as_statement: bool,
) -> Result<(), Diagnostic> {
    match name.node.as_str() {
        "putchar" => {
            check_arity(name, args, 1)?;
            statement_only(name, as_statement)?;
            cg.gen_expr(&args[0])?;
            cg.emitter.put_character();
            Ok(())
        }
        "getchar" => {
            check_arity(name, args, 0)?;
            cg.emitter.get_character();
            if as_statement {
                cg.emitter.pop(1);
            }
            Ok(())
        }
        "putint" => {
            check_arity(name, args, 1)?;
            statement_only(name, as_statement)?;
            cg.gen_expr(&args[0])?;
            gen_putint(cg);
            Ok(())
        }
        "getint" => {
            check_arity(name, args, 0)?;
            gen_getint(cg);
            if as_statement {
                cg.emitter.pop(1);
            }
            Ok(())
        }
        "putarr" => {
            check_arity(name, args, 1)?;
            statement_only(name, as_statement)?;
            gen_putarr(cg, &args[0])
        }
        "swap" => {
            check_arity(name, args, 2)?;
            statement_only(name, as_statement)?;
            gen_swap(cg, &args[0], &args[1])
        }
        other => Err(Diagnostic::error(
            format!("unknown function '{}'", other),
            name.span,
        )
        .with_help("built-in functions: putchar, getchar, putint, getint, putarr, swap")),
    }
}

fn check_arity(
    name: &Spanned<String>,
    args: &[Spanned<Expr>],
    expected: usize,
) -> Result<(), Diagnostic> {
    if args.len() != expected {
        return Err(Diagnostic::error(
            format!(
                "'{}' expects {} argument(s), got {}",
                name.node,
                expected,
                args.len()
            ),
            name.span,
        ));
    }
    Ok(())
}

fn statement_only(name: &Spanned<String>, as_statement: bool) -> Result<(), Diagnostic> {
    if !as_statement {
        return Err(Diagnostic::error(
            format!("'{}' does not produce a value", name.node),
            name.span,
        )
        .with_help("only getchar() and getint() can appear inside expressions"));
    }
    Ok(())
}

/// Print the byte on top of the stack as decimal, leading zeros suppressed.
/// The hundreds and tens digits are printed under `if` brackets; the final
/// units digit consumes the value. Net Δdp = −1.
fn gen_putint(cg: &mut CodeGen) {
    let e = &mut cg.emitter;
    let target = e.dp() - 1;

    e.load_variable(target);
    e.load_constant(100);
    e.greater_or_equal();
    e.begin_if();
    e.load_variable(target);
    e.load_constant(100);
    e.divide();
    e.load_constant(b'0' as u32);
    e.add();
    e.put_character();
    e.begin_else();
    e.end_if();

    e.load_variable(target);
    e.load_constant(10);
    e.greater_or_equal();
    e.begin_if();
    e.load_variable(target);
    e.load_constant(100);
    e.modulo();
    e.load_constant(10);
    e.divide();
    e.load_constant(b'0' as u32);
    e.add();
    e.put_character();
    e.begin_else();
    e.end_if();

    e.load_constant(10);
    e.modulo();
    e.load_constant(b'0' as u32);
    e.add();
    e.put_character();
}

/// Read ASCII digits up to a newline, accumulating `acc = acc * 10 + digit`
/// modulo 256. Pushes the result. Net Δdp = +1.
fn gen_getint(cg: &mut CodeGen) {
    let e = &mut cg.emitter;
    let acc = e.dp();
    e.load_constant(0);
    e.load_constant(1);
    e.begin_while();
    let ch = e.dp();
    e.get_character();
    e.load_variable(ch);
    e.load_constant(b'\n' as u32);
    e.notequal();
    e.begin_if();
    e.load_variable(acc);
    e.load_constant(10);
    e.multiply();
    e.load_variable(ch);
    e.load_constant(b'0' as u32);
    e.subtract();
    e.add();
    e.store_variable(acc);
    e.begin_else();
    e.end_if();
    e.load_constant(b'\n' as u32);
    e.notequal();
    e.end_while();
}

fn gen_putarr(cg: &mut CodeGen, arg: &Spanned<Expr>) -> Result<(), Diagnostic> {
    let name = match &arg.node {
        Expr::Var(name) => name,
        _ => {
            return Err(Diagnostic::error(
                "putarr expects the name of an array",
                arg.span,
            ));
        }
    };
    match cg.scopes.lookup(name) {
        Some(Slot::Array { pos, shape, .. }) => {
            let (pos, shape) = (*pos, shape.clone());
            cg.emitter.put_array(pos, &shape);
            Ok(())
        }
        Some(Slot::Scalar { .. }) => Err(Diagnostic::error(
            format!("'{}' is a scalar variable, not an array", name),
            arg.span,
        )),
        None => Err(undefined_name(name, arg.span)),
    }
}

/// What a swap operand resolved to, so it can be stored back into.
enum Target {
    Scalar { pos: usize },
    Element { pos: usize, shape: Vec<u32> },
}

/// Exchange two lvalues: push both values, then store them back in reverse
/// order. No temporary cell is needed.
fn gen_swap(
    cg: &mut CodeGen,
    first: &Spanned<Expr>,
    second: &Spanned<Expr>,
) -> Result<(), Diagnostic> {
    let a = resolve_lvalue(cg, first)?;
    let b = resolve_lvalue(cg, second)?;
    load_lvalue(cg, &a, first)?;
    load_lvalue(cg, &b, second)?;
    store_lvalue(cg, &a, first)?;
    store_lvalue(cg, &b, second)?;
    Ok(())
}

fn resolve_lvalue(cg: &mut CodeGen, arg: &Spanned<Expr>) -> Result<Target, Diagnostic> {
    let bad_operand = |span: Span| {
        Diagnostic::error("swap expects a variable or an array element", span)
            .with_help("swap(a, b) exchanges two assignable places")
    };
    match &arg.node {
        Expr::Var(name) => match cg.scopes.lookup(name) {
            Some(Slot::Scalar { pos }) => Ok(Target::Scalar { pos: *pos }),
            Some(Slot::Array { .. }) => Err(Diagnostic::error(
                format!("'{}' is an array and cannot be swapped as a whole", name),
                arg.span,
            )),
            None => Err(undefined_name(name, arg.span)),
        },
        Expr::Element(name, indices) => match cg.scopes.lookup(name) {
            Some(Slot::Array { pos, shape, .. }) => {
                let (pos, shape) = (*pos, shape.clone());
                check_rank(name, &shape, indices, arg.span)?;
                Ok(Target::Element { pos, shape })
            }
            Some(Slot::Scalar { .. }) => Err(Diagnostic::error(
                format!("'{}' is a scalar variable, not an array", name),
                arg.span,
            )),
            None => Err(undefined_name(name, arg.span)),
        },
        _ => Err(bad_operand(arg.span)),
    }
}

fn load_lvalue(cg: &mut CodeGen, target: &Target, arg: &Spanned<Expr>) -> Result<(), Diagnostic> {
    match target {
        Target::Scalar { pos } => cg.emitter.load_variable(*pos),
        Target::Element { pos, shape } => {
            let indices = element_indices(arg);
            for index in indices {
                cg.gen_expr(index)?;
            }
            cg.emitter.multi_dim_load(*pos, shape);
        }
    }
    Ok(())
}

fn store_lvalue(cg: &mut CodeGen, target: &Target, arg: &Spanned<Expr>) -> Result<(), Diagnostic> {
    match target {
        Target::Scalar { pos } => cg.emitter.store_variable(*pos),
        Target::Element { pos, shape } => {
            let indices = element_indices(arg);
            for index in indices {
                cg.gen_expr(index)?;
            }
            cg.emitter.multi_dim_store(*pos, shape);
        }
    }
    Ok(())
}

fn element_indices(arg: &Spanned<Expr>) -> &[Spanned<Expr>] {
    match &arg.node {
        Expr::Element(_, indices) => indices,
        _ => unreachable!("lvalue was resolved as an element"),
    }
}
