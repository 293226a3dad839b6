use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};

const MAX_NESTING_DEPTH: u32 = 256;

pub struct Parser {
    tokens: Vec<Spanned<Lexeme>>,
    pos: usize,
    depth: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned<Lexeme>>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse a whole program: statements up to end of file.
    pub fn parse_program(mut self) -> Result<Block, Diagnostic> {
        let mut statements = Vec::new();
        while !self.at(&Lexeme::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_statement_list(&mut self) -> Result<Block, Diagnostic> {
        let mut statements = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Spanned<Stmt>, Diagnostic> {
        self.enter_nesting()?;
        let stmt = match &self.current().node {
            Lexeme::If => self.parse_if(),
            Lexeme::While => self.parse_while(),
            Lexeme::For => self.parse_for(),
            Lexeme::Ident(_) => self.parse_ident_statement(),
            _ => Err(self.unexpected("a statement")),
        };
        self.exit_nesting();
        stmt
    }

    fn parse_if(&mut self) -> Result<Spanned<Stmt>, Diagnostic> {
        let start = self.current_span();
        self.expect(&Lexeme::If)?;
        self.expect(&Lexeme::LParen)?;
        let cond = self.parse_expression()?;
        self.expect(&Lexeme::RParen)?;
        self.expect(&Lexeme::LBrace)?;
        let then_body = self.parse_statement_list()?;
        let mut end = self.expect(&Lexeme::RBrace)?;
        let else_body = if self.eat(&Lexeme::Else) {
            self.expect(&Lexeme::LBrace)?;
            let body = self.parse_statement_list()?;
            end = self.expect(&Lexeme::RBrace)?;
            Some(body)
        } else {
            None
        };
        Ok(Spanned::new(
            Stmt::If {
                cond,
                then_body,
                else_body,
            },
            start.merge(end),
        ))
    }

    fn parse_while(&mut self) -> Result<Spanned<Stmt>, Diagnostic> {
        let start = self.current_span();
        self.expect(&Lexeme::While)?;
        self.expect(&Lexeme::LParen)?;
        let cond = self.parse_expression()?;
        self.expect(&Lexeme::RParen)?;
        self.expect(&Lexeme::LBrace)?;
        let body = self.parse_statement_list()?;
        let end = self.expect(&Lexeme::RBrace)?;
        Ok(Spanned::new(Stmt::While { cond, body }, start.merge(end)))
    }

    fn parse_for(&mut self) -> Result<Spanned<Stmt>, Diagnostic> {
        let start = self.current_span();
        self.expect(&Lexeme::For)?;
        self.expect(&Lexeme::LParen)?;
        let init = if self.at(&Lexeme::Semicolon) {
            None
        } else {
            Some(self.parse_assignment_core()?)
        };
        self.expect(&Lexeme::Semicolon)?;
        let cond = if self.at(&Lexeme::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&Lexeme::Semicolon)?;
        let step = if self.at(&Lexeme::RParen) {
            None
        } else {
            Some(self.parse_assignment_core()?)
        };
        self.expect(&Lexeme::RParen)?;
        self.expect(&Lexeme::LBrace)?;
        let body = self.parse_statement_list()?;
        let end = self.expect(&Lexeme::RBrace)?;
        Ok(Spanned::new(
            Stmt::For {
                init,
                cond,
                step,
                body,
            },
            start.merge(end),
        ))
    }

    /// Statement starting with an identifier: a call, an assignment, or an
    /// array declaration (`name[d]...[d];`).
    fn parse_ident_statement(&mut self) -> Result<Spanned<Stmt>, Diagnostic> {
        let start = self.current_span();
        if self.peek_is_lparen() {
            let name = self.expect_ident()?;
            let args = self.parse_call_args()?;
            let end = self.expect(&Lexeme::Semicolon)?;
            return Ok(Spanned::new(Stmt::Call { name, args }, start.merge(end)));
        }

        let name = self.expect_ident()?;
        let mut indices = Vec::new();
        while self.eat(&Lexeme::LBracket) {
            indices.push(self.parse_expression()?);
            self.expect(&Lexeme::RBracket)?;
        }

        if !indices.is_empty() && self.at(&Lexeme::Semicolon) {
            let end = self.expect(&Lexeme::Semicolon)?;
            return Ok(Spanned::new(
                Stmt::ArrayDecl { name, dims: indices },
                start.merge(end),
            ));
        }

        let place = if indices.is_empty() {
            Spanned::new(Place::Var(name.node), name.span)
        } else {
            let span = name.span.merge(indices.last().unwrap().span);
            Spanned::new(Place::Element(name.node, indices), span)
        };
        let assign = self.finish_assignment(place)?;
        let end = self.expect(&Lexeme::Semicolon)?;
        Ok(Spanned::new(Stmt::Assign(assign), start.merge(end)))
    }

    /// An assignment without its trailing semicolon (also used by `for`).
    fn parse_assignment_core(&mut self) -> Result<Assign, Diagnostic> {
        let name = self.expect_ident()?;
        let mut indices = Vec::new();
        while self.eat(&Lexeme::LBracket) {
            indices.push(self.parse_expression()?);
            self.expect(&Lexeme::RBracket)?;
        }
        let place = if indices.is_empty() {
            Spanned::new(Place::Var(name.node), name.span)
        } else {
            let span = name.span.merge(indices.last().unwrap().span);
            Spanned::new(Place::Element(name.node, indices), span)
        };
        self.finish_assignment(place)
    }

    fn finish_assignment(&mut self, place: Spanned<Place>) -> Result<Assign, Diagnostic> {
        let op = match &self.current().node {
            Lexeme::Assign => AssignOp::Set,
            Lexeme::PlusAssign => AssignOp::Add,
            Lexeme::MinusAssign => AssignOp::Sub,
            Lexeme::StarAssign => AssignOp::Mul,
            Lexeme::SlashAssign => AssignOp::Div,
            Lexeme::PercentAssign => AssignOp::Rem,
            _ => return Err(self.unexpected("an assignment operator")),
        };
        self.advance();
        let value = self.parse_expression()?;
        Ok(Assign { place, op, value })
    }

    fn parse_call_args(&mut self) -> Result<Vec<Spanned<Expr>>, Diagnostic> {
        self.expect(&Lexeme::LParen)?;
        let mut args = Vec::new();
        if !self.at(&Lexeme::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(&Lexeme::Comma) {
                    break;
                }
            }
        }
        self.expect(&Lexeme::RParen)?;
        Ok(args)
    }

    // ── expression precedence ladder ──

    fn parse_expression(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        self.enter_nesting()?;
        let expr = self.parse_logical_or();
        self.exit_nesting();
        expr
    }

    fn parse_logical_or(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let mut left = self.parse_logical_and()?;
        while self.eat(&Lexeme::Or) {
            let right = self.parse_logical_and()?;
            left = binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let mut left = self.parse_equality()?;
        while self.eat(&Lexeme::And) {
            let right = self.parse_equality()?;
            left = binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match &self.current().node {
                Lexeme::EqEq => BinOp::Eq,
                Lexeme::NotEq => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match &self.current().node {
                Lexeme::Lt => BinOp::Lt,
                Lexeme::Gt => BinOp::Gt,
                Lexeme::Le => BinOp::Le,
                Lexeme::Ge => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.current().node {
                Lexeme::Plus => BinOp::Add,
                Lexeme::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current().node {
                Lexeme::Star => BinOp::Mul,
                Lexeme::Slash => BinOp::Div,
                Lexeme::Percent => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let op = match &self.current().node {
            Lexeme::Plus => Some(UnaryOp::Plus),
            Lexeme::Minus => Some(UnaryOp::Minus),
            Lexeme::Not => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.enter_nesting()?;
            let start = self.current_span();
            self.advance();
            let operand = self.parse_unary()?;
            self.exit_nesting();
            let span = start.merge(operand.span);
            return Ok(Spanned::new(
                Expr::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        match &self.current().node {
            Lexeme::Integer(n) => {
                let n = *n;
                let span = self.current_span();
                self.advance();
                Ok(Spanned::new(Expr::Integer(n), span))
            }
            Lexeme::Character(c) => {
                let c = *c;
                let span = self.current_span();
                self.advance();
                Ok(Spanned::new(Expr::Character(c), span))
            }
            Lexeme::Ident(_) => {
                if self.peek_is_lparen() {
                    let name = self.expect_ident()?;
                    let start = name.span;
                    let args = self.parse_call_args()?;
                    let span = match args.last() {
                        Some(a) => start.merge(a.span),
                        None => start,
                    };
                    return Ok(Spanned::new(Expr::Call { name, args }, span));
                }
                let name = self.expect_ident()?;
                let mut indices = Vec::new();
                while self.eat(&Lexeme::LBracket) {
                    indices.push(self.parse_expression()?);
                    self.expect(&Lexeme::RBracket)?;
                }
                if indices.is_empty() {
                    Ok(Spanned::new(Expr::Var(name.node), name.span))
                } else {
                    let span = name.span.merge(indices.last().unwrap().span);
                    Ok(Spanned::new(Expr::Element(name.node, indices), span))
                }
            }
            Lexeme::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&Lexeme::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    // ── token stream helpers ──

    fn current(&self) -> &Spanned<Lexeme> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn at(&self, lexeme: &Lexeme) -> bool {
        &self.current().node == lexeme
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn eat(&mut self, lexeme: &Lexeme) -> bool {
        if self.at(lexeme) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, lexeme: &Lexeme) -> Result<Span, Diagnostic> {
        if self.at(lexeme) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(self.unexpected(lexeme.description()))
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>, Diagnostic> {
        if let Lexeme::Ident(name) = &self.current().node {
            let name = name.clone();
            let span = self.current_span();
            self.advance();
            Ok(Spanned::new(name, span))
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    /// True when the current token is an identifier directly followed by '('.
    fn peek_is_lparen(&self) -> bool {
        matches!(self.current().node, Lexeme::Ident(_))
            && self.pos + 1 < self.tokens.len()
            && self.tokens[self.pos + 1].node == Lexeme::LParen
    }

    fn unexpected(&self, wanted: &str) -> Diagnostic {
        let tok = self.current();
        Diagnostic::error(
            format!("expected {}, found {}", wanted, tok.node.description()),
            tok.span,
        )
    }

    fn enter_nesting(&mut self) -> Result<(), Diagnostic> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(Diagnostic::error(
                "nesting depth exceeded (maximum 256 levels)",
                self.current_span(),
            )
            .with_help("flatten deeply nested expressions or statements"));
        }
        Ok(())
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }
}

fn binary(op: BinOp, lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Spanned<Expr> {
    let span = lhs.span.merge(rhs.span);
    Spanned::new(
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}
