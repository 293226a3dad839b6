use crate::span::Spanned;

/// A program is a flat list of statements; blocks appear under control flow.
pub type Block = Vec<Spanned<Stmt>>;

/// Statements.
#[derive(Clone, Debug)]
pub enum Stmt {
    If {
        cond: Spanned<Expr>,
        then_body: Block,
        else_body: Option<Block>,
    },
    While {
        cond: Spanned<Expr>,
        body: Block,
    },
    For {
        init: Option<Assign>,
        cond: Option<Spanned<Expr>>,
        step: Option<Assign>,
        body: Block,
    },
    Assign(Assign),
    /// `name[d1][d2]...;` declares an array with constant dimensions.
    ArrayDecl {
        name: Spanned<String>,
        dims: Vec<Spanned<Expr>>,
    },
    /// `name(args...);`
    Call {
        name: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
}

#[derive(Clone, Debug)]
pub struct Assign {
    pub place: Spanned<Place>,
    pub op: AssignOp,
    pub value: Spanned<Expr>,
}

/// L-value places.
#[derive(Clone, Debug)]
pub enum Place {
    Var(String),
    Element(String, Vec<Spanned<Expr>>),
}

impl Place {
    pub fn name(&self) -> &str {
        match self {
            Place::Var(name) => name,
            Place::Element(name, _) => name,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Set, // =
    Add, // +=
    Sub, // -=
    Mul, // *=
    Div, // /=
    Rem, // %=
}

/// Expressions.
#[derive(Clone, Debug)]
pub enum Expr {
    Integer(u32),
    Character(u8),
    Var(String),
    Element(String, Vec<Spanned<Expr>>),
    Binary {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Call {
        name: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Or,  // |
    And, // &
    Eq,  // ==
    Ne,  // !=
    Lt,  // <
    Gt,  // >
    Le,  // <=
    Ge,  // >=
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Rem, // %
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "|",
            BinOp::And => "&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}
