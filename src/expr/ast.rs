//! Expression tree shared by the parser, checker and interpreter

use super::value::Kind;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Binary operators, excluding the short-circuit logical ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

impl BinaryOp {
    /// Operator spelling, used in overload error messages
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
        }
    }
}

/// Comprehension macros lowered by the checker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Exists,
    ExistsOne,
    Filter,
    Map,
}

impl Quantifier {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all" => Some(Quantifier::All),
            "exists" => Some(Quantifier::Exists),
            "exists_one" => Some(Quantifier::ExistsOne),
            "filter" => Some(Quantifier::Filter),
            "map" => Some(Quantifier::Map),
            _ => None,
        }
    }
}

/// An expression node
///
/// `tail` fields record how many bytes of source remained when the node
/// started, so diagnostics can recover a position without threading the
/// full input through every parser function.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// A type name such as `int`, produced by the checker
    Type(Kind),
    List(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
    Ident {
        name: String,
        tail: usize,
    },
    /// Field selection; `test_only` marks the `has()` presence test
    Select {
        operand: Box<Expr>,
        field: String,
        test_only: bool,
    },
    Index(Box<Expr>, Box<Expr>),
    /// Function call; `target` is set for receiver-style calls `x.f(y)`
    Call {
        target: Option<Box<Expr>>,
        function: String,
        args: Vec<Expr>,
        tail: usize,
    },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    /// Iteration over a list (elements) or map (keys)
    ///
    /// `body` is the predicate, or the transform for `map`; `filter` is only
    /// set by the three-argument form of `map`.
    Comprehension {
        quantifier: Quantifier,
        range: Box<Expr>,
        var: String,
        body: Box<Expr>,
        filter: Option<Box<Expr>>,
    },
}
