//! Overcast AST definitions
//!
//! This crate defines the abstract syntax tree for the Overcast language.
//! It is the contract between the parser and the compiler core: the parser
//! produces a [`Program`], the binder checks it and the code generator lowers
//! the same tree without rewriting it.
//!
//! Both node families are closed sum types so every consumer matches
//! exhaustively. Nodes own their children; there is no sharing.

mod types;

pub use types::{OcType, StructLayout, BUILTIN_TYPE_NAMES};

/// The top-level program: declarations in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

/// Statements in the AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    FunctionDeclaration(FunctionDecl),
    VariableDeclaration(VariableDecl),
    VariableSet(VariableSet),
    StructDeclaration(StructDecl),
    StructMemberSet(StructMemberSet),
    If(IfStmt),
    Return(ReturnStmt),
    Expression(Expr),
    Block(Block),
}

impl Stmt {
    /// Short human-readable node name used in diagnostics and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::FunctionDeclaration(_) => "function declaration",
            Stmt::VariableDeclaration(_) => "variable declaration",
            Stmt::VariableSet(_) => "variable assignment",
            Stmt::StructDeclaration(_) => "struct declaration",
            Stmt::StructMemberSet(_) => "struct member assignment",
            Stmt::If(_) => "if statement",
            Stmt::Return(_) => "return statement",
            Stmt::Expression(_) => "expression statement",
            Stmt::Block(_) => "block",
        }
    }
}

/// A named, typed slot: function parameter or struct member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: OcType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: OcType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A brace-delimited statement list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

/// `func name(a: int, b: int) -> int { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: OcType,
    pub body: Block,
}

/// `let name: Type -> value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDecl {
    pub name: String,
    pub ty: OcType,
    pub value: Expr,
}

/// `name -> value` where `name` is an existing local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSet {
    pub name: String,
    pub value: Expr,
}

/// `Name -> struct { a: int, b: int }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub name: String,
    pub members: Vec<Parameter>,
}

impl StructDecl {
    /// Positional layout of the members, in declaration order.
    pub fn layout(&self) -> StructLayout {
        StructLayout::from_members(&self.members)
    }
}

/// `object -> member -> value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructMemberSet {
    pub target: MemberAccess,
    pub value: Expr,
}

/// Comparators accepted inside an `if` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl Comparison {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            ">" => Comparison::Gt,
            "<" => Comparison::Lt,
            ">=" => Comparison::Ge,
            "<=" => Comparison::Le,
            "==" => Comparison::Eq,
            "!=" => Comparison::Ne,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }
}

/// `if (lhs op rhs) { ... } else { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStmt {
    pub lhs: Expr,
    pub op: Comparison,
    pub rhs: Expr,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

/// `return value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnStmt {
    pub value: Expr,
}

/// Expressions in the AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    StringLiteral(String),
    IntLiteral(i32),
    Variable(String),
    InvokeFunction(InvokeFunction),
    Binary(BinaryExpr),
    StructObjCreation(StructObjCreation),
    StructMemberAccess(MemberAccess),
    Reference(Box<Expr>),
}

impl Expr {
    /// Whether the expression names an addressable location.
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Variable(_) | Expr::StructMemberAccess(_))
    }
}

/// `name(arg, arg)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeFunction {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpr {
    pub lhs: Box<Expr>,
    pub op: BinaryOp,
    pub rhs: Box<Expr>,
}

/// `[Name]{ value, value }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructObjCreation {
    pub struct_name: String,
    pub args: Vec<Expr>,
}

/// `object -> member`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAccess {
    pub object: Box<Expr>,
    pub member: String,
}
