//! Abstract syntax tree definitions.
//!
//! Function, class and module bodies are reference counted so that the
//! runtime can keep them alive inside callables and class definitions without
//! copying the tree.
use crate::source::Span;
use std::rc::Rc;

/// A sequence of statements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

/// A single statement along with where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,

    /// Location of the statement in the source file.
    pub span: Span,

    /// The source text of the statement, used in runtime diagnostics.
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatementKind {
    /// `val name = value`
    Val {
        name: String,
        value: Expr,
    },

    /// `var name` or `var name = value`
    Var {
        name: String,
        value: Option<Expr>,
    },

    Assign {
        target: AssignTarget,
        op: AssignOp,
        value: Expr,
    },

    Return(Option<Expr>),
    Function(Rc<FunctionDecl>),
    Class(Rc<ClassDecl>),
    Module(Rc<ModuleDecl>),
    Import(ImportStmt),
    Export(Vec<String>),
    Expr(Expr),
}

/// The left hand side of an assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignTarget {
    Name(String),
    Member {
        target: Expr,
        name: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// The hook a compound assignment dispatches to, if any.
    pub fn hook(self) -> Option<&'static str> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some("+="),
            AssignOp::Sub => Some("-="),
            AssignOp::Mul => Some("*="),
            AssignOp::Div => Some("/="),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn hook(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Integer(i64),
    Float(f64),
    String(String),

    /// A bare name, resolved through the current scope stack.
    Reference(String),

    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    Index {
        target: Box<Expr>,
        args: Vec<Expr>,
    },

    /// `target.name`
    Member {
        target: Box<Expr>,
        name: String,
    },

    /// An anonymous function expression.
    Function(Rc<FunctionDecl>),

    Closure(Rc<FunctionDecl>),
}

/// A named or anonymous parameterized body. Used for functions, closures,
/// methods, operators and property accessors alike.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<Expr>,
    pub members: Vec<ClassMember>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClassMember {
    Val {
        name: String,
        value: Rc<Expr>,
    },
    Var {
        name: String,
        value: Option<Rc<Expr>>,
    },
    Method(Rc<FunctionDecl>),
    Property(PropertyDecl),

    /// An operator override. The declaration name is the hook symbol.
    Operator(Rc<FunctionDecl>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub name: String,
    pub getter: Option<Rc<FunctionDecl>>,
    pub setter: Option<Rc<FunctionDecl>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModuleDecl {
    /// Dotted module name, such as `geometry.shapes`.
    pub name: String,
    pub body: Rc<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportStmt {
    pub module: String,
    pub binding: ImportBinding,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ImportBinding {
    /// Copy every exported name into the current scope.
    All,

    /// Copy only the listed names.
    Only(Vec<String>),

    /// Bind the module's exports under a single alias.
    Alias(String),
}
