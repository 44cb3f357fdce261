//! Abstract syntax tree for kiln programs.

use kiln_core::Span;

/// A parsed source file: a flat list of function declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    /// Function declarations in source order.
    pub functions: Vec<FnDecl>,
}

/// An identifier with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    /// The identifier text.
    pub name: String,
    /// Where the identifier appears.
    pub span: Span,
}

impl Ident {
    /// Create a new identifier.
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnDecl {
    /// The function name.
    pub name: Ident,
    /// Parameter names.
    pub params: Vec<Ident>,
    /// The function body.
    pub body: Block,
    /// Span of the whole declaration.
    pub span: Span,
}

/// A brace-delimited statement block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Statements in order.
    pub stmts: Vec<Stmt>,
    /// Span from `{` through `}`.
    pub span: Span,
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `let name = value;`
    Let {
        /// The binding name.
        name: Ident,
        /// The initializer.
        value: Expr,
        /// Span of the whole statement.
        span: Span,
    },
    /// `name = value;`
    Assign {
        /// The assignment target.
        name: Ident,
        /// The assigned value.
        value: Expr,
        /// Span of the whole statement.
        span: Span,
    },
    /// `if cond { .. } else { .. }`
    If {
        /// The condition.
        cond: Expr,
        /// The then branch.
        then_branch: Block,
        /// The optional else branch; `else if` nests another `If` here.
        else_branch: Option<Block>,
        /// Span of the whole statement.
        span: Span,
    },
    /// `while cond { .. }`
    While {
        /// The loop condition.
        cond: Expr,
        /// The loop body.
        body: Block,
        /// Span of the whole statement.
        span: Span,
    },
    /// `return;` or `return value;`
    Return {
        /// The optional return value.
        value: Option<Expr>,
        /// Span of the whole statement.
        span: Span,
    },
    /// An expression evaluated for its effect.
    Expr(Expr),
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// An integer literal.
    Int {
        /// The literal value.
        value: i64,
        /// Source span.
        span: Span,
    },
    /// A string literal (already unescaped).
    Str {
        /// The literal value.
        value: String,
        /// Source span.
        span: Span,
    },
    /// A boolean literal.
    Bool {
        /// The literal value.
        value: bool,
        /// Source span.
        span: Span,
    },
    /// A variable reference.
    Var {
        /// The referenced name.
        name: Ident,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// A function call.
    Call {
        /// The called function name.
        callee: Ident,
        /// Arguments in order.
        args: Vec<Expr>,
        /// Source span.
        span: Span,
    },
}

impl Expr {
    /// The source span of this expression.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Int { span, .. }
            | Self::Str { span, .. }
            | Self::Bool { span, .. }
            | Self::Unary { span, .. }
            | Self::Binary { span, .. }
            | Self::Call { span, .. } => *span,
            Self::Var { name } => name.span,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Logical not.
    Not,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+` (int addition or string concatenation)
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&` (short-circuit)
    And,
    /// `||` (short-circuit)
    Or,
}
