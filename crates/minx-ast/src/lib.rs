//! Syntax tree types for the minx language.
//!
//! Nodes are built bottom-up by the parser in `minx-syntax` and never
//! mutated afterwards; each node exclusively owns its children, so the
//! tree is acyclic by construction. Nodes carry no source positions:
//! the front end stops at the first error and locates it from the
//! reader, and a successful parse has no further use for positions.

/// A name or infix operator together with the effect markers captured
/// from its `~` and `!` suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub text: String,
    /// Set when the name was written with a trailing `~`.
    pub has_side_effects: bool,
    /// Set when the name was written with a trailing `!`.
    pub is_mutable: bool,
}

impl Ident {
    /// An identifier without effect markers.
    pub fn plain(text: impl Into<String>) -> Ident {
        Ident {
            text: text.into(),
            has_side_effects: false,
            is_mutable: false,
        }
    }
}

/// One entry of a scope: `name`, `name Type`, `name = value`, or
/// `name Type = value`. The name is a `NameRef`, an `InfixRef`, or a
/// destructuring `Scope`; only the first two may carry a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: Expr,
    pub declared_type: Option<Expr>,
    pub value: Option<Expr>,
}

/// One `| pattern [Type] : body` branch of a case expression. The
/// `else` branch is held separately on [`Expr::Case`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseBranch {
    pub pattern: Expr,
    pub pattern_type: Option<Expr>,
    pub body: Expr,
}

/// A parsed minx expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Raw text between double quotes; backslashes are kept verbatim.
    StringLit(String),
    /// `case scrutinee | pattern: body ... | else: body`.
    Case {
        scrutinee: Box<Expr>,
        branches: Vec<CaseBranch>,
        else_branch: Option<Box<Expr>>,
    },
    /// A reference to a name.
    NameRef(Ident),
    /// An infix operator mentioned outside operator position.
    InfixRef(Ident),
    /// An expression quoted between single quotes; evaluation is
    /// deferred to a later stage.
    Meta(Box<Expr>),
    /// The `$` placeholder.
    Dollar,
    /// `[a, b, c]`.
    ListLit(Vec<Expr>),
    /// A declaration list: braces, an indented block, or the whole file.
    Scope(Vec<Declaration>),
    /// Two or more `|`-separated alternatives. A lone alternative is
    /// never wrapped.
    UnionType(Vec<Expr>),
    /// Juxtaposition, denoting a call. Chains nest to the right.
    Application {
        function: Box<Expr>,
        argument: Box<Expr>,
    },
    /// An infix operator applied to its neighbors; either side may be
    /// absent at a sequence boundary.
    InfixOperation {
        operator: Ident,
        left: Option<Box<Expr>>,
        right: Option<Box<Expr>>,
    },
    /// `base@member`; `member` is always a `NameRef` or `InfixRef`.
    MemberAccess {
        base: Box<Expr>,
        member: Box<Expr>,
    },
}
