use crate::ast;

/// An opaque expression held by the HIR.
///
/// The front end carries expressions through lowering without interpreting
/// them; later stages consume them for MIR construction and constant
/// evaluation.
#[derive(Debug, Clone, Default)]
pub struct ExprPtr {
    ast: Option<Box<ast::Expr>>,
}

impl ExprPtr {
    /// Construct a holder for the given expression.
    pub fn new(expr: ast::Expr) -> Self {
        Self {
            ast: Some(Box::new(expr)),
        }
    }

    /// An absent expression, e.g. the body of a prototype.
    pub fn none() -> Self {
        Self::default()
    }

    /// Test if an expression is present.
    pub fn is_valid(&self) -> bool {
        self.ast.is_some()
    }

    /// The carried expression, if present.
    pub fn get(&self) -> Option<&ast::Expr> {
        self.ast.as_deref()
    }
}

impl From<Option<ast::Expr>> for ExprPtr {
    fn from(expr: Option<ast::Expr>) -> Self {
        Self {
            ast: expr.map(Box::new),
        }
    }
}

// Expressions never compare equal unless both are absent; type equality
// only relies on this for array sizes that failed to constant-fold.
impl PartialEq for ExprPtr {
    fn eq(&self, other: &Self) -> bool {
        self.ast.is_none() && other.ast.is_none()
    }
}
