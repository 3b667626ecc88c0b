//! Parameter expression trees.
//!
//! Expressions are built already constant-folded: whenever every operand of
//! a node is a numeric literal, the node collapses to a literal. Formal gate
//! parameters survive as [`Expr::Id`] nodes until [`rewrite`] substitutes
//! them from an environment and folds again bottom-up. Trees are cloned per
//! expansion, never shared.

use rustc_hash::FxHashMap;

/// A parameter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// Formal parameter reference.
    Id(String),
    /// Negation of a non-literal operand.
    Sign(Box<Expr>),
    /// Sum.
    Plus(Box<Expr>, Box<Expr>),
    /// Difference.
    Minus(Box<Expr>, Box<Expr>),
    /// Product.
    Times(Box<Expr>, Box<Expr>),
    /// Quotient.
    Div(Box<Expr>, Box<Expr>),
    /// Exponentiation.
    Power(Box<Expr>, Box<Expr>),
    /// Sine.
    Sin(Box<Expr>),
    /// Cosine.
    Cos(Box<Expr>),
    /// Tangent.
    Tan(Box<Expr>),
    /// Natural exponential.
    Exp(Box<Expr>),
    /// Natural logarithm.
    Ln(Box<Expr>),
    /// Square root.
    Sqrt(Box<Expr>),
}

impl Expr {
    /// The numeric value of a literal node.
    pub fn number(&self) -> Option<f64> {
        match self {
            Expr::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Build a negation, folding literals.
    pub fn neg(operand: Expr) -> Expr {
        match operand {
            Expr::Number(v) => Expr::Number(-v),
            other => Expr::Sign(Box::new(other)),
        }
    }

    /// Build a binary node, folding when both operands are literals.
    pub fn binary(op: BinaryKind, lhs: Expr, rhs: Expr) -> Expr {
        if let (Some(a), Some(b)) = (lhs.number(), rhs.number()) {
            return Expr::Number(op.apply(a, b));
        }
        let (lhs, rhs) = (Box::new(lhs), Box::new(rhs));
        match op {
            BinaryKind::Plus => Expr::Plus(lhs, rhs),
            BinaryKind::Minus => Expr::Minus(lhs, rhs),
            BinaryKind::Times => Expr::Times(lhs, rhs),
            BinaryKind::Div => Expr::Div(lhs, rhs),
            BinaryKind::Power => Expr::Power(lhs, rhs),
        }
    }

    /// Build a unary function node, folding literals.
    pub fn unary(op: UnaryKind, operand: Expr) -> Expr {
        if let Some(v) = operand.number() {
            return Expr::Number(op.apply(v));
        }
        let operand = Box::new(operand);
        match op {
            UnaryKind::Sin => Expr::Sin(operand),
            UnaryKind::Cos => Expr::Cos(operand),
            UnaryKind::Tan => Expr::Tan(operand),
            UnaryKind::Exp => Expr::Exp(operand),
            UnaryKind::Ln => Expr::Ln(operand),
            UnaryKind::Sqrt => Expr::Sqrt(operand),
        }
    }
}

/// Binary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    /// Addition.
    Plus,
    /// Subtraction.
    Minus,
    /// Multiplication.
    Times,
    /// Division.
    Div,
    /// Exponentiation.
    Power,
}

impl BinaryKind {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryKind::Plus => a + b,
            BinaryKind::Minus => a - b,
            BinaryKind::Times => a * b,
            BinaryKind::Div => a / b,
            BinaryKind::Power => a.powf(b),
        }
    }
}

/// Unary function kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryKind {
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Tangent.
    Tan,
    /// Natural exponential.
    Exp,
    /// Natural logarithm.
    Ln,
    /// Square root.
    Sqrt,
}

impl UnaryKind {
    fn apply(self, v: f64) -> f64 {
        match self {
            UnaryKind::Sin => v.sin(),
            UnaryKind::Cos => v.cos(),
            UnaryKind::Tan => v.tan(),
            UnaryKind::Exp => v.exp(),
            UnaryKind::Ln => v.ln(),
            UnaryKind::Sqrt => v.sqrt(),
        }
    }
}

/// Parameter binding environment used during gate expansion.
pub type ParamEnv = FxHashMap<String, Expr>;

/// Substitute every [`Expr::Id`] from the environment and re-fold bottom-up.
///
/// This is the only path by which formal parameters become numeric. An
/// unbound identifier survives as an `Id` node.
pub fn rewrite(expr: &Expr, env: &ParamEnv) -> Expr {
    match expr {
        Expr::Number(v) => Expr::Number(*v),
        Expr::Id(name) => env.get(name).cloned().unwrap_or_else(|| expr.clone()),
        Expr::Sign(operand) => Expr::neg(rewrite(operand, env)),
        Expr::Plus(a, b) => Expr::binary(BinaryKind::Plus, rewrite(a, env), rewrite(b, env)),
        Expr::Minus(a, b) => Expr::binary(BinaryKind::Minus, rewrite(a, env), rewrite(b, env)),
        Expr::Times(a, b) => Expr::binary(BinaryKind::Times, rewrite(a, env), rewrite(b, env)),
        Expr::Div(a, b) => Expr::binary(BinaryKind::Div, rewrite(a, env), rewrite(b, env)),
        Expr::Power(a, b) => Expr::binary(BinaryKind::Power, rewrite(a, env), rewrite(b, env)),
        Expr::Sin(a) => Expr::unary(UnaryKind::Sin, rewrite(a, env)),
        Expr::Cos(a) => Expr::unary(UnaryKind::Cos, rewrite(a, env)),
        Expr::Tan(a) => Expr::unary(UnaryKind::Tan, rewrite(a, env)),
        Expr::Exp(a) => Expr::unary(UnaryKind::Exp, rewrite(a, env)),
        Expr::Ln(a) => Expr::unary(UnaryKind::Ln, rewrite(a, env)),
        Expr::Sqrt(a) => Expr::unary(UnaryKind::Sqrt, rewrite(a, env)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_literal_folding() {
        let e = Expr::binary(BinaryKind::Plus, Expr::Number(1.0), Expr::Number(2.0));
        assert_eq!(e, Expr::Number(3.0));

        let e = Expr::binary(BinaryKind::Power, Expr::Number(2.0), Expr::Number(10.0));
        assert_eq!(e, Expr::Number(1024.0));

        let e = Expr::unary(UnaryKind::Cos, Expr::Number(0.0));
        assert_eq!(e, Expr::Number(1.0));
    }

    #[test]
    fn test_neg_on_literal_and_symbol() {
        assert_eq!(Expr::neg(Expr::Number(2.5)), Expr::Number(-2.5));
        assert!(matches!(Expr::neg(Expr::Id("x".into())), Expr::Sign(_)));
    }

    #[test]
    fn test_symbolic_nodes_survive() {
        let e = Expr::binary(BinaryKind::Div, Expr::Id("theta".into()), Expr::Number(2.0));
        assert!(matches!(e, Expr::Div(_, _)));
    }

    #[test]
    fn test_rewrite_substitutes_and_folds() {
        let e = Expr::binary(BinaryKind::Div, Expr::Id("theta".into()), Expr::Number(2.0));
        let mut env = ParamEnv::default();
        env.insert("theta".to_string(), Expr::Number(PI));
        let folded = rewrite(&e, &env);
        assert_eq!(folded, Expr::Number(PI / 2.0));
    }

    #[test]
    fn test_rewrite_clones_bound_subtree() {
        let e = Expr::Id("a".into());
        let mut env = ParamEnv::default();
        env.insert(
            "a".to_string(),
            Expr::binary(BinaryKind::Plus, Expr::Id("b".into()), Expr::Number(1.0)),
        );
        let rewritten = rewrite(&e, &env);
        assert!(matches!(rewritten, Expr::Plus(_, _)));
        // The environment entry is untouched.
        assert!(matches!(env["a"], Expr::Plus(_, _)));
    }

    #[test]
    fn test_nested_rewrite_folds_bottom_up() {
        let e = Expr::unary(
            UnaryKind::Sin,
            Expr::binary(BinaryKind::Times, Expr::Id("x".into()), Expr::Number(2.0)),
        );
        let mut env = ParamEnv::default();
        env.insert("x".to_string(), Expr::Number(0.0));
        assert_eq!(rewrite(&e, &env), Expr::Number(0.0));
    }
}
