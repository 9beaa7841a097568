//! Expression tree and the transformations applied to it: constant folding,
//! symbol collection, structural classification (index-friendly / simple),
//! and evaluation against a row's bound symbol values.
//!
//! Mirrors the source pattern re-architecture called for in the design
//! notes: a tagged sum replaces the original's dynamic-downcast node
//! hierarchy, and the symbol table maps names to positions in a flat
//! binding vector rather than to mutable back-pointers inside the tree.

use crate::error::{Error, Result};
use crate::value::{Value, ValueRef};
use rustc_hash::FxHashMap;

/// Binary/unary operator code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Xor,
    Not,
}

impl Op {
    pub fn is_rel(self) -> bool {
        matches!(self, Op::Eq | Op::Ne | Op::Lt | Op::Gt | Op::Le | Op::Ge)
    }
    pub fn is_logic(self) -> bool {
        matches!(self, Op::And | Op::Or | Op::Xor)
    }
    pub fn is_math(self) -> bool {
        matches!(self, Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Mod)
    }
}

/// Scalar expression tree. A `Binary`/`Unary` node owns its operand(s)
/// strictly; `Symbol` and `Literal` are leaves.
#[derive(Debug, Clone)]
pub enum Expr {
    Binary { op: Op, left: Box<Expr>, right: Box<Expr> },
    Unary { op: Op, operand: Box<Expr> },
    Symbol(String),
    Literal(Value),
}

impl Expr {
    /// Apply `op` to a literal operand, folding constant subtrees.
    /// Post-order: children are expected to already be folded.
    fn binary(op: Op, left: Expr, right: Expr) -> Result<Expr> {
        if let (Expr::Literal(l), Expr::Literal(r)) = (&left, &right) {
            let lv = l.as_ref();
            let rv = r.as_ref();
            if lv.data_type() != rv.data_type() {
                return Err(Error::TypeMismatch);
            }
            let folded = eval_binary(op, &lv, &rv)?;
            return Ok(Expr::Literal(folded));
        }
        Ok(Expr::Binary { op, left: Box::new(left), right: Box::new(right) })
    }

    fn unary(op: Op, operand: Expr) -> Result<Expr> {
        if let Expr::Literal(v) = &operand {
            let folded = eval_unary(op, &v.as_ref())?;
            return Ok(Expr::Literal(folded));
        }
        Ok(Expr::Unary { op, operand: Box::new(operand) })
    }

    /// Constant-fold this tree bottom-up: a Binary/Unary node whose
    /// operand(s) are all literals is replaced by a single Literal leaf
    /// holding the computed result. Subtrees containing a Symbol are left
    /// untouched (folding stops as soon as an identifier is reachable).
    pub fn simplify(self) -> Result<Expr> {
        match self {
            Expr::Binary { op, left, right } => {
                let left = left.simplify()?;
                let right = right.simplify()?;
                Expr::binary(op, left, right)
            }
            Expr::Unary { op, operand } => {
                let operand = operand.simplify()?;
                Expr::unary(op, operand)
            }
            leaf @ (Expr::Symbol(_) | Expr::Literal(_)) => Ok(leaf),
        }
    }

    /// Collect, for each identifier mentioned by this tree, the list of
    /// parse-order positions of its occurrences. Pair with
    /// [`Expr::eval`]'s `bindings` slice, which is addressed by these same
    /// positions (one i.e. per occurrence, not one per distinct name).
    pub fn collect_symbols(&self) -> (FxHashMap<String, Vec<usize>>, usize) {
        let mut table: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut next = 0;
        self.collect_symbols_into(&mut table, &mut next);
        (table, next)
    }

    fn collect_symbols_into(&self, table: &mut FxHashMap<String, Vec<usize>>, next: &mut usize) {
        match self {
            Expr::Binary { left, right, .. } => {
                left.collect_symbols_into(table, next);
                right.collect_symbols_into(table, next);
            }
            Expr::Unary { operand, .. } => operand.collect_symbols_into(table, next),
            Expr::Symbol(name) => {
                table.entry(name.clone()).or_default().push(*next);
                *next += 1;
            }
            Expr::Literal(_) => {}
        }
    }

    /// Evaluate this tree, binding each Symbol occurrence to
    /// `bindings[occurrence_index]` (occurrence indices assigned by
    /// [`Expr::collect_symbols`], in the same left-to-right order this
    /// walk visits them).
    pub fn eval(&self, bindings: &[Value]) -> Result<Value> {
        let mut cursor = 0;
        self.eval_with(bindings, &mut cursor)
    }

    fn eval_with(&self, bindings: &[Value], cursor: &mut usize) -> Result<Value> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Symbol(_) => {
                let v = bindings[*cursor].clone();
                *cursor += 1;
                Ok(v)
            }
            Expr::Unary { op, operand } => {
                let v = operand.eval_with(bindings, cursor)?;
                eval_unary(*op, &v.as_ref())
            }
            Expr::Binary { op, left, right } => {
                let l = left.eval_with(bindings, cursor)?;
                let r = right.eval_with(bindings, cursor)?;
                eval_binary(*op, &l.as_ref(), &r.as_ref())
            }
        }
    }

    /// True if the root is a leaf, or its top operator is not `||`/`^^` —
    /// i.e. the top level is a pure conjunction (or a single term).
    pub fn is_cond_index_friendly(&self) -> bool {
        match self {
            Expr::Binary { op, .. } => !matches!(op, Op::Or | Op::Xor),
            _ => true,
        }
    }

    /// Split a left-associative chain of `&&` into its conjuncts.
    /// Only the left spine is walked: a right-nested `&&` subtree below
    /// the first conjunct is returned as a single, unsplit term (matches
    /// the original's documented behavior; see DESIGN.md).
    pub fn split_cond_by_and(self) -> Vec<Expr> {
        let mut terms = Vec::new();
        let mut root = self;
        loop {
            match root {
                Expr::Binary { op: Op::And, left, right } => {
                    terms.push(*right);
                    root = *left;
                }
                other => {
                    terms.push(other);
                    break;
                }
            }
        }
        terms
    }

    /// A relational comparison between exactly one identifier leaf and one
    /// literal leaf (either side), or a bare identifier (read as `id = true`).
    pub fn is_expr_simple(&self) -> bool {
        match self {
            Expr::Symbol(_) => true,
            Expr::Binary { op, left, right } if op.is_rel() => matches!(
                (left.as_ref(), right.as_ref()),
                (Expr::Symbol(_), Expr::Literal(_)) | (Expr::Literal(_), Expr::Symbol(_))
            ),
            _ => false,
        }
    }

    /// True if every conjunct of this (index-friendly) condition is simple.
    pub fn is_condition_simple(terms: &[Expr]) -> bool {
        terms.iter().all(Expr::is_expr_simple)
    }
}

fn eval_binary(op: Op, l: &ValueRef, r: &ValueRef) -> Result<Value> {
    match op {
        Op::Add => l.add(r),
        Op::Sub => l.sub(r),
        Op::Mul => l.mul(r),
        Op::Div => l.div(r),
        Op::Mod => l.rem(r),
        Op::Eq => l.eq_op(r).map(Value::Bool),
        Op::Ne => l.ne_op(r).map(Value::Bool),
        Op::Lt => l.lt_op(r).map(Value::Bool),
        Op::Gt => l.gt_op(r).map(Value::Bool),
        Op::Le => l.le_op(r).map(Value::Bool),
        Op::Ge => l.ge_op(r).map(Value::Bool),
        Op::And => l.and(r),
        Op::Or => l.or(r),
        Op::Xor => l.xor(r),
        Op::Not => Err(Error::OperatorUnsupported),
    }
}

fn eval_unary(op: Op, v: &ValueRef) -> Result<Value> {
    match op {
        Op::Add => v.plus(),
        Op::Sub => v.neg(),
        Op::Not => v.not(),
        _ => Err(Error::OperatorUnsupported),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_int(n: i32) -> Expr {
        Expr::Literal(Value::Int(n))
    }

    #[test]
    fn fold_arithmetic_and_relational() {
        // 1 + 2 * 3 = 7
        let e = Expr::Binary {
            op: Op::Eq,
            left: Box::new(Expr::Binary {
                op: Op::Add,
                left: Box::new(lit_int(1)),
                right: Box::new(Expr::Binary {
                    op: Op::Mul,
                    left: Box::new(lit_int(2)),
                    right: Box::new(lit_int(3)),
                }),
            }),
            right: Box::new(lit_int(7)),
        };
        let folded = e.simplify().unwrap();
        assert!(matches!(folded, Expr::Literal(Value::Bool(true))));
    }

    #[test]
    fn fold_leaves_symbol_subtrees_untouched() {
        let e = Expr::Binary {
            op: Op::Add,
            left: Box::new(Expr::Symbol("id".into())),
            right: Box::new(lit_int(1)),
        };
        let folded = e.clone().simplify().unwrap();
        assert!(matches!(folded, Expr::Binary { .. }));
    }

    #[test]
    fn fold_type_mismatch() {
        let e = Expr::Binary {
            op: Op::Eq,
            left: Box::new(lit_int(1)),
            right: Box::new(Expr::Literal(Value::Str("x".into()))),
        };
        assert!(e.simplify().is_err());
    }

    #[test]
    fn split_and_only_walks_left_spine() {
        // a && (b && c) && d  ==  (a && (b && c)) && d  [left-assoc as built]
        let a = Expr::Symbol("a".into());
        let bc = Expr::Binary {
            op: Op::And,
            left: Box::new(Expr::Symbol("b".into())),
            right: Box::new(Expr::Symbol("c".into())),
        };
        let left = Expr::Binary { op: Op::And, left: Box::new(a), right: Box::new(bc) };
        let tree = Expr::Binary {
            op: Op::And,
            left: Box::new(left),
            right: Box::new(Expr::Symbol("d".into())),
        };
        let terms = tree.split_cond_by_and();
        // terms come out innermost-right-first: d, (b && c) as one opaque term, then a
        assert_eq!(terms.len(), 3);
        assert!(matches!(terms[1], Expr::Binary { op: Op::And, .. }));
        assert!(matches!(terms[0], Expr::Symbol(ref s) if s == "d"));
        assert!(matches!(terms[2], Expr::Symbol(ref s) if s == "a"));
    }

    #[test]
    fn is_condition_simple_checks_every_term() {
        let simple = Expr::Binary {
            op: Op::Eq,
            left: Box::new(Expr::Symbol("x".into())),
            right: Box::new(lit_int(1)),
        };
        let not_simple = Expr::Binary {
            op: Op::Add,
            left: Box::new(Expr::Symbol("x".into())),
            right: Box::new(lit_int(1)),
        };
        assert!(!Expr::is_condition_simple(&[simple, not_simple]));
    }

    #[test]
    fn symbol_collection_orders_occurrences() {
        let e = Expr::Binary {
            op: Op::Eq,
            left: Box::new(Expr::Symbol("x".into())),
            right: Box::new(Expr::Symbol("x".into())),
        };
        let (table, count) = e.collect_symbols();
        assert_eq!(count, 2);
        assert_eq!(table.get("x").unwrap(), &vec![0, 1]);
    }

    #[test]
    fn eval_binds_symbols_in_order() {
        let e = Expr::Binary {
            op: Op::Add,
            left: Box::new(Expr::Symbol("x".into())),
            right: Box::new(Expr::Symbol("y".into())),
        };
        let result = e.eval(&[Value::Int(3), Value::Int(4)]).unwrap();
        assert_eq!(result, Value::Int(7));
    }
}
