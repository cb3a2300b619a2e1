//! Evaluable expression tree
//!
//! The analyzer lowers the parse tree into [`Node`]s. A node tree is built
//! once, never mutated, and owns its children, so one compiled expression can
//! be evaluated from many threads at the same time.
//!
//! Evaluation is depth-first and left to right. Navigation nodes (member,
//! wildcard, index, slice, member function) pass nil through silently;
//! arithmetic treats nil as an incompatible operand.

mod arithmetic;
mod logic;
mod navigation;

use crate::context::Context;
use crate::convert::TypeTag;
use crate::error::Result;
use crate::functions::Entry;
use crate::stack;
use crate::value::Value;

/// One node of a compiled expression.
#[derive(Debug, Clone)]
pub enum Node {
    // ============================================
    // Terms and navigation
    // ============================================
    Literal(Value),

    /// Field or key lookup on the cursor, broadcast over sequences.
    Member(String),

    /// Every visible value of the cursor.
    Wildcard,

    Index(Box<Node>),

    /// `[begin:end]`; a missing end means the cursor's length.
    Slice {
        begin: Box<Node>,
        end: Option<Box<Node>>,
    },

    /// Root-level call receiving only its explicit arguments.
    FreeFunc { entry: Entry, args: Vec<Node> },

    /// Call after `.`, receiving the cursor as its first argument.
    MemberFunc { entry: Entry, args: Vec<Node> },

    /// Navigation steps, each evaluated against the previous step's result.
    Sequence(Vec<Node>),

    // ============================================
    // Operators
    // ============================================
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    Polarity { negate: bool, operand: Box<Node> },

    Bitwise {
        op: BitwiseOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    BitwiseNot(Box<Node>),

    Comparison {
        op: ComparisonOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    And(Box<Node>, Box<Node>),

    Or(Box<Node>, Box<Node>),

    Implies(Box<Node>, Box<Node>),

    Not(Box<Node>),

    // ============================================
    // Conditionals and type operators
    // ============================================
    Ternary {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Box<Node>,
    },

    Elvis {
        condition: Box<Node>,
        alternative: Box<Node>,
    },

    Coalesce(Box<Node>, Box<Node>),

    Is {
        operand: Box<Node>,
        tag: TypeTag,
        negated: bool,
    },

    As { operand: Box<Node>, tag: TypeTag },

    In {
        needle: Box<Node>,
        haystack: Box<Node>,
        negated: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
    Power,
}

impl ArithmeticOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
            ArithmeticOp::FloorDivide => "//",
            ArithmeticOp::Modulo => "%",
            ArithmeticOp::Power => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Node {
    /// Chain `next` after `self`, flattening nested sequences.
    pub fn then(self, next: Node) -> Node {
        let mut steps = match self {
            Node::Sequence(steps) => steps,
            other => vec![other],
        };
        match next {
            Node::Sequence(more) => steps.extend(more),
            other => steps.push(other),
        }
        Node::Sequence(steps)
    }

    pub fn eval(&self, ctx: &Context) -> Result<Value> {
        stack::guard(|| self.eval_inner(ctx))
    }

    fn eval_inner(&self, ctx: &Context) -> Result<Value> {
        match self {
            Node::Literal(value) => Ok(value.clone()),
            Node::Member(name) => navigation::member(ctx.current(), name),
            Node::Wildcard => navigation::wildcard(ctx.current()),
            Node::Index(index) => navigation::index(ctx, index),
            Node::Slice { begin, end } => navigation::slice(ctx, begin, end.as_deref()),
            Node::FreeFunc { entry, args } => navigation::free_func(ctx, entry, args),
            Node::MemberFunc { entry, args } => navigation::member_func(ctx, entry, args),
            Node::Sequence(steps) => navigation::sequence(ctx, steps),

            Node::Arithmetic { op, left, right } => {
                let (lhs, rhs) = eval_pair(ctx, left, right)?;
                arithmetic::binary(*op, &lhs, &rhs)
            }
            Node::Polarity { negate, operand } => {
                arithmetic::polarity(*negate, &operand.eval(ctx)?)
            }
            Node::Bitwise { op, left, right } => {
                let (lhs, rhs) = eval_pair(ctx, left, right)?;
                arithmetic::bitwise(*op, &lhs, &rhs)
            }
            Node::BitwiseNot(operand) => arithmetic::bitwise_not(&operand.eval(ctx)?),
            Node::Comparison { op, left, right } => {
                let (lhs, rhs) = eval_pair(ctx, left, right)?;
                Ok(logic::comparison(*op, &lhs, &rhs))
            }
            Node::And(left, right) => logic::and(ctx, left, right),
            Node::Or(left, right) => logic::or(ctx, left, right),
            Node::Implies(left, right) => {
                let (lhs, rhs) = eval_pair(ctx, left, right)?;
                Ok(Value::Bool(lhs.is_truthy() == rhs.is_truthy()))
            }
            Node::Not(operand) => Ok(Value::Bool(!operand.eval(ctx)?.is_truthy())),

            Node::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if condition.eval(ctx)?.is_truthy() {
                    then_branch.eval(ctx)
                } else {
                    else_branch.eval(ctx)
                }
            }
            Node::Elvis {
                condition,
                alternative,
            } => {
                let value = condition.eval(ctx)?;
                if value.is_truthy() {
                    Ok(value)
                } else {
                    alternative.eval(ctx)
                }
            }
            Node::Coalesce(left, right) => {
                let value = left.eval(ctx)?;
                if value.is_nil() {
                    right.eval(ctx)
                } else {
                    Ok(value)
                }
            }
            Node::Is {
                operand,
                tag,
                negated,
            } => Ok(logic::is(&operand.eval(ctx)?, *tag, *negated)),
            Node::As { operand, tag } => logic::cast(&operand.eval(ctx)?, *tag),
            Node::In {
                needle,
                haystack,
                negated,
            } => {
                let (lhs, rhs) = eval_pair(ctx, needle, haystack)?;
                logic::contains(&lhs, &rhs, *negated)
            }
        }
    }
}

fn eval_pair(ctx: &Context, left: &Node, right: &Node) -> Result<(Value, Value)> {
    let lhs = left.eval(ctx)?;
    let rhs = right.eval(ctx)?;
    Ok((lhs, rhs))
}
