//! Semantic analysis: AST → evaluable [`Node`] tree
//!
//! Resolves every function call against the invocation table and checks its
//! arity, so a compiled expression never fails on an unknown function.
//! Member calls count the cursor as their first argument.

use crate::ast::{
    AdditiveOperator, AstNode, BitwiseOrOperator, EqualityOperator, InequalityOperator,
    MultiplicativeOperator, PolarityOperator, ShiftOperator,
};
use crate::error::{Error, NameError, Result};
use crate::expr::{ArithmeticOp, BitwiseOp, ComparisonOp, Node};
use crate::functions::Table;
use crate::stack;
use crate::value::Value;
use std::sync::Arc;

pub struct Analyzer<'a> {
    table: &'a Table,
    max_depth: usize,
}

impl<'a> Analyzer<'a> {
    pub fn new(table: &'a Table, max_depth: usize) -> Self {
        Self { table, max_depth }
    }

    pub fn analyze(&self, ast: AstNode) -> Result<Node> {
        self.analyze_node(ast, 0)
    }

    fn analyze_node(&self, ast: AstNode, depth: usize) -> Result<Node> {
        if depth > self.max_depth {
            return Err(Error::semantic(Error::TooDeep(self.max_depth)));
        }
        stack::guard(|| self.lower(ast, depth))
    }

    fn lower(&self, ast: AstNode, depth: usize) -> Result<Node> {
        let next = depth + 1;
        let boxed = |node: AstNode| -> Result<Box<Node>> { Ok(Box::new(self.analyze_node(node, next)?)) };

        match ast {
            // ============================================
            // Conditionals and type operators
            // ============================================
            AstNode::CastExpression {
                expression,
                type_name,
            } => Ok(Node::As {
                operand: boxed(*expression)?,
                tag: type_name,
            }),
            AstNode::CoalesceExpression { left, right } => {
                Ok(Node::Coalesce(boxed(*left)?, boxed(*right)?))
            }
            AstNode::ElvisExpression {
                condition,
                alternative,
            } => Ok(Node::Elvis {
                condition: boxed(*condition)?,
                alternative: boxed(*alternative)?,
            }),
            AstNode::TernaryExpression {
                condition,
                then_branch,
                else_branch,
            } => Ok(Node::Ternary {
                condition: boxed(*condition)?,
                then_branch: boxed(*then_branch)?,
                else_branch: boxed(*else_branch)?,
            }),
            AstNode::TypeExpression {
                expression,
                negated,
                type_name,
            } => Ok(Node::Is {
                operand: boxed(*expression)?,
                tag: type_name,
                negated,
            }),
            AstNode::MembershipExpression {
                left,
                negated,
                right,
            } => Ok(Node::In {
                needle: boxed(*left)?,
                haystack: boxed(*right)?,
                negated,
            }),

            // ============================================
            // Binary operators
            // ============================================
            AstNode::EqualityExpression {
                left,
                operator,
                right,
            } => {
                let op = match operator {
                    EqualityOperator::Equal => ComparisonOp::Equal,
                    EqualityOperator::NotEqual => ComparisonOp::NotEqual,
                };
                Ok(Node::Comparison {
                    op,
                    left: boxed(*left)?,
                    right: boxed(*right)?,
                })
            }
            AstNode::InequalityExpression {
                left,
                operator,
                right,
            } => {
                let op = match operator {
                    InequalityOperator::LessThan => ComparisonOp::LessThan,
                    InequalityOperator::LessThanOrEqual => ComparisonOp::LessThanOrEqual,
                    InequalityOperator::GreaterThan => ComparisonOp::GreaterThan,
                    InequalityOperator::GreaterThanOrEqual => ComparisonOp::GreaterThanOrEqual,
                };
                Ok(Node::Comparison {
                    op,
                    left: boxed(*left)?,
                    right: boxed(*right)?,
                })
            }
            AstNode::BitwiseOrExpression {
                left,
                operator,
                right,
            } => {
                let op = match operator {
                    BitwiseOrOperator::Or => BitwiseOp::Or,
                    BitwiseOrOperator::Xor => BitwiseOp::Xor,
                };
                Ok(Node::Bitwise {
                    op,
                    left: boxed(*left)?,
                    right: boxed(*right)?,
                })
            }
            AstNode::BitwiseAndExpression { left, right } => Ok(Node::Bitwise {
                op: BitwiseOp::And,
                left: boxed(*left)?,
                right: boxed(*right)?,
            }),
            AstNode::ShiftExpression {
                left,
                operator,
                right,
            } => {
                let op = match operator {
                    ShiftOperator::Left => BitwiseOp::ShiftLeft,
                    ShiftOperator::Right => BitwiseOp::ShiftRight,
                };
                Ok(Node::Bitwise {
                    op,
                    left: boxed(*left)?,
                    right: boxed(*right)?,
                })
            }
            AstNode::ImpliesExpression { left, right } => {
                Ok(Node::Implies(boxed(*left)?, boxed(*right)?))
            }
            AstNode::OrExpression { left, right } => Ok(Node::Or(boxed(*left)?, boxed(*right)?)),
            AstNode::AndExpression { left, right } => Ok(Node::And(boxed(*left)?, boxed(*right)?)),
            AstNode::AdditiveExpression {
                left,
                operator,
                right,
            } => {
                let op = match operator {
                    AdditiveOperator::Plus => ArithmeticOp::Add,
                    AdditiveOperator::Minus => ArithmeticOp::Subtract,
                };
                Ok(Node::Arithmetic {
                    op,
                    left: boxed(*left)?,
                    right: boxed(*right)?,
                })
            }
            AstNode::MultiplicativeExpression {
                left,
                operator,
                right,
            } => {
                let op = match operator {
                    MultiplicativeOperator::Multiply => ArithmeticOp::Multiply,
                    MultiplicativeOperator::Divide => ArithmeticOp::Divide,
                    MultiplicativeOperator::FloorDivide => ArithmeticOp::FloorDivide,
                    MultiplicativeOperator::Modulo => ArithmeticOp::Modulo,
                };
                Ok(Node::Arithmetic {
                    op,
                    left: boxed(*left)?,
                    right: boxed(*right)?,
                })
            }
            AstNode::ExponentiationExpression { base, exponent } => Ok(Node::Arithmetic {
                op: ArithmeticOp::Power,
                left: boxed(*base)?,
                right: boxed(*exponent)?,
            }),

            // ============================================
            // Unary operators
            // ============================================
            AstNode::PolarityExpression {
                operator,
                expression,
            } => Ok(Node::Polarity {
                negate: operator == PolarityOperator::Minus,
                operand: boxed(*expression)?,
            }),
            AstNode::BitwiseNotExpression { expression } => {
                Ok(Node::BitwiseNot(boxed(*expression)?))
            }
            AstNode::LogicalNotExpression { expression } => Ok(Node::Not(boxed(*expression)?)),

            // ============================================
            // Navigation
            // ============================================
            AstNode::IndexerExpression { expression, index } => {
                let target = self.analyze_node(*expression, next)?;
                Ok(target.then(Node::Index(boxed(*index)?)))
            }
            AstNode::SliceExpression {
                expression,
                begin,
                end,
            } => {
                let target = self.analyze_node(*expression, next)?;
                let begin = match begin {
                    Some(begin) => boxed(*begin)?,
                    None => Box::new(Node::Literal(Value::Int(0))),
                };
                let end = end.map(|end| boxed(*end)).transpose()?;
                Ok(target.then(Node::Slice { begin, end }))
            }
            AstNode::InvocationExpression {
                expression,
                invocation,
            } => {
                let target = self.analyze_node(*expression, next)?;
                let step = self.analyze_invocation(*invocation, false, next)?;
                Ok(target.then(step))
            }
            // Grouping has no runtime effect and does not count toward depth.
            AstNode::ParenthesizedTerm { expression } => self.analyze_node(*expression, depth),
            invocation @ (AstNode::MemberInvocation { .. }
            | AstNode::WildcardInvocation
            | AstNode::FunctionInvocation { .. }) => {
                self.analyze_invocation(invocation, true, next)
            }

            // ============================================
            // Literals
            // ============================================
            literal => Ok(Node::Literal(literal_value(literal)?)),
        }
    }

    fn analyze_invocation(&self, ast: AstNode, is_root: bool, depth: usize) -> Result<Node> {
        match ast {
            AstNode::MemberInvocation { identifier } => Ok(Node::Member(identifier)),
            AstNode::WildcardInvocation => Ok(Node::Wildcard),
            AstNode::FunctionInvocation {
                function_name,
                parameters,
            } => {
                let entry = self.table.lookup(&function_name).ok_or_else(|| {
                    Error::semantic(NameError::new(
                        function_name.as_str(),
                        self.table.function_names(),
                    ))
                })?;

                // Member calls receive the cursor as an extra first argument.
                let count = parameters.len() + usize::from(!is_root);
                entry.check_arity(count).map_err(Error::semantic)?;

                let args = parameters
                    .into_iter()
                    .map(|param| self.analyze_node(param, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                let entry = entry.clone();

                tracing::trace!(function = %function_name, is_root, "resolved function");
                if is_root {
                    Ok(Node::FreeFunc { entry, args })
                } else {
                    Ok(Node::MemberFunc { entry, args })
                }
            }
            other => Err(Error::semantic(Error::BadFunction(format!(
                "expected an invocation, found {:?}",
                other
            )))),
        }
    }
}

fn literal_value(ast: AstNode) -> Result<Value> {
    match ast {
        AstNode::NullLiteral => Ok(Value::Nil),
        AstNode::BooleanLiteral(b) => Ok(Value::Bool(b)),
        AstNode::StringLiteral(s) => Ok(Value::from(s)),
        AstNode::IntegerLiteral(i) => Ok(Value::Int(i)),
        AstNode::FloatLiteral(f) => Ok(Value::Float(f)),
        AstNode::ListLiteral { elements } => {
            let items = elements
                .into_iter()
                .map(|element| stack::guard(|| literal_value(element)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Sequence(Arc::new(items)))
        }
        other => Err(Error::semantic(Error::BadFunction(format!(
            "expected a literal, found {:?}",
            other
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::functions::Variadic;
    use crate::parser::{parse, MAX_RECURSION_DEPTH};

    fn table() -> Table {
        let mut table = Table::new();
        table.register_fn("len", |s: String| s.chars().count() as i64).unwrap();
        table
            .register_fn("concat", |parts: Variadic<String>| parts.concat())
            .unwrap();
        table
    }

    fn analyze(source: &str) -> Result<Node> {
        let table = table();
        Analyzer::new(&table, MAX_RECURSION_DEPTH).analyze(parse(source)?)
    }

    fn eval(source: &str, root: serde_json::Value) -> Value {
        analyze(source)
            .unwrap()
            .eval(&Context::new(Value::from(root)))
            .unwrap()
    }

    #[test]
    fn test_list_literal_becomes_sequence() {
        let node = analyze("[1, 'a', [true], -2]").unwrap();
        let Node::Literal(Value::Sequence(items)) = node else {
            panic!("expected literal sequence, got {:?}", node);
        };
        assert_eq!(items.len(), 4);
        assert_eq!(items[3], Value::Int(-2));
    }

    #[test]
    fn test_navigation_flattens() {
        let node = analyze("a.b[0].c").unwrap();
        let Node::Sequence(steps) = node else {
            panic!("expected sequence");
        };
        assert_eq!(steps.len(), 4);
        assert!(matches!(steps[2], Node::Index(_)));
    }

    #[test]
    fn test_unknown_function_suggests() {
        let err = analyze("lenn('x')").unwrap_err();
        assert!(err.is_compile_error());
        let name = err.name_error().unwrap();
        assert_eq!(name.name, "lenn");
        assert_eq!(name.suggestions, vec!["len".to_string()]);
    }

    #[test]
    fn test_arity_counts_cursor_for_member_calls() {
        assert!(analyze("len('x')").is_ok());
        assert!(analyze("name.len()").is_ok());

        let err = analyze("name.len('x')").unwrap_err();
        let Error::Semantic(inner) = err else {
            panic!("expected semantic error");
        };
        assert!(matches!(*inner, Error::Arity(ref a) if a.actual == 2));

        assert!(analyze("concat()").is_ok());
        assert!(analyze("a.concat('b', 'c')").is_ok());
    }

    #[test]
    fn test_free_and_member_calls_evaluate() {
        assert_eq!(eval("len('hello')", serde_json::json!(null)), Value::Int(5));
        assert_eq!(
            eval("name.len()", serde_json::json!({"name": "ada"})),
            Value::Int(3)
        );
        assert_eq!(
            eval("name.concat('!', '?')", serde_json::json!({"name": "ada"})),
            Value::from("ada!?")
        );
    }

    #[test]
    fn test_slice_defaults_begin_to_zero() {
        assert_eq!(
            eval("xs[:2]", serde_json::json!({"xs": [1, 2, 3]})),
            Value::sequence([1, 2])
        );
    }

    #[test]
    fn test_long_operator_chain_hits_depth_limit() {
        let source = vec!["1"; 64].join(" + ");
        let table = table();
        let ast = parse(&source).unwrap();
        let err = Analyzer::new(&table, 32).analyze(ast).unwrap_err();
        assert_eq!(
            err.to_string(),
            "semantic error: expression too deeply nested (max depth: 32)"
        );

        let ast = parse(&source).unwrap();
        assert!(Analyzer::new(&table, 128).analyze(ast).is_ok());
    }
}
