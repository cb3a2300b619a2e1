//! Unit tests for the expression parser

use ferrum_expr::ast::{
    AdditiveOperator, AstNode, EqualityOperator, InequalityOperator, MultiplicativeOperator,
    PolarityOperator, ShiftOperator,
};
use ferrum_expr::parser::{parse, parse_with_depth, MAX_RECURSION_DEPTH};
use ferrum_expr::{Error, SyntaxError, TypeTag};

mod test_support;

fn parse_ok(input: &str) -> AstNode {
    parse(input).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", input, e))
}

fn syntax_error(input: &str) -> SyntaxError {
    match parse(input) {
        Err(Error::Syntax(err)) => err,
        other => panic!("expected syntax error for {:?}, got {:?}", input, other),
    }
}

fn member(name: &str) -> Box<AstNode> {
    Box::new(AstNode::MemberInvocation {
        identifier: name.to_string(),
    })
}

fn int(value: i64) -> Box<AstNode> {
    Box::new(AstNode::IntegerLiteral(value))
}

#[test]
fn test_member_chain() {
    assert_eq!(
        parse_ok("a.b"),
        AstNode::InvocationExpression {
            expression: member("a"),
            invocation: member("b"),
        }
    );
}

#[test]
fn test_function_calls() {
    assert_eq!(
        parse_ok("max(1, x)"),
        AstNode::FunctionInvocation {
            function_name: "max".into(),
            parameters: vec![AstNode::IntegerLiteral(1), *member("x")],
        }
    );
    assert_eq!(
        parse_ok("now()"),
        AstNode::FunctionInvocation {
            function_name: "now".into(),
            parameters: vec![],
        }
    );
}

#[test]
fn test_left_associative_operators() {
    // 1 - 2 - 3 is (1 - 2) - 3
    assert_eq!(
        parse_ok("1 - 2 - 3"),
        AstNode::AdditiveExpression {
            left: Box::new(AstNode::AdditiveExpression {
                left: int(1),
                operator: AdditiveOperator::Minus,
                right: int(2),
            }),
            operator: AdditiveOperator::Minus,
            right: int(3),
        }
    );
    assert!(matches!(
        parse_ok("8 // 2 % 3"),
        AstNode::MultiplicativeExpression {
            operator: MultiplicativeOperator::Modulo,
            ..
        }
    ));
}

#[test]
fn test_parentheses_are_kept() {
    let ast = parse_ok("(1 + 2) * 3");
    let AstNode::MultiplicativeExpression { left, .. } = ast else {
        panic!("expected multiplicative expression");
    };
    assert!(matches!(*left, AstNode::ParenthesizedTerm { .. }));
}

#[test]
fn test_comparison_levels() {
    let ast = parse_ok("a < b == c >= d");
    let AstNode::EqualityExpression {
        left,
        operator,
        right,
    } = ast
    else {
        panic!("expected equality at the top");
    };
    assert_eq!(operator, EqualityOperator::Equal);
    assert!(matches!(
        *left,
        AstNode::InequalityExpression {
            operator: InequalityOperator::LessThan,
            ..
        }
    ));
    assert!(matches!(
        *right,
        AstNode::InequalityExpression {
            operator: InequalityOperator::GreaterThanOrEqual,
            ..
        }
    ));
}

#[test]
fn test_logical_operators_bind_tighter_than_comparisons() {
    // compares x with (1 and y)
    let ast = parse_ok("x == 1 and y");
    let AstNode::EqualityExpression { right, .. } = ast else {
        panic!("expected equality at the top");
    };
    assert!(matches!(*right, AstNode::AndExpression { .. }));

    let ast = parse_ok("a || b && c");
    let AstNode::OrExpression { right, .. } = ast else {
        panic!("expected or at the top");
    };
    assert!(matches!(*right, AstNode::AndExpression { .. }));
}

#[test]
fn test_implies_forms() {
    assert!(matches!(
        parse_ok("a implies b"),
        AstNode::ImpliesExpression { .. }
    ));
    assert!(matches!(parse_ok("a <-> b"), AstNode::ImpliesExpression { .. }));
}

#[test]
fn test_bitwise_levels() {
    let ast = parse_ok("a | b & c << 2");
    let AstNode::BitwiseOrExpression { right, .. } = ast else {
        panic!("expected bitwise or at the top");
    };
    let AstNode::BitwiseAndExpression { right, .. } = *right else {
        panic!("expected bitwise and");
    };
    assert!(matches!(
        *right,
        AstNode::ShiftExpression {
            operator: ShiftOperator::Left,
            ..
        }
    ));
    assert!(matches!(
        parse_ok("~a"),
        AstNode::BitwiseNotExpression { .. }
    ));
}

#[test]
fn test_polarity_and_power() {
    // Polarity binds tighter than '**', so -2 ** 2 is (-2) ** 2
    let ast = parse_ok("-2 ** 2");
    let AstNode::ExponentiationExpression { base, .. } = ast else {
        panic!("expected exponentiation");
    };
    assert_eq!(
        *base,
        AstNode::PolarityExpression {
            operator: PolarityOperator::Minus,
            expression: int(2),
        }
    );
}

#[test]
fn test_coalesce_and_elvis_chain_left() {
    let ast = parse_ok("a ?? b ?? c");
    let AstNode::CoalesceExpression { left, right } = ast else {
        panic!("expected coalesce");
    };
    assert!(matches!(*left, AstNode::CoalesceExpression { .. }));
    assert_eq!(right, member("c"));

    let ast = parse_ok("a ?: b ?: c");
    let AstNode::ElvisExpression { condition, .. } = ast else {
        panic!("expected elvis");
    };
    assert!(matches!(*condition, AstNode::ElvisExpression { .. }));
}

#[test]
fn test_ternary_then_branch_is_full_expression() {
    let ast = parse_ok("ok ? a ?? b : c");
    let AstNode::TernaryExpression { then_branch, .. } = ast else {
        panic!("expected ternary");
    };
    assert!(matches!(*then_branch, AstNode::CoalesceExpression { .. }));
}

#[test]
fn test_type_tests_and_casts() {
    for (name, tag) in [
        ("int", TypeTag::Int),
        ("uint", TypeTag::Uint),
        ("float", TypeTag::Float),
        ("string", TypeTag::String),
        ("bool", TypeTag::Bool),
    ] {
        assert_eq!(
            parse_ok(&format!("x is {}", name)),
            AstNode::TypeExpression {
                expression: member("x"),
                negated: false,
                type_name: tag,
            }
        );
        assert_eq!(
            parse_ok(&format!("x as {}", name)),
            AstNode::CastExpression {
                expression: member("x"),
                type_name: tag,
            }
        );
    }
}

#[test]
fn test_type_names_are_members_outside_type_position() {
    assert_eq!(
        parse_ok("row.string"),
        AstNode::InvocationExpression {
            expression: member("row"),
            invocation: member("string"),
        }
    );
}

#[test]
fn test_membership() {
    assert_eq!(
        parse_ok("x in [1, 2]"),
        AstNode::MembershipExpression {
            left: member("x"),
            negated: false,
            right: Box::new(AstNode::ListLiteral {
                elements: vec![AstNode::IntegerLiteral(1), AstNode::IntegerLiteral(2)],
            }),
        }
    );
    assert!(matches!(
        parse_ok("not x in xs"),
        AstNode::LogicalNotExpression { .. }
    ));
}

#[test]
fn test_index_and_slice_on_calls() {
    assert!(matches!(
        parse_ok("keys(m)[0]"),
        AstNode::IndexerExpression { .. }
    ));
    assert_eq!(
        parse_ok("xs[1:3]"),
        AstNode::SliceExpression {
            expression: member("xs"),
            begin: Some(int(1)),
            end: Some(int(3)),
        }
    );
    assert_eq!(
        parse_ok("xs[:]"),
        AstNode::SliceExpression {
            expression: member("xs"),
            begin: None,
            end: None,
        }
    );
}

#[test]
fn test_list_literal_limits() {
    assert_eq!(
        parse_ok("[-9223372036854775808]"),
        AstNode::ListLiteral {
            elements: vec![AstNode::IntegerLiteral(i64::MIN)],
        }
    );
    assert_eq!(
        parse_ok("[+1.5]"),
        AstNode::ListLiteral {
            elements: vec![AstNode::FloatLiteral(1.5)],
        }
    );
    // List items are literals only
    assert!(parse("[a]").is_err());
    assert!(parse("[1 + 2]").is_err());
}

#[test]
fn test_syntax_error_positions() {
    let err = syntax_error("a +\n  )");
    assert_eq!(err.diagnostics.len(), 1);
    assert_eq!(err.diagnostics[0].line, 2);
    assert_eq!(err.diagnostics[0].column, 3);
}

#[test]
fn test_syntax_error_cases() {
    for input in [
        "", "(", ")", "[", "1 +", "a.", ".a", "a..b", "f(,)", "f(1,", "a[]", "x is", "x as",
        "x is number", "1 ? 2", "'open", "1 2",
    ] {
        assert!(
            matches!(parse(input), Err(Error::Syntax(_))),
            "expected {:?} to be rejected",
            input
        );
    }
}

#[test]
fn test_integer_literal_out_of_range() {
    let err = syntax_error("9223372036854775808");
    assert_eq!(
        err.diagnostics[0].message,
        "integer literal '9223372036854775808' is out of range for int"
    );
}

#[test]
fn test_default_depth_limit() {
    let at_limit = format!("{}1{}", "(".repeat(199), ")".repeat(199));
    assert!(parse(&at_limit).is_ok());

    let over_limit = format!("{}1{}", "(".repeat(201), ")".repeat(201));
    let err = match parse(&over_limit) {
        Err(Error::Syntax(err)) => err,
        other => panic!("expected syntax error, got {:?}", other),
    };
    assert_eq!(
        err.diagnostics[0].message,
        format!("expression too deeply nested (max depth: {})", MAX_RECURSION_DEPTH)
    );

    let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
    assert!(parse(&shallow).is_ok());
    assert!(parse_with_depth(&shallow, 10).is_err());
}

#[test]
fn test_prefix_chain_depth() {
    let bangs = format!("{}true", "!".repeat(MAX_RECURSION_DEPTH + 1));
    assert!(parse(&bangs).is_err());
    assert!(parse("!!!true").is_ok());
}
