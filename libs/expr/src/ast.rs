//! Parse tree representation
//!
//! The parse tree mirrors the grammar productions directly, without semantic
//! analysis. [`crate::analyzer`] turns it into the evaluable [`crate::expr::Node`]
//! tree.
//!
//! # Grammar Coverage
//!
//! ## Expression Rules (loosest binding first)
//! - CastExpression: `expression 'as' type`
//! - CoalesceExpression: `expression '??' expression`
//! - ElvisExpression: `expression '?:' expression`
//! - TernaryExpression: `expression '?' expression ':' expression`
//! - EqualityExpression: `expression ('==' | '!=') expression`
//! - InequalityExpression: `expression ('<' | '<=' | '>' | '>=') expression`
//! - BitwiseOrExpression: `expression ('|' | '^') expression`
//! - BitwiseAndExpression: `expression '&' expression`
//! - ShiftExpression: `expression ('<<' | '>>') expression`
//! - ImpliesExpression: `expression ('<->' | 'implies') expression`
//! - OrExpression: `expression ('||' | 'or') expression`
//! - AndExpression: `expression ('&&' | 'and') expression`
//! - AdditiveExpression: `expression ('+' | '-') expression`
//! - MultiplicativeExpression: `expression ('*' | '/' | '//' | '%') expression`
//! - ExponentiationExpression: `expression '**' expression` (right associative)
//! - PolarityExpression: `('+' | '-') expression`
//! - BitwiseNotExpression: `'~' expression`
//! - LogicalNotExpression: `('!' | 'not') expression`
//! - MembershipExpression: `expression 'not'? 'in' expression`
//! - TypeExpression: `expression 'is' 'not'? type`
//! - IndexerExpression: `expression '[' expression ']'`
//! - SliceExpression: `expression '[' expression? ':' expression? ']'`
//! - InvocationExpression: `expression '.' invocation`
//!
//! ## Term Rules
//! - Literals: `null`, `true`/`false`, strings, integers, floats, `[literal, ...]`
//! - ParenthesizedTerm: `'(' expression ')'`
//! - Invocations: `identifier`, `'*'`, `identifier '(' parameters? ')'`

use crate::convert::TypeTag;

/// Parse tree node
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    // ============================================
    // Expression types
    // ============================================
    /// Cast expression: expression 'as' type
    CastExpression {
        expression: Box<AstNode>,
        type_name: TypeTag,
    },

    /// Coalesce expression: expression '??' expression
    CoalesceExpression {
        left: Box<AstNode>,
        right: Box<AstNode>,
    },

    /// Elvis expression: expression '?:' expression
    ElvisExpression {
        condition: Box<AstNode>,
        alternative: Box<AstNode>,
    },

    /// Ternary expression: expression '?' expression ':' expression
    TernaryExpression {
        condition: Box<AstNode>,
        then_branch: Box<AstNode>,
        else_branch: Box<AstNode>,
    },

    EqualityExpression {
        left: Box<AstNode>,
        operator: EqualityOperator,
        right: Box<AstNode>,
    },

    InequalityExpression {
        left: Box<AstNode>,
        operator: InequalityOperator,
        right: Box<AstNode>,
    },

    /// Bitwise or expression: expression ('|' | '^') expression
    BitwiseOrExpression {
        left: Box<AstNode>,
        operator: BitwiseOrOperator,
        right: Box<AstNode>,
    },

    BitwiseAndExpression {
        left: Box<AstNode>,
        right: Box<AstNode>,
    },

    ShiftExpression {
        left: Box<AstNode>,
        operator: ShiftOperator,
        right: Box<AstNode>,
    },

    /// Implies expression: expression ('<->' | 'implies') expression
    ImpliesExpression {
        left: Box<AstNode>,
        right: Box<AstNode>,
    },

    OrExpression {
        left: Box<AstNode>,
        right: Box<AstNode>,
    },

    AndExpression {
        left: Box<AstNode>,
        right: Box<AstNode>,
    },

    AdditiveExpression {
        left: Box<AstNode>,
        operator: AdditiveOperator,
        right: Box<AstNode>,
    },

    MultiplicativeExpression {
        left: Box<AstNode>,
        operator: MultiplicativeOperator,
        right: Box<AstNode>,
    },

    /// Exponentiation expression: expression '**' expression
    ExponentiationExpression {
        base: Box<AstNode>,
        exponent: Box<AstNode>,
    },

    /// Polarity expression: ('+' | '-') expression
    PolarityExpression {
        operator: PolarityOperator,
        expression: Box<AstNode>,
    },

    /// Bitwise not expression: '~' expression
    BitwiseNotExpression { expression: Box<AstNode> },

    /// Logical not expression: ('!' | 'not') expression
    LogicalNotExpression { expression: Box<AstNode> },

    /// Membership expression: expression 'not'? 'in' expression
    MembershipExpression {
        left: Box<AstNode>,
        negated: bool,
        right: Box<AstNode>,
    },

    /// Type expression: expression 'is' 'not'? type
    TypeExpression {
        expression: Box<AstNode>,
        negated: bool,
        type_name: TypeTag,
    },

    /// Indexer expression: expression '[' expression ']'
    IndexerExpression {
        expression: Box<AstNode>,
        index: Box<AstNode>,
    },

    /// Slice expression: expression '[' expression? ':' expression? ']'
    SliceExpression {
        expression: Box<AstNode>,
        begin: Option<Box<AstNode>>,
        end: Option<Box<AstNode>>,
    },

    /// Invocation expression: expression '.' invocation
    InvocationExpression {
        expression: Box<AstNode>,
        invocation: Box<AstNode>,
    },

    // ============================================
    // Term types
    // ============================================
    /// Parenthesized term: '(' expression ')'
    ParenthesizedTerm { expression: Box<AstNode> },

    // ============================================
    // Invocation types
    // ============================================
    /// Member invocation: identifier
    MemberInvocation { identifier: String },

    /// Wildcard invocation: '*'
    WildcardInvocation,

    /// Function invocation: identifier '(' parameters? ')'
    FunctionInvocation {
        function_name: String,
        parameters: Vec<AstNode>,
    },

    // ============================================
    // Literal types
    // ============================================
    NullLiteral,

    BooleanLiteral(bool),

    StringLiteral(String),

    IntegerLiteral(i64),

    FloatLiteral(f64),

    /// List literal: '[' literal (',' literal)* ']'
    ListLiteral { elements: Vec<AstNode> },
}

impl AstNode {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            AstNode::NullLiteral
                | AstNode::BooleanLiteral(_)
                | AstNode::StringLiteral(_)
                | AstNode::IntegerLiteral(_)
                | AstNode::FloatLiteral(_)
                | AstNode::ListLiteral { .. }
        )
    }
}

// ============================================
// Operator types
// ============================================

/// Equality operator: '==' | '!='
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityOperator {
    Equal,    // ==
    NotEqual, // !=
}

/// Inequality operator: '<' | '<=' | '>' | '>='
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InequalityOperator {
    LessThan,           // <
    LessThanOrEqual,    // <=
    GreaterThan,        // >
    GreaterThanOrEqual, // >=
}

/// Bitwise or operator: '|' | '^'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitwiseOrOperator {
    Or,  // |
    Xor, // ^
}

/// Shift operator: '<<' | '>>'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOperator {
    Left,  // <<
    Right, // >>
}

/// Additive operator: '+' | '-'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditiveOperator {
    Plus,  // +
    Minus, // -
}

/// Multiplicative operator: '*' | '/' | '//' | '%'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplicativeOperator {
    Multiply,    // *
    Divide,      // /
    FloorDivide, // //
    Modulo,      // %
}

/// Polarity operator: '+' | '-'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarityOperator {
    Plus,  // +
    Minus, // -
}
