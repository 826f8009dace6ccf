use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Div,
    Mod,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    In,
    Is,
    As,
}

impl BinaryOperator {
    /// Method names a struct may declare to overload this operator.
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            BinaryOperator::Add => &["Add"],
            BinaryOperator::Subtract => &["Subtract"],
            BinaryOperator::Multiply => &["Multiply"],
            BinaryOperator::Divide => &["Divide"],
            BinaryOperator::Div => &["IntDivide"],
            BinaryOperator::Mod => &["Modulus"],
            BinaryOperator::Shl => &["LeftShift"],
            BinaryOperator::Shr => &["RightShift"],
            BinaryOperator::And => &["LogicalAnd", "BitwiseAnd"],
            BinaryOperator::Or => &["LogicalOr", "BitwiseOr"],
            BinaryOperator::Xor => &["LogicalXor", "BitwiseXor"],
            BinaryOperator::Equal => &["Equal"],
            BinaryOperator::NotEqual => &["NotEqual"],
            BinaryOperator::LessThan => &["LessThan"],
            BinaryOperator::LessThanEqual => &["LessThanOrEqual"],
            BinaryOperator::GreaterThan => &["GreaterThan"],
            BinaryOperator::GreaterThanEqual => &["GreaterThanOrEqual"],
            BinaryOperator::In => &["In"],
            BinaryOperator::Is | BinaryOperator::As => &[],
        }
    }

    /// Name given to synthesized intrinsics for this operator.
    pub fn intrinsic_name(&self) -> &'static str {
        match self {
            BinaryOperator::Is => "Is",
            BinaryOperator::As => "As",
            _ => self.names().first().copied().unwrap_or_default(),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Div => "div",
            BinaryOperator::Mod => "mod",
            BinaryOperator::Shl => "shl",
            BinaryOperator::Shr => "shr",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanEqual => ">=",
            BinaryOperator::In => "in",
            BinaryOperator::Is => "is",
            BinaryOperator::As => "as",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanEqual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperator {
    Not,
    Plus,
    Negate,
}

impl UnaryOperator {
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            UnaryOperator::Not => &["LogicalNot", "BitwiseNot"],
            UnaryOperator::Plus => &["Positive"],
            UnaryOperator::Negate => &["Negative"],
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Plus => "+",
            UnaryOperator::Negate => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Binary(BinaryOperator),
    Unary(UnaryOperator),
}

impl Operator {
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            Operator::Binary(operator) => operator.names(),
            Operator::Unary(operator) => operator.names(),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Operator::Binary(_) => 2,
            Operator::Unary(_) => 1,
        }
    }
}

impl From<BinaryOperator> for Operator {
    fn from(operator: BinaryOperator) -> Self {
        Operator::Binary(operator)
    }
}

impl From<UnaryOperator> for Operator {
    fn from(operator: UnaryOperator) -> Self {
        Operator::Unary(operator)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Binary(operator) => f.write_str(operator.symbol()),
            Operator::Unary(operator) => f.write_str(operator.symbol()),
        }
    }
}
