//! Candidate signatures for applying an operator to an operand type
//!
//! Collection is pure: the same operand type and operator always produce the
//! same set. Choosing among the candidates is left to [`super::resolve`].

use std::collections::HashSet;

use super::invocable::Invocable;
use super::kind::{BinaryOperator, Operator, UnaryOperator};
use crate::symbol::Lookup;
use crate::types::{ArgumentMatcher, ArrayKind, PointerType, StructType, Type};

#[derive(Clone, Copy)]
pub struct OperatorCollector<'a> {
    lookup: Lookup<'a>,
}

impl<'a> OperatorCollector<'a> {
    pub fn new(lookup: Lookup<'a>) -> Self {
        Self { lookup }
    }

    pub fn collect(&self, ty: &Type, operator: Operator) -> HashSet<Invocable> {
        match operator {
            Operator::Binary(operator) => self.collect_binary(ty, operator),
            Operator::Unary(operator) => self.collect_unary(ty, operator),
        }
    }

    fn collect_binary(&self, ty: &Type, operator: BinaryOperator) -> HashSet<Invocable> {
        let mut result = HashSet::new();
        let ty = ty.unaliased();

        match ty {
            Type::Struct(struct_type) => {
                result.extend(self.operator_overloads(struct_type, operator.into()));
            }
            Type::Pointer(pointer) => result.extend(pointer_math(ty, pointer, operator)),
            Type::Variant(_) => {
                if !matches!(operator, BinaryOperator::In | BinaryOperator::As) {
                    result.insert(variant_binary(operator));
                }
            }
            Type::Set(_) => result.extend(set_like(ty.clone(), operator)),
            Type::ArrayConstructor(elements) => {
                let element = self.lookup.types.normalize_array_constructor(elements);
                result.extend(set_like(Type::ArrayConstructor(vec![element]), operator));
            }
            Type::Array(array) if array.kind == ArrayKind::Dynamic => {
                if operator == BinaryOperator::Add {
                    result.insert(Invocable::intrinsic("Add", vec![ty.clone(), ty.clone()], ty.clone()));
                }
            }
            Type::Integer(_) => result.extend(self.integer_binary(operator)),
            Type::Decimal(_) => result.extend(self.real_binary(operator)),
            Type::Boolean(_) => result.extend(logical(operator)),
            Type::Text(_) => {
                if operator == BinaryOperator::Add {
                    result.insert(Invocable::intrinsic(
                        "Add",
                        vec![Type::STRING, Type::STRING],
                        Type::STRING,
                    ));
                }
            }
            _ => {}
        }

        if operator.is_comparison() {
            result.insert(Invocable::intrinsic(
                operator.intrinsic_name(),
                vec![Type::Untyped, Type::Untyped],
                Type::BOOLEAN,
            ));
        } else if operator == BinaryOperator::In {
            result.insert(Invocable::intrinsic(
                "In",
                vec![
                    Type::Matcher(ArgumentMatcher::AnyOrdinal),
                    Type::Matcher(ArgumentMatcher::AnySet),
                ],
                Type::BOOLEAN,
            ));
        }

        result
    }

    fn collect_unary(&self, ty: &Type, operator: UnaryOperator) -> HashSet<Invocable> {
        match ty.unaliased() {
            Type::Struct(struct_type) => self.operator_overloads(struct_type, operator.into()),
            Type::Variant(_) => HashSet::from([Invocable::intrinsic(
                &format!("Variant::{}", operator.names()[0]),
                vec![Type::VARIANT],
                Type::VARIANT,
            )]),
            _ => match operator {
                UnaryOperator::Not => {
                    let mut result = integer_unary("BitwiseNot");
                    result.insert(Invocable::intrinsic(
                        "LogicalNot",
                        vec![Type::BOOLEAN],
                        Type::BOOLEAN,
                    ));
                    result
                }
                UnaryOperator::Plus => self.arithmetic_unary("Positive"),
                UnaryOperator::Negate => self.arithmetic_unary("Negative"),
            },
        }
    }

    /// Operator methods declared directly on the struct under one of the
    /// operator's names.
    fn operator_overloads(&self, struct_type: &StructType, operator: Operator) -> HashSet<Invocable> {
        let scope = self.lookup.types.struct_scope(struct_type);
        self.lookup
            .symbols
            .declarations_in(scope)
            .filter(|declaration| declaration.is_operator())
            .filter(|declaration| {
                operator
                    .names()
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(&declaration.name))
            })
            .filter_map(Invocable::from_declaration)
            .collect()
    }

    fn integer_binary(&self, operator: BinaryOperator) -> HashSet<Invocable> {
        match operator {
            BinaryOperator::And => {
                let mut result: HashSet<Invocable> = [Type::SHORT_INT, Type::SMALL_INT, Type::BYTE, Type::WORD]
                    .into_iter()
                    .map(|ty| Invocable::intrinsic("BitwiseAnd", vec![ty.clone(), ty.clone()], ty))
                    .collect();
                result.extend(ladder("BitwiseAnd", &[Type::INTEGER, Type::INT64]));
                result.extend(ladder("BitwiseAnd", &[Type::CARDINAL, Type::UINT64]));
                result
            }
            BinaryOperator::Or => bitwise_or("BitwiseOr"),
            BinaryOperator::Xor => bitwise_or("BitwiseXor"),
            BinaryOperator::Add => self.arithmetic_binary("Add"),
            BinaryOperator::Subtract => self.arithmetic_binary("Subtract"),
            BinaryOperator::Multiply => self.arithmetic_binary("Multiply"),
            BinaryOperator::Divide => self.divide(),
            BinaryOperator::Div => integer_arithmetic("IntDivide"),
            BinaryOperator::Mod => integer_arithmetic("Modulus"),
            BinaryOperator::Shl => shift("LeftShift"),
            BinaryOperator::Shr => shift("RightShift"),
            _ => HashSet::new(),
        }
    }

    fn real_binary(&self, operator: BinaryOperator) -> HashSet<Invocable> {
        match operator {
            BinaryOperator::Add => self.arithmetic_binary("Add"),
            BinaryOperator::Subtract => self.arithmetic_binary("Subtract"),
            BinaryOperator::Multiply => self.arithmetic_binary("Multiply"),
            BinaryOperator::Divide => self.divide(),
            _ => HashSet::new(),
        }
    }

    fn arithmetic_binary(&self, name: &str) -> HashSet<Invocable> {
        let extended = self.lookup.types.extended();
        let mut result = integer_arithmetic(name);
        result.insert(Invocable::intrinsic(
            name,
            vec![extended.clone(), extended.clone()],
            extended.clone(),
        ));
        result.insert(Invocable::intrinsic(
            name,
            vec![Type::INTEGER, extended.clone()],
            extended.clone(),
        ));
        result.insert(Invocable::intrinsic(
            name,
            vec![extended.clone(), Type::INTEGER],
            extended,
        ));
        result
    }

    fn divide(&self) -> HashSet<Invocable> {
        let extended = self.lookup.types.extended();
        HashSet::from([Invocable::intrinsic(
            "Divide",
            vec![extended.clone(), extended.clone()],
            extended,
        )])
    }

    fn arithmetic_unary(&self, name: &str) -> HashSet<Invocable> {
        let extended = self.lookup.types.extended();
        let mut result = integer_unary(name);
        result.insert(Invocable::intrinsic(name, vec![extended.clone()], extended));
        result
    }
}

/// Same-width signatures for every type, plus both orderings of each
/// width-adjacent pair promoting to the wider type. Non-adjacent widths are
/// never combined.
fn ladder(name: &str, types: &[Type]) -> HashSet<Invocable> {
    let mut result = HashSet::new();
    for (index, ty) in types.iter().enumerate() {
        result.insert(Invocable::intrinsic(name, vec![ty.clone(), ty.clone()], ty.clone()));
        if let Some(next) = types.get(index + 1) {
            result.insert(Invocable::intrinsic(name, vec![ty.clone(), next.clone()], next.clone()));
            result.insert(Invocable::intrinsic(name, vec![next.clone(), ty.clone()], next.clone()));
        }
    }
    result
}

fn bitwise_or(name: &str) -> HashSet<Invocable> {
    let mut result = ladder(
        name,
        &[Type::SHORT_INT, Type::SMALL_INT, Type::INTEGER, Type::INT64],
    );
    result.extend(ladder(
        name,
        &[Type::BYTE, Type::WORD, Type::CARDINAL, Type::UINT64],
    ));
    result
}

fn integer_arithmetic(name: &str) -> HashSet<Invocable> {
    let mut result = ladder(name, &[Type::INTEGER, Type::INT64]);
    result.extend(ladder(name, &[Type::CARDINAL, Type::UINT64]));
    result
}

fn shift(name: &str) -> HashSet<Invocable> {
    [Type::INTEGER, Type::CARDINAL, Type::INT64, Type::UINT64]
        .into_iter()
        .map(|ty| Invocable::intrinsic(name, vec![ty.clone(), Type::INTEGER], ty))
        .collect()
}

fn integer_unary(name: &str) -> HashSet<Invocable> {
    [Type::INTEGER, Type::INT64]
        .into_iter()
        .map(|ty| Invocable::intrinsic(name, vec![ty.clone()], ty))
        .collect()
}

fn logical(operator: BinaryOperator) -> HashSet<Invocable> {
    let name = match operator {
        BinaryOperator::And => "LogicalAnd",
        BinaryOperator::Or => "LogicalOr",
        BinaryOperator::Xor => "LogicalXor",
        _ => return HashSet::new(),
    };
    HashSet::from([Invocable::intrinsic(
        name,
        vec![Type::BOOLEAN, Type::BOOLEAN],
        Type::BOOLEAN,
    )])
}

fn pointer_math(ty: &Type, pointer: &PointerType, operator: BinaryOperator) -> HashSet<Invocable> {
    if !pointer.pointer_math {
        return HashSet::new();
    }

    let operand = Type::Matcher(ArgumentMatcher::PointerMathOperand);
    match operator {
        BinaryOperator::Add => HashSet::from([
            Invocable::intrinsic("Add", vec![ty.clone(), Type::INTEGER], ty.clone()),
            Invocable::intrinsic("Add", vec![Type::INTEGER, ty.clone()], ty.clone()),
            Invocable::intrinsic("Add", vec![ty.clone(), operand], ty.clone()),
        ]),
        BinaryOperator::Subtract => HashSet::from([
            Invocable::intrinsic("Subtract", vec![ty.clone(), Type::INTEGER], ty.clone()),
            Invocable::intrinsic("Subtract", vec![ty.clone(), operand], Type::INTEGER),
        ]),
        _ => HashSet::new(),
    }
}

fn variant_binary(operator: BinaryOperator) -> Invocable {
    let return_type = if operator.is_comparison() {
        Type::BOOLEAN
    } else {
        Type::VARIANT
    };
    Invocable::intrinsic(
        &format!("Variant::{}", operator.intrinsic_name()),
        vec![Type::VARIANT, Type::VARIANT],
        return_type,
    )
}

fn set_like(ty: Type, operator: BinaryOperator) -> HashSet<Invocable> {
    let name = match operator {
        BinaryOperator::Add => "Add",
        BinaryOperator::Subtract => "Subtract",
        BinaryOperator::Multiply => "Multiply",
        _ => return HashSet::new(),
    };
    HashSet::from([Invocable::intrinsic(name, vec![ty.clone(), ty.clone()], ty)])
}
