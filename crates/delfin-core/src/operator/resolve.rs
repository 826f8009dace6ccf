//! Overload ranking
//!
//! Every argument is scored against the matching parameter. Candidates are
//! ordered by: all-exact first, then the worst conversion they need, then the
//! total ordinal distance, then signed integer parameters, then the more
//! specific procedural kind. Whatever is still tied is ambiguous.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::trace;

use super::collector::OperatorCollector;
use super::invocable::{Invocable, InvocableOrigin};
use super::kind::Operator;
use crate::types::{ArrayKind, ProceduralKind, StructKind, Type, TypeFactory};

/// How an argument reaches a parameter type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    Exact,
    /// Lossless widening, upcast or nil assignment.
    Promotion(f64),
    /// Implicit but lossy or representation-changing.
    Convertible(f64),
    /// A Variant unpacked into a concrete type at runtime.
    FromVariant,
    /// The parameter accepts anything.
    Untyped,
    Incompatible,
}

impl Conversion {
    fn tier(&self) -> u8 {
        match self {
            Conversion::Exact => 0,
            Conversion::Promotion(_) => 1,
            Conversion::Convertible(_) => 2,
            Conversion::FromVariant => 3,
            Conversion::Untyped => 4,
            Conversion::Incompatible => 5,
        }
    }

    fn distance(&self) -> f64 {
        match self {
            Conversion::Promotion(distance) | Conversion::Convertible(distance) => *distance,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Invocable),
    /// Several candidates ranked equally; `chosen` is the first of them in
    /// declaration order.
    Ambiguous {
        chosen: Invocable,
        candidates: Vec<Invocable>,
    },
    NoApplicable,
}

impl Resolution {
    pub fn chosen(&self) -> Option<&Invocable> {
        match self {
            Resolution::Resolved(invocable) => Some(invocable),
            Resolution::Ambiguous { chosen, .. } => Some(chosen),
            Resolution::NoApplicable => None,
        }
    }

    pub fn return_type(&self) -> Type {
        self.chosen()
            .map_or(Type::Unknown, |invocable| invocable.return_type.clone())
    }
}

struct Rank {
    exact: bool,
    worst: u8,
    distance: f64,
    signed_parameters: usize,
    procedural: Vec<Option<ProceduralKind>>,
}

impl Rank {
    /// `Less` means `self` is the better candidate.
    fn compare(&self, other: &Rank) -> Ordering {
        other
            .exact
            .cmp(&self.exact)
            .then(self.worst.cmp(&other.worst))
            .then(self.distance.total_cmp(&other.distance))
            .then(other.signed_parameters.cmp(&self.signed_parameters))
            .then_with(|| {
                self.procedural
                    .iter()
                    .zip(&other.procedural)
                    .find_map(|pair| match pair {
                        (Some(mine), Some(theirs)) if mine != theirs => Some(theirs.cmp(mine)),
                        _ => None,
                    })
                    .unwrap_or(Ordering::Equal)
            })
    }
}

#[derive(Clone, Copy)]
pub struct OverloadResolver<'a> {
    types: &'a TypeFactory,
}

impl<'a> OverloadResolver<'a> {
    pub fn new(types: &'a TypeFactory) -> Self {
        Self { types }
    }

    pub fn conversion(&self, argument: &Type, parameter: &Type) -> Conversion {
        if argument == parameter {
            return Conversion::Exact;
        }

        match parameter {
            Type::Untyped => return Conversion::Untyped,
            Type::Matcher(matcher) => {
                return if matcher.matches(argument) {
                    Conversion::Convertible(0.0)
                } else {
                    Conversion::Incompatible
                };
            }
            _ => {}
        }

        let (argument, parameter) = (argument.unaliased(), parameter.unaliased());
        if argument == parameter {
            return Conversion::Promotion(0.0);
        }

        match (argument, parameter) {
            (Type::Unknown, _) => Conversion::Convertible(0.0),
            (Type::Integer(from), Type::Integer(to)) => {
                let distance = from.ordinal_distance(to);
                if from.fits_in(to) {
                    Conversion::Promotion(distance)
                } else {
                    Conversion::Convertible(distance)
                }
            }
            (Type::Integer(_), Type::Decimal(_)) => Conversion::Convertible(0.0),
            (Type::Decimal(from), Type::Decimal(to)) => {
                let distance = f64::from(from.size.abs_diff(to.size));
                if from.size <= to.size {
                    Conversion::Promotion(distance)
                } else {
                    Conversion::Convertible(distance)
                }
            }
            (Type::Text(from), Type::Text(to)) => match (from.is_char(), to.is_char()) {
                (true, false) => Conversion::Promotion(1.0),
                (false, true) => Conversion::Incompatible,
                _ => Conversion::Convertible(0.0),
            },
            (Type::Boolean(_), Type::Boolean(_)) => Conversion::Convertible(0.0),
            (Type::Struct(from), Type::Struct(to)) => {
                match self.types.inheritance_distance(from, to) {
                    Some(depth) => Conversion::Promotion(f64::from(depth)),
                    None => Conversion::Incompatible,
                }
            }
            (Type::ClassReference(from), Type::ClassReference(to)) => {
                match (from.as_struct(), to.as_struct()) {
                    (Some(from), Some(to)) => match self.types.inheritance_distance(from, to) {
                        Some(depth) => Conversion::Promotion(f64::from(depth)),
                        None => Conversion::Incompatible,
                    },
                    _ => Conversion::Incompatible,
                }
            }
            (Type::Pointer(from), _) if from.nil => {
                if accepts_nil(parameter) {
                    Conversion::Promotion(0.0)
                } else {
                    Conversion::Incompatible
                }
            }
            (Type::Pointer(from), Type::Pointer(to)) => {
                if to.is_untyped() {
                    Conversion::Promotion(0.0)
                } else if from.is_untyped() || from.dereferenced == to.dereferenced {
                    Conversion::Convertible(0.0)
                } else {
                    Conversion::Incompatible
                }
            }
            (other, Type::Variant(_)) => {
                if other.is_struct() {
                    Conversion::Incompatible
                } else {
                    Conversion::Convertible(0.0)
                }
            }
            (Type::Variant(_), other) => {
                if other.is_struct() {
                    Conversion::Incompatible
                } else {
                    Conversion::FromVariant
                }
            }
            (Type::ArrayConstructor(elements), Type::Set(element)) => {
                self.all_elements_convert(elements, element)
            }
            (Type::ArrayConstructor(elements), Type::Array(array)) => {
                if array.kind == ArrayKind::OpenOfConst {
                    Conversion::Convertible(0.0)
                } else {
                    self.all_elements_convert(elements, &array.element)
                }
            }
            (Type::ArrayConstructor(elements), Type::ArrayConstructor(targets)) => {
                match targets.first() {
                    Some(target) => self.all_elements_convert(elements, target),
                    None if elements.is_empty() => Conversion::Convertible(0.0),
                    None => Conversion::Incompatible,
                }
            }
            (Type::Set(from), Type::Set(to)) => {
                if self.conversion(from, to) == Conversion::Incompatible {
                    Conversion::Incompatible
                } else {
                    Conversion::Convertible(0.0)
                }
            }
            (Type::Array(from), Type::Array(to)) => match to.kind {
                ArrayKind::Open if from.element == to.element => Conversion::Promotion(0.0),
                ArrayKind::OpenOfConst => Conversion::Convertible(0.0),
                _ => Conversion::Incompatible,
            },
            (Type::Procedural(from), Type::Procedural(to)) => {
                if from.parameters == to.parameters && from.return_type == to.return_type {
                    Conversion::Convertible(0.0)
                } else {
                    Conversion::Incompatible
                }
            }
            _ => Conversion::Incompatible,
        }
    }

    fn all_elements_convert(&self, elements: &[Type], target: &Type) -> Conversion {
        let compatible = elements.iter().all(|element| {
            element.is_void() || self.conversion(element, target) != Conversion::Incompatible
        });
        if compatible {
            Conversion::Convertible(0.0)
        } else {
            Conversion::Incompatible
        }
    }

    fn rank(&self, candidate: &Invocable, arguments: &[Type]) -> Option<Rank> {
        if !candidate.accepts_arity(arguments.len()) {
            return None;
        }

        let mut rank = Rank {
            exact: true,
            worst: 0,
            distance: 0.0,
            signed_parameters: 0,
            procedural: Vec::with_capacity(arguments.len()),
        };
        for (argument, parameter) in arguments.iter().zip(&candidate.parameters) {
            let conversion = self.conversion(argument, parameter);
            if conversion == Conversion::Incompatible {
                return None;
            }
            rank.exact &= conversion == Conversion::Exact;
            rank.worst = rank.worst.max(conversion.tier());
            rank.distance += conversion.distance();
            if parameter.as_integer().is_some_and(|integer| integer.signed) {
                rank.signed_parameters += 1;
            }
            rank.procedural
                .push(parameter.as_procedural().map(|procedural| procedural.kind));
        }
        Some(rank)
    }

    pub fn resolve(
        &self,
        candidates: impl IntoIterator<Item = Invocable>,
        arguments: &[Type],
    ) -> Resolution {
        let ranked: Vec<(Invocable, Rank)> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let rank = self.rank(&candidate, arguments)?;
                Some((candidate, rank))
            })
            .collect();

        let mut best: Vec<Invocable> = ranked
            .iter()
            .filter(|(_, rank)| {
                ranked
                    .iter()
                    .all(|(_, other)| other.compare(rank) != Ordering::Less)
            })
            .map(|(candidate, _)| candidate.clone())
            .collect();
        best.sort_by(declaration_order);

        let mut best = best.into_iter();
        match (best.next(), best.len()) {
            (None, _) => Resolution::NoApplicable,
            (Some(chosen), 0) => Resolution::Resolved(chosen),
            (Some(chosen), _) => {
                let mut candidates = vec![chosen.clone()];
                candidates.extend(best);
                trace!(
                    chosen = %chosen,
                    count = candidates.len(),
                    "Ambiguous overload"
                );
                Resolution::Ambiguous { chosen, candidates }
            }
        }
    }

    /// Ranks the candidates of `operator` for every operand type together.
    pub fn resolve_operator(
        &self,
        collector: &OperatorCollector<'_>,
        operator: Operator,
        operands: &[Type],
    ) -> Resolution {
        let candidates: HashSet<Invocable> = operands
            .iter()
            .flat_map(|operand| collector.collect(operand, operator))
            .collect();
        self.resolve(candidates, operands)
    }
}

fn accepts_nil(ty: &Type) -> bool {
    match ty {
        Type::Pointer(_) | Type::ClassReference(_) | Type::Procedural(_) => true,
        Type::Struct(struct_type) => {
            matches!(struct_type.kind, StructKind::Class | StructKind::Interface)
        }
        Type::Array(array) => array.kind == ArrayKind::Dynamic,
        Type::Text(kind) => !kind.is_char(),
        _ => false,
    }
}

/// Declared routines by registration order, then intrinsics by signature.
fn declaration_order(left: &Invocable, right: &Invocable) -> Ordering {
    match (left.origin, right.origin) {
        (InvocableOrigin::Declared(a), InvocableOrigin::Declared(b)) => a.index().cmp(&b.index()),
        (InvocableOrigin::Declared(_), InvocableOrigin::Intrinsic) => Ordering::Less,
        (InvocableOrigin::Intrinsic, InvocableOrigin::Declared(_)) => Ordering::Greater,
        (InvocableOrigin::Intrinsic, InvocableOrigin::Intrinsic) => Ordering::Equal,
    }
    .then_with(|| left.signature().cmp(&right.signature()))
}
