//! Type system
//!
//! Provides the closed set of type variants, integer range semantics, the
//! intrinsic type table and the factory owning struct/enum identities.

mod factory;
mod integer;
mod intrinsic;
mod model;

pub use factory::{EnumData, StructData, TypeFactory};
pub use integer::IntegerType;
pub use intrinsic::IntrinsicType;
pub use model::{
    ArgumentMatcher, ArrayKind, ArrayType, BooleanKind, DecimalKind, DecimalType, EnumId,
    EnumType, PointerType, ProceduralKind, ProceduralType, StructId, StructKind, StructType,
    TextKind, Type, TypeType, VariantKind,
};
