//! The closed type algebra
//!
//! [`Type`] is a plain value: primitive kinds compare structurally, while
//! structs and enums compare by the arena identity handed out by the
//! [`TypeFactory`](super::TypeFactory).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use id_arena::Id;
use serde::{Deserialize, Serialize};

use super::factory::{EnumData, StructData};
use super::integer::IntegerType;

pub type StructId = Id<StructData>;
pub type EnumId = Id<EnumData>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructKind {
    Class,
    Record,
    Interface,
    Object,
    ClassHelper,
    RecordHelper,
}

impl StructKind {
    pub fn is_helper(&self) -> bool {
        matches!(self, StructKind::ClassHelper | StructKind::RecordHelper)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            StructKind::Class => "class",
            StructKind::Record => "record",
            StructKind::Interface => "interface",
            StructKind::Object => "object",
            StructKind::ClassHelper => "class helper",
            StructKind::RecordHelper => "record helper",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayKind {
    Fixed,
    Dynamic,
    Open,
    OpenOfConst,
}

/// Callable forms, declared from least to most preferred during overload
/// ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProceduralKind {
    Procedure,
    ProcedureOfObject,
    Reference,
    Anonymous,
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecimalKind {
    Single,
    Double,
    Extended,
    Real48,
    Comp,
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalType {
    pub kind: DecimalKind,
    pub size: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanKind {
    Boolean,
    ByteBool,
    WordBool,
    LongBool,
}

impl BooleanKind {
    pub fn size(&self) -> u8 {
        match self {
            BooleanKind::Boolean | BooleanKind::ByteBool => 1,
            BooleanKind::WordBool => 2,
            BooleanKind::LongBool => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    AnsiChar,
    WideChar,
    ShortString,
    AnsiString,
    UnicodeString,
    WideString,
}

impl TextKind {
    pub fn is_char(&self) -> bool {
        matches!(self, TextKind::AnsiChar | TextKind::WideChar)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Normal,
    Ole,
}

/// Pseudo-types that only appear as parameters of synthesized intrinsics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentMatcher {
    AnyOrdinal,
    AnySet,
    PointerMathOperand,
}

impl ArgumentMatcher {
    pub fn matches(&self, ty: &Type) -> bool {
        let ty = ty.unaliased();
        match self {
            ArgumentMatcher::AnyOrdinal => ty.is_ordinal(),
            ArgumentMatcher::AnySet => ty.is_set() || matches!(ty, Type::ArrayConstructor(_)),
            ArgumentMatcher::PointerMathOperand => match ty {
                Type::Pointer(pointer) => pointer.pointer_math,
                Type::Array(array) => array.kind != ArrayKind::OpenOfConst,
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct StructType {
    pub id: StructId,
    pub kind: StructKind,
    pub image: Arc<str>,
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StructType {}

impl Hash for StructType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub id: EnumId,
    pub image: Arc<str>,
}

impl PartialEq for EnumType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EnumType {}

impl Hash for EnumType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointerType {
    pub dereferenced: Type,
    pub nil: bool,
    pub pointer_math: bool,
}

impl PointerType {
    pub fn is_untyped(&self) -> bool {
        matches!(self.dereferenced, Type::Untyped)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub kind: ArrayKind,
    pub element: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProceduralType {
    pub kind: ProceduralKind,
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

/// A distinct named type (`type Integer`) wrapping its original.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeType {
    pub image: Arc<str>,
    pub original: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Sentinel for anything that could not be typed.
    Unknown,
    /// Parameters declared without a type, and the nil pointer's target.
    Untyped,
    Void,
    Integer(IntegerType),
    Decimal(DecimalType),
    Boolean(BooleanKind),
    Text(TextKind),
    Struct(StructType),
    Enum(EnumType),
    Pointer(Box<PointerType>),
    Array(Box<ArrayType>),
    Set(Box<Type>),
    Procedural(Box<ProceduralType>),
    ClassReference(Box<Type>),
    Variant(VariantKind),
    TypeType(Box<TypeType>),
    /// `[a, b, c]` before it is matched against a set or array.
    ArrayConstructor(Vec<Type>),
    Matcher(ArgumentMatcher),
}

impl Type {
    pub const SHORT_INT: Type = Type::Integer(IntegerType::SHORT_INT);
    pub const SMALL_INT: Type = Type::Integer(IntegerType::SMALL_INT);
    pub const INTEGER: Type = Type::Integer(IntegerType::INTEGER);
    pub const INT64: Type = Type::Integer(IntegerType::INT64);
    pub const BYTE: Type = Type::Integer(IntegerType::BYTE);
    pub const WORD: Type = Type::Integer(IntegerType::WORD);
    pub const CARDINAL: Type = Type::Integer(IntegerType::CARDINAL);
    pub const UINT64: Type = Type::Integer(IntegerType::UINT64);
    pub const BOOLEAN: Type = Type::Boolean(BooleanKind::Boolean);
    pub const CHAR: Type = Type::Text(TextKind::WideChar);
    pub const STRING: Type = Type::Text(TextKind::UnicodeString);
    pub const VARIANT: Type = Type::Variant(VariantKind::Normal);

    pub fn pointer_to(dereferenced: Type, pointer_math: bool) -> Type {
        Type::Pointer(Box::new(PointerType {
            dereferenced,
            nil: false,
            pointer_math,
        }))
    }

    pub fn untyped_pointer() -> Type {
        Type::pointer_to(Type::Untyped, false)
    }

    pub fn nil() -> Type {
        Type::Pointer(Box::new(PointerType {
            dereferenced: Type::Untyped,
            nil: true,
            pointer_math: false,
        }))
    }

    pub fn array(kind: ArrayKind, element: Type) -> Type {
        Type::Array(Box::new(ArrayType { kind, element }))
    }

    pub fn set_of(element: Type) -> Type {
        Type::Set(Box::new(element))
    }

    pub fn procedural(kind: ProceduralKind, parameters: Vec<Type>, return_type: Type) -> Type {
        Type::Procedural(Box::new(ProceduralType {
            kind,
            parameters,
            return_type,
        }))
    }

    pub fn class_reference(class: Type) -> Type {
        Type::ClassReference(Box::new(class))
    }

    pub fn type_type(image: &str, original: Type) -> Type {
        Type::TypeType(Box::new(TypeType {
            image: Arc::from(image),
            original,
        }))
    }

    /// Strips distinct-type wrappers down to the underlying type.
    pub fn unaliased(&self) -> &Type {
        let mut current = self;
        while let Type::TypeType(alias) = current {
            current = &alias.original;
        }
        current
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Untyped)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.unaliased(), Type::Integer(_))
    }

    pub fn is_decimal(&self) -> bool {
        matches!(self.unaliased(), Type::Decimal(_))
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_decimal()
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.unaliased(), Type::Boolean(_))
    }

    pub fn is_char(&self) -> bool {
        matches!(self.unaliased(), Type::Text(kind) if kind.is_char())
    }

    pub fn is_string(&self) -> bool {
        matches!(self.unaliased(), Type::Text(kind) if !kind.is_char())
    }

    pub fn is_text(&self) -> bool {
        matches!(self.unaliased(), Type::Text(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.unaliased(), Type::Enum(_))
    }

    pub fn is_ordinal(&self) -> bool {
        self.is_integer() || self.is_boolean() || self.is_char() || self.is_enum()
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.unaliased(), Type::Struct(_))
    }

    pub fn is_class(&self) -> bool {
        matches!(self.unaliased(), Type::Struct(s) if s.kind == StructKind::Class)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.unaliased(), Type::Pointer(_))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.unaliased(), Type::Pointer(p) if p.nil)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.unaliased(), Type::Array(_))
    }

    pub fn is_dynamic_array(&self) -> bool {
        matches!(self.unaliased(), Type::Array(a) if a.kind == ArrayKind::Dynamic)
    }

    pub fn is_set(&self) -> bool {
        matches!(self.unaliased(), Type::Set(_))
    }

    pub fn is_procedural(&self) -> bool {
        matches!(self.unaliased(), Type::Procedural(_))
    }

    pub fn is_class_reference(&self) -> bool {
        matches!(self.unaliased(), Type::ClassReference(_))
    }

    pub fn is_variant(&self) -> bool {
        matches!(self.unaliased(), Type::Variant(_))
    }

    pub fn as_integer(&self) -> Option<IntegerType> {
        match self.unaliased() {
            Type::Integer(integer) => Some(*integer),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self.unaliased() {
            Type::Struct(struct_type) => Some(struct_type),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&PointerType> {
        match self.unaliased() {
            Type::Pointer(pointer) => Some(pointer),
            _ => None,
        }
    }

    pub fn as_procedural(&self) -> Option<&ProceduralType> {
        match self.unaliased() {
            Type::Procedural(procedural) => Some(procedural),
            _ => None,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (index, ty) in types.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => f.write_str("<unknown>"),
            Type::Untyped => f.write_str("<untyped>"),
            Type::Void => f.write_str("<void>"),
            Type::Integer(integer) => write!(f, "{integer}"),
            Type::Decimal(decimal) => write!(f, "{:?}", decimal.kind),
            Type::Boolean(kind) => write!(f, "{kind:?}"),
            Type::Text(kind) => write!(f, "{kind:?}"),
            Type::Struct(struct_type) => f.write_str(&struct_type.image),
            Type::Enum(enum_type) => f.write_str(&enum_type.image),
            Type::Pointer(pointer) if pointer.nil => f.write_str("nil"),
            Type::Pointer(pointer) if pointer.is_untyped() => f.write_str("Pointer"),
            Type::Pointer(pointer) => write!(f, "^{}", pointer.dereferenced),
            Type::Array(array) => match array.kind {
                ArrayKind::Fixed => write!(f, "array[] of {}", array.element),
                ArrayKind::Dynamic => write!(f, "array of {}", array.element),
                ArrayKind::Open => write!(f, "open array of {}", array.element),
                ArrayKind::OpenOfConst => f.write_str("array of const"),
            },
            Type::Set(element) => write!(f, "set of {element}"),
            Type::Procedural(procedural) => {
                let prefix = match procedural.kind {
                    ProceduralKind::Reference => "reference to ",
                    ProceduralKind::Anonymous => "anonymous ",
                    _ => "",
                };
                let keyword = if procedural.return_type.is_void() {
                    "procedure"
                } else {
                    "function"
                };
                write!(f, "{prefix}{keyword}(")?;
                write_list(f, &procedural.parameters)?;
                f.write_str(")")?;
                if !procedural.return_type.is_void() {
                    write!(f, ": {}", procedural.return_type)?;
                }
                match procedural.kind {
                    ProceduralKind::ProcedureOfObject => f.write_str(" of object"),
                    ProceduralKind::Method => f.write_str(" method"),
                    _ => Ok(()),
                }
            }
            Type::ClassReference(class) => write!(f, "class of {class}"),
            Type::Variant(VariantKind::Normal) => f.write_str("Variant"),
            Type::Variant(VariantKind::Ole) => f.write_str("OleVariant"),
            Type::TypeType(alias) => f.write_str(&alias.image),
            Type::ArrayConstructor(elements) => {
                f.write_str("[")?;
                write_list(f, elements)?;
                f.write_str("]")
            }
            Type::Matcher(ArgumentMatcher::AnyOrdinal) => f.write_str("<any ordinal>"),
            Type::Matcher(ArgumentMatcher::AnySet) => f.write_str("<any set>"),
            Type::Matcher(ArgumentMatcher::PointerMathOperand) => {
                f.write_str("<pointer math operand>")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_identity_is_structural() {
        assert_eq!(Type::pointer_to(Type::INTEGER, false), Type::pointer_to(Type::INTEGER, false));
        assert_ne!(Type::pointer_to(Type::INTEGER, false), Type::pointer_to(Type::INTEGER, true));
        assert_eq!(Type::set_of(Type::CHAR), Type::set_of(Type::CHAR));
    }

    #[test]
    fn unknown_only_equals_itself() {
        assert_eq!(Type::Unknown, Type::Unknown);
        assert_ne!(Type::Unknown, Type::Untyped);
        assert_ne!(Type::Unknown, Type::INTEGER);
    }

    #[test]
    fn distinct_types_expose_their_original() {
        let alias = Type::type_type("TAge", Type::INTEGER);

        assert_ne!(alias, Type::INTEGER);
        assert_eq!(alias.unaliased(), &Type::INTEGER);
        assert!(alias.is_integer());
        assert!(alias.is_ordinal());
    }

    #[test]
    fn matchers_accept_their_category() {
        assert!(ArgumentMatcher::AnyOrdinal.matches(&Type::BYTE));
        assert!(ArgumentMatcher::AnyOrdinal.matches(&Type::CHAR));
        assert!(!ArgumentMatcher::AnyOrdinal.matches(&Type::STRING));
        assert!(ArgumentMatcher::AnySet.matches(&Type::set_of(Type::BYTE)));
        assert!(ArgumentMatcher::PointerMathOperand.matches(&Type::pointer_to(Type::CHAR, true)));
        assert!(!ArgumentMatcher::PointerMathOperand.matches(&Type::untyped_pointer()));
    }

    #[test]
    fn display_renders_pascal_images() {
        let callback = Type::procedural(
            ProceduralKind::ProcedureOfObject,
            vec![Type::INTEGER],
            Type::Void,
        );

        assert_eq!(Type::INTEGER.to_string(), "Integer");
        assert_eq!(Type::nil().to_string(), "nil");
        assert_eq!(Type::pointer_to(Type::CHAR, true).to_string(), "^WideChar");
        assert_eq!(Type::array(ArrayKind::Dynamic, Type::BYTE).to_string(), "array of Byte");
        assert_eq!(callback.to_string(), "procedure(Integer) of object");
    }
}
