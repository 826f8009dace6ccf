//! Session-wide owner of struct and enum identities
//!
//! Primitive types are free-standing values. Structs and enums are allocated
//! here so that every reference to them shares one identity, and so that a
//! forward declaration can be completed in place.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use id_arena::Arena;

use super::integer::IntegerType;
use super::intrinsic::IntrinsicType;
use super::model::{
    ArrayKind, BooleanKind, DecimalKind, DecimalType, EnumType, ProceduralKind, StructKind,
    StructType, TextKind, Type, VariantKind,
};
use crate::config::TargetConfig;
use crate::symbol::ScopeId;

#[derive(Debug)]
pub struct StructData {
    pub image: Arc<str>,
    pub kind: StructKind,
    /// Members live here; completion of a forward declaration keeps it.
    pub scope: ScopeId,
    pub parents: Vec<Type>,
    pub helper_for: Option<Type>,
    pub forward: bool,
}

#[derive(Debug)]
pub struct EnumData {
    pub image: Arc<str>,
    pub scope: ScopeId,
    pub base_type: Option<Type>,
    pub elements: Vec<Arc<str>>,
}

pub struct TypeFactory {
    target: TargetConfig,
    structs: Arena<StructData>,
    enums: Arena<EnumData>,
}

impl Default for TypeFactory {
    fn default() -> Self {
        Self::new(TargetConfig::default())
    }
}

impl TypeFactory {
    pub fn new(target: TargetConfig) -> Self {
        Self {
            target,
            structs: Arena::new(),
            enums: Arena::new(),
        }
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn intrinsic(&self, intrinsic: IntrinsicType) -> Type {
        let pointer_size = self.target.pointer_size;
        match intrinsic {
            IntrinsicType::ShortInt => Type::SHORT_INT,
            IntrinsicType::SmallInt => Type::SMALL_INT,
            IntrinsicType::Integer | IntrinsicType::LongInt => Type::INTEGER,
            IntrinsicType::Int64 => Type::INT64,
            IntrinsicType::Byte => Type::BYTE,
            IntrinsicType::Word => Type::WORD,
            IntrinsicType::Cardinal | IntrinsicType::LongWord => Type::CARDINAL,
            IntrinsicType::UInt64 => Type::UINT64,
            IntrinsicType::NativeInt => Type::Integer(IntegerType::new(pointer_size, true)),
            IntrinsicType::NativeUInt => Type::Integer(IntegerType::new(pointer_size, false)),
            IntrinsicType::Single => decimal(DecimalKind::Single, 4),
            IntrinsicType::Double | IntrinsicType::Real => decimal(DecimalKind::Double, 8),
            IntrinsicType::Extended => self.extended(),
            IntrinsicType::Real48 => decimal(DecimalKind::Real48, 6),
            IntrinsicType::Comp => decimal(DecimalKind::Comp, 8),
            IntrinsicType::Currency => decimal(DecimalKind::Currency, 8),
            IntrinsicType::Boolean => Type::Boolean(BooleanKind::Boolean),
            IntrinsicType::ByteBool => Type::Boolean(BooleanKind::ByteBool),
            IntrinsicType::WordBool => Type::Boolean(BooleanKind::WordBool),
            IntrinsicType::LongBool => Type::Boolean(BooleanKind::LongBool),
            IntrinsicType::AnsiChar => Type::Text(TextKind::AnsiChar),
            IntrinsicType::WideChar | IntrinsicType::Char => Type::Text(TextKind::WideChar),
            IntrinsicType::ShortString => Type::Text(TextKind::ShortString),
            IntrinsicType::AnsiString => Type::Text(TextKind::AnsiString),
            IntrinsicType::UnicodeString | IntrinsicType::String => {
                Type::Text(TextKind::UnicodeString)
            }
            IntrinsicType::WideString => Type::Text(TextKind::WideString),
            IntrinsicType::Variant => Type::Variant(VariantKind::Normal),
            IntrinsicType::OleVariant => Type::Variant(VariantKind::Ole),
            IntrinsicType::Pointer => Type::untyped_pointer(),
            IntrinsicType::PChar | IntrinsicType::PWideChar => {
                Type::pointer_to(Type::Text(TextKind::WideChar), true)
            }
            IntrinsicType::PAnsiChar => Type::pointer_to(Type::Text(TextKind::AnsiChar), true),
            IntrinsicType::PByte => Type::pointer_to(Type::BYTE, true),
        }
    }

    pub fn extended(&self) -> Type {
        decimal(DecimalKind::Extended, self.target.extended_size)
    }

    pub fn size_of(&self, ty: &Type) -> Option<u32> {
        let pointer = u32::from(self.target.pointer_size);
        match ty {
            Type::Integer(integer) => Some(u32::from(integer.size)),
            Type::Decimal(decimal) => Some(u32::from(decimal.size)),
            Type::Boolean(kind) => Some(u32::from(kind.size())),
            Type::Text(TextKind::AnsiChar) => Some(1),
            Type::Text(TextKind::WideChar) => Some(2),
            Type::Text(TextKind::ShortString) => Some(256),
            Type::Text(_) => Some(pointer),
            Type::Struct(struct_type) => match struct_type.kind {
                StructKind::Class | StructKind::Interface => Some(pointer),
                _ => None,
            },
            Type::Enum(enum_type) => match &self.enum_data(enum_type).base_type {
                Some(base) => self.size_of(base),
                None => Some(1),
            },
            Type::Pointer(_) | Type::ClassReference(_) => Some(pointer),
            Type::Procedural(procedural) => match procedural.kind {
                ProceduralKind::ProcedureOfObject | ProceduralKind::Method => Some(pointer * 2),
                _ => Some(pointer),
            },
            Type::Array(array) if array.kind == ArrayKind::Dynamic => Some(pointer),
            Type::Variant(_) => Some(if pointer == 8 { 24 } else { 16 }),
            Type::TypeType(alias) => self.size_of(&alias.original),
            _ => None,
        }
    }

    /// Widest element of an array constructor, or void when it is empty.
    pub fn normalize_array_constructor(&self, elements: &[Type]) -> Type {
        let mut widest: Option<(&Type, u32)> = None;
        for element in elements {
            let size = self.size_of(element).unwrap_or(0);
            if widest.is_none_or(|(_, best)| size > best) {
                widest = Some((element, size));
            }
        }
        widest.map_or(Type::Void, |(element, _)| element.clone())
    }

    pub fn declare_struct(&mut self, image: &str, kind: StructKind, scope: ScopeId) -> StructType {
        self.alloc_struct(image, kind, scope, false)
    }

    pub fn declare_forward_struct(
        &mut self,
        image: &str,
        kind: StructKind,
        scope: ScopeId,
    ) -> StructType {
        self.alloc_struct(image, kind, scope, true)
    }

    fn alloc_struct(
        &mut self,
        image: &str,
        kind: StructKind,
        scope: ScopeId,
        forward: bool,
    ) -> StructType {
        let image: Arc<str> = Arc::from(image);
        let id = self.structs.alloc(StructData {
            image: Arc::clone(&image),
            kind,
            scope,
            parents: Vec::new(),
            helper_for: None,
            forward,
        });
        StructType { id, kind, image }
    }

    /// Fills in the heritage of a struct. A forward placeholder becomes the
    /// full type without changing identity.
    pub fn complete_struct(
        &mut self,
        struct_type: &StructType,
        parents: Vec<Type>,
        helper_for: Option<Type>,
    ) {
        let data = &mut self.structs[struct_type.id];
        data.parents = parents;
        data.helper_for = helper_for;
        data.forward = false;
    }

    pub fn struct_data(&self, struct_type: &StructType) -> &StructData {
        &self.structs[struct_type.id]
    }

    pub fn struct_scope(&self, struct_type: &StructType) -> ScopeId {
        self.structs[struct_type.id].scope
    }

    pub fn declare_enum(&mut self, image: &str, scope: ScopeId, base_type: Option<Type>) -> EnumType {
        let image: Arc<str> = Arc::from(image);
        let id = self.enums.alloc(EnumData {
            image: Arc::clone(&image),
            scope,
            base_type,
            elements: Vec::new(),
        });
        EnumType { id, image }
    }

    pub fn add_enum_element(&mut self, enum_type: &EnumType, element: &str) {
        self.enums[enum_type.id].elements.push(Arc::from(element));
    }

    pub fn enum_data(&self, enum_type: &EnumType) -> &EnumData {
        &self.enums[enum_type.id]
    }

    /// Breadth-first ancestors of a struct with their inheritance depth,
    /// nearest first. Unknown parents are skipped and cycles are cut.
    pub fn ancestors(&self, struct_type: &StructType) -> Vec<(StructType, u32)> {
        let mut seen = HashSet::from([struct_type.id]);
        let mut queue = VecDeque::from([(struct_type.clone(), 0)]);
        let mut result = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            for parent in &self.structs[current.id].parents {
                let Some(parent) = parent.as_struct() else {
                    continue;
                };
                if seen.insert(parent.id) {
                    result.push((parent.clone(), depth + 1));
                    queue.push_back((parent.clone(), depth + 1));
                }
            }
        }

        result
    }

    /// Number of inheritance steps from `sub` up to `sup`, zero when equal.
    pub fn inheritance_distance(&self, sub: &StructType, sup: &StructType) -> Option<u32> {
        if sub == sup {
            return Some(0);
        }
        self.ancestors(sub)
            .into_iter()
            .find(|(ancestor, _)| ancestor == sup)
            .map(|(_, depth)| depth)
    }

    pub fn is_sub_type_of(&self, ty: &Type, other: &Type) -> bool {
        if ty == other {
            return true;
        }
        match (ty, other) {
            (Type::Unknown, _) | (_, Type::Unknown) => false,
            (Type::Struct(sub), Type::Struct(sup)) => self.inheritance_distance(sub, sup).is_some(),
            (Type::ClassReference(sub), Type::ClassReference(sup)) => self.is_sub_type_of(sub, sup),
            _ => false,
        }
    }
}

fn decimal(kind: DecimalKind, size: u8) -> Type {
    Type::Decimal(DecimalType { kind, size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{ScopeKind, ScopeTree};

    fn scope() -> ScopeId {
        let mut scopes = ScopeTree::new();
        scopes.create_scope(ScopeKind::System, None, "System")
    }

    #[test]
    fn native_integers_follow_target_pointer_size() {
        let x86 = TypeFactory::new(TargetConfig::default());
        let x64 = TypeFactory::new(TargetConfig {
            pointer_size: 8,
            ..TargetConfig::default()
        });

        assert_eq!(x86.intrinsic(IntrinsicType::NativeInt), Type::INTEGER);
        assert_eq!(x64.intrinsic(IntrinsicType::NativeInt), Type::INT64);
        assert_eq!(x64.size_of(&x64.intrinsic(IntrinsicType::String)), Some(8));
    }

    #[test]
    fn forward_completion_keeps_identity() {
        let mut factory = TypeFactory::default();
        let scope = scope();
        let root = factory.declare_struct("TObject", StructKind::Class, scope);
        let forward = factory.declare_forward_struct("TNode", StructKind::Class, scope);
        let earlier_reference = Type::Struct(forward.clone());

        factory.complete_struct(&forward, vec![Type::Struct(root.clone())], None);

        assert!(!factory.struct_data(&forward).forward);
        assert_eq!(earlier_reference, Type::Struct(forward.clone()));
        assert!(factory.is_sub_type_of(&earlier_reference, &Type::Struct(root)));
    }

    #[test]
    fn subtyping_is_reflexive_and_transitive() {
        let mut factory = TypeFactory::default();
        let scope = scope();
        let a = factory.declare_struct("TA", StructKind::Class, scope);
        let b = factory.declare_struct("TB", StructKind::Class, scope);
        let c = factory.declare_struct("TC", StructKind::Class, scope);
        factory.complete_struct(&b, vec![Type::Struct(a.clone())], None);
        factory.complete_struct(&c, vec![Type::Struct(b.clone())], None);
        let (a, b, c) = (Type::Struct(a), Type::Struct(b), Type::Struct(c));

        for ty in [&a, &b, &c, &Type::INTEGER, &Type::Unknown] {
            assert!(factory.is_sub_type_of(ty, ty), "{ty}");
        }
        assert!(factory.is_sub_type_of(&c, &b));
        assert!(factory.is_sub_type_of(&b, &a));
        assert!(factory.is_sub_type_of(&c, &a));
        assert!(!factory.is_sub_type_of(&a, &c));
        assert!(factory.is_sub_type_of(&Type::class_reference(c), &Type::class_reference(a)));
    }

    #[test]
    fn inheritance_cycles_terminate() {
        let mut factory = TypeFactory::default();
        let scope = scope();
        let a = factory.declare_struct("TA", StructKind::Class, scope);
        let b = factory.declare_struct("TB", StructKind::Class, scope);
        factory.complete_struct(&a, vec![Type::Struct(b.clone()), Type::Unknown], None);
        factory.complete_struct(&b, vec![Type::Struct(a.clone())], None);

        assert_eq!(factory.ancestors(&a).len(), 1);
        assert_eq!(factory.inheritance_distance(&a, &b), Some(1));
    }

    #[test]
    fn array_constructor_normalizes_to_widest_element() {
        let factory = TypeFactory::default();

        assert_eq!(
            factory.normalize_array_constructor(&[Type::BYTE, Type::INT64, Type::INTEGER]),
            Type::INT64
        );
        assert_eq!(factory.normalize_array_constructor(&[]), Type::Void);
    }
}
