//! Built-in declarations of the System scope
//!
//! Built once per session, before any unit is collected.

use crate::config::Config;
use crate::error::AnalysisError;
use crate::symbol::{
    DeclId, DeclarationKind, DeclarationSpec, RoutineKind, RoutineSignature, ScopeId, ScopeKind,
    ScopeTree, SymbolTable,
};
use crate::types::{
    ArgumentMatcher, IntrinsicType, ProceduralKind, StructKind, StructType, Type, TypeFactory,
};

pub const SYSTEM_UNIT: &str = "System";

/// The System scope and the roots implicit class and interface declarations
/// inherit from.
#[derive(Debug, Clone)]
pub(crate) struct SystemScope {
    pub scope: ScopeId,
    pub object: StructType,
    pub interface: StructType,
}

struct SystemBuilder<'a> {
    scopes: &'a mut ScopeTree,
    symbols: &'a mut SymbolTable,
    types: &'a mut TypeFactory,
    scope: ScopeId,
}

pub(crate) fn build(
    scopes: &mut ScopeTree,
    symbols: &mut SymbolTable,
    types: &mut TypeFactory,
    config: &Config,
) -> Result<SystemScope, AnalysisError> {
    let scope = scopes.create_scope(ScopeKind::System, None, SYSTEM_UNIT);
    let mut builder = SystemBuilder {
        scopes,
        symbols,
        types,
        scope,
    };

    builder.declare(
        scope,
        DeclarationSpec::new(SYSTEM_UNIT, DeclarationKind::Unit, Type::Unknown).unit_scope(scope),
    )?;

    for intrinsic in IntrinsicType::ALL {
        let ty = builder.types.intrinsic(intrinsic);
        builder.declare(
            scope,
            DeclarationSpec::new(intrinsic.image(), DeclarationKind::Type, ty),
        )?;
    }
    for (alias, intrinsic) in config.intrinsic_aliases() {
        let ty = builder.types.intrinsic(intrinsic);
        builder.declare(scope, DeclarationSpec::new(alias, DeclarationKind::Type, ty))?;
    }

    for (name, value) in [("True", Type::BOOLEAN), ("False", Type::BOOLEAN)] {
        builder.declare(scope, DeclarationSpec::new(name, DeclarationKind::Constant, value))?;
    }

    let object = builder.class("TObject", StructKind::Class)?;
    let object_type = Type::Struct(object.clone());
    builder.method(&object, "Create", RoutineKind::Constructor, vec![], object_type.clone())?;
    builder.method(&object, "Destroy", RoutineKind::Destructor, vec![], Type::Void)?;
    builder.method(&object, "Free", RoutineKind::Procedure, vec![], Type::Void)?;
    builder.method(&object, "ClassName", RoutineKind::Function, vec![], Type::STRING)?;
    builder.method(
        &object,
        "InheritsFrom",
        RoutineKind::Function,
        vec![Type::class_reference(object_type.clone())],
        Type::BOOLEAN,
    )?;
    builder.declare(
        scope,
        DeclarationSpec::new(
            "TClass",
            DeclarationKind::Type,
            Type::class_reference(object_type),
        ),
    )?;

    let interface = builder.class("IInterface", StructKind::Interface)?;
    builder.method(&interface, "_AddRef", RoutineKind::Function, vec![], Type::INTEGER)?;
    builder.method(&interface, "_Release", RoutineKind::Function, vec![], Type::INTEGER)?;

    builder.intrinsic_routines()?;

    Ok(SystemScope {
        scope,
        object,
        interface,
    })
}

impl SystemBuilder<'_> {
    fn declare(&mut self, scope: ScopeId, spec: DeclarationSpec) -> Result<DeclId, AnalysisError> {
        self.symbols.declare(self.scopes, scope, spec)
    }

    fn class(&mut self, name: &str, kind: StructKind) -> Result<StructType, AnalysisError> {
        let members = self.scopes.create_scope(ScopeKind::Type, Some(self.scope), name);
        let struct_type = self.types.declare_struct(name, kind, members);
        self.types.complete_struct(&struct_type, Vec::new(), None);
        self.scopes.get_mut(members).declaring_type = Some(struct_type.clone());
        self.declare(
            self.scope,
            DeclarationSpec::new(name, DeclarationKind::Type, Type::Struct(struct_type.clone())),
        )?;
        Ok(struct_type)
    }

    fn method(
        &mut self,
        owner: &StructType,
        name: &str,
        kind: RoutineKind,
        parameters: Vec<Type>,
        return_type: Type,
    ) -> Result<DeclId, AnalysisError> {
        let scope = self.types.struct_scope(owner);
        let signature = RoutineSignature {
            kind,
            required: parameters.len(),
            parameters,
            return_type,
            declaring_type: Some(owner.clone()),
        };
        self.routine(scope, name, signature)
    }

    fn routine(
        &mut self,
        scope: ScopeId,
        name: &str,
        signature: RoutineSignature,
    ) -> Result<DeclId, AnalysisError> {
        let ty = routine_type(&signature);
        self.declare(
            scope,
            DeclarationSpec::new(name, DeclarationKind::Routine, ty).routine(signature),
        )
    }

    fn intrinsic_routines(&mut self) -> Result<(), AnalysisError> {
        let ordinal = Type::Matcher(ArgumentMatcher::AnyOrdinal);
        let routines = [
            ("Assigned", RoutineKind::Function, vec![Type::Untyped], 1, Type::BOOLEAN),
            ("SizeOf", RoutineKind::Function, vec![Type::Untyped], 1, Type::INTEGER),
            ("Ord", RoutineKind::Function, vec![ordinal.clone()], 1, Type::INT64),
            ("Chr", RoutineKind::Function, vec![Type::BYTE], 1, Type::CHAR),
            ("Length", RoutineKind::Function, vec![Type::Untyped], 1, Type::INTEGER),
            ("Inc", RoutineKind::Procedure, vec![ordinal.clone(), Type::INT64], 1, Type::Void),
            ("Dec", RoutineKind::Procedure, vec![ordinal, Type::INT64], 1, Type::Void),
            ("Exit", RoutineKind::Procedure, vec![Type::Untyped], 0, Type::Void),
            ("FreeAndNil", RoutineKind::Procedure, vec![Type::Untyped], 1, Type::Void),
        ];

        for (name, kind, parameters, required, return_type) in routines {
            let signature = RoutineSignature {
                kind,
                parameters,
                required,
                return_type,
                declaring_type: None,
            };
            self.routine(self.scope, name, signature)?;
        }
        Ok(())
    }
}

/// Procedural type a routine reference evaluates to when it is not called.
pub(crate) fn routine_type(signature: &RoutineSignature) -> Type {
    let kind = if signature.declaring_type.is_some() {
        ProceduralKind::Method
    } else {
        ProceduralKind::Procedure
    };
    Type::procedural(
        kind,
        signature.parameters.clone(),
        signature.return_type.clone(),
    )
}
