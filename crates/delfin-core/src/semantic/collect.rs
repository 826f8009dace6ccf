//! First pass: populate the scope tree of one unit
//!
//! Declares every named entity of the unit and resolves the types written in
//! declarations. Expressions are left to the resolution pass, except for the
//! initializers of untyped constants whose type is their value's.
//!
//! Each type section is processed in three steps so that declarations may
//! refer to structs and enums declared further down the same section:
//! struct and enum identities first, then the remaining type declarations
//! in order, then struct heritage and members.

use std::collections::HashSet;

use tracing::{debug, trace};

use super::annotations::Annotations;
use super::issue::{IssueKind, SemanticIssue};
use super::resolve::Resolver;
use super::session::Session;
use super::system::routine_type;
use crate::error::AnalysisError;
use crate::symbol::{
    DeclId, DeclarationKind, DeclarationSpec, RoutineKind, RoutineSignature, ScopeId, ScopeKind,
    Section,
};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};
use crate::types::{ArrayKind, StructKind, StructType, Type};

type CollectResult<T = ()> = Result<T, AnalysisError>;

pub(crate) struct DeclarationCollector<'a> {
    session: &'a mut Session,
    tree: &'a SyntaxTree,
    annotations: &'a mut Annotations,
    file: ScopeId,
    section: Section,
    /// Declarations that already have a body in this unit.
    implemented: HashSet<DeclId>,
    /// Throwaway annotations for typing constant initializers.
    scratch: Option<Annotations>,
}

impl<'a> DeclarationCollector<'a> {
    pub(crate) fn new(
        session: &'a mut Session,
        tree: &'a SyntaxTree,
        annotations: &'a mut Annotations,
        file: ScopeId,
    ) -> Self {
        Self {
            session,
            tree,
            annotations,
            file,
            section: Section::Interface,
            implemented: HashSet::new(),
            scratch: None,
        }
    }

    pub(crate) fn collect_unit(&mut self, unit: NodeId) -> CollectResult {
        let tree = self.tree;
        self.annotations.set_scope(unit, self.file);

        for &child in tree.children(unit) {
            match tree.kind(child) {
                NodeKind::InterfaceSection => {
                    self.section = Section::Interface;
                    self.section_items(child, self.file)?;
                }
                NodeKind::ImplementationSection => {
                    self.section = Section::Implementation;
                    self.section_items(child, self.file)?;
                }
                _ => self.item(child, self.file)?,
            }
        }
        Ok(())
    }

    /// Re-attempts uses-clause entries that named a unit the session did not
    /// know yet. Returns how many were resolved.
    pub(crate) fn retry_imports(&mut self) -> CollectResult<usize> {
        let tree = self.tree;
        let pending: Vec<(NodeId, String)> = self
            .annotations
            .issues()
            .iter()
            .filter(|issue| issue.is_unresolved())
            .filter_map(|issue| match tree.kind(issue.node) {
                NodeKind::UnitReference { name } => Some((issue.node, name.clone())),
                _ => None,
            })
            .collect();

        let mut resolved = 0;
        for (reference, name) in pending {
            if self.session.unit_scope(&name).is_none() {
                continue;
            }
            self.section = self.section_of(reference);
            self.import(reference, &name)?;
            self.annotations.retain_issues(|issue| issue.node != reference);
            resolved += 1;
        }
        Ok(resolved)
    }

    fn section_of(&self, node: NodeId) -> Section {
        let in_implementation = self
            .tree
            .ancestors(node)
            .any(|id| matches!(self.tree.kind(id), NodeKind::ImplementationSection));
        if in_implementation {
            Section::Implementation
        } else {
            Section::Interface
        }
    }

    fn section_items(&mut self, section: NodeId, scope: ScopeId) -> CollectResult {
        let tree = self.tree;
        for &child in tree.children(section) {
            self.item(child, scope)?;
        }
        Ok(())
    }

    fn item(&mut self, node: NodeId, scope: ScopeId) -> CollectResult {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::UsesClause => self.uses_clause(node),
            NodeKind::TypeSection => self.type_section(node, scope),
            NodeKind::VarSection => self.var_section(node, scope, DeclarationKind::Variable),
            NodeKind::ConstSection => self.const_section(node, scope),
            NodeKind::RoutineDeclaration { .. } => {
                self.routine_declaration(node, scope, None).map(drop)
            }
            NodeKind::RoutineImplementation { .. } => self.routine_implementation(node, scope),
            _ => Ok(()),
        }
    }

    fn declare(&mut self, scope: ScopeId, spec: DeclarationSpec) -> CollectResult<DeclId> {
        let session = &mut *self.session;
        session
            .symbols
            .declare(&session.scopes, scope, spec.section(self.section))
    }

    fn issue(&mut self, node: NodeId, kind: IssueKind) {
        trace!(issue = ?kind, "Degraded declaration");
        let position = self.tree.position(node);
        self.annotations
            .push_issue(SemanticIssue::new(node, position, kind));
    }

    fn uses_clause(&mut self, node: NodeId) -> CollectResult {
        let tree = self.tree;
        for &reference in tree.children(node) {
            let NodeKind::UnitReference { name } = tree.kind(reference) else {
                return Err(tree.unexpected(reference, "unit_reference").into());
            };
            if self.session.unit_scope(name).is_some() {
                self.import(reference, name)?;
            } else {
                debug!(unit = %name, "Used unit is not part of the session");
                self.issue(
                    reference,
                    IssueKind::UnresolvedReference { name: name.clone() },
                );
            }
        }
        Ok(())
    }

    fn import(&mut self, reference: NodeId, name: &str) -> CollectResult {
        let Some(unit) = self.session.unit_scope(name) else {
            return Ok(());
        };
        self.session.scopes.add_import(self.file, unit);
        let id = self.declare(
            self.file,
            DeclarationSpec::new(name, DeclarationKind::UnitImport, Type::Unknown)
                .node(reference)
                .unit_scope(unit),
        )?;
        self.annotations.set_declaration(reference, id);
        Ok(())
    }

    fn type_section(&mut self, node: NodeId, scope: ScopeId) -> CollectResult {
        let tree = self.tree;
        let mut structs = Vec::new();
        let mut others = Vec::new();

        for &declaration in tree.children(node) {
            let NodeKind::TypeDeclaration { name } = tree.kind(declaration) else {
                return Err(tree.unexpected(declaration, "type_declaration").into());
            };
            let type_node = tree.child(declaration, 0)?;
            match tree.kind(type_node) {
                NodeKind::StructType { struct_kind } => {
                    let struct_type =
                        self.struct_identity(scope, name, *struct_kind, declaration, false)?;
                    self.annotations
                        .set_type(type_node, Type::Struct(struct_type.clone()));
                    structs.push((type_node, struct_type));
                }
                NodeKind::ForwardStructType { struct_kind } => {
                    let struct_type =
                        self.struct_identity(scope, name, *struct_kind, declaration, true)?;
                    self.annotations.set_type(type_node, Type::Struct(struct_type));
                }
                NodeKind::EnumType => {
                    let ty = self.enumeration(scope, name, type_node)?;
                    let id = self.declare(
                        scope,
                        DeclarationSpec::new(name, DeclarationKind::Type, ty).node(declaration),
                    )?;
                    self.annotations.set_declaration(declaration, id);
                }
                _ => others.push((declaration, name, type_node)),
            }
        }

        for (declaration, name, type_node) in others {
            let resolved = self.resolve_type(type_node, scope)?;
            let ty = match tree.kind(type_node) {
                NodeKind::TypeType => Type::type_type(name, resolved),
                _ => resolved,
            };
            let id = self.declare(
                scope,
                DeclarationSpec::new(name, DeclarationKind::Type, ty).node(declaration),
            )?;
            self.annotations.set_declaration(declaration, id);
        }

        for (type_node, struct_type) in structs {
            self.struct_body(type_node, &struct_type)?;
        }
        Ok(())
    }

    /// Allocates the struct declared as `name`, or reuses the placeholder of
    /// an earlier forward declaration in the same scope.
    fn struct_identity(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: StructKind,
        declaration: NodeId,
        forward: bool,
    ) -> CollectResult<StructType> {
        let session = &*self.session;
        let placeholder = session
            .symbols
            .shallow_find(scope, name)
            .iter()
            .find_map(|&id| {
                let existing = session.symbols.get(id);
                match &existing.ty {
                    Type::Struct(struct_type)
                        if existing.is_type() && session.types.struct_data(struct_type).forward =>
                    {
                        Some((id, struct_type.clone()))
                    }
                    _ => None,
                }
            });
        if let Some((id, struct_type)) = placeholder {
            trace!(name, "Completing forward declaration");
            self.annotations.set_declaration(declaration, id);
            return Ok(struct_type);
        }

        let members = self
            .session
            .scopes
            .create_scope(ScopeKind::Type, Some(scope), name);
        let struct_type = if forward {
            self.session.types.declare_forward_struct(name, kind, members)
        } else {
            self.session.types.declare_struct(name, kind, members)
        };
        self.session.scopes.get_mut(members).declaring_type = Some(struct_type.clone());

        let id = self.declare(
            scope,
            DeclarationSpec::new(name, DeclarationKind::Type, Type::Struct(struct_type.clone()))
                .node(declaration),
        )?;
        self.annotations.set_declaration(declaration, id);
        Ok(struct_type)
    }

    fn struct_body(&mut self, type_node: NodeId, struct_type: &StructType) -> CollectResult {
        let tree = self.tree;
        let scope = self.session.types.struct_scope(struct_type);
        let enclosing = self.session.scopes.get(scope).parent.unwrap_or(scope);
        self.annotations.set_scope(type_node, scope);

        let mut parents = Vec::new();
        let mut helper_for = None;
        for &child in tree.children(type_node) {
            match tree.kind(child) {
                NodeKind::AncestorList => {
                    for &ancestor in tree.children(child) {
                        parents.push(self.resolve_type(ancestor, enclosing)?);
                    }
                }
                NodeKind::HelperTarget => {
                    let target = tree.child(child, 0)?;
                    helper_for = Some(self.resolve_type(target, enclosing)?);
                }
                _ => {}
            }
        }
        if parents.is_empty() {
            parents.extend(self.implicit_parent(struct_type));
        }

        self.session
            .types
            .complete_struct(struct_type, parents, helper_for.clone());
        if let Some(target) = helper_for {
            debug!(helper = %struct_type.image, target = %target, "Registering helper");
            self.session
                .scopes
                .register_helper(enclosing, target, struct_type.clone());
        }

        for &child in tree.children(type_node) {
            match tree.kind(child) {
                NodeKind::FieldDeclaration { names } => {
                    let ty = self.resolve_type(tree.child(child, 0)?, scope)?;
                    for name in names {
                        let id = self.declare(
                            scope,
                            DeclarationSpec::new(name, DeclarationKind::Field, ty.clone())
                                .node(child),
                        )?;
                        self.annotations.set_declaration(child, id);
                    }
                }
                NodeKind::PropertyDeclaration { name } => {
                    let ty = match tree.optional_child(child, 0) {
                        Some(type_node) => self.resolve_type(type_node, scope)?,
                        None => self.inherited_property_type(struct_type, name),
                    };
                    let id = self.declare(
                        scope,
                        DeclarationSpec::new(name, DeclarationKind::Property, ty).node(child),
                    )?;
                    self.annotations.set_declaration(child, id);
                }
                NodeKind::RoutineDeclaration { .. } => {
                    self.routine_declaration(child, scope, Some(struct_type))?;
                }
                NodeKind::TypeSection => self.type_section(child, scope)?,
                NodeKind::VarSection => self.var_section(child, scope, DeclarationKind::Field)?,
                NodeKind::ConstSection => self.const_section(child, scope)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn implicit_parent(&self, struct_type: &StructType) -> Option<Type> {
        let system = &self.session.system;
        let root = match struct_type.kind {
            StructKind::Class => &system.object,
            StructKind::Interface => &system.interface,
            _ => return None,
        };
        (root != struct_type).then(|| Type::Struct(root.clone()))
    }

    /// `property Name;` republishes an inherited property with its type.
    fn inherited_property_type(&self, struct_type: &StructType, name: &str) -> Type {
        let lookup = self.session.lookup();
        lookup
            .find_in_struct(struct_type, name)
            .into_iter()
            .map(|id| self.session.symbols.get(id))
            .find(|declaration| declaration.kind == DeclarationKind::Property)
            .map_or(Type::Unknown, |declaration| declaration.ty.clone())
    }

    /// Declares the enum's scope and elements. Elements are visible both in
    /// `scope` and as members of the enum type.
    fn enumeration(&mut self, scope: ScopeId, name: &str, type_node: NodeId) -> CollectResult<Type> {
        let tree = self.tree;
        let elements = self
            .session
            .scopes
            .create_scope(ScopeKind::Enum, Some(scope), name);
        let enum_type = self.session.types.declare_enum(name, elements, None);
        let ty = Type::Enum(enum_type.clone());
        self.annotations.set_type(type_node, ty.clone());
        self.annotations.set_scope(type_node, elements);

        for &element in tree.children(type_node) {
            let NodeKind::EnumElement { name: element_name } = tree.kind(element) else {
                return Err(tree.unexpected(element, "enum_element").into());
            };
            self.session.types.add_enum_element(&enum_type, element_name);
            for target in [scope, elements] {
                let id = self.declare(
                    target,
                    DeclarationSpec::new(element_name, DeclarationKind::EnumElement, ty.clone())
                        .node(element),
                )?;
                self.annotations.set_declaration(element, id);
            }
        }
        Ok(ty)
    }

    fn var_section(&mut self, node: NodeId, scope: ScopeId, kind: DeclarationKind) -> CollectResult {
        let tree = self.tree;
        for &declaration in tree.children(node) {
            let NodeKind::VarDeclaration { names } = tree.kind(declaration) else {
                return Err(tree.unexpected(declaration, "var_declaration").into());
            };
            let ty = self.resolve_type(tree.child(declaration, 0)?, scope)?;
            for name in names {
                let id = self.declare(
                    scope,
                    DeclarationSpec::new(name, kind, ty.clone()).node(declaration),
                )?;
                self.annotations.set_declaration(declaration, id);
            }
        }
        Ok(())
    }

    fn const_section(&mut self, node: NodeId, scope: ScopeId) -> CollectResult {
        let tree = self.tree;
        for &declaration in tree.children(node) {
            let NodeKind::ConstDeclaration { name, typed } = tree.kind(declaration) else {
                return Err(tree.unexpected(declaration, "const_declaration").into());
            };
            let first = tree.child(declaration, 0)?;
            let ty = if *typed {
                self.resolve_type(first, scope)?
            } else {
                self.constant_type(first, scope)?
            };
            let id = self.declare(
                scope,
                DeclarationSpec::new(name, DeclarationKind::Constant, ty).node(declaration),
            )?;
            self.annotations.set_declaration(declaration, id);
        }
        Ok(())
    }

    fn constant_type(&mut self, expression: NodeId, scope: ScopeId) -> CollectResult<Type> {
        let tree = self.tree;
        let scratch = self
            .scratch
            .get_or_insert_with(|| Annotations::new(tree.len()));
        let mut resolver = Resolver::new(&*self.session, tree, scratch);
        let ty = resolver.type_of(expression, scope);
        resolver.finish()?;
        Ok(ty)
    }

    fn routine_declaration(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        declaring: Option<&StructType>,
    ) -> CollectResult<DeclId> {
        let tree = self.tree;
        let NodeKind::RoutineDeclaration { name, routine_kind } = tree.kind(node) else {
            return Err(tree.unexpected(node, "routine_declaration").into());
        };
        let signature = self.signature(node, scope, *routine_kind, declaring)?;
        let id = self.declare(
            scope,
            DeclarationSpec::new(name, DeclarationKind::Routine, routine_type(&signature))
                .node(node)
                .routine(signature),
        )?;
        self.annotations.set_declaration(node, id);
        Ok(id)
    }

    fn signature(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        kind: RoutineKind,
        declaring: Option<&StructType>,
    ) -> CollectResult<RoutineSignature> {
        let tree = self.tree;
        let mut parameters = Vec::new();
        let mut required = 0;
        let mut return_type = Type::Void;

        for &child in tree.children(node) {
            match tree.kind(child) {
                NodeKind::Parameter { names, has_default } => {
                    let ty = match tree.optional_child(child, 0) {
                        Some(type_node) => self.resolve_type(type_node, scope)?,
                        None => Type::Untyped,
                    };
                    for _ in names {
                        parameters.push(ty.clone());
                        if !has_default {
                            required = parameters.len();
                        }
                    }
                }
                NodeKind::ReturnType => {
                    return_type = self.resolve_type(tree.child(child, 0)?, scope)?;
                }
                _ => {}
            }
        }
        if kind == RoutineKind::Constructor {
            if let Some(struct_type) = declaring {
                return_type = Type::Struct(struct_type.clone());
            }
        }

        Ok(RoutineSignature {
            kind,
            parameters,
            required,
            return_type,
            declaring_type: declaring.cloned(),
        })
    }

    fn routine_implementation(&mut self, node: NodeId, scope: ScopeId) -> CollectResult {
        let tree = self.tree;
        let NodeKind::RoutineImplementation { name, routine_kind } = tree.kind(node) else {
            return Err(tree.unexpected(node, "routine_implementation").into());
        };
        let (owner, simple_name) = match name.rsplit_once('.') {
            Some((owner, simple_name)) => (Some(owner), simple_name),
            None => (None, name.as_str()),
        };

        let declaring = match owner {
            Some(owner) => match self.owner_struct(scope, owner) {
                Some(struct_type) => Some(struct_type),
                None => {
                    self.issue(
                        node,
                        IssueKind::UnresolvedReference {
                            name: owner.to_string(),
                        },
                    );
                    None
                }
            },
            None => None,
        };
        let declaring_scope = declaring
            .as_ref()
            .map_or(scope, |struct_type| self.session.types.struct_scope(struct_type));
        let own_signature =
            self.signature(node, declaring_scope, *routine_kind, declaring.as_ref())?;

        let linked = self.linked_declaration(declaring_scope, simple_name, &own_signature);
        let declaration = match (linked, owner) {
            (Some(id), _) => Some(id),
            (None, Some(_)) => {
                if declaring.is_some() {
                    self.issue(
                        node,
                        IssueKind::UnresolvedReference { name: name.clone() },
                    );
                }
                None
            }
            (None, None) => Some(self.declare(
                scope,
                DeclarationSpec::new(
                    simple_name,
                    DeclarationKind::Routine,
                    routine_type(&own_signature),
                )
                .node(node)
                .routine(own_signature.clone()),
            )?),
        };
        let signature = declaration
            .and_then(|id| self.session.symbols.get(id).routine.clone())
            .unwrap_or(own_signature);
        if let Some(id) = declaration {
            self.implemented.insert(id);
            self.annotations.set_declaration(node, id);
        }

        let body_scope = self
            .session
            .scopes
            .create_scope(ScopeKind::Routine, Some(scope), simple_name);
        self.session.scopes.get_mut(body_scope).declaring_type = declaring.clone();
        self.annotations.set_scope(node, body_scope);
        trace!(routine = %name, "Collecting routine body");

        self.declare_parameters(node, body_scope)?;
        if let Some(struct_type) = &declaring {
            self.declare(
                body_scope,
                DeclarationSpec::new("Self", DeclarationKind::Variable, Type::Struct(struct_type.clone())),
            )?;
        }
        if matches!(signature.kind, RoutineKind::Function | RoutineKind::Operator)
            && !signature.return_type.is_void()
        {
            self.declare(
                body_scope,
                DeclarationSpec::new("Result", DeclarationKind::Variable, signature.return_type),
            )?;
        }

        for &child in tree.children(node) {
            match tree.kind(child) {
                NodeKind::VarSection
                | NodeKind::ConstSection
                | NodeKind::TypeSection
                | NodeKind::RoutineImplementation { .. } => self.item(child, body_scope)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_parameters(&mut self, node: NodeId, body_scope: ScopeId) -> CollectResult {
        let tree = self.tree;
        for &child in tree.children(node) {
            let NodeKind::Parameter { names, .. } = tree.kind(child) else {
                continue;
            };
            let ty = tree
                .optional_child(child, 0)
                .and_then(|type_node| self.annotations.cached_type(type_node).cloned())
                .unwrap_or(Type::Untyped);
            for name in names {
                let id = self.declare(
                    body_scope,
                    DeclarationSpec::new(name, DeclarationKind::Parameter, ty.clone()).node(child),
                )?;
                self.annotations.set_declaration(child, id);
            }
        }
        Ok(())
    }

    /// Struct named by the qualifier of a method implementation, possibly a
    /// nested type path such as `TOuter.TInner`.
    fn owner_struct(&self, scope: ScopeId, owner: &str) -> Option<StructType> {
        let lookup = self.session.lookup();
        let mut segments = owner.split('.');
        let first = segments.next()?;
        let mut current = self.struct_named(lookup.find(scope, first))?;
        for segment in segments {
            current = self.struct_named(lookup.find_in_struct(&current, segment))?;
        }
        Some(current)
    }

    fn struct_named(&self, candidates: Vec<DeclId>) -> Option<StructType> {
        candidates.into_iter().find_map(|id| {
            let declaration = self.session.symbols.get(id);
            match &declaration.ty {
                Type::Struct(struct_type) if declaration.is_type() => Some(struct_type.clone()),
                _ => None,
            }
        })
    }

    /// Earlier declaration an implementation completes: same name and the
    /// same parameter types, or the only overload when the implementation
    /// omits its parameter list.
    fn linked_declaration(
        &self,
        scope: ScopeId,
        name: &str,
        signature: &RoutineSignature,
    ) -> Option<DeclId> {
        let candidates: Vec<DeclId> = self
            .session
            .symbols
            .shallow_find(scope, name)
            .iter()
            .copied()
            .filter(|&id| {
                self.session.symbols.get(id).is_routine() && !self.implemented.contains(&id)
            })
            .collect();

        candidates
            .iter()
            .copied()
            .find(|&id| {
                self.session
                    .symbols
                    .get(id)
                    .routine
                    .as_ref()
                    .is_some_and(|routine| routine.parameters == signature.parameters)
            })
            .or_else(|| match candidates.as_slice() {
                [only] if signature.parameters.is_empty() => Some(*only),
                _ => None,
            })
    }

    /// Resolves a type node written in a declaration and records it on the
    /// node.
    fn resolve_type(&mut self, node: NodeId, scope: ScopeId) -> CollectResult<Type> {
        let tree = self.tree;
        let ty = match tree.kind(node) {
            NodeKind::TypeReference { name } => self.named_type(node, scope, name),
            NodeKind::PointerType { pointer_math } => {
                let target = self.resolve_type(tree.child(node, 0)?, scope)?;
                Type::pointer_to(target, *pointer_math)
            }
            NodeKind::ArrayType { array_kind } => match tree.optional_child(node, 0) {
                Some(element) => Type::array(*array_kind, self.resolve_type(element, scope)?),
                None => Type::array(ArrayKind::OpenOfConst, Type::Untyped),
            },
            NodeKind::SetType => Type::set_of(self.resolve_type(tree.child(node, 0)?, scope)?),
            NodeKind::ProceduralType { procedural_kind } => {
                let signature = self.signature(node, scope, RoutineKind::Function, None)?;
                Type::procedural(*procedural_kind, signature.parameters, signature.return_type)
            }
            NodeKind::ClassReferenceType => {
                Type::class_reference(self.resolve_type(tree.child(node, 0)?, scope)?)
            }
            NodeKind::TypeType => self.resolve_type(tree.child(node, 0)?, scope)?,
            NodeKind::EnumType => self.enumeration(scope, "", node)?,
            NodeKind::StructType { struct_kind } => {
                let members = self
                    .session
                    .scopes
                    .create_scope(ScopeKind::Type, Some(scope), "");
                let struct_type = self.session.types.declare_struct("", *struct_kind, members);
                self.session.scopes.get_mut(members).declaring_type = Some(struct_type.clone());
                self.struct_body(node, &struct_type)?;
                Type::Struct(struct_type)
            }
            NodeKind::ForwardStructType { .. } => {
                self.issue(
                    node,
                    IssueKind::MalformedType {
                        message: "Forward declaration outside a type section".to_string(),
                    },
                );
                Type::Unknown
            }
            _ => return Err(tree.unexpected(node, "type node").into()),
        };
        self.annotations.set_type(node, ty.clone());
        Ok(ty)
    }

    /// Type named by a possibly qualified reference: `TFoo`, `Unit.TFoo` or
    /// `TOuter.TInner`.
    fn named_type(&mut self, node: NodeId, scope: ScopeId, name: &str) -> Type {
        let lookup = self.session.lookup();
        let mut found = self.type_named(lookup.find(scope, name));

        if found.is_none() {
            if let Some((qualifier, member)) = name.rsplit_once('.') {
                let qualified = lookup.find(scope, qualifier);
                let unit = qualified
                    .iter()
                    .find_map(|&id| self.session.symbols.get(id).unit_scope);
                found = match unit {
                    Some(unit) => self.type_named(lookup.find_in_unit(scope, unit, member)),
                    None => self
                        .type_named(qualified)
                        .as_ref()
                        .and_then(Type::as_struct)
                        .and_then(|owner| self.type_named(lookup.find_in_struct(owner, member))),
                };
            }
        }

        match found {
            Some(ty) => ty,
            None => {
                debug!(name, "Unresolved type name");
                self.issue(
                    node,
                    IssueKind::UnresolvedReference {
                        name: name.to_string(),
                    },
                );
                Type::Unknown
            }
        }
    }

    fn type_named(&self, candidates: Vec<DeclId>) -> Option<Type> {
        candidates.into_iter().find_map(|id| {
            let declaration = self.session.symbols.get(id);
            declaration.is_type().then(|| declaration.ty.clone())
        })
    }
}
