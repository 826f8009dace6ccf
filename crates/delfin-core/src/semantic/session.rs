//! Analysis session owning the System scope and every analyzed unit
//!
//! A unit is analyzed in two phases. Collection declares its names into a
//! fresh File scope; resolution types its expressions against everything
//! collected so far. Once resolved, the unit's scopes are frozen.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument, warn};

use super::collect::DeclarationCollector;
use super::model::SemanticModel;
use super::resolve::Resolver;
use super::system::{self, SYSTEM_UNIT, SystemScope};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::operator::{Invocable, Operator, OperatorCollector, OverloadResolver};
use crate::symbol::{
    CanonicalName, DeclId, DeclarationKind, DeclarationSpec, Lookup, ScopeId, ScopeKind,
    ScopeTree, SymbolTable, canonicalize,
};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};
use crate::types::{Type, TypeFactory};

#[derive(Debug, Clone)]
struct UnitEntry {
    name: String,
    scope: ScopeId,
}

pub struct Session {
    config: Config,
    pub(crate) types: TypeFactory,
    pub(crate) scopes: ScopeTree,
    pub(crate) symbols: SymbolTable,
    pub(crate) system: SystemScope,
    units: HashMap<CanonicalName, UnitEntry>,
}

impl Session {
    pub fn new(config: &Config) -> Result<Self, AnalysisError> {
        let mut types = TypeFactory::new(config.target);
        let mut scopes = ScopeTree::new();
        let mut symbols = SymbolTable::new();
        let system = system::build(&mut scopes, &mut symbols, &mut types, config)?;
        scopes.freeze(system.scope);

        debug!(
            pointer_size = config.target.pointer_size,
            aliases = config.type_aliases.len(),
            "System scope ready"
        );

        Ok(Self {
            config: config.clone(),
            types,
            scopes,
            symbols,
            system,
            units: HashMap::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn types(&self) -> &TypeFactory {
        &self.types
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn system_scope(&self) -> ScopeId {
        self.system.scope
    }

    pub fn lookup(&self) -> Lookup<'_> {
        Lookup::new(&self.scopes, &self.symbols, &self.types)
    }

    pub fn collector(&self) -> OperatorCollector<'_> {
        OperatorCollector::new(self.lookup())
    }

    pub fn resolver(&self) -> OverloadResolver<'_> {
        OverloadResolver::new(&self.types)
    }

    pub fn find(&self, scope: ScopeId, name: &str) -> Vec<DeclId> {
        self.lookup().find(scope, name)
    }

    pub fn shallow_find(&self, scope: ScopeId, name: &str) -> Vec<DeclId> {
        self.lookup().shallow_find(scope, name)
    }

    /// Candidate signatures for applying `operator` to a value of type `ty`.
    pub fn collect(&self, ty: &Type, operator: impl Into<Operator>) -> HashSet<Invocable> {
        self.collector().collect(ty, operator.into())
    }

    /// File scope of the unit `name` refers to. Names matching no unit are
    /// retried with each configured unit scope prefix.
    pub fn unit_scope(&self, name: &str) -> Option<ScopeId> {
        if canonicalize(name) == canonicalize(SYSTEM_UNIT) {
            return Some(self.system.scope);
        }
        if let Some(entry) = self.units.get(&canonicalize(name)) {
            return Some(entry.scope);
        }
        self.config
            .analysis
            .unit_scope_names
            .iter()
            .find_map(|prefix| self.units.get(&canonicalize(&format!("{prefix}.{name}"))))
            .map(|entry| entry.scope)
    }

    /// Names of the units in the session, in no particular order.
    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.values().map(|entry| entry.name.as_str())
    }

    /// Runs both phases on one unit and freezes its scopes.
    pub fn analyze_unit(&mut self, tree: SyntaxTree) -> Result<SemanticModel, AnalysisError> {
        let mut model = self.collect_unit(tree)?;
        self.resolve_unit(&mut model)?;
        self.scopes.freeze(model.scope);
        Ok(model)
    }

    /// Analyzes several units, dependencies first. Units taking part in a
    /// uses cycle keep their input order; their imports of each other are
    /// retried once every unit has been collected. Models come back in
    /// input order.
    pub fn analyze_units(
        &mut self,
        trees: Vec<SyntaxTree>,
    ) -> Result<Vec<SemanticModel>, AnalysisError> {
        let order = dependency_order(&trees);
        let mut slots: Vec<Option<SyntaxTree>> = trees.into_iter().map(Some).collect();

        let mut collected = Vec::with_capacity(order.len());
        for index in order {
            let Some(tree) = slots[index].take() else {
                continue;
            };
            collected.push((index, self.collect_unit(tree)?));
        }

        for (_, model) in &mut collected {
            let retried = self.retry_imports(model)?;
            if retried > 0 {
                debug!(unit = %model.name, retried, "Resolved imports after collection");
            }
        }

        for (_, model) in &mut collected {
            self.resolve_unit(model)?;
        }
        for (_, model) in &collected {
            self.scopes.freeze(model.scope);
        }

        collected.sort_by_key(|(index, _)| *index);
        Ok(collected.into_iter().map(|(_, model)| model).collect())
    }

    /// Phase one: declares the unit's names into a new File scope.
    #[instrument(skip_all, fields(unit = %unit_name(&tree)))]
    pub fn collect_unit(&mut self, tree: SyntaxTree) -> Result<SemanticModel, AnalysisError> {
        let root = tree.root()?;
        let NodeKind::Unit { name } = tree.kind(root) else {
            return Err(tree.unexpected(root, "unit").into());
        };
        let name = name.clone();
        if self.units.contains_key(&canonicalize(&name))
            || canonicalize(&name) == canonicalize(SYSTEM_UNIT)
        {
            warn!(unit = %name, "Unit analyzed twice");
            return Err(AnalysisError::DuplicateUnit { name });
        }

        let file = self
            .scopes
            .create_scope(ScopeKind::File, Some(self.system.scope), &name);
        let mut model = SemanticModel::new(&name, file, tree);
        self.symbols.declare(
            &self.scopes,
            file,
            DeclarationSpec::new(&name, DeclarationKind::Unit, Type::Unknown).unit_scope(file),
        )?;

        let outcome = DeclarationCollector::new(self, &model.tree, &mut model.annotations, file)
            .collect_unit(root);
        if let Err(error) = outcome {
            self.discard_scope(file);
            return Err(error);
        }
        model.annotations.seal_declarations();

        self.units.insert(
            canonicalize(&name),
            UnitEntry {
                name: name.clone(),
                scope: file,
            },
        );
        info!(unit = %name, issues = model.issues().len(), "Collected unit");
        Ok(model)
    }

    /// Phase two: types the unit's expressions and binds its references.
    /// Running it again recomputes everything it produced.
    #[instrument(skip_all, fields(unit = %model.name))]
    pub fn resolve_unit(&self, model: &mut SemanticModel) -> Result<(), AnalysisError> {
        let root = model.tree.root()?;
        model.annotations.reset_resolution(&model.tree);
        Resolver::new(self, &model.tree, &mut model.annotations).run(root, model.scope)?;
        debug!(issues = model.issues().len(), "Resolved unit");
        Ok(())
    }

    /// Type of `node`, computed now when the resolution pass has not done so.
    pub fn type_of(&self, model: &mut SemanticModel, node: NodeId) -> Result<Type, AnalysisError> {
        if let Some(ty) = model.annotations.cached_type(node) {
            return Ok(ty.clone());
        }
        let scope = model.scope_of(node);
        let mut resolver = Resolver::new(self, &model.tree, &mut model.annotations);
        let ty = resolver.type_of(node, scope);
        resolver.finish()?;
        Ok(ty)
    }

    fn retry_imports(&mut self, model: &mut SemanticModel) -> Result<usize, AnalysisError> {
        DeclarationCollector::new(self, &model.tree, &mut model.annotations, model.scope)
            .retry_imports()
    }

    /// Removes a unit and everything it declared. Other units keep their own
    /// declarations; their references into the removed unit stop resolving.
    pub fn discard_unit(&mut self, name: &str) -> bool {
        let Some(entry) = self.units.remove(&canonicalize(name)) else {
            return false;
        };
        self.discard_scope(entry.scope);
        info!(unit = %entry.name, "Discarded unit");
        true
    }

    fn discard_scope(&mut self, file: ScopeId) {
        for scope in self.scopes.subtree(file) {
            self.symbols.unregister_scope(scope);
        }
        self.scopes.detach(file);
    }
}

fn unit_name(tree: &SyntaxTree) -> &str {
    match tree.root().map(|root| tree.kind(root)) {
        Ok(NodeKind::Unit { name }) => name,
        _ => "",
    }
}

/// Indices of `trees` ordered so that used units come before their users.
/// Units caught in a cycle are appended in input order.
fn dependency_order(trees: &[SyntaxTree]) -> Vec<usize> {
    let names: Vec<CanonicalName> = trees.iter().map(|tree| canonicalize(unit_name(tree))).collect();
    let dependencies: Vec<Vec<usize>> = trees
        .iter()
        .map(|tree| {
            tree.nodes()
                .filter_map(|node| match &node.kind {
                    NodeKind::UnitReference { name } => {
                        let name = canonicalize(name);
                        names.iter().position(|candidate| *candidate == name)
                    }
                    _ => None,
                })
                .collect()
        })
        .collect();

    let mut order = Vec::with_capacity(trees.len());
    let mut placed = vec![false; trees.len()];
    loop {
        let ready: Vec<usize> = (0..trees.len())
            .filter(|&index| !placed[index])
            .filter(|&index| {
                dependencies[index]
                    .iter()
                    .all(|&dependency| placed[dependency] || dependency == index)
            })
            .collect();
        if ready.is_empty() {
            break;
        }
        for index in ready {
            placed[index] = true;
            order.push(index);
        }
    }

    let cyclic: Vec<usize> = (0..trees.len()).filter(|&index| !placed[index]).collect();
    if !cyclic.is_empty() {
        debug!(count = cyclic.len(), "Units in a uses cycle keep their input order");
    }
    order.extend(cyclic);
    order
}
