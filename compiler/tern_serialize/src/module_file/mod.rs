//! The decoded module descriptor.
//!
//! A `ModuleFile` owns everything read from one `.ternmod` file: its
//! declarations indexed for lookup, its dependencies and its link libraries.
//! Dependencies start out unresolved; the loader binds them to registry
//! handles through [`ModuleFile::associate`].

use std::fmt;

use rustc_hash::FxHashMap;
use tern_ir::{
    AccessPath, Decl, ExtensionDecl, Fixity, KnownProtocolKind, LinkLibrary, ModuleId, Name,
    NominalKind, NominalTypeDecl, OperatorDecl, ValueDecl, ValueKind,
};

use crate::format::FormatVersion;

/// Outcome of decoding and associating a module file.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LoadStatus {
    Valid,
    FormatTooNew,
    Malformed,
    /// Decoded fine, but a declared dependency is not loaded.
    MissingDependency,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Valid => write!(f, "valid"),
            LoadStatus::FormatTooNew => write!(f, "format too new"),
            LoadStatus::Malformed => write!(f, "malformed"),
            LoadStatus::MissingDependency => write!(f, "missing dependency"),
        }
    }
}

/// Receiver for declarations found by visible-decl and class-member lookups.
pub trait VisibleDeclConsumer {
    fn found_decl(&mut self, decl: &ValueDecl);
}

impl VisibleDeclConsumer for Vec<ValueDecl> {
    fn found_decl(&mut self, decl: &ValueDecl) {
        self.push(decl.clone());
    }
}

/// A module made visible through a dependency.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ImportedModule {
    pub module: ModuleId,
    /// Access path after the module segment (empty for whole-module imports).
    pub access_path: AccessPath,
}

/// One dependency declared by a module file.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Dependency {
    /// The access path exactly as stored in the file.
    pub raw_access_path: String,
    pub exported: bool,
    module: Name,
    rest: Vec<Name>,
    imported: Option<ImportedModule>,
}

impl Dependency {
    /// Name of the module this dependency refers to (first path segment).
    pub fn module_name(&self) -> Name {
        self.module
    }

    /// Whether association bound this dependency to a loaded module.
    pub fn is_loaded(&self) -> bool {
        self.imported.is_some()
    }

    pub fn imported(&self) -> Option<&ImportedModule> {
        self.imported.as_ref()
    }
}

/// In-memory descriptor of a decoded module file.
#[derive(Clone, Debug)]
pub struct ModuleFile {
    name: Name,
    version: FormatVersion,
    status: LoadStatus,
    dependencies: Vec<Dependency>,
    /// Every top-level declaration in file order.
    decls: Vec<Decl>,
    /// Top-level values by name, nominal types included.
    values: FxHashMap<Name, Vec<ValueDecl>>,
    operators: FxHashMap<(Name, Fixity), OperatorDecl>,
    link_libraries: Vec<LinkLibrary>,
}

impl ModuleFile {
    pub(crate) fn new(name: Name, version: FormatVersion) -> Self {
        ModuleFile {
            name,
            version,
            status: LoadStatus::Valid,
            dependencies: Vec::new(),
            decls: Vec::new(),
            values: FxHashMap::default(),
            operators: FxHashMap::default(),
            link_libraries: Vec::new(),
        }
    }

    pub(crate) fn add_dependency(
        &mut self,
        raw_access_path: String,
        exported: bool,
        module: Name,
        rest: Vec<Name>,
    ) {
        self.dependencies.push(Dependency {
            raw_access_path,
            exported,
            module,
            rest,
            imported: None,
        });
    }

    /// Record a top-level declaration.
    ///
    /// Returns the operator already registered for the same spelling and
    /// fixity instead of adding a duplicate.
    pub(crate) fn add_decl(&mut self, decl: Decl) -> Result<(), OperatorDecl> {
        match &decl {
            Decl::Value(value) => {
                self.values.entry(value.name).or_default().push(value.clone());
            }
            Decl::Operator(op) => {
                if let Some(existing) = self.operators.insert((op.name, op.fixity), *op) {
                    return Err(existing);
                }
            }
            Decl::Nominal(nominal) => {
                self.values
                    .entry(nominal.name)
                    .or_default()
                    .push(ValueDecl::top_level(
                        nominal.name,
                        ValueKind::Nominal(nominal.kind),
                    ));
            }
            Decl::Extension(_) => {}
        }
        self.decls.push(decl);
        Ok(())
    }

    pub(crate) fn add_link_library(&mut self, library: LinkLibrary) {
        self.link_libraries.push(library);
    }

    /// Declared module name.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Container version the file was written with.
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Bind every dependency to a loaded module.
    ///
    /// `find` maps a module name to its registry handle. Dependencies that
    /// stay unbound are reported by [`ModuleFile::missing_dependencies`];
    /// if there are any the status becomes `MissingDependency` and this
    /// returns `false`.
    pub fn associate(&mut self, mut find: impl FnMut(Name) -> Option<ModuleId>) -> bool {
        let mut complete = true;
        for dep in &mut self.dependencies {
            dep.imported = find(dep.module).map(|module| ImportedModule {
                module,
                access_path: AccessPath::from_names(dep.rest.iter().copied()),
            });
            complete &= dep.imported.is_some();
        }
        self.status = if complete {
            LoadStatus::Valid
        } else {
            LoadStatus::MissingDependency
        };
        complete
    }

    /// Unbound dependencies in declaration order.
    pub fn missing_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|dep| !dep.is_loaded())
    }

    /// Top-level values named `name`.
    pub fn lookup_value(&self, name: Name) -> &[ValueDecl] {
        self.values.get(&name).map_or(&[], Vec::as_slice)
    }

    pub fn lookup_operator(&self, name: Name, fixity: Fixity) -> Option<OperatorDecl> {
        self.operators.get(&(name, fixity)).copied()
    }

    /// Feed every top-level value to `consumer`, or only those named by the
    /// first element of `access_path` when it is non-empty.
    pub fn lookup_visible_decls(
        &self,
        access_path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
    ) {
        let filter = access_path.first().map(|elem| elem.name);
        for value in self.top_level_values() {
            if filter.map_or(true, |name| name == value.name) {
                consumer.found_decl(&value);
            }
        }
    }

    /// Feed the members of this module's classes to `consumer`.
    ///
    /// Extensions of those classes declared in this module contribute their
    /// members too. A non-empty `access_path` restricts the walk to the class
    /// named by its first element.
    pub fn lookup_class_members(
        &self,
        access_path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
    ) {
        let filter = access_path.first().map(|elem| elem.name);
        self.for_each_class_member(filter, |member| consumer.found_decl(member));
    }

    /// Class members named `name`, with the same path restriction as
    /// [`ModuleFile::lookup_class_members`].
    pub fn lookup_class_member(&self, access_path: &AccessPath, name: Name) -> Vec<ValueDecl> {
        let filter = access_path.first().map(|elem| elem.name);
        let mut found = Vec::new();
        self.for_each_class_member(filter, |member| {
            if member.name == name {
                found.push(member.clone());
            }
        });
        found
    }

    /// Bound dependencies; private ones only when `include_private`.
    pub fn imported_modules(&self, include_private: bool) -> Vec<ImportedModule> {
        self.dependencies
            .iter()
            .filter(|dep| include_private || dep.exported)
            .filter_map(|dep| dep.imported.clone())
            .collect()
    }

    pub fn link_libraries(&self) -> &[LinkLibrary] {
        &self.link_libraries
    }

    /// Every top-level declaration in file order.
    pub fn display_decls(&self) -> &[Decl] {
        &self.decls
    }

    /// Append this module's extensions of `nominal` to its extension list.
    pub fn load_extensions(&self, nominal: &mut NominalTypeDecl) {
        let found = self.extensions().filter(|ext| ext.extended == nominal.name);
        nominal.extensions.extend(found.cloned());
    }

    /// Nominal types and extensions declaring a conformance to `kind`.
    pub fn decls_conforming_to(&self, kind: KnownProtocolKind) -> impl Iterator<Item = &Decl> {
        self.decls.iter().filter(move |decl| match decl {
            Decl::Nominal(nominal) => nominal.conforms_to(kind),
            Decl::Extension(ext) => ext.conforms_to(kind),
            Decl::Value(_) | Decl::Operator(_) => false,
        })
    }

    fn top_level_values(&self) -> impl Iterator<Item = ValueDecl> + '_ {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Value(value) => Some(value.clone()),
            Decl::Nominal(nominal) => Some(ValueDecl::top_level(
                nominal.name,
                ValueKind::Nominal(nominal.kind),
            )),
            Decl::Operator(_) | Decl::Extension(_) => None,
        })
    }

    fn extensions(&self) -> impl Iterator<Item = &ExtensionDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Extension(ext) => Some(ext),
            _ => None,
        })
    }

    fn classes(&self) -> impl Iterator<Item = &NominalTypeDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Nominal(nominal) if nominal.kind == NominalKind::Class => Some(nominal),
            _ => None,
        })
    }

    fn for_each_class_member(&self, filter: Option<Name>, mut visit: impl FnMut(&ValueDecl)) {
        let wanted = |name: Name| filter.map_or(true, |f| f == name);
        for class in self.classes().filter(|class| wanted(class.name)) {
            class.members.iter().for_each(&mut visit);
            for ext in self.extensions().filter(|ext| ext.extended == class.name) {
                ext.members.iter().for_each(&mut visit);
            }
        }
    }
}
