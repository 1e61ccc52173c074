#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::Cell;
use std::io;
use std::path::Path;

use super::*;
use crate::context::SearchPathOptions;
use crate::fs::MemoryFileSystem;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tern_diagnostic::ErrorCode;
use tern_ir::{LibraryKind, NominalKind, StringInterner, ValueKind};
use tern_serialize::format::{encode_with_version, FormatVersion};
use tern_serialize::{encode_module, LoadStatus, ModulePayload, RawExtension, RawNominal};

/// Decoder that counts how often it runs.
#[derive(Default)]
struct CountingDecoder {
    calls: Cell<usize>,
}

impl ModuleDecoder for CountingDecoder {
    fn decode(&self, bytes: &[u8], interner: &StringInterner) -> Result<ModuleFile, DecodeError> {
        self.calls.set(self.calls.get() + 1);
        BinaryDecoder.decode(bytes, interner)
    }
}

type TestLoader = ModuleLoader<MemoryFileSystem, CountingDecoder>;

fn bytes(payload: &ModulePayload) -> Vec<u8> {
    encode_module(payload).expect("encode failed")
}

fn too_new(name: &str) -> Vec<u8> {
    encode_with_version(&ModulePayload::new(name), FormatVersion::new(99, 0))
        .expect("encode failed")
}

fn lib_path(name: &str) -> String {
    format!("/lib/{name}.ternmod")
}

fn context() -> ModuleContext {
    ModuleContext::new(
        SearchPathOptions::new()
            .with_working_dir("/work")
            .with_import_path("/lib"),
    )
}

fn loader_with(files: Vec<(String, Vec<u8>)>) -> TestLoader {
    let mut fs = MemoryFileSystem::new();
    for (path, contents) in files {
        fs.insert(path, contents);
    }
    ModuleLoader::with_parts(fs, CountingDecoder::default())
}

fn library(payloads: &[ModulePayload]) -> TestLoader {
    loader_with(
        payloads
            .iter()
            .map(|p| (lib_path(&p.name), bytes(p)))
            .collect(),
    )
}

fn resolve(loader: &mut TestLoader, ctx: &mut ModuleContext, name: &str) -> Option<ModuleId> {
    let path = AccessPath::single(ctx.intern(name), None);
    loader.resolve(ctx, &path, None)
}

fn messages(ctx: &ModuleContext) -> Vec<String> {
    ctx.diagnostics.peek().map(|d| d.message.clone()).collect()
}

fn value_names(ctx: &ModuleContext, decls: &[ValueDecl]) -> Vec<&'static str> {
    decls.iter().map(|d| ctx.interner.lookup(d.name)).collect()
}

#[test]
fn test_resolution_is_memoized() {
    let mut ctx = context();
    let mut loader = library(&[ModulePayload::new("A")]);

    let first = resolve(&mut loader, &mut ctx, "A");
    let reads = loader.locator().file_system().read_count();
    let second = resolve(&mut loader, &mut ctx, "A");

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(loader.locator().file_system().read_count(), reads);
    assert_eq!(loader.decoder().calls.get(), 1);
}

#[test]
fn test_qualified_path_declines_without_probing() {
    let mut ctx = context();
    let mut loader = library(&[ModulePayload::new("A")]);
    let path = AccessPath::from_names([ctx.intern("A"), ctx.intern("B")]);

    assert_eq!(loader.resolve(&mut ctx, &path, None), None);
    assert_eq!(loader.resolve(&mut ctx, &AccessPath::new(), None), None);
    assert_eq!(loader.locator().file_system().read_count(), 0);
    assert_eq!(loader.decoder().calls.get(), 0);
    assert!(ctx.registry().is_empty());
}

#[test]
fn test_not_found_declines_silently() {
    let mut ctx = context();
    let mut loader = library(&[]);
    assert_eq!(resolve(&mut loader, &mut ctx, "Nowhere"), None);
    assert!(ctx.diagnostics.is_empty());
    assert!(ctx.lookup_module("Nowhere").is_none());
}

#[test]
fn test_override_buffer_is_consumed() {
    let mut ctx = context();
    let mut loader = library(&[]);
    loader.register_buffer(
        "A",
        MemoryBuffer::new("<memory A>", bytes(&ModulePayload::new("A"))),
    );

    let id = resolve(&mut loader, &mut ctx, "A")
        .expect("override buffer should resolve");
    assert_eq!(ctx.module(id).debug_path(), Some("<memory A>"));
    assert_eq!(loader.locator().file_system().read_count(), 0);
    assert!(!loader.locator().has_override("A"));

    // A fresh context sees only the (empty) disk.
    let mut other = context();
    assert_eq!(resolve(&mut loader, &mut other, "A"), None);
}

#[test]
fn test_generation_counts_valid_admissions_only() {
    let mut ctx = context();
    let mut loader = loader_with(vec![
        (lib_path("A"), bytes(&ModulePayload::new("A"))),
        (lib_path("B"), bytes(&ModulePayload::new("B").with_dependency("A", true))),
        (lib_path("Old"), too_new("Old")),
        (lib_path("Bad"), b"TMOD\x01\x00\x00\x00garbage".to_vec()),
        (
            lib_path("Orphan"),
            bytes(&ModulePayload::new("Orphan").with_dependency("Gone", false)),
        ),
    ]);

    let a = resolve(&mut loader, &mut ctx, "A").expect("A");
    assert_eq!(ctx.current_generation(), Generation::new(1));
    assert_eq!(ctx.module(a).generation(), Generation::new(1));

    for rejected in ["Old", "Bad", "Orphan"] {
        assert!(resolve(&mut loader, &mut ctx, rejected).is_some());
        assert_eq!(ctx.current_generation(), Generation::new(1), "{rejected}");
    }

    let b = resolve(&mut loader, &mut ctx, "B").expect("B");
    assert_eq!(ctx.current_generation(), Generation::new(2));
    assert_eq!(ctx.module(b).generation(), Generation::new(2));
}

#[test]
fn test_scans_since_current_generation_visit_nothing() {
    let mut ctx = context();
    let mut loader = library(&[
        ModulePayload::new("A").with_extension(
            RawExtension::new("Point").conforming_to(KnownProtocolKind::Hashable),
        ),
        ModulePayload::new("B").with_extension(
            RawExtension::new("Point").conforming_to(KnownProtocolKind::Hashable),
        ),
    ]);
    resolve(&mut loader, &mut ctx, "A");
    resolve(&mut loader, &mut ctx, "B");
    let point = ctx.intern("Point");

    let mut nominal = NominalTypeDecl::new(point, NominalKind::Struct);
    loader.load_extensions(&ctx, &mut nominal, ctx.current_generation());
    assert!(nominal.extensions.is_empty());
    assert!(loader
        .load_decls_conforming_to(&ctx, KnownProtocolKind::Hashable, ctx.current_generation())
        .is_empty());

    loader.load_extensions(&ctx, &mut nominal, Generation::INITIAL);
    assert_eq!(nominal.extensions.len(), 2);
    assert_eq!(
        loader
            .load_decls_conforming_to(&ctx, KnownProtocolKind::Hashable, Generation::INITIAL)
            .len(),
        2
    );

    // Only modules admitted after generation 1.
    assert_eq!(
        loader
            .load_decls_conforming_to(&ctx, KnownProtocolKind::Hashable, Generation::new(1))
            .len(),
        1
    );
}

#[test]
fn test_missing_single_dependency() {
    let mut ctx = context();
    let mut loader = library(&[
        ModulePayload::new("A")
            .with_dependency("B", true)
            .with_value("answer", ValueKind::Constant),
        ModulePayload::new("B"),
    ]);

    let a = resolve(&mut loader, &mut ctx, "A").expect("A is cached");
    assert!(ctx.module(a).file().is_none());
    assert_eq!(ctx.module(a).status(), Some(LoadStatus::MissingDependency));
    let answer = ctx.intern("answer");
    assert!(loader
        .lookup_value(&ctx, a, &AccessPath::new(), answer, LookupKind::Unqualified)
        .is_empty());
    assert_eq!(messages(&ctx), vec!["missing required module 'B'"]);
    assert_eq!(
        ctx.diagnostics.with_code(ErrorCode::E7004).count(),
        1
    );

    // Loading B afterwards does not revive A.
    assert!(resolve(&mut loader, &mut ctx, "B").is_some());
    assert_eq!(resolve(&mut loader, &mut ctx, "A"), Some(a));
    assert!(ctx.module(a).file().is_none());
    assert_eq!(loader.decoder().calls.get(), 2);
    assert_eq!(ctx.diagnostics.len(), 1);
}

#[test]
fn test_missing_multiple_dependencies_in_declaration_order() {
    let mut ctx = context();
    let mut loader = library(&[
        ModulePayload::new("X")
            .with_dependency("B", false)
            .with_dependency("C", false),
        ModulePayload::new("Y")
            .with_dependency("C", false)
            .with_dependency("B", false),
    ]);

    resolve(&mut loader, &mut ctx, "X");
    resolve(&mut loader, &mut ctx, "Y");
    assert_eq!(
        messages(&ctx),
        vec![
            "missing required modules: 'B', 'C'",
            "missing required modules: 'C', 'B'",
        ]
    );
    assert_eq!(ctx.diagnostics.with_code(ErrorCode::E7005).count(), 2);
}

#[test]
fn test_each_importer_of_a_missing_module_is_diagnosed() {
    let mut ctx = context();
    let mut loader = library(&[
        ModulePayload::new("A1").with_dependency("B", false),
        ModulePayload::new("A2").with_dependency("B", false),
    ]);

    let a1 = resolve(&mut loader, &mut ctx, "A1").expect("A1 is cached");
    let a2 = resolve(&mut loader, &mut ctx, "A2").expect("A2 is cached");
    assert_eq!(ctx.module(a1).status(), Some(LoadStatus::MissingDependency));
    assert_eq!(ctx.module(a2).status(), Some(LoadStatus::MissingDependency));
    assert_eq!(
        messages(&ctx),
        vec!["missing required module 'B'", "missing required module 'B'"]
    );
    assert_eq!(ctx.diagnostics.with_code(ErrorCode::E7004).count(), 2);
}

#[test]
fn test_format_too_new_is_cached() {
    let mut ctx = context();
    let mut loader = loader_with(vec![(lib_path("Old"), too_new("Old"))]);

    let old = resolve(&mut loader, &mut ctx, "Old").expect("cached");
    assert!(ctx.module(old).file().is_none());
    assert_eq!(ctx.module(old).status(), Some(LoadStatus::FormatTooNew));
    let reads = loader.locator().file_system().read_count();

    assert_eq!(resolve(&mut loader, &mut ctx, "Old"), Some(old));
    assert_eq!(loader.locator().file_system().read_count(), reads);
    assert_eq!(ctx.diagnostics.with_code(ErrorCode::E7002).count(), 1);
    assert!(ctx.registry().files_since(Generation::INITIAL).next().is_none());
}

#[test]
fn test_malformed_is_cached_and_diagnosed() {
    let mut ctx = context();
    let mut loader = loader_with(vec![(lib_path("Bad"), b"not a module".to_vec())]);

    let bad = resolve(&mut loader, &mut ctx, "Bad").expect("cached");
    assert_eq!(ctx.module(bad).status(), Some(LoadStatus::Malformed));
    let diag = ctx
        .diagnostics
        .with_code(ErrorCode::E7003)
        .next()
        .expect("expected a malformed-module diagnostic");
    assert_eq!(diag.message, "malformed module file for 'Bad'");
    assert_eq!(diag.notes, vec!["not a module file (bad magic)".to_owned()]);
}

#[test]
fn test_io_error_is_diagnosed_and_retried() {
    let mut ctx = context();
    let mut loader = ModuleLoader::with_parts(
        MemoryFileSystem::new()
            .with_file(lib_path("A"), bytes(&ModulePayload::new("A")))
            .with_error(lib_path("A"), io::ErrorKind::PermissionDenied),
        CountingDecoder::default(),
    );

    assert_eq!(resolve(&mut loader, &mut ctx, "A"), None);
    assert_eq!(ctx.diagnostics.with_code(ErrorCode::E7001).count(), 1);
    assert!(ctx.lookup_module("A").is_none());

    loader
        .locator_mut()
        .file_system_mut()
        .clear_error(Path::new("/lib/A.ternmod"));
    assert!(resolve(&mut loader, &mut ctx, "A").is_some());
}

#[test]
fn test_import_relative_directory_wins() {
    let mut ctx = context();
    let buffer = ctx.sources.add_buffer("/src/app/main.tn", "import Shapes\n");
    let loc = ctx.sources.span_in(buffer, 7..13);
    let mut loader = loader_with(vec![
        (
            lib_path("Shapes"),
            bytes(&ModulePayload::new("Shapes").with_value("from_lib", ValueKind::Function)),
        ),
        (
            "/src/app/Shapes.ternmod".to_owned(),
            bytes(&ModulePayload::new("Shapes").with_value("from_app", ValueKind::Function)),
        ),
    ]);

    let path = AccessPath::single(ctx.intern("Shapes"), Some(loc));
    let shapes = loader
        .resolve(&mut ctx, &path, Some(loc))
        .expect("Shapes");
    assert_eq!(ctx.module(shapes).debug_path(), Some("/src/app/Shapes.ternmod"));

    let mut visible: Vec<ValueDecl> = Vec::new();
    loader.lookup_visible_decls(
        &ctx,
        shapes,
        &AccessPath::new(),
        &mut visible,
        LookupKind::Unqualified,
    );
    assert_eq!(value_names(&ctx, &visible), vec!["from_app"]);
}

#[test]
fn test_diagnostic_points_at_import() {
    let mut ctx = context();
    let buffer = ctx.sources.add_buffer("/src/main.tn", "import A\n");
    let loc = ctx.sources.span_in(buffer, 7..8);
    let mut loader = library(&[ModulePayload::new("A").with_dependency("B", false)]);

    let path = AccessPath::single(ctx.intern("A"), Some(loc));
    loader.resolve(&mut ctx, &path, Some(loc));
    let diag = ctx
        .diagnostics
        .peek()
        .next()
        .expect("expected a diagnostic");
    assert_eq!(diag.primary_span(), Some(loc));
}

#[test]
fn test_builtin_satisfies_dependencies() {
    let mut ctx = context();
    let builtin = ctx.register_builtin_module("Builtin");
    let mut loader = library(&[ModulePayload::new("A").with_dependency("Builtin", true)]);

    let a = resolve(&mut loader, &mut ctx, "A").expect("A");
    assert!(ctx.module(a).file().is_some());
    assert_eq!(
        loader.imported_modules(&ctx, a, false),
        vec![ImportedModule {
            module: builtin,
            access_path: AccessPath::new(),
        }]
    );

    // Resolving a builtin returns it without probing.
    assert_eq!(resolve(&mut loader, &mut ctx, "Builtin"), Some(builtin));
    assert!(loader.display_decls(&ctx, builtin).is_empty());
}

fn shapes_module() -> ModulePayload {
    ModulePayload::new("Shapes")
        .with_dependency("Core", true)
        .with_dependency("Util", false)
        .with_value("area", ValueKind::Function)
        .with_value("perimeter", ValueKind::Function)
        .with_operator("<>", Fixity::Infix)
        .with_nominal(
            RawNominal::new("Shape", NominalKind::Class)
                .conforming_to(KnownProtocolKind::Equatable)
                .with_member("draw", ValueKind::Function),
        )
        .with_extension(RawExtension::new("Shape").with_member("fill", ValueKind::Function))
        .with_link_library("shapes", LibraryKind::Library)
        .with_link_library("Quartz", LibraryKind::Framework)
}

fn loaded_shapes() -> (ModuleContext, TestLoader, ModuleId) {
    let mut ctx = context();
    ctx.register_builtin_module("Core");
    ctx.register_builtin_module("Util");
    let mut loader = library(&[shapes_module()]);
    let shapes = resolve(&mut loader, &mut ctx, "Shapes").expect("Shapes");
    (ctx, loader, shapes)
}

#[test]
fn test_lookup_value_qualifier_filter() {
    let (ctx, loader, shapes) = loaded_shapes();
    let area = ctx.intern("area");
    let perimeter = ctx.intern("perimeter");

    let all = loader.lookup_value(&ctx, shapes, &AccessPath::new(), area, LookupKind::Unqualified);
    assert_eq!(value_names(&ctx, &all), vec!["area"]);

    let only_area = AccessPath::single(area, None);
    assert_eq!(
        loader
            .lookup_value(&ctx, shapes, &only_area, area, LookupKind::Qualified)
            .len(),
        1
    );
    assert!(loader
        .lookup_value(&ctx, shapes, &only_area, perimeter, LookupKind::Qualified)
        .is_empty());
}

#[test]
fn test_operator_and_member_queries() {
    let (ctx, loader, shapes) = loaded_shapes();
    let op = ctx.intern("<>");
    assert_eq!(
        loader.lookup_operator(&ctx, shapes, op, Fixity::Infix),
        Some(OperatorDecl {
            name: op,
            fixity: Fixity::Infix
        })
    );
    assert_eq!(loader.lookup_operator(&ctx, shapes, op, Fixity::Postfix), None);

    let mut members: Vec<ValueDecl> = Vec::new();
    loader.lookup_class_members(&ctx, shapes, &AccessPath::new(), &mut members);
    assert_eq!(value_names(&ctx, &members), vec!["draw", "fill"]);

    let fill = ctx.intern("fill");
    let found = loader.lookup_class_member(&ctx, shapes, &AccessPath::new(), fill);
    assert_eq!(value_names(&ctx, &found), vec!["fill"]);
}

#[test]
fn test_imports_libraries_and_display() {
    let (ctx, loader, shapes) = loaded_shapes();
    assert_eq!(loader.imported_modules(&ctx, shapes, false).len(), 1);
    assert_eq!(loader.imported_modules(&ctx, shapes, true).len(), 2);

    let mut libs = Vec::new();
    loader.link_libraries(&ctx, shapes, |lib| libs.push(lib.to_string()));
    assert_eq!(libs, vec!["-lshapes", "-framework Quartz"]);

    assert_eq!(loader.display_decls(&ctx, shapes).len(), 5);
    let equatable =
        loader.load_decls_conforming_to(&ctx, KnownProtocolKind::Equatable, Generation::INITIAL);
    assert!(matches!(equatable[..], [Decl::Nominal(ref n)] if n.name == ctx.intern("Shape")));
}

#[test]
fn test_queries_on_unusable_module_are_empty() {
    let mut ctx = context();
    let mut loader = library(&[shapes_module()]);
    let shapes = resolve(&mut loader, &mut ctx, "Shapes").expect("cached");
    assert_eq!(ctx.module(shapes).status(), Some(LoadStatus::MissingDependency));

    let op = ctx.intern("<>");
    assert_eq!(loader.lookup_operator(&ctx, shapes, op, Fixity::Infix), None);
    assert!(loader.display_decls(&ctx, shapes).is_empty());
    assert!(loader.imported_modules(&ctx, shapes, true).is_empty());
    let mut libs = 0;
    loader.link_libraries(&ctx, shapes, |_| libs += 1);
    assert_eq!(libs, 0);
    let mut members: Vec<ValueDecl> = Vec::new();
    loader.lookup_class_members(&ctx, shapes, &AccessPath::new(), &mut members);
    assert!(members.is_empty());
    assert!(loader
        .load_decls_conforming_to(&ctx, KnownProtocolKind::Equatable, Generation::INITIAL)
        .is_empty());
}

/// How a generated module file behaves when loaded.
#[derive(Clone, Debug)]
enum Shape {
    Leaf,
    TooNew,
    Malformed,
    DependsOn(usize),
}

fn shape_strategy(count: usize) -> impl Strategy<Value = Shape> {
    prop_oneof![
        3 => Just(Shape::Leaf),
        1 => Just(Shape::TooNew),
        1 => Just(Shape::Malformed),
        3 => (0..count).prop_map(Shape::DependsOn),
    ]
}

const MODULES: usize = 6;

proptest! {
    #[test]
    fn generations_and_memoization(
        shapes in proptest::collection::vec(shape_strategy(MODULES), MODULES),
        order in proptest::collection::vec(0..MODULES, 1..24),
    ) {
        let name = |i: usize| format!("M{i}");
        let files = shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| {
                let contents = match shape {
                    Shape::Leaf => bytes(&ModulePayload::new(name(i))),
                    Shape::TooNew => too_new(&name(i)),
                    Shape::Malformed => b"TMOD\x01\x00".to_vec(),
                    Shape::DependsOn(dep) => {
                        bytes(&ModulePayload::new(name(i)).with_dependency(name(*dep), false))
                    }
                };
                (lib_path(&name(i)), contents)
            })
            .collect();
        let mut ctx = context();
        let mut loader = loader_with(files);

        let mut seen: Vec<Option<ModuleId>> = vec![None; MODULES];
        let mut expected_generation = 0;
        for &i in &order {
            let first_time = seen[i].is_none();
            let admitted_valid = first_time
                && match shapes[i] {
                    Shape::Leaf => true,
                    Shape::DependsOn(dep) => seen[dep].is_some(),
                    Shape::TooNew | Shape::Malformed => false,
                };
            let id = resolve(&mut loader, &mut ctx, &name(i));
            prop_assert!(id.is_some());
            if let Some(previous) = seen[i] {
                prop_assert_eq!(id, Some(previous));
            }
            seen[i] = id;
            if admitted_valid {
                expected_generation += 1;
            }
            prop_assert_eq!(ctx.current_generation(), Generation::new(expected_generation));
        }

        let distinct = seen.iter().filter(|s| s.is_some()).count();
        prop_assert_eq!(loader.decoder().calls.get(), distinct);
        prop_assert_eq!(
            ctx.registry().files_since(ctx.current_generation()).count(),
            0
        );
        let live = ctx.registry().iter().filter(|(_, m)| m.file().is_some()).count();
        prop_assert_eq!(ctx.registry().files_since(Generation::INITIAL).count(), live);
    }
}
