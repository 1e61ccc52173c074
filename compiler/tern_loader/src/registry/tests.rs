#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;
use tern_ir::StringInterner;
use tern_serialize::{encode_module, BinaryDecoder, ModuleDecoder, ModulePayload};

fn decoded(interner: &StringInterner, name: &str) -> ModuleFile {
    let bytes = encode_module(&ModulePayload::new(name))
        .expect("encode failed");
    BinaryDecoder
        .decode(&bytes, interner)
        .expect("decode failed")
}

fn serialized(file: FileState) -> ModuleKind {
    ModuleKind::Serialized(SerializedModule {
        debug_path: "<test>".to_owned(),
        file,
    })
}

#[test]
fn test_admit_records_generation() {
    let interner = StringInterner::new();
    let mut registry = ModuleRegistry::new();
    assert_eq!(registry.current_generation(), Generation::INITIAL);

    let generation = registry.bump_generation();
    let a = registry.admit(
        interner.intern("A"),
        serialized(FileState::Usable(decoded(&interner, "A"))),
    );
    assert_eq!(generation, Generation::new(1));
    assert_eq!(registry.get(a).generation(), generation);
    assert_eq!(registry.get(a).status(), Some(LoadStatus::Valid));
    assert_eq!(registry.lookup(interner.intern("A")), Some(a));
}

#[test]
fn test_failed_admission_is_cached_without_file() {
    let interner = StringInterner::new();
    let mut registry = ModuleRegistry::new();
    let id = registry.admit(
        interner.intern("Old"),
        serialized(FileState::Unusable(UnusableReason::FormatTooNew {
            found: 9,
            supported: 1,
        })),
    );

    assert!(registry.contains(interner.intern("Old")));
    assert!(registry.get(id).file().is_none());
    assert_eq!(registry.get(id).status(), Some(LoadStatus::FormatTooNew));
    assert_eq!(registry.files_since(Generation::INITIAL).count(), 0);
    assert_eq!(registry.current_generation(), Generation::INITIAL);
}

#[test]
fn test_admit_twice_keeps_first() {
    let interner = StringInterner::new();
    let mut registry = ModuleRegistry::new();
    let name = interner.intern("A");
    let first = registry.admit(name, ModuleKind::Builtin);
    let second = registry.admit(
        name,
        serialized(FileState::Usable(decoded(&interner, "A"))),
    );
    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
    assert!(matches!(registry.get(first).kind(), ModuleKind::Builtin));
}

#[test]
fn test_files_since_filters_by_generation() {
    let interner = StringInterner::new();
    let mut registry = ModuleRegistry::new();

    for name in ["A", "B", "C"] {
        registry.bump_generation();
        registry.admit(
            interner.intern(name),
            serialized(FileState::Usable(decoded(&interner, name))),
        );
    }
    // A dependency-incomplete file is recorded but never yielded.
    registry.admit(
        interner.intern("D"),
        serialized(FileState::Unusable(UnusableReason::MissingDependencies {
            file: Box::new(decoded(&interner, "D")),
            missing: vec!["Z".to_owned()],
        })),
    );

    let names = |since: u32| -> Vec<&'static str> {
        registry
            .files_since(Generation::new(since))
            .map(|(_, file)| interner.lookup(file.name()))
            .collect()
    };
    assert_eq!(names(0), vec!["A", "B", "C"]);
    assert_eq!(names(2), vec!["C"]);
    assert!(names(registry.current_generation().raw()).is_empty());
}

#[test]
fn test_missing_dependencies_keeps_decoded_file() {
    let interner = StringInterner::new();
    let state = FileState::Unusable(UnusableReason::MissingDependencies {
        file: Box::new(decoded(&interner, "A")),
        missing: vec!["B".to_owned()],
    });
    assert!(state.usable().is_none());
    assert!(state.decoded().is_some());
    assert_eq!(state.status(), LoadStatus::MissingDependency);
}

#[test]
fn test_builtin_has_no_file() {
    let interner = StringInterner::new();
    let mut registry = ModuleRegistry::new();
    let id = registry.admit(interner.intern("Builtin"), ModuleKind::Builtin);
    let module = registry.get(id);
    assert!(module.file().is_none());
    assert!(module.debug_path().is_none());
    assert!(module.status().is_none());
    assert_eq!(registry.iter().count(), 1);
}
