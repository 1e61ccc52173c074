#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::registry::ModuleKind;
use pretty_assertions::assert_eq;
use tern_diagnostic::ErrorCode;
use tern_serialize::{encode_module, BinaryDecoder, LoadStatus, ModuleDecoder, ModulePayload};

fn decode(interner: &StringInterner, payload: &ModulePayload) -> ModuleFile {
    let bytes = encode_module(payload).expect("encode failed");
    BinaryDecoder
        .decode(&bytes, interner)
        .expect("decode failed")
}

#[test]
fn test_complete_when_all_registered() {
    let interner = StringInterner::new();
    let mut registry = ModuleRegistry::new();
    registry.admit(interner.intern("B"), ModuleKind::Builtin);

    let mut file = decode(&interner, &ModulePayload::new("A").with_dependency("B.Sub", true));
    assert_eq!(
        associate(&mut file, &registry, &interner),
        Association::Complete
    );
    assert_eq!(file.status(), LoadStatus::Valid);
    assert_eq!(file.imported_modules(false).len(), 1);
}

#[test]
fn test_incomplete_lists_missing_in_order() {
    let interner = StringInterner::new();
    let mut registry = ModuleRegistry::new();
    registry.admit(interner.intern("C"), ModuleKind::Builtin);

    let payload = ModulePayload::new("A")
        .with_dependency("D", false)
        .with_dependency("C", false)
        .with_dependency("B", false);
    let mut file = decode(&interner, &payload);
    assert_eq!(
        associate(&mut file, &registry, &interner),
        Association::Incomplete {
            missing: vec!["D".to_owned(), "B".to_owned()]
        }
    );
    assert_eq!(file.status(), LoadStatus::MissingDependency);
}

#[test]
fn test_no_dependencies_is_complete() {
    let interner = StringInterner::new();
    let mut file = decode(&interner, &ModulePayload::new("Leaf"));
    assert_eq!(
        associate(&mut file, &ModuleRegistry::new(), &interner),
        Association::Complete
    );
}

#[test]
fn test_single_vs_multiple_diagnostic() {
    let single = missing_dependency_diagnostic(None, &["B".to_owned()]);
    assert_eq!(single.code, ErrorCode::E7004);
    assert_eq!(single.message, "missing required module 'B'");

    let multiple = missing_dependency_diagnostic(None, &["B".to_owned(), "C".to_owned()]);
    assert_eq!(multiple.code, ErrorCode::E7005);
    assert_eq!(multiple.message, "missing required modules: 'B', 'C'");
}
