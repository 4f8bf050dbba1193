use pretty_assertions::assert_eq;
use serde_json::json;
use sloth_mmcif::{parse_str, Container, Origin};

const INPUT: &str = "data_1ABC\n_entry.id 1ABC\nloop_\n_atom_site.id\n_atom_site.type_symbol\n1 N\n2 C\n";

#[test]
fn serializes_as_nested_ordered_maps() {
    let container = parse_str(INPUT).unwrap();
    let value = serde_json::to_value(&container).unwrap();
    assert_eq!(
        value,
        json!({
            "1ABC": {
                "_entry": { "id": ["1ABC"] },
                "_atom_site": { "id": ["1", "2"], "type_symbol": ["N", "C"] }
            }
        })
    );
    let text = serde_json::to_string(&container).unwrap();
    assert!(text.find("_entry").unwrap() < text.find("_atom_site").unwrap());
}

#[test]
fn deserializes_back_into_an_equal_container() {
    let container = parse_str(INPUT).unwrap();
    let text = serde_json::to_string(&container).unwrap();
    let restored: Container = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, container);
    assert_eq!(restored.origin(), Origin::Built);
    assert_eq!(
        restored["1ABC"]
            .category_names()
            .collect::<Vec<_>>(),
        vec!["_entry", "_atom_site"]
    );
}

#[test]
fn mismatched_columns_are_rejected() {
    let text = r#"{"x": {"_a": {"id": ["1", "2"], "name": ["only"]}}}"#;
    let err = serde_json::from_str::<Container>(text).expect_err("length mismatch");
    assert!(err.to_string().contains("invalid state"));
}

#[test]
fn names_that_cannot_be_written_are_rejected() {
    for text in [
        r#"{"my block": {"_a": {"id": ["1"]}}}"#,
        r#"{"x": {"_a.b": {"id": ["1"]}}}"#,
        r#"{"x": {"_a": {"has space": ["1"]}}}"#,
    ] {
        let err = serde_json::from_str::<Container>(text).expect_err(text);
        assert!(err.to_string().contains("invalid state"), "{err}");
    }
}
