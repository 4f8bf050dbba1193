use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use sloth_mmcif::{
    parse_file, parse_str, write, write_file, write_with_options, Container, ContainerBuilder,
    ErrorKind, WriterOptions,
};

fn fixture_text() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/1abc_fragment.cif");
    fs::read_to_string(path).expect("fixture readable")
}

fn assert_same_model(left: &Container, right: &Container) {
    assert_eq!(
        left.block_names().collect::<Vec<_>>(),
        right.block_names().collect::<Vec<_>>()
    );
    for (a, b) in left.blocks().zip(right.blocks()) {
        assert_eq!(
            a.category_names().collect::<Vec<_>>(),
            b.category_names().collect::<Vec<_>>()
        );
        for (x, y) in a.categories().zip(b.categories()) {
            assert_eq!(x.to_map(), y.to_map(), "category {}", x.name());
        }
    }
}

#[test]
fn parse_write_parse_preserves_the_model() {
    let original = parse_str(&fixture_text()).unwrap();
    let written = write(&original).unwrap();
    let reparsed = parse_str(&written).unwrap();
    assert_same_model(&original, &reparsed);
}

#[test]
fn writing_is_idempotent() {
    let first = write(&parse_str(&fixture_text()).unwrap()).unwrap();
    let second = write(&parse_str(&first).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn every_option_combination_round_trips() {
    let original = parse_str(&fixture_text()).unwrap();
    for bits in 0..8u8 {
        let options = WriterOptions {
            align_pairs: bits & 1 != 0,
            align_loops: bits & 2 != 0,
            separators: bits & 4 != 0,
        };
        let text = write_with_options(&original, &options).unwrap();
        assert_same_model(&original, &parse_str(&text).unwrap());
    }
}

#[test]
fn placeholders_survive_unchanged() {
    let input = "data_x\nloop_\n_a.id\n_a.alt\n_a.code\n1 . ?\n2 A ?\n";
    let text = write(&parse_str(input).unwrap()).unwrap();
    assert!(text.contains("1 . ?\n"));
    let reparsed = parse_str(&text).unwrap();
    assert_eq!(reparsed["x"]["_a"]["alt"], [".", "A"]);
    assert_eq!(reparsed["x"]["_a"]["code"], ["?", "?"]);
}

#[test]
fn quote_ambiguity() {
    let container = parse_str("data_x\n_a.first it's\n_a.second 'contains space'\n").unwrap();
    assert_eq!(container.lookup("x", "_a.first").unwrap(), ["it's"]);
    assert_eq!(container.lookup("x", "_a.second").unwrap(), ["contains space"]);
    let text = write(&container).unwrap();
    assert!(text.contains("_a.first  it's\n"));
    assert!(text.contains("_a.second 'contains space'\n"));
}

#[test]
fn mutated_model_writes_new_values() {
    let mut container = parse_str(&fixture_text()).unwrap();
    {
        let atoms = container
            .block_mut("1ABC")
            .unwrap()
            .category_mut("_atom_site")
            .unwrap();
        atoms.row_mut(0).unwrap().set("Cartn_x", "0.000").unwrap();
        let err = atoms
            .set_item("Cartn_y", vec!["1.0".into()])
            .expect_err("length mismatch");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        atoms.remove_item("pdbx_PDB_ins_code");
    }
    let reparsed = parse_str(&write(&container).unwrap()).unwrap();
    let atoms = &reparsed["1ABC"]["_atom_site"];
    assert_eq!(atoms["Cartn_x"][0], "0.000");
    assert!(!atoms.contains("pdbx_PDB_ins_code"));
    assert_eq!(atoms.row_count(), 5);
}

#[test]
fn gzip_output_reads_back() {
    let mut builder = ContainerBuilder::new();
    builder
        .block("1ABC")
        .unwrap()
        .tag("_entry.id", "1ABC")
        .unwrap();
    builder
        .block("1ABC")
        .unwrap()
        .category("_atom_site")
        .unwrap()
        .columns(["id", "type_symbol"])
        .unwrap()
        .row(["1", "N"])
        .unwrap()
        .row(["2", "C"])
        .unwrap();
    let container = builder.finish().unwrap();

    let dir = std::env::temp_dir().join(format!("sloth_mmcif_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    for name in ["out.cif", "out.cif.gz"] {
        let path = dir.join(name);
        write_file(&path, &container, &WriterOptions::default()).unwrap();
        assert_eq!(parse_file(&path).unwrap(), container, "{name}");
    }
    let raw = fs::read(dir.join("out.cif.gz")).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn prefixed_block_names_round_trip() {
    let input = "data_data_x\n_a.b 1\n\ndata_x\n_a.b 2\n";
    let container = parse_str(input).unwrap();
    assert_eq!(container.block_names().collect::<Vec<_>>(), vec!["data_x", "x"]);
    let text = write(&container).unwrap();
    assert!(text.starts_with("data_data_x\n"));
    assert!(text.contains("\ndata_x\n"));
    assert_eq!(parse_str(&text).unwrap(), container);
}

#[test]
fn crlf_text_fields_round_trip_and_trailing_cr_is_refused() {
    let container = parse_str("data_x\r\n_a.b\r\n;one\r\ntwo\r\n;\r\n").unwrap();
    assert_eq!(container.lookup("x", "_a.b").unwrap(), ["one\r\ntwo"]);
    assert_eq!(parse_str(&write(&container).unwrap()).unwrap(), container);

    let mut builder = ContainerBuilder::new();
    builder
        .block("x")
        .unwrap()
        .tag("_a.b", "one\ntwo\r")
        .unwrap();
    let err = write(&builder.finish().unwrap()).expect_err("trailing carriage return");
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn names_that_would_not_read_back_are_refused() {
    let mut builder = ContainerBuilder::new();
    assert_eq!(
        builder.block("two words").err().map(|err| err.kind()),
        Some(ErrorKind::InvalidState)
    );
    let mut block = builder.block("x").unwrap();
    assert_eq!(
        block.category("_a.b").err().map(|err| err.kind()),
        Some(ErrorKind::InvalidState)
    );
    assert!(block.tag("_a.two words", "1").is_err());
    assert!(builder.container().block("x").unwrap().is_empty());
}
