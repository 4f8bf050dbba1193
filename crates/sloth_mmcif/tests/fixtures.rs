use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use sloth_mmcif::{
    parse_file, parse_file_with_options, Container, ErrorKind, ParserOptions, Validation,
    ValidatorRegistry,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn plain() -> Container {
    parse_file(fixture("1abc_fragment.cif")).expect("fixture parses")
}

#[test]
fn fixture_structure() {
    let container = plain();
    assert_eq!(container.block_names().collect::<Vec<_>>(), vec!["1ABC", "2XYZ"]);

    let block = container.block("1ABC").unwrap();
    assert_eq!(
        block.category_names().collect::<Vec<_>>(),
        vec!["_entry", "_struct", "_database_2", "_cell", "_atom_site", "_exptl"]
    );
    assert_eq!(
        block.tag("_struct.title").unwrap(),
        ["Crystal structure of a demo\nprotein at 1.8 A resolution"]
    );
    assert_eq!(block.tag("_struct.pdbx_descriptor").unwrap(), ["DEMO PROTEIN"]);
    assert_eq!(block.tag("_exptl.details").unwrap(), ["it's a demo"]);
    assert_eq!(block.tag("_cell.angle_beta").unwrap(), ["105.34"]);

    let atoms = block.category("_atom_site").unwrap();
    assert_eq!(atoms.row_count(), 5);
    assert_eq!(atoms.len(), 11);
    let water = atoms.row(-1).unwrap();
    assert_eq!(water.get("group_PDB").unwrap(), "HETATM");
    assert_eq!(water.get("label_atom_id").unwrap(), "O5'");
    assert_eq!(water.get("label_alt_id").unwrap(), ".");
    assert_eq!(water.get("pdbx_PDB_ins_code").unwrap(), "?");

    let second = container.block_by_header("data_2XYZ").unwrap();
    assert_eq!(second.name(), "2XYZ");
    assert_eq!(second["_struct_keywords"]["text"], ["HYDROLASE"]);
}

#[test]
fn gzip_fixture_matches_plain() {
    let gz = parse_file(fixture("1abc_fragment.cif.gz")).expect("gzip fixture parses");
    assert_eq!(gz, plain());
}

#[test]
fn deferred_file_parse_matches_eager() {
    let options = ParserOptions::default().with_deferred(true);
    let mut deferred = parse_file_with_options(fixture("1abc_fragment.cif"), &options).unwrap();
    {
        let atoms = deferred["1ABC"].category("_atom_site").unwrap();
        assert!(!atoms.is_loaded("Cartn_x").unwrap());
        assert_eq!(atoms.values("Cartn_x").unwrap()[0], "12.345");
        assert!(atoms.is_loaded("Cartn_x").unwrap());
    }
    deferred.clear_caches();
    assert!(!deferred["1ABC"]["_atom_site"].is_loaded("Cartn_x").unwrap());
    assert_eq!(deferred, plain());
}

#[test]
fn selective_parse_equals_full_parse() {
    let full = plain();
    let selection = ["_atom_site", "cell"];
    let options = ParserOptions::default().with_categories(selection);
    let selected = parse_file_with_options(fixture("1abc_fragment.cif"), &options).unwrap();

    let block = selected.block("1ABC").unwrap();
    assert_eq!(
        block.category_names().collect::<Vec<_>>(),
        vec!["_cell", "_atom_site"]
    );
    for name in ["_atom_site", "_cell"] {
        assert_eq!(block.category(name).unwrap(), full["1ABC"].category(name).unwrap());
    }
    assert!(selected.block("2XYZ").unwrap().is_empty());
}

#[test]
fn database_id_assignment_by_negative_index() {
    let mut container = plain();
    let database = container
        .block_mut("1ABC")
        .unwrap()
        .category_mut("_database_2")
        .unwrap();
    database.set_value("database_id", -1, "NEWDB").unwrap();
    assert_eq!(database["database_id"], ["PDB", "WWPDB", "NEWDB"]);
    assert_eq!(database.values("database_code").unwrap().len(), 3);
    assert_eq!(database.row_count(), 3);
}

#[test]
fn validators_run_through_the_block() {
    let container = plain();
    let block = container.block("1ABC").unwrap();
    let mut registry = ValidatorRegistry::new();
    registry
        .register_validator("_cell", |cell| {
            cell.values("length_a")
                .map_err(|err| err.to_string())?
                .iter()
                .all(|value| value.parse::<f64>().is_ok())
                .then_some(())
                .ok_or_else(|| "length_a is not numeric".to_string())
        })
        .register_cross_checker(("_atom_site", "_entry"), |atoms, entry| {
            if entry.row_count() == 1 && atoms.row_count() > 0 {
                Ok(())
            } else {
                Err("expected one entry and some atoms".to_string())
            }
        });

    assert_eq!(block.validate("_cell", &registry).unwrap(), Validation::Passed);
    assert_eq!(block.validate("_exptl", &registry).unwrap(), Validation::Unregistered);
    assert_eq!(
        block.cross_check("_atom_site", "_entry", &registry).unwrap(),
        Validation::Passed
    );
    let err = block
        .cross_check("_atom_site", "_missing", &registry)
        .expect_err("missing category");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn missing_fixture_reports_path() {
    let path = fixture("does_not_exist.cif");
    let err = parse_file(&path).expect_err("missing file");
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.path(), Some(path.as_path()));
}
