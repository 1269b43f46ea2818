//! Whole passes over crates laid out in temporary directories.

#![allow(clippy::expect_used, reason = "tests should panic on unexpected values")]

use std::fs;
use std::path::{Path, PathBuf};

use buildergen_codegen::{Config, Error, HEADER, PassReport, Severity};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    src:  PathBuf,
    out:  PathBuf,
}

impl Fixture {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        for (name, text) in files {
            let path = src.join(name);
            fs::create_dir_all(path.parent().expect("file has a parent")).expect("create module dir");
            fs::write(path, text).expect("write source");
        }
        Self { _dir: dir, src, out }
    }

    fn config(&self) -> Config { Config::new().source_root(&self.src).out_dir(&self.out) }

    fn run(&self) -> PassReport { self.config().generate().expect("pass succeeds") }

    fn builder(&self, unit: &str) -> PathBuf { self.out.join("buildergen").join(format!("{unit}.rs")) }
}

fn messages(report: &PassReport, severity: Severity) -> Vec<&str> {
    report
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == severity)
        .map(|diagnostic| diagnostic.message.as_str())
        .collect()
}

fn read(path: &Path) -> String { fs::read_to_string(path).expect("generated file") }

const LIB: &str = r#"
    mod account;

    #[derive(Builder)]
    pub struct Pair {
        pub a: String,
        pub b: Option<String>,
    }

    #[buildergen::builder_of(target = crate::account::Account, suffix = "Factory", use_constructors = true)]
    pub struct ForAccount;
"#;

const ACCOUNT: &str = r#"
    pub struct Account {
        id: u64,
        owner: String,
    }

    impl Account {
        #[buildergen::builder]
        pub fn open(owner: String, id: u64) -> Self {
            Self { id, owner }
        }

        pub fn id(&self) -> u64 { self.id }
    }
"#;

#[test]
fn writes_a_file_per_directive() {
    let fixture = Fixture::new(&[("lib.rs", LIB), ("account.rs", ACCOUNT)]);
    let report = fixture.run();

    assert!(!report.has_errors(), "{:?}", report.diagnostics);
    assert_eq!(
        report.written,
        [
            fixture.builder("AccountBuilder"),
            fixture.builder("PairBuilder"),
            fixture.builder("AccountFactory"),
        ]
    );

    let pair = read(&fixture.builder("PairBuilder"));
    assert!(pair.starts_with(HEADER));
    assert!(pair.contains("pub struct PairBuilder"));
    assert!(pair.contains("fn builder ()"));

    let factory = read(&fixture.builder("AccountFactory"));
    assert!(factory.contains("crate :: account :: Account :: open (owner , id)"));
    assert!(!factory.contains("fn builder ()"));
}

#[test]
fn passes_are_deterministic() {
    let fixture = Fixture::new(&[("lib.rs", LIB), ("account.rs", ACCOUNT)]);
    fixture.run();
    let first: Vec<String> = ["PairBuilder", "AccountBuilder", "AccountFactory"]
        .iter()
        .map(|unit| read(&fixture.builder(unit)))
        .collect();

    fixture.run();
    let second: Vec<String> = ["PairBuilder", "AccountBuilder", "AccountFactory"]
        .iter()
        .map(|unit| read(&fixture.builder(unit)))
        .collect();

    assert_eq!(first, second);
}

#[test]
fn crate_without_directives_needs_no_output_directory() {
    let fixture = Fixture::new(&[("lib.rs", "pub struct Plain { pub a: u8 }")]);
    let report = Config::new()
        .source_root(&fixture.src)
        .generate()
        .expect("nothing to write");

    assert!(report.written.is_empty());
    assert!(!fixture.out.exists());
}

#[test]
fn missing_output_directory_is_fatal() {
    let fixture = Fixture::new(&[("lib.rs", LIB), ("account.rs", ACCOUNT)]);
    let error = Config::new()
        .source_root(&fixture.src)
        .generate()
        .expect_err("directives need somewhere to go");

    assert!(matches!(error.current_context(), Error::MissingOutputDirectory));
}

#[test]
fn missing_source_root_is_fatal() {
    let fixture = Fixture::new(&[]);
    let error = fixture.config().generate().expect_err("no src directory");
    assert!(matches!(error.current_context(), Error::SourceRoot { .. }));
}

#[test]
fn rejected_directives_write_nothing() {
    let fixture = Fixture::new(&[(
        "lib.rs",
        r"
            #[derive(Builder)]
            pub enum Color { Red }

            #[buildergen::builder_of(target = crate::Nowhere)]
            pub struct ForNowhere;

            #[derive(Builder)]
            pub struct Kept { pub a: u8 }
        ",
    )]);
    let report = fixture.run();

    assert_eq!(report.written, [fixture.builder("KeptBuilder")]);
    assert_eq!(messages(&report, Severity::Error).len(), 2);
    assert!(!fixture.builder("ColorBuilder").exists());
    assert!(!fixture.builder("NowhereBuilder").exists());
}

#[test]
fn misapplied_modifier_still_writes_the_builder() {
    let fixture = Fixture::new(&[(
        "lib.rs",
        r"
            #[derive(Builder)]
            pub struct Tags {
                #[builder(mutable)]
                pub names: Vec<String>,
            }
        ",
    )]);
    let report = fixture.run();

    let errors = messages(&report, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("`mutable` applies only to read-only collections"));
    assert!(read(&fixture.builder("TagsBuilder")).contains("names : Option < Vec < String > >"));
}

#[test]
fn later_directive_replaces_earlier_unit_of_the_same_name() {
    let fixture = Fixture::new(&[
        ("lib.rs", "mod markers; #[derive(Builder)] pub struct Pair { pub a: u8 }"),
        (
            "markers.rs",
            "#[buildergen::builder_of(target = crate::Pair)] pub struct ForPair;",
        ),
    ]);
    let report = fixture.run();

    assert!(!report.has_errors(), "{:?}", report.diagnostics);
    assert_eq!(report.written, [fixture.builder("PairBuilder"), fixture.builder("PairBuilder")]);
    let notes = messages(&report, Severity::Note);
    assert!(notes.iter().any(|note| note.contains("`PairBuilder` replaces the builder")));
    assert!(!read(&fixture.builder("PairBuilder")).contains("fn builder ()"));
}

#[test]
fn same_unit_twice_in_one_module_is_an_error() {
    let fixture = Fixture::new(&[(
        "lib.rs",
        r"
            #[derive(Builder)]
            pub struct Pair { pub a: u8 }

            #[buildergen::builder_of(target = Pair)]
            pub struct ForPair;
        ",
    )]);
    let report = fixture.run();

    let errors = messages(&report, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("would be defined twice"));
}

#[test]
fn abandoned_builders_do_not_outlive_their_directive() {
    let fixture = Fixture::new(&[("lib.rs", "#[derive(Builder)] pub struct Pair { pub a: u8 }")]);
    fixture.run();
    assert!(fixture.builder("PairBuilder").exists());

    let lib = fixture.src.join("lib.rs");
    fs::write(&lib, "#[derive(Builder)] pub struct Pair { pub a: u8, pub build: u8 }").expect("edit source");
    let report = fixture.run();

    assert!(messages(&report, Severity::Error)[0].contains("field `build` collides"));
    assert!(report.written.is_empty());
    assert_eq!(report.removed, [fixture.builder("PairBuilder")]);
    assert!(!fixture.builder("PairBuilder").exists());

    fs::write(&lib, "pub struct Pair { pub a: u8 }").expect("drop the directive");
    fs::write(fixture.builder("OrphanBuilder"), "").expect("leftover file");
    let report = fixture.run();

    assert_eq!(report.removed, [fixture.builder("OrphanBuilder")]);
}

#[test]
fn nested_modules_resolve_crate_paths() {
    let fixture = Fixture::new(&[
        ("lib.rs", "mod shapes; mod markers;"),
        ("shapes/mod.rs", "pub mod point;"),
        ("shapes/point.rs", "pub struct Point { pub x: i32, pub y: i32 }"),
        (
            "markers.rs",
            "#[buildergen::builder_of(target = crate::shapes::point::Point, suffix = \"Maker\")] pub struct ForPoint;",
        ),
    ]);
    let report = fixture.run();

    assert!(!report.has_errors(), "{:?}", report.diagnostics);
    assert_eq!(report.written, [fixture.builder("PointMaker")]);
}
