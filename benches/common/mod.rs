#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

use test_support::{CaseClass, load_cases};
use vanction::ast::Program;
use vanction::parser;

/// Runtime-success fixtures that opt into benchmarking, as `(label, path)`.
pub fn workloads() -> Vec<(String, PathBuf)> {
    load_cases(Path::new("tests/programs"))
        .expect("load fixture cases")
        .into_iter()
        .filter(|case| case.spec.bench.enabled && case.spec.class == CaseClass::RuntimeSuccess)
        .map(|case| (case.name, case.program_path))
        .collect()
}

pub fn load_source(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

pub fn load_program(path: &Path) -> Program {
    let source = load_source(path);
    parser::parse(&source).unwrap_or_else(|err| panic!("parse {}: {err}", path.display()))
}
