use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::debug;

use crate::ast::{Declaration, Program};
use crate::parser::{ParseError, parse};

/// File extension of Vanction source modules.
pub const MODULE_EXTENSION: &str = "vn";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Module '{name}' not found (searched: {})", .searched.join(", "))]
    NotFound { name: String, searched: Vec<String> },
    #[error("Circular import of '{name}': {chain}")]
    CircularDependency { name: String, chain: String },
    #[error("Reading module {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
    #[error("In module {}: {error}", .path.display())]
    Parse { path: PathBuf, error: ParseError },
}

/// Turns an import name into a parsed module.
pub trait ModuleResolver {
    fn resolve(&mut self, name: &str) -> Result<Rc<Program>, ResolveError>;
}

/// Resolves `a.b` to `<root>/a/b.vn`, trying each root in order.
///
/// Modules are parsed once. A module's own imports are resolved before it
/// is cached, so an import cycle is reported the moment it closes.
#[derive(Debug, Default)]
pub struct SearchPathResolver {
    roots: Vec<PathBuf>,
    cache: FxHashMap<String, Rc<Program>>,
    in_progress: Vec<String>,
}

impl SearchPathResolver {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
            ..Self::default()
        }
    }

    fn locate(&self, name: &str) -> Result<PathBuf, ResolveError> {
        let relative = module_path(name);
        let candidates: Vec<PathBuf> = self.roots.iter().map(|root| root.join(&relative)).collect();
        candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .cloned()
            .ok_or_else(|| ResolveError::NotFound {
                name: name.to_string(),
                searched: candidates
                    .iter()
                    .map(|candidate| candidate.display().to_string())
                    .collect(),
            })
    }

    fn load(&mut self, name: &str) -> Result<Rc<Program>, ResolveError> {
        let path = self.locate(name)?;
        let source = fs::read_to_string(&path).map_err(|error| ResolveError::Io {
            path: path.clone(),
            message: error.to_string(),
        })?;
        let program = parse(&source).map_err(|error| ResolveError::Parse {
            path: path.clone(),
            error,
        })?;
        for import in program.imports() {
            self.resolve(import)?;
        }
        debug!(module = name, path = %path.display(), "resolved module");
        Ok(Rc::new(program))
    }
}

impl ModuleResolver for SearchPathResolver {
    fn resolve(&mut self, name: &str) -> Result<Rc<Program>, ResolveError> {
        if let Some(program) = self.cache.get(name) {
            return Ok(Rc::clone(program));
        }
        if self.in_progress.iter().any(|pending| pending == name) {
            let mut chain = self.in_progress.clone();
            chain.push(name.to_string());
            return Err(ResolveError::CircularDependency {
                name: name.to_string(),
                chain: chain.join(" -> "),
            });
        }

        self.in_progress.push(name.to_string());
        let loaded = self.load(name);
        self.in_progress.pop();

        let program = loaded?;
        self.cache.insert(name.to_string(), Rc::clone(&program));
        Ok(program)
    }
}

/// `a.b.c` -> `a/b/c.vn`
pub fn module_path(name: &str) -> PathBuf {
    let mut path: PathBuf = name.split('.').collect();
    path.set_extension(MODULE_EXTENSION);
    path
}

/// Flattens `program` and everything it imports into a single program.
///
/// Imported declarations come first, dependencies before dependents, each
/// module at most once. `import` declarations are dropped.
pub fn link(program: &Program, resolver: &mut dyn ModuleResolver) -> Result<Program, ResolveError> {
    let mut declarations = Vec::new();
    let mut visited = FxHashSet::default();
    for name in program.imports() {
        append_module(name, resolver, &mut visited, &mut declarations)?;
    }
    declarations.extend(own_declarations(program));
    Ok(Program { declarations })
}

fn append_module(
    name: &str,
    resolver: &mut dyn ModuleResolver,
    visited: &mut FxHashSet<String>,
    declarations: &mut Vec<Declaration>,
) -> Result<(), ResolveError> {
    if !visited.insert(name.to_string()) {
        return Ok(());
    }
    let module = resolver.resolve(name)?;
    for import in module.imports() {
        append_module(import, resolver, visited, declarations)?;
    }
    declarations.extend(own_declarations(&module));
    Ok(())
}

fn own_declarations(program: &Program) -> impl Iterator<Item = Declaration> + '_ {
    program
        .declarations
        .iter()
        .filter(|declaration| !matches!(declaration, Declaration::Import(_)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FunctionDeclaration;
    use indoc::indoc;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_module(root: &Path, relative: &str, source: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create module dir");
        }
        fs::write(path, source).expect("write module");
    }

    fn function_names(program: &Program) -> Vec<&str> {
        program
            .declarations
            .iter()
            .filter_map(|declaration| match declaration {
                Declaration::Function(FunctionDeclaration { name, .. }) => Some(name.as_str()),
                Declaration::Namespace(namespace) => Some(namespace.name.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn maps_dotted_names_to_nested_files() {
        assert_eq!(module_path("util"), PathBuf::from("util.vn"));
        assert_eq!(module_path("std.text.io"), PathBuf::from("std/text/io.vn"));
    }

    #[test]
    fn links_imports_in_dependency_order() {
        let root = TempDir::new().expect("tempdir");
        write_module(root.path(), "base.vn", "func base_helper() { }");
        write_module(
            root.path(),
            "util/strings.vn",
            indoc! {"
                import base;
                func shout() { }
            "},
        );
        write_module(
            root.path(),
            "util/numbers.vn",
            indoc! {"
                import base;
                namespace numbers { func twice() { } }
            "},
        );
        let program = parse(indoc! {"
            import util.strings;
            import util.numbers;
            func main() { }
        "})
        .expect("parse failed");

        let mut resolver = SearchPathResolver::new([root.path().to_path_buf()]);
        let linked = link(&program, &mut resolver).expect("link failed");

        assert_eq!(
            function_names(&linked),
            vec!["base_helper", "shout", "numbers", "main"]
        );
        assert_eq!(linked.imports().count(), 0);
    }

    #[test]
    fn later_roots_are_searched_after_earlier_ones() {
        let first = TempDir::new().expect("tempdir");
        let second = TempDir::new().expect("tempdir");
        write_module(first.path(), "shared.vn", "func from_first() { }");
        write_module(second.path(), "shared.vn", "func from_second() { }");
        write_module(second.path(), "extra.vn", "func only_second() { }");

        let mut resolver =
            SearchPathResolver::new([first.path().to_path_buf(), second.path().to_path_buf()]);

        let shared = resolver.resolve("shared").expect("resolve shared");
        assert_eq!(function_names(&shared), vec!["from_first"]);
        let extra = resolver.resolve("extra").expect("resolve extra");
        assert_eq!(function_names(&extra), vec!["only_second"]);
    }

    #[test]
    fn caches_resolved_modules() {
        let root = TempDir::new().expect("tempdir");
        write_module(root.path(), "once.vn", "func once() { }");
        let mut resolver = SearchPathResolver::new([root.path().to_path_buf()]);

        let first = resolver.resolve("once").expect("first resolve");
        fs::remove_file(root.path().join("once.vn")).expect("remove module");
        let second = resolver.resolve("once").expect("cached resolve");

        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn reports_missing_modules_with_search_locations() {
        let root = TempDir::new().expect("tempdir");
        let mut resolver = SearchPathResolver::new([root.path().to_path_buf()]);

        let error = resolver.resolve("missing.part").expect_err("expected failure");

        assert_eq!(
            error,
            ResolveError::NotFound {
                name: "missing.part".to_string(),
                searched: vec![root.path().join("missing/part.vn").display().to_string()],
            }
        );
    }

    #[test]
    fn detects_circular_imports() {
        let root = TempDir::new().expect("tempdir");
        write_module(root.path(), "a.vn", "import b;\nfunc a() { }");
        write_module(root.path(), "b.vn", "import c;\nfunc b() { }");
        write_module(root.path(), "c.vn", "import a;\nfunc c() { }");
        let mut resolver = SearchPathResolver::new([root.path().to_path_buf()]);

        let error = resolver.resolve("a").expect_err("expected cycle");

        assert_eq!(
            error,
            ResolveError::CircularDependency {
                name: "a".to_string(),
                chain: "a -> b -> c -> a".to_string(),
            }
        );
    }

    #[test]
    fn wraps_parse_failures_with_the_module_path() {
        let root = TempDir::new().expect("tempdir");
        write_module(root.path(), "broken.vn", "int x = 1;");
        let mut resolver = SearchPathResolver::new([root.path().to_path_buf()]);

        let error = resolver.resolve("broken").expect_err("expected parse failure");

        let ResolveError::Parse { path, error } = error else {
            panic!("expected parse error, got {error:?}");
        };
        assert_eq!(path, root.path().join("broken.vn"));
        assert_eq!(error.category(), "SyntaxError");
    }
}
