//! [`TypePreprocessor`]: walks a project, parses every source file once, and
//! builds the [`ProjectTypeCache`] used by later typed-tokenization passes.
//!
//! Corrected relative to the original: files are keyed by dotted module path
//! (`pkg/sub/mod.py` -> `pkg.sub.mod`) rather than by raw filesystem path, so
//! [`ProjectTypeCache::find_module_for_function`] and friends can actually
//! match imports against declarations.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rustpython_ast::{Mod, Stmt, StmtClassDef, StmtFunctionDef};
use rustpython_parser::{parse, Mode};
use tracing::{debug, error};
use walkdir::WalkDir;

use lexigram_common::limits::DEFAULT_EXCLUDE_DIRS;

use crate::annotation::type_info_from_annotation;
use crate::import_cache::ImportCache;
use crate::type_cache::{ClassCache, FileCache, ProjectTypeCache};

/// A parsed source file paired with the dotted module path it resolves to.
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub module_path: String,
}

/// Returns every `*.py` file under `root`, skipping [`DEFAULT_EXCLUDE_DIRS`],
/// alongside its dotted module path relative to `root`'s parent.
#[must_use]
pub fn discover_project_files(root: &Path) -> Vec<DiscoveredFile> {
    let mut out = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if !entry.file_type().is_dir() {
            return true;
        }
        entry
            .file_name()
            .to_str()
            .is_none_or(|name| !DEFAULT_EXCLUDE_DIRS.contains(&name))
    });

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        let Some(module_path) = dotted_module_path(root, path) else {
            continue;
        };
        out.push(DiscoveredFile {
            path: path.to_path_buf(),
            module_path,
        });
    }
    out
}

/// `pkg/sub/mod.py` rooted at `root`'s parent -> `pkg.sub.mod`.
fn dotted_module_path(root: &Path, file: &Path) -> Option<String> {
    let project_name = root.file_name()?.to_str()?;
    let relative = file.strip_prefix(root).ok()?;
    let without_ext = relative.with_extension("");
    let mut parts = vec![project_name.to_string()];
    for component in without_ext.components() {
        parts.push(component.as_os_str().to_str()?.to_string());
    }
    Some(parts.join("."))
}

/// Parses the whole project and returns the populated cache plus the list of
/// discovered files (reused by the tokenization pass so it doesn't need to
/// walk the directory a second time).
#[must_use]
pub fn preprocess_project(project_name: &str, files: &[DiscoveredFile]) -> ProjectTypeCache {
    let available_modules: Vec<String> = files.iter().map(|f| f.module_path.clone()).collect();

    let per_file: Vec<Option<(String, FileCache)>> = files
        .par_iter()
        .map(|file| process_file(file, &available_modules))
        .collect();

    let mut cache = ProjectTypeCache::new(project_name);
    for entry in per_file.into_iter().flatten() {
        let (module_path, file_cache) = entry;
        cache.add_file_cache(module_path, file_cache);
    }
    cache
}

fn process_file(file: &DiscoveredFile, available_modules: &[String]) -> Option<(String, FileCache)> {
    debug!(path = %file.path.display(), "preprocessing");
    let source = match fs::read_to_string(&file.path) {
        Ok(source) => source,
        Err(err) => {
            error!(path = %file.path.display(), error = %err, "could not read file");
            return None;
        }
    };

    let module = match parse(&source, Mode::Module, file.path.to_str().unwrap_or_default()) {
        Ok(module) => module,
        Err(err) => {
            error!(path = %file.path.display(), error = %err, "could not preprocess file");
            return None;
        }
    };
    let Mod::Module(module) = module else {
        error!(path = %file.path.display(), "expected a module, got an expression");
        return None;
    };

    let mut file_cache = FileCache::new(file.module_path.clone());
    let mut import_cache = ImportCache::new(file.module_path.clone(), available_modules);

    for stmt in &module.body {
        search_stmt(stmt, &mut file_cache, &mut import_cache, available_modules);
    }
    file_cache.set_import_cache(import_cache);

    Some((file.module_path.clone(), file_cache))
}

fn search_stmt(stmt: &Stmt, cache: &mut FileCache, imports: &mut ImportCache, available_modules: &[String]) {
    match stmt {
        Stmt::ClassDef(class_def) => {
            for class_cache in process_class(class_def, "") {
                cache.add_class(class_cache);
            }
        }
        Stmt::FunctionDef(def) => {
            let (name, return_type) = process_function(def);
            cache.add_function(name, return_type);
        }
        Stmt::AsyncFunctionDef(def) => {
            let (name, return_type) = process_async_function(def);
            cache.add_function(name, return_type);
        }
        Stmt::ImportFrom(node) => {
            let names: Vec<(String, Option<String>)> = node
                .names
                .iter()
                .map(|alias| (alias.name.to_string(), alias.asname.as_ref().map(ToString::to_string)))
                .collect();
            imports.add_import_from(
                node.module.as_deref().map(|m| m.as_str()),
                node.level.and_then(|l| l.to_usize()).unwrap_or(0),
                &names,
                available_modules,
            );
        }
        Stmt::Import(node) => {
            let names: Vec<(String, Option<String>)> = node
                .names
                .iter()
                .map(|alias| (alias.name.to_string(), alias.asname.as_ref().map(ToString::to_string)))
                .collect();
            imports.add_import(&names);
        }
        _ => {}
    }
}

/// Builds the `ClassCache` for `class_def` plus, flattened, one more per
/// nested `ClassDef` in its body (§4.1: "nested classes are flattened into
/// dotted class names (`Outer.Inner`)"). `prefix` is the dotted path of all
/// enclosing classes, empty at the top level.
fn process_class(class_def: &StmtClassDef, prefix: &str) -> Vec<ClassCache> {
    let dotted_name = if prefix.is_empty() {
        class_def.name.to_string()
    } else {
        format!("{prefix}.{}", class_def.name)
    };

    let mut cache = ClassCache::new(dotted_name.clone());
    let mut flattened = Vec::new();
    for stmt in &class_def.body {
        match stmt {
            Stmt::FunctionDef(def) => {
                let (name, return_type) = process_function(def);
                cache.add_function(name, return_type);
            }
            Stmt::AsyncFunctionDef(def) => {
                let (name, return_type) = process_async_function(def);
                cache.add_function(name, return_type);
            }
            Stmt::ClassDef(nested) => flattened.extend(process_class(nested, &dotted_name)),
            _ => {}
        }
    }

    let mut result = vec![cache];
    result.extend(flattened);
    result
}

fn process_function(node: &StmtFunctionDef) -> (String, Option<lexigram_common::TypeInfo>) {
    let return_type = node.returns.as_deref().and_then(type_info_from_annotation);
    (node.name.to_string(), return_type)
}

fn process_async_function(node: &rustpython_ast::StmtAsyncFunctionDef) -> (String, Option<lexigram_common::TypeInfo>) {
    let return_type = node.returns.as_deref().and_then(type_info_from_annotation);
    (node.name.to_string(), return_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn dotted_module_path_strips_extension_and_joins_with_dots() {
        let root = Path::new("/tmp/myproj");
        let file = Path::new("/tmp/myproj/pkg/sub.py");
        assert_eq!(dotted_module_path(root, file).unwrap(), "myproj.pkg.sub");
    }

    #[test]
    fn discover_skips_excluded_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(root.join("venv")).unwrap();
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("venv").join("skip.py"), "x = 1").unwrap();
        fs::write(root.join("main.py"), "x = 1").unwrap();

        let files = discover_project_files(&root);
        assert_eq!(files.len(), 1);
        assert!(files[0].module_path.ends_with("main"));
    }

    #[test]
    fn preprocess_populates_function_return_type() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(&root).unwrap();
        let mut f = fs::File::create(root.join("mod.py")).unwrap();
        writeln!(f, "def helper() -> int:\n    return 1\n").unwrap();
        drop(f);

        let files = discover_project_files(&root);
        let cache = preprocess_project("proj", &files);
        let module_path = files[0].module_path.clone();
        let file_cache = cache.get_file_cache(&module_path).unwrap();
        assert!(file_cache.contains_function("helper"));
        assert_eq!(file_cache.get_function_return_type("helper").unwrap().label, "int");
    }

    #[test]
    fn nested_classes_flatten_into_dotted_names() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(&root).unwrap();
        let mut f = fs::File::create(root.join("mod.py")).unwrap();
        writeln!(
            f,
            "class Outer:\n    class Inner:\n        def bar(self) -> str:\n            return ''\n"
        )
        .unwrap();
        drop(f);

        let files = discover_project_files(&root);
        let cache = preprocess_project("proj", &files);
        let module_path = files[0].module_path.clone();
        let file_cache = cache.get_file_cache(&module_path).unwrap();
        assert!(file_cache.contains_type("Outer"));
        assert!(file_cache.contains_type("Outer.Inner"));
        assert!(file_cache.contains_class_function("Outer.Inner", "bar"));
    }
}
