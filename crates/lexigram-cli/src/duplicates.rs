//! `duplicates` subcommand (§4.10): a pure, explicit-path reimplementation of
//! the host's duplicate-function scan. Grounded in
//! `get_list_of_duplicate_functions_in_project`, which the design flags as
//! relying on module-level globals and a hard-coded path; this version takes
//! the project root as an argument and returns a value, with no hidden
//! state. It is not part of the n-gram pipeline and carries no invariant
//! from the data model or testable-properties sections.

use std::path::Path;

use rustc_hash::FxHashMap;

use lexigram_resolver::{discover_project_files, preprocess_project};

/// A function name declared as a top-level function in more than one module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateFunctionGroup {
    pub function_name: String,
    pub modules: Vec<String>,
}

/// Walks `project_root` (reusing the same directory walker and exclude list
/// as the rest of the pipeline, via [`discover_project_files`]), runs a
/// preprocessing pass to collect every top-level function name per module,
/// and groups module paths by function name where more than one module
/// declares the same name.
#[must_use]
pub fn find_duplicate_functions(project_root: &Path) -> Vec<DuplicateFunctionGroup> {
    let files = discover_project_files(project_root);
    let project_name = project_root.file_name().and_then(|n| n.to_str()).unwrap_or("project");
    let cache = preprocess_project(project_name, &files);

    let mut modules_by_function: FxHashMap<String, Vec<String>> = FxHashMap::default();
    for module_path in cache.module_paths() {
        let Some(file_cache) = cache.get_file_cache(module_path) else {
            continue;
        };
        for function_name in file_cache.function_names() {
            modules_by_function.entry(function_name.to_string()).or_default().push(module_path.to_string());
        }
    }

    let mut groups: Vec<DuplicateFunctionGroup> = modules_by_function
        .into_iter()
        .filter(|(_, modules)| modules.len() > 1)
        .map(|(function_name, mut modules)| {
            modules.sort();
            DuplicateFunctionGroup { function_name, modules }
        })
        .collect();
    groups.sort_by(|a, b| a.function_name.cmp(&b.function_name));
    groups
}

/// Renders the groups as a small deterministic text listing.
#[must_use]
pub fn render_duplicate_report(groups: &[DuplicateFunctionGroup]) -> String {
    if groups.is_empty() {
        return "No duplicate top-level functions found.\n".to_string();
    }
    let mut out = String::new();
    for group in groups {
        out.push_str(&format!("{} is declared in {} modules:\n", group.function_name, group.modules.len()));
        for module in &group.modules {
            out.push_str(&format!("  {module}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn function_declared_in_two_modules_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.py"), "def helper():\n    pass\n").unwrap();
        fs::write(root.join("b.py"), "def helper():\n    pass\n").unwrap();
        fs::write(root.join("c.py"), "def unique():\n    pass\n").unwrap();

        let groups = find_duplicate_functions(&root);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].function_name, "helper");
        assert_eq!(groups[0].modules.len(), 2);
    }

    #[test]
    fn no_duplicates_renders_empty_message() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.py"), "def only_here():\n    pass\n").unwrap();

        let groups = find_duplicate_functions(&root);
        assert!(groups.is_empty());
        assert_eq!(render_duplicate_report(&groups), "No duplicate top-level functions found.\n");
    }
}
