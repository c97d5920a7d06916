//! [`ImportCache`]: per-file map from imported symbol to originating module.

use rustc_hash::FxHashMap;

/// One per source file. Holds `module -> [symbols]` and `alias -> real
/// symbol`, and resolves relative imports against the file's own dotted
/// module path.
#[derive(Clone, Debug, Default)]
pub struct ImportCache {
    module_path: String,
    module_path_parts: Vec<String>,
    /// `level - 1` in the usual sense: how many trailing components of
    /// `module_path_parts` form the file's own package prefix.
    module_level: usize,
    imports: FxHashMap<String, Vec<String>>,
    as_imports: FxHashMap<String, String>,
}

impl ImportCache {
    #[must_use]
    pub fn new(module_path: impl Into<String>, available_modules: &[String]) -> Self {
        let module_path = module_path.into();
        let parts: Vec<String> = module_path.split('.').map(str::to_owned).collect();
        let module_level = parts.len().saturating_sub(1);
        let _ = available_modules; // resolution below takes the current snapshot explicitly
        Self {
            module_path,
            module_path_parts: parts,
            module_level,
            imports: FxHashMap::default(),
            as_imports: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module_path
    }

    /// Records a `from <module> import a, b as c` statement.
    ///
    /// `level` is the number of leading dots (0 = absolute).
    pub fn add_import_from(
        &mut self,
        module: Option<&str>,
        level: usize,
        names: &[(String, Option<String>)],
        available_modules: &[String],
    ) {
        let complete_path = self.generate_complete_path(module.unwrap_or(""), level, available_modules);
        let mut classes = Vec::with_capacity(names.len());
        for (name, asname) in names {
            classes.push(name.clone());
            if let Some(asname) = asname {
                self.as_imports.insert(asname.clone(), name.clone());
            }
        }
        self.imports.insert(complete_path, classes);
    }

    /// Records a plain `import a.b.c [as d]` statement.
    pub fn add_import(&mut self, names: &[(String, Option<String>)]) {
        for (name, asname) in names {
            self.imports.insert(name.clone(), vec![name.clone()]);
            if let Some(asname) = asname {
                self.as_imports.insert(asname.clone(), name.clone());
            }
        }
    }

    /// Returns the modules that import the given (possibly aliased) name.
    ///
    /// Tries an exact match against an imported symbol first; if none is
    /// found, falls back to modules that import a symbol textually
    /// contained in `name`, so a dotted name like `helpers.Foo` still
    /// qualifies against a plain `Foo` import.
    #[must_use]
    pub fn get_module_imports_for_name(&self, name: &str) -> Vec<String> {
        let name = self.as_imports.get(name).map(String::as_str).unwrap_or(name);
        let exact: Vec<String> = self
            .imports
            .iter()
            .filter(|(_, symbols)| symbols.iter().any(|s| s == name))
            .map(|(module, _)| module.clone())
            .collect();
        if !exact.is_empty() {
            return exact;
        }
        self.imports
            .iter()
            .filter(|(_, symbols)| symbols.iter().any(|s| name.contains(s.as_str())))
            .map(|(module, _)| module.clone())
            .collect()
    }

    fn generate_complete_path(
        &self,
        module_path_postfix: &str,
        level: usize,
        available_modules: &[String],
    ) -> String {
        // level == 1: the imported module lies in the same directory as the
        // currently processed module.
        let level = if level == 1 { self.module_level } else { level };

        let prefix: String = self
            .module_path_parts
            .iter()
            .take(level)
            .map(|p| format!("{p}."))
            .collect();
        let complete_path = format!("{prefix}{module_path_postfix}");

        if available_modules.iter().any(|m| m == &complete_path) {
            complete_path
        } else {
            // not present in the project; treat as a native/external import.
            module_path_postfix.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_resolves_within_same_package() {
        let available = vec!["pkg.sibling".to_string()];
        let mut cache = ImportCache::new("pkg.mod", &available);
        cache.add_import_from(Some("sibling"), 1, &[("Foo".to_string(), None)], &available);
        assert_eq!(cache.get_module_imports_for_name("Foo"), vec!["pkg.sibling"]);
    }

    #[test]
    fn unmatched_absolute_import_is_kept_verbatim() {
        let available = vec!["pkg.mod".to_string()];
        let mut cache = ImportCache::new("pkg.mod", &available);
        cache.add_import_from(Some("os.path"), 0, &[("join".to_string(), None)], &available);
        assert_eq!(cache.get_module_imports_for_name("join"), vec!["os.path"]);
    }

    #[test]
    fn dotted_name_falls_back_to_contained_symbol() {
        let available = vec!["pkg.sibling".to_string()];
        let mut cache = ImportCache::new("pkg.mod", &available);
        cache.add_import_from(Some("sibling"), 1, &[("Foo".to_string(), None)], &available);
        assert_eq!(cache.get_module_imports_for_name("helpers.Foo"), vec!["pkg.sibling"]);
    }

    #[test]
    fn alias_is_dereferenced() {
        let available = vec!["pkg.sibling".to_string()];
        let mut cache = ImportCache::new("pkg.mod", &available);
        cache.add_import_from(
            Some("sibling"),
            1,
            &[("Foo".to_string(), Some("F".to_string()))],
            &available,
        );
        assert_eq!(cache.get_module_imports_for_name("F"), vec!["pkg.sibling"]);
    }
}
