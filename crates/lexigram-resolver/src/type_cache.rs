//! [`ProjectTypeCache`]: project-wide function/method return-type lookup.

use rustc_hash::FxHashMap;
use tracing::{debug, error, warn};

use lexigram_common::TypeInfo;

use crate::import_cache::ImportCache;

/// Return types declared by one class's methods, keyed by method name.
#[derive(Clone, Debug, Default)]
pub struct ClassCache {
    pub type_name: String,
    functions: FxHashMap<String, Option<TypeInfo>>,
}

impl ClassCache {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            functions: FxHashMap::default(),
        }
    }

    pub fn add_function(&mut self, name: impl Into<String>, return_type: Option<TypeInfo>) {
        self.functions.insert(name.into(), return_type);
    }

    #[must_use]
    pub fn contains_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    #[must_use]
    pub fn is_type(&self, name: &str) -> bool {
        self.type_name == name
    }

    #[must_use]
    pub fn get_function_return_type(&self, name: &str) -> Option<TypeInfo> {
        match self.functions.get(name) {
            Some(ty) => ty.clone(),
            None => {
                error!(class = %self.type_name, function = name, "could not find function in class");
                None
            }
        }
    }
}

/// Per-module cache: one entry per top-level function, one [`ClassCache`]
/// per top-level class (nested classes flattened into dotted names).
#[derive(Clone, Debug, Default)]
pub struct FileCache {
    pub module_path: String,
    pub import_cache: Option<ImportCache>,
    classes: FxHashMap<String, ClassCache>,
    functions: FxHashMap<String, Option<TypeInfo>>,
}

impl FileCache {
    #[must_use]
    pub fn new(module_path: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
            import_cache: None,
            classes: FxHashMap::default(),
            functions: FxHashMap::default(),
        }
    }

    pub fn set_import_cache(&mut self, cache: ImportCache) {
        self.import_cache = Some(cache);
    }

    pub fn add_class(&mut self, class_cache: ClassCache) {
        self.classes.insert(class_cache.type_name.clone(), class_cache);
    }

    pub fn add_function(&mut self, name: impl Into<String>, return_type: Option<TypeInfo>) {
        self.functions.insert(name.into(), return_type);
    }

    #[must_use]
    pub fn get_function_return_type(&self, name: &str) -> Option<TypeInfo> {
        match self.functions.get(name) {
            Some(ty) => ty.clone(),
            None => {
                error!(module = %self.module_path, function = name, "could not find function in module");
                None
            }
        }
    }

    #[must_use]
    pub fn get_class_function_type(&self, function_name: &str, class_name: &str) -> Option<TypeInfo> {
        match self.classes.get(class_name) {
            Some(class) => class.get_function_return_type(function_name),
            None => {
                error!(module = %self.module_path, class = class_name, "could not find class in module");
                None
            }
        }
    }

    #[must_use]
    pub fn contains_class_function(&self, class_name: &str, function_name: &str) -> bool {
        self.classes
            .get(class_name)
            .is_some_and(|c| c.contains_function(function_name))
    }

    #[must_use]
    pub fn contains_type(&self, type_name: &str) -> bool {
        self.classes.values().any(|c| c.is_type(type_name))
    }

    #[must_use]
    pub fn contains_function(&self, function_name: &str) -> bool {
        self.functions.contains_key(function_name)
    }

    /// Every top-level function name declared in this file, in no
    /// particular order. Used by the duplicate-function scan, which only
    /// cares about names, not return types.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

/// Project-wide, read-only-after-build cache of function/method return
/// types, populated once by the [`crate::preprocessor::TypePreprocessor`].
///
/// Every lookup takes the caller's `current_module` explicitly rather than
/// tracking it as internal mutable state: this cache is shared as a single
/// `&ProjectTypeCache` across a `rayon` per-file fork-join during
/// tokenization (see `lexigram-cli::pipeline::tokenize`), so a
/// `set_current_module`-style setter would race across files and silently
/// degrade every lookup to whatever file last wrote it.
#[derive(Clone, Debug, Default)]
pub struct ProjectTypeCache {
    pub name: String,
    modules: FxHashMap<String, FileCache>,
    smallest_module_level: usize,
}

impl ProjectTypeCache {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: FxHashMap::default(),
            smallest_module_level: usize::MAX,
        }
    }

    pub fn add_file_cache(&mut self, module_path: impl Into<String>, cache: FileCache) {
        let module_path = module_path.into();
        let level = module_path.split('.').count();
        if level < self.smallest_module_level {
            self.smallest_module_level = level;
        }
        self.modules.insert(module_path, cache);
    }

    #[must_use]
    pub fn get_file_cache(&self, module_path: &str) -> Option<&FileCache> {
        self.modules.get(module_path)
    }

    /// Every module path registered in this cache, in no particular order.
    pub fn module_paths(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// `get_return_type(current_module, name, class, module)`: consults
    /// `FileCache`(s); if `class` is given, looks in that class's method
    /// table, else the module's function table, else searches everything
    /// visible from `current_module`'s imports.
    #[must_use]
    pub fn get_return_type(
        &self,
        current_module: &str,
        function_name: &str,
        class_name: Option<&str>,
        module: Option<&str>,
    ) -> Option<TypeInfo> {
        if let Some(class_name) = class_name {
            self.return_type_of_class_function(current_module, function_name, class_name)
        } else if let Some(module) = module {
            self.return_type_of_function_by_module(current_module, function_name, module)
        } else {
            self.return_type_of_function(current_module, function_name)
        }
    }

    #[must_use]
    pub fn find_module_for_type_with_function(&self, current_module: &str, type_name: &str, function_name: &str) -> Option<String> {
        for module in self.modules_for_name(current_module, type_name) {
            if let Some(cache) = self.modules.get(&module) {
                if cache.contains_class_function(type_name, function_name) {
                    return Some(module);
                }
            }
        }
        None
    }

    #[must_use]
    pub fn find_module_for_function(&self, current_module: &str, function_name: &str) -> Option<String> {
        let potential = self.modules_for_name(current_module, function_name);
        match potential.len() {
            1 => Some(potential[0].clone()),
            0 => {
                if is_not_a_builtin_function(function_name) {
                    warn!(
                        function = function_name,
                        module = current_module,
                        "no matching module found for function"
                    );
                }
                None
            }
            _ => {
                error!(
                    function = function_name,
                    module = current_module,
                    "unable to uniquely map module to function"
                );
                None
            }
        }
    }

    #[must_use]
    pub fn module_contains_type(&self, module_path: &str, type_name: &str) -> bool {
        self.modules.get(module_path).is_some_and(|m| m.contains_type(type_name))
    }

    #[must_use]
    pub fn module_contains_function(&self, module_path: &str, function_name: &str) -> bool {
        self.modules
            .get(module_path)
            .is_some_and(|m| m.contains_function(function_name))
    }

    /// Recursively fills `fully_qualified` on `info` and its contained
    /// types, resolving each label to the (unique) module that declares it
    /// as seen from `current_module`'s imports.
    pub fn populate_type_info_with_module(&self, current_module: &str, info: &mut TypeInfo) {
        if info.fully_qualified.is_some() {
            return;
        }
        let label = info.label.clone();
        for contained in &mut info.contained {
            self.populate_type_info_with_module(current_module, contained);
        }
        if label.is_empty() {
            error!("cannot determine module for empty type");
            return;
        }
        let potential = self.modules_for_name(current_module, &label);
        let module_path = match potential.len() {
            1 => format!("{}.", potential[0]),
            0 => {
                if !matches!(label.as_str(), "str" | "bool" | "int") {
                    warn!(type_name = %label, module = current_module, "no matching module for type");
                }
                String::new()
            }
            _ => {
                error!(type_name = %label, module = current_module, "unable to uniquely map module to type");
                String::new()
            }
        };
        info.fully_qualified = Some(format!("{module_path}{label}"));
    }

    /// Peels trailing path components off `module_path` until a registered
    /// module is found (or the shortest registered depth is reached). The
    /// peeled suffix is interpreted as a nested class name.
    fn existing_module_in_cache(&self, mut module_path: String) -> (Option<String>, String) {
        if self.modules.contains_key(&module_path) {
            return (Some(module_path), String::new());
        }
        let parts = module_path.split('.').count();
        let splits = parts.saturating_sub(self.smallest_module_level);
        let mut class_name = String::new();
        for _ in 0..splits {
            let Some(idx) = module_path.rfind('.') else { break };
            let tail = module_path[idx + 1..].to_string();
            module_path.truncate(idx);
            class_name = format!("{tail}.{class_name}");
            if self.modules.contains_key(&module_path) {
                class_name.pop(); // drop trailing separator
                return (Some(module_path), class_name);
            }
        }
        (None, class_name)
    }

    fn return_type_of_class_function(&self, current_module: &str, function_name: &str, class_name: &str) -> Option<TypeInfo> {
        for cache in self.file_caches_for_name(current_module, class_name) {
            if let Some(ty) = cache.get_class_function_type(function_name, class_name) {
                return Some(ty);
            }
        }
        error!(
            function = function_name,
            class = class_name,
            module = current_module,
            "could not find function for class in type cache"
        );
        None
    }

    fn return_type_of_function(&self, current_module: &str, function_name: &str) -> Option<TypeInfo> {
        for cache in self.file_caches_for_name(current_module, function_name) {
            if let Some(ty) = cache.get_function_return_type(function_name) {
                return Some(ty);
            }
        }
        error!(
            function = function_name,
            module = current_module,
            "could not find function for module in type cache"
        );
        None
    }

    fn return_type_of_function_by_module(&self, current_module: &str, function_name: &str, module: &str) -> Option<TypeInfo> {
        let (resolved, class_name) = self.existing_module_in_cache(module.to_string());
        if resolved.is_some() {
            if let Some(info) = self.return_type_of_function(current_module, function_name) {
                return Some(info);
            }
            if let Some(mut info) = self.return_type_of_class_function(current_module, function_name, &class_name) {
                self.populate_type_info_with_module(current_module, &mut info);
                return Some(info);
            }
        }
        debug!(function = function_name, module, "could not find function in module");
        None
    }

    fn current_import_cache(&self, current_module: &str) -> Option<&ImportCache> {
        let mut module_path = current_module;
        let stripped;
        if module_path.ends_with(".__init__") {
            stripped = module_path.trim_end_matches(".__init__").to_string();
            module_path = &stripped;
        }
        self.modules.get(module_path).and_then(|c| c.import_cache.as_ref())
    }

    /// Returns the modules that contain the given class/function name,
    /// preferring a type hit over a function hit when ambiguous.
    fn modules_for_name(&self, current_module: &str, name: &str) -> Vec<String> {
        let mut candidates: Vec<String> = self
            .current_import_cache(current_module)
            .map(|c| c.get_module_imports_for_name(name))
            .unwrap_or_default();
        candidates.push(current_module.to_string());

        let mut potential = Vec::new();
        for module in candidates {
            if self.module_contains_type(&module, name) {
                potential.push(module);
            } else if self.module_contains_function(&module, name) && potential.is_empty() {
                potential.push(module);
            }
        }
        potential
    }

    fn file_caches_for_name(&self, current_module: &str, name: &str) -> Vec<&FileCache> {
        self.modules_for_name(current_module, name)
            .into_iter()
            .filter_map(|m| self.modules.get(&m))
            .collect()
    }
}

/// Mirrors the host's builtin-function allowlist check: avoids warning on
/// names that are almost certainly language builtins rather than unresolved
/// project symbols.
#[must_use]
pub fn is_not_a_builtin_function(name: &str) -> bool {
    const BUILTINS: &[&str] = &[
        "print", "len", "range", "str", "int", "float", "bool", "list", "dict", "set", "tuple",
        "open", "enumerate", "zip", "map", "filter", "sorted", "reversed", "isinstance", "super",
        "format", "repr", "type", "hasattr", "getattr", "setattr", "iter", "next", "min", "max",
        "sum", "abs", "all", "any",
    ];
    !BUILTINS.contains(&name)
}
