//! [`VariableTypeCache`]: scope-stacked variable-type tracking during
//! tokenization (module / class / function frames).

use rustc_hash::FxHashMap;
use tracing::warn;

use lexigram_common::TypeInfo;

use crate::type_cache::ProjectTypeCache;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Module,
    Class,
    Function,
}

/// Tracks variable types across nested module/class/function scopes while a
/// single file is being tokenized.
///
/// Deliberately does not hold a reference to [`ProjectTypeCache`]: the
/// Python original stores the project cache on `self` and mutates its
/// "currently processed module" as a side effect; here the project cache is
/// borrowed only for the duration of [`Self::set_class_scope`], keeping this
/// type free of a long-lived borrow.
#[derive(Debug, Default)]
pub struct VariableTypeCache {
    module_path: String,
    scope_stack: Vec<Scope>,
    class_scope_stack: Vec<String>,
    function_scope_stack: Vec<String>,
    module_variables: FxHashMap<String, TypeInfo>,
    class_scopes: FxHashMap<String, FxHashMap<String, TypeInfo>>,
    function_scopes: FxHashMap<String, FxHashMap<String, TypeInfo>>,
    /// Deterministic replacement for the Python original's random 5-char
    /// disambiguation suffix: tests can pin this by constructing with
    /// [`Self::with_suffix_counter`].
    suffix_counter: u64,
}

impl VariableTypeCache {
    #[must_use]
    pub fn new(module_path: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_suffix_counter(module_path: impl Into<String>, suffix_counter: u64) -> Self {
        Self {
            suffix_counter,
            ..Self::new(module_path)
        }
    }

    pub fn set_class_scope(&mut self, name: impl Into<String>, project_cache: &ProjectTypeCache, current_module: &str) {
        let name = name.into();
        self.scope_stack.push(Scope::Class);
        self.class_scope_stack.push(name.clone());

        let mut self_type = TypeInfo::leaf(name.clone());
        project_cache.populate_type_info_with_module(current_module, &mut self_type);

        let mut vars = FxHashMap::default();
        vars.insert("self".to_string(), self_type);
        self.class_scopes.insert(name, vars);
    }

    pub fn leave_class_scope(&mut self) {
        if let Some(name) = self.class_scope_stack.pop() {
            self.class_scopes.remove(&name);
        }
        self.scope_stack.pop();
    }

    pub fn set_function_scope(&mut self, name: impl Into<String>) {
        let mut name = name.into();
        self.scope_stack.push(Scope::Function);
        if self.function_scope_stack.iter().any(|n| n == &name) {
            self.suffix_counter += 1;
            name = format!("{name}_{:05}", self.suffix_counter);
        }
        self.function_scope_stack.push(name.clone());
        self.function_scopes.insert(name, FxHashMap::default());
    }

    pub fn leave_function_scope(&mut self) {
        if let Some(name) = self.function_scope_stack.pop() {
            self.function_scopes.remove(&name);
        }
        self.scope_stack.pop();
    }

    pub fn add_variable(&mut self, name: impl Into<String>, ty: TypeInfo) {
        let name = name.into();
        match self.current_scope() {
            Scope::Module => {
                self.module_variables.insert(name, ty);
            }
            Scope::Class => self.set_class_variable(name, ty),
            Scope::Function => {
                let in_init_over_class = self.function_scope_stack.last().map(String::as_str) == Some("__init__")
                    && self.previous_scope() == Scope::Class;
                if in_init_over_class {
                    self.set_class_variable(name, ty);
                } else {
                    self.set_function_variable(name, ty);
                }
            }
        }
    }

    #[must_use]
    pub fn get_variable_type(&self, name: &str, depth: usize, tuple_index: usize) -> Option<TypeInfo> {
        let scope = self.current_scope();
        let previous = self.previous_scope();

        let mut variable_type = if scope == Scope::Function {
            self.function_variable(name)
        } else {
            None
        };
        if variable_type.is_none() && previous == Scope::Class {
            variable_type = self.class_variable(name);
        }
        if variable_type.is_none() {
            variable_type = self.module_variables.get(name).cloned();
        }

        let Some(variable_type) = variable_type else {
            warn!(variable = name, module = %self.module_path, "could not find variable type");
            return None;
        };

        let navigated = variable_type.get_type(depth, tuple_index);
        if navigated.is_none() {
            warn!(
                variable = name,
                module = %self.module_path,
                depth,
                tuple_index,
                "failed to navigate variable type"
            );
        }
        navigated
    }

    fn set_class_variable(&mut self, name: String, ty: TypeInfo) {
        if let Some(class) = self.class_scope_stack.last() {
            if let Some(vars) = self.class_scopes.get_mut(class) {
                vars.insert(name, ty);
            }
        }
    }

    fn set_function_variable(&mut self, name: String, ty: TypeInfo) {
        if let Some(function) = self.function_scope_stack.last() {
            if let Some(vars) = self.function_scopes.get_mut(function) {
                vars.insert(name, ty);
            }
        }
    }

    fn function_variable(&self, name: &str) -> Option<TypeInfo> {
        for scope in self.function_scope_stack.iter().rev() {
            if let Some(vars) = self.function_scopes.get(scope) {
                if let Some(ty) = vars.get(name) {
                    return Some(ty.clone());
                }
            }
        }
        None
    }

    fn class_variable(&self, name: &str) -> Option<TypeInfo> {
        let class = self.class_scope_stack.last()?;
        self.class_scopes.get(class)?.get(name).cloned()
    }

    fn current_scope(&self) -> Scope {
        self.scope_stack.last().copied().unwrap_or_default()
    }

    fn previous_scope(&self) -> Scope {
        if self.scope_stack.len() < 2 {
            return Scope::Module;
        }
        self.scope_stack[self.scope_stack.len() - 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_scope_variable_roundtrips() {
        let mut cache = VariableTypeCache::new("pkg.mod");
        cache.add_variable("x", TypeInfo::leaf("int"));
        assert_eq!(cache.get_variable_type("x", 0, 0).unwrap().label, "int");
    }

    #[test]
    fn init_method_assigns_land_on_class_scope() {
        let project = ProjectTypeCache::new("proj");
        let mut cache = VariableTypeCache::new("pkg.mod");
        cache.set_class_scope("Widget", &project, "pkg.mod");
        cache.set_function_scope("__init__");
        cache.add_variable("count", TypeInfo::leaf("int"));
        cache.leave_function_scope();
        // Re-enter another method of the same class; class-scoped vars persist.
        cache.set_function_scope("bump");
        assert_eq!(cache.get_variable_type("count", 0, 0).unwrap().label, "int");
    }

    #[test]
    fn nested_same_named_function_gets_disambiguated() {
        let mut cache = VariableTypeCache::with_suffix_counter("pkg.mod", 0);
        cache.set_function_scope("helper");
        cache.add_variable("a", TypeInfo::leaf("int"));
        cache.set_function_scope("helper");
        cache.add_variable("a", TypeInfo::leaf("str"));
        assert_eq!(cache.get_variable_type("a", 0, 0).unwrap().label, "str");
        cache.leave_function_scope();
        assert_eq!(cache.get_variable_type("a", 0, 0).unwrap().label, "int");
        cache.leave_function_scope();
    }

    #[test]
    fn unknown_variable_returns_none() {
        let cache = VariableTypeCache::new("pkg.mod");
        assert!(cache.get_variable_type("missing", 0, 0).is_none());
    }
}
