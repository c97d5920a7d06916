//! [`TypeInfo`]: a recursive, acyclic description of an annotated type.
//!
//! Ported from the depth/index navigation rules of the original type
//! resolver: `Dict` is special-cased to descend into its *value* type
//! (index 1), `Tuple` descends positionally. See `get_type` below.

/// A recursive value describing an annotated type: a label plus its ordered
/// contained types (generic parameters), plus an optional fully-qualified
/// name filled in once the module that declares it is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    pub label: String,
    pub contained: Vec<TypeInfo>,
    pub fully_qualified: Option<String>,
}

impl TypeInfo {
    #[must_use]
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            contained: Vec::new(),
            fully_qualified: None,
        }
    }

    #[must_use]
    pub fn container(label: impl Into<String>, contained: Vec<TypeInfo>) -> Self {
        Self {
            label: label.into(),
            contained,
            fully_qualified: None,
        }
    }

    #[must_use]
    pub fn is_dict(&self) -> bool {
        self.label == "Dict"
    }

    #[must_use]
    pub fn is_tuple_or_dict(&self) -> bool {
        self.label == "Dict" || self.label == "Tuple"
    }

    /// Navigates container nesting: at depth 0 the node itself is returned;
    /// descending one level enters the first contained type, except a Dict
    /// descends into its value type (index 1); upon reaching a Dict/Tuple at
    /// the final remaining depth, `tuple_index` selects the positional
    /// member (a Dict root always yields its value type regardless of
    /// `tuple_index`).
    ///
    /// Returns `None` if navigation exceeds the tree's actual nesting
    /// (treated by callers as `NavigationError`: unknown receiver type).
    #[must_use]
    pub fn get_type(&self, depth: usize, tuple_index: usize) -> Option<TypeInfo> {
        let object_type = self.contained_type_at_depth(depth)?;

        if object_type.is_dict() {
            return object_type.contained.get(1).cloned();
        }
        if tuple_index > 0 && object_type.is_tuple_or_dict() {
            return object_type.contained.get(tuple_index).cloned();
        }
        Some(object_type.clone())
    }

    fn contained_type_at_depth(&self, depth: usize) -> Option<&TypeInfo> {
        if depth == 0 || (self.is_tuple_or_dict() && depth == 1) {
            return Some(self);
        }

        let mut current = self.contained.first()?;
        for i in 1..depth {
            if current.is_tuple_or_dict() && (depth - i == 1) {
                return Some(current);
            } else if current.is_dict() {
                current = current.contained.get(1)?;
            } else {
                current = current.contained.first()?;
            }
        }
        Some(current)
    }

    /// Recursively fills `fully_qualified` on this node and every contained
    /// type using the supplied resolver (module path for a bare label).
    pub fn populate_fully_qualified(&mut self, resolve: &impl Fn(&str) -> Option<String>) {
        if self.fully_qualified.is_none() {
            if let Some(module) = resolve(&self.label) {
                self.fully_qualified = Some(format!("{module}.{}", self.label));
            }
        }
        for child in &mut self.contained {
            child.populate_fully_qualified(resolve);
        }
    }
}
