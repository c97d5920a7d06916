//! Builds [`TypeInfo`] trees from parsed type annotation expressions.
//!
//! Mirrors the original's `Name`/`Constant`/`Subscript`/`Attribute`/`Tuple`
//! dispatch, generalized here over `rustpython_ast`'s typed `Expr` enum
//! instead of `isinstance` checks.

use rustpython_ast::Expr;

use lexigram_common::TypeInfo;

/// Converts a `-> Annotation` expression into a [`TypeInfo`] tree. Returns
/// `None` for annotation shapes the original never produces a type for
/// (anything other than the handful of matched forms).
#[must_use]
pub fn type_info_from_annotation(expr: &Expr) -> Option<TypeInfo> {
    match expr {
        Expr::Name(name) => Some(TypeInfo::leaf(name.id.as_str())),
        Expr::Constant(constant) => constant_label(constant).map(TypeInfo::leaf),
        Expr::Attribute(attr) => Some(TypeInfo::leaf(dotted_attribute_name(attr))),
        Expr::Subscript(subscript) => {
            let label = generic_base_label(&subscript.value)?;
            let contained = contained_types_from_slice(&subscript.slice);
            Some(TypeInfo::container(label, contained))
        }
        _ => None,
    }
}

fn constant_label(constant: &rustpython_ast::ExprConstant) -> Option<String> {
    use rustpython_ast::Constant;
    match &constant.value {
        Constant::Str(s) => Some(s.clone()),
        Constant::None => None,
        _ => None,
    }
}

fn dotted_attribute_name(attr: &rustpython_ast::ExprAttribute) -> String {
    let prefix = match attr.value.as_ref() {
        Expr::Name(name) => name.id.to_string(),
        Expr::Attribute(inner) => dotted_attribute_name(inner),
        _ => String::new(),
    };
    format!("{prefix}.{}", attr.attr)
}

fn generic_base_label(value: &Expr) -> Option<String> {
    match value {
        Expr::Name(name) => Some(name.id.to_string()),
        Expr::Attribute(attr) => Some(attr.attr.to_string()),
        _ => None,
    }
}

/// `Subscript.slice` holds either a bare expr (single parameter, e.g.
/// `List[int]`) or a `Tuple` (multiple parameters, e.g. `Dict[str, int]`).
fn contained_types_from_slice(slice: &Expr) -> Vec<TypeInfo> {
    match slice {
        Expr::Tuple(tuple) => tuple_member_types(tuple),
        Expr::Name(name) => vec![TypeInfo::leaf(name.id.as_str())],
        Expr::Subscript(inner) => {
            let label = generic_base_label(&inner.value);
            let contained = contained_types_from_slice(&inner.slice);
            match label {
                Some(label) => vec![TypeInfo::container(label, contained)],
                None => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

fn tuple_member_types(tuple: &rustpython_ast::ExprTuple) -> Vec<TypeInfo> {
    let mut out = Vec::with_capacity(tuple.elts.len());
    for elt in &tuple.elts {
        match elt {
            Expr::Name(name) => out.push(TypeInfo::leaf(name.id.as_str())),
            Expr::Subscript(sub) => {
                if let Some(label) = generic_base_label(&sub.value) {
                    let contained = contained_types_from_slice(&sub.slice);
                    out.push(TypeInfo::container(label, contained));
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustpython_parser::parse_expression;

    fn annotation_of(src: &str) -> TypeInfo {
        let parsed = parse_expression(src, "<test>").expect("valid expression");
        type_info_from_annotation(parsed.expr()).expect("annotation should map to a type")
    }

    #[test]
    fn bare_name_is_leaf() {
        let info = annotation_of("int");
        assert_eq!(info.label, "int");
        assert!(info.contained.is_empty());
    }

    #[test]
    fn dict_subscript_has_two_contained_types() {
        let info = annotation_of("Dict[str, Foo]");
        assert_eq!(info.label, "Dict");
        assert_eq!(info.contained.len(), 2);
        assert_eq!(info.contained[1].label, "Foo");
    }

    #[test]
    fn nested_generic_list_of_dict() {
        let info = annotation_of("List[Dict[str, int]]");
        assert_eq!(info.label, "List");
        assert_eq!(info.contained.len(), 1);
        assert_eq!(info.contained[0].label, "Dict");
    }

    #[test]
    fn dotted_attribute_annotation() {
        let info = annotation_of("typing.Optional");
        assert_eq!(info.label, "typing.Optional");
    }
}
