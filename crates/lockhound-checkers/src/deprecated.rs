//! Deprecation scan.
//!
//! Walks every package's top-level declarations and struct/interface
//! fields. A doc comment whose last paragraph starts with
//! `Deprecated: ` marks each declared name; the remainder of the
//! paragraph (newlines flattened to spaces) is the replacement text.

use std::collections::HashMap;

use lockhound_ir::ast::{doc_paragraphs, Decl, Package};

const PREFIX: &str = "Deprecated: ";

/// Build the symbol → replacement-text index.
pub fn find_deprecated(packages: &[Package]) -> HashMap<String, String> {
    let mut index = HashMap::new();

    for pkg in packages {
        for file in &pkg.files {
            for decl in &file.decls {
                match decl {
                    Decl::Func(func) => {
                        mark(&mut index, &pkg.path, &[func.name.clone()], func.doc.as_deref());
                    }
                    Decl::Value(value) => {
                        mark(&mut index, &pkg.path, &value.names, value.doc.as_deref());
                    }
                    Decl::Type(ty) => {
                        mark(&mut index, &pkg.path, &[ty.name.clone()], ty.doc.as_deref());
                        for field in &ty.fields {
                            let qualified: Vec<String> = field
                                .names
                                .iter()
                                .map(|n| format!("{}.{n}", ty.name))
                                .collect();
                            mark(&mut index, &pkg.path, &qualified, field.doc.as_deref());
                        }
                    }
                }
            }
        }
    }

    index
}

fn mark(index: &mut HashMap<String, String>, pkg_path: &str, names: &[String], doc: Option<&str>) {
    let Some(alt) = deprecation_message(doc) else {
        return;
    };
    for name in names {
        index.insert(format!("{pkg_path}.{name}"), alt.clone());
    }
}

/// The replacement text, if the last doc paragraph is a deprecation
/// notice.
fn deprecation_message(doc: Option<&str>) -> Option<String> {
    let doc = doc?;
    let last = *doc_paragraphs(doc).last()?;
    let alt = last.strip_prefix(PREFIX)?;
    if alt.is_empty() {
        return None;
    }
    Some(alt.replace('\n', " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockhound_ir::ast::{FieldDecl, File, FuncDecl, TypeDecl, ValueDecl};

    fn pkg_with(decls: Vec<Decl>) -> Vec<Package> {
        vec![Package {
            path: "example.com/pkg".into(),
            name: "pkg".into(),
            files: vec![File {
                path: "a.go".into(),
                is_generated: false,
                decls,
            }],
        }]
    }

    #[test]
    fn function_deprecation_is_indexed() {
        let pkgs = pkg_with(vec![Decl::Func(FuncDecl {
            name: "Old".into(),
            doc: Some("Old frobnicates.\n\nDeprecated: use New instead.".into()),
            body: None,
            span: None,
        })]);
        let index = find_deprecated(&pkgs);
        assert_eq!(
            index.get("example.com/pkg.Old").map(String::as_str),
            Some("use New instead.")
        );
    }

    #[test]
    fn only_last_paragraph_counts() {
        let pkgs = pkg_with(vec![Decl::Func(FuncDecl {
            name: "F".into(),
            doc: Some("Deprecated: not really.\n\nActual description.".into()),
            body: None,
            span: None,
        })]);
        assert!(find_deprecated(&pkgs).is_empty());
    }

    #[test]
    fn internal_newlines_flatten_to_spaces() {
        let pkgs = pkg_with(vec![Decl::Func(FuncDecl {
            name: "F".into(),
            doc: Some("F.\n\nDeprecated: use G\nor H instead.".into()),
            body: None,
            span: None,
        })]);
        let index = find_deprecated(&pkgs);
        assert_eq!(
            index.get("example.com/pkg.F").map(String::as_str),
            Some("use G or H instead.")
        );
    }

    #[test]
    fn value_group_marks_every_name() {
        let pkgs = pkg_with(vec![Decl::Value(ValueDecl {
            names: vec!["A".into(), "B".into()],
            doc: Some("Deprecated: gone.".into()),
        })]);
        let index = find_deprecated(&pkgs);
        assert_eq!(index.len(), 2);
        assert!(index.contains_key("example.com/pkg.A"));
        assert!(index.contains_key("example.com/pkg.B"));
    }

    #[test]
    fn struct_fields_are_qualified_by_type() {
        let pkgs = pkg_with(vec![Decl::Type(TypeDecl {
            name: "Config".into(),
            doc: None,
            fields: vec![FieldDecl {
                names: vec!["Timeout".into()],
                doc: Some("Deprecated: use Deadline.".into()),
            }],
        })]);
        let index = find_deprecated(&pkgs);
        assert_eq!(
            index.get("example.com/pkg.Config.Timeout").map(String::as_str),
            Some("use Deadline.")
        );
    }

    #[test]
    fn undocumented_decls_are_ignored() {
        let pkgs = pkg_with(vec![Decl::Func(FuncDecl {
            name: "F".into(),
            doc: None,
            body: None,
            span: None,
        })]);
        assert!(find_deprecated(&pkgs).is_empty());
    }
}
