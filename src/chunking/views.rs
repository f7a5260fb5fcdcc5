//! Text views derived from a unit's name, doc-comment and body.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Views;

/// How many times the readable name is repeated in the lexical view.
const NAME_WEIGHT: usize = 3;

fn camel_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid camelCase regex"))
}

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid URL regex"))
}

/// `get_userData` -> `get user data`
pub fn anglicize_name(name: &str) -> String {
    let separated = name.replace(['_', '-'], " ");
    let split = camel_boundary().replace_all(&separated, "$1 $2");
    collapse_whitespace(&split.to_lowercase())
}

/// Strip URLs and collapse whitespace.
pub fn clean_docstring(doc: &str) -> String {
    collapse_whitespace(&url_pattern().replace_all(doc, ""))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Views for a named unit (function, method, class).
pub fn named_views(name: &str, doc: Option<&str>, filename: &str, code: &str) -> Views {
    let english = anglicize_name(name);
    let doc = doc.map(clean_docstring).unwrap_or_default();

    let semantic = if doc.is_empty() {
        format!("function {english}.")
    } else {
        format!("function {english}. {doc}")
    };

    let mut lexical = vec![english.as_str(); NAME_WEIGHT].join(" ");
    lexical.push(' ');
    lexical.push_str(name);
    if !doc.is_empty() {
        lexical.push(' ');
        lexical.push_str(&doc);
    }
    lexical.push(' ');
    lexical.push_str(code);

    Views {
        semantic,
        lexical,
        code: code_view(filename, code),
    }
}

/// Views for an anonymous free-text chunk.
pub fn text_views(filename: &str, text: &str) -> Views {
    Views {
        semantic: clean_docstring(text),
        lexical: text.to_string(),
        code: code_view(filename, text),
    }
}

fn code_view(filename: &str, code: &str) -> String {
    format!("File: {filename}\n{code}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anglicize_snake_and_camel() {
        assert_eq!(anglicize_name("get_tasks"), "get tasks");
        assert_eq!(anglicize_name("getUserData"), "get user data");
        assert_eq!(anglicize_name("HTTPServer"), "httpserver");
        assert_eq!(anglicize_name("parse-args"), "parse args");
        assert_eq!(anglicize_name("__init__"), "init");
    }

    #[test]
    fn test_clean_docstring_strips_urls() {
        let cleaned = clean_docstring("Fetch https://example.com user\n   record www.x.org");
        assert_eq!(cleaned, "Fetch user record");
    }

    #[test]
    fn test_named_views_weight_name() {
        let views = named_views("delete_items", None, "a.py", "def delete_items(): pass");
        assert_eq!(views.semantic, "function delete items.");
        assert_eq!(views.lexical.matches("delete items").count(), NAME_WEIGHT);
        assert!(views.lexical.contains("delete_items"));
        assert!(views.code.starts_with("File: a.py\n"));
    }

    #[test]
    fn test_views_are_deterministic() {
        let a = named_views("f", Some("doc"), "x.go", "func f() {}");
        let b = named_views("f", Some("doc"), "x.go", "func f() {}");
        assert_eq!(a, b);
    }
}
