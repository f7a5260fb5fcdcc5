//! Exact extraction of Python functions using tree-sitter.
//!
//! Every `function_definition` node (plain, `async def`, methods, nested
//! functions) becomes one unit spanning the definition line to the node's
//! syntactic end.
//!
//! Returns `None`, letting the caller fall back to paragraph chunking, when:
//! - the file exceeds MAX_FILE_SIZE (500 KB)
//! - the parse produces >30% error nodes

use super::ChunkOutput;

/// Files larger than this skip AST parsing entirely.
const MAX_FILE_SIZE: usize = 500 * 1024; // 500 KB

/// If more than this fraction of AST nodes are error nodes, fall back.
const ERROR_THRESHOLD: f64 = 0.30;

/// Extract every Python function definition, top to bottom.
pub fn extract_python_functions(content: &str) -> Option<Vec<ChunkOutput>> {
    if content.len() > MAX_FILE_SIZE {
        return None;
    }

    let mut parser = tree_sitter::Parser::new();
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    parser.set_language(&language).ok()?;

    let tree = parser.parse(content, None)?;
    let root = tree.root_node();

    let (total, errors) = count_nodes(root);
    if total > 0 && (errors as f64 / total as f64) > ERROR_THRESHOLD {
        tracing::warn!(
            "AST error rate {:.0}% exceeds threshold, falling back to paragraph chunking",
            (errors as f64 / total as f64) * 100.0
        );
        return None;
    }

    let source = content.as_bytes();
    let lines: Vec<&str> = content.lines().collect();
    let mut functions = Vec::new();

    // Pre-order walk keeps definitions in source order.
    let mut cursor = root.walk();
    'walk: loop {
        let node = cursor.node();
        if node.kind() == "function_definition" {
            if let Some(chunk) = function_chunk(node, source, &lines) {
                functions.push(chunk);
            }
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    Some(functions)
}

fn function_chunk(node: tree_sitter::Node, source: &[u8], lines: &[&str]) -> Option<ChunkOutput> {
    let name = node
        .child_by_field_name("name")?
        .utf8_text(source)
        .ok()?
        .to_string();
    let body = node.child_by_field_name("body");

    let start = node.start_position().row;
    let end = if node.has_error() {
        // Span unreliable: one line per top-level body statement.
        let statements = body.map(|b| b.named_child_count()).unwrap_or(0);
        start + statements
    } else {
        let end = node.end_position();
        if end.column == 0 && end.row > start {
            end.row - 1
        } else {
            end.row
        }
    };
    let end = end.min(lines.len().saturating_sub(1));

    let content = lines.get(start..=end)?.join("\n");
    let doc = body.and_then(|b| docstring(b, source));

    Some(ChunkOutput {
        name: Some(name),
        doc,
        content,
        start_line: start + 1,
        end_line: end + 1,
    })
}

/// The string literal opening a function body, unquoted.
fn docstring(body: tree_sitter::Node, source: &[u8]) -> Option<String> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if literal.kind() != "string" {
        return None;
    }
    let raw = literal.utf8_text(source).ok()?;
    Some(unquote(raw).to_string())
}

fn unquote(raw: &str) -> &str {
    let text = raw.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if text.len() >= 2 * quote.len() && text.starts_with(quote) && text.ends_with(quote) {
            return &text[quote.len()..text.len() - quote.len()];
        }
    }
    text
}

/// Count total nodes and error nodes in a tree.
fn count_nodes(node: tree_sitter::Node) -> (usize, usize) {
    let mut total = 0usize;
    let mut errors = 0usize;

    let mut cursor = node.walk();
    'walk: loop {
        total += 1;
        if cursor.node().is_error() {
            errors += 1;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    (total, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_function_with_docstring() {
        let source = r#"import os


def get_user_data(user_id):
    """Fetch https://example.com user record"""
    return os.environ.get(user_id)


x = 1
"#;
        let functions = extract_python_functions(source).unwrap();
        assert_eq!(functions.len(), 1);
        let f = &functions[0];
        assert_eq!(f.name.as_deref(), Some("get_user_data"));
        assert_eq!(f.doc.as_deref(), Some("Fetch https://example.com user record"));
        assert_eq!(f.start_line, 4);
        assert_eq!(f.end_line, 6);
        assert_eq!(
            f.content,
            "def get_user_data(user_id):\n    \"\"\"Fetch https://example.com user record\"\"\"\n    return os.environ.get(user_id)"
        );
    }

    #[test]
    fn test_async_and_methods_in_source_order() {
        let source = r#"class Repo:
    def load(self):
        return self.items

    async def save(self, item):
        await self.db.put(item)


async def main():
    def helper():
        return 1
    return helper()
"#;
        let functions = extract_python_functions(source).unwrap();
        let names: Vec<_> = functions.iter().filter_map(|f| f.name.as_deref()).collect();
        assert_eq!(names, vec!["load", "save", "main", "helper"]);
        assert!(functions[1].content.starts_with("async def save"));
        assert_eq!(functions[1].start_line, 5);
        assert_eq!(functions[1].end_line, 6);
    }

    #[test]
    fn test_no_docstring() {
        let source = "def add(a, b):\n    total = a + b\n    return total\n";
        let functions = extract_python_functions(source).unwrap();
        assert_eq!(functions.len(), 1);
        assert!(functions[0].doc.is_none());
        assert_eq!(functions[0].end_line, 3);
    }

    #[test]
    fn test_unquote_variants() {
        assert_eq!(unquote("'''hi'''"), "hi");
        assert_eq!(unquote("r\"raw\""), "raw");
        assert_eq!(unquote("'x'"), "x");
    }

    #[test]
    fn test_skips_large_files() {
        let large = "x".repeat(MAX_FILE_SIZE + 1);
        assert!(extract_python_functions(&large).is_none());
    }

    #[test]
    fn test_file_without_functions_yields_empty() {
        let functions = extract_python_functions("X = 1\nY = 2\n").unwrap();
        assert!(functions.is_empty());
    }
}
