//! Code-unit extraction: exact Python functions, heuristic declarations for
//! brace languages, paragraph chunks for everything else.

pub mod ast;
pub mod fallback;
pub mod heuristic;
pub mod views;

use rayon::prelude::*;

use crate::config::ChunkingConfig;
use crate::git::FileSet;
use crate::models::CodeUnit;
use heuristic::Grammar;

/// Output of the chunking process.
#[derive(Debug, Clone)]
pub struct ChunkOutput {
    /// Declared identifier, absent for paragraph chunks.
    pub name: Option<String>,
    /// Raw doc-comment, when the grammar exposes one.
    pub doc: Option<String>,
    pub content: String,
    /// 1-based start line in the source file.
    pub start_line: usize,
    /// 1-based end line in the source file.
    pub end_line: usize,
}

/// How a file is split into units, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Exact,
    Heuristic(Grammar),
    Paragraph,
}

impl Strategy {
    pub fn for_path(path: &str) -> Self {
        let ext = std::path::Path::new(path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if ext == "py" {
            return Strategy::Exact;
        }
        match Grammar::from_extension(&ext) {
            Some(grammar) => Strategy::Heuristic(grammar),
            None => Strategy::Paragraph,
        }
    }
}

/// Split one file into raw chunks, noise already removed.
pub fn chunk_code(filename: &str, content: &str, config: &ChunkingConfig) -> Vec<ChunkOutput> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let paragraphs =
        || fallback::chunk_paragraphs(content, config.min_block_chars, config.target_chunk_chars);

    let chunks = match Strategy::for_path(filename) {
        Strategy::Exact => ast::extract_python_functions(content).unwrap_or_else(|| {
            tracing::debug!("{filename}: exact parse unavailable, using paragraph chunks");
            paragraphs()
        }),
        Strategy::Heuristic(grammar) => heuristic::extract_declarations(content, grammar),
        Strategy::Paragraph => paragraphs(),
    };

    chunks
        .into_iter()
        .filter(|c| c.content.trim().chars().count() >= config.min_unit_chars)
        .collect()
}

/// Build the units for one file. Ids are assigned later by [`extract`].
fn file_units(filename: &str, content: &str, config: &ChunkingConfig) -> Vec<CodeUnit> {
    let language = detect_language(filename);

    chunk_code(filename, content, config)
        .into_iter()
        .map(|c| {
            let views = match &c.name {
                Some(name) => views::named_views(name, c.doc.as_deref(), filename, &c.content),
                None => views::text_views(filename, &c.content),
            };
            CodeUnit {
                id: 0,
                name: c.name,
                filename: filename.to_string(),
                language: language.to_string(),
                start_line: c.start_line,
                end_line: c.end_line,
                code: c.content,
                views,
            }
        })
        .collect()
}

/// Extract every unit of a file set, in walk order then source order.
///
/// Files are read and chunked in parallel; unreadable files are logged and
/// skipped. A unit's `id` is its position in the returned vector.
pub fn extract(file_set: &FileSet, config: &ChunkingConfig) -> Vec<CodeUnit> {
    let per_file: Vec<Vec<CodeUnit>> = file_set
        .files
        .par_iter()
        .map(|relative| {
            let path = file_set.root.join(relative);
            match std::fs::read_to_string(&path) {
                Ok(content) => file_units(relative, &content, config),
                Err(e) => {
                    tracing::warn!("Skipping unreadable file {relative}: {e}");
                    Vec::new()
                }
            }
        })
        .collect();

    per_file
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(id, mut unit)| {
            unit.id = id;
            unit
        })
        .collect()
}

pub fn detect_language(path: &str) -> &'static str {
    let ext = std::path::Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "py" => "python",
        "rs" => "rust",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "jsx",
        "ts" => "typescript",
        "tsx" => "tsx",
        "go" => "go",
        "java" => "java",
        "c" => "c",
        "cpp" | "cc" | "cxx" | "h" | "hh" | "hpp" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "scala" => "scala",
        "sh" | "bash" | "zsh" => "shell",
        "sql" => "sql",
        "md" | "rst" | "txt" => "text",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        _ => "text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChunkingConfig {
        ChunkingConfig::default()
    }

    #[test]
    fn test_strategy_for_path() {
        assert_eq!(Strategy::for_path("app/models.py"), Strategy::Exact);
        assert_eq!(
            Strategy::for_path("main.go"),
            Strategy::Heuristic(Grammar::Go)
        );
        assert_eq!(Strategy::for_path("README.md"), Strategy::Paragraph);
        assert_eq!(Strategy::for_path("Makefile"), Strategy::Paragraph);
    }

    #[test]
    fn test_chunk_code_empty() {
        assert!(chunk_code("a.py", "", &config()).is_empty());
        assert!(chunk_code("a.go", "  \n  ", &config()).is_empty());
    }

    #[test]
    fn test_short_units_dropped_as_noise() {
        let source = "func A() {}\n\nfunc LongerName(x int) int {\n    return x * 2\n}\n";
        let chunks = chunk_code("a.go", source, &config());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].name.as_deref(), Some("LongerName"));
    }

    #[test]
    fn test_python_views_built_from_docstring() {
        let source = "def get_user_data(uid):\n    \"\"\"Fetch https://example.com user record\"\"\"\n    return db.get(uid)\n";
        let units = file_units("svc/users.py", source, &config());
        assert_eq!(units.len(), 1);
        let unit = &units[0];
        assert_eq!(unit.name.as_deref(), Some("get_user_data"));
        assert_eq!(unit.language, "python");
        assert!(unit.views.semantic.contains("get user data"));
        assert!(!unit.views.semantic.contains("https://example.com"));
        assert!(unit.views.semantic.contains("Fetch user record"));
        assert!(unit.views.lexical.contains(&unit.code));
    }

    #[test]
    fn test_paragraph_units_have_no_name() {
        let text = "This service indexes repositories and answers questions about the code they contain.";
        let units = file_units("docs/intro.md", text, &config());
        assert_eq!(units.len(), 1);
        assert!(units[0].name.is_none());
        assert_eq!(units[0].views.semantic, text);
    }

    #[test]
    fn test_extract_assigns_ids_in_walk_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.py"),
            "def first_one():\n    return 1\n\ndef second_one():\n    return 2\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.go"),
            "func Third(a int) int {\n    return a\n}\n",
        )
        .unwrap();

        let file_set = FileSet {
            root: dir.path().to_path_buf(),
            files: vec!["a.py".to_string(), "b.go".to_string(), "missing.py".to_string()],
        };
        let units = extract(&file_set, &config());
        let names: Vec<_> = units.iter().filter_map(|u| u.name.as_deref()).collect();
        assert_eq!(names, vec!["first_one", "second_one", "Third"]);
        for (i, unit) in units.iter().enumerate() {
            assert_eq!(unit.id, i);
        }
    }
}
