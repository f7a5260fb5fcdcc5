//! Regex-based declaration finder for brace-delimited languages.
//!
//! Each line is matched against a per-grammar declaration pattern. A match
//! whose line opens a brace becomes a unit that runs until the running count
//! of closing braces catches up with the opening ones. Braces inside strings
//! and comments are counted too, so spans are approximate.

use regex::Regex;
use std::sync::OnceLock;

use super::ChunkOutput;

/// Name used when a pattern matched but captured nothing.
pub const PLACEHOLDER_NAME: &str = "anonymous";

/// Method-shaped patterns also match control flow; these names are rejected.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "switch", "catch", "return", "do", "try", "match", "foreach",
    "using", "lock", "synchronized", "function", "new", "sizeof",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    JavaScript,
    Go,
    Rust,
    JavaLike,
    KotlinLike,
    CFamily,
    Swift,
    Php,
}

impl Grammar {
    const ALL: [Grammar; 8] = [
        Grammar::JavaScript,
        Grammar::Go,
        Grammar::Rust,
        Grammar::JavaLike,
        Grammar::KotlinLike,
        Grammar::CFamily,
        Grammar::Swift,
        Grammar::Php,
    ];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" => Some(Grammar::JavaScript),
            "go" => Some(Grammar::Go),
            "rs" => Some(Grammar::Rust),
            "java" | "cs" => Some(Grammar::JavaLike),
            "kt" | "kts" | "scala" => Some(Grammar::KotlinLike),
            "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" => Some(Grammar::CFamily),
            "swift" => Some(Grammar::Swift),
            "php" => Some(Grammar::Php),
            _ => None,
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            Grammar::JavaScript => concat!(
                r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(\w+)",
                r"|^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)",
                r"|^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)[^=]*=>|\w+\s*=>)",
                r"|^\s*(?:(?:public|private|protected|static|async|get|set)\s+)*(\w+)\s*\([^)]*\)\s*(?::\s*[^{]+)?\{",
            ),
            Grammar::Go => concat!(
                r"^\s*func\s+(?:\([^)]*\)\s*)?(\w+)",
                r"|^\s*type\s+(\w+)\s+(?:struct|interface)\b",
            ),
            Grammar::Rust => concat!(
                r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(\w+)"#,
                r"|^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|mod)\s+(\w+)",
                r"|^\s*(?:unsafe\s+)?impl(?:<[^>]*>)?\s+(?:[\w:<>, ]+\s+for\s+)?(\w+)",
            ),
            Grammar::JavaLike => concat!(
                r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|sealed|partial)\s+)*(?:class|interface|enum|record|struct)\s+(\w+)",
                r"|^\s*(?:@\w+\s+)*(?:(?:public|private|protected|internal|static|final|abstract|override|virtual|async|synchronized)\s+)+[\w<>\[\],.?]+\s+(\w+)\s*\(",
            ),
            Grammar::KotlinLike => concat!(
                r"^\s*(?:(?:public|private|protected|internal|open|override|suspend|abstract|inline|final)\s+)*(?:fun|def)\s+(?:<[^>]*>\s*)?(?:[\w.]+\.)?(\w+)",
                r"|^\s*(?:(?:public|private|protected|internal|open|abstract|data|sealed|case|final)\s+)*(?:class|object|interface|trait)\s+(\w+)",
            ),
            Grammar::CFamily => concat!(
                r"^\s*(?:template\s*<[^>]*>\s*)?(?:class|struct|namespace)\s+(\w+)",
                r"|^\s*(?:[\w:<>*&]+\s+)+[*&]*(\w+)\s*\([^;]*\)\s*(?:const\s*)?(?:noexcept\s*)?\{",
            ),
            Grammar::Swift => concat!(
                r"^\s*(?:(?:public|private|internal|fileprivate|open|static|override|mutating|final|@\w+)\s+)*func\s+(\w+)",
                r"|^\s*(?:(?:public|private|internal|fileprivate|open|final)\s+)*(?:class|struct|enum|protocol|extension)\s+(\w+)",
            ),
            Grammar::Php => concat!(
                r"^\s*(?:(?:public|private|protected|static|abstract|final)\s+)*function\s+&?(\w+)",
                r"|^\s*(?:(?:abstract|final)\s+)?(?:class|interface|trait)\s+(\w+)",
            ),
        }
    }

    fn regex(self) -> &'static Regex {
        static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
        let compiled = COMPILED.get_or_init(|| {
            Grammar::ALL
                .iter()
                .map(|g| Regex::new(g.pattern()).expect("declaration patterns are valid"))
                .collect()
        });
        &compiled[self as usize]
    }
}

/// Find brace-delimited declarations, top to bottom.
pub fn extract_declarations(content: &str, grammar: Grammar) -> Vec<ChunkOutput> {
    let re = grammar.regex();
    let lines: Vec<&str> = content.lines().collect();
    let mut chunks = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        // Single-line or ambiguous declarations are skipped.
        if !line.contains('{') {
            continue;
        }

        let name = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .find(|s| !s.is_empty())
            .unwrap_or(PLACEHOLDER_NAME);
        if CONTROL_KEYWORDS.contains(&name) {
            continue;
        }

        let end = block_end(&lines, i);
        chunks.push(ChunkOutput {
            name: Some(name.to_string()),
            doc: None,
            content: lines[i..=end].join("\n"),
            start_line: i + 1,
            end_line: end + 1,
        });
    }

    chunks
}

/// Index of the line where braces opened at or after `start` balance out.
fn block_end(lines: &[&str], start: usize) -> usize {
    let mut open = 0usize;
    let mut close = 0usize;

    for (offset, line) in lines[start..].iter().enumerate() {
        open += line.matches('{').count();
        close += line.matches('}').count();
        if open > 0 && close >= open {
            return start + offset;
        }
    }

    lines.len() - 1
}
