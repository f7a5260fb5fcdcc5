//! Paragraph chunker for files without a structural parser.
//!
//! 1. Split at blank lines (natural paragraph boundaries)
//! 2. Drop import/package blocks
//! 3. Hold short blocks in the buffer so they ride along with the next real block
//! 4. Emit the buffer once it reaches the target size; flush the rest at EOF

use super::ChunkOutput;

/// Chunk content into paragraph groups of roughly `target_chars`.
pub fn chunk_paragraphs(content: &str, min_block_chars: usize, target_chars: usize) -> Vec<ChunkOutput> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut chunks = Vec::new();
    let mut buffer = Buffer::default();

    for seg in split_at_blank_lines(&lines) {
        let text = seg.lines.join("\n");
        let trimmed = text.trim();
        if trimmed.is_empty() || is_import_block(trimmed) {
            continue;
        }

        buffer.push(trimmed, seg.start, seg.end);

        // Short blocks never trigger a flush on their own.
        if trimmed.chars().count() < min_block_chars {
            continue;
        }
        if buffer.chars >= target_chars {
            chunks.push(buffer.take());
        }
    }

    if !buffer.is_empty() {
        chunks.push(buffer.take());
    }

    chunks
}

#[derive(Default)]
struct Buffer {
    text: String,
    chars: usize,
    start: usize,
    end: usize,
}

impl Buffer {
    fn push(&mut self, block: &str, start: usize, end: usize) {
        if self.text.is_empty() {
            self.start = start;
        } else {
            self.text.push_str("\n\n");
            self.chars += 2;
        }
        self.text.push_str(block);
        self.chars += block.chars().count();
        self.end = end;
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn take(&mut self) -> ChunkOutput {
        let buffer = std::mem::take(self);
        ChunkOutput {
            name: None,
            doc: None,
            content: buffer.text,
            start_line: buffer.start + 1,
            end_line: buffer.end + 1,
        }
    }
}

fn is_import_block(block: &str) -> bool {
    let first = block.split_whitespace().next().unwrap_or_default();
    match first {
        "import" | "package" | "using" | "#include" => true,
        "from" => block.contains(" import "),
        _ => block.starts_with("require("),
    }
}

struct Segment<'a> {
    lines: Vec<&'a str>,
    start: usize,
    end: usize,
}

fn split_at_blank_lines<'a>(lines: &[&'a str]) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut seg_start = None;

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            if let Some(start) = seg_start.take() {
                segments.push(Segment {
                    lines: lines[start..i].to_vec(),
                    start,
                    end: i.saturating_sub(1),
                });
            }
        } else if seg_start.is_none() {
            seg_start = Some(i);
        }
    }

    // Last segment
    if let Some(start) = seg_start {
        segments.push(Segment {
            lines: lines[start..].to_vec(),
            start,
            end: lines.len() - 1,
        });
    }

    segments
}
