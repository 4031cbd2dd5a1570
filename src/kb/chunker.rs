//! Overlapping character-window splitter.

/// Splits raw text into overlapping windows, preferring to cut at a sentence
/// ending near the window tail.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        if total == 0 {
            return Vec::new();
        }

        let step = self.chunk_size.saturating_sub(self.overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            let window: String = chars[start..end].iter().collect();

            // Only trim interior windows; the final one keeps its tail.
            let piece = if end < total {
                trim_to_sentence_boundary(&window)
            } else {
                window
            };

            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            start += step;
        }

        chunks
    }
}

/// Cut the window at the last sentence ending in its final fifth, if any.
fn trim_to_sentence_boundary(text: &str) -> String {
    const ENDINGS: [&str; 6] = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    let total_chars = text.chars().count();
    let search_from_char = total_chars * 4 / 5;
    let search_from_byte = text
        .char_indices()
        .nth(search_from_char)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let tail = &text[search_from_byte..];

    for ending in ENDINGS {
        if let Some(pos) = tail.rfind(ending) {
            return text[..search_from_byte + pos + ending.len()].to_string();
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_with_overlap() {
        let chunker = TextChunker::new(100, 20);
        let text = "This is a sentence. ".repeat(20);
        let chunks = chunker.split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunker = TextChunker::new(1000, 200);
        let chunks = chunker.split("just a short note");
        assert_eq!(chunks, vec!["just a short note".to_string()]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        let chunker = TextChunker::new(100, 10);
        assert!(chunker.split("").is_empty());
    }

    #[test]
    fn prefers_sentence_boundaries() {
        let chunker = TextChunker::new(50, 10);
        let text = "Short intro. A second sentence that runs on. The third one continues past the window edge for sure.";
        let chunks = chunker.split(text);
        // An interior chunk trimmed at a boundary ends with a period.
        assert!(chunks[0].ends_with('.'));
    }

    #[test]
    fn survives_multibyte_text() {
        let chunker = TextChunker::new(40, 8);
        let text = "Büro-Führung für alle. こんにちは世界。".repeat(10);
        // Must not panic on non-ASCII boundaries.
        let chunks = chunker.split(&text);
        assert!(!chunks.is_empty());
    }
}
