//! Text chunking with exact overlap and provenance tracking

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Metadata, Passage};

use super::adapters::{LoadedDocument, TextSegment};
use super::tabular;

/// Splits normalized text into overlapping passages.
///
/// Windows are `chunk_size` characters long. A window that does not reach the
/// end of the text is pulled back to the last occurrence of the highest
/// priority separator that still leaves a chunk of at least half the window
/// (and more than the overlap); when no separator qualifies the window is cut
/// at the character limit. The next window starts exactly `chunk_overlap`
/// characters before the previous one ended.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
    min_record_chars: usize,
    separators: Vec<Vec<char>>,
}

impl TextChunker {
    /// Create a chunker; fails with `Config` when overlap is not smaller than size
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            min_record_chars: config.min_record_chars,
            separators: config.separators.iter().map(|s| s.chars().collect()).collect(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk everything an adapter loaded, preserving source order
    pub fn chunk_document(&self, doc: LoadedDocument) -> Vec<Passage> {
        match doc {
            LoadedDocument::Text(segments) => segments
                .into_iter()
                .flat_map(|TextSegment { text, metadata }| self.split(&text, &metadata))
                .collect(),
            LoadedDocument::Rows(rows) => {
                tabular::coalesce_records(&rows, self.min_record_chars, self.chunk_size)
            }
        }
    }

    /// Split one text into passages carrying `metadata` plus `chunk_index`
    /// and `char_start` (offset into the normalized text)
    pub fn split(&self, text: &str, metadata: &Metadata) -> Vec<Passage> {
        let normalized = normalize_whitespace(text);
        let chars: Vec<char> = normalized.chars().collect();
        let total = chars.len();

        let mut passages = Vec::new();
        let mut start = 0usize;

        while start < total {
            let mut end = (start + self.chunk_size).min(total);
            if end < total {
                end = self.boundary(&chars, start, end);
            }

            let content: String = chars[start..end].iter().collect();
            if !content.trim().is_empty() {
                let mut meta = metadata.clone();
                meta.insert("chunk_index".to_string(), passages.len().to_string());
                meta.insert("char_start".to_string(), start.to_string());
                passages.push(Passage::new(content, meta));
            }

            if end >= total {
                break;
            }
            start = end - self.overlap;
        }

        passages
    }

    /// Pick the end of a window that stops short of the text end
    fn boundary(&self, chars: &[char], start: usize, end: usize) -> usize {
        let min_len = (self.overlap + 1).max(self.chunk_size / 2);

        for sep in &self.separators {
            // The chunk keeps the separator's leading punctuation and drops
            // its trailing whitespace.
            let keep = sep.iter().rev().skip_while(|c| c.is_whitespace()).count();
            if sep.len() > end - start {
                continue;
            }

            let mut pos = end - sep.len();
            loop {
                let cut = pos + keep;
                if cut < start + min_len {
                    break;
                }
                if chars[pos..pos + sep.len()] == sep[..] {
                    return cut;
                }
                if pos == start {
                    break;
                }
                pos -= 1;
            }
        }

        end
    }
}

/// Collapse every run of whitespace to one space and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunker(size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(&ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            ..Default::default()
        })
        .unwrap()
    }

    fn starts(passages: &[Passage]) -> Vec<usize> {
        passages
            .iter()
            .map(|p| p.metadata["char_start"].parse().unwrap())
            .collect()
    }

    const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do \
        eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim \
        veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo \
        consequat. Duis aute irure dolor in reprehenderit in voluptate velit esse cillum \
        dolore eu fugiat nulla pariatur. ";

    fn lorem(len: usize) -> String {
        LOREM.chars().cycle().take(len).collect()
    }

    #[test]
    fn test_overlap_not_smaller_than_size_is_config_error() {
        let config = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 150,
            ..Default::default()
        };
        assert!(matches!(
            TextChunker::new(&config),
            Err(crate::error::Error::Config(_))
        ));
    }

    #[test]
    fn test_unbroken_text_splits_at_exact_offsets() {
        let text = "x".repeat(1500);
        let passages = chunker(600, 100).split(&text, &Metadata::new());

        assert_eq!(passages.len(), 3);
        assert_eq!(starts(&passages), vec![0, 500, 1000]);
        assert_eq!(passages[0].content.chars().count(), 600);
        assert_eq!(passages[1].content.chars().count(), 600);
        assert_eq!(passages[2].content.chars().count(), 500);
    }

    #[test]
    fn test_lorem_ipsum_three_chunks() {
        let text = lorem(1500);
        let passages = chunker(600, 100).split(&text, &Metadata::new());

        assert_eq!(passages.len(), 3);
        let offsets = starts(&passages);
        assert_eq!(offsets[0], 0);
        // Separator pull-back shifts later starts by at most half a window
        assert!(offsets[1] >= 200 && offsets[1] <= 500, "{:?}", offsets);
        assert!(offsets[2] > offsets[1] && offsets[2] <= 1000, "{:?}", offsets);
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        let text = format!("{}. {}", "a".repeat(70), "b".repeat(60));
        let passages = chunker(100, 10).split(&text, &Metadata::new());

        assert!(passages[0].content.ends_with('.'));
        assert_eq!(passages[0].content.chars().count(), 71);
    }

    #[test]
    fn test_whitespace_normalized_and_blank_dropped() {
        let passages = chunker(100, 10).split("  hello \n\n\t world  ", &Metadata::new());
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].content, "hello world");

        assert!(chunker(100, 10).split(" \n\t ", &Metadata::new()).is_empty());
    }

    #[test]
    fn test_metadata_carried_and_indexed() {
        let mut meta = Metadata::new();
        meta.insert("source".to_string(), "notes.txt".to_string());

        let passages = chunker(50, 5).split(&lorem(200), &meta);
        for (i, p) in passages.iter().enumerate() {
            assert_eq!(p.metadata["source"], "notes.txt");
            assert_eq!(p.metadata["chunk_index"], i.to_string());
        }
    }

    proptest! {
        #[test]
        fn prop_adjacent_chunks_overlap_exactly(
            words in prop::collection::vec("[a-z]{1,12}", 1..400),
            size in 20usize..300,
            overlap_frac in 0.0f64..0.9,
        ) {
            let overlap = ((size as f64) * overlap_frac) as usize;
            let text = words.join(" ");
            let c = chunker(size, overlap);
            let passages = c.split(&text, &Metadata::new());
            let normalized: Vec<char> = normalize_whitespace(&text).chars().collect();

            for pair in passages.windows(2) {
                let a_start: usize = pair[0].metadata["char_start"].parse().unwrap();
                let b_start: usize = pair[1].metadata["char_start"].parse().unwrap();
                let a_end = a_start + pair[0].content.chars().count();
                prop_assert_eq!(a_end - b_start, overlap);
            }
            for p in &passages {
                let start: usize = p.metadata["char_start"].parse().unwrap();
                let len = p.content.chars().count();
                prop_assert!(len <= size);
                let slice: String = normalized[start..start + len].iter().collect();
                prop_assert_eq!(&slice, &p.content);
            }
            if let Some(last) = passages.last() {
                let start: usize = last.metadata["char_start"].parse().unwrap();
                prop_assert_eq!(start + last.content.chars().count(), normalized.len());
            }
        }
    }
}
