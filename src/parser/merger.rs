//! Merging of text lines into logical paragraphs.

use serde::{Deserialize, Serialize};

use crate::model::TextBlock;

use super::layout::push_joined;
use super::options::MergeOptions;

/// Characters that end a sentence.
const TERMINAL_PUNCTUATION: &[char] = &['.', '!', '?', ';', ':', '。', '！', '？', '；', '：', '…'];

/// Closing quotes and brackets that may follow terminal punctuation.
const CLOSING_MARKS: &[char] = &['"', '\'', '”', '’', '」', '』', ')', '）'];

/// A paragraph vertical gap larger than this many font sizes starts a new paragraph.
const PARAGRAPH_GAP_FACTOR: f32 = 2.0;

/// A logical paragraph with the page it starts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Page on which the paragraph starts (1-indexed)
    pub page: u32,
    /// Paragraph text
    pub text: String,
}

/// Merge text blocks into logical paragraphs.
pub fn merge(blocks: &[TextBlock], options: &MergeOptions) -> Vec<String> {
    merge_paragraphs(blocks, options)
        .into_iter()
        .map(|p| p.text)
        .collect()
}

/// Merge text blocks into paragraphs tagged with their starting page.
///
/// Blocks are stably ordered by page. Without `merge_wrapped_lines` every
/// block is its own paragraph. With `split_by_page`, no paragraph crosses a
/// page boundary.
pub fn merge_paragraphs(blocks: &[TextBlock], options: &MergeOptions) -> Vec<Paragraph> {
    let mut ordered: Vec<&TextBlock> = blocks.iter().filter(|b| !b.is_blank()).collect();
    ordered.sort_by_key(|b| b.page);

    let mut paragraphs: Vec<Paragraph> = Vec::new();
    let mut prev: Option<&TextBlock> = None;

    for block in ordered {
        let join = match (prev, paragraphs.last()) {
            (Some(prev), Some(current)) => should_join(prev, block, &current.text, options),
            _ => false,
        };

        if join {
            if let Some(current) = paragraphs.last_mut() {
                push_joined(&mut current.text, &block.text);
            }
        } else {
            paragraphs.push(Paragraph {
                page: block.page,
                text: block.text.clone(),
            });
        }
        prev = Some(block);
    }

    paragraphs
}

/// Decide whether `next` continues the paragraph ending in `current`.
fn should_join(prev: &TextBlock, next: &TextBlock, current: &str, options: &MergeOptions) -> bool {
    if !options.merge_wrapped_lines {
        return false;
    }

    if prev.page != next.page {
        if options.split_by_page {
            return false;
        }
    } else {
        let font_size = prev.font_size.max(next.font_size);
        if prev.y - next.y > font_size * PARAGRAPH_GAP_FACTOR {
            return false;
        }
    }

    if let Some(limit) = options.max_paragraph_chars {
        if current.chars().count() >= limit {
            return false;
        }
    }

    if ends_sentence(current) {
        return false;
    }

    // An uppercase letter starts a new sentence; CJK, lowercase, digits
    // and punctuation continue the current one.
    match next.text.trim_start().chars().next() {
        Some(c) => !c.is_uppercase(),
        None => false,
    }
}

/// Check if text ends with terminal punctuation, ignoring closing quotes.
fn ends_sentence(text: &str) -> bool {
    text.trim_end()
        .trim_end_matches(CLOSING_MARKS)
        .ends_with(TERMINAL_PUNCTUATION)
}
