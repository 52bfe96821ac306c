//! Sentence-level reply splitter.
//!
//! A model reply is broken after every `。` and `？`, and on existing line
//! breaks, so each sentence arrives as its own chat bubble. LINE accepts at
//! most five messages per reply; when splitting would produce more, the reply
//! is sent unsplit as a single message.

/// Maximum messages in one reply call.
pub const MAX_REPLY_SEGMENTS: usize = 5;

/// Characters that end a sentence.
const TERMINATORS: [char; 2] = ['。', '？'];

/// Split `reply` into at most [`MAX_REPLY_SEGMENTS`] messages.
pub fn split_reply(reply: &str) -> Vec<String> {
    split_reply_with_limit(reply, MAX_REPLY_SEGMENTS)
}

/// Split `reply` into sentence segments, or return it whole when the
/// segment count exceeds `limit`.
///
/// Segments are trimmed, blank ones are dropped, and one trailing terminator
/// is removed from each. A blank reply yields no segments.
pub fn split_reply_with_limit(reply: &str, limit: usize) -> Vec<String> {
    let segments = split_sentences(reply);
    if segments.len() > limit {
        return vec![reply.to_string()];
    }
    segments
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch == '\n' {
            push_segment(&mut segments, &current);
            current.clear();
            continue;
        }
        current.push(ch);
        if TERMINATORS.contains(&ch) {
            push_segment(&mut segments, &current);
            current.clear();
        }
    }
    push_segment(&mut segments, &current);

    segments
}

fn push_segment(segments: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_suffix(|c: char| TERMINATORS.contains(&c))
        .unwrap_or(trimmed);
    // A lone terminator strips down to nothing; LINE rejects empty texts.
    if !stripped.is_empty() {
        segments.push(stripped.to_string());
    }
}
