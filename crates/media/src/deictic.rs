//! Phrase detection for deictic media references ("the last image", "image
//! 2", "both of them").

use once_cell::sync::Lazy;
use regex::Regex;

use agentrt_domain::media::MediaKind;

#[derive(Debug, Clone, PartialEq)]
pub enum DeicticReference {
    /// "the/that/this image|video|photo" with no ordinal: newest of that
    /// kind. `kind: None` covers a bare pronoun ("it", "this", "that") with
    /// no noun attached: newest handle of any kind.
    Singular { kind: Option<MediaKind> },
    /// "image N" / "the Nth image": the N-th item (1-indexed) of that kind.
    Ordinal { kind: MediaKind, index: usize },
    /// "both", "these", "all of them": every handle from the most recent
    /// turn that contained media.
    Plural,
}

static ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:image|photo|video)\s*(\d+)\b|\bthe\s+(\d+)(?:st|nd|rd|th)\s+(?:image|photo|video)\b").unwrap());

static SINGULAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:the|that|this)\s+(image|photo|video)\b").unwrap());

static PLURAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(both|these|all of them|all of these)\b").unwrap());

/// A bare pronoun with no noun attached ("make it blue", "redo this",
/// "change that"). Checked only after the ordinal/singular/plural phrases
/// above fail to match; the resolver only honors it when prior media
/// actually exists in history, so a sentence like "this is great" with no
/// media in scope still just degrades to no reference.
static BARE_PRONOUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(it|this|that)\b").unwrap());

fn kind_from_word(word: &str) -> MediaKind {
    match word.to_lowercase().as_str() {
        "video" => MediaKind::Video,
        _ => MediaKind::Image,
    }
}

/// Finds the highest-priority deictic reference in `text`: ordinal, then
/// singular, then plural.
pub fn detect(text: &str) -> Option<DeicticReference> {
    if let Some(caps) = ORDINAL_RE.captures(text) {
        let index: usize = caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(1);
        let kind = if text.to_lowercase().contains("video") { MediaKind::Video } else { MediaKind::Image };
        return Some(DeicticReference::Ordinal { kind, index: index.max(1) });
    }
    if let Some(caps) = SINGULAR_RE.captures(text) {
        let kind_word = caps.get(1).map(|m| m.as_str()).unwrap_or("image");
        return Some(DeicticReference::Singular { kind: Some(kind_from_word(kind_word)) });
    }
    if PLURAL_RE.is_match(text) {
        return Some(DeicticReference::Plural);
    }
    if BARE_PRONOUN_RE.is_match(text) {
        return Some(DeicticReference::Singular { kind: None });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_singular_deictic() {
        assert_eq!(detect("use the image as a base"), Some(DeicticReference::Singular { kind: Some(MediaKind::Image) }));
    }

    #[test]
    fn detects_bare_pronoun_with_no_noun() {
        assert_eq!(detect("make it blue"), Some(DeicticReference::Singular { kind: None }));
    }

    #[test]
    fn detects_ordinal() {
        assert_eq!(detect("use image 2 for the background"), Some(DeicticReference::Ordinal { kind: MediaKind::Image, index: 2 }));
    }

    #[test]
    fn detects_plural() {
        assert_eq!(detect("combine both into a collage"), Some(DeicticReference::Plural));
    }

    #[test]
    fn no_reference_found() {
        assert_eq!(detect("write me a poem about autumn"), None);
    }
}
