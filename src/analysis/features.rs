use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());
static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+\s*").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
// `regex` has no lookbehind: the leading whitespace is consumed and the tag
// itself is captured.
static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)(#[\w_]+)").unwrap());
static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)(@[\w_]+)").unwrap());

/// Faces, misc symbols and pictographs, transport, regional indicators,
/// dingbats, supplemental symbols.
const EMOJI_RANGES: [(u32, u32); 6] = [
    (0x1F600, 0x1F64F),
    (0x1F300, 0x1F5FF),
    (0x1F680, 0x1F6FF),
    (0x1F1E0, 0x1F1FF),
    (0x2700, 0x27BF),
    (0x1F900, 0x1F9FF),
];

#[derive(Debug, Clone, PartialEq)]
pub struct TextFeatures {
    pub word_count: usize,
    pub char_count: usize,
    pub sentence_count: usize,
    pub avg_sentence_len: f64,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub links: Vec<String>,
    pub emoji_count: usize,
}

/// Structural and social-cue features of already trimmed text.
pub fn extract_text_features(clean: &str) -> TextFeatures {
    let word_count = count_words(clean);
    let sentence_count = split_sentences(clean).len();
    let avg_sentence_len = if sentence_count == 0 {
        0.0
    } else {
        word_count as f64 / sentence_count as f64
    };

    TextFeatures {
        word_count,
        char_count: clean.chars().count(),
        sentence_count,
        avg_sentence_len,
        hashtags: captured_tags(&HASHTAG_RE, clean),
        mentions: captured_tags(&MENTION_RE, clean),
        links: URL_RE
            .find_iter(clean)
            .map(|found| found.as_str().to_string())
            .collect(),
        emoji_count: clean.chars().filter(|&ch| is_emoji(ch)).count(),
    }
}

pub fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD_RE.find_iter(text).map(|found| found.as_str())
}

pub fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_SPLIT_RE
        .split(text)
        .filter(|sentence| !sentence.trim().is_empty())
        .collect()
}

pub fn is_emoji(ch: char) -> bool {
    let code = ch as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| code >= start && code <= end)
}

fn captured_tags(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|tag| tag.as_str().to_string())
        .collect()
}
