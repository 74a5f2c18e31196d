use std::collections::{BTreeSet, HashSet};

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use mindcap_config::Keywords;

/// Function words that never count as shared evidence between two entries.
pub const BUILTIN_STOP_WORDS: &[&str] = &[
	// Vietnamese
	"là", "và", "của", "thì", "mà", "như", "để", "với", "cho", "về", "ở", "tại", "trong", "các",
	"những", "cái", "con", "người", "được", "bị", "khi", "lúc", "này", "đó", "kia", "nào", "ai",
	"gì", "sao", "không", "có", "một", "hai", "ba", "tôi", "bạn",
	// English
	"the", "an", "and", "or", "but", "if", "then", "of", "to", "in", "on", "at", "by", "for",
	"with", "from", "as", "is", "are", "was", "were", "be", "been", "am", "do", "does", "did",
	"have", "has", "had", "it", "its", "this", "that", "these", "those", "me", "my", "we", "our",
	"you", "your", "he", "she", "they", "them", "his", "her", "their", "not", "no", "so", "too",
	"very", "just", "can", "will", "would", "should", "could", "about", "into", "up", "out",
];

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
	stop_words: HashSet<String>,
	min_token_chars: usize,
}
impl KeywordExtractor {
	pub fn new(cfg: &Keywords) -> Self {
		let stop_words = BUILTIN_STOP_WORDS
			.iter()
			.map(|word| word.nfc().collect::<String>())
			.chain(cfg.extra_stop_words.iter().map(|word| normalize(word)))
			.collect();

		Self { stop_words, min_token_chars: cfg.min_token_chars.max(1) as usize }
	}

	pub fn extract(&self, text: &str) -> BTreeSet<String> {
		normalize(text)
			.split_whitespace()
			.filter(|token| token.chars().count() >= self.min_token_chars)
			.filter(|token| !self.stop_words.contains(*token))
			.map(str::to_string)
			.collect()
	}

	pub fn is_stop_word(&self, word: &str) -> bool {
		self.stop_words.contains(normalize(word).trim())
	}
}
impl Default for KeywordExtractor {
	fn default() -> Self {
		Self::new(&Keywords::default())
	}
}

/// Extracts keywords with the built-in stop words and the default token length.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
	KeywordExtractor::default().extract(text)
}

/// Keywords present in both sets, in sorted order.
pub fn find_common_keywords(left: &BTreeSet<String>, right: &BTreeSet<String>) -> Vec<String> {
	left.intersection(right).cloned().collect()
}

// Punctuation is deleted rather than replaced, so "follow-up" becomes "followup".
fn normalize(text: &str) -> String {
	text.chars()
		.flat_map(char::to_lowercase)
		.nfc()
		.filter(|ch| ch.is_alphanumeric() || ch.is_whitespace() || is_combining_mark(*ch))
		.collect()
}
