//! Tokenization, stopword filtering and the deterministic stemmer.
//!
//! Keyword matching only ever compares stems to stems: catalog keywords and
//! query tokens both pass through [`stem`], so the stemmer needs to be
//! deterministic and cheap, not linguistically perfect.

const STOPWORDS: &[&str] = &[
    "a", "about", "am", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by", "can",
    "could", "do", "does", "for", "from", "had", "has", "have", "i", "if", "in", "is", "it",
    "its", "me", "my", "no", "not", "of", "on", "or", "our", "please", "so", "some", "than",
    "that", "the", "their", "them", "there", "these", "they", "this", "those", "to", "us", "was",
    "we", "were", "what", "when", "where", "which", "who", "will", "with", "would", "you", "your",
];

/// Generic search verbs stripped from the residual query text.
pub const GENERIC_SEARCH_VERBS: &[&str] = &["find", "search", "looking", "want", "get"];

#[must_use]
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Lowercase and split into word tokens. Digits survive as their own tokens
/// (time extraction needs them); intra-word apostrophes are kept so "moe's"
/// stays one token.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Deterministic suffix-stripping stemmer for English tokens.
///
/// Handles possessives, common plural forms and -ing/-ed/-ly endings. Length
/// guards keep short words ("bus", "sing") intact.
#[must_use]
pub fn stem(token: &str) -> String {
    let mut word = token.trim_matches('\'').to_string();

    if let Some(stripped) = word.strip_suffix("'s") {
        word = stripped.to_string();
    }

    if word.len() > 4 && word.ends_with("ies") {
        word.truncate(word.len() - 3);
        word.push('y');
    } else if word.ends_with("sses") {
        word.truncate(word.len() - 2);
    } else if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us")
    {
        word.truncate(word.len() - 1);
    }

    if word.len() >= 6 && word.ends_with("ing") {
        word.truncate(word.len() - 3);
    } else if word.len() >= 5 && word.ends_with("ed") {
        word.truncate(word.len() - 2);
    } else if word.len() >= 5 && word.ends_with("ly") {
        word.truncate(word.len() - 2);
    }

    word
}
