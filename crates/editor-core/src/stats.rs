use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:p|div|h[1-6]|li|ul|ol|blockquote|table|tbody|thead|tr|td|th|br|hr|img|iframe)\b[^>]*>")
        .expect("block tag pattern is valid")
});
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:nbsp|amp|lt|gt|quot|apos|#39|#x27);").expect("entity pattern is valid")
});

/// The plain text of a markup document: tags removed, common entities decoded.
///
/// Block boundaries become spaces so adjacent paragraphs do not merge words.
pub fn plain_text(markup: &str) -> String {
    let spaced = BLOCK_TAG.replace_all(markup, " ");
    let stripped = TAG.replace_all(&spaced, "");
    ENTITY
        .replace_all(&stripped, |caps: &regex::Captures<'_>| {
            match &caps[0] {
                "&nbsp;" => " ",
                "&amp;" => "&",
                "&lt;" => "<",
                "&gt;" => ">",
                "&quot;" => "\"",
                _ => "'",
            }
            .to_string()
        })
        .into_owned()
}

pub fn word_count(markup: &str) -> usize {
    plain_text(markup).split_whitespace().count()
}

/// Characters of the plain text; stripped tags do not count.
pub fn char_count(markup: &str) -> usize {
    let stripped = TAG.replace_all(markup, "");
    ENTITY.replace_all(&stripped, "_").chars().count()
}
