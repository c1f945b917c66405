//! Pure markup builders for structured insertions.
//!
//! Every builder validates its parameters first and produces nothing on
//! failure; the engine then leaves the document and history untouched.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::command::FormatId;
use crate::error::InsertError;

/// Value pre-filled in the host's URL input; submitting it unchanged means "no input".
pub const LINK_URL_PLACEHOLDER: &str = "https://";
pub const MAX_TABLE_DIMENSION: usize = 50;
pub const DEFAULT_TABLE_ROWS: usize = 3;
pub const DEFAULT_TABLE_COLS: usize = 3;

const BLOCK_MARGIN_PX: u32 = 16;
const TABLE_STYLE: &str = "width: 100%; border-collapse: collapse; margin: 16px 0;";
const CELL_STYLE: &str = "border: 1px solid #ddd; padding: 8px;";
const RULE_MARKUP: &str = "<hr style=\"border: none; border-top: 1px solid #ddd; margin: 24px 0;\" />";
const QUOTE_STYLE: &str =
    "border-left: 4px solid #ddd; margin: 16px 0; padding: 8px 16px; color: #555; font-style: italic;";
const QUOTE_PLACEHOLDER: &str = "Quote";
const EMBED_FRAME_STYLE: &str = "position: relative; padding-bottom: 56.25%; height: 0; overflow: hidden; margin: 16px 0;";
const EMBED_IFRAME_STYLE: &str =
    "position: absolute; top: 0; left: 0; width: 100%; height: 100%; border: 0;";

static CUSTOM_WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:\.\d+)?(?:px|%|em|rem|vw)$").expect("width pattern is valid")
});
static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|shorts/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("youtube pattern is valid")
});
static VIMEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.|player\.)?vimeo\.com/(?:video/)?(\d+)")
        .expect("vimeo pattern is valid")
});
/// A single empty `<iframe>` element with an https `src`.
static IFRAME_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^<iframe\s(?:[^<>]*\s)?src="https://[^"<>\s]+"[^<>]*>\s*</iframe>$"#)
        .expect("iframe pattern is valid")
});

/// Parameters for one structured insertion, however the host collected them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insertion {
    Link(LinkParams),
    Image(ImageParams),
    Table(TableParams),
    Rule,
    Quote,
    Embed(EmbedParams),
}

impl Insertion {
    pub fn kind(&self) -> &'static str {
        match self {
            Insertion::Link(_) => "link",
            Insertion::Image(_) => "image",
            Insertion::Table(_) => "table",
            Insertion::Rule => "rule",
            Insertion::Quote => "quote",
            Insertion::Embed(_) => "embed",
        }
    }

    /// Command table entry that owns this insertion, if any.
    pub fn command_id(&self) -> Option<FormatId> {
        match self {
            Insertion::Link(_) => Some(FormatId::InsertLink),
            Insertion::Image(_) => Some(FormatId::InsertImage),
            Insertion::Table(_) => Some(FormatId::InsertTable),
            Insertion::Rule => Some(FormatId::InsertRule),
            Insertion::Quote => Some(FormatId::InsertQuote),
            Insertion::Embed(_) => None,
        }
    }
}

/// What the builder may know about the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
    pub selected_text: Option<String>,
}

impl BuildContext {
    pub fn with_selection(text: impl Into<String>) -> Self {
        Self {
            selected_text: Some(text.into()),
        }
    }

    fn selection(&self) -> Option<&str> {
        self.selected_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkParams {
    pub url: String,
    /// Anchor text used when nothing is selected.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub new_tab: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSize {
    Small,
    #[default]
    Medium,
    Large,
    Full,
    Custom(String),
}

impl ImageSize {
    pub fn width(&self) -> Result<String, InsertError> {
        match self {
            ImageSize::Small => Ok("300px".to_string()),
            ImageSize::Medium => Ok("600px".to_string()),
            ImageSize::Large => Ok("900px".to_string()),
            ImageSize::Full => Ok("100%".to_string()),
            ImageSize::Custom(width) => {
                let width = width.trim();
                if CUSTOM_WIDTH.is_match(width) {
                    Ok(width.to_string())
                } else {
                    Err(InsertError::InvalidImageWidth(width.to_string()))
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl ImageAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            ImageAlign::Left => "left",
            ImageAlign::Center => "center",
            ImageAlign::Right => "right",
        }
    }

    pub fn margin(self) -> String {
        let m = BLOCK_MARGIN_PX;
        match self {
            ImageAlign::Center => format!("{m}px auto"),
            ImageAlign::Left => format!("{m}px 0 {m}px {m}px"),
            ImageAlign::Right => format!("{m}px {m}px {m}px 0"),
        }
    }
}

/// Image layout choices, known before the URL is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePlacement {
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub size: ImageSize,
    #[serde(default)]
    pub align: ImageAlign,
}

impl ImagePlacement {
    /// Checks the layout choices before any upload starts.
    pub fn validate(&self) -> Result<(), InsertError> {
        self.size.width().map(drop)
    }

    pub fn with_url(self, url: impl Into<String>) -> ImageParams {
        ImageParams {
            url: url.into(),
            alt: self.alt,
            size: self.size,
            align: self.align,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageParams {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub size: ImageSize,
    #[serde(default)]
    pub align: ImageAlign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableParams {
    pub rows: usize,
    pub cols: usize,
}

impl Default for TableParams {
    fn default() -> Self {
        Self {
            rows: DEFAULT_TABLE_ROWS,
            cols: DEFAULT_TABLE_COLS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedParams {
    /// A video page URL or ready-made `<iframe>` embed code.
    pub source: String,
}

pub fn build(insertion: &Insertion, cx: &BuildContext) -> Result<String, InsertError> {
    match insertion {
        Insertion::Link(params) => link_markup(params, cx),
        Insertion::Image(params) => image_markup(params),
        Insertion::Table(params) => table_markup(params),
        Insertion::Rule => Ok(rule_markup()),
        Insertion::Quote => Ok(quote_markup(cx)),
        Insertion::Embed(params) => embed_markup(params),
    }
}

fn validate_url(url: &str) -> Result<&str, InsertError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(InsertError::MissingUrl);
    }
    if url == LINK_URL_PLACEHOLDER {
        return Err(InsertError::PlaceholderUrl);
    }
    Ok(url)
}

pub fn link_markup(params: &LinkParams, cx: &BuildContext) -> Result<String, InsertError> {
    let url = validate_url(&params.url)?;
    let text = cx
        .selection()
        .or_else(|| params.text.as_deref().filter(|text| !text.trim().is_empty()))
        .unwrap_or(url);
    let target = if params.new_tab {
        " target=\"_blank\" rel=\"noopener noreferrer\""
    } else {
        ""
    };
    Ok(format!(
        "<a href=\"{}\"{target}>{}</a>",
        escape(url),
        escape(text)
    ))
}

pub fn image_markup(params: &ImageParams) -> Result<String, InsertError> {
    let url = validate_url(&params.url)?;
    let width = params.size.width()?;
    Ok(format!(
        "<div style=\"text-align: {}; margin: {};\"><img src=\"{}\" alt=\"{}\" style=\"width: {width}; max-width: 100%; height: auto;\" /></div>",
        params.align.as_css(),
        params.align.margin(),
        escape(url),
        escape(&params.alt),
    ))
}

pub fn table_markup(params: &TableParams) -> Result<String, InsertError> {
    let valid = 1..=MAX_TABLE_DIMENSION;
    if !valid.contains(&params.rows) || !valid.contains(&params.cols) {
        return Err(InsertError::InvalidTableSize {
            rows: params.rows,
            cols: params.cols,
            max: MAX_TABLE_DIMENSION,
        });
    }
    let cell = format!("<td style=\"{CELL_STYLE}\">&nbsp;</td>");
    let row = format!("<tr>{}</tr>", cell.repeat(params.cols));
    Ok(format!(
        "<table style=\"{TABLE_STYLE}\"><tbody>{}</tbody></table>",
        row.repeat(params.rows)
    ))
}

pub fn rule_markup() -> String {
    RULE_MARKUP.to_string()
}

pub fn quote_markup(cx: &BuildContext) -> String {
    let text = cx.selection().unwrap_or(QUOTE_PLACEHOLDER);
    format!(
        "<blockquote style=\"{QUOTE_STYLE}\">{}</blockquote>",
        escape(text)
    )
}

pub fn embed_markup(params: &EmbedParams) -> Result<String, InsertError> {
    let source = params.source.trim();
    if IFRAME_MARKUP.is_match(source) {
        return Ok(format!(
            "<div class=\"video-embed\" style=\"margin: 16px 0;\">{source}</div>"
        ));
    }
    let src = if let Some(caps) = YOUTUBE_URL.captures(source) {
        format!("https://www.youtube.com/embed/{}", &caps[1])
    } else if let Some(caps) = VIMEO_URL.captures(source) {
        format!("https://player.vimeo.com/video/{}", &caps[1])
    } else {
        return Err(InsertError::InvalidEmbedSource);
    };
    Ok(format!(
        "<div class=\"video-embed\" style=\"{EMBED_FRAME_STYLE}\"><iframe src=\"{src}\" style=\"{EMBED_IFRAME_STYLE}\" allowfullscreen></iframe></div>"
    ))
}

/// Escapes text for use inside markup content or a quoted attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup_metacharacters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn selection_takes_precedence_over_link_text() {
        let params = LinkParams {
            url: "https://example.com".to_string(),
            text: Some("fallback".to_string()),
            new_tab: false,
        };
        let cx = BuildContext::with_selection("picked");
        assert_eq!(
            link_markup(&params, &cx).unwrap(),
            "<a href=\"https://example.com\">picked</a>"
        );
        assert!(quote_markup(&BuildContext::with_selection("a < b")).contains(">a &lt; b</blockquote>"));
        assert!(quote_markup(&BuildContext::with_selection("   ")).contains(">Quote</blockquote>"));
    }

    #[test]
    fn embed_code_must_be_a_single_iframe() {
        let embed = |source: &str| {
            embed_markup(&EmbedParams {
                source: source.to_string(),
            })
        };
        assert!(embed(r#"<iframe src="https://player.example.com/1" allowfullscreen></iframe>"#).is_ok());
        assert_eq!(
            embed(r#"<iframe src="https://a/x"></iframe><script>steal()</script><iframe></iframe>"#),
            Err(InsertError::InvalidEmbedSource)
        );
        assert_eq!(
            embed(r#"<iframe srcdoc="<b>x</b>" src="https://a/x"></iframe>"#),
            Err(InsertError::InvalidEmbedSource)
        );
    }

    #[test]
    fn placement_validation_checks_custom_width() {
        assert!(ImagePlacement::default().validate().is_ok());
        let placement = ImagePlacement {
            size: ImageSize::Custom("huge".to_string()),
            ..ImagePlacement::default()
        };
        assert_eq!(
            placement.validate(),
            Err(InsertError::InvalidImageWidth("huge".to_string()))
        );
    }

    #[test]
    fn image_margins_follow_alignment() {
        assert_eq!(ImageAlign::Center.margin(), "16px auto");
        assert_eq!(ImageAlign::Left.margin(), "16px 0 16px 16px");
        assert_eq!(ImageAlign::Right.margin(), "16px 16px 16px 0");
    }
}
