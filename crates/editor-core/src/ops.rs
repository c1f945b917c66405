use serde::{Deserialize, Serialize};

/// Inline formats that toggle on and off around a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineFormat {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
}

impl InlineFormat {
    /// Markup tag used to serialize the format.
    pub fn tag(self) -> &'static str {
        match self {
            InlineFormat::Bold => "strong",
            InlineFormat::Italic => "em",
            InlineFormat::Underline => "u",
            InlineFormat::Strikethrough => "s",
            InlineFormat::Superscript => "sup",
            InlineFormat::Subscript => "sub",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_css(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Ordered => "ol",
            ListKind::Unordered => "ul",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockLevel {
    #[default]
    Paragraph,
    Heading(u8),
}

impl BlockLevel {
    pub const MAX_HEADING: u8 = 6;

    pub fn tag(self) -> String {
        match self {
            BlockLevel::Paragraph => "p".to_string(),
            BlockLevel::Heading(level) => format!("h{level}"),
        }
    }

    /// Accepts `p`, `paragraph`, `1`..`6` and `h1`..`h6`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().trim_start_matches('<').trim_end_matches('>');
        let lower = value.to_ascii_lowercase();
        if lower == "p" || lower == "paragraph" {
            return Some(BlockLevel::Paragraph);
        }
        let digits = lower.strip_prefix('h').unwrap_or(&lower);
        let level: u8 = digits.parse().ok()?;
        (1..=Self::MAX_HEADING)
            .contains(&level)
            .then_some(BlockLevel::Heading(level))
    }
}

/// A low-level editing operation understood by an [`EditableSurface`].
///
/// [`EditableSurface`]: crate::EditableSurface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Primitive {
    ToggleInline { format: InlineFormat },
    SetAlignment { align: Alignment },
    ToggleList { kind: ListKind },
    SetBlockLevel { level: BlockLevel },
    SetForegroundColor { color: String },
    SetBackgroundColor { color: String },
    ClearFormatting,
    InsertMarkup { markup: String },
}

impl Primitive {
    pub fn insert_markup(markup: impl Into<String>) -> Self {
        Primitive::InsertMarkup {
            markup: markup.into(),
        }
    }
}
