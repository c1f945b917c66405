use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::ops::{Alignment, BlockLevel, InlineFormat, ListKind, Primitive};
use crate::surface::EditableSurface;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("hex color pattern is valid")
});

/// Identifier of an entry in the [`CommandTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatId {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    AlignLeft,
    AlignCenter,
    AlignRight,
    AlignJustify,
    OrderedList,
    UnorderedList,
    Heading,
    Superscript,
    Subscript,
    RemoveFormat,
    TextColor,
    BackgroundColor,
    InsertLink,
    InsertImage,
    InsertTable,
    InsertRule,
    InsertQuote,
}

impl FormatId {
    pub const ALL: [FormatId; 21] = [
        FormatId::Bold,
        FormatId::Italic,
        FormatId::Underline,
        FormatId::Strikethrough,
        FormatId::AlignLeft,
        FormatId::AlignCenter,
        FormatId::AlignRight,
        FormatId::AlignJustify,
        FormatId::OrderedList,
        FormatId::UnorderedList,
        FormatId::Heading,
        FormatId::Superscript,
        FormatId::Subscript,
        FormatId::RemoveFormat,
        FormatId::TextColor,
        FormatId::BackgroundColor,
        FormatId::InsertLink,
        FormatId::InsertImage,
        FormatId::InsertTable,
        FormatId::InsertRule,
        FormatId::InsertQuote,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormatId::Bold => "bold",
            FormatId::Italic => "italic",
            FormatId::Underline => "underline",
            FormatId::Strikethrough => "strikethrough",
            FormatId::AlignLeft => "align_left",
            FormatId::AlignCenter => "align_center",
            FormatId::AlignRight => "align_right",
            FormatId::AlignJustify => "align_justify",
            FormatId::OrderedList => "ordered_list",
            FormatId::UnorderedList => "unordered_list",
            FormatId::Heading => "heading",
            FormatId::Superscript => "superscript",
            FormatId::Subscript => "subscript",
            FormatId::RemoveFormat => "remove_format",
            FormatId::TextColor => "text_color",
            FormatId::BackgroundColor => "background_color",
            FormatId::InsertLink => "insert_link",
            FormatId::InsertImage => "insert_image",
            FormatId::InsertTable => "insert_table",
            FormatId::InsertRule => "insert_rule",
            FormatId::InsertQuote => "insert_quote",
        }
    }

    pub fn inline_format(self) -> Option<InlineFormat> {
        match self {
            FormatId::Bold => Some(InlineFormat::Bold),
            FormatId::Italic => Some(InlineFormat::Italic),
            FormatId::Underline => Some(InlineFormat::Underline),
            FormatId::Strikethrough => Some(InlineFormat::Strikethrough),
            FormatId::Superscript => Some(InlineFormat::Superscript),
            FormatId::Subscript => Some(InlineFormat::Subscript),
            _ => None,
        }
    }

    pub fn alignment(self) -> Option<Alignment> {
        match self {
            FormatId::AlignLeft => Some(Alignment::Left),
            FormatId::AlignCenter => Some(Alignment::Center),
            FormatId::AlignRight => Some(Alignment::Right),
            FormatId::AlignJustify => Some(Alignment::Justify),
            _ => None,
        }
    }

    pub fn list_kind(self) -> Option<ListKind> {
        match self {
            FormatId::OrderedList => Some(ListKind::Ordered),
            FormatId::UnorderedList => Some(ListKind::Unordered),
            _ => None,
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| CommandError::Unknown(s.to_string()))
    }
}

type PrimitiveBuilder =
    Arc<dyn Fn(Option<&str>) -> Result<Primitive, CommandError> + Send + Sync>;

/// One row of the [`CommandTable`]: how to apply a command and whether its
/// state can be queried.
#[derive(Clone)]
pub struct CommandSpec {
    pub id: FormatId,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub args_example: Option<String>,
    pub tracks_active: bool,
    pub primitive: PrimitiveBuilder,
}

impl CommandSpec {
    pub fn new(
        id: FormatId,
        label: impl Into<String>,
        primitive: impl Fn(Option<&str>) -> Result<Primitive, CommandError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            args_example: None,
            tracks_active: false,
            primitive: Arc::new(primitive),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn args_example(mut self, args_example: impl Into<String>) -> Self {
        self.args_example = Some(args_example.into());
        self
    }

    pub fn tracks_active(mut self, tracks_active: bool) -> Self {
        self.tracks_active = tracks_active;
        self
    }

    pub fn primitive(&self, argument: Option<&str>) -> Result<Primitive, CommandError> {
        (self.primitive)(argument)
    }

    pub fn apply(
        &self,
        surface: &mut dyn EditableSurface,
        argument: Option<&str>,
    ) -> Result<(), CommandError> {
        let primitive = self.primitive(argument)?;
        surface
            .apply_primitive(&primitive)
            .map_err(|source| CommandError::Surface {
                command: self.id.as_str(),
                source,
            })
    }

    /// Whether the format is in effect at the current selection.
    ///
    /// Query failures count as inactive.
    pub fn is_active(&self, surface: &dyn EditableSurface) -> bool {
        if !self.tracks_active {
            return false;
        }
        match surface.query_format(self.id) {
            Ok(active) => active,
            Err(err) => {
                tracing::trace!(command = %self.id, error = %err, "format query failed");
                false
            }
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("tracks_active", &self.tracks_active)
            .finish_non_exhaustive()
    }
}

/// Registry of every formatting command the toolbar can dispatch.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    commands: BTreeMap<FormatId, CommandSpec>,
}

impl CommandTable {
    pub fn new(specs: impl IntoIterator<Item = CommandSpec>) -> Result<Self, String> {
        let mut table = Self::default();
        for spec in specs {
            table.register(spec)?;
        }
        Ok(table)
    }

    pub fn standard() -> Self {
        let mut specs: Vec<CommandSpec> = Vec::new();
        specs.extend(inline_commands());
        specs.extend(block_commands());
        specs.extend(color_commands());
        specs.extend(insert_commands());
        Self::new(specs).expect("standard command table must be valid")
    }

    pub fn register(&mut self, spec: CommandSpec) -> Result<(), String> {
        if self.commands.contains_key(&spec.id) {
            return Err(format!("Duplicate command id: {}", spec.id));
        }
        self.commands.insert(spec.id, spec);
        Ok(())
    }

    pub fn command(&self, id: FormatId) -> Option<&CommandSpec> {
        self.commands.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn inline_commands() -> Vec<CommandSpec> {
    let rows = [
        (FormatId::Bold, "Bold", ["bold", "strong"]),
        (FormatId::Italic, "Italic", ["italic", "emphasis"]),
        (FormatId::Underline, "Underline", ["underline", "u"]),
        (FormatId::Strikethrough, "Strikethrough", ["strikethrough", "strike"]),
        (FormatId::Superscript, "Superscript", ["superscript", "sup"]),
        (FormatId::Subscript, "Subscript", ["subscript", "sub"]),
    ];
    rows.into_iter()
        .filter_map(|(id, label, keywords)| {
            let format = id.inline_format()?;
            Some(
                CommandSpec::new(id, label, move |_| Ok(Primitive::ToggleInline { format }))
                    .description(format!("Toggle {} on the selection or caret.", label.to_lowercase()))
                    .keywords(keywords)
                    .tracks_active(true),
            )
        })
        .collect()
}

fn block_commands() -> Vec<CommandSpec> {
    let mut specs: Vec<CommandSpec> = [
        (FormatId::AlignLeft, "Align left"),
        (FormatId::AlignCenter, "Align center"),
        (FormatId::AlignRight, "Align right"),
        (FormatId::AlignJustify, "Justify"),
    ]
    .into_iter()
    .filter_map(|(id, label)| {
        let align = id.alignment()?;
        Some(
            CommandSpec::new(id, label, move |_| Ok(Primitive::SetAlignment { align }))
                .description("Set the alignment of the current block.")
                .keywords(["align", "alignment", align.as_css()])
                .tracks_active(true),
        )
    })
    .collect();

    specs.extend(
        [
            (FormatId::OrderedList, "Numbered list"),
            (FormatId::UnorderedList, "Bulleted list"),
        ]
        .into_iter()
        .filter_map(|(id, label)| {
            let kind = id.list_kind()?;
            Some(
                CommandSpec::new(id, label, move |_| Ok(Primitive::ToggleList { kind }))
                    .description("Toggle a list around the current block.")
                    .keywords(["list", kind.tag()])
                    .tracks_active(true),
            )
        }),
    );

    specs.push(
        CommandSpec::new(FormatId::Heading, "Heading", |argument| {
            let value = argument.ok_or(CommandError::MissingArgument {
                command: FormatId::Heading.as_str(),
                expected: "h1..h6 or p",
            })?;
            let level = BlockLevel::parse(value).ok_or_else(|| CommandError::InvalidArgument {
                command: FormatId::Heading.as_str(),
                value: value.to_string(),
            })?;
            Ok(Primitive::SetBlockLevel { level })
        })
        .description("Turn the current block into a heading or back into a paragraph.")
        .keywords(["heading", "title", "paragraph", "h1", "h2", "h3"])
        .args_example("h2")
        .tracks_active(true),
    );

    specs.push(
        CommandSpec::new(FormatId::RemoveFormat, "Clear formatting", |_| {
            Ok(Primitive::ClearFormatting)
        })
        .description("Remove all inline formatting from the selection.")
        .keywords(["clear", "remove", "reset", "plain"]),
    );

    specs
}

fn color_argument(command: FormatId, argument: Option<&str>) -> Result<String, CommandError> {
    let value = argument
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(CommandError::MissingArgument {
            command: command.as_str(),
            expected: "hex color",
        })?;
    if !HEX_COLOR.is_match(value) {
        return Err(CommandError::InvalidArgument {
            command: command.as_str(),
            value: value.to_string(),
        });
    }
    Ok(value.to_ascii_lowercase())
}

fn color_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new(FormatId::TextColor, "Text color", |argument| {
            let color = color_argument(FormatId::TextColor, argument)?;
            Ok(Primitive::SetForegroundColor { color })
        })
        .description("Set the text color (expects a hex string).")
        .keywords(["color", "text color", "foreground", "fg"])
        .args_example("#ff0000"),
        CommandSpec::new(FormatId::BackgroundColor, "Highlight color", |argument| {
            let color = color_argument(FormatId::BackgroundColor, argument)?;
            Ok(Primitive::SetBackgroundColor { color })
        })
        .description("Set the background (highlight) color (expects a hex string).")
        .keywords(["highlight", "background", "bg", "color"])
        .args_example("#fff59d"),
    ]
}

fn insert_commands() -> Vec<CommandSpec> {
    [
        (FormatId::InsertLink, "Insert link", "<a href=\"https://example.com\">example</a>"),
        (FormatId::InsertImage, "Insert image", "<img src=\"https://example.com/a.png\" />"),
        (FormatId::InsertTable, "Insert table", "<table>...</table>"),
        (FormatId::InsertRule, "Insert divider", "<hr />"),
        (FormatId::InsertQuote, "Insert quote", "<blockquote>...</blockquote>"),
    ]
    .into_iter()
    .map(|(id, label, example)| {
        CommandSpec::new(id, label, move |argument| {
            let markup = argument
                .filter(|markup| !markup.trim().is_empty())
                .ok_or(CommandError::MissingArgument {
                    command: id.as_str(),
                    expected: "markup fragment",
                })?;
            Ok(Primitive::insert_markup(markup))
        })
        .description("Insert a prepared markup fragment at the selection.")
        .keywords(["insert", label])
        .args_example(example)
    })
    .collect()
}
