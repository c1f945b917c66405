use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::command::FormatId;
use crate::error::{QueryError, SurfaceError};
use crate::ops::{Alignment, BlockLevel, InlineFormat, ListKind, Primitive};

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
static BLOCK_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?P<tag>p|h[1-6])>").expect("block pattern is valid"));
static ALIGN_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(?P<tag>div) style="text-align: (?P<align>left|center|right|justify)">"#)
        .expect("alignment pattern is valid")
});
static CLOSING_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:</[a-z][a-z0-9]*>)+$").expect("closing tag pattern is valid"));

/// The editing capability the engine drives.
///
/// Implementations wrap a live editable view (a webview `contenteditable`, a
/// native text view, ...). [`MemorySurface`] is a headless implementation.
pub trait EditableSurface {
    /// Applies one primitive at the current selection.
    fn apply_primitive(&mut self, primitive: &Primitive) -> Result<(), SurfaceError>;

    /// Whether a format is in effect at the caret or across the whole selection.
    fn query_format(&self, id: FormatId) -> Result<bool, QueryError>;

    /// The serialized markup currently rendered.
    fn document(&self) -> String;

    /// Replaces the rendered markup wholesale.
    fn replace_document(&mut self, document: &str);

    /// The selected plain text, `None` for a collapsed selection.
    fn selected_text(&self) -> Option<String>;

    fn set_editable(&mut self, editable: bool);
}

/// An in-memory surface over a markup string with a byte-offset selection.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    markup: String,
    selection: Range<usize>,
    editable: bool,
    /// Inline formats switched on (`true`) or off (`false`) at a collapsed
    /// caret, applied to the next typed text.
    pending: BTreeMap<InlineFormat, bool>,
    rejected_queries: BTreeSet<FormatId>,
}

impl MemorySurface {
    pub fn new(markup: impl Into<String>) -> Self {
        let markup = markup.into();
        let end = markup.len();
        Self {
            markup,
            selection: end..end,
            editable: true,
            ..Default::default()
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_selection(&mut self, range: Range<usize>) {
        let (start, end) = if range.start <= range.end {
            (range.start, range.end)
        } else {
            (range.end, range.start)
        };
        self.selection = clamp_to_char_boundary(&self.markup, start)
            ..clamp_to_char_boundary(&self.markup, end);
        self.pending.clear();
    }

    pub fn select_all(&mut self) {
        self.set_selection(0..self.markup.len());
    }

    /// Selects the first occurrence of `needle`; returns whether it was found.
    pub fn select_text(&mut self, needle: &str) -> bool {
        match self.markup.find(needle) {
            Some(start) => {
                self.set_selection(start..start + needle.len());
                true
            }
            None => false,
        }
    }

    pub fn collapse_to_end(&mut self) {
        let end = self.markup.len();
        self.set_selection(end..end);
    }

    /// Simulates the author typing at the selection.
    ///
    /// Formats switched on at the caret wrap the typed text; formats switched
    /// off step out of their element, or split it when the caret is inside.
    pub fn type_text(&mut self, text: &str) -> bool {
        if !self.editable {
            return false;
        }
        let mut caret = self.selection.start;
        self.markup.replace_range(self.selection.clone(), "");

        let mut closes = String::new();
        let mut reopens = String::new();
        let mut opens = String::new();
        let mut closes_after = String::new();
        for (format, on) in &self.pending {
            let open = format!("<{}>", format.tag());
            let close = format!("</{}>", format.tag());
            if *on {
                opens.push_str(&open);
                closes_after.insert_str(0, &close);
            } else if self.markup[caret..].starts_with(&close) {
                caret += close.len();
            } else if self.markup[..caret].ends_with(&open) {
                caret -= open.len();
            } else {
                closes.push_str(&close);
                reopens.insert_str(0, &open);
            }
        }

        let fragment = format!("{closes}{opens}{text}{closes_after}{reopens}");
        let typed_end = caret + closes.len() + opens.len() + text.len();
        self.markup.insert_str(caret, &fragment);
        self.selection = typed_end..typed_end;
        self.pending.clear();
        true
    }

    /// Makes every later query for `id` fail.
    pub fn reject_queries_for(&mut self, id: FormatId) {
        self.rejected_queries.insert(id);
    }

    fn selected(&self) -> &str {
        &self.markup[self.selection.clone()]
    }

    /// Widens a collapsed selection to its enclosing block, or to the whole
    /// document when the caret is outside any block.
    fn expand_collapsed_to_block(&mut self) {
        if !self.selection.is_empty() {
            return;
        }
        self.selection = match self.enclosing_element(&BLOCK_OPEN) {
            Some((open, close)) => open.start..close.end,
            None => 0..self.markup.len(),
        };
    }

    /// Open and close tag ranges of the nearest `open` element around the
    /// selection. A caret right after closing tags counts as inside them.
    fn enclosing_element(&self, open: &Regex) -> Option<(Range<usize>, Range<usize>)> {
        let Range { mut start, mut end } = self.selection.clone();
        if start == end
            && let Some(run) = CLOSING_RUN.find(&self.markup[..start])
        {
            start = run.start();
            end = start;
        }
        let caps = open.captures_iter(&self.markup[..start]).last()?;
        let open_tag = caps.get(0)?.range();
        let close = format!("</{}>", &caps["tag"]);
        if self.markup[open_tag.end..end].contains(&close) {
            return None;
        }
        let close_start = end + self.markup[end..].find(&close)?;
        Some((open_tag, close_start..close_start + close.len()))
    }

    /// Replaces an element's open and close tags, keeping the selection on
    /// the same content.
    fn retag(&mut self, open: Range<usize>, close: Range<usize>, new_open: &str, new_close: &str) {
        let shift = |pos: usize| {
            let mut pos = pos as isize;
            if pos >= close.end as isize {
                pos += new_close.len() as isize - close.len() as isize;
            }
            if pos >= open.end as isize {
                pos += new_open.len() as isize - open.len() as isize;
            }
            pos as usize
        };
        let selection = shift(self.selection.start)..shift(self.selection.end);
        self.markup.replace_range(close.clone(), new_close);
        self.markup.replace_range(open.clone(), new_open);
        self.selection = selection;
    }

    fn wrapped_by(&self, open: &str, close: &str) -> bool {
        self.markup[..self.selection.start].ends_with(open)
            && self.markup[self.selection.end..].starts_with(close)
    }

    fn wrap_selection(&mut self, open: &str, close: &str) {
        let Range { start, end } = self.selection.clone();
        self.markup.insert_str(end, close);
        self.markup.insert_str(start, open);
        self.selection = start + open.len()..end + open.len();
    }

    fn unwrap_selection(&mut self, open_len: usize, close_len: usize) {
        let Range { start, end } = self.selection.clone();
        self.markup.replace_range(end..end + close_len, "");
        self.markup.replace_range(start - open_len..start, "");
        self.selection = start - open_len..end - open_len;
    }

    fn toggle_inline(&mut self, format: InlineFormat) {
        if self.selection.is_empty() {
            let inside = self.element_active(format.tag());
            let on = self.pending.get(&format).copied().unwrap_or(inside);
            if !on == inside {
                self.pending.remove(&format);
            } else {
                self.pending.insert(format, !on);
            }
            return;
        }
        let open = format!("<{}>", format.tag());
        let close = format!("</{}>", format.tag());
        if self.wrapped_by(&open, &close) {
            self.unwrap_selection(open.len(), close.len());
        } else {
            self.wrap_selection(&open, &close);
        }
    }

    fn set_alignment(&mut self, align: Alignment) {
        let open = format!("<div style=\"text-align: {}\">", align.as_css());
        match self.enclosing_element(&ALIGN_OPEN) {
            Some((open_tag, close_tag)) => self.retag(open_tag, close_tag, &open, "</div>"),
            None => {
                self.expand_collapsed_to_block();
                self.wrap_selection(&open, "</div>");
            }
        }
    }

    fn toggle_list(&mut self, kind: ListKind) {
        self.expand_collapsed_to_block();
        let open = format!("<{}><li>", kind.tag());
        let close = format!("</li></{}>", kind.tag());
        if self.wrapped_by(&open, &close) {
            self.unwrap_selection(open.len(), close.len());
        } else {
            self.wrap_selection(&open, &close);
        }
    }

    fn set_block_level(&mut self, level: BlockLevel) {
        let tag = level.tag();
        let (open, close) = (format!("<{tag}>"), format!("</{tag}>"));
        match self.enclosing_element(&BLOCK_OPEN) {
            Some((open_tag, close_tag)) => self.retag(open_tag, close_tag, &open, &close),
            None => {
                self.expand_collapsed_to_block();
                self.wrap_selection(&open, &close);
            }
        }
    }

    fn wrap_span(&mut self, style: &str) {
        if self.selection.is_empty() {
            return;
        }
        self.wrap_selection(&format!("<span style=\"{style}\">"), "</span>");
    }

    fn clear_formatting(&mut self) {
        self.pending.clear();
        if self.selection.is_empty() {
            return;
        }
        let plain = ANY_TAG.replace_all(self.selected(), "").into_owned();
        let start = self.selection.start;
        self.markup.replace_range(self.selection.clone(), &plain);
        self.selection = start..start + plain.len();
    }

    fn insert_markup(&mut self, markup: &str) {
        let start = self.selection.start;
        self.markup.replace_range(self.selection.clone(), markup);
        let caret = start + markup.len();
        self.selection = caret..caret;
        self.pending.clear();
    }

    /// Whether `pos` sits inside an open `<tag>` element.
    fn inside_element(&self, tag: &str, pos: usize) -> bool {
        let before = &self.markup[..pos];
        let opened = before.matches(&format!("<{tag}>")).count()
            + before.matches(&format!("<{tag} ")).count();
        let closed = before.matches(&format!("</{tag}>")).count();
        opened > closed
    }

    fn element_active(&self, tag: &str) -> bool {
        let close = format!("</{tag}>");
        self.inside_element(tag, self.selection.start) && !self.selected().contains(&close)
    }

    fn active_alignment(&self) -> Option<Alignment> {
        let before = &self.markup[..self.selection.start];
        let last = ALIGN_OPEN.captures_iter(before).last()?;
        let open_end = last.get(0)?.end();
        if before[open_end..].contains("</div>") || self.selected().contains("</div>") {
            return None;
        }
        match &last["align"] {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

impl EditableSurface for MemorySurface {
    fn apply_primitive(&mut self, primitive: &Primitive) -> Result<(), SurfaceError> {
        if !self.editable {
            return Err(SurfaceError::new("surface is read-only"));
        }
        match primitive {
            Primitive::ToggleInline { format } => self.toggle_inline(*format),
            Primitive::SetAlignment { align } => self.set_alignment(*align),
            Primitive::ToggleList { kind } => self.toggle_list(*kind),
            Primitive::SetBlockLevel { level } => self.set_block_level(*level),
            Primitive::SetForegroundColor { color } => self.wrap_span(&format!("color: {color}")),
            Primitive::SetBackgroundColor { color } => {
                self.wrap_span(&format!("background-color: {color}"))
            }
            Primitive::ClearFormatting => self.clear_formatting(),
            Primitive::InsertMarkup { markup } => self.insert_markup(markup),
        }
        Ok(())
    }

    fn query_format(&self, id: FormatId) -> Result<bool, QueryError> {
        if self.rejected_queries.contains(&id) {
            return Err(QueryError::new(format!("query `{id}` is not supported right now")));
        }
        if let Some(format) = id.inline_format() {
            let inside = self.element_active(format.tag());
            if self.selection.is_empty() {
                return Ok(self.pending.get(&format).copied().unwrap_or(inside));
            }
            return Ok(inside);
        }
        if let Some(align) = id.alignment() {
            return Ok(self.active_alignment() == Some(align));
        }
        if let Some(kind) = id.list_kind() {
            return Ok(self.element_active(kind.tag()));
        }
        if id == FormatId::Heading {
            return Ok((1..=BlockLevel::MAX_HEADING)
                .any(|level| self.element_active(&BlockLevel::Heading(level).tag())));
        }
        Ok(false)
    }

    fn document(&self) -> String {
        self.markup.clone()
    }

    fn replace_document(&mut self, document: &str) {
        self.markup = document.to_string();
        self.collapse_to_end();
    }

    fn selected_text(&self) -> Option<String> {
        if self.selection.is_empty() {
            return None;
        }
        let plain = ANY_TAG.replace_all(self.selected(), "");
        (!plain.is_empty()).then(|| plain.into_owned())
    }

    fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }
}

fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
