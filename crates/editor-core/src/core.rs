use std::collections::HashSet;
use std::time::Instant;

use crate::builders::{self, BuildContext, ImagePlacement, Insertion};
use crate::command::{CommandSpec, CommandTable, FormatId};
use crate::config::EditorConfig;
use crate::error::{CommandError, InsertError, UploadError};
use crate::formats::{ActiveFormatTracker, ActiveFormats};
use crate::history::HistoryStack;
use crate::ops::Primitive;
use crate::stats;
use crate::surface::EditableSurface;
use crate::timer::{Clock, Debounce, SystemClock};
use crate::upload::{ImageFile, PendingUpload, UploadResponse, UploadSlot, UploadTicket};

pub type ChangeCallback = Box<dyn FnMut(&str)>;

/// Public entry for the command palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub id: FormatId,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub args_example: Option<String>,
}

impl From<&CommandSpec> for CommandInfo {
    fn from(spec: &CommandSpec) -> Self {
        Self {
            id: spec.id,
            label: spec.label.clone(),
            description: spec.description.clone(),
            keywords: spec.keywords.clone(),
            args_example: spec.args_example.clone(),
        }
    }
}

/// How a mutation reaches the history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryPush {
    Immediate,
    Debounced,
}

/// The rich-text editing engine.
///
/// Owns the serialized document and its history, and is the only component
/// that reports content changes to the host (through the change callback).
pub struct Editor<S: EditableSurface> {
    surface: S,
    table: CommandTable,
    config: EditorConfig,
    clock: Box<dyn Clock>,
    on_change: Option<ChangeCallback>,

    document: String,
    history: HistoryStack,
    tracker: ActiveFormatTracker,

    initialized: bool,
    disabled: bool,
    disposed: bool,

    typing: Debounce,
    /// Set after undo/redo; surface events before this instant are echoes.
    restoring_until: Option<Instant>,

    uploads: HashSet<UploadSlot>,
    upload_generation: u64,
}

impl<S: EditableSurface> Editor<S> {
    pub fn new(surface: S, config: EditorConfig) -> Self {
        let config = config.with_defaults();
        let document = surface.document();
        Self {
            history: HistoryStack::new(document.clone(), config.max_history),
            typing: Debounce::new(config.typing_debounce()),
            surface,
            table: CommandTable::standard(),
            config,
            clock: Box::new(SystemClock),
            on_change: None,
            document,
            tracker: ActiveFormatTracker::default(),
            initialized: false,
            disabled: false,
            disposed: false,
            restoring_until: None,
            uploads: HashSet::new(),
            upload_generation: 0,
        }
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn command_table(mut self, table: CommandTable) -> Self {
        self.table = table;
        self.tracker.request_refresh();
        self
    }

    pub fn on_change(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn is_empty(&self) -> bool {
        self.document.trim().is_empty()
    }

    pub fn placeholder(&self) -> &str {
        &self.config.placeholder
    }

    /// The placeholder is shown for an empty, unfocused editor.
    pub fn show_placeholder(&self, focused: bool) -> bool {
        !focused && self.is_empty()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for the host's own event plumbing (selection, typing).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether a debounced history push is waiting for the quiet period.
    pub fn has_pending_push(&self) -> bool {
        self.typing.is_armed()
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring_until
            .is_some_and(|until| self.clock.now() < until)
    }

    pub fn is_uploading(&self, slot: UploadSlot) -> bool {
        self.uploads.contains(&slot)
    }

    pub fn commands(&self) -> Vec<CommandInfo> {
        self.table.iter().map(CommandInfo::from).collect()
    }

    /// Earliest instant at which [`Editor::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.typing.deadline(), self.restoring_until) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Sets the document from the host.
    ///
    /// The first call seeds history with exactly one entry. Later calls with a
    /// different value replace the document without touching history.
    pub fn initialize(&mut self, document: &str) {
        if self.disposed {
            return;
        }
        self.run_due_timers();
        if !self.initialized {
            self.initialized = true;
            self.load(document);
            return;
        }
        if document == self.document {
            return;
        }
        tracing::debug!(len = document.len(), "external document replaced");
        self.typing.cancel();
        self.restoring_until = None;
        self.surface.replace_document(document);
        self.document = self.surface.document();
        self.tracker.request_refresh();
    }

    /// Loads a different document and starts a fresh history.
    pub fn reset(&mut self, document: &str) {
        if self.disposed {
            return;
        }
        self.initialized = true;
        self.load(document);
    }

    fn load(&mut self, document: &str) {
        self.typing.cancel();
        self.restoring_until = None;
        self.surface.replace_document(document);
        self.document = self.surface.document();
        self.history.reset(self.document.clone());
        self.tracker.request_refresh();
    }

    pub fn run_command(&mut self, id: &str, argument: Option<&str>) -> Result<(), CommandError> {
        let id: FormatId = id.parse()?;
        self.apply_command(id, argument)
    }

    pub fn apply_command(
        &mut self,
        id: FormatId,
        argument: Option<&str>,
    ) -> Result<(), CommandError> {
        self.run_due_timers();
        if !self.accepts_edits() {
            tracing::debug!(command = %id, "editor disabled, ignoring command");
            return Ok(());
        }
        let Some(spec) = self.table.command(id) else {
            return Err(CommandError::Unknown(id.to_string()));
        };
        if let Err(err) = spec.apply(&mut self.surface, argument) {
            tracing::warn!(command = %id, error = %err, "command failed");
            return Err(err);
        }
        tracing::trace!(command = %id, "command applied");
        self.sync_from_surface(HistoryPush::Immediate);
        Ok(())
    }

    pub fn insert(&mut self, insertion: &Insertion) -> Result<(), InsertError> {
        self.run_due_timers();
        if !self.accepts_edits() {
            tracing::debug!(kind = insertion.kind(), "editor disabled, ignoring insertion");
            return Ok(());
        }
        let cx = BuildContext {
            selected_text: self.surface.selected_text(),
        };
        let markup = match builders::build(insertion, &cx) {
            Ok(markup) => markup,
            Err(err) => {
                tracing::warn!(kind = err.kind(), insertion = insertion.kind(), "insertion rejected");
                return Err(err);
            }
        };
        // The table entry for the insertion, when present, decides how the
        // fragment is applied.
        let primitive = match insertion.command_id().and_then(|id| self.table.command(id)) {
            Some(spec) => spec.primitive(Some(&markup))?,
            None => Primitive::insert_markup(markup),
        };
        self.surface.apply_primitive(&primitive)?;
        tracing::trace!(insertion = insertion.kind(), "markup inserted");
        self.sync_from_surface(HistoryPush::Immediate);
        Ok(())
    }

    /// Called for every raw input event of the surface.
    pub fn handle_user_edit(&mut self) {
        self.run_due_timers();
        if self.disposed {
            return;
        }
        if self.is_restoring() {
            self.sync_document();
            return;
        }
        if self.disabled {
            return;
        }
        self.sync_from_surface(HistoryPush::Debounced);
    }

    pub fn undo(&mut self) -> bool {
        self.run_due_timers();
        if !self.accepts_edits() {
            return false;
        }
        self.flush_pending_push();
        let Some(document) = self.history.undo().map(str::to_owned) else {
            return false;
        };
        self.restore(document);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.run_due_timers();
        if !self.accepts_edits() {
            return false;
        }
        self.flush_pending_push();
        let Some(document) = self.history.redo().map(str::to_owned) else {
            return false;
        };
        self.restore(document);
        true
    }

    fn restore(&mut self, document: String) {
        self.restoring_until = Some(self.clock.now() + self.config.restore_grace());
        self.surface.replace_document(&document);
        self.document = document;
        tracing::trace!(cursor = self.history.cursor(), "restored history entry");
        self.emit_change();
        self.tracker.request_refresh();
    }

    pub fn active_formats(&mut self) -> ActiveFormats {
        self.tracker.snapshot(&self.table, &self.surface).clone()
    }

    pub fn notify_selection_change(&mut self) {
        self.tracker.request_refresh();
    }

    pub fn notify_focus(&mut self) {
        self.run_due_timers();
        self.tracker.request_refresh();
    }

    pub fn word_count(&self) -> usize {
        stats::word_count(&self.document)
    }

    pub fn char_count(&self) -> usize {
        stats::char_count(&self.document)
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        if self.disposed || self.disabled == disabled {
            return;
        }
        if disabled {
            self.flush_pending_push();
        }
        self.disabled = disabled;
        self.surface.set_editable(!disabled);
        tracing::debug!(disabled, "editor disabled state changed");
    }

    /// Runs timers whose deadline has passed.
    pub fn tick(&mut self) {
        self.run_due_timers();
    }

    /// Tears the engine down; later calls are ignored and in-flight uploads
    /// are discarded when they resolve.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.typing.cancel();
        self.restoring_until = None;
        self.uploads.clear();
        self.upload_generation += 1;
        self.disposed = true;
        tracing::debug!("editor disposed");
    }

    /// Validates `file` and `placement` and reserves `slot` for its upload.
    pub fn begin_image_upload(
        &mut self,
        slot: UploadSlot,
        file: ImageFile,
        placement: &ImagePlacement,
    ) -> Result<PendingUpload, UploadError> {
        if !self.accepts_edits() {
            return Err(UploadError::Disabled);
        }
        if self.uploads.contains(&slot) {
            return Err(UploadError::InFlight);
        }
        placement.validate()?;
        let request = self.config.upload.request(file);
        request.validate()?;
        self.uploads.insert(slot);
        tracing::debug!(slot = slot.0, size = request.file.size(), "image upload started");
        Ok(PendingUpload {
            ticket: UploadTicket {
                slot,
                generation: self.upload_generation,
            },
            request,
        })
    }

    /// Consumes the upload result; on success the image is inserted as one
    /// history entry.
    pub fn finish_image_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadResponse, UploadError>,
        placement: ImagePlacement,
    ) -> Result<(), UploadError> {
        if ticket.generation != self.upload_generation || !self.uploads.remove(&ticket.slot) {
            tracing::debug!(slot = ticket.slot.0, "stale upload result discarded");
            return Err(UploadError::Discarded);
        }
        if !self.accepts_edits() {
            tracing::debug!(slot = ticket.slot.0, "upload finished while disabled, discarded");
            return Err(UploadError::Discarded);
        }
        let url = match result.and_then(UploadResponse::into_url) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(slot = ticket.slot.0, error = %err, "image upload failed");
                return Err(err);
            }
        };
        self.insert(&Insertion::Image(placement.with_url(url)))?;
        Ok(())
    }

    fn accepts_edits(&self) -> bool {
        !self.disabled && !self.disposed
    }

    /// Reads the surface back and reports a changed document to the host.
    fn sync_document(&mut self) -> bool {
        let next = self.surface.document();
        if next == self.document {
            return false;
        }
        self.document = next;
        self.emit_change();
        true
    }

    fn sync_from_surface(&mut self, push: HistoryPush) {
        self.sync_document();
        match push {
            HistoryPush::Immediate => {
                self.typing.cancel();
                self.push_history();
            }
            HistoryPush::Debounced => self.typing.arm(self.clock.now()),
        }
        self.tracker.request_refresh();
    }

    fn push_history(&mut self) {
        if self.history.push(&self.document) {
            tracing::trace!(
                len = self.history.len(),
                cursor = self.history.cursor(),
                "history entry pushed"
            );
        }
    }

    fn flush_pending_push(&mut self) {
        if self.typing.cancel() {
            self.push_history();
        }
    }

    fn run_due_timers(&mut self) {
        let now = self.clock.now();
        if self.typing.fire_if_due(now) {
            self.push_history();
        }
        if self.restoring_until.is_some_and(|until| now >= until) {
            self.restoring_until = None;
        }
    }

    fn emit_change(&mut self) {
        if let Some(callback) = self.on_change.as_mut() {
            callback(&self.document);
        }
    }
}
