use anyhow::{Context as _, Result, bail};
use blog_editor_core::{
    Editor, EditorConfig, FormatId, Insertion, ManualClock, MemorySurface,
};
use serde::{Deserialize, Serialize};

/// A recorded editing session replayed against an in-memory surface.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Script {
    pub config: EditorConfig,
    pub initial: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Types at the selection, then reports the input event.
    Type { text: String },
    /// Selects the first occurrence of `text`, or everything when omitted.
    Select {
        #[serde(default)]
        text: Option<String>,
    },
    Collapse,
    Command {
        id: String,
        #[serde(default)]
        arg: Option<String>,
    },
    Insert { insertion: Insertion },
    Wait { ms: u64 },
    Undo,
    Redo,
    Focus,
    Disable,
    Enable,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub document: String,
    pub history_len: usize,
    pub cursor: usize,
    pub words: usize,
    pub chars: usize,
    pub active: Vec<FormatId>,
    pub changes: usize,
    pub errors: Vec<String>,
}

impl Script {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn run(self) -> Result<Report> {
        let clock = ManualClock::new();
        let changes = std::rc::Rc::new(std::cell::Cell::new(0usize));
        let counter = changes.clone();
        let mut editor = Editor::new(MemorySurface::new(""), self.config)
            .clock(clock.clone())
            .on_change(move |_| counter.set(counter.get() + 1));
        editor.initialize(&self.initial);

        let mut errors = Vec::new();
        for (ix, step) in self.steps.into_iter().enumerate() {
            if editor.is_disposed() {
                bail!("editor disposed before step {ix}");
            }
            if let Err(err) = apply_step(&mut editor, &clock, step) {
                tracing::warn!(step = ix, error = %format!("{err:#}"), "step failed");
                errors.push(format!("step {ix}: {err:#}"));
            }
        }
        editor.tick();

        let active = editor.active_formats().active().collect();
        Ok(Report {
            document: editor.document().to_string(),
            history_len: editor.history().len(),
            cursor: editor.history().cursor(),
            words: editor.word_count(),
            chars: editor.char_count(),
            active,
            changes: changes.get(),
            errors,
        })
    }
}

fn apply_step(
    editor: &mut Editor<MemorySurface>,
    clock: &ManualClock,
    step: Step,
) -> Result<()> {
    match step {
        Step::Type { text } => {
            if !editor.surface_mut().type_text(&text) {
                bail!("surface is read-only");
            }
            editor.handle_user_edit();
        }
        Step::Select { text: Some(text) } => {
            if !editor.surface_mut().select_text(&text) {
                bail!("`{text}` not found");
            }
            editor.notify_selection_change();
        }
        Step::Select { text: None } => {
            editor.surface_mut().select_all();
            editor.notify_selection_change();
        }
        Step::Collapse => {
            editor.surface_mut().collapse_to_end();
            editor.notify_selection_change();
        }
        Step::Command { id, arg } => {
            editor
                .run_command(&id, arg.as_deref())
                .with_context(|| format!("command `{id}`"))?;
        }
        Step::Insert { insertion } => {
            let kind = insertion.kind();
            editor
                .insert(&insertion)
                .with_context(|| format!("insert {kind}"))?;
        }
        Step::Wait { ms } => {
            clock.advance_ms(ms);
            editor.tick();
        }
        Step::Undo => {
            editor.undo();
        }
        Step::Redo => {
            editor.redo();
        }
        Step::Focus => editor.notify_focus(),
        Step::Disable => editor.set_disabled(true),
        Step::Enable => editor.set_disabled(false),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_script_replays() {
        let script = Script::from_json_str(include_str!("../scripts/match_report.json")).unwrap();
        let report = script.run().unwrap();
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(report.document.starts_with("<h2>Match report</h2>"));
        assert!(report.history_len > 1);
    }

    #[test]
    fn failed_steps_are_reported_not_fatal() {
        let script = Script::from_json_str(
            r#"{
                "initial": "<p>x</p>",
                "steps": [
                    { "step": "command", "id": "blink" },
                    { "step": "select", "text": "missing" },
                    { "step": "insert", "insertion": { "kind": "link", "url": "https://" } },
                    { "step": "type", "text": "y" },
                    { "step": "wait", "ms": 500 }
                ]
            }"#,
        )
        .unwrap();
        let report = script.run().unwrap();
        assert_eq!(
            report.errors,
            vec![
                "step 0: command `blink`: Unknown command: blink".to_string(),
                "step 1: `missing` not found".to_string(),
                "step 2: insert link: Please replace the placeholder with a real URL.".to_string(),
            ]
        );
        assert_eq!(report.document, "<p>x</p>y");
        assert_eq!(report.history_len, 2);
        assert_eq!(report.changes, 1);
    }
}
