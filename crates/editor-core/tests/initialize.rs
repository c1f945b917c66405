use std::cell::RefCell;
use std::rc::Rc;

use blog_editor_core::{Editor, EditorConfig, FormatId, ManualClock, MemorySurface};

type Changes = Rc<RefCell<Vec<String>>>;

fn editor() -> (Editor<MemorySurface>, ManualClock, Changes) {
    let clock = ManualClock::new();
    let changes: Changes = Rc::default();
    let sink = changes.clone();
    let editor = Editor::new(MemorySurface::new(""), EditorConfig::default())
        .clock(clock.clone())
        .on_change(move |doc| sink.borrow_mut().push(doc.to_string()));
    (editor, clock, changes)
}

#[test]
fn initialize_seeds_exactly_one_entry() {
    let (mut editor, _clock, changes) = editor();
    editor.initialize("<h2>Week 3 picks</h2>");

    assert!(editor.is_initialized());
    assert_eq!(editor.document(), "<h2>Week 3 picks</h2>");
    assert_eq!(editor.surface().markup(), "<h2>Week 3 picks</h2>");
    assert_eq!(editor.history().entries(), &["<h2>Week 3 picks</h2>"]);
    assert!(changes.borrow().is_empty());
}

#[test]
fn initialize_with_empty_string_is_valid() {
    let (mut editor, _clock, _changes) = editor();
    editor.initialize("");
    assert_eq!(editor.document(), "");
    assert_eq!(editor.history().entries(), &[""]);
    assert!(editor.is_empty());
}

#[test]
fn later_initialize_replaces_without_history() {
    let (mut editor, _clock, changes) = editor();
    editor.initialize("<p>first</p>");
    editor.surface_mut().select_text("first");
    editor.apply_command(FormatId::Bold, None).unwrap();
    assert_eq!(editor.history().len(), 2);
    changes.borrow_mut().clear();

    editor.initialize("<p>from parent</p>");
    assert_eq!(editor.document(), "<p>from parent</p>");
    assert_eq!(editor.surface().markup(), "<p>from parent</p>");
    assert_eq!(editor.history().len(), 2);
    assert!(changes.borrow().is_empty());

    editor.initialize("<p>from parent</p>");
    assert_eq!(editor.history().len(), 2);
}

#[test]
fn external_replace_cancels_pending_typing_push() {
    let (mut editor, clock, _changes) = editor();
    editor.initialize("");
    editor.surface_mut().type_text("typed");
    editor.handle_user_edit();

    editor.initialize("<p>server copy</p>");
    clock.advance_ms(1_000);
    editor.tick();
    assert_eq!(editor.history().entries(), &[""]);
}

#[test]
fn reset_starts_a_fresh_history() {
    let (mut editor, _clock, _changes) = editor();
    editor.initialize("<p>old post</p>");
    editor.surface_mut().select_text("old");
    editor.apply_command(FormatId::Italic, None).unwrap();

    editor.reset("<p>new post</p>");
    assert_eq!(editor.document(), "<p>new post</p>");
    assert_eq!(editor.history().entries(), &["<p>new post</p>"]);
    assert!(!editor.can_undo());
}

#[test]
fn placeholder_shows_only_when_empty_and_unfocused() {
    let (mut editor, _clock, _changes) = editor();
    editor.initialize("");
    assert!(!editor.placeholder().is_empty());
    assert!(editor.show_placeholder(false));
    assert!(!editor.show_placeholder(true));

    editor.initialize("<p>x</p>");
    assert!(!editor.show_placeholder(false));
}

#[test]
fn counts_follow_the_document() {
    let (mut editor, _clock, _changes) = editor();
    editor.initialize("<h2>Captain pick</h2><p>Go with <strong>Salah</strong> this week.</p>");
    assert_eq!(editor.word_count(), 7);
    assert_eq!(
        editor.char_count(),
        "Captain pickGo with Salah this week.".chars().count()
    );
}
