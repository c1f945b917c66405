use std::cell::RefCell;
use std::rc::Rc;

use blog_editor_core::{
    EmbedParams, Editor, EditorConfig, ImageAlign, ImageParams, ImageSize, InsertError,
    Insertion, LinkParams, ManualClock, MemorySurface, TableParams,
};
use pretty_assertions::assert_eq;

type Changes = Rc<RefCell<Vec<String>>>;

fn editor_with_text(text: &str) -> (Editor<MemorySurface>, Changes) {
    let changes: Changes = Rc::default();
    let sink = changes.clone();
    let mut editor = Editor::new(MemorySurface::new(""), EditorConfig::default())
        .clock(ManualClock::new())
        .on_change(move |doc| sink.borrow_mut().push(doc.to_string()));
    editor.initialize(text);
    (editor, changes)
}

fn image(url: &str, size: ImageSize, align: ImageAlign) -> Insertion {
    Insertion::Image(ImageParams {
        url: url.to_string(),
        alt: "Kickoff".to_string(),
        size,
        align,
    })
}

#[test]
fn image_insert_is_one_entry_and_one_notification() {
    let (mut editor, changes) = editor_with_text("<p>Intro</p>");
    editor
        .insert(&image("https://cdn.example.com/a.png", ImageSize::Medium, ImageAlign::Center))
        .unwrap();

    let expected = "<p>Intro</p><div style=\"text-align: center; margin: 16px auto;\">\
        <img src=\"https://cdn.example.com/a.png\" alt=\"Kickoff\" \
        style=\"width: 600px; max-width: 100%; height: auto;\" /></div>";
    assert_eq!(editor.document(), expected);
    assert_eq!(editor.history().len(), 2);
    assert_eq!(changes.borrow().as_slice(), &[expected.to_string()]);
}

#[test]
fn image_sizes_map_to_widths() {
    for (size, width) in [
        (ImageSize::Small, "300px"),
        (ImageSize::Large, "900px"),
        (ImageSize::Full, "100%"),
        (ImageSize::Custom(" 420px ".to_string()), "420px"),
        (ImageSize::Custom("75%".to_string()), "75%"),
    ] {
        let (mut editor, _changes) = editor_with_text("");
        editor.insert(&image("/a.png", size, ImageAlign::Left)).unwrap();
        assert!(
            editor.document().contains(&format!("width: {width};")),
            "{}",
            editor.document()
        );
        assert!(editor.document().contains("margin: 16px 0 16px 16px;"));
    }
}

#[test]
fn invalid_image_input_changes_nothing() {
    let (mut editor, changes) = editor_with_text("<p>keep</p>");
    let cases = [
        (image("", ImageSize::Medium, ImageAlign::Center), "missing-url"),
        (image("https://", ImageSize::Medium, ImageAlign::Center), "placeholder-url"),
        (
            image("/a.png", ImageSize::Custom("huge".to_string()), ImageAlign::Right),
            "invalid-image-width",
        ),
    ];
    for (insertion, kind) in cases {
        let err = editor.insert(&insertion).unwrap_err();
        assert_eq!(err.kind(), kind);
    }
    assert_eq!(editor.document(), "<p>keep</p>");
    assert_eq!(editor.history().len(), 1);
    assert!(changes.borrow().is_empty());
}

#[test]
fn image_alt_text_is_escaped() {
    let (mut editor, _changes) = editor_with_text("");
    editor
        .insert(&Insertion::Image(ImageParams {
            url: "/a.png".to_string(),
            alt: "\"Salah\" <3".to_string(),
            size: ImageSize::Small,
            align: ImageAlign::Right,
        }))
        .unwrap();
    assert!(editor.document().contains("alt=\"&quot;Salah&quot; &lt;3\""));
    assert!(editor.document().contains("margin: 16px 16px 16px 0;"));
}

#[test]
fn link_wraps_the_selected_text() {
    let (mut editor, _changes) = editor_with_text("<p>read the preview</p>");
    editor.surface_mut().select_text("preview");
    editor
        .insert(&Insertion::Link(LinkParams {
            url: "https://example.com/gw7".to_string(),
            text: Some("ignored".to_string()),
            new_tab: true,
        }))
        .unwrap();
    assert_eq!(
        editor.document(),
        "<p>read the <a href=\"https://example.com/gw7\" target=\"_blank\" rel=\"noopener noreferrer\">preview</a></p>"
    );
}

#[test]
fn link_text_falls_back_to_the_url() {
    let (mut editor, _changes) = editor_with_text("");
    editor
        .insert(&Insertion::Link(LinkParams {
            url: "https://example.com".to_string(),
            text: Some("Example".to_string()),
            new_tab: false,
        }))
        .unwrap();
    editor
        .insert(&Insertion::Link(LinkParams {
            url: " https://example.org ".to_string(),
            text: None,
            new_tab: false,
        }))
        .unwrap();
    assert_eq!(
        editor.document(),
        "<a href=\"https://example.com\">Example</a><a href=\"https://example.org\">https://example.org</a>"
    );
    assert_eq!(editor.history().len(), 3);
}

#[test]
fn placeholder_link_is_rejected() {
    let (mut editor, _changes) = editor_with_text("<p>x</p>");
    let err = editor
        .insert(&Insertion::Link(LinkParams {
            url: "https://".to_string(),
            text: None,
            new_tab: false,
        }))
        .unwrap_err();
    assert_eq!(err, InsertError::PlaceholderUrl);
    assert_eq!(editor.document(), "<p>x</p>");
}

#[test]
fn default_table_is_three_by_three() {
    let (mut editor, _changes) = editor_with_text("");
    let insertion: Insertion = serde_json::from_str(r#"{ "kind": "table" }"#).unwrap();
    assert_eq!(insertion, Insertion::Table(TableParams { rows: 3, cols: 3 }));
    editor.insert(&insertion).unwrap();

    let doc = editor.document();
    assert!(doc.starts_with("<table style=\"width: 100%; border-collapse: collapse; margin: 16px 0;\"><tbody>"));
    assert_eq!(doc.matches("<tr>").count(), 3);
    assert_eq!(doc.matches("<td ").count(), 9);
    assert_eq!(doc.matches("&nbsp;").count(), 9);
}

#[test]
fn table_dimensions_are_bounded() {
    let (mut editor, _changes) = editor_with_text("");
    for (rows, cols) in [(0, 3), (3, 0), (51, 2)] {
        let err = editor
            .insert(&Insertion::Table(TableParams { rows, cols }))
            .unwrap_err();
        assert_eq!(err.kind(), "invalid-table-size");
    }
    editor
        .insert(&Insertion::Table(TableParams { rows: 2, cols: 5 }))
        .unwrap();
    assert_eq!(editor.document().matches("<td ").count(), 10);
}

#[test]
fn rule_and_quote() {
    let (mut editor, _changes) = editor_with_text("<p>Best XI</p>");
    editor.surface_mut().select_text("Best XI");
    editor.insert(&Insertion::Quote).unwrap();
    assert!(editor.document().starts_with("<p><blockquote "));
    assert!(editor.document().contains(">Best XI</blockquote></p>"));

    editor.surface_mut().collapse_to_end();
    editor.insert(&Insertion::Rule).unwrap();
    assert!(editor.document().ends_with(
        "<hr style=\"border: none; border-top: 1px solid #ddd; margin: 24px 0;\" />"
    ));

    editor.insert(&Insertion::Quote).unwrap();
    assert!(editor.document().ends_with(">Quote</blockquote>"));
    assert_eq!(editor.history().len(), 4);
}

#[test]
fn embed_recognises_video_urls() {
    let cases = [
        ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "https://www.youtube.com/embed/dQw4w9WgXcQ"),
        ("https://youtu.be/dQw4w9WgXcQ?t=42", "https://www.youtube.com/embed/dQw4w9WgXcQ"),
        ("youtube.com/shorts/dQw4w9WgXcQ", "https://www.youtube.com/embed/dQw4w9WgXcQ"),
        ("https://vimeo.com/76979871", "https://player.vimeo.com/video/76979871"),
    ];
    for (source, src) in cases {
        let (mut editor, _changes) = editor_with_text("");
        editor
            .insert(&Insertion::Embed(EmbedParams {
                source: source.to_string(),
            }))
            .unwrap();
        assert!(
            editor.document().contains(&format!("<iframe src=\"{src}\"")),
            "{source} -> {}",
            editor.document()
        );
        assert!(editor.document().starts_with("<div class=\"video-embed\""));
    }
}

#[test]
fn embed_code_is_wrapped_verbatim() {
    let (mut editor, _changes) = editor_with_text("");
    let code = "<iframe src=\"https://player.example.com/x\" width=\"560\"></iframe>";
    editor
        .insert(&Insertion::Embed(EmbedParams {
            source: format!("  {code}\n"),
        }))
        .unwrap();
    assert_eq!(
        editor.document(),
        format!("<div class=\"video-embed\" style=\"margin: 16px 0;\">{code}</div>")
    );
}

#[test]
fn unrecognised_embed_leaves_document_unchanged() {
    let (mut editor, changes) = editor_with_text("<p>x</p>");
    for source in [
        "not a url or embed",
        "",
        "https://example.com/video",
        "<script>alert(1)</script>",
        r#"<iframe src="https://www.youtube.com/embed/x"></iframe><script>steal()</script><iframe></iframe>"#,
        r#"<iframe src="https://player.example.com/x"><script>steal()</script></iframe>"#,
        r#"<iframe src="http://player.example.com/x"></iframe>"#,
        r#"<iframe src="javascript:alert(1)"></iframe>"#,
        "<iframe></iframe>",
    ] {
        let err = editor
            .insert(&Insertion::Embed(EmbedParams {
                source: source.to_string(),
            }))
            .unwrap_err();
        assert_eq!(err, InsertError::InvalidEmbedSource);
    }
    assert_eq!(editor.document(), "<p>x</p>");
    assert_eq!(editor.history().len(), 1);
    assert!(changes.borrow().is_empty());
}

#[test]
fn insertions_deserialize_from_host_parameters() {
    let insertion: Insertion = serde_json::from_value(serde_json::json!({
        "kind": "image",
        "url": "/uploads/derby.png",
        "size": { "custom": "480px" },
        "align": "right",
    }))
    .unwrap();
    assert_eq!(
        insertion,
        Insertion::Image(ImageParams {
            url: "/uploads/derby.png".to_string(),
            alt: String::new(),
            size: ImageSize::Custom("480px".to_string()),
            align: ImageAlign::Right,
        })
    );

    let (mut editor, _changes) = editor_with_text("");
    editor.insert(&insertion).unwrap();
    assert!(editor.document().contains("width: 480px;"));
}
