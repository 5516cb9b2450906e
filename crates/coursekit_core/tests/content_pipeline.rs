use coursekit_core::content::formatter::format_fragments;
use coursekit_core::content::highlight::HIGHLIGHT_CLASS;
use coursekit_core::{
    capture_selection, format_content, render_with_highlights, sanitize, to_plain_text, validate,
    Highlight, SelectionOutcome,
};
use proptest::prelude::*;
use uuid::Uuid;

fn highlight(start: usize, end: usize, text: &str, note: Option<&str>) -> Highlight {
    Highlight {
        id: Uuid::new_v4(),
        topic_id: Uuid::nil(),
        highlighted_text: text.to_string(),
        position_start: start,
        position_end: end,
        note: note.map(str::to_string),
        created_at: 0,
    }
}

#[test]
fn formatter_emits_one_fragment_per_line() {
    let content = "## Title\n### Sub\n> quoted\n- one\n- two\n\nplain *soft* **loud**";
    let fragments = format_fragments(content);

    assert_eq!(fragments.len(), content.lines().count());
    assert_eq!(fragments[0], "<h2>Title</h2>");
    assert_eq!(fragments[3], "<li>one</li>");
    assert_eq!(fragments[4], "<li>two</li>");
    assert_eq!(fragments[5], "<br>");
    assert_eq!(
        fragments[6],
        "<p>plain <em>soft</em> <strong>loud</strong></p>"
    );
}

#[test]
fn heading_line_contains_its_literal_text() {
    for text in ["X", "Getting started", "2 + 2 = 4"] {
        let html = format_content(&format!("## {text}"));
        assert_eq!(html, format!("<h2>{text}</h2>"));
    }
}

#[test]
fn intro_scenario_wraps_exactly_one_hello() {
    let content = "## Intro\nHello **world**";
    assert_eq!(format_fragments(content).len(), 2);
    assert_eq!(to_plain_text(content), "Intro Hello world");

    let rendered = render_with_highlights(content, &[highlight(6, 11, "Hello", None)]);
    assert_eq!(rendered.applied.len(), 1);
    assert_eq!(rendered.html.matches("data-highlight-id").count(), 1);
    assert!(rendered
        .html
        .contains(&format!("class=\"{HIGHLIGHT_CLASS}\"")));
    assert!(rendered.html.contains(">Hello</span> <strong>world</strong>"));
}

#[test]
fn repeated_text_is_wrapped_once_at_first_occurrence() {
    let content = "and then\nand again";
    let plain = to_plain_text(content);
    let outcome = capture_selection("and", &plain, &[]);
    let capture = outcome.accepted().expect("selection accepted").clone();
    assert_eq!((capture.start, capture.end), (0, 3));

    let rendered = render_with_highlights(content, &[highlight(0, 3, "and", None)]);
    assert_eq!(rendered.html.matches("data-highlight-id").count(), 1);
    assert!(rendered.html.ends_with("<p>and again</p>"));
}

#[test]
fn stale_highlight_is_skipped_and_others_still_render() {
    let content = "Alpha beta gamma";
    let fresh = highlight(0, 5, "Alpha", Some("first letter"));
    let stale = highlight(40, 45, "gone", None);

    let rendered = render_with_highlights(content, &[fresh.clone(), stale.clone()]);
    assert_eq!(rendered.applied, vec![fresh.id]);
    assert_eq!(rendered.skipped, vec![stale.id]);
    assert!(rendered.html.contains("title=\"first letter\""));
}

#[test]
fn overlapping_selection_is_rejected_after_first_capture() {
    let plain = "Intro Hello world";
    let existing = vec![highlight(6, 11, "Hello", None)];

    let outcome = capture_selection("llo wo", plain, &existing);
    assert!(matches!(outcome, SelectionOutcome::Overlap { .. }));
    assert!(outcome.should_clear_selection());

    let disjoint = capture_selection("world", plain, &existing);
    assert!(disjoint.accepted().is_some());
}

#[test]
fn sanitize_is_idempotent_on_malformed_fixtures() {
    let fixtures = [
        "<div><p>open",
        "</span>stray closer",
        "<P onclick=\"x()\">Mixed</p><br><br/>\n<BR>",
        "<a href='javascript:void(0)' style=\"a:b\">link",
        "text\u{0001}with\u{001f}controls<b>",
        "<ul><li>one<li>two</ul>",
        "<img src=x><hr/><section><em>deep",
    ];
    for fixture in fixtures {
        let once = sanitize(fixture);
        assert_eq!(sanitize(&once), once, "fixture {fixture:?}");
    }
}

const MARKUP_PIECES: &[&str] = &[
    "<p>", "</p>", "<p", "<p/", "<i>", "</i>", "<br>", "<br/>", "<BR />", "<div ", "</div>",
    "<img src=x>", "<x-icon/>", "<", ">", "/", "\"", "'", " ", "\n", "\u{1}", "\u{7f}",
    " style=\"c:d\"", " onclick='x()'", " href=javascript:y", "onx=\"a\"", "style=q", "b",
    "&lt;", "</span>",
];

fn malformed_markup() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(MARKUP_PIECES), 0..16)
        .prop_map(|pieces| pieces.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn sanitize_is_idempotent_on_generated_markup(html in malformed_markup()) {
        let once = sanitize(&html);
        prop_assert_eq!(sanitize(&once), once);
    }
}

#[test]
fn sanitized_output_validates_when_no_stray_closers() {
    let once = sanitize("<div><p>open <em>text");
    assert!(validate(&once).is_valid());

    let report = validate("<div></span><p>");
    assert_eq!(
        report.messages(),
        vec![
            "closing tag without matching open: </span>".to_string(),
            "unclosed tag: <div>".to_string(),
            "unclosed tag: <p>".to_string(),
        ]
    );
}
