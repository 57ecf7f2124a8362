use crossterm::event::KeyCode;
use divide_reader::event_source::SimulatedEventSource;
use divide_reader::main_app::{FocusedPanel, run_app_with_event_source};
use divide_reader::reader::ReaderEvent;
use divide_reader::test_utils::MapSource;
use divide_reader::test_utils::test_helpers::{buffer_text, create_test_app, create_test_terminal};
use std::time::Instant;

const DIALOGUE_CHAPTER: &str = concat!(
    "# Crossing\n\n",
    "The river was loud.\n\n",
    "[Hya] Hold the rope.\n\n",
    "[Lina] I am holding it!\n\n",
    "[Oru] Nobody knows me.",
);

fn source() -> MapSource {
    MapSource::numbered(12).with_chapter(1, DIALOGUE_CHAPTER)
}

#[test]
fn draws_title_dialogue_boxes_and_controls() {
    let mut terminal = create_test_terminal(80, 30);
    let mut app = create_test_app(12, source());
    app.start("#1");
    app.tick(Instant::now());

    terminal.draw(|f| app.draw(f)).unwrap();
    let screen = buffer_text(&terminal);

    assert!(screen.contains(" Crossing "), "{screen}");
    assert!(screen.contains("The river was loud."), "{screen}");
    assert!(screen.contains("╭─ Hya"), "{screen}");
    assert!(screen.contains("│ Hold the rope."), "{screen}");
    assert!(screen.contains("╭─ Lina"), "{screen}");
    assert!(screen.contains("[Oru] Nobody knows me."), "{screen}");
    assert!(screen.contains("Chapter 1/12"), "{screen}");
    assert!(screen.contains("Font 18px"), "{screen}");
}

#[test]
fn not_found_placeholder_is_drawn() {
    let mut terminal = create_test_terminal(80, 20);
    let mut app = create_test_app(12, source());
    app.start("#40");

    terminal.draw(|f| app.draw(f)).unwrap();
    let screen = buffer_text(&terminal);
    assert!(screen.contains("Chapter 40 does not exist."), "{screen}");
}

#[test]
fn larger_font_narrows_the_reading_column() {
    let mut terminal = create_test_terminal(120, 30);
    let mut app = create_test_app(12, source());
    app.start("#1");
    app.tick(Instant::now());

    terminal.draw(|f| app.draw(f)).unwrap();
    let wide = app.chapter_view().content_area().width;

    for _ in 0..7 {
        app.dispatch(ReaderEvent::ChangeFontSize(2));
    }
    terminal.draw(|f| app.draw(f)).unwrap();
    let narrow = app.chapter_view().content_area().width;

    assert_eq!(wide, 80);
    assert_eq!(narrow, 45);
}

#[test]
fn progress_reaches_one_hundred_percent_at_the_bottom() {
    let long: String = (0..80).map(|i| format!("Paragraph {i}.\n\n")).collect();
    let mut terminal = create_test_terminal(80, 24);
    let mut app = create_test_app(12, MapSource::new().with_chapter(2, long));
    app.start("#2");
    app.tick(Instant::now());

    terminal.draw(|f| app.draw(f)).unwrap();
    assert_eq!(app.progress().percent(), 0);
    assert!(buffer_text(&terminal).contains("  0%"));

    app.handle_key_event(crossterm::event::KeyEvent::new(
        KeyCode::Char('G'),
        crossterm::event::KeyModifiers::empty(),
    ));
    terminal.draw(|f| app.draw(f)).unwrap();
    assert_eq!(app.progress().percent(), 100);
    assert!(buffer_text(&terminal).contains("100%"));
}

#[test]
fn event_loop_navigates_and_quits() {
    let mut terminal = create_test_terminal(80, 24);
    let mut app = create_test_app(12, source());
    app.start("#1");

    let mut events = SimulatedEventSource::new(vec![
        SimulatedEventSource::char_key('l'),
        SimulatedEventSource::char_key('l'),
        SimulatedEventSource::char_key('t'),
        // The list opens on chapter 3; one step up and open.
        SimulatedEventSource::char_key('c'),
        SimulatedEventSource::char_key('k'),
        SimulatedEventSource::key(KeyCode::Enter),
    ]);
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

    assert_eq!(events.remaining(), 0);
    assert_eq!(app.reader().current_chapter(), Some(2));
    assert_eq!(app.reader().view().title, "Chapter 2");
    assert!(app.reader().view().theme.is_dark());
    assert_eq!(app.focused_panel, FocusedPanel::Content);
}
