use std::{fs::File, io::stdout, sync::Arc};

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{LevelFilter, WriteLogger};

// Use modules from the library crate
use divide_reader::event_source::KeyboardEventSource;
use divide_reader::fetcher::ThreadedFetcher;
use divide_reader::main_app::{App, run_app_with_event_source};
use divide_reader::panic_handler;
use divide_reader::settings;
use divide_reader::source;
use divide_reader::store::FileStore;

fn main() -> Result<()> {
    // Initialize panic handler first, before any other setup
    panic_handler::initialize_panic_handler();

    // Initialize logging with html5ever DEBUG logs filtered out
    WriteLogger::init(
        LevelFilter::Debug,
        simplelog::ConfigBuilder::new()
            .set_max_level(LevelFilter::Debug)
            .add_filter_ignore_str("html5ever")
            .build(),
        File::create("divide-reader.log")?,
    )?;

    info!("Starting divide-reader");

    // Optional initial fragment, e.g. `divide-reader '#7'`
    let fragment = std::env::args().nth(1).unwrap_or_default();

    // Load settings from ~/.divide_reader.yaml
    let settings = settings::load_settings();
    let store = FileStore::open_or_empty(settings.resolved_store_path());
    let source: Arc<dyn source::ChapterSource> = Arc::from(source::source_for(&settings.base_url));
    info!("Reading chapters from {}", settings.base_url);

    let mut app = App::new(
        &settings,
        Box::new(store),
        Box::new(ThreadedFetcher::new(source)),
    );
    app.start(&fragment);

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();

    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_source = KeyboardEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    // Restore terminal state
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down divide-reader");
    Ok(())
}
