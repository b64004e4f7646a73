use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use syllabot::app::{App, NoticeKind, Services};
use syllabot::chat::{ApiVariant, HttpTransport};
use syllabot::clipboard::SystemClipboard;
use syllabot::config::Config;
use syllabot::event::{AppEvent, EventHandler};
use syllabot::language::{ALL_LANGUAGES, Language};
use syllabot::logging::{LogConfig, init_logging};
use syllabot::navigator::View;
use syllabot::speech::{CommandSpeech, Speaker};
use syllabot::syllabus::Syllabus;
use syllabot::ui::components::language_modal::LanguagePicker;
use syllabot::ui::components::menu::Menu;
use syllabot::ui::components::response_panel::ResponsePanel;
use syllabot::ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use syllabot::ui::theme::Theme;

#[derive(Parser)]
#[command(
    name = "syllabot",
    version,
    about = "Browse a syllabus and get spoken topic explanations in English or Hindi"
)]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Base URL of the chat backend")]
    api_base: Option<String>,

    #[arg(long, value_enum, help = "Request body shape expected by the backend")]
    api_variant: Option<ApiVariant>,

    #[arg(short, long, value_parser = parse_language, help = "Default language (en, hi)")]
    lang: Option<Language>,

    #[arg(long, help = "Do not speak explanations")]
    no_speech: bool,

    #[arg(long, help = "Log file path")]
    log_file: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, help = "More log output (-v debug, -vv trace)")]
    verbose: u8,

    #[arg(long, help = "Write the effective config file and exit")]
    save_config: bool,
}

fn parse_language(value: &str) -> Result<Language, String> {
    Language::from_code(value).ok_or_else(|| format!("unknown language '{value}' (use en or hi)"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose).with_log_file(cli.log_file.clone());
    init_logging(&log_config)
        .with_context(|| format!("opening log file {}", log_config.log_file.display()))?;

    let mut config = Config::load().context("loading config")?;
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(base) = cli.api_base {
        config.api_base = base;
    }
    if let Some(variant) = cli.api_variant {
        config.api_variant = variant;
    }
    if let Some(lang) = cli.lang {
        config.default_language = lang;
    }
    if cli.no_speech {
        config.speech_enabled = false;
    }
    config.normalize(&Theme::available_themes());

    if cli.save_config {
        config.save()?;
        println!("Wrote {}", Config::config_path().display());
        return Ok(());
    }

    let syllabus = Syllabus::load().context("loading syllabus")?;
    let theme: &'static Theme = Box::leak(Box::new(
        Theme::load(&config.theme).unwrap_or_default(),
    ));

    let speaker = if config.speech_enabled {
        match CommandSpeech::detect() {
            Some(engine) => Speaker::new(Box::new(engine), config.speech_rate, config.speech_pitch),
            None => Speaker::silent(),
        }
    } else {
        Speaker::silent()
    };

    let events = EventHandler::new(Duration::from_millis(100));
    let services = Services {
        transport: Arc::new(HttpTransport::new(config.request_timeout())?),
        speaker,
        clipboard: Box::new(SystemClipboard::new()),
        events: events.sender(),
    };
    tracing::info!(
        api_base = %config.api_base,
        variant = config.api_variant.as_str(),
        subjects = syllabus.len(),
        "starting"
    );
    let mut app = App::new(syllabus, config, theme, services);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    app.abort();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(%err, "exited with error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Explanation { id, outcome } => {
                app.apply_outcome(id, outcome);
            }
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    app.clear_notice();
    if app.language_modal.is_some() {
        handle_modal_key(app, key);
    } else {
        handle_browse_key(app, key);
    }
}

fn handle_modal_key(app: &mut App, key: KeyEvent) {
    let chosen = match key.code {
        KeyCode::Esc => {
            app.dismiss_language_modal();
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.modal_prev();
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.modal_next();
            None
        }
        KeyCode::Enter => app.language_modal.map(|m| m.language()),
        KeyCode::Char(d @ '1'..='9') => ALL_LANGUAGES.get(d as usize - '1' as usize).copied(),
        KeyCode::Char(ch) => ALL_LANGUAGES
            .into_iter()
            .find(|l| l.code().starts_with(ch.to_ascii_lowercase())),
        _ => None,
    };
    if let Some(language) = chosen {
        // The no-topic case already left a notice.
        let _ = app.choose_language(language);
    }
}

fn handle_browse_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc | KeyCode::Char('s') => app.abort(),
        KeyCode::Char('c') => app.copy_response(),
        KeyCode::Char('r') => app.restart(),
        KeyCode::Char('l') => {
            if app.nav.current_topic().is_some() {
                app.show_language_modal();
            } else {
                app.set_notice("No topic selected", NoticeKind::Warning);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.nav.select_prev(&app.syllabus),
        KeyCode::Down | KeyCode::Char('j') => app.nav.select_next(&app.syllabus),
        KeyCode::PageUp | KeyCode::Char('K') => app.scroll_up(),
        KeyCode::PageDown | KeyCode::Char('J') => app.scroll_down(),
        KeyCode::Enter | KeyCode::Right => app.open_selected(),
        KeyCode::Backspace | KeyCode::Left | KeyCode::Char('b') => app.back(),
        KeyCode::Char(d @ '1'..='9') => {
            let index = d as usize - '1' as usize;
            match app.nav.view() {
                View::Units => app.open_unit(index),
                _ if index < app.nav.list_len(&app.syllabus) => {
                    app.nav.selected = index;
                    app.open_selected();
                }
                _ => {}
            }
        }
        _ => {}
    }
}

const HINTS: &[&str] = &[
    "[Enter] open",
    "[b] back",
    "[l] language",
    "[Esc/s] stop",
    "[c] copy",
    "[J/K] scroll",
    "[r] restart",
    "[q] quit",
];

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let hint_lines = pack_hint_lines(HINTS, area.width as usize);
    let footer_height = hint_lines.len() as u16 + u16::from(app.notice.is_some());
    let layout = AppLayout::new(area, footer_height);

    let mut header_spans = vec![
        Span::styled(
            " syllabot ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("\u{203a} {} ", app.nav.breadcrumb(&app.syllabus)),
            Style::default().fg(colors.header_fg()).bg(colors.header_bg()),
        ),
        Span::styled(
            format!("\u{00b7} {} ", app.nav.language),
            Style::default().fg(colors.accent()).bg(colors.header_bg()),
        ),
    ];
    if app.in_flight().is_some() {
        header_spans.push(Span::styled(
            "\u{00b7} waiting for reply ",
            Style::default().fg(colors.warning()).bg(colors.header_bg()),
        ));
    }
    let header =
        Paragraph::new(Line::from(header_spans)).style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout.header);

    let menu = Menu::for_view(&app.syllabus, &app.nav, app.theme);
    frame.render_widget(&menu, layout.list);

    frame.render_widget(
        ResponsePanel::new(&app.response, app.theme, app.scroll),
        layout.response,
    );

    let mut footer_lines: Vec<Line> = Vec::new();
    if let Some(notice) = &app.notice {
        let color = match notice.kind {
            NoticeKind::Info => colors.success(),
            NoticeKind::Warning => colors.warning(),
        };
        footer_lines.push(Line::from(Span::styled(
            format!("  {}", notice.message),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
    }
    footer_lines.extend(
        hint_lines
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_muted())))),
    );
    frame.render_widget(Paragraph::new(footer_lines), layout.footer);

    if let Some(modal) = app.language_modal {
        let popup = centered_rect(40, LanguagePicker::height(), area);
        frame.render_widget(
            LanguagePicker {
                modal,
                topic: app.nav.current_topic().unwrap_or_default(),
                theme: app.theme,
            },
            popup,
        );
    }
}
