use std::{
    error::Error,
    io::{self, stdin},
    sync::{mpsc::Sender, Arc},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use mockprep::{
    api::{self, CodeApi, HttpClient, SessionApi},
    app::{App, Request},
    app_dirs::AppDirs,
    config::{ConfigOverrides, ConfigStore, FileConfigStore},
    drafts::DraftStore,
    language::Language,
    logging,
    runtime::{
        spawn_job, AppEvent, CodeAction, CodeOutcome, CrosstermEventSource, FixedTicker, Runner,
    },
    session::timer::{Clock, SystemClock},
    ui,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};
use webbrowser::Browser;

/// terminal client for timed mock-interview sessions
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Open a timed mock-interview session, solve its problems in a syntax-highlighted editor and run or submit them against the practice backend."
)]
pub struct Cli {
    /// id of the mock-interview session to open
    session_id: String,

    /// base url of the REST api
    #[clap(long)]
    api_url: Option<String>,

    /// base url of the web frontend, used to open problems in a browser
    #[clap(long)]
    web_url: Option<String>,

    /// bearer token sent with every request
    #[clap(short = 't', long)]
    token: Option<String>,

    /// editor language to start with
    #[clap(short = 'l', long, value_enum)]
    language: Option<Language>,

    /// milliseconds between countdown refreshes
    #[clap(long)]
    tick_ms: Option<u64>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_base_url: self.api_url.clone(),
            web_base_url: self.web_url.clone(),
            auth_token: self.token.clone(),
            default_language: self.language,
            tick_ms: self.tick_ms,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = AppDirs::log_dir().and_then(|dir| logging::init(&dir));

    let store = FileConfigStore::new();
    let config = store.load().with_overrides(cli.overrides());
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "config saved");
    }

    let drafts = DraftStore::new()
        .map_err(|err| warn!(%err, "draft storage unavailable, edits will not be kept"))
        .ok();
    let client = Arc::new(HttpClient::new(
        config.api_base_url.clone(),
        config.auth_token.clone(),
        config.request_timeout(),
    ));
    info!(session = %cli.session_id, api = %config.api_base_url, "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let clock = SystemClock;
    let mut app = App::new(cli.session_id, config, drafts, clock.now());
    let result = start_tui(&mut terminal, &mut app, client, &clock);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: Arc<HttpClient>,
    clock: &impl Clock,
) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    let tx = events.sender();
    let mut runner = Runner::new(events, FixedTicker::new(app.config().tick_interval()));

    let fetch_client = Arc::clone(&client);
    let session_id = app.controller.session_id().to_string();
    spawn_job(&tx, move || {
        AppEvent::Loaded(fetch_client.fetch_session(&session_id))
    });

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let event = runner.step();
        if let Some(request) = app.handle_event(event, clock.now()) {
            dispatch(request, &client, &tx, app.controller.session_id());
        }
        if app.should_quit {
            break;
        }
        terminal.draw(|f| ui::draw(app, f))?;
    }

    info!("quitting");
    Ok(())
}

/// Hand a request to a worker thread; its result comes back through the event channel
fn dispatch(request: Request, client: &Arc<HttpClient>, tx: &Sender<AppEvent>, session_id: &str) {
    match request {
        Request::Session(command) => {
            info!(kind = %command.kind(), "sending session command");
            let client = Arc::clone(client);
            let session_id = session_id.to_string();
            spawn_job(tx, move || {
                AppEvent::Session(api::execute(client.as_ref(), &session_id, &command))
            });
        }
        Request::Code {
            action,
            problem_id,
            request,
        } => {
            info!(?action, problem = %problem_id, "sending code");
            let client = Arc::clone(client);
            spawn_job(tx, move || {
                let result = match action {
                    CodeAction::Run => client.run_code(&problem_id, &request),
                    CodeAction::Submit => client.submit_code(&problem_id, &request),
                };
                AppEvent::Code(CodeOutcome {
                    action,
                    problem_id,
                    result,
                })
            });
        }
        Request::OpenBrowser(url) => {
            if !Browser::is_available() {
                warn!(%url, "no browser available");
                return;
            }
            if let Err(err) = webbrowser::open(&url) {
                warn!(%url, %err, "failed to open browser");
            }
        }
    }
}
