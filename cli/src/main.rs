use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use canvas::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use canvas::doc::{Shape, ShapeStore};
use canvas::svg::{shapes_from_payload, to_svg};
use clap::{Parser, Subcommand};
use client::{ClientConfig, ClientError, Editor, FileStorage, Offline, SessionClient, SyncClient};
use frames::Event;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;


type CliEditor = Editor<SyncClient, FileStorage>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write output: {0}")]
    Write(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "svgpad", about = "Shape editor client for the SVG document service")]
struct Cli {
    /// Document service websocket URL [env: SVGPAD_WS_URL]
    #[arg(long)]
    ws_url: Option<String>,

    /// Where the session token is kept [env: SVGPAD_SESSION_FILE]
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Per-request reply timeout in milliseconds [env: SVGPAD_REQUEST_TIMEOUT_MS]
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Environment config with explicit flags layered on top.
    fn config(&self, base: ClientConfig) -> ClientConfig {
        ClientConfig {
            ws_url: self.ws_url.clone().unwrap_or(base.ws_url),
            request_timeout: self.timeout_ms.map_or(base.request_timeout, Duration::from_millis),
            session_file: self.session_file.clone().unwrap_or(base.session_file),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the session token
    Login { username: String, password: String },
    /// Create an account, then log into it
    Register { username: String, password: String },
    /// Forget the session locally and tell the service
    Logout,
    /// Print the logged-in username
    Whoami,
    /// List saved documents
    Files,
    /// Fetch a saved document
    Load {
        name: String,
        #[arg(long, help = "Write the markup here instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Save shapes as a document
    Save {
        name: String,
        #[arg(long, help = "Shape JSON array or SVG written by svgpad; default canvas when absent")]
        input: Option<PathBuf>,
    },
    /// Render shapes to SVG without contacting the service
    Render {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print events the service pushes until the connection closes
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config(ClientConfig::from_env());
    let session = SessionClient::restore(FileStorage::new(&config.session_file));

    match cli.command {
        Command::Whoami => whoami(&session),
        Command::Render { input, output } => render(input.as_deref(), output.as_deref()),
        Command::Logout => logout(&config, session).await,
        command => {
            let mut editor = Editor::new(SyncClient::open(&config).await?, session);
            let result = run_online(&mut editor, command).await;
            editor.sync_mut().close().await;
            result
        }
    }
}

async fn run_online(editor: &mut CliEditor, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { username, password } => {
            let session = editor.login(&username, &password).await?;
            println!("logged in as {}", session.username);
        }
        Command::Register { username, password } => {
            let session = editor.register(&username, &password).await?;
            println!("registered and logged in as {}", session.username);
        }
        Command::Files => {
            for name in editor.refresh_file_list().await? {
                println!("{name}");
            }
        }
        Command::Load { name, output } => {
            let report = editor.load_document(&name).await?;
            info!(loaded = report.loaded, clamped = report.clamped, dropped = report.dropped, "loaded {name}");
            let markup = editor.document().map(|d| d.svg_markup.clone()).unwrap_or_default();
            write_output(output.as_deref(), &markup)?;
        }
        Command::Save { name, input } => {
            if let Some(path) = input {
                editor.replace_shapes(read_shapes(&path)?);
            }
            editor.save_document(&name).await?;
            println!("saved {name} ({} shapes)", editor.store().len());
        }
        Command::Watch => {
            loop {
                let Some(event) = editor.sync().next_event().await else {
                    break;
                };
                print_event(&event);
                editor.apply_event(event);
            }
        }
        Command::Logout | Command::Whoami | Command::Render { .. } => {}
    }
    Ok(())
}

fn whoami(session: &SessionClient<FileStorage>) -> Result<(), CliError> {
    match session.session() {
        Some(session) => println!("{}", session.username),
        None => println!("not logged in"),
    }
    Ok(())
}

async fn logout(config: &ClientConfig, mut session: SessionClient<FileStorage>) -> Result<(), CliError> {
    let Some(username) = session.session().map(|s| s.username.clone()) else {
        println!("not logged in");
        return Ok(());
    };
    match SyncClient::open(config).await {
        Ok(mut sync) => {
            session.logout(&sync).await;
            sync.close().await;
        }
        Err(error) => {
            warn!(%error, "service unreachable; clearing local session only");
            session.logout(&Offline).await;
        }
    }
    println!("logged out {username}");
    Ok(())
}

fn render(input: Option<&Path>, output: Option<&Path>) -> Result<(), CliError> {
    let mut store = ShapeStore::with_defaults();
    if let Some(path) = input {
        store.replace_all(read_shapes(path)?);
    }
    write_output(output, &to_svg(&store, CANVAS_WIDTH, CANVAS_HEIGHT))
}

fn read_shapes(path: &Path) -> Result<Vec<Shape>, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })?;
    let shapes = shapes_from_payload(&text);
    if shapes.is_empty() {
        warn!(path = %path.display(), "input has no shapes; canvas will be empty");
    }
    Ok(shapes)
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), CliError> {
    match path {
        Some(path) => {
            fs::write(path, text)?;
            println!("wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn print_event(event: &Event) {
    match event {
        Event::FileList(names) => println!("fileList: {}", names.join(", ")),
        Event::SvgData(markup) => println!("svgData: {} bytes", markup.len()),
        Event::Error { action, message } => {
            println!("error ({}): {message}", action.as_deref().unwrap_or("-"));
        }
        other => println!("{}", other.action().unwrap_or("unknown")),
    }
}
