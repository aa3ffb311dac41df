use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use folioview::app::ViewerApp;
use folioview::command_source::{
    CliCommand, CommandSource, HELP, StdinCommandSource, parse_command,
};
use folioview::document::DocumentSource;
use folioview::error::LoadError;
use folioview::host::{HostEvent, host_channel};
use folioview::l10n::Localization;
use folioview::panic_handler;
use folioview::settings::ViewerOptions;
use folioview::view_history::ViewHistory;
use folioview::viewer::PageViewer;

#[derive(Parser)]
#[command(name = "folioview", about = "PDF viewer shell", version)]
struct Cli {
    /// Log file
    #[arg(long, global = true, default_value = "folioview.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a PDF and restore its last view
    Open {
        /// PDF file or file:// URL
        file: String,

        /// Bookmark to open at, e.g. "page=3&zoom=150"
        #[arg(long)]
        hash: Option<String>,

        /// Password for encrypted documents
        #[arg(short, long)]
        password: Option<String>,

        /// Options file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// View history file (JSON)
        #[arg(long)]
        history_file: Option<PathBuf>,

        /// Read viewer commands from stdin after opening
        #[arg(short, long)]
        interactive: bool,
    },

    /// List remembered documents, most recent first
    History {
        /// View history file (JSON)
        #[arg(long)]
        history_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("creating log file {}", cli.log_file.display()))?,
    )?;
    panic_handler::initialize_panic_handler();
    info!("Starting folioview {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Open {
            file,
            hash,
            password,
            config,
            history_file,
            interactive,
        } => {
            let options = ViewerOptions::load_or_default(config.as_deref());
            let history_path = history_file.or_else(ViewHistory::default_path);
            let history = ViewHistory::load_or_ephemeral(history_path.as_deref());
            run_open(options, history, file, hash, password, interactive)
        }
        Commands::History { history_file } => {
            let history_path = history_file.or_else(ViewHistory::default_path);
            let history = ViewHistory::load_or_ephemeral(history_path.as_deref());
            print_history(&history);
            Ok(())
        }
    }
}

fn run_open(
    options: ViewerOptions,
    history: ViewHistory,
    file: String,
    hash: Option<String>,
    password: Option<String>,
    interactive: bool,
) -> Result<()> {
    let l10n = Localization::new(&options.locale);
    let (host, host_rx) = host_channel();
    let mut app = ViewerApp::new(options, loader()?, Box::new(history), host);

    let source = match password {
        Some(password) => DocumentSource::Url(file.clone()).with_password(password),
        None => DocumentSource::Url(file.clone()),
    };
    let opened = app.open(source, hash.as_deref());
    print_host_events(&host_rx, &l10n);
    match opened {
        Ok(()) => {}
        Err(e @ (LoadError::PasswordRequired | LoadError::IncorrectPassword)) => {
            bail!("{file}: {e} (use --password)")
        }
        Err(e) => return Err(e).with_context(|| format!("opening {file}")),
    }
    print_status(&app);

    if interactive {
        let mut source = StdinCommandSource::new();
        run_commands(&mut app, &mut source, &host_rx, &l10n)?;
    }
    app.close();
    info!("Exiting");
    Ok(())
}

#[cfg(feature = "pdf")]
fn loader() -> Result<Box<dyn folioview::document::DocumentLoader>> {
    Ok(Box::new(folioview::pdf::PdfLoader::new()))
}

#[cfg(not(feature = "pdf"))]
fn loader() -> Result<Box<dyn folioview::document::DocumentLoader>> {
    bail!("folioview was built without the `pdf` feature")
}

fn run_commands(
    app: &mut ViewerApp,
    source: &mut dyn CommandSource,
    host_rx: &flume::Receiver<HostEvent>,
    l10n: &Localization,
) -> Result<()> {
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = source.next_line()? else {
            println!();
            return Ok(());
        };
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(CliCommand::Quit)) => return Ok(()),
            Ok(Some(CliCommand::Help)) => println!("{HELP}"),
            Ok(Some(CliCommand::Status)) => print_status(app),
            Ok(Some(CliCommand::Event(event))) => {
                app.handle(event);
                print_host_events(host_rx, l10n);
            }
            Err(e) => println!("error: {e}"),
        }
    }
}

fn print_status(app: &ViewerApp) {
    let Some(session) = app.session() else {
        println!("no document");
        return;
    };
    let l10n = app.l10n();
    let toolbar = &app.chrome().toolbar;
    let location = session.viewer.location();
    println!(
        "page {} {} | zoom {} | rotation {}° | scroll {:?} | spread {:?} | sidebar {:?}",
        toolbar.page_input(),
        toolbar.pages_count_text(l10n),
        toolbar.scale_text(l10n),
        location.rotation,
        session.viewer.scroll_mode(),
        session.viewer.spread_mode(),
        app.chrome().sidebar.visible_view(),
    );
}

fn print_host_events(host_rx: &flume::Receiver<HostEvent>, l10n: &Localization) {
    for event in host_rx.drain() {
        match event {
            HostEvent::Title(title) => println!("title: {title}"),
            HostEvent::Error(report) => {
                println!("error: {}", report.message);
                for line in &report.more_info {
                    println!("  {line}");
                }
            }
            HostEvent::PasswordRequest { incorrect } => {
                let (key, fallback) = if incorrect {
                    ("password_invalid", "Invalid password. Please try again.")
                } else {
                    ("password_label", "Enter the password to open this PDF file.")
                };
                println!("{}", l10n.get(key, &[], fallback));
            }
            HostEvent::Fallback { feature, .. } => {
                println!("warning: document uses unsupported {}", feature.as_str())
            }
            HostEvent::DocumentProperties(props) => {
                println!("file name:     {}", props.file_name);
                println!("file size:     {}", props.file_size);
                println!("title:         {}", props.title);
                println!("author:        {}", props.author);
                println!("subject:       {}", props.subject);
                println!("keywords:      {}", props.keywords);
                println!("created:       {}", props.creation_date);
                println!("modified:      {}", props.modification_date);
                println!("creator:       {}", props.creator);
                println!("producer:      {}", props.producer);
                println!("version:       {}", props.version);
                println!("pages:         {}", props.page_count);
                println!("page size:     {}", props.page_size);
                println!("fast web view: {}", props.linearized);
            }
            HostEvent::RenderingOptions(hints) => println!(
                "renderer: {} (text layer {:?}, max canvas {} px)",
                hints.renderer.as_str(),
                hints.text_layer,
                hints.max_canvas_pixels
            ),
            HostEvent::BookmarkHref(href) => println!("view: {href}"),
            HostEvent::Find(command) => println!("find: {:?}", command.query),
            HostEvent::OutlineLoaded(count) if count > 0 => println!("outline: {count} entries"),
            HostEvent::AttachmentsLoaded(count) if count > 0 => {
                println!("attachments: {count}")
            }
            other => log::debug!("host event {other:?}"),
        }
    }
}

fn print_history(history: &ViewHistory) {
    if history.is_empty() {
        println!("no remembered documents");
        return;
    }
    for entry in history.recent() {
        let view = &entry.view;
        let when = view
            .last_viewed
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{when}  {}  page {}  zoom {}",
            entry.fingerprint,
            view.page.map_or_else(|| "-".to_string(), |p| p.to_string()),
            view.zoom.as_deref().unwrap_or("-"),
        );
    }
}
