//! craftpanel - terminal control client for a remote game-server panel.
//!
//! Usage:
//!   craftpanel                       Launch interactive TUI
//!   craftpanel ls [PATH]             List a remote directory
//!   craftpanel mv SRC... --to DEST   Move remote items
//!   craftpanel upload FILE...        Upload local files
//!   craftpanel start | stop | status Control the server process
//!   craftpanel backup                Trigger a backup
//!   craftpanel cmd COMMAND...        Send a console command
//!   craftpanel tail [CHANNEL]        Stream a live log
//!   craftpanel --help                Show help

use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use craftpanel_core::{LogChannel, PanelConfig, PushEvent, RemotePath};
use craftpanel_ops::HttpPanelClient;
use craftpanel_session::Controller;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "CRAFTPANEL_LOG";

type PanelController = Controller<HttpPanelClient>;

#[derive(Parser)]
#[command(
    name = "craftpanel",
    version,
    about = "Terminal control client for a remote game-server panel",
    long_about = "craftpanel browses and rearranges the server's files, uploads plugins, \
                  starts and stops the server, runs backups and streams the live console.\n\n\
                  Launch the interactive TUI by running `craftpanel`, or use \
                  subcommands for one-shot operations."
)]
struct Cli {
    /// Panel base URL (overrides the config file)
    #[arg(long, env = "CRAFTPANEL_URL", global = true)]
    url: Option<String>,

    /// Config file (defaults to $CONFIG_DIR/craftpanel/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file (the TUI discards them otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List a remote directory
    Ls {
        /// Remote path (defaults to the root)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Move remote items into a directory
    Mv {
        /// Remote items to move
        #[arg(required = true)]
        sources: Vec<String>,

        /// Destination directory
        #[arg(long)]
        to: String,
    },

    /// Rename a remote item in place
    Rename {
        /// Remote item to rename
        path: String,

        /// New name (no slashes)
        new_name: String,
    },

    /// Upload local files in a single request
    Upload {
        /// Local files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Destination directory (defaults to the configured upload destination)
        #[arg(long)]
        to: Option<String>,
    },

    /// Start the server process
    Start,

    /// Stop the server process
    Stop,

    /// Show whether the server process is running
    Status,

    /// Trigger a backup
    Backup {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Send a console command to the server process
    Cmd {
        /// Command and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Stream a live log until interrupted
    Tail {
        /// Log channel
        #[arg(default_value = "console")]
        channel: LogChannel,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref(), cli.command.is_none())?;

    let mut config =
        PanelConfig::load(cli.config.as_deref()).wrap_err("Failed to load configuration")?;
    if let Some(url) = cli.url {
        config = config.with_base_url(url);
        config.validate().wrap_err("Invalid --url")?;
    }

    match cli.command {
        None => craftpanel_tui::run(config)?,
        Some(command) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_command(config, command))?;
        }
    }

    Ok(())
}

/// Route tracing output: stderr for subcommands, a file or nowhere for the TUI.
fn init_logging(log_file: Option<&Path>, tui: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .wrap_err_with(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if tui => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }

    Ok(())
}

async fn run_command(config: PanelConfig, command: Command) -> Result<()> {
    let client = HttpPanelClient::new(&config)?;
    let upload_destination = config.default_upload_destination.clone();
    let mut controller = Controller::new(Arc::new(client), config);

    match command {
        Command::Ls { path } => run_ls(&mut controller, RemotePath::parse(&path)).await,
        Command::Mv { sources, to } => run_move(&mut controller, &sources, &to).await,
        Command::Rename { path, new_name } => {
            controller.toggle_select(RemotePath::parse(&path))?;
            controller.rename(&new_name)?;
            controller.settle().await;
            report(&controller)
        }
        Command::Upload { files, to } => {
            let destination = RemotePath::parse(to.as_deref().unwrap_or(&upload_destination));
            run_upload(&mut controller, &files, destination).await
        }
        Command::Start => {
            controller.refresh_status();
            controller.settle().await;
            controller.start()?;
            eprintln!("Starting server, waiting for it to settle...");
            controller.settle().await;
            report(&controller)?;
            print_status(&controller);
            Ok(())
        }
        Command::Stop => {
            controller.refresh_status();
            controller.settle().await;
            controller.stop()?;
            eprintln!("Stopping server, waiting for it to settle...");
            controller.settle().await;
            report(&controller)?;
            print_status(&controller);
            Ok(())
        }
        Command::Status => {
            controller.refresh_status();
            controller.settle().await;
            print_status(&controller);
            Ok(())
        }
        Command::Backup { yes } => {
            let confirmed = yes || confirm("Run a server backup now?")?;
            if !confirmed {
                eprintln!("Backup not started.");
                return Ok(());
            }
            controller.backup(true)?;
            print!(
                "{}",
                controller.session().reconciler().stream(LogChannel::Backup).text()
            );
            controller.settle().await;
            report(&controller)
        }
        Command::Cmd { command } => {
            controller.send_command(&command.join(" "))?;
            controller.settle().await;
            report(&controller)
        }
        Command::Tail { channel } => run_tail(&mut controller, channel).await,
    }
}

async fn run_ls(controller: &mut PanelController, path: RemotePath) -> Result<()> {
    controller.navigate(path.clone());
    controller.settle().await;
    report_failure(controller)?;

    let session = controller.session();
    let Some(view) = session.browser().view().filter(|view| view.path == path) else {
        bail!("No listing received for /{path}");
    };

    for shortcut in &view.shortcuts {
        println!("» {shortcut}");
    }
    for row in &view.rows {
        if row.is_dir {
            println!("{}/", row.name);
        } else {
            println!("{}", row.name);
        }
    }
    Ok(())
}

/// Navigate to the destination so pasting lands there, then stage and paste.
async fn run_move(controller: &mut PanelController, sources: &[String], to: &str) -> Result<()> {
    let destination = RemotePath::parse(to);
    controller.navigate(destination.clone());
    controller.settle().await;
    report_failure(controller)?;
    if controller.session().current_path() != &destination {
        bail!("Destination {to} could not be opened");
    }

    controller.cut_paths(sources.iter().map(|s| RemotePath::parse(s)).collect())?;
    controller.paste()?;
    controller.settle().await;

    match controller.session().last_batch() {
        Some(complete) if complete.is_success() => {
            println!("{}", complete.summary());
            Ok(())
        }
        Some(complete) => bail!("{}", complete.summary()),
        None => bail!("Move did not complete"),
    }
}

async fn run_upload(
    controller: &mut PanelController,
    files: &[PathBuf],
    destination: RemotePath,
) -> Result<()> {
    controller.choose_paths(files).await?;
    controller.upload(Some(destination))?;

    let mut stderr = io::stderr();
    while controller.in_flight() > 0 {
        let Some(inbound) = controller.recv().await else {
            break;
        };
        controller.dispatch(inbound);

        if let Some(job) = controller.session().uploads().active() {
            let _ = write!(
                stderr,
                "\rUploading {} file(s): {:>5.1}% of {}",
                job.file_names.len(),
                job.progress() * 100.0,
                humansize::format_size(job.bytes_total, humansize::BINARY)
            );
            let _ = stderr.flush();
        }
    }
    eprintln!();

    report(controller)
}

async fn run_tail(controller: &mut PanelController, channel: LogChannel) -> Result<()> {
    controller.connect_push()?;
    let mut stdout = io::stdout();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            inbound = controller.recv() => {
                let Some(inbound) = inbound else { break };
                match controller.dispatch(inbound) {
                    Some(PushEvent::History { channel: c, text } | PushEvent::Output { channel: c, text })
                        if c == channel =>
                    {
                        write!(stdout, "{text}")?;
                        stdout.flush()?;
                    }
                    Some(PushEvent::Connected) => eprintln!("Connected, streaming {channel} log."),
                    Some(PushEvent::Disconnected { reason }) => {
                        bail!(
                            "Live channel closed: {}",
                            reason.unwrap_or_else(|| "no reason given".to_string())
                        );
                    }
                    _ => {}
                }
            }
        }
    }

    controller.disconnect_push();
    Ok(())
}

/// Print the latest notice; an error notice fails the command.
fn report(controller: &PanelController) -> Result<()> {
    report_failure(controller)?;
    if let Some(notice) = controller.session().notice() {
        println!("{}", notice.text);
    }
    Ok(())
}

fn report_failure(controller: &PanelController) -> Result<()> {
    match controller.session().notice() {
        Some(notice) if notice.is_error() => bail!("{}", notice.text),
        _ => Ok(()),
    }
}

fn print_status(controller: &PanelController) {
    let state = match controller.session().lifecycle().running() {
        Some(true) => "running",
        Some(false) => "stopped",
        None => "unknown",
    };
    println!("Server is {state}.");
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}
