//! Mailwatch - Watch a disposable Guerrilla Mail inbox from the terminal
//!
//! Registers a mailbox, polls it in the background and prints new mail
//! as it arrives. Commands typed on stdin control the poller.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use tempmail::{ClientConfig, Email, Event, MailboxClient, PollOutcome, Topic};

mod commands;

use commands::Command;

#[derive(Parser)]
#[command(name = "mailwatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Register a mailbox and watch it for new mail (default)
    Watch(WatchArgs),
    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Default)]
struct WatchArgs {
    /// Mailbox name to claim instead of a random one
    #[arg(short, long)]
    username: Option<String>,
    /// Milliseconds between polls
    #[arg(short, long)]
    interval_ms: Option<u64>,
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Print new mail as JSON lines
    #[arg(long)]
    json: bool,
}

/// Something the main loop must react to
enum Input {
    Line(String),
    Shutdown,
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();
    match cli.command {
        Some(CliCommand::InitConfig { force }) => init_config(force),
        Some(CliCommand::Watch(args)) => watch(args),
        None => watch(WatchArgs::default()),
    }
}

fn init_config(force: bool) -> Result<()> {
    let existing = ClientConfig::default_config_path().filter(|p| p.exists());
    if let (Some(path), false) = (existing, force) {
        warn!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }
    let path = ClientConfig::default().save_default()?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn load_config(args: &WatchArgs) -> Result<ClientConfig> {
    let mut cfg = match &args.config {
        Some(path) => ClientConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::load()?,
    };
    if let Some(username) = &args.username {
        cfg.username = Some(username.clone());
    }
    if let Some(interval) = args.interval_ms {
        cfg.poll_interval_ms = interval;
    }
    cfg.validated()
}

fn watch(args: WatchArgs) -> Result<()> {
    let cfg = load_config(&args)?;
    info!("Polling {} every {} ms", cfg.base_url, cfg.poll_interval_ms);

    let client = MailboxClient::new(cfg);

    let json = args.json;
    client.on(Topic::NewEmail, move |event| {
        if let Event::NewEmail(emails) = event {
            for email in emails {
                println!("{}", render_email(email, json));
            }
        }
    });
    client.on(Topic::PollRequestError, |event| {
        if let Event::PollFailed(e) = event {
            warn!("Poll failed, will retry: {}", e);
        }
    });

    let registered = client.register().context("Failed to register a mailbox")?;
    println!("Address: {}", registered.email_addr);
    println!("Type 'help' for commands.");

    client.start();

    let (tx, rx) = mpsc::channel();
    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Input::Shutdown);
    })
    .context("Failed to install Ctrl-C handler")?;

    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(Input::Line(line)).is_err() {
                    return;
                }
            }
            // EOF ends the session like quit
            let _ = tx.send(Input::Shutdown);
        })
        .context("Failed to spawn stdin reader")?;

    for input in rx {
        let line = match input {
            Input::Shutdown => break,
            Input::Line(line) if line.trim().is_empty() => continue,
            Input::Line(line) => line,
        };
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(e) = run_command(&client, command, json) {
                    error!("{:#}", e);
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    info!("Releasing mailbox");
    client.destroy();
    Ok(())
}

fn run_command(client: &MailboxClient, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Pause => {
            client.pause();
            println!("Paused");
        }
        Command::Resume => {
            client.resume();
            println!("Resumed");
        }
        Command::Poll => match client.poll_once() {
            PollOutcome::Skipped => println!("Poll skipped (paused or already polling)"),
            PollOutcome::Completed(new) if new.is_empty() => println!("No new mail"),
            // New mail is printed by the NewEmail subscription
            PollOutcome::Completed(_) => {}
            PollOutcome::Failed(e) => return Err(e.into()),
        },
        Command::List => {
            let emails = client.received_emails();
            if emails.is_empty() {
                println!("No mail yet");
            }
            for email in &emails {
                println!("{}", render_email(email, json));
            }
        }
        Command::Older { seq, limit } => {
            let response = client.get_older_list(seq, limit)?;
            for email in &response.into_list() {
                println!("{}", render_email(email, json));
            }
        }
        Command::Fetch(id) => {
            let detail = client.fetch_email(id)?;
            if json {
                println!("{}", serde_json::to_string(&detail)?);
            } else {
                println!("{}", render_email(&detail.email, false));
                println!("{}", detail.body);
            }
        }
        Command::Delete(ids) => {
            let response = client.del_email(&ids)?;
            println!("Deleted {} email(s)", response.deleted_ids.len());
        }
        Command::Status => {
            let status = client.poll_status();
            println!(
                "address={} started={} paused={} polling={} received={}",
                client.address().unwrap_or_default(),
                status.started,
                status.paused,
                status.polling,
                client.received_emails().len()
            );
        }
        Command::Help => println!("{}", commands::HELP),
        Command::Quit => {}
    }
    Ok(())
}

/// One line per email, either human readable or JSON
fn render_email(email: &Email, json: bool) -> String {
    if json {
        return serde_json::to_string(email).unwrap_or_else(|e| json_error(&e));
    }
    let when = email
        .received_at
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string());
    format!("[{}] {}  {}  {}", email.id, when, email.sender, email.subject)
}

/// JSON line reporting an error, with the message escaped
fn json_error(error: &dyn std::fmt::Display) -> String {
    serde_json::json!({ "error": error.to_string() }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cli_defaults_to_watch() {
        let cli = Cli::try_parse_from(["mailwatch"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_watch_flags() {
        let cli = Cli::try_parse_from([
            "mailwatch",
            "watch",
            "--username",
            "alice",
            "--interval-ms",
            "5000",
            "--json",
        ])
        .unwrap();
        let Some(CliCommand::Watch(args)) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.username.as_deref(), Some("alice"));
        assert_eq!(args.interval_ms, Some(5000));
        assert!(args.json);
    }

    #[test]
    fn test_json_error_escapes_message() {
        let line = json_error(&"bad \"quote\" and \\ slash");
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["error"], "bad \"quote\" and \\ slash");
    }

    #[test]
    fn test_render_email_text_and_json() {
        let mut email = tempmail::Email::new(7u64)
            .with_subject("Welcome")
            .with_sender("no-reply@example.com");
        email.received_at = chrono::Utc.timestamp_opt(1_700_000_000, 0).single();

        let text = render_email(&email, false);
        assert!(text.starts_with("[7] "));
        assert!(text.ends_with("no-reply@example.com  Welcome"));

        let json: serde_json::Value = serde_json::from_str(&render_email(&email, true)).unwrap();
        assert_eq!(json["mail_subject"], "Welcome");
    }
}
