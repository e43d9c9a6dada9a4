//! Interactive commands read from stdin while watching

use anyhow::{Context, Result, anyhow, bail};
use std::str::FromStr;
use tempmail::EmailId;

/// A single line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    /// Poll right now instead of waiting for the next tick
    Poll,
    /// Show received emails
    List,
    Older {
        seq: Option<EmailId>,
        limit: Option<u32>,
    },
    Fetch(EmailId),
    Delete(Vec<EmailId>),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  pause                 stop polling for now
  resume                continue polling
  poll                  check for new mail immediately
  list                  show received emails
  older [seq] [limit]   list emails older than seq
  fetch <id>            show a full message
  delete <id>...        delete messages
  status                show poller state
  quit                  release the mailbox and exit";

fn parse_id(raw: &str) -> Result<EmailId> {
    raw.parse::<u64>()
        .map(EmailId)
        .with_context(|| format!("not an email id: {}", raw))
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let args: Vec<&str> = words.collect();

        let command = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("pause", []) => Command::Pause,
            ("resume" | "play", []) => Command::Resume,
            ("poll", []) => Command::Poll,
            ("list" | "ls", []) => Command::List,
            ("older", rest) if rest.len() <= 2 => Command::Older {
                seq: rest.first().map(|s| parse_id(s)).transpose()?,
                limit: rest
                    .get(1)
                    .map(|s| s.parse::<u32>().with_context(|| format!("not a limit: {}", s)))
                    .transpose()?,
            },
            ("fetch" | "show", [id]) => Command::Fetch(parse_id(id)?),
            ("delete" | "del" | "rm", ids) if !ids.is_empty() => {
                Command::Delete(ids.iter().map(|s| parse_id(s)).collect::<Result<_>>()?)
            }
            ("status", []) => Command::Status,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit" | "q", []) => Command::Quit,
            (other, _) => bail!("unknown command or wrong arguments: {} (try 'help')", other),
        };
        Ok(command)
    }
}
