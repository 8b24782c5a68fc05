//! Command handlers for the Parley CLI

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parley_core::{
    AccountId, EventCategory, EventKind, FileTransferElement, IbbSender, Jid, ParleyResult,
    Session, SessionId, StanzaKind,
};
use parley_runtime::{Account, DispatchStats, RouterBuilder};
use serde::Deserialize;
use tracing::{debug, info};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::console::{ConsoleConnector, ConsoleSurface, ScriptedSession, Transcript};
use crate::error::{CliError, Result};

/// One line of a replay script
#[derive(Debug, Deserialize)]
pub struct ScriptLine {
    pub account: Jid,
    pub event: EventKind,
}

/// What a replay did, read back from the router after shutdown
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub dispatch: DispatchStats,
    pub handled: Vec<(EventCategory, u64)>,
    pub unresolved: u64,
    pub reconnects_scheduled: u64,
}

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli, config: AppConfig) -> Result<()> {
        match cli.command {
            Commands::Replay { script } => Self::handle_replay_command(&config, &script).await,
            Commands::Decode { file } => Self::handle_decode_command(&file),
            Commands::Chunk {
                file,
                sid,
                block_size,
                message,
            } => Self::handle_chunk_command(&file, sid, block_size, message),
        }
    }

    async fn handle_replay_command(config: &AppConfig, script: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(script)?;
        let report = replay(config, &contents, Transcript::new(true)).await?;

        println!();
        println!(
            "events: {} received, {} handled, {} unsupported",
            report.dispatch.received, report.dispatch.scheduled, report.dispatch.unsupported
        );
        for (category, count) in &report.handled {
            println!("  {:<20} {}", category.name(), count);
        }
        if report.unresolved > 0 {
            println!("  unresolved sessions  {}", report.unresolved);
        }
        if report.reconnects_scheduled > 0 {
            println!("  reconnects scheduled {}", report.reconnects_scheduled);
        }
        Ok(())
    }

    fn handle_decode_command(file: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(file)?;
        println!("{}", describe_element(&contents)?);
        Ok(())
    }

    fn handle_chunk_command(
        file: &Path,
        sid: String,
        block_size: u16,
        message: bool,
    ) -> Result<()> {
        let bytes = std::fs::read(file)?;
        let stanza = if message {
            StanzaKind::Message
        } else {
            StanzaKind::Iq
        };
        for element in chunk_bytes(&bytes, sid, block_size, stanza)? {
            println!("{}", element);
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Replay
// ----------------------------------------------------------------------------

/// Parse a JSON-lines script. Blank lines and lines starting with `#` are
/// skipped; line numbers in errors are 1-based.
pub fn parse_script(contents: &str) -> Result<Vec<ScriptLine>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| CliError::script(index + 1, e.to_string()))
        })
        .collect()
}

/// Run a script through a router built from `config` and report what was
/// handled. Every script line must name a configured account.
pub async fn replay(
    config: &AppConfig,
    script: &str,
    transcript: Transcript,
) -> Result<ReplayReport> {
    let lines = parse_script(script)?;

    let sessions: HashMap<AccountId, Arc<ScriptedSession>> = config
        .accounts
        .iter()
        .map(|account| {
            (
                account.id(),
                ScriptedSession::new(account.clone(), transcript.clone()),
            )
        })
        .collect();
    let mut routed = Vec::with_capacity(lines.len());
    for line in lines {
        let id = AccountId::from(&line.account);
        let session = sessions
            .get(&id)
            .ok_or_else(|| CliError::UnknownAccount(line.account.to_string()))?;
        routed.push((session.reference(), line.event));
    }

    let mut builder = RouterBuilder::new()
        .with_config(config.router.clone())
        .with_surface(Box::new(ConsoleSurface::new(
            transcript.clone(),
            config.console.subscription_policy.into(),
        )))
        .with_connector(Arc::new(ConsoleConnector::new(transcript)));
    for account in &config.accounts {
        builder = builder.add_account(Account::new(account.jid.clone()));
    }
    let router = builder.start()?;

    let attachments: Vec<(AccountId, SessionId)> = sessions
        .iter()
        .map(|(id, session)| (id.clone(), session.id()))
        .collect();
    router
        .with_context(move |ctx| -> ParleyResult<()> {
            for (id, session) in attachments {
                ctx.accounts.attach_session(&id, session)?;
            }
            Ok(())
        })
        .await??;

    let events = router.events();
    info!("Replaying {} events", routed.len());
    for (session, kind) in routed {
        debug!("Replaying {} event", kind.name());
        events.emit(&session, kind).await?;
    }
    drop(events);

    let (dispatch, context) = router.shutdown().await?;
    Ok(ReplayReport {
        dispatch,
        handled: context.stats.by_category().collect(),
        unresolved: context.stats.unresolved,
        reconnects_scheduled: context.reconnector.scheduled(),
    })
}

// ----------------------------------------------------------------------------
// File Transfer
// ----------------------------------------------------------------------------

/// Decode a file-transfer element into a readable description
pub fn describe_element(xml: &str) -> Result<String> {
    let description = match FileTransferElement::decode(xml.trim())? {
        FileTransferElement::Offer(offer) => {
            format!("file offer\n{}", serde_json::to_string_pretty(&offer)?)
        }
        FileTransferElement::Ibb(element) => {
            format!(
                "bytestream {}\n{}",
                element.sid(),
                serde_json::to_string_pretty(&element)?
            )
        }
    };
    Ok(description)
}

/// The `open`, `data` and `close` elements that carry `bytes` in-band
pub fn chunk_bytes(
    bytes: &[u8],
    sid: String,
    block_size: u16,
    stanza: StanzaKind,
) -> Result<Vec<String>> {
    let mut sender = IbbSender::new(sid, block_size)?.with_stanza(stanza);
    let mut elements = vec![sender.open().to_xml()];
    elements.extend(sender.chunk(bytes).iter().map(|data| data.to_xml()));
    elements.push(sender.close().to_xml());
    Ok(elements)
}
