#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for one IMAP mailbox

use anyhow::Context;
use clap::{Parser, Subcommand};
use mailbox_client::{Credentials, INBOX, MailClient, MailConfig, MessageSummary};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailbox-cli")]
#[command(about = "Browse, search and clean up an IMAP mailbox")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the server accepts the credentials
    Verify,

    /// List folders in the personal namespace
    Folders,

    /// List message summaries
    List {
        /// Folder to list
        #[arg(long, default_value = INBOX)]
        folder: String,
    },

    /// Search the inbox in subject, sender, recipients and body
    Search {
        /// Text to look for
        query: String,
    },

    /// Print a message and mark it read
    Show {
        /// Message UID
        uid: u32,

        /// Folder containing the message
        #[arg(long, default_value = INBOX)]
        folder: String,
    },

    /// Delete a message and expunge its folder
    Delete {
        /// Message UID
        uid: u32,

        /// Folder containing the message
        #[arg(long, default_value = INBOX)]
        folder: String,
    },
}

fn credentials_from_env() -> anyhow::Result<Credentials> {
    let username = std::env::var("MAIL_USERNAME").context("MAIL_USERNAME not set")?;
    let password = std::env::var("MAIL_PASSWORD").context("MAIL_PASSWORD not set")?;
    Ok(Credentials::new(username, password))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = MailConfig::from_env()?;
    let creds = credentials_from_env()?;
    let client = MailClient::new(config);

    match &args.command {
        Command::Verify => cmd_verify(&client, &creds).await?,
        Command::Folders => cmd_folders(&client, &args, &creds).await?,
        Command::List { folder } => {
            let summaries = client.fetch_summaries(&creds, folder).await?;
            print_summaries(&args, &summaries)?;
        }
        Command::Search { query } => {
            let summaries = client.search(&creds, query).await?;
            print_summaries(&args, &summaries)?;
        }
        Command::Show { uid, folder } => {
            let message = client.fetch_full_in(&creds, folder, *uid).await?;
            if let Some(warning) = &message.mark_seen_warning {
                eprintln!("warning: could not mark message read: {warning}");
            }
            print!("{}", message.text());
        }
        Command::Delete { uid, folder } => {
            let purged = client.delete_message_in(&creds, folder, *uid).await?;
            println!("Deleted UID {uid}, {purged} message(s) expunged");
        }
    }

    Ok(())
}

async fn cmd_verify(client: &MailClient, creds: &Credentials) -> anyhow::Result<()> {
    match client.check_credentials(creds).await {
        Ok(()) => {
            println!("Credentials accepted");
            Ok(())
        }
        Err(e) if e.is_authentication() => {
            println!("Incorrect credentials");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_folders(client: &MailClient, args: &Args, creds: &Credentials) -> anyhow::Result<()> {
    let folders = client.list_folders(creds).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&folders)?);
    } else {
        for folder in &folders {
            println!("{folder}");
        }
    }

    Ok(())
}

fn print_summaries(args: &Args, summaries: &[MessageSummary]) -> anyhow::Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No messages found.");
        return Ok(());
    }

    println!("{:<8} {:<2} {:<17} {:<30} Subject", "UID", "", "Date", "From");
    println!("{}", "-".repeat(100));

    for summary in summaries {
        let date = summary
            .date
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "{:<8} {:<2} {:<17} {:<30} {}",
            summary.id,
            if summary.is_unread { "*" } else { "" },
            date,
            truncate(&summary.from, 28),
            truncate(&summary.subject, 40),
        );
    }

    println!("\n{} message(s)", summaries.len());
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
