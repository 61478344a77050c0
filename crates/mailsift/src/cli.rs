//! Command line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use mailsift_core::{Category, SearchFilter};

/// Mailbox sync, classification and search.
#[derive(Debug, Parser)]
#[command(name = "mailsift", version, about)]
pub struct Cli {
    /// Configuration file (defaults to `<config dir>/mailsift/config.json`).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Synchronize every configured account.
    Run {
        /// Exit once the initial historical sync has finished.
        #[arg(long)]
        exit_after_sync: bool,
    },
    /// Search the index and print matching records as JSON.
    Search(SearchArgs),
    /// Store an account's IMAP password in the system keyring.
    ///
    /// The password is read from standard input.
    SetPassword {
        /// Account id.
        #[arg(long)]
        account: String,
    },
}

/// Filters of the `search` subcommand.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Text to look for in subject and body.
    #[arg(long, short)]
    pub query: Option<String>,
    /// Restrict to one account.
    #[arg(long)]
    pub account: Option<String>,
    /// Restrict to one folder.
    #[arg(long)]
    pub folder: Option<String>,
    /// Restrict to one category, e.g. "Interested" or "Out of Office".
    #[arg(long, value_parser = parse_category)]
    pub category: Option<Category>,
    /// Page number, starting at 1.
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Results per page.
    #[arg(long, default_value_t = mailsift_core::index::DEFAULT_LIMIT)]
    pub limit: u32,
}

impl From<SearchArgs> for SearchFilter {
    fn from(args: SearchArgs) -> Self {
        Self {
            query: args.query,
            account: args.account,
            folder: args.folder,
            category: args.category,
            page: args.page.max(1),
            limit: args.limit,
        }
    }
}

fn parse_category(value: &str) -> Result<Category, String> {
    Category::parse(value).ok_or_else(|| {
        let known: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        format!("unknown category '{value}', expected one of: {}", known.join(", "))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "mailsift",
            "--config",
            "/etc/mailsift.json",
            "run",
            "--exit-after-sync",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/mailsift.json")));
        assert!(matches!(cli.command, Command::Run { exit_after_sync: true }));
    }

    #[test]
    fn test_search_defaults() {
        let cli = Cli::parse_from(["mailsift", "search"]);
        let Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        let filter = SearchFilter::from(args);
        assert_eq!(filter, SearchFilter::default());
    }

    #[test]
    fn test_search_category() {
        let cli = Cli::parse_from([
            "mailsift",
            "search",
            "--category",
            "Meeting Booked",
            "--page",
            "0",
        ]);
        let Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        let filter = SearchFilter::from(args);
        assert_eq!(filter.category, Some(Category::MeetingBooked));
        assert_eq!(filter.page, 1);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let result = Cli::try_parse_from(["mailsift", "search", "--category", "urgent"]);
        assert!(result.is_err());
    }
}
