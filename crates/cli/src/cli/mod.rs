// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use clap::{Parser, Subcommand, ValueEnum};

pub use args::{LimitArgs, OutputArgs};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    #[value(alias = "ids")]
    Id,
}

/// Side to keep when resolving a conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KeepSide {
    Local,
    Remote,
}

#[derive(Parser)]
#[command(name = "offtrack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "An offline-first replica of a remote issue tracker")]
#[command(
    long_about = "An offline-first replica of a remote issue tracker.\n\n\
    Read and edit issues while disconnected; 'offtrack sync' pulls remote changes, \
    merges them and pushes the queued local edits."
)]
pub struct Cli {
    /// Run as if offtrack was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a replica in the current directory
    #[command(after_help = "\
Examples:
  offtrack init --url wss://tracker.example.com/sync
  offtrack init --url ws://localhost:7001 --connection work")]
    Init {
        /// WebSocket URL of the remote tracker
        #[arg(long, value_parser = non_empty_string)]
        url: String,

        /// Connection id scoping the pull cursor
        #[arg(long, default_value = "default", value_parser = non_empty_string)]
        connection: String,

        /// Directory to initialize (default: current directory)
        #[arg(long)]
        path: Option<String>,
    },

    /// Create an issue locally; it is pushed on the next sync
    #[command(after_help = "\
Examples:
  offtrack new -p ABC \"Login page crash\"
  offtrack new -p ABC \"Flaky upload\" -t Bug -l backend,ci -a dana
  offtrack new -p ABC \"Spike\" -o id")]
    New {
        /// Issue summary
        #[arg(value_parser = non_empty_string)]
        summary: String,

        /// Project key the issue belongs to
        #[arg(long, short = 'p', value_parser = non_empty_string)]
        project: String,

        /// Plain text description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Issue type (default: Task)
        #[arg(long = "type", short = 't')]
        issue_type: Option<String>,

        #[arg(long)]
        priority: Option<String>,

        #[arg(long, short)]
        assignee: Option<String>,

        /// Labels (comma-separated or repeated)
        #[arg(long, short, value_delimiter = ',')]
        label: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Edit one field of an issue
    #[command(after_help = "\
Attributes:
  summary, description, priority, type, assignee, labels

Examples:
  offtrack edit ABC-1 summary \"Login fails on Safari\"
  offtrack edit ABC-1 labels ui,safari
  offtrack edit ABC-1 assignee \"\"          Unassign")]
    Edit {
        /// Issue id or key
        id: String,
        attr: String,
        value: String,
    },

    /// Move an issue to another status
    #[command(after_help = "\
Examples:
  offtrack transition ABC-1 \"In Progress\"
  offtrack transition ABC-1 Closed --category done")]
    Transition {
        /// Issue id or key
        id: String,

        #[arg(value_parser = non_empty_string)]
        status: String,

        /// Status category: todo, indeterminate or done (default: inferred from the status)
        #[arg(long)]
        category: Option<String>,
    },

    /// Delete an issue
    Delete {
        /// Issue id or key
        id: String,
    },

    /// Add a comment to an issue
    Comment {
        /// Issue id or key
        id: String,

        #[arg(value_parser = non_empty_string)]
        body: String,
    },

    /// Show an issue with its comments
    Show {
        /// Issue id or key
        id: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List issues, most recently touched first
    List {
        /// Filter by status category (todo, indeterminate, done)
        #[arg(long, short)]
        status: Option<String>,

        /// Only issues with unsynced local changes or conflicts
        #[arg(long)]
        unsynced: bool,

        #[command(flatten)]
        limits: LimitArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Pull, merge and push now
    Sync {
        /// Print the debug log of the cycle
        #[arg(long, short)]
        verbose: bool,
    },

    /// Inspect queued local changes
    Pending {
        #[command(subcommand)]
        command: Option<PendingCommand>,
    },

    /// Inspect and resolve sync conflicts
    Conflicts {
        #[command(subcommand)]
        command: Option<ConflictsCommand>,
    },

    /// Search issues by key, summary and description
    #[command(after_help = "\
Every word must prefix a word of the issue; when nothing matches that way,
results fall back to a typo-tolerant ranking.

Examples:
  offtrack search \"perf test\"
  offtrack search perfromance")]
    Search {
        #[arg(value_parser = non_empty_string)]
        query: String,

        #[command(flatten)]
        limits: LimitArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Subcommand)]
pub enum PendingCommand {
    /// List queued operations (default)
    List {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Push one operation now, requeueing it if it was abandoned
    Retry {
        /// Operation id
        id: String,
    },

    /// Drop one operation and revert its local change
    Discard {
        /// Operation id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConflictsCommand {
    /// List conflicts (default)
    List {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Resolve a conflict
    #[command(after_help = "\
Examples:
  offtrack conflicts resolve ABC-1 --keep local
  offtrack conflicts resolve ABC-1 --keep remote
  offtrack conflicts resolve ABC-1 --merged '{\"summary\": \"Login fails on Safari 17\"}'")]
    Resolve {
        /// Issue or comment id (issue key accepted)
        id: String,

        #[arg(long, value_enum, required_unless_present = "merged", conflicts_with = "merged")]
        keep: Option<KeepSide>,

        /// JSON object of field values to push instead of either side
        #[arg(long)]
        merged: Option<String>,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
