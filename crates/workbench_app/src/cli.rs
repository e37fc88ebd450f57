use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use workbench_core::ArtifactTab;

#[derive(Parser, Debug)]
#[command(name = "workbench")]
#[command(about = "Credit analysis workbench: chat with the artifact backend and export reports")]
pub struct Cli {
    /// Backend base URL, overrides config and WORKBENCH_API_BASE
    #[arg(long, global = true)]
    pub api_base: Option<String>,
    /// Directory for the saved session and exported reports
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
    /// Log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one message and print the assistant reply
    Ask {
        message: String,
        /// Text files to add to the document tray first
        #[arg(short, long)]
        doc: Vec<PathBuf>,
        /// Give up on the request after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Artifact tab to print afterwards
        #[arg(long, value_enum, default_value = "summary")]
        tab: TabArg,
    },
    /// Interactive session; type /help for commands
    Chat {
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Upload a PDF into the document tray
    Upload { path: PathBuf },
    /// Write report.md and report.html
    Export,
    /// Print the saved conversation and an artifact tab
    Show {
        #[arg(long, value_enum, default_value = "summary")]
        tab: TabArg,
    },
    /// Discard the conversation and artifacts, keep documents
    NewCase,
    /// Write the effective settings, overrides included, to the user config file
    SaveConfig,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TabArg {
    Summary,
    Translation,
    Memo,
}

impl From<TabArg> for ArtifactTab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Summary => ArtifactTab::Summary,
            TabArg::Translation => ArtifactTab::Translation,
            TabArg::Memo => ArtifactTab::Memo,
        }
    }
}

/// A line typed in the interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Say(String),
    Tab(ArtifactTab),
    /// 1-based translation version.
    Version(usize),
    Add(PathBuf),
    Upload(String),
    Select(Option<String>),
    Tags { id: String, tags: Vec<String> },
    Remove(String),
    Docs,
    Export,
    NewCase,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub const CHAT_HELP: &str = "\
/tab summary|translation|memo   show an artifact tab
/version N                      select translation version N
/add FILE                       add a text file as a document
/upload FILE.pdf                upload a PDF
/select [ID]                    select (or clear) the focused document
/tags ID a,b,c                  set document tags
/remove ID                      remove a document
/docs                           list documents
/export                         write report.md and report.html
/new                            start a new case
/quit                           leave";

pub fn parse_chat_line(line: &str) -> ChatCommand {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatCommand::Say(line.to_string());
    };
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    match (name, rest) {
        ("tab", "summary") => ChatCommand::Tab(ArtifactTab::Summary),
        ("tab", "translation") => ChatCommand::Tab(ArtifactTab::Translation),
        ("tab", "memo") => ChatCommand::Tab(ArtifactTab::Memo),
        ("version", n) => match n.parse::<usize>() {
            Ok(n) if n > 0 => ChatCommand::Version(n),
            _ => ChatCommand::Unknown(line.to_string()),
        },
        ("add", path) if !path.is_empty() => ChatCommand::Add(PathBuf::from(path)),
        ("upload", path) if !path.is_empty() => ChatCommand::Upload(path.to_string()),
        ("select", "") => ChatCommand::Select(None),
        ("select", id) => ChatCommand::Select(Some(id.to_string())),
        ("tags", rest) if !rest.is_empty() => {
            let (id, tags) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            ChatCommand::Tags {
                id: id.to_string(),
                tags: tags.split(',').map(str::to_string).collect(),
            }
        }
        ("remove", id) if !id.is_empty() => ChatCommand::Remove(id.to_string()),
        ("docs", _) => ChatCommand::Docs,
        ("export", _) => ChatCommand::Export,
        ("new", _) => ChatCommand::NewCase,
        ("help", _) => ChatCommand::Help,
        ("quit" | "exit", _) => ChatCommand::Quit,
        _ => ChatCommand::Unknown(line.to_string()),
    }
}
