use clap::{Args, Parser, Subcommand, ValueEnum};
use lexicards_core::CardStatus;
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum)]
pub enum StoreKind {
    Json,
    Sqlite,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "lexicards", version, about = "Lexicards vocabulary flashcards (CLI/API)")]
pub struct Cli {
    /// Storage backend
    #[arg(long, value_enum, env = "LEXICARDS_STORE", default_value_t = StoreKind::Json)]
    pub store: StoreKind,

    /// Data directory (defaults to the platform app data dir)
    #[arg(long, env = "LEXICARDS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// SQLite DB path when --store sqlite (defaults to <data dir>/lexicards.sqlite3)
    #[arg(long, env = "LEXICARDS_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// JSON file overriding learning steps, multipliers and interval bounds
    #[arg(long, env = "LEXICARDS_SCHEDULER_CONFIG")]
    pub scheduler_config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Add a word
    Add(CardAdd),
    /// List cards, due ones first
    List(CardList),
    /// Edit a card's text
    Edit(CardEdit),
    /// Delete a card
    Rm { card_id: String },
    /// Interactive review loop
    Review(ReviewCmd),
    /// Counts by status and due
    Stats,
    /// Export data
    #[command(subcommand)]
    Export(ExportCmd),
    /// Import data
    #[command(subcommand)]
    Import(ImportCmd),
    /// Launch Axum HTTP API
    Api(ApiCmd),
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub english: String,
    #[arg(long)]
    pub vietnamese: String,
    #[arg(long)]
    pub example: Option<String>,
    #[arg(long)]
    pub phonetic: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CardList {
    #[arg(long = "status", value_parser = parse_status)]
    pub statuses: Vec<CardStatus>,
    #[arg(long)]
    pub query: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CardEdit {
    pub card_id: String,
    #[arg(long)]
    pub english: Option<String>,
    #[arg(long)]
    pub vietnamese: Option<String>,
    #[arg(long)]
    pub example: Option<String>,
    #[arg(long)]
    pub clear_example: bool,
    #[arg(long)]
    pub phonetic: Option<String>,
    #[arg(long)]
    pub clear_phonetic: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewCmd {
    #[arg(long, default_value_t = 50)]
    pub max: usize,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExportCmd {
    Json { path: PathBuf },
    Csv { path: PathBuf },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImportCmd {
    /// Current or legacy JSON (bundle object or bare card array)
    Json { path: PathBuf },
    /// english,vietnamese,example,phonetic rows; imported as new cards
    Csv { path: PathBuf },
}

#[derive(Debug, Args, Clone)]
pub struct ApiCmd {
    /// Bind address (host:port)
    #[arg(long, env = "LEXICARDS_API_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: String,
}

pub fn parse_status(s: &str) -> Result<CardStatus, String> {
    CardStatus::parse(s).ok_or_else(|| format!("unknown status {s:?} (new, learning, learned)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_filters() {
        let cli = Cli::try_parse_from([
            "lexicards", "list", "--status", "learning", "--status", "NEW", "--query", "cat",
        ])
        .unwrap();
        match cli.cmd {
            Command::List(l) => {
                assert_eq!(l.statuses, vec![CardStatus::Learning, CardStatus::New]);
                assert_eq!(l.query.as_deref(), Some("cat"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(Cli::try_parse_from(["lexicards", "list", "--status", "review"]).is_err());
    }
}
