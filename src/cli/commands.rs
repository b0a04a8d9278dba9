use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[cfg(feature = "unstable-dynamic")]
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate, ValueCompleter};

#[derive(Parser, Debug)]
#[command(name = "notegrid")]
#[command(version)]
#[command(about = "A terminal note browser with heading-outline navigation")]
#[command(
    long_about = "notegrid - Render markdown notes into the terminal and navigate them by outline.\n\n\
    Launch with a note for the interactive pager. Use flags to print the rendered note,\n\
    its outline, or a single section. Notes are files, or query paths inside the\n\
    document root (`rust/ownership` for <root>/rust/ownership.md).\n\n\
    Examples:\n  \
    notegrid rust/ownership              # Interactive pager\n  \
    notegrid -p --width 60 notes.md      # Render to stdout\n  \
    notegrid --outline rust              # Heading tree\n  \
    notegrid -s 'Rust Traits' rust       # One section\n  \
    notegrid search borrow               # Notes mentioning \"borrow\"\n  \
    notegrid root ~/notes                # Set the default document root"
)]
pub struct Cli {
    /// Note to open: a markdown file, or a query path in the document root
    ///
    /// A value that is not an existing file is matched case-insensitively
    /// against note paths below the document root, then below each
    /// registered search path.
    #[arg(add = note_completer())]
    pub note: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Document root for this run (does not change the saved default)
    #[arg(short = 'r', long = "root", value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Render the note to stdout instead of opening the pager
    #[arg(short = 'p', long = "print")]
    pub print: bool,

    /// Render width in columns (default: terminal width, capped by config)
    #[arg(short = 'w', long = "width", value_name = "COLS", value_parser = clap::value_parser!(u16).range(1..))]
    pub width: Option<u16>,

    /// Print without colors or attributes
    #[arg(long = "plain")]
    pub plain: bool,

    /// Print the heading outline as a tree
    #[arg(long = "outline")]
    pub outline: bool,

    /// Print every section query path of the note
    ///
    /// Each printed query can be passed back to --section.
    #[arg(long = "queries")]
    pub queries: bool,

    /// Render only the section matching a query
    ///
    /// A query is a sequence of heading search terms, outermost first.
    ///
    /// Example: -s "Rust Ownership" renders the Ownership section under Rust
    #[arg(short = 's', long = "section", value_name = "QUERY")]
    pub section: Option<String>,

    /// Output format for listings (list, search, complete, paths, --queries)
    #[arg(short = 'o', long = "output", default_value = "plain", global = true)]
    pub output: OutputFormat,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// List the query path of every note in the document root
    List,

    /// Find notes whose content contains TEXT
    Search {
        /// Text to look for (case-sensitive)
        text: String,
    },

    /// Complete a partially typed query path
    Complete {
        /// Beginning of a query path
        #[arg(default_value = "")]
        fragment: String,
    },

    /// Show the registered search paths
    Paths,

    /// Register a search path
    AddPath {
        /// Directory to search for notes
        dir: PathBuf,
    },

    /// Unregister a search path
    RemovePath {
        /// Directory previously added with add-path
        dir: PathBuf,
    },

    /// Show the document root, or save DIR as the default root
    Root {
        /// New default document root
        dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// JSON output
    Json,
}

#[cfg(feature = "unstable-dynamic")]
fn note_completer() -> ArgValueCompleter {
    use notegrid::{Config, Library};
    use std::ffi::OsStr;
    use std::path::Path;

    struct NoteCompleter;

    impl NoteCompleter {
        /// Markdown files and directories next to a partially typed file path.
        fn file_candidates(input: &str) -> Vec<CompletionCandidate> {
            let input_path = Path::new(input);
            let (search_dir, prefix) = if input.is_empty() || input.ends_with('/') {
                let dir = if input.is_empty() { Path::new(".") } else { input_path };
                (dir, String::new())
            } else {
                let parent = input_path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or(Path::new("."));
                let prefix = input_path
                    .file_name()
                    .map(|s| s.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                (parent, prefix)
            };

            let Ok(entries) = std::fs::read_dir(search_dir) else {
                return vec![];
            };
            entries
                .filter_map(Result::ok)
                .filter_map(|entry| {
                    let path = entry.path();
                    let file_name = path.file_name()?.to_string_lossy().into_owned();
                    if !file_name.to_lowercase().starts_with(&prefix) {
                        return None;
                    }
                    let value = if search_dir == Path::new(".") {
                        file_name
                    } else {
                        search_dir.join(&file_name).to_string_lossy().into_owned()
                    };
                    if path.is_dir() {
                        Some(CompletionCandidate::new(format!("{}/", value.trim_end_matches('/'))).help(Some("directory".into())))
                    } else if notegrid::library::is_note_path(&path) {
                        Some(CompletionCandidate::new(value))
                    } else {
                        None
                    }
                })
                .collect()
        }
    }

    impl ValueCompleter for NoteCompleter {
        fn complete(&self, current: &OsStr) -> Vec<CompletionCandidate> {
            let input = current.to_string_lossy();
            let mut candidates = Vec::new();

            if let Some(root) = Config::load().document_root() {
                if let Ok(completions) = Library::new(root).suggest(&input) {
                    candidates.extend(completions.iter().map(|c| {
                        let help = if c.is_dir { "notes" } else { "note" };
                        CompletionCandidate::new(c.completion_str()).help(Some(help.into()))
                    }));
                }
            }
            if candidates.is_empty() {
                candidates = Self::file_candidates(&input);
            }
            candidates
        }
    }

    ArgValueCompleter::new(NoteCompleter)
}

#[cfg(not(feature = "unstable-dynamic"))]
fn note_completer() -> clap::builder::ValueHint {
    clap::ValueHint::FilePath
}
