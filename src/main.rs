//! # notegrid
//!
//! Browse Markdown notes in the terminal.
//!
//! ## Usage
//!
//! Open a note in the pager, by file or by query path in the document root:
//! ```sh
//! notegrid rust/ownership
//! ```
//!
//! Render to stdout:
//! ```sh
//! notegrid --print --width 72 notes.md
//! ```
//!
//! Manage the library:
//! ```sh
//! notegrid root ~/notes
//! notegrid list
//! notegrid search borrow
//! ```

mod cli;

use clap::Parser as ClapParser;
use cli::{Cli, Command, OutputFormat};
use color_eyre::Result;
use color_eyre::eyre::{bail, eyre};
use notegrid::render::ansi;
use notegrid::{Canvas, Config, Error, Grid, Library, Node, Note, NotePath, render_html, tui};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Width used when printing and the terminal size is unknown.
const FALLBACK_WIDTH: u16 = 80;

fn main() -> Result<()> {
    color_eyre::install()?;

    // Handle dynamic shell completions
    #[cfg(feature = "unstable-dynamic")]
    clap_complete::CompleteEnv::with_factory(|| {
        use clap::CommandFactory;
        Cli::command()
    })
    .complete();

    let args = Cli::parse();
    init_logging()?;

    let mut config = Config::load();
    if let Some(root) = &args.root {
        config.set_session_root(root);
    }

    if let Some(command) = &args.command {
        return run_command(command, &mut config, args.output);
    }

    let Some(query) = args.note.as_deref() else {
        eprintln!("No note given.");
        eprintln!("\nUsage: notegrid [OPTIONS] <NOTE>");
        eprintln!("       notegrid [OPTIONS] <COMMAND>\n");
        eprintln!("Tip: `notegrid list` shows the notes in your document root.");
        process::exit(2);
    };
    let note = load_note(query, &config)?;
    debug!(path = %note.path.display(), "opened note");

    let styled = !args.plain && config.render.color && io::stdout().is_terminal();
    let print_width = || -> usize {
        args.width
            .unwrap_or_else(|| config.render_width(terminal_width()))
            .into()
    };

    if args.outline {
        let lines = note.outline.render_tree(print_width());
        let mut grid = Grid::new(print_width());
        for (y, line) in lines.iter().enumerate() {
            grid.draw_attributed(line, 0, y);
        }
        return write_grid(&grid, styled);
    }

    if args.queries {
        let queries: Vec<String> = note
            .outline
            .root()
            .sub_queries()
            .iter()
            .map(|terms| terms.join(" "))
            .collect();
        return match args.output {
            OutputFormat::Plain => {
                queries.iter().for_each(|q| println!("{q}"));
                Ok(())
            }
            OutputFormat::Json => print_json(&queries),
        };
    }

    if args.print {
        let body = match &args.section {
            Some(section) => note
                .section(section)
                .ok_or_else(|| eyre!("no section matches '{section}' in {}", note.path.display()))?,
            None => note.body.clone(),
        };
        return print_body(&body, print_width(), styled);
    }

    let app = tui::App::new(note, args.section.clone(), args.width.or(config.render.max_width));
    let mut terminal = ratatui::init();
    let result = tui::run(&mut terminal, app);
    ratatui::restore();
    result
}

/// Route `tracing` output to a file when `NOTEGRID_LOG` holds a filter.
///
/// The pager owns the terminal, so logs never go to stderr.
fn init_logging() -> Result<()> {
    let Ok(filter) = std::env::var("NOTEGRID_LOG") else {
        return Ok(());
    };
    let path = std::env::var_os("NOTEGRID_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("notegrid.log"));
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| Error::io(&path, e))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn terminal_width() -> u16 {
    crossterm::terminal::size()
        .map(|(cols, _)| cols)
        .unwrap_or(FALLBACK_WIDTH)
}

/// An existing file, or a query path looked up in the document root and
/// then in each search path.
fn load_note(query: &str, config: &Config) -> Result<Note> {
    let path = Path::new(query);
    if path.is_file() {
        return Ok(Note::load(path)?);
    }

    let roots = config
        .document_root()
        .into_iter()
        .chain(config.library.search_paths.iter().map(PathBuf::as_path));
    for root in roots {
        match Library::new(root).resolve(query) {
            Ok(found) => return Ok(Note::load(&found.full)?),
            Err(Error::NotFound(_)) => {}
            Err(err) => warn!(root = %root.display(), %err, "skipping library"),
        }
    }
    Err(Error::NotFound(query.to_string()).into())
}

fn document_library(config: &Config) -> Result<Library> {
    Ok(config
        .document_root()
        .map(Library::new)
        .ok_or(Error::NoDocumentRoot)?)
}

fn run_command(command: &Command, config: &mut Config, output: OutputFormat) -> Result<()> {
    match command {
        Command::List => {
            let paths = document_library(config)?.note_paths()?;
            print_note_paths(&paths, output)
        }
        Command::Search { text } => {
            let paths = document_library(config)?.search(text)?;
            print_note_paths(&paths, output)
        }
        Command::Complete { fragment } => {
            let completions = document_library(config)?.suggest(fragment)?;
            match output {
                OutputFormat::Plain => {
                    completions
                        .iter()
                        .for_each(|c| println!("{}", c.completion_str()));
                    Ok(())
                }
                OutputFormat::Json => print_json(&completions),
            }
        }
        Command::Paths => match output {
            OutputFormat::Plain => {
                config
                    .library
                    .search_paths
                    .iter()
                    .for_each(|p| println!("{}", p.display()));
                Ok(())
            }
            OutputFormat::Json => print_json(&config.library.search_paths),
        },
        Command::AddPath { dir } => {
            let dir = existing_dir(dir)?;
            if config.add_search_path(&dir) {
                config.save()?;
                println!("Added search path {}", dir.display());
            } else {
                println!("{} is already a search path", dir.display());
            }
            Ok(())
        }
        Command::RemovePath { dir } => {
            let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.clone());
            if config.remove_search_path(dir) || config.remove_search_path(&absolute) {
                config.save()?;
                println!("Removed search path {}", dir.display());
                Ok(())
            } else {
                bail!("{} is not a search path", dir.display())
            }
        }
        Command::Root { dir: None } => {
            let root = config.document_root().ok_or(Error::NoDocumentRoot)?;
            println!("{}", root.display());
            Ok(())
        }
        Command::Root { dir: Some(dir) } => {
            let dir = existing_dir(dir)?;
            config.set_default_root(&dir);
            config.save()?;
            println!("Default document root set to {}", dir.display());
            Ok(())
        }
    }
}

fn existing_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    Ok(std::path::absolute(dir).map_err(|e| Error::io(dir, e))?)
}

fn print_note_paths(paths: &[NotePath], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Plain => {
            paths.iter().for_each(|p| println!("{}", p.query_path()));
            Ok(())
        }
        OutputFormat::Json => {
            let entries: Vec<_> = paths
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "query": p.query_path(),
                        "path": p.full,
                    })
                })
                .collect();
            print_json(&entries)
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_body(body: &Node, width: usize, styled: bool) -> Result<()> {
    let mut grid = Grid::new(width);
    render_html(body, &mut grid);
    write_grid(&grid, styled)
}

fn write_grid(grid: &Grid, styled: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    if styled {
        ansi::write_styled(&mut out, grid)?;
    } else {
        ansi::write_plain(&mut out, grid)?;
    }
    Ok(())
}
