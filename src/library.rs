//! Notes on disk.
//!
//! A [`Library`] is a document root directory. Every Markdown or HTML file
//! below it is a note, addressed by its *query path*: the path relative to the root,
//! `/`-separated, without the extension (`rust/ownership.md` is
//! `rust/ownership`).

use crate::error::{Error, Result};
use crate::markup::{Node, html, markdown};
use crate::parser::Outline;
use serde::Serialize;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extensions treated as notes.
pub const NOTE_EXTENSIONS: &[&str] = &["md", "markdown", "html", "htm"];

const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|n| e.eq_ignore_ascii_case(n)))
}

pub fn is_note_path(path: &Path) -> bool {
    has_extension(path, NOTE_EXTENSIONS)
}

/// A loaded note: source, markup tree and outline.
#[derive(Debug, Clone)]
pub struct Note {
    pub path: PathBuf,
    /// File stem; names the outline root when the note has no leading `h1`.
    pub name: String,
    pub content: String,
    pub body: Node,
    pub outline: Outline,
}

impl Note {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::from_source(path, content))
    }

    /// Build a note from source text. HTML files are parsed as HTML, other
    /// note files as Markdown; anything else gets an empty body.
    pub fn from_source(path: impl Into<PathBuf>, content: String) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let body = if has_extension(&path, HTML_EXTENSIONS) {
            html::parse(&content)
        } else if is_note_path(&path) {
            markdown::parse(&content)
        } else {
            debug!(path = %path.display(), "not a note file, empty body");
            Node::element("body")
        };
        let outline = Outline::from_node(&body, &name);
        Self {
            path,
            name,
            content,
            body,
            outline,
        }
    }

    /// The markup of the section `query` resolves to, as a standalone body.
    pub fn section(&self, query: &str) -> Option<Node> {
        let doc = self.outline.find(query)?;
        Some(self.body_slice(doc.node_span()))
    }

    fn body_slice(&self, span: Range<usize>) -> Node {
        let children = self.body.children();
        let end = span.end.min(children.len());
        let start = span.start.min(end);
        Node::element("body").with_children(children[start..end].iter().cloned())
    }
}

/// A note file found under a library root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NotePath {
    pub full: PathBuf,
    pub relative: PathBuf,
}

impl NotePath {
    /// Relative path without extension, `/`-separated.
    pub fn query_path(&self) -> String {
        self.relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Last component of the query path.
    pub fn name(&self) -> String {
        self.relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One autocompletion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub path: String,
    /// More path components follow, so this names a directory.
    pub is_dir: bool,
}

impl Completion {
    /// Text to insert; directories end with a separator.
    pub fn completion_str(&self) -> String {
        if self.is_dir {
            format!("{}/", self.path)
        } else {
            self.path.clone()
        }
    }
}

/// The notes below one document root.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every note below the root, sorted by relative path. Hidden entries are skipped.
    pub fn note_paths(&self) -> Result<Vec<NotePath>> {
        let mut paths = Vec::new();
        walk(&self.root, &self.root, &mut paths)?;
        paths.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(paths)
    }

    /// The note whose query path equals `query`, ignoring case.
    pub fn resolve(&self, query: &str) -> Result<NotePath> {
        let wanted = query.trim_end_matches('/').to_lowercase();
        self.note_paths()?
            .into_iter()
            .find(|p| p.query_path().to_lowercase() == wanted)
            .ok_or_else(|| Error::NotFound(query.to_string()))
    }

    /// Notes whose content contains `text`.
    pub fn search(&self, text: &str) -> Result<Vec<NotePath>> {
        let mut hits = Vec::new();
        for path in self.note_paths()? {
            match fs::read_to_string(&path.full) {
                Ok(content) if content.contains(text) => hits.push(path),
                Ok(_) => {}
                Err(err) => warn!(path = %path.full.display(), %err, "skipping unreadable note"),
            }
        }
        debug!(text, hits = hits.len(), "search");
        Ok(hits)
    }

    /// Completions for a partially typed query path.
    ///
    /// Proposes the next path component of every note under the fragment's
    /// directory that starts with the fragment. If none does, falls back to
    /// notes whose file name starts with the fragment.
    pub fn suggest(&self, fragment: &str) -> Result<Vec<Completion>> {
        let paths = self.note_paths()?;
        let dir = fragment.rfind('/').map_or("", |i| &fragment[..i]);

        let mut completions: Vec<Completion> = Vec::new();
        for path in &paths {
            let query = path.query_path();
            if !query.starts_with(fragment) {
                continue;
            }
            let below = if dir.is_empty() {
                query.as_str()
            } else {
                &query[dir.len() + 1..]
            };
            let (next, is_dir) = match below.split_once('/') {
                Some((next, _)) => (next, true),
                None => (below, false),
            };
            let full = if dir.is_empty() {
                next.to_string()
            } else {
                format!("{dir}/{next}")
            };
            if !completions.iter().any(|c| c.path == full) {
                completions.push(Completion { path: full, is_dir });
            }
        }

        if completions.is_empty() {
            completions = paths
                .iter()
                .filter(|p| p.name().starts_with(fragment))
                .map(|p| Completion {
                    path: p.query_path(),
                    is_dir: false,
                })
                .collect();
        }
        Ok(completions)
    }

    /// Distinct directories (relative, `/`-separated, `.` for the root) that hold notes.
    pub fn base_dirs(&self) -> Result<Vec<String>> {
        let mut dirs: Vec<String> = Vec::new();
        for path in self.note_paths()? {
            let query = path.query_path();
            let dir = query.rfind('/').map_or(".", |i| &query[..i]).to_string();
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        Ok(dirs)
    }
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<NotePath>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
        if file_type.is_dir() {
            walk(root, &path, out)?;
        } else if file_type.is_file() && is_note_path(&path) {
            if let Ok(relative) = path.strip_prefix(root) {
                out.push(NotePath {
                    relative: relative.to_path_buf(),
                    full: path,
                });
            }
        }
    }
    Ok(())
}
