//! # notegrid
//!
//! A terminal note browser library: parses Markdown notes into a markup
//! tree, groups their blocks into a heading outline, and lays the tree out
//! onto a character grid with word wrapping.
//!
//! ## Example
//!
//! ```rust
//! use notegrid::{Grid, Note, render_html};
//!
//! let note = Note::from_source("guide.md", "# Guide\n\nSome text.\n\n## Setup\n\nSteps.\n".to_string());
//!
//! // Headings nest into an outline addressed by search terms.
//! let setup = note.outline.find("Guide Setup").unwrap();
//! assert_eq!(setup.level(), 2);
//!
//! // Render the whole note 40 columns wide.
//! let mut grid = Grid::new(40);
//! let rows = render_html(&note.body, &mut grid);
//! assert!(rows > 0);
//! assert!(grid.lines().iter().any(|line| line.contains("Some text.")));
//! ```

/// Persisted user settings: library roots and render options.
pub mod config;
pub mod error;
pub mod library;
pub mod markup;
pub mod parser;
pub mod render;
pub mod tui;

pub use config::Config;
pub use error::{Error, Result};
pub use library::{Completion, Library, Note, NotePath};
pub use markup::Node;
pub use parser::{Document, Element, ElementKind, Outline};
pub use render::{AttributedString, Canvas, Grid, render_html};
