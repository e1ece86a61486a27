//! Grammar core: symbols and productions, BNF text parsing, FIRST/FOLLOW
//! sets and the parse tree shared by the LL and LR drivers, plus the
//! `Parser`/`TreeBuilder` seams the other crates plug into.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;
use lexer::Token;

mod ffn;
mod production;
mod symbol;
mod tree;

pub use ffn::Ffn;
pub use production::Production;
pub use symbol::{GrammarConfig, Symbol, SymbolKind};
pub use tree::{NodeId, Tree, TreeBuilder, TreeNode};

#[cfg(not(debug_assertions))]
pub type Map<K, V> = std::collections::HashMap<K, V>;

#[cfg(debug_assertions)]
pub type Map<K, V> = indexmap::IndexMap<K, V>;

#[cfg(not(debug_assertions))]
pub type Set<K> = std::collections::HashSet<K>;

#[cfg(debug_assertions)]
pub type Set<K> = indexmap::IndexSet<K>;

pub type SymbolSet = Set<Symbol>;

/// Malformed grammar text, fatal at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GrammarError {
  pub kind: GrammarErrorKind,
  pub message: String,
  /// Byte span into the grammar text.
  pub span: (usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarErrorKind {
  MissingArrow,
  EmptyAlternative,
  TerminalLhs,
  Empty,
}

/// A parse failure no table entry and no error handler could absorb.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  #[error("unexpected token {name} at line {line}, column {column}")]
  UnexpectedToken {
    name: String,
    line: usize,
    column: usize,
  },
  #[error("unexpected end of input")]
  UnexpectedEof,
}

impl ParseError {
  pub fn unexpected(sym: &Symbol) -> ParseError {
    ParseError::UnexpectedToken {
      name: sym.name.clone(),
      line: sym.line,
      column: sym.column,
    }
  }
}

/// What the sema layer needs from a parser: construction from plain
/// productions, one-off table building, and a table-driven parse that
/// grows a caller-supplied tree. Recovery diagnostics come back as
/// strings; only unrecoverable situations are `Err`.
pub trait Parser: Sized {
  type BuildError: std::error::Error;

  fn from_productions(cfg: GrammarConfig, prods: Vec<Production>) -> Result<Self, GrammarError>;

  fn build(&mut self) -> Result<(), Self::BuildError>;

  fn parse_into(
    &self,
    input: &[Token],
    tree: &mut dyn TreeBuilder,
  ) -> Result<Vec<String>, ParseError>;
}

/// Renders a spanned grammar error against its source text on stderr.
pub fn report_error(input: &str, error: &GrammarError) {
  let writer = StandardStream::stderr(ColorChoice::Always);
  let config = term::Config::default();
  let files = SimpleFile::new("", input);

  let title = match error.kind {
    GrammarErrorKind::MissingArrow => "missing '->'",
    GrammarErrorKind::EmptyAlternative => "empty alternative",
    GrammarErrorKind::TerminalLhs => "left-hand side is not a non-terminal",
    GrammarErrorKind::Empty => "empty grammar",
  };
  let diagnostic = Diagnostic::error()
    .with_message(title)
    .with_labels(vec![
      Label::primary((), error.span.0..error.span.1).with_message(&error.message)
    ]);

  let _ = term::emit(&mut writer.lock(), &config, &files, &diagnostic);
}
