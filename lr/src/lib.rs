//! LR parsing: a generic item-set automaton builder with SLR and
//! canonical LR(1) monomorphizations, the shift/reduce driver with
//! pluggable error handlers, and the rightmost-derivation trace.

use std::fmt;
use thiserror::Error;
use grammar::{GrammarError, Map, Symbol};
use lexer::Token;

mod builder;
mod driver;
mod item;
mod lr1;
mod slr;

pub use builder::LrParser;
pub use driver::{LrParse, RightmostSteps};
pub use item::{Item, LrFlavor};
pub use lr1::Lr1Flavor;
pub use slr::SlrFlavor;

pub type Slr = LrParser<SlrFlavor>;
pub type Lr1 = LrParser<Lr1Flavor>;

/// One ACTION table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Shift(usize),
  Reduce(usize),
  Accept,
  /// Index into the installed error handlers.
  Error(usize),
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Action::Shift(s) => write!(f, "s{}", s),
      Action::Reduce(p) => write!(f, "r{}", p),
      Action::Accept => write!(f, "acc"),
      Action::Error(e) => write!(f, "e{}", e),
    }
  }
}

/// `ACTION[state][terminal-or-end]`.
pub type ActionTable = Map<usize, Map<Symbol, Action>>;
/// `GOTO[state][non-terminal]`.
pub type GotoTable = Map<usize, Map<Symbol, usize>>;

/// The parse stack interleaves states and symbols.
#[derive(Debug, Clone)]
pub enum StackEntry {
  State(usize),
  Symbol(Symbol),
}

impl StackEntry {
  pub fn state(&self) -> Option<usize> {
    match self {
      StackEntry::State(s) => Some(*s),
      StackEntry::Symbol(_) => None,
    }
  }

  pub fn symbol(&self) -> Option<&Symbol> {
    match self {
      StackEntry::Symbol(sym) => Some(sym),
      StackEntry::State(_) => None,
    }
  }
}

impl fmt::Display for StackEntry {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      StackEntry::State(s) => write!(f, "{}", s),
      StackEntry::Symbol(sym) => write!(f, "{}", sym),
    }
  }
}

/// Recovery callback dispatched by `Action::Error` entries. Handlers may
/// rewrite the stack, the remaining tokens, or the cursor.
pub type ErrorHandler =
  Box<dyn Fn(&mut Vec<StackEntry>, &mut Vec<Token>, &mut usize) + Send + Sync>;

/// Post-build table rewriter registered by the client.
pub type TableHook =
  Box<dyn FnOnce(&mut ActionTable, &mut GotoTable, &mut Vec<ErrorHandler>) + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LrError {
  #[error(transparent)]
  Grammar(#[from] GrammarError),
  #[error("shift-reduce conflict: can shift {shift} or reduce by {reduce}")]
  ShiftReduceConflict {
    state_items: Vec<String>,
    shift: String,
    reduce: String,
  },
  #[error("reduce-reduce conflict on {lookahead}: {reduce1} vs {reduce2}")]
  ReduceReduceConflict {
    state_items: Vec<String>,
    lookahead: String,
    reduce1: String,
    reduce2: String,
  },
}
