use std::fmt;
use itertools::Itertools;
use crate::{GrammarConfig, GrammarError, GrammarErrorKind, Symbol};

/// A plain production. Equality and hashing follow symbol identity, so a
/// production looked up from a parse action matches its grammar-text twin
/// regardless of lexemes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
  pub lhs: Symbol,
  pub rhs: Vec<Symbol>,
}

impl Production {
  pub fn new(lhs: Symbol, rhs: Vec<Symbol>) -> Production {
    Production { lhs, rhs }
  }

  /// True for the source form of an empty production: `rhs = [ε]`.
  pub fn is_epsilon(&self) -> bool {
    self.rhs.len() == 1 && self.rhs[0].is_epsilon()
  }

  /// Parses one production per line. `|` expands into several productions
  /// sharing the line's left-hand side; a single right-hand symbol equal
  /// to the configured epsilon string is the empty production.
  pub fn parse_all(text: &str, cfg: &GrammarConfig) -> Result<Vec<Production>, GrammarError> {
    let mut productions = vec![];
    let mut offset = 0;

    for line in text.split('\n') {
      let span = (offset, offset + line.len());
      offset += line.len() + 1;
      if line.trim().is_empty() {
        continue;
      }

      let Some(arrow) = line.find("->") else {
        return Err(GrammarError {
          kind: GrammarErrorKind::MissingArrow,
          message: format!("invalid production: {}", line.trim()),
          span,
        });
      };

      let lhs = cfg.symbol(&line[..arrow]);
      if !lhs.is_non_terminal() {
        return Err(GrammarError {
          kind: GrammarErrorKind::TerminalLhs,
          message: format!("left-hand side {} must be a non-terminal", lhs.name),
          span,
        });
      }

      for alt in line[arrow + 2..].split('|') {
        let rhs: Vec<Symbol> = alt.split_whitespace().map(|s| cfg.symbol(s)).collect();
        if rhs.is_empty() {
          return Err(GrammarError {
            kind: GrammarErrorKind::EmptyAlternative,
            message: format!(
              "empty alternative (spell an empty right-hand side as {})",
              cfg.epsilon_str()
            ),
            span,
          });
        }
        productions.push(Production::new(lhs.clone(), rhs));
      }
    }

    if productions.is_empty() {
      return Err(GrammarError {
        kind: GrammarErrorKind::Empty,
        message: "grammar text contains no productions".into(),
        span: (0, text.len()),
      });
    }

    log::debug!("parsed {} productions", productions.len());
    Ok(productions)
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f,
      "{} -> {}",
      self.lhs.name,
      self.rhs.iter().map(|s| s.name.as_str()).join(" ")
    )
  }
}
