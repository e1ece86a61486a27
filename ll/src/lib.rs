//! LL(1): predictive-table construction and the stack-based recognizer.

use grammar::{
  Ffn, GrammarConfig, GrammarError, GrammarErrorKind, Map, ParseError, Parser, Production,
  Symbol, Tree, TreeBuilder,
};
use lexer::Token;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlError {
  #[error(transparent)]
  Grammar(#[from] GrammarError),
  #[error("ambiguous grammar: M[{non_terminal}, {terminal}] holds both {prod1} and {prod2}")]
  AmbiguousGrammar {
    non_terminal: String,
    terminal: String,
    prod1: String,
    prod2: String,
  },
}

pub struct Ll1 {
  cfg: GrammarConfig,
  prods: Vec<Production>,
  ffn: Ffn,
  /// `M[non-terminal][terminal-or-end] -> production index`
  table: Map<Symbol, Map<Symbol, usize>>,
}

impl Ll1 {
  /// The first production's left-hand side is the start symbol.
  pub fn new(cfg: GrammarConfig, prods: Vec<Production>) -> Result<Ll1, GrammarError> {
    if prods.is_empty() {
      return Err(GrammarError {
        kind: GrammarErrorKind::Empty,
        message: "grammar has no productions".into(),
        span: (0, 0),
      });
    }
    Ok(Ll1 {
      cfg,
      prods,
      ffn: Ffn::default(),
      table: Map::new(),
    })
  }

  pub fn from_text(cfg: GrammarConfig, text: &str) -> Result<Ll1, GrammarError> {
    let prods = Production::parse_all(text, &cfg)?;
    Ll1::new(cfg, prods)
  }

  pub fn productions(&self) -> &[Production] {
    &self.prods
  }

  pub fn ffn(&self) -> &Ffn {
    &self.ffn
  }

  /// `M[A, t] = production` lines, sorted for stable output.
  pub fn dump_table(&self) -> String {
    let mut lines = vec![];
    for (nt, row) in &self.table {
      for (terminal, &ix) in row {
        lines.push(format!(
          "M[{}, {}] = {}",
          nt.name, terminal.name, self.prods[ix]
        ));
      }
    }
    lines.sort_unstable();
    lines.join("\n")
  }

  pub fn build(&mut self) -> Result<(), LlError> {
    self.ffn = Ffn::compute(&self.cfg, &self.prods);
    self.build_table()?;
    log::debug!("ll(1): table rows for {} non-terminals", self.table.len());
    Ok(())
  }

  /// Parses into a fresh tree, returning it together with the recovery
  /// diagnostics (empty for a clean parse).
  pub fn parse(&self, input: &[Token]) -> Result<(Tree, Vec<String>), ParseError> {
    let mut tree = Tree::new();
    let diagnostics = self.parse_into(input, &mut tree)?;
    Ok((tree, diagnostics))
  }

  pub fn parse_into(
    &self,
    input: &[Token],
    tree: &mut dyn TreeBuilder,
  ) -> Result<Vec<String>, ParseError> {
    let mut diagnostics = vec![];
    let mut tokens: Vec<Symbol> = input.iter().map(|t| self.cfg.symbol_from_token(t)).collect();
    tokens.push(self.cfg.end_mark());

    let mut stack = vec![self.cfg.end_mark(), self.prods[0].lhs.clone()];
    let mut pos = 0;

    while let Some(top) = stack.last().cloned() {
      if pos >= tokens.len() {
        return Err(ParseError::UnexpectedEof);
      }
      let cur = tokens[pos].clone();
      log::trace!("ll(1): top {} input {}", top, cur);

      if top.is_terminal() || top.is_end_mark() {
        stack.pop();
        if top == cur {
          tree.update(&cur);
          pos += 1;
        } else {
          diagnostics.push(format!(
            "expected {} but got {} at line {}, column {}",
            top.name, cur.name, cur.line, cur.column
          ));
        }
        continue;
      }

      let cell = self.table.get(&top).and_then(|row| row.get(&cur)).copied();
      match cell {
        Some(idx) => {
          stack.pop();
          let prod = &self.prods[idx];
          tree.add(prod);
          if prod.is_epsilon() {
            continue;
          }
          for sym in prod.rhs.iter().rev() {
            stack.push(sym.clone());
          }
        }
        None => {
          // recovery: derive ε when possible, else drop the token unless
          // it could follow the non-terminal
          if self.ffn.nullable(&top) {
            stack.pop();
            tree.add(&Production::new(top.clone(), vec![self.cfg.epsilon()]));
          } else if !self.ffn.follow_of(&top).contains(&cur) {
            pos += 1;
          } else {
            return Err(ParseError::unexpected(&cur));
          }
          diagnostics.push(format!(
            "unexpected token {} at line {}, column {}",
            cur.name, cur.line, cur.column
          ));
        }
      }
    }

    Ok(diagnostics)
  }

  fn build_table(&mut self) -> Result<(), LlError> {
    for (idx, prod) in self.prods.iter().enumerate() {
      let first = self.ffn.first_of_seq(&prod.rhs, None, &self.cfg);
      let nullable = first.iter().any(|s| s.is_epsilon());

      for sym in &first {
        if sym.is_epsilon() {
          continue;
        }
        insert_cell(&mut self.table, &self.prods, &prod.lhs, sym, idx)?;
      }

      if nullable {
        for sym in &self.ffn.follow_of(&prod.lhs) {
          if sym.is_terminal() || sym.is_end_mark() {
            insert_cell(&mut self.table, &self.prods, &prod.lhs, sym, idx)?;
          }
        }
      }
    }
    Ok(())
  }
}

fn insert_cell(
  table: &mut Map<Symbol, Map<Symbol, usize>>,
  prods: &[Production],
  lhs: &Symbol,
  terminal: &Symbol,
  idx: usize,
) -> Result<(), LlError> {
  let row = table.entry(lhs.clone()).or_default();
  if let Some(&existing) = row.get(terminal) {
    return Err(LlError::AmbiguousGrammar {
      non_terminal: lhs.name.clone(),
      terminal: terminal.name.clone(),
      prod1: prods[existing].to_string(),
      prod2: prods[idx].to_string(),
    });
  }
  row.insert(terminal.clone(), idx);
  Ok(())
}

impl Parser for Ll1 {
  type BuildError = LlError;

  fn from_productions(cfg: GrammarConfig, prods: Vec<Production>) -> Result<Ll1, GrammarError> {
    Ll1::new(cfg, prods)
  }

  fn build(&mut self) -> Result<(), LlError> {
    Ll1::build(self)
  }

  fn parse_into(
    &self,
    input: &[Token],
    tree: &mut dyn TreeBuilder,
  ) -> Result<Vec<String>, ParseError> {
    Ll1::parse_into(self, input, tree)
  }
}
