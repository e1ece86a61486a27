use std::fmt;
use itertools::Itertools;
use grammar::{GrammarConfig, ParseError, Parser, Production, Symbol, Tree, TreeBuilder};
use lexer::Token;
use crate::builder::LrParser;
use crate::item::LrFlavor;
use crate::{Action, LrError, StackEntry};

/// Sentential forms witnessed while the driver reduces, newest last.
/// Read back-to-front they spell the rightmost derivation.
#[derive(Debug, Clone, Default)]
pub struct RightmostSteps {
  symbols: Vec<Symbol>,
  steps: Vec<Vec<Symbol>>,
}

impl RightmostSteps {
  pub fn new() -> RightmostSteps {
    RightmostSteps::default()
  }

  pub fn set_input(&mut self, input: &[Symbol]) {
    self.symbols = input.to_vec();
    self.push_step();
  }

  /// Records a reduction with `ridx` input symbols (end marker included)
  /// still unread: the `|rhs|` symbols ending `ridx - 1` from the right
  /// collapse into the lhs. An ε-reduce inserts the lhs right after the
  /// rightmost non-terminal, or at the front when the form has none.
  pub fn add(&mut self, prod: &Production, ridx: usize) {
    if prod.is_epsilon() {
      let at = self
        .symbols
        .iter()
        .rposition(|s| s.is_non_terminal())
        .map_or(0, |i| i + 1);
      self.symbols.insert(at, prod.lhs.clone());
    } else {
      let len = self.symbols.len();
      let count = prod.rhs.len();
      let Some(at) = (len + 1).checked_sub(ridx + count) else {
        debug_assert!(false, "reduction wider than the sentential form");
        return;
      };
      self.symbols.drain(at..at + count);
      self.symbols.insert(at, prod.lhs.clone());
    }
    self.push_step();
  }

  pub fn steps(&self) -> &[Vec<Symbol>] {
    &self.steps
  }

  fn push_step(&mut self) {
    self.steps.push(self.symbols.clone());
  }
}

impl fmt::Display for RightmostSteps {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let rendered = self
      .steps
      .iter()
      .rev()
      .map(|step| step.iter().map(|s| s.name.as_str()).join(" "))
      .join(" =>\n");
    write!(f, "{}", rendered)
  }
}

/// Result of a traced LR parse.
#[derive(Debug)]
pub struct LrParse {
  pub tree: Tree,
  pub steps: RightmostSteps,
}

impl<F: LrFlavor> LrParser<F> {
  /// Parses into a fresh tree, returning it with the recorded rightmost
  /// derivation.
  pub fn parse(&self, input: &[Token]) -> Result<LrParse, ParseError> {
    let mut tree = Tree::new();
    let steps = self.drive(input, &mut tree)?;
    Ok(LrParse { tree, steps })
  }

  pub(crate) fn drive(
    &self,
    input: &[Token],
    tree: &mut dyn TreeBuilder,
  ) -> Result<RightmostSteps, ParseError> {
    let mut steps = RightmostSteps::new();
    let forms: Vec<Symbol> = input.iter().map(|t| self.cfg.symbol_from_token(t)).collect();
    steps.set_input(&forms);

    let mut tokens: Vec<Token> = input.to_vec();
    tokens.push(Token::text(self.cfg.end_mark_str()));

    let mut stack = vec![StackEntry::State(0)];
    // production indices in reduce order; replayed in reverse on accept
    let mut output: Vec<usize> = vec![];
    let mut pos = 0;

    loop {
      if pos >= tokens.len() {
        return Err(ParseError::UnexpectedEof);
      }
      let cur = self.cfg.symbol_from_token(&tokens[pos]);
      let state = match stack.last() {
        Some(StackEntry::State(s)) => *s,
        _ => return Err(ParseError::unexpected(&cur)),
      };

      let act = self
        .action
        .get(&state)
        .and_then(|row| row.get(&cur))
        .copied();
      let Some(act) = act else {
        return Err(ParseError::unexpected(&cur));
      };
      log::trace!("lr: state {} input {} action {}", state, cur, act);

      match act {
        Action::Accept => {
          for &prod in output.iter().rev() {
            tree.add_r(&self.prods[prod]);
          }
          for token in &tokens {
            tree.update_r(&self.cfg.symbol_from_token(token));
          }
          return Ok(steps);
        }
        Action::Shift(next) => {
          stack.push(StackEntry::Symbol(cur));
          stack.push(StackEntry::State(next));
          pos += 1;
        }
        Action::Reduce(prod_ix) => {
          let prod = &self.prods[prod_ix];
          let count = if prod.is_epsilon() { 0 } else { prod.rhs.len() };
          for _ in 0..count {
            stack.pop();
            stack.pop();
          }
          let top_state = match stack.last() {
            Some(StackEntry::State(s)) => *s,
            _ => return Err(ParseError::unexpected(&cur)),
          };
          let next = self
            .goto_table
            .get(&top_state)
            .and_then(|row| row.get(&prod.lhs))
            .copied();
          let Some(next) = next else {
            return Err(ParseError::unexpected(&cur));
          };
          stack.push(StackEntry::Symbol(prod.lhs.clone()));
          stack.push(StackEntry::State(next));
          output.push(prod_ix);
          steps.add(prod, tokens.len() - pos);
        }
        Action::Error(handler) => match self.handlers.get(handler) {
          Some(handler) => handler(&mut stack, &mut tokens, &mut pos),
          None => return Err(ParseError::unexpected(&cur)),
        },
      }
    }
  }
}

impl<F: LrFlavor> Parser for LrParser<F> {
  type BuildError = LrError;

  fn from_productions(
    cfg: GrammarConfig,
    prods: Vec<Production>,
  ) -> Result<Self, grammar::GrammarError> {
    LrParser::new(cfg, prods)
  }

  fn build(&mut self) -> Result<(), LrError> {
    LrParser::build(self)
  }

  fn parse_into(
    &self,
    input: &[Token],
    tree: &mut dyn TreeBuilder,
  ) -> Result<Vec<String>, ParseError> {
    self.drive(input, tree)?;
    Ok(vec![])
  }
}
