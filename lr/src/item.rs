use std::fmt::Debug;
use std::hash::Hash;
use grammar::{Ffn, GrammarConfig, Symbol};

/// What separates SLR from canonical LR(1): the lookahead payload an item
/// carries, how it is seeded and propagated through closure, and which
/// terminals an end item reduces on. Everything else in the automaton is
/// shared.
pub trait LrFlavor {
  type Lookahead: Clone + Eq + Ord + Hash + Debug;

  fn start_lookahead(cfg: &GrammarConfig) -> Self::Lookahead;

  /// Lookaheads for the items added when closure expands the
  /// non-terminal of `A -> α · B β` carrying lookahead `parent`.
  fn closure_lookaheads(
    ffn: &Ffn,
    beta: &[Symbol],
    parent: &Self::Lookahead,
    cfg: &GrammarConfig,
  ) -> Vec<Self::Lookahead>;

  /// Terminals an end item `A -> α ·` installs reduce entries for.
  fn reduce_terminals(ffn: &Ffn, lhs: &Symbol, la: &Self::Lookahead) -> Vec<Symbol>;

  fn fmt_lookahead(la: &Self::Lookahead) -> Option<String>;
}

/// A dotted production: an index into the augmented production list and
/// the dot offset into its effective right-hand side (empty for
/// ε-productions). Identity includes the lookahead, so canonical LR(1)
/// states never merge.
#[derive(Debug)]
pub struct Item<F: LrFlavor> {
  pub prod: usize,
  pub dot: usize,
  pub la: F::Lookahead,
}

impl<F: LrFlavor> Clone for Item<F> {
  fn clone(&self) -> Self {
    Item {
      prod: self.prod,
      dot: self.dot,
      la: self.la.clone(),
    }
  }
}

impl<F: LrFlavor> PartialEq for Item<F> {
  fn eq(&self, other: &Self) -> bool {
    self.prod == other.prod && self.dot == other.dot && self.la == other.la
  }
}

impl<F: LrFlavor> Eq for Item<F> {}

impl<F: LrFlavor> PartialOrd for Item<F> {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl<F: LrFlavor> Ord for Item<F> {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    (self.prod, self.dot, &self.la).cmp(&(other.prod, other.dot, &other.la))
  }
}

impl<F: LrFlavor> Hash for Item<F> {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.prod.hash(state);
    self.dot.hash(state);
    self.la.hash(state);
  }
}

impl<F: LrFlavor> Item<F> {
  pub fn next(&self) -> Item<F> {
    Item {
      prod: self.prod,
      dot: self.dot + 1,
      la: self.la.clone(),
    }
  }
}
