use grammar::{Ffn, GrammarConfig, Symbol, SymbolSet};
use crate::item::LrFlavor;

/// Canonical LR(1) items: one lookahead symbol each, propagated through
/// closure as FIRST(βa). No LALR-style state merging is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lr1Flavor {}

impl LrFlavor for Lr1Flavor {
  type Lookahead = Symbol;

  fn start_lookahead(cfg: &GrammarConfig) -> Symbol {
    cfg.end_mark()
  }

  fn closure_lookaheads(
    ffn: &Ffn,
    beta: &[Symbol],
    parent: &Symbol,
    cfg: &GrammarConfig,
  ) -> Vec<Symbol> {
    let mut last = SymbolSet::new();
    last.insert(parent.clone());
    ffn
      .first_of_seq(beta, Some(&last), cfg)
      .into_iter()
      .filter(|s| !s.is_epsilon())
      .collect()
  }

  fn reduce_terminals(_ffn: &Ffn, _lhs: &Symbol, la: &Symbol) -> Vec<Symbol> {
    vec![la.clone()]
  }

  fn fmt_lookahead(la: &Symbol) -> Option<String> {
    Some(la.name.clone())
  }
}
