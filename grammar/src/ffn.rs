//! FIRST and FOLLOW sets, computed by fixpoint iteration over the
//! production list.

use crate::{GrammarConfig, Map, Production, Symbol, SymbolSet};

#[derive(Debug, Clone, Default)]
pub struct Ffn {
  pub first: Map<Symbol, SymbolSet>,
  pub follow: Map<Symbol, SymbolSet>,
}

impl Ffn {
  /// The first supplied production's left-hand side is the start symbol;
  /// its FOLLOW set seeds the end marker.
  pub fn compute(cfg: &GrammarConfig, prods: &[Production]) -> Ffn {
    let mut ffn = Ffn {
      first: compute_first(cfg, prods),
      follow: Map::new(),
    };
    ffn.compute_follow(cfg, prods);
    log::debug!(
      "ffn: FIRST for {} symbols, FOLLOW for {}",
      ffn.first.len(),
      ffn.follow.len()
    );
    ffn
  }

  /// FIRST of a single symbol; terminals, the end marker and ε are their
  /// own FIRST.
  pub fn first_of(&self, sym: &Symbol) -> SymbolSet {
    if !sym.is_non_terminal() {
      let mut set = SymbolSet::new();
      set.insert(sym.clone());
      return set;
    }
    self.first.get(sym).cloned().unwrap_or_default()
  }

  pub fn nullable(&self, sym: &Symbol) -> bool {
    sym.is_epsilon()
      || self
        .first
        .get(sym)
        .map_or(false, |set| set.iter().any(|s| s.is_epsilon()))
  }

  pub fn follow_of(&self, sym: &Symbol) -> SymbolSet {
    self.follow.get(sym).cloned().unwrap_or_default()
  }

  /// FIRST of a sequence: union FIRST of each symbol until one is not
  /// nullable. When the whole sequence is nullable the `last` set is
  /// appended if given, otherwise ε is.
  pub fn first_of_seq(
    &self,
    symbols: &[Symbol],
    last: Option<&SymbolSet>,
    cfg: &GrammarConfig,
  ) -> SymbolSet {
    let mut result = SymbolSet::new();
    for sym in symbols {
      if sym.is_epsilon() {
        continue;
      }
      let sym_first = self.first_of(sym);
      let nullable = sym_first.iter().any(|s| s.is_epsilon());
      for s in sym_first {
        if !s.is_epsilon() {
          result.insert(s);
        }
      }
      if !nullable {
        return result;
      }
    }
    match last {
      Some(last) => result.extend(last.iter().cloned()),
      None => {
        result.insert(cfg.epsilon());
      }
    }
    result
  }

  /// `FIRST(A) = {…}` lines for every non-terminal, sorted for stable
  /// output.
  pub fn dump_first(&self) -> String {
    dump_sets("FIRST", &self.first)
  }

  pub fn dump_follow(&self) -> String {
    dump_sets("FOLLOW", &self.follow)
  }

  fn compute_follow(&mut self, cfg: &GrammarConfig, prods: &[Production]) {
    self
      .follow
      .entry(prods[0].lhs.clone())
      .or_default()
      .insert(cfg.end_mark());

    loop {
      let mut changed = false;

      for prod in prods {
        // FIRST of everything to the right of the scan point; None means
        // "end of rhs", which contributes FOLLOW of the lhs.
        let mut tail: Option<SymbolSet> = None;

        for sym in prod.rhs.iter().rev() {
          if sym.is_epsilon() {
            continue;
          }
          if !sym.is_non_terminal() {
            let mut set = SymbolSet::new();
            set.insert(sym.clone());
            tail = Some(set);
            continue;
          }

          let sym_first = self.first_of(sym);
          let nullable = sym_first.iter().any(|s| s.is_epsilon());
          let incoming = match &tail {
            Some(t) => t.clone(),
            None => self.follow.get(&prod.lhs).cloned().unwrap_or_default(),
          };

          let mut next_tail: SymbolSet =
            sym_first.into_iter().filter(|s| !s.is_epsilon()).collect();
          if nullable {
            next_tail.extend(incoming.iter().cloned());
          }

          let entry = self.follow.entry(sym.clone()).or_default();
          for s in incoming {
            changed |= entry.insert(s);
          }
          tail = Some(next_tail);
        }
      }

      if !changed {
        break;
      }
    }
  }
}

fn dump_sets(label: &str, sets: &Map<Symbol, SymbolSet>) -> String {
  let mut lines: Vec<String> = sets
    .iter()
    .filter(|(sym, _)| sym.is_non_terminal())
    .map(|(sym, set)| {
      let mut names: Vec<&str> = set.iter().map(|s| s.name.as_str()).collect();
      names.sort_unstable();
      format!("{}({}) = {{{}}}", label, sym.name, names.join(","))
    })
    .collect();
  lines.sort_unstable();
  lines.join("\n")
}

fn compute_first(cfg: &GrammarConfig, prods: &[Production]) -> Map<Symbol, SymbolSet> {
  let mut first: Map<Symbol, SymbolSet> = Map::new();
  for prod in prods {
    first.entry(prod.lhs.clone()).or_default();
  }

  loop {
    let mut changed = false;

    for prod in prods {
      let mut add = SymbolSet::new();
      let mut all_nullable = true;

      for sym in &prod.rhs {
        if sym.is_epsilon() {
          continue;
        }
        if !sym.is_non_terminal() {
          add.insert(sym.clone());
          all_nullable = false;
          break;
        }
        let sym_first = first.get(sym).cloned().unwrap_or_default();
        let nullable = sym_first.iter().any(|s| s.is_epsilon());
        for s in sym_first {
          if !s.is_epsilon() {
            add.insert(s);
          }
        }
        if !nullable {
          all_nullable = false;
          break;
        }
      }
      if all_nullable {
        add.insert(cfg.epsilon());
      }

      let entry = first.entry(prod.lhs.clone()).or_default();
      for s in add {
        changed |= entry.insert(s);
      }
    }

    if !changed {
      break;
    }
  }

  first
}
