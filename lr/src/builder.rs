use fnv::FnvBuildHasher;
use indexmap::IndexSet;
use grammar::{
  Ffn, GrammarConfig, GrammarError, GrammarErrorKind, Map, Production, Set, Symbol,
};
use crate::item::{Item, LrFlavor};
use crate::{Action, ActionTable, ErrorHandler, GotoTable, LrError, TableHook};

/// Table builder and runtime shared by the SLR and canonical LR(1)
/// parsers; the flavor parameter contributes lookahead handling only.
pub struct LrParser<F: LrFlavor> {
  pub(crate) cfg: GrammarConfig,
  /// Augmented production list: production 0 is `S' -> S`.
  pub(crate) prods: Vec<Production>,
  prods_of: Map<Symbol, Vec<usize>>,
  pub(crate) ffn: Ffn,
  /// Closed, canonically sorted item set per state; state 0 is initial.
  items_set: Vec<Vec<Item<F>>>,
  pub(crate) action: ActionTable,
  pub(crate) goto_table: GotoTable,
  pub(crate) handlers: Vec<ErrorHandler>,
  hook: Option<TableHook>,
}

impl<F: LrFlavor> LrParser<F> {
  /// Augments the grammar with `S' -> S`, where `S` is the lhs of the
  /// first supplied production.
  pub fn new(cfg: GrammarConfig, prods: Vec<Production>) -> Result<Self, GrammarError> {
    if prods.is_empty() {
      return Err(GrammarError {
        kind: GrammarErrorKind::Empty,
        message: "grammar has no productions".into(),
        span: (0, 0),
      });
    }

    let start = prods[0].lhs.clone();
    let mut aug_lhs = start.clone();
    // primed until it collides with nothing in the grammar
    aug_lhs.name = format!("{}'", start.name);
    while prods.iter().any(|p| p.lhs.name == aug_lhs.name) {
      aug_lhs.name.push('\'');
    }
    aug_lhs.lexval = aug_lhs.name.clone();

    let mut augmented = Vec::with_capacity(prods.len() + 1);
    augmented.push(Production::new(aug_lhs, vec![start]));
    augmented.extend(prods);

    // production 0 is never expanded by closure: its lhs occurs on no
    // right-hand side
    let mut prods_of: Map<Symbol, Vec<usize>> = Map::new();
    for (i, prod) in augmented.iter().enumerate().skip(1) {
      prods_of.entry(prod.lhs.clone()).or_default().push(i);
    }

    Ok(LrParser {
      cfg,
      prods: augmented,
      prods_of,
      ffn: Ffn::default(),
      items_set: vec![],
      action: Map::new(),
      goto_table: Map::new(),
      handlers: vec![],
      hook: None,
    })
  }

  pub fn from_text(cfg: GrammarConfig, text: &str) -> Result<Self, GrammarError> {
    let prods = Production::parse_all(text, &cfg)?;
    Self::new(cfg, prods)
  }

  /// Installs a hook that may rewrite ACTION/GOTO after table
  /// construction, typically adding `Action::Error` entries and their
  /// handlers.
  pub fn install_error_hook(
    &mut self,
    hook: impl FnOnce(&mut ActionTable, &mut GotoTable, &mut Vec<ErrorHandler>)
      + Send
      + Sync
      + 'static,
  ) {
    self.hook = Some(Box::new(hook));
  }

  pub fn build(&mut self) -> Result<(), LrError> {
    self.ffn = Ffn::compute(&self.cfg, &self.prods);
    self.build_states();
    self.build_accept_and_reduce()?;
    if let Some(hook) = self.hook.take() {
      hook(&mut self.action, &mut self.goto_table, &mut self.handlers);
    }
    log::debug!(
      "lr: {} states, {} action rows, {} goto rows",
      self.items_set.len(),
      self.action.len(),
      self.goto_table.len()
    );
    Ok(())
  }

  pub fn state_count(&self) -> usize {
    self.items_set.len()
  }

  pub fn action_table(&self) -> &ActionTable {
    &self.action
  }

  pub fn goto_table(&self) -> &GotoTable {
    &self.goto_table
  }

  /// Effective right-hand side of a production: ε-productions are
  /// canonicalized to an empty slice at the item layer.
  fn rhs(&self, prod: usize) -> &[Symbol] {
    let prod = &self.prods[prod];
    if prod.is_epsilon() {
      &[]
    } else {
      &prod.rhs
    }
  }

  fn symbol_after_dot(&self, item: &Item<F>) -> Option<&Symbol> {
    self.rhs(item.prod).get(item.dot)
  }

  fn is_end(&self, item: &Item<F>) -> bool {
    item.dot == self.rhs(item.prod).len()
  }

  fn close(&self, mut items: Vec<Item<F>>) -> Vec<Item<F>> {
    let mut seen: Set<Item<F>> = items.iter().cloned().collect();
    let mut i = 0;
    while i < items.len() {
      let item = items[i].clone();
      i += 1;
      let Some(sym) = self.symbol_after_dot(&item) else {
        continue;
      };
      if !sym.is_non_terminal() {
        continue;
      }
      let beta = &self.rhs(item.prod)[item.dot + 1..];
      let lookaheads = F::closure_lookaheads(&self.ffn, beta, &item.la, &self.cfg);
      let Some(prod_ids) = self.prods_of.get(sym) else {
        continue;
      };
      for &prod in prod_ids {
        for la in &lookaheads {
          let new_item = Item { prod, dot: 0, la: la.clone() };
          if seen.insert(new_item.clone()) {
            items.push(new_item);
          }
        }
      }
    }
    items.sort();
    items
  }

  fn build_states(&mut self) {
    let start_item = Item {
      prod: 0,
      dot: 0,
      la: F::start_lookahead(&self.cfg),
    };
    let mut states: IndexSet<Vec<Item<F>>, FnvBuildHasher> = IndexSet::default();
    states.insert(self.close(vec![start_item]));

    let mut state = 0;
    while state < states.len() {
      let mut transitions: Map<Symbol, Vec<Item<F>>> = Map::new();
      for item in states.get_index(state).unwrap() {
        if let Some(sym) = self.symbol_after_dot(item) {
          transitions.entry(sym.clone()).or_default().push(item.next());
        }
      }

      for (sym, kernel) in transitions {
        let closed = self.close(kernel);
        let (target, _) = states.insert_full(closed);
        if sym.is_non_terminal() {
          self.goto_table.entry(state).or_default().insert(sym, target);
        } else {
          self
            .action
            .entry(state)
            .or_default()
            .insert(sym, Action::Shift(target));
        }
      }

      state += 1;
    }

    self.items_set = states.into_iter().collect();
  }

  fn build_accept_and_reduce(&mut self) -> Result<(), LrError> {
    // planned reduce entries, collected first so conflict checks can see
    // the complete shift table
    let mut writes = vec![];
    for (state, items) in self.items_set.iter().enumerate() {
      for item in items {
        if !self.is_end(item) {
          continue;
        }
        if item.prod == 0 {
          // accept is exactly "reduce by production 0 on the end marker"
          writes.push((state, self.cfg.end_mark(), Action::Accept));
        } else {
          for terminal in F::reduce_terminals(&self.ffn, &self.prods[item.prod].lhs, &item.la) {
            writes.push((state, terminal, Action::Reduce(item.prod)));
          }
        }
      }
    }

    for (state, sym, act) in writes {
      let existing = self
        .action
        .get(&state)
        .and_then(|row| row.get(&sym))
        .copied();
      match existing {
        None => {
          self.action.entry(state).or_default().insert(sym, act);
        }
        Some(prev) if prev == act => {}
        Some(Action::Shift(_)) => {
          let Action::Reduce(prod) = act else { unreachable!() };
          return Err(self.shift_reduce_conflict(state, &sym, prod));
        }
        Some(Action::Reduce(prev)) => {
          let reduce = match act {
            Action::Reduce(prod) => prod,
            Action::Accept => 0,
            _ => unreachable!(),
          };
          return Err(self.reduce_reduce_conflict(state, &sym, prev, reduce));
        }
        Some(Action::Accept) => {
          let Action::Reduce(prod) = act else { unreachable!() };
          return Err(self.reduce_reduce_conflict(state, &sym, 0, prod));
        }
        Some(Action::Error(_)) => unreachable!("error entries are installed after build"),
      }
    }
    Ok(())
  }

  fn shift_reduce_conflict(&self, state: usize, sym: &Symbol, prod: usize) -> LrError {
    LrError::ShiftReduceConflict {
      state_items: self.fmt_state(state),
      shift: sym.name.clone(),
      reduce: self.prods[prod].to_string(),
    }
  }

  fn reduce_reduce_conflict(
    &self,
    state: usize,
    sym: &Symbol,
    prod1: usize,
    prod2: usize,
  ) -> LrError {
    LrError::ReduceReduceConflict {
      state_items: self.fmt_state(state),
      lookahead: sym.name.clone(),
      reduce1: self.prods[prod1].to_string(),
      reduce2: self.prods[prod2].to_string(),
    }
  }

  fn fmt_state(&self, state: usize) -> Vec<String> {
    self.items_set[state]
      .iter()
      .map(|item| self.fmt_item(item))
      .collect()
  }

  fn fmt_item(&self, item: &Item<F>) -> String {
    let prod = &self.prods[item.prod];
    let rhs = self.rhs(item.prod);
    let mut buf = format!("{} ->", prod.lhs.name);
    for (i, sym) in rhs.iter().enumerate() {
      if i == item.dot {
        buf.push_str(" .");
      }
      buf.push(' ');
      buf.push_str(&sym.name);
    }
    if item.dot == rhs.len() {
      buf.push_str(" .");
    }
    if let Some(la) = F::fmt_lookahead(&item.la) {
      buf.push_str(", ");
      buf.push_str(&la);
    }
    buf
  }

  /// Renders every state's item set, the shape conflict diagnostics use.
  pub fn dump_states(&self) -> String {
    let mut out = String::new();
    for state in 0..self.items_set.len() {
      out.push_str(&format!("state {}\n", state));
      for line in self.fmt_state(state) {
        out.push_str("  ");
        out.push_str(&line);
        out.push('\n');
      }
    }
    out
  }
}
