use grammar::{Map, Production, Symbol, TreeBuilder};
use crate::env::SemaEnv;
use crate::production::{Action, RhsValue, SemaProduction, SemaSymbol};

enum SemaValue {
  /// Index into the symbol-slot slab.
  Symbol(usize),
  Action(Action),
}

struct SemaNode {
  value: SemaValue,
  parent: Option<usize>,
  children: Vec<usize>,
}

/// Parse tree whose nodes carry either a symbol slot or a deferred
/// action. Grown through [`TreeBuilder`] by the same drivers as the
/// plain tree: each fired plain production is looked up in the attribute
/// grammar so action nodes land between their sibling symbols.
pub struct SemaTree {
  prods: Vec<SemaProduction>,
  prod_map: Map<Production, usize>,
  nodes: Vec<SemaNode>,
  symbols: Vec<SemaSymbol>,
  root: Option<usize>,
  next: Option<usize>,
  next_r: Option<usize>,
  to_replace: Vec<usize>,
  replace_r: Option<Vec<usize>>,
  replace_r_idx: usize,
}

impl SemaTree {
  pub fn new(prods: &[SemaProduction]) -> SemaTree {
    let mut prod_map = Map::new();
    for (i, prod) in prods.iter().enumerate() {
      prod_map.entry(prod.plain()).or_insert(i);
    }
    SemaTree {
      prods: prods.to_vec(),
      prod_map,
      nodes: vec![],
      symbols: vec![],
      root: None,
      next: None,
      next_r: None,
      to_replace: vec![],
      replace_r: None,
      replace_r_idx: 0,
    }
  }

  /// Walks the tree depth-first left-to-right firing actions, and hands
  /// back the environment for inspection. Each non-leaf symbol node
  /// pushes a scope binding the production's symbols by name.
  pub fn calc(&mut self) -> SemaEnv {
    log::debug!("sema: evaluating {} nodes", self.nodes.len());
    let mut env = SemaEnv::new(std::mem::take(&mut self.symbols));
    if let Some(root) = self.root {
      self.calc_node(root, &mut env);
    }
    self.symbols = env.take_symbols();
    env
  }

  /// Pre-order visit over symbol nodes; action nodes are skipped.
  pub fn visit(&self, mut f: impl FnMut(&SemaSymbol)) {
    let mut stack = vec![];
    if let Some(root) = self.root {
      stack.push(root);
    }
    while let Some(id) = stack.pop() {
      if let SemaValue::Symbol(slot) = self.nodes[id].value {
        f(&self.symbols[slot]);
      }
      for &child in self.nodes[id].children.iter().rev() {
        stack.push(child);
      }
    }
  }

  pub fn preorder_lexvals(&self) -> Vec<String> {
    let mut out = vec![];
    self.visit(|sym| out.push(sym.sym.lexval.clone()));
    out
  }

  fn calc_node(&self, id: usize, env: &mut SemaEnv) {
    match &self.nodes[id].value {
      SemaValue::Action(action) => {
        let action = action.clone();
        action(env);
      }
      SemaValue::Symbol(slot) => {
        if self.nodes[id].children.is_empty() {
          return;
        }
        env.enter_symbol_scope();
        env.bind(*slot);
        for &child in &self.nodes[id].children {
          if let SemaValue::Symbol(slot) = self.nodes[child].value {
            env.bind(slot);
          }
        }
        for &child in &self.nodes[id].children {
          self.calc_node(child, env);
        }
        env.exit_symbol_scope();
      }
    }
  }

  fn spawn_symbol(&mut self, parent: Option<usize>, sym: &Symbol) -> usize {
    let slot = self.symbols.len();
    self.symbols.push(SemaSymbol::new(sym.clone()));
    self.spawn(parent, SemaValue::Symbol(slot))
  }

  fn spawn(&mut self, parent: Option<usize>, value: SemaValue) -> usize {
    let id = self.nodes.len();
    self.nodes.push(SemaNode {
      value,
      parent,
      children: vec![],
    });
    if let Some(parent) = parent {
      self.nodes[parent].children.push(id);
    }
    id
  }

  fn node_symbol(&self, id: usize) -> Option<&Symbol> {
    match self.nodes[id].value {
      SemaValue::Symbol(slot) => Some(&self.symbols[slot].sym),
      SemaValue::Action(_) => None,
    }
  }

  fn expand(&mut self, prod: &Production, leftmost: bool) {
    let target = match self.root {
      None => {
        let id = self.spawn_symbol(None, &prod.lhs);
        self.root = Some(id);
        id
      }
      Some(_) => {
        let cursor = if leftmost { self.next } else { self.next_r };
        cursor.expect("no unexpanded non-terminal at the frontier")
      }
    };

    let mut terminals = vec![];
    match self.prod_map.get(prod).copied() {
      Some(ix) => {
        let rhs = self.prods[ix].rhs.clone();
        for value in &rhs {
          match value {
            RhsValue::Sym(sym) => {
              let child = self.spawn_symbol(Some(target), sym);
              if sym.is_terminal() && !sym.is_epsilon() {
                terminals.push(child);
              }
            }
            RhsValue::Act(action) => {
              self.spawn(Some(target), SemaValue::Action(action.clone()));
            }
          }
        }
      }
      // not in the attribute grammar (e.g. a recovery-synthesized ε
      // production): bare symbol children
      None => {
        for sym in &prod.rhs {
          let child = self.spawn_symbol(Some(target), sym);
          if sym.is_terminal() && !sym.is_epsilon() {
            terminals.push(child);
          }
        }
      }
    }

    if leftmost {
      for id in terminals.into_iter().rev() {
        self.to_replace.push(id);
      }
      self.next = self.find_unexpanded(target, true);
    } else {
      self.next_r = self.find_unexpanded(target, false);
    }
  }

  fn find_unexpanded(&self, from: usize, leftmost: bool) -> Option<usize> {
    if let Some(id) = self.scan_children(from, leftmost) {
      return Some(id);
    }
    let mut cur = self.nodes[from].parent;
    while let Some(parent) = cur {
      if let Some(id) = self.scan_children(parent, leftmost) {
        return Some(id);
      }
      cur = self.nodes[parent].parent;
    }
    None
  }

  fn scan_children(&self, parent: usize, leftmost: bool) -> Option<usize> {
    let unexpanded = |id: &&usize| {
      let node = &self.nodes[**id];
      match self.node_symbol(**id) {
        Some(sym) => sym.is_non_terminal() && node.children.is_empty(),
        None => false,
      }
    };
    let children = &self.nodes[parent].children;
    if leftmost {
      children.iter().find(unexpanded).copied()
    } else {
      children.iter().rev().find(unexpanded).copied()
    }
  }

  fn backfill(&mut self, id: usize, sym: &Symbol) {
    if let SemaValue::Symbol(slot) = self.nodes[id].value {
      self.symbols[slot].sym.update_from(sym);
    }
  }
}

impl TreeBuilder for SemaTree {
  fn add(&mut self, prod: &Production) {
    self.expand(prod, true);
  }

  fn add_r(&mut self, prod: &Production) {
    self.expand(prod, false);
  }

  fn update(&mut self, sym: &Symbol) {
    let Some(&last) = self.to_replace.last() else {
      return;
    };
    if self.node_symbol(last) == Some(sym) {
      self.backfill(last, sym);
      self.to_replace.pop();
    }
  }

  fn update_r(&mut self, sym: &Symbol) {
    if self.replace_r.is_none() {
      let mut frontier = vec![];
      let mut stack = vec![];
      if let Some(root) = self.root {
        stack.push(root);
      }
      while let Some(id) = stack.pop() {
        if let Some(s) = self.node_symbol(id) {
          if s.is_terminal() && !s.is_epsilon() {
            frontier.push(id);
          }
        }
        for &child in self.nodes[id].children.iter().rev() {
          stack.push(child);
        }
      }
      self.replace_r = Some(frontier);
    }

    let frontier = self.replace_r.as_ref().unwrap();
    if self.replace_r_idx >= frontier.len() {
      return;
    }
    let id = frontier[self.replace_r_idx];
    if self.node_symbol(id) == Some(sym) {
      self.backfill(id, sym);
      self.replace_r_idx += 1;
    }
  }
}
