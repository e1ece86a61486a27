use std::fmt;
use crate::{Production, Symbol};

pub type NodeId = usize;

#[derive(Debug)]
pub struct TreeNode {
  pub symbol: Symbol,
  pub parent: Option<NodeId>,
  pub children: Vec<NodeId>,
}

/// The seam between the parse drivers and whatever tree they grow: the
/// plain [`Tree`] here, or the attribute tree of the sema layer.
pub trait TreeBuilder {
  /// Top-down expansion of the leftmost unexpanded non-terminal (LL).
  fn add(&mut self, prod: &Production);
  /// Bottom-up expansion of the rightmost unexpanded non-terminal, fed
  /// with the reversed reduction log (LR accept path).
  fn add_r(&mut self, prod: &Production);
  /// Backfills the next pending terminal (LL, called per shift).
  fn update(&mut self, sym: &Symbol);
  /// Backfills the terminal frontier left to right (LR, called per token
  /// after the full `add_r` replay).
  fn update_r(&mut self, sym: &Symbol);
}

/// Concrete parse tree. Nodes live in an arena indexed by [`NodeId`];
/// parents are back references, children are ordered. An expanded
/// internal node has exactly `|rhs|` children, an unexpanded one none.
#[derive(Debug, Default)]
pub struct Tree {
  nodes: Vec<TreeNode>,
  root: Option<NodeId>,
  /// Leftmost unexpanded non-terminal.
  next: Option<NodeId>,
  /// Rightmost unexpanded non-terminal.
  next_r: Option<NodeId>,
  /// Pending terminal leaves for `update`, innermost last.
  to_replace: Vec<NodeId>,
  /// Terminal frontier for `update_r`, computed lazily on first call.
  replace_r: Option<Vec<NodeId>>,
  replace_r_idx: usize,
}

impl Tree {
  pub fn new() -> Tree {
    Tree::default()
  }

  pub fn root(&self) -> Option<NodeId> {
    self.root
  }

  pub fn node(&self, id: NodeId) -> &TreeNode {
    &self.nodes[id]
  }

  pub fn is_empty(&self) -> bool {
    self.root.is_none()
  }

  /// Pre-order visit.
  pub fn visit(&self, mut f: impl FnMut(&TreeNode)) {
    for id in self.preorder_ids() {
      f(&self.nodes[id]);
    }
  }

  /// Pre-order lexemes, the shape most tests compare against.
  pub fn preorder_lexvals(&self) -> Vec<String> {
    let mut out = vec![];
    self.visit(|node| out.push(node.symbol.lexval.clone()));
    out
  }

  fn preorder_ids(&self) -> Vec<NodeId> {
    let mut out = vec![];
    let mut stack = vec![];
    if let Some(root) = self.root {
      stack.push(root);
    }
    while let Some(id) = stack.pop() {
      out.push(id);
      for &child in self.nodes[id].children.iter().rev() {
        stack.push(child);
      }
    }
    out
  }

  fn spawn(&mut self, parent: Option<NodeId>, symbol: &Symbol) -> NodeId {
    let id = self.nodes.len();
    self.nodes.push(TreeNode {
      symbol: symbol.clone(),
      parent,
      children: vec![],
    });
    if let Some(parent) = parent {
      self.nodes[parent].children.push(id);
    }
    id
  }

  /// Expands the frontier non-terminal in the given direction; `leftmost`
  /// selects which of the two cursors advances.
  fn expand(&mut self, prod: &Production, leftmost: bool) {
    let target = match self.root {
      None => {
        let id = self.spawn(None, &prod.lhs);
        self.root = Some(id);
        id
      }
      Some(_) => {
        let cursor = if leftmost { self.next } else { self.next_r };
        let id = cursor.expect("no unexpanded non-terminal at the frontier");
        debug_assert!(self.nodes[id].children.is_empty());
        debug_assert!(self.nodes[id].symbol == prod.lhs);
        id
      }
    };

    let mut terminals = vec![];
    for sym in &prod.rhs {
      let child = self.spawn(Some(target), sym);
      if sym.is_terminal() && !sym.is_epsilon() {
        terminals.push(child);
      }
    }

    if leftmost {
      // innermost (leftmost) pending terminal ends up on top
      for id in terminals.into_iter().rev() {
        self.to_replace.push(id);
      }
      self.next = self.find_unexpanded(target, true);
    } else {
      self.next_r = self.find_unexpanded(target, false);
    }
  }

  fn find_unexpanded(&self, from: NodeId, leftmost: bool) -> Option<NodeId> {
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

  fn scan_children(&self, parent: NodeId, leftmost: bool) -> Option<NodeId> {
    let unexpanded = |id: &&NodeId| {
      let node = &self.nodes[**id];
      node.symbol.is_non_terminal() && node.children.is_empty()
    };
    let children = &self.nodes[parent].children;
    if leftmost {
      children.iter().find(unexpanded).copied()
    } else {
      children.iter().rev().find(unexpanded).copied()
    }
  }

  fn backfill(&mut self, id: NodeId, sym: &Symbol) {
    self.nodes[id].symbol.update_from(sym);
  }

  fn fmt_node(&self, f: &mut fmt::Formatter, id: NodeId, depth: usize) -> fmt::Result {
    let node = &self.nodes[id];
    writeln!(f, "{}{}", "  ".repeat(depth), node.symbol)?;
    for &child in &node.children {
      self.fmt_node(f, child, depth + 1)?;
    }
    Ok(())
  }
}

impl TreeBuilder for Tree {
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
    if self.nodes[last].symbol == *sym {
      self.backfill(last, sym);
      self.to_replace.pop();
    }
  }

  fn update_r(&mut self, sym: &Symbol) {
    if self.replace_r.is_none() {
      let frontier = self
        .preorder_ids()
        .into_iter()
        .filter(|&id| {
          let s = &self.nodes[id].symbol;
          s.is_terminal() && !s.is_epsilon()
        })
        .collect();
      self.replace_r = Some(frontier);
    }
    let frontier = self.replace_r.as_ref().unwrap();
    if self.replace_r_idx >= frontier.len() {
      return;
    }
    let id = frontier[self.replace_r_idx];
    if self.nodes[id].symbol == *sym {
      self.backfill(id, sym);
      self.replace_r_idx += 1;
    }
  }
}

impl fmt::Display for Tree {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    if let Some(root) = self.root {
      self.fmt_node(f, root, 0)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::GrammarConfig;
  use pretty_assertions::assert_eq;

  fn prods(text: &str) -> (GrammarConfig, Vec<Production>) {
    let cfg = GrammarConfig::new();
    let prods = Production::parse_all(text, &cfg).unwrap();
    (cfg, prods)
  }

  // E -> T E' ; E' -> + T E' | ε ; T -> id
  fn add_grammar() -> (GrammarConfig, Vec<Production>) {
    prods("E -> T E'\nE' -> + T E' | ε\nT -> id")
  }

  #[test]
  fn top_down_preorder() {
    let (_, prods) = add_grammar();
    let mut tree = Tree::new();
    // derivation of "id + id"
    tree.add(&prods[0]); // E -> T E'
    tree.add(&prods[3]); // T -> id
    tree.add(&prods[1]); // E' -> + T E'
    tree.add(&prods[3]); // T -> id
    tree.add(&prods[2]); // E' -> ε
    assert_eq!(
      tree.preorder_lexvals(),
      vec!["E", "T", "id", "E'", "+", "T", "id", "E'", "ε"]
    );
  }

  #[test]
  fn bottom_up_matches_top_down() {
    let (_, prods) = add_grammar();
    // reductions for "id + id", reversed (rightmost derivation order)
    let mut tree = Tree::new();
    for prod in [&prods[0], &prods[1], &prods[2], &prods[3], &prods[3]] {
      tree.add_r(prod);
    }
    assert_eq!(
      tree.preorder_lexvals(),
      vec!["E", "T", "id", "E'", "+", "T", "id", "E'", "ε"]
    );
  }

  #[test]
  fn update_backfills_lexemes_in_shift_order() {
    let (cfg, prods) = add_grammar();
    let mut tree = Tree::new();
    tree.add(&prods[0]);
    tree.add(&prods[3]);
    let mut id = cfg.symbol("id");
    id.lexval = "x".into();
    id.line = 1;
    id.column = 1;
    tree.update(&id);
    tree.add(&prods[1]);
    let mut plus = cfg.symbol("+");
    plus.lexval = "+".into();
    tree.update(&plus);
    tree.add(&prods[3]);
    let mut id2 = cfg.symbol("id");
    id2.lexval = "y".into();
    tree.update(&id2);
    tree.add(&prods[2]);
    assert_eq!(
      tree.preorder_lexvals(),
      vec!["E", "T", "x", "E'", "+", "T", "y", "E'", "ε"]
    );
  }

  #[test]
  fn update_r_backfills_the_terminal_frontier() {
    let (cfg, prods) = add_grammar();
    let mut tree = Tree::new();
    for prod in [&prods[0], &prods[1], &prods[2], &prods[3], &prods[3]] {
      tree.add_r(prod);
    }
    for (name, lexval) in [("id", "x"), ("+", "+"), ("id", "y")] {
      let mut sym = cfg.symbol(name);
      sym.lexval = lexval.into();
      tree.update_r(&sym);
    }
    // trailing end marker must be ignored
    tree.update_r(&cfg.end_mark());
    assert_eq!(
      tree.preorder_lexvals(),
      vec!["E", "T", "x", "E'", "+", "T", "y", "E'", "ε"]
    );
  }

  #[test]
  fn epsilon_leaves_do_not_block_backfill() {
    // S -> A b ; A -> ε : the ε leaf sits left of b in the frontier and
    // must not stall the pending-terminal stack.
    let (cfg, prods) = prods("S -> A b\nA -> ε");
    let mut tree = Tree::new();
    tree.add(&prods[0]);
    tree.add(&prods[1]);
    let mut b = cfg.symbol("b");
    b.lexval = "B".into();
    tree.update(&b);
    assert_eq!(tree.preorder_lexvals(), vec!["S", "A", "ε", "B"]);
  }

  #[test]
  fn expanded_nodes_have_rhs_many_children() {
    let (_, prods) = add_grammar();
    let mut tree = Tree::new();
    tree.add(&prods[0]);
    let root = tree.node(tree.root().unwrap());
    assert_eq!(root.children.len(), 2);
    for &child in &root.children {
      assert!(tree.node(child).children.is_empty());
    }
  }

  #[test]
  fn display_indents_by_depth() {
    let (_, prods) = add_grammar();
    let mut tree = Tree::new();
    tree.add(&prods[0]);
    tree.add(&prods[3]);
    tree.add(&prods[2]);
    assert_eq!(tree.to_string(), "E\n  T\n    id\n  E'\n    ε\n");
  }
}
