use grammar::Map;

/// Free-form attributes of one table entry (`type`, `value`, …). The
/// entry's own name is stamped under the `name` key on insert.
pub type SymbolInfo = Map<String, String>;

/// A stack of scopes, innermost last.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
  scopes: Vec<Map<String, SymbolInfo>>,
}

impl SymbolTable {
  pub fn new() -> SymbolTable {
    SymbolTable::default()
  }

  pub fn enter_scope(&mut self) {
    self.scopes.push(Map::new());
  }

  /// Enters a scope pre-populated with every binding visible from the
  /// current one (innermost definition wins). Used for branch-local
  /// analysis where both arms start from the same bindings.
  pub fn enter_scope_copy(&mut self) {
    let mut merged = Map::new();
    for scope in &self.scopes {
      for (name, info) in scope {
        merged.insert(name.clone(), info.clone());
      }
    }
    self.scopes.push(merged);
  }

  pub fn exit_scope(&mut self) {
    assert!(!self.scopes.is_empty(), "no scope to exit");
    self.scopes.pop();
  }

  /// Inserts into the current scope; fails when the name already exists
  /// there.
  pub fn insert(&mut self, name: impl Into<String>, mut info: SymbolInfo) -> bool {
    if self.scopes.is_empty() {
      self.enter_scope();
    }
    let name = name.into();
    let scope = self.scopes.last_mut().unwrap();
    if scope.contains_key(&name) {
      return false;
    }
    info.insert("name".into(), name.clone());
    scope.insert(name, info);
    true
  }

  /// Innermost-first lookup.
  pub fn lookup(&self, name: &str) -> Option<&SymbolInfo> {
    self.scopes.iter().rev().find_map(|scope| scope.get(name))
  }

  pub fn lookup_mut(&mut self, name: &str) -> Option<&mut SymbolInfo> {
    self
      .scopes
      .iter_mut()
      .rev()
      .find_map(|scope| scope.get_mut(name))
  }

  pub fn for_each_current(&self, mut f: impl FnMut(&str, &SymbolInfo)) {
    if let Some(scope) = self.scopes.last() {
      for (name, info) in scope {
        f(name, info);
      }
    }
  }
}
