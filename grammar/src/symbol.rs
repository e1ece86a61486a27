use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolKind {
  Terminal,
  NonTerminal,
  Epsilon,
  EndMark,
}

/// A grammar symbol. Identity (equality, hashing, ordering) is
/// `(kind, name)`; `lexval` and the source position are runtime payload
/// filled in from tokens.
#[derive(Debug, Clone)]
pub struct Symbol {
  pub kind: SymbolKind,
  pub name: String,
  pub lexval: String,
  pub line: usize,
  pub column: usize,
}

impl Symbol {
  pub fn is_terminal(&self) -> bool {
    matches!(self.kind, SymbolKind::Terminal | SymbolKind::Epsilon)
  }

  pub fn is_non_terminal(&self) -> bool {
    self.kind == SymbolKind::NonTerminal
  }

  pub fn is_epsilon(&self) -> bool {
    self.kind == SymbolKind::Epsilon
  }

  pub fn is_end_mark(&self) -> bool {
    self.kind == SymbolKind::EndMark
  }

  pub fn update_from_token(&mut self, token: &Token) {
    self.lexval = token.value.clone();
    self.line = token.line;
    self.column = token.column;
  }

  pub fn update_from(&mut self, other: &Symbol) {
    self.lexval = other.lexval.clone();
    self.line = other.line;
    self.column = other.column;
  }

  pub fn update_pos(&mut self, other: &Symbol) {
    self.line = other.line;
    self.column = other.column;
  }
}

impl PartialEq for Symbol {
  fn eq(&self, other: &Symbol) -> bool {
    self.kind == other.kind && self.name == other.name
  }
}

impl Eq for Symbol {}

impl Hash for Symbol {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.kind.hash(state);
    self.name.hash(state);
  }
}

impl PartialOrd for Symbol {
  fn partial_cmp(&self, other: &Symbol) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Symbol {
  fn cmp(&self, other: &Symbol) -> Ordering {
    self.kind.cmp(&other.kind).then_with(|| self.name.cmp(&other.name))
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// Symbol-classification policy threaded through everything that turns
/// text into symbols: the epsilon and end-marker spellings plus the
/// terminal rule deciding terminal vs non-terminal for all other names.
#[derive(Clone)]
pub struct GrammarConfig {
  epsilon: String,
  end_mark: String,
  terminal_rule: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl Default for GrammarConfig {
  fn default() -> Self {
    GrammarConfig {
      epsilon: "ε".into(),
      end_mark: "$".into(),
      // a name is a non-terminal iff it starts uppercase
      terminal_rule: Arc::new(|name: &str| {
        !name.chars().next().map_or(false, |c| c.is_uppercase())
      }),
    }
  }
}

impl fmt::Debug for GrammarConfig {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("GrammarConfig")
      .field("epsilon", &self.epsilon)
      .field("end_mark", &self.end_mark)
      .finish()
  }
}

impl GrammarConfig {
  pub fn new() -> GrammarConfig {
    GrammarConfig::default()
  }

  pub fn with_epsilon(mut self, epsilon: impl Into<String>) -> Self {
    self.epsilon = epsilon.into();
    self
  }

  pub fn with_end_mark(mut self, end_mark: impl Into<String>) -> Self {
    self.end_mark = end_mark.into();
    self
  }

  pub fn with_terminal_rule(
    mut self,
    rule: impl Fn(&str) -> bool + Send + Sync + 'static,
  ) -> Self {
    self.terminal_rule = Arc::new(rule);
    self
  }

  /// Terminal rule from a fixed set of terminal names, the shape every
  /// real client uses.
  pub fn with_terminals<I, S>(self, terminals: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let set: std::collections::HashSet<String> =
      terminals.into_iter().map(Into::into).collect();
    self.with_terminal_rule(move |name| set.contains(name))
  }

  pub fn epsilon_str(&self) -> &str {
    &self.epsilon
  }

  pub fn end_mark_str(&self) -> &str {
    &self.end_mark
  }

  pub fn epsilon(&self) -> Symbol {
    Symbol {
      kind: SymbolKind::Epsilon,
      name: self.epsilon.clone(),
      lexval: self.epsilon.clone(),
      line: 0,
      column: 0,
    }
  }

  pub fn end_mark(&self) -> Symbol {
    Symbol {
      kind: SymbolKind::EndMark,
      name: self.end_mark.clone(),
      lexval: self.end_mark.clone(),
      line: 0,
      column: 0,
    }
  }

  /// Classifies a (trimmed) name into a symbol.
  pub fn symbol(&self, text: &str) -> Symbol {
    let name = text.trim();
    let kind = if name == self.epsilon {
      SymbolKind::Epsilon
    } else if name == self.end_mark {
      SymbolKind::EndMark
    } else if (self.terminal_rule)(name) {
      SymbolKind::Terminal
    } else {
      SymbolKind::NonTerminal
    };
    Symbol {
      kind,
      name: name.into(),
      lexval: name.into(),
      line: 0,
      column: 0,
    }
  }

  /// A symbol classified by the token's display name and carrying its
  /// lexeme and position.
  pub fn symbol_from_token(&self, token: &Token) -> Symbol {
    let mut sym = self.symbol(&token.name);
    sym.update_from_token(token);
    sym
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_rule_classifies_by_case() {
    let cfg = GrammarConfig::new();
    assert_eq!(cfg.symbol("E").kind, SymbolKind::NonTerminal);
    assert_eq!(cfg.symbol("id").kind, SymbolKind::Terminal);
    assert_eq!(cfg.symbol("+").kind, SymbolKind::Terminal);
    assert_eq!(cfg.symbol("ε").kind, SymbolKind::Epsilon);
    assert_eq!(cfg.symbol("$").kind, SymbolKind::EndMark);
  }

  #[test]
  fn custom_epsilon_and_terminals() {
    let cfg = GrammarConfig::new()
      .with_epsilon("E")
      .with_terminals(["ID", "NUM", ";"]);
    assert_eq!(cfg.symbol("E").kind, SymbolKind::Epsilon);
    assert_eq!(cfg.symbol("ID").kind, SymbolKind::Terminal);
    assert_eq!(cfg.symbol("stmt").kind, SymbolKind::NonTerminal);
  }

  #[test]
  fn identity_ignores_lexval() {
    let cfg = GrammarConfig::new();
    let mut a = cfg.symbol("id");
    let b = cfg.symbol("id");
    a.lexval = "x".into();
    a.line = 3;
    assert_eq!(a, b);
  }

  #[test]
  fn names_are_trimmed() {
    let cfg = GrammarConfig::new();
    assert_eq!(cfg.symbol("  T'  ").name, "T'");
  }

  #[test]
  fn symbol_from_token_carries_lexeme_and_position() {
    let cfg = GrammarConfig::new().with_terminals(["ID"]);
    let token = lexer::Token::new(3, "total", "ID", 2, 7);
    let sym = cfg.symbol_from_token(&token);
    assert_eq!(sym.kind, SymbolKind::Terminal);
    assert_eq!(sym.name, "ID");
    assert_eq!(sym.lexval, "total");
    assert_eq!((sym.line, sym.column), (2, 7));
  }
}
