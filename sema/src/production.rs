use std::fmt;
use std::rc::Rc;
use grammar::{GrammarConfig, Map, Production, Symbol};
use crate::SemaEnv;

/// A grammar symbol carrying inherited and synthesized attribute maps.
#[derive(Debug, Clone)]
pub struct SemaSymbol {
  pub sym: Symbol,
  pub inh: Map<String, String>,
  pub syn: Map<String, String>,
}

impl SemaSymbol {
  pub fn new(sym: Symbol) -> SemaSymbol {
    SemaSymbol {
      sym,
      inh: Map::new(),
      syn: Map::new(),
    }
  }
}

/// Semantic actions are opaque callables over the environment. They run
/// once per parse in production order and must not capture per-parse
/// mutable state; all of that lives in the `SemaEnv` they receive.
pub type Action = Rc<dyn Fn(&mut SemaEnv)>;

/// One right-hand-side slot: a symbol or an action interleaved between
/// symbols.
#[derive(Clone)]
pub enum RhsValue {
  Sym(Symbol),
  Act(Action),
}

impl fmt::Debug for RhsValue {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      RhsValue::Sym(sym) => write!(f, "Sym({})", sym.name),
      RhsValue::Act(_) => write!(f, "Act(..)"),
    }
  }
}

/// A production whose right-hand side interleaves symbols with semantic
/// actions. Built fluently:
///
/// ```
/// # use grammar::GrammarConfig;
/// # use sema::SemaProduction;
/// let cfg = GrammarConfig::new().with_terminals(["id"]);
/// let prod = SemaProduction::new(&cfg, "Decl")
///   .sym("id")
///   .act(|env| env.emit("seen a declaration"));
/// ```
#[derive(Debug, Clone)]
pub struct SemaProduction {
  pub lhs: Symbol,
  pub rhs: Vec<RhsValue>,
  cfg: GrammarConfig,
}

impl SemaProduction {
  pub fn new(cfg: &GrammarConfig, lhs: &str) -> SemaProduction {
    SemaProduction {
      lhs: cfg.symbol(lhs),
      rhs: vec![],
      cfg: cfg.clone(),
    }
  }

  pub fn sym(mut self, name: &str) -> Self {
    self.rhs.push(RhsValue::Sym(self.cfg.symbol(name)));
    self
  }

  pub fn syms<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
    for name in names {
      self = self.sym(name);
    }
    self
  }

  pub fn act(mut self, action: impl Fn(&mut SemaEnv) + 'static) -> Self {
    self.rhs.push(RhsValue::Act(Rc::new(action)));
    self
  }

  /// The symbols-only production the parser tables are built from.
  pub fn plain(&self) -> Production {
    let rhs = self
      .rhs
      .iter()
      .filter_map(|value| match value {
        RhsValue::Sym(sym) => Some(sym.clone()),
        RhsValue::Act(_) => None,
      })
      .collect();
    Production::new(self.lhs.clone(), rhs)
  }
}
