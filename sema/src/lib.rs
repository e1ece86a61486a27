//! Attribute-grammar evaluation: productions with interleaved semantic
//! actions, the scoped symbol table, and the tree walk that fires
//! actions with an environment carrying attributes, errors and emitted
//! code.

use grammar::{GrammarConfig, GrammarError, ParseError, Parser};
use lexer::Token;

mod env;
mod production;
mod table;
mod tree;

pub use env::SemaEnv;
pub use production::{Action, RhsValue, SemaProduction, SemaSymbol};
pub use table::{SymbolInfo, SymbolTable};
pub use tree::SemaTree;

/// An attribute grammar bolted onto any of the table-driven parsers.
/// `parse` grows a fresh [`SemaTree`]; evaluating it yields the
/// [`SemaEnv`] with the populated symbol table, error list and emitted
/// lines.
pub struct Sema<P> {
  prods: Vec<SemaProduction>,
  parser: P,
}

impl<P: Parser> Sema<P> {
  pub fn new(cfg: GrammarConfig, prods: Vec<SemaProduction>) -> Result<Sema<P>, GrammarError> {
    let plain = prods.iter().map(|p| p.plain()).collect();
    let parser = P::from_productions(cfg, plain)?;
    Ok(Sema { prods, parser })
  }

  pub fn build(&mut self) -> Result<(), P::BuildError> {
    self.parser.build()
  }

  pub fn parse(&self, input: &[Token]) -> Result<(SemaTree, Vec<String>), ParseError> {
    let mut tree = SemaTree::new(&self.prods);
    let diagnostics = self.parser.parse_into(input, &mut tree)?;
    Ok((tree, diagnostics))
  }

  pub fn parser(&self) -> &P {
    &self.parser
  }

  pub fn parser_mut(&mut self) -> &mut P {
    &mut self.parser
  }
}
