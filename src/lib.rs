//! Facade over the parsing toolkit: grammar model and BNF parsing,
//! regex-driven lexing, LL(1)/SLR/LR(1) table construction and drivers,
//! and attribute-grammar evaluation.
//!
//! A typical client supplies lexer rules and productions with optional
//! actions, feeds a token stream, and reads back the tree, symbol table
//! and error list:
//!
//! ```
//! use parsekit::{GrammarConfig, Ll1, Parser, Tree};
//!
//! let cfg = GrammarConfig::new();
//! let mut parser = Ll1::from_text(cfg, "E -> T E'\nE' -> + T E' | ε\nT -> id").unwrap();
//! parser.build().unwrap();
//!
//! let tokens: Vec<_> = "id + id".split_whitespace().map(parsekit::Token::text).collect();
//! let (tree, diagnostics) = parser.parse(&tokens).unwrap();
//! assert!(diagnostics.is_empty());
//! assert_eq!(tree.preorder_lexvals()[..3], ["E", "T", "id"]);
//! ```

pub use grammar::{
  report_error, Ffn, GrammarConfig, GrammarError, GrammarErrorKind, NodeId, ParseError,
  Parser, Production, Symbol, SymbolKind, SymbolSet, Tree, TreeBuilder, TreeNode,
};
pub use lexer::{LexRule, Lexer, Regex, RegexError, Token, UNKNOWN};
pub use ll::{Ll1, LlError};
pub use lr::{
  Action, ActionTable, ErrorHandler, GotoTable, Lr1, LrError, LrParse, LrParser,
  RightmostSteps, Slr, StackEntry,
};
pub use sema::{
  RhsValue, Sema, SemaEnv, SemaProduction, SemaSymbol, SemaTree, SymbolInfo, SymbolTable,
};
