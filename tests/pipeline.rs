//! Lexer-to-parser integration: real tokens flowing into the drivers,
//! positions surfacing in diagnostics, and table post-processing through
//! error-handler hooks.

use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use parsekit::{
  Action, GrammarConfig, LexRule, Lexer, Ll1, Production, Slr, SymbolKind, Token,
};

const ID: i32 = 1;
const INTNUM: i32 = 2;
const REALNUM: i32 = 3;
const ASSIGN: i32 = 4;
const SEMI: i32 = 5;
const WS: i32 = 6;

fn lexer() -> Lexer {
  let rules = vec![
    LexRule::new("[a-zA-Z_][a-zA-Z0-9_]*", ID, "ID"),
    LexRule::new(r"[0-9]+\.[0-9]*", REALNUM, "REALNUM"),
    LexRule::new("[0-9]+", INTNUM, "INTNUM"),
    LexRule::new("=", ASSIGN, "="),
    LexRule::new(";", SEMI, ";"),
    LexRule::new("[ \t\n]+", WS, "WHITESPACE"),
  ];
  Lexer::new(&rules, WS).unwrap()
}

fn cfg() -> GrammarConfig {
  GrammarConfig::new().with_terminals(["ID", "INTNUM", "REALNUM", "=", ";"])
}

#[test]
fn lexed_tokens_carry_lexemes_into_the_tree() {
  let cfg = cfg();
  let mut parser = Ll1::from_text(cfg, "S -> ID = INTNUM ;").unwrap();
  parser.build().unwrap();

  let tokens = lexer().parse("x = 42 ;", true);
  let (tree, diagnostics) = parser.parse(&tokens).unwrap();
  assert_eq!(diagnostics, Vec::<String>::new());
  assert_eq!(tree.preorder_lexvals(), vec!["S", "x", "=", "42", ";"]);

  let mut positions = vec![];
  tree.visit(|node| {
    if node.symbol.kind == SymbolKind::Terminal {
      positions.push((node.symbol.lexval.clone(), node.symbol.line, node.symbol.column));
    }
  });
  assert_eq!(
    positions,
    vec![
      ("x".to_string(), 1, 1),
      ("=".to_string(), 1, 3),
      ("42".to_string(), 1, 5),
      (";".to_string(), 1, 8),
    ]
  );
}

#[test]
fn parse_errors_carry_line_and_column() {
  let cfg = cfg();
  let mut parser = Slr::from_text(cfg, "S -> ID = INTNUM ;").unwrap();
  parser.build().unwrap();

  let tokens = lexer().parse("x = ;", true);
  let err = parser.parse(&tokens).unwrap_err();
  assert_eq!(err.to_string(), "unexpected token ; at line 1, column 5");
}

#[test]
fn error_handler_retypes_a_mismatched_token() {
  // every state that has no entry for REALNUM routes it to a handler
  // that re-types the token as INTNUM, keeping its lexeme
  let cfg = cfg();
  let mut parser = Slr::from_text(cfg.clone(), "S -> ID = INTNUM ;").unwrap();

  let realnum = cfg.symbol("REALNUM");
  parser.install_error_hook(move |action, _goto, handlers| {
    for row in action.values_mut() {
      if !row.contains_key(&realnum) {
        row.insert(realnum.clone(), Action::Error(0));
      }
    }
    handlers.push(Box::new(|_stack, tokens, pos| {
      tokens[*pos].kind = INTNUM;
      tokens[*pos].name = "INTNUM".into();
    }));
  });
  parser.build().unwrap();

  let tokens = lexer().parse("x = 2.5 ;", true);
  let parse = parser.parse(&tokens).unwrap();
  assert_eq!(parse.tree.preorder_lexvals(), vec!["S", "x", "=", "2.5", ";"]);
}

#[test]
fn unknown_tokens_surface_as_parse_errors() {
  let cfg = cfg();
  let mut parser = Slr::from_text(cfg, "S -> ID = INTNUM ;").unwrap();
  parser.build().unwrap();

  let tokens = lexer().parse("x = @ ;", true);
  assert_eq!(tokens[2].kind, parsekit::UNKNOWN);
  assert!(parser.parse(&tokens).is_err());
}

#[test]
fn rightmost_derivation_reads_bottom_up() {
  let cfg = GrammarConfig::new();
  let mut parser = Slr::from_text(cfg, "S -> C C\nC -> c C | d").unwrap();
  parser.build().unwrap();

  let tokens: Vec<Token> = "c d d".split_whitespace().map(Token::text).collect();
  let parse = parser.parse(&tokens).unwrap();
  assert_snapshot!(parse.steps.to_string(), @r###"
  S =>
  C C =>
  C d =>
  c C d =>
  c d d
  "###);
}

#[test]
fn productions_render_in_bnf_shape() {
  let cfg = GrammarConfig::new();
  let prods = Production::parse_all("E -> T E'\nE' -> + T E' | ε", &cfg).unwrap();
  assert_snapshot!(prods[1].to_string(), @"E' -> + T E'");
  assert_snapshot!(prods[2].to_string(), @"E' -> ε");
}
