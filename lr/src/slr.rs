use grammar::{Ffn, GrammarConfig, Symbol};
use crate::item::LrFlavor;

/// LR(0) items; reduces are driven by FOLLOW sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlrFlavor {}

impl LrFlavor for SlrFlavor {
  type Lookahead = ();

  fn start_lookahead(_cfg: &GrammarConfig) {}

  fn closure_lookaheads(
    _ffn: &Ffn,
    _beta: &[Symbol],
    _parent: &(),
    _cfg: &GrammarConfig,
  ) -> Vec<()> {
    vec![()]
  }

  fn reduce_terminals(ffn: &Ffn, lhs: &Symbol, _la: &()) -> Vec<Symbol> {
    ffn.follow_of(lhs).into_iter().collect()
  }

  fn fmt_lookahead(_la: &()) -> Option<String> {
    None
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use grammar::GrammarConfig;
  use lexer::Token;
  use crate::{Action, LrError, Slr};

  fn tokens(input: &str) -> Vec<Token> {
    input.split_whitespace().map(Token::text).collect()
  }

  fn built(cfg: GrammarConfig, text: &str) -> Slr {
    let mut parser = Slr::from_text(cfg, text).unwrap();
    parser.build().unwrap();
    parser
  }

  fn expect_parse(parser: &Slr, input: &str, expected: &[&str]) {
    let parse = parser.parse(&tokens(input)).unwrap();
    assert_eq!(parse.tree.preorder_lexvals(), expected);
  }

  #[test]
  fn lr0_automaton_of_the_cc_grammar_has_seven_states() {
    let parser = built(GrammarConfig::new(), "S -> C C\nC -> c C | d");
    assert_eq!(parser.state_count(), 7, "{}", parser.dump_states());
  }

  #[test]
  fn parses_the_cc_grammar() {
    let parser = built(GrammarConfig::new(), "S -> C C\nC -> c C | d");
    expect_parse(&parser, "c d d", &["S", "C", "c", "C", "d", "C", "d"]);
    expect_parse(&parser, "d d", &["S", "C", "d", "C", "d"]);
  }

  #[test]
  fn records_the_rightmost_derivation() {
    let parser = built(GrammarConfig::new(), "S -> C C\nC -> c C | d");
    let parse = parser.parse(&tokens("c d d")).unwrap();
    let forms: Vec<String> = parse
      .steps
      .steps()
      .iter()
      .map(|step| {
        step
          .iter()
          .map(|s| s.name.as_str())
          .collect::<Vec<_>>()
          .join(" ")
      })
      .collect();
    assert_eq!(forms, vec!["c d d", "c C d", "C d", "C C", "S"]);
  }

  #[test]
  fn parses_epsilon_grammar_on_empty_input() {
    let parser = built(GrammarConfig::new(), "S -> a S | ε");
    let parse = parser.parse(&[]).unwrap();
    assert_eq!(parse.tree.preorder_lexvals(), vec!["S", "ε"]);
  }

  #[test]
  fn parses_the_addition_grammar() {
    let parser = built(GrammarConfig::new(), "E -> T E'\nE' -> + T E' | ε\nT -> id");
    expect_parse(&parser, "id", &["E", "T", "id", "E'", "ε"]);
    expect_parse(
      &parser,
      "id + id",
      &["E", "T", "id", "E'", "+", "T", "id", "E'", "ε"],
    );
  }

  #[test]
  fn parses_the_expression_grammar() {
    let parser = built(
      GrammarConfig::new(),
      "E  -> T E'\n\
       E' -> + T E' | - T E' | ε\n\
       T  -> F T'\n\
       T' -> * F T' | / F T' | ε\n\
       F  -> ( E ) | id\n",
    );
    expect_parse(
      &parser,
      "( id + id ) * id",
      &[
        "E", "T", "F", "(", "E", "T", "F", "id", "T'", "ε", "E'", "+", "T", "F", "id",
        "T'", "ε", "E'", "ε", ")", "T'", "*", "F", "id", "T'", "ε", "E'", "ε",
      ],
    );
  }

  #[test]
  fn rejects_unparseable_input() {
    let parser = built(GrammarConfig::new(), "E -> T E'\nE' -> + T E' | ε\nT -> id");
    assert!(parser.parse(&tokens("id +")).is_err());
    assert!(parser.parse(&tokens("id * id")).is_err());
    assert!(parser.parse(&[]).is_err());
  }

  #[test]
  fn ambiguous_expression_grammar_has_shift_reduce_conflict() {
    let mut parser = Slr::from_text(GrammarConfig::new(), "E -> E + E | id").unwrap();
    match parser.build() {
      Err(LrError::ShiftReduceConflict { shift, reduce, .. }) => {
        assert_eq!(shift, "+");
        assert_eq!(reduce, "E -> E + E");
      }
      other => panic!("expected shift-reduce conflict, got {:?}", other.err()),
    }
  }

  #[test]
  fn identical_alternatives_have_reduce_reduce_conflict() {
    let mut parser =
      Slr::from_text(GrammarConfig::new(), "S -> A | B\nA -> a\nB -> a").unwrap();
    match parser.build() {
      Err(LrError::ReduceReduceConflict { state_items, .. }) => {
        assert!(!state_items.is_empty());
      }
      other => panic!("expected reduce-reduce conflict, got {:?}", other.err()),
    }
  }

  #[test]
  fn error_handler_repairs_a_truncated_input() {
    let cfg = GrammarConfig::new();
    let mut parser = Slr::from_text(cfg.clone(), "S -> C C\nC -> c C | d").unwrap();

    let d = cfg.symbol("d");
    let end = cfg.end_mark();
    parser.install_error_hook(move |action, _goto, handlers| {
      // states that could shift a d but have nothing for the end marker
      for row in action.values_mut() {
        if matches!(row.get(&d), Some(Action::Shift(_))) && !row.contains_key(&end) {
          row.insert(end.clone(), Action::Error(0));
        }
      }
      handlers.push(Box::new(|_stack, tokens, pos| {
        tokens.insert(*pos, Token::text("d"));
      }));
    });
    parser.build().unwrap();

    let parse = parser.parse(&tokens("c d")).unwrap();
    assert_eq!(
      parse.tree.preorder_lexvals(),
      vec!["S", "C", "c", "C", "d", "C", "d"]
    );
  }

  #[test]
  fn missing_handler_raises_a_parse_error() {
    let cfg = GrammarConfig::new();
    let mut parser = Slr::from_text(cfg.clone(), "S -> C C\nC -> c C | d").unwrap();
    let end = cfg.end_mark();
    parser.install_error_hook(move |action, _goto, _handlers| {
      for row in action.values_mut() {
        row.entry(end.clone()).or_insert(Action::Error(7));
      }
    });
    parser.build().unwrap();
    assert!(parser.parse(&tokens("c d")).is_err());
  }
}
