//! Longest-match tokenizer over an ordered list of regex rules.
//!
//! Rules are tried in order at every input position; the strictly longest
//! match wins and ties go to the earlier rule, so `<=` must be listed
//! before `<`. Bytes no rule accepts are collected into in-band unknown
//! tokens of id `-1` instead of failing the lex.

use std::fmt;

pub mod regex;

pub use regex::{Regex, RegexError};

#[cfg(not(debug_assertions))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;

#[cfg(debug_assertions)]
pub(crate) type Map<K, V> = indexmap::IndexMap<K, V>;

#[cfg(not(debug_assertions))]
pub(crate) type Set<K> = std::collections::HashSet<K>;

#[cfg(debug_assertions)]
pub(crate) type Set<K> = indexmap::IndexSet<K>;

/// Token id of the in-band unknown token.
pub const UNKNOWN: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: i32,
  /// The matched lexeme.
  pub value: String,
  /// Display name of the rule that produced the token; grammar symbols are
  /// keyed by this. Unknown tokens are named by their lexeme.
  pub name: String,
  /// 1-based position of the first byte; 0 when synthesized.
  pub line: usize,
  pub column: usize,
}

impl Token {
  pub fn new(
    kind: i32,
    value: impl Into<String>,
    name: impl Into<String>,
    line: usize,
    column: usize,
  ) -> Token {
    Token {
      kind,
      value: value.into(),
      name: name.into(),
      line,
      column,
    }
  }

  /// A position-less token whose name and value are both `text`. Used by
  /// tests that feed pre-split symbol names and for the synthesized
  /// end-marker token.
  pub fn text(text: impl Into<String>) -> Token {
    let text = text.into();
    Token {
      kind: UNKNOWN,
      name: text.clone(),
      value: text,
      line: 0,
      column: 0,
    }
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f,
      "Token({}, {:?}, line: {}, column: {})",
      self.name, self.value, self.line, self.column
    )
  }
}

/// One lexer rule: a pattern, the token id it produces and the display
/// name that grammar symbols refer to.
#[derive(Debug, Clone)]
pub struct LexRule {
  pub pattern: String,
  pub token: i32,
  pub name: String,
}

impl LexRule {
  pub fn new(pattern: impl Into<String>, token: i32, name: impl Into<String>) -> LexRule {
    LexRule {
      pattern: pattern.into(),
      token,
      name: name.into(),
    }
  }
}

pub struct Lexer {
  rules: Vec<(Regex, i32)>,
  names: Map<i32, String>,
  whitespace: i32,
}

impl Lexer {
  /// Compiles every rule pattern up front; an invalid pattern fails the
  /// whole constructor.
  pub fn new(rules: &[LexRule], whitespace: i32) -> Result<Lexer, RegexError> {
    let mut compiled = Vec::with_capacity(rules.len());
    let mut names = Map::new();
    for rule in rules {
      compiled.push((Regex::new(&rule.pattern)?, rule.token));
      names.insert(rule.token, rule.name.clone());
    }
    Ok(Lexer {
      rules: compiled,
      names,
      whitespace,
    })
  }

  pub fn token_name(&self, kind: i32) -> Option<&str> {
    self.names.get(&kind).map(|s| s.as_str())
  }

  /// Tokenizes the whole input. Never fails: unmatched bytes become
  /// unknown tokens of id `-1`.
  pub fn parse(&self, input: &str, skip_whitespace: bool) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut tokens = vec![];
    let mut pos = 0;
    let mut line = 0usize;
    let mut col = 0usize;
    let mut unknown: Option<Token> = None;

    while pos < bytes.len() {
      let mut best = 0;
      let mut best_token = UNKNOWN;
      for (pattern, token) in &self.rules {
        let matched = pattern.longest_match_bytes(&bytes[pos..]);
        if matched > best {
          best = matched;
          best_token = *token;
        }
      }

      if best == 0 {
        match &mut unknown {
          Some(token) => token.value.push(bytes[pos] as char),
          None => {
            unknown = Some(Token::new(
              UNKNOWN,
              (bytes[pos] as char).to_string(),
              "",
              line + 1,
              col + 1,
            ));
          }
        }
        col += 1;
        pos += 1;
        continue;
      }

      if let Some(mut token) = unknown.take() {
        token.name = token.value.clone();
        log::trace!("unknown token {}", token);
        tokens.push(token);
      }

      let lexeme = String::from_utf8_lossy(&bytes[pos..pos + best]).into_owned();
      if !skip_whitespace || best_token != self.whitespace {
        let name = self
          .names
          .get(&best_token)
          .cloned()
          .unwrap_or_else(|| lexeme.clone());
        let token = Token::new(best_token, lexeme.clone(), name, line + 1, col + 1);
        log::trace!("{}", token);
        tokens.push(token);
      }

      let newlines = lexeme.bytes().filter(|&b| b == b'\n').count();
      if newlines > 0 {
        let last_newline = lexeme.rfind('\n').unwrap();
        line += newlines;
        col = best - last_newline - 1;
      } else {
        col += best;
      }
      pos += best;
    }

    if let Some(mut token) = unknown.take() {
      token.name = token.value.clone();
      tokens.push(token);
    }

    tokens
  }
}
