//! Byte-level regular expressions compiled to a position DFA
//! (followpos construction), enough to drive a longest-match lexer.
//!
//! Surface: `|` `*` `+` `( )`, character classes `[…]` with `^` negation
//! and `a-z` ranges, `\w` `\d` `\s` shorthands, and the usual byte escapes.

mod dfa;
mod token;
mod tree;

pub use token::RegexError;

pub struct Regex {
  dfa: dfa::Dfa,
}

impl Regex {
  pub fn new(pattern: &str) -> Result<Regex, RegexError> {
    let tree = tree::RegexTree::parse(pattern)?;
    Ok(Regex { dfa: dfa::Dfa::new(&tree) })
  }

  /// True iff the whole input is accepted.
  pub fn matches(&self, input: &str) -> bool {
    self.dfa.matches(input.as_bytes())
  }

  /// Length of the longest accepted prefix, 0 when none of positive
  /// length exists. An empty-string match is reported by [`Regex::matches`],
  /// never here.
  pub fn longest_match(&self, input: &str) -> usize {
    self.dfa.longest_match(input.as_bytes())
  }

  pub fn longest_match_bytes(&self, input: &[u8]) -> usize {
    self.dfa.longest_match(input)
  }
}
