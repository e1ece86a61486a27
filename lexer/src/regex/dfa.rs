use std::collections::VecDeque;
use bit_set::BitSet;
use crate::{Map, Set};
use super::token::PatternToken;
use super::tree::RegexTree;

/// Position DFA built by subset construction over followpos sets.
/// State 1 is the start state; a state accepts iff it contains the
/// end-marker position.
pub struct Dfa {
  transitions: Map<usize, Map<PatternToken, usize>>,
  accept_states: Set<usize>,
}

impl Dfa {
  pub fn new(tree: &RegexTree) -> Dfa {
    let mut transitions: Map<usize, Map<PatternToken, usize>> = Map::new();
    let mut accept_states = Set::new();

    let Some(root) = &tree.root else {
      // The empty pattern accepts exactly the empty string.
      accept_states.insert(1);
      return Dfa { transitions, accept_states };
    };

    let mut states: Map<BitSet, usize> = Map::new();
    states.insert(root.firstpos.clone(), 1);
    if root.firstpos.contains(tree.end_pos) {
      accept_states.insert(1);
    }

    let mut queue = VecDeque::new();
    queue.push_back(root.firstpos.clone());

    while let Some(set) = queue.pop_front() {
      let from = states[&set];

      for (tok, positions) in &tree.token_map {
        if matches!(tok, PatternToken::EndMark) {
          continue;
        }

        let mut next = BitSet::new();
        for p in set.iter() {
          if positions.contains(p) {
            next.union_with(&tree.followpos[p]);
          }
        }
        if next.is_empty() {
          continue;
        }

        let to = match states.get(&next) {
          Some(&id) => id,
          None => {
            let id = states.len() + 1;
            if next.contains(tree.end_pos) {
              accept_states.insert(id);
            }
            states.insert(next.clone(), id);
            queue.push_back(next);
            id
          }
        };
        transitions.entry(from).or_default().insert(tok.clone(), to);
      }
    }

    log::debug!(
      "regex dfa: {} states, {} accepting",
      states.len(),
      accept_states.len()
    );

    Dfa { transitions, accept_states }
  }

  pub fn matches(&self, input: &[u8]) -> bool {
    let mut state = 1;
    for &b in input {
      match self.step(state, b) {
        Some(to) => state = to,
        None => return false,
      }
    }
    self.accept_states.contains(&state)
  }

  /// Length of the longest accepted prefix; 0 when no prefix of positive
  /// length is accepted.
  pub fn longest_match(&self, input: &[u8]) -> usize {
    let mut state = 1;
    let mut last_accept = 0;
    for (i, &b) in input.iter().enumerate() {
      match self.step(state, b) {
        Some(to) => state = to,
        None => break,
      }
      if self.accept_states.contains(&state) {
        last_accept = i + 1;
      }
    }
    last_accept
  }

  // Exact byte transitions win over class transitions.
  fn step(&self, state: usize, b: u8) -> Option<usize> {
    let row = self.transitions.get(&state)?;
    if let Some(&to) = row.get(&PatternToken::Char(b)) {
      return Some(to);
    }
    for (tok, &to) in row {
      if let PatternToken::Class(set) = tok {
        if set.matches(b) {
          return Some(to);
        }
      }
    }
    None
  }
}
