use bit_set::BitSet;
use crate::Map;
use super::token::{self, ByteSet, Op, PatternToken, RegexError};

/// Syntax tree of a pattern annotated with the position sets the
/// followpos construction needs. Leaves are numbered from 1; the
/// end-marker `#` owns the last position.
pub struct RegexTree {
  pub root: Option<Node>,
  /// Indexed by position; slot 0 is unused.
  pub followpos: Vec<BitSet>,
  /// Disjoint alphabet: every class maps to the positions it can advance.
  pub token_map: Map<PatternToken, BitSet>,
  /// Position of the end marker.
  pub end_pos: usize,
}

pub struct Node {
  pub kind: NodeKind,
  pub nullable: bool,
  pub firstpos: BitSet,
  pub lastpos: BitSet,
}

pub enum NodeKind {
  Leaf(usize),
  Concat(Box<Node>, Box<Node>),
  Alt(Box<Node>, Box<Node>),
  Star(Box<Node>),
  Plus(Box<Node>),
}

impl Node {
  fn leaf(pos: usize) -> Node {
    let mut set = BitSet::new();
    set.insert(pos);
    Node {
      kind: NodeKind::Leaf(pos),
      nullable: false,
      firstpos: set.clone(),
      lastpos: set,
    }
  }

  fn concat(left: Node, right: Node) -> Node {
    let mut firstpos = left.firstpos.clone();
    if left.nullable {
      firstpos.union_with(&right.firstpos);
    }
    let mut lastpos = right.lastpos.clone();
    if right.nullable {
      lastpos.union_with(&left.lastpos);
    }
    Node {
      nullable: left.nullable && right.nullable,
      firstpos,
      lastpos,
      kind: NodeKind::Concat(Box::new(left), Box::new(right)),
    }
  }

  fn alt(left: Node, right: Node) -> Node {
    let mut firstpos = left.firstpos.clone();
    firstpos.union_with(&right.firstpos);
    let mut lastpos = left.lastpos.clone();
    lastpos.union_with(&right.lastpos);
    Node {
      nullable: left.nullable || right.nullable,
      firstpos,
      lastpos,
      kind: NodeKind::Alt(Box::new(left), Box::new(right)),
    }
  }

  fn star(child: Node) -> Node {
    Node {
      nullable: true,
      firstpos: child.firstpos.clone(),
      lastpos: child.lastpos.clone(),
      kind: NodeKind::Star(Box::new(child)),
    }
  }

  fn plus(child: Node) -> Node {
    Node {
      nullable: child.nullable,
      firstpos: child.firstpos.clone(),
      lastpos: child.lastpos.clone(),
      kind: NodeKind::Plus(Box::new(child)),
    }
  }
}

impl RegexTree {
  pub fn parse(pattern: &str) -> Result<RegexTree, RegexError> {
    if pattern.is_empty() {
      return Ok(RegexTree {
        root: None,
        followpos: vec![],
        token_map: Map::new(),
        end_pos: 0,
      });
    }

    let postfix = token::to_postfix(&token::tokenize(pattern)?)?;

    let mut stack: Vec<Node> = vec![];
    let mut token_map: Map<PatternToken, BitSet> = Map::new();
    let mut next_pos = 1usize;

    for tok in postfix {
      match tok {
        PatternToken::Op(Op::Star) => {
          let child = pop_one(&mut stack, "'*'")?;
          stack.push(Node::star(child));
        }
        PatternToken::Op(Op::Plus) => {
          let child = pop_one(&mut stack, "'+'")?;
          stack.push(Node::plus(child));
        }
        PatternToken::Op(Op::Concat) => {
          let (left, right) = pop_two(&mut stack, "'·'")?;
          stack.push(Node::concat(left, right));
        }
        PatternToken::Op(Op::Alt) => {
          let (left, right) = pop_two(&mut stack, "'|'")?;
          stack.push(Node::alt(left, right));
        }
        tok if tok.is_operand() => {
          token_map.entry(tok).or_default().insert(next_pos);
          stack.push(Node::leaf(next_pos));
          next_pos += 1;
        }
        _ => return Err(RegexError::InvalidRegex("unbalanced parentheses".into())),
      }
    }

    if stack.len() != 1 {
      return Err(RegexError::InvalidRegex("leftover operands".into()));
    }
    let root = stack.pop().unwrap();

    let mut followpos = vec![BitSet::new(); next_pos];
    fill_followpos(&root, &mut followpos);

    let end_pos = token_map[&PatternToken::EndMark].iter().next().unwrap();
    let token_map = disjoint_token_sets(&token_map);

    Ok(RegexTree {
      root: Some(root),
      followpos,
      token_map,
      end_pos,
    })
  }
}

fn pop_one(stack: &mut Vec<Node>, op: &str) -> Result<Node, RegexError> {
  stack
    .pop()
    .ok_or_else(|| RegexError::InvalidRegex(format!("{} with no operand", op)))
}

fn pop_two(stack: &mut Vec<Node>, op: &str) -> Result<(Node, Node), RegexError> {
  if stack.len() < 2 {
    return Err(RegexError::InvalidRegex(format!(
      "{} with fewer than two operands",
      op
    )));
  }
  let right = stack.pop().unwrap();
  let left = stack.pop().unwrap();
  Ok((left, right))
}

fn fill_followpos(node: &Node, followpos: &mut [BitSet]) {
  match &node.kind {
    NodeKind::Leaf(_) => {}
    NodeKind::Concat(left, right) => {
      for p in left.lastpos.iter() {
        followpos[p].union_with(&right.firstpos);
      }
      fill_followpos(left, followpos);
      fill_followpos(right, followpos);
    }
    NodeKind::Alt(left, right) => {
      fill_followpos(left, followpos);
      fill_followpos(right, followpos);
    }
    NodeKind::Star(child) | NodeKind::Plus(child) => {
      for p in node.lastpos.iter() {
        followpos[p].union_with(&node.firstpos);
      }
      fill_followpos(child, followpos);
    }
  }
}

/// Re-partitions the leaf classes into disjoint byte sets: every byte is
/// assigned the union of the positions whose class contains it, and bytes
/// with identical position sets collapse into one transition class.
fn disjoint_token_sets(original: &Map<PatternToken, BitSet>) -> Map<PatternToken, BitSet> {
  let mut byte_positions: Vec<Option<BitSet>> = vec![None; 256];

  for (tok, positions) in original {
    match tok {
      PatternToken::EndMark => continue,
      PatternToken::Char(b) => {
        byte_positions[*b as usize]
          .get_or_insert_with(BitSet::new)
          .union_with(positions);
      }
      PatternToken::Class(set) => {
        for b in 0..=255u8 {
          if set.matches(b) {
            byte_positions[b as usize]
              .get_or_insert_with(BitSet::new)
              .union_with(positions);
          }
        }
      }
      PatternToken::Op(_) => {}
    }
  }

  let mut grouped: Map<BitSet, ByteSet> = Map::new();
  for (b, positions) in byte_positions.into_iter().enumerate() {
    if let Some(positions) = positions {
      grouped.entry(positions).or_default().add(b as u8);
    }
  }

  let mut result = Map::new();
  for (positions, bytes) in grouped {
    let tok = if bytes.len() == 1 {
      PatternToken::Char(bytes.bytes.iter().next().unwrap() as u8)
    } else {
      PatternToken::Class(bytes)
    };
    result.insert(tok, positions);
  }
  result.insert(PatternToken::EndMark, original[&PatternToken::EndMark].clone());

  result
}
