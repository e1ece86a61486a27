use std::fmt;
use bit_set::BitSet;
use either::Either::{self, Left, Right};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegexError {
  #[error("unknown character escape: {0}")]
  UnknownCharacter(String),
  #[error("invalid regex: {0}")]
  InvalidRegex(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
  Concat,
  Alt,
  Star,
  Plus,
  LeftParen,
  RightParen,
}

/// A set of bytes, possibly negated. Negation is resolved against the full
/// 0..=255 range when the DFA alphabet is partitioned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ByteSet {
  pub bytes: BitSet,
  pub negative: bool,
}

impl ByteSet {
  pub fn new() -> Self {
    ByteSet::default()
  }

  pub fn from_bytes(bytes: &[u8]) -> Self {
    let mut set = ByteSet::new();
    for &b in bytes {
      set.add(b);
    }
    set
  }

  pub fn add(&mut self, b: u8) {
    self.bytes.insert(b as usize);
  }

  pub fn add_range(&mut self, from: u8, to: u8) {
    for b in from..=to {
      self.add(b);
    }
  }

  pub fn matches(&self, b: u8) -> bool {
    self.bytes.contains(b as usize) != self.negative
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }
}

pub fn word_class() -> ByteSet {
  let mut set = ByteSet::new();
  set.add_range(b'a', b'z');
  set.add_range(b'A', b'Z');
  set.add_range(b'0', b'9');
  set.add(b'_');
  set
}

pub fn digit_class() -> ByteSet {
  let mut set = ByteSet::new();
  set.add_range(b'0', b'9');
  set
}

pub fn space_class() -> ByteSet {
  ByteSet::from_bytes(&[b' ', b'\t', b'\n', b'\r', 0x0c, 0x0b])
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternToken {
  Char(u8),
  Class(ByteSet),
  /// The `#` position appended behind the whole pattern.
  EndMark,
  Op(Op),
}

impl PatternToken {
  pub fn is_operand(&self) -> bool {
    matches!(self, PatternToken::Char(_) | PatternToken::Class(_) | PatternToken::EndMark)
  }

  pub fn matches(&self, b: u8) -> bool {
    match self {
      PatternToken::Char(c) => *c == b,
      PatternToken::Class(set) => set.matches(b),
      _ => false,
    }
  }
}

pub fn precedence(op: Op) -> i32 {
  match op {
    Op::Star | Op::Plus => 3,
    Op::Concat => 2,
    Op::Alt => 1,
    Op::LeftParen | Op::RightParen => 0,
  }
}

impl fmt::Display for Op {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let c = match self {
      Op::Concat => '·',
      Op::Alt => '|',
      Op::Star => '*',
      Op::Plus => '+',
      Op::LeftParen => '(',
      Op::RightParen => ')',
    };
    write!(f, "{}", c)
  }
}

fn fmt_byte(f: &mut fmt::Formatter, b: u8) -> fmt::Result {
  match b {
    0 => write!(f, "\\0"),
    0x07 => write!(f, "\\a"),
    0x0b => write!(f, "\\v"),
    b'\n' => write!(f, "\\n"),
    b'\t' => write!(f, "\\t"),
    b'\r' => write!(f, "\\r"),
    0x0c => write!(f, "\\f"),
    b if b.is_ascii_graphic() || b == b' ' => write!(f, "{}", b as char),
    b => write!(f, "\\{}", b),
  }
}

impl fmt::Display for ByteSet {
  /// Renders the class compressed back to `[…]` form: consecutive bytes
  /// collapse into ranges, and a set covering more than half of the byte
  /// space is flipped into its negation first.
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut negative = self.negative;
    let mut bytes: Vec<u8> = (0..=255u8).filter(|&b| self.bytes.contains(b as usize)).collect();
    if bytes.len() > 128 {
      negative = !negative;
      bytes = (0..=255u8).filter(|&b| !self.bytes.contains(b as usize)).collect();
    }

    write!(f, "{}", if negative { "[^" } else { "[" })?;
    let mut i = 0;
    while i < bytes.len() {
      let start = bytes[i];
      let mut end = start;
      while i + 1 < bytes.len() && bytes[i + 1] == end + 1 {
        end = bytes[i + 1];
        i += 1;
      }
      if end == start {
        fmt_byte(f, start)?;
      } else if end == start + 1 {
        fmt_byte(f, start)?;
        fmt_byte(f, end)?;
      } else {
        fmt_byte(f, start)?;
        write!(f, "-")?;
        fmt_byte(f, end)?;
      }
      i += 1;
    }
    write!(f, "]")
  }
}

impl fmt::Display for PatternToken {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      PatternToken::Char(b) => fmt_byte(f, *b),
      PatternToken::Class(set) => write!(f, "{}", set),
      PatternToken::EndMark => write!(f, "#"),
      PatternToken::Op(op) => write!(f, "{}", op),
    }
  }
}

type Bytes<'a> = std::str::Bytes<'a>;

/// Flattens a pattern into operator/operand tokens, inserting explicit
/// concatenation operators and wrapping the whole pattern as `( … ) · #`.
pub fn tokenize(pattern: &str) -> Result<Vec<PatternToken>, RegexError> {
  let mut out = vec![PatternToken::Op(Op::LeftParen)];
  // true after an operand, `)`, `*` or `+`: the next atom needs a concat.
  let mut operand_before = false;
  let mut bytes = pattern.bytes();

  while let Some(b) = bytes.next() {
    match b {
      b'[' => {
        if operand_before {
          out.push(PatternToken::Op(Op::Concat));
        }
        out.push(PatternToken::Class(parse_class(&mut bytes)?));
        operand_before = true;
      }
      b'\\' => {
        if operand_before {
          out.push(PatternToken::Op(Op::Concat));
        }
        match parse_escape(&mut bytes)? {
          Left(c) => out.push(PatternToken::Char(c)),
          Right(class) => out.push(PatternToken::Class(class)),
        }
        operand_before = true;
      }
      b'|' => {
        out.push(PatternToken::Op(Op::Alt));
        operand_before = false;
      }
      b'*' => {
        if !operand_before {
          return Err(RegexError::InvalidRegex("stray '*'".into()));
        }
        out.push(PatternToken::Op(Op::Star));
      }
      b'+' => {
        if !operand_before {
          return Err(RegexError::InvalidRegex("stray '+'".into()));
        }
        out.push(PatternToken::Op(Op::Plus));
      }
      b'(' => {
        if operand_before {
          out.push(PatternToken::Op(Op::Concat));
        }
        out.push(PatternToken::Op(Op::LeftParen));
        operand_before = false;
      }
      b')' => {
        out.push(PatternToken::Op(Op::RightParen));
        operand_before = true;
      }
      b']' => {
        return Err(RegexError::InvalidRegex("unmatched ']'".into()));
      }
      _ => {
        if operand_before {
          out.push(PatternToken::Op(Op::Concat));
        }
        out.push(PatternToken::Char(b));
        operand_before = true;
      }
    }
  }

  out.push(PatternToken::Op(Op::RightParen));
  out.push(PatternToken::Op(Op::Concat));
  out.push(PatternToken::EndMark);
  Ok(out)
}

fn parse_class(bytes: &mut Bytes) -> Result<ByteSet, RegexError> {
  let mut set = ByteSet::new();
  let mut last: Option<u8> = None;
  let mut pending_range = false;
  let mut first = true;

  loop {
    let Some(b) = bytes.next() else {
      return Err(RegexError::InvalidRegex("unmatched '['".into()));
    };
    match b {
      b']' => {
        if pending_range {
          return Err(RegexError::InvalidRegex("unmatched '-'".into()));
        }
        return Ok(set);
      }
      b'^' if first => {
        set.negative = true;
      }
      b'-' if !pending_range && last.is_some() => {
        pending_range = true;
      }
      b'\\' => {
        let c = parse_class_escape(bytes)?;
        if pending_range {
          set.add_range(last.unwrap(), c);
          pending_range = false;
        } else {
          set.add(c);
        }
        last = Some(c);
      }
      _ => {
        if pending_range {
          set.add_range(last.unwrap(), b);
          pending_range = false;
        } else {
          set.add(b);
        }
        last = Some(b);
      }
    }
    first = false;
  }
}

fn parse_class_escape(bytes: &mut Bytes) -> Result<u8, RegexError> {
  let Some(b) = bytes.next() else {
    return Err(RegexError::InvalidRegex("unmatched escape".into()));
  };
  match b {
    b'n' => Ok(b'\n'),
    b't' => Ok(b'\t'),
    b'r' => Ok(b'\r'),
    b'f' => Ok(0x0c),
    b'v' => Ok(0x0b),
    b'a' => Ok(0x07),
    b'0' => Ok(0),
    b'\\' | b'-' | b'[' | b']' | b'^' => Ok(b),
    _ => Err(RegexError::UnknownCharacter(format!("[\\{}]", b as char))),
  }
}

fn parse_escape(bytes: &mut Bytes) -> Result<Either<u8, ByteSet>, RegexError> {
  let Some(b) = bytes.next() else {
    return Err(RegexError::InvalidRegex("unmatched escape".into()));
  };
  match b {
    b'\\' | b'|' | b'*' | b'+' | b'(' | b')' | b'[' | b']' => Ok(Left(b)),
    b'w' => Ok(Right(word_class())),
    b'd' => Ok(Right(digit_class())),
    b's' => Ok(Right(space_class())),
    b'n' => Ok(Left(b'\n')),
    b't' => Ok(Left(b'\t')),
    b'r' => Ok(Left(b'\r')),
    b'f' => Ok(Left(0x0c)),
    b'v' => Ok(Left(0x0b)),
    b'a' => Ok(Left(0x07)),
    b'0' => Ok(Left(0)),
    b'{' | b'}' | b'.' | b'-' => Ok(Left(b)),
    _ => Err(RegexError::UnknownCharacter(format!("\\{}", b as char))),
  }
}

/// Shunting-yard over the flat token sequence.
pub fn to_postfix(tokens: &[PatternToken]) -> Result<Vec<PatternToken>, RegexError> {
  let mut out = vec![];
  let mut ops: Vec<Op> = vec![];

  for tok in tokens {
    match tok {
      t if t.is_operand() => out.push(t.clone()),
      PatternToken::Op(Op::RightParen) => {
        loop {
          match ops.pop() {
            Some(Op::LeftParen) => break,
            Some(op) => out.push(PatternToken::Op(op)),
            None => return Err(RegexError::InvalidRegex("unmatched ')'".into())),
          }
        }
      }
      PatternToken::Op(op @ (Op::Alt | Op::Concat)) => {
        while let Some(&top) = ops.last() {
          if precedence(top) >= precedence(*op) {
            out.push(PatternToken::Op(top));
            ops.pop();
          } else {
            break;
          }
        }
        ops.push(*op);
      }
      PatternToken::Op(op @ (Op::Star | Op::Plus | Op::LeftParen)) => ops.push(*op),
      _ => unreachable!(),
    }
  }

  while let Some(op) = ops.pop() {
    if op == Op::LeftParen {
      return Err(RegexError::InvalidRegex("unmatched '('".into()));
    }
    out.push(PatternToken::Op(op));
  }
  Ok(out)
}
