//! Pattern compilation and matching.

use std::cell::Cell;
use std::fmt;

use crate::PatternError;

/// Maximum number of recursive calls for a single match. Patterns like
/// `*a*a*a*...*b` backtrack polynomially; counting total calls bounds the
/// CPU spent on one name.
const MAX_MATCH_CALLS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    AnyRun,
    Class { negated: bool, ranges: Vec<(char, char)> },
}

impl Token {
    /// Whether this single-character token accepts `c`.
    fn accepts(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyChar => c != '/',
            Token::Class { negated, ranges } => {
                c != '/' && ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi) != *negated
            }
            Token::AnyRun => false,
        }
    }
}

/// A compiled glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
}

impl Pattern {
    /// Compile a pattern, rejecting malformed syntax.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' => {
                    // Consecutive stars collapse into one
                    if tokens.last() != Some(&Token::AnyRun) {
                        tokens.push(Token::AnyRun);
                    }
                    i += 1;
                }
                '?' => {
                    tokens.push(Token::AnyChar);
                    i += 1;
                }
                '\\' => {
                    let escaped = chars.get(i + 1).ok_or_else(|| PatternError::TrailingEscape {
                        pattern: pattern.to_string(),
                    })?;
                    tokens.push(Token::Literal(*escaped));
                    i += 2;
                }
                '[' => {
                    let (class, consumed) = parse_class(pattern, &chars[i..])?;
                    tokens.push(class);
                    i += consumed;
                }
                c => {
                    tokens.push(Token::Literal(c));
                    i += 1;
                }
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            tokens,
        })
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the pattern matches the whole of `name`.
    pub fn matches(&self, name: &str) -> bool {
        let input: Vec<char> = name.chars().collect();
        let calls = Cell::new(0usize);
        match_bounded(&self.tokens, &input, &calls)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compile `pattern` and match it against `name` in one step.
///
/// # Examples
/// ```
/// use fsview_glob::glob_match;
///
/// assert_eq!(glob_match("*.rs", "main.rs"), Ok(true));
/// assert_eq!(glob_match("*.rs", "src/main.rs"), Ok(false));
/// assert_eq!(glob_match("src/?ain.rs", "src/main.rs"), Ok(true));
/// assert!(glob_match("[", "x").is_err());
/// ```
pub fn glob_match(pattern: &str, name: &str) -> Result<bool, PatternError> {
    Ok(Pattern::new(pattern)?.matches(name))
}

/// Parse a character class starting at `chars[0] == '['`.
///
/// Returns the class token and how many pattern chars it spans.
fn parse_class(pattern: &str, chars: &[char]) -> Result<(Token, usize), PatternError> {
    let unclosed = || PatternError::UnclosedClass {
        pattern: pattern.to_string(),
    };

    let mut idx = 1;
    let negated = matches!(chars.get(idx), Some('^') | Some('!'));
    if negated {
        idx += 1;
    }

    let mut ranges = Vec::new();
    loop {
        let c = *chars.get(idx).ok_or_else(unclosed)?;
        if c == ']' {
            if ranges.is_empty() {
                return Err(PatternError::EmptyClass {
                    pattern: pattern.to_string(),
                });
            }
            return Ok((Token::Class { negated, ranges }, idx + 1));
        }

        let (lo, next) = class_char(pattern, chars, idx)?;
        idx = next;

        // `a-z` range, unless the dash closes the class (`[a-]`)
        if chars.get(idx) == Some(&'-') && !matches!(chars.get(idx + 1), Some(']') | None) {
            let (hi, next) = class_char(pattern, chars, idx + 1)?;
            if hi < lo {
                return Err(PatternError::BadRange {
                    pattern: pattern.to_string(),
                    lo,
                    hi,
                });
            }
            ranges.push((lo, hi));
            idx = next;
        } else {
            ranges.push((lo, lo));
        }
    }
}

/// Read one (possibly escaped) character inside a class.
fn class_char(pattern: &str, chars: &[char], idx: usize) -> Result<(char, usize), PatternError> {
    match chars.get(idx) {
        Some('\\') => match chars.get(idx + 1) {
            Some(&c) => Ok((c, idx + 2)),
            None => Err(PatternError::TrailingEscape {
                pattern: pattern.to_string(),
            }),
        },
        Some(&c) => Ok((c, idx + 1)),
        None => Err(PatternError::UnclosedClass {
            pattern: pattern.to_string(),
        }),
    }
}

/// Work-bounded recursive matching with backtracking for `*`.
///
/// Returns `false` (non-match) once total recursive calls exceed
/// `MAX_MATCH_CALLS`.
fn match_bounded(tokens: &[Token], input: &[char], calls: &Cell<usize>) -> bool {
    let count = calls.get() + 1;
    calls.set(count);
    if count > MAX_MATCH_CALLS {
        return false;
    }

    let Some((first, rest)) = tokens.split_first() else {
        return input.is_empty();
    };

    match first {
        Token::AnyRun => {
            // A star never crosses a separator
            let limit = input.iter().position(|&c| c == '/').unwrap_or(input.len());
            if rest.is_empty() {
                return limit == input.len();
            }
            (0..=limit).any(|skip| match_bounded(rest, &input[skip..], calls))
        }
        single => match input.split_first() {
            Some((&c, tail)) if single.accepts(c) => match_bounded(rest, tail, calls),
            _ => false,
        },
    }
}
