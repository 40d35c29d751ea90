//! CLI tokens and the consumable token stream.
//!
//! [`tokenize`] classifies raw, already shell-split strings into positional
//! and keyword [`Token`]s. A [`TokenStream`] walks them with single
//! consumption: the keyword pass claims keyword tokens and their values by
//! index, and the positional pass reads left to right from a cursor.
//! [`TokenStream::mark`] / [`TokenStream::reset`] undo speculative
//! consumption while a sum variant or element group is being tried.

use std::sync::LazyLock;

use regex::Regex;

/// Everything after this token is positional.
pub const END_OF_OPTIONS: &str = "--";

static NUMBER_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-(0[xXbBoO][0-9a-fA-F_]+|(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?)$")
        .expect("valid number regex")
});

/// One classified CLI token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Position in the raw input.
    pub index: usize,
    /// The raw string as supplied.
    pub raw: String,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Positional {
        value: String,
        /// Appeared after `--`.
        forced: bool,
    },
    Keyword {
        /// The flag text before any `=` (e.g. `--user.name`, `-v`).
        flag: String,
        /// Dotted path segments for `--` flags; empty for short flags.
        path: Vec<String>,
        /// Attached value from `--flag=value`.
        value: Option<String>,
    },
}

impl Token {
    pub fn is_keyword(&self) -> bool {
        matches!(self.kind, TokenKind::Keyword { .. })
    }

    /// The positional value, if this is a positional token.
    pub fn positional_value(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Positional { value, .. } => Some(value),
            TokenKind::Keyword { .. } => None,
        }
    }
}

/// Returns `true` for strings that look like options rather than values.
///
/// Negative numbers and a lone `-` are values.
///
/// # Examples
///
/// ```
/// use argbind_core::is_option_like;
///
/// assert!(is_option_like("--name"));
/// assert!(is_option_like("-v"));
/// assert!(!is_option_like("-5"));
/// assert!(!is_option_like("-1.5e3"));
/// assert!(!is_option_like("-"));
/// assert!(!is_option_like("value"));
/// ```
pub fn is_option_like(raw: &str) -> bool {
    raw.starts_with('-') && raw.len() > 1 && !NUMBER_LIKE.is_match(raw)
}

/// Classifies raw strings into tokens.
///
/// # Examples
///
/// ```
/// use argbind_core::{tokenize, TokenKind};
///
/// let tokens = tokenize(["--user.name=Alice", "--verbose", "42", "--", "--not-a-flag"]);
/// assert_eq!(tokens.len(), 4);
/// assert!(matches!(
///     &tokens[0].kind,
///     TokenKind::Keyword { path, value: Some(v), .. } if path == &["user", "name"] && v == "Alice"
/// ));
/// assert!(matches!(&tokens[1].kind, TokenKind::Keyword { value: None, .. }));
/// assert!(matches!(&tokens[3].kind, TokenKind::Positional { forced: true, .. }));
/// ```
pub fn tokenize<I, S>(raw: I) -> Vec<Token>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = Vec::new();
    let mut forced = false;

    for (index, item) in raw.into_iter().enumerate() {
        let item = item.as_ref();
        if !forced && item == END_OF_OPTIONS {
            forced = true;
            continue;
        }

        let kind = if forced || !is_option_like(item) {
            TokenKind::Positional {
                value: item.to_string(),
                forced,
            }
        } else {
            let (flag, value) = match item.split_once('=') {
                Some((flag, value)) => (flag, Some(value.to_string())),
                None => (item, None),
            };
            let path = match flag.strip_prefix("--") {
                Some(body) => body.split('.').map(String::from).collect(),
                None => Vec::new(),
            };
            TokenKind::Keyword {
                flag: flag.to_string(),
                path,
                value,
            }
        };

        tokens.push(Token {
            index,
            raw: item.to_string(),
            kind,
        });
    }

    tokens
}

/// Snapshot of a [`TokenStream`] position for speculative consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    cursor: usize,
    log_len: usize,
}

/// Ordered, single-consumption sequence of tokens.
///
/// # Examples
///
/// ```
/// use argbind_core::{tokenize, TokenStream};
///
/// let mut stream = TokenStream::new(tokenize(["a", "b", "c"]));
/// let mark = stream.mark();
/// assert_eq!(stream.consume_positional().as_deref(), Some("a"));
/// assert_eq!(stream.consume_positional().as_deref(), Some("b"));
/// stream.reset(mark);
/// assert_eq!(stream.positional_run(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    consumed: Vec<bool>,
    log: Vec<usize>,
    cursor: usize,
    reserved: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        let consumed = vec![false; tokens.len()];
        Self {
            tokens,
            consumed,
            log: Vec::new(),
            cursor: 0,
            reserved: 0,
        }
    }

    /// Builds a stream of forced positional tokens, used to bind the values
    /// a keyword claimed or one element group.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let value = value.into();
                Token {
                    index,
                    raw: value.clone(),
                    kind: TokenKind::Positional {
                        value,
                        forced: true,
                    },
                }
            })
            .collect();
        Self::new(tokens)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_consumed(&self, index: usize) -> bool {
        self.consumed.get(index).copied().unwrap_or(true)
    }

    /// Returns the next unconsumed token without advancing.
    pub fn peek(&self) -> Option<&Token> {
        self.next_unconsumed(self.cursor).map(|i| &self.tokens[i])
    }

    /// Returns and consumes the next unconsumed token.
    pub fn consume(&mut self) -> Option<Token> {
        let index = self.next_unconsumed(self.cursor)?;
        self.claim(index);
        self.cursor = index + 1;
        Some(self.tokens[index].clone())
    }

    /// Returns the next positional value without consuming it, or `None`
    /// at end of stream or at an unconsumed keyword.
    pub fn peek_positional(&self) -> Option<&str> {
        self.peek().and_then(Token::positional_value)
    }

    /// Consumes the next positional value.
    pub fn consume_positional(&mut self) -> Option<String> {
        self.peek_positional()?;
        self.consume()
            .and_then(|t| t.positional_value().map(String::from))
    }

    /// Number of positional tokens available before the next unconsumed
    /// keyword or end of stream, minus the reserved tail.
    pub fn positional_run(&self) -> usize {
        self.tokens
            .iter()
            .enumerate()
            .skip(self.cursor)
            .filter(|(i, _)| !self.consumed[*i])
            .take_while(|(_, t)| !t.is_keyword())
            .count()
            .saturating_sub(self.reserved)
    }

    /// Holds back the last `n` positional tokens of the current run from
    /// [`positional_run`](Self::positional_run), so a greedy capture leaves
    /// them for later positional-only parameters.
    pub fn reserve(&mut self, n: usize) {
        self.reserved = n;
    }

    /// Consumes exactly `n` positional tokens as a separate stream, or
    /// consumes nothing when fewer are available.
    pub fn take_group(&mut self, n: usize) -> Option<TokenStream> {
        if self.positional_run() < n {
            return None;
        }
        let mut values = Vec::with_capacity(n);
        for _ in 0..n {
            values.push(self.consume_positional()?);
        }
        Some(TokenStream::from_values(values))
    }

    /// Marks an arbitrary token consumed (used by the keyword pass).
    ///
    /// Consuming a token twice is a programming error.
    pub fn claim(&mut self, index: usize) {
        debug_assert!(!self.consumed[index], "token {index} consumed twice");
        self.consumed[index] = true;
        self.log.push(index);
    }

    pub fn mark(&self) -> Mark {
        Mark {
            cursor: self.cursor,
            log_len: self.log.len(),
        }
    }

    /// Restores the stream to `mark`, releasing every token consumed since.
    pub fn reset(&mut self, mark: Mark) {
        while self.log.len() > mark.log_len {
            if let Some(index) = self.log.pop() {
                self.consumed[index] = false;
            }
        }
        self.cursor = mark.cursor;
    }

    /// `true` when every token has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.consumed.iter().all(|c| *c)
    }

    /// Unconsumed tokens in input order.
    pub fn remaining(&self) -> Vec<&Token> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.consumed[*i])
            .map(|(_, t)| t)
            .collect()
    }

    fn next_unconsumed(&self, from: usize) -> Option<usize> {
        (from..self.tokens.len()).find(|i| !self.consumed[*i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_numbers_are_positional() {
        let tokens = tokenize(["-5", "-0x1f", "-.5", "-x"]);
        assert_eq!(tokens[0].positional_value(), Some("-5"));
        assert_eq!(tokens[1].positional_value(), Some("-0x1f"));
        assert_eq!(tokens[2].positional_value(), Some("-.5"));
        assert!(tokens[3].is_keyword());
    }

    #[test]
    fn test_short_flag_has_empty_path() {
        let tokens = tokenize(["-v"]);
        match &tokens[0].kind {
            TokenKind::Keyword { flag, path, value } => {
                assert_eq!(flag, "-v");
                assert!(path.is_empty());
                assert!(value.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_value_keeps_later_equals_signs() {
        let tokens = tokenize(["--expr=a=b"]);
        assert!(matches!(
            &tokens[0].kind,
            TokenKind::Keyword { value: Some(v), .. } if v == "a=b"
        ));
    }

    #[test]
    fn test_positional_run_stops_at_unconsumed_keyword() {
        let mut stream = TokenStream::new(tokenize(["1", "--known", "2", "--unknown", "3"]));
        stream.claim(1);
        assert_eq!(stream.positional_run(), 2);
        assert_eq!(stream.consume_positional().as_deref(), Some("1"));
        assert_eq!(stream.consume_positional().as_deref(), Some("2"));
        assert_eq!(stream.consume_positional(), None);
        assert_eq!(stream.remaining().len(), 2);
    }

    #[test]
    fn test_take_group_is_all_or_nothing() {
        let mut stream = TokenStream::new(tokenize(["a", "b", "c"]));
        let group = stream.take_group(2).unwrap();
        assert_eq!(group.positional_run(), 2);
        assert!(stream.take_group(2).is_none());
        assert_eq!(stream.positional_run(), 1);
    }

    #[test]
    fn test_reserved_tail_is_held_back() {
        let mut stream = TokenStream::new(tokenize(["a", "b", "c"]));
        stream.reserve(1);
        assert!(stream.take_group(3).is_none());
        assert!(stream.take_group(2).is_some());
        assert_eq!(stream.positional_run(), 0);
        stream.reserve(0);
        assert_eq!(stream.consume_positional().as_deref(), Some("c"));
    }

    #[test]
    fn test_reset_releases_claims() {
        let mut stream = TokenStream::new(tokenize(["a", "b"]));
        let mark = stream.mark();
        stream.claim(1);
        stream.consume();
        assert!(stream.is_exhausted());
        stream.reset(mark);
        assert!(!stream.is_consumed(0));
        assert!(!stream.is_consumed(1));
    }
}
