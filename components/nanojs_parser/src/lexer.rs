//! Lexer - tokenizes source code into location-bearing tokens.
//!
//! Tokenization is driven by a fixed first-character dispatch table: the
//! character under the cursor selects a list of candidate matchers which are
//! tried in order (keywords before operators), and the first match wins.
//! Operator families match greedily so that `>>>=` is preferred over `>>>`,
//! `>>=`, `>>`, `>=` and `>`. Characters without an entry in the table fall
//! back to the identifier matcher, then the number matcher.

use crate::token::{Keyword, Punctuator, Token, TokenKind};
use nanojs_core::{ErrorKind, ParseError, SourcePosition, SourceSpan};

/// A candidate token matcher, tried at the current cursor position
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// Exact single-character punctuator
    Single(char, Punctuator),
    /// Exact multi-character punctuator
    Exact(&'static str, Punctuator),
    /// Reserved word; the following character must not continue an identifier
    Keyword(Keyword),
    /// Greedy longest-match family, candidates sorted longest first
    Operators(&'static [(&'static str, Punctuator)]),
    /// Single- or double-quoted string literal
    StringLiteral,
    /// Backquoted template literal
    TemplateLiteral,
    /// `[A-Za-z_$][A-Za-z0-9_$]*`
    Identifier,
    /// `[0-9]+`
    Number,
}

const PLUS_OPS: &[(&str, Punctuator)] = &[
    ("++", Punctuator::PlusPlus),
    ("+=", Punctuator::PlusEq),
    ("+", Punctuator::Plus),
];

const MINUS_OPS: &[(&str, Punctuator)] = &[
    ("--", Punctuator::MinusMinus),
    ("-=", Punctuator::MinusEq),
    ("-", Punctuator::Minus),
];

const STAR_OPS: &[(&str, Punctuator)] = &[
    ("**=", Punctuator::StarStarEq),
    ("**", Punctuator::StarStar),
    ("*=", Punctuator::StarEq),
    ("*", Punctuator::Star),
];

const SLASH_OPS: &[(&str, Punctuator)] = &[
    ("/=", Punctuator::SlashEq),
    ("/", Punctuator::Slash),
];

const PERCENT_OPS: &[(&str, Punctuator)] = &[
    ("%=", Punctuator::PercentEq),
    ("%", Punctuator::Percent),
];

const LT_OPS: &[(&str, Punctuator)] = &[
    ("<<=", Punctuator::LtLtEq),
    ("<<", Punctuator::LtLt),
    ("<=", Punctuator::LtEq),
    ("<", Punctuator::Lt),
];

const GT_OPS: &[(&str, Punctuator)] = &[
    (">>>=", Punctuator::GtGtGtEq),
    (">>>", Punctuator::GtGtGt),
    (">>=", Punctuator::GtGtEq),
    (">>", Punctuator::GtGt),
    (">=", Punctuator::GtEq),
    (">", Punctuator::Gt),
];

const EQ_OPS: &[(&str, Punctuator)] = &[
    ("===", Punctuator::EqEqEq),
    ("==", Punctuator::EqEq),
    ("=>", Punctuator::Arrow),
    ("=", Punctuator::Assign),
];

const NOT_OPS: &[(&str, Punctuator)] = &[
    ("!==", Punctuator::NotEqEq),
    ("!=", Punctuator::NotEq),
    ("!", Punctuator::Not),
];

const OR_OPS: &[(&str, Punctuator)] = &[
    ("||=", Punctuator::OrOrEq),
    ("||", Punctuator::OrOr),
    ("|=", Punctuator::OrEq),
    ("|", Punctuator::Or),
];

const XOR_OPS: &[(&str, Punctuator)] = &[
    ("^=", Punctuator::XorEq),
    ("^", Punctuator::Xor),
];

const AND_OPS: &[(&str, Punctuator)] = &[
    ("&&=", Punctuator::AndAndEq),
    ("&&", Punctuator::AndAnd),
    ("&=", Punctuator::AndEq),
    ("&", Punctuator::And),
];

const QUESTION_OPS: &[(&str, Punctuator)] = &[
    ("??=", Punctuator::NullishCoalesceEq),
    ("??", Punctuator::NullishCoalesce),
    ("?", Punctuator::Question),
];

/// Tried when the first character has no entry in the dispatch table
const FALLBACK_MATCHERS: &[Matcher] = &[Matcher::Identifier, Matcher::Number];

/// First-character dispatch table.
///
/// Keyword candidates come before the identifier fallback inside each
/// letter bucket; the boundary rule inside the keyword matcher keeps
/// `instanceofx` from matching `instanceof`.
fn candidates(first: char) -> Option<&'static [Matcher]> {
    match first {
        '{' => Some(&[Matcher::Single('{', Punctuator::LBrace)]),
        '}' => Some(&[Matcher::Single('}', Punctuator::RBrace)]),
        '(' => Some(&[Matcher::Single('(', Punctuator::LParen)]),
        ')' => Some(&[Matcher::Single(')', Punctuator::RParen)]),
        '[' => Some(&[Matcher::Single('[', Punctuator::LBracket)]),
        ']' => Some(&[Matcher::Single(']', Punctuator::RBracket)]),
        ';' => Some(&[Matcher::Single(';', Punctuator::Semicolon)]),
        ':' => Some(&[Matcher::Single(':', Punctuator::Colon)]),
        ',' => Some(&[Matcher::Single(',', Punctuator::Comma)]),
        '~' => Some(&[Matcher::Single('~', Punctuator::Tilde)]),
        '.' => Some(&[
            Matcher::Exact("...", Punctuator::Spread),
            Matcher::Single('.', Punctuator::Dot),
        ]),
        '+' => Some(&[Matcher::Operators(PLUS_OPS)]),
        '-' => Some(&[Matcher::Operators(MINUS_OPS)]),
        '*' => Some(&[Matcher::Operators(STAR_OPS)]),
        '/' => Some(&[Matcher::Operators(SLASH_OPS)]),
        '%' => Some(&[Matcher::Operators(PERCENT_OPS)]),
        '<' => Some(&[Matcher::Operators(LT_OPS)]),
        '>' => Some(&[Matcher::Operators(GT_OPS)]),
        '=' => Some(&[Matcher::Operators(EQ_OPS)]),
        '!' => Some(&[Matcher::Operators(NOT_OPS)]),
        '|' => Some(&[Matcher::Operators(OR_OPS)]),
        '^' => Some(&[Matcher::Operators(XOR_OPS)]),
        '&' => Some(&[Matcher::Operators(AND_OPS)]),
        '?' => Some(&[Matcher::Operators(QUESTION_OPS)]),
        '\'' | '"' => Some(&[Matcher::StringLiteral]),
        '`' => Some(&[Matcher::TemplateLiteral]),
        'a' => Some(&[
            Matcher::Keyword(Keyword::Async),
            Matcher::Keyword(Keyword::Await),
            Matcher::Identifier,
        ]),
        'b' => Some(&[Matcher::Keyword(Keyword::Break), Matcher::Identifier]),
        'c' => Some(&[
            Matcher::Keyword(Keyword::Case),
            Matcher::Keyword(Keyword::Catch),
            Matcher::Keyword(Keyword::Const),
            Matcher::Keyword(Keyword::Continue),
            Matcher::Identifier,
        ]),
        'd' => Some(&[
            Matcher::Keyword(Keyword::Debugger),
            Matcher::Keyword(Keyword::Default),
            Matcher::Keyword(Keyword::Delete),
            Matcher::Keyword(Keyword::Do),
            Matcher::Identifier,
        ]),
        'e' => Some(&[Matcher::Keyword(Keyword::Else), Matcher::Identifier]),
        'f' => Some(&[
            Matcher::Keyword(Keyword::False),
            Matcher::Keyword(Keyword::Finally),
            Matcher::Keyword(Keyword::For),
            Matcher::Keyword(Keyword::Function),
            Matcher::Identifier,
        ]),
        'i' => Some(&[
            Matcher::Keyword(Keyword::If),
            Matcher::Keyword(Keyword::In),
            Matcher::Keyword(Keyword::Instanceof),
            Matcher::Identifier,
        ]),
        'l' => Some(&[Matcher::Keyword(Keyword::Let), Matcher::Identifier]),
        'n' => Some(&[
            Matcher::Keyword(Keyword::New),
            Matcher::Keyword(Keyword::Null),
            Matcher::Identifier,
        ]),
        'r' => Some(&[Matcher::Keyword(Keyword::Return), Matcher::Identifier]),
        's' => Some(&[
            Matcher::Keyword(Keyword::Super),
            Matcher::Keyword(Keyword::Switch),
            Matcher::Identifier,
        ]),
        't' => Some(&[
            Matcher::Keyword(Keyword::This),
            Matcher::Keyword(Keyword::Throw),
            Matcher::Keyword(Keyword::True),
            Matcher::Keyword(Keyword::Try),
            Matcher::Keyword(Keyword::Typeof),
            Matcher::Identifier,
        ]),
        'v' => Some(&[
            Matcher::Keyword(Keyword::Var),
            Matcher::Keyword(Keyword::Void),
            Matcher::Identifier,
        ]),
        'w' => Some(&[
            Matcher::Keyword(Keyword::While),
            Matcher::Keyword(Keyword::With),
            Matcher::Identifier,
        ]),
        'y' => Some(&[Matcher::Keyword(Keyword::Yield), Matcher::Identifier]),
        _ => None,
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

/// Lexer for nanojs source code
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            line: 0,
            column: 0,
        }
    }

    /// Tokenize the whole source.
    ///
    /// The returned vector always ends with a single `eof` token whose span
    /// is empty and equal to the final cursor position. Fails with a
    /// `LexError` carrying the unmatched remainder when no matcher accepts
    /// the input.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                let here = self.current_position();
                let mut eof = Token::new(TokenKind::Eof, "");
                eof.span = Some(SourceSpan::new(here.clone(), here));
                tokens.push(eof);
                return Ok(tokens);
            }

            let start = self.current_position();
            let first = self.chars[self.position];
            let list = candidates(first).unwrap_or(FALLBACK_MATCHERS);

            let mut matched = None;
            for matcher in list {
                if let Some(hit) = self.try_match(matcher) {
                    matched = Some(hit);
                    break;
                }
            }

            match matched {
                Some((mut token, length)) => {
                    self.advance_by(length);
                    token.span = Some(SourceSpan::new(start, self.current_position()));
                    tokens.push(token);
                }
                None => {
                    let remaining: String = self.chars[self.position..].iter().collect();
                    return Err(ParseError {
                        kind: ErrorKind::LexError,
                        message: format!("Unable to match input: {}", remaining),
                        source_position: Some(start),
                        remaining: Some(remaining),
                    });
                }
            }
        }
    }

    /// Try one matcher at the cursor; returns the token (without span) and
    /// the number of characters it consumed
    fn try_match(&self, matcher: &Matcher) -> Option<(Token, usize)> {
        match *matcher {
            Matcher::Single(ch, punctuator) => {
                if self.chars[self.position] == ch {
                    Some((
                        Token::new(TokenKind::Punctuator(punctuator), ch.to_string()),
                        1,
                    ))
                } else {
                    None
                }
            }
            Matcher::Exact(text, punctuator) => {
                if self.rest_starts_with(text) {
                    Some((
                        Token::new(TokenKind::Punctuator(punctuator), text),
                        text.chars().count(),
                    ))
                } else {
                    None
                }
            }
            Matcher::Keyword(keyword) => {
                let word = keyword.name();
                if !self.rest_starts_with(word) {
                    return None;
                }
                let length = word.chars().count();
                // Boundary rule: the keyword must not be a prefix of a
                // longer identifier
                if let Some(next) = self.chars.get(self.position + length) {
                    if is_ident_continue(*next) {
                        return None;
                    }
                }
                Some((Token::new(TokenKind::Keyword(keyword), word), length))
            }
            Matcher::Operators(table) => {
                for (text, punctuator) in table {
                    if self.rest_starts_with(text) {
                        return Some((
                            Token::new(TokenKind::Punctuator(*punctuator), *text),
                            text.chars().count(),
                        ));
                    }
                }
                None
            }
            Matcher::StringLiteral => self.match_string(),
            Matcher::TemplateLiteral => self.match_template(),
            Matcher::Identifier => {
                if !is_ident_start(self.chars[self.position]) {
                    return None;
                }
                let mut end = self.position + 1;
                while end < self.chars.len() && is_ident_continue(self.chars[end]) {
                    end += 1;
                }
                let value: String = self.chars[self.position..end].iter().collect();
                Some((
                    Token::new(TokenKind::Identifier, value),
                    end - self.position,
                ))
            }
            Matcher::Number => {
                if !self.chars[self.position].is_ascii_digit() {
                    return None;
                }
                let mut end = self.position + 1;
                while end < self.chars.len() && self.chars[end].is_ascii_digit() {
                    end += 1;
                }
                let value: String = self.chars[self.position..end].iter().collect();
                Some((Token::new(TokenKind::Number, value), end - self.position))
            }
        }
    }

    /// Match a single- or double-quoted string.
    ///
    /// The produced value is the raw character sequence between the quotes;
    /// escape sequences are carried through undecoded. A raw line feed
    /// inside the literal is a match failure, as is an unterminated run to
    /// end of input.
    fn match_string(&self) -> Option<(Token, usize)> {
        let quote = self.chars[self.position];
        let mut i = self.position + 1;
        while i < self.chars.len() {
            let ch = self.chars[i];
            if ch == quote {
                let value: String = self.chars[self.position + 1..i].iter().collect();
                return Some((
                    Token::new(TokenKind::String, value),
                    i - self.position + 1,
                ));
            }
            if ch == '\\' {
                i += 2;
                continue;
            }
            if ch == '\n' {
                return None;
            }
            i += 1;
        }
        None
    }

    /// Match a template literal. Line feeds are permitted; the value is the
    /// raw contents without interpolation handling.
    fn match_template(&self) -> Option<(Token, usize)> {
        let mut i = self.position + 1;
        while i < self.chars.len() {
            let ch = self.chars[i];
            if ch == '`' {
                let value: String = self.chars[self.position + 1..i].iter().collect();
                return Some((
                    Token::new(TokenKind::TemplateString, value),
                    i - self.position + 1,
                ));
            }
            if ch == '\\' {
                i += 2;
                continue;
            }
            i += 1;
        }
        None
    }

    fn rest_starts_with(&self, text: &str) -> bool {
        let mut i = self.position;
        for ch in text.chars() {
            if self.chars.get(i) != Some(&ch) {
                return false;
            }
            i += 1;
        }
        true
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.chars[self.position] {
                ' ' | '\t' | '\r' | '\n' => self.advance_char(),
                _ => break,
            }
        }
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance_char();
        }
    }

    fn advance_char(&mut self) {
        let ch = self.chars[self.position];
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        let tokens = lex("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        let span = tokens[0].span.as_ref().unwrap();
        assert_eq!(span.start, span.end);
    }

    #[test]
    fn test_identifier() {
        let tokens = lex("foo");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].value, "foo");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_identifier_with_dollar_and_underscore() {
        let tokens = lex("$a _b a1$_");
        assert_eq!(tokens[0].value, "$a");
        assert_eq!(tokens[1].value, "_b");
        assert_eq!(tokens[2].value, "a1$_");
    }

    #[test]
    fn test_number() {
        let tokens = lex("1234");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].value, "1234");
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("let const var"),
            vec![
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Keyword(Keyword::Const),
                TokenKind::Keyword(Keyword::Var),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keyword_boundary_rule() {
        // A keyword followed by an identifier-continue character is an
        // identifier, not a keyword
        let tokens = lex("instanceofx letter do_ in");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].value, "instanceofx");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].value, "letter");
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].value, "do_");
        assert_eq!(tokens[3].kind, TokenKind::Keyword(Keyword::In));
    }

    #[test]
    fn test_greedy_gt_family() {
        let tokens = lex(">>>= >>> >>= >> >= >");
        let expected = [
            Punctuator::GtGtGtEq,
            Punctuator::GtGtGt,
            Punctuator::GtGtEq,
            Punctuator::GtGt,
            Punctuator::GtEq,
            Punctuator::Gt,
        ];
        for (token, punctuator) in tokens.iter().zip(expected) {
            assert_eq!(token.kind, TokenKind::Punctuator(punctuator));
        }
    }

    #[test]
    fn test_eq_family() {
        assert_eq!(
            kinds("=== == => ="),
            vec![
                TokenKind::Punctuator(Punctuator::EqEqEq),
                TokenKind::Punctuator(Punctuator::EqEq),
                TokenKind::Punctuator(Punctuator::Arrow),
                TokenKind::Punctuator(Punctuator::Assign),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_question_family() {
        assert_eq!(
            kinds("??= ?? ?"),
            vec![
                TokenKind::Punctuator(Punctuator::NullishCoalesceEq),
                TokenKind::Punctuator(Punctuator::NullishCoalesce),
                TokenKind::Punctuator(Punctuator::Question),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spread_and_dot() {
        assert_eq!(
            kinds("... ."),
            vec![
                TokenKind::Punctuator(Punctuator::Spread),
                TokenKind::Punctuator(Punctuator::Dot),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literal_raw_value() {
        let tokens = lex(r#"'hello' "world""#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "hello");
        assert_eq!(tokens[1].value, "world");
    }

    #[test]
    fn test_string_escapes_kept_raw() {
        let tokens = lex(r"'a\'b\n'");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, r"a\'b\n");
    }

    #[test]
    fn test_string_with_raw_line_feed_fails() {
        let result = Lexer::new("'hello\nworld'").tokenize();
        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::LexError);
    }

    #[test]
    fn test_unterminated_string_fails() {
        let result = Lexer::new("'abc").tokenize();
        assert_eq!(result.unwrap_err().kind, ErrorKind::LexError);
    }

    #[test]
    fn test_template_literal_allows_newline() {
        let tokens = lex("`a\nb`");
        assert_eq!(tokens[0].kind, TokenKind::TemplateString);
        assert_eq!(tokens[0].value, "a\nb");
        // The cursor crossed a line boundary inside the literal
        let span = tokens[0].span.as_ref().unwrap();
        assert_eq!(span.start.line, 0);
        assert_eq!(span.end.line, 1);
    }

    #[test]
    fn test_unmatched_input_reports_remaining_prefix() {
        let result = Lexer::new("ab£c").tokenize();
        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::LexError);
        assert_eq!(error.remaining.as_deref(), Some("£c"));
        assert_eq!(error.source_position.unwrap().offset, 2);
    }

    #[test]
    fn test_spans_are_half_open() {
        let tokens = lex("let x");
        let first = tokens[0].span.as_ref().unwrap();
        assert_eq!(first.start.offset, 0);
        assert_eq!(first.end.offset, 3);
        let second = tokens[1].span.as_ref().unwrap();
        assert_eq!(second.start.offset, 4);
        assert_eq!(second.end.offset, 5);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let tokens = lex("a\nbb\n  c");
        let a = tokens[0].span.as_ref().unwrap();
        assert_eq!((a.start.line, a.start.column), (0, 0));
        let bb = tokens[1].span.as_ref().unwrap();
        assert_eq!((bb.start.line, bb.start.column), (1, 0));
        assert_eq!((bb.end.line, bb.end.column), (1, 2));
        let c = tokens[2].span.as_ref().unwrap();
        assert_eq!((c.start.line, c.start.column), (2, 2));
    }

    #[test]
    fn test_number_then_identifier() {
        // `1abc` is two tokens; rejecting it is the parser's job
        let tokens = lex("1abc");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].value, "1");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].value, "abc");
    }

    #[test]
    fn test_last_token_is_always_eof() {
        for source in ["", "a", "a + b", "let x = 1;\nlet y = 2;"] {
            let tokens = lex(source);
            assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        }
    }

    #[test]
    fn test_eof_span_is_final_cursor() {
        let tokens = lex("ab ");
        let eof = tokens.last().unwrap().span.as_ref().unwrap();
        assert_eq!(eof.start.offset, 3);
        assert_eq!(eof.end.offset, 3);
    }
}
