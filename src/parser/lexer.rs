/*!
# Lossless Java Lexer

Tokenizer for Java source built on the `logos` lexer generator.

The token stream is lossless: whitespace and comments are tokens in
their own right, never skipped. The element tree keeps them as leaves,
so rendering a tree back to text reproduces the original formatting.
This matters for splicing: dropping formatting tokens between
statements can produce non-parseable Java.
*/

use logos::Logos;

use crate::core::{PsiError, Result};

/// Kinds of lexical tokens.
///
/// Keywords are not distinguished from identifiers at this level;
/// the grammar checks the identifier text where it matters
/// (`package`, `import`, `class`, ...).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[regex(r"[ \t\r\n\x0C]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    /// A `/** ... */` documentation comment with a non-empty body.
    /// `/**/` is a plain block comment.
    #[regex(r"/\*\*\**[^*/][^*]*\*+([^/*][^*]*\*+)*/", priority = 10)]
    DocComment,

    /// A `/* ... */` comment. The pattern also covers doc comments;
    /// [`DocComment`][TokenKind::DocComment] wins those by priority.
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
    BlockComment,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,

    // Deliberately loose: covers decimal, hex, binary, floats and
    // numeric suffixes without validating them.
    #[regex(r"[0-9][0-9_a-zA-Z]*(\.[0-9_a-zA-Z]+)?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,

    #[regex(r"'([^'\\\n]|\\.)*'")]
    CharLiteral,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(";")]
    Semi,

    /// Any other single punctuation character. Multi-character operators
    /// arrive as runs of `Punct` tokens, which is enough for a lossless
    /// round trip.
    #[regex(r"[\[\]<>.,=+\-*/%!?:&|^~@#]")]
    Punct,
}

/// A single token: its kind and the exact source slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    /// Tells whether this token is the given keyword or identifier.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }

    /// Tells whether this token carries no code (whitespace or comment).
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::DocComment
        )
    }
}

/// Splits the given source into a lossless token stream.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    while let Some(outcome) = lexer.next() {
        match outcome {
            Ok(kind) => tokens.push(Token {
                kind,
                text: lexer.slice().to_owned(),
            }),
            Err(()) => {
                return Err(PsiError::Parse(format!(
                    "unexpected character `{}` at offset {}",
                    lexer.slice(),
                    lexer.span().start
                )))
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let source = "package com.acme;\n\npublic class Foo {\n    int x = 1; // count\n}\n";
        let rebuilt: String = tokenize(source)
            .unwrap()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_whitespace_and_comments_are_tokens() {
        let tokens = tokenize("int a; /* note */ // tail\n").unwrap();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Whitespace));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::BlockComment));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::LineComment));
    }

    #[test]
    fn test_doc_comment_vs_block_comment() {
        assert_eq!(kinds("/** doc */"), vec![TokenKind::DocComment]);
        assert_eq!(kinds("/* plain */"), vec![TokenKind::BlockComment]);
        assert_eq!(kinds("/**/"), vec![TokenKind::BlockComment]);
        assert_eq!(kinds("/***/"), vec![TokenKind::BlockComment]);
    }

    #[test]
    fn test_every_comment_flavor_in_one_source() {
        let source = "int a; /* note */ int b; /** doc */ int c; /**/ // tail";
        let rebuilt: String = tokenize(source)
            .unwrap()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_literals() {
        let tokens = tokenize(r#"String s = "a\"b"; char c = '\n'; long n = 0xFF_EC;"#).unwrap();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::StringLiteral));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::CharLiteral));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_rejects_stray_character() {
        assert!(tokenize("int a = `b`;").is_err());
    }
}
