/*!
# Structural Grammar

Builds element trees from the lossless token stream.

This is a structural grammar, not a Java language grammar: it recognizes
just enough shape (package/import statements, class declarations,
members, braced code blocks, statements) for the engine to navigate,
synthesize and splice trees. No semantic analysis, no type checking.
Every token becomes a leaf of the tree, so rendering is lossless.
*/

use crate::core::{PsiError, Result};
use crate::tree::element::{Element, ElementKind};

use super::lexer::{Token, TokenKind};

/// Parses a whole compilation unit into a `File` element.
pub fn parse_file(tokens: &[Token], file_name: &str) -> Result<Element> {
    let mut cursor = Cursor::new(tokens);
    let file = Element::new_node(ElementKind::File, Some(file_name.to_owned()));
    while let Some(token) = cursor.peek() {
        if token.is_trivia() {
            file.push_child(cursor.bump_leaf());
        } else if token.is_word("package") {
            file.push_child(parse_dotted_statement(
                &mut cursor,
                ElementKind::PackageStatement,
            )?);
        } else if token.is_word("import") {
            file.push_child(parse_dotted_statement(
                &mut cursor,
                ElementKind::ImportStatement,
            )?);
        } else {
            file.push_child(parse_member(&mut cursor)?);
        }
    }
    Ok(file)
}

/// Parses text that consists of class members (fields, methods,
/// nested classes) without an enclosing class.
pub fn parse_members(tokens: &[Token]) -> Result<Vec<Element>> {
    let mut cursor = Cursor::new(tokens);
    let mut members = Vec::new();
    while let Some(token) = cursor.peek() {
        if token.is_trivia() {
            members.push(cursor.bump_leaf());
        } else {
            members.push(parse_member(&mut cursor)?);
        }
    }
    Ok(members)
}

/// Parses a braced code block. The token stream must start with `{`
/// and contain nothing but the block (plus trailing trivia).
pub fn parse_block(tokens: &[Token]) -> Result<Element> {
    let mut cursor = Cursor::new(tokens);
    match cursor.peek() {
        Some(token) if token.kind == TokenKind::LBrace => {}
        _ => {
            return Err(PsiError::invalid_argument(
                "a code block text must start with `{`",
            ))
        }
    }
    let block = parse_block_at(&mut cursor)?;
    while let Some(token) = cursor.peek() {
        if !token.is_trivia() {
            return Err(PsiError::Parse(format!(
                "unexpected `{}` after the closing brace of the code block",
                token.text
            )));
        }
        cursor.bump();
    }
    Ok(block)
}

/// A `package x.y;` or `import x.y.*;` statement. The dotted name is
/// recorded as the element name.
fn parse_dotted_statement(cursor: &mut Cursor<'_>, kind: ElementKind) -> Result<Element> {
    let node = Element::new_node(kind, None);
    let mut name = String::new();
    // Keyword.
    node.push_child(cursor.bump_leaf());
    loop {
        let Some(token) = cursor.peek() else {
            return Err(PsiError::Parse(
                "missing `;` at the end of the statement".to_owned(),
            ));
        };
        match token.kind {
            TokenKind::Semi => {
                node.push_child(cursor.bump_leaf());
                break;
            }
            TokenKind::Ident | TokenKind::Punct => {
                name.push_str(&token.text);
                node.push_child(cursor.bump_leaf());
            }
            _ => {
                node.push_child(cursor.bump_leaf());
            }
        }
    }
    Ok(rename(node, Some(name)))
}

/// Parses one class member or top-level declaration.
///
/// The prelude, everything up to the first `;` or `{` at zero paren
/// depth, decides what the construct is:
///   - ends with `;`, no parameter list  -> field;
///   - ends with `;`, has `(...)`        -> abstract/native method;
///   - `{` after a `class`-like keyword  -> (nested) class;
///   - `{` after a parameter list        -> method with a body;
///   - bare `{`                          -> initializer block.
fn parse_member(cursor: &mut Cursor<'_>) -> Result<Element> {
    let mut prelude: Vec<Token> = Vec::new();
    let mut paren_depth = 0usize;
    let mut saw_assignment = false;
    loop {
        let Some(token) = cursor.peek() else {
            return Err(PsiError::Parse(format!(
                "incomplete declaration: `{}`",
                prelude_text(&prelude)
            )));
        };
        match token.kind {
            TokenKind::LParen => {
                paren_depth += 1;
                prelude.push(cursor.bump());
            }
            TokenKind::RParen => {
                paren_depth = paren_depth.saturating_sub(1);
                prelude.push(cursor.bump());
            }
            TokenKind::Semi if paren_depth == 0 => {
                let semi = cursor.bump();
                return Ok(finish_semi_member(prelude, semi));
            }
            TokenKind::LBrace if paren_depth > 0 || saw_assignment => {
                // A field initializer such as `int[] X = {1, 2};`, or an
                // anonymous class in a field's right-hand side.
                prelude.extend(brace_group_tokens(cursor)?);
            }
            TokenKind::LBrace => {
                if class_keyword_index(&prelude).is_some() {
                    return parse_class(prelude, cursor);
                }
                return finish_method(prelude, cursor);
            }
            TokenKind::Punct if paren_depth == 0 && token.text == "=" => {
                saw_assignment = true;
                prelude.push(cursor.bump());
            }
            _ => prelude.push(cursor.bump()),
        }
    }
}

/// A member terminated by `;`: a field, or a method without a body.
fn finish_semi_member(prelude: Vec<Token>, semi: Token) -> Element {
    let has_params = prelude.iter().any(|t| t.kind == TokenKind::LParen);
    let (kind, name) = if has_params {
        (ElementKind::Method, method_name(&prelude))
    } else {
        (ElementKind::Field, field_name(&prelude))
    };
    let node = Element::new_node(kind, name);
    push_tokens(&node, prelude);
    node.push_child(token_leaf(semi));
    node
}

/// A method (or initializer block) whose body follows as a code block.
fn finish_method(prelude: Vec<Token>, cursor: &mut Cursor<'_>) -> Result<Element> {
    let name = method_name(&prelude);
    let node = Element::new_node(ElementKind::Method, name);
    push_tokens(&node, prelude);
    node.push_child(parse_block_at(cursor)?);
    Ok(node)
}

/// A class declaration. The cursor stands at the opening brace.
fn parse_class(prelude: Vec<Token>, cursor: &mut Cursor<'_>) -> Result<Element> {
    let name = class_name(&prelude);
    let class = Element::new_node(ElementKind::Class, name);
    push_tokens(&class, prelude);
    // Opening brace.
    class.push_child(cursor.bump_leaf());
    loop {
        let Some(token) = cursor.peek() else {
            return Err(PsiError::Parse(format!(
                "unbalanced braces in the declaration of `{}`",
                class.name().unwrap_or("<anonymous>")
            )));
        };
        if token.is_trivia() {
            class.push_child(cursor.bump_leaf());
        } else if token.kind == TokenKind::RBrace {
            class.push_child(cursor.bump_leaf());
            return Ok(class);
        } else {
            class.push_child(parse_member(cursor)?);
        }
    }
}

/// Parses a code block with the cursor at `{`.
fn parse_block_at(cursor: &mut Cursor<'_>) -> Result<Element> {
    let block = Element::new_node(ElementKind::CodeBlock, None);
    // Opening brace.
    block.push_child(cursor.bump_leaf());
    loop {
        let Some(token) = cursor.peek() else {
            return Err(PsiError::Parse("unbalanced braces in a code block".to_owned()));
        };
        if token.is_trivia() {
            block.push_child(cursor.bump_leaf());
        } else if token.kind == TokenKind::RBrace {
            block.push_child(cursor.bump_leaf());
            return Ok(block);
        } else {
            block.push_child(parse_statement(cursor)?);
        }
    }
}

/// Parses one statement inside a code block.
///
/// A statement runs to a `;` at zero paren depth, or to the end of a
/// nested `{...}` block that is not continued by `else`, `catch`,
/// `finally`, or the `while` of a `do` statement. Braces in expression
/// position (array initializers, lambda bodies, anonymous classes) are
/// consumed as raw balanced groups and do not end the statement.
fn parse_statement(cursor: &mut Cursor<'_>) -> Result<Element> {
    let statement = Element::new_node(ElementKind::Statement, None);
    let starts_with_do = cursor.peek().map_or(false, |t| t.is_word("do"));
    let mut paren_depth = 0usize;
    let mut saw_assignment = false;
    loop {
        let Some(token) = cursor.peek() else {
            return Err(PsiError::Parse("incomplete statement in a code block".to_owned()));
        };
        match token.kind {
            TokenKind::LParen => {
                paren_depth += 1;
                statement.push_child(cursor.bump_leaf());
            }
            TokenKind::RParen => {
                paren_depth = paren_depth.saturating_sub(1);
                statement.push_child(cursor.bump_leaf());
            }
            TokenKind::Semi if paren_depth == 0 => {
                statement.push_child(cursor.bump_leaf());
                return Ok(statement);
            }
            TokenKind::LBrace if paren_depth > 0 || saw_assignment => {
                // Expression position: `run(() -> { go(); })`,
                // `int[] a = {1, 2}`, anonymous class arguments.
                for group_token in brace_group_tokens(cursor)? {
                    statement.push_child(token_leaf(group_token));
                }
            }
            TokenKind::LBrace => {
                statement.push_child(parse_block_at(cursor)?);
                if !continues_statement(cursor, starts_with_do) {
                    return Ok(statement);
                }
                // Carry the trivia between the block and the
                // continuation keyword into the statement.
                while cursor.peek().map_or(false, Token::is_trivia) {
                    statement.push_child(cursor.bump_leaf());
                }
            }
            TokenKind::RBrace => {
                // The enclosing block ends; every `{` consumed above
                // takes its matching `}` with it.
                return Err(PsiError::Parse(
                    "unexpected `}` inside a statement".to_owned(),
                ));
            }
            TokenKind::Punct if paren_depth == 0 && token.text == "=" => {
                saw_assignment = true;
                statement.push_child(cursor.bump_leaf());
            }
            _ => statement.push_child(cursor.bump_leaf()),
        }
    }
}

/// Consumes one balanced `{...}` group, returning its raw tokens.
/// The cursor must stand at the opening brace.
fn brace_group_tokens(cursor: &mut Cursor<'_>) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    loop {
        let Some(token) = cursor.peek() else {
            return Err(PsiError::Parse(
                "unbalanced braces in an initializer or expression".to_owned(),
            ));
        };
        match token.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth = depth.saturating_sub(1),
            _ => {}
        }
        tokens.push(cursor.bump());
        if depth == 0 {
            return Ok(tokens);
        }
    }
}

/// Looks past trivia for `else`/`catch`/`finally` (or `while` after
/// `do`) continuing the current statement.
fn continues_statement(cursor: &Cursor<'_>, starts_with_do: bool) -> bool {
    let Some(token) = cursor.peek_past_trivia() else {
        return false;
    };
    token.is_word("else")
        || token.is_word("catch")
        || token.is_word("finally")
        || (starts_with_do && token.is_word("while"))
}

fn class_keyword_index(prelude: &[Token]) -> Option<usize> {
    prelude.iter().position(|t| {
        t.is_word("class") || t.is_word("interface") || t.is_word("enum") || t.is_word("record")
    })
}

/// The identifier following the `class`-like keyword.
fn class_name(prelude: &[Token]) -> Option<String> {
    let keyword = class_keyword_index(prelude)?;
    prelude[keyword + 1..]
        .iter()
        .find(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text.clone())
}

/// The identifier right before the parameter list.
fn method_name(prelude: &[Token]) -> Option<String> {
    let l_paren = prelude.iter().position(|t| t.kind == TokenKind::LParen)?;
    prelude[..l_paren]
        .iter()
        .rev()
        .find(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text.clone())
}

/// The declared name of a field: the last identifier before the
/// initializer `=`, or before the `;` when there is none.
fn field_name(prelude: &[Token]) -> Option<String> {
    let mut paren_depth = 0usize;
    let mut limit = prelude.len();
    for (index, token) in prelude.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => paren_depth += 1,
            TokenKind::RParen => paren_depth = paren_depth.saturating_sub(1),
            TokenKind::Punct if token.text == "=" && paren_depth == 0 => {
                limit = index;
                break;
            }
            _ => {}
        }
    }
    prelude[..limit]
        .iter()
        .rev()
        .find(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text.clone())
}

fn prelude_text(prelude: &[Token]) -> String {
    prelude.iter().map(|t| t.text.as_str()).collect()
}

fn push_tokens(node: &Element, tokens: Vec<Token>) {
    for token in tokens {
        node.push_child(token_leaf(token));
    }
}

fn token_leaf(token: Token) -> Element {
    let kind = match token.kind {
        TokenKind::Whitespace => ElementKind::Whitespace,
        TokenKind::LineComment | TokenKind::BlockComment => ElementKind::Comment,
        TokenKind::DocComment => ElementKind::DocComment,
        other => ElementKind::Token(other),
    };
    Element::new_leaf(kind, token.text)
}

/// Replaces the name of a freshly built node. Elements are immutable
/// after construction, so this rebuilds the node around its children.
fn rename(node: Element, name: Option<String>) -> Element {
    let renamed = Element::new_node(node.kind(), name);
    for child in node.children() {
        renamed.push_child(child);
    }
    renamed
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_past_trivia(&self) -> Option<&Token> {
        self.tokens[self.pos..].iter().find(|t| !t.is_trivia())
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn bump_leaf(&mut self) -> Element {
        token_leaf(self.bump())
    }
}
