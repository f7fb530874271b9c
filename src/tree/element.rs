/*!
# Element Tree

A mutable Java syntax tree with the linkage discipline of the host PSI:
ordered children, a weak parent back-reference, and sibling navigation
derived from the parent. Nodes are opaque handles with pointer identity.

The tree is lossless: every character of the parsed source lives in some
leaf, so `text()` reproduces the input. Mutation happens through copying
insert operations (`add_before`, `add_range_after`, ...): the inserted
element is always a fresh deep copy, and the returned handle points at
the copy now living in the tree, exactly as the host `add*` family
behaves.

Handles are `Rc`-based and thread-confined; serialized access is the
caller's duty (see the command wrapper).
*/

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::{PsiError, Result};
use crate::parser::lexer::TokenKind;

/// The syntactic role of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    File,
    PackageStatement,
    ImportStatement,
    Class,
    Field,
    Method,
    CodeBlock,
    Statement,
    Whitespace,
    Comment,
    DocComment,
    /// A leaf token that is not trivia: keywords, identifiers, braces,
    /// punctuation, literals.
    Token(TokenKind),
}

struct ElementData {
    kind: ElementKind,
    /// Declared name for named constructs (classes, fields, methods,
    /// package statements). `None` for everything else.
    name: Option<String>,
    /// Exact source text for leaves; `None` for interior nodes.
    text: Option<String>,
    children: RefCell<Vec<Element>>,
    parent: RefCell<Weak<ElementData>>,
}

/// A cheap-clone handle to a tree node. Equality is pointer identity.
#[derive(Clone)]
pub struct Element(Rc<ElementData>);

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Element {}

impl Element {
    /// Creates a leaf carrying the given source text.
    pub fn new_leaf(kind: ElementKind, text: impl Into<String>) -> Self {
        Self(Rc::new(ElementData {
            kind,
            name: None,
            text: Some(text.into()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
        }))
    }

    /// Creates an interior node with no children yet.
    pub fn new_node(kind: ElementKind, name: Option<String>) -> Self {
        Self(Rc::new(ElementData {
            kind,
            name,
            text: None,
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
        }))
    }

    pub fn kind(&self) -> ElementKind {
        self.0.kind
    }

    /// The declared name, for named constructs.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.text.is_some()
    }

    /// Renders this element back to source text.
    pub fn text(&self) -> String {
        match &self.0.text {
            Some(text) => text.clone(),
            None => {
                let mut out = String::new();
                for child in self.0.children.borrow().iter() {
                    out.push_str(&child.text());
                }
                out
            }
        }
    }

    /// A snapshot of the current children, in order.
    pub fn children(&self) -> Vec<Element> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn parent(&self) -> Option<Element> {
        self.0.parent.borrow().upgrade().map(Element)
    }

    pub fn first_child(&self) -> Option<Element> {
        self.0.children.borrow().first().cloned()
    }

    pub fn last_child(&self) -> Option<Element> {
        self.0.children.borrow().last().cloned()
    }

    /// Position of the given direct child, by node identity.
    pub fn index_of(&self, child: &Element) -> Option<usize> {
        self.0
            .children
            .borrow()
            .iter()
            .position(|c| c == child)
    }

    /// The sibling immediately after this element.
    ///
    /// Positions are looked up in the parent at call time, so a handle
    /// captured before a removal navigates the tree as it is now.
    pub fn next_sibling(&self) -> Option<Element> {
        let parent = self.parent()?;
        let index = parent.index_of(self)?;
        let sibling = parent.0.children.borrow().get(index + 1).cloned();
        sibling
    }

    /// The sibling immediately before this element.
    pub fn prev_sibling(&self) -> Option<Element> {
        let parent = self.parent()?;
        let index = parent.index_of(self)?;
        if index == 0 {
            return None;
        }
        let sibling = parent.0.children.borrow().get(index - 1).cloned();
        sibling
    }

    /// Deep-copies this element into a detached tree.
    ///
    /// The copy never observes later mutation of the original.
    pub fn copy(&self) -> Element {
        let copy = Self(Rc::new(ElementData {
            kind: self.0.kind,
            name: self.0.name.clone(),
            text: self.0.text.clone(),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
        }));
        for child in self.0.children.borrow().iter() {
            copy.push_child(child.copy());
        }
        copy
    }

    /// Appends a child, re-parenting it to this element.
    ///
    /// Used by the grammar while building trees; inserts into existing
    /// trees go through the copying `add_*` operations instead.
    pub fn push_child(&self, child: Element) {
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child);
    }

    /// Inserts a copy of `new` before `anchor` and returns the copy.
    pub fn add_before(&self, new: &Element, anchor: &Element) -> Result<Element> {
        let index = self.index_of(anchor).ok_or_else(|| {
            PsiError::invalid_argument("the anchor is not a child of this element")
        })?;
        Ok(self.insert_copy(index, new))
    }

    /// Inserts a copy of `new` after `anchor` and returns the copy.
    pub fn add_after(&self, new: &Element, anchor: &Element) -> Result<Element> {
        let index = self.index_of(anchor).ok_or_else(|| {
            PsiError::invalid_argument("the anchor is not a child of this element")
        })?;
        Ok(self.insert_copy(index + 1, new))
    }

    /// Detaches the given direct child from this element.
    pub fn remove_child(&self, child: &Element) -> Result<()> {
        let index = self.index_of(child).ok_or_else(|| {
            PsiError::invalid_argument("the element to remove is not a child of this element")
        })?;
        let removed = self.0.children.borrow_mut().remove(index);
        *removed.0.parent.borrow_mut() = Weak::new();
        Ok(())
    }

    /// Appends copies of the sibling run `[first..=last]` to this element.
    pub fn add_range(&self, first: &Element, last: &Element) -> Result<()> {
        let copies = range_copies(first, last)?;
        for copy in copies {
            self.push_child(copy);
        }
        Ok(())
    }

    /// Inserts copies of the sibling run `[first..=last]` after `anchor`.
    ///
    /// Range inserts carry the formatting tokens between the statements,
    /// which one-by-one statement inserts would lose.
    pub fn add_range_after(&self, first: &Element, last: &Element, anchor: &Element) -> Result<()> {
        let index = self.index_of(anchor).ok_or_else(|| {
            PsiError::invalid_argument("the anchor is not a child of this element")
        })?;
        let copies = range_copies(first, last)?;
        for (offset, copy) in copies.into_iter().enumerate() {
            self.insert_at(index + 1 + offset, copy);
        }
        Ok(())
    }

    /// Inserts copies of the sibling run `[first..=last]` before `anchor`.
    pub fn add_range_before(&self, first: &Element, last: &Element, anchor: &Element) -> Result<()> {
        let index = self.index_of(anchor).ok_or_else(|| {
            PsiError::invalid_argument("the anchor is not a child of this element")
        })?;
        let copies = range_copies(first, last)?;
        for (offset, copy) in copies.into_iter().enumerate() {
            self.insert_at(index + offset, copy);
        }
        Ok(())
    }

    fn insert_copy(&self, index: usize, new: &Element) -> Element {
        let copy = new.copy();
        self.insert_at(index, copy.clone());
        copy
    }

    fn insert_at(&self, index: usize, child: Element) {
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().insert(index, child);
    }

    /// The opening brace of a braced construct (class or code block).
    pub fn l_brace(&self) -> Option<Element> {
        self.0
            .children
            .borrow()
            .iter()
            .find(|c| c.kind() == ElementKind::Token(TokenKind::LBrace))
            .cloned()
    }

    /// The closing brace of a braced construct.
    pub fn r_brace(&self) -> Option<Element> {
        self.0
            .children
            .borrow()
            .iter()
            .rev()
            .find(|c| c.kind() == ElementKind::Token(TokenKind::RBrace))
            .cloned()
    }

    /// The first element after the opening brace, or `None` when the
    /// braces are adjacent. The result can be a statement or a
    /// formatting element such as a newline.
    pub fn first_body_element(&self) -> Option<Element> {
        let l_brace = self.l_brace()?;
        let next = l_brace.next_sibling()?;
        if next.kind() == ElementKind::Token(TokenKind::RBrace) {
            return None;
        }
        Some(next)
    }

    /// The last element before the closing brace, or `None` when the
    /// braces are adjacent.
    pub fn last_body_element(&self) -> Option<Element> {
        let r_brace = self.r_brace()?;
        let prev = r_brace.prev_sibling()?;
        if prev.kind() == ElementKind::Token(TokenKind::LBrace) {
            return None;
        }
        Some(prev)
    }

    /// Looks up a nested class declared directly in this class.
    pub fn find_inner_class(&self, name: &str) -> Option<Element> {
        self.find_named_child(ElementKind::Class, name)
    }

    /// Looks up a field declared directly in this class.
    pub fn find_field(&self, name: &str) -> Option<Element> {
        self.find_named_child(ElementKind::Field, name)
    }

    /// Looks up a method declared directly in this class.
    pub fn find_method(&self, name: &str) -> Option<Element> {
        self.find_named_child(ElementKind::Method, name)
    }

    fn find_named_child(&self, kind: ElementKind, name: &str) -> Option<Element> {
        self.0
            .children
            .borrow()
            .iter()
            .find(|c| c.kind() == kind && c.name() == Some(name))
            .cloned()
    }
}

fn range_copies(first: &Element, last: &Element) -> Result<Vec<Element>> {
    let parent = first
        .parent()
        .ok_or_else(|| PsiError::invalid_argument("range elements must have a parent"))?;
    if last.parent().map_or(true, |p| p != parent) {
        return Err(PsiError::invalid_argument(
            "range ends must be siblings under the same parent",
        ));
    }
    let start = parent.index_of(first).ok_or_else(|| {
        PsiError::invalid_argument("the first range element is detached from its parent")
    })?;
    let end = parent.index_of(last).ok_or_else(|| {
        PsiError::invalid_argument("the last range element is detached from its parent")
    })?;
    if start > end {
        return Err(PsiError::invalid_argument(
            "the first range element must not follow the last one",
        ));
    }
    let children = parent.children();
    Ok(children[start..=end].iter().map(Element::copy).collect())
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.text();
        let short: String = text.chars().take(32).collect();
        write!(f, "Element({:?}, `{}`)", self.kind(), short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: TokenKind, text: &str) -> Element {
        Element::new_leaf(ElementKind::Token(kind), text)
    }

    fn block_with(statements: &[&str]) -> Element {
        let block = Element::new_node(ElementKind::CodeBlock, None);
        block.push_child(leaf(TokenKind::LBrace, "{"));
        for text in statements {
            let stmt = Element::new_node(ElementKind::Statement, None);
            stmt.push_child(leaf(TokenKind::Ident, text));
            stmt.push_child(leaf(TokenKind::Semi, ";"));
            block.push_child(stmt);
            block.push_child(Element::new_leaf(ElementKind::Whitespace, " "));
        }
        block.push_child(leaf(TokenKind::RBrace, "}"));
        block
    }

    #[test]
    fn test_text_renders_all_leaves() {
        let block = block_with(&["a", "b"]);
        assert_eq!(block.text(), "{a; b; }");
    }

    #[test]
    fn test_sibling_navigation() {
        let block = block_with(&["a"]);
        let l_brace = block.l_brace().unwrap();
        let stmt = l_brace.next_sibling().unwrap();
        assert_eq!(stmt.kind(), ElementKind::Statement);
        assert_eq!(stmt.prev_sibling().unwrap(), l_brace);
        assert!(block.parent().is_none());
    }

    #[test]
    fn test_sibling_walk_covers_the_whole_block() {
        let block = block_with(&["a", "b", "c"]);
        let mut texts = Vec::new();
        let mut current = block.first_child();
        while let Some(node) = current {
            texts.push(node.text());
            current = node.next_sibling();
        }
        assert_eq!(texts.concat(), block.text());

        let last = block.last_child().unwrap();
        assert!(last.next_sibling().is_none());
        assert_eq!(last.prev_sibling().unwrap().text(), " ");
    }

    #[test]
    fn test_copy_is_isolated() {
        let block = block_with(&["a", "b"]);
        let copy = block.copy();
        let original_first = block.first_body_element().unwrap();
        block.remove_child(&original_first).unwrap();

        assert_eq!(copy.first_body_element().unwrap().text(), "a;");
        assert!(copy.parent().is_none());
    }

    #[test]
    fn test_add_before_returns_the_inserted_copy() {
        let block = block_with(&["a"]);
        let r_brace = block.r_brace().unwrap();
        let stmt = Element::new_node(ElementKind::Statement, None);
        stmt.push_child(leaf(TokenKind::Ident, "z"));
        stmt.push_child(leaf(TokenKind::Semi, ";"));

        let added = block.add_before(&stmt, &r_brace).unwrap();
        assert_ne!(added, stmt);
        assert_eq!(added.parent().unwrap(), block);
        assert_eq!(block.text(), "{a; z;}");
    }

    #[test]
    fn test_range_insert_preserves_formatting() {
        let source = block_with(&["a", "b", "c"]);
        let dest = block_with(&["x"]);

        let first = source.first_body_element().unwrap();
        let last = source.last_body_element().unwrap();
        let r_brace = dest.r_brace().unwrap();
        dest.add_range_before(&first, &last, &r_brace).unwrap();

        assert_eq!(dest.text(), "{x; a; b; c; }");
    }

    #[test]
    fn test_range_requires_shared_parent() {
        let one = block_with(&["a"]);
        let other = block_with(&["b"]);
        let first = one.first_body_element().unwrap();
        let last = other.last_body_element().unwrap();
        let dest = block_with(&[]);
        let result = dest.add_range(&first, &last);
        assert!(matches!(result, Err(PsiError::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_block_has_no_body_elements() {
        let block = block_with(&[]);
        assert!(block.first_body_element().is_none());
        assert!(block.last_body_element().is_none());
    }

    #[test]
    fn test_anchor_must_be_a_child() {
        let block = block_with(&["a"]);
        let stranger = block_with(&["b"]);
        let stmt = Element::new_node(ElementKind::Statement, None);
        let result = block.add_before(&stmt, &stranger);
        assert!(matches!(result, Err(PsiError::InvalidArgument(_))));
    }
}
