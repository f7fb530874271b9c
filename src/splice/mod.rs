/*!
# Tree-Fragment Splice Adapters

Moves contiguous statement runs between trees without the caller
special-casing the braces every block carries.

The host tree cannot represent a block without braces, so even a bare
statement list is created as a braced block. The adapters here wrap a
private deep copy of such a block and expose its body as a range,
skipping the brace tokens. All inserts are range inserts, because only
range inserts carry the formatting tokens between statements; inserting
statements one by one loses newlines and can produce unparseable text.
*/

use crate::core::{PsiError, Result};
use crate::tree::{Element, ElementFactory, ElementKind};

/// A contiguous run of sibling elements, ready for range insertion.
pub trait Fragment {
    /// The first element of the run.
    fn first_element(&self) -> Result<Element>;

    /// The last element of the run.
    fn last_element(&self) -> Result<Element>;
}

/// Adapts a code block to be used without the surrounding braces.
///
/// The adapter holds a deep copy of the block passed to it, so later
/// edits to the original are never observed, and [`append`][Self::append]
/// and [`prepend`][Self::prepend] mutate only the copy.
pub struct CodeBlockAdapter {
    delegate: Element,
}

impl CodeBlockAdapter {
    /// Wraps a deep copy of the given code block.
    pub fn new(code_block: &Element) -> Result<Self> {
        if code_block.kind() != ElementKind::CodeBlock {
            return Err(PsiError::invalid_argument(format!(
                "expected a code block, got `{:?}`",
                code_block.kind()
            )));
        }
        Ok(Self {
            delegate: code_block.copy(),
        })
    }

    /// Creates an adapter from statement text without braces.
    ///
    /// Empty text is accepted; errors surface later from the body
    /// accessors.
    pub fn from_text(factory: &ElementFactory, text: &str) -> Result<Self> {
        let code_block = factory.create_code_block_from_text(&format!("{{{text}}}"))?;
        Ok(Self {
            delegate: code_block,
        })
    }

    /// The first element after the opening brace. It can be a statement
    /// or a formatting element such as a newline.
    pub fn first_body_element(&self) -> Result<Element> {
        self.delegate.first_body_element().ok_or_else(|| {
            PsiError::invalid_state(
                "cannot provide the first body element of the code block \
                 because the block is empty",
            )
        })
    }

    /// The last element before the closing brace.
    pub fn last_body_element(&self) -> Result<Element> {
        self.delegate.last_body_element().ok_or_else(|| {
            PsiError::invalid_state(
                "cannot provide the last body element of the code block \
                 because the block is empty",
            )
        })
    }

    /// Inserts the given fragment after the last body element.
    pub fn append(&self, other: &impl Fragment) -> Result<()> {
        let anchor = self.last_body_element()?;
        self.delegate
            .add_range_after(&other.first_element()?, &other.last_element()?, &anchor)
    }

    /// Inserts the given fragment before the first body element.
    pub fn prepend(&self, other: &impl Fragment) -> Result<()> {
        let anchor = self.first_body_element()?;
        self.delegate
            .add_range_before(&other.first_element()?, &other.last_element()?, &anchor)
    }

    /// The source text of the wrapped block, braces included.
    pub fn text(&self) -> String {
        self.delegate.text()
    }
}

impl Fragment for CodeBlockAdapter {
    fn first_element(&self) -> Result<Element> {
        self.first_body_element()
    }

    fn last_element(&self) -> Result<Element> {
        self.last_body_element()
    }
}

/// A list of statements extracted from a code block, excluding the
/// surrounding braces.
///
/// Unlike [`CodeBlockAdapter`], the body is addressed positionally: the
/// run spans from the second child to the second-to-last child of the
/// wrapped copy.
pub struct Statements {
    delegate: Element,
}

impl Statements {
    /// Wraps a deep copy of the given code block.
    pub fn new(code_block: &Element) -> Result<Self> {
        if code_block.kind() != ElementKind::CodeBlock {
            return Err(PsiError::invalid_argument(format!(
                "expected a code block, got `{:?}`",
                code_block.kind()
            )));
        }
        Ok(Self {
            delegate: code_block.copy(),
        })
    }

    /// Creates statements from text without braces.
    pub fn from_text(factory: &ElementFactory, text: &str) -> Result<Self> {
        let code_block = factory.create_code_block_from_text(&format!("{{{text}}}"))?;
        Ok(Self {
            delegate: code_block,
        })
    }

    /// The first child after the opening brace.
    pub fn first_child(&self) -> Result<Element> {
        let children = self.delegate.children();
        if children.len() <= 2 {
            return Err(PsiError::invalid_state(
                "cannot provide the first child of the statements because the list is empty",
            ));
        }
        Ok(children[1].clone())
    }

    /// The last child before the closing brace.
    pub fn last_child(&self) -> Result<Element> {
        let children = self.delegate.children();
        if children.len() <= 2 {
            return Err(PsiError::invalid_state(
                "cannot provide the last child of the statements because the list is empty",
            ));
        }
        Ok(children[children.len() - 2].clone())
    }

    /// Inserts the given fragment after the last child.
    pub fn append(&self, other: &impl Fragment) -> Result<()> {
        let anchor = self.last_child()?;
        self.delegate
            .add_range_after(&other.first_element()?, &other.last_element()?, &anchor)
    }

    /// Inserts the given fragment before the first child.
    pub fn prepend(&self, other: &impl Fragment) -> Result<()> {
        let anchor = self.first_child()?;
        self.delegate
            .add_range_before(&other.first_element()?, &other.last_element()?, &anchor)
    }

    /// The source text of the wrapped block, braces included.
    pub fn text(&self) -> String {
        self.delegate.text()
    }
}

impl Fragment for Statements {
    fn first_element(&self) -> Result<Element> {
        self.first_child()
    }

    fn last_element(&self) -> Result<Element> {
        self.last_child()
    }
}

/// Adds the fragment to the destination as a range insert.
///
/// A braced destination takes the range before its closing brace, so
/// splicing into a method body lands inside the body.
pub fn add(destination: &Element, fragment: &impl Fragment) -> Result<()> {
    let first = fragment.first_element()?;
    let last = fragment.last_element()?;
    match destination.r_brace() {
        Some(r_brace) => destination.add_range_before(&first, &last, &r_brace),
        None => destination.add_range(&first, &last),
    }
}

/// Adds the fragment to the destination after the anchor.
pub fn add_after(destination: &Element, fragment: &impl Fragment, anchor: &Element) -> Result<()> {
    destination.add_range_after(
        &fragment.first_element()?,
        &fragment.last_element()?,
        anchor,
    )
}

/// Adds the fragment to the destination before the anchor.
pub fn add_before(destination: &Element, fragment: &impl Fragment, anchor: &Element) -> Result<()> {
    destination.add_range_before(
        &fragment.first_element()?,
        &fragment.last_element()?,
        anchor,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::core::PsiError;
    use crate::tree::ElementFactory;

    use super::*;

    fn factory() -> ElementFactory {
        ElementFactory::new()
    }

    #[test]
    fn test_adapter_copies_the_block() {
        let factory = factory();
        let block = factory
            .create_code_block_from_text("{ a(); b(); c(); }")
            .unwrap();
        let adapter = CodeBlockAdapter::new(&block).unwrap();

        // Deleting from the original must not show through the copy.
        let first_statement = block
            .children()
            .into_iter()
            .find(|child| child.kind() == ElementKind::Statement)
            .unwrap();
        block.remove_child(&first_statement).unwrap();
        assert!(!block.text().contains("a();"));

        assert_eq!(adapter.text(), "{ a(); b(); c(); }");
        let first = adapter.first_body_element().unwrap();
        assert_eq!(first.next_sibling().unwrap().text(), "a();");
    }

    #[test]
    fn test_empty_block_fails_on_body_accessors() {
        let adapter = CodeBlockAdapter::from_text(&factory(), "").unwrap();
        let error = adapter.first_body_element().unwrap_err();
        assert!(matches!(error, PsiError::InvalidState(_)));
        assert!(adapter.last_body_element().is_err());
    }

    #[test]
    fn test_rejects_non_block_elements() {
        let class = factory()
            .create_class_from_text("class Foo {\n}")
            .unwrap();
        assert!(CodeBlockAdapter::new(&class).is_err());
        assert!(Statements::new(&class).is_err());
    }

    #[test]
    fn test_append_and_prepend_keep_formatting() {
        let factory = factory();
        let adapter = CodeBlockAdapter::from_text(&factory, "\n    b();\n").unwrap();
        let tail = CodeBlockAdapter::from_text(&factory, "    c();\n").unwrap();
        let head = CodeBlockAdapter::from_text(&factory, "    a();\n").unwrap();

        adapter.append(&tail).unwrap();
        adapter.prepend(&head).unwrap();

        assert_eq!(adapter.text(), "{    a();\n\n    b();\n    c();\n}");
    }

    #[test]
    fn test_add_splices_into_a_method_body() {
        let factory = factory();
        let method = factory
            .create_method_from_text("void run() {\n}")
            .unwrap();
        let body = method
            .children()
            .into_iter()
            .find(|child| child.kind() == ElementKind::CodeBlock)
            .unwrap();
        let statements = Statements::from_text(&factory, "\n    int x = 1;\n    use(x);\n").unwrap();

        add(&body, &statements).unwrap();

        assert_eq!(
            method.text(),
            "void run() {\n\n    int x = 1;\n    use(x);\n}"
        );
    }

    #[test]
    fn test_add_after_and_add_before_anchor_on_existing_statements() {
        let factory = factory();
        let block = factory.create_code_block_from_text("{ b(); }").unwrap();
        let existing = block
            .children()
            .into_iter()
            .find(|child| child.kind() == ElementKind::Statement)
            .unwrap();

        let after = Statements::from_text(&factory, " c();").unwrap();
        add_after(&block, &after, &existing).unwrap();
        let before = Statements::from_text(&factory, "a(); ").unwrap();
        add_before(&block, &before, &existing).unwrap();

        assert_eq!(block.text(), "{ a(); b(); c(); }");
    }

    #[test]
    fn test_adapter_never_mutates_the_source_fragment() {
        let factory = factory();
        let adapter = CodeBlockAdapter::from_text(&factory, " a(); ").unwrap();
        let fragment = Statements::from_text(&factory, " b(); ").unwrap();

        adapter.append(&fragment).unwrap();
        adapter.append(&fragment).unwrap();

        assert_eq!(fragment.text(), "{ b(); }");
        assert_eq!(adapter.text(), "{ a();  b();  b(); }");
    }
}
