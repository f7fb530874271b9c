/*!
# Element Factory

Whitespace-sensitive creation of elements from source text.

The factory mirrors the creation surface of the host PSI: blocks must be
created with their braces, classes and methods from full declaration
text, and Javadoc lines with strict single-line input. The created
elements are detached trees, ready to be inserted with the copying
`add_*` operations.
*/

use crate::core::{PsiError, Result};
use crate::parser::grammar;
use crate::parser::lexer::tokenize;

use super::element::{Element, ElementKind};

/// Creates detached elements from Java source fragments.
#[derive(Debug, Clone, Default)]
pub struct ElementFactory {
    _private: (),
}

impl ElementFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a code block from text that includes the braces,
    /// for example `"{ a(); }"`.
    pub fn create_code_block_from_text(&self, text: &str) -> Result<Element> {
        let tokens = tokenize(text)?;
        grammar::parse_block(&tokens)
    }

    /// Creates a class from full declaration text,
    /// for example `"public static class Bar { }"`.
    pub fn create_class_from_text(&self, text: &str) -> Result<Element> {
        let members = grammar::parse_members(&tokenize(text)?)?;
        members
            .into_iter()
            .find(|m| m.kind() == ElementKind::Class)
            .ok_or_else(|| {
                PsiError::invalid_argument(format!("the text declares no class: `{text}`"))
            })
    }

    /// Creates a method (or constructor) from full declaration text.
    pub fn create_method_from_text(&self, text: &str) -> Result<Element> {
        let members = grammar::parse_members(&tokenize(text)?)?;
        members
            .into_iter()
            .find(|m| m.kind() == ElementKind::Method)
            .ok_or_else(|| {
                PsiError::invalid_argument(format!("the text declares no method: `{text}`"))
            })
    }

    /// Creates a field declaration `private <ty> <name>;`.
    ///
    /// The name must be a simple identifier: non-blank, unqualified,
    /// no whitespace.
    pub fn create_field(&self, name: &str, ty: &str) -> Result<Element> {
        require_simple_name(name)?;
        let members = grammar::parse_members(&tokenize(&format!("private {ty} {name};"))?)?;
        members
            .into_iter()
            .find(|m| m.kind() == ElementKind::Field)
            .ok_or_else(|| {
                PsiError::invalid_argument(format!(
                    "cannot create a field named `{name}` of type `{ty}`"
                ))
            })
    }

    /// Creates a single-line Javadoc comment.
    ///
    /// Rejects empty and multi-line input with invalid-argument errors.
    pub fn create_javadoc(&self, line: &str) -> Result<Element> {
        if line.is_empty() {
            return Err(PsiError::invalid_argument(
                "unable to create a Javadoc comment with an empty text",
            ));
        }
        if line.contains('\n') || line.contains('\r') {
            return Err(PsiError::invalid_argument(
                "a single-line Javadoc comment must not contain line separators",
            ));
        }
        Ok(Element::new_leaf(
            ElementKind::DocComment,
            format!("/** {line} */"),
        ))
    }

    /// Creates a private no-argument constructor for the given class,
    /// optionally preceded by a single-line Javadoc comment.
    ///
    /// Useful for utility classes that must not be instantiated.
    pub fn create_private_constructor(
        &self,
        class: &Element,
        javadoc_line: Option<&str>,
    ) -> Result<Element> {
        let class_name = class.name().ok_or_else(|| {
            PsiError::invalid_argument("cannot create a constructor for an anonymous class")
        })?;
        let ctor = self.create_method_from_text(&format!("private {class_name}() {{\n}}"))?;
        if let Some(line) = javadoc_line {
            let javadoc = self.create_javadoc(line)?;
            let first = ctor.first_child().ok_or_else(|| {
                PsiError::invalid_state("a created constructor must not be empty")
            })?;
            let added = ctor.add_before(&javadoc, &first)?;
            ctor.add_after(&Element::new_leaf(ElementKind::Whitespace, "\n"), &added)?;
        }
        Ok(ctor)
    }
}

fn require_simple_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PsiError::invalid_argument("a member name must not be blank"));
    }
    if name.contains('.') {
        return Err(PsiError::invalid_argument(format!(
            "a simple name is required, got qualified `{name}`"
        )));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(PsiError::invalid_argument(format!(
            "a member name must not contain whitespace: `{name}`"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_create_code_block() {
        let factory = ElementFactory::new();
        let block = factory.create_code_block_from_text("{ a(); b(); }").unwrap();
        assert_eq!(block.kind(), ElementKind::CodeBlock);
        assert_eq!(block.text(), "{ a(); b(); }");
    }

    #[test]
    fn test_block_requires_braces() {
        let factory = ElementFactory::new();
        assert!(factory.create_code_block_from_text("a();").is_err());
    }

    #[test]
    fn test_create_class() {
        let factory = ElementFactory::new();
        let class = factory
            .create_class_from_text("public static class Bar { }")
            .unwrap();
        assert_eq!(class.kind(), ElementKind::Class);
        assert_eq!(class.name(), Some("Bar"));
    }

    #[test]
    fn test_create_field() {
        let factory = ElementFactory::new();
        let field = factory.create_field("count", "long").unwrap();
        assert_eq!(field.kind(), ElementKind::Field);
        assert_eq!(field.name(), Some("count"));
        assert_eq!(field.text(), "private long count;");
    }

    #[test]
    fn test_field_name_must_be_simple() {
        let factory = ElementFactory::new();
        assert!(factory.create_field("", "long").is_err());
        assert!(factory.create_field("com.acme.count", "long").is_err());
        assert!(factory.create_field("a b", "long").is_err());
    }

    #[test]
    fn test_create_javadoc() {
        let factory = ElementFactory::new();
        let javadoc = factory.create_javadoc("Does nothing.").unwrap();
        assert_eq!(javadoc.text(), "/** Does nothing. */");
    }

    #[test]
    fn test_javadoc_rejects_empty_and_multiline() {
        let factory = ElementFactory::new();
        assert!(factory.create_javadoc("").is_err());
        assert!(factory.create_javadoc("one\ntwo").is_err());
    }

    #[test]
    fn test_create_private_constructor() {
        let factory = ElementFactory::new();
        let class = factory
            .create_class_from_text("public final class Util { }")
            .unwrap();
        let ctor = factory
            .create_private_constructor(&class, Some("Prevents instantiation."))
            .unwrap();
        assert_eq!(ctor.kind(), ElementKind::Method);
        assert_eq!(ctor.name(), Some("Util"));
        let text = ctor.text();
        assert!(text.starts_with("/** Prevents instantiation. */\n"));
        assert!(text.contains("private Util() {"));
    }
}
