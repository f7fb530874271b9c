/*!
# Java Source Parser

Converts UTF-8 Java source into element trees.

Source arrives either as an in-memory string or as a `.java` file on the
local filesystem. In-memory parses get a synthetic, unique file name, so
callers can parse many fragments without clashes.
*/

pub mod grammar;
pub mod lexer;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::core::PsiError;
use crate::tree::{Element, ElementKind};

/// The extension of Java source files.
pub const FILE_SUFFIX: &str = ".java";

/// Parses Java source text and files into `File` elements.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    _private: (),
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the given source text into a `File` element with an
    /// auto-generated name. Nothing is written to disk.
    pub fn parse(&self, java_source: &str) -> Result<Element> {
        let file_name = format!("__to_parse_{}__{}", Uuid::new_v4(), FILE_SUFFIX);
        let tokens = lexer::tokenize(java_source).context("lexical analysis failed")?;
        grammar::parse_file(&tokens, &file_name).context("syntax analysis failed")
    }

    /// Parses the given `.java` file.
    ///
    /// Fails with an invalid-argument error if the path has a different
    /// extension or the file does not exist.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Element> {
        let path = path.as_ref();
        if !path.to_string_lossy().ends_with(FILE_SUFFIX) {
            return Err(PsiError::invalid_argument(format!(
                "the file `{}` must have the `{FILE_SUFFIX}` extension",
                path.display()
            ))
            .into());
        }
        if !path.exists() {
            return Err(PsiError::invalid_argument(format!(
                "the file `{}` does not exist",
                path.display()
            ))
            .into());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FILE_SUFFIX.to_owned());
        let tokens = lexer::tokenize(&content).context("lexical analysis failed")?;
        grammar::parse_file(&tokens, &file_name)
            .with_context(|| format!("failed to parse `{}`", path.display()))
    }
}

/// The first class declared in the given file element.
///
/// Fails with an invalid-state error when the file declares no class.
pub fn top_level_class(file: &Element) -> crate::core::Result<Element> {
    file.children()
        .into_iter()
        .find(|c| c.kind() == ElementKind::Class)
        .ok_or_else(|| {
            PsiError::invalid_state(format!(
                "the file `{}` does not declare a class",
                file.name().unwrap_or("<unnamed>")
            ))
        })
}
