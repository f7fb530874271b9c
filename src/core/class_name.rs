/*!
# Class Names

A value type for fully qualified Java class names, used as the key of
the synthetic-class cache.
*/

use std::fmt;

use super::errors::{PsiError, Result};

/// A possibly qualified Java class name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassName {
    value: String,
}

impl ClassName {
    /// Creates a class name from the given string.
    ///
    /// Returns an invalid-argument error if the value is blank, contains
    /// whitespace, or starts/ends with a dot.
    pub fn of(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(PsiError::invalid_argument("a class name must not be blank"));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(PsiError::invalid_argument(format!(
                "a class name must not contain whitespace: `{value}`"
            )));
        }
        if value.starts_with('.') || value.ends_with('.') {
            return Err(PsiError::invalid_argument(format!(
                "malformed class name: `{value}`"
            )));
        }
        Ok(Self {
            value: value.to_owned(),
        })
    }

    /// The full value as supplied.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The part after the last dot, or the whole value if there is none.
    pub fn simple_name(&self) -> &str {
        match self.value.rfind('.') {
            Some(dot) => &self.value[dot + 1..],
            None => &self.value,
        }
    }

    /// The package part, or an empty string for an unqualified name.
    pub fn package_name(&self) -> &str {
        match self.value.rfind('.') {
            Some(dot) => &self.value[..dot],
            None => "",
        }
    }

    /// Tells whether the name carries a package.
    pub fn is_qualified(&self) -> bool {
        self.value.contains('.')
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
