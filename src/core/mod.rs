/*!
# Core Module

Shared building blocks of the engine: the error taxonomy and
the `ClassName` value type.
*/

pub mod class_name;
pub mod errors;

pub use class_name::ClassName;
pub use errors::{PsiError, Result};
