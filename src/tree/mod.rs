/*!
# Tree Module

The mutable element tree the rest of the engine works against, together
with the factory creating detached elements from text and the command
processor serializing mutations.

Everything above this module treats [`Element`] as an opaque handle:
copy, traversal and range inserts are the whole contract.
*/

pub mod command;
pub mod element;
pub mod factory;

pub use command::CommandProcessor;
pub use element::{Element, ElementKind};
pub use factory::ElementFactory;
