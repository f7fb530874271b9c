/*!
# Java PSI Engine

Headless engine for parsing and mutating Java source trees, with a
virtual filesystem over packed runtime images and a synthetic resolver
for types outside the available classpath.

## Core Features

- **Environment lifecycle** with idempotent `setup()`/`close()` and an
  invalid-state error for use outside the open window
- **Lossless Java parsing** into element trees that keep whitespace and
  comments, so edited trees print back as valid source
- **Virtual runtime-image filesystem** serving `<home>!<innerPath>`
  paths from a packed module image without unpacking it to disk
- **Synthetic type resolver** with a bounded recency cache, creating
  placeholder classes, nested classes, and fields on demand
- **Splice adapters** moving statement runs between trees as range
  inserts that preserve formatting tokens
- **Command execution** surfacing errors the underlying command
  processor swallows

## Architecture

```text
java-psi
├── core      - Error types, class names
├── parser    - Lexer, structural grammar, file parsing
├── tree      - Element trees, factory, command processor
├── env       - Environment, project, disposer
├── vfs       - Runtime-image filesystem (jrt)
├── cache     - Bounded LRU cache
├── resolve   - Synthetic type resolver
├── splice    - Block and statement splice adapters
└── command   - Mutation command wrapper
```

## Usage

```rust
use java_psi::{execute, Environment};

let env = Environment::new();
env.setup();
let project = env.project()?;

let file = project.parser().parse("public class Foo {\n    void run() {\n    }\n}")?;
execute(&project, || {
    let class = java_psi::top_level_class(&file)?;
    let factory = project.element_factory();
    let ctor = factory.create_private_constructor(&class, Some("Prevents instantiation."))?;
    let r_brace = class.r_brace().expect("a class body has braces");
    class.add_before(&ctor, &r_brace)?;
    Ok(())
})?;

env.close();
# Ok::<(), anyhow::Error>(())
```
*/

pub mod cache;
pub mod command;
pub mod core;
pub mod env;
pub mod parser;
pub mod resolve;
pub mod splice;
pub mod tree;
pub mod vfs;

// Re-export main types for convenience
pub use crate::core::{ClassName, PsiError};
pub use command::{execute, execute_with_handler, CommandFailure};
pub use env::{Environment, Project};
pub use parser::{top_level_class, Parser};
pub use resolve::{PsiFacade, ResolvedClass};
pub use splice::{CodeBlockAdapter, Statements};
pub use tree::{Element, ElementFactory, ElementKind};
pub use vfs::{JrtFileSystem, JrtVirtualFile};
