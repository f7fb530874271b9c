/*!
# Synthetic Type Resolver

Resolves qualified type names against registered source files, and
synthesizes placeholder declarations when no real one exists, so that
references to types outside the available classpath still resolve to a
structurally valid class.

Resolution is soft: a name that cannot plausibly be a class answers
`None` instead of failing. Two heuristics gate synthesis: the name must
carry a package, and the simple name must start with an uppercase
letter. The heuristics misclassify lowercase class names and uppercase
constants; they are kept as-is because the alternative needs classpath
knowledge this engine does not have.
*/

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::cache::LruCache;
use crate::core::ClassName;
use crate::parser::{self, Parser};
use crate::tree::{Element, ElementFactory};

/// Capacity of the synthetic placeholder cache.
pub const SYNTHETIC_CLASS_LIMIT: usize = 300;

/// Entry point for class resolution.
///
/// Real declarations are registered with [`register_file`][Self::register_file]
/// and always win over synthesis. Placeholders live in a bounded
/// recency cache, so repeated resolution of the same name observes the
/// same tree node.
pub struct PsiFacade {
    parser: Parser,
    factory: ElementFactory,
    index: RefCell<HashMap<ClassName, Element>>,
    synthetic: RefCell<LruCache<ClassName, SyntheticClass>>,
}

impl PsiFacade {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            factory: ElementFactory::new(),
            index: RefCell::new(HashMap::new()),
            synthetic: RefCell::new(LruCache::new(SYNTHETIC_CLASS_LIMIT)),
        }
    }

    /// Registers the top-level class of a parsed file under its
    /// qualified name, making it resolvable as a real declaration.
    pub fn register_file(&self, file: &Element) -> crate::core::Result<()> {
        let class = parser::top_level_class(file)?;
        let qualified = qualified_name_of(file, &class)?;
        debug!(class = %qualified, "registered real declaration");
        self.index.borrow_mut().insert(qualified, class);
        Ok(())
    }

    /// Resolves a qualified name to a class.
    ///
    /// Answers `None` when the name carries no package, when the simple
    /// name does not start with an uppercase letter, or when placeholder
    /// synthesis fails. Registered declarations bypass the heuristics.
    pub fn find_class(&self, qualified_name: &str) -> Option<ResolvedClass> {
        let name = ClassName::of(qualified_name).ok()?;
        if let Some(real) = self.index.borrow().get(&name) {
            return Some(ResolvedClass::Real(real.clone()));
        }
        if !name.is_qualified() {
            return None;
        }
        if !starts_uppercase(name.simple_name()) {
            return None;
        }

        let mut cache = self.synthetic.borrow_mut();
        if let Some(hit) = cache.get(&name) {
            return Some(ResolvedClass::Synthetic(hit));
        }
        let created = match self.synthesize(&name) {
            Ok(class) => class,
            Err(error) => {
                warn!(class = %name, "placeholder synthesis failed: {error:#}");
                return None;
            }
        };
        cache.put(name, created.clone());
        Some(ResolvedClass::Synthetic(created))
    }

    fn synthesize(&self, name: &ClassName) -> anyhow::Result<SyntheticClass> {
        debug!(class = %name, "synthesizing placeholder class");
        let source = format!(
            "package {};\n\npublic class {} {{\n}}",
            name.package_name(),
            name.simple_name()
        );
        let file = self.parser.parse(&source)?;
        let class = parser::top_level_class(&file)?;
        Ok(SyntheticClass::new(class, self.factory.clone()))
    }
}

impl Default for PsiFacade {
    fn default() -> Self {
        Self::new()
    }
}

/// The outcome of a successful resolution.
#[derive(Clone)]
pub enum ResolvedClass {
    /// A declaration registered from real source.
    Real(Element),
    /// A synthesized placeholder.
    Synthetic(SyntheticClass),
}

impl ResolvedClass {
    pub fn element(&self) -> &Element {
        match self {
            ResolvedClass::Real(element) => element,
            ResolvedClass::Synthetic(class) => class.element(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, ResolvedClass::Synthetic(_))
    }

    /// Looks up a nested class. Only synthetic placeholders create one
    /// on a miss; for real declarations a miss is final.
    pub fn find_inner_class_by_name(&self, name: &str, check_bases: bool) -> Option<Element> {
        match self {
            ResolvedClass::Real(element) => element.find_inner_class(name),
            ResolvedClass::Synthetic(class) => class.find_inner_class_by_name(name, check_bases),
        }
    }

    /// Looks up a field, mirroring
    /// [`find_inner_class_by_name`][Self::find_inner_class_by_name].
    pub fn find_field_by_name(&self, name: &str, check_bases: bool) -> Option<Element> {
        match self {
            ResolvedClass::Real(element) => element.find_field(name),
            ResolvedClass::Synthetic(class) => class.find_field_by_name(name, check_bases),
        }
    }
}

/// A placeholder class whose members materialize on first lookup.
///
/// Lookups re-check the tree before synthesizing, so each member is
/// created at most once and repeated lookups return the same node.
#[derive(Clone)]
pub struct SyntheticClass {
    class: Element,
    factory: ElementFactory,
}

impl SyntheticClass {
    fn new(class: Element, factory: ElementFactory) -> Self {
        Self { class, factory }
    }

    pub fn element(&self) -> &Element {
        &self.class
    }

    /// Returns the nested class with the given name, synthesizing an
    /// empty one just before the closing brace when the name starts
    /// with an uppercase letter. Lowercase names answer `None`.
    pub fn find_inner_class_by_name(&self, name: &str, _check_bases: bool) -> Option<Element> {
        if let Some(existing) = self.class.find_inner_class(name) {
            return Some(existing);
        }
        if !starts_uppercase(name) {
            return None;
        }
        let nested = self
            .factory
            .create_class_from_text(&format!("public static class {name} {{\n}}"))
            .ok()?;
        self.insert_member(&nested)
    }

    /// Returns the field with the given name, synthesizing one of a
    /// default numeric type when the name starts with a lowercase
    /// letter. Uppercase names answer `None`.
    pub fn find_field_by_name(&self, name: &str, _check_bases: bool) -> Option<Element> {
        if let Some(existing) = self.class.find_field(name) {
            return Some(existing);
        }
        if name.chars().next().map_or(true, |c| !c.is_lowercase()) {
            return None;
        }
        let field = self.factory.create_field(name, "long").ok()?;
        self.insert_member(&field)
    }

    fn insert_member(&self, member: &Element) -> Option<Element> {
        let r_brace = self.class.r_brace()?;
        let inserted = self.class.add_before(member, &r_brace).ok()?;
        let newline = Element::new_leaf(
            crate::tree::ElementKind::Whitespace,
            "\n",
        );
        self.class.add_before(&newline, &r_brace).ok()?;
        Some(inserted)
    }
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_uppercase)
}

fn qualified_name_of(file: &Element, class: &Element) -> crate::core::Result<ClassName> {
    let simple = class
        .name()
        .ok_or_else(|| crate::core::PsiError::invalid_argument("class has no name"))?
        .to_owned();
    let package = file
        .children()
        .into_iter()
        .find(|child| child.kind() == crate::tree::ElementKind::PackageStatement)
        .and_then(|statement| statement.name().map(str::to_owned));
    let qualified = match package {
        Some(package) => format!("{package}.{simple}"),
        None => simple,
    };
    ClassName::of(&qualified)
}
