/*!
# Environment

The context for working with PSI trees without a running IDE.

An [`Environment`] is constructed explicitly by the hosting application
and passed to the components that need it; there is no process-wide
singleton. Call [`Environment::setup`] before use; [`Environment::close`]
releases everything registered with the disposal root.

The one-time *process-wide* registration (headless flag and tree-library
tuning properties) runs under a `std::sync::Once`, so concurrent setup
of several environments performs it exactly once. An individual
`Environment` is thread-confined: the element tree uses non-atomic
handles, which the compiler enforces.
*/

use std::cell::RefCell;
use std::env;
use std::rc::Rc;
use std::sync::Once;

use crate::core::{PsiError, Result};
use crate::parser::Parser;
use crate::resolve::PsiFacade;
use crate::tree::{CommandProcessor, ElementFactory};
use crate::vfs::JrtFileSystem;

static REGISTRATION: Once = Once::new();

/// Registers the process-wide properties the tree machinery expects.
///
/// Runs at most once per process, no matter how many environments are
/// set up.
fn register_process_properties() {
    REGISTRATION.call_once(|| {
        set_if_unset("JAVA_PSI_HEADLESS", "true");
        env::set_var("JAVA_PSI_TRACK_INVALIDATION", "true");
        env::set_var("JAVA_PSI_REPARSE_DEPTH_LIMIT", "1000");
        tracing::debug!("process-wide PSI properties registered");
    });
}

fn set_if_unset(key: &str, value: &str) {
    if env::var_os(key).is_none() {
        env::set_var(key, value);
    }
}

/// A disposal root. Resources register cleanup actions here; disposing
/// the root runs them all, newest first.
#[derive(Default)]
pub struct Disposer {
    actions: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Disposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cleanup action to run on disposal.
    pub fn register(&self, action: impl FnOnce() + 'static) {
        self.actions.borrow_mut().push(Box::new(action));
    }

    /// Runs all registered actions. Idempotent: a second call finds
    /// nothing left to run.
    pub fn dispose(&self) {
        let mut actions = self.actions.take();
        while let Some(action) = actions.pop() {
            action();
        }
    }
}

struct ProjectData {
    command_processor: CommandProcessor,
    file_system: JrtFileSystem,
    facade: PsiFacade,
}

/// The top-level handle for obtaining parsers and factories.
///
/// Cheap to clone; clones refer to the same project. Identity is
/// observable through [`Project::same_as`].
#[derive(Clone)]
pub struct Project(Rc<ProjectData>);

impl Project {
    fn new() -> Self {
        Self(Rc::new(ProjectData {
            command_processor: CommandProcessor::new(),
            file_system: JrtFileSystem::new(),
            facade: PsiFacade::new(),
        }))
    }

    /// The element factory bound to this project.
    pub fn element_factory(&self) -> ElementFactory {
        ElementFactory::new()
    }

    /// A parser bound to this project.
    pub fn parser(&self) -> Parser {
        Parser::new()
    }

    /// The mutation processor of this project.
    pub fn command_processor(&self) -> &CommandProcessor {
        &self.0.command_processor
    }

    /// The virtual filesystem over packed runtime images.
    pub fn jrt_file_system(&self) -> &JrtFileSystem {
        &self.0.file_system
    }

    /// The class resolution facade of this project.
    pub fn psi_facade(&self) -> &PsiFacade {
        &self.0.facade
    }

    /// Tells whether both handles refer to the same project.
    pub fn same_as(&self, other: &Project) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

struct EnvState {
    project: Project,
    root: Disposer,
}

/// An environment for working with PSI trees.
#[derive(Default)]
pub struct Environment {
    state: RefCell<Option<EnvState>>,
}

impl Environment {
    /// Creates a closed environment. Call [`setup`][Self::setup] before
    /// obtaining the project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the environment, making it open.
    ///
    /// A no-op when already open, so repeated calls are allowed.
    pub fn setup(&self) {
        if self.is_open() {
            return;
        }
        register_process_properties();
        let root = Disposer::new();
        let project = Project::new();
        root.register(|| tracing::debug!("PSI project disposed"));
        *self.state.borrow_mut() = Some(EnvState { project, root });
        tracing::debug!("PSI environment is set up");
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// The project initialized in this environment.
    ///
    /// Fails with an invalid-state error before `setup()` or after
    /// `close()`.
    pub fn project(&self) -> Result<Project> {
        self.state
            .borrow()
            .as_ref()
            .map(|s| s.project.clone())
            .ok_or_else(|| {
                PsiError::invalid_state(
                    "the PSI environment is not set up; call `setup()` before use",
                )
            })
    }

    /// The element factory of the current project.
    pub fn element_factory(&self) -> Result<ElementFactory> {
        Ok(self.project()?.element_factory())
    }

    /// A parser bound to the current project.
    pub fn parser(&self) -> Result<Parser> {
        Ok(self.project()?.parser())
    }

    /// Disposes the root, cascading to every registered resource, and
    /// clears the project handle. Idempotent.
    pub fn close(&self) {
        if let Some(state) = self.state.borrow_mut().take() {
            state.root.dispose();
            tracing::debug!("PSI environment closed");
        }
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_idempotent() {
        let env = Environment::new();
        env.setup();
        let first = env.project().unwrap();
        env.setup();
        let second = env.project().unwrap();
        assert!(first.same_as(&second));
    }

    #[test]
    fn test_project_before_setup_fails() {
        let env = Environment::new();
        assert!(matches!(env.project(), Err(PsiError::InvalidState(_))));
    }

    #[test]
    fn test_close_makes_project_inaccessible() {
        let env = Environment::new();
        env.setup();
        assert!(env.project().is_ok());

        env.close();
        assert!(matches!(env.project(), Err(PsiError::InvalidState(_))));
        // A second close is a no-op.
        env.close();
        assert!(!env.is_open());
    }

    #[test]
    fn test_reopen_creates_a_fresh_project() {
        let env = Environment::new();
        env.setup();
        let first = env.project().unwrap();
        env.close();
        env.setup();
        let second = env.project().unwrap();
        assert!(!first.same_as(&second));
    }

    #[test]
    fn test_disposer_runs_actions_once() {
        let ran = Rc::new(RefCell::new(0));
        let disposer = Disposer::new();
        let counter = ran.clone();
        disposer.register(move || *counter.borrow_mut() += 1);
        disposer.dispose();
        disposer.dispose();
        assert_eq!(*ran.borrow(), 1);
    }
}
