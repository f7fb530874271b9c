/*!
# Command Execution

Runs a batch of tree mutations as one logical command, surfacing
failures the underlying command processor is known to swallow.

The processor catches everything the command raises and only logs it,
so a caller cannot tell a failed mutation from a successful one. The
functions here capture the failure before the processor can swallow it
and hand it to an error handler after the command completes. The
default handler rethrows, restoring normal propagation.
*/

use std::any::Any;
use std::cell::RefCell;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::rc::Rc;

use crate::env::Project;

/// A failure captured from inside a command.
pub enum CommandFailure {
    /// The command returned an error.
    Error(anyhow::Error),
    /// The command panicked; the payload is the panic value.
    Panic(Box<dyn Any + Send>),
}

impl std::fmt::Debug for CommandFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandFailure::Error(error) => f.debug_tuple("Error").field(error).finish(),
            CommandFailure::Panic(_) => f.write_str("Panic(..)"),
        }
    }
}

/// Executes the command as a single mutation command on the project's
/// processor, rethrowing any captured failure.
pub fn execute<F>(project: &Project, command: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    execute_with_handler(project, rethrow, command)
}

/// Executes the command, passing a captured failure to `handler`
/// instead of rethrowing.
///
/// The command runs as exactly one processor invocation, whether or
/// not it fails.
pub fn execute_with_handler<H, F>(project: &Project, handler: H, command: F) -> anyhow::Result<()>
where
    H: FnOnce(CommandFailure) -> anyhow::Result<()>,
    F: FnOnce() -> anyhow::Result<()>,
{
    let captured: Rc<RefCell<Option<CommandFailure>>> = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&captured);
    project.command_processor().execute_command(move || {
        let failure = match catch_unwind(AssertUnwindSafe(command)) {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some(CommandFailure::Error(error)),
            Err(payload) => Some(CommandFailure::Panic(payload)),
        };
        *slot.borrow_mut() = failure;
    });
    let failure = captured.borrow_mut().take();
    match failure {
        Some(failure) => handler(failure),
        None => Ok(()),
    }
}

/// The default error handler: errors propagate, panics resume
/// unwinding.
pub fn rethrow(failure: CommandFailure) -> anyhow::Result<()> {
    match failure {
        CommandFailure::Error(error) => Err(error),
        CommandFailure::Panic(payload) => resume_unwind(payload),
    }
}
