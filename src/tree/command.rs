/*!
# Command Processor

The host-side mutation processor. All tree mutations are expected to be
funneled through it so that they form a single logical command.

The processor *swallows* anything raised by the runnable, the behavior
of the host library that the `command` module exists to compensate for.
Callers should never invoke `execute_command` directly; use
[`crate::command::execute`] instead, which captures failures before the
processor can suppress them.
*/

use std::panic::{catch_unwind, AssertUnwindSafe};

/// Runs mutation closures as single logical commands.
#[derive(Debug, Default)]
pub struct CommandProcessor {
    _private: (),
}

impl CommandProcessor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Executes the runnable as one command, suppressing any panic it
    /// raises. The suppression is logged, not propagated.
    pub fn execute_command<F: FnOnce()>(&self, runnable: F) {
        let outcome = catch_unwind(AssertUnwindSafe(runnable));
        if outcome.is_err() {
            tracing::error!("a command raised an error; the command processor suppressed it");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_swallows_panics() {
        let processor = CommandProcessor::new();
        // Must not propagate.
        processor.execute_command(|| panic!("lost to the void"));
    }

    #[test]
    fn test_processor_runs_the_command() {
        let processor = CommandProcessor::new();
        let mut ran = false;
        processor.execute_command(|| ran = true);
        assert!(ran);
    }
}
