//! Console actions
//!
//! Actions produced by the console state machine for the runtime to execute.

/// Actions produced by [`crate::Console`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    /// Redraw the screen.
    Render,

    /// Leave the console loop.
    Quit,
}
