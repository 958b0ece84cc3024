//! Backend commands queued from UI to backend worker.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    /// Carries the name field as it was when the user pressed submit.
    Submit { name: String },
    Shutdown,
}
