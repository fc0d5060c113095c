use std::sync::Arc;
use tokio::sync::oneshot;

/// Load state reported by a script element that has no completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Uninitialized,
    Loading,
    Loaded,
    Interactive,
    Complete,
}

impl ReadyState {
    /// `loaded` and `complete` are the states after which the script has run.
    pub fn is_ready(self) -> bool {
        matches!(self, ReadyState::Loaded | ReadyState::Complete)
    }
}

pub type ReadyStateProbe = Arc<dyn Fn() -> ReadyState + Send + Sync>;
pub type SheetProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// How an installed script reports that it finished loading.
pub enum ScriptLoad {
    /// Fires once when the script has loaded. A dropped sender means the load
    /// never completes.
    Event(oneshot::Receiver<()>),
    /// No completion event; the loader polls the ready state instead.
    Polled(ReadyStateProbe),
}

/// The environment the loader installs resources into.
pub trait Host: Send + Sync {
    /// Whether the mount target for scripts and styles exists yet.
    fn head_available(&self) -> bool;

    /// Start loading a script. Only called while the head is available.
    fn append_script(&self, url: &str) -> ScriptLoad;

    /// Start loading a stylesheet. The probe turns true once its rules are queryable.
    fn append_style(&self, url: &str) -> SheetProbe;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_states() {
        assert!(!ReadyState::Uninitialized.is_ready());
        assert!(!ReadyState::Loading.is_ready());
        assert!(!ReadyState::Interactive.is_ready());
        assert!(ReadyState::Loaded.is_ready());
        assert!(ReadyState::Complete.is_ready());
    }
}
