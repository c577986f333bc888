use crate::error::Result;
use crate::run_log::RunLog;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::warn;
use std::future::Future;

/// Undoes one creation. Built when an object is created and invoked at most once.
pub struct CleanupAction {
    description: String,
    action: Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>,
}

impl CleanupAction {
    pub fn new<S, F, Fut>(description: S, action: F) -> Self
    where
        S: Into<String>,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            description: description.into(),
            action: Box::new(move || action().boxed()),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(self) -> Result<()> {
        (self.action)().await
    }
}

impl std::fmt::Debug for CleanupAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupAction")
            .field("description", &self.description)
            .finish()
    }
}

/// The cleanup actions registered while running one CR, in creation order.
#[derive(Debug, Default)]
pub struct CleanupRegistry {
    actions: Vec<CleanupAction>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: CleanupAction) {
        self.actions.push(action)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Descriptions of the pending actions in creation order.
    pub fn descriptions(&self) -> Vec<&str> {
        self.actions.iter().map(CleanupAction::description).collect()
    }

    /// Invoke every pending action, most recent first. A failing action is logged and the
    /// remaining actions still run. Returns the number of actions that failed; the registry is
    /// empty afterwards.
    pub async fn run(&mut self, log: &RunLog) -> usize {
        let mut failures = 0;
        while let Some(action) = self.actions.pop() {
            let description = action.description.clone();
            log.debug(format!("Cleaning up {}", description));
            if let Err(e) = action.invoke().await {
                log.error(format!("Failed to clean up {}: {}", description, e));
                failures += 1;
            }
        }
        failures
    }
}

impl Drop for CleanupRegistry {
    fn drop(&mut self) {
        if !self.actions.is_empty() {
            warn!(
                "{} cleanup action(s) were never run: {}",
                self.actions.len(),
                self.descriptions().join(", ")
            );
        }
    }
}
