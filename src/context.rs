//! Everything a batch run needs, passed explicitly.
//!
//! [`RunContext`] bundles the immutable configuration with the four
//! collaborators the loop talks to: the tool, the operator, the trash and the
//! progress sink. Nothing in the library reads global terminal state.

use crate::config::BatchConfig;
use crate::confirm::Confirmer;
use crate::dispose::Disposer;
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::tool::ToolInvoker;
use std::sync::Arc;

pub struct RunContext<'a> {
    pub config: &'a BatchConfig,
    pub invoker: &'a dyn ToolInvoker,
    pub confirmer: &'a dyn Confirmer,
    pub disposer: &'a dyn Disposer,
    pub progress: ProgressCallback,
}

impl<'a> RunContext<'a> {
    pub fn new(
        config: &'a BatchConfig,
        invoker: &'a dyn ToolInvoker,
        confirmer: &'a dyn Confirmer,
        disposer: &'a dyn Disposer,
    ) -> Self {
        Self {
            config,
            invoker,
            confirmer,
            disposer,
            progress: Arc::new(NoopProgressCallback),
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }
}
