//! Serialized UI executor
//!
//! Handler bodies are submitted as jobs and run one at a time, in submission
//! order, by a single [`UiLoop`]. Submitting never blocks. The loop runs on a
//! dedicated blocking thread so a modal dialog inside a job stalls only the UI
//! context.

use parley_core::{EventCategory, ParleyError, ParleyResult};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::context::UiContext;

pub type UiJob = Box<dyn FnOnce(&mut UiContext) + Send + 'static>;

struct Submission {
    /// `None` for setup work that is not an event handler
    category: Option<EventCategory>,
    job: UiJob,
}

#[derive(Clone)]
pub struct UiExecutor {
    sender: mpsc::UnboundedSender<Submission>,
}

impl UiExecutor {
    /// Queue a handler job for `category`
    pub fn submit<F>(&self, category: EventCategory, job: F) -> ParleyResult<()>
    where
        F: FnOnce(&mut UiContext) + Send + 'static,
    {
        self.push(Some(category), Box::new(job))
    }

    /// Queue non-handler work, such as setup or inspection
    pub fn execute<F>(&self, job: F) -> ParleyResult<()>
    where
        F: FnOnce(&mut UiContext) + Send + 'static,
    {
        self.push(None, Box::new(job))
    }

    fn push(&self, category: Option<EventCategory>, job: UiJob) -> ParleyResult<()> {
        self.sender
            .send(Submission { category, job })
            .map_err(|_| ParleyError::channel_error("UI loop has stopped"))
    }
}

impl std::fmt::Debug for UiExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiExecutor")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

pub struct UiLoop {
    context: UiContext,
    receiver: mpsc::UnboundedReceiver<Submission>,
}

impl UiLoop {
    /// Run jobs until every executor handle is dropped, then hand back the
    /// context. Must be called from a blocking thread.
    pub fn run(mut self) -> UiContext {
        info!("UI loop starting");
        while let Some(Submission { category, job }) = self.receiver.blocking_recv() {
            job(&mut self.context);
            if let Some(category) = category {
                debug!("Ran {} handler", category.name());
                self.context.stats.record(category);
            }
        }
        info!(
            "UI loop stopped after {} handler jobs",
            self.context.stats.total()
        );
        self.context
    }
}

/// Create an executor and the loop that owns `context`
pub fn create_ui_executor(context: UiContext) -> (UiExecutor, UiLoop) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (UiExecutor { sender }, UiLoop { context, receiver })
}
