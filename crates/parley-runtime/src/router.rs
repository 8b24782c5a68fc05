//! Router Builder API
//!
//! Wires the event queue, dispatcher and UI loop together. The
//! [`RouterHandle`] is the explicit owner of the running router: producers get
//! senders from it, and shutting it down drains the queue and returns the UI
//! context.

use std::sync::Arc;

use parley_core::{ParleyError, ParleyResult, RouterConfig};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use crate::account::{Account, AccountRegistry};
use crate::context::UiContext;
use crate::dispatch::{DispatchStats, Dispatcher};
use crate::executor::{create_ui_executor, UiExecutor};
use crate::queue::{create_event_queue, EventSender};
use crate::reconnect::Reconnector;
use crate::ui::{AccountConnector, UiSurface};

// ----------------------------------------------------------------------------
// Router Builder
// ----------------------------------------------------------------------------

pub struct RouterBuilder {
    config: RouterConfig,
    surface: Option<Box<dyn UiSurface>>,
    connector: Option<Arc<dyn AccountConnector>>,
    accounts: Vec<Account>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            config: RouterConfig::default(),
            surface: None,
            connector: None,
            accounts: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_surface(mut self, surface: Box<dyn UiSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_connector(mut self, connector: Arc<dyn AccountConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn add_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    /// Start the dispatcher and the UI loop. Must be called inside a tokio
    /// runtime.
    pub fn start(self) -> ParleyResult<RouterHandle> {
        self.config.validate()?;
        let surface = self
            .surface
            .ok_or_else(|| ParleyError::config_error("router needs a UI surface"))?;
        let connector = self
            .connector
            .ok_or_else(|| ParleyError::config_error("router needs an account connector"))?;
        let runtime = Handle::try_current()
            .map_err(|e| ParleyError::config_error(format!("no tokio runtime: {}", e)))?;

        let mut registry = AccountRegistry::new();
        for account in self.accounts {
            registry.add(account)?;
        }

        let reconnector = Reconnector::new(self.config.reconnect.clone(), connector, runtime);
        let context = UiContext::new(registry, surface, reconnector);

        let (events, receiver) = create_event_queue(&self.config.channels);
        let (executor, ui_loop) = create_ui_executor(context);

        let ui_task = tokio::task::spawn_blocking(move || ui_loop.run());
        let dispatch_task = tokio::spawn(Dispatcher::new(receiver, executor.clone()).run());

        info!(
            "Router started (queue capacity {})",
            self.config.channels.event_buffer_size
        );
        Ok(RouterHandle {
            events,
            executor,
            dispatch_task,
            ui_task,
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// Router Handle
// ----------------------------------------------------------------------------

pub struct RouterHandle {
    events: EventSender,
    executor: UiExecutor,
    dispatch_task: JoinHandle<DispatchStats>,
    ui_task: JoinHandle<UiContext>,
}

impl RouterHandle {
    /// A sender for one producer
    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    /// Run `f` on the UI context, after every job already scheduled
    pub async fn with_context<F, R>(&self, f: F) -> ParleyResult<R>
    where
        F: FnOnce(&mut UiContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        self.executor.execute(move |ctx| {
            let _ = reply.send(f(ctx));
        })?;
        result
            .await
            .map_err(|_| ParleyError::channel_error("UI loop dropped the request"))
    }

    /// Stop accepting events, drain the queue, wait for every scheduled
    /// handler, and return the final state. Completes once all producer
    /// senders have been dropped.
    pub async fn shutdown(self) -> ParleyResult<(DispatchStats, UiContext)> {
        let RouterHandle {
            events,
            executor,
            dispatch_task,
            ui_task,
        } = self;
        drop(events);

        let stats = dispatch_task
            .await
            .map_err(|e| ParleyError::channel_error(format!("dispatcher failed: {}", e)))?;
        drop(executor);

        let context = ui_task
            .await
            .map_err(|e| ParleyError::channel_error(format!("UI loop failed: {}", e)))?;
        info!("Router stopped");
        Ok((stats, context))
    }
}
