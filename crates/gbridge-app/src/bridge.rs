//! Request/response bridge between the native shell and the app's UI layer
//!
//! One long-lived registration point maps method names to handlers. Every
//! invocation terminates in exactly one result: the handler's success value,
//! or a distinguished "not implemented" signal for unknown methods. Nothing
//! crosses the boundary as an error or a panic.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use gbridge_core::prelude::*;

/// Channel name the native shell and the UI layer agree on
pub const CHANNEL_NAME: &str = "guardian_bridge/widget";

/// The one recognized command in this core
pub const METHOD_TRIGGER_SOS: &str = "triggerSOS";

/// Success value returned by the SOS command
pub const SOS_TRIGGERED: &str = "SOS triggered";

/// The single terminal result of one bridge invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodResult {
    /// The registered handler ran and produced this value
    Success(Value),
    /// No handler is registered under the invoked method name
    NotImplemented,
}

impl MethodResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MethodResult::Success(_))
    }
}

/// A registered command handler.
///
/// Handlers are infallible by contract: a domain failure belongs inside the
/// handler's result value, never in an error crossing the bridge.
type MethodHandler = Box<dyn Fn(&Value) -> Value + Send + Sync>;

/// The single long-lived registration point inside the primary application.
///
/// Native-shell-origin calls (via [`ChannelClient`]) and in-app calls (via
/// [`MethodChannel::invoke`]) resolve through the same handler table.
pub struct MethodChannel {
    name: String,
    handlers: RwLock<HashMap<String, MethodHandler>>,
}

impl MethodChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register (or replace) the handler for `method`
    pub fn register<F>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let method = method.into();
        debug!("registering handler for {}/{method}", self.name);
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method, Box::new(handler));
    }

    /// Resolve one invocation to its single result
    pub fn invoke(&self, method: &str, args: &Value) -> MethodResult {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        match handlers.get(method) {
            Some(handler) => {
                debug!("invoking {}/{method}", self.name);
                MethodResult::Success(handler(args))
            }
            None => {
                warn!("no handler for {}/{method}", self.name);
                MethodResult::NotImplemented
            }
        }
    }
}

/// One shell-origin invocation in flight
#[derive(Debug)]
pub struct ChannelCall {
    pub method: String,
    pub args: Value,
    reply: oneshot::Sender<MethodResult>,
}

/// Shell-side sender for bridge invocations.
///
/// `call` suspends the caller until the single result arrives.
#[derive(Clone)]
pub struct ChannelClient {
    tx: mpsc::UnboundedSender<ChannelCall>,
}

impl ChannelClient {
    pub async fn call(&self, method: impl Into<String>, args: Value) -> Result<MethodResult> {
        let method = method.into();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(ChannelCall {
                method: method.clone(),
                args,
                reply: reply_tx,
            })
            .map_err(|_| Error::channel_send(format!("bridge closed before {method}")))?;

        reply_rx.await.map_err(|_| Error::ChannelClosed)
    }
}

/// App-side serve loop draining shell-origin calls into the handler table
pub struct ChannelServer {
    channel: Arc<MethodChannel>,
    rx: mpsc::UnboundedReceiver<ChannelCall>,
}

impl ChannelServer {
    /// Run until every [`ChannelClient`] is dropped
    pub async fn serve(mut self) {
        info!("bridge {} serving", self.channel.name());
        while let Some(call) = self.rx.recv().await {
            let result = self.channel.invoke(&call.method, &call.args);
            // A dropped caller stopped waiting; the result is simply discarded
            let _ = call.reply.send(result);
        }
        info!("bridge {} closed", self.channel.name());
    }
}

/// Build the shell-origin transport over `channel`.
///
/// The returned server must be driven (usually `tokio::spawn(server.serve())`)
/// for the client's calls to resolve.
pub fn shell_transport(channel: Arc<MethodChannel>) -> (ChannelClient, ChannelServer) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelClient { tx }, ChannelServer { channel, rx })
}
