//! Primary-application orchestration and the activation host

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::json;

use gbridge_core::prelude::*;
use gbridge_core::{Activation, ActivationFlags, SafetyStatus};
use gbridge_store::{SnapshotReader, SnapshotWriter, StateStore};
use gbridge_surface::{ActionDispatcher, ActivationTarget, WidgetSurface};

use crate::bridge::{MethodChannel, CHANNEL_NAME, METHOD_TRIGGER_SOS, SOS_TRIGGERED};
use crate::router::{EntryRouter, Route};

/// The primary application's bridge-facing core: entry routing, the method
/// channel, and the snapshot it owns as sole writer.
pub struct PrimaryApp {
    router: Mutex<EntryRouter>,
    channel: Arc<MethodChannel>,
    writer: SnapshotWriter,
    surface: RwLock<Option<Arc<WidgetSurface>>>,
    sos_runs: AtomicUsize,
}

impl PrimaryApp {
    /// Build the app core and register its command handlers
    pub fn new(writer: SnapshotWriter) -> Arc<Self> {
        let app = Arc::new(Self {
            router: Mutex::new(EntryRouter::new()),
            channel: Arc::new(MethodChannel::new(CHANNEL_NAME)),
            writer,
            surface: RwLock::new(None),
            sos_runs: AtomicUsize::new(0),
        });

        // The handler table outlives nothing here, but the handler must not
        // keep the app alive through its own channel
        let weak = Arc::downgrade(&app);
        app.channel.register(METHOD_TRIGGER_SOS, move |_args| {
            if let Some(app) = weak.upgrade() {
                app.run_safety_action();
            }
            json!(SOS_TRIGGERED)
        });

        app
    }

    /// The app's single method channel
    pub fn channel(&self) -> Arc<MethodChannel> {
        Arc::clone(&self.channel)
    }

    /// Late-wire the widget surface so the safety action can re-render it
    pub fn attach_surface(&self, surface: Arc<WidgetSurface>) {
        *self
            .surface
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(surface);
    }

    /// Feed one activation through the entry router and act on the route.
    ///
    /// Cold start and resume both land here; the router consumes the SOS
    /// flag exactly once per activation.
    pub fn handle_activation(&self, activation: Activation) -> Route {
        let route = {
            let mut router = self.router.lock().unwrap_or_else(PoisonError::into_inner);
            router.activate(activation);
            router.route()
        };

        match route {
            Route::SafetyAction => self.run_safety_action(),
            Route::Home => debug!("activation routed home"),
        }
        route
    }

    /// An unrelated internal navigation event re-consulting the router.
    ///
    /// Never re-fires the safety action for an already-consumed activation.
    pub fn navigate(&self) -> Route {
        let route = {
            let mut router = self.router.lock().unwrap_or_else(PoisonError::into_inner);
            router.route()
        };
        if route == Route::SafetyAction {
            self.run_safety_action();
        }
        route
    }

    /// The safety-action handler.
    ///
    /// Writes the alert status through the snapshot's sole writer, then
    /// re-renders every provisioned widget instance so the surface reflects
    /// the state changed during handling (explicit policy, on both the
    /// cold-start and resumed paths).
    fn run_safety_action(&self) {
        info!("SOS safety action firing");
        self.sos_runs.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.writer.set_safety_status(SafetyStatus::Alert) {
            warn!("failed to persist alert status: {e}");
        }

        let surface = self
            .surface
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(surface) = surface {
            let rendered = surface.refresh_all();
            debug!("re-rendered {} surface instance(s)", rendered.len());
        }
    }

    /// How many times the safety action has run
    pub fn sos_runs(&self) -> usize {
        self.sos_runs.load(Ordering::SeqCst)
    }
}

/// Process-liveness wrapper around [`PrimaryApp`].
///
/// This is the activation target the dispatcher hands flags to: it owns the
/// cold-start vs. resumed decision, so an SOS is never dropped merely
/// because the process already exists.
pub struct AppHost {
    app: Arc<PrimaryApp>,
    running: AtomicBool,
}

impl AppHost {
    pub fn new(app: Arc<PrimaryApp>) -> Arc<Self> {
        Arc::new(Self {
            app,
            running: AtomicBool::new(false),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Simulate process death (demo and tests)
    pub fn stop(&self) {
        info!("primary app stopped");
        self.running.store(false, Ordering::SeqCst);
    }
}

impl ActivationTarget for AppHost {
    fn activate(&self, flags: ActivationFlags) -> Result<()> {
        // swap marks the process started; the previous value decides the kind
        let was_running = self.running.swap(true, Ordering::SeqCst);
        let activation = if was_running {
            Activation::resumed(flags)
        } else {
            info!("cold-starting primary app");
            Activation::cold_start(flags)
        };

        self.app.handle_activation(activation);
        Ok(())
    }
}

/// A fully wired bridge over one store: app core, activation host,
/// dispatcher, and widget surface.
pub struct BridgeStack {
    pub store: Arc<dyn StateStore>,
    pub app: Arc<PrimaryApp>,
    pub host: Arc<AppHost>,
    pub dispatcher: Arc<ActionDispatcher>,
    pub surface: Arc<WidgetSurface>,
}

/// Wire every component of the bridge over `store`
pub fn bootstrap(store: Arc<dyn StateStore>) -> BridgeStack {
    let app = PrimaryApp::new(SnapshotWriter::new(Arc::clone(&store)));
    let host = AppHost::new(Arc::clone(&app));
    let dispatcher = Arc::new(ActionDispatcher::new(
        Arc::clone(&host) as Arc<dyn ActivationTarget>
    ));
    let surface = Arc::new(WidgetSurface::new(
        SnapshotReader::new(Arc::clone(&store)),
        Arc::clone(&dispatcher),
    ));
    app.attach_surface(Arc::clone(&surface));

    BridgeStack {
        store,
        app,
        host,
        dispatcher,
        surface,
    }
}
