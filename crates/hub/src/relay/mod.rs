//! Hub state and the operations that mutate it.
//!
//! All shared state lives in one [`HubState`] behind a mutex owned by [`Hub`].
//! The lock is only held for synchronous read/modify/enqueue steps and never
//! across an await, so collaborator callbacks run unlocked and may call back
//! into the hub.

mod broadcast;
mod registry;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use shared::{BarcodeResult, BeaconMessage, ColorState, InteractiveMode, HOST_SOURCE};

use crate::assignments::{AssignmentStore, AssignmentTarget};
use crate::handler::{BeaconHandler, NoopHandler};
use crate::interactive::ModeMachine;
use crate::router::InboundMessage;

pub use broadcast::{broadcast_all, broadcast_except};
pub use registry::{ClientId, ConnectionRegistry, Frame, Outbox, OUTBOX_CAPACITY};

/// Everything the hub knows. Starts RED, passive, with no clients or assignments.
#[derive(Debug)]
struct HubState {
    current: ColorState,
    registry: ConnectionRegistry,
    assignments: AssignmentStore,
    mode: ModeMachine,
}

impl Default for HubState {
    fn default() -> Self {
        Self {
            current: ColorState::Red,
            registry: ConnectionRegistry::new(),
            assignments: AssignmentStore::new(),
            mode: ModeMachine::new(),
        }
    }
}

impl HubState {
    fn broadcast(&mut self, msg: &BeaconMessage, excluded: Option<ClientId>) -> usize {
        let Some(frame) = encode(msg) else {
            return 0;
        };
        match excluded {
            Some(id) => broadcast_except(&mut self.registry, &frame, id),
            None => broadcast_all(&mut self.registry, &frame),
        }
    }
}

fn encode(msg: &BeaconMessage) -> Option<Frame> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            tracing::error!(kind = msg.message_type(), err = %e, "failed to encode message");
            None
        }
    }
}

/// The relay hub: authoritative beacon state plus fan-out to connected clients.
pub struct Hub {
    state: Mutex<HubState>,
    handler: Arc<dyn BeaconHandler>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Self {
        Self::with_handler(Arc::new(NoopHandler))
    }

    pub fn with_handler(handler: Arc<dyn BeaconHandler>) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            handler,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Connection registry ---

    /// Register a new client and queue its `hello` ahead of any later broadcast.
    pub fn connect(&self) -> (ClientId, Outbox) {
        let mut state = self.lock();
        let (id, outbox) = state.registry.register();
        let hello = BeaconMessage::hello(state.current, state.mode.mode());
        if let Some(frame) = encode(&hello) {
            state.registry.send_to(id, frame);
        }
        tracing::info!(client = %id, clients = state.registry.len(), "client connected");
        (id, outbox)
    }

    /// Idempotent.
    pub fn disconnect(&self, id: ClientId) {
        let mut state = self.lock();
        if state.registry.unregister(id) {
            tracing::info!(client = %id, clients = state.registry.len(), "client disconnected");
        }
    }

    pub fn has_clients(&self) -> bool {
        self.lock().registry.has_clients()
    }

    pub fn client_count(&self) -> usize {
        self.lock().registry.len()
    }

    /// Drop every client queue; each connection's writer closes its socket.
    pub fn close_all(&self) -> usize {
        let closed = self.lock().registry.clear();
        tracing::info!(clients = closed, "closing all client connections");
        closed
    }

    // --- State synchronizer ---

    pub fn current_state(&self) -> ColorState {
        self.lock().current
    }

    /// Host-originated colour push. Reaches every client, no exclusion.
    pub fn send_state(&self, state: ColorState, source: &str) -> usize {
        let mut hub = self.lock();
        hub.current = state;
        let delivered = hub.broadcast(&BeaconMessage::state_update(state, source), None);
        tracing::info!(state = %state, source, delivered, "state pushed");
        delivered
    }

    /// Host-originated scan report, for hosts that detect barcodes themselves.
    pub fn send_barcode_result(
        &self,
        code: &str,
        symbology: &str,
        confidence: f64,
        source: &str,
    ) -> usize {
        let msg = BeaconMessage::BarcodeResult {
            source: source.to_string(),
            code: code.to_string(),
            symbology: symbology.to_string(),
            confidence,
        };
        self.lock().broadcast(&msg, None)
    }

    async fn on_client_state_update(
        &self,
        origin: ClientId,
        raw: &str,
        state: ColorState,
        fields: Map<String, Value>,
    ) {
        self.lock().current = state;
        tracing::info!(client = %origin, state = %state, "client changed state");
        if let Err(e) = self.handler.on_state(self, state, &fields).await {
            tracing::warn!(err = %e, "state handler failed");
        }
        broadcast_except(&mut self.lock().registry, &Arc::from(raw), origin);
    }

    // --- Barcode handling ---

    async fn on_barcode_result(&self, origin: ClientId, raw: &str, result: BarcodeResult) {
        tracing::debug!(client = %origin, code = %result.code, "barcode scanned");
        if let Err(e) = self.handler.on_barcode(self, &result).await {
            tracing::warn!(code = %result.code, err = %e, "barcode handler failed");
        }
        broadcast_except(&mut self.lock().registry, &Arc::from(raw), origin);

        let target = self.lock().assignments.get(&result.code);
        if let Some(target) = target {
            tracing::debug!(code = %result.code, state = %target, "scan matched assignment");
            self.send_state(target, HOST_SOURCE);
        }
    }

    // --- Assignment store ---

    pub fn assignment(&self, code: &str) -> Option<ColorState> {
        self.lock().assignments.get(code)
    }

    pub fn assignments(&self) -> BTreeMap<String, ColorState> {
        self.lock().assignments.snapshot()
    }

    pub fn update_assignment(&self, code: &str, target: AssignmentTarget) {
        self.lock().assignments.update(code, target);
        tracing::debug!(code, target = ?target, "assignment updated");
    }

    /// Replace every assignment with `targets`.
    pub fn sync_assignments<I>(&self, targets: I)
    where
        I: IntoIterator<Item = (String, AssignmentTarget)>,
    {
        let mut state = self.lock();
        state.assignments.sync(targets);
        tracing::info!(assignments = state.assignments.len(), "assignments synced");
    }

    // --- Interactive mode ---

    pub fn interactive_mode(&self) -> InteractiveMode {
        self.lock().mode.mode()
    }

    /// Announces the new mode to every client. Returns false when nothing changed.
    pub fn set_mode(&self, requested: InteractiveMode) -> bool {
        let mut state = self.lock();
        let Some(mode) = state.mode.transition(requested) else {
            return false;
        };
        state.broadcast(&BeaconMessage::interactive_status(mode), None);
        tracing::info!(mode = %mode, "interactive mode changed");
        true
    }

    /// Forces RED when the mode is `any_key_red`. Returns whether it did.
    pub fn on_interactive_key(&self) -> bool {
        if !self.lock().mode.key_forces_red() {
            return false;
        }
        self.send_state(ColorState::Red, HOST_SOURCE);
        true
    }

    // --- Message router ---

    /// Decode one text frame from `origin` and apply it. Invalid frames are dropped silently.
    pub async fn handle_text(&self, origin: ClientId, text: &str) {
        let msg = match InboundMessage::decode(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(client = %origin, err = %e, "dropped message");
                return;
            }
        };
        match msg {
            InboundMessage::StateUpdate { state, fields } => {
                self.on_client_state_update(origin, text, state, fields).await
            }
            InboundMessage::BarcodeResult(result) => {
                self.on_barcode_result(origin, text, result).await
            }
            InboundMessage::AssignmentUpdate { code, target } => {
                self.update_assignment(&code, target)
            }
            InboundMessage::AssignmentSync { targets } => self.sync_assignments(targets),
            InboundMessage::InteractiveControl { mode } => {
                self.set_mode(mode);
            }
            InboundMessage::InteractiveKey => {
                self.on_interactive_key();
            }
            InboundMessage::Heartbeat => {}
            InboundMessage::Unrecognized(kind) => {
                tracing::debug!(client = %origin, kind = %kind, "ignored unknown message type");
            }
        }
    }
}
