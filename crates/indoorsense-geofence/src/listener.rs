// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Forwarding of geofence enter/exit transitions from the positioning source.
//
// The positioning source calls back from its own thread with one batch of
// entered and one batch of exited geofences. The adapter forwards each batch
// to its observer only while the matching stream is enabled. The sink is
// attached to the source the first time either stream is enabled and
// detached again once both are disabled, or on teardown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use indoorsense_core::error::{IndoorError, Result};
use indoorsense_core::types::{Geofence, TransitionKind};

/// Receives raw transition batches from a positioning source.
pub trait TransitionSink: Send + Sync {
    fn on_entered_geofences(&self, entered: &[Geofence]);
    fn on_exited_geofences(&self, exited: &[Geofence]);
}

/// A source of geofence transitions, such as the positioning SDK's
/// location manager. At most one sink is attached at a time.
pub trait TransitionSource: Send + Sync {
    /// Attach `sink`, replacing any previously attached sink.
    fn subscribe(&self, sink: Arc<dyn TransitionSink>) -> Result<()>;

    /// Detach the current sink. Detaching with no sink attached is a no-op.
    fn unsubscribe(&self) -> Result<()>;
}

/// Downstream consumer of forwarded batches.
pub trait GeofenceObserver: Send + Sync {
    fn on_transition(&self, kind: TransitionKind, geofences: &[Geofence]);
}

/// Lifecycle of the adapter's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// No sink attached to the source.
    Unregistered,
    /// Sink attached; batches flow subject to the enable flags.
    Registered,
    /// Torn down for good; nothing is delivered any more.
    Detached,
}

/// Sink handed to the source. Shared with the adapter so the flags can
/// change while the source holds it.
struct Forwarder {
    emit_enter: AtomicBool,
    emit_exit: AtomicBool,
    attached: AtomicBool,
    observer: Arc<dyn GeofenceObserver>,
}

impl Forwarder {
    fn flag(&self, kind: TransitionKind) -> &AtomicBool {
        match kind {
            TransitionKind::Enter => &self.emit_enter,
            TransitionKind::Exit => &self.emit_exit,
        }
    }

    fn forward(&self, kind: TransitionKind, geofences: &[Geofence]) {
        if !self.attached.load(Ordering::Acquire) {
            debug!(?kind, "transition after detach dropped");
            return;
        }
        if !self.flag(kind).load(Ordering::Acquire) {
            debug!(?kind, count = geofences.len(), "transition stream disabled, batch suppressed");
            return;
        }
        debug!(?kind, count = geofences.len(), "forwarding geofence transitions");
        self.observer.on_transition(kind, geofences);
    }
}

impl TransitionSink for Forwarder {
    fn on_entered_geofences(&self, entered: &[Geofence]) {
        self.forward(TransitionKind::Enter, entered);
    }

    fn on_exited_geofences(&self, exited: &[Geofence]) {
        self.forward(TransitionKind::Exit, exited);
    }
}

/// Bridges a [`TransitionSource`] to a [`GeofenceObserver`] through two
/// independently toggled streams.
pub struct GeofenceListenerAdapter {
    source: Arc<dyn TransitionSource>,
    forwarder: Arc<Forwarder>,
    state: Mutex<ListenerState>,
}

impl GeofenceListenerAdapter {
    pub fn new(source: Arc<dyn TransitionSource>, observer: Arc<dyn GeofenceObserver>) -> Self {
        Self {
            source,
            forwarder: Arc::new(Forwarder {
                emit_enter: AtomicBool::new(false),
                emit_exit: AtomicBool::new(false),
                attached: AtomicBool::new(false),
                observer,
            }),
            state: Mutex::new(ListenerState::Unregistered),
        }
    }

    /// Start forwarding `kind` batches, attaching to the source if needed.
    pub fn enable(&self, kind: TransitionKind) -> Result<()> {
        let mut state = self.state.lock().expect("listener state lock poisoned");
        match *state {
            ListenerState::Detached => {
                return Err(IndoorError::Subscription(
                    "geofence listener has been torn down".into(),
                ));
            }
            ListenerState::Registered => {}
            ListenerState::Unregistered => {
                self.forwarder.attached.store(true, Ordering::Release);
                let sink: Arc<dyn TransitionSink> = self.forwarder.clone();
                if let Err(e) = self.source.subscribe(sink) {
                    self.forwarder.attached.store(false, Ordering::Release);
                    warn!(error = %e, "failed to attach geofence listener");
                    return Err(e);
                }
                *state = ListenerState::Registered;
                info!("geofence listener registered");
            }
        }
        self.forwarder.flag(kind).store(true, Ordering::Release);
        info!(?kind, "geofence transition stream enabled");
        Ok(())
    }

    /// Stop forwarding `kind` batches. Detaches from the source once
    /// neither stream is enabled.
    pub fn disable(&self, kind: TransitionKind) -> Result<()> {
        let mut state = self.state.lock().expect("listener state lock poisoned");
        self.forwarder.flag(kind).store(false, Ordering::Release);
        info!(?kind, "geofence transition stream disabled");

        if *state == ListenerState::Registered && !self.any_enabled() {
            self.detach()?;
            *state = ListenerState::Unregistered;
        }
        Ok(())
    }

    /// Detach permanently. Later `enable` calls fail and late callbacks
    /// from the source are dropped.
    pub fn teardown(&self) -> Result<()> {
        let mut state = self.state.lock().expect("listener state lock poisoned");
        self.forwarder.emit_enter.store(false, Ordering::Release);
        self.forwarder.emit_exit.store(false, Ordering::Release);
        let was_registered = *state == ListenerState::Registered;
        *state = ListenerState::Detached;
        if was_registered {
            self.detach()?;
        }
        Ok(())
    }

    pub fn state(&self) -> ListenerState {
        *self.state.lock().expect("listener state lock poisoned")
    }

    pub fn is_enabled(&self, kind: TransitionKind) -> bool {
        self.forwarder.flag(kind).load(Ordering::Acquire)
    }

    fn any_enabled(&self) -> bool {
        self.is_enabled(TransitionKind::Enter) || self.is_enabled(TransitionKind::Exit)
    }

    /// On failure the forwarder stays attached; the source still holds it.
    fn detach(&self) -> Result<()> {
        self.forwarder.attached.store(false, Ordering::Release);
        if let Err(e) = self.source.unsubscribe() {
            self.forwarder.attached.store(true, Ordering::Release);
            warn!(error = %e, "failed to detach geofence listener");
            return Err(e);
        }
        info!("geofence listener detached");
        Ok(())
    }
}
