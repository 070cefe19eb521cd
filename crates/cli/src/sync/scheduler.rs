// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Decides when a cycle runs.
//!
//! Each connection has one slot: `idle → running → idle`, or `running →
//! backoff` after a network failure. A trigger for a connection that is
//! already running is a no-op, so cycles for one connection never overlap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::client::RemoteClient;
use super::engine::{CycleReport, SyncEngine};
use super::error::{SyncError, SyncResult};
use super::log::{DebugLog, LogOp};
use crate::config::SyncSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    /// Waiting out a network failure; periodic triggers are held back.
    Backoff { until: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    /// The device came back online with work queued.
    Reconnect,
    Periodic,
}

impl Trigger {
    fn as_str(&self) -> &'static str {
        match self {
            Trigger::Manual => "manual",
            Trigger::Reconnect => "reconnect",
            Trigger::Periodic => "periodic",
        }
    }
}

/// Result of asking for a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(CycleReport),
    /// A cycle for this connection was already in flight.
    AlreadyRunning,
    BackingOff,
    /// Automatic triggers are paused until credentials are refreshed.
    AuthBlocked,
    Offline,
    Cancelled,
}

struct Slot {
    phase: Phase,
    failures: u32,
    auth_blocked: bool,
    cancel: CancellationToken,
}

impl Default for Slot {
    fn default() -> Self {
        Slot { phase: Phase::Idle, failures: 0, auth_blocked: false, cancel: CancellationToken::new() }
    }
}

impl Slot {
    fn current_phase(&self) -> Phase {
        match self.phase {
            Phase::Backoff { until } if Instant::now() >= until => Phase::Idle,
            phase => phase,
        }
    }
}

pub struct SyncScheduler<R: RemoteClient> {
    engine: Arc<SyncEngine<R>>,
    settings: SyncSettings,
    log: DebugLog,
    slots: Mutex<HashMap<String, Slot>>,
    active: Mutex<Option<String>>,
    online: AtomicBool,
}

/// Returns the slot to idle if the cycle future is dropped mid-flight.
struct RunGuard<'a, R: RemoteClient> {
    scheduler: &'a SyncScheduler<R>,
    connection_id: &'a str,
}

impl<R: RemoteClient> Drop for RunGuard<'_, R> {
    fn drop(&mut self) {
        let mut slots = self.scheduler.slots();
        if let Some(slot) = slots.get_mut(self.connection_id) {
            if slot.phase == Phase::Running {
                slot.phase = Phase::Idle;
            }
        }
    }
}

impl<R: RemoteClient> SyncScheduler<R> {
    pub fn new(engine: Arc<SyncEngine<R>>, settings: SyncSettings, log: DebugLog) -> Self {
        SyncScheduler {
            engine,
            settings,
            log,
            slots: Mutex::new(HashMap::new()),
            active: Mutex::new(None),
            online: AtomicBool::new(true),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn active_guard(&self) -> MutexGuard<'_, Option<String>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn engine(&self) -> &Arc<SyncEngine<R>> {
        &self.engine
    }

    pub fn active_connection(&self) -> Option<String> {
        self.active_guard().clone()
    }

    pub fn phase(&self, connection_id: &str) -> Phase {
        self.slots().get(connection_id).map(Slot::current_phase).unwrap_or(Phase::Idle)
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Runs a cycle for `connection_id` unless one is already running or the
    /// trigger is held back.
    pub async fn start_sync(&self, connection_id: &str, trigger: Trigger) -> SyncResult<SyncOutcome> {
        let cancel = {
            let mut slots = self.slots();
            let slot = slots.entry(connection_id.to_string()).or_default();
            if let Some(held) = self.hold_back(slot, trigger) {
                return Ok(held);
            }
            slot.phase = Phase::Running;
            slot.cancel = CancellationToken::new();
            slot.cancel.clone()
        };

        self.log
            .info(LogOp::Scheduler, format!("Starting {} sync for {}", trigger.as_str(), connection_id))
            .emit();

        let _guard = RunGuard { scheduler: self, connection_id };
        let result = self.engine.run_cycle(connection_id, &cancel).await;
        self.finish(connection_id, &result);

        match result {
            Ok(report) => Ok(SyncOutcome::Completed(report)),
            Err(SyncError::Cancelled) => Ok(SyncOutcome::Cancelled),
            Err(e) => Err(e),
        }
    }

    fn hold_back(&self, slot: &Slot, trigger: Trigger) -> Option<SyncOutcome> {
        if slot.phase == Phase::Running {
            return Some(SyncOutcome::AlreadyRunning);
        }
        if !self.is_online() {
            return Some(SyncOutcome::Offline);
        }
        if trigger == Trigger::Manual {
            return None;
        }
        if slot.auth_blocked {
            return Some(SyncOutcome::AuthBlocked);
        }
        if trigger == Trigger::Periodic {
            if let Phase::Backoff { .. } = slot.current_phase() {
                return Some(SyncOutcome::BackingOff);
            }
        }
        None
    }

    fn finish(&self, connection_id: &str, result: &SyncResult<CycleReport>) {
        let mut slots = self.slots();
        // Removed while running.
        let Some(slot) = slots.get_mut(connection_id) else {
            return;
        };
        match result {
            Ok(_) => {
                slot.failures = 0;
                slot.auth_blocked = false;
                slot.phase = Phase::Idle;
            }
            Err(e) if e.is_transient() => {
                slot.failures += 1;
                let delay = self.settings.backoff(slot.failures);
                slot.phase = Phase::Backoff { until: Instant::now() + delay };
                self.log
                    .warn(
                        LogOp::Scheduler,
                        format!("Backing off {}ms after {} failures", delay.as_millis(), slot.failures),
                    )
                    .emit();
            }
            Err(e) if e.is_auth() => {
                slot.auth_blocked = true;
                slot.phase = Phase::Idle;
                self.log
                    .error(LogOp::Scheduler, format!("Automatic sync paused for {}", connection_id))
                    .emit();
            }
            Err(_) => slot.phase = Phase::Idle,
        }
    }

    /// Records connectivity. Coming back online with queued work starts a
    /// reconnect cycle for the active connection.
    pub async fn set_online(&self, online: bool) -> SyncResult<Option<SyncOutcome>> {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        self.log
            .info(LogOp::Scheduler, if online { "Online" } else { "Offline" })
            .emit();
        if !online || was_online {
            return Ok(None);
        }
        let Some(connection_id) = self.active_connection() else {
            return Ok(None);
        };
        let pending = {
            let db = self.engine.store().lock().await;
            self.engine.queue().count(&db)?
        };
        if pending == 0 {
            return Ok(None);
        }
        self.start_sync(&connection_id, Trigger::Reconnect).await.map(Some)
    }

    /// Makes `connection_id` the active connection, cancelling any cycle of
    /// the previous one.
    pub fn set_active_connection(&self, connection_id: &str) {
        let previous = self.active_guard().replace(connection_id.to_string());
        if let Some(previous) = previous.filter(|p| p != connection_id) {
            self.cancel(&previous);
        }
    }

    /// Forgets a connection: cancels its cycle and deletes its sync metadata.
    pub async fn remove_connection(&self, connection_id: &str) -> SyncResult<()> {
        self.cancel(connection_id);
        self.slots().remove(connection_id);
        {
            let mut active = self.active_guard();
            if active.as_deref() == Some(connection_id) {
                *active = None;
            }
        }
        let db = self.engine.store().lock().await;
        db.delete_sync_meta(connection_id)?;
        Ok(())
    }

    /// Lifts an auth block.
    pub fn credentials_refreshed(&self, connection_id: &str) {
        if let Some(slot) = self.slots().get_mut(connection_id) {
            slot.auth_blocked = false;
        }
    }

    /// Cancels the in-flight cycle's remaining phases.
    pub fn cancel(&self, connection_id: &str) {
        if let Some(slot) = self.slots().get(connection_id) {
            if slot.phase == Phase::Running {
                slot.cancel.cancel();
                self.log
                    .warn(LogOp::Scheduler, format!("Cancelling sync for {}", connection_id))
                    .emit();
            }
        }
    }

    pub fn cancel_all(&self) {
        for slot in self.slots().values() {
            slot.cancel.cancel();
        }
    }

    /// Triggers the active connection every `interval` until `shutdown`.
    pub fn spawn_periodic(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + interval, interval);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticks.tick() => {
                        let Some(connection_id) = scheduler.active_connection() else {
                            continue;
                        };
                        if let Err(e) = scheduler.start_sync(&connection_id, Trigger::Periodic).await {
                            tracing::debug!("periodic sync failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}
