// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Supervised connection to one named service.
//!
//! A [`Supervisor`] owns at most one live reference obtained through the
//! runtime bridge. `start` acquires the reference and links a death
//! recipient; `stop` tears the instance down and waits a bounded time for the
//! death notification to confirm it. Notifications for a reference that is no
//! longer current are ignored.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use parking_lot::Mutex;
use runtime_bridge::RuntimeRef;
use svcdir::{DeathRecipient, Directory, ServiceHandle};

/// Result alias for supervisor operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors produced while managing the supervised connection.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The bridge yielded no reference for the service name.
    #[error("service directory yielded no handle")]
    Unavailable,
    /// The directory rejected an operation on the live instance.
    #[error(transparent)]
    Directory(#[from] svcdir::Error),
}

/// How long `stop` waits for the death notification before giving up.
const WAIT_FOR_DEATH_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Default)]
struct Inner {
    active: Option<RuntimeRef>,
    death_tx: Option<Sender<()>>,
}

struct Shared {
    name: String,
    inner: Mutex<Inner>,
}

struct Watcher {
    shared: Arc<Shared>,
}

impl DeathRecipient for Watcher {
    fn service_died(&self, handle: &ServiceHandle) {
        let mut inner = self.shared.inner.lock();
        let current = inner.active.as_ref().map(RuntimeRef::as_handle);
        if current != Some(handle) {
            info!("{}: ignoring stale death notification", self.shared.name);
            return;
        }
        if let Some(death_tx) = inner.death_tx.take() {
            // A pending sender means stop() triggered this death.
            let _ = death_tx.send(());
        }
        inner.active = None;
        info!("{}: service death was handled", self.shared.name);
    }
}

/// Supervises the connection to one named service.
pub struct Supervisor<'d> {
    directory: &'d Directory,
    shared: Arc<Shared>,
}

impl Supervisor<'static> {
    /// Creates a supervisor for `name` against the process-global directory.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_directory(svcdir::global(), name)
    }
}

impl<'d> Supervisor<'d> {
    /// Creates a supervisor for `name` against the provided directory.
    pub fn with_directory(directory: &'d Directory, name: impl Into<String>) -> Self {
        let shared = Arc::new(Shared {
            name: name.into(),
            inner: Mutex::new(Inner::default()),
        });
        Self { directory, shared }
    }

    /// Name of the supervised service.
    pub fn service_name(&self) -> &str {
        &self.shared.name
    }

    /// Acquires the service reference through the bridge and watches it.
    ///
    /// Blocks until the service registers, like the bridge itself. Calling
    /// `start` while a reference is already held is a no-op.
    pub fn start(&self) -> Result<()> {
        let name = &self.shared.name;
        let mut inner = self.shared.inner.lock();
        if inner.active.is_some() {
            info!("{name}: service has already been started");
            return Ok(());
        }

        let Some(reference) = runtime_bridge::wait_for_service_in(self.directory, name) else {
            error!("{name}: unable to retrieve a handle from the directory");
            return Err(Error::Unavailable);
        };

        inner.death_tx = None;
        let watcher = Arc::new(Watcher { shared: Arc::clone(&self.shared) });
        if let Err(err) = self.directory.link_to_death(reference.as_handle(), watcher) {
            error!("{name}: death link rejected: {err}");
            return Err(err.into());
        }

        inner.active = Some(reference);
        info!("{name}: service was started successfully");
        Ok(())
    }

    /// Whether a live reference is currently held.
    pub fn is_active(&self) -> bool {
        self.shared.inner.lock().active.is_some()
    }

    /// Clones the currently held reference, if any.
    pub fn current(&self) -> Option<RuntimeRef> {
        self.shared.inner.lock().active.clone()
    }

    /// Tears down the live instance and waits briefly for death confirmation.
    pub fn stop(&self) {
        let name = &self.shared.name;
        let (handle, death_rx) = {
            let mut inner = self.shared.inner.lock();
            let Some(active) = inner.active.as_ref() else {
                info!("{name}: service has already been stopped");
                return;
            };
            let handle = active.as_handle().clone();
            let (death_tx, death_rx) = mpsc::channel();
            inner.death_tx = Some(death_tx);
            (handle, death_rx)
        };

        info!("{name}: attempting to stop the service");
        if let Err(err) = self.directory.unregister(&handle) {
            error!("{name}: stop encountered a directory error: {err}");
            let mut inner = self.shared.inner.lock();
            inner.death_tx = None;
            inner.active = None;
            return;
        }

        self.confirm_death(death_rx);
    }

    fn confirm_death(&self, death_rx: Receiver<()>) {
        let name = &self.shared.name;
        match death_rx.recv_timeout(WAIT_FOR_DEATH_TIMEOUT) {
            Ok(()) => info!("{name}: service death confirmation was received"),
            Err(_) => error!("{name}: timed out waiting for confirmation of service death"),
        }
    }
}
