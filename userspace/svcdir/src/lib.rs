// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Service directory mapping names to live service endpoints
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//!
//! PUBLIC API:
//!   - Directory: registry with registration, resolution, and blocking wait
//!   - Wait enum: wait behavior for lookups
//!   - ServiceHandle / Endpoint / Generation: resolved-instance identity
//!   - DeathRecipient trait: callback fired when a live instance goes away
//!   - global(): process-wide default directory
//!
//! The blocking wait is edge-triggered: waiters park on a condvar and are
//! woken by registration, never by polling.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};

mod wait;
pub use wait::Wait;

/// Result alias for directory operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors produced by the service directory.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A live instance of the service already exists.
    #[error("service already registered")]
    Duplicate,
    /// The requested service has no live instance.
    #[error("service not found")]
    NotFound,
    /// A handle refers to an instance that has since gone away.
    #[error("stale service handle")]
    StaleHandle,
    /// A bounded wait expired before the service registered.
    #[error("timed out waiting for service")]
    Timeout,
}

/// Unique generation identifier assigned to each registration of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    const fn first() -> Self {
        Self(1)
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Exposes the raw numeric value primarily for testing.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Endpoint identifier describing how to reach a service instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    address: String,
}

impl Endpoint {
    /// Creates a new endpoint wrapper from the provided address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into() }
    }

    /// Returns the raw endpoint address.
    pub fn as_str(&self) -> &str {
        &self.address
    }
}

impl From<&str> for Endpoint {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Handle identifying one live instance of a named service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    /// Human readable name of the service.
    pub name: String,
    /// Endpoint to reach the instance.
    pub endpoint: Endpoint,
    /// Monotonic generation associated with the instance.
    pub generation: Generation,
}

impl ServiceHandle {
    fn new(name: String, endpoint: Endpoint, generation: Generation) -> Self {
        Self { name, endpoint, generation }
    }
}

/// Callback fired when the instance a handle refers to goes away.
///
/// Recipients attached to a generation fire at most once, when exactly that
/// generation is unregistered. Notifications run outside the directory lock,
/// so a recipient may call back into the directory.
pub trait DeathRecipient: Send + Sync {
    /// Invoked with the handle of the instance that died.
    fn service_died(&self, handle: &ServiceHandle);
}

#[derive(Default)]
struct Slot {
    last: Option<Generation>,
    live: Option<Live>,
}

impl Slot {
    fn next_generation(&self) -> Generation {
        self.last.map_or(Generation::first(), Generation::next)
    }
}

struct Live {
    endpoint: Endpoint,
    generation: Generation,
    recipients: Vec<Arc<dyn DeathRecipient>>,
}

#[derive(Default)]
struct State {
    declared: HashSet<String>,
    slots: HashMap<String, Slot>,
}

impl State {
    fn live_handle(&self, name: &str) -> Option<ServiceHandle> {
        let live = self.slots.get(name)?.live.as_ref()?;
        Some(ServiceHandle::new(name.to_string(), live.endpoint.clone(), live.generation))
    }

    fn live_mut(&mut self, handle: &ServiceHandle) -> Result<&mut Live> {
        let live = self
            .slots
            .get_mut(&handle.name)
            .and_then(|slot| slot.live.as_mut())
            .ok_or(Error::NotFound)?;
        if live.generation != handle.generation {
            return Err(Error::StaleHandle);
        }
        Ok(live)
    }

    fn take_live(&mut self, handle: &ServiceHandle) -> Result<Live> {
        let slot = self.slots.get_mut(&handle.name).ok_or(Error::NotFound)?;
        match slot.live.take() {
            Some(live) if live.generation == handle.generation => Ok(live),
            Some(live) => {
                slot.live = Some(live);
                Err(Error::StaleHandle)
            }
            None => Err(Error::NotFound),
        }
    }
}

/// Registry of named services with blocking resolution.
#[derive(Default)]
pub struct Directory {
    state: Mutex<State>,
    registered: Condvar,
}

impl Directory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` in the manifest of services known to the platform.
    pub fn declare(&self, name: impl Into<String>) {
        self.state.lock().declared.insert(name.into());
    }

    /// Returns whether `name` is declared, either explicitly or by a past
    /// or present registration.
    pub fn is_declared(&self, name: &str) -> bool {
        let state = self.state.lock();
        state.declared.contains(name) || state.slots.contains_key(name)
    }

    /// Publishes a live instance of `name` reachable at `endpoint`.
    ///
    /// Fails with [`Error::Duplicate`] while a live instance exists.
    /// Re-registration after an unregister is allowed and yields a strictly
    /// greater generation. Waiters blocked on `name` are woken.
    pub fn register(&self, name: impl Into<String>, endpoint: Endpoint) -> Result<ServiceHandle> {
        let name = name.into();
        let mut state = self.state.lock();
        let slot = state.slots.entry(name.clone()).or_default();
        if slot.live.is_some() {
            return Err(Error::Duplicate);
        }
        let generation = slot.next_generation();
        slot.last = Some(generation);
        slot.live = Some(Live {
            endpoint: endpoint.clone(),
            generation,
            recipients: Vec::new(),
        });
        drop(state);
        self.registered.notify_all();
        Ok(ServiceHandle::new(name, endpoint, generation))
    }

    /// Resolves the current live instance of `name` without blocking.
    pub fn resolve(&self, name: &str) -> Result<ServiceHandle> {
        self.state.lock().live_handle(name).ok_or(Error::NotFound)
    }

    /// Resolves `name`, suspending the calling thread per `wait` until a
    /// live instance exists.
    ///
    /// [`Wait::Blocking`] suspends for an unbounded duration and only ever
    /// returns a handle. [`Wait::NonBlocking`] behaves like [`resolve`].
    /// [`Wait::Timeout`] fails with [`Error::Timeout`] once the deadline
    /// passes with the name still absent.
    ///
    /// [`resolve`]: Directory::resolve
    pub fn wait_for(&self, name: &str, wait: Wait) -> Result<ServiceHandle> {
        let deadline = wait.timeout().map(|timeout| Instant::now() + timeout);
        let mut state = self.state.lock();
        loop {
            if let Some(handle) = state.live_handle(name) {
                return Ok(handle);
            }
            if wait.is_non_blocking() {
                return Err(Error::NotFound);
            }
            match deadline {
                Some(deadline) => {
                    if self.registered.wait_until(&mut state, deadline).timed_out() {
                        return state.live_handle(name).ok_or(Error::Timeout);
                    }
                }
                None => self.registered.wait(&mut state),
            }
        }
    }

    /// Attaches `recipient` to the live instance `handle` refers to.
    ///
    /// Fails with [`Error::StaleHandle`] when the instance has already been
    /// replaced, and [`Error::NotFound`] when nothing is live.
    pub fn link_to_death(
        &self,
        handle: &ServiceHandle,
        recipient: Arc<dyn DeathRecipient>,
    ) -> Result<()> {
        self.state.lock().live_mut(handle)?.recipients.push(recipient);
        Ok(())
    }

    /// Removes the live instance `handle` refers to and fires its death
    /// recipients.
    ///
    /// Fails with [`Error::StaleHandle`] when `handle` does not match the
    /// current generation; the live instance is left untouched in that case.
    pub fn unregister(&self, handle: &ServiceHandle) -> Result<()> {
        let mut state = self.state.lock();
        let live = state.take_live(handle)?;
        drop(state);
        let died = ServiceHandle::new(handle.name.clone(), live.endpoint, live.generation);
        for recipient in live.recipients {
            recipient.service_died(&died);
        }
        Ok(())
    }
}

static GLOBAL: Lazy<Directory> = Lazy::new(Directory::new);

/// Returns the process-wide default directory.
pub fn global() -> &'static Directory {
    &GLOBAL
}
