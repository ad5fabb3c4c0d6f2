// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bridge handing the embedding host a reference to a named system service.
//!
//! The host calls [`wait_for_service`] with a service name; the call suspends
//! on the directory's blocking lookup until the name registers and returns
//! the resolved instance wrapped as a [`RuntimeRef`], the reference type the
//! host side holds. The bridge adds nothing of its own: no validation, no
//! timeout, no retries, no logging. When the lookup yields nothing the host
//! sees `None` rather than an error.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

use svcdir::{Directory, ServiceHandle, Wait};

/// Earliest directory ABI revision that ships both the blocking lookup and
/// the handle conversion used here.
///
/// Callers of this bridge are only ever invoked on revision 35 or later, so
/// no runtime availability check is performed; the floor is recorded here as
/// a documented assumption.
pub const MIN_DIRECTORY_ABI: u32 = 31;

/// Opaque reference the embedding host holds for a resolved service.
///
/// Converting a directory handle into a `RuntimeRef` and back yields an
/// equivalent handle for the same service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeRef {
    handle: ServiceHandle,
}

impl RuntimeRef {
    /// Wraps a low-level directory handle in the host-side representation.
    pub fn from_handle(handle: ServiceHandle) -> Self {
        Self { handle }
    }

    /// Name of the service this reference points at.
    pub fn service_name(&self) -> &str {
        &self.handle.name
    }

    /// Borrows the underlying directory handle.
    pub fn as_handle(&self) -> &ServiceHandle {
        &self.handle
    }

    /// Converts back into the low-level directory handle.
    pub fn into_handle(self) -> ServiceHandle {
        self.handle
    }
}

impl From<ServiceHandle> for RuntimeRef {
    fn from(handle: ServiceHandle) -> Self {
        Self::from_handle(handle)
    }
}

/// Blocks until `name` has a live instance in `directory` and returns the
/// host-side reference to it.
///
/// No timeout is applied here; whatever the directory's blocking lookup does
/// for a name that never appears is what the caller gets. `None` means the
/// lookup produced no handle.
pub fn wait_for_service_in(directory: &Directory, name: &str) -> Option<RuntimeRef> {
    directory.wait_for(name, Wait::Blocking).ok().map(RuntimeRef::from_handle)
}

/// [`wait_for_service_in`] against the process-global directory, the form
/// the embedding host calls.
pub fn wait_for_service(name: &str) -> Option<RuntimeRef> {
    wait_for_service_in(svcdir::global(), name)
}
