// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use svcdir::{Directory, Endpoint, ServiceHandle};

/// Registers `name` on `directory` after `delay`, from a helper thread.
pub fn register_later(
    directory: Arc<Directory>,
    name: &str,
    endpoint: &str,
    delay: Duration,
) -> JoinHandle<ServiceHandle> {
    let name = name.to_string();
    let endpoint = Endpoint::from(endpoint);
    thread::spawn(move || {
        thread::sleep(delay);
        directory.register(name, endpoint).expect("delayed register")
    })
}
