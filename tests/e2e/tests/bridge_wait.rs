//! CONTEXT: runtime bridge deterministic wait tests
//! INTENT: Validate blocking lookup and handle conversion end-to-end
//! DEPS: svcdir (directory), runtime-bridge (host-facing entry point)
//! TESTS: Immediate resolve, delayed registration, bounded wait, round-trip,
//!        independent concurrent waiters
// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bridge_e2e::register_later;
use runtime_bridge::{wait_for_service_in, RuntimeRef};
use svcdir::{Directory, Endpoint, Error, Wait};

#[test]
fn already_registered_name_resolves_immediately() {
    let directory = Directory::new();
    let handle = directory.register("configd", Endpoint::from("ipc://configd")).expect("register");
    let reference = wait_for_service_in(&directory, "configd").expect("resolve");
    assert_eq!(reference.into_handle(), handle);
}

#[test]
fn delayed_registration_unblocks_the_waiter() {
    let directory = Arc::new(Directory::new());
    let publisher = register_later(
        Arc::clone(&directory),
        "settingsd",
        "ipc://settingsd",
        Duration::from_millis(30),
    );

    let reference =
        wait_for_service_in(&directory, "settingsd").expect("wait resolves after registration");
    let registered = publisher.join().expect("publisher thread");
    assert_eq!(reference.into_handle(), registered);
}

#[test]
fn absent_service_blocks_until_the_deadline() {
    let directory = Directory::new();
    let started = Instant::now();
    let err = directory
        .wait_for("never.appears", Wait::Timeout(Duration::from_millis(40)))
        .expect_err("nothing registers");
    assert_eq!(err, Error::Timeout);
    assert!(started.elapsed() >= Duration::from_millis(40));
}

#[test]
fn reference_round_trips_to_the_same_instance() {
    let directory = Directory::new();
    let handle = directory.register("timed", Endpoint::from("ipc://timed")).expect("register");
    let reference = RuntimeRef::from_handle(handle.clone());
    let back = reference.into_handle();
    assert_eq!(back, handle);
    assert_eq!(directory.resolve("timed").expect("still live"), back);
}

#[test]
fn concurrent_waiters_get_independent_handles() {
    let directory = Arc::new(Directory::new());

    let waiter_a = {
        let directory = Arc::clone(&directory);
        thread::spawn(move || wait_for_service_in(&directory, "rngd"))
    };
    let waiter_b = {
        let directory = Arc::clone(&directory);
        thread::spawn(move || wait_for_service_in(&directory, "keystored"))
    };

    thread::sleep(Duration::from_millis(20));
    let handle_b =
        directory.register("keystored", Endpoint::from("ipc://keystored")).expect("register b");
    let handle_a = directory.register("rngd", Endpoint::from("ipc://rngd")).expect("register a");

    let reference_a = waiter_a.join().expect("waiter a").expect("a resolves");
    let reference_b = waiter_b.join().expect("waiter b").expect("b resolves");
    assert_eq!(reference_a.into_handle(), handle_a);
    assert_eq!(reference_b.into_handle(), handle_b);
}
