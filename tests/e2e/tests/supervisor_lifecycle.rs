//! CONTEXT: supervised connection lifecycle tests
//! INTENT: Validate start/stop flows and death handling against the directory
//! DEPS: svc-supervisor (lifecycle), svcdir (directory)
//! TESTS: Start/stop roundtrip, restart after external death
// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use svc_supervisor::Supervisor;
use svcdir::{Directory, Endpoint, Error};

#[test]
fn start_stop_roundtrip_confirms_death() {
    let directory = Directory::new();
    directory.register("supplicant", Endpoint::from("ipc://supplicant")).expect("register");

    let supervisor = Supervisor::with_directory(&directory, "supplicant");
    supervisor.start().expect("start acquires the reference");
    assert!(supervisor.is_active());

    supervisor.stop();
    assert!(!supervisor.is_active());
    assert_eq!(directory.resolve("supplicant"), Err(Error::NotFound));
}

#[test]
fn restart_after_external_death_sees_the_new_instance() {
    let directory = Directory::new();
    let first = directory.register("supplicant", Endpoint::from("ipc://a")).expect("register");

    let supervisor = Supervisor::with_directory(&directory, "supplicant");
    supervisor.start().expect("first start");
    directory.unregister(&first).expect("instance dies externally");
    assert!(!supervisor.is_active());

    let second = directory.register("supplicant", Endpoint::from("ipc://b")).expect("re-register");
    supervisor.start().expect("second start");
    let held = supervisor.current().expect("reference held");
    assert_eq!(held.as_handle(), &second);
    assert!(second.generation > first.generation);
}
