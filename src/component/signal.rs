//! Signal names: the reserved `sig/*` event types every component emits.
//!
//! Hooking a lifecycle step means registering a handler under one of these
//! exact names.

/// Prefix of every signal type.
pub const PREFIX: &str = "sig/";

/// Component is initializing (registry entry, declared subscriptions).
pub const INITIALIZE: &str = "sig/initialize";
/// Component is starting.
pub const START: &str = "sig/start";
/// Component is stopping.
pub const STOP: &str = "sig/stop";
/// Component is finalizing (subscriptions torn down).
pub const FINALIZE: &str = "sig/finalize";
/// First handler of a type is about to be added.
pub const SETUP: &str = "sig/setup";
/// A handler is about to be added; halting vetoes it.
pub const ADD: &str = "sig/add";
/// A handler was added.
pub const ADDED: &str = "sig/added";
/// Handlers are about to be removed; halting vetoes it.
pub const REMOVE: &str = "sig/remove";
/// Handlers were removed.
pub const REMOVED: &str = "sig/removed";
/// The last handler of a type was removed.
pub const TEARDOWN: &str = "sig/teardown";
/// A task was started through [`Component::task`](crate::Component::task).
pub const TASK: &str = "sig/task";
/// Component was added to the registry.
pub const REGISTER: &str = "sig/register";
/// Component was removed from the registry.
pub const UNREGISTER: &str = "sig/unregister";

/// Builds the event type of signal `name` (`"start"` becomes `"sig/start"`).
///
/// A name that already carries the prefix is returned unchanged.
pub fn signal_type(name: &str) -> String {
    if name.starts_with(PREFIX) {
        name.to_string()
    } else {
        format!("{PREFIX}{name}")
    }
}
