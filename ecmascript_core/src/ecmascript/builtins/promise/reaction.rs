//! [27.2.1.2 PromiseReaction Records](https://tc39.es/ecma262/#sec-promisereaction-records),
//! grounded on `nova_vm`'s `promise_reaction_records.rs`. `[[Handler]]`
//! collapses `JobCallback | empty` into `Option<Handler>` directly, since we
//! have no `JobCallback` record wrapper to model (no realm-crossing
//! callback host hook in this slice).

use super::capability::{Handler, PromiseCapability};

/// `[[Type]]`: which built-in behavior applies when `[[Handler]]` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromiseReactionType {
    Fulfill,
    Reject,
}

pub(crate) struct PromiseReaction {
    pub(crate) capability: PromiseCapability,
    pub(crate) reaction_type: PromiseReactionType,
    pub(crate) handler: Option<Handler>,
}
