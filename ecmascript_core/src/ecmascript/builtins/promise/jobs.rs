//! [27.2.2 Promise Jobs](https://tc39.es/ecma262/#sec-promise-jobs),
//! grounded on `nova_vm`'s `promise_jobs.rs`. Each function here builds a
//! [`Microtask`] closure rather than a `Job`/`InnerJob` pair, since we have
//! no realm handle to snapshot alongside the job the way the teacher's
//! `Job::realm` does (spec §1's job-to-realm association is folded into
//! whichever closure captures what it needs).

use crate::host::{Microtask, MicrotaskQueue, NullHostHooks};
use crate::value::JsValue;

use super::capability::PromiseCapability;
use super::data::Promise;
use super::reaction::{PromiseReaction, PromiseReactionType};

/// [27.2.2.1 NewPromiseReactionJob](https://tc39.es/ecma262/#sec-newpromisereactionjob).
/// When `[[Handler]]` is empty the built-in behavior is to pass the
/// argument straight through on fulfill, or rethrow it on reject - exactly
/// `Promise.prototype.then`'s default identity/thrower functions. This
/// passthrough is also how [`new_promise_resolve_thenable_job`] below
/// chains a thenable's settlement into another capability, by attaching
/// handler-less reactions to it.
pub(crate) fn new_promise_reaction_job(reaction: PromiseReaction, argument: JsValue) -> Microtask {
    Box::new(move |queue: &mut MicrotaskQueue| {
        let PromiseReaction {
            capability,
            reaction_type,
            handler,
        } = reaction;

        // A reaction job never carries its own host hooks handle (spec
        // §1's rejection tracker is realm-scoped, not job-scoped); reusing
        // a no-op default here means a derived promise just won't surface
        // an unhandled-rejection diagnostic for this particular hop.
        let mut hooks = NullHostHooks;
        let result = match handler {
            Some(handler) => handler(queue, &mut hooks, argument),
            None => match reaction_type {
                PromiseReactionType::Fulfill => Ok(argument),
                PromiseReactionType::Reject => Err(argument),
            },
        };

        match result {
            Ok(value) => capability.resolve(queue, &mut hooks, value),
            Err(reason) => capability.reject(queue, &mut hooks, reason),
        }
    })
}

/// [27.2.2.2 NewPromiseResolveThenableJob](https://tc39.es/ecma262/#sec-newpromiseresolvethenablejob),
/// collapsed to our only thenable shape: another of our own [`Promise`]s.
/// Attaching handler-less reactions to `thenable` and routing them at
/// `capability` is exactly "resolve/reject `capability` with whatever
/// `thenable` eventually settles to", reusing [`new_promise_reaction_job`]'s
/// passthrough behavior instead of re-deriving it.
pub(crate) fn new_promise_resolve_thenable_job(capability: PromiseCapability, thenable: Promise) -> Microtask {
    Box::new(move |queue: &mut MicrotaskQueue| {
        let mut hooks = NullHostHooks;
        let thenable_capability = PromiseCapability::from_promise(thenable);
        thenable_capability.perform_then(queue, &mut hooks, None, None, capability);
    })
}
