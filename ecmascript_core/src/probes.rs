//! Static observability probes (ambient stack, not a spec component): the
//! teacher carries no `log`/`tracing` dependency and instruments hot paths
//! with `usdt` DTrace/SystemTap probes instead, so we do the same rather
//! than introduce a logging framework the teacher doesn't have. Behind the
//! `probes` feature; callers invoke the plain functions below
//! unconditionally; the `not(feature = "probes")` build compiles them away
//! to nothing so there is no `#[cfg]` noise at call sites.
//!
//! An embedder that enables the `probes` feature must call
//! `usdt::register_probes!()` once at startup for the provider below to be
//! visible to `dtrace`/`bpftrace`; this crate has no binary entry point to
//! do that from itself.

#[cfg(feature = "probes")]
#[usdt::provider]
mod provider {
    fn regex_compile_start(source: &str) {}
    fn regex_compile_end(source: &str, success: bool) {}
    fn microtask_drain_start(pending: u64) {}
    fn microtask_drain_end() {}
}

#[cfg(feature = "probes")]
pub fn regex_compile_start(source: &str) {
    provider::regex_compile_start!(|| (source));
}

#[cfg(feature = "probes")]
pub fn regex_compile_end(source: &str, success: bool) {
    provider::regex_compile_end!(|| (source, success));
}

#[cfg(feature = "probes")]
pub fn microtask_drain_start(pending: u64) {
    provider::microtask_drain_start!(|| (pending));
}

#[cfg(feature = "probes")]
pub fn microtask_drain_end() {
    provider::microtask_drain_end!(|| ());
}

#[cfg(not(feature = "probes"))]
pub fn regex_compile_start(_source: &str) {}
#[cfg(not(feature = "probes"))]
pub fn regex_compile_end(_source: &str, _success: bool) {}
#[cfg(not(feature = "probes"))]
pub fn microtask_drain_start(_pending: u64) {}
#[cfg(not(feature = "probes"))]
pub fn microtask_drain_end() {}
