//! Promise state storage, grounded on `nova_vm`'s `promise/data.rs`. We
//! have no heap arena to index into (spec §1's property-map/shape runtime
//! is out of scope), so `Promise` here is a plain `Rc<RefCell<PromiseData>>`
//! handle instead of a `PromiseHeapData` index, and reactions are just
//! `Vec<PromiseReaction>` rather than a `One`/`Many` split that exists only
//! to avoid an allocation in the heap-indexed design.

use std::cell::RefCell;
use std::rc::Rc;

use crate::value::JsValue;

use super::reaction::PromiseReaction;

pub(crate) enum PromiseState {
    Pending {
        fulfill_reactions: Vec<PromiseReaction>,
        reject_reactions: Vec<PromiseReaction>,
        /// True once this promise's fate has been handed off to a resolve
        /// or reject call (including one pending on a thenable), even
        /// though `[[PromiseState]]` itself hasn't transitioned yet.
        is_resolved: bool,
    },
    Fulfilled {
        value: JsValue,
    },
    Rejected {
        reason: JsValue,
        is_handled: bool,
    },
}

impl Default for PromiseState {
    fn default() -> Self {
        PromiseState::Pending {
            fulfill_reactions: Vec::new(),
            reject_reactions: Vec::new(),
            is_resolved: false,
        }
    }
}

#[derive(Default)]
pub(crate) struct PromiseData {
    pub(crate) state: PromiseState,
}

/// The user-visible `Promise` handle (spec §3's `PromiseObject`, minus the
/// `legacyFeaturesEnabled` bit which belongs to `RegExpObject`/`JsRealm`
/// instead - that flag is named in the data model as an artifact of the
/// source sharing one object-header shape across builtins, not something
/// Promise semantics itself need).
#[derive(Clone)]
pub struct Promise(pub(crate) Rc<RefCell<PromiseData>>);

impl Promise {
    pub(crate) fn new() -> Self {
        Promise(Rc::new(RefCell::new(PromiseData::default())))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.0.borrow().state, PromiseState::Pending { .. })
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self.0.borrow().state, PromiseState::Fulfilled { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.0.borrow().state, PromiseState::Rejected { .. })
    }

    /// The settled value/reason, or `None` while pending. Exposed for tests
    /// and for embedders inspecting a promise outside of `.then()`.
    pub fn settled_value(&self) -> Option<JsValue> {
        match &self.0.borrow().state {
            PromiseState::Fulfilled { value } => Some(value.clone()),
            PromiseState::Rejected { reason, .. } => Some(reason.clone()),
            PromiseState::Pending { .. } => None,
        }
    }
}

impl std::fmt::Debug for Promise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0.borrow().state {
            PromiseState::Pending { .. } => write!(f, "Promise(Pending)"),
            PromiseState::Fulfilled { value } => write!(f, "Promise(Fulfilled({value:?}))"),
            PromiseState::Rejected { reason, .. } => write!(f, "Promise(Rejected({reason:?}))"),
        }
    }
}

impl PartialEq for Promise {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Promise {}
