//! Per-realm ambient state (spec §9's design note: "Global `legacyFeatures`.
//! Per-context state; an implementation should place it in the realm
//! object, not a thread-local").
//!
//! A `RegExpObject` whose `legacyFeaturesEnabled` bit is set writes its
//! match outcome here after every successful `exec`; one disabled anywhere
//! invalidates the record for the realm rather than merely skipping the
//! update (spec §4.7, §9: "Disablement... invalidates rather than updates
//! the record").

use crate::text::JsString;

/// The static `RegExp.$1`..`RegExp.$9`, `.input`, `.lastMatch`,
/// `.lastParen`, `.leftContext`, `.rightContext` legacy properties.
#[derive(Debug, Clone, Default)]
pub struct LegacyFeatures {
    pub input: Option<JsString>,
    pub last_match: Option<JsString>,
    pub last_paren: Option<JsString>,
    pub left_context: Option<JsString>,
    pub right_context: Option<JsString>,
    /// `$1..$9`, in order; unset captures leave a hole.
    pub groups: [Option<JsString>; 9],
}

pub struct JsRealm {
    legacy_features: Option<LegacyFeatures>,
}

impl Default for JsRealm {
    fn default() -> Self {
        Self::new()
    }
}

impl JsRealm {
    pub fn new() -> Self {
        JsRealm {
            legacy_features: Some(LegacyFeatures::default()),
        }
    }

    pub fn legacy_features(&self) -> Option<&LegacyFeatures> {
        self.legacy_features.as_ref()
    }

    /// Called after a match from a regex with legacy features still enabled.
    /// A no-op once the realm's record has been invalidated.
    pub fn update_legacy_features(&mut self, features: LegacyFeatures) {
        if self.legacy_features.is_some() {
            self.legacy_features = Some(features);
        }
    }

    /// `legacyFeaturesEnabled = false` on the originating regex invalidates
    /// the realm-wide record permanently; it does not merely stop updating.
    pub fn disable_legacy_features(&mut self) {
        self.legacy_features = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabling_invalidates_rather_than_freezes() {
        let mut realm = JsRealm::new();
        realm.update_legacy_features(LegacyFeatures {
            input: Some(JsString::from_str("abc")),
            ..Default::default()
        });
        assert!(realm.legacy_features().is_some());
        realm.disable_legacy_features();
        assert!(realm.legacy_features().is_none());
        realm.update_legacy_features(LegacyFeatures::default());
        assert!(realm.legacy_features().is_none());
    }
}
