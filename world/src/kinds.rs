//! Catalogue of job kinds registered at load time.

use std::collections::BTreeMap;

use warren_core::{HookState, JobKindDescriptor, JobKindId, JobKindSnapshot, ScriptHook};

#[derive(Clone, Debug)]
struct KindEntry {
    name: String,
    behavior: HookState,
    preference: HookState,
}

/// Registry of immutable kind descriptors plus the mutable state of their hooks.
#[derive(Debug, Default)]
pub(crate) struct KindCatalogue {
    entries: BTreeMap<JobKindId, KindEntry>,
}

impl KindCatalogue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, refusing duplicates.
    pub(crate) fn register(&mut self, descriptor: JobKindDescriptor) -> bool {
        if self.entries.contains_key(&descriptor.id) {
            return false;
        }
        let _ = self.entries.insert(
            descriptor.id,
            KindEntry {
                name: descriptor.name,
                behavior: HookState::from_presence(descriptor.has_behavior),
                preference: HookState::from_presence(descriptor.has_dynamic_preference),
            },
        );
        true
    }

    pub(crate) fn contains(&self, kind: JobKindId) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Disables an enabled hook. Returns `None` for unknown kinds and
    /// `Some(false)` when the hook was not enabled.
    pub(crate) fn disable(&mut self, kind: JobKindId, hook: ScriptHook) -> Option<bool> {
        let entry = self.entries.get_mut(&kind)?;
        let state = match hook {
            ScriptHook::Behavior => &mut entry.behavior,
            ScriptHook::Preference => &mut entry.preference,
        };
        if !state.is_enabled() {
            return Some(false);
        }
        *state = HookState::Disabled;
        Some(true)
    }

    pub(crate) fn snapshots(&self) -> Vec<JobKindSnapshot> {
        self.entries
            .iter()
            .map(|(id, entry)| JobKindSnapshot {
                id: *id,
                name: entry.name.clone(),
                behavior: entry.behavior,
                preference: entry.preference,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: u32, behavior: bool) -> JobKindDescriptor {
        JobKindDescriptor {
            id: JobKindId::new(id),
            name: format!("kind-{id}"),
            has_behavior: behavior,
            has_dynamic_preference: false,
        }
    }

    #[test]
    fn duplicate_registration_is_refused() {
        let mut catalogue = KindCatalogue::new();
        assert!(catalogue.register(descriptor(3, true)));
        assert!(!catalogue.register(descriptor(3, false)));
        assert_eq!(catalogue.snapshots().len(), 1);
        assert_eq!(catalogue.snapshots()[0].behavior, HookState::Enabled);
    }

    #[test]
    fn disabling_is_one_way() {
        let mut catalogue = KindCatalogue::new();
        assert!(catalogue.register(descriptor(1, true)));
        assert_eq!(
            catalogue.disable(JobKindId::new(1), ScriptHook::Behavior),
            Some(true)
        );
        assert_eq!(
            catalogue.disable(JobKindId::new(1), ScriptHook::Behavior),
            Some(false)
        );
        assert_eq!(
            catalogue.disable(JobKindId::new(1), ScriptHook::Preference),
            Some(false)
        );
        assert_eq!(catalogue.disable(JobKindId::new(9), ScriptHook::Behavior), None);
    }
}
