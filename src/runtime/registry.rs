//! Insertion-ordered registry of drawing modes. The engine itself only ever
//! stores a mode identifier inside snapshots; the registry lets the driver
//! and any scrubbing UI resolve that identifier to something presentable.

use indexmap::IndexMap;

#[derive(Clone, Debug, PartialEq)]
pub struct ModeInfo {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Default)]
pub struct ModeRegistry {
    modes: IndexMap<String, ModeInfo>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, info: ModeInfo) -> Result<(), String> {
        if self.modes.contains_key(&info.name) {
            return Err(format!("mode '{}' is already registered", info.name));
        }
        self.modes.insert(info.name.clone(), info);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModeInfo> {
        self.modes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.modes.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> ModeInfo {
        ModeInfo {
            name: name.to_string(),
            display_name: name.to_uppercase(),
        }
    }

    #[test]
    fn registration_preserves_insertion_order() {
        let mut registry = ModeRegistry::new();
        registry.register(info("waves")).unwrap();
        registry.register(info("plasma")).unwrap();
        registry.register(info("echo")).unwrap();

        assert_eq!(registry.names(), vec!["waves", "plasma", "echo"]);
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut registry = ModeRegistry::new();
        registry.register(info("waves")).unwrap();

        let err = registry.register(info("waves")).unwrap_err();
        assert!(err.contains("already registered"));
        assert_eq!(registry.len(), 1);
    }
}
