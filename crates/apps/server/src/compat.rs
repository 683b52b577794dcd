use voicechat_network::COMPATIBILITY_VERSION;

/// Protocol version gate run once per client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilityCheck {
    version: u32,
}

impl CompatibilityCheck {
    pub fn new(version: u32) -> Self {
        Self { version }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Only an exact version match is accepted.
    pub fn check(&self, client_version: u32) -> bool {
        client_version == self.version
    }
}

impl Default for CompatibilityCheck {
    fn default() -> Self {
        Self::new(COMPATIBILITY_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_version_passes() {
        let check = CompatibilityCheck::default();
        assert!(check.check(COMPATIBILITY_VERSION));
    }

    #[test]
    fn older_and_newer_versions_fail() {
        let check = CompatibilityCheck::new(7);
        assert!(!check.check(6));
        assert!(!check.check(8));
        assert_eq!(check.version(), 7);
    }
}
