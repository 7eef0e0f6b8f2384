use serde::{Deserialize, Serialize};

/// A named geographic forecast area identified by a stable code.
///
/// Identity is the code; the name is display metadata and may be updated
/// when the directory is reloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Stable region code (e.g. "130000" for Tokyo)
    pub code: String,
    /// Display name of the region
    pub name: String,
}

impl Region {
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}
