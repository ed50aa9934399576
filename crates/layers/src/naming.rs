/// Deterministic renderer object names.
///
/// Names depend only on the prefix and the feature's position, so two passes
/// over the same feature list produce the same object set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNames {
    prefix: String,
}

impl ObjectNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn source(&self, index: usize) -> String {
        format!("{}-source-{index}", self.prefix)
    }

    pub fn layer(&self, index: usize) -> String {
        format!("{}-layer-{index}", self.prefix)
    }

    pub fn fill(&self, index: usize) -> String {
        format!("{}-layer-{index}-fill", self.prefix)
    }

    pub fn outline(&self, index: usize) -> String {
        format!("{}-layer-{index}-outline", self.prefix)
    }

    /// Whether `id` belongs to the engine rather than the basemap style.
    pub fn owns(&self, id: &str) -> bool {
        id.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.starts_with('-'))
    }
}
