/// A single entry pulled from a content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    /// Absolute URL of the entry; empty when the source did not provide one.
    pub link: String,
    /// Name of the configured feed the item came from.
    pub source: String,
}

impl Item {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            source: source.into(),
        }
    }
}
