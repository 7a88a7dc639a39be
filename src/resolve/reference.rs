//! Asset Reference Classification
//!
//! An asset reference is either a ready-to-use URL or an opaque ID that must
//! resolve through the remote asset service. Classification is prefix-based
//! and total: every non-empty string falls into exactly one case.

// == Asset Reference ==
/// A classified asset reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetReference {
    /// Already usable as-is: recognized scheme, inline data URL, or
    /// root-relative path. Never cached, never looked up.
    Url(String),
    /// Opaque identifier expected to resolve through the asset service.
    Id(String),
}

impl AssetReference {
    /// Classifies a non-empty reference string.
    ///
    /// Recognized usable forms:
    /// - `http://` / `https://` absolute URLs
    /// - `data:` inline data URLs
    /// - `blob:` object URLs handed out by the runtime
    /// - root-relative paths (leading `/`)
    ///
    /// Everything else is an opaque ID.
    pub fn classify(raw: &str) -> Self {
        let usable = raw.starts_with("http://")
            || raw.starts_with("https://")
            || raw.starts_with("data:")
            || raw.starts_with("blob:")
            || raw.starts_with('/');

        if usable {
            AssetReference::Url(raw.to_string())
        } else {
            AssetReference::Id(raw.to_string())
        }
    }
}
