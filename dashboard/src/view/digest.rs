use sha2::{Digest, Sha256};

/// Rendered markup of the mount, tagged with a digest of its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub html: String,
    /// Hex SHA-256 of `html`, used as the HTTP entity tag
    pub etag: String,
}

impl Fragment {
    pub fn new(html: String) -> Self {
        let etag = hex::encode(Sha256::digest(html.as_bytes()));
        Self { html, etag }
    }

    /// Mount contents before the first successful fetch.
    pub fn empty() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_deterministic() {
        let a = Fragment::new("<table></table>".to_string());
        let b = Fragment::new("<table></table>".to_string());

        assert_eq!(a.etag, b.etag);
        assert_eq!(a.etag.len(), 64);
    }

    #[test]
    fn test_etag_changes_with_content() {
        let a = Fragment::new("<div class=\"total\">Players: 1/2</div>".to_string());
        let b = Fragment::new("<div class=\"total\">Players: 2/2</div>".to_string());

        assert_ne!(a.etag, b.etag, "Digest should change when markup changes");
    }
}
