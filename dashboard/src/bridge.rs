use anyhow::Result;
use thiserror::Error;
use shared::types::ProtoRange;
use crate::session::SessionHandle;

#[derive(Debug, Error)]
pub enum ProtoRangeError {
    #[error("invalid protocol range {0:?}: {1}")]
    Malformed(String, serde_json::Error),
    #[error("protocol range is inverted: {low} > {high}")]
    Inverted { low: u32, high: u32 },
}

/// Parse the value of the protocol control: a JSON `[low, high]` pair, or an
/// empty string / `null` for "any protocol".
pub fn parse_proto_range(value: &str) -> Result<Option<ProtoRange>, ProtoRangeError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let range: Option<ProtoRange> = serde_json::from_str(value)
        .map_err(|e| ProtoRangeError::Malformed(value.to_string(), e))?;

    match range {
        Some(ProtoRange { low, high }) if low > high => Err(ProtoRangeError::Inverted { low, high }),
        range => Ok(range),
    }
}

/// A change of the protocol control: store the range and redraw from the
/// cached snapshot. Never fetches.
pub async fn on_proto_range_change(session: &SessionHandle, value: &str) -> Result<()> {
    let range = parse_proto_range(value)?;
    session.set_proto_range(range).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use futures::future::{BoxFuture, FutureExt};
    use tokio::sync::watch;
    use shared::types::Snapshot;
    use crate::source::{FetchError, ListSource};
    use crate::view::digest::Fragment;
    use crate::view::filter::FilterState;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_proto_range("[37, 42]").unwrap(),
            Some(ProtoRange { low: 37, high: 42 })
        );
    }

    #[test]
    fn test_parse_clears() {
        assert_eq!(parse_proto_range("").unwrap(), None);
        assert_eq!(parse_proto_range("  ").unwrap(), None);
        assert_eq!(parse_proto_range("null").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_proto_range("[37]"), Err(ProtoRangeError::Malformed(..))));
        assert!(matches!(parse_proto_range("latest"), Err(ProtoRangeError::Malformed(..))));
        assert!(matches!(
            parse_proto_range("[42, 37]"),
            Err(ProtoRangeError::Inverted { low: 42, high: 37 })
        ));
    }

    struct CountingSource(AtomicUsize);

    impl ListSource for CountingSource {
        fn fetch(&self) -> BoxFuture<'static, Result<Snapshot, FetchError>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            async { Ok(Snapshot::empty()) }.boxed()
        }
    }

    #[tokio::test]
    async fn test_change_updates_filter_without_fetching() {
        let source = Arc::new(CountingSource(AtomicUsize::new(0)));
        let (mount, _rx) = watch::channel(Fragment::empty());
        let session = SessionHandle::spawn(source.clone(), FilterState::default(), mount);

        on_proto_range_change(&session, "[37, 42]").await.unwrap();
        assert!(on_proto_range_change(&session, "[1,").await.is_err());

        let status = session.status().await.unwrap();
        assert_eq!(status.filter.proto_range, Some(ProtoRange { low: 37, high: 42 }));
        assert_eq!(source.0.load(Ordering::SeqCst), 0);
    }
}
