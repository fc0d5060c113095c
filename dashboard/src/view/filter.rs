use shared::types::{ProtoRange, ServerRecord, Snapshot, Totals};

/// User-selected filters. Lives independently of the snapshot it is applied to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub proto_range: Option<ProtoRange>,
    pub min_clients: Option<u32>,
    pub limit: Option<usize>,
}

/// One render pass worth of records and totals, borrowed from a snapshot.
#[derive(Debug)]
pub struct View<'a> {
    pub records: Vec<&'a ServerRecord>,
    pub total: Totals,
    /// Unknown while a protocol filter is active
    pub total_max: Option<Totals>,
    /// Applied per row by the renderer
    pub min_clients: Option<u32>,
    /// Applied per row by the renderer
    pub limit: Option<usize>,
}

/// Project a snapshot through the filter. The snapshot is never modified.
pub fn project<'a>(snapshot: &'a Snapshot, filter: &FilterState) -> View<'a> {
    let (records, total, total_max) = match filter.proto_range {
        Some(range) => {
            let records: Vec<&ServerRecord> = snapshot
                .list
                .iter()
                .filter(|r| range.overlaps(r.protocol_min, r.protocol_max))
                .collect();
            let total = Totals {
                clients: records.iter().map(|r| u64::from(r.clients)).sum(),
                servers: records.len() as u64,
            };
            (records, total, None)
        }
        // Unfiltered totals come from the list service as sent.
        None => (
            snapshot.list.iter().collect(),
            snapshot.total,
            Some(snapshot.total_max),
        ),
    };

    View {
        records,
        total,
        total_max,
        min_clients: filter.min_clients,
        limit: filter.limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, clients: u32, protocol_min: u32, protocol_max: u32) -> ServerRecord {
        ServerRecord {
            address: format!("{}.example.org", name),
            port: 30000,
            name: name.to_string(),
            clients,
            protocol_min,
            protocol_max,
            ..Default::default()
        }
    }

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::empty();
        snapshot.list = vec![
            record("old", 4, 24, 32),
            record("wide", 10, 30, 42),
            record("new", 7, 40, 42),
        ];
        snapshot.total = Totals { clients: 21, servers: 3 };
        snapshot.total_max = Totals { clients: 500, servers: 90 };
        snapshot
    }

    fn names(view: &View) -> Vec<String> {
        view.records.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_no_filter_keeps_everything() {
        let snapshot = snapshot();
        let view = project(&snapshot, &FilterState::default());

        assert_eq!(names(&view), vec!["old", "wide", "new"]);
        assert_eq!(view.total, Totals { clients: 21, servers: 3 });
        assert_eq!(view.total_max, Some(Totals { clients: 500, servers: 90 }));
    }

    #[test]
    fn test_no_filter_uses_reported_totals() {
        let mut snapshot = snapshot();
        // The service counts connected players from clients_list, not from
        // the per-record field.
        for record in &mut snapshot.list {
            record.clients = 0;
        }
        snapshot.total = Totals { clients: 3, servers: 1 };
        let view = project(&snapshot, &FilterState::default());

        assert_eq!(view.records.len(), 3);
        assert_eq!(view.total, Totals { clients: 3, servers: 1 });
    }

    #[test]
    fn test_proto_range_overlap_and_totals() {
        let snapshot = snapshot();
        let filter = FilterState {
            proto_range: Some(ProtoRange { low: 33, high: 39 }),
            ..Default::default()
        };
        let view = project(&snapshot, &filter);

        assert_eq!(names(&view), vec!["wide"]);
        assert_eq!(view.total, Totals { clients: 10, servers: 1 });
        assert_eq!(view.total_max, None);
    }

    #[test]
    fn test_survivor_property_holds_for_every_range() {
        let snapshot = snapshot();
        for low in 20..46 {
            for high in low..46 {
                let range = ProtoRange { low, high };
                let filter = FilterState {
                    proto_range: Some(range),
                    ..Default::default()
                };
                let view = project(&snapshot, &filter);

                let expected: Vec<&ServerRecord> = snapshot
                    .list
                    .iter()
                    .filter(|r| !(low > r.protocol_max || high < r.protocol_min))
                    .collect();
                assert_eq!(view.records.len(), expected.len());
                assert_eq!(view.total.servers, expected.len() as u64);
                assert_eq!(
                    view.total.clients,
                    expected.iter().map(|r| u64::from(r.clients)).sum::<u64>()
                );
            }
        }
    }

    #[test]
    fn test_min_clients_and_limit_pass_through() {
        let snapshot = snapshot();
        let filter = FilterState {
            min_clients: Some(5),
            limit: Some(1),
            ..Default::default()
        };
        let view = project(&snapshot, &filter);

        assert_eq!(view.records.len(), 3, "row predicates are left to the renderer");
        assert_eq!(view.min_clients, Some(5));
        assert_eq!(view.limit, Some(1));
    }

    #[test]
    fn test_filter_leaves_snapshot_untouched() {
        let snapshot = snapshot();
        let filter = FilterState {
            proto_range: Some(ProtoRange { low: 41, high: 41 }),
            ..Default::default()
        };
        let _ = project(&snapshot, &filter);

        assert_eq!(snapshot.list.len(), 3);
        assert_eq!(snapshot.total, Totals { clients: 21, servers: 3 });
    }
}
