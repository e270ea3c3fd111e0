// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output selection policy: one connector, one mode.
//!
//! Both scans are first-match over driver enumeration order. There is no
//! preference among multiple connected outputs and no retry; the caller's
//! card-probing loop is the only retry mechanism in the system.

use tracing::warn;

use crate::error::BindError;
use crate::node::ControlNode;
use crate::topology::{ConnectorRecord, ConnectorState, ModeRecord, ResourceSnapshot};

/// Returns the first connector in snapshot order whose state is connected.
///
/// Connectors whose detail query fails are skipped with a warning; scanning
/// stops at the first connected match, so records for later connectors are
/// never fetched.
pub fn select_connector(
    node: &impl ControlNode,
    snapshot: &ResourceSnapshot,
) -> Result<ConnectorRecord, BindError> {
    for &id in &snapshot.connectors {
        let record = match node.connector(id) {
            Ok(record) => record,
            Err(err) => {
                warn!(connector = id.0, error = %err, "skipping connector: detail query failed");
                continue;
            }
        };
        if record.state == ConnectorState::Connected {
            return Ok(record);
        }
    }
    Err(BindError::NoConnectedOutput)
}

/// Chooses a mode from the retained connector's list.
///
/// The first mode flagged preferred wins immediately. If none is flagged,
/// the largest width × height area wins, with the earliest-listed mode
/// taking exact-area ties.
pub fn select_mode(connector: &ConnectorRecord) -> Result<ModeRecord, BindError> {
    let mut best: Option<&ModeRecord> = None;
    for mode in &connector.modes {
        if mode.preferred {
            return Ok(mode.clone());
        }
        if best.is_none_or(|current| mode.area() > current.area()) {
            best = Some(mode);
        }
    }
    best.cloned().ok_or(BindError::NoMode(connector.id))
}

#[cfg(test)]
mod tests {
    use graben_core::error::BindError;
    use graben_core::select::{select_connector, select_mode};
    use graben_core::topology::{ConnectorId, ConnectorRecord, ConnectorState, ModeRecord};
    use graben_harness::ScriptedNode;

    fn mode(index: usize, width: u16, height: u16, preferred: bool) -> ModeRecord {
        ModeRecord {
            index,
            width,
            height,
            refresh_hz: 60,
            preferred,
            name: format!("{width}x{height}"),
        }
    }

    fn connector(id: u32, state: ConnectorState, modes: Vec<ModeRecord>) -> ConnectorRecord {
        ConnectorRecord {
            id: ConnectorId(id),
            state,
            modes,
            current_encoder: None,
            usable_encoders: Vec::new(),
        }
    }

    #[test]
    fn first_connected_connector_is_retained() {
        let mut node = ScriptedNode::new();
        node.add_connector(connector(1, ConnectorState::Disconnected, Vec::new()));
        node.add_connector(connector(2, ConnectorState::Connected, Vec::new()));
        node.add_connector(connector(3, ConnectorState::Connected, Vec::new()));

        let snapshot = node.snapshot();
        let selected = select_connector(&node, &snapshot).expect("one connector is connected");
        assert_eq!(selected.id, ConnectorId(2));
        // Scanning stopped at the match: the third connector was never fetched.
        assert_eq!(node.connector_fetches(), 2);
    }

    #[test]
    fn disconnected_and_unknown_states_are_not_selected() {
        let mut node = ScriptedNode::new();
        node.add_connector(connector(1, ConnectorState::Disconnected, Vec::new()));
        node.add_connector(connector(2, ConnectorState::Unknown, Vec::new()));

        let snapshot = node.snapshot();
        let err = select_connector(&node, &snapshot).unwrap_err();
        assert!(matches!(err, BindError::NoConnectedOutput));
    }

    #[test]
    fn failed_connector_query_is_skipped() {
        let mut node = ScriptedNode::new();
        // Listed in the snapshot but with no record behind it: the detail
        // query fails and the scan moves on.
        node.add_phantom_connector(9);
        node.add_connector(connector(2, ConnectorState::Connected, Vec::new()));

        let snapshot = node.snapshot();
        let selected = select_connector(&node, &snapshot).expect("second connector is connected");
        assert_eq!(selected.id, ConnectorId(2));
    }

    #[test]
    fn preferred_mode_wins_over_larger_area() {
        let record = connector(
            1,
            ConnectorState::Connected,
            vec![
                mode(0, 3840, 2160, false),
                mode(1, 1920, 1080, true),
                mode(2, 2560, 1440, false),
            ],
        );
        let selected = select_mode(&record).expect("mode list is non-empty");
        assert_eq!((selected.width, selected.height), (1920, 1080));
        assert_eq!(selected.index, 1);
    }

    #[test]
    fn first_preferred_mode_wins_ties() {
        let record = connector(
            1,
            ConnectorState::Connected,
            vec![mode(0, 1280, 720, true), mode(1, 1920, 1080, true)],
        );
        let selected = select_mode(&record).expect("mode list is non-empty");
        assert_eq!(selected.index, 0);
    }

    #[test]
    fn largest_area_wins_when_nothing_is_preferred() {
        let record = connector(
            1,
            ConnectorState::Connected,
            vec![
                mode(0, 1280, 720, false),
                mode(1, 2560, 1440, false),
                mode(2, 1920, 1080, false),
            ],
        );
        let selected = select_mode(&record).expect("mode list is non-empty");
        assert_eq!((selected.width, selected.height), (2560, 1440));
    }

    #[test]
    fn earliest_maximal_mode_wins_area_ties() {
        // 1600x900 and 1200x1200 have equal area; the earlier entry stays.
        let record = connector(
            1,
            ConnectorState::Connected,
            vec![mode(0, 1600, 900, false), mode(1, 1200, 1200, false)],
        );
        let selected = select_mode(&record).expect("mode list is non-empty");
        assert_eq!(selected.index, 0);
    }

    #[test]
    fn empty_mode_list_is_an_error() {
        let record = connector(4, ConnectorState::Connected, Vec::new());
        let err = select_mode(&record).unwrap_err();
        assert!(matches!(err, BindError::NoMode(ConnectorId(4))));
    }
}
