// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The initialization pipeline: snapshot → connector → mode → CRTC.
//!
//! Binding succeeds if and only if a connected connector, a non-empty mode
//! list, and a resolvable CRTC exist simultaneously on one node. The result
//! is an owned [`OutputBinding`]; the snapshot and all unselected records
//! are dropped when this function returns.

use tracing::debug;

use crate::error::BindError;
use crate::node::ControlNode;
use crate::route::resolve_crtc;
use crate::select::{select_connector, select_mode};
use crate::topology::{ConnectorId, CrtcId, ModeRecord};

/// The bound (connector, mode, CRTC) tuple for one display output.
///
/// Owned exclusively by the backend output handle for its lifetime; the
/// registry and presenter read it but never mutate it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputBinding {
    /// The retained connector.
    pub connector: ConnectorId,
    /// The retained mode.
    pub mode: ModeRecord,
    /// The CRTC that will drive the connector.
    pub crtc: CrtcId,
}

/// Runs the full selection pipeline against an open node.
pub fn bind_output(node: &impl ControlNode) -> Result<OutputBinding, BindError> {
    let snapshot = node.resources().map_err(BindError::Resources)?;
    let connector = select_connector(node, &snapshot)?;
    let mode = select_mode(&connector)?;
    let crtc = resolve_crtc(node, &snapshot, &connector)?;

    debug!(
        connector = connector.id.0,
        crtc = crtc.0,
        mode = %mode.name,
        refresh_hz = mode.refresh_hz,
        "bound display output"
    );

    Ok(OutputBinding {
        connector: connector.id,
        mode,
        crtc,
    })
}
