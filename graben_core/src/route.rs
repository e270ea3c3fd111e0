// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CRTC routing for the selected connector.
//!
//! Two paths, tried in order:
//!
//! 1. **Direct**: the encoder currently assigned to the connector already has
//!    a CRTC bound; adopt it.
//! 2. **Capability search**: walk the connector's usable encoders and take
//!    the first snapshot CRTC slot whose bit is set in an encoder's
//!    capability mask.
//!
//! Absence is expressed with `Option`/`Result` throughout. The routing
//! result is a plain [`CrtcId`]; CRTC state stays with the driver.

use tracing::warn;

use crate::error::BindError;
use crate::node::ControlNode;
use crate::topology::{ConnectorRecord, CrtcId, ResourceSnapshot};

/// Determines which CRTC will drive `connector`.
///
/// An already-bound CRTC on the connector's assigned encoder is preferred
/// over any capability-derived fallback. Encoders whose detail query fails
/// are skipped.
pub fn resolve_crtc(
    node: &impl ControlNode,
    snapshot: &ResourceSnapshot,
    connector: &ConnectorRecord,
) -> Result<CrtcId, BindError> {
    if let Some(assigned) = connector.current_encoder {
        for &id in &snapshot.encoders {
            if id != assigned {
                continue;
            }
            match node.encoder(id) {
                Ok(record) => {
                    if let Some(crtc) = record.crtc {
                        return Ok(crtc);
                    }
                }
                Err(err) => {
                    warn!(encoder = id.0, error = %err, "assigned encoder query failed");
                }
            }
            break;
        }
    }

    // The assigned encoder gave us nothing; search the connector's usable
    // set for the first capable CRTC slot.
    for &id in &connector.usable_encoders {
        let record = match node.encoder(id) {
            Ok(record) => record,
            Err(err) => {
                warn!(encoder = id.0, error = %err, "skipping encoder: detail query failed");
                continue;
            }
        };
        for slot in 0..snapshot.crtcs.len() {
            if record.can_drive_slot(slot) {
                if let Some(crtc) = snapshot.crtc_slot(slot) {
                    return Ok(crtc);
                }
            }
        }
    }

    Err(BindError::NoCrtc(connector.id))
}
