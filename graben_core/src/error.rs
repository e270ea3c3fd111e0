// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Initialization-phase error taxonomy.
//!
//! Binding an output either succeeds completely or fails with one of these
//! causes. Presentation-phase failures (mode-set, flip request, poll) are
//! deliberately *not* represented here: they are logged and swallowed,
//! consistent with best-effort display semantics.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::topology::ConnectorId;

/// Why an output could not be bound.
#[derive(Debug, Error)]
pub enum BindError {
    /// The display control node could not be opened read/write.
    #[error("failed to open display control node {}", path.display())]
    Open {
        /// Path of the node that failed to open.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The node opened but did not return a resource snapshot.
    #[error("resource snapshot unavailable")]
    Resources(#[source] io::Error),
    /// No connector on the node reports a connected display.
    #[error("no connected connector on this node")]
    NoConnectedOutput,
    /// The selected connector exposes an empty mode list.
    #[error("connector {0:?} exposes no modes")]
    NoMode(ConnectorId),
    /// Neither the connector's assigned encoder nor its usable-encoder set
    /// yields a CRTC.
    #[error("no usable CRTC for connector {0:?}")]
    NoCrtc(ConnectorId),
}
