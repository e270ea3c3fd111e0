// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Card node discovery.
//!
//! Binding a display output is all-or-nothing per card: a candidate that
//! opens but has no connected connector (or no routable CRTC) is as useless
//! as one that fails to open, so automatic probing retries the *whole*
//! pipeline on the next index rather than just the open.

use std::io;
use std::path::PathBuf;

use graben_core::error::BindError;
use tracing::{error, warn};

/// How to choose which `/dev/dri/card<N>` node to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardSelector {
    /// Try indices `0..10` in ascending order and adopt the first card on
    /// which the full bind pipeline succeeds.
    Auto,
    /// Try exactly this index, with no fallback.
    Index(u32),
}

/// Highest card index (exclusive) tried by [`CardSelector::Auto`].
pub(crate) const AUTO_PROBE_LIMIT: u32 = 10;

/// Path of the control node for a card index.
pub(crate) fn card_path(index: u32) -> PathBuf {
    PathBuf::from(format!("/dev/dri/card{index}"))
}

/// Runs `try_index` over the candidates named by `selector`, returning the
/// first success.
///
/// Each failed candidate is fully torn down (its value is dropped inside
/// `try_index`) before the next index is attempted. On exhaustion the error
/// from the last candidate is returned.
pub(crate) fn probe_candidates<T>(
    selector: CardSelector,
    mut try_index: impl FnMut(u32) -> Result<T, BindError>,
) -> Result<T, BindError> {
    match selector {
        CardSelector::Index(index) => try_index(index).inspect_err(|err| {
            error!(card = index, error = %err, "requested card failed to bind");
        }),
        CardSelector::Auto => {
            let mut last_error = None;
            for index in 0..AUTO_PROBE_LIMIT {
                match try_index(index) {
                    Ok(bound) => return Ok(bound),
                    Err(err) => {
                        warn!(card = index, error = %err, "card candidate failed, trying next");
                        last_error = Some(err);
                    }
                }
            }
            error!("no card in 0..{AUTO_PROBE_LIMIT} produced a usable display output");
            Err(last_error.unwrap_or_else(|| BindError::Open {
                path: card_path(0),
                source: io::Error::new(io::ErrorKind::NotFound, "no card candidates attempted"),
            }))
        }
    }
}
