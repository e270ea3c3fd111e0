// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifier-indexed records for the display topology graph.
//!
//! The kernel exposes the scanout pipeline as a small graph: connectors
//! (physical ports) link through encoders (signal converters) to CRTCs
//! (scanout engines). This module models that graph as plain value records
//! keyed by stable integer identifiers, so selection and routing policy can
//! run over snapshots without holding driver resources. Lookup helpers
//! replace pointer traversal.

/// Identifies a physical display output port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectorId(pub u32);

/// Identifies an encoder, the hardware block bridging a connector to a CRTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncoderId(pub u32);

/// Identifies a CRTC scanout engine.
///
/// CRTC internals are owned by the driver; this crate only routes by
/// identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CrtcId(pub u32);

/// Identifies a registered framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FramebufferId(pub u32);

/// Point-in-time listing of the enumerable resources of one control node.
///
/// Produced once during initialization and discarded afterwards; topology is
/// never re-evaluated (hot-plug is out of scope).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceSnapshot {
    /// CRTC identifiers in slot order. The slot *index* is what encoder
    /// capability bitmasks refer to.
    pub crtcs: Vec<CrtcId>,
    /// Encoder identifiers in enumeration order.
    pub encoders: Vec<EncoderId>,
    /// Connector identifiers in enumeration order.
    pub connectors: Vec<ConnectorId>,
}

impl ResourceSnapshot {
    /// Returns the CRTC identifier occupying slot `slot`, if present.
    #[must_use]
    pub fn crtc_slot(&self, slot: usize) -> Option<CrtcId> {
        self.crtcs.get(slot).copied()
    }
}

/// Connection state reported for a connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectorState {
    /// A display is attached and responding.
    Connected,
    /// Nothing attached.
    Disconnected,
    /// The driver could not determine the state.
    Unknown,
}

/// A display timing descriptor exposed by a connector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeRecord {
    /// Position of this mode in its connector's mode list. Backends use it
    /// to recover the native descriptor at mode-set time.
    pub index: usize,
    /// Active horizontal resolution in pixels.
    pub width: u16,
    /// Active vertical resolution in pixels.
    pub height: u16,
    /// Nominal vertical refresh rate in Hz.
    pub refresh_hz: u32,
    /// Whether the hardware/firmware flagged this mode as preferred.
    pub preferred: bool,
    /// Human-readable mode name (e.g. `1920x1080`).
    pub name: String,
}

impl ModeRecord {
    /// Returns the pixel area of this mode, the metric used when no mode is
    /// flagged preferred.
    #[must_use]
    pub fn area(&self) -> u32 {
        u32::from(self.width) * u32::from(self.height)
    }
}

/// Full detail for one connector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectorRecord {
    /// The connector's identifier.
    pub id: ConnectorId,
    /// Current connection state.
    pub state: ConnectorState,
    /// Supported modes in driver order.
    pub modes: Vec<ModeRecord>,
    /// The encoder currently assigned to this connector, if any.
    pub current_encoder: Option<EncoderId>,
    /// Encoders this connector is electrically able to use.
    pub usable_encoders: Vec<EncoderId>,
}

/// Full detail for one encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderRecord {
    /// The encoder's identifier.
    pub id: EncoderId,
    /// The CRTC currently bound to this encoder, if any.
    pub crtc: Option<CrtcId>,
    /// Capability bitmask: bit `i` set means this encoder can drive the CRTC
    /// in snapshot slot `i`.
    pub possible_crtcs: u32,
}

impl EncoderRecord {
    /// Returns whether this encoder can drive the CRTC in snapshot slot
    /// `slot`.
    #[must_use]
    pub fn can_drive_slot(&self, slot: usize) -> bool {
        u32::try_from(slot).is_ok_and(|bit| bit < 32 && self.possible_crtcs & (1 << bit) != 0)
    }
}
