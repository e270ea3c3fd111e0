// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Control-node contract for platform backends.
//!
//! Graben splits platform-specific work into *backend* crates. Core code —
//! selection policy, CRTC routing, the framebuffer registry, and the present
//! protocol — speaks to hardware exclusively through the [`ControlNode`]
//! trait defined here. Backend crates implement it over a real display
//! control device; test code implements it over scripted records.
//!
//! # Crate boundaries
//!
//! `graben_core` owns the topology records, the policy that runs over them,
//! and this contract module. Backend crates depend on `graben_core` and
//! provide device glue: opening the node, translating driver structures into
//! records, and issuing the mode-set/flip calls. Application code depends on
//! a backend and drives presentation through the handle it returns.
//!
//! # Completion events
//!
//! Asynchronous flips complete at the next vertical blank. Rather than a
//! registered callback mutating shared state, a node reports completions as
//! [`FlipComplete`] values from [`ControlNode::drain_events`]; the present
//! loop in [`present`](crate::present) consumes them directly.
//!
//! # Errors
//!
//! All methods return [`std::io::Result`]: every operation bottoms out in an
//! ioctl-style driver call whose failure is an OS error. Initialization maps
//! these into the [`BindError`](crate::error::BindError) taxonomy;
//! presentation-phase failures are logged and swallowed by policy.

use std::fmt;
use std::io;

use crate::topology::{
    ConnectorId, ConnectorRecord, CrtcId, EncoderId, EncoderRecord, FramebufferId, ModeRecord,
    ResourceSnapshot,
};

/// A pixel format as a little-endian fourcc code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat(pub u32);

impl fmt::Debug for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_le_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            write!(f, "PixelFormat(")?;
            for byte in bytes {
                write!(f, "{}", byte as char)?;
            }
            write!(f, ")")
        } else {
            write!(f, "PixelFormat({:#010x})", self.0)
        }
    }
}

/// Description of a single-plane buffer to register for scanout.
///
/// Plane slots 1–3 of the underlying driver call are left unused/zeroed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramebufferSpec {
    /// Buffer width in pixels.
    pub width: u32,
    /// Buffer height in pixels.
    pub height: u32,
    /// Pixel format fourcc.
    pub format: PixelFormat,
    /// Driver buffer-object handle backing plane 0.
    pub handle: u32,
    /// Row pitch of plane 0 in bytes.
    pub pitch: u32,
    /// Byte offset of plane 0 within the buffer object.
    pub offset: u32,
}

/// A page-flip completion delivered at vertical blank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlipComplete {
    /// The CRTC whose scanout buffer was swapped.
    pub crtc: CrtcId,
    /// Driver frame counter at completion.
    pub frame: u32,
}

/// An open display control node.
///
/// One implementation wraps the real device; the `graben_harness` crate
/// provides a scripted implementation for tests. All methods take `&self`:
/// the node is a handle, and callers serialize use of it.
pub trait ControlNode {
    /// Queries the node's enumerable resources as a single snapshot.
    fn resources(&self) -> io::Result<ResourceSnapshot>;

    /// Fetches full detail for one connector.
    fn connector(&self, id: ConnectorId) -> io::Result<ConnectorRecord>;

    /// Fetches full detail for one encoder.
    fn encoder(&self, id: EncoderId) -> io::Result<EncoderRecord>;

    /// Registers a single-plane buffer and returns its driver-assigned
    /// framebuffer identifier.
    fn create_framebuffer(&self, spec: &FramebufferSpec) -> io::Result<FramebufferId>;

    /// Releases a registered framebuffer.
    fn destroy_framebuffer(&self, id: FramebufferId) -> io::Result<()>;

    /// Synchronously binds `crtc` to scan out `framebuffer` through
    /// `connector` with timing `mode`, at zero display offset.
    fn set_scanout(
        &self,
        crtc: CrtcId,
        framebuffer: FramebufferId,
        connector: ConnectorId,
        mode: &ModeRecord,
    ) -> io::Result<()>;

    /// Requests an asynchronous page flip of `crtc` to `framebuffer`, with a
    /// completion event delivered at the next vertical blank.
    fn queue_flip(&self, crtc: CrtcId, framebuffer: FramebufferId) -> io::Result<()>;

    /// Blocks until the node has events ready to dispatch. No timeout.
    fn wait_readable(&self) -> io::Result<()>;

    /// Dispatches pending driver events, returning any flip completions.
    fn drain_events(&self) -> io::Result<Vec<FlipComplete>>;
}

#[cfg(test)]
mod tests {
    use super::PixelFormat;

    #[test]
    fn printable_fourcc_debugs_as_text() {
        // 'XR24' little-endian.
        let format = PixelFormat(u32::from_le_bytes(*b"XR24"));
        assert_eq!(format!("{format:?}"), "PixelFormat(XR24)");
    }

    #[test]
    fn unprintable_fourcc_debugs_as_hex() {
        let format = PixelFormat(0x0000_0001);
        assert_eq!(format!("{format:?}"), "PixelFormat(0x00000001)");
    }
}
