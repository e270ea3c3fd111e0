// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Framebuffer lifecycle bookkeeping.
//!
//! Registration maps a buffer description to a driver-assigned
//! [`FramebufferId`]. The registry tracks live identifiers so the owning
//! output handle can release whatever the caller did not remove explicitly.
//! Calls are independent: there is no ordering guarantee between
//! registrations, and repeating a registration with a different handle is
//! always safe.

use tracing::{debug, error};

use crate::node::{ControlNode, FramebufferSpec};
use crate::topology::FramebufferId;

/// Tracks framebuffers registered against one node.
#[derive(Debug, Default)]
pub struct FramebufferRegistry {
    live: Vec<FramebufferId>,
}

impl FramebufferRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { live: Vec::new() }
    }

    /// Registers a single-plane buffer with the driver.
    ///
    /// Returns the driver-assigned identifier, or `None` when the driver
    /// rejects the buffer; the rejection is logged with the OS error and is
    /// not otherwise surfaced. A rejected call never consumes an identifier.
    pub fn add_buffer(
        &mut self,
        node: &impl ControlNode,
        spec: &FramebufferSpec,
    ) -> Option<FramebufferId> {
        match node.create_framebuffer(spec) {
            Ok(id) => {
                debug!(
                    framebuffer = id.0,
                    width = spec.width,
                    height = spec.height,
                    format = ?spec.format,
                    "registered framebuffer"
                );
                self.live.push(id);
                Some(id)
            }
            Err(err) => {
                error!(
                    width = spec.width,
                    height = spec.height,
                    handle = spec.handle,
                    error = %err,
                    "framebuffer registration rejected"
                );
                None
            }
        }
    }

    /// Releases one framebuffer, best-effort.
    ///
    /// There is no verification path for already-removed identifiers, so
    /// failures are logged at debug level and swallowed.
    pub fn remove_buffer(&mut self, node: &impl ControlNode, id: FramebufferId) {
        self.live.retain(|&live| live != id);
        if let Err(err) = node.destroy_framebuffer(id) {
            debug!(framebuffer = id.0, error = %err, "framebuffer removal failed");
        }
    }

    /// Releases every framebuffer still tracked, best-effort.
    ///
    /// Run by the owning output handle when it is dropped.
    pub fn release_all(&mut self, node: &impl ControlNode) {
        for id in self.live.drain(..) {
            if let Err(err) = node.destroy_framebuffer(id) {
                debug!(framebuffer = id.0, error = %err, "framebuffer removal failed");
            }
        }
    }

    /// Returns the number of framebuffers currently tracked as live.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use graben_core::node::{FramebufferSpec, PixelFormat};
    use graben_core::registry::FramebufferRegistry;
    use graben_core::topology::FramebufferId;
    use graben_harness::ScriptedNode;

    fn spec(handle: u32) -> FramebufferSpec {
        FramebufferSpec {
            width: 1920,
            height: 1080,
            format: PixelFormat(u32::from_le_bytes(*b"XR24")),
            handle,
            pitch: 1920 * 4,
            offset: 0,
        }
    }

    #[test]
    fn distinct_handles_get_distinct_identifiers() {
        let node = ScriptedNode::new();
        let mut registry = FramebufferRegistry::new();
        let first = registry.add_buffer(&node, &spec(1)).expect("valid handle");
        let second = registry.add_buffer(&node, &spec(2)).expect("valid handle");
        assert_ne!(first, second);
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn rejected_handle_yields_none_and_a_later_call_still_succeeds() {
        let mut node = ScriptedNode::new();
        node.reject_handle(0xFFFF_FFFF);
        let mut registry = FramebufferRegistry::new();

        assert_eq!(registry.add_buffer(&node, &spec(0xFFFF_FFFF)), None);
        assert_eq!(registry.live_count(), 0);

        let id = registry.add_buffer(&node, &spec(3)).expect("valid handle");
        // The failed registration consumed nothing; this is a fresh id.
        assert!(!node.destroyed_framebuffers().contains(&id));
    }

    #[test]
    fn remove_buffer_swallows_driver_failure() {
        let node = ScriptedNode::new();
        let mut registry = FramebufferRegistry::new();
        // Never registered; the scripted node fails the destroy call.
        registry.remove_buffer(&node, FramebufferId(42));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn release_all_destroys_everything_still_tracked() {
        let node = ScriptedNode::new();
        let mut registry = FramebufferRegistry::new();
        let first = registry.add_buffer(&node, &spec(1)).expect("valid handle");
        let second = registry.add_buffer(&node, &spec(2)).expect("valid handle");
        registry.remove_buffer(&node, first);

        registry.release_all(&node);
        assert_eq!(registry.live_count(), 0);
        let destroyed = node.destroyed_framebuffers();
        assert!(destroyed.contains(&first));
        assert!(destroyed.contains(&second));
    }
}
