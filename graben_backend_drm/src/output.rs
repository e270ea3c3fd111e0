// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The owned display-output handle.

use graben_core::bind::{bind_output, OutputBinding};
use graben_core::error::BindError;
use graben_core::node::FramebufferSpec;
use graben_core::present::Presenter;
use graben_core::registry::FramebufferRegistry;
use graben_core::topology::FramebufferId;
use tracing::info;

use crate::card::Card;
use crate::probe::{self, CardSelector};

/// One bound display output on a DRM card.
///
/// Owns the open control node, the (connector, mode, CRTC) binding, and the
/// framebuffer registry. Dropping the handle releases every framebuffer
/// still registered and closes the node; the display is left on whatever
/// buffer was last scanned out.
#[derive(Debug)]
pub struct DrmOutput {
    card: Card,
    card_index: u32,
    binding: OutputBinding,
    registry: FramebufferRegistry,
    presenter: Presenter,
}

impl DrmOutput {
    /// Opens a card per `selector` and binds its first connected output.
    ///
    /// With [`CardSelector::Auto`], candidates are tried in ascending index
    /// order and a card that opens but cannot complete the binding pipeline
    /// is discarded in favor of the next.
    pub fn open(selector: CardSelector) -> Result<Self, BindError> {
        probe::probe_candidates(selector, |index| {
            let card = Card::open(probe::card_path(index))?;
            let binding = bind_output(&card)?;
            info!(
                path = %card.path().display(),
                connector = binding.connector.0,
                crtc = binding.crtc.0,
                mode = %binding.mode.name,
                refresh_hz = binding.mode.refresh_hz,
                "display output ready"
            );
            Ok(Self {
                card,
                card_index: index,
                binding,
                registry: FramebufferRegistry::new(),
                presenter: Presenter::new(),
            })
        })
    }

    /// Index of the card node this output runs on.
    #[must_use]
    pub fn card_index(&self) -> u32 {
        self.card_index
    }

    /// The bound (connector, mode, CRTC) tuple.
    #[must_use]
    pub fn binding(&self) -> &OutputBinding {
        &self.binding
    }

    /// Active horizontal resolution in pixels.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.binding.mode.width
    }

    /// Active vertical resolution in pixels.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.binding.mode.height
    }

    /// Nominal refresh rate of the bound mode in Hz.
    #[must_use]
    pub fn refresh_hz(&self) -> u32 {
        self.binding.mode.refresh_hz
    }

    /// Name of the bound mode, as reported by the driver.
    #[must_use]
    pub fn mode_name(&self) -> &str {
        &self.binding.mode.name
    }

    /// Registers a single-plane buffer for scanout.
    ///
    /// Returns `None` when the driver rejects the buffer; the rejection is
    /// logged and later registrations are unaffected.
    pub fn add_buffer(&mut self, spec: &FramebufferSpec) -> Option<FramebufferId> {
        self.registry.add_buffer(&self.card, spec)
    }

    /// Releases one registered framebuffer, best-effort.
    pub fn remove_buffer(&mut self, id: FramebufferId) {
        self.registry.remove_buffer(&self.card, id);
    }

    /// Presents `framebuffer` on the bound output.
    ///
    /// With `wait_for_vsync` the call queues a page flip and blocks until
    /// the completion event for this output's CRTC arrives at vertical
    /// blank; otherwise the buffer is set synchronously and the call returns
    /// immediately. Presentation failures are logged, never returned.
    pub fn present(&mut self, framebuffer: FramebufferId, wait_for_vsync: bool) {
        self.presenter
            .present(&self.card, &self.binding, framebuffer, wait_for_vsync);
    }
}

impl Drop for DrmOutput {
    fn drop(&mut self) {
        self.registry.release_all(&self.card);
    }
}
