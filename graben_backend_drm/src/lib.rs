// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linux DRM/KMS backend for graben.
//!
//! Implements the `graben_core` control-node contract over a
//! `/dev/dri/card<N>` device via drm-rs and exposes [`DrmOutput`], the owned
//! handle for one bound display output:
//!
//! ```no_run
//! use graben_backend_drm::{CardSelector, DrmOutput, FramebufferSpec, PixelFormat};
//!
//! # fn demo(handle: u32) -> Result<(), Box<dyn std::error::Error>> {
//! let mut output = DrmOutput::open(CardSelector::Auto)?;
//! let framebuffer = output
//!     .add_buffer(&FramebufferSpec {
//!         width: u32::from(output.width()),
//!         height: u32::from(output.height()),
//!         format: PixelFormat(u32::from_le_bytes(*b"XR24")),
//!         handle,
//!         pitch: u32::from(output.width()) * 4,
//!         offset: 0,
//!     })
//!     .ok_or_else(|| std::io::Error::other("buffer rejected"))?;
//! output.present(framebuffer, true);
//! # Ok(())
//! # }
//! ```
//!
//! The process must hold DRM master on the opened node, which in practice
//! means running on a bare TTY or under a session manager that grants it.
//! No tracing subscriber is installed here; embedders configure their own.

mod card;
mod output;
mod probe;

pub use output::DrmOutput;
pub use probe::CardSelector;

pub use graben_core::bind::OutputBinding;
pub use graben_core::error::BindError;
pub use graben_core::node::{FramebufferSpec, PixelFormat};
pub use graben_core::topology::FramebufferId;
