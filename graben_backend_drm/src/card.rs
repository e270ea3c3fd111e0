// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The control node over a real `/dev/dri/card<N>` device.
//!
//! [`Card`] owns the opened file and implements the `graben_core` control
//! contract by translating between identifier records and drm-rs structures.
//! Handles in the kernel interface are nonzero; the zero-identifier checks
//! here are the only place that invariant is enforced.

use std::fs::{File, OpenOptions};
use std::io;
use std::num::NonZeroU32;
use std::os::unix::io::{AsFd, BorrowedFd};
use std::path::PathBuf;

use drm::buffer::{DrmFourcc, DrmModifier, Handle as BufferHandle, PlanarBuffer};
use drm::control::{
    connector, crtc, encoder, framebuffer, Device as ControlDevice, Event, FbCmd2Flags, Mode,
    ModeTypeFlags, PageFlipFlags, ResourceHandles,
};
use drm::Device as BasicDevice;
use graben_core::error::BindError;
use graben_core::node::{ControlNode, FlipComplete, FramebufferSpec, PixelFormat};
use graben_core::topology::{
    ConnectorId, ConnectorRecord, ConnectorState, CrtcId, EncoderId, EncoderRecord, FramebufferId,
    ModeRecord, ResourceSnapshot,
};
use rustix::event::{poll, PollFd, PollFlags};

/// Borrowed device view used to query resources before [`Card`] exists.
struct NodeFd<'a>(&'a File);

impl AsFd for NodeFd<'_> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}

impl BasicDevice for NodeFd<'_> {}
impl ControlDevice for NodeFd<'_> {}

/// An open display control node.
#[derive(Debug)]
pub(crate) struct Card {
    file: File,
    path: PathBuf,
    resources: ResourceHandles,
}

impl AsFd for Card {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl BasicDevice for Card {}
impl ControlDevice for Card {}

impl Card {
    /// Opens the node at `path` read/write and snapshots its resource
    /// handles.
    pub(crate) fn open(path: PathBuf) -> Result<Self, BindError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| BindError::Open {
                path: path.clone(),
                source,
            })?;
        let resources = NodeFd(&file)
            .resource_handles()
            .map_err(BindError::Resources)?;
        Ok(Self {
            file,
            path,
            resources,
        })
    }

    /// Path this node was opened from.
    pub(crate) fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Derives the slot-indexed capability bitmask for an encoder from the
    /// kernel's opaque CRTC filter.
    fn capability_mask(&self, info: &encoder::Info) -> u32 {
        let capable = self.resources.filter_crtcs(info.possible_crtcs());
        let mut mask = 0_u32;
        for (slot, handle) in self.resources.crtcs().iter().enumerate().take(32) {
            if capable.contains(handle) {
                mask |= 1_u32 << slot;
            }
        }
        mask
    }

    /// Recovers the native mode descriptor a [`ModeRecord`] was built from.
    ///
    /// The record's list index is authoritative as long as the connector
    /// still exposes a matching mode there; otherwise the list is searched
    /// for an equivalent timing.
    fn native_mode(&self, handle: connector::Handle, record: &ModeRecord) -> io::Result<Mode> {
        let info = ControlDevice::get_connector(self, handle, false)?;
        let matches_record = |mode: &Mode| mode.size() == (record.width, record.height);
        info.modes()
            .get(record.index)
            .copied()
            .filter(matches_record)
            .or_else(|| {
                info.modes()
                    .iter()
                    .copied()
                    .find(|mode| matches_record(mode) && mode.vrefresh() == record.refresh_hz)
            })
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "bound mode is no longer exposed by the connector",
                )
            })
    }
}

impl ControlNode for Card {
    fn resources(&self) -> io::Result<ResourceSnapshot> {
        Ok(ResourceSnapshot {
            crtcs: self
                .resources
                .crtcs()
                .iter()
                .map(|&handle| CrtcId(u32::from(handle)))
                .collect(),
            encoders: self
                .resources
                .encoders()
                .iter()
                .map(|&handle| EncoderId(u32::from(handle)))
                .collect(),
            connectors: self
                .resources
                .connectors()
                .iter()
                .map(|&handle| ConnectorId(u32::from(handle)))
                .collect(),
        })
    }

    fn connector(&self, id: ConnectorId) -> io::Result<ConnectorRecord> {
        let handle = connector::Handle::from(nonzero_id(id.0, "connector")?);
        let info = ControlDevice::get_connector(self, handle, false)?;
        Ok(ConnectorRecord {
            id,
            state: connector_state(info.state()),
            modes: info
                .modes()
                .iter()
                .enumerate()
                .map(|(index, mode)| mode_record(index, mode))
                .collect(),
            current_encoder: info
                .current_encoder()
                .map(|handle| EncoderId(u32::from(handle))),
            usable_encoders: info
                .encoders()
                .iter()
                .map(|&handle| EncoderId(u32::from(handle)))
                .collect(),
        })
    }

    fn encoder(&self, id: EncoderId) -> io::Result<EncoderRecord> {
        let handle = encoder::Handle::from(nonzero_id(id.0, "encoder")?);
        let info = ControlDevice::get_encoder(self, handle)?;
        Ok(EncoderRecord {
            id,
            crtc: info.crtc().map(|handle| CrtcId(u32::from(handle))),
            possible_crtcs: self.capability_mask(&info),
        })
    }

    fn create_framebuffer(&self, spec: &FramebufferSpec) -> io::Result<FramebufferId> {
        let plane = SinglePlane {
            width: spec.width,
            height: spec.height,
            format: scanout_format(spec.format)?,
            handle: buffer_handle(spec.handle)?,
            pitch: spec.pitch,
            offset: spec.offset,
        };
        let handle = self.add_planar_framebuffer(&plane, FbCmd2Flags::empty())?;
        Ok(FramebufferId(u32::from(handle)))
    }

    fn destroy_framebuffer(&self, id: FramebufferId) -> io::Result<()> {
        let handle = framebuffer::Handle::from(nonzero_id(id.0, "framebuffer")?);
        ControlDevice::destroy_framebuffer(self, handle)
    }

    fn set_scanout(
        &self,
        crtc: CrtcId,
        framebuffer: FramebufferId,
        connector: ConnectorId,
        mode: &ModeRecord,
    ) -> io::Result<()> {
        let crtc_handle = crtc::Handle::from(nonzero_id(crtc.0, "crtc")?);
        let fb_handle = framebuffer::Handle::from(nonzero_id(framebuffer.0, "framebuffer")?);
        let connector_handle = connector::Handle::from(nonzero_id(connector.0, "connector")?);
        let native = self.native_mode(connector_handle, mode)?;
        self.set_crtc(
            crtc_handle,
            Some(fb_handle),
            (0, 0),
            &[connector_handle],
            Some(native),
        )
    }

    fn queue_flip(&self, crtc: CrtcId, framebuffer: FramebufferId) -> io::Result<()> {
        let crtc_handle = crtc::Handle::from(nonzero_id(crtc.0, "crtc")?);
        let fb_handle = framebuffer::Handle::from(nonzero_id(framebuffer.0, "framebuffer")?);
        self.page_flip(crtc_handle, fb_handle, PageFlipFlags::EVENT, None)
    }

    fn wait_readable(&self) -> io::Result<()> {
        let mut fds = [PollFd::new(&self.file, PollFlags::IN)];
        poll(&mut fds, None)?;
        Ok(())
    }

    fn drain_events(&self) -> io::Result<Vec<FlipComplete>> {
        let mut completions = Vec::new();
        for event in self.receive_events()? {
            match event {
                Event::PageFlip(flip) => completions.push(FlipComplete {
                    crtc: CrtcId(u32::from(flip.crtc)),
                    frame: flip.frame,
                }),
                // Vblank events are only delivered when separately requested;
                // nothing here subscribes to them.
                Event::Vblank(_) | Event::Unknown(_) => {}
            }
        }
        Ok(completions)
    }
}

/// Plane-0-only buffer description for the planar framebuffer call.
#[derive(Debug)]
struct SinglePlane {
    width: u32,
    height: u32,
    format: DrmFourcc,
    handle: BufferHandle,
    pitch: u32,
    offset: u32,
}

impl PlanarBuffer for SinglePlane {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn format(&self) -> DrmFourcc {
        self.format
    }

    fn modifier(&self) -> Option<DrmModifier> {
        None
    }

    fn pitches(&self) -> [u32; 4] {
        [self.pitch, 0, 0, 0]
    }

    fn handles(&self) -> [Option<BufferHandle>; 4] {
        [Some(self.handle), None, None, None]
    }

    fn offsets(&self) -> [u32; 4] {
        [self.offset, 0, 0, 0]
    }
}

fn connector_state(state: connector::State) -> ConnectorState {
    match state {
        connector::State::Connected => ConnectorState::Connected,
        connector::State::Disconnected => ConnectorState::Disconnected,
        connector::State::Unknown => ConnectorState::Unknown,
    }
}

fn mode_record(index: usize, mode: &Mode) -> ModeRecord {
    let (width, height) = mode.size();
    ModeRecord {
        index,
        width,
        height,
        refresh_hz: mode.vrefresh(),
        preferred: mode.mode_type().contains(ModeTypeFlags::PREFERRED),
        name: mode.name().to_string_lossy().into_owned(),
    }
}

/// Validates a pixel format fourcc against the set the kernel headers name.
fn scanout_format(format: PixelFormat) -> io::Result<DrmFourcc> {
    DrmFourcc::try_from(format.0)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))
}

fn buffer_handle(raw: u32) -> io::Result<BufferHandle> {
    NonZeroU32::new(raw).map(BufferHandle::from).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "buffer handle 0 does not name an allocation",
        )
    })
}

fn nonzero_id(raw: u32, what: &str) -> io::Result<NonZeroU32> {
    NonZeroU32::new(raw).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{what} id 0 does not name a resource"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{buffer_handle, nonzero_id, scanout_format, SinglePlane};
    use drm::buffer::{DrmFourcc, PlanarBuffer};
    use graben_core::node::PixelFormat;
    use std::num::NonZeroU32;

    #[test]
    fn xr24_fourcc_maps_to_a_known_format() {
        let format = scanout_format(PixelFormat(u32::from_le_bytes(*b"XR24")))
            .expect("kernel headers name XR24");
        assert_eq!(format, DrmFourcc::Xrgb8888);
    }

    #[test]
    fn unknown_fourcc_is_rejected_before_reaching_the_driver() {
        assert!(scanout_format(PixelFormat(0)).is_err());
    }

    #[test]
    fn zero_valued_handles_and_ids_are_rejected() {
        assert!(buffer_handle(0).is_err());
        assert!(nonzero_id(0, "crtc").is_err());
        assert_eq!(
            nonzero_id(31, "crtc").expect("nonzero"),
            NonZeroU32::new(31).expect("nonzero")
        );
    }

    #[test]
    fn single_plane_layout_leaves_planes_one_to_three_empty() {
        let plane = SinglePlane {
            width: 1920,
            height: 1080,
            format: DrmFourcc::Xrgb8888,
            handle: drm::buffer::Handle::from(NonZeroU32::new(4).expect("nonzero")),
            pitch: 1920 * 4,
            offset: 0,
        };
        assert_eq!(plane.size(), (1920, 1080));
        assert_eq!(plane.pitches(), [1920 * 4, 0, 0, 0]);
        assert_eq!(plane.offsets(), [0, 0, 0, 0]);
        let handles = plane.handles();
        assert!(handles[0].is_some());
        assert!(handles[1..].iter().all(Option::is_none));
    }
}
