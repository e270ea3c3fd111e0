// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scriptable control node for pipeline tests.
//!
//! [`ScriptedNode`] implements [`ControlNode`] over records installed by the
//! test, with togglable driver failures and a scripted poll sequence. Every
//! mode-set, flip request, poll, and framebuffer operation is recorded so
//! tests can assert on exact call patterns (one mode-set per immediate
//! present, one poll cycle per delivered flip event, and so on).
//!
//! The poll script is deliberately finite: when it runs out,
//! [`ControlNode::wait_readable`] fails instead of modelling an indefinite
//! block, so a present loop that would wait forever turns into a visible
//! test failure.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;

use graben_core::node::{ControlNode, FlipComplete, FramebufferSpec};
use graben_core::topology::{
    ConnectorId, ConnectorRecord, CrtcId, EncoderId, EncoderRecord, FramebufferId, ModeRecord,
    ResourceSnapshot,
};

/// One recorded synchronous mode-set call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanoutCall {
    /// CRTC the call addressed.
    pub crtc: CrtcId,
    /// Framebuffer the call bound.
    pub framebuffer: FramebufferId,
    /// Connector the call bound.
    pub connector: ConnectorId,
    /// Mode the call carried.
    pub mode: ModeRecord,
}

/// Outcome of one scripted poll.
#[derive(Clone, Debug)]
enum PollStep {
    /// The node becomes readable and the next drain yields these events.
    Ready(Vec<FlipComplete>),
    /// The poll itself fails.
    Error,
}

#[derive(Debug, Default)]
struct Inner {
    crtcs: Vec<CrtcId>,
    connector_order: Vec<ConnectorId>,
    connectors: Vec<ConnectorRecord>,
    encoder_order: Vec<EncoderId>,
    encoders: Vec<EncoderRecord>,
    fail_resources: bool,
    rejected_handles: Vec<u32>,
    next_framebuffer: u32,
    live_framebuffers: Vec<FramebufferId>,
    destroyed_framebuffers: Vec<FramebufferId>,
    fail_scanout: bool,
    scanout_calls: Vec<ScanoutCall>,
    fail_next_flip: bool,
    flip_requests: Vec<(CrtcId, FramebufferId)>,
    poll_script: VecDeque<PollStep>,
    poll_count: usize,
    pending_events: Vec<FlipComplete>,
    connector_fetches: usize,
}

/// A [`ControlNode`] whose topology and driver behavior are scripted.
#[derive(Debug, Default)]
pub struct ScriptedNode {
    inner: RefCell<Inner>,
}

impl ScriptedNode {
    /// Creates a node with empty topology and an unfailing driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends CRTC identifiers, in slot order.
    pub fn add_crtcs(&mut self, ids: &[u32]) {
        let inner = self.inner.get_mut();
        inner.crtcs.extend(ids.iter().copied().map(CrtcId));
    }

    /// Installs one connector record, enumerated after any already added.
    pub fn add_connector(&mut self, record: ConnectorRecord) {
        let inner = self.inner.get_mut();
        inner.connector_order.push(record.id);
        inner.connectors.push(record);
    }

    /// Lists a connector identifier in the snapshot without a record behind
    /// it, so its detail query fails.
    pub fn add_phantom_connector(&mut self, id: u32) {
        self.inner.get_mut().connector_order.push(ConnectorId(id));
    }

    /// Installs one encoder record, enumerated after any already added.
    pub fn add_encoder(&mut self, record: EncoderRecord) {
        let inner = self.inner.get_mut();
        inner.encoder_order.push(record.id);
        inner.encoders.push(record);
    }

    /// Lists an encoder identifier in the snapshot without a record behind
    /// it, so its detail query fails.
    pub fn add_phantom_encoder(&mut self, id: u32) {
        self.inner.get_mut().encoder_order.push(EncoderId(id));
    }

    /// Makes the resource snapshot query fail.
    pub fn fail_resources(&mut self) {
        self.inner.get_mut().fail_resources = true;
    }

    /// Makes framebuffer registration reject this buffer handle.
    pub fn reject_handle(&mut self, handle: u32) {
        self.inner.get_mut().rejected_handles.push(handle);
    }

    /// Makes every mode-set call fail (after being recorded).
    pub fn fail_scanout(&mut self) {
        self.inner.get_mut().fail_scanout = true;
    }

    /// Makes the next flip request fail.
    pub fn fail_next_flip(&mut self) {
        self.inner.get_mut().fail_next_flip = true;
    }

    /// Scripts one successful poll whose following drain yields `events`.
    pub fn script_poll_ready(&mut self, events: Vec<FlipComplete>) {
        self.inner
            .get_mut()
            .poll_script
            .push_back(PollStep::Ready(events));
    }

    /// Scripts one failing poll.
    pub fn script_poll_error(&mut self) {
        self.inner.get_mut().poll_script.push_back(PollStep::Error);
    }

    /// Returns the snapshot this node will serve, for direct policy calls.
    #[must_use]
    pub fn snapshot(&self) -> ResourceSnapshot {
        let inner = self.inner.borrow();
        ResourceSnapshot {
            crtcs: inner.crtcs.clone(),
            encoders: inner.encoder_order.clone(),
            connectors: inner.connector_order.clone(),
        }
    }

    /// Number of connector detail queries served (or failed).
    #[must_use]
    pub fn connector_fetches(&self) -> usize {
        self.inner.borrow().connector_fetches
    }

    /// All recorded mode-set calls, in order.
    #[must_use]
    pub fn scanout_calls(&self) -> Vec<ScanoutCall> {
        self.inner.borrow().scanout_calls.clone()
    }

    /// All recorded flip requests, in order.
    #[must_use]
    pub fn flip_requests(&self) -> Vec<(CrtcId, FramebufferId)> {
        self.inner.borrow().flip_requests.clone()
    }

    /// Number of polls performed, successful or not.
    #[must_use]
    pub fn poll_count(&self) -> usize {
        self.inner.borrow().poll_count
    }

    /// Identifiers passed to the destroy call, in order, including ones the
    /// driver rejected.
    #[must_use]
    pub fn destroyed_framebuffers(&self) -> Vec<FramebufferId> {
        self.inner.borrow().destroyed_framebuffers.clone()
    }
}

impl ControlNode for ScriptedNode {
    fn resources(&self) -> io::Result<ResourceSnapshot> {
        if self.inner.borrow().fail_resources {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "scripted resource failure",
            ));
        }
        Ok(self.snapshot())
    }

    fn connector(&self, id: ConnectorId) -> io::Result<ConnectorRecord> {
        let mut inner = self.inner.borrow_mut();
        inner.connector_fetches += 1;
        inner
            .connectors
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no record for connector"))
    }

    fn encoder(&self, id: EncoderId) -> io::Result<EncoderRecord> {
        self.inner
            .borrow()
            .encoders
            .iter()
            .find(|record| record.id == id)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no record for encoder"))
    }

    fn create_framebuffer(&self, spec: &FramebufferSpec) -> io::Result<FramebufferId> {
        let mut inner = self.inner.borrow_mut();
        if inner.rejected_handles.contains(&spec.handle) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "buffer handle rejected by script",
            ));
        }
        inner.next_framebuffer += 1;
        let id = FramebufferId(inner.next_framebuffer);
        inner.live_framebuffers.push(id);
        Ok(id)
    }

    fn destroy_framebuffer(&self, id: FramebufferId) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.destroyed_framebuffers.push(id);
        let was_live = inner.live_framebuffers.contains(&id);
        inner.live_framebuffers.retain(|&live| live != id);
        if was_live {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                "framebuffer was never registered",
            ))
        }
    }

    fn set_scanout(
        &self,
        crtc: CrtcId,
        framebuffer: FramebufferId,
        connector: ConnectorId,
        mode: &ModeRecord,
    ) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.scanout_calls.push(ScanoutCall {
            crtc,
            framebuffer,
            connector,
            mode: mode.clone(),
        });
        if inner.fail_scanout {
            return Err(io::Error::other("scripted mode-set failure"));
        }
        Ok(())
    }

    fn queue_flip(&self, crtc: CrtcId, framebuffer: FramebufferId) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_next_flip {
            inner.fail_next_flip = false;
            return Err(io::Error::other("scripted flip failure"));
        }
        inner.flip_requests.push((crtc, framebuffer));
        Ok(())
    }

    fn wait_readable(&self) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.poll_count += 1;
        match inner.poll_script.pop_front() {
            Some(PollStep::Ready(events)) => {
                inner.pending_events = events;
                Ok(())
            }
            Some(PollStep::Error) => Err(io::Error::other("scripted poll failure")),
            // An unscripted poll would block forever against real hardware;
            // fail loudly instead.
            None => Err(io::Error::other("poll script exhausted")),
        }
    }

    fn drain_events(&self) -> io::Result<Vec<FlipComplete>> {
        Ok(std::mem::take(&mut self.inner.borrow_mut().pending_events))
    }
}

#[cfg(test)]
mod tests {
    use super::ScriptedNode;
    use graben_core::node::{ControlNode, FlipComplete, FramebufferSpec, PixelFormat};
    use graben_core::topology::CrtcId;

    fn spec(handle: u32) -> FramebufferSpec {
        FramebufferSpec {
            width: 64,
            height: 64,
            format: PixelFormat(u32::from_le_bytes(*b"XR24")),
            handle,
            pitch: 64 * 4,
            offset: 0,
        }
    }

    #[test]
    fn framebuffer_identifiers_are_monotonic_and_never_reused() {
        let node = ScriptedNode::new();
        let first = node.create_framebuffer(&spec(1)).expect("accepted");
        node.destroy_framebuffer(first).expect("was live");
        let second = node.create_framebuffer(&spec(2)).expect("accepted");
        assert!(second.0 > first.0);
    }

    #[test]
    fn exhausted_poll_script_fails_instead_of_blocking() {
        let node = ScriptedNode::new();
        assert!(node.wait_readable().is_err());
        assert_eq!(node.poll_count(), 1);
    }

    #[test]
    fn drain_returns_events_from_the_last_ready_poll_once() {
        let mut node = ScriptedNode::new();
        node.script_poll_ready(vec![FlipComplete {
            crtc: CrtcId(3),
            frame: 9,
        }]);

        node.wait_readable().expect("scripted ready");
        let events = node.drain_events().expect("drain never fails");
        assert_eq!(events.len(), 1);
        assert!(node.drain_events().expect("drain never fails").is_empty());
    }
}
