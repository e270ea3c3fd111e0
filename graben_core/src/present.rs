// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two-mode present protocol.
//!
//! Presentation is best-effort: driver failures on either path are logged
//! and swallowed, and the only caller-visible signal of a failed present is
//! the absence of a visible frame update.
//!
//! - **Immediate**: one synchronous mode-set binding the output's CRTC,
//!   framebuffer, connector, and mode. Fire and forget.
//! - **Vsync-gated**: an asynchronous flip request followed by a blocking
//!   wait for its completion event at vertical blank.
//!
//! The wait is single-threaded and uncancellable: once entered, it ends only
//! on a completion event or an unrecoverable poll failure. Callers serialize
//! presents; `&mut self` makes overlapping calls unrepresentable.

use tracing::error;

use crate::bind::OutputBinding;
use crate::node::ControlNode;
use crate::topology::FramebufferId;

/// Where the presenter is within a vsync-gated present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PresentState {
    /// No flip outstanding.
    Idle,
    /// A flip has been queued and its completion event is awaited.
    FlipRequested,
}

/// Issues mode-sets and page flips for one bound output.
///
/// Every call starts and ends in the idle state, including the failure
/// paths.
#[derive(Debug)]
pub struct Presenter {
    state: PresentState,
}

impl Presenter {
    /// Creates an idle presenter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: PresentState::Idle,
        }
    }

    /// Presents `framebuffer` on the bound output.
    ///
    /// With `wait_for_vsync` unset, this issues exactly one mode-set call
    /// and returns without blocking, regardless of the driver's answer.
    /// With it set, this blocks the calling thread until the flip's
    /// completion event has been dispatched (or the poll fails).
    pub fn present(
        &mut self,
        node: &impl ControlNode,
        binding: &OutputBinding,
        framebuffer: FramebufferId,
        wait_for_vsync: bool,
    ) {
        debug_assert_eq!(
            self.state,
            PresentState::Idle,
            "present calls must be serialized by the caller"
        );

        if !wait_for_vsync {
            if let Err(err) = node.set_scanout(
                binding.crtc,
                framebuffer,
                binding.connector,
                &binding.mode,
            ) {
                error!(
                    crtc = binding.crtc.0,
                    framebuffer = framebuffer.0,
                    error = %err,
                    "mode-set failed"
                );
            }
            return;
        }

        if let Err(err) = node.queue_flip(binding.crtc, framebuffer) {
            error!(
                crtc = binding.crtc.0,
                framebuffer = framebuffer.0,
                error = %err,
                "page-flip request failed"
            );
            return;
        }
        self.state = PresentState::FlipRequested;

        'wait: loop {
            if let Err(err) = node.wait_readable() {
                error!(error = %err, "poll on control node failed; abandoning flip wait");
                break 'wait;
            }
            match node.drain_events() {
                Ok(completions) => {
                    for completion in completions {
                        if completion.crtc == binding.crtc {
                            break 'wait;
                        }
                    }
                }
                Err(err) => {
                    error!(error = %err, "event dispatch failed; abandoning flip wait");
                    break 'wait;
                }
            }
        }

        self.state = PresentState::Idle;
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use graben_core::bind::OutputBinding;
    use graben_core::node::FlipComplete;
    use graben_core::present::Presenter;
    use graben_core::topology::{ConnectorId, CrtcId, FramebufferId, ModeRecord};
    use graben_harness::ScriptedNode;

    fn binding() -> OutputBinding {
        OutputBinding {
            connector: ConnectorId(1),
            mode: ModeRecord {
                index: 0,
                width: 1920,
                height: 1080,
                refresh_hz: 60,
                preferred: true,
                name: "1920x1080".to_owned(),
            },
            crtc: CrtcId(7),
        }
    }

    #[test]
    fn immediate_mode_issues_exactly_one_mode_set() {
        let node = ScriptedNode::new();
        let mut presenter = Presenter::new();
        presenter.present(&node, &binding(), FramebufferId(30), false);

        let calls = node.scanout_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].crtc, CrtcId(7));
        assert_eq!(calls[0].framebuffer, FramebufferId(30));
        assert_eq!(calls[0].connector, ConnectorId(1));
        assert_eq!(node.poll_count(), 0);
        assert!(node.flip_requests().is_empty());
    }

    #[test]
    fn immediate_mode_swallows_driver_failure() {
        let mut node = ScriptedNode::new();
        node.fail_scanout();
        let mut presenter = Presenter::new();
        // No panic, no block; the error is logged and dropped.
        presenter.present(&node, &binding(), FramebufferId(30), false);
        assert_eq!(node.poll_count(), 0);
    }

    #[test]
    fn vsync_present_returns_after_one_poll_cycle() {
        let mut node = ScriptedNode::new();
        node.script_poll_ready(vec![FlipComplete {
            crtc: CrtcId(7),
            frame: 1,
        }]);

        let mut presenter = Presenter::new();
        presenter.present(&node, &binding(), FramebufferId(30), true);

        assert_eq!(node.flip_requests(), vec![(CrtcId(7), FramebufferId(30))]);
        assert_eq!(node.poll_count(), 1);
    }

    #[test]
    fn vsync_present_waits_through_unrelated_events() {
        let mut node = ScriptedNode::new();
        node.script_poll_ready(vec![FlipComplete {
            crtc: CrtcId(99),
            frame: 1,
        }]);
        node.script_poll_ready(vec![FlipComplete {
            crtc: CrtcId(7),
            frame: 2,
        }]);

        let mut presenter = Presenter::new();
        presenter.present(&node, &binding(), FramebufferId(30), true);
        assert_eq!(node.poll_count(), 2);
    }

    #[test]
    fn failed_flip_request_skips_the_wait_loop() {
        let mut node = ScriptedNode::new();
        node.fail_next_flip();
        let mut presenter = Presenter::new();
        presenter.present(&node, &binding(), FramebufferId(30), true);
        assert_eq!(node.poll_count(), 0);
    }

    #[test]
    fn poll_failure_aborts_the_wait() {
        let mut node = ScriptedNode::new();
        node.script_poll_error();
        let mut presenter = Presenter::new();
        presenter.present(&node, &binding(), FramebufferId(30), true);
        assert_eq!(node.poll_count(), 1);

        // The presenter returned to idle: an immediate present still works.
        presenter.present(&node, &binding(), FramebufferId(31), false);
        assert_eq!(node.scanout_calls().len(), 1);
    }
}
