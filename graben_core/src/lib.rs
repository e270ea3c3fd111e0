// Copyright 2026 the Graben Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core policy and protocol for direct display scanout.
//!
//! `graben_core` models the kernel's display pipeline (connectors, encoders,
//! CRTCs) as identifier-indexed value records, and implements the policy
//! that turns an open control node into a bound output plus the protocol
//! that pushes frames to it. It contains no platform code: all
//! device access goes through the [`ControlNode`](node::ControlNode) trait,
//! implemented by backend crates (and by `graben_harness` for tests).
//!
//! # Architecture
//!
//! Initialization composes four steps over one node:
//!
//! ```text
//!   ControlNode::resources() ──► ResourceSnapshot
//!        │
//!        ▼
//!   select_connector() ──► ConnectorRecord (first connected)
//!        │
//!        ▼
//!   select_mode() ──► ModeRecord (preferred, else largest area)
//!        │
//!        ▼
//!   resolve_crtc() ──► CrtcId (bound encoder, else capability search)
//!        │
//!        ▼
//!   OutputBinding (owned; snapshot and unselected records dropped)
//! ```
//!
//! After binding, [`registry::FramebufferRegistry`] manages presentable
//! buffers and [`present::Presenter`] pushes frames, either fire-and-forget
//! or blocking until the flip completes at vertical blank.
//!
//! **[`topology`]** — Identifier newtypes and value records for the
//! connector/encoder/CRTC graph.
//!
//! **[`node`]** — The [`ControlNode`](node::ControlNode) seam between policy
//! and platform, with structured [`FlipComplete`](node::FlipComplete)
//! events instead of completion callbacks.
//!
//! **[`select`]** / **[`route`]** — Output selection and CRTC routing
//! policy.
//!
//! **[`bind`]** — The initialization pipeline and the owned
//! [`OutputBinding`](bind::OutputBinding) it produces.
//!
//! **[`registry`]** / **[`present`]** — Per-frame framebuffer lifecycle and
//! the two-mode present protocol.
//!
//! **[`error`]** — The initialization failure taxonomy.
//!
//! This crate never installs a logging subscriber; it emits `tracing`
//! events and leaves subscriber choice to the embedding application.

pub mod bind;
pub mod error;
pub mod node;
pub mod present;
pub mod registry;
pub mod route;
pub mod select;
pub mod topology;
