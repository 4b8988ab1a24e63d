// ABOUTME: Tools engine module wiring traits, registry, context, results, and the dispatcher
// ABOUTME: Every side effect the agent can take is a tool registered here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Tools Engine
//!
//! Tools are the only way the agent touches the world. Each tool is a
//! schema-described callable registered by name; the dispatcher routes model
//! invocations to handlers while enforcing the run's safety bounds
//! (deduplication, per-tool caps, loop detection, error containment).

pub mod context;
pub mod dispatcher;
pub mod implementations;
pub mod registry;
pub mod result;
pub mod traits;

pub use context::ToolExecutionContext;
pub use dispatcher::{DispatchOutcome, LoopControl, ToolDispatcher, LOOP_ABORT_ANSWER};
pub use registry::ToolRegistry;
pub use result::{ToolResult, ToolStatus};
pub use traits::{AgentTool, ToolCapabilities};
