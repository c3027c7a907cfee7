//! # Medgate - Role-Gated Clinical Assistant
//!
//! Exposes three clinical tools to a conversational front-end over MCP:
//! - `get_patient_info`: record lookup with clinical interpretation
//! - `analyze_xray`: chest X-ray classification plus interpretation
//! - `chat_with_agent`: free-form clinical questions, optionally about a patient
//!
//! Every call is audited, every record is redacted for the caller's role
//! before it reaches the language model, and every prompt/response pair is
//! kept on disk.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────────────────────────────┐
//!  MCP (stdio)   →   │           ToolDispatcher             │
//!  Session::ask  →   │  ┌──────────┐ ┌─────────┐ ┌───────┐  │
//!                    │  │ Patient  │ │ Imaging │ │ Chat  │  │
//!                    │  │ Record   │ │Analysis │ │       │  │
//!                    │  └────┬─────┘ └────┬────┘ └───┬───┘  │
//!                    │       └──── HandlerContext ───┘      │
//!                    │   AuditTrail · RedactionPolicy ·     │
//!                    │   RecordStore · ModelInvoker         │
//!                    └──────────────────────────────────────┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod compliance;
pub mod handlers;
pub mod mcp;
pub mod model;
pub mod routing;
pub mod store;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;
pub mod validation;

pub use handlers::{build_dispatcher, dispatcher_from_config, HandlerContext};
pub use types::{Config, Error, Result};
