//! Sensor sample wire schema
//!
//! This module validates request bodies, decodes them into [`SensorSample`]s
//! and resolves caller-supplied timestamps.
//!
//! [`SensorSample`]: crate::types::SensorSample

mod timestamp;
mod validator;

pub use timestamp::*;
pub use validator::*;
