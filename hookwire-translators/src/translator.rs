//! The translator capability.

use crate::payload::Payload;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Outcome of one translator invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    pub success: bool,
    pub message: String,
}

impl DeliveryResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// A configured unit that turns an inbound payload into an outbound action.
///
/// Instances are built once from configuration and shared across requests,
/// so `submit` takes `&self`. Every failure is reported through the returned
/// [`DeliveryResult`]; `submit` never errors out.
#[async_trait]
pub trait Translator: Send + Sync + fmt::Debug {
    /// Variant identifier this translator was built from
    fn variant(&self) -> &'static str;

    async fn submit(&self, payload: &Payload) -> DeliveryResult;
}
