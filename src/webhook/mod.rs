// src/webhook/mod.rs
//! Inbound webhook deliveries: payload shapes and canonical events.

mod event;
mod normalizer;

pub use event::{CanonicalEvent, EventMetadata, Notification, SubjectKind};
pub use normalizer::{EventNormalizer, PayloadShape};
