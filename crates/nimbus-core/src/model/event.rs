//! LifecycleEvent — a message-queue notification. Ephemeral: exists from
//! dequeue until acknowledgement.

use super::instance::InstanceId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEventType {
    Launching,
    Terminating,
    Other,
}

/// The raw cloud lifecycle message payload (§6). Unknown fields are
/// ignored by serde's default struct deserialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LifecycleMessage {
    #[serde(rename = "EC2InstanceId")]
    pub ec2_instance_id: String,
    #[serde(rename = "LifecycleTransition")]
    pub lifecycle_transition: String,
    #[serde(rename = "LifecycleActionToken")]
    pub lifecycle_action_token: String,
    #[serde(rename = "AutoScalingGroupName")]
    pub auto_scaling_group_name: String,
    #[serde(rename = "LifecycleHookName")]
    pub lifecycle_hook_name: String,
}

const LAUNCHING: &str = "autoscaling:EC2_INSTANCE_LAUNCHING";
const TERMINATING: &str = "autoscaling:EC2_INSTANCE_TERMINATING";

impl LifecycleMessage {
    pub fn event_type(&self) -> LifecycleEventType {
        match self.lifecycle_transition.as_str() {
            LAUNCHING => LifecycleEventType::Launching,
            TERMINATING => LifecycleEventType::Terminating,
            _ => LifecycleEventType::Other,
        }
    }
}

/// A dequeued message paired with the receipt handle needed to acknowledge
/// it, before it has been parsed into a `LifecycleEvent`.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub body: String,
    pub receipt_handle: String,
}

/// The parsed, actionable event. Carries everything needed to run the
/// correct handler and to heartbeat/complete the cloud lifecycle hook.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub instance_id: InstanceId,
    pub event_type: LifecycleEventType,
    pub receipt_handle: String,
    pub token: String,
    pub hook_name: String,
    pub group_name: String,
}

impl LifecycleEvent {
    /// Parse a raw message body into an event. A parse failure still
    /// yields a best-effort `Other` event so the caller can acknowledge
    /// the message per the reactor's loose-coupling policy (§4.C step 2).
    pub fn parse(raw: &RawMessage) -> Result<Self, serde_json::Error> {
        let msg: LifecycleMessage = serde_json::from_str(&raw.body)?;
        Ok(Self {
            instance_id: InstanceId(msg.ec2_instance_id.clone()),
            event_type: msg.event_type(),
            receipt_handle: raw.receipt_handle.clone(),
            token: msg.lifecycle_action_token,
            hook_name: msg.lifecycle_hook_name,
            group_name: msg.auto_scaling_group_name,
        })
    }
}
