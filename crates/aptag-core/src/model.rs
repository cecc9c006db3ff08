// ── Domain model ──
//
// The inbound bus event, the tag assignment it resolves to, and the
// controller address a session is opened against.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

/// Policy/site/RF tag assignment for one AP.
///
/// Opaque identifiers: passed to the controller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TagTriple {
    pub policy_tag: String,
    pub site_tag: String,
    pub rf_tag: String,
}

impl TagTriple {
    pub fn new(
        policy_tag: impl Into<String>,
        site_tag: impl Into<String>,
        rf_tag: impl Into<String>,
    ) -> Self {
        Self {
            policy_tag: policy_tag.into(),
            site_tag: site_tag.into(),
            rf_tag: rf_tag.into(),
        }
    }
}

/// An AP announcement: `{"MAC": "...", "WLC": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "MAC")]
    pub mac: String,
    #[serde(rename = "WLC")]
    pub controller: String,
}

impl InboundEvent {
    pub fn new(mac: impl Into<String>, controller: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            controller: controller.into(),
        }
    }

    /// Decode an event from raw message bytes.
    pub fn decode(payload: &[u8]) -> Result<Self, ProvisionError> {
        serde_json::from_slice(payload).map_err(|e| ProvisionError::Decode {
            reason: e.to_string(),
        })
    }
}

/// Network location of a controller session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerAddress {
    pub address: String,
    pub port: u16,
    pub host_key: Option<String>,
}

impl fmt::Display for ControllerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decode_reads_upper_case_keys() {
        let event = InboundEvent::decode(br#"{"MAC":"aa:bb:cc:dd:ee:ff","WLC":"wlc1"}"#).unwrap();
        assert_eq!(event, InboundEvent::new("aa:bb:cc:dd:ee:ff", "wlc1"));
    }

    #[test]
    fn decode_rejects_missing_controller() {
        let err = InboundEvent::decode(br#"{"MAC":"aa:bb:cc:dd:ee:ff"}"#).unwrap_err();
        assert!(matches!(err, ProvisionError::Decode { .. }));
    }

    #[test]
    fn decode_rejects_non_json() {
        assert!(InboundEvent::decode(b"not json").is_err());
    }

    #[test]
    fn tag_triple_uses_config_file_keys() {
        let tags: TagTriple = serde_json::from_str(
            r#"{"site-tag":"S1","policy-tag":"P1","rf-tag":"R1"}"#,
        )
        .unwrap();
        assert_eq!(tags, TagTriple::new("P1", "S1", "R1"));
    }
}
