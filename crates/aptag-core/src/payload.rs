// ── Edit and commit payloads ──
//
// The edit payload is serialized from serde structs with quick-xml so that
// tag values are escaped as XML text. Field order in the structs is the
// element order on the wire.

use serde::Serialize;

use crate::error::ProvisionError;
use crate::model::TagTriple;

/// YANG namespace of the Catalyst AP configuration model.
pub const AP_CFG_NAMESPACE: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-wireless-ap-cfg";

/// Save the running configuration to startup.
pub const COMMIT_REQUEST: &str =
    r#"<cisco-ia:save-config xmlns:cisco-ia="http://cisco.com/yang/cisco-ia"/>"#;

/// `<config>` document assigning a tag triple to one AP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "config", rename_all = "kebab-case")]
pub struct ConfigPayload {
    pub ap_cfg_data: ApCfgData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApCfgData {
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    pub ap_tags: ApTags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApTags {
    pub ap_tag: ApTagRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApTagRecord {
    pub ap_mac: String,
    pub policy_tag: String,
    pub site_tag: String,
    pub rf_tag: String,
}

impl ConfigPayload {
    /// Serialize to the XML text sent inside `<edit-config>`.
    pub fn to_xml(&self) -> Result<String, ProvisionError> {
        quick_xml::se::to_string(self).map_err(|e| ProvisionError::Payload {
            reason: e.to_string(),
        })
    }
}

/// Build the edit payload for `mac`. Pure; identical inputs give identical
/// output.
pub fn build_edit_payload(mac: &str, tags: &TagTriple) -> ConfigPayload {
    ConfigPayload {
        ap_cfg_data: ApCfgData {
            xmlns: AP_CFG_NAMESPACE,
            ap_tags: ApTags {
                ap_tag: ApTagRecord {
                    ap_mac: mac.to_owned(),
                    policy_tag: tags.policy_tag.clone(),
                    site_tag: tags.site_tag.clone(),
                    rf_tag: tags.rf_tag.clone(),
                },
            },
        },
    }
}

/// The commit request; constant regardless of the event.
pub fn commit_request() -> &'static str {
    COMMIT_REQUEST
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn edit_payload_wire_format() {
        let xml = build_edit_payload("aa:bb:cc:dd:ee:ff", &TagTriple::new("P1", "S1", "R1"))
            .to_xml()
            .unwrap();
        assert_eq!(
            xml,
            concat!(
                "<config>",
                r#"<ap-cfg-data xmlns="http://cisco.com/ns/yang/Cisco-IOS-XE-wireless-ap-cfg">"#,
                "<ap-tags><ap-tag>",
                "<ap-mac>aa:bb:cc:dd:ee:ff</ap-mac>",
                "<policy-tag>P1</policy-tag>",
                "<site-tag>S1</site-tag>",
                "<rf-tag>R1</rf-tag>",
                "</ap-tag></ap-tags>",
                "</ap-cfg-data>",
                "</config>",
            )
        );
    }

    #[test]
    fn edit_payload_is_deterministic() {
        let tags = TagTriple::new("P1", "S1", "R1");
        let first = build_edit_payload("aa:bb:cc:dd:ee:ff", &tags).to_xml().unwrap();
        let second = build_edit_payload("aa:bb:cc:dd:ee:ff", &tags).to_xml().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn tag_values_are_escaped() {
        let xml = build_edit_payload("aa:bb", &TagTriple::new("a<b", "s&t", "rf"))
            .to_xml()
            .unwrap();
        assert!(xml.contains("<policy-tag>a&lt;b</policy-tag>"));
        assert!(xml.contains("<site-tag>s&amp;t</site-tag>"));
    }

    #[test]
    fn commit_request_is_constant() {
        assert_eq!(
            commit_request(),
            r#"<cisco-ia:save-config xmlns:cisco-ia="http://cisco.com/yang/cisco-ia"/>"#
        );
    }
}
