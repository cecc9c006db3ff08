// ── Identity resolution and controller location ──
//
// Both lookups read the immutable `ProvisionerConfig` and never block.

use crate::config::{NETCONF_PORT, ProvisionerConfig};
use crate::error::ProvisionError;
use crate::model::{ControllerAddress, TagTriple};

impl ProvisionerConfig {
    /// Tag triple for `mac`, matched exactly as received (no case or
    /// separator normalisation).
    pub fn resolve(&self, mac: &str) -> Result<&TagTriple, ProvisionError> {
        self.tag_map
            .get(mac)
            .ok_or_else(|| ProvisionError::UnmappedIdentity {
                mac: mac.to_owned(),
            })
    }

    /// Address and configured port for the controller called `name`.
    ///
    /// Linear scan in config order; the first entry with a matching name
    /// wins.
    pub fn locate(&self, name: &str) -> Result<ControllerAddress, ProvisionError> {
        self.controllers
            .iter()
            .find(|c| c.name == name)
            .map(|c| ControllerAddress {
                address: c.name.clone(),
                port: c.port,
                host_key: c.host_key.clone(),
            })
            .ok_or_else(|| ProvisionError::UnknownController {
                name: name.to_owned(),
            })
    }

    /// Port a NETCONF session to `controller` is opened on.
    pub fn session_port(&self, controller: &ControllerAddress) -> u16 {
        if self.session.honor_controller_port {
            controller.port
        } else {
            NETCONF_PORT
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{SessionSettings, SubscriptionConfig, WirelessController};

    fn controller(name: &str, port: u16) -> WirelessController {
        WirelessController {
            name: name.into(),
            port,
            host_key: None,
        }
    }

    fn config() -> ProvisionerConfig {
        let mut tag_map = HashMap::new();
        tag_map.insert("aa:bb:cc:dd:ee:ff".into(), TagTriple::new("P1", "S1", "R1"));
        ProvisionerConfig {
            controllers: vec![
                controller("wlc1", 830),
                controller("wlc2", 2022),
                controller("wlc1", 9999),
            ],
            tag_map,
            subscription: SubscriptionConfig {
                broker: "localhost".into(),
                port: 1883,
                client_id: "aptag".into(),
                topic: "aps".into(),
            },
            session: SessionSettings::default(),
            max_in_flight: None,
        }
    }

    #[test]
    fn resolve_is_exact_match() {
        let cfg = config();
        assert_eq!(
            cfg.resolve("aa:bb:cc:dd:ee:ff").unwrap(),
            &TagTriple::new("P1", "S1", "R1")
        );
        assert!(matches!(
            cfg.resolve("AA:BB:CC:DD:EE:FF"),
            Err(ProvisionError::UnmappedIdentity { .. })
        ));
        assert!(cfg.resolve("aabb.ccdd.eeff").is_err());
    }

    #[test]
    fn locate_first_match_wins() {
        let cfg = config();
        let found = cfg.locate("wlc1").unwrap();
        assert_eq!(found.address, "wlc1");
        assert_eq!(found.port, 830);
    }

    #[test]
    fn locate_unknown_controller() {
        assert!(matches!(
            config().locate("wlc9"),
            Err(ProvisionError::UnknownController { name }) if name == "wlc9"
        ));
    }

    #[test]
    fn session_port_is_fixed_unless_honored() {
        let mut cfg = config();
        let wlc2 = cfg.locate("wlc2").unwrap();
        assert_eq!(cfg.session_port(&wlc2), 830);

        cfg.session.honor_controller_port = true;
        assert_eq!(cfg.session_port(&wlc2), 2022);
    }
}
