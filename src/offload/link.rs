use log::{debug, info};
use pnet_datalink::NetworkInterface;

use crate::models::config::Credentials;
use crate::offload::{LinkError, NetworkLink};

/// Network link bound to a host interface.
///
/// Association succeeds when the interface exists and is up; the link keeps
/// track of the network it is associated with.
pub struct InterfaceLink {
    interface: String,
    associated: Option<String>,
}

impl InterfaceLink {
    /// Create a link for the given interface, initially disconnected
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            associated: None,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Network name the link is associated with
    #[cfg(test)]
    pub fn associated_network(&self) -> Option<&str> {
        self.associated.as_deref()
    }

    fn lookup(&self) -> Result<NetworkInterface, LinkError> {
        pnet_datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == self.interface)
            .ok_or_else(|| LinkError::InterfaceNotFound(self.interface.clone()))
    }
}

impl NetworkLink for InterfaceLink {
    fn disconnect(&mut self) -> Result<(), LinkError> {
        match self.associated.take() {
            Some(network) => info!("Disconnected {} from '{}'", self.interface, network),
            None => debug!("Link on {} already disconnected", self.interface),
        }
        Ok(())
    }

    fn connect(&mut self, credentials: &Credentials) -> Result<(), LinkError> {
        if credentials.ssid.is_empty() {
            return Err(LinkError::MissingSsid);
        }

        let iface = self.lookup()?;
        if !iface.is_up() {
            return Err(LinkError::InterfaceDown(self.interface.clone()));
        }

        info!(
            "Associated {} with '{}' ({:?}, {} addresses)",
            iface.name,
            credentials.ssid,
            credentials.security,
            iface.ips.len()
        );
        self.associated = Some(credentials.ssid.clone());
        Ok(())
    }

    fn is_disconnected(&self) -> bool {
        self.associated.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::SecurityMode;

    fn credentials(ssid: &str) -> Credentials {
        Credentials {
            ssid: ssid.to_string(),
            password: "secret".to_string(),
            security: SecurityMode::Wpa2Psk,
        }
    }

    #[test]
    fn starts_disconnected() {
        let mut link = InterfaceLink::new("eth0");
        assert!(link.is_disconnected());
        assert_eq!(link.disconnect(), Ok(()));
        assert!(link.is_disconnected());
    }

    #[test]
    fn connect_requires_ssid() {
        let mut link = InterfaceLink::new("lo");
        assert_eq!(link.connect(&credentials("")), Err(LinkError::MissingSsid));
        assert!(link.is_disconnected());
    }

    #[test]
    fn connect_to_unknown_interface_fails() {
        let mut link = InterfaceLink::new("pfoffload-none0");
        assert_eq!(
            link.connect(&credentials("lab")),
            Err(LinkError::InterfaceNotFound("pfoffload-none0".to_string()))
        );
    }

    #[test]
    fn associates_over_loopback() {
        let Some(lo) = pnet_datalink::interfaces()
            .into_iter()
            .find(|iface| iface.is_loopback() && iface.is_up())
        else {
            return;
        };

        let mut link = InterfaceLink::new(lo.name.clone());
        link.connect(&credentials("lab")).unwrap();
        assert!(!link.is_disconnected());
        assert_eq!(link.associated_network(), Some("lab"));

        link.disconnect().unwrap();
        assert!(link.is_disconnected());
    }
}
