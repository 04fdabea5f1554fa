//! Port publishing and volume mount values for `run`.

use std::fmt;
use std::str::FromStr;

use crate::error::InputValidationError;

/// Host addresses that mean "all interfaces".
const WILDCARD_ADDRESSES: &[&str] = &["0.0.0.0", "::", "[::]"];

/// Transport protocol of a published port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// TCP.
    #[default]
    Tcp,
    /// UDP.
    Udp,
    /// SCTP.
    Sctp,
}

impl Protocol {
    /// Return the lowercase protocol name used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Sctp => "sctp",
        }
    }
}

/// A published port: `[host_ip:]host_port:container_port[/protocol]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortMapping {
    host_ip: Option<String>,
    host_port: u16,
    container_port: u16,
    protocol: Protocol,
}

impl PortMapping {
    /// Publish `container_port` on `host_port` over TCP on all interfaces.
    #[must_use]
    pub const fn new(host_port: u16, container_port: u16) -> Self {
        Self {
            host_ip: None,
            host_port,
            container_port,
            protocol: Protocol::Tcp,
        }
    }

    /// Bind the host side to one address.
    #[must_use]
    pub fn on_host_ip(mut self, host_ip: impl Into<String>) -> Self {
        self.host_ip = Some(host_ip.into());
        self
    }

    /// Use a protocol other than TCP.
    #[must_use]
    pub const fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Return the host port.
    #[must_use]
    pub const fn host_port(&self) -> u16 {
        self.host_port
    }

    /// Return the container port.
    #[must_use]
    pub const fn container_port(&self) -> u16 {
        self.container_port
    }

    /// Return the host address, when bound to one.
    #[must_use]
    pub fn host_ip(&self) -> Option<&str> {
        self.host_ip.as_deref()
    }

    /// Return the protocol.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Render the `-p` argument value.
    #[must_use]
    pub fn to_arg(&self) -> String {
        self.to_string()
    }

    /// Return whether the host side listens on every interface.
    #[must_use]
    pub fn binds_all_interfaces(&self) -> bool {
        self.host_ip
            .as_deref()
            .is_none_or(|ip| WILDCARD_ADDRESSES.contains(&ip))
    }

    /// Return whether both mappings would claim the same host socket.
    ///
    /// A wildcard binding collides with every binding of the same port and
    /// protocol, whatever its address.
    pub(crate) fn collides_with(&self, other: &Self) -> bool {
        if self.host_port != other.host_port || self.protocol != other.protocol {
            return false;
        }
        self.binds_all_interfaces() || other.binds_all_interfaces() || self.host_ip == other.host_ip
    }

    pub(crate) fn validate(&self) -> Result<(), InputValidationError> {
        if self.host_port == 0 || self.container_port == 0 {
            return Err(InputValidationError::MalformedPortMapping {
                mapping: self.to_string(),
                reason: String::from("ports must be between 1 and 65535"),
            });
        }
        Ok(())
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ip) = &self.host_ip {
            write!(f, "{ip}:")?;
        }
        write!(
            f,
            "{}:{}/{}",
            self.host_port,
            self.container_port,
            self.protocol.as_str()
        )
    }
}

impl FromStr for PortMapping {
    type Err = InputValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| InputValidationError::MalformedPortMapping {
            mapping: String::from(value),
            reason: String::from(reason),
        };

        let (ports, protocol) = match value.split_once('/') {
            Some((ports, "tcp")) => (ports, Protocol::Tcp),
            Some((ports, "udp")) => (ports, Protocol::Udp),
            Some((ports, "sctp")) => (ports, Protocol::Sctp),
            Some(_) => return Err(malformed("protocol must be tcp, udp or sctp")),
            None => (value, Protocol::Tcp),
        };

        let Some((host, container)) = ports.rsplit_once(':') else {
            return Err(malformed("expected host_port:container_port"));
        };
        let (host_ip, host_port) = match host.rsplit_once(':') {
            Some((ip, port)) if !ip.is_empty() => (Some(String::from(ip)), port),
            Some(_) => return Err(malformed("host address is empty")),
            None => (None, host),
        };

        let parse_port = |text: &str| {
            text.parse::<u16>()
                .map_err(|_| malformed("ports must be numbers between 1 and 65535"))
        };
        let mapping = Self {
            host_ip,
            host_port: parse_port(host_port)?,
            container_port: parse_port(container)?,
            protocol,
        };
        mapping.validate()?;
        Ok(mapping)
    }
}

/// A volume or bind mount: `source:target[:ro]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VolumeMount {
    source: String,
    target: String,
    read_only: bool,
}

impl VolumeMount {
    /// Mount `source` (a host path or volume name) at `target`.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: false,
        }
    }

    /// Mount read-only.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Return the host path or volume name.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Return the path inside the container.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Return whether the mount is read-only.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Render the `-v` argument value.
    #[must_use]
    pub fn to_arg(&self) -> String {
        if self.read_only {
            format!("{}:{}:ro", self.source, self.target)
        } else {
            format!("{}:{}", self.source, self.target)
        }
    }

    pub(crate) fn validate(&self) -> Result<(), InputValidationError> {
        if self.source.trim().is_empty() {
            return Err(InputValidationError::MissingRequired {
                field: String::from("volume source"),
            });
        }
        if !self.target.starts_with('/') {
            return Err(InputValidationError::InvalidValue {
                field: String::from("volumes"),
                reason: format!("target '{}' must be an absolute path", self.target),
            });
        }
        Ok(())
    }
}
