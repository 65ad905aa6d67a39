//! Target endpoint parsing.

use url::Url;

use crate::error::{Error, Result};

/// A parsed `ws://` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    resource: String,
}

impl Endpoint {
    /// Parse a WebSocket URL.
    ///
    /// The port defaults to 80 and the resource to `/`. Query strings are
    /// kept as part of the request target.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidEndpoint` if the URL is malformed or has no host
    /// - `Error::UnsupportedScheme` for anything other than `ws`
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)?;

        if url.scheme() != "ws" {
            return Err(Error::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidEndpoint(format!("{}: missing host", input)))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);

        let mut resource = url.path().to_string();
        if resource.is_empty() {
            resource.push('/');
        }
        if let Some(query) = url.query() {
            resource.push('?');
            resource.push_str(query);
        }

        Ok(Self {
            host,
            port,
            resource,
        })
    }

    /// Host name or address literal.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Request target sent in the upgrade request line.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Value for the `Host` header.
    #[must_use]
    pub fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Address passed to `TcpStream::connect`.
    #[must_use]
    pub fn socket_addr(&self) -> (String, u16) {
        // url keeps IPv6 literals bracketed; the resolver wants them bare.
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        (host.to_string(), self.port)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ws://{}:{}{}", self.host, self.port, self.resource)
    }
}
