//! mDNS service advertisement
//!
//! A scoped resource: registration lives from `bind` to `unbind`, and
//! dropping the handle withdraws the record.

use std::io;

use tracing::debug;

/// Advertised service name
const SERVICE_NAME: &str = "Music Player Daemon";

/// Advertised service type
const SERVICE_TYPE: &str = "_snapcast._tcp";

/// A live `_snapcast._tcp` advertisement
pub(crate) struct ZeroconfService {
    _service: libmdns::Service,
    _responder: libmdns::Responder,
}

impl ZeroconfService {
    /// Register the server under the given port
    pub(crate) fn register(port: u16) -> io::Result<Self> {
        let responder = libmdns::Responder::new()?;
        let service = responder.register(SERVICE_TYPE.to_owned(), SERVICE_NAME.to_owned(), port, &[]);

        debug!(port, service = SERVICE_TYPE, "zeroconf service registered");

        Ok(Self {
            _service: service,
            _responder: responder,
        })
    }
}
