// ABOUTME: Client factory for creating ready-to-use modem sessions
// ABOUTME: Connects a transport and applies the initial AT setup in one step

use crate::client::default::Sim800;
use crate::client::error::ModemResult;
use crate::client::traits::DeviceInfo;
use crate::client::types::ModemConfig;
use crate::connection::{TcpTransport, Transport};
use std::net::ToSocketAddrs;
use tracing::warn;

/// Factory for creating modem clients
///
/// Handles opening the transport and the setup sequence so the returned
/// client can be used straight away.
pub struct ClientBuilder;

impl ClientBuilder {
    /// Connect to a serial bridge at `addr` and set the modem up
    ///
    /// A modem that does not acknowledge the setup sequence is still
    /// returned; the failure is only logged.
    pub fn connect<A: ToSocketAddrs>(
        addr: A,
        config: ModemConfig,
    ) -> ModemResult<Sim800<TcpTransport>> {
        let mut transport = TcpTransport::connect(addr)?;
        // Drop boot banners (RDY, Call Ready, ...)
        transport.discard_input()?;
        let mut modem = Sim800::new(transport, config);
        if !modem.setup(false)? {
            warn!("Modem setup was not acknowledged");
        }
        Ok(modem)
    }

    /// Wrap an already open transport without sending anything
    pub fn with_transport<T: Transport>(transport: T, config: ModemConfig) -> Sim800<T> {
        Sim800::new(transport, config)
    }
}
