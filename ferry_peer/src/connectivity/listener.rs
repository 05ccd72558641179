use std::net::SocketAddr;

use ferry_core_lib::{data::Settings, Result};
use tokio::{net::TcpListener, sync::mpsc};
use tokio_util::sync::CancellationToken;

use crate::events::{EventSender, ServerEvent};

use super::AcceptedConnection;

/// Owns the listening socket and hands every accepted connection over.
pub struct ConnectionListener {
    listener: TcpListener,
    events: EventSender,
}

impl ConnectionListener {
    pub async fn bind(settings: &Settings, events: EventSender) -> Result<ConnectionListener> {
        let listener = TcpListener::bind((settings.listen_host, settings.listen_port)).await?;
        let address = listener.local_addr()?;
        events.send(ServerEvent::ListenerStarted { address });

        Ok(ConnectionListener { listener, events })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts until cancelled or until the receiving side of `handoff` is gone.
    /// A failed accept is reported and does not end the loop.
    pub async fn listen_for_connections(
        self,
        handoff: mpsc::Sender<AcceptedConnection>,
        cancel: CancellationToken,
    ) {
        loop {
            let accepted = tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, remote_address)) => {
                    self.events
                        .send(ServerEvent::ConnectionAccepted { remote_address });

                    let connection = AcceptedConnection::new(stream, remote_address);
                    if handoff.send(connection).await.is_err() {
                        debug!("Connection handoff closed, stopping listener");
                        break;
                    }
                }
                Err(e) => {
                    self.events.error(format!("Failed to accept connection: {}", e));
                }
            }
        }

        info!("Listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use tokio::net::TcpStream;

    use super::*;

    #[tokio::test]
    async fn test_accepted_connections_are_handed_over() {
        let settings = Settings {
            listen_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            listen_port: 0,
            ..Settings::default()
        };
        let listener = ConnectionListener::bind(&settings, EventSender::new(16))
            .await
            .unwrap();
        let address = listener.local_addr().unwrap();
        let (handoff, mut accepted) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(listener.listen_for_connections(handoff, cancel.clone()));

        let _client = TcpStream::connect(address).await.unwrap();
        let connection = accepted.recv().await.unwrap();
        assert_eq!(connection.remote_address.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));

        cancel.cancel();
        task.await.unwrap();
    }
}
