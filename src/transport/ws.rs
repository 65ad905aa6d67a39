use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::protocol::handshake::find_header_end;
use crate::protocol::{CLOSE_NORMAL, Frame, HandshakeRequest, HandshakeResponse, MaskGenerator, OpCode};
use crate::transport::{Connector, Endpoint, Transport};

/// Opens plain-TCP WebSocket client connections.
#[derive(Debug, Clone, Default)]
pub struct WsConnector {
    config: TransportConfig,
}

impl WsConnector {
    /// Create a connector with the given transport settings.
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, endpoint: &Endpoint) -> Result<WsTransport> {
        let (host, port) = endpoint.socket_addr();
        let mut stream = TcpStream::connect((host.as_str(), port)).await?;
        stream.set_nodelay(true)?;

        let request = HandshakeRequest::new(endpoint.host_header(), endpoint.resource())?;
        let mut out = Vec::with_capacity(256);
        request.write(&mut out)?;
        stream.write_all(&out).await?;

        let mut read_buf = BytesMut::with_capacity(self.config.read_buffer_size);
        let header_len = loop {
            if let Some(end) = find_header_end(&read_buf) {
                break end;
            }
            self.config.check_handshake_size(read_buf.len())?;
            read_buf.reserve(1024);
            if stream.read_buf(&mut read_buf).await? == 0 {
                return Err(Error::InvalidHandshake(
                    "connection closed during handshake".into(),
                ));
            }
        };
        self.config.check_handshake_size(header_len)?;

        // Anything past the header block already belongs to the frame stream.
        let head = read_buf.split_to(header_len);
        let response = HandshakeResponse::parse(&head)?;
        response.verify(&request.key)?;

        Ok(WsTransport {
            stream,
            read_buf,
            write_buf: BytesMut::with_capacity(256),
            masks: MaskGenerator::new(),
            config: self.config.clone(),
        })
    }
}

/// An open WebSocket client connection over TCP.
///
/// Outgoing frames are masked. Incoming data is only inspected while
/// waiting for the peer's close reply.
pub struct WsTransport {
    stream: TcpStream,
    read_buf: BytesMut,
    write_buf: BytesMut,
    masks: MaskGenerator,
    config: TransportConfig,
}

impl WsTransport {
    async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write_buf.clear();
        frame.encode(&mut self.write_buf, Some(self.masks.next_mask()));
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read frames until the peer's close frame or EOF, discarding the rest.
    async fn await_close_reply(&mut self) -> Result<Option<u16>> {
        loop {
            match Frame::parse(&self.read_buf) {
                Ok((frame, consumed)) => {
                    self.read_buf.advance(consumed);
                    if frame.opcode == OpCode::Close {
                        return Ok(frame.close_code());
                    }
                    continue;
                }
                Err(Error::IncompleteFrame { .. }) => {}
                Err(e) => return Err(e),
            }

            self.read_buf.reserve(self.config.read_buffer_size);
            if self.stream.read_buf(&mut self.read_buf).await? == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }
}

impl Transport for WsTransport {
    async fn send_text(&mut self, text: &str) -> Result<()> {
        self.write_frame(&Frame::text(text)).await
    }

    async fn close(mut self) -> Result<()> {
        let sent = self.write_frame(&Frame::close(Some(CLOSE_NORMAL), "")).await;
        if sent.is_ok() {
            match tokio::time::timeout(self.config.close_timeout, self.await_close_reply()).await {
                Ok(Ok(code)) => tracing::trace!(?code, "peer acknowledged close"),
                Ok(Err(e)) => tracing::trace!(error = %e, "peer went away before close reply"),
                Err(_) => tracing::trace!("no close reply before timeout"),
            }
        }
        // The socket is released on drop either way; shutdown just sends FIN promptly.
        let _ = self.stream.shutdown().await;
        sent
    }
}
