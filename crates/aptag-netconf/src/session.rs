// NETCONF session over any byte stream
//
// Runs the `<hello>` exchange, negotiates framing, numbers RPCs, and
// decodes replies. The stream is usually an SSH `netconf` subsystem
// channel (see `ssh`), but anything `AsyncRead + AsyncWrite` works,
// which is how the tests drive it with an in-memory duplex pipe.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use crate::error::Error;
use crate::framing::{FramedStream, Framing};
use crate::message::{
    self, CAPABILITY_BASE_1_0, CAPABILITY_BASE_1_1, Datastore, RpcReply, ServerHello,
};

/// An established NETCONF session.
pub struct NetconfSession<S> {
    framed: FramedStream<S>,
    hello: ServerHello,
    next_message_id: u64,
    closed: bool,
}

impl<S> NetconfSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Exchange `<hello>` messages over `stream` and pick the framing.
    ///
    /// Chunked framing is used when the server advertises base:1.1;
    /// otherwise the session stays on end-of-message framing.
    pub async fn establish(stream: S) -> Result<Self, Error> {
        let mut framed = FramedStream::new(stream);
        framed.send(&message::client_hello()).await?;

        let raw = framed.recv().await?;
        let hello = message::parse_hello(&raw)?;
        debug!(
            session_id = ?hello.session_id,
            capabilities = hello.capabilities.len(),
            "received server hello"
        );

        if hello.supports(CAPABILITY_BASE_1_1) {
            framed.set_framing(Framing::Chunked);
        } else if !hello.supports(CAPABILITY_BASE_1_0) {
            return Err(Error::NoCommonBase);
        }

        Ok(Self {
            framed,
            hello,
            next_message_id: 1,
            closed: false,
        })
    }

    /// Session id assigned by the server.
    pub fn session_id(&self) -> Option<u32> {
        self.hello.session_id
    }

    pub fn framing(&self) -> Framing {
        self.framed.framing()
    }

    /// Send an arbitrary operation body and wait for its reply.
    pub async fn rpc(&mut self, body: &str) -> Result<RpcReply, Error> {
        if self.closed {
            return Err(Error::SessionClosed);
        }

        let id = self.next_message_id;
        self.next_message_id += 1;

        trace!(message_id = id, "sending rpc");
        self.framed.send(&message::rpc(id, body)).await?;

        let raw = self.framed.recv().await?;
        let reply = message::parse_reply(&raw)?;

        if let Some(ref got) = reply.message_id {
            if *got != id.to_string() {
                return Err(Error::MessageIdMismatch {
                    expected: id,
                    got: got.clone(),
                });
            }
        }

        trace!(message_id = id, ok = reply.ok, "received rpc-reply");
        Ok(reply)
    }

    /// `<edit-config>` against `datastore`.
    pub async fn edit_config(
        &mut self,
        datastore: Datastore,
        config: &str,
    ) -> Result<RpcReply, Error> {
        self.rpc(&message::edit_config(datastore, config)).await
    }

    /// Send `<close-session>` and shut the stream down.
    ///
    /// Idempotent: a second call is a no-op. The stream is shut down even
    /// when the server does not answer the close request cleanly.
    pub async fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }

        let result = self.rpc(message::CLOSE_SESSION).await;
        self.closed = true;
        let shutdown = self.framed.shutdown().await;

        match result {
            Ok(reply) => {
                debug!(ok = reply.ok, "close-session acknowledged");
                shutdown
            }
            // Some controllers drop the channel instead of replying.
            Err(Error::SessionClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
