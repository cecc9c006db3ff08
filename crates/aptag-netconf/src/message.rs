// NETCONF message construction and reply decoding
//
// Outbound messages are small, fixed-shape documents and are built as
// strings. Inbound `<hello>` and `<rpc-reply>` documents are decoded with
// quick-xml's pull reader, matching on local names so that namespace
// prefixes chosen by the controller do not matter.

use std::fmt;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::Error;

/// NETCONF base namespace.
pub const BASE_NAMESPACE: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// base:1.0 capability URI (end-of-message framing).
pub const CAPABILITY_BASE_1_0: &str = "urn:ietf:params:netconf:base:1.0";

/// base:1.1 capability URI (chunked framing).
pub const CAPABILITY_BASE_1_1: &str = "urn:ietf:params:netconf:base:1.1";

/// Configuration datastores addressable by `<edit-config>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datastore {
    Running,
}

impl Datastore {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
        }
    }
}

impl fmt::Display for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Outbound ────────────────────────────────────────────────────────

/// Client `<hello>` advertising both base versions.
pub fn client_hello() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <hello xmlns=\"{BASE_NAMESPACE}\"><capabilities>\
         <capability>{CAPABILITY_BASE_1_0}</capability>\
         <capability>{CAPABILITY_BASE_1_1}</capability>\
         </capabilities></hello>"
    )
}

/// Wrap an operation body in an `<rpc>` envelope.
pub fn rpc(message_id: u64, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rpc message-id=\"{message_id}\" xmlns=\"{BASE_NAMESPACE}\">{body}</rpc>"
    )
}

/// `<edit-config>` operation body targeting `datastore`.
pub fn edit_config(datastore: Datastore, config: &str) -> String {
    format!("<edit-config><target><{datastore}/></target>{config}</edit-config>")
}

/// `<close-session>` operation body.
pub const CLOSE_SESSION: &str = "<close-session/>";

// ── Inbound: hello ──────────────────────────────────────────────────

/// Decoded server `<hello>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerHello {
    pub session_id: Option<u32>,
    pub capabilities: Vec<String>,
}

impl ServerHello {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// Decode a server `<hello>` message.
pub fn parse_hello(xml: &str) -> Result<ServerHello, Error> {
    let mut reader = Reader::from_str(xml);
    let mut hello = ServerHello::default();
    let mut seen_hello = false;
    let mut current: Option<&'static str> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"hello" => seen_hello = true,
                b"capability" => current = Some("capability"),
                b"session-id" => current = Some("session-id"),
                _ => current = None,
            },
            Event::Empty(e) if e.local_name().as_ref() == b"hello" => seen_hello = true,
            Event::Text(t) => {
                let text = t.unescape()?;
                let text = text.trim();
                match current {
                    Some("capability") if !text.is_empty() => {
                        hello.capabilities.push(text.to_owned());
                    }
                    Some("session-id") => {
                        hello.session_id = Some(text.parse().map_err(|_| {
                            Error::Xml(format!("invalid session-id '{text}'"))
                        })?);
                    }
                    _ => {}
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_hello {
        return Err(Error::Xml("expected <hello> from server".into()));
    }
    Ok(hello)
}

// ── Inbound: rpc-reply ──────────────────────────────────────────────

/// One `<rpc-error>` entry of a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcError {
    pub error_type: Option<String>,
    pub tag: Option<String>,
    pub severity: Option<String>,
    pub message: Option<String>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag.as_deref().unwrap_or("unknown");
        match &self.message {
            Some(message) => write!(f, "{tag}: {message}"),
            None => f.write_str(tag),
        }
    }
}

/// Decoded `<rpc-reply>`, keeping the raw text alongside the parsed bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcReply {
    pub message_id: Option<String>,
    pub ok: bool,
    pub errors: Vec<RpcError>,
    pub raw: String,
}

impl RpcReply {
    /// Errors with severity `error` (warnings excluded).
    pub fn failures(&self) -> impl Iterator<Item = &RpcError> {
        self.errors
            .iter()
            .filter(|e| e.severity.as_deref() != Some("warning"))
    }

    /// A single-line summary of all `<rpc-error>` entries, if any.
    pub fn error_summary(&self) -> Option<String> {
        let joined = self
            .failures()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        (!joined.is_empty()).then_some(joined)
    }
}

#[derive(Clone, Copy)]
enum ErrorField {
    Type,
    Tag,
    Severity,
    Message,
}

/// Decode an `<rpc-reply>` message.
pub fn parse_reply(xml: &str) -> Result<RpcReply, Error> {
    let mut reader = Reader::from_str(xml);
    let mut reply = RpcReply {
        raw: xml.to_owned(),
        ..RpcReply::default()
    };
    let mut seen_reply = false;
    let mut error: Option<RpcError> = None;
    let mut field: Option<ErrorField> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"rpc-reply" => {
                    seen_reply = true;
                    reply.message_id = message_id(&e)?;
                }
                b"rpc-error" => error = Some(RpcError::default()),
                b"error-type" => field = Some(ErrorField::Type),
                b"error-tag" => field = Some(ErrorField::Tag),
                b"error-severity" => field = Some(ErrorField::Severity),
                b"error-message" => field = Some(ErrorField::Message),
                _ => field = None,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"rpc-reply" => {
                    seen_reply = true;
                    reply.message_id = message_id(&e)?;
                }
                b"ok" => reply.ok = true,
                _ => {}
            },
            Event::Text(t) => {
                if let (Some(err), Some(f)) = (error.as_mut(), field) {
                    let text = t.unescape()?.trim().to_owned();
                    if !text.is_empty() {
                        let slot = match f {
                            ErrorField::Type => &mut err.error_type,
                            ErrorField::Tag => &mut err.tag,
                            ErrorField::Severity => &mut err.severity,
                            ErrorField::Message => &mut err.message,
                        };
                        *slot = Some(text);
                    }
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"rpc-error" {
                    if let Some(done) = error.take() {
                        reply.errors.push(done);
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_reply {
        return Err(Error::Xml("expected <rpc-reply>".into()));
    }
    Ok(reply)
}

fn message_id(start: &BytesStart<'_>) -> Result<Option<String>, Error> {
    let attr = start
        .try_get_attribute("message-id")
        .map_err(|e| Error::Xml(e.to_string()))?;
    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(Error::from)
    })
    .transpose()
}

/// Text content of the first element named `local_name`, if present.
///
/// Used to pull `<result>` out of vendor RPC replies such as
/// `cisco-ia:save-config`.
pub fn element_text(xml: &str, local_name: &str) -> Result<Option<String>, Error> {
    let mut reader = Reader::from_str(xml);
    let mut inside = false;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == local_name.as_bytes() => {
                inside = true;
            }
            Event::Empty(e) if e.local_name().as_ref() == local_name.as_bytes() => {
                return Ok(Some(String::new()));
            }
            Event::Text(t) if inside => text.push_str(&t.unescape()?),
            Event::End(e) if inside && e.local_name().as_ref() == local_name.as_bytes() => {
                return Ok(Some(text.trim().to_owned()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}
