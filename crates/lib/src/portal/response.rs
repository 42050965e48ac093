//! Correlation of `org.freedesktop.portal.Request.Response` signals
//!
//! A portal method call only says the request was accepted. The user's
//! answer arrives later as a `Response` signal emitted from the request
//! object whose path the call returned. [`await_response`] watches a
//! subscription for that one signal and decodes its `(ua{sv})` body.

use std::fmt;

use futures_util::{Stream, StreamExt};
use tracing::{debug, trace};

use crate::Error;
use crate::bus::SignalEvent;
use crate::variant::{Results, Variant, VariantError};

/// Fully qualified name of the response signal
pub const RESPONSE_SIGNAL: &str = "org.freedesktop.portal.Request.Response";

/// Response code of a portal request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Success,
    Cancelled,
    /// The interaction ended some other way (2), or an unknown code
    Other(u32),
}

impl From<u32> for ResponseCode {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Cancelled,
            n => Self::Other(n),
        }
    }
}

impl From<ResponseCode> for u32 {
    fn from(code: ResponseCode) -> Self {
        match code {
            ResponseCode::Success => 0,
            ResponseCode::Cancelled => 1,
            ResponseCode::Other(n) => n,
        }
    }
}

impl ResponseCode {
    pub fn is_success(&self) -> bool {
        *self == ResponseCode::Success
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = u32::from(*self);
        match self {
            ResponseCode::Success => write!(f, "{code} Success"),
            ResponseCode::Cancelled => write!(f, "{code} Cancelled"),
            ResponseCode::Other(_) => write!(f, "{code} Other"),
        }
    }
}

/// Decoded body of a Response signal
#[derive(Debug, Clone, PartialEq)]
pub struct PortalResponse {
    pub code: ResponseCode,
    pub results: Results,
}

impl PortalResponse {
    /// Destructure positional body arguments as `(u, a{sv})`
    pub fn decode(body: Vec<Variant>) -> Result<Self, VariantError> {
        let found = body.len();
        let mut args = body.into_iter();
        match (args.next(), args.next(), args.next()) {
            (Some(code), Some(results), None) => Ok(Self {
                code: u32::try_from(code)?.into(),
                results: Results::try_from(results)?,
            }),
            _ => Err(VariantError::Arity { expected: 2, found }),
        }
    }
}

/// Wait on `signals` for the Response of the request at `request_path`.
///
/// Signals from other objects are skipped. A signal from the request object
/// that is not `Response` fails with [`Error::Protocol`].
pub async fn await_response<S>(
    signals: &mut S,
    request_path: &str,
) -> Result<PortalResponse, Error>
where
    S: Stream<Item = Result<SignalEvent, Error>> + Unpin,
{
    debug!(request_path, "Waiting for response");
    while let Some(event) = signals.next().await {
        let event = event?;
        if event.path != request_path {
            trace!(path = %event.path, name = %event.name, "Skipping unrelated signal");
            continue;
        }
        if event.name != RESPONSE_SIGNAL {
            return Err(Error::Protocol(format!(
                "unexpected response: {} from {}",
                event.name, event.path
            )));
        }

        let response = PortalResponse::decode(event.body?)?;
        debug!(
            code = %response.code,
            keys = ?response.results.keys().collect::<Vec<_>>(),
            "Got response"
        );
        return Ok(response);
    }

    Err(Error::Protocol(format!(
        "signal stream for {request_path} ended without a response"
    )))
}
