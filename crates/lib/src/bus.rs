//! Session bus access
//!
//! [`Bus`] is the seam between the portal flow and the transport. The
//! production implementation is [`SessionBus`] over a zbus connection; tests
//! drive the same flow with an in-memory bus.

use std::collections::HashMap;

use futures_util::stream::{BoxStream, StreamExt};
use tracing::debug;
use zbus::message::Type as MessageType;
use zbus::{Connection, MatchRule, Message, MessageStream};
use zvariant::{OwnedObjectPath, OwnedValue};

use crate::Error;
use crate::portal::{PortalHandle, SaveFileRequest};
use crate::variant::{Variant, VariantError, results_from_wire};

const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

/// An inbound signal, reduced to what correlation needs
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    /// Object path the signal was emitted from
    pub path: String,
    /// `interface.member`
    pub name: String,
    /// Positional body arguments, or why they could not be read
    pub body: Result<Vec<Variant>, VariantError>,
}

impl SignalEvent {
    /// Read a zbus signal message.
    ///
    /// Only the portal response body shape `(ua{sv})` is decoded; any other
    /// body is kept as a decode error for the correlator to report if the
    /// signal turns out to be the one it waits for.
    pub fn from_message(msg: &Message) -> Self {
        let header = msg.header();
        let path = header.path().map(|p| p.to_string()).unwrap_or_default();
        let name = format!(
            "{}.{}",
            header.interface().map(|i| i.as_str()).unwrap_or_default(),
            header.member().map(|m| m.as_str()).unwrap_or_default(),
        );

        let body = msg
            .body()
            .deserialize::<(u32, HashMap<String, OwnedValue>)>()
            .map(|(code, results)| {
                vec![Variant::U32(code), Variant::Map(results_from_wire(&results))]
            })
            .map_err(|e| VariantError::Body(e.to_string()));

        Self { path, name, body }
    }
}

/// Stream of inbound signals for one subscription
pub type SignalStream = BoxStream<'static, Result<SignalEvent, Error>>;

/// Primitives the portal client needs from the bus
#[allow(async_fn_in_trait)]
pub trait Bus {
    type Signals: futures_util::Stream<Item = Result<SignalEvent, Error>> + Unpin;

    /// Unique name of this connection (e.g. `:1.42`)
    fn unique_name(&self) -> Option<String>;

    /// Subscribe to portal request signals emitted from `path_namespace` or
    /// any object below it
    async fn subscribe(&self, path_namespace: &str) -> Result<Self::Signals, Error>;

    /// Call `org.freedesktop.portal.FileChooser.SaveFile`, returning the request handle
    async fn save_file(
        &self,
        portal: &PortalHandle,
        request: &SaveFileRequest,
    ) -> Result<String, Error>;

    /// Call `org.freedesktop.portal.Request.Close` on a pending request
    async fn close_request(&self, portal: &PortalHandle, request_path: &str) -> Result<(), Error>;
}

#[zbus::proxy(
    interface = "org.freedesktop.portal.FileChooser",
    default_service = "org.freedesktop.portal.Desktop",
    default_path = "/org/freedesktop/portal/desktop",
    gen_blocking = false
)]
trait FileChooser {
    fn save_file(
        &self,
        parent_window: &str,
        title: &str,
        options: &crate::portal::SaveFileOptions,
    ) -> zbus::Result<OwnedObjectPath>;
}

#[zbus::proxy(
    interface = "org.freedesktop.portal.Request",
    default_service = "org.freedesktop.portal.Desktop",
    gen_blocking = false
)]
trait PortalRequest {
    fn close(&self) -> zbus::Result<()>;
}

/// The user's D-Bus session bus
pub struct SessionBus {
    conn: Connection,
}

impl SessionBus {
    /// Connect to the session bus
    pub async fn connect() -> Result<Self, Error> {
        let conn = Connection::session().await.map_err(Error::Connection)?;
        debug!(unique_name = ?conn.unique_name(), "Connected to session bus");
        Ok(Self { conn })
    }
}

impl Bus for SessionBus {
    type Signals = SignalStream;

    fn unique_name(&self) -> Option<String> {
        self.conn.unique_name().map(|n| n.to_string())
    }

    async fn subscribe(&self, path_namespace: &str) -> Result<Self::Signals, Error> {
        let rule = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .interface(REQUEST_INTERFACE)?
            .path_namespace(path_namespace)?
            .build();
        debug!(?rule, "Subscribing");
        let stream = MessageStream::for_match_rule(rule, &self.conn, None).await?;

        Ok(stream
            .map(|msg| {
                msg.map(|m| SignalEvent::from_message(&m))
                    .map_err(Error::Transport)
            })
            .boxed())
    }

    async fn save_file(
        &self,
        portal: &PortalHandle,
        request: &SaveFileRequest,
    ) -> Result<String, Error> {
        let proxy = FileChooserProxy::builder(&self.conn)
            .destination(portal.service)?
            .path(portal.path)?
            .build()
            .await?;
        let handle = proxy
            .save_file(&request.parent_window, &request.title, &request.options)
            .await?;
        Ok(handle.to_string())
    }

    async fn close_request(
        &self,
        portal: &PortalHandle,
        request_path: &str,
    ) -> Result<(), Error> {
        let proxy = PortalRequestProxy::builder(&self.conn)
            .destination(portal.service)?
            .path(request_path)?
            .build()
            .await?;
        proxy.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zvariant::Value;

    const PATH: &str = "/org/freedesktop/portal/desktop/request/1_42/portcopy_1";

    #[test]
    fn response_message_is_decoded() {
        let results = HashMap::from([("uris", Value::from(vec!["file:///home/u/a.txt"]))]);
        let msg = Message::signal(PATH, REQUEST_INTERFACE, "Response")
            .unwrap()
            .build(&(0u32, results))
            .unwrap();

        let event = SignalEvent::from_message(&msg);

        assert_eq!(event.path, PATH);
        assert_eq!(event.name, "org.freedesktop.portal.Request.Response");
        assert_eq!(
            event.body,
            Ok(vec![
                Variant::U32(0),
                Variant::Map(HashMap::from([(
                    "uris".to_string(),
                    Variant::StrList(vec!["file:///home/u/a.txt".to_string()]),
                )])),
            ])
        );
    }

    #[test]
    fn cancelled_response_with_empty_results() {
        let results: HashMap<&str, Value<'_>> = HashMap::new();
        let msg = Message::signal(PATH, REQUEST_INTERFACE, "Response")
            .unwrap()
            .build(&(1u32, results))
            .unwrap();

        let event = SignalEvent::from_message(&msg);
        assert_eq!(
            event.body,
            Ok(vec![Variant::U32(1), Variant::Map(HashMap::new())])
        );
    }

    #[test]
    fn other_body_shape_is_kept_as_error() {
        let msg = Message::signal(PATH, "org.freedesktop.DBus.Properties", "PropertiesChanged")
            .unwrap()
            .build(&("org.freedesktop.portal.Request", 7u32))
            .unwrap();

        let event = SignalEvent::from_message(&msg);
        assert_eq!(event.name, "org.freedesktop.DBus.Properties.PropertiesChanged");
        assert!(matches!(event.body, Err(VariantError::Body(_))));
    }
}
