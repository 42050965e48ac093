pub mod file_chooser;
pub mod response;

use tracing::{debug, info};
use zvariant::{SerializeDict, Type};

use crate::Error;
use crate::bus::Bus;

pub use response::{PortalResponse, ResponseCode};

/// Well-known bus name of the desktop portal
pub const PORTAL_SERVICE: &str = "org.freedesktop.portal.Desktop";
/// Object path the portal interfaces are served at
pub const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
/// Prefix of request object paths
pub const REQUEST_PATH_PREFIX: &str = "/org/freedesktop/portal/desktop/request";

/// Default dialog title
pub const DEFAULT_TITLE: &str = "Choose Location";

const TOKEN_HANDLE_PREFIX: &str = "portcopy_";

/// Remote endpoint of the portal service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalHandle {
    pub service: &'static str,
    pub path: &'static str,
}

impl PortalHandle {
    pub const fn desktop() -> Self {
        Self {
            service: PORTAL_SERVICE,
            path: PORTAL_PATH,
        }
    }
}

impl Default for PortalHandle {
    fn default() -> Self {
        Self::desktop()
    }
}

/// Options dict for `FileChooser.SaveFile`
#[derive(Debug, Clone, Default, PartialEq, SerializeDict, Type)]
#[zvariant(signature = "dict")]
pub struct SaveFileOptions {
    pub handle_token: Option<String>,
    pub accept_label: Option<String>,
    pub modal: Option<bool>,
    pub current_name: Option<String>,
    /// NUL-terminated bytes
    pub current_folder: Option<Vec<u8>>,
}

/// Everything sent with one `SaveFile` call
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFileRequest {
    pub parent_window: String,
    pub title: String,
    pub options: SaveFileOptions,
}

/// Dialog presentation settings, independent of the file being saved
#[derive(Debug, Clone, PartialEq)]
pub struct DialogSettings {
    pub title: String,
    pub accept_label: Option<String>,
    pub modal: Option<bool>,
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            accept_label: None,
            modal: None,
        }
    }
}

/// Encode a folder for `current_folder`: its bytes followed by exactly one NUL.
pub fn nul_terminated(folder: &str) -> Vec<u8> {
    let mut bytes = folder.trim_end_matches('\0').as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// Generate a fresh `handle_token`
pub fn generate_token_handle() -> String {
    format!("{}{}", TOKEN_HANDLE_PREFIX, rand::random::<u32>())
}

/// Object path the portal will create for a request made with `token`.
///
/// `unique_name` is the caller's bus name (`:1.42`), which the portal
/// rewrites to `1_42`.
pub fn request_handle_path(unique_name: &str, token: &str) -> String {
    let sender = unique_name.trim_start_matches(':').replace('.', "_");
    format!("{REQUEST_PATH_PREFIX}/{sender}/{token}")
}

/// A request that was accepted by the portal and awaits its Response signal
pub struct PendingRequest<S> {
    pub path: String,
    pub signals: S,
}

/// Client for the portal's FileChooser interface
pub struct Portal<'a, B> {
    bus: &'a B,
    handle: PortalHandle,
    dialog: DialogSettings,
}

impl<'a, B: Bus> Portal<'a, B> {
    /// Bind to the desktop portal on `bus`
    pub fn open(bus: &'a B) -> Self {
        Self {
            bus,
            handle: PortalHandle::desktop(),
            dialog: DialogSettings::default(),
        }
    }

    pub fn with_dialog(mut self, dialog: DialogSettings) -> Self {
        self.dialog = dialog;
        self
    }

    /// Build the `SaveFile` arguments for `folder` and `name`
    pub fn build_request(&self, folder: &str, name: &str, token: &str) -> SaveFileRequest {
        SaveFileRequest {
            parent_window: String::new(),
            title: self.dialog.title.clone(),
            options: SaveFileOptions {
                handle_token: Some(token.to_string()),
                accept_label: self.dialog.accept_label.clone(),
                modal: self.dialog.modal,
                current_name: Some(name.to_string()),
                current_folder: Some(nul_terminated(folder)),
            },
        }
    }

    /// Ask the portal to show a Save dialog.
    ///
    /// Subscribes to every request object before the call so a fast response
    /// is not lost, whatever path the portal ends up using. The returned
    /// handle is what the response is correlated by.
    pub async fn request_save_file(
        &self,
        folder: &str,
        name: &str,
    ) -> Result<PendingRequest<B::Signals>, Error> {
        let token = generate_token_handle();
        let signals = self.bus.subscribe(REQUEST_PATH_PREFIX).await?;

        let request = self.build_request(folder, name, &token);
        debug!(?request, "Calling FileChooser.SaveFile");
        let handle = self.bus.save_file(&self.handle, &request).await?;
        info!(%handle, "Save dialog requested");

        if let Some(unique) = self.bus.unique_name() {
            let predicted = request_handle_path(&unique, &token);
            if predicted != handle {
                debug!(%predicted, %handle, "Portal returned an unpredicted request path");
            }
        }

        Ok(PendingRequest {
            path: handle,
            signals,
        })
    }

    /// Close a pending request so the portal dismisses its dialog
    pub async fn close(&self, request_path: &str) -> Result<(), Error> {
        self.bus.close_request(&self.handle, request_path).await
    }
}
