use std::time::Duration;

use log::{debug, warn};
use zbus::blocking::{connection, Connection, Proxy};

use super::session::SessionManager;
use crate::InhibitError;

const DESTINATION: &str = "org.gnome.SessionManager";
const PATH: &str = "/org/gnome/SessionManager";
const INTERFACE: &str = "org.gnome.SessionManager";

/// How long a bus call may block before it counts as failed.
pub const METHOD_TIMEOUT: Duration = Duration::from_secs(1);

/// Client for `org.gnome.SessionManager` on the session bus.
///
/// The connection is opened once and closed when this value is dropped. GNOME
/// also drops any inhibitor still held by a connection when it closes.
pub struct GnomeSessionManager {
    conn: Connection,
}

impl GnomeSessionManager {
    pub fn connect() -> Result<Self, InhibitError> {
        let conn = connection::Builder::session()?
            .method_timeout(METHOD_TIMEOUT)
            .build()?;
        debug!("connected to the session bus");
        Ok(Self { conn })
    }

    /// Like [`connect`](Self::connect), but a missing session bus is only logged.
    pub fn try_connect() -> Option<Self> {
        Self::connect()
            .inspect_err(|e| warn!("session bus unavailable: {e}"))
            .ok()
    }

    fn proxy(&self) -> Result<Proxy<'_>, InhibitError> {
        Ok(Proxy::new(&self.conn, DESTINATION, PATH, INTERFACE)?)
    }
}

impl SessionManager for GnomeSessionManager {
    fn inhibit(&self, app_id: &str, reason: &str, flags: u32) -> Result<u32, InhibitError> {
        // Args are: in  -> `App ID`, `X Window ID`, `Reason`, `Inhibit Flags`
        //           out -> `Inhibit Cookie`
        let args = (app_id, 0u32, reason, flags);
        self.proxy()?
            .call::<&str, (&str, u32, &str, u32), u32>("Inhibit", &args)
            .map_err(|e| match e {
                zbus::Error::Variant(e) => InhibitError::MalformedReply {
                    method: "Inhibit",
                    reason: e.to_string(),
                },
                e => InhibitError::Bus(e),
            })
    }

    fn uninhibit(&self, cookie: u32) -> Result<(), InhibitError> {
        self.proxy()?
            .call::<&str, (u32,), ()>("Uninhibit", &(cookie,))
            .map_err(|e| InhibitError::Release(e.to_string()))
    }
}
