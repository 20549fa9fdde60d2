//! Desktop alerts through the freedesktop notification service.

use std::collections::HashMap;
use zbus::blocking::Connection;
use zbus::zvariant::Value;

use super::Notifier;

/// D-Bus proxy for `org.freedesktop.Notifications`.
#[zbus::proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

// freedesktop urgency levels: 0 low, 1 normal, 2 critical
const URGENCY_CRITICAL: u8 = 2;

/// Arguments of one `Notify` call.
#[derive(Debug, Clone, PartialEq)]
struct NotifyRequest<'a> {
    // 0 asks the server for a new notification instead of replacing one
    replaces_id: u32,
    summary: &'a str,
    body: &'a str,
    urgency: u8,
}

impl<'a> NotifyRequest<'a> {
    /// Every alert stands on its own, so a quick entry and exit both stay
    /// on screen.
    fn alert(summary: &'a str, body: &'a str) -> Self {
        Self {
            replaces_id: 0,
            summary,
            body,
            urgency: URGENCY_CRITICAL,
        }
    }
}

/// Sends alerts to the session notification daemon.
///
/// The session bus is connected on first use. With no bus or no
/// notification daemon the notifier stays silent and logs at debug level.
pub struct DesktopNotifier {
    connection: Option<Connection>,
    debug_enabled: bool,
}

impl DesktopNotifier {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            connection: None,
            debug_enabled,
        }
    }

    fn send(&mut self, request: &NotifyRequest<'_>) -> zbus::Result<u32> {
        if self.connection.is_none() {
            self.connection = Some(Connection::session()?);
        }
        let Some(connection) = self.connection.as_ref() else {
            return Err(zbus::Error::Failure("no session bus".to_string()));
        };

        let proxy = NotificationsProxyBlocking::new(connection)?;
        let mut hints = HashMap::new();
        hints.insert("urgency", Value::from(request.urgency));

        proxy.notify(
            env!("CARGO_PKG_NAME"),
            request.replaces_id,
            "dialog-information",
            request.summary,
            request.body,
            &[],
            hints,
            -1,
        )
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&mut self, title: &str, body: &str) {
        match self.send(&NotifyRequest::alert(title, body)) {
            Ok(id) => {
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!("Desktop notification {} shown", id);
                }
            }
            Err(e) => {
                // Drop the connection so the next alert reconnects
                self.connection = None;
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!("Desktop notification not delivered: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alerts_never_replace_each_other() {
        let entered = NotifyRequest::alert("Geofence Alert", "Entered location");
        let exited = NotifyRequest::alert("Geofence Alert", "Exited location");

        assert_eq!(entered.replaces_id, 0);
        assert_eq!(exited.replaces_id, 0);
        assert_eq!(exited.body, "Exited location");
        assert_eq!(exited.urgency, URGENCY_CRITICAL);
    }

    #[test]
    fn test_notifier_starts_without_connection() {
        let notifier = DesktopNotifier::new(false);
        assert!(notifier.connection.is_none());
    }
}
