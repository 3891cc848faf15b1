use crate::error::AppError;
use crate::notify::{APP_NAME, Notifier, Permission};
use notify_rust::Notification;

/// Desktop notifications over the freedesktop D-Bus interface, which has no
/// permission prompt of its own.
pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn show(&self, title: &str, body: &str) -> Result<(), AppError> {
        Notification::new()
            .appname(APP_NAME)
            .summary(title)
            .body(body)
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
