use crate::error::AppError;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const DISABLE_ENV_VAR: &str = "TASKLOG_DISABLE_NOTIFICATIONS";
pub const APP_NAME: &str = "tasklog";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Undecided,
    Granted,
    Denied,
}

/// Local notification facility used by the reminder scanner.
pub trait Notifier {
    /// Current decision, without prompting.
    fn permission(&self) -> Permission {
        Permission::Undecided
    }

    fn request_permission(&self) -> Permission;

    fn show(&self, title: &str, body: &str) -> Result<(), AppError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn permission(&self) -> Permission {
        (**self).permission()
    }

    fn request_permission(&self) -> Permission {
        (**self).request_permission()
    }

    fn show(&self, title: &str, body: &str) -> Result<(), AppError> {
        (**self).show(title, body)
    }
}

/// Declines permission, so nothing is ever shown.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    fn show(&self, _title: &str, _body: &str) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        tracing::debug!("desktop notifications disabled by environment");
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(err) => match err {
            AppError::InvalidData(_) => {
                tracing::debug!(error = %err, "falling back to no-op notifier");
                Ok(Box::new(NoopNotifier))
            }
            other => Err(other),
        },
    }
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
