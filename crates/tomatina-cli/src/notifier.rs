use notify_rust::{Notification, Urgency};
use tomatina_core::{Notice, NotificationGateway, NotifyError};

/// Desktop notifications via the platform notification service.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl NotificationGateway for DesktopNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        let mut notification = Notification::new();
        notification
            .summary(&notice.title)
            .body(&notice.body)
            .appname("tomatina")
            .icon("alarm-clock");
        if notice.urgent {
            notification.urgency(Urgency::Critical);
        }
        notification
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError(e.to_string()))
    }
}
