//! User-visible failure alerts

use crate::utils::JobError;

/// Surfaces a failed job to the user; fire-and-forget
pub trait Alerter: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Writes alerts to the log under the `alert` target
#[derive(Debug, Clone, Default)]
pub struct LogAlerter;

impl Alerter for LogAlerter {
    fn notify(&self, title: &str, message: &str) {
        tracing::error!(target: "alert", title = %title, "{}", message);
    }
}

/// Title and message shown for a failed job
pub fn alert_text(error: &JobError) -> (&'static str, String) {
    if error.kind().is_printer_side() {
        ("Printer error", format!("Failed to connect to printer: {}", error))
    } else {
        ("Error", format!("Failed to generate ZPL: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use label_printer::PrintError;

    #[test]
    fn test_alert_text() {
        let (title, message) = alert_text(&PrintError::ConnectFailed("refused".into()).into());
        assert_eq!(title, "Printer error");
        assert!(message.starts_with("Failed to connect to printer"));

        let (title, message) = alert_text(&JobError::BadResponse("404".into()));
        assert_eq!(title, "Error");
        assert!(message.contains("404"));
    }
}
