use std::str::FromStr;
use std::time::Duration;

use label_printer::{LabelSpec, PrintResult, PrinterEndpoint};

use crate::printing::ImageMode;

/// Bridge configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | PRINTER_HOST | 192.168.1.100 | printer host |
/// | PRINTER_PORT | 9100 | printer port |
/// | PRINTER_TIMEOUT_MS | 5000 | connect / response timeout |
/// | FETCH_TIMEOUT_MS | 10000 | image download timeout |
/// | WEBVIEW_URL | (empty) | initial page, overridden by the settings file |
/// | SETTINGS_FILE | settings.json | settings JSON file |
/// | SETTINGS_POLL_SECS | 5 | settings re-read interval |
/// | LABEL_WIDTH_DOTS / LABEL_HEIGHT_DOTS | 609 / 609 | label size |
/// | LABEL_HOME_X / LABEL_HOME_Y | 0 / 0 | label home |
/// | LABEL_ORIENTATION | NORMAL | NORMAL, ROTATED, INVERTED, BOTTOM_UP |
/// | LABEL_MEDIA | MARK_SENSING | MARK_SENSING, CONTINUOUS, GAP |
/// | LABEL_MEDIA_DOTS | 24 | black mark offset |
/// | IMAGE_X / IMAGE_Y | 50 / 50 | image position |
/// | IMAGE_MODE | raw | raw or raster |
/// | LOG_LEVEL | info | log level |
/// | LOG_DIR | (unset) | rolling log file directory |
///
/// # Example
///
/// ```ignore
/// PRINTER_HOST=10.0.0.20 IMAGE_MODE=raster cargo run -p print-bridge
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub printer_host: String,
    pub printer_port: u16,
    pub printer_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
    pub web_view_url: String,
    pub settings_file: String,
    pub settings_poll_secs: u64,
    /// Label geometry and media setup
    pub label: LabelSpec,
    pub image_x: u32,
    pub image_y: u32,
    pub image_mode: ImageMode,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Unset or unparsable variables fall back to [`Config::default`].
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            printer_host: std::env::var("PRINTER_HOST").unwrap_or(d.printer_host),
            printer_port: env_or("PRINTER_PORT", d.printer_port),
            printer_timeout_ms: env_or("PRINTER_TIMEOUT_MS", d.printer_timeout_ms),
            fetch_timeout_ms: env_or("FETCH_TIMEOUT_MS", d.fetch_timeout_ms),
            web_view_url: std::env::var("WEBVIEW_URL").unwrap_or(d.web_view_url),
            settings_file: std::env::var("SETTINGS_FILE").unwrap_or(d.settings_file),
            settings_poll_secs: env_or("SETTINGS_POLL_SECS", d.settings_poll_secs),
            label: LabelSpec {
                width_dots: env_or("LABEL_WIDTH_DOTS", d.label.width_dots),
                height_dots: env_or("LABEL_HEIGHT_DOTS", d.label.height_dots),
                home_x: env_or("LABEL_HOME_X", d.label.home_x),
                home_y: env_or("LABEL_HOME_Y", d.label.home_y),
                orientation: env_or("LABEL_ORIENTATION", d.label.orientation),
                media_type: env_or("LABEL_MEDIA", d.label.media_type),
                media_dots: env_or("LABEL_MEDIA_DOTS", d.label.media_dots),
            },
            image_x: env_or("IMAGE_X", d.image_x),
            image_y: env_or("IMAGE_Y", d.image_y),
            image_mode: env_or("IMAGE_MODE", d.image_mode),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(d.log_level),
            log_dir: std::env::var("LOG_DIR").ok().or(d.log_dir),
        }
    }

    /// Validated printer address
    pub fn printer_endpoint(&self) -> PrintResult<PrinterEndpoint> {
        PrinterEndpoint::new(self.printer_host.clone(), self.printer_port)
    }

    pub fn printer_timeout(&self) -> Duration {
        Duration::from_millis(self.printer_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn settings_poll_interval(&self) -> Duration {
        Duration::from_secs(self.settings_poll_secs.max(1))
    }
}

impl Default for Config {
    /// Documented defaults; does not read the environment
    fn default() -> Self {
        Self {
            printer_host: "192.168.1.100".to_string(),
            printer_port: label_printer::DEFAULT_PORT,
            printer_timeout_ms: 5000,
            fetch_timeout_ms: 10000,
            web_view_url: String::new(),
            settings_file: "settings.json".to_string(),
            settings_poll_secs: 5,
            label: LabelSpec::default(),
            image_x: 50,
            image_y: 50,
            image_mode: ImageMode::Raw,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back() {
        assert_eq!(env_or("PRINT_BRIDGE_TEST_UNSET_VAR", 42u32), 42);
    }

    #[test]
    fn test_default_is_documented_values() {
        let config = Config::default();
        assert_eq!(config.printer_host, "192.168.1.100");
        assert_eq!(config.printer_port, 9100);
        assert_eq!(config.printer_timeout(), Duration::from_secs(5));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.settings_file, "settings.json");
        assert_eq!(config.settings_poll_interval(), Duration::from_secs(5));
        assert_eq!(config.label, LabelSpec::default());
        assert_eq!((config.image_x, config.image_y), (50, 50));
        assert_eq!(config.image_mode, ImageMode::Raw);
        assert_eq!(config.log_level, "info");
        assert!(config.web_view_url.is_empty());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_durations() {
        let mut config = Config::default();
        config.printer_timeout_ms = 250;
        config.settings_poll_secs = 0;
        assert_eq!(config.printer_timeout(), Duration::from_millis(250));
        assert_eq!(config.settings_poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_printer_endpoint_validation() {
        let mut config = Config::default();
        config.printer_host = "10.0.0.20".into();
        config.printer_port = 9100;
        assert_eq!(config.printer_endpoint().unwrap().to_string(), "10.0.0.20:9100");
        config.printer_port = 0;
        assert!(config.printer_endpoint().is_err());
    }
}
