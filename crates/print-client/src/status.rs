//! Printer status as reported by the print gateway.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Response of the gateway's printer status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterStatus {
    /// Printer family the gateway drives (`zpl`).
    pub printer_type: String,
    /// Whether the printer answered the gateway's last probe.
    pub is_online: bool,
    /// Printer address, when the gateway knows it.
    #[serde(default)]
    pub ip_address: Option<String>,
    /// When the gateway last probed the printer (gateway local time).
    pub last_check: NaiveDateTime,
}
