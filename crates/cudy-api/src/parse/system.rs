// System status: uptime, firmware, local time.
//
// Firmware builds disagree on where the version lives, so the collector
// concatenates several pages and this parser tries table labels first,
// then a handful of inline patterns.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tables::{Fields, pattern};
use super::values::parse_duration_secs;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Seconds since boot.
    pub uptime: Option<u64>,
    pub local_time: Option<String>,
    pub firmware_version: Option<String>,
}

const FIRMWARE_KEYS: &[&str] = &[
    "Firmware Version",
    "Firmware",
    "Software Version",
    "Version",
    "FW Version",
    "Firmware Ver",
    "Firmware Ver.",
    "System Version",
    "Router Firmware",
    "Current Version",
    "SW Version",
    "Build Version",
    "Release",
];

const LOCAL_TIME_KEYS: &[&str] = &[
    "Local Time",
    "System Time",
    "Time",
    "Current Time",
    "Router Time",
];

static FIRMWARE_PATTERNS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        pattern(r#"(?i)["']?(?:firmware|fw|version)["']?\s*[=:]\s*["']([\d.]+[^"']*)["'\s,]"#),
        pattern(r#"(?i)data-firmware=["']([^"']*)["'\s]"#),
        pattern(r"(?i)>\s*([vV]?\d+\.\d+\.\d+[^<]*)\s*<"),
        pattern(r"(?i)Firmware[:\s]+([vV]?\d+\.\d+\.\d+[^\s<]*)"),
        pattern(r"(?i)Firmware Version</th><th[^>]*>([^<]+)<"),
    ]
});

fn firmware_from_markup(html: &str) -> Option<String> {
    FIRMWARE_PATTERNS
        .iter()
        .find_map(|re| re.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|fw| !fw.is_empty())
}

pub fn parse_system_status(html: &str) -> SystemStatus {
    let fields = Fields::parse(html);
    debug!(keys = fields.len(), bytes = html.len(), "parsed system status");

    let firmware_version = fields
        .first(FIRMWARE_KEYS)
        .map(str::to_owned)
        .or_else(|| firmware_from_markup(html));

    SystemStatus {
        uptime: fields
            .first(&["Uptime", "System Uptime"])
            .and_then(parse_duration_secs),
        local_time: fields.first(LOCAL_TIME_KEYS).map(str::to_owned),
        firmware_version,
    }
}
