// Value normalisation for scraped strings: numbers, speeds, sizes,
// durations, bands, and MAC addresses.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use super::tables::pattern;

/// Parse a decimal integer, tolerating surrounding whitespace.
/// Placeholders such as `-` come back as `None`.
pub fn as_int(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Parse a hexadecimal integer (with or without `0x`).
pub fn hex_as_int(raw: Option<&str>) -> Option<u64> {
    let s = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).ok()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Transfer speed in Mbit/s from strings like `"512.00 Kbps"`.
///
/// Unknown units read as `0.0`; an unparsable number is `None`.
pub fn parse_speed(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let lower = raw.to_lowercase();
    let number = || raw.split(' ').next().and_then(|n| n.parse::<f64>().ok());

    if lower.ends_with(" kbps") {
        number().map(|n| round2(n / 1024.0))
    } else if lower.ends_with(" mbps") {
        number()
    } else if lower.ends_with(" gbps") {
        number().map(|n| n * 1024.0)
    } else if lower.ends_with(" bps") {
        number().map(|n| round2(n / 1024.0 / 1024.0))
    } else {
        Some(0.0)
    }
}

static DATA_SIZE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^([\d.]+)\s*(KB|MB|GB|TB|B)"));

/// Data volume in MB from strings like `"219.49 GB"`.
pub fn parse_data_size(raw: &str) -> Option<f64> {
    let caps = DATA_SIZE.captures(raw.trim())?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_ascii_uppercase();
    Some(match unit.as_str() {
        "B" => value / 1024.0 / 1024.0,
        "KB" => value / 1024.0,
        "GB" => value * 1024.0,
        "TB" => value * 1024.0 * 1024.0,
        _ => value,
    })
}

/// Split `"51.60 MB / 368.07 MB"` into upload and download volumes in MB.
pub fn split_upload_download(raw: &str) -> (Option<f64>, Option<f64>) {
    let mut parts = raw.split(" / ");
    match (parts.next(), parts.next()) {
        (Some(up), Some(down)) => (parse_data_size(up), parse_data_size(down)),
        _ => (None, None),
    }
}

static BAND_WITH_WIDTH: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^.*BAND\s*(\d+)\s*/\s*(\d+)\s*MHz"));
static BAND_SHORT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^[Bn](\d+)$"));
static BAND_NAMED: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)(?:LTE|NR|5G)?\s*Band\s*(\d+)"));

/// Normalise a carrier band description to `B<n>`.
///
/// Accepts `"BAND 3 / 20 MHz"`, `"B3"`, `"n78"`, `"NR Band 78"`, and bare numbers.
pub fn band_label(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let trimmed = raw.trim();
    let number = BAND_WITH_WIDTH
        .captures(raw)
        .or_else(|| BAND_SHORT.captures(trimmed))
        .or_else(|| BAND_NAMED.captures(raw))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .or_else(|| {
            (!trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())).then_some(trimmed)
        })?;
    Some(format!("B{number}"))
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Seconds per calendar unit word. Months and years use fixed lengths.
fn unit_secs(word: &str) -> Option<u64> {
    if word.starts_with("year") {
        Some(365 * DAY)
    } else if word.starts_with("month") {
        Some(30 * DAY)
    } else if word.starts_with("week") {
        Some(7 * DAY)
    } else if word.starts_with("day") {
        Some(DAY)
    } else {
        None
    }
}

/// Seconds in durations like `"03:01:16"` or `"2 Days 03:01:16"`.
///
/// Values too large for a `u64` count of seconds read as absent.
pub fn parse_duration_secs(raw: &str) -> Option<u64> {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    let parts: Vec<&str> = lower.split_whitespace().collect();
    let mut total = 0_u64;

    for (i, part) in parts.iter().enumerate() {
        if part.matches(':').count() == 2 {
            let mut hms = part.split(':').map(|n| n.parse::<u64>().unwrap_or(0));
            let (h, m, s) = (
                hms.next().unwrap_or(0),
                hms.next().unwrap_or(0),
                hms.next().unwrap_or(0),
            );
            let secs = h
                .checked_mul(HOUR)?
                .checked_add(m.checked_mul(MINUTE)?)?
                .checked_add(s)?;
            total = total.checked_add(secs)?;
        } else if i > 0 {
            if let Some(unit) = unit_secs(part) {
                let count = parts
                    .get(i - 1)
                    .and_then(|n| n.parse::<u64>().ok())
                    .unwrap_or(0);
                total = total.checked_add(count.checked_mul(unit)?)?;
            }
        }
    }
    Some(total)
}

/// Signal bars (0..=4) for an RSSI reading. Zero or missing is unknown.
pub fn signal_strength(rssi: Option<i64>) -> Option<u8> {
    match rssi? {
        0 => None,
        r if r > 20 => Some(4),
        r if r > 15 => Some(3),
        r if r > 10 => Some(2),
        r if r > 5 => Some(1),
        _ => Some(0),
    }
}

/// Trim a value and drop placeholder text (`-`, `n/a`, `unknown`, ...).
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let cleaned = raw?.replace('*', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    let placeholder = matches!(
        cleaned.to_lowercase().as_str(),
        "-" | "--" | "n/a" | "na" | "unknown"
    );
    (!placeholder).then(|| cleaned.to_owned())
}

/// `AA:BB:CC:DD:EE:FF` for MACs written with dashes or lowercase.
pub fn normalize_mac(raw: &str) -> String {
    raw.trim().to_uppercase().replace('-', ":")
}

/// `AA:BB:CC:DD:EE:FF` from the 12-hex-digit form used in mesh client ids.
pub fn format_compact_mac(raw: &str) -> String {
    raw.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).to_uppercase())
        .collect::<Vec<_>>()
        .join(":")
}

/// Stable locally administered MAC for a mesh node known only by name.
pub fn pseudo_mac(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    digest
        .iter()
        .take(6)
        .enumerate()
        .map(|(i, b)| {
            let b = if i == 0 { (b & 0xFC) | 0x02 } else { *b };
            format!("{b:02X}")
        })
        .collect::<Vec<_>>()
        .join(":")
}
