// Form-page helpers used by the login and action flows.

use std::sync::LazyLock;

use regex::Regex;

use super::tables::pattern;

/// Value of a hidden `<input name="...">`; empty values count as missing.
pub fn hidden_input(html: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"name="{}"[^>]*value="([^"]*)""#, regex::escape(name))).ok()?;
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .filter(|v| !v.is_empty())
}

static BAND_SELECT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)<select[^>]*name="([^"]*band[^"]*)""#));

/// `name` of the first `<select>` whose name mentions "band".
pub fn band_select_name(html: &str) -> Option<String> {
    BAND_SELECT
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

static AT_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r#"<textarea[^>]*id="cbid\.atcmd\.1\._custom"[^>]*>([^<]*)</textarea>"#)
});

/// Modem reply echoed in the AT command page's output textarea.
pub fn at_command_output(html: &str) -> Option<String> {
    AT_OUTPUT
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
}

static LED_ON: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)led["\s]*[:=]\s*["']?(?:on|1|true|enabled)"#));
static LED_OFF: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)led["\s]*[:=]\s*["']?(?:off|0|false|disabled)"#));
static LED_INPUT: LazyLock<Regex> = LazyLock::new(|| pattern(r#"(?i)name="[^"]*led[^"]*"[^>]*"#));

/// LED state advertised by a mesh page, if the page talks about LEDs at all.
pub fn led_state_from_page(html: &str, mac: &str) -> Option<bool> {
    let lower = html.to_lowercase();
    if !lower.contains(&mac.to_lowercase()) && !lower.contains("led") {
        return None;
    }
    if LED_ON.is_match(html) {
        return Some(true);
    }
    if LED_OFF.is_match(html) {
        return Some(false);
    }
    LED_INPUT
        .find(html)
        .map(|input| input.as_str().to_lowercase().contains("checked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_input_reads_value() {
        let html = r#"<input type="hidden" name="token" value="abc123"/>
                      <input type="hidden" name="salt" value="" />"#;
        assert_eq!(hidden_input(html, "token").as_deref(), Some("abc123"));
        assert_eq!(hidden_input(html, "salt"), None);
        assert_eq!(hidden_input(html, "_csrf"), None);
    }

    #[test]
    fn band_select_is_case_insensitive() {
        let html = r#"<SELECT class="cbi-input" name="cbid.network.4g.NRBand">"#;
        assert_eq!(band_select_name(html).as_deref(), Some("cbid.network.4g.NRBand"));
    }

    #[test]
    fn at_output_is_trimmed() {
        let html = r#"<textarea id="cbid.atcmd.1._custom" rows="8">
+CSQ: 24,99

OK
</textarea>"#;
        assert_eq!(at_command_output(html).as_deref(), Some("+CSQ: 24,99\n\nOK"));
    }

    #[test]
    fn led_state_prefers_explicit_values() {
        assert_eq!(led_state_from_page(r#"{"led": "off"}"#, "AA:BB"), Some(false));
        assert_eq!(led_state_from_page("led=1", "AA:BB"), Some(true));
        assert_eq!(
            led_state_from_page(r#"<input type="checkbox" name="cbid.led.1.enable" checked>"#, "x"),
            Some(true)
        );
        assert_eq!(led_state_from_page("<p>nothing here</p>", "AA:BB"), None);
    }
}
