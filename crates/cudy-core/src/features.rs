// ── Per-model feature gating ──
//
// Cudy firmwares differ in which status pages exist. The table lists, per
// model, the `module|field` pairs that model does NOT implement. Unknown
// models use the `default` row.

use crate::config::DEFAULT_MODEL;
use crate::model::Module;

const WAN_FIELDS: &[&str] = &[
    "wan|protocol",
    "wan|connected_time",
    "wan|mac_address",
    "wan|public_ip",
    "wan|wan_ip",
    "wan|subnet_mask",
    "wan|gateway",
    "wan|dns",
    "wan|session_upload",
    "wan|session_download",
];

const WR3000S_V1_MISSING: &[&str] = &[
    "modem|signal",
    "modem|network",
    "modem|sim",
    "modem|connected_time",
    "modem|cell",
    "modem|rsrp",
    "modem|rsrq",
    "modem|sinr",
    "modem|rssi",
    "modem|band",
    "modem|public_ip",
    "modem|wan_ip",
    "modem|imei",
    "modem|imsi",
    "modem|iccid",
    "modem|mode",
    "modem|bandwidth",
    "modem|session_upload",
    "modem|session_download",
    "data_usage|current_traffic",
    "data_usage|monthly_traffic",
    "data_usage|total_traffic",
    "sms|inbox_count",
    "sms|outbox_count",
    "sms|unread_count",
];

const NOT_IMPLEMENTED: &[(&str, &[&str])] = &[
    (DEFAULT_MODEL, WAN_FIELDS),
    ("WR3000S V1.0", WR3000S_V1_MISSING),
];

fn missing_for(model: &str) -> &'static [&'static str] {
    NOT_IMPLEMENTED
        .iter()
        .find(|(name, _)| *name == model)
        .or_else(|| NOT_IMPLEMENTED.iter().find(|(name, _)| *name == DEFAULT_MODEL))
        .map_or(&[], |(_, missing)| missing)
}

/// Whether `model` implements `module`, or one field of it.
///
/// With `field` set this is an exact `module|field` lookup. Without it,
/// the module counts as missing only when every field it has is excluded.
pub fn existing_feature(model: &str, module: Module, field: Option<&str>) -> bool {
    let missing = missing_for(model);
    match field {
        Some(field) => {
            let key = format!("{module}|{field}");
            !missing.iter().any(|m| *m == key)
        }
        None => module_supported(model, module),
    }
}

/// Module-level check used by the collector.
pub fn module_supported(model: &str, module: Module) -> bool {
    let missing = missing_for(model);
    let fields = module.fields();
    fields.is_empty()
        || fields
            .iter()
            .map(|field| format!("{module}|{field}"))
            .any(|key| !missing.iter().any(|m| *m == key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_uses_default_row() {
        assert!(!existing_feature("X6 V2", Module::Wan, Some("gateway")));
        assert!(!existing_feature("X6 V2", Module::Wan, None));
        assert!(existing_feature("X6 V2", Module::Modem, Some("rssi")));
    }

    #[test]
    fn wr3000s_lacks_cellular_features() {
        let model = "WR3000S V1.0";
        assert!(!existing_feature(model, Module::Modem, None));
        assert!(!existing_feature(model, Module::DataUsage, None));
        assert!(!existing_feature(model, Module::Sms, Some("unread_count")));
        assert!(existing_feature(model, Module::Wan, None));
        assert!(existing_feature(model, Module::Mesh, None));
    }

    #[test]
    fn every_module_supported_on_default_except_wan() {
        for module in Module::all() {
            assert_eq!(
                module_supported(DEFAULT_MODEL, module),
                module != Module::Wan,
                "{module}"
            );
        }
    }
}
