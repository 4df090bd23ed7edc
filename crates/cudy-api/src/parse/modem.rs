// Cellular modem status (`admin/network/gcom/status`).

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use super::tables::{Fields, selector};
use super::values::{
    as_int, band_label, hex_as_int, parse_duration_secs, signal_strength, split_upload_download,
};

/// Bands of the primary and secondary component carriers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierBands {
    pub pcc: Option<String>,
    pub scc1: Option<String>,
    pub scc2: Option<String>,
    pub scc3: Option<String>,
    pub scc4: Option<String>,
}

impl CarrierBands {
    /// `B3+B7+B20` style aggregate of PCC and the first three SCCs.
    pub fn combined(&self) -> Option<String> {
        let joined = [&self.pcc, &self.scc1, &self.scc2, &self.scc3]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("+");
        (!joined.is_empty()).then_some(joined)
    }
}

/// Serving cell identity. eNB and sector are derived from the hex cell id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellInfo {
    /// Cell id as displayed by the router.
    pub raw: Option<String>,
    pub id: Option<u64>,
    pub enb: Option<u64>,
    pub sector: Option<u64>,
    pub pcid: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModemInfo {
    pub network: Option<String>,
    pub mcc: Option<String>,
    pub mnc: Option<String>,
    pub connected_time: Option<u64>,
    /// Signal bars (0..=4) derived from RSSI.
    pub signal: Option<u8>,
    pub rssi: Option<i64>,
    pub rsrp: Option<i64>,
    pub rsrq: Option<i64>,
    pub sinr: Option<i64>,
    /// `Sim 1` / `Sim 2`, from the slot icon.
    pub sim: Option<String>,
    pub band: Option<String>,
    pub bands: CarrierBands,
    pub cell: CellInfo,
    pub public_ip: Option<String>,
    pub wan_ip: Option<String>,
    pub imsi: Option<String>,
    pub imei: Option<String>,
    pub iccid: Option<String>,
    pub mode: Option<String>,
    pub bandwidth: Option<String>,
    /// Session traffic in MB.
    pub session_upload: Option<f64>,
    pub session_download: Option<f64>,
}

static SIM_ICON: LazyLock<Selector> = LazyLock::new(|| selector("i.icon[class*='sim']"));

/// SIM slot shown by the `i.icon.simN` indicator.
pub fn sim_slot(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let icon = doc.select(&SIM_ICON).next()?;
    let class = icon.value().classes().find(|c| c.contains("sim"))?;
    if class.contains("sim1") {
        Some("Sim 1".into())
    } else if class.contains("sim2") {
        Some("Sim 2".into())
    } else {
        None
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_owned)
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Parse the modem status page (summary and `detail=1` views concatenated).
pub fn parse_modem_info(html: &str) -> ModemInfo {
    let fields = Fields::parse(html);

    // Single-carrier firmware has no PCC row, only a plain band label.
    let pcc = fields
        .get("PCC")
        .and_then(band_label)
        .or_else(|| {
            fields
                .first(&["Band", "Current Band", "LTE Band", "Active Band"])
                .and_then(band_label)
        });
    let bands = CarrierBands {
        pcc,
        scc1: fields.first(&["SCC", "SCC1"]).and_then(band_label),
        scc2: fields.get("SCC2").and_then(band_label),
        scc3: fields.get("SCC3").and_then(band_label),
        scc4: fields.get("SCC4").and_then(band_label),
    };

    let cell_id = hex_as_int(fields.first(&["Cell ID", "CellID"]));
    let cell = CellInfo {
        raw: owned(fields.get("Cell ID")),
        id: cell_id,
        enb: cell_id.filter(|id| *id != 0).map(|id| id / 256),
        sector: cell_id.filter(|id| *id != 0).map(|id| id % 256),
        pcid: as_int(fields.get("PCID")),
    };

    let (session_upload, session_download) = fields
        .first(&["Upload / Download", "Upload/Download"])
        .map_or((None, None), split_upload_download);

    let rssi = as_int(fields.get("RSSI"));

    ModemInfo {
        network: fields
            .get("Network Type")
            .map(|n| n.replace(" ...", ""))
            .filter(|n| !n.is_empty()),
        mcc: owned(fields.get("MCC")),
        mnc: owned(fields.get("MNC")),
        connected_time: fields.get("Connected Time").and_then(parse_duration_secs),
        signal: signal_strength(rssi),
        rssi,
        rsrp: as_int(fields.get("RSRP")),
        rsrq: as_int(fields.get("RSRQ")),
        sinr: as_int(fields.get("SINR")),
        sim: sim_slot(html),
        band: bands.combined(),
        bands,
        cell,
        public_ip: owned(fields.get("Public IP")),
        wan_ip: trimmed(fields.get("IP Address")),
        imsi: owned(fields.get("IMSI")),
        imei: owned(fields.get("IMEI")),
        iccid: owned(fields.get("ICCID")),
        mode: trimmed(fields.get("Mode")),
        bandwidth: owned(fields.first(&["DL Bandwidth", "Bandwidth", "DL BW"])),
        session_upload,
        session_download,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = r#"
<div class="panel"><i class="icon icon-sim1"></i></div>
<table>
  <tr><td><p class="visible-xs">Network Type</p></td><td><p class="visible-xs">5G-SA ...</p></td></tr>
  <tr><td><p class="visible-xs">MCC</p></td><td><p class="visible-xs">001</p></td></tr>
  <tr><td><p class="visible-xs">MNC</p></td><td><p class="visible-xs">01</p></td></tr>
  <tr><td><p class="visible-xs">RSSI</p></td><td><p class="visible-xs">18</p></td></tr>
  <tr><td><p class="visible-xs">RSRP</p></td><td><p class="visible-xs">-95</p></td></tr>
  <tr><td><p class="visible-xs">RSRQ</p></td><td><p class="visible-xs">-11</p></td></tr>
  <tr><td><p class="visible-xs">SINR</p></td><td><p class="visible-xs">12</p></td></tr>
  <tr><td><p class="visible-xs">Cell ID</p></td><td><p class="visible-xs">1A2B3C</p></td></tr>
  <tr><td><p class="visible-xs">PCID</p></td><td><p class="visible-xs">311</p></td></tr>
  <tr><td><p class="visible-xs">Band</p></td><td><p class="visible-xs">n78</p></td></tr>
  <tr><td><p class="visible-xs">DL Bandwidth</p></td><td><p class="visible-xs">100 MHz</p></td></tr>
  <tr><td><p class="visible-xs">Public IP</p></td><td><p class="visible-xs">198.51.100.20</p></td></tr>
  <tr><td><p class="visible-xs">IP Address</p></td><td><p class="visible-xs"> 10.64.0.2 </p></td></tr>
  <tr><td><p class="visible-xs">Connected Time</p></td><td><p class="visible-xs">1 Day 02:00:00</p></td></tr>
  <tr><td><p class="visible-xs">Upload / Download</p></td><td><p class="visible-xs">51.60 MB / 368.07 MB</p></td></tr>
</table>"#;

    #[test]
    fn status_page_yields_documented_fields() {
        let info = parse_modem_info(STATUS);

        assert_eq!(info.network.as_deref(), Some("5G-SA"));
        assert_eq!(info.mcc.as_deref(), Some("001"));
        assert_eq!(info.sim.as_deref(), Some("Sim 1"));
        assert_eq!(info.band.as_deref(), Some("B78"));
        assert_eq!(info.bands.pcc.as_deref(), Some("B78"));
        assert_eq!(info.public_ip.as_deref(), Some("198.51.100.20"));
        assert_eq!(info.wan_ip.as_deref(), Some("10.64.0.2"));
        assert_eq!(info.rssi, Some(18));
        assert_eq!(info.signal, Some(3));
        assert_eq!(info.rsrp, Some(-95));
        assert_eq!(info.connected_time, Some(93_600));
        assert_eq!(info.session_upload, Some(51.6));
        assert_eq!(info.session_download, Some(368.07));
        assert_eq!(info.bandwidth.as_deref(), Some("100 MHz"));
    }

    #[test]
    fn cell_id_splits_into_enb_and_sector() {
        let info = parse_modem_info(STATUS);
        assert_eq!(info.cell.raw.as_deref(), Some("1A2B3C"));
        assert_eq!(info.cell.id, Some(0x1A_2B3C));
        assert_eq!(info.cell.enb, Some(0x1A_2B3C / 256));
        assert_eq!(info.cell.sector, Some(0x3C));
        assert_eq!(info.cell.pcid, Some(311));
    }

    #[test]
    fn carrier_aggregation_joins_bands() {
        let html = "<table>\
            <tr><td>PCC</td><td>BAND 3 / 20 MHz</td></tr>\
            <tr><td>SCC</td><td>BAND 7 / 20 MHz</td></tr>\
            <tr><td>SCC2</td><td>B20</td></tr>\
            </table>";
        let info = parse_modem_info(html);
        assert_eq!(info.band.as_deref(), Some("B3+B7+B20"));
        assert_eq!(info.bands.scc1.as_deref(), Some("B7"));
    }

    #[test]
    fn missing_rows_come_back_absent() {
        let html = STATUS.replace("Public IP", "Something Else");
        let info = parse_modem_info(&html);
        assert_eq!(info.public_ip, None);
        assert_eq!(info.network.as_deref(), Some("5G-SA"));
    }

    #[test]
    fn empty_page_has_no_values() {
        let info = parse_modem_info("");
        assert_eq!(info, ModemInfo::default());
        assert_eq!(info.band, None);
    }
}
