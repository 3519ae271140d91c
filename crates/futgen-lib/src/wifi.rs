//! Wi-Fi vocabulary: radio bands, channel widths, encryption and the
//! column keywords templates use to carry them.
//!
//! Every string that reaches the generator from a template or a capability
//! document is parsed into one of these closed enums before any decision is
//! made on it.

use std::fmt;

/// A radio band as named in capability documents and templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RadioBand {
    Band24g,
    Band5g,
    Band5gl,
    Band5gu,
    Band6g,
}

impl RadioBand {
    /// All bands in canonical enumeration order.
    pub const ALL: [RadioBand; 5] = [
        RadioBand::Band24g,
        RadioBand::Band5g,
        RadioBand::Band5gl,
        RadioBand::Band5gu,
        RadioBand::Band6g,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RadioBand::Band24g => "24g",
            RadioBand::Band5g => "5g",
            RadioBand::Band5gl => "5gl",
            RadioBand::Band5gu => "5gu",
            RadioBand::Band6g => "6g",
        }
    }

    /// Parse a band token (case-insensitive). Returns `None` for unknown bands.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        RadioBand::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
    }

    /// The band family used when a table does not distinguish sub-bands.
    ///
    /// `5gl` and `5gu` collapse to `5g`; every other band is its own family.
    pub fn family(self) -> RadioBand {
        match self {
            RadioBand::Band5gl | RadioBand::Band5gu => RadioBand::Band5g,
            other => other,
        }
    }

    /// Uppercase radio-type label used by the stats manager (`24g` → `2.4G`).
    pub fn radio_type_label(self) -> &'static str {
        match self {
            RadioBand::Band24g => "2.4G",
            RadioBand::Band5g => "5G",
            RadioBand::Band5gl => "5GL",
            RadioBand::Band5gu => "5GU",
            RadioBand::Band6g => "6G",
        }
    }

    /// Encryption implied for a band when a template does not name one.
    pub fn default_encryption(self) -> Encryption {
        match self {
            RadioBand::Band6g => Encryption::Wpa3,
            _ => Encryption::Wpa2,
        }
    }
}

impl fmt::Display for RadioBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel bandwidth mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HtMode {
    Ht20,
    Ht2040,
    Ht40,
    Ht40Plus,
    Ht40Minus,
    Ht80,
    Ht160,
    Ht80Plus80,
}

impl HtMode {
    pub const ALL: [HtMode; 8] = [
        HtMode::Ht20,
        HtMode::Ht2040,
        HtMode::Ht40,
        HtMode::Ht40Plus,
        HtMode::Ht40Minus,
        HtMode::Ht80,
        HtMode::Ht160,
        HtMode::Ht80Plus80,
    ];

    /// Widths swept when enumerating "every bandwidth up to the maximum".
    const SWEEP: [HtMode; 4] = [HtMode::Ht20, HtMode::Ht40, HtMode::Ht80, HtMode::Ht160];

    pub fn as_str(self) -> &'static str {
        match self {
            HtMode::Ht20 => "HT20",
            HtMode::Ht2040 => "HT2040",
            HtMode::Ht40 => "HT40",
            HtMode::Ht40Plus => "HT40+",
            HtMode::Ht40Minus => "HT40-",
            HtMode::Ht80 => "HT80",
            HtMode::Ht160 => "HT160",
            HtMode::Ht80Plus80 => "HT80+80",
        }
    }

    /// Parse a bandwidth mode (case-insensitive). Returns `None` outside the
    /// fixed enumeration.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        HtMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    /// Occupied channel width in MHz.
    pub fn width_mhz(self) -> u32 {
        match self {
            HtMode::Ht20 => 20,
            HtMode::Ht2040 | HtMode::Ht40 | HtMode::Ht40Plus | HtMode::Ht40Minus => 40,
            HtMode::Ht80 => 80,
            HtMode::Ht160 | HtMode::Ht80Plus80 => 160,
        }
    }

    /// The HT20/HT40/HT80/HT160 sweep, limited to modes not wider than `max_width_mhz`.
    pub fn up_to(max_width_mhz: u32) -> Vec<HtMode> {
        HtMode::SWEEP
            .into_iter()
            .filter(|m| m.width_mhz() <= max_width_mhz)
            .collect()
    }
}

impl fmt::Display for HtMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    Wpa2,
    Wpa3,
}

impl Encryption {
    pub fn as_str(self) -> &'static str {
        match self {
            Encryption::Wpa2 => "WPA2",
            Encryption::Wpa3 => "WPA3",
        }
    }
}

// ── Template column keywords ──

/// Columns that carry a radio band. The prefix before `radio_band` selects
/// the device (see [`is_reference_column`]) and the matching channel column.
pub const RADIO_BAND_KEYWORDS: [&str; 5] = [
    "radio_band",
    "gw_radio_band",
    "leaf_radio_band",
    "l1_radio_band",
    "l2_radio_band",
];

/// Column carrying the bandwidth mode.
pub const HT_MODE_KEY: &str = "ht_mode";

/// Column carrying the encryption.
pub const ENCRYPTION_KEY: &str = "encryption";

/// Channel column paired with a band column: `gw_radio_band` → `gw_channel`.
pub fn channel_column(band_column: &str) -> String {
    let prefix = band_column.strip_suffix("radio_band").unwrap_or("");
    format!("{prefix}channel")
}

/// Whether a band column refers to the reference (leaf) device.
pub fn is_reference_column(band_column: &str) -> bool {
    matches!(
        band_column.strip_suffix("_radio_band"),
        Some("leaf" | "l1" | "l2")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_parse_round_trips() {
        for band in RadioBand::ALL {
            assert_eq!(RadioBand::parse(band.as_str()), Some(band));
        }
        assert_eq!(RadioBand::parse("5GL"), Some(RadioBand::Band5gl));
        assert_eq!(RadioBand::parse("9g"), None);
        assert_eq!(RadioBand::parse(""), None);
    }

    #[test]
    fn sub_bands_collapse_to_5g_family() {
        assert_eq!(RadioBand::Band5gl.family(), RadioBand::Band5g);
        assert_eq!(RadioBand::Band5gu.family(), RadioBand::Band5g);
        assert_eq!(RadioBand::Band6g.family(), RadioBand::Band6g);
    }

    #[test]
    fn radio_type_labels() {
        assert_eq!(RadioBand::Band24g.radio_type_label(), "2.4G");
        assert_eq!(RadioBand::Band6g.radio_type_label(), "6G");
        assert_eq!(RadioBand::Band5gu.radio_type_label(), "5GU");
    }

    #[test]
    fn six_ghz_defaults_to_wpa3() {
        assert_eq!(RadioBand::Band6g.default_encryption(), Encryption::Wpa3);
        assert_eq!(RadioBand::Band24g.default_encryption(), Encryption::Wpa2);
    }

    #[test]
    fn ht_mode_parse_accepts_fixed_enumeration_only() {
        assert_eq!(HtMode::parse("HT40+"), Some(HtMode::Ht40Plus));
        assert_eq!(HtMode::parse("ht80+80"), Some(HtMode::Ht80Plus80));
        assert_eq!(HtMode::parse("HT42"), None);
        assert_eq!(HtMode::parse("HT320"), None);
    }

    #[test]
    fn ht_modes_up_to_max_width() {
        assert_eq!(HtMode::up_to(80), vec![HtMode::Ht20, HtMode::Ht40, HtMode::Ht80]);
        assert_eq!(HtMode::up_to(20), vec![HtMode::Ht20]);
        assert!(HtMode::up_to(10).is_empty());
        assert_eq!(HtMode::up_to(160).len(), 4);
    }

    #[test]
    fn channel_column_follows_band_prefix() {
        assert_eq!(channel_column("radio_band"), "channel");
        assert_eq!(channel_column("gw_radio_band"), "gw_channel");
        assert_eq!(channel_column("leaf_radio_band"), "leaf_channel");
    }

    #[test]
    fn reference_columns() {
        assert!(is_reference_column("leaf_radio_band"));
        assert!(is_reference_column("l2_radio_band"));
        assert!(!is_reference_column("gw_radio_band"));
        assert!(!is_reference_column("radio_band"));
    }
}
