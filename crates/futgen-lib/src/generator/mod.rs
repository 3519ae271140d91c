//! Per-test-case generators.
//!
//! Every test case is generated by the default pipeline ([`default`])
//! unless a specialized generator is registered for its name. Specialized
//! generators add a domain pass (role tokens, derived columns, compatibility
//! pruning, synthesized channel sweeps) and then hand the rows back to the
//! default pipeline.

pub mod default;
pub mod nm;
pub mod onbrd;
pub mod sm;
pub mod wm;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::capabilities::CapabilityStore;
use crate::error::Result;
use crate::regulatory::RegulatoryValidator;
use crate::roles::RoleResolver;
use crate::template::TestTemplate;
use crate::wifi::{HtMode, RadioBand};

/// One generated parameter set. Keys serialize sorted.
pub type ParamSet = BTreeMap<String, Value>;

/// Signature shared by all generators.
pub type GenFn = fn(&GenContext<'_>, &TestTemplate) -> Result<Vec<ParamSet>>;

/// Channel-map breadth for synthesized WM sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenType {
    /// Minimal spot-check channel subset per band.
    #[default]
    Optimized,
    /// Broader suggested channel subset per band.
    Extended,
}

impl GenType {
    pub fn as_str(self) -> &'static str {
        match self {
            GenType::Optimized => "optimized",
            GenType::Extended => "extended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimized" => Some(GenType::Optimized),
            "extended" => Some(GenType::Extended),
            _ => None,
        }
    }
}

/// Which device of the testbed a column refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// Device under test.
    Gw,
    /// Reference (leaf) device.
    Leaf,
}

/// Everything a generator reads: both capability snapshots and the rule table.
#[derive(Debug)]
pub struct GenContext<'a> {
    pub gw: &'a CapabilityStore,
    pub leaf: &'a CapabilityStore,
    pub regulatory: &'a RegulatoryValidator,
    pub domain: String,
    pub gen_type: GenType,
    unii_4_capable: bool,
}

impl<'a> GenContext<'a> {
    /// Build a context. Fails if the rule table lacks the DUT's regulatory domain.
    pub fn new(
        gw: &'a CapabilityStore,
        leaf: &'a CapabilityStore,
        regulatory: &'a RegulatoryValidator,
        gen_type: GenType,
    ) -> Result<Self> {
        let domain = gw.regulatory_domain().to_uppercase();
        regulatory.check_domain(&domain)?;
        let unii_4_capable = unii_4_capable(gw, regulatory);
        log::debug!(
            "generation context: dut {}, ref {}, domain {domain}, {}, unii-4 capable: {unii_4_capable}",
            gw.model(),
            leaf.model(),
            gen_type.as_str()
        );
        Ok(GenContext {
            gw,
            leaf,
            regulatory,
            domain,
            gen_type,
            unii_4_capable,
        })
    }

    pub fn device(&self, device: Device) -> &'a CapabilityStore {
        match device {
            Device::Gw => self.gw,
            Device::Leaf => self.leaf,
        }
    }

    /// Role resolution against the DUT.
    pub fn roles(&self) -> RoleResolver<'a> {
        RoleResolver::new(self.gw)
    }

    pub fn unii_4_capable(&self) -> bool {
        self.unii_4_capable
    }

    /// The device has a physical radio for the band.
    pub fn check_band_compatible(&self, band: RadioBand, device: Device) -> bool {
        let ok = self.device(device).phy_radio_name(band).is_some();
        if !ok {
            log::debug!("radio band {band} not supported by {device:?}");
        }
        ok
    }

    /// The device lists the channel and the rule table allows it at `ht_mode`.
    pub fn check_band_channel_compatible(
        &self,
        band: RadioBand,
        channel: u32,
        device: Device,
        ht_mode: HtMode,
    ) -> Result<bool> {
        let supported = self
            .device(device)
            .radio_channels(band)
            .is_some_and(|channels| channels.contains(&channel));
        if !supported {
            log::debug!("channel {channel} not supported on {band} by {device:?}");
            return Ok(false);
        }
        Ok(self
            .regulatory
            .validate_typed(channel, ht_mode, band, &self.domain)?)
    }

    /// The bandwidth fits the device's maximum channel width for the band.
    pub fn check_ht_mode_band_support(&self, band: RadioBand, ht_mode: HtMode, device: Device) -> bool {
        match self.device(device).max_channel_width(band) {
            Some(max) if ht_mode.width_mhz() <= max => true,
            Some(max) => {
                log::debug!("{ht_mode} wider than max width {max} MHz on {band}");
                false
            }
            None => false,
        }
    }
}

/// The DUT is UNII-4 capable when its first 5 GHz radio lists every UNII-4
/// channel. Without a UNII-4 entry in the table, or without a 5 GHz radio,
/// there is nothing to prune.
fn unii_4_capable(gw: &CapabilityStore, regulatory: &RegulatoryValidator) -> bool {
    let Some(required) = regulatory.unii_4_channels() else {
        return true;
    };
    let Some(band) = [RadioBand::Band5g, RadioBand::Band5gu]
        .into_iter()
        .find(|b| gw.phy_radio_name(*b).is_some())
    else {
        return true;
    };
    let supported = gw.radio_channels(band).unwrap_or_default();
    required.iter().all(|ch| supported.contains(ch))
}

/// Single row disabling a whole test case.
pub fn skip_marker(msg: &str) -> ParamSet {
    ParamSet::from([
        ("skip".to_string(), Value::Bool(true)),
        ("skip_msg".to_string(), Value::String(msg.to_string())),
    ])
}

/// Specialized generator registered for a test case, if any.
pub fn generator_for(test_name: &str) -> Option<GenFn> {
    let generator: GenFn = match test_name {
        "nm2_enable_disable_iface_network"
        | "nm2_ovsdb_configure_interface_dhcpd"
        | "nm2_ovsdb_ip_port_forward"
        | "nm2_ovsdb_remove_reinsert_iface"
        | "nm2_set_broadcast"
        | "nm2_set_dns"
        | "nm2_set_gateway"
        | "nm2_set_inet_addr"
        | "nm2_set_ip_assign_scheme"
        | "nm2_set_mtu"
        | "nm2_set_nat"
        | "nm2_set_netmask"
        | "nm2_vlan_interface" => nm::gen_nm,
        "onbrd_verify_dhcp_dry_run_success" => onbrd::gen_onbrd,
        "sm_dynamic_noise_floor" | "sm_leaf_report" | "sm_neighbor_report" | "sm_survey_report" => {
            sm::gen_sm
        }
        "wm2_set_bcn_int" => wm::gen_set_bcn_int,
        "wm2_set_channel" => wm::gen_set_channel,
        "wm2_set_ht_mode" => wm::gen_set_ht_mode,
        "wm2_ht_mode_and_channel_iteration" => wm::gen_ht_mode_and_channel_iteration,
        "wm2_topology_change_change_parent_change_band_change_channel"
        | "wm2_topology_change_change_parent_same_band_change_channel" => wm::gen_pruned,
        "wm2_connect_wpa3_client" | "wm2_connect_wpa3_leaf" | "wm2_create_wpa3_ap" => wm::gen_wpa3,
        "wm2_set_ht_mode_neg" => wm::gen_set_ht_mode_neg,
        "wm2_set_radio_tx_power" => wm::gen_set_radio_tx_power,
        "wm2_set_channel_neg" | "wm2_set_ssid" | "wm2_verify_wifi_security_modes" => {
            wm::gen_permuted
        }
        _ => return None,
    };
    Some(generator)
}

/// Generate one test case with its registered generator or the default one.
pub fn generate(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    match generator_for(&template.name) {
        Some(generator) => {
            log::debug!("{}: using specialized generator", template.name);
            generator(ctx, template)
        }
        None => {
            log::debug!("{}: using default generator", template.name);
            default::default_gen(ctx, template)
        }
    }
}
