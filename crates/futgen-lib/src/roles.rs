//! Interface roles and symbolic role tokens.
//!
//! Templates name interfaces by function instead of by literal name, either
//! through an `if_role` column (`"home_ap"`, `"lan_bridge"`, ...) or through
//! a `FutGen|...` token string. [`RoleResolver`] turns both into concrete
//! `(if_name, if_type)` pairs using a device's [`CapabilityStore`].

use std::fmt;

use serde_json::Value;

use crate::capabilities::CapabilityStore;
use crate::wifi::RadioBand;

/// Prefix marking a template string as a role token.
pub const TOKEN_PREFIX: &str = "FutGen|";

#[derive(Debug, Clone, PartialEq)]
pub enum RoleError {
    /// Token or role string outside the closed set.
    UnsupportedToken(String),
    /// Band value that is not a known radio band.
    UnsupportedBand(String),
}

impl fmt::Display for RoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleError::UnsupportedToken(t) => write!(f, "Unsupported interface role token: {t}"),
            RoleError::UnsupportedBand(b) => write!(f, "Unsupported radio band: {b}"),
        }
    }
}

impl std::error::Error for RoleError {}

pub type Result<T> = std::result::Result<T, RoleError>;

// ── Interfaces ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfType {
    Eth,
    Vif,
    Bridge,
    Gre,
}

impl IfType {
    pub fn as_str(self) -> &'static str {
        match self {
            IfType::Eth => "eth",
            IfType::Vif => "vif",
            IfType::Bridge => "bridge",
            IfType::Gre => "gre",
        }
    }
}

/// A resolved interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub if_type: IfType,
}

/// What a caller wants back from a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// `(if_name, if_type)` pairs.
    NameType,
    /// Interface names only.
    NameOnly,
}

// ── Roles ──

/// Functional interface role, as used in capability documents and `if_role` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceRole {
    Aux1Ap,
    Aux2Ap,
    CportalAp,
    FhaulAp,
    HaahsAp,
    HomeAp,
    BackhaulAp,
    OnboardAp,
    BackhaulSta,
    UplinkGre,
    LanBridge,
    WanBridge,
    LanInterfaces,
    WanInterfaces,
    ManagementInterface,
    PppWanInterface,
    PrimaryLanInterface,
    PrimaryWanInterface,
}

impl InterfaceRole {
    pub const ALL: [InterfaceRole; 18] = [
        InterfaceRole::Aux1Ap,
        InterfaceRole::Aux2Ap,
        InterfaceRole::CportalAp,
        InterfaceRole::FhaulAp,
        InterfaceRole::HaahsAp,
        InterfaceRole::HomeAp,
        InterfaceRole::BackhaulAp,
        InterfaceRole::OnboardAp,
        InterfaceRole::BackhaulSta,
        InterfaceRole::UplinkGre,
        InterfaceRole::LanBridge,
        InterfaceRole::WanBridge,
        InterfaceRole::LanInterfaces,
        InterfaceRole::WanInterfaces,
        InterfaceRole::ManagementInterface,
        InterfaceRole::PppWanInterface,
        InterfaceRole::PrimaryLanInterface,
        InterfaceRole::PrimaryWanInterface,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InterfaceRole::Aux1Ap => "aux_1_ap",
            InterfaceRole::Aux2Ap => "aux_2_ap",
            InterfaceRole::CportalAp => "cportal_ap",
            InterfaceRole::FhaulAp => "fhaul_ap",
            InterfaceRole::HaahsAp => "haahs_ap",
            InterfaceRole::HomeAp => "home_ap",
            InterfaceRole::BackhaulAp => "backhaul_ap",
            InterfaceRole::OnboardAp => "onboard_ap",
            InterfaceRole::BackhaulSta => "backhaul_sta",
            InterfaceRole::UplinkGre => "uplink_gre",
            InterfaceRole::LanBridge => "lan_bridge",
            InterfaceRole::WanBridge => "wan_bridge",
            InterfaceRole::LanInterfaces => "lan_interfaces",
            InterfaceRole::WanInterfaces => "wan_interfaces",
            InterfaceRole::ManagementInterface => "management_interface",
            InterfaceRole::PppWanInterface => "ppp_wan_interface",
            InterfaceRole::PrimaryLanInterface => "primary_lan_interface",
            InterfaceRole::PrimaryWanInterface => "primary_wan_interface",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        InterfaceRole::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| RoleError::UnsupportedToken(s.to_string()))
    }

    pub fn if_type(self) -> IfType {
        match self {
            InterfaceRole::UplinkGre => IfType::Gre,
            InterfaceRole::LanBridge | InterfaceRole::WanBridge => IfType::Bridge,
            InterfaceRole::LanInterfaces
            | InterfaceRole::WanInterfaces
            | InterfaceRole::ManagementInterface
            | InterfaceRole::PppWanInterface
            | InterfaceRole::PrimaryLanInterface
            | InterfaceRole::PrimaryWanInterface => IfType::Eth,
            _ => IfType::Vif,
        }
    }
}

// ── Tokens ──

/// Network scope carried by dict-shaped token inputs (`{"FutGen|...": "wan"}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Lan,
    Wan,
}

impl Scope {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "lan" => Ok(Scope::Lan),
            "wan" => Ok(Scope::Wan),
            other => Err(RoleError::UnsupportedToken(format!("scope {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    EthInterfaces(Option<Scope>),
    VifPhyInterfaces,
    /// A VIF role. `per_band` tokens resolve the single interface on the
    /// row's radio band instead of every interface of the role.
    VifByRole { role: InterfaceRole, per_band: bool },
    BridgeInterface(Option<Scope>),
    PrimaryInterface(Option<Scope>),
}

const NAME_TYPE_SUFFIX: &str = "-if-name-type";
const NAME_ONLY_SUFFIX: &str = "-if-name";

/// Token base names, in template spelling.
const TOKEN_KINDS: [(&str, TokenKind); 11] = {
    use InterfaceRole::{BackhaulAp, BackhaulSta, HomeAp, OnboardAp};
    use TokenKind::VifByRole as Vif;
    [
        ("eth-interfaces", TokenKind::EthInterfaces(None)),
        ("vif-phy-interfaces", TokenKind::VifPhyInterfaces),
        ("vif-interfaces", Vif { role: BackhaulSta, per_band: false }),
        ("vif-bhaul-sta-interfaces", Vif { role: BackhaulSta, per_band: false }),
        ("vif-home-ap-interfaces", Vif { role: HomeAp, per_band: false }),
        ("vif-bhaul-ap-interfaces", Vif { role: BackhaulAp, per_band: false }),
        ("vif-onboard-ap-interfaces", Vif { role: OnboardAp, per_band: false }),
        ("vif-home-ap-by-band-and-type", Vif { role: HomeAp, per_band: true }),
        ("bhaul-sta-by-band-and-type", Vif { role: BackhaulSta, per_band: true }),
        ("bridge-interface", TokenKind::BridgeInterface(None)),
        ("primary-interface", TokenKind::PrimaryInterface(None)),
    ]
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleToken {
    pub kind: TokenKind,
    pub projection: Projection,
    /// Base name and suffix as written, so `Display` gives back the input.
    base: &'static str,
    suffix: &'static str,
}

impl RoleToken {
    /// Parse a template string. Returns `Ok(None)` for strings that are not
    /// tokens and `UnsupportedToken` for a `FutGen|` string outside the set.
    pub fn parse(s: &str) -> Result<Option<RoleToken>> {
        let Some(body) = s.strip_prefix(TOKEN_PREFIX) else {
            return Ok(None);
        };
        let (name, projection, suffix) = if let Some(b) = body.strip_suffix(NAME_TYPE_SUFFIX) {
            (b, Projection::NameType, NAME_TYPE_SUFFIX)
        } else if let Some(b) = body.strip_suffix(NAME_ONLY_SUFFIX) {
            (b, Projection::NameOnly, NAME_ONLY_SUFFIX)
        } else {
            (body, Projection::NameType, "")
        };
        let Some(&(base, kind)) = TOKEN_KINDS.iter().find(|(n, _)| *n == name) else {
            return Err(RoleError::UnsupportedToken(s.to_string()));
        };
        Ok(Some(RoleToken {
            kind,
            projection,
            base,
            suffix,
        }))
    }

    /// Apply the scope given as the value of a dict-shaped token input.
    pub fn with_scope(self, scope: Scope) -> RoleToken {
        let kind = match self.kind {
            TokenKind::EthInterfaces(_) => TokenKind::EthInterfaces(Some(scope)),
            TokenKind::BridgeInterface(_) => TokenKind::BridgeInterface(Some(scope)),
            TokenKind::PrimaryInterface(_) => TokenKind::PrimaryInterface(Some(scope)),
            // VIF tokens carry their role already; the scope value is ignored.
            other => other,
        };
        RoleToken { kind, ..self }
    }

    pub fn is_per_band(&self) -> bool {
        matches!(self.kind, TokenKind::VifByRole { per_band: true, .. })
    }
}

impl fmt::Display for RoleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TOKEN_PREFIX}{}{}", self.base, self.suffix)
    }
}

// ── Resolution ──

/// Resolves roles and tokens against one device's capabilities.
///
/// Pure lookups: the same token against the same store always yields the
/// same interfaces. Absent roles resolve to `None`, never to an error.
#[derive(Debug, Clone, Copy)]
pub struct RoleResolver<'a> {
    caps: &'a CapabilityStore,
}

impl<'a> RoleResolver<'a> {
    pub fn new(caps: &'a CapabilityStore) -> Self {
        RoleResolver { caps }
    }

    /// Resolve a token. `band` scopes per-band VIF tokens and is ignored
    /// by collection tokens.
    pub fn resolve(&self, token: &RoleToken, band: Option<RadioBand>) -> Option<Vec<Interface>> {
        let interfaces = match token.kind {
            TokenKind::EthInterfaces(scope) => self.resolve_role(
                match scope {
                    Some(Scope::Wan) => InterfaceRole::WanInterfaces,
                    _ => InterfaceRole::LanInterfaces,
                },
                None,
            )?,
            TokenKind::VifPhyInterfaces => {
                let names = flatten_names(self.caps.get("interfaces.phy_radio_name")?);
                to_interfaces(names, IfType::Vif)
            }
            TokenKind::VifByRole { role, per_band: true } => {
                let name = self.by_band(role, band?)?;
                vec![Interface {
                    name: name.to_string(),
                    if_type: IfType::Vif,
                }]
            }
            TokenKind::VifByRole { role, .. } => self.resolve_role(role, band)?,
            TokenKind::BridgeInterface(scope) => self.resolve_role(
                match scope {
                    Some(Scope::Wan) => InterfaceRole::WanBridge,
                    _ => InterfaceRole::LanBridge,
                },
                None,
            )?,
            TokenKind::PrimaryInterface(scope) => self.resolve_role(
                match scope {
                    Some(Scope::Wan) => InterfaceRole::PrimaryWanInterface,
                    _ => InterfaceRole::PrimaryLanInterface,
                },
                None,
            )?,
        };
        Some(interfaces)
    }

    /// Resolve an `if_role` value, optionally scoped to a band for VIF roles.
    pub fn resolve_role(&self, role: InterfaceRole, band: Option<RadioBand>) -> Option<Vec<Interface>> {
        let value = self.caps.get(&format!("interfaces.{}", role.as_str()))?;
        let names = match (role.if_type(), value, band) {
            (IfType::Vif, Value::Object(by_band), Some(band)) => {
                vec![by_band.get(band.as_str())?.as_str()?.to_string()]
            }
            _ => flatten_names(value),
        };
        Some(to_interfaces(names, role.if_type()))
    }

    /// Single interface name for a role on one band.
    pub fn by_band(&self, role: InterfaceRole, band: RadioBand) -> Option<&'a str> {
        self.caps
            .get_str(&format!("interfaces.{}.{band}", role.as_str()))
            .filter(|s| !s.is_empty())
    }
}

/// Apply a projection to resolved interfaces.
pub fn project(interfaces: &[Interface], projection: Projection) -> Vec<Value> {
    interfaces
        .iter()
        .map(|i| match projection {
            Projection::NameOnly => Value::String(i.name.clone()),
            Projection::NameType => Value::Array(vec![
                Value::String(i.name.clone()),
                Value::String(i.if_type.as_str().to_string()),
            ]),
        })
        .collect()
}

/// Dict values are flattened to their non-null strings; a string is a singleton.
fn flatten_names(value: &Value) -> Vec<String> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        other => vec![other],
    };
    items
        .into_iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_interfaces(names: Vec<String>, if_type: IfType) -> Vec<Interface> {
    names
        .into_iter()
        .map(|name| Interface { name, if_type })
        .collect()
}
