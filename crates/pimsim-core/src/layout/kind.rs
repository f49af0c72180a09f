use crate::config::HardwareProfile;
use crate::error::ConfigError;
use crate::placement::PlacementPolicy;
use crate::records::ItemKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bank organization planned by [`crate::layout::LayoutPlanner`].
///
/// Layout kinds are named on the command line and in layout files, e.g.
/// `cpu-aligned`, `blimp-hitmap`, `ambit-index-hitmap` or `blimp-ambit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LayoutKind {
    /// Plain CPU bank: the whole bank holds items in one encoding.
    Standard {
        /// Encoding of the items
        policy: PlacementPolicy,
        /// Which record field is stored
        item: ItemKind,
    },
    /// BLIMP bank: code and scratch regions on top, row-aligned items below.
    Blimp {
        /// Which record field is stored
        item: ItemKind,
        /// Reserve hitmap rows after the items
        hitmaps: bool,
    },
    /// AMBIT bank: bit-plane items on top, reserved AMBIT rows at the tail.
    Ambit {
        /// Which record field is stored
        item: ItemKind,
        /// Reserve hitmap rows after the items
        hitmaps: bool,
    },
    /// BLIMP orchestrating AMBIT: bit-plane indices plus, for `Record`,
    /// row-aligned whole records.
    BlimpAmbit {
        /// `Record` for indices plus records, `Index` for indices only
        item: ItemKind,
        /// Reserve hitmap rows after the records
        hitmaps: bool,
    },
    /// BLIMP orchestrating AMBIT with a bit-plane primary index field, sized
    /// by the greedy block heuristic.
    BlimpAmbitPiField,
}

const ITEMS: [ItemKind; 3] = [ItemKind::Record, ItemKind::Index, ItemKind::Data];
const POLICIES: [PlacementPolicy; 3] = [
    PlacementPolicy::PackedHorizontal,
    PlacementPolicy::AlignedHorizontal,
    PlacementPolicy::BitPlaneVertical,
];

fn item_suffix(item: ItemKind) -> &'static str {
    match item {
        ItemKind::Record => "",
        ItemKind::Index => "-index",
        ItemKind::Data => "-data",
    }
}

fn hitmap_suffix(hitmaps: bool) -> &'static str {
    if hitmaps { "-hitmap" } else { "" }
}

impl LayoutKind {
    /// Every layout kind.
    pub fn all() -> Vec<LayoutKind> {
        let mut kinds = Vec::new();
        for policy in POLICIES {
            for item in ITEMS {
                kinds.push(LayoutKind::Standard { policy, item });
            }
        }
        for hitmaps in [false, true] {
            for item in ITEMS {
                kinds.push(LayoutKind::Blimp { item, hitmaps });
                kinds.push(LayoutKind::Ambit { item, hitmaps });
            }
            for item in [ItemKind::Record, ItemKind::Index] {
                kinds.push(LayoutKind::BlimpAmbit { item, hitmaps });
            }
        }
        kinds.push(LayoutKind::BlimpAmbitPiField);
        kinds
    }

    /// Name used on the command line and in layout files.
    pub fn name(&self) -> String {
        match self {
            LayoutKind::Standard { policy, item } => {
                format!("cpu-{}{}", policy.name(), item_suffix(*item))
            }
            LayoutKind::Blimp { item, hitmaps } => {
                format!("blimp{}{}", item_suffix(*item), hitmap_suffix(*hitmaps))
            }
            LayoutKind::Ambit { item, hitmaps } => {
                format!("ambit{}{}", item_suffix(*item), hitmap_suffix(*hitmaps))
            }
            LayoutKind::BlimpAmbit { item, hitmaps } => {
                format!("blimp-ambit{}{}", item_suffix(*item), hitmap_suffix(*hitmaps))
            }
            LayoutKind::BlimpAmbitPiField => "blimp-ambit-pi-field".to_string(),
        }
    }

    /// The record field this layout stores as its primary item.
    pub const fn item(&self) -> ItemKind {
        match self {
            LayoutKind::Standard { item, .. }
            | LayoutKind::Blimp { item, .. }
            | LayoutKind::Ambit { item, .. }
            | LayoutKind::BlimpAmbit { item, .. } => *item,
            LayoutKind::BlimpAmbitPiField => ItemKind::Record,
        }
    }

    /// Returns `true` if the layout reserves hitmap rows.
    pub const fn has_hitmaps(&self) -> bool {
        match self {
            LayoutKind::Standard { .. } => false,
            LayoutKind::Blimp { hitmaps, .. }
            | LayoutKind::Ambit { hitmaps, .. }
            | LayoutKind::BlimpAmbit { hitmaps, .. } => *hitmaps,
            LayoutKind::BlimpAmbitPiField => true,
        }
    }

    /// Returns `true` if the layout needs BLIMP hardware.
    pub const fn needs_blimp(&self) -> bool {
        matches!(
            self,
            LayoutKind::Blimp { .. } | LayoutKind::BlimpAmbit { .. } | LayoutKind::BlimpAmbitPiField
        )
    }

    /// Returns `true` if the layout needs AMBIT hardware.
    pub const fn needs_ambit(&self) -> bool {
        matches!(
            self,
            LayoutKind::Ambit { .. } | LayoutKind::BlimpAmbit { .. } | LayoutKind::BlimpAmbitPiField
        )
    }

    /// Checks that `hardware` provides every capability this layout uses.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCapability`] naming the first missing capability.
    pub fn check_capabilities(&self, hardware: &HardwareProfile) -> Result<(), ConfigError> {
        if self.needs_blimp() && hardware.blimp.is_none() {
            return Err(ConfigError::MissingCapability {
                layout: self.name(),
                capability: "BLIMP",
            });
        }
        if self.needs_ambit() && hardware.ambit.is_none() {
            return Err(ConfigError::MissingCapability {
                layout: self.name(),
                capability: "AMBIT",
            });
        }
        Ok(())
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for LayoutKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayoutKind::all()
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigError::UnknownLayout(s.to_string()))
    }
}

impl TryFrom<String> for LayoutKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LayoutKind> for String {
    fn from(kind: LayoutKind) -> Self {
        kind.name()
    }
}
