use std::str::FromStr;

use miette::miette;
use smithay::input::keyboard::Keysym;

use crate::binds::Modifiers;

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Input {
    #[knuffel(child, unwrap(argument, str), default = ModKey::Super)]
    pub mod_key: ModKey,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            mod_key: ModKey::Super,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ModKey {
    Ctrl,
    Shift,
    Alt,
    Super,
    IsoLevel3Shift,
    IsoLevel5Shift,
}

impl ModKey {
    pub fn to_modifiers(&self) -> Modifiers {
        match self {
            ModKey::Ctrl => Modifiers::CTRL,
            ModKey::Shift => Modifiers::SHIFT,
            ModKey::Alt => Modifiers::ALT,
            ModKey::Super => Modifiers::SUPER,
            ModKey::IsoLevel3Shift => Modifiers::ISO_LEVEL3_SHIFT,
            ModKey::IsoLevel5Shift => Modifiers::ISO_LEVEL5_SHIFT,
        }
    }

    /// Whether pressing or releasing this keysym changes the held state of the mod key.
    pub fn matches_keysym(&self, keysym: Keysym) -> bool {
        match self {
            ModKey::Ctrl => matches!(keysym, Keysym::Control_L | Keysym::Control_R),
            ModKey::Shift => matches!(keysym, Keysym::Shift_L | Keysym::Shift_R),
            ModKey::Alt => matches!(keysym, Keysym::Alt_L | Keysym::Alt_R | Keysym::Meta_L),
            ModKey::Super => matches!(keysym, Keysym::Super_L | Keysym::Super_R),
            ModKey::IsoLevel3Shift => keysym == Keysym::ISO_Level3_Shift,
            ModKey::IsoLevel5Shift => keysym == Keysym::ISO_Level5_Shift,
        }
    }
}

impl FromStr for ModKey {
    type Err = miette::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.to_ascii_lowercase() {
            "ctrl" | "control" => Ok(Self::Ctrl),
            "shift" => Ok(Self::Shift),
            "alt" => Ok(Self::Alt),
            "super" | "win" => Ok(Self::Super),
            "iso_level3_shift" | "mod5" => Ok(Self::IsoLevel3Shift),
            "iso_level5_shift" | "mod3" => Ok(Self::IsoLevel5Shift),
            _ => Err(miette!("invalid Mod key: {s}")),
        }
    }
}
