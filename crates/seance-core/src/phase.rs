use serde::Deserialize;
use serde::Serialize;

/// Curse progress in [0, 100]. Construction and arithmetic clamp, so a
/// value outside the range cannot be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurseMeter(u8);

pub const CURSE_MAX: u8 = 100;
pub const ESCAPE_CURSE: u8 = 75;

impl CurseMeter {
    pub fn new(value: u8) -> Self {
        Self(value.min(CURSE_MAX))
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// The meter after raising by `amount`, saturating at the cap.
    pub fn raised(self, amount: u8) -> Self {
        Self(self.0.saturating_add(amount).min(CURSE_MAX))
    }

    pub fn is_full(self) -> bool {
        self.0 >= CURSE_MAX
    }
}

impl Default for CurseMeter {
    fn default() -> Self {
        Self::zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Normal,
    Unsettling,
    Scary,
    Hostile,
    Autonomous,
}

impl Phase {
    /// Pure, total mapping from curse progress to phase tier.
    pub fn for_curse(curse: CurseMeter) -> Self {
        match curse.value() {
            100.. => Self::Autonomous,
            75..=99 => Self::Hostile,
            25..=74 => Self::Scary,
            10..=24 => Self::Unsettling,
            _ => Self::Normal,
        }
    }

    /// How much one executed interaction command raises the meter in this
    /// phase. Autonomous mode never self-escalates through commands.
    pub fn curse_increment(self) -> u8 {
        match self {
            Self::Normal => 2,
            Self::Unsettling => 3,
            Self::Scary => 5,
            Self::Hostile => 5,
            Self::Autonomous => 0,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::Unsettling => 2,
            Self::Scary => 3,
            Self::Hostile => 4,
            Self::Autonomous => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Unsettling => "unsettling",
            Self::Scary => "scary",
            Self::Hostile => "hostile",
            Self::Autonomous => "autonomous",
        }
    }

    /// Status-line tag for the curse readout; Normal carries none.
    pub fn tier_tag(self) -> Option<&'static str> {
        match self {
            Self::Normal => None,
            Self::Unsettling => Some("[UNSETTLING]"),
            Self::Scary => Some("[SCARY]"),
            Self::Hostile => Some("[HOSTILE]"),
            Self::Autonomous => Some("[FULL]"),
        }
    }
}

/// Curse gained by the meta commands (`help`, `clear`, `about`, `theme`)
/// regardless of phase.
pub const META_CURSE_INCREMENT: u8 = 1;
