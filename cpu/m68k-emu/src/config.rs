#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CpuModel {
    #[default]
    M68000,
    M68008,
    M68010,
}

impl CpuModel {
    pub const ALL: [Self; 3] = [Self::M68000, Self::M68008, Self::M68010];

    /// Mask applied to every address before it reaches the bus.
    #[inline]
    #[must_use]
    pub fn address_mask(self) -> u32 {
        match self {
            Self::M68000 | Self::M68010 => 0x00FF_FFFF,
            Self::M68008 => 0x003F_FFFF,
        }
    }

    /// 68010 exception frames carry a format/vector-offset word, and vectors are relative to
    /// the VBR.
    #[inline]
    #[must_use]
    pub fn is_68010(self) -> bool {
        self == Self::M68010
    }
}

impl Display for CpuModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::M68000 => write!(f, "68000"),
            Self::M68008 => write!(f, "68008"),
            Self::M68010 => write!(f, "68010"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unrecognized CPU model '{0}'; expected one of 68000, 68008, 68010")]
pub struct ParseModelError(String);

impl FromStr for CpuModel {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("MC")
            .or_else(|| trimmed.strip_prefix("mc"))
            .or_else(|| trimmed.strip_prefix('M'))
            .or_else(|| trimmed.strip_prefix('m'))
            .unwrap_or(trimmed);

        match digits {
            "68000" => Ok(Self::M68000),
            "68008" => Ok(Self::M68008),
            "68010" => Ok(Self::M68010),
            _ => Err(ParseModelError(s.into())),
        }
    }
}

/// Behavior for word and long word accesses at odd addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum AlignmentPolicy {
    /// Pass odd addresses through to the bus unchanged. Odd jump targets are rounded down.
    #[default]
    Tolerate,
    /// Raise an address error exception (vector 3), as real hardware does.
    AddressError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    pub model: CpuModel,
    pub alignment: AlignmentPolicy,
}

impl EngineConfig {
    #[must_use]
    pub fn with_model(self, model: CpuModel) -> Self {
        Self { model, ..self }
    }

    #[must_use]
    pub fn with_alignment(self, alignment: AlignmentPolicy) -> Self {
        Self { alignment, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn model_parsing() {
        assert_eq!("68000".parse::<CpuModel>().ok(), Some(CpuModel::M68000));
        assert_eq!("MC68008".parse::<CpuModel>().ok(), Some(CpuModel::M68008));
        assert_eq!("m68010".parse::<CpuModel>().ok(), Some(CpuModel::M68010));
        assert!("68020".parse::<CpuModel>().is_err());

        for model in CpuModel::ALL {
            assert_eq!(model.to_string().parse::<CpuModel>().ok(), Some(model));
        }
    }

    #[test]
    fn address_masks() {
        assert_eq!(CpuModel::M68000.address_mask(), 0x00FF_FFFF);
        assert_eq!(CpuModel::M68008.address_mask(), 0x003F_FFFF);
        assert_eq!(CpuModel::M68010.address_mask(), 0x00FF_FFFF);
    }
}
