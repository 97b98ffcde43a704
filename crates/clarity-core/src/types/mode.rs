//! Pattern mode selection.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// How recorded patterns take part in producing a reframe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PatternMode {
    /// Serve the stored reframe on a strong match, else generate with the
    /// pattern document as extra context.
    #[default]
    Full,
    /// Always generate, always with the pattern document as context.
    PatternsApi,
    /// Always generate, patterns ignored.
    Off,
}

impl PatternMode {
    /// Whether this mode runs the matcher before generating.
    pub fn uses_matching(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Whether a generation call in this mode carries the pattern document.
    pub fn enriches_context(&self) -> bool {
        matches!(self, Self::Full | Self::PatternsApi)
    }
}
