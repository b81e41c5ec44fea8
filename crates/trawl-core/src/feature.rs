//! Feature flags that switch input modes on.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A capability the caller has enabled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Input discovery as a whole.
    Input,
    /// Date-partitioned discovery instead of a plain glob.
    StructuredInput,
}

/// Check whether `feature` is present in `features`.
pub fn is_enabled(features: &[Feature], feature: Feature) -> bool {
    features.contains(&feature)
}
