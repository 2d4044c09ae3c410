//! Extra-volume flags carried by a delivery.

use serde::{Deserialize, Serialize};

/// Bulky items that travel outside the boxes.
///
/// The flags are independent; any combination is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ExtraVolumes {
    /// Beverage crates or packs.
    #[serde(default)]
    pub beverages: bool,
    /// Frozen or chilled goods.
    #[serde(default)]
    pub frozen: bool,
    /// Brooms, squeegees and other cleaning tools.
    #[serde(default)]
    pub cleaning_tools: bool,
    /// Anything else.
    #[serde(default)]
    pub other: bool,
}

impl ExtraVolumes {
    /// Labels of the flags that are set, in a fixed order.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.beverages, "Beverages"),
            (self.frozen, "Frozen/Chilled"),
            (self.cleaning_tools, "Cleaning tools"),
            (self.other, "Other"),
        ]
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect()
    }
}
