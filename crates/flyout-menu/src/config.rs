#![forbid(unsafe_code)]

//! Menu configuration.
//!
//! Every tunable of the controller lives in one [`MenuConfig`], passed in
//! explicitly at construction. With the `config` feature it can be loaded
//! from TOML or JSON.
//!
//! # Loading
//!
//! ```toml
//! # menu.toml
//! hover_open_delay_ms = 150
//! direction = "rtl"
//!
//! [root_placement]
//! side = "top"
//! side_offset = 2
//! ```
//!
//! Placement tables are merged key by key onto that level's defaults, so the
//! table above keeps the root's `align` and `avoid_collisions`.
//!
//! ```rust,ignore
//! let config = MenuConfig::from_toml_file("menu.toml")?;
//! let config = MenuConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! | Field                  | Default                          |
//! |------------------------|----------------------------------|
//! | `hover_open_delay_ms`  | 100                              |
//! | `typeahead_timeout_ms` | 1000                             |
//! | `root_placement`       | bottom, start, `side_offset = 4` |
//! | `submenu_placement`    | right, start, `side_offset = 0`  |
//! | `close_on_select`      | `true`                           |
//! | `loop_navigation`      | `true`                           |
//! | `direction`            | `ltr`                            |
//! | `modal`                | `true`                           |

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::error::ConfigError;
#[cfg(feature = "config")]
use crate::placement::Align;
use crate::placement::{Placement, Side};

/// Upper bound for the hover-open delay.
const MAX_HOVER_OPEN_DELAY_MS: u64 = 10_000;
/// Upper bound for the type-ahead idle timeout.
const MAX_TYPEAHEAD_TIMEOUT_MS: u64 = 60_000;

/// Reading direction. Right-to-left swaps the horizontal arrow keys and
/// mirrors the submenu side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// Tunables of a [`MenuController`](crate::controller::MenuController).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct MenuConfig {
    /// How long the pointer must rest on a submenu trigger before it opens.
    pub hover_open_delay_ms: u64,

    /// Idle time after which the type-ahead buffer is cleared.
    pub typeahead_timeout_ms: u64,

    /// Placement of the root menu against its trigger. A partial table only
    /// overrides the keys it names.
    #[cfg_attr(
        feature = "config",
        serde(deserialize_with = "deserialize_root_placement")
    )]
    pub root_placement: Placement,

    /// Placement of submenus against their trigger item, for left-to-right
    /// layouts. Mirrored when `direction` is right-to-left.
    #[cfg_attr(
        feature = "config",
        serde(deserialize_with = "deserialize_submenu_placement")
    )]
    pub submenu_placement: Placement,

    /// Whether activating an item closes the menu. Items can override this.
    pub close_on_select: bool,

    /// Whether arrow navigation wraps around at either end.
    pub loop_navigation: bool,

    pub direction: Direction,

    /// Trap focus while open. When off, Tab closes the menu and is passed
    /// through to the host.
    pub modal: bool,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            hover_open_delay_ms: 100,
            typeahead_timeout_ms: 1000,
            root_placement: Placement::below(),
            submenu_placement: Placement::beside(Side::Right),
            close_on_select: true,
            loop_navigation: true,
            direction: Direction::Ltr,
            modal: true,
        }
    }
}

impl MenuConfig {
    #[must_use]
    pub fn hover_open_delay(&self) -> Duration {
        Duration::from_millis(self.hover_open_delay_ms)
    }

    #[must_use]
    pub fn typeahead_timeout(&self) -> Duration {
        Duration::from_millis(self.typeahead_timeout_ms)
    }

    /// Submenu placement with the direction applied.
    #[must_use]
    pub fn effective_submenu_placement(&self) -> Placement {
        match self.direction {
            Direction::Ltr => self.submenu_placement,
            Direction::Rtl => self.submenu_placement.mirrored(),
        }
    }

    #[must_use]
    pub fn with_hover_open_delay(mut self, delay: Duration) -> Self {
        self.hover_open_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_typeahead_timeout(mut self, timeout: Duration) -> Self {
        self.typeahead_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_root_placement(mut self, placement: Placement) -> Self {
        self.root_placement = placement;
        self
    }

    #[must_use]
    pub fn with_submenu_placement(mut self, placement: Placement) -> Self {
        self.submenu_placement = placement;
        self
    }

    #[must_use]
    pub fn with_close_on_select(mut self, close: bool) -> Self {
        self.close_on_select = close;
        self
    }

    #[must_use]
    pub fn with_loop_navigation(mut self, wrap: bool) -> Self {
        self.loop_navigation = wrap;
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_modal(mut self, modal: bool) -> Self {
        self.modal = modal;
        self
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.hover_open_delay_ms > MAX_HOVER_OPEN_DELAY_MS {
            errors.push(format!(
                "hover_open_delay_ms must be <= {MAX_HOVER_OPEN_DELAY_MS}, got {}",
                self.hover_open_delay_ms
            ));
        }

        if self.typeahead_timeout_ms == 0 {
            errors.push("typeahead_timeout_ms must be > 0".into());
        } else if self.typeahead_timeout_ms > MAX_TYPEAHEAD_TIMEOUT_MS {
            errors.push(format!(
                "typeahead_timeout_ms must be <= {MAX_TYPEAHEAD_TIMEOUT_MS}, got {}",
                self.typeahead_timeout_ms
            ));
        }

        for (name, placement) in [
            ("root_placement", &self.root_placement),
            ("submenu_placement", &self.submenu_placement),
        ] {
            if placement.align_offset.unsigned_abs() > u16::MAX / 2 {
                errors.push(format!(
                    "{name}.align_offset out of range, got {}",
                    placement.align_offset
                ));
            }
            if placement.collision_padding > u16::MAX / 4 {
                errors.push(format!(
                    "{name}.collision_padding out of range, got {}",
                    placement.collision_padding
                ));
            }
        }

        errors
    }

    /// Run [`validate`](Self::validate) and turn failures into an error.
    pub fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Placement tables
// ---------------------------------------------------------------------------

/// Keys of a `[*_placement]` table. Absent keys keep the level's default.
#[cfg(feature = "config")]
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlacementOverrides {
    side: Option<Side>,
    align: Option<Align>,
    side_offset: Option<u16>,
    align_offset: Option<i16>,
    collision_padding: Option<u16>,
    avoid_collisions: Option<bool>,
}

#[cfg(feature = "config")]
impl PlacementOverrides {
    fn apply(self, base: Placement) -> Placement {
        Placement {
            side: self.side.unwrap_or(base.side),
            align: self.align.unwrap_or(base.align),
            side_offset: self.side_offset.unwrap_or(base.side_offset),
            align_offset: self.align_offset.unwrap_or(base.align_offset),
            collision_padding: self.collision_padding.unwrap_or(base.collision_padding),
            avoid_collisions: self.avoid_collisions.unwrap_or(base.avoid_collisions),
        }
    }
}

#[cfg(feature = "config")]
fn deserialize_root_placement<'de, D>(deserializer: D) -> Result<Placement, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let overrides = PlacementOverrides::deserialize(deserializer)?;
    Ok(overrides.apply(MenuConfig::default().root_placement))
}

#[cfg(feature = "config")]
fn deserialize_submenu_placement<'de, D>(deserializer: D) -> Result<Placement, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let overrides = PlacementOverrides::deserialize(deserializer)?;
    Ok(overrides.apply(MenuConfig::default().submenu_placement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Align;

    #[test]
    fn defaults_match_documented_values() {
        let config = MenuConfig::default();
        assert_eq!(config.hover_open_delay(), Duration::from_millis(100));
        assert_eq!(config.typeahead_timeout(), Duration::from_millis(1000));
        assert_eq!(config.root_placement.side, Side::Bottom);
        assert_eq!(config.root_placement.side_offset, 4);
        assert_eq!(config.submenu_placement.side, Side::Right);
        assert_eq!(config.submenu_placement.side_offset, 0);
        assert!(config.close_on_select && config.loop_navigation && config.modal);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn rtl_mirrors_submenu_side() {
        let config = MenuConfig::default().with_direction(Direction::Rtl);
        assert_eq!(config.effective_submenu_placement().side, Side::Left);
        assert_eq!(config.root_placement.side, Side::Bottom);
    }

    #[test]
    fn validate_catches_zero_typeahead_timeout() {
        let config = MenuConfig {
            typeahead_timeout_ms: 0,
            ..MenuConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors, vec!["typeahead_timeout_ms must be > 0".to_string()]);
        assert!(matches!(
            config.checked(),
            Err(ConfigError::Validation(v)) if v.len() == 1
        ));
    }

    #[test]
    fn validate_catches_long_hover_delay() {
        let config = MenuConfig::default().with_hover_open_delay(Duration::from_secs(60));
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn builders_set_fields() {
        let config = MenuConfig::default()
            .with_typeahead_timeout(Duration::from_millis(250))
            .with_close_on_select(false)
            .with_loop_navigation(false)
            .with_modal(false)
            .with_root_placement(Placement::below().with_align(Align::End));
        assert_eq!(config.typeahead_timeout_ms, 250);
        assert!(!config.close_on_select);
        assert!(!config.loop_navigation);
        assert!(!config.modal);
        assert_eq!(config.root_placement.align, Align::End);
    }

    #[cfg(feature = "config")]
    #[test]
    fn toml_partial_overrides_keep_defaults() {
        let config = MenuConfig::from_toml_str(
            r#"
            hover_open_delay_ms = 250
            direction = "rtl"

            [root_placement]
            side = "top"
            align = "center"
            "#,
        )
        .unwrap();
        assert_eq!(config.hover_open_delay_ms, 250);
        assert_eq!(config.direction, Direction::Rtl);
        assert_eq!(config.root_placement.side, Side::Top);
        assert_eq!(config.root_placement.align, Align::Center);
        // Unnamed keys keep the root's own defaults.
        assert_eq!(config.root_placement.side_offset, 4);
        assert!(config.root_placement.avoid_collisions);
        assert_eq!(config.submenu_placement, MenuConfig::default().submenu_placement);
        assert_eq!(config.typeahead_timeout_ms, 1000);
    }

    #[cfg(feature = "config")]
    #[test]
    fn partial_submenu_placement_merges_onto_submenu_defaults() {
        let config = MenuConfig::from_json_str(
            r#"{ "submenu_placement": { "collision_padding": 1 } }"#,
        )
        .unwrap();
        assert_eq!(config.submenu_placement.side, Side::Right);
        assert_eq!(config.submenu_placement.side_offset, 0);
        assert_eq!(config.submenu_placement.collision_padding, 1);
        assert_eq!(config.root_placement, MenuConfig::default().root_placement);
    }

    #[cfg(feature = "config")]
    #[test]
    fn unknown_placement_key_is_rejected() {
        let err = MenuConfig::from_toml_str(
            r#"
            [root_placement]
            sid = "top"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_roundtrip() {
        let config = MenuConfig::default().with_direction(Direction::Rtl);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(MenuConfig::from_json_str(&json).unwrap(), config);
    }

    #[cfg(feature = "config")]
    #[test]
    fn invalid_values_are_rejected_on_load() {
        let err = MenuConfig::from_json_str(r#"{ "typeahead_timeout_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        let err = MenuConfig::from_toml_str("modal = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[cfg(feature = "config")]
    #[test]
    fn missing_file_is_io_error() {
        let err = MenuConfig::from_toml_file("/nonexistent/flyout-menu.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
