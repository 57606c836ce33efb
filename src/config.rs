use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Deserializer};

use crate::layout::LayoutConfig;
use crate::viewport::{ContentBounds, ViewportConfig};

/// Tunables read from the optional `--config` JSON file. Every section
/// falls back to its defaults, so partial files are fine.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub layout: LayoutConfig,
    #[serde(deserialize_with = "node_link_viewport")]
    pub node_link_viewport: ViewportConfig,
    #[serde(deserialize_with = "vector_plot_viewport")]
    pub vector_plot_viewport: ViewportConfig,
    pub fit_padding: f32,
}

/// Viewport section of the config file. Fields left out keep the pane's own
/// defaults rather than a shared one.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViewportOverrides {
    min_scale: Option<f32>,
    max_scale: Option<f32>,
    translate_extent: Option<ContentBounds>,
    zoom_step: Option<f32>,
    transition_secs: Option<f64>,
}

impl ViewportOverrides {
    fn over(self, base: ViewportConfig) -> ViewportConfig {
        ViewportConfig {
            min_scale: self.min_scale.unwrap_or(base.min_scale),
            max_scale: self.max_scale.unwrap_or(base.max_scale),
            translate_extent: self.translate_extent.or(base.translate_extent),
            zoom_step: self.zoom_step.unwrap_or(base.zoom_step),
            transition_secs: self.transition_secs.unwrap_or(base.transition_secs),
        }
    }
}

fn node_link_viewport<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ViewportConfig, D::Error> {
    Ok(ViewportOverrides::deserialize(deserializer)?.over(ViewportConfig::node_link()))
}

fn vector_plot_viewport<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ViewportConfig, D::Error> {
    Ok(ViewportOverrides::deserialize(deserializer)?.over(ViewportConfig::vector_plot()))
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            node_link_viewport: ViewportConfig::node_link(),
            vector_plot_viewport: ViewportConfig::vector_plot(),
            fit_padding: 24.0,
        }
    }
}

impl ExplorerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_viewport(&self.node_link_viewport).context("invalid node_link_viewport")?;
        check_viewport(&self.vector_plot_viewport).context("invalid vector_plot_viewport")?;
        check_layout(&self.layout).context("invalid layout")?;
        ensure!(
            self.fit_padding.is_finite() && self.fit_padding >= 0.0,
            "fit_padding must be a non-negative number, got {}",
            self.fit_padding
        );
        Ok(())
    }
}

fn check_viewport(viewport: &ViewportConfig) -> Result<()> {
    let ViewportConfig {
        min_scale,
        max_scale,
        translate_extent,
        zoom_step,
        transition_secs,
    } = *viewport;

    ensure!(
        min_scale.is_finite() && min_scale > 0.0,
        "min_scale must be positive, got {min_scale}"
    );
    ensure!(
        max_scale.is_finite() && max_scale >= min_scale,
        "max_scale must be at least min_scale ({min_scale}), got {max_scale}"
    );
    ensure!(
        zoom_step.is_finite() && zoom_step > 0.0,
        "zoom_step must be positive, got {zoom_step}"
    );
    ensure!(
        transition_secs.is_finite() && transition_secs >= 0.0,
        "transition_secs must be non-negative, got {transition_secs}"
    );
    if let Some(extent) = translate_extent {
        ensure!(
            !extent.is_degenerate() && extent.x.is_finite() && extent.y.is_finite(),
            "translate_extent must have a finite origin and positive size"
        );
    }
    Ok(())
}

fn check_layout(layout: &LayoutConfig) -> Result<()> {
    let unit = |name: &str, value: f32| -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&value),
            "{name} must lie in [0, 1], got {value}"
        );
        Ok(())
    };
    unit("velocity_decay", layout.velocity_decay)?;
    unit("alpha_decay", layout.alpha_decay)?;
    unit("drag_alpha_target", layout.drag_alpha_target)?;
    unit("resize_alpha", layout.resize_alpha)?;
    ensure!(
        layout.alpha_min > 0.0 && layout.alpha_min < 1.0,
        "alpha_min must lie in (0, 1), got {}",
        layout.alpha_min
    );

    for (name, value) in [
        ("link_distance", layout.link_distance),
        ("theta", layout.theta),
        ("node_radius", layout.node_radius),
        ("center_strength", layout.center_strength),
        ("collision_strength", layout.collision_strength),
    ] {
        ensure!(
            value.is_finite() && value >= 0.0,
            "{name} must be a non-negative number, got {value}"
        );
    }
    ensure!(
        layout.charge_strength.is_finite(),
        "charge_strength must be finite, got {}",
        layout.charge_strength
    );
    Ok(())
}
