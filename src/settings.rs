//! Theme settings: the business name, primary color and logo shown by the application, and the
//! palette derived from them.

use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

pub const SETTINGS_JSON: &str = "settings.json";
pub const DEFAULT_NOMBRE_NEGOCIO: &str = "La Esquina";
pub const DEFAULT_COLOR_PRIMARIO: &str = "#2e7d32";
/// The secondary color is fixed and cannot be configured.
pub const COLOR_SECUNDARIO: Rgb = Rgb(0xff, 0x6f, 0x00);
const CONTRAST_TEXT: Rgb = Rgb(0xff, 0xff, 0xff);
const SHADE_PERCENT: u8 = 20;

/// User-editable theme settings, persisted as `settings.json`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSettings {
    pub nombre_negocio: String,
    pub color_primario: String,
    pub logo_url: String,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            nombre_negocio: DEFAULT_NOMBRE_NEGOCIO.to_string(),
            color_primario: DEFAULT_COLOR_PRIMARIO.to_string(),
            logo_url: String::new(),
        }
    }
}

/// A partial change to [`ThemeSettings`]. Fields left as `None` keep their current value.
///
/// `color_secundario` is accepted so that an update carrying it does not fail to parse, but it is
/// never applied.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
pub struct SettingsUpdate {
    pub nombre_negocio: Option<String>,
    pub color_primario: Option<String>,
    pub logo_url: Option<String>,
    pub color_secundario: Option<String>,
}

impl ThemeSettings {
    /// Loads `path`, falling back to the defaults when the file is missing or unreadable. Fields
    /// missing from the file take their default value.
    pub async fn load(path: &Path) -> Self {
        if !path.is_file() {
            debug!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }
        match utils::deserialize::<ThemeSettings>(path).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring the settings file: {e:#}");
                Self::default()
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.save_inner(path).await.pub_result(ErrorType::Io)
    }

    async fn save_inner(&self, path: &Path) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize settings")?;
        utils::write(path, data)
            .await
            .context("Unable to write the settings file")
    }

    /// Merges `update` over these settings. An invalid primary color is rejected.
    pub fn update(&self, update: SettingsUpdate) -> Result<Self> {
        if update.color_secundario.is_some() {
            debug!("Ignoring an attempt to change the secondary color");
        }
        let mut next = self.clone();
        if let Some(nombre) = update.nombre_negocio {
            next.nombre_negocio = nombre;
        }
        if let Some(color) = update.color_primario {
            let rgb = Rgb::from_str(&color).pub_result(ErrorType::Input)?;
            next.color_primario = rgb.to_string();
        }
        if let Some(logo) = update.logo_url {
            next.logo_url = logo;
        }
        Ok(next)
    }

    /// The palette for these settings. An unparseable primary color falls back to the default.
    pub fn palette(&self) -> Palette {
        let primary = Rgb::from_str(&self.color_primario).unwrap_or_else(|e| {
            warn!("{e:#}, using the default primary color");
            Rgb(0x2e, 0x7d, 0x32)
        });
        Palette {
            primary: Shades::from(primary),
            secondary: Shades::from(COLOR_SECUNDARIO),
        }
    }
}

/// A 24-bit color.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn shift(self, amount: i16) -> Self {
        let f = |c: u8| (i16::from(c) + amount).clamp(0, 255) as u8;
        Rgb(f(self.0), f(self.1), f(self.2))
    }

    fn amount(percent: u8) -> i16 {
        (255.0 * f64::from(percent) / 100.0).round() as i16
    }

    /// Adds `round(255 * percent / 100)` to every channel, saturating at white.
    pub fn lighten(self, percent: u8) -> Self {
        self.shift(Self::amount(percent))
    }

    /// Subtracts `round(255 * percent / 100)` from every channel, saturating at black.
    pub fn darken(self, percent: u8) -> Self {
        self.shift(-Self::amount(percent))
    }
}

impl FromStr for Rgb {
    type Err = anyhow::Error;

    /// Parses `#rrggbb` (the `#` is optional).
    fn from_str(s: &str) -> Res<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("'{s}' is not a #rrggbb color");
        }
        let n = u32::from_str_radix(hex, 16).with_context(|| format!("Bad color '{s}'"))?;
        Ok(Rgb((n >> 16) as u8, (n >> 8) as u8, n as u8))
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Shades {
    pub main: Rgb,
    pub light: Rgb,
    pub dark: Rgb,
    pub contrast_text: Rgb,
}

impl From<Rgb> for Shades {
    fn from(main: Rgb) -> Self {
        Self {
            main,
            light: main.lighten(SHADE_PERCENT),
            dark: main.darken(SHADE_PERCENT),
            contrast_text: CONTRAST_TEXT,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Palette {
    pub primary: Shades,
    pub secondary: Shades,
}
