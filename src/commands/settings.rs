use crate::commands::Out;
use crate::context::AppContext;
use crate::settings::{Palette, SettingsUpdate, ThemeSettings};
use crate::Result;
use serde::Serialize;
use tracing::info;

/// The theme settings after the command ran, and the palette derived from them.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsOutput {
    pub settings: ThemeSettings,
    pub palette: Palette,
}

/// Applies `update` to the theme settings and saves them. An empty update shows the current
/// settings without writing anything.
pub async fn settings(ctx: &mut AppContext, update: SettingsUpdate) -> Result<Out<SettingsOutput>> {
    let message = if update == SettingsUpdate::default() {
        format!("Settings for '{}'", ctx.settings().nombre_negocio)
    } else {
        let updated = ctx.settings().update(update)?;
        ctx.set_settings(updated).await?;
        info!("Saved settings to '{}'", ctx.config().settings_path().display());
        format!("Updated settings for '{}'", ctx.settings().nombre_negocio)
    };

    let settings = ctx.settings().clone();
    let palette = settings.palette();
    let text = format!(
        "nombre_negocio: {}\ncolor_primario: {}\nlogo_url: {}\nprimary: {} (light {}, dark {}, text {})\nsecondary: {} (light {}, dark {}, text {})",
        settings.nombre_negocio,
        settings.color_primario,
        settings.logo_url,
        palette.primary.main,
        palette.primary.light,
        palette.primary.dark,
        palette.primary.contrast_text,
        palette.secondary.main,
        palette.secondary.light,
        palette.secondary.dark,
        palette.secondary.contrast_text,
    );
    Ok(Out::new(message, SettingsOutput { settings, palette }).with_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use crate::ErrorType;

    #[tokio::test]
    async fn test_show_defaults() {
        let env = TestEnv::new().await;
        let mut ctx = env.context().await;
        let out = settings(&mut ctx, SettingsUpdate::default()).await.unwrap();
        assert_eq!(out.structure().unwrap().settings, ThemeSettings::default());
        assert!(!env.config().settings_path().exists());
    }

    #[tokio::test]
    async fn test_update_persists() {
        let env = TestEnv::new().await;
        let mut ctx = env.context().await;
        let update = SettingsUpdate {
            nombre_negocio: Some("Minimarket Don Pepe".into()),
            color_primario: Some("#1565c0".into()),
            ..SettingsUpdate::default()
        };
        let out = settings(&mut ctx, update).await.unwrap();
        assert_eq!(out.message(), "Updated settings for 'Minimarket Don Pepe'");
        assert!(out.text().unwrap().contains("primary: #1565c0"));

        let reloaded = env.context().await;
        assert_eq!(reloaded.settings().color_primario, "#1565c0");
    }

    #[tokio::test]
    async fn test_invalid_color_is_rejected() {
        let env = TestEnv::new().await;
        let mut ctx = env.context().await;
        let update = SettingsUpdate {
            color_primario: Some("verde".into()),
            ..SettingsUpdate::default()
        };
        let err = settings(&mut ctx, update).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Input);
        assert_eq!(ctx.settings(), &ThemeSettings::default());
    }
}
