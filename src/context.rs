//! The application context handed to every command: configuration, theme settings, the session
//! and the collection cache, loaded once and passed down explicitly.

use crate::cache::{CollectionCache, CollectionKey, FileSource, Source};
use crate::model::Item;
use crate::session::Session;
use crate::settings::ThemeSettings;
use crate::view::{Screen, ScreenConfig, ScreenView};
use crate::{Config, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

pub struct AppContext {
    config: Config,
    settings: ThemeSettings,
    session: Session,
    cache: CollectionCache,
    source: Box<dyn Source>,
}

impl AppContext {
    /// Loads settings and session from the home directory, falling back to defaults and an
    /// anonymous session. Collections are read from the configured data directory.
    pub async fn load(config: Config) -> Self {
        let source = Box::new(FileSource::new(config.data_dir()));
        Self::with_source(config, source).await
    }

    pub async fn with_source(config: Config, source: Box<dyn Source>) -> Self {
        let settings = ThemeSettings::load(&config.settings_path()).await;
        let session = Session::load(config.session_path()).await;
        let cache = CollectionCache::new(config.cache_stale_after());
        debug!(
            "Loaded context for '{}', signed in: {}",
            settings.nombre_negocio,
            session.is_authenticated()
        );
        Self {
            config,
            settings,
            session,
            cache,
            source,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &ThemeSettings {
        &self.settings
    }

    /// Replaces the settings and persists them.
    pub async fn set_settings(&mut self, settings: ThemeSettings) -> Result<()> {
        settings.save(&self.config.settings_path()).await?;
        self.settings = settings;
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = session;
    }

    pub fn cache(&self) -> &CollectionCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut CollectionCache {
        &mut self.cache
    }

    /// Signs out and forgets every cached collection. When the session file cannot be removed the
    /// current session and cache are left as they were.
    pub async fn logout(&mut self) -> Result<()> {
        self.session = self.session.clone().logout().await?;
        self.cache.clear();
        Ok(())
    }

    /// A fresh view for `screen`, configured from the config file.
    pub fn screen_view<I: Item>(&self, screen: Screen) -> ScreenView<I> {
        ScreenView::new(ScreenConfig::new(
            screen,
            self.config.thresholds(),
            self.config.debounce(),
        ))
    }

    /// The collection behind `screen`, from the cache when fresh.
    pub async fn collection<I>(&mut self, screen: Screen) -> Result<Arc<Vec<I>>>
    where
        I: DeserializeOwned + Send + Sync + 'static,
    {
        self.fetch(screen.collection_key()).await
    }

    /// The collection cached under `key`, fetched when missing or stale.
    pub async fn fetch<I>(&mut self, key: CollectionKey) -> Result<Arc<Vec<I>>>
    where
        I: DeserializeOwned + Send + Sync + 'static,
    {
        self.cache.get_or_fetch(key, self.source.as_ref()).await
    }
}
