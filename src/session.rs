//! The signed-in user, their role and what the role is allowed to see.

use crate::error::{ErrorType, IntoResult, Res};
use crate::view::Screen;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SESSION_JSON: &str = "session.json";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rol {
    Administrador,
    Cajero,
    Bodeguero,
}

serde_plain::derive_display_from_serialize!(Rol);
serde_plain::derive_fromstr_from_deserialize!(Rol);

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Usuario {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub rol: Rol,
}

impl Usuario {
    /// `first_name last_name`, or the username if neither is set.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// What the current user may open.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct Permissions {
    pub ventas: bool,
    pub compras: bool,
    pub productos: bool,
    pub reportes: bool,
    pub proveedores: bool,
}

impl Permissions {
    /// Nobody signed in means no permissions.
    pub fn for_rol(rol: Option<Rol>) -> Self {
        let Some(rol) = rol else {
            return Self::default();
        };
        let admin = rol == Rol::Administrador;
        Self {
            ventas: admin || rol == Rol::Cajero,
            compras: admin || rol == Rol::Bodeguero,
            productos: admin,
            reportes: admin,
            proveedores: true,
        }
    }

    pub fn can_view(&self, screen: Screen) -> bool {
        match screen {
            Screen::Productos => self.productos,
            Screen::Compras => self.compras,
            Screen::Ventas => self.ventas,
            Screen::Proveedores => self.proveedores,
        }
    }
}

/// The session persisted at `session.json`. Anonymous when no one is signed in.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Session {
    path: PathBuf,
    usuario: Option<Usuario>,
}

impl Session {
    pub fn anonymous(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            usuario: None,
        }
    }

    /// Loads the session stored at `path`. A missing or unreadable file is an anonymous session.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.is_file() {
            debug!("No session file at {}", path.display());
            return Self::anonymous(path);
        }
        match utils::deserialize::<Usuario>(&path).await {
            Ok(usuario) => Self {
                path,
                usuario: Some(usuario),
            },
            Err(e) => {
                warn!("Ignoring the session file: {e:#}");
                Self::anonymous(path)
            }
        }
    }

    /// Signs `usuario` in and persists the session.
    pub async fn start(path: impl Into<PathBuf>, usuario: Usuario) -> Result<Self> {
        let path = path.into();
        Self::write(&path, &usuario)
            .await
            .pub_result(ErrorType::Io)?;
        info!("Signed in as {} ({})", usuario.username, usuario.rol);
        Ok(Self {
            path,
            usuario: Some(usuario),
        })
    }

    /// Signs in the user described by the JSON file `user_file`.
    pub async fn start_from_file(path: impl Into<PathBuf>, user_file: &Path) -> Result<Self> {
        let usuario = utils::deserialize::<Usuario>(user_file)
            .await
            .context("Unable to read the user file")
            .pub_result(ErrorType::Input)?;
        Self::start(path, usuario).await
    }

    async fn write(path: &Path, usuario: &Usuario) -> Res<()> {
        let data = serde_json::to_string_pretty(usuario).context("Unable to serialize the user")?;
        utils::write(path, data)
            .await
            .context("Unable to write the session file")
    }

    /// Signs out, removing the persisted session.
    pub async fn logout(self) -> Result<Self> {
        utils::remove_file(&self.path)
            .await
            .pub_result(ErrorType::Io)?;
        if let Some(usuario) = &self.usuario {
            info!("Signed out {}", usuario.username);
        }
        Ok(Self::anonymous(self.path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn usuario(&self) -> Option<&Usuario> {
        self.usuario.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.usuario.is_some()
    }

    pub fn rol(&self) -> Option<Rol> {
        self.usuario.as_ref().map(|u| u.rol)
    }

    pub fn permissions(&self) -> Permissions {
        Permissions::for_rol(self.rol())
    }

    pub fn can_view(&self, screen: Screen) -> bool {
        self.permissions().can_view(screen)
    }

    /// An error unless the signed-in user may open `screen`.
    pub fn require(&self, screen: Screen) -> Result<()> {
        self.require_inner(screen).pub_result(ErrorType::Session)
    }

    fn require_inner(&self, screen: Screen) -> Res<()> {
        let Some(usuario) = &self.usuario else {
            bail!("Sign in to view {screen}");
        };
        if !self.can_view(screen) {
            bail!(
                "{} ({}) is not allowed to view {screen}",
                usuario.username,
                usuario.rol
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn usuario(rol: Rol) -> Usuario {
        Usuario {
            id: 1,
            username: "jperez".into(),
            email: None,
            first_name: Some("Juana".into()),
            last_name: Some("Pérez".into()),
            rol,
        }
    }

    #[test]
    fn test_permissions_by_rol() {
        let admin = Permissions::for_rol(Some(Rol::Administrador));
        assert!(admin.ventas && admin.compras && admin.productos && admin.reportes);

        let cajero = Permissions::for_rol(Some(Rol::Cajero));
        assert!(cajero.ventas);
        assert!(!cajero.compras && !cajero.productos && !cajero.reportes);
        assert!(cajero.can_view(Screen::Proveedores));

        let bodeguero = Permissions::for_rol(Some(Rol::Bodeguero));
        assert!(bodeguero.compras);
        assert!(!bodeguero.can_view(Screen::Ventas));

        let nobody = Permissions::for_rol(None);
        assert!(Screen::ALL.iter().all(|s| !nobody.can_view(*s)));
    }

    #[test]
    fn test_rol_wire_format() {
        assert_eq!(Rol::Administrador.to_string(), "ADMINISTRADOR");
        let u: Usuario =
            serde_json::from_str(r#"{"id": 3, "username": "caja1", "rol": "CAJERO"}"#).unwrap();
        assert_eq!(u.rol, Rol::Cajero);
        assert_eq!(u.display_name(), "caja1");
    }

    #[tokio::test]
    async fn test_start_load_logout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SESSION_JSON);

        let session = Session::load(&path).await;
        assert!(!session.is_authenticated());

        let session = Session::start(&path, usuario(Rol::Bodeguero)).await.unwrap();
        assert_eq!(session.usuario().unwrap().display_name(), "Juana Pérez");

        let reloaded = Session::load(&path).await;
        assert_eq!(reloaded.rol(), Some(Rol::Bodeguero));

        let anonymous = reloaded.logout().await.unwrap();
        assert!(!anonymous.is_authenticated());
        assert!(!path.exists());
        assert!(!Session::load(&path).await.is_authenticated());
    }

    #[tokio::test]
    async fn test_require() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SESSION_JSON);
        let cajero = Session::start(&path, usuario(Rol::Cajero)).await.unwrap();
        assert!(cajero.require(Screen::Ventas).is_ok());
        let err = cajero.require(Screen::Productos).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Session);
        assert!(Session::anonymous(&path).require(Screen::Ventas).is_err());
    }

    #[tokio::test]
    async fn test_corrupt_session_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SESSION_JSON);
        utils::write(&path, r#"{"username": "x"}"#).await.unwrap();
        assert!(!Session::load(&path).await.is_authenticated());
    }
}
