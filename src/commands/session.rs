use crate::commands::Out;
use crate::context::AppContext;
use crate::session::{Permissions, Session, Usuario};
use crate::view::Screen;
use crate::Result;
use serde::Serialize;
use std::path::Path;

/// Who is signed in and which screens they may open.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutput {
    pub usuario: Option<Usuario>,
    pub permissions: Permissions,
}

fn output(ctx: &AppContext, message: String) -> Out<SessionOutput> {
    let session = ctx.session();
    let screens: Vec<String> = Screen::ALL
        .iter()
        .filter(|s| session.can_view(**s))
        .map(|s| s.to_string())
        .collect();
    let text = match session.usuario() {
        Some(u) => format!(
            "{} ({}), rol {}\nscreens: {}",
            u.display_name(),
            u.username,
            u.rol,
            if screens.is_empty() {
                "none".to_string()
            } else {
                screens.join(", ")
            }
        ),
        None => "Not signed in".to_string(),
    };
    Out::new(
        message,
        SessionOutput {
            usuario: session.usuario().cloned(),
            permissions: session.permissions(),
        },
    )
    .with_text(text)
}

pub fn session_show(ctx: &AppContext) -> Result<Out<SessionOutput>> {
    let message = match ctx.session().usuario() {
        Some(u) => format!("Signed in as {}", u.username),
        None => "No active session".to_string(),
    };
    Ok(output(ctx, message))
}

/// Signs in the user described by the JSON file at `user_file`, replacing any current session.
pub async fn session_start(ctx: &mut AppContext, user_file: &Path) -> Result<Out<SessionOutput>> {
    let session = Session::start_from_file(ctx.config().session_path(), user_file).await?;
    ctx.set_session(session);
    session_show(ctx)
}

/// Signs out and drops every cached collection.
pub async fn session_logout(ctx: &mut AppContext) -> Result<Out<SessionOutput>> {
    let was = ctx.session().usuario().map(|u| u.username.clone());
    ctx.logout().await?;
    let message = match was {
        Some(username) => format!("Signed out {username}"),
        None => "No active session".to_string(),
    };
    Ok(output(ctx, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use crate::{utils, ErrorType};

    const CAJERO: &str = r#"{
        "id": 7,
        "username": "caja1",
        "email": "ventas@minimarket.cl",
        "first_name": "Ana",
        "last_name": "Rojas",
        "rol": "CAJERO"
    }"#;

    #[tokio::test]
    async fn test_start_show_logout() {
        let env = TestEnv::new().await;
        let user_file = env.config().root().join("cajero.json");
        utils::write(&user_file, CAJERO).await.unwrap();
        let mut ctx = env.context().await;

        let out = session_start(&mut ctx, &user_file).await.unwrap();
        assert_eq!(out.message(), "Signed in as caja1");
        assert!(out.structure().unwrap().permissions.ventas);

        let mut ctx = env.context().await;
        let out = session_show(&ctx).unwrap();
        assert_eq!(out.structure().unwrap().usuario.as_ref().unwrap().id, 7);

        let out = session_logout(&mut ctx).await.unwrap();
        assert_eq!(out.message(), "Signed out caja1");
        assert!(out.structure().unwrap().usuario.is_none());
        assert_eq!(out.text(), Some("Not signed in"));
    }

    #[tokio::test]
    async fn test_start_with_bad_file() {
        let env = TestEnv::new().await;
        let user_file = env.config().root().join("usuario.json");
        utils::write(&user_file, r#"{"id": 1}"#).await.unwrap();
        let mut ctx = env.context().await;
        let err = session_start(&mut ctx, &user_file).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Input);
        assert!(!ctx.session().is_authenticated());
    }
}
