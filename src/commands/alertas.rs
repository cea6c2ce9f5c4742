use crate::cache::CollectionKey;
use crate::commands::Out;
use crate::context::AppContext;
use crate::model::Alerta;
use crate::view::{Comparators, Direction, SortKeyDef, SortKind, SortState};
use crate::Result;
use serde::Serialize;

/// The low-stock alerts and how many of them are unread.
#[derive(Debug, Clone, Serialize)]
pub struct AlertasOutput {
    pub no_leidas: usize,
    pub alertas: Vec<Alerta>,
}

/// Lists the unread low-stock alerts, newest first. With `todas`, read alerts are listed too.
pub async fn alertas(ctx: &mut AppContext, todas: bool) -> Result<Out<AlertasOutput>> {
    let all = ctx.fetch::<Alerta>(CollectionKey::Alertas).await?;
    let no_leidas = all.iter().filter(|a| !a.leida).count();

    let mut shown: Vec<&Alerta> = all.iter().filter(|a| todas || !a.leida).collect();
    let newest_first = Comparators::new(
        vec![SortKeyDef::new("fecha", SortKind::date("fecha_creacion"))],
        "fecha",
    );
    newest_first.sort(&mut shown, &SortState::new("fecha", Direction::Desc));

    let text = shown
        .iter()
        .map(|a| {
            let fecha = a
                .fecha_creacion
                .map(|f| f.to_string())
                .unwrap_or_default();
            let marca = if a.leida { " " } else { "*" };
            format!("{marca} {fecha} {}", a.mensaje())
        })
        .collect::<Vec<_>>()
        .join("\n");
    let message = match no_leidas {
        0 => "No unread alerts".to_string(),
        1 => "1 unread alert".to_string(),
        n => format!("{n} unread alerts"),
    };
    let output = AlertasOutput {
        no_leidas,
        alertas: shown.into_iter().cloned().collect(),
    };
    Ok(Out::new(message, output).with_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Fecha;
    use crate::test::TestEnv;
    use crate::ErrorType;

    fn alerta(id: i64, fecha: &str, leida: bool) -> Alerta {
        Alerta {
            id,
            producto_nombre: Some(format!("Producto {id}")),
            stock_actual: Some(1),
            stock_minimo: Some(5),
            leida,
            fecha_creacion: Fecha::parse(fecha),
            ..Alerta::default()
        }
    }

    async fn env() -> TestEnv {
        let env = TestEnv::new().await;
        env.write_collection(
            CollectionKey::Alertas,
            &[
                alerta(1, "2025-03-01", false),
                alerta(2, "2025-03-03", true),
                alerta(3, "2025-03-02", false),
            ],
        )
        .await;
        env
    }

    #[tokio::test]
    async fn test_unread_newest_first() {
        let env = env().await;
        let mut ctx = env.context().await;
        let out = alertas(&mut ctx, false).await.unwrap();
        let output = out.structure().unwrap();
        assert_eq!(output.no_leidas, 2);
        let ids: Vec<i64> = output.alertas.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(out.message(), "2 unread alerts");
        assert!(out.text().unwrap().starts_with("* "));
        assert!(out.text().unwrap().contains("Producto 3: stock 1 (mínimo 5)"));
    }

    #[tokio::test]
    async fn test_todas_includes_read() {
        let env = env().await;
        let mut ctx = env.context().await;
        let out = alertas(&mut ctx, true).await.unwrap();
        let output = out.structure().unwrap();
        assert_eq!(output.no_leidas, 2);
        let ids: Vec<i64> = output.alertas.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_missing_snapshot() {
        let env = TestEnv::new().await;
        let mut ctx = env.context().await;
        let err = alertas(&mut ctx, false).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Io);
    }
}
