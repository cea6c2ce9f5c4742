//! The `view` command: one list screen, filtered, sorted and summarized, rendered as a table, JSON
//! or CSV.

use crate::args::ViewArgs;
use crate::commands::Out;
use crate::context::AppContext;
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{Compra, Item, Producto, Proveedor, Venta};
use crate::view::{DateRange, FilterValue, Rows, Screen, ScreenView, SortState, Summary};
use crate::Result;
use anyhow::{anyhow, ensure, Context};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Output formats for the `view` command.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// A Markdown table followed by the summary.
    #[default]
    Table,
    /// `{"rows": [..], "summary": {..}}`
    Json,
    /// The table columns as CSV, without the summary.
    Csv,
}

serde_plain::derive_display_from_serialize!(Format);
serde_plain::derive_fromstr_from_deserialize!(Format);

/// The structured result of the `view` command.
#[derive(Debug, Clone, Serialize)]
pub struct ViewOutput {
    pub screen: Screen,
    pub sort: SortState,
    pub rows: Vec<serde_json::Value>,
    pub summary: Summary,
}

#[derive(Serialize)]
struct Document<'a> {
    rows: &'a [serde_json::Value],
    summary: &'a Summary,
}

/// Shows `args.screen()`. When someone is signed in, their role must allow the screen.
pub async fn view(ctx: &mut AppContext, args: &ViewArgs) -> Result<Out<ViewOutput>> {
    let screen = args.screen();
    if ctx.session().is_authenticated() {
        ctx.session().require(screen)?;
    }
    match screen {
        Screen::Productos => run::<Producto>(ctx, args).await,
        Screen::Compras => run::<Compra>(ctx, args).await,
        Screen::Ventas => run::<Venta>(ctx, args).await,
        Screen::Proveedores => run::<Proveedor>(ctx, args).await,
    }
}

async fn run<I>(ctx: &mut AppContext, args: &ViewArgs) -> Result<Out<ViewOutput>>
where
    I: Item + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let screen = args.screen();
    let items = ctx.collection::<I>(screen).await?;
    let mut view = ctx.screen_view::<I>(screen);
    apply(&mut view, args).pub_result(ErrorType::Input)?;

    let derived = view.derive(&items);
    let columns = view.config().columns();
    let rows = derived
        .rows
        .iter()
        .map(serde_json::to_value)
        .collect::<serde_json::Result<Vec<_>>>()
        .context("Unable to serialize the rows")
        .pub_result(ErrorType::Internal)?;

    let text = match args.format() {
        Format::Table => render_table(columns, &derived.rows, &derived.summary),
        Format::Json => serde_json::to_string_pretty(&Document {
            rows: &rows,
            summary: &derived.summary,
        })
        .context("Unable to serialize the view")
        .pub_result(ErrorType::Internal)?,
        Format::Csv => render_csv(columns, &derived.rows).pub_result(ErrorType::Io)?,
    };

    let message = format!(
        "Showing {} of {} {screen}",
        derived.rows.len(),
        items.len()
    );
    let output = ViewOutput {
        screen,
        sort: view.sort_state().clone(),
        rows,
        summary: (*derived.summary).clone(),
    };
    Ok(Out::new(message, output).with_text(text))
}

fn set_filter<I: Item>(view: &mut ScreenView<I>, name: &str, value: FilterValue) -> Res<()> {
    let screen = view.config().screen();
    ensure!(
        view.config().pipeline().filters().get(name).is_some(),
        "{screen} cannot be filtered by {name}"
    );
    view.set_filter(name, value);
    Ok(())
}

/// Applies the command line's filters, search and sort to `view`.
fn apply<I: Item>(view: &mut ScreenView<I>, args: &ViewArgs) -> Res<()> {
    if let Some(estado) = args.estado() {
        set_filter(view, "estado", FilterValue::Estado(estado))?;
    }
    if let Some(categoria) = args.categoria() {
        set_filter(view, "categoria", FilterValue::Select(categoria))?;
    }
    if let Some(proveedor) = args.proveedor() {
        set_filter(view, "proveedor", FilterValue::Select(proveedor))?;
    }
    if args.stock_bajo() {
        set_filter(view, "stock_bajo", FilterValue::Toggle(true))?;
    }
    if args.desde().is_some() || args.hasta().is_some() {
        let range = DateRange::new(args.desde(), args.hasta());
        set_filter(view, "fecha", FilterValue::Range(range))?;
    }
    if let Some(term) = args.search() {
        view.set_search_input(term);
        view.commit_search();
    }

    let comparators = view.config().pipeline().comparators();
    let sort = match args.sort() {
        Some(key) => match comparators.get(key) {
            Some(def) => SortState::new(key, args.direction().unwrap_or(def.direction())),
            None => {
                let fallback = view.config().default_sort();
                warn!(
                    "{} cannot be sorted by '{key}', sorting by '{}'",
                    view.config().screen(),
                    fallback.key
                );
                SortState::new(
                    fallback.key.clone(),
                    args.direction().unwrap_or(fallback.direction),
                )
            }
        },
        None => {
            let default = view.config().default_sort();
            SortState::new(
                default.key.clone(),
                args.direction().unwrap_or(default.direction),
            )
        }
    };
    view.set_sort(sort);
    Ok(())
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// A Markdown table of `columns`, then the summary as `label: value` lines.
fn render_table<I: Item>(columns: &[&str], rows: &Rows<I>, summary: &Summary) -> String {
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", columns.join(" | ")));
    out.push_str(&format!(
        "|{}\n",
        columns.iter().map(|_| " --- |").collect::<String>()
    ));
    for item in rows.iter() {
        let cells: Vec<String> = item
            .to_row(columns)
            .iter()
            .map(|c| escape_cell(c))
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out.push('\n');
    for (label, value) in summary.lines() {
        out.push_str(&format!("{label}: {value}\n"));
    }
    out
}

fn render_csv<I: Item>(columns: &[&str], rows: &Rows<I>) -> Res<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(columns)
        .context("Unable to write the CSV header")?;
    for item in rows.iter() {
        writer
            .write_record(item.to_row(columns))
            .with_context(|| format!("Unable to write the CSV row for {}", item.id()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Unable to finish the CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("The CSV output is not UTF-8")
}
