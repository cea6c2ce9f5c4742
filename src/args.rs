//! These structs provide the CLI interface for the minimarket CLI.

use crate::commands::Format;
use crate::settings::SettingsUpdate;
use crate::view::{Direction, Estado, Screen, Selection};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// minimarket: list views over a minimarket's products, purchases, sales and suppliers.
///
/// Collections are read as JSON snapshots of the backend's list endpoints from the data directory
/// under --minimarket-home. Each screen can be searched, filtered and sorted, and comes with a
/// summary of what is shown.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory, its data directory and the configuration file.
    ///
    /// Decide what directory you want to store data in and pass this as --minimarket-home. By
    /// default, it will be $HOME/minimarket. Afterwards put the collection snapshots
    /// (productos.json, compras.json, ventas.json, proveedores.json, alertas.json) in its data
    /// directory.
    Init,
    /// Show one screen: search, filter and sort a collection and summarize the result.
    View(ViewArgs),
    /// Show or change the business name, primary color and logo.
    Settings(SettingsArgs),
    /// Show, start or end the signed-in session.
    Session(SessionArgs),
    /// List the low-stock alerts from the alertas.json snapshot, unread ones first marked with `*`.
    Alertas(AlertasArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where minimarket data and configuration is held. Defaults to ~/minimarket
    #[arg(long, env = "MINIMARKET_HOME", default_value_t = default_minimarket_home())]
    minimarket_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, minimarket_home: PathBuf) -> Self {
        Self {
            log_level,
            minimarket_home: minimarket_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn minimarket_home(&self) -> &DisplayPath {
        &self.minimarket_home
    }
}

/// Args for the `minimarket view` command.
#[derive(Debug, Parser, Clone)]
pub struct ViewArgs {
    /// The screen to show.
    #[arg(value_enum)]
    screen: Screen,

    /// Case and accent insensitive text to look for in the screen's search fields.
    #[arg(long)]
    search: Option<String>,

    /// Only active or only inactive rows (productos).
    #[arg(long, value_enum)]
    estado: Option<Estado>,

    /// Only rows in this category id, or `all` (productos).
    #[arg(long)]
    categoria: Option<Selection>,

    /// Only rows from this supplier id, or `all` (productos, compras).
    #[arg(long)]
    proveedor: Option<Selection>,

    /// Only products at or below their minimum stock.
    #[arg(long)]
    stock_bajo: bool,

    /// First day to include, e.g. 2025-03-01 (compras, ventas).
    #[arg(long)]
    desde: Option<NaiveDate>,

    /// Last day to include (compras, ventas).
    #[arg(long)]
    hasta: Option<NaiveDate>,

    /// The column to sort by. Unknown columns fall back to the screen's default sort.
    #[arg(long)]
    sort: Option<String>,

    /// Sort direction. Defaults to the column's own default direction.
    #[arg(long, value_enum)]
    direction: Option<Direction>,

    /// How to print the rows.
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

impl ViewArgs {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            search: None,
            estado: None,
            categoria: None,
            proveedor: None,
            stock_bajo: false,
            desde: None,
            hasta: None,
            sort: None,
            direction: None,
            format: Format::Table,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn estado(&self) -> Option<Estado> {
        self.estado
    }

    pub fn categoria(&self) -> Option<Selection> {
        self.categoria
    }

    pub fn proveedor(&self) -> Option<Selection> {
        self.proveedor
    }

    pub fn stock_bajo(&self) -> bool {
        self.stock_bajo
    }

    pub fn desde(&self) -> Option<NaiveDate> {
        self.desde
    }

    pub fn hasta(&self) -> Option<NaiveDate> {
        self.hasta
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

/// Args for the `minimarket settings` command. Without any flags the current settings are shown.
#[derive(Debug, Parser, Clone)]
pub struct SettingsArgs {
    /// The business name shown in the header.
    #[arg(long)]
    nombre_negocio: Option<String>,

    /// The primary color as #rrggbb.
    #[arg(long)]
    color_primario: Option<String>,

    /// URL of the business logo.
    #[arg(long)]
    logo_url: Option<String>,
}

impl SettingsArgs {
    pub fn update(&self) -> SettingsUpdate {
        SettingsUpdate {
            nombre_negocio: self.nombre_negocio.clone(),
            color_primario: self.color_primario.clone(),
            logo_url: self.logo_url.clone(),
            color_secundario: None,
        }
    }
}

/// Args for the `minimarket alertas` command.
#[derive(Debug, Parser, Clone)]
pub struct AlertasArgs {
    /// Also list alerts that were already read.
    #[arg(long)]
    todas: bool,
}

impl AlertasArgs {
    pub fn todas(&self) -> bool {
        self.todas
    }
}

/// Args for the `minimarket session` command.
#[derive(Debug, Parser, Clone)]
pub struct SessionArgs {
    #[command(subcommand)]
    action: SessionCommand,
}

impl SessionArgs {
    pub fn action(&self) -> &SessionCommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// Show who is signed in and which screens they may open.
    Show,
    /// Sign in as the user described in a JSON file, as returned by the backend's login.
    Start {
        /// Path to the user JSON: id, username, email, first_name, last_name, rol.
        #[arg(long)]
        user: PathBuf,
    },
    /// Sign out and forget cached collections.
    Logout,
}

fn default_minimarket_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("minimarket"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --minimarket-home or MINIMARKET_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("minimarket")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
