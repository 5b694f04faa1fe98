use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dash", version, about = "Dashboard workspace shell")]
pub struct Cli {
    /// Directory holding settings, the store and plugin presets
    #[arg(long, global = true, default_value = "dash-data")]
    pub data_dir: PathBuf,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the widget kinds that can be added
    Widgets {
        #[arg(long, alias = "jq")]
        json_query: bool,
    },
    /// Show the saved dashboards and their widgets
    Show {
        #[arg(long, alias = "jq")]
        json_query: bool,
    },
    Add {
        module: String,
        #[arg(long)]
        title: Option<String>,
        /// left, right, top, bottom or floating
        #[arg(long)]
        area: Option<String>,
        /// Dashboard index; defaults to the first dashboard
        #[arg(long)]
        dashboard: Option<usize>,
    },
    Remove {
        id: String,
    },
    RenameWidget {
        id: String,
        title: String,
    },
    /// Refresh the widgets of a dashboard and wait for their data
    Refresh {
        #[arg(long)]
        dashboard: Option<usize>,
        #[arg(long, default_value_t = 2000)]
        wait_ms: u64,
    },
    NewDashboard {
        title: Option<String>,
    },
    CloseDashboard {
        index: usize,
    },
    RenameDashboard {
        index: usize,
        title: String,
    },
    Export {
        path: PathBuf,
    },
    Import {
        path: PathBuf,
    },
    /// Drop the saved workspace
    Reset,
}
