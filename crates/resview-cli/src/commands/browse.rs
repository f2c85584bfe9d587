use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use resview_core::category::Category;
use resview_core::control::Column;
use resview_core::view::ResultView;
use resview_core::view_state::ViewState;

use super::{open_store, CategoryArg};

#[derive(Args)]
pub struct BrowseArgs {
    /// Result files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Category to show (overrides the saved state)
    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,

    /// Number of decimal places (0-16)
    #[arg(long)]
    pub precision: Option<u32>,

    /// Print raw numbers without rounding or digit grouping
    #[arg(long)]
    pub no_format: bool,

    /// Show vector, statistic and histogram fields as scalar rows
    #[arg(long)]
    pub fields_as_scalars: bool,

    /// Strip the network name from module paths
    #[arg(long)]
    pub hide_network_names: bool,

    /// Comma-separated row indices to select (for `all`, tree leaves in display order)
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<usize>,

    /// Print at most this many rows
    #[arg(long, default_value = "50")]
    pub limit: usize,

    /// View state file (TOML) to restore before applying options
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Save the resulting view state to this file
    #[arg(long)]
    pub save_state: Option<PathBuf>,
}

pub fn run(args: &BrowseArgs) -> Result<()> {
    let store = open_store(&args.files)?;
    let mut view = ResultView::new(store);
    view.set_page_active(true);

    if let Some(ref path) = args.state {
        let state = ViewState::load(path)
            .with_context(|| format!("Failed to read view state {}", path.display()))?;
        view.apply_view_state(&state);
    }
    apply_options(&mut view, args);

    let category = view.active_category();
    let rows = view.rows(category, 0..args.limit)?;
    let columns: Vec<Column> = view
        .control(category)
        .as_table()
        .map(|t| t.columns().to_vec())
        .unwrap_or_default();

    crate::summary::print_panel_titles(&view.panel_titles(), category);
    crate::summary::print_rows(&columns, &rows);
    let total = view.control(category).item_count();
    let shown = rows.iter().filter(|r| r.id.is_some()).count();
    if total > shown {
        println!("  ... {} more items", total - shown);
    }

    if !args.select.is_empty() {
        if let Some(&bad) = args.select.iter().find(|&&r| r >= total) {
            bail!("Row {bad} is out of range ({total} rows in {category})");
        }
        view.select_rows(&args.select);
    }
    let selection = view.report_selection();
    crate::summary::print_selection(&view.status_message(), &selection);

    if let Some(ref path) = args.save_state {
        view.save_view_state()
            .save(path)
            .with_context(|| format!("Failed to write view state to {}", path.display()))?;
        println!("View state saved to {}", path.display());
    }

    Ok(())
}

fn apply_options(view: &mut ResultView, args: &BrowseArgs) {
    if let Some(category) = args.category {
        view.set_active_category(Category::from(category));
    }
    if let Some(precision) = args.precision {
        view.set_numeric_precision(precision);
    }
    if args.no_format {
        view.set_number_formatting_enabled(false);
    }
    if args.fields_as_scalars {
        view.set_show_fields_as_scalars(true);
    }
    if args.hide_network_names {
        view.set_show_network_names(false);
    }
}
