use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use resview_core::store::ResultStore;
use resview_core::view::ResultView;

#[derive(Args)]
pub struct StateArgs {
    /// Write the state to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save the settings of a freshly created view as TOML.
pub fn run(args: &StateArgs) -> Result<()> {
    let view = ResultView::new(ResultStore::new());
    let state = view.save_view_state();
    let toml_str = state.to_toml_string()?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write view state to {}", path.display()))?;
        println!("Default view state saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
