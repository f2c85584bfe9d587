pub mod browse;
pub mod info;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use resview_core::category::Category;
use resview_core::loader::load_result_file;
use resview_core::store::ResultStore;

#[derive(Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    All,
    Scalars,
    Parameters,
    Vectors,
    Histograms,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::All => Category::All,
            CategoryArg::Scalars => Category::Scalars,
            CategoryArg::Parameters => Category::Parameters,
            CategoryArg::Vectors => Category::Vectors,
            CategoryArg::Histograms => Category::Histograms,
        }
    }
}

/// Parse every file and load it into a fresh store, labelled by its path.
pub fn open_store(files: &[PathBuf]) -> Result<Arc<ResultStore>> {
    let store = ResultStore::new();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Loading result files");

    let mut items = 0;
    for path in files {
        let file = load_result_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        items += store.load_file(path.display().to_string(), file)?;
        pb.inc(1);
    }
    pb.finish_with_message(format!("Loaded {items} items"));

    Ok(store)
}
