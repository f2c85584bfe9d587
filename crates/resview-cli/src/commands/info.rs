use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use resview_core::view::ResultView;

use super::open_store;

#[derive(Args)]
pub struct InfoArgs {
    /// Result files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let store = open_store(&args.files)?;
    let mut view = ResultView::new(store.clone());
    view.set_page_active(true);

    let (files, runs) = store.run_with_read_lock(|s| {
        let files: Vec<String> = s.file_labels().iter().map(|l| l.to_string()).collect();
        let runs: Vec<String> = s.runs().iter().map(|r| r.to_string()).collect();
        (files, runs)
    })?;

    crate::summary::print_store_summary(&files, &runs, &view.panel_titles());
    Ok(())
}
