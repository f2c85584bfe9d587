use std::fmt::Write;
use std::sync::{Arc, Mutex};

use resview_core::loader::parse_result_file;
use resview_core::store::ResultStore;
use resview_core::view::{ResultView, ViewEvent};

/// Build result-file text with the given number of items of each kind.
///
/// Vectors, statistics and histograms get `count` and `mean` fields.
pub fn build_result_text(
    run: &str,
    scalars: usize,
    parameters: usize,
    vectors: usize,
    statistics: usize,
    histograms: usize,
) -> String {
    let mut text = String::new();
    writeln!(text, "run {run}").unwrap();
    for i in 0..parameters {
        writeln!(text, "par Net.node[{i}] interval {}", i as f64 + 0.5).unwrap();
    }
    for i in 0..scalars {
        writeln!(text, "scalar Net.node[{i}] sent {}", 1000 * (i + 1)).unwrap();
        writeln!(text, "attr unit pk").unwrap();
    }
    for i in 0..vectors {
        writeln!(text, "vector {i} Net.node[{i}] queueLength").unwrap();
        writeln!(text, "field count {}", 10 + i).unwrap();
        writeln!(text, "field mean 2.5").unwrap();
    }
    for i in 0..statistics {
        writeln!(text, "statistic Net.node[{i}] delay").unwrap();
        writeln!(text, "field count 4").unwrap();
        writeln!(text, "field mean 0.125").unwrap();
    }
    for i in 0..histograms {
        writeln!(text, "histogram Net.node[{i}] size").unwrap();
        writeln!(text, "field count 2").unwrap();
        writeln!(text, "field mean 64").unwrap();
        writeln!(text, "bin 0 1").unwrap();
        writeln!(text, "bin 100 1").unwrap();
    }
    text
}

/// 3 scalars, 2 parameters, 5 vectors, 1 statistic, 1 histogram.
pub fn scenario_store() -> Arc<ResultStore> {
    let store = ResultStore::new();
    let file = parse_result_file(&build_result_text("run-1", 3, 2, 5, 1, 1)).unwrap();
    store.load_file("scenario.sca", file).unwrap();
    store
}

/// Load another small file into `store` under `label`.
pub fn load_extra(store: &ResultStore, label: &str, scalars: usize) {
    let file = parse_result_file(&build_result_text(label, scalars, 0, 0, 0, 0)).unwrap();
    store.load_file(label, file).unwrap();
}

/// Record every event the view emits.
pub fn record_events(view: &mut ResultView) -> Arc<Mutex<Vec<ViewEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    view.add_listener(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

pub fn count_events(events: &Mutex<Vec<ViewEvent>>, pred: impl Fn(&ViewEvent) -> bool) -> usize {
    events.lock().unwrap().iter().filter(|e| pred(e)).count()
}
