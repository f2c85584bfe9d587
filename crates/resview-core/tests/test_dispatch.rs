#[allow(dead_code)]
mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use resview_core::category::Category;
use resview_core::view::{ResultView, ViewEvent};

use common::{count_events, load_extra, record_events, scenario_store};

#[test]
fn test_rapid_notifications_run_one_refresh() {
    let mut view = ResultView::new(scenario_store());
    view.set_page_active(true);
    assert_eq!(view.refresh_count(), 1);

    load_extra(view.store(), "a.sca", 1);
    load_extra(view.store(), "b.sca", 1);
    load_extra(view.store(), "c.sca", 1);
    assert!(view.has_pending_refresh());

    assert_eq!(view.process_pending(), 1);
    assert_eq!(view.refresh_count(), 2);
    assert_eq!(view.coalesced_notifications(), 2);
    assert!(!view.has_pending_refresh());
    assert_eq!(view.ids(Category::Scalars).len(), 6);
}

#[test]
fn test_notification_after_processing_schedules_again() {
    let mut view = ResultView::new(scenario_store());
    view.set_page_active(true);

    load_extra(view.store(), "a.sca", 1);
    assert_eq!(view.process_pending(), 1);
    load_extra(view.store(), "b.sca", 1);
    assert_eq!(view.process_pending(), 1);
    assert_eq!(view.refresh_count(), 3);
    assert_eq!(view.process_pending(), 0);
}

#[test]
fn test_inactive_view_invalidates_once_and_waits_for_activation() {
    let mut view = ResultView::new(scenario_store());
    view.set_page_active(true);
    view.set_page_active(false);
    let events = record_events(&mut view);

    load_extra(view.store(), "a.sca", 2);
    load_extra(view.store(), "b.sca", 2);
    view.process_pending();

    assert!(!view.is_content_valid());
    assert_eq!(view.refresh_count(), 1);
    assert_eq!(
        count_events(&events, |e| matches!(e, ViewEvent::ContentInvalidated)),
        1
    );

    view.process_pending();
    assert!(!view.is_content_valid());

    view.set_page_active(true);
    assert!(view.is_content_valid());
    assert_eq!(view.refresh_count(), 2);
    assert_eq!(view.ids(Category::Scalars).len(), 7);
    assert_eq!(
        count_events(&events, |e| matches!(e, ViewEvent::ContentInvalidated)),
        1
    );
}

#[test]
fn test_category_switch_revalidates_stale_content() {
    let mut view = ResultView::new(scenario_store());
    view.set_page_active(true);
    view.set_page_active(false);
    load_extra(view.store(), "a.sca", 2);
    view.process_pending();
    assert!(!view.is_content_valid());

    // Still inactive: switching tabs must not query.
    view.set_active_category(Category::Scalars);
    assert!(!view.is_content_valid());

    view.set_page_active(true);
    view.set_active_category(Category::Vectors);
    assert!(view.is_content_valid());
}

#[test]
fn test_dispose_suppresses_queued_refresh() {
    let mut view = ResultView::new(scenario_store());
    view.set_page_active(true);
    load_extra(view.store(), "a.sca", 1);
    view.dispose();
    assert_eq!(view.process_pending(), 0);
    assert_eq!(view.refresh_count(), 1);
}

#[test]
fn test_notifications_from_another_thread_are_marshalled() {
    let store = scenario_store();
    let mut view = ResultView::new(store.clone());
    view.set_page_active(true);

    let wakes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&wakes);
    view.set_wakeup(Some(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..5 {
                load_extra(&store, &format!("bg-{i}.sca"), 1);
            }
        })
    };
    writer.join().unwrap();

    let ran = view.wait_and_process(Duration::from_secs(5));
    assert!(ran >= 1);
    assert_eq!(view.ids(Category::Scalars).len(), 3 + 5);
    assert_eq!(wakes.load(Ordering::SeqCst) as u64, view.refresh_count() - 1);
}

#[test]
fn test_listeners_run_without_the_store_lock() {
    let store = scenario_store();
    let mut view = ResultView::new(store.clone());
    let fired = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&fired);
    let writer = Arc::clone(&store);
    view.add_listener(move |event| {
        if let ViewEvent::PanelTitlesChanged(_) = event {
            if !flag.swap(true, Ordering::SeqCst) {
                // Needs the write lock; would deadlock if the view still held a read lock.
                load_extra(&writer, "from-listener.sca", 1);
            }
        }
    });
    view.set_page_active(true);
    assert!(fired.load(Ordering::SeqCst));
    assert!(view.has_pending_refresh());
    view.process_pending();
    assert_eq!(view.ids(Category::Scalars).len(), 4);
}

#[test]
fn test_wait_times_out_without_notifications() {
    let mut view = ResultView::new(scenario_store());
    assert_eq!(view.wait_and_process(Duration::from_millis(10)), 0);
}
