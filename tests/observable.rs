//! Behavior of the observable facade: before/after streams, suppression,
//! delayed notifications and property-bound removal.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use weakevent::{ChangeTracker, EventHandler, Observable, ObservableExt, PropertyChange};

struct Person {
    age: AtomicU32,
    changes: ChangeTracker,
}

impl Person {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            age: AtomicU32::new(0),
            changes: ChangeTracker::new(),
        })
    }
}

impl Observable for Person {
    fn change_tracker(&self) -> &ChangeTracker {
        &self.changes
    }
}

fn set_age(person: &Arc<Person>, age: u32) {
    person.raise_changing("age");
    person.age.store(age, Ordering::SeqCst);
    person.raise_changed("age");
}

type Log = Arc<Mutex<Vec<String>>>;

fn log_handler<E: weakevent::EventKind<Args = PropertyChange>>(
    log: &Log,
    tag: &'static str,
) -> EventHandler<E> {
    EventHandler::bound(log, move |log, _, change: &PropertyChange| {
        log.lock().unwrap().push(format!("{tag}:{}", change.property()));
    })
}

#[test]
fn changing_fires_before_changed() {
    let person = Person::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    person.observe_changing(&log_handler(&log, "changing")).unwrap();
    person.observe_changed(&log_handler(&log, "changed")).unwrap();

    set_age(&person, 40);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["changing:age".to_string(), "changed:age".to_string()]
    );
    assert_eq!(person.age.load(Ordering::SeqCst), 40);
}

#[test]
fn unobserve_ends_the_subscription() {
    let person = Person::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let handler = EventHandler::bound(&hits, |hits, _, _: &PropertyChange| {
        hits.fetch_add(1, Ordering::SeqCst);
    });

    person.observe_changed(&handler).unwrap();
    set_age(&person, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    person.unobserve_changed(&handler).unwrap();
    set_age(&person, 2);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn suppression_gates_both_streams_and_nests() {
    let person = Person::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    person.observe_changing(&log_handler(&log, "changing")).unwrap();
    person.observe_changed(&log_handler(&log, "changed")).unwrap();

    assert!(person.notifications_enabled());
    let outer = person.suppress_notifications();
    let inner = person.suppress_notifications();
    assert!(!person.notifications_enabled());

    set_age(&person, 30);
    drop(inner);
    // still suppressed: the outer guard is live
    set_age(&person, 31);
    drop(outer);
    assert!(person.notifications_enabled());
    assert!(log.lock().unwrap().is_empty());

    // mutation itself was never gated, only its notifications
    assert_eq!(person.age.load(Ordering::SeqCst), 31);

    set_age(&person, 32);
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[test]
fn delayed_changed_notices_flush_in_order() {
    let person = Person::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    person.observe_changing(&log_handler(&log, "changing")).unwrap();
    person.observe_changed(&log_handler(&log, "changed")).unwrap();

    let delay = person.delay_notifications();
    set_age(&person, 1);
    person.raise_changed("name");
    assert!(log.lock().unwrap().is_empty());
    drop(delay);

    // "changed" notices replay in raise order; "changing" notices from the
    // delay window are gone
    assert_eq!(
        *log.lock().unwrap(),
        vec!["changed:age".to_string(), "changed:name".to_string()]
    );
}

#[test]
fn nested_delays_flush_once_at_the_end() {
    let person = Person::new();
    let hits = Arc::new(AtomicUsize::new(0));
    person
        .observe_changed(&EventHandler::bound(&hits, |hits, _, _: &PropertyChange| {
            hits.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

    let outer = person.delay_notifications();
    let inner = person.delay_notifications();
    set_age(&person, 5);
    drop(inner);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    drop(outer);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn property_bound_handlers_match_by_receiver() {
    let person = Person::new();
    let hits = Arc::new(AtomicUsize::new(0));

    // subscription surfaces often mint a fresh wrapper per call; the two
    // values below are distinct callables over the same receiver
    let subscribed = EventHandler::property_bound(&hits, |hits, _, _: &PropertyChange| {
        hits.fetch_add(1, Ordering::SeqCst);
    });
    let unsubscribed = EventHandler::property_bound(&hits, |hits, _, _: &PropertyChange| {
        hits.fetch_add(1, Ordering::SeqCst);
    });

    person.observe_changed(&subscribed).unwrap();
    set_age(&person, 7);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    person.unobserve_changed(&unsubscribed).unwrap();
    set_age(&person, 8);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn dropping_the_watcher_ends_the_subscription() {
    let person = Person::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let watcher = Arc::new(());

    person
        .observe_changed(&EventHandler::bound(&watcher, {
            let hits = Arc::clone(&hits);
            move |_, _, _: &PropertyChange| {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        }))
        .unwrap();

    set_age(&person, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    drop(watcher);
    // no unsubscription anywhere: the dead receiver alone ends delivery
    set_age(&person, 2);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
