use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use chrono::NaiveDate;
use turnstile::{
    card::{CardId, CardKind},
    config::Config,
    network::{LineSpec, Network, StationId, StationKind},
    shared::{Day, Fare, Timestamp},
    transit::{PersistError, Persistence, Snapshot, TransitEvent, TransitSystem},
};

fn network() -> Network {
    Network::load([
        LineSpec::new(StationKind::Rail, &["A", "B", "C", "D", "E"]),
        LineSpec::new(StationKind::Surface, &["A", "P", "Q"]),
    ])
    .unwrap()
}

fn system() -> TransitSystem {
    TransitSystem::new(network(), Config::default())
}

fn station(system: &TransitSystem, location: &str, kind: StationKind) -> StationId {
    system.network().find_station(location, kind).unwrap().id()
}

fn on(day: u32, hour: u32, minute: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn day(day: u32) -> Day {
    Day::from_ymd(2024, 3, day).unwrap()
}

fn issue(system: &TransitSystem, kind: CardKind) -> CardId {
    system.apply_for_card(kind, Some(day(4))).unwrap().id
}

/// Rail A to D, then a bus from A to Q after leaving the journey window.
fn ride(system: &TransitSystem, card: CardId, date: u32) {
    ride_from(system, card, date, 8);
}

/// Same as [`ride`], starting at `hour`. Taps are checked against one clock
/// for all cards, so a later card on the same day starts later.
fn ride_from(system: &TransitSystem, card: CardId, date: u32, hour: u32) {
    let rail = |location| station(system, location, StationKind::Rail);
    let bus = |location| station(system, location, StationKind::Surface);
    system.tap_in(card, on(date, hour, 0), rail("A")).unwrap();
    system.tap_out(card, on(date, hour, 10), rail("D")).unwrap();
    system.tap_in(card, on(date, hour + 3, 0), bus("A")).unwrap();
    system.tap_out(card, on(date, hour + 3, 10), bus("Q")).unwrap();
}

#[test]
fn stations_traversed_counts_both_kinds() {
    let system = system();
    let card = issue(&system, CardKind::StoredValue);
    ride(&system, card, 4);

    assert_eq!(system.stations_traversed(day(4)), 5);
    assert_eq!(system.stations_traversed(day(5)), 0);
}

#[test]
fn replayed_tap_out_counts_once() {
    let system = system();
    let card = issue(&system, CardKind::StoredValue);
    let a = station(&system, "A", StationKind::Rail);
    let c = station(&system, "C", StationKind::Rail);

    system.tap_in(card, on(4, 8, 0), a).unwrap();
    system.tap_out(card, on(4, 8, 10), c).unwrap();
    assert!(system.tap_out(card, on(4, 8, 10), c).is_err());

    assert_eq!(system.stations_traversed(day(4)), 2);
    assert_eq!(
        system.daily_cost_and_count(card, day(4)).unwrap().total,
        Fare::from_units(1.0)
    );
}

#[test]
fn daily_tallies_follow_debits() {
    let system = system();
    let card = issue(&system, CardKind::StoredValue);
    ride(&system, card, 4);

    let tally = system.daily_cost_and_count(card, day(4)).unwrap();
    assert_eq!(tally.taps, 2);
    assert_eq!(tally.total, Fare::from_units(3.5));
    assert_eq!(tally.average(), Some(Fare::from_units(1.75)));

    assert_eq!(system.card_daily_totals(day(4)), vec![(card, tally)]);
    assert!(system.card_daily_totals(day(5)).is_empty());
}

#[test]
fn totals_across_cards_and_kinds() {
    let system = system();
    let stored = issue(&system, CardKind::StoredValue);
    let rides = issue(&system, CardKind::RideCount);
    issue(&system, CardKind::TimeWindow);
    ride(&system, stored, 4);
    ride_from(&system, rides, 4, 12);

    let all = system.daily_totals_across_cards(day(4));
    assert_eq!(all.taps, 4);
    assert_eq!(all.total, Fare::from_units(7.0));

    let kinds = system.all_card_type_totals(day(4));
    assert_eq!(kinds.len(), 3);
    assert_eq!(kinds[&CardKind::RideCount].taps, 2);
    assert_eq!(kinds[&CardKind::TimeWindow].taps, 0);
}

#[test]
fn capped_leg_still_counts_a_tap() {
    let system = system();
    let card = issue(&system, CardKind::RideCount);
    let rail = |location| station(&system, location, StationKind::Rail);

    // A to E and back twice hits the cap before the last exit
    system.tap_in(card, on(4, 8, 0), rail("A")).unwrap();
    system.tap_out(card, on(4, 8, 10), rail("E")).unwrap();
    system.tap_in(card, on(4, 8, 15), rail("E")).unwrap();
    system.tap_out(card, on(4, 8, 25), rail("A")).unwrap();
    system.tap_in(card, on(4, 8, 30), rail("A")).unwrap();
    system.tap_out(card, on(4, 8, 40), rail("E")).unwrap();
    let last = system.tap_in(card, on(4, 8, 45), rail("E")).unwrap();
    let exit = system.tap_out(card, on(4, 8, 55), rail("A")).unwrap();

    assert!(!last.new_journey);
    assert_eq!(exit.charged, Fare::default());
    let tally = system.daily_cost_and_count(card, day(4)).unwrap();
    assert_eq!(tally.taps, 4);
    assert_eq!(tally.total, Fare::from_units(6.0));
}

#[test]
fn owner_totals_follow_bound_cards() {
    let system = system();
    let card = issue(&system, CardKind::StoredValue);
    let other = issue(&system, CardKind::StoredValue);
    system.bind_owner(card, "household").unwrap();
    assert!(system.bind_owner(card, "office").is_err());

    ride(&system, card, 4);
    ride_from(&system, other, 4, 12);

    let daily = system.owner_daily("household", day(4));
    assert_eq!(daily.taps, 2);
    assert_eq!(daily.total, Fare::from_units(3.5));
    assert_eq!(system.owner_revenue(day(4)), Fare::from_units(3.5));
    assert_eq!(
        system.owner_monthly_average("household", 2024, 3),
        Some(Fare::from_units(1.75))
    );
    assert_eq!(system.owner_monthly_average("household", 2024, 4), None);

    system.unbind_owner(card).unwrap();
    ride(&system, card, 5);
    assert_eq!(system.owner_daily("household", day(5)).taps, 0);
}

#[test]
fn events_are_queued_in_order() {
    let system = system();
    let card = issue(&system, CardKind::StoredValue);
    let a = station(&system, "A", StationKind::Rail);
    let b = station(&system, "B", StationKind::Rail);

    system.tap_in(card, on(4, 8, 0), a).unwrap();
    system.tap_out(card, on(4, 8, 5), b).unwrap();
    system.advance_date(day(5));
    system.set_accepting_taps(false);

    let events = system.drain_events();
    assert_eq!(events.len(), 4);
    assert!(matches!(
        events[0],
        TransitEvent::TappedIn { in_transit: 1, .. }
    ));
    assert!(matches!(
        events[1],
        TransitEvent::TappedOut {
            stations_traversed: 1,
            in_transit: 0,
            ..
        }
    ));
    assert_eq!(events[2], TransitEvent::DateAdvanced(day(5)));
    assert_eq!(events[3], TransitEvent::AcceptingChanged(false));
    assert!(system.drain_events().is_empty());
}

struct FailingStore {
    calls: Arc<AtomicUsize>,
}

impl Persistence for FailingStore {
    fn save(&self, _: &Snapshot) -> Result<(), PersistError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PersistError::Store("disk full".into()))
    }
}

#[test]
fn failed_persistence_keeps_committed_state() {
    let calls = Arc::new(AtomicUsize::new(0));
    let system = system().with_persistence(FailingStore {
        calls: calls.clone(),
    });
    let card = issue(&system, CardKind::StoredValue);
    let a = station(&system, "A", StationKind::Surface);

    system.tap_in(card, on(4, 8, 0), a).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(system.is_in_transit(card));
    assert_eq!(
        system.daily_cost_and_count(card, day(4)).unwrap().total,
        Fare::from_units(2.0)
    );
}

#[test]
fn snapshot_restores_full_state() {
    let system = system();
    let card = issue(&system, CardKind::StoredValue);
    ride(&system, card, 4);
    let a = station(&system, "A", StationKind::Rail);
    system.tap_in(card, on(4, 12, 0), a).unwrap();

    let json = serde_json::to_string(&system.snapshot()).unwrap();
    let snapshot: Snapshot = serde_json::from_str(&json).unwrap();
    let restored = TransitSystem::restore(network(), Config::default(), snapshot);

    assert!(restored.is_in_transit(card));
    assert_eq!(restored.find_card(card), system.find_card(card));
    assert_eq!(restored.stations_traversed(day(4)), 5);
    assert_eq!(restored.recent_trips(card, 10), system.recent_trips(card, 10));

    let b = station(&restored, "B", StationKind::Rail);
    restored.tap_out(card, on(4, 12, 5), b).unwrap();
    assert_eq!(restored.apply_for_card(CardKind::RideCount, None).unwrap().id, CardId(2));
}

#[test]
fn recent_trips_newest_first() {
    let system = system();
    let first = issue(&system, CardKind::StoredValue);
    let second = issue(&system, CardKind::StoredValue);
    ride(&system, first, 4);
    ride(&system, second, 5);

    let mine = system.recent_trips(first, 1);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].first_entry().unwrap().at, on(4, 11, 0));

    let merged = system.recent_trips_for(&[first, second], 3);
    let starts: Vec<(CardId, Timestamp)> = merged
        .iter()
        .map(|(id, trip)| (*id, trip.first_entry().unwrap().at))
        .collect();
    assert_eq!(
        starts,
        vec![
            (second, on(5, 11, 0)),
            (second, on(5, 8, 0)),
            (first, on(4, 11, 0)),
        ]
    );
}

#[test]
fn prune_drops_old_history() {
    let config = Config {
        retention_days: 30,
        ..Config::default()
    };
    let system = TransitSystem::new(network(), config);
    let card = issue(&system, CardKind::StoredValue);
    system.top_up(card, Fare::from_units(50.0)).unwrap();
    ride(&system, card, 1);
    ride(&system, card, 31);

    let report = system.prune_history(Day::from_ymd(2024, 4, 10).unwrap());
    assert_eq!(report.trips, 2);
    assert_eq!(system.recent_trips(card, 10).len(), 2);
    assert_eq!(system.stations_traversed(day(1)), 0);
    assert_eq!(system.daily_cost_and_count(card, day(1)).unwrap().taps, 0);
    assert_eq!(system.stations_traversed(day(31)), 5);
}
