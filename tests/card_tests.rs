use turnstile::{
    aggregate::OwnerTotals,
    card::{BalanceView, Card, CardId, CardKind, Error, Pass, Wallet},
    config::Config,
    shared::{Day, Fare},
};

fn day(day: u32) -> Day {
    Day::from_ymd(2024, 3, day).unwrap()
}

#[test]
fn ids_are_assigned_in_order() {
    let config = Config::default();
    let mut wallet = Wallet::new();
    let first = wallet.apply(CardKind::StoredValue, None, &config).unwrap().id;
    let second = wallet.apply(CardKind::RideCount, None, &config).unwrap().id;
    assert_eq!(first, CardId(1));
    assert_eq!(second, CardId(2));
    assert_eq!(wallet.len(), 2);
}

#[test]
fn new_cards_start_with_configured_balance() {
    let config = Config::default();
    let mut wallet = Wallet::new();
    let stored = wallet.apply(CardKind::StoredValue, None, &config).unwrap();
    assert_eq!(stored.view_balance(), BalanceView::Currency(Fare::from_units(19.0)));
    let rides = wallet.apply(CardKind::RideCount, None, &config).unwrap();
    assert_eq!(rides.view_balance(), BalanceView::Rides(10));
    let window = wallet
        .apply(CardKind::TimeWindow, Some(day(4)), &config)
        .unwrap();
    assert_eq!(window.view_balance(), BalanceView::DaysRemaining(7));
}

#[test]
fn time_window_needs_start() {
    let mut wallet = Wallet::new();
    let err = wallet
        .apply(CardKind::TimeWindow, None, &Config::default())
        .unwrap_err();
    assert_eq!(err, Error::MissingStartDate);
    assert!(wallet.is_empty());
}

#[test]
fn top_up_accepts_fixed_amounts() {
    let config = Config::default();
    let mut wallet = Wallet::new();
    let stored = wallet.apply(CardKind::StoredValue, None, &config).unwrap().id;
    let rides = wallet.apply(CardKind::RideCount, None, &config).unwrap().id;
    let window = wallet
        .apply(CardKind::TimeWindow, Some(day(4)), &config)
        .unwrap()
        .id;

    assert_eq!(
        wallet.top_up(stored, Fare::from_units(20.0), &config),
        Ok(BalanceView::Currency(Fare::from_units(39.0)))
    );
    assert_eq!(
        wallet.top_up(rides, Fare::from_units(50.0), &config),
        Ok(BalanceView::Rides(35))
    );
    assert_eq!(
        wallet.top_up(stored, Fare::from_units(15.0), &config),
        Err(Error::InvalidTopUpAmount(Fare::from_units(15.0)))
    );
    assert_eq!(
        wallet.top_up(window, Fare::from_units(10.0), &config),
        Err(Error::NotToppable(window))
    );
}

#[test]
fn suspended_card_is_not_deductible() {
    let config = Config::default();
    let mut wallet = Wallet::new();
    let id = wallet.apply(CardKind::StoredValue, None, &config).unwrap().id;

    wallet.suspend(id).unwrap();
    assert!(!wallet.is_able_to_deduct(id));
    assert_eq!(wallet.check_deductible(id), Err(Error::Suspended(id)));
    assert_eq!(
        wallet.top_up(id, Fare::from_units(10.0), &config),
        Err(Error::Suspended(id))
    );

    wallet.activate(id).unwrap();
    assert!(wallet.is_able_to_deduct(id));
    assert_eq!(wallet.suspend(CardId(99)), Err(Error::UnknownCard(CardId(99))));
}

#[test]
fn owner_binding_is_exclusive() {
    let config = Config::default();
    let mut wallet = Wallet::new();
    let id = wallet.apply(CardKind::StoredValue, None, &config).unwrap().id;

    assert_eq!(wallet.unbind_owner(id), Err(Error::NotBound(id)));
    wallet.bind_owner(id, "household").unwrap();
    assert!(matches!(
        wallet.bind_owner(id, "office"),
        Err(Error::AlreadyBound(_, ref owner)) if &**owner == "household"
    ));
    assert_eq!(wallet.find(id).unwrap().owner(), Some("household"));
    wallet.unbind_owner(id).unwrap();
    assert_eq!(wallet.find(id).unwrap().owner(), None);
}

#[test]
fn debit_books_on_card_and_owner() {
    let mut owners = OwnerTotals::new();
    let mut card = Card::new(
        CardId(1),
        Pass::RideCount { rides: 2 },
    );
    card.debit(Fare::from_units(1.5), day(4), &mut owners);
    assert_eq!(owners.owner_daily("household", day(4)).taps, 0);

    let mut wallet = Wallet::new();
    let config = Config::default();
    let id = wallet.apply(CardKind::RideCount, None, &config).unwrap().id;
    wallet.bind_owner(id, "household").unwrap();
    let mut bound = wallet.find(id).unwrap().clone();
    let balance = bound.debit(Fare::from_units(2.0), day(4), &mut owners);

    assert_eq!(balance, BalanceView::Rides(9));
    assert_eq!(bound.daily(day(4)).total, Fare::from_units(2.0));
    assert_eq!(owners.owner_daily("household", day(4)).total, Fare::from_units(2.0));
    assert_eq!(card.view_balance(), BalanceView::Rides(1));
}

#[test]
fn owing_maps_to_pass_reason() {
    let stored = Card::new(
        CardId(1),
        Pass::StoredValue {
            balance: Fare::from_units(0.0),
        },
    );
    assert_eq!(stored.check_deductible(), Err(Error::InsufficientFunds(CardId(1))));

    let rides = Card::new(CardId(2), Pass::RideCount { rides: 0 });
    assert_eq!(rides.check_deductible(), Err(Error::RidesExhausted(CardId(2))));

    let window = Card::new(
        CardId(3),
        Pass::TimeWindow {
            start: day(1),
            today: day(9),
            days: 7,
        },
    );
    assert_eq!(window.check_deductible(), Err(Error::PassExpired(CardId(3))));
}

#[test]
fn advance_date_only_moves_forward() {
    let config = Config::default();
    let mut wallet = Wallet::new();
    let id = wallet
        .apply(CardKind::TimeWindow, Some(day(4)), &config)
        .unwrap()
        .id;

    wallet.advance_date(day(8));
    assert_eq!(wallet.find(id).unwrap().view_balance(), BalanceView::DaysRemaining(3));
    wallet.advance_date(day(5));
    assert_eq!(wallet.find(id).unwrap().view_balance(), BalanceView::DaysRemaining(3));
}

#[test]
fn balance_as_currency() {
    let ride_value = Fare::from_units(2.0);
    assert_eq!(
        BalanceView::Rides(4).as_currency(ride_value),
        Some(Fare::from_units(8.0))
    );
    assert_eq!(
        BalanceView::Currency(Fare::from_units(3.0)).as_currency(ride_value),
        Some(Fare::from_units(3.0))
    );
    assert_eq!(BalanceView::DaysRemaining(2).as_currency(ride_value), None);
}
