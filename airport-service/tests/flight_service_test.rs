mod common;

use airport_core::{
    AirportError, Flight, FlightNotFound, InconsistentData, Overlap, Plane, PlaneNotFound,
};
use airport_service::AirportService;
use airport_store::Config;
use common::{at, flight, service};

async fn with_scheduled(service: &AirportService) -> (Plane, Flight) {
    let plane = service.save_plane("A320").await.unwrap();
    let existing = service.save_flight(flight(8, 10, &plane)).await.unwrap();
    (plane, existing)
}

fn overlap_of(err: AirportError) -> Overlap {
    match err {
        AirportError::PlaneAlreadyInService(overlap) => overlap,
        other => panic!("expected an overlap, got {other:?}"),
    }
}

#[tokio::test]
async fn test_save_assigns_number() {
    let (service, store) = service();
    let (plane, saved) = with_scheduled(&service).await;

    assert!(saved.number().is_some());
    assert_eq!(saved.plane, plane);
    assert_eq!(service.find_by_num(saved.number().unwrap()).await.unwrap(), Some(saved.clone()));
    assert_eq!(service.find_by_num("nope").await.unwrap(), None);
    assert_eq!(service.find_all_flights().await.unwrap(), vec![saved]);
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn test_rejects_bad_dates() {
    let (service, _store) = service();
    let plane = service.save_plane("A320").await.unwrap();

    let same_instant = service.save_flight(flight(9, 9, &plane)).await.unwrap_err();
    assert!(matches!(same_instant, AirportError::InconsistentData(InconsistentData::Dates)));
    assert_eq!(same_instant.to_string(), "departure or arrival date is wrong");

    let backwards = service.save_flight(flight(11, 9, &plane)).await.unwrap_err();
    assert_eq!(backwards.to_string(), "departure or arrival date is wrong");

    assert!(service.find_all_flights().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_equal_dates_rejected_before_anything_else() {
    let (service, _store) = service();

    // Same origin and destination, plane never saved: the date check still wins
    let candidate = Flight::new(at(9), at(9), "FCO", "FCO", Plane::with_id("ghost", "A320"));
    let err = service.save_flight(candidate).await.unwrap_err();
    assert_eq!(err.to_string(), "departure or arrival date is wrong");
}

#[tokio::test]
async fn test_rejects_same_origin_and_destination() {
    let (service, _store) = service();
    let plane = service.save_plane("A320").await.unwrap();

    let candidate = Flight::new(at(8), at(10), "FCO", "FCO", plane);
    let err = service.save_flight(candidate).await.unwrap_err();
    assert!(matches!(err, AirportError::InconsistentData(InconsistentData::Route)));
    assert_eq!(err.to_string(), "origin or destination is wrong");
}

#[tokio::test]
async fn test_overlap_same_endpoint() {
    let (service, _store) = service();
    let (plane, _) = with_scheduled(&service).await;

    let same_departure = service.save_flight(flight(8, 9, &plane)).await.unwrap_err();
    assert_eq!(
        same_departure.to_string(),
        "This plane is already in service. Departure or arrival date are equals to exsisting flight."
    );
    let same_arrival = service.save_flight(flight(7, 10, &plane)).await.unwrap_err();
    assert_eq!(overlap_of(same_arrival), Overlap::SameEndpoint);
}

#[tokio::test]
async fn test_overlap_departure_inside() {
    let (service, _store) = service();
    let (plane, _) = with_scheduled(&service).await;

    let err = service.save_flight(flight(9, 11, &plane)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "This plane is already in service. Departure date is between dates of existing flight"
    );
    assert_eq!(service.find_all_flights().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_overlap_arrival_inside() {
    let (service, _store) = service();
    let (plane, _) = with_scheduled(&service).await;

    let err = service.save_flight(flight(7, 9, &plane)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "This plane is already in service. Arrival date is between dates of existing flight"
    );
}

#[tokio::test]
async fn test_overlap_encloses() {
    let (service, _store) = service();
    let (plane, _) = with_scheduled(&service).await;

    let err = service.save_flight(flight(7, 11, &plane)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "This plane is already in service. Departure date is before and arrival date is after dates of existing flight"
    );
}

#[tokio::test]
async fn test_back_to_back_flights_are_accepted() {
    let (service, _store) = service();
    let (plane, first) = with_scheduled(&service).await;

    let after = service.save_flight(flight(10, 12, &plane)).await.unwrap();
    let before = service.save_flight(flight(6, 8, &plane)).await.unwrap();

    assert_eq!(service.find_all_flights().await.unwrap(), vec![first, after, before]);
}

#[tokio::test]
async fn test_other_planes_do_not_conflict() {
    let (service, _store) = service();
    let (_, _) = with_scheduled(&service).await;

    let other = service.save_plane("A320").await.unwrap();
    let saved = service.save_flight(flight(8, 10, &other)).await.unwrap();
    assert_eq!(saved.plane, other);
    assert_eq!(service.find_all_flights().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_first_conflicting_flight_decides() {
    let (service, _store) = service();
    let plane = service.save_plane("A320").await.unwrap();
    service.save_flight(flight(8, 10, &plane)).await.unwrap();
    service.save_flight(flight(12, 14, &plane)).await.unwrap();

    // Both candidates also collide with the 12:00 flight; the 08:00 one is stored first
    let err = service.save_flight(flight(7, 13, &plane)).await.unwrap_err();
    assert_eq!(overlap_of(err), Overlap::Encloses);

    let err = service.save_flight(flight(9, 13, &plane)).await.unwrap_err();
    assert_eq!(overlap_of(err), Overlap::DepartureInside);
}

#[tokio::test]
async fn test_rejects_unknown_plane() {
    let (service, store) = service();

    let err = service
        .save_flight(flight(8, 10, &Plane::with_id("ghost", "A320")))
        .await
        .unwrap_err();
    assert!(matches!(err, AirportError::PlaneNotFound(PlaneNotFound::Id(ref id)) if id == "ghost"));
    assert_eq!(err.to_string(), "No existing plane with id ghost");

    let err = service
        .save_flight(flight(8, 10, &Plane::new("A320")))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No existing plane with id null");
    assert!(service.find_all_flights().await.unwrap().is_empty());
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn test_delete_flight() {
    let (service, _store) = service();
    let (plane, existing) = with_scheduled(&service).await;

    service.delete_flight(&existing).await.unwrap();
    assert!(service.find_all_flights().await.unwrap().is_empty());

    // The slot is free again
    service.save_flight(flight(8, 10, &plane)).await.unwrap();

    let err = service.delete_flight(&existing).await.unwrap_err();
    assert!(matches!(err, AirportError::FlightNotFound(FlightNotFound::Number(_))));
    assert_eq!(
        err.to_string(),
        format!("No existing flight with num {}", existing.number().unwrap())
    );

    let err = service.delete_flight(&flight(8, 10, &plane)).await.unwrap_err();
    assert_eq!(err.to_string(), "No existing flight with num null");
}

#[tokio::test]
async fn test_sessions_released_on_every_path() {
    let (service, store) = service();
    let (plane, _) = with_scheduled(&service).await;

    let _ = service.save_flight(flight(9, 11, &plane)).await;
    let _ = service.save_flight(flight(9, 9, &plane)).await;
    let _ = service.delete_flight(&flight(1, 2, &plane).with_number("x")).await;
    let _ = service.delete_plane(&plane).await;
    let _ = service.find_all_flights_by_origin("nowhere").await;

    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_overlapping_saves_admit_one() {
    let (service, store) = service();
    let plane = service.save_plane("A320").await.unwrap();

    let left = {
        let service = service.clone();
        let candidate = flight(8, 10, &plane);
        tokio::spawn(async move { service.save_flight(candidate).await })
    };
    let right = {
        let service = service.clone();
        let candidate = flight(9, 11, &plane);
        tokio::spawn(async move { service.save_flight(candidate).await })
    };

    let results = [left.await.unwrap(), right.await.unwrap()];
    let saved = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(AirportError::PlaneAlreadyInService(_))))
        .count();

    assert_eq!((saved, rejected), (1, 1));
    assert_eq!(service.find_all_flights().await.unwrap().len(), 1);
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn test_from_default_config() {
    let service = AirportService::from_config(&Config::default()).await.unwrap();
    assert_eq!(service.transactions().namespaces().flights.to_string(), "airport.flight");

    let plane = service.save_plane("A220").await.unwrap();
    let saved = service.save_flight(flight(8, 10, &plane)).await.unwrap();
    assert_eq!(service.find_all_flights().await.unwrap(), vec![saved]);
}
