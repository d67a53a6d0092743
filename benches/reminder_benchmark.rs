use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wayfare_core::models::{Location, Trip};
use wayfare_core::services::ReminderService;

fn benchmark_reminder_computation(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap();

    let trip = Trip {
        id: "trip1".to_string(),
        name: "Kyoto".to_string(),
        destination: Some("Japan".to_string()),
        start_date: now + Duration::days(7),
        end_date: Some(now + Duration::days(14)),
        owner_uid: "u1".to_string(),
        shared_with: Vec::new(),
        created_at: String::new(),
    };

    // 200 locations with a mix of opted-in, opted-out, and already-past
    // reminder offsets, approximating a dense itinerary.
    let locations: Vec<Location> = (0..200)
        .map(|i| Location {
            id: format!("loc{}", i),
            trip_id: trip.id.clone(),
            name: format!("Stop {}", i),
            start_date: now + Duration::hours(i - 20),
            reminder_offset_secs: match i % 3 {
                0 => Some(300),
                1 => Some(0),
                _ => None,
            },
            notes: None,
        })
        .collect();

    let mut group = c.benchmark_group("reminder_computation");

    group.bench_function("trip_milestones", |b| {
        b.iter(|| ReminderService::compute_trip_milestones(black_box(&trip), black_box(now)))
    });

    group.bench_function("dense_itinerary_locations", |b| {
        b.iter(|| {
            locations
                .iter()
                .filter_map(|loc| {
                    ReminderService::compute_location_reminder(
                        black_box(loc),
                        black_box(&trip.name),
                        black_box(now),
                    )
                })
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_reminder_computation);
criterion_main!(benches);
