//! Concurrent access to the service and the record store.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use users_info::contract::model::{NewUser, UserUpdate};
use users_info::domain::error::DomainError;
use users_info::domain::service::{Service, ServiceConfig};
use users_info::infra::storage::MemoryUsersRepository;

const THREADS: usize = 8;
const PER_THREAD: usize = 25;

fn create_test_service() -> Arc<Service> {
    Arc::new(Service::new(
        Arc::new(MemoryUsersRepository::new()),
        ServiceConfig::default(),
    ))
}

#[test]
fn concurrent_creates_get_distinct_contiguous_ids() {
    let svc = create_test_service();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let svc = svc.clone();
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|i| {
                        svc.create_user(NewUser::new(
                            format!("user-{t}-{i}"),
                            format!("u{t}.{i}@x.com"),
                        ))
                        .expect("unique email must be accepted")
                        .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: HashSet<i64> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("worker panicked"))
        .collect();

    let total = (THREADS * PER_THREAD) as i64;
    assert_eq!(ids.len() as i64, total);
    assert_eq!(ids, (1..=total).collect::<HashSet<_>>());
    assert_eq!(svc.list_users().unwrap().len() as i64, total);
}

#[test]
fn concurrent_creates_with_same_email_admit_exactly_one() {
    let svc = create_test_service();

    let results: Vec<_> = thread::scope(|s| {
        let workers: Vec<_> = (0..THREADS)
            .map(|t| {
                let svc = &svc;
                s.spawn(move || svc.create_user(NewUser::new(format!("racer-{t}"), "same@x.com")))
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().expect("worker panicked"))
            .collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, DomainError::DuplicateEmail { .. })));
    assert_eq!(svc.list_users().unwrap().len(), 1);
}

#[test]
fn concurrent_updates_to_same_email_admit_exactly_one() {
    let svc = create_test_service();
    let ids: Vec<i64> = (0..THREADS)
        .map(|t| {
            svc.create_user(NewUser::new(format!("u{t}"), format!("u{t}@x.com")))
                .unwrap()
                .id
        })
        .collect();

    let results: Vec<_> = thread::scope(|s| {
        let workers: Vec<_> = ids
            .iter()
            .map(|&id| {
                let svc = &svc;
                s.spawn(move || svc.update_user(id, UserUpdate::new("taker", "wanted@x.com")))
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().expect("worker panicked"))
            .collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let holders = svc
        .list_users()
        .unwrap()
        .into_iter()
        .filter(|u| u.email == "wanted@x.com")
        .count();
    assert_eq!(holders, 1);
}

#[test]
fn readers_run_alongside_writers() {
    let svc = create_test_service();
    let seed_id = svc
        .create_user(NewUser::new("seed", "seed@x.com"))
        .unwrap()
        .id;

    thread::scope(|s| {
        for t in 0..THREADS {
            let svc = &svc;
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    if t % 2 == 0 {
                        svc.create_user(NewUser::new("w", format!("w{t}.{i}@x.com")))
                            .unwrap();
                    } else {
                        assert_eq!(svc.get_user(seed_id).unwrap().id, seed_id);
                        assert!(!svc.list_users().unwrap().is_empty());
                    }
                }
            });
        }
    });

    let writers = THREADS.div_ceil(2);
    assert_eq!(svc.list_users().unwrap().len(), 1 + writers * PER_THREAD);
}
