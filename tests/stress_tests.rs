//! Stress tests for shared loggers
//!
//! These tests verify:
//! - Concurrent first calls open exactly one connection
//! - No record is lost or duplicated under contention
//! - A failed first connection is retried by a later call

use rust_amqp_logger::prelude::*;
use rust_amqp_logger::transport::MemoryBroker;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 250;

fn lazy_queue(broker: &MemoryBroker) -> Arc<QueueLogger> {
    let logger = LoggerBuilder::new()
        .broker(Arc::new(broker.clone()))
        .connect_immediately(false)
        .source("stress")
        .queue("logs")
        .expect("Failed to build logger");
    Arc::new(logger)
}

/// Threads racing on the first call must share a single connection
#[test]
fn test_concurrent_first_calls_connect_once() {
    let broker = MemoryBroker::new();
    let logger = lazy_queue(&broker);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    let ctx = LogContext::new()
                        .with_field("thread", t as i64)
                        .with_field("seq", i as i64);
                    logger.info(&format!("t{}-{}", t, i), &ctx).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(broker.connect_attempts(), 1);
    assert_eq!(logger.metrics().connections_opened(), 1);
    assert_eq!(logger.metrics().published(), (THREADS * PER_THREAD) as u64);
    assert_eq!(broker.queue_len("logs"), THREADS * PER_THREAD);
}

/// Every record arrives exactly once and intact
#[test]
fn test_no_records_lost_or_duplicated() {
    let broker = MemoryBroker::new();
    let logger = lazy_queue(&broker);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let level = LogLevel::ALL[i % LogLevel::ALL.len()];
                    logger
                        .log(level, &format!("t{}-{}", t, i), &LogContext::new())
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut seen = HashSet::new();
    for message in broker.drain("logs") {
        assert!(message.persistent);
        let record = message.record().expect("Corrupted record");
        assert_eq!(record.source.as_deref(), Some("stress"));
        assert!(record.message.starts_with("stress: t"));
        assert!(seen.insert(record.message), "duplicate record");
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
}

/// Fanout publishes from many threads reach every subscriber
#[test]
fn test_concurrent_fanout_to_subscribers() {
    let broker = MemoryBroker::new();
    let logger = Arc::new(
        LoggerBuilder::new()
            .broker(Arc::new(broker.clone()))
            .exchange("events")
            .expect("Failed to build logger"),
    );
    let subscribers: Vec<String> = (0..3)
        .map(|_| broker.subscribe("events").unwrap())
        .collect();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.debug(&format!("t{}-{}", t, i), &LogContext::new()).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for queue in &subscribers {
        assert_eq!(broker.queue_len(queue), THREADS * PER_THREAD);
    }
    assert_eq!(broker.connect_attempts(), 1);
    assert_eq!(broker.dropped_count(), 0);
}

/// A failed first connection does not poison the logger
#[test]
fn test_failed_connect_is_retried_by_next_call() {
    let broker = MemoryBroker::new();
    broker.set_unreachable(true);
    let logger = lazy_queue(&broker);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || logger.info("refused", &LogContext::new()))
        })
        .collect();

    for handle in handles {
        let err = handle.join().unwrap().unwrap_err();
        assert!(matches!(err, LoggerError::Connection { .. }));
    }
    assert_eq!(broker.connect_attempts(), THREADS as u64);
    assert!(!logger.is_connected());

    broker.set_unreachable(false);
    logger.info("accepted", &LogContext::new()).unwrap();

    assert_eq!(broker.connect_attempts(), THREADS as u64 + 1);
    assert_eq!(broker.queue_len("logs"), 1);
}
