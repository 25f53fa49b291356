//! Bounded in-memory audit trail of forwarded requests.

use crate::{
    config::AuditConfig,
    models::{AuditEntry, AuditRecord, AuditStats},
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

struct AuditBuffer {
    entries: VecDeque<AuditEntry>,
    next_sequence: u64,
}

/// Fixed-capacity, append-only audit log
///
/// Appends, evictions and reads all happen under one lock, so readers never
/// observe a partially appended or partially evicted buffer.
pub struct AuditLog {
    capacity: usize,
    buffer: Mutex<AuditBuffer>,
}

impl AuditLog {
    /// Create a log retaining at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buffer: Mutex::new(AuditBuffer {
                entries: VecDeque::with_capacity(capacity.min(1024)),
                next_sequence: 1,
            }),
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stamp the record with the next sequence id and append it, evicting
    /// the oldest entry when full
    pub fn record(&self, record: AuditRecord) -> AuditEntry {
        let entry = {
            let mut buffer = self.buffer.lock();
            let entry = AuditEntry::from_record(buffer.next_sequence, record);
            buffer.next_sequence += 1;
            if buffer.entries.len() == self.capacity {
                buffer.entries.pop_front();
            }
            buffer.entries.push_back(entry.clone());
            entry
        };
        entry.log();
        entry
    }

    /// Up to `limit` most recent entries, oldest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let buffer = self.buffer.lock();
        let skip = buffer.entries.len().saturating_sub(limit);
        buffer.entries.iter().skip(skip).cloned().collect()
    }

    /// Up to `limit` most recent entries for one partner, oldest first
    pub fn by_partner(&self, partner_id: &str, limit: usize) -> Vec<AuditEntry> {
        let buffer = self.buffer.lock();
        let mut matching: Vec<AuditEntry> = buffer
            .entries
            .iter()
            .rev()
            .filter(|entry| entry.partner_id == partner_id)
            .take(limit)
            .cloned()
            .collect();
        matching.reverse();
        matching
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate counts and mean latency over the retained entries
    pub fn stats(&self) -> AuditStats {
        let buffer = self.buffer.lock();
        if buffer.entries.is_empty() {
            return AuditStats::default();
        }

        let mut requests_by_service: HashMap<String, usize> = HashMap::new();
        let mut requests_by_partner: HashMap<String, usize> = HashMap::new();
        let mut error_count = 0;
        let mut total_time = 0.0;

        for entry in &buffer.entries {
            *requests_by_service
                .entry(entry.service.to_string())
                .or_default() += 1;
            *requests_by_partner
                .entry(entry.partner_name.clone())
                .or_default() += 1;
            if entry.is_error() {
                error_count += 1;
            }
            total_time += entry.response_time_ms;
        }

        let total_requests = buffer.entries.len();
        let avg = total_time / total_requests as f64;

        AuditStats {
            total_requests,
            requests_by_service,
            requests_by_partner,
            error_count,
            avg_response_time_ms: (avg * 100.0).round() / 100.0,
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::from_config(&AuditConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Service;
    use std::{sync::Arc, thread};

    fn record(partner: &str, service: Service, status: u16, ms: f64) -> AuditRecord {
        AuditRecord::new(
            partner,
            format!("{partner} Inc."),
            "GET",
            service.as_str(),
            service,
            status,
            ms,
        )
    }

    #[test]
    fn test_sequence_ids_start_at_one() {
        let log = AuditLog::new(10);
        let first = log.record(record("a", Service::Posts, 200, 1.0));
        let second = log.record(record("a", Service::Posts, 200, 1.0));
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(first.display_id(), "req-00000001");
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let capacity = 5;
        let log = AuditLog::new(capacity);
        for _ in 0..=capacity {
            log.record(record("a", Service::Users, 200, 1.0));
        }

        assert_eq!(log.len(), capacity);
        let retained = log.recent(usize::MAX);
        assert_eq!(retained.first().unwrap().sequence, 2);
        assert_eq!(retained.last().unwrap().sequence, 6);
        assert!(retained.iter().all(|e| e.sequence != 1));
    }

    #[test]
    fn test_recent_returns_tail_oldest_first() {
        let log = AuditLog::new(100);
        for _ in 0..10 {
            log.record(record("a", Service::Posts, 200, 1.0));
        }
        let tail: Vec<u64> = log.recent(3).iter().map(|e| e.sequence).collect();
        assert_eq!(tail, vec![8, 9, 10]);
        assert!(log.recent(0).is_empty());
        assert_eq!(log.recent(1000).len(), 10);
    }

    #[test]
    fn test_by_partner_filters_before_limiting() {
        let log = AuditLog::new(100);
        for i in 0..6 {
            let partner = if i % 2 == 0 { "even" } else { "odd" };
            log.record(record(partner, Service::Posts, 200, 1.0));
        }
        let odd: Vec<u64> = log.by_partner("odd", 2).iter().map(|e| e.sequence).collect();
        assert_eq!(odd, vec![4, 6]);
        assert!(log.by_partner("nobody", 10).is_empty());
    }

    #[test]
    fn test_stats_on_empty_log() {
        let stats = AuditLog::new(10).stats();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.error_count, 0);
        assert_eq!(stats.avg_response_time_ms, 0.0);
        assert!(stats.requests_by_service.is_empty());
    }

    #[test]
    fn test_stats_aggregates() {
        let log = AuditLog::new(100);
        log.record(record("a", Service::Posts, 200, 10.0));
        log.record(record("a", Service::Users, 404, 20.0));
        log.record(record("b", Service::Posts, 504, 30.005));

        let stats = log.stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.requests_by_service["posts"], 2);
        assert_eq!(stats.requests_by_service["users"], 1);
        assert_eq!(stats.requests_by_partner["a Inc."], 2);
        assert_eq!(stats.requests_by_partner["b Inc."], 1);
        assert_eq!(stats.error_count, 2);
        assert_eq!(stats.avg_response_time_ms, 20.0);
    }

    #[test]
    fn test_concurrent_appends_keep_unique_sequences() {
        let log = Arc::new(AuditLog::new(1000));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for _ in 0..50 {
                        log.record(record("a", Service::Todos, 200, 1.0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = log.recent(usize::MAX);
        assert_eq!(entries.len(), 200);
        assert!(entries.windows(2).all(|w| w[0].sequence + 1 == w[1].sequence));
        assert_eq!(log.stats().total_requests, 200);
    }
}
