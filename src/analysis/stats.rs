use crate::error::InvalidVisitorId;
use crate::format::{KeyOrder, format_counts};
use crate::shard::{compute_shard, starting_letter};
use crate::tracking::Request;
use md5::{Digest, Md5};
use std::collections::HashMap;

/// Where a request's identity came from, by priority.
///
/// Purely informational: it is tallied next to, not instead of, the
/// sharding-key source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdSource {
    ForcedUserId,
    ForcedVisitorId,
    ExplicitIdParam,
}

/// Checked in order; the first match wins.
const ID_SOURCES: [(IdSource, fn(&Request) -> bool); 3] = [
    (IdSource::ForcedUserId, has_forced_user_id),
    (IdSource::ForcedVisitorId, has_forced_visitor_id),
    (IdSource::ExplicitIdParam, has_explicit_id),
];

fn has_forced_user_id(request: &Request) -> bool {
    request.forced_user_id().is_some()
}

fn has_forced_visitor_id(request: &Request) -> bool {
    request.forced_visitor_id().is_some()
}

fn has_explicit_id(request: &Request) -> bool {
    request.explicit_visitor_id().is_some()
}

pub fn classify(request: &Request) -> Option<IdSource> {
    ID_SOURCES
        .iter()
        .find(|(_, matches)| matches(request))
        .map(|(source, _)| *source)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySource {
    VisitorId,
    Ip,
}

/// The hex string a request is sharded by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardingKey {
    pub source: KeySource,
    pub value: String,
    /// Set when a visitor id was present but unusable
    pub invalid: Option<InvalidVisitorId>,
}

impl ShardingKey {
    /// Hex visitor id when one can be derived, else the MD5 of the client IP.
    pub fn for_request(request: &Request) -> Self {
        let (visitor_id, invalid) = match request.visitor_id() {
            Ok(id) => (id, None),
            Err(e) => (None, Some(e)),
        };

        match visitor_id {
            Some(bytes) if !bytes.is_empty() => ShardingKey {
                source: KeySource::VisitorId,
                value: hex::encode(bytes),
                invalid,
            },
            _ => ShardingKey {
                source: KeySource::Ip,
                value: hex::encode(Md5::digest(request.ip_string().as_bytes())),
                invalid,
            },
        }
    }
}

/// Counters accumulated over one scan of the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributionStats {
    pub forced_user_id: u64,
    pub forced_visitor_id: u64,
    pub explicit_id_param: u64,
    pub invalid_requests: u64,
    pub use_visitor_id_for_sharding: u64,
    pub use_ip_for_sharding: u64,
    pub request_sets_with_one_request: u64,
    pub request_sets_with_multiple_requests: u64,
    pub relocated_requests: u64,
    /// Requests per shard where they currently sit
    pub old_distribution: Vec<u64>,
    /// Requests per shard under the current mapping
    pub new_distribution: Vec<u64>,
    pub starting_letters: HashMap<char, u64>,
}

impl DistributionStats {
    pub fn new(shard_count: usize) -> Self {
        DistributionStats {
            forced_user_id: 0,
            forced_visitor_id: 0,
            explicit_id_param: 0,
            invalid_requests: 0,
            use_visitor_id_for_sharding: 0,
            use_ip_for_sharding: 0,
            request_sets_with_one_request: 0,
            request_sets_with_multiple_requests: 0,
            relocated_requests: 0,
            old_distribution: vec![0; shard_count],
            new_distribution: vec![0; shard_count],
            starting_letters: HashMap::new(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.old_distribution.len()
    }

    pub fn record_request_set(&mut self, request_count: usize) {
        if request_count <= 1 {
            self.request_sets_with_one_request += 1;
        } else {
            self.request_sets_with_multiple_requests += 1;
        }
    }

    pub fn record_id_source(&mut self, source: Option<IdSource>) {
        match source {
            Some(IdSource::ForcedUserId) => self.forced_user_id += 1,
            Some(IdSource::ForcedVisitorId) => self.forced_visitor_id += 1,
            Some(IdSource::ExplicitIdParam) => self.explicit_id_param += 1,
            None => {}
        }
    }

    pub fn record_invalid(&mut self) {
        self.invalid_requests += 1;
    }

    /// Tally the sharding key of a request found in shard `found_in`.
    /// Returns the shard the key maps to now.
    pub fn record_assignment(&mut self, found_in: usize, key: &ShardingKey) -> usize {
        if key.invalid.is_some() {
            self.record_invalid();
        }
        match key.source {
            KeySource::VisitorId => self.use_visitor_id_for_sharding += 1,
            KeySource::Ip => self.use_ip_for_sharding += 1,
        }

        if let Some(letter) = starting_letter(&key.value) {
            *self.starting_letters.entry(letter).or_insert(0) += 1;
        }

        let target = compute_shard(&key.value, self.shard_count());
        self.old_distribution[found_in] += 1;
        self.new_distribution[target] += 1;
        if target != found_in {
            self.relocated_requests += 1;
        }
        target
    }

    /// Running counters, in display order.
    pub fn counters(&self) -> [(&'static str, u64); 8] {
        [
            ("forcedUserId", self.forced_user_id),
            ("forcedVisitorId", self.forced_visitor_id),
            ("explicitIdParam", self.explicit_id_param),
            ("invalidRequests", self.invalid_requests),
            ("useVisitorIdForSharding", self.use_visitor_id_for_sharding),
            ("useIPForSharding", self.use_ip_for_sharding),
            (
                "requestSetsWithMultipleRequests",
                self.request_sets_with_multiple_requests,
            ),
            ("requestSetsWithOneRequest", self.request_sets_with_one_request),
        ]
    }

    pub fn counters_readable(&self) -> String {
        format_counts(self.counters(), KeyOrder::Insertion).join(", ")
    }

    pub fn starting_letters_readable(&self) -> String {
        format_counts(self.starting_letters.iter(), KeyOrder::Sorted).join(", ")
    }

    /// Requests that produced a sharding key.
    pub fn total_requests(&self) -> u64 {
        self.old_distribution.iter().sum()
    }

    /// Request sets that decoded successfully.
    pub fn total_request_sets(&self) -> u64 {
        self.request_sets_with_one_request + self.request_sets_with_multiple_requests
    }
}
