//! Lossy link simulation
//!
//! Simulates a bad local network between a broadcast sender and a receiver:
//! - Jitter
//! - Loss, including bursts
//! - Reordering
//! - Duplication
//! - Damaged datagrams (byte corruption, truncation)
//!
//! Damage is always detectable: a corrupted byte is replaced with one that
//! can never appear in a frame, and truncation removes at least one whole
//! field.

use std::collections::VecDeque;
use std::time::Duration;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bytes that never occur in an encoded frame
const POISON_BYTES: [u8; 4] = [b'#', b';', 0x00, 0xFF];

/// Jitter distribution type
#[derive(Clone, Debug)]
pub enum JitterDistribution {
    /// Uniform distribution
    Uniform { min_ms: u32, max_ms: u32 },
    /// Pareto distribution (heavy tail)
    Pareto { scale_ms: f64, shape: f64 },
}

impl JitterDistribution {
    pub fn sample(&self, rng: &mut StdRng) -> Duration {
        match self {
            JitterDistribution::Uniform { min_ms, max_ms } => {
                if max_ms <= min_ms {
                    return Duration::from_millis(*min_ms as u64);
                }
                let dist = Uniform::new(*min_ms, *max_ms);
                Duration::from_millis(dist.sample(rng) as u64)
            }
            JitterDistribution::Pareto { scale_ms, shape } => {
                // Keep u away from zero so the tail stays bounded
                let u: f64 = rng.gen_range(1e-6..1.0);
                let value = scale_ms / u.powf(1.0 / shape);
                Duration::from_millis(value.min(500.0) as u64)
            }
        }
    }
}

/// Link conditions
#[derive(Clone, Debug)]
pub struct ChaosConfig {
    pub base_latency: Duration,
    pub jitter: JitterDistribution,
    /// Independent loss rate (0.0 - 1.0)
    pub loss_rate: f64,
    /// Chance a send starts a loss burst
    pub burst_loss_prob: f64,
    /// Burst length range, in datagrams
    pub burst_length: (u32, u32),
    pub reorder_prob: f64,
    /// Max datagrams a reordered one may jump
    pub reorder_depth: u32,
    pub duplicate_prob: f64,
    /// Chance one byte of a delivered datagram is overwritten
    pub corrupt_prob: f64,
    /// Chance a delivered datagram loses its tail
    pub truncate_prob: f64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self::good()
    }
}

impl ChaosConfig {
    /// No impairment at all; useful as a control
    pub fn perfect() -> Self {
        ChaosConfig {
            base_latency: Duration::from_millis(1),
            jitter: JitterDistribution::Uniform { min_ms: 0, max_ms: 0 },
            loss_rate: 0.0,
            burst_loss_prob: 0.0,
            burst_length: (0, 0),
            reorder_prob: 0.0,
            reorder_depth: 0,
            duplicate_prob: 0.0,
            corrupt_prob: 0.0,
            truncate_prob: 0.0,
        }
    }

    /// Quiet wired LAN
    pub fn good() -> Self {
        ChaosConfig {
            base_latency: Duration::from_millis(1),
            jitter: JitterDistribution::Uniform { min_ms: 0, max_ms: 2 },
            loss_rate: 0.001,
            burst_loss_prob: 0.001,
            burst_length: (1, 2),
            reorder_prob: 0.001,
            reorder_depth: 1,
            duplicate_prob: 0.001,
            corrupt_prob: 0.0,
            truncate_prob: 0.0,
        }
    }

    /// Busy Wi-Fi
    pub fn poor() -> Self {
        ChaosConfig {
            base_latency: Duration::from_millis(5),
            jitter: JitterDistribution::Pareto {
                scale_ms: 3.0,
                shape: 1.5,
            },
            loss_rate: 0.05,
            burst_loss_prob: 0.02,
            burst_length: (2, 6),
            reorder_prob: 0.05,
            reorder_depth: 3,
            duplicate_prob: 0.02,
            corrupt_prob: 0.01,
            truncate_prob: 0.01,
        }
    }

    /// Everything that can go wrong, often
    pub fn hostile() -> Self {
        ChaosConfig {
            base_latency: Duration::from_millis(20),
            jitter: JitterDistribution::Pareto {
                scale_ms: 10.0,
                shape: 1.2,
            },
            loss_rate: 0.15,
            burst_loss_prob: 0.05,
            burst_length: (5, 15),
            reorder_prob: 0.2,
            reorder_depth: 8,
            duplicate_prob: 0.05,
            corrupt_prob: 0.1,
            truncate_prob: 0.1,
        }
    }
}

/// Datagram in flight
#[derive(Clone, Debug)]
struct InFlight {
    data: Vec<u8>,
    delivery_time: Duration,
    send_time: Duration,
}

/// Link statistics
#[derive(Clone, Debug, Default)]
pub struct ChaosStats {
    pub datagrams_sent: u64,
    pub datagrams_delivered: u64,
    pub datagrams_lost: u64,
    pub datagrams_reordered: u64,
    pub datagrams_duplicated: u64,
    pub datagrams_corrupted: u64,
    pub datagrams_truncated: u64,
    pub total_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl ChaosStats {
    pub fn loss_rate(&self) -> f64 {
        if self.datagrams_sent == 0 {
            0.0
        } else {
            self.datagrams_lost as f64 / self.datagrams_sent as f64
        }
    }

    pub fn avg_latency_ms(&self) -> f64 {
        if self.datagrams_delivered == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.datagrams_delivered as f64
        }
    }

    /// Delivered datagrams that arrived damaged
    pub fn damaged(&self) -> u64 {
        self.datagrams_corrupted + self.datagrams_truncated
    }
}

/// Seeded lossy link
pub struct ChaosLink {
    config: ChaosConfig,
    rng: StdRng,
    in_flight: VecDeque<InFlight>,
    current_time: Duration,
    burst_remaining: u32,
    stats: ChaosStats,
}

impl ChaosLink {
    pub fn new(config: ChaosConfig, seed: u64) -> Self {
        ChaosLink {
            config,
            rng: StdRng::seed_from_u64(seed),
            in_flight: VecDeque::new(),
            current_time: Duration::ZERO,
            burst_remaining: 0,
            stats: ChaosStats::default(),
        }
    }

    /// Put one datagram on the link
    pub fn send(&mut self, data: Vec<u8>) {
        self.stats.datagrams_sent += 1;

        if self.should_drop() {
            self.stats.datagrams_lost += 1;
            return;
        }

        let delivery_time = self.current_time + self.latency();
        let datagram = InFlight {
            data: self.damage(data),
            delivery_time,
            send_time: self.current_time,
        };

        if self.rng.gen::<f64>() < self.config.duplicate_prob {
            let mut dup = datagram.clone();
            dup.delivery_time = delivery_time + self.config.jitter.sample(&mut self.rng);
            self.schedule(dup);
            self.stats.datagrams_duplicated += 1;
        }

        if self.rng.gen::<f64>() < self.config.reorder_prob && !self.in_flight.is_empty() {
            // Deliver ahead of up to `reorder_depth` earlier datagrams
            let depth = self.config.reorder_depth.min(self.in_flight.len() as u32);
            let jump = self.rng.gen_range(0..=depth) as usize;
            let pos = self.in_flight.len().saturating_sub(jump);
            let mut datagram = datagram;
            datagram.delivery_time = self.in_flight[pos.min(self.in_flight.len() - 1)]
                .delivery_time
                .min(datagram.delivery_time);
            self.in_flight.insert(pos, datagram);
            self.stats.datagrams_reordered += 1;
        } else {
            self.schedule(datagram);
        }
    }

    fn latency(&mut self) -> Duration {
        self.config.base_latency + self.config.jitter.sample(&mut self.rng)
    }

    /// Insert keeping delivery order
    fn schedule(&mut self, datagram: InFlight) {
        let pos = self
            .in_flight
            .partition_point(|d| d.delivery_time <= datagram.delivery_time);
        self.in_flight.insert(pos, datagram);
    }

    fn should_drop(&mut self) -> bool {
        if self.burst_remaining > 0 {
            self.burst_remaining -= 1;
            return true;
        }

        if self.rng.gen::<f64>() < self.config.burst_loss_prob {
            let (min, max) = self.config.burst_length;
            self.burst_remaining = self.rng.gen_range(min..=max.max(min));
            return true;
        }

        self.rng.gen::<f64>() < self.config.loss_rate
    }

    fn damage(&mut self, mut data: Vec<u8>) -> Vec<u8> {
        if !data.is_empty() && self.rng.gen::<f64>() < self.config.corrupt_prob {
            let at = self.rng.gen_range(0..data.len());
            data[at] = POISON_BYTES[self.rng.gen_range(0..POISON_BYTES.len())];
            self.stats.datagrams_corrupted += 1;
        }

        if self.rng.gen::<f64>() < self.config.truncate_prob {
            // Cut at or before the last delimiter so a whole field goes missing
            let last_field = data.iter().rposition(|b| *b == b',').unwrap_or(0);
            let keep = self.rng.gen_range(0..=last_field);
            data.truncate(keep);
            self.stats.datagrams_truncated += 1;
        }

        data
    }

    /// Advance time and collect delivered datagrams, in arrival order
    pub fn tick(&mut self, dt: Duration) -> Vec<Vec<u8>> {
        self.current_time += dt;

        let mut delivered = Vec::new();
        while self
            .in_flight
            .front()
            .map_or(false, |d| d.delivery_time <= self.current_time)
        {
            let Some(datagram) = self.in_flight.pop_front() else {
                break;
            };
            let latency = datagram.delivery_time.saturating_sub(datagram.send_time).as_millis() as u64;

            self.stats.datagrams_delivered += 1;
            self.stats.total_latency_ms += latency;
            self.stats.max_latency_ms = self.stats.max_latency_ms.max(latency);

            delivered.push(datagram.data);
        }

        delivered
    }

    /// Deliver everything still in flight
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let remaining = self
            .in_flight
            .back()
            .map(|d| d.delivery_time.saturating_sub(self.current_time))
            .unwrap_or_default();
        let mut delivered = self.tick(remaining);
        // Reordered datagrams may sit behind a later deadline
        delivered.extend(self.in_flight.drain(..).map(|d| d.data));
        delivered
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> &ChaosStats {
        &self.stats
    }

    pub fn current_time(&self) -> Duration {
        self.current_time
    }
}
