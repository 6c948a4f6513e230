/// Bytes per GiB.
const GIB: f64 = (1u64 << 30) as f64;

/// Remaining capacity reported by one gateway endpoint.
///
/// Both fields are *spare* resources (total minus used), not usage. Gateways join the pool
/// with different hardware, so ranking on what is left is fairer than ranking on load.
/// Arithmetic between two `Stat`s only makes sense for samples of the same endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stat {
    /// Spare long-lived connection slots.
    pub spare_connections: f64,

    /// Spare bandwidth in bytes per second.
    pub spare_bandwidth_bytes: f64,
}

impl Stat {
    pub fn new(spare_connections: f64, spare_bandwidth_bytes: f64) -> Self {
        Self {
            spare_connections,
            spare_bandwidth_bytes,
        }
    }

    /// Accumulate `other` in place. An absent sample is a no-op.
    pub fn add(&mut self, other: Option<&Stat>) {
        let Some(other) = other else {
            return;
        };
        self.spare_connections += other.spare_connections;
        self.spare_bandwidth_bytes += other.spare_bandwidth_bytes;
    }

    /// Remove `other` in place. An absent sample is a no-op.
    pub fn sub(&mut self, other: Option<&Stat>) {
        let Some(other) = other else {
            return;
        };
        self.spare_connections -= other.spare_connections;
        self.spare_bandwidth_bytes -= other.spare_bandwidth_bytes;
    }

    /// Divide both fields by `n` in place.
    pub fn avg(&mut self, n: f64) {
        self.spare_connections /= n;
        self.spare_bandwidth_bytes /= n;
    }

    /// Dynamic ranking signal: spare bandwidth in GiB, two decimals.
    pub fn active_score(&self) -> f64 {
        round_half_up(self.spare_bandwidth_bytes / GIB)
    }

    /// Stable tie-breaker: spare connections as-is.
    pub fn static_score(&self) -> f64 {
        self.spare_connections
    }
}

/// Round to two decimal places, halves going up.
fn round_half_up(value: f64) -> f64 {
    (value * 100.0 + 0.5).trunc() / 100.0
}

#[cfg(test)]
mod unit {
    use super::round_half_up;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_half_up(3.1415), 3.14);
        assert_eq!(round_half_up(3.1465), 3.15);
        assert_eq!(round_half_up(0.0), 0.0);
    }
}
