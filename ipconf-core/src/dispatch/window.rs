use crate::dispatch::Stat;

/// Number of samples kept per endpoint.
pub const WINDOW_SIZE: usize = 5;

/// Fixed-capacity ring of the most recent raw samples for one endpoint.
///
/// A running sum is kept alongside the ring so averaging is O(1). Not synchronized: exactly
/// one task mutates a given window.
#[derive(Debug, Default)]
pub struct StatWindow {
    slots: [Option<Stat>; WINDOW_SIZE],
    sum: Stat,
    next: u64,
}

impl StatWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a sample, evicting the oldest one once the ring is full.
    pub fn append(&mut self, sample: Stat) {
        let slot = (self.next % WINDOW_SIZE as u64) as usize;

        // The outgoing sample leaves the sum before the incoming one joins it.
        self.sum.sub(self.slots[slot].as_ref());
        self.slots[slot] = Some(sample);
        self.sum.add(Some(&sample));

        self.next += 1;
    }

    /// Average over the window. Empty slots count as zero, so the divisor is always
    /// `WINDOW_SIZE`.
    pub fn snapshot(&self) -> Stat {
        let mut avg = self.sum;
        avg.avg(WINDOW_SIZE as f64);
        avg
    }

    /// Total samples appended over the window's lifetime.
    pub fn appended(&self) -> u64 {
        self.next
    }
}
