/// Counts idle ticks and fires once every `threshold` ticks.
#[derive(Debug, Clone)]
pub struct Debounce {
    ticks: u32,
    threshold: u32,
}

impl Debounce {
    /// A threshold of zero behaves like one (fire on every tick).
    pub fn new(threshold: u32) -> Self {
        Self {
            ticks: 0,
            threshold: threshold.max(1),
        }
    }

    /// Count one tick. Returns `true` and resets when the threshold is reached.
    pub fn tick(&mut self) -> bool {
        self.ticks += 1;
        if self.ticks >= self.threshold {
            self.ticks = 0;
            true
        } else {
            false
        }
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}
