/// Simulated network trouble for unreliable deliveries
#[derive(Clone, Debug, PartialEq)]
pub struct LinkConditionerConfig {
    /// Chance in `[0, 1]` that an unreliable packet is dropped
    pub loss: f32,
    /// Chance in `[0, 1]` that an unreliable packet is delivered twice
    pub duplicate: f32,
}

impl LinkConditionerConfig {
    pub fn new(loss: f32, duplicate: f32) -> Self {
        Self {
            loss: loss.clamp(0.0, 1.0),
            duplicate: duplicate.clamp(0.0, 1.0),
        }
    }

    pub fn perfect_condition() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn average_condition() -> Self {
        Self::new(0.02, 0.01)
    }

    pub fn poor_condition() -> Self {
        Self::new(0.1, 0.05)
    }

    pub(crate) fn should_drop(&self) -> bool {
        self.loss > 0.0 && fastrand::f32() < self.loss
    }

    pub(crate) fn should_duplicate(&self) -> bool {
        self.duplicate > 0.0 && fastrand::f32() < self.duplicate
    }
}

impl Default for LinkConditionerConfig {
    fn default() -> Self {
        Self::perfect_condition()
    }
}
