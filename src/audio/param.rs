/// Lowest target an exponential ramp may approach. Exponential curves can
/// never reach zero, so targets are clamped here.
pub const EXP_FLOOR: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Automation {
    /// Jump to `value` at `time`.
    Set { time: f64, value: f32 },
    /// Straight line from the previous event, arriving at `value` at `time`.
    Linear { time: f64, value: f32 },
    /// Multiplicative curve from the previous event, arriving at `value` at `time`.
    Exponential { time: f64, value: f32 },
}

impl Automation {
    pub fn time(&self) -> f64 {
        match *self {
            Automation::Set { time, .. }
            | Automation::Linear { time, .. }
            | Automation::Exponential { time, .. } => time,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            Automation::Set { value, .. }
            | Automation::Linear { value, .. }
            | Automation::Exponential { value, .. } => value,
        }
    }
}

/// A parameter whose value is a function of audio-clock time, described by a
/// time-ordered list of automation events.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioParam {
    default: f32,
    events: Vec<Automation>,
}

impl AudioParam {
    pub fn new(default: f32) -> Self {
        Self {
            default,
            events: Vec::new(),
        }
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(Automation::Set { time, value })
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(Automation::Linear { time, value })
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(Automation::Exponential {
            time,
            value: value.max(EXP_FLOOR),
        })
    }

    pub fn events(&self) -> &[Automation] {
        &self.events
    }

    /// Time the last scheduled event completes, if any.
    pub fn end_time(&self) -> Option<f64> {
        self.events.last().map(Automation::time)
    }

    pub fn value_at(&self, t: f64) -> f32 {
        let mut prev_time = f64::NEG_INFINITY;
        let mut prev_value = self.default;

        for event in &self.events {
            if event.time() <= t {
                prev_time = event.time();
                prev_value = event.value();
                continue;
            }

            // `t` falls before this event: hold or interpolate towards it.
            if prev_time == f64::NEG_INFINITY {
                return prev_value;
            }
            let span = event.time() - prev_time;
            let progress = ((t - prev_time) / span) as f32;
            return match *event {
                Automation::Set { .. } => prev_value,
                Automation::Linear { value, .. } => prev_value + (value - prev_value) * progress,
                Automation::Exponential { value, .. } => {
                    if prev_value <= 0.0 {
                        prev_value
                    } else {
                        prev_value * (value / prev_value).powf(progress)
                    }
                }
            };
        }

        prev_value
    }

    fn insert(&mut self, event: Automation) -> &mut Self {
        let idx = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(idx, event);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_before_any_event() {
        let mut param = AudioParam::new(1.0);
        assert_eq!(param.value_at(3.0), 1.0);
        param.set_value_at_time(0.3, 1.0);
        assert_eq!(param.value_at(0.5), 1.0);
        assert_eq!(param.value_at(1.0), 0.3);
        assert_eq!(param.value_at(10.0), 0.3);
    }

    #[test]
    fn test_linear_ramp() {
        let mut param = AudioParam::new(0.0);
        param
            .set_value_at_time(0.0, 1.0)
            .linear_ramp_to_value_at_time(0.3, 1.1);
        assert_relative_eq!(param.value_at(1.05), 0.15, epsilon = 1e-5);
        assert_relative_eq!(param.value_at(1.1), 0.3);
    }

    #[test]
    fn test_exponential_ramp_is_geometric() {
        let mut param = AudioParam::new(0.0);
        param
            .set_value_at_time(1.0, 0.0)
            .exponential_ramp_to_value_at_time(0.01, 2.0);
        assert_relative_eq!(param.value_at(1.0), 0.1, epsilon = 1e-5);
        assert_relative_eq!(param.value_at(2.0), 0.01);
        assert_relative_eq!(param.value_at(5.0), 0.01);
    }

    #[test]
    fn test_exponential_target_is_floored() {
        let mut param = AudioParam::new(0.0);
        param
            .set_value_at_time(0.3, 0.0)
            .exponential_ramp_to_value_at_time(0.0, 1.0);
        assert_eq!(param.end_time(), Some(1.0));
        assert_eq!(param.events()[1].value(), EXP_FLOOR);
        assert!(param.value_at(0.999) > 0.0);
    }

    #[test]
    fn test_exponential_from_zero_holds() {
        let mut param = AudioParam::new(0.0);
        param
            .set_value_at_time(0.0, 0.0)
            .exponential_ramp_to_value_at_time(0.5, 1.0);
        assert_eq!(param.value_at(0.5), 0.0);
        assert_eq!(param.value_at(1.0), 0.5);
    }

    #[test]
    fn test_events_kept_in_time_order() {
        let mut param = AudioParam::new(0.0);
        param
            .exponential_ramp_to_value_at_time(0.01, 2.0)
            .set_value_at_time(0.4, 1.0);
        let times: Vec<f64> = param.events().iter().map(Automation::time).collect();
        assert_eq!(times, vec![1.0, 2.0]);
    }
}
