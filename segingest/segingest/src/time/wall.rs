use segingest_core::Value;

use crate::{
    decoders::{ChannelDecoders, DecoderRegistry},
    reader::EventLog,
};

/// Reads the recorder's wall-clock time from an early bookkeeping event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallClockProbe {
    pub topic: String,
    /// Integer field with wall-clock Unix time in nanoseconds.
    pub field: String,
    /// Only this many leading events are inspected.
    pub window: usize,
}

impl Default for WallClockProbe {
    fn default() -> Self {
        Self {
            topic: "initData".to_string(),
            field: "wallTimeNanos".to_string(),
            window: 100,
        }
    }
}

impl WallClockProbe {
    /// `wall_time - log_time` of the first matching event, in nanoseconds.
    pub fn offset(&self, log: &EventLog<'_>, registry: &DecoderRegistry) -> Option<i64> {
        let mut decoders = ChannelDecoders::new(registry);
        for event in log.events().iter().take(self.window) {
            if event.topic() != self.topic {
                continue;
            }
            let decoder = decoders.get(&event.channel)?;
            let value = match decoder.decode(&event.data) {
                Ok(value) => value,
                Err(e) => {
                    log::debug!("undecodable {} event: {e}", self.topic);
                    continue;
                }
            };
            let wall = value
                .field(decoder.field_defs(), &self.field)
                .and_then(|v| Value::try_i64(v).ok().flatten());
            if let Some(wall) = wall {
                return offset_between(wall, event.log_time);
            }
        }
        None
    }
}

fn offset_between(wall: i64, log_time: u64) -> Option<i64> {
    wall.checked_sub(i64::try_from(log_time).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_wall_minus_log_time() {
        assert_eq!(offset_between(1_000, 400), Some(600));
        assert_eq!(offset_between(0, 400), Some(-400));
    }

    #[test]
    fn out_of_range_times_give_no_offset() {
        assert_eq!(offset_between(i64::MIN, 5), None);
        assert_eq!(offset_between(0, u64::MAX), None);
    }
}
