//! Test utilities for the event core

#[cfg(feature = "test-utils")]
pub mod edge_simulator {
    //! Edge sequence simulation against the mock SoC

    use crate::hal::mock::MockSoc;
    use crate::types::Level;
    use crate::watcher::{EdgeEvent, EdgeWatcher, PinWatch};
    use heapless::Vec;

    /// One simulated level move on the watched pin
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EdgeStep {
        pub level: Level,
    }

    /// A sequence of level moves to play against a watcher
    #[derive(Debug, Clone)]
    pub struct EdgePattern {
        pub steps: Vec<EdgeStep, 64>,
    }

    impl EdgePattern {
        /// A single clean press for the given idle level
        pub fn press(idle: Level) -> Self {
            let active = opposite(idle);
            let mut steps = Vec::new();
            steps.push(EdgeStep { level: active }).ok();
            steps.push(EdgeStep { level: idle }).ok();
            Self { steps }
        }

        /// A press whose contact bounces `bounces` extra times before
        /// settling. Every qualifying electrical edge counts.
        pub fn bouncing_press(idle: Level, bounces: usize) -> Self {
            let active = opposite(idle);
            let mut steps = Vec::new();
            for _ in 0..=bounces {
                steps.push(EdgeStep { level: active }).ok();
                steps.push(EdgeStep { level: idle }).ok();
            }
            Self { steps }
        }

        /// An arbitrary level train
        pub fn train(levels: &[Level]) -> Self {
            let mut steps = Vec::new();
            for &level in levels {
                steps.push(EdgeStep { level }).ok();
            }
            Self { steps }
        }
    }

    fn opposite(level: Level) -> Level {
        match level {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    /// Play a pattern against an armed watcher, servicing the handler
    /// whenever the mock reports a vectored interrupt, exactly as the
    /// hardware dispatch would. Returns the serviced events in order.
    pub fn run_pattern(
        watcher: &mut EdgeWatcher<MockSoc>,
        watch: &PinWatch,
        pattern: &EdgePattern,
    ) -> Vec<EdgeEvent, 64> {
        let mut events = Vec::new();
        for step in &pattern.steps {
            if watcher.hardware().drive(watch.pin(), step.level) {
                events.push(watcher.service(watch)).ok();
            }
        }
        events
    }
}
