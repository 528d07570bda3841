use std::time::{Duration, Instant};

/// Measures the time between frames and optionally caps the framerate.
#[derive(Debug)]
pub struct TimeTracker {
    last_frame: Instant,
    min_frame_time: Option<Duration>,
    delta_time: f32,
    framerate: f32,
}

impl TimeTracker {
    pub fn new(max_framerate: Option<u32>) -> Self {
        Self {
            last_frame: Instant::now(),
            min_frame_time: Self::frame_time(max_framerate),
            delta_time: 0.0,
            framerate: 0.0,
        }
    }

    fn frame_time(max_framerate: Option<u32>) -> Option<Duration> {
        max_framerate
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
    }

    /// `None` or zero uncaps the framerate.
    pub fn set_max_framerate(&mut self, max_framerate: Option<u32>) {
        self.min_frame_time = Self::frame_time(max_framerate);
    }

    /// Closes the current frame, sleeping first if the framerate cap would be
    /// exceeded. Returns the seconds since the previous call.
    pub fn tick(&mut self) -> f32 {
        if let Some(min_frame_time) = self.min_frame_time {
            let elapsed = self.last_frame.elapsed();
            if elapsed < min_frame_time {
                std::thread::sleep(min_frame_time - elapsed);
            }
        }
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.framerate = if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        };
        self.delta_time
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn framerate(&self) -> f32 {
        self.framerate
    }
}

impl Default for TimeTracker {
    fn default() -> Self {
        Self::new(None)
    }
}

#[test]
fn test_capped_frame_takes_at_least_frame_time() {
    let mut time = TimeTracker::new(Some(100));
    let delta_time = time.tick();
    assert!(delta_time >= 0.0099, "delta_time={delta_time}");
    assert!(time.framerate() <= 101.0);
    assert_eq!(time.delta_time(), delta_time);
}

#[test]
fn test_uncapped_frame_does_not_sleep() {
    let mut time = TimeTracker::default();
    time.set_max_framerate(Some(0));
    assert!(time.tick() < 0.5);
}
