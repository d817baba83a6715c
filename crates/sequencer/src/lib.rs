//! One-shot entrance reveal for the background and the content laid over it.
//!
//! Three tracks play once the first frame is on screen: the render container
//! fades in, a run of text elements slides up with a stagger, and the
//! navigation bar drops in after a fixed delay. The sequencer only computes
//! per-target opacity/offset values; applying them is up to the host.

use std::fmt;
use std::time::{Duration, Instant};

use flowconfig::{EasingSetting, EntranceConfig, MAX_TEXT_ELEMENTS};

#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("tween for {0} must have a non-zero duration")]
    ZeroDuration(TargetId),
    #[error("timing for {0} does not fit in the entrance timeline")]
    TimelineOverflow(TargetId),
    #[error("at most {max} text elements can be revealed (got {count})")]
    TooManyTextElements { count: u32, max: u32 },
}

/// Easing curves available to entrance tweens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    Smoothstep,
    /// Cubic ease-in-out.
    Power2InOut,
    /// Quartic ease-out.
    Power3Out,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => clamped,
            Easing::Smoothstep => clamped * clamped * (3.0 - 2.0 * clamped),
            Easing::Power2InOut => {
                if clamped < 0.5 {
                    4.0 * clamped * clamped * clamped
                } else {
                    let inv = 2.0 - 2.0 * clamped;
                    1.0 - inv * inv * inv / 2.0
                }
            }
            Easing::Power3Out => 1.0 - (1.0 - clamped).powi(4),
        }
    }
}

impl From<EasingSetting> for Easing {
    fn from(value: EasingSetting) -> Self {
        match value {
            EasingSetting::Linear => Easing::Linear,
            EasingSetting::Smoothstep => Easing::Smoothstep,
            EasingSetting::Power2InOut => Easing::Power2InOut,
            EasingSetting::Power3Out => Easing::Power3Out,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetId {
    Container,
    /// Text element by document order.
    Text(u32),
    Nav,
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetId::Container => f.write_str("container"),
            TargetId::Text(index) => write!(f, "text[{index}]"),
            TargetId::Nav => f.write_str("nav"),
        }
    }
}

/// Visual state of a revealed element; `offset_y` is in logical pixels, positive down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealState {
    pub opacity: f32,
    pub offset_y: f32,
}

impl RevealState {
    pub const VISIBLE: RevealState = RevealState {
        opacity: 1.0,
        offset_y: 0.0,
    };

    pub fn hidden_at(offset_y: f32) -> Self {
        Self {
            opacity: 0.0,
            offset_y,
        }
    }

    fn lerp(self, to: RevealState, t: f32) -> RevealState {
        RevealState {
            opacity: self.opacity * (1.0 - t) + to.opacity * t,
            offset_y: self.offset_y * (1.0 - t) + to.offset_y * t,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    delay: Duration,
    duration: Duration,
    from: RevealState,
    to: RevealState,
    easing: Easing,
}

impl Tween {
    pub fn new(
        target: TargetId,
        delay: Duration,
        duration: Duration,
        from: RevealState,
        to: RevealState,
        easing: Easing,
    ) -> Result<Self, SequencerError> {
        if duration.is_zero() {
            return Err(SequencerError::ZeroDuration(target));
        }
        if delay.checked_add(duration).is_none() {
            return Err(SequencerError::TimelineOverflow(target));
        }
        Ok(Self {
            delay,
            duration,
            from,
            to,
            easing,
        })
    }

    /// Linear progress through the tween, `0.0` until the delay has passed.
    pub fn progress(&self, elapsed: Duration) -> f32 {
        let active = elapsed.saturating_sub(self.delay);
        (active.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn state_at(&self, elapsed: Duration) -> RevealState {
        let eased = self.easing.sample(self.progress(elapsed));
        self.from.lerp(self.to, eased)
    }

    /// Checked in [`Tween::new`], so this cannot overflow.
    pub fn end(&self) -> Duration {
        self.delay.saturating_add(self.duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealFrame {
    pub target: TargetId,
    pub state: RevealState,
    pub finished: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EntranceSequencer {
    tracks: Vec<(TargetId, Tween)>,
    started_at: Option<Instant>,
}

impl EntranceSequencer {
    pub fn new(tracks: Vec<(TargetId, Tween)>) -> Self {
        Self {
            tracks,
            started_at: None,
        }
    }

    /// Builds the container, text, and nav tracks. A disabled entrance yields
    /// an empty sequencer, which reports everything as already visible.
    pub fn from_config(config: &EntranceConfig) -> Result<Self, SequencerError> {
        if !config.enabled {
            return Ok(Self::default());
        }

        if config.text.count > MAX_TEXT_ELEMENTS {
            return Err(SequencerError::TooManyTextElements {
                count: config.text.count,
                max: MAX_TEXT_ELEMENTS,
            });
        }

        let mut tracks = Vec::with_capacity(config.text.count as usize + 2);
        tracks.push((
            TargetId::Container,
            Tween::new(
                TargetId::Container,
                Duration::ZERO,
                config.container.duration,
                RevealState::hidden_at(0.0),
                RevealState::VISIBLE,
                config.container.ease.into(),
            )?,
        ));

        for index in 0..config.text.count {
            let target = TargetId::Text(index);
            let delay = config
                .text
                .stagger
                .checked_mul(index)
                .and_then(|offset| config.text.delay.checked_add(offset))
                .ok_or(SequencerError::TimelineOverflow(target))?;
            tracks.push((
                target,
                Tween::new(
                    target,
                    delay,
                    config.text.duration,
                    RevealState::hidden_at(config.text.offset),
                    RevealState::VISIBLE,
                    config.text.ease.into(),
                )?,
            ));
        }

        tracks.push((
            TargetId::Nav,
            Tween::new(
                TargetId::Nav,
                config.nav.delay,
                config.nav.duration,
                RevealState::hidden_at(config.nav.offset),
                RevealState::VISIBLE,
                config.nav.ease.into(),
            )?,
        ));

        Ok(Self::new(tracks))
    }

    /// Starts the clock. Returns `false` if the sequence was already running.
    pub fn begin(&mut self, now: Instant) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    pub fn has_begun(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn sample(&self, now: Instant) -> Vec<RevealFrame> {
        let elapsed = self.elapsed(now);
        self.tracks
            .iter()
            .map(|(target, tween)| match elapsed {
                Some(elapsed) => RevealFrame {
                    target: *target,
                    state: tween.state_at(elapsed),
                    finished: elapsed >= tween.end(),
                },
                None => RevealFrame {
                    target: *target,
                    state: tween.from,
                    finished: false,
                },
            })
            .collect()
    }

    pub fn container_opacity(&self, now: Instant) -> f32 {
        let Some((_, tween)) = self
            .tracks
            .iter()
            .find(|(target, _)| *target == TargetId::Container)
        else {
            return 1.0;
        };
        match self.elapsed(now) {
            Some(elapsed) => tween.state_at(elapsed).opacity,
            None => tween.from.opacity,
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.tracks
            .iter()
            .map(|(_, tween)| tween.end())
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        if self.tracks.is_empty() {
            return true;
        }
        self.elapsed(now)
            .is_some_and(|elapsed| elapsed >= self.total_duration())
    }

    fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_sequencer() -> EntranceSequencer {
        EntranceSequencer::from_config(&EntranceConfig::default()).unwrap()
    }

    #[test]
    fn curves_hit_endpoints_and_increase() {
        for easing in [
            Easing::Linear,
            Easing::Smoothstep,
            Easing::Power2InOut,
            Easing::Power3Out,
        ] {
            assert!((easing.sample(0.0) - 0.0).abs() < 1e-6, "{easing:?}");
            assert!((easing.sample(1.0) - 1.0).abs() < 1e-6, "{easing:?}");
            let mut last = 0.0;
            for step in 0..=20 {
                let sample = easing.sample(step as f32 / 20.0);
                assert!(sample >= last - f32::EPSILON, "{easing:?} at step {step}");
                last = sample;
            }
        }
    }

    #[test]
    fn ease_out_front_loads_motion() {
        assert!(Easing::Power3Out.sample(0.25) > 0.5);
        assert!(Easing::Power2InOut.sample(0.25) < 0.25);
        assert!((Easing::Power2InOut.sample(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn power_curves_follow_gsap_degrees() {
        // power2 is cubic, power3 is quartic.
        assert!((Easing::Power2InOut.sample(0.25) - 0.0625).abs() < 1e-6);
        assert!((Easing::Power2InOut.sample(0.75) - 0.9375).abs() < 1e-6);
        assert!((Easing::Power3Out.sample(0.25) - 0.683_593_75).abs() < 1e-6);
        assert!((Easing::Power3Out.sample(0.5) - 0.9375).abs() < 1e-6);
    }

    #[test]
    fn huge_stagger_is_an_error_not_a_panic() {
        let config = flowconfig::FlowConfig::from_toml_str(
            "version = 1\n[entrance.text]\ncount = 4\nstagger = 9223372036854775807",
        )
        .unwrap();
        let err = EntranceSequencer::from_config(&config.entrance).unwrap_err();
        assert!(matches!(err, SequencerError::TimelineOverflow(TargetId::Text(_))));
    }

    #[test]
    fn delay_plus_duration_overflow_is_rejected() {
        let err = Tween::new(
            TargetId::Nav,
            Duration::MAX,
            Duration::from_secs(1),
            RevealState::hidden_at(-50.0),
            RevealState::VISIBLE,
            Easing::Linear,
        )
        .unwrap_err();
        assert!(matches!(err, SequencerError::TimelineOverflow(TargetId::Nav)));
    }

    #[test]
    fn text_count_is_bounded() {
        let mut config = EntranceConfig::default();
        config.text.count = u32::MAX;
        let err = EntranceSequencer::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            SequencerError::TooManyTextElements { count: u32::MAX, .. }
        ));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let err = Tween::new(
            TargetId::Nav,
            Duration::ZERO,
            Duration::ZERO,
            RevealState::hidden_at(0.0),
            RevealState::VISIBLE,
            Easing::Linear,
        )
        .unwrap_err();
        assert!(matches!(err, SequencerError::ZeroDuration(TargetId::Nav)));
    }

    #[test]
    fn targets_hold_initial_state_before_begin() {
        let sequencer = default_sequencer();
        let now = Instant::now();
        assert_eq!(sequencer.container_opacity(now), 0.0);
        let frames = sequencer.sample(now);
        assert_eq!(frames.len(), 5);
        let first_text = frames
            .iter()
            .find(|frame| frame.target == TargetId::Text(0))
            .unwrap();
        assert_eq!(first_text.state, RevealState::hidden_at(50.0));
        assert!(!sequencer.is_finished(now + Duration::from_secs(60)));
    }

    #[test]
    fn container_fades_over_two_seconds() {
        let mut sequencer = default_sequencer();
        let start = Instant::now();
        assert!(sequencer.begin(start));
        assert!(!sequencer.begin(start + Duration::from_secs(1)));

        let halfway = sequencer.container_opacity(start + Duration::from_secs(1));
        assert!((halfway - 0.5).abs() < 1e-3);
        assert_eq!(sequencer.container_opacity(start + Duration::from_secs(2)), 1.0);
        assert_eq!(sequencer.container_opacity(start + Duration::from_secs(9)), 1.0);
    }

    #[test]
    fn text_elements_are_staggered() {
        let mut sequencer = default_sequencer();
        let start = Instant::now();
        sequencer.begin(start);

        // 0.6s in: the first element has been moving for 0.1s, the second not yet.
        let frames = sequencer.sample(start + Duration::from_millis(600));
        let state_of = |target| {
            frames
                .iter()
                .find(|frame| frame.target == target)
                .map(|frame| frame.state)
                .unwrap()
        };
        assert!(state_of(TargetId::Text(0)).opacity > 0.0);
        assert!(state_of(TargetId::Text(0)).offset_y < 50.0);
        assert_eq!(state_of(TargetId::Text(1)), RevealState::hidden_at(50.0));
        assert_eq!(state_of(TargetId::Nav), RevealState::hidden_at(-50.0));
    }

    #[test]
    fn sequence_finishes_after_last_track() {
        let mut sequencer = default_sequencer();
        let start = Instant::now();
        sequencer.begin(start);

        // Last text element: 0.5 + 2 * 0.2 + 1.2 = 2.1s.
        assert_eq!(sequencer.total_duration(), Duration::from_millis(2100));
        assert!(!sequencer.is_finished(start + Duration::from_secs(2)));
        assert!(sequencer.is_finished(start + Duration::from_millis(2100)));

        let frames = sequencer.sample(start + Duration::from_secs(3));
        assert!(frames.iter().all(|frame| frame.finished));
        assert!(frames.iter().all(|frame| frame.state == RevealState::VISIBLE));
    }

    #[test]
    fn disabled_entrance_is_fully_visible() {
        let config = EntranceConfig {
            enabled: false,
            ..EntranceConfig::default()
        };
        let sequencer = EntranceSequencer::from_config(&config).unwrap();
        let now = Instant::now();
        assert_eq!(sequencer.container_opacity(now), 1.0);
        assert!(sequencer.is_finished(now));
        assert!(sequencer.sample(now).is_empty());
    }
}
