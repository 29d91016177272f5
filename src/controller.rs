//! Click-driven chisel controller and the popup lifecycle coupled to it.
//!
//! The controller owns every piece of mutable vignette state. Frontends feed
//! it three kinds of events: a primary input ([`Controller::on_activate`]),
//! one frame ([`Controller::tick`]) and the wall time that passed
//! ([`Controller::advance_time`]). All visual side effects go through the
//! [`Scene`] and [`Feedback`] traits.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::SceneConfig;
use crate::error::ConfigError;
use crate::popup::{PopupKind, PopupState, PopupTexts};
use crate::scene::{Element, Feedback, Rgb, Scene};
use crate::schedule::{Schedule, TaskId};

/// Input and motion gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulationState {
    /// Whether a primary input is accepted.
    pub active: bool,
    /// Whether frames advance the chisel.
    pub moving: bool,
}

/// Completed strikes out of the required number. Never exceeds `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCounter {
    current: u32,
    total: u32,
}

impl StepCounter {
    pub fn new(total: u32) -> Result<Self, ConfigError> {
        if total == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        Ok(StepCounter { current: 0, total })
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.current == self.total
    }

    fn increment(&mut self) {
        if self.current < self.total {
            self.current += 1;
        }
    }
}

/// Chisel position along its track.
///
/// Motion runs from `start_x` toward `target_x` in whichever direction that
/// is; every comparison is made along that direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionTrack {
    current_x: f64,
    start_x: f64,
    target_x: f64,
    step_size: f64,
    prev_step_x: f64,
}

impl PositionTrack {
    pub fn new(start_x: f64, target_x: f64, step_size: f64) -> Self {
        PositionTrack {
            current_x: start_x,
            start_x,
            target_x,
            step_size,
            prev_step_x: start_x,
        }
    }

    pub fn current_x(&self) -> f64 {
        self.current_x
    }

    pub fn start_x(&self) -> f64 {
        self.start_x
    }

    pub fn target_x(&self) -> f64 {
        self.target_x
    }

    /// Position the chisel rested at when the previous strike ended.
    pub fn prev_step_x(&self) -> f64 {
        self.prev_step_x
    }

    fn direction(&self) -> f64 {
        if self.target_x >= self.start_x {
            1.0
        } else {
            -1.0
        }
    }

    /// Signed distance covered by one strike.
    pub fn step_width(&self, total: u32) -> f64 {
        (self.target_x - self.start_x) / f64::from(total)
    }

    /// Where the current strike ends.
    pub fn step_boundary(&self, total: u32) -> f64 {
        self.prev_step_x + self.step_width(total)
    }

    /// True if `x` has not yet reached `limit`.
    fn short_of(&self, x: f64, limit: f64) -> bool {
        (limit - x) * self.direction() > 0.0
    }

    pub fn can_advance(&self, boundary: f64) -> bool {
        self.short_of(self.current_x, boundary) && self.short_of(self.current_x, self.target_x)
    }

    /// Moves one frame's worth toward `boundary`, never past it or the target.
    pub fn advance(&mut self, boundary: f64) {
        let next = self.current_x + self.direction() * self.step_size;
        self.current_x = if self.direction() > 0.0 {
            next.min(boundary).min(self.target_x)
        } else {
            next.max(boundary).max(self.target_x)
        };
    }

    fn settle(&mut self) {
        self.prev_step_x = self.current_x;
    }
}

/// Observable stage of the vignette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for input (or for a popup to be dismissed).
    Idle,
    /// A strike is moving the chisel.
    Stepping,
    /// A strike ended; input re-opens after the activation delay.
    StepSettling,
    /// Every strike is done. Further input only flashes the warning line.
    Complete,
}

/// Outcome of a primary input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Input is closed: mid-strike, settling, popup shown or torn down.
    Ignored,
    /// All strikes are done; the guide line flashed.
    Warned,
    /// A new strike started.
    Started,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    ClearWarning,
    Reactivate,
    ShowPopup(PopupKind),
}

#[derive(Debug)]
pub struct Controller {
    sim: SimulationState,
    steps: StepCounter,
    track: PositionTrack,
    popup: PopupState,
    texts: PopupTexts,
    warning_flash: Duration,
    activation_delay: Duration,
    popup_delay: Duration,
    line_color: Rgb,
    warning_color: Rgb,
    schedule: Schedule<Task>,
    warning_task: Option<TaskId>,
    reactivate_task: Option<TaskId>,
    torn_down: bool,
}

impl Controller {
    /// Builds the controller. Fails on configurations the track cannot be
    /// divided with, such as a zero step count.
    pub fn new(config: &SceneConfig, texts: PopupTexts) -> Result<Self, ConfigError> {
        config.validate()?;
        let chisel = &config.chisel;

        Ok(Controller {
            sim: SimulationState::default(),
            steps: StepCounter::new(chisel.total_steps)?,
            track: PositionTrack::new(chisel.start_x, chisel.target_x, chisel.step_size),
            popup: PopupState::None,
            texts,
            warning_flash: config.timing.warning_flash(),
            activation_delay: config.timing.activation_delay(),
            popup_delay: config.timing.popup_delay(),
            line_color: config.colors.line.into(),
            warning_color: config.colors.warning.into(),
            schedule: Schedule::new(),
            warning_task: None,
            reactivate_task: None,
            torn_down: false,
        })
    }

    /// Puts the scene in its opening state and shows the intro popup.
    pub fn start(&mut self, scene: &mut impl Scene) {
        scene.set_x(Element::Chisel, self.track.current_x());
        scene.set_color(Element::GuideLine, self.line_color);
        scene.hide(Element::CompletionMark);
        for element in Element::POPUP {
            scene.hide(element);
        }
        info!(
            total = self.steps.total(),
            start_x = self.track.start_x(),
            target_x = self.track.target_x(),
            "vignette started"
        );
        self.show_popup(PopupKind::Intro, scene);
    }

    /// Primary input (click or tap).
    pub fn on_activate(
        &mut self,
        scene: &mut impl Scene,
        feedback: &mut impl Feedback,
    ) -> Activation {
        if !self.sim.active {
            debug!(phase = ?self.phase(), "input ignored");
            return Activation::Ignored;
        }
        if self.steps.is_complete() {
            debug!("input after completion");
            self.flash_warning(scene);
            return Activation::Warned;
        }

        feedback.restart();
        self.sim.moving = true;
        self.sim.active = false;
        debug!(
            step = self.steps.current() + 1,
            total = self.steps.total(),
            "strike"
        );
        Activation::Started
    }

    /// One render frame. Does nothing unless a strike is in progress.
    pub fn tick(&mut self, scene: &mut impl Scene) {
        if !self.sim.moving {
            return;
        }
        // Input stays closed for the whole strike, not just its first frame.
        self.sim.active = false;

        let boundary = self.track.step_boundary(self.steps.total());
        if self.track.can_advance(boundary) {
            self.track.advance(boundary);
            scene.set_x(Element::Chisel, self.track.current_x());
            return;
        }
        self.finish_step(scene);
    }

    /// Moves the controller clock forward, firing the delayed tasks that
    /// came due.
    pub fn advance_time(&mut self, elapsed: Duration, scene: &mut impl Scene) {
        for (id, task) in self.schedule.advance(elapsed) {
            match task {
                Task::ClearWarning => {
                    if self.warning_task == Some(id) {
                        self.warning_task = None;
                    }
                    scene.set_color(Element::GuideLine, self.line_color);
                }
                Task::Reactivate => {
                    if self.reactivate_task == Some(id) {
                        self.reactivate_task = None;
                    }
                    if !self.popup.is_shown() {
                        self.sim.active = true;
                        debug!("input re-enabled");
                    }
                }
                Task::ShowPopup(kind) => self.show_popup(kind, scene),
            }
        }
    }

    /// Shows a popup and closes simulation input until it is dismissed.
    pub fn show_popup(&mut self, kind: PopupKind, scene: &mut impl Scene) {
        if self.torn_down {
            return;
        }
        if let Some(id) = self.reactivate_task.take() {
            self.schedule.cancel(id);
        }
        self.sim.active = false;
        self.popup = kind.into();

        let texts = self.texts.pair(kind);
        scene.set_text(Element::PopupTitle, &texts.title);
        scene.set_text(Element::PopupBody, &texts.body);
        for element in Element::POPUP {
            scene.show(element);
        }
        info!(?kind, "popup shown");
    }

    /// Hides the popup and re-opens input. Returns false if no popup was shown.
    pub fn dismiss_popup(&mut self, scene: &mut impl Scene) -> bool {
        if self.torn_down || !self.popup.is_shown() {
            return false;
        }
        for element in Element::POPUP {
            scene.hide(element);
        }
        info!(popup = ?self.popup, "popup dismissed");
        self.popup = PopupState::None;
        self.sim.active = true;
        true
    }

    /// Cancels every pending task and closes input for good.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let cancelled = self.schedule.cancel_all();
        self.warning_task = None;
        self.reactivate_task = None;
        self.sim = SimulationState::default();
        self.torn_down = true;
        debug!(cancelled, "controller torn down");
    }

    pub fn phase(&self) -> Phase {
        if self.sim.moving {
            Phase::Stepping
        } else if self.steps.is_complete() {
            Phase::Complete
        } else if self.reactivate_task.is_some() {
            Phase::StepSettling
        } else {
            Phase::Idle
        }
    }

    pub fn simulation(&self) -> SimulationState {
        self.sim
    }

    pub fn is_active(&self) -> bool {
        self.sim.active
    }

    pub fn is_moving(&self) -> bool {
        self.sim.moving
    }

    pub fn current_step(&self) -> u32 {
        self.steps.current()
    }

    pub fn total_steps(&self) -> u32 {
        self.steps.total()
    }

    pub fn track(&self) -> &PositionTrack {
        &self.track
    }

    pub fn position(&self) -> f64 {
        self.track.current_x()
    }

    pub fn popup(&self) -> PopupState {
        self.popup
    }

    pub fn is_warning(&self) -> bool {
        self.warning_task.is_some()
    }

    pub fn pending_tasks(&self) -> usize {
        self.schedule.pending()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn flash_warning(&mut self, scene: &mut impl Scene) {
        // A flash already running is restarted rather than cut short.
        if let Some(id) = self.warning_task.take() {
            self.schedule.cancel(id);
        }
        scene.set_color(Element::GuideLine, self.warning_color);
        self.warning_task = Some(
            self.schedule
                .schedule(self.warning_flash, Task::ClearWarning),
        );
    }

    fn finish_step(&mut self, scene: &mut impl Scene) {
        self.sim.moving = false;
        self.steps.increment();
        self.track.settle();

        if let Some(id) = self.reactivate_task.take() {
            self.schedule.cancel(id);
        }
        self.reactivate_task = Some(
            self.schedule
                .schedule(self.activation_delay, Task::Reactivate),
        );
        debug!(
            step = self.steps.current(),
            total = self.steps.total(),
            x = self.track.current_x(),
            "strike finished"
        );

        if self.steps.is_complete() {
            info!("all strikes done");
            scene.show(Element::CompletionMark);
            self.schedule
                .schedule(self.popup_delay, Task::ShowPopup(PopupKind::Done));
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneModel, StrikeCue};

    fn controller(total: u32) -> (Controller, SceneModel) {
        let mut config = SceneConfig::default();
        config.chisel.total_steps = total;
        let mut scene = SceneModel::new();
        let mut controller = Controller::new(&config, PopupTexts::builtin()).unwrap();
        controller.start(&mut scene);
        (controller, scene)
    }

    #[test]
    fn counter_rejects_zero_total() {
        assert!(matches!(StepCounter::new(0), Err(ConfigError::ZeroSteps)));
    }

    #[test]
    fn counter_saturates_at_total() {
        let mut counter = StepCounter::new(2).unwrap();
        counter.increment();
        counter.increment();
        counter.increment();
        assert_eq!(counter.current(), 2);
        assert!(counter.is_complete());
    }

    #[test]
    fn track_advance_is_clamped_to_boundary() {
        let mut track = PositionTrack::new(0.0, 10.0, 3.0);
        let boundary = track.step_boundary(2);
        assert_eq!(boundary, 5.0);

        track.advance(boundary);
        assert_eq!(track.current_x(), 3.0);
        track.advance(boundary);
        assert_eq!(track.current_x(), 5.0);
        assert!(!track.can_advance(boundary));
    }

    #[test]
    fn track_runs_in_reverse() {
        let mut track = PositionTrack::new(10.0, 0.0, 4.0);
        let boundary = track.step_boundary(1);
        assert_eq!(boundary, 0.0);

        while track.can_advance(boundary) {
            track.advance(boundary);
        }
        assert_eq!(track.current_x(), 0.0);
    }

    #[test]
    fn opens_on_intro_popup() {
        let (controller, scene) = controller(5);
        assert_eq!(controller.popup(), PopupState::Intro);
        assert!(!controller.is_active());
        assert!(scene.is_visible(Element::PopupButton));
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn strike_restarts_feedback_and_closes_input() {
        let (mut controller, mut scene) = controller(5);
        let mut cue = StrikeCue::new();
        controller.dismiss_popup(&mut scene);

        assert_eq!(
            controller.on_activate(&mut scene, &mut cue),
            Activation::Started
        );
        assert_eq!(cue.plays(), 1);
        assert!(controller.is_moving());
        assert!(!controller.is_active());
        assert_eq!(controller.phase(), Phase::Stepping);
    }

    #[test]
    fn reactivation_waits_while_popup_shown() {
        let (mut controller, mut scene) = controller(5);
        let mut cue = StrikeCue::new();
        controller.dismiss_popup(&mut scene);
        controller.on_activate(&mut scene, &mut cue);
        while controller.is_moving() {
            controller.tick(&mut scene);
        }
        assert_eq!(controller.phase(), Phase::StepSettling);

        controller.show_popup(PopupKind::Intro, &mut scene);
        controller.advance_time(Duration::from_secs(5), &mut scene);
        assert!(!controller.is_active());
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn teardown_cancels_pending_work() {
        let (mut controller, mut scene) = controller(1);
        let mut cue = StrikeCue::new();
        controller.dismiss_popup(&mut scene);
        controller.on_activate(&mut scene, &mut cue);
        while controller.is_moving() {
            controller.tick(&mut scene);
        }
        assert_eq!(controller.pending_tasks(), 2);

        controller.teardown();
        assert_eq!(controller.pending_tasks(), 0);

        controller.advance_time(Duration::from_secs(10), &mut scene);
        assert_eq!(controller.popup(), PopupState::None);
        assert!(!controller.is_active());
        assert!(!controller.dismiss_popup(&mut scene));
        assert_eq!(
            controller.on_activate(&mut scene, &mut cue),
            Activation::Ignored
        );
    }
}
