use std::collections::HashMap;
use std::time::Duration;

/// Visual elements the controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Background,
    TopLayer,
    Chisel,
    /// Line along the cut; flashes in the warning color on extra strikes.
    GuideLine,
    CompletionMark,
    PopupPlane,
    PopupTitle,
    PopupBody,
    PopupButton,
}

impl Element {
    /// Every part of the popup, in the order it is revealed.
    pub const POPUP: [Element; 4] = [
        Element::PopupPlane,
        Element::PopupTitle,
        Element::PopupBody,
        Element::PopupButton,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Rgb(r, g, b)
    }
}

/// Visual collaborator: whatever actually draws the scene.
pub trait Scene {
    fn set_x(&mut self, element: Element, x: f64);
    fn set_color(&mut self, element: Element, color: Rgb);
    fn show(&mut self, element: Element);
    fn hide(&mut self, element: Element);
    fn set_text(&mut self, element: Element, text: &str);
}

/// Feedback played on every accepted strike.
pub trait Feedback {
    /// Stops the cue, rewinds it and plays it from the beginning.
    fn restart(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visual {
    pub x: Option<f64>,
    pub color: Option<Rgb>,
    pub visible: bool,
    pub text: String,
}

/// In-memory scene both frontends paint from.
#[derive(Debug, Clone, Default)]
pub struct SceneModel {
    visuals: HashMap<Element, Visual>,
}

impl SceneModel {
    /// A scene with the static layers visible and everything else hidden.
    pub fn new() -> Self {
        let mut model = SceneModel::default();
        for element in [
            Element::Background,
            Element::TopLayer,
            Element::Chisel,
            Element::GuideLine,
        ] {
            model.show(element);
        }
        model
    }

    pub fn visual(&self, element: Element) -> Option<&Visual> {
        self.visuals.get(&element)
    }

    pub fn is_visible(&self, element: Element) -> bool {
        self.visuals.get(&element).is_some_and(|v| v.visible)
    }

    pub fn x(&self, element: Element) -> Option<f64> {
        self.visuals.get(&element).and_then(|v| v.x)
    }

    pub fn color(&self, element: Element) -> Option<Rgb> {
        self.visuals.get(&element).and_then(|v| v.color)
    }

    pub fn text(&self, element: Element) -> &str {
        self.visuals
            .get(&element)
            .map(|v| v.text.as_str())
            .unwrap_or("")
    }

    fn entry(&mut self, element: Element) -> &mut Visual {
        self.visuals.entry(element).or_default()
    }
}

impl Scene for SceneModel {
    fn set_x(&mut self, element: Element, x: f64) {
        self.entry(element).x = Some(x);
    }

    fn set_color(&mut self, element: Element, color: Rgb) {
        self.entry(element).color = Some(color);
    }

    fn show(&mut self, element: Element) {
        self.entry(element).visible = true;
    }

    fn hide(&mut self, element: Element) {
        self.entry(element).visible = false;
    }

    fn set_text(&mut self, element: Element, text: &str) {
        self.entry(element).text = text.to_string();
    }
}

/// How long the hammer strike stays on screen.
pub const STRIKE_DURATION: Duration = Duration::from_millis(180);

/// Hammer strike cue, replayed from the start on every accepted input.
#[derive(Debug, Clone, Default)]
pub struct StrikeCue {
    plays: u64,
    age: Option<Duration>,
}

impl StrikeCue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the cue was (re)started.
    pub fn plays(&self) -> u64 {
        self.plays
    }

    pub fn advance(&mut self, elapsed: Duration) {
        if let Some(age) = self.age {
            let age = age + elapsed;
            self.age = (age < STRIKE_DURATION).then_some(age);
        }
    }

    /// 1.0 right after a strike, fading to 0.0.
    pub fn intensity(&self) -> f64 {
        match self.age {
            Some(age) => 1.0 - age.as_secs_f64() / STRIKE_DURATION.as_secs_f64(),
            None => 0.0,
        }
    }
}

impl Feedback for StrikeCue {
    fn restart(&mut self) {
        self.plays += 1;
        self.age = Some(Duration::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_model_shows_static_layers_only() {
        let model = SceneModel::new();
        assert!(model.is_visible(Element::Chisel));
        assert!(model.is_visible(Element::GuideLine));
        assert!(!model.is_visible(Element::CompletionMark));
        for element in Element::POPUP {
            assert!(!model.is_visible(element));
        }
    }

    #[test]
    fn model_records_calls() {
        let mut model = SceneModel::new();
        model.set_x(Element::Chisel, -12.5);
        model.set_color(Element::GuideLine, Rgb(1, 2, 3));
        model.set_text(Element::PopupTitle, "hello");
        model.hide(Element::Chisel);

        assert_eq!(model.x(Element::Chisel), Some(-12.5));
        assert_eq!(model.color(Element::GuideLine), Some(Rgb(1, 2, 3)));
        assert_eq!(model.text(Element::PopupTitle), "hello");
        assert_eq!(model.text(Element::PopupBody), "");
        assert!(!model.is_visible(Element::Chisel));
    }

    #[test]
    fn strike_restarts_from_full_intensity() {
        let mut cue = StrikeCue::new();
        assert_eq!(cue.intensity(), 0.0);

        cue.restart();
        assert_eq!(cue.intensity(), 1.0);
        cue.advance(STRIKE_DURATION / 2);
        assert!(cue.intensity() < 1.0 && cue.intensity() > 0.0);

        cue.restart();
        assert_eq!(cue.intensity(), 1.0);
        assert_eq!(cue.plays(), 2);

        cue.advance(STRIKE_DURATION);
        assert_eq!(cue.intensity(), 0.0);
    }
}
