use crate::config::{ChiselConfig, SceneConfig};
use crate::controller::{Activation, Controller};
use crate::math::Camera;
use crate::scene::{Element, Rgb, SceneModel, StrikeCue};
use crate::state::AppState;
use druid::kurbo::{Circle, Line, Point, Rect, RoundedRect};
use druid::text::FontFamily;
use druid::widget::prelude::*;
use druid::{
    commands,
    piet::{InterpolationMode, Text, TextLayout, TextLayoutBuilder},
    Color, Data, ImageBuf, RenderContext, TimerToken, Widget,
};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Source textures are authored at this size; planes keep its aspect ratio.
const TEXTURE_SIZE: [f64; 2] = [850.0, 450.0];
const TOP_LAYER_SCALE: f64 = 0.162;
const POPUP_SCALE: f64 = 0.105;
const POPUP_Z: f64 = 10.0;

/// A textured plane in the scene. Missing textures are drawn as shapes.
struct Sprite {
    image: Option<ImageBuf>,
    size: [f64; 2],
}

impl Sprite {
    fn load(path: &Path, scale: f64) -> Self {
        let image = match ImageBuf::from_file(path) {
            Ok(image) => Some(image),
            Err(err) => {
                warn!(path = %path.display(), %err, "texture unavailable, drawing fallback");
                None
            }
        };
        Sprite {
            image,
            size: [TEXTURE_SIZE[0] * scale, TEXTURE_SIZE[1] * scale],
        }
    }

    /// Draws the texture into `rect`. Returns false when there is none.
    fn paint(&self, ctx: &mut PaintCtx, rect: Rect) -> bool {
        match &self.image {
            Some(buf) => {
                let image = buf.to_image(ctx.render_ctx);
                ctx.draw_image(&image, rect, InterpolationMode::Bilinear);
                true
            }
            None => false,
        }
    }
}

/// Hammer and chisel vignette widget
pub struct VignetteWidget {
    controller: Controller,
    scene: SceneModel,
    cue: StrikeCue,
    camera: Camera,
    chisel: ChiselConfig,
    frame_interval: Duration,
    timer: TimerToken,
    last_frame: Instant,
    background: Sprite,
    top_layer: Sprite,
    chisel_sprite: Sprite,
    popup: Sprite,
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
    /// Widget size
    size: Size,
}

impl VignetteWidget {
    pub fn new(config: &SceneConfig, mut controller: Controller) -> Self {
        let mut scene = SceneModel::new();
        controller.start(&mut scene);

        let assets = &config.assets;
        VignetteWidget {
            controller,
            scene,
            cue: StrikeCue::new(),
            camera: Camera::default(),
            chisel: config.chisel.clone(),
            frame_interval: config.timing.frame_interval(),
            timer: TimerToken::INVALID,
            last_frame: Instant::now(),
            background: Sprite::load(&assets.background, 1.0),
            top_layer: Sprite::load(&assets.top_layer, TOP_LAYER_SCALE),
            chisel_sprite: Sprite::load(&assets.chisel, config.chisel.scale),
            popup: Sprite::load(&assets.popup, POPUP_SCALE),
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
            size: Size::ZERO,
        }
    }

    fn viewport(&self) -> [f64; 2] {
        [self.size.width, self.size.height]
    }

    fn plane_rect(&self, center: [f64; 3], size: [f64; 2]) -> Rect {
        let [x0, y0, x1, y1] = self.camera.plane_rect(center, size, self.viewport());
        Rect::new(x0, y0, x1, y1)
    }

    fn chisel_x(&self) -> f64 {
        self.scene.x(Element::Chisel).unwrap_or(self.chisel.start_x)
    }

    /// Popup panel and its dismiss button
    fn popup_rects(&self) -> (Rect, Rect) {
        let panel = self.plane_rect([0.0, 0.0, POPUP_Z], self.popup.size);
        let button = Rect::from_center_size(
            Point::new(panel.center().x, panel.y1 - 36.0),
            Size::new(120.0, 36.0),
        );
        (panel, button)
    }

    /// Advances the delayed tasks and one animation frame
    fn frame(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;

        self.controller.advance_time(elapsed, &mut self.scene);
        self.cue.advance(elapsed);
        self.controller.tick(&mut self.scene);
    }

    fn on_click(&mut self, pos: Point) {
        if self.scene.is_visible(Element::PopupButton) && self.popup_rects().1.contains(pos) {
            self.controller.dismiss_popup(&mut self.scene);
            return;
        }
        if self.controller.on_activate(&mut self.scene, &mut self.cue) == Activation::Warned {
            debug!("extra strike after completion");
        }
    }

    fn paint_track(&self, ctx: &mut PaintCtx) {
        let chisel = &self.chisel;
        let viewport = self.viewport();
        let start = self
            .camera
            .project([chisel.start_x, chisel.y, chisel.z], viewport);
        let end = self
            .camera
            .project([chisel.target_x, chisel.y, chisel.z], viewport);
        let color = self
            .scene
            .color(Element::GuideLine)
            .map(to_color)
            .unwrap_or(Color::WHITE);
        ctx.stroke(
            Line::new((start[0], start[1]), (end[0], end[1])),
            &color,
            3.0,
        );
    }

    fn paint_chisel(&self, ctx: &mut PaintCtx) {
        let chisel = &self.chisel;
        let center = [self.chisel_x(), chisel.y, chisel.z];
        let rect = self.plane_rect(center, self.chisel_sprite.size);
        if !self.chisel_sprite.paint(ctx, rect) {
            // Blade tip sits on the chisel position, handle trailing behind it.
            let tip = self.camera.project(center, self.viewport());
            let unit = self.camera.pixels_per_unit(chisel.z, self.viewport());
            let blade = Rect::new(
                tip[0] - 6.0 * unit,
                tip[1] - 0.6 * unit,
                tip[0],
                tip[1] + 0.6 * unit,
            );
            let handle = RoundedRect::new(
                blade.x0 - 9.0 * unit,
                tip[1] - 1.2 * unit,
                blade.x0,
                tip[1] + 1.2 * unit,
                0.6 * unit,
            );
            ctx.fill(blade, &Color::rgb8(170, 175, 185));
            ctx.fill(handle, &Color::rgb8(140, 90, 50));
        }

        let strike = self.cue.intensity();
        if strike > 0.0 {
            let tip = self.camera.project(center, self.viewport());
            let unit = self.camera.pixels_per_unit(chisel.z, self.viewport());
            let ring = Circle::new(
                Point::new(tip[0] - 15.0 * unit, tip[1]),
                (1.0 - strike) * 4.0 * unit + 4.0,
            );
            ctx.stroke(ring, &Color::rgb8(255, 220, 120).with_alpha(strike), 2.0);
        }
    }

    fn paint_popup(&self, ctx: &mut PaintCtx) {
        let size = ctx.size();
        ctx.fill(size.to_rect(), &Color::rgba8(0, 0, 0, 120));

        let (panel, button) = self.popup_rects();
        if !self.popup.paint(ctx, panel) {
            ctx.fill(panel.to_rounded_rect(12.0), &Color::rgb8(250, 248, 240));
        }

        let padding = 24.0;
        let text_width = (panel.width() - 2.0 * padding).max(10.0);
        let title_height = draw_text(
            ctx,
            self.scene.text(Element::PopupTitle),
            22.0,
            Color::rgb8(40, 40, 40),
            Point::new(panel.x0 + padding, panel.y0 + padding),
            text_width,
        );
        draw_text(
            ctx,
            self.scene.text(Element::PopupBody),
            15.0,
            Color::rgb8(60, 60, 60),
            Point::new(panel.x0 + padding, panel.y0 + padding + title_height + 12.0),
            text_width,
        );

        ctx.fill(button.to_rounded_rect(6.0), &Color::rgb8(60, 120, 200));
        draw_text(
            ctx,
            "OK",
            16.0,
            Color::WHITE,
            Point::new(button.center().x - 10.0, button.y0 + 8.0),
            button.width(),
        );
    }

    fn paint_debug(&self, ctx: &mut PaintCtx) {
        let track = self.controller.track();
        let lines = [
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            format!(
                "Step: {}/{}  Phase: {:?}",
                self.controller.current_step(),
                self.controller.total_steps(),
                self.controller.phase()
            ),
            format!(
                "X: {:.2}  Prev: {:.2}  Target: {:.2}",
                track.current_x(),
                track.prev_step_x(),
                track.target_x()
            ),
            format!(
                "Active: {}  Moving: {}  Pending: {}",
                self.controller.is_active(),
                self.controller.is_moving(),
                self.controller.pending_tasks()
            ),
            format!("FPS: {:.2}", self.fps),
        ];
        for (i, line) in lines.iter().enumerate() {
            draw_text(
                ctx,
                line,
                12.0,
                Color::WHITE,
                Point::new(10.0, 10.0 + 20.0 * i as f64),
                self.size.width,
            );
        }
    }
}

impl Widget<AppState> for VignetteWidget {
    fn event(&mut self, ctx: &mut EventCtx, event: &Event, data: &mut AppState, _env: &Env) {
        match event {
            Event::WindowConnected => {
                self.last_frame = Instant::now();
                self.timer = ctx.request_timer(self.frame_interval);
                ctx.request_focus();
            }
            Event::Timer(token) if *token == self.timer => {
                if data.paused {
                    // Keep the clock from jumping when resumed.
                    self.last_frame = Instant::now();
                } else {
                    self.frame();
                    ctx.request_paint();
                }
                self.timer = ctx.request_timer(self.frame_interval);
            }
            Event::KeyDown(key_event) => {
                if let druid::keyboard_types::Key::Character(s) = &key_event.key {
                    match s.as_str() {
                        "d" | "D" => {
                            data.debug = !data.debug;
                            ctx.request_paint();
                        }
                        "p" | "P" => {
                            data.paused = !data.paused;
                            ctx.request_paint();
                        }
                        "q" | "Q" => {
                            self.controller.teardown();
                            ctx.submit_command(commands::QUIT_APP);
                        }
                        _ => {}
                    }
                }
            }
            Event::MouseDown(mouse_event) => {
                if !data.paused && mouse_event.button == druid::MouseButton::Left {
                    self.on_click(mouse_event.pos);
                    ctx.request_paint();
                }
            }
            _ => {}
        }
    }

    fn lifecycle(
        &mut self,
        _ctx: &mut LifeCycleCtx,
        event: &LifeCycle,
        _data: &AppState,
        _env: &Env,
    ) {
        if let LifeCycle::Size(size) = event {
            self.size = *size;
        }
    }

    fn update(&mut self, ctx: &mut UpdateCtx, old_data: &AppState, data: &AppState, _env: &Env) {
        if !old_data.same(data) {
            ctx.request_paint();
        }
    }

    fn layout(
        &mut self,
        _layout_ctx: &mut LayoutCtx,
        bc: &BoxConstraints,
        _data: &AppState,
        _env: &Env,
    ) -> Size {
        let size = bc.max();
        self.size = size;
        size
    }

    fn paint(&mut self, ctx: &mut PaintCtx, data: &AppState, _env: &Env) {
        // Update FPS calculation
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }

        let size = ctx.size();
        self.size = size;

        if !self.scene.is_visible(Element::Background) || !self.background.paint(ctx, size.to_rect())
        {
            ctx.fill(size.to_rect(), &Color::rgb8(74, 96, 120));
        }
        if self.scene.is_visible(Element::TopLayer) {
            let rect = self.plane_rect([0.0, 0.0, 0.0], self.top_layer.size);
            if !self.top_layer.paint(ctx, rect) {
                let unit = self.camera.pixels_per_unit(self.chisel.z, self.viewport());
                let slab = Rect::new(
                    rect.x0 + 0.1 * rect.width(),
                    rect.center().y - 6.0 * unit,
                    rect.x1 - 0.1 * rect.width(),
                    rect.center().y + 6.0 * unit,
                );
                ctx.fill(slab.to_rounded_rect(2.0 * unit), &Color::rgb8(225, 210, 185));
            }
        }
        if self.scene.is_visible(Element::GuideLine) {
            self.paint_track(ctx);
        }
        if self.scene.is_visible(Element::Chisel) {
            self.paint_chisel(ctx);
        }
        if self.scene.is_visible(Element::CompletionMark) {
            draw_text(
                ctx,
                "\u{2714}",
                40.0,
                Color::rgb8(70, 200, 90),
                Point::new(size.width - 60.0, 16.0),
                50.0,
            );
        }
        if self.scene.is_visible(Element::PopupPlane) {
            self.paint_popup(ctx);
        }

        if data.debug {
            self.paint_debug(ctx);
        }

        if data.paused {
            ctx.fill(size.to_rect(), &Color::rgba8(0, 0, 0, 150));
            let text_layout = ctx
                .text()
                .new_text_layout("Paused")
                .font(FontFamily::SYSTEM_UI, 36.0)
                .default_attribute(druid::piet::FontWeight::BOLD)
                .text_color(Color::WHITE)
                .build();
            if let Ok(text_layout) = text_layout {
                let text_size = text_layout.size();
                let pos = (
                    (size.width - text_size.width) / 2.0,
                    (size.height - text_size.height) / 2.0,
                );
                ctx.draw_text(&text_layout, pos);
            }
        }
    }
}

fn to_color(Rgb(r, g, b): Rgb) -> Color {
    Color::rgb8(r, g, b)
}

/// Draws wrapped text and returns its height. Layout failures draw nothing.
fn draw_text(
    ctx: &mut PaintCtx,
    text: &str,
    font_size: f64,
    color: Color,
    pos: Point,
    max_width: f64,
) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let layout = ctx
        .text()
        .new_text_layout(text.to_string())
        .font(FontFamily::SYSTEM_UI, font_size)
        .max_width(max_width)
        .text_color(color)
        .build();
    match layout {
        Ok(layout) => {
            let height = layout.size().height;
            ctx.draw_text(&layout, pos);
            height
        }
        Err(_) => 0.0,
    }
}
