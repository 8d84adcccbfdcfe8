//! Main application state and UI.

use cognitive_synapse::content::{self, ContentOrigin, ContentRequest, LoadedContent};
use cognitive_synapse::engine::{EngineConfig, EngineEvent, SynapseEngine};
use cognitive_synapse::error::EngineError;
use cognitive_synapse::graph::layout::ForceParams;
use cognitive_synapse::graph::{ContentPayload, GraphModel, LayoutMode, PinPolicy};
use cognitive_synapse::interaction::{CursorHint, PointerEvent};
use cognitive_synapse::render::{render_frame, EguiRenderer};
use cognitive_synapse::settings::Settings;
use cognitive_synapse::theme;
use eframe::egui::{self, Pos2, Rect, RichText, Vec2};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

pub struct PortfolioApp {
    settings: Settings,
    settings_dirty: bool,
    last_settings_save: Instant,
    request: ContentRequest,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedContent, String>>,
    },
    Ready(Box<GraphView>),
    Error(String),
}

impl PortfolioApp {
    /// `request` overrides the configured content source (CLI flags)
    pub fn new(_cc: &eframe::CreationContext<'_>, request: Option<ContentRequest>) -> Self {
        let settings = Settings::load();
        let request = request.unwrap_or_else(|| ContentRequest::Auto(settings.content.clone()));
        Self {
            state: Self::start_load(request.clone()),
            settings,
            settings_dirty: false,
            last_settings_save: Instant::now(),
            request,
        }
    }

    fn start_load(request: ContentRequest) -> AppState {
        AppState::Loading {
            rx: content::spawn_load(request),
        }
    }

    /// Mark settings as needing to be saved
    fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    /// Save at most every 2 seconds while sliders are moving
    fn maybe_save_settings(&mut self) {
        if self.settings_dirty && self.last_settings_save.elapsed().as_secs() >= 2 {
            self.settings.save();
            self.settings_dirty = false;
            self.last_settings_save = Instant::now();
        }
    }
}

impl eframe::App for PortfolioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.maybe_save_settings();
        ctx.set_visuals(egui::Visuals::dark());

        let mut transition = None;
        let mut settings_changed = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(loaded)) => {
                        transition = Some(AppState::Ready(Box::new(GraphView::new(loaded))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error(
                            "Background load worker disconnected".to_owned(),
                        ));
                    }
                }

                egui::CentralPanel::default()
                    .frame(egui::Frame::none().fill(theme::bg::CANVAS))
                    .show(ctx, |ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(140.0);
                            ui.heading("Loading portfolio...");
                            ui.add_space(12.0);
                            for width in [260.0, 200.0, 230.0] {
                                theme::skeleton_rect(ui, width, 14.0);
                                ui.add_space(6.0);
                            }
                        });
                    });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load portfolio content");
                    ui.add_space(6.0);
                    ui.colored_label(theme::state::ERROR, error.as_str());
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.button("Retry").clicked() {
                            transition = Some(Self::start_load(self.request.clone()));
                        }
                        if ui.button("Show offline portfolio").clicked() {
                            transition = Some(Self::start_load(ContentRequest::BundledOnly));
                        }
                    });
                });
            }
            AppState::Ready(view) => {
                settings_changed = view.show(ctx, &mut self.settings);
            }
        }

        if settings_changed {
            self.mark_settings_dirty();
        }
        if let Some(next_state) = transition {
            self.state = next_state;
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Force save settings on exit
        if self.settings_dirty {
            self.settings.save();
        }
    }
}

/// A loaded portfolio and the engine that shows it
struct GraphView {
    model: GraphModel,
    origin: ContentOrigin,
    skipped: Vec<String>,
    /// Created on the first frame with a usable canvas size
    engine: Option<SynapseEngine>,
    engine_error: Option<String>,
    events_tx: Sender<EngineEvent>,
    events_rx: Receiver<EngineEvent>,
    card: Option<ContentPayload>,
    banner_open: bool,
}

impl GraphView {
    fn new(loaded: LoadedContent) -> Self {
        let report = GraphModel::build(&loaded.source);
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            skipped: report.warnings.iter().map(|w| w.to_string()).collect(),
            model: report.model,
            banner_open: loaded.origin.is_fallback(),
            origin: loaded.origin,
            engine: None,
            engine_error: None,
            events_tx,
            events_rx,
            card: None,
        }
    }

    fn ensure_engine(&mut self, size: Vec2, settings: &Settings) -> Option<&mut SynapseEngine> {
        if self.engine.is_none() {
            let created = SynapseEngine::new(
                self.model.clone(),
                settings.engine_config(),
                size,
                self.events_tx.clone(),
            );
            match created {
                Ok(engine) => self.engine = Some(engine),
                // Minimized or not laid out yet
                Err(EngineError::SurfaceUnavailable { .. }) => return None,
                Err(e @ EngineError::InvalidConfig(_)) => {
                    tracing::warn!(error = %e, "settings rejected, starting with defaults");
                    self.engine_error = Some(e.to_string());
                    self.engine = SynapseEngine::new(
                        self.model.clone(),
                        EngineConfig::default(),
                        size,
                        self.events_tx.clone(),
                    )
                    .ok();
                }
            }
        }
        self.engine.as_mut()
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                EngineEvent::LeafActivated { id, content } => {
                    tracing::debug!(node = %id, "showing detail card");
                    self.card = Some(content);
                }
                EngineEvent::IntroDismissed => tracing::debug!("intro dismissed"),
                EngineEvent::LayoutSettled => tracing::debug!("layout settled"),
            }
        }
    }

    /// Draw one frame. Returns true if settings changed.
    fn show(&mut self, ctx: &egui::Context, settings: &mut Settings) -> bool {
        let mut changed = false;

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            self.top_bar(ui, settings, &mut changed);
        });

        if settings.show_settings_panel {
            egui::SidePanel::right("settings")
                .min_width(240.0)
                .frame(egui::Frame::side_top_panel(&ctx.style()).fill(theme::bg::PANEL))
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        self.settings_panel(ui, settings, &mut changed);
                    });
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme::bg::CANVAS))
            .show(ctx, |ui| {
                self.canvas(ui, settings);
            });

        self.drain_events();
        self.intro_overlay(ctx);
        self.card_window(ctx);

        changed
    }

    fn top_bar(&mut self, ui: &mut egui::Ui, settings: &mut Settings, changed: &mut bool) {
        ui.horizontal(|ui| {
            ui.heading("Cognitive Synapse");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .selectable_label(settings.show_settings_panel, "⚙ Settings")
                    .clicked()
                {
                    settings.show_settings_panel = !settings.show_settings_panel;
                    *changed = true;
                }
            });
        });

        if !self.banner_open {
            return;
        }
        if let ContentOrigin::Bundled {
            reason: Some(reason),
        } = &self.origin
        {
            let mut close = false;
            ui.horizontal(|ui| {
                ui.colored_label(theme::state::WARNING, "● Using offline content");
                ui.label(
                    RichText::new(reason.as_str())
                        .small()
                        .color(theme::text::MUTED),
                );
                close = ui.small_button("✕").clicked();
            });
            if close {
                self.banner_open = false;
            }
        }
    }

    fn settings_panel(&mut self, ui: &mut egui::Ui, settings: &mut Settings, changed: &mut bool) {
        ui.heading("Graph Controls");
        ui.add_space(10.0);

        egui::CollapsingHeader::new("Layout")
            .default_open(true)
            .show(ui, |ui| {
                let mut mode = settings.layout_mode;
                ui.horizontal(|ui| {
                    for option in [LayoutMode::Force, LayoutMode::Radial] {
                        ui.selectable_value(&mut mode, option, option.label());
                    }
                });
                if mode != settings.layout_mode {
                    settings.layout_mode = mode;
                    if let Some(engine) = self.engine.as_mut() {
                        engine.set_layout_mode(mode);
                    }
                    *changed = true;
                }

                let mut policy = settings.pin_policy;
                egui::ComboBox::from_label("Dropped nodes")
                    .selected_text(policy.label())
                    .show_ui(ui, |ui| {
                        for option in [PinPolicy::Elastic, PinPolicy::Sticky] {
                            ui.selectable_value(&mut policy, option, option.label());
                        }
                    });
                if policy != settings.pin_policy {
                    settings.pin_policy = policy;
                    if let Some(engine) = self.engine.as_mut() {
                        engine.set_pin_policy(policy);
                    }
                    *changed = true;
                }

                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    if ui.button("Release pins").clicked() {
                        if let Some(engine) = self.engine.as_mut() {
                            engine.reset_pins();
                        }
                    }
                    if ui.button("Recenter").clicked() {
                        if let Some(engine) = self.engine.as_mut() {
                            engine.reset_view();
                        }
                    }
                });
            });

        egui::CollapsingHeader::new("Physics")
            .default_open(true)
            .show(ui, |ui| {
                let force_mode = settings.layout_mode == LayoutMode::Force;
                ui.add_enabled_ui(force_mode, |ui| {
                    let mut physics_changed = false;
                    physics_changed |= ui
                        .add(
                            egui::Slider::new(&mut settings.link_distance, 40.0..=300.0)
                                .text("Link distance"),
                        )
                        .changed();
                    physics_changed |= ui
                        .add(egui::Slider::new(&mut settings.charge, -1500.0..=-50.0).text("Charge"))
                        .changed();
                    physics_changed |= ui
                        .add(
                            egui::Slider::new(&mut settings.velocity_decay, 0.1..=0.9)
                                .text("Velocity kept")
                                .fixed_decimals(2),
                        )
                        .changed();
                    physics_changed |= ui
                        .add(
                            egui::Slider::new(&mut settings.collide_scale, 1.0..=3.0)
                                .text("Collision spacing")
                                .fixed_decimals(2),
                        )
                        .changed();

                    if ui.button("↺ Defaults").clicked() {
                        let defaults = ForceParams::default();
                        settings.link_distance = defaults.link_distance;
                        settings.charge = defaults.charge;
                        settings.velocity_decay = defaults.velocity_decay;
                        settings.collide_scale = defaults.collide_scale;
                        physics_changed = true;
                    }

                    if physics_changed {
                        if let Some(engine) = self.engine.as_mut() {
                            engine.set_force_params(settings.force_params());
                        }
                        *changed = true;
                    }
                });
                if !force_mode {
                    ui.label(
                        RichText::new("Physics applies in Force mode")
                            .small()
                            .color(theme::text::MUTED),
                    );
                }
            });

        egui::CollapsingHeader::new("Content")
            .default_open(false)
            .show(ui, |ui| {
                let source = match &self.origin {
                    ContentOrigin::Remote => "Sanity".to_string(),
                    ContentOrigin::Bundled { .. } => "Bundled portfolio".to_string(),
                    ContentOrigin::File(path) => path.display().to_string(),
                };
                ui.label(format!("Source: {}", source));
                ui.label(format!("{} nodes", self.model.len()));

                if !self.skipped.is_empty() {
                    ui.colored_label(
                        theme::state::WARNING,
                        format!("{} records skipped", self.skipped.len()),
                    );
                    for warning in &self.skipped {
                        ui.label(RichText::new(warning).small().color(theme::text::MUTED));
                    }
                }
                if let Some(ref err) = self.engine_error {
                    ui.colored_label(theme::state::ERROR, err.as_str());
                }
            });
    }

    fn canvas(&mut self, ui: &mut egui::Ui, settings: &Settings) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        let canvas_hovered = response.hovered();
        let now = ui.input(|i| i.time);
        let events = ui.input(|i| i.events.clone());

        let Some(engine) = self.ensure_engine(rect.size(), settings) else {
            ui.ctx().request_repaint_after(Duration::from_millis(250));
            return;
        };
        if engine.resize(rect.size()).is_err() {
            return;
        }

        for event in pointer_events(&events, rect, canvas_hovered) {
            engine.handle_pointer(event, now);
        }

        let decision = engine.frame(now);
        let snapshot = engine.snapshot(now);
        render_frame(&snapshot, &mut EguiRenderer::new(&painter, rect));

        let cursor = engine.cursor();
        if canvas_hovered || cursor == CursorHint::Grabbing {
            ui.ctx().set_cursor_icon(cursor_icon(cursor));
        }

        if decision.is_continue() {
            ui.ctx().request_repaint();
        }
    }

    fn intro_overlay(&self, ctx: &egui::Context) {
        let Some(engine) = &self.engine else {
            return;
        };
        if engine.visibility().intro_dismissed() {
            return;
        }
        egui::Area::new(egui::Id::new("intro_overlay"))
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -48.0])
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(theme::bg::SURFACE)
                    .rounding(10.0)
                    .inner_margin(16.0)
                    .show(ui, |ui| {
                        ui.vertical_centered(|ui| {
                            ui.label(
                                RichText::new("Welcome")
                                    .heading()
                                    .color(theme::text::PRIMARY),
                            );
                            ui.label(
                                RichText::new(
                                    "Click the center node to explore. Drag nodes or the canvas to rearrange.",
                                )
                                .color(theme::text::SECONDARY),
                            );
                        });
                    });
            });
    }

    fn card_window(&mut self, ctx: &egui::Context) {
        let Some(content) = &self.card else {
            return;
        };

        let mut open = true;
        let escape = ctx.input(|i| i.key_pressed(egui::Key::Escape));
        egui::Window::new(RichText::new(content.title()).strong())
            .id(egui::Id::new("detail_card"))
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(440.0)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .frame(egui::Frame::window(&ctx.style()).fill(theme::bg::PANEL))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(520.0)
                    .show(ui, |ui| card_body(ui, content));
            });

        if !open || escape {
            self.card = None;
            if let Some(engine) = self.engine.as_mut() {
                engine.close_card();
            }
        }
    }
}

fn card_body(ui: &mut egui::Ui, content: &ContentPayload) {
    ui.label(
        RichText::new(content.kind_label())
            .small()
            .color(theme::accent::CYAN),
    );
    if let Some(role) = content.role() {
        ui.label(RichText::new(role).color(theme::text::SECONDARY));
    }
    if let ContentPayload::Experience(experience) = content {
        let meta: Vec<&str> = [experience.category.as_deref(), experience.period.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !meta.is_empty() {
            ui.label(RichText::new(meta.join(" · ")).small().color(theme::text::MUTED));
        }
    }

    if let Some(summary) = content.summary() {
        ui.add_space(6.0);
        ui.label(summary);
    }

    if !content.tech_stack().is_empty() {
        ui.add_space(8.0);
        ui.horizontal_wrapped(|ui| {
            for tech in content.tech_stack() {
                egui::Frame::none()
                    .fill(theme::bg::SURFACE)
                    .rounding(4.0)
                    .inner_margin(egui::Margin::symmetric(6.0, 2.0))
                    .show(ui, |ui| {
                        ui.label(RichText::new(tech.as_str()).small());
                    });
            }
        });
    }

    for (title, text) in content.sections() {
        ui.add_space(10.0);
        ui.label(RichText::new(title).strong().color(theme::text::PRIMARY));
        ui.label(text);
    }

    match content {
        ContentPayload::Project(project) => {
            if project.image.is_some() || !project.links.is_empty() {
                ui.add_space(10.0);
            }
            if let Some(image) = &project.image {
                ui.hyperlink_to("Cover image", image);
            }
            for link in &project.links {
                ui.hyperlink_to(link.title.as_str(), &link.url);
            }
        }
        ContentPayload::Experience(experience) => {
            for (i, image) in experience.images.iter().enumerate() {
                ui.hyperlink_to(format!("Image {}", i + 1), image);
            }
        }
    }
}

fn cursor_icon(hint: CursorHint) -> egui::CursorIcon {
    match hint {
        CursorHint::Grab => egui::CursorIcon::Grab,
        CursorHint::PointingHand => egui::CursorIcon::PointingHand,
        CursorHint::Grabbing => egui::CursorIcon::Grabbing,
    }
}

/// Translate this frame's raw input into canvas-local pointer events.
///
/// Presses only count when they land on the canvas itself (not on a
/// window above it). Moves and releases are always forwarded so a drag
/// can finish outside the canvas.
fn pointer_events(events: &[egui::Event], rect: Rect, canvas_hovered: bool) -> Vec<PointerEvent> {
    let local = |pos: Pos2| (pos - rect.min).to_pos2();
    events
        .iter()
        .filter_map(|event| match event {
            egui::Event::PointerMoved(pos) => Some(PointerEvent::Move(local(*pos))),
            egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed: true,
                ..
            } if canvas_hovered && rect.contains(*pos) => Some(PointerEvent::Down(local(*pos))),
            egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed: false,
                ..
            } => Some(PointerEvent::Up(local(*pos))),
            egui::Event::PointerGone => Some(PointerEvent::Leave),
            _ => None,
        })
        .collect()
}
