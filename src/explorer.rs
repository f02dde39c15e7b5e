//! Terminal-based interactive world atlas using ratatui
//!
//! Renders the choropleth world map on a braille canvas, handles mouse
//! hover/click and keyboard input, and drives the drill-down into
//! country-level maps. Clicking a country zooms toward it while the
//! detailed geometry downloads on a worker thread; both must finish
//! before the layer swap.

use std::collections::HashMap;
use std::error::Error;
use std::io::stdout;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, MouseButton, MouseEvent, MouseEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders, Clear, Paragraph,
    },
};

use crate::drilldown::{DrillDown, Selection, Transition};
use crate::export;
use crate::geodata::{spawn_country_fetch, FetchOutcome, GeodataClient};
use crate::geometry::{inverse_mercator, MapShape, PolygonLayer};
use crate::palette::{ColorSet, Rgb8, BASE_FILL, HOVER_INDEX};
use crate::sentiments::CountryEntry;

/// How long the zoom animation runs.
const ZOOM_ANIMATION: Duration = Duration::from_millis(600);

/// How long status messages stay on screen.
const MESSAGE_TTL: Duration = Duration::from_secs(4);

/// Zoom factor per scroll step or +/- key press.
const ZOOM_STEP: f64 = 1.25;

const BACK_LABEL: &str = " Back to world map ";
const HOME_LABEL: &str = " Home ";

/// Visible region of the Mercator plane.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ViewRect {
    center_x: f64,
    center_y: f64,
    span_x: f64,
}

impl ViewRect {
    /// Vertical span for a given width/height cell ratio. Terminal cells
    /// are about twice as tall as wide, hence the factor of 2.
    fn span_y(&self, area: Rect) -> f64 {
        let aspect = (area.width.max(1) as f64) / (area.height.max(1) as f64 * 2.0);
        self.span_x / aspect
    }
}

/// In-flight viewport animation. `token` ties a drill-down zoom to its
/// request; home/back animations carry none.
struct ZoomAnimation {
    from: ViewRect,
    to: ViewRect,
    started: Instant,
    token: Option<u64>,
}

impl ZoomAnimation {
    /// Eased interpolation progress in [0, 1].
    fn progress(&self) -> f64 {
        let t = self.started.elapsed().as_secs_f64() / ZOOM_ANIMATION.as_secs_f64();
        let t = t.clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }

    fn current(&self) -> ViewRect {
        let t = self.progress();
        ViewRect {
            center_x: self.from.center_x + (self.to.center_x - self.from.center_x) * t,
            center_y: self.from.center_y + (self.to.center_y - self.from.center_y) * t,
            span_x: self.from.span_x + (self.to.span_x - self.from.span_x) * t,
        }
    }

    fn finished(&self) -> bool {
        self.started.elapsed() >= ZOOM_ANIMATION
    }
}

/// Explorer state
struct Explorer {
    world_layer: PolygonLayer,
    /// Fill per world polygon id, from the resolved country mapping
    world_fills: HashMap<String, Rgb8>,
    country_data: HashMap<String, CountryEntry>,
    /// Detailed geometry of the drilled-in country, populated on demand
    country_layer: Option<PolygonLayer>,
    country_fill: Rgb8,
    /// Which layer is visible: false = world, true = country
    show_country_layer: bool,
    drilldown: DrillDown,
    colors: ColorSet,
    viewport: ViewRect,
    world_home: ViewRect,
    animation: Option<ZoomAnimation>,
    /// Zoom floor; pinned to the drilled-in level while in a country
    min_zoom: f64,
    /// Hovered shape id and display name, for highlight and tooltip
    hover: Option<(String, String)>,
    message: Option<(String, Instant)>,
    client: GeodataClient,
    fetch_tx: Sender<FetchOutcome>,
    fetch_rx: Receiver<FetchOutcome>,
    /// Screen regions captured during the last draw, for mouse dispatch
    map_area: Rect,
    back_area: Option<Rect>,
    home_area: Option<Rect>,
}

impl Explorer {
    fn new(
        world_layer: PolygonLayer,
        country_data: HashMap<String, CountryEntry>,
        client: GeodataClient,
    ) -> Self {
        let colors = ColorSet::new();

        let mut world_fills = HashMap::new();
        for (code, entry) in &country_data {
            let fill = colors.get_index(entry.continent.palette_index());
            world_fills.insert(code.clone(), fill);
        }

        let world_home = match world_layer.projected_bounds() {
            Some((min_x, min_y, max_x, max_y)) => ViewRect {
                center_x: (min_x + max_x) / 2.0,
                center_y: (min_y + max_y) / 2.0,
                span_x: (max_x - min_x) * 1.05,
            },
            None => ViewRect { center_x: 0.0, center_y: 0.0, span_x: 2.0 * std::f64::consts::PI },
        };

        let (fetch_tx, fetch_rx) = mpsc::channel();

        Explorer {
            world_layer,
            world_fills,
            country_data,
            country_layer: None,
            country_fill: BASE_FILL,
            show_country_layer: false,
            drilldown: DrillDown::new(),
            colors,
            viewport: world_home,
            world_home,
            animation: None,
            min_zoom: 1.0,
            hover: None,
            message: None,
            client,
            fetch_tx,
            fetch_rx,
            map_area: Rect::new(0, 0, 1, 1),
            back_area: None,
            home_area: None,
        }
    }

    fn zoom_level(&self) -> f64 {
        self.world_home.span_x / self.viewport.span_x
    }

    fn set_message(&mut self, text: String) {
        self.message = Some((text, Instant::now()));
    }

    /// Start a viewport animation. A superseded drill-down zoom still
    /// counts as finished for its pending join; the state machine drops
    /// it if the token went stale in the meantime.
    fn start_animation(&mut self, to: ViewRect, token: Option<u64>) {
        if let Some(old) = self.animation.take() {
            if let Some(old_token) = old.token {
                let transition = self.drilldown.animation_finished(old_token);
                self.apply_transition(transition);
            }
        }
        self.animation = Some(ZoomAnimation {
            from: self.viewport,
            to,
            started: Instant::now(),
            token,
        });
    }

    /// Viewport that frames a shape with a margin, respecting the screen
    /// aspect ratio so the whole country fits.
    fn frame_shape(&self, shape: &MapShape) -> ViewRect {
        let Some((min_x, min_y, max_x, max_y)) = shape.projected_bounds() else {
            return self.world_home;
        };
        let aspect = (self.map_area.width.max(1) as f64) / (self.map_area.height.max(1) as f64 * 2.0);
        let span_x = ((max_x - min_x) * 1.3).max((max_y - min_y) * 1.3 * aspect).max(1e-6);
        ViewRect {
            center_x: (min_x + max_x) / 2.0,
            center_y: (min_y + max_y) / 2.0,
            span_x,
        }
    }

    /// Click on a world polygon: capture the selection, zoom toward the
    /// country, and fetch its detailed geometry concurrently.
    fn begin_drilldown(&mut self, code: String) {
        let Some(entry) = self.country_data.get(&code) else {
            return; // no drill-down data for this polygon
        };
        let Some(map_asset) = entry.maps.first().cloned() else {
            return;
        };
        let Some(shape) = self.world_layer.get(&code) else {
            return;
        };

        let selection = Selection {
            code: code.clone(),
            name: shape.name.clone(),
            map_asset: map_asset.clone(),
            fill: self.world_fills.get(&code).copied().unwrap_or(BASE_FILL),
        };
        let target = self.frame_shape(shape);

        let token = self.drilldown.begin(selection);
        spawn_country_fetch(self.client.clone(), map_asset, token, self.fetch_tx.clone());
        self.start_animation(target, Some(token));
    }

    /// Back control: restore the world view.
    fn go_back(&mut self) {
        if !self.drilldown.is_country() {
            return;
        }
        self.drilldown.back();
        self.min_zoom = 1.0;
        self.show_country_layer = false;
        self.country_layer = None;
        self.start_animation(self.world_home, None);
    }

    /// Home control: zoom to the drilled-in country if there is one,
    /// otherwise to the world home view. Viewport only, no state change.
    fn go_home(&mut self) {
        let target = match self.drilldown.selection() {
            Some(selection) => {
                let code = selection.code.clone();
                match self.world_layer.get(&code) {
                    Some(shape) => self.frame_shape(shape),
                    None => self.world_home,
                }
            }
            None => self.world_home,
        };
        self.start_animation(target, None);
    }

    fn zoom_in(&mut self) {
        self.animation = None;
        self.viewport.span_x /= ZOOM_STEP;
    }

    fn zoom_out(&mut self) {
        self.animation = None;
        let new_span = self.viewport.span_x * ZOOM_STEP;
        let max_span = self.world_home.span_x / self.min_zoom;
        self.viewport.span_x = new_span.min(max_span);
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        self.animation = None;
        let span_y = self.viewport.span_y(self.map_area);
        self.viewport.center_x += dx * self.viewport.span_x;
        self.viewport.center_y += dy * span_y;
    }

    /// Advance the animation and drain fetch outcomes. Called every tick.
    fn update(&mut self) {
        if let Some(anim) = &self.animation {
            self.viewport = anim.current();
            if anim.finished() {
                let token = anim.token;
                self.viewport = anim.to;
                self.animation = None;
                if let Some(token) = token {
                    let transition = self.drilldown.animation_finished(token);
                    self.apply_transition(transition);
                }
            }
        }

        while let Ok(FetchOutcome { token, result }) = self.fetch_rx.try_recv() {
            let transition = self.drilldown.geometry_arrived(token, result);
            self.apply_transition(transition);
        }

        if let Some((_, since)) = &self.message {
            if since.elapsed() > MESSAGE_TTL {
                self.message = None;
            }
        }
    }

    fn apply_transition(&mut self, transition: Transition) {
        match transition {
            Transition::None => {}
            Transition::EnterCountry { geometry, selection } => {
                self.country_layer = Some(geometry);
                self.country_fill = selection.fill;
                self.show_country_layer = true;
                self.hover = None;
                // No zooming back out past the drilled-in view
                self.min_zoom = self.zoom_level().max(1.0);
                self.set_message(format!("Showing {}", selection.name));
            }
            Transition::Fail { name, error } => {
                self.show_country_layer = false;
                self.set_message(format!("Failed to load {}: {}", name, error));
            }
        }
    }

    fn visible_layer(&self) -> &PolygonLayer {
        if self.show_country_layer {
            self.country_layer.as_ref().unwrap_or(&self.world_layer)
        } else {
            &self.world_layer
        }
    }

    fn fill_for(&self, id: &str) -> Rgb8 {
        if self.show_country_layer {
            self.country_fill
        } else {
            self.world_fills.get(id).copied().unwrap_or(BASE_FILL)
        }
    }

    /// Map a terminal cell to lon/lat through the current viewport.
    fn cell_to_lonlat(&self, column: u16, row: u16) -> Option<(f64, f64)> {
        let area = self.map_area;
        if !area.contains(Position::new(column, row)) {
            return None;
        }
        let span_y = self.viewport.span_y(area);
        let fx = (column - area.x) as f64 / area.width.max(1) as f64;
        let fy = (row - area.y) as f64 / area.height.max(1) as f64;
        let x = self.viewport.center_x - self.viewport.span_x / 2.0 + fx * self.viewport.span_x;
        let y = self.viewport.center_y + span_y / 2.0 - fy * span_y;
        Some(inverse_mercator(x, y))
    }

    fn hover_at(&mut self, column: u16, row: u16) {
        self.hover = self.cell_to_lonlat(column, row).and_then(|(lon, lat)| {
            self.visible_layer()
                .hit_test(lon, lat)
                .map(|s| (s.id.clone(), s.name.clone()))
        });
    }

    fn click_at(&mut self, column: u16, row: u16) {
        if let Some(back) = self.back_area {
            if back.contains(Position::new(column, row)) {
                self.go_back();
                return;
            }
        }
        if let Some(home) = self.home_area {
            if home.contains(Position::new(column, row)) {
                self.go_home();
                return;
            }
        }

        // Country clicks only exist on the world layer
        if self.show_country_layer {
            return;
        }
        if let Some((lon, lat)) = self.cell_to_lonlat(column, row) {
            if let Some(shape) = self.world_layer.hit_test(lon, lat) {
                let code = shape.id.clone();
                self.begin_drilldown(code);
            }
        }
    }

    fn export_snapshot(&mut self) {
        let (layer, fills, prefix) = if self.show_country_layer {
            let layer = match &self.country_layer {
                Some(l) => l.clone(),
                None => return,
            };
            let mut fills = HashMap::new();
            for shape in &layer.shapes {
                fills.insert(shape.id.clone(), self.country_fill);
            }
            let prefix = self
                .drilldown
                .selection()
                .map(|s| s.map_asset.clone())
                .unwrap_or_else(|| "country".to_string());
            (layer, fills, prefix)
        } else {
            (self.world_layer.clone(), self.world_fills.clone(), "world".to_string())
        };

        let filename = export::snapshot_filename(&prefix);
        match export::export_layer_image(&layer, &fills, 1600, 900, &filename) {
            Ok(_) => self.set_message(format!("Exported: {}", filename)),
            Err(e) => self.set_message(format!("Export failed: {}", e)),
        }
    }

    /// Render the visible layer onto a braille canvas.
    fn render_map(&self, area: Rect, frame: &mut Frame) {
        let span_y = self.viewport.span_y(area);
        let x_bounds = [
            self.viewport.center_x - self.viewport.span_x / 2.0,
            self.viewport.center_x + self.viewport.span_x / 2.0,
        ];
        let y_bounds = [
            self.viewport.center_y - span_y / 2.0,
            self.viewport.center_y + span_y / 2.0,
        ];

        let hover_color = self.colors.get_index(HOVER_INDEX);
        let layer = self.visible_layer();

        let canvas = Canvas::default()
            .block(Block::default().borders(Borders::ALL).title(" World Map "))
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| {
                for shape in &layer.shapes {
                    let fill = match &self.hover {
                        Some((id, _)) if *id == shape.id => hover_color,
                        _ => self.fill_for(&shape.id),
                    };
                    let color = Color::Rgb(fill.r, fill.g, fill.b);

                    for polygon in &shape.geometry.0 {
                        let rings = std::iter::once(polygon.exterior())
                            .chain(polygon.interiors().iter());
                        for ring in rings {
                            for segment in ring.0.windows(2) {
                                let (x1, y1) = crate::geometry::mercator(segment[0].x, segment[0].y);
                                let (x2, y2) = crate::geometry::mercator(segment[1].x, segment[1].y);
                                ctx.draw(&CanvasLine { x1, y1, x2, y2, color });
                            }
                        }
                    }
                }
            });

        frame.render_widget(canvas, area);
    }

    /// Render the back/home controls and remember where they are for
    /// click dispatch.
    fn render_controls(&mut self, area: Rect, frame: &mut Frame) {
        let home_width = HOME_LABEL.len() as u16;
        let home_rect = Rect::new(
            area.right().saturating_sub(home_width + 2),
            area.top() + 1,
            home_width,
            1,
        )
        .intersection(area);
        let home = Paragraph::new(HOME_LABEL)
            .style(Style::default().bg(Color::DarkGray).fg(Color::White));
        frame.render_widget(Clear, home_rect);
        frame.render_widget(home, home_rect);
        self.home_area = Some(home_rect);

        if self.drilldown.is_country() {
            let back_width = BACK_LABEL.len() as u16;
            let back_rect = Rect::new(
                area.right().saturating_sub(back_width + 2),
                area.top() + 3,
                back_width,
                1,
            )
            .intersection(area);
            let back = Paragraph::new(BACK_LABEL)
                .style(Style::default().bg(Color::White).fg(Color::Black));
            frame.render_widget(Clear, back_rect);
            frame.render_widget(back, back_rect);
            self.back_area = Some(back_rect);
        } else {
            self.back_area = None;
        }
    }

    /// Tooltip with the hovered region name.
    fn render_tooltip(&self, area: Rect, frame: &mut Frame) {
        let Some((_, name)) = &self.hover else {
            return;
        };
        let label = format!(" {} ", name);
        let width = (label.len() as u16).min(area.width.saturating_sub(2));
        let rect = Rect::new(area.left() + 2, area.top() + 1, width, 1).intersection(area);
        let tooltip = Paragraph::new(label)
            .style(Style::default().bg(Color::Yellow).fg(Color::Black));
        frame.render_widget(Clear, rect);
        frame.render_widget(tooltip, rect);
    }

    fn status_line(&self) -> String {
        let view_str = if self.show_country_layer {
            match self.drilldown.selection() {
                Some(s) => format!("Country: {}", s.name),
                None => "Country".to_string(),
            }
        } else if self.drilldown.is_loading() {
            match self.drilldown.selection() {
                Some(s) => format!("Loading {}...", s.name),
                None => "Loading...".to_string(),
            }
        } else {
            "World".to_string()
        };

        let zoom_str = format!(" | Zoom: {:.1}x", self.zoom_level());
        let msg_str = self
            .message
            .as_ref()
            .map(|(m, _)| format!(" | {}", m))
            .unwrap_or_default();
        let back_hint = if self.drilldown.is_country() { "  B:Back" } else { "" };

        format!(
            " {}{}{} | H:Home{}  E:Export  +/-:Zoom  Arrows:Pan  Q:Quit",
            view_str, zoom_str, msg_str, back_hint,
        )
    }
}

/// Run the atlas explorer until the user quits.
pub fn run_explorer(
    world_layer: PolygonLayer,
    country_data: HashMap<String, CountryEntry>,
    client: GeodataClient,
) -> Result<(), Box<dyn Error>> {
    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut explorer = Explorer::new(world_layer, country_data, client);

    loop {
        explorer.update();

        terminal.draw(|f| {
            let size = f.area();

            let main_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(1),
                    Constraint::Length(1),
                ])
                .split(size);

            let map_area = main_chunks[0];
            let status_area = main_chunks[1];

            explorer.map_area = map_area;
            explorer.render_map(map_area, f);
            explorer.render_controls(map_area, f);
            explorer.render_tooltip(map_area, f);

            let status_para = Paragraph::new(explorer.status_line())
                .style(Style::default().bg(Color::DarkGray).fg(Color::White));
            f.render_widget(status_para, status_area);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => break,
                    KeyCode::Esc => {
                        if explorer.drilldown.is_country() {
                            explorer.go_back();
                        } else {
                            break;
                        }
                    }
                    KeyCode::Char('b') | KeyCode::Char('B') => explorer.go_back(),
                    KeyCode::Char('h') | KeyCode::Char('H') => explorer.go_home(),
                    KeyCode::Char('e') | KeyCode::Char('E') => explorer.export_snapshot(),
                    KeyCode::Char('+') | KeyCode::Char('=') => explorer.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => explorer.zoom_out(),
                    KeyCode::Up => explorer.pan(0.0, 0.1),
                    KeyCode::Down => explorer.pan(0.0, -0.1),
                    KeyCode::Left => explorer.pan(-0.1, 0.0),
                    KeyCode::Right => explorer.pan(0.1, 0.0),
                    _ => {}
                },
                Event::Mouse(MouseEvent { kind, column, row, .. }) => match kind {
                    MouseEventKind::Down(MouseButton::Left) => explorer.click_at(column, row),
                    MouseEventKind::Moved => explorer.hover_at(column, row),
                    MouseEventKind::ScrollUp => explorer.zoom_in(),
                    MouseEventKind::ScrollDown => explorer.zoom_out(),
                    _ => {}
                },
                _ => {}
            }
        }
    }

    // Cleanup
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countries::Continent;
    use crate::geodata::GeodataConfig;

    fn world_layer() -> PolygonLayer {
        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","id":"US","properties":{"name":"United States"},
             "geometry":{"type":"Polygon","coordinates":[[[-125.0,25.0],[-66.0,25.0],[-66.0,49.0],[-125.0,49.0],[-125.0,25.0]]]}},
            {"type":"Feature","id":"SE","properties":{"name":"Sweden"},
             "geometry":{"type":"Polygon","coordinates":[[[11.0,55.0],[24.0,55.0],[24.0,69.0],[11.0,69.0],[11.0,55.0]]]}}
        ]}"#;
        PolygonLayer::parse(doc, &[]).unwrap()
    }

    fn country_data() -> HashMap<String, CountryEntry> {
        let mut data = HashMap::new();
        data.insert(
            "US".to_string(),
            CountryEntry {
                continent: Continent::NorthAmerica,
                maps: vec!["usaLow".to_string()],
            },
        );
        data
    }

    fn explorer() -> Explorer {
        // Unroutable endpoint: spawned fetch threads fail fast and their
        // outcomes are never drained by these tests
        let client = GeodataClient::new(GeodataConfig {
            base_url: "http://127.0.0.1:9/geodata".to_string(),
            timeout_secs: 1,
        });
        let mut explorer = Explorer::new(world_layer(), country_data(), client);
        explorer.map_area = Rect::new(0, 0, 80, 24);
        explorer
    }

    #[test]
    fn test_world_fills_use_continent_palette() {
        let explorer = explorer();
        let expected = explorer
            .colors
            .get_index(Continent::NorthAmerica.palette_index());
        assert_eq!(explorer.world_fills["US"], expected);
        // Sweden has no sentiment entry, so it renders in the base fill
        assert_eq!(explorer.fill_for("SE"), BASE_FILL);
    }

    #[test]
    fn test_click_without_mapping_does_not_drill() {
        let mut explorer = explorer();
        explorer.begin_drilldown("SE".to_string());
        assert!(explorer.drilldown.is_world());
        assert!(explorer.animation.is_none());
    }

    #[test]
    fn test_drilldown_click_starts_fetch_and_zoom() {
        let mut explorer = explorer();
        explorer.begin_drilldown("US".to_string());
        assert!(explorer.drilldown.is_loading());
        assert!(explorer.animation.is_some());
        assert_eq!(explorer.drilldown.selection().unwrap().map_asset, "usaLow");
    }

    #[test]
    fn test_enter_country_pins_min_zoom_and_swaps_layer() {
        let mut explorer = explorer();
        explorer.viewport.span_x = explorer.world_home.span_x / 8.0; // zoomed in 8x
        explorer.apply_transition(Transition::EnterCountry {
            geometry: PolygonLayer::default(),
            selection: Selection {
                code: "US".to_string(),
                name: "United States".to_string(),
                map_asset: "usaLow".to_string(),
                fill: Rgb8::new(1, 2, 3),
            },
        });
        assert!(explorer.show_country_layer);
        assert!((explorer.min_zoom - 8.0).abs() < 1e-9);
        assert_eq!(explorer.country_fill, Rgb8::new(1, 2, 3));
    }

    #[test]
    fn test_zoom_out_respects_pinned_minimum() {
        let mut explorer = explorer();
        explorer.viewport.span_x = explorer.world_home.span_x / 4.0;
        explorer.min_zoom = 4.0;
        for _ in 0..10 {
            explorer.zoom_out();
        }
        assert!(explorer.zoom_level() >= 4.0 - 1e-9);
    }

    #[test]
    fn test_back_restores_world_view() {
        let mut explorer = explorer();
        let token = explorer.drilldown.begin(Selection {
            code: "US".to_string(),
            name: "United States".to_string(),
            map_asset: "usaLow".to_string(),
            fill: Rgb8::new(1, 2, 3),
        });
        explorer.drilldown.animation_finished(token);
        let transition = explorer
            .drilldown
            .geometry_arrived(token, Ok(PolygonLayer::default()));
        explorer.apply_transition(transition);
        assert!(explorer.show_country_layer);

        explorer.go_back();
        assert!(!explorer.show_country_layer);
        assert!(explorer.country_layer.is_none());
        assert!((explorer.min_zoom - 1.0).abs() < 1e-9);
        assert!(explorer.drilldown.is_world());
    }

    #[test]
    fn test_home_without_selection_targets_world() {
        let mut explorer = explorer();
        explorer.viewport.span_x = explorer.world_home.span_x / 4.0;
        explorer.go_home();
        let anim = explorer.animation.as_ref().unwrap();
        assert_eq!(anim.to, explorer.world_home);
        assert!(anim.token.is_none());
    }

    #[test]
    fn test_home_with_selection_targets_country() {
        let mut explorer = explorer();
        explorer.begin_drilldown("US".to_string());
        let us_frame = explorer.frame_shape(explorer.world_layer.get("US").unwrap());
        explorer.go_home();
        let anim = explorer.animation.as_ref().unwrap();
        assert_eq!(anim.to, us_frame);
    }

    #[test]
    fn test_cell_to_lonlat_round_trip() {
        let explorer = explorer();
        // Center cell maps near the viewport center
        let (lon, lat) = explorer.cell_to_lonlat(40, 12).unwrap();
        let (x, y) = crate::geometry::mercator(lon, lat);
        assert!((x - explorer.viewport.center_x).abs() < explorer.viewport.span_x * 0.05);
        assert!((y - explorer.viewport.center_y).abs() < explorer.viewport.span_x * 0.1);
        // Outside the map area there is no hit
        assert!(explorer.cell_to_lonlat(200, 200).is_none());
    }

    #[test]
    fn test_failed_fetch_surfaces_a_message() {
        let mut explorer = explorer();
        explorer.begin_drilldown("US".to_string());
        let token = explorer.drilldown.loading_token().unwrap();
        let transition = explorer.drilldown.geometry_arrived(
            token,
            Err(crate::geodata::GeodataError::Network("unreachable".into())),
        );
        explorer.apply_transition(transition);
        assert!(!explorer.show_country_layer);
        let (message, _) = explorer.message.as_ref().unwrap();
        assert!(message.contains("Failed to load United States"));
        assert!(explorer.drilldown.is_world());
    }
}
