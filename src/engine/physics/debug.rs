use crate::core::math::Vec2;

/// Drawing capability the simulation consumes but never implements.
///
/// Bodies, trails and velocity vectors are pushed through this trait once per
/// rendered frame. A canvas, a GPU pipeline or a test recorder can sit
/// behind it.
pub trait Renderer {
    /// Called before anything is drawn for a frame
    fn prepare_frame(&mut self) {}

    fn draw_line(&mut self, from: Vec2, to: Vec2);

    /// Closed polygon through `points`
    fn draw_polygon(&mut self, points: &[Vec2]);

    fn draw_circle(&mut self, center: Vec2, radius: f64);

    /// Arrow from `origin` along `vector`
    fn draw_vector(&mut self, origin: Vec2, vector: Vec2);

    /// Called once everything for a frame has been drawn
    fn finish_frame(&mut self) {}
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line { from: Vec2, to: Vec2 },
    Polygon(Vec<Vec2>),
    Circle { center: Vec2, radius: f64 },
    Vector { origin: Vec2, vector: Vec2 },
}

/// Headless renderer that records draw calls of the most recent frame
#[derive(Debug)]
pub struct DebugRenderer {
    commands: Vec<DrawCommand>,
    frames: u64,
    enabled: bool,
}

impl DebugRenderer {
    /// Create a new debug renderer
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            frames: 0,
            enabled: true,
        }
    }

    /// Enable or disable recording
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if recording is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Commands drawn since the last `prepare_frame`
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of completed frames
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn polygons(&self) -> impl Iterator<Item = &[Vec2]> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Polygon(points) => Some(points.as_slice()),
            _ => None,
        })
    }

    pub fn vectors(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Vector { origin, vector } => Some((*origin, *vector)),
            _ => None,
        })
    }

    fn record(&mut self, command: DrawCommand) {
        if self.enabled {
            self.commands.push(command);
        }
    }
}

impl Default for DebugRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for DebugRenderer {
    fn prepare_frame(&mut self) {
        self.commands.clear();
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2) {
        self.record(DrawCommand::Line { from, to });
    }

    fn draw_polygon(&mut self, points: &[Vec2]) {
        self.record(DrawCommand::Polygon(points.to_vec()));
    }

    fn draw_circle(&mut self, center: Vec2, radius: f64) {
        self.record(DrawCommand::Circle { center, radius });
    }

    fn draw_vector(&mut self, origin: Vec2, vector: Vec2) {
        self.record(DrawCommand::Vector { origin, vector });
    }

    fn finish_frame(&mut self) {
        self.frames += 1;
    }
}
