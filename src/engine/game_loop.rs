/// Frame driving for a simulation
///
/// Runs a fixed number of physics ticks per rendered frame. Time only moves
/// through the configured `dt`, so a frame produces the same result no
/// matter how long the host takes to draw it.
use crate::engine::physics::{Renderer, SimulationModel};

/// Frame driver state
#[derive(Debug, Clone)]
pub struct FrameDriver {
    /// Physics ticks per rendered frame
    ticks_per_frame: u32,

    /// Whether ticking is suspended
    paused: bool,

    /// Frames rendered
    frame_count: u64,

    /// Ticks executed through this driver
    update_count: u64,
}

impl FrameDriver {
    /// Create a driver running `ticks_per_frame` ticks per frame
    pub fn new(ticks_per_frame: u32) -> Self {
        Self {
            ticks_per_frame: ticks_per_frame.max(1),
            paused: false,
            frame_count: 0,
            update_count: 0,
        }
    }

    /// Create a driver using the model's configured ticks per frame
    pub fn for_model(model: &SimulationModel) -> Self {
        Self::new(model.config().ticks_per_frame)
    }

    /// Advance one frame: run the ticks unless paused, then render.
    /// Returns the number of ticks run.
    pub fn run_frame(&mut self, model: &mut SimulationModel, renderer: &mut dyn Renderer) -> u32 {
        let ticks = if self.paused { 0 } else { self.ticks_per_frame };
        model.run(ticks);
        self.update_count += ticks as u64;
        self.render(model, renderer);
        ticks
    }

    /// Run exactly one tick and render, paused or not
    pub fn step(&mut self, model: &mut SimulationModel, renderer: &mut dyn Renderer) {
        model.update();
        self.update_count += 1;
        self.render(model, renderer);
    }

    fn render(&mut self, model: &SimulationModel, renderer: &mut dyn Renderer) {
        model.render_frame(renderer);
        self.frame_count += 1;
    }

    pub fn ticks_per_frame(&self) -> u32 {
        self.ticks_per_frame
    }

    /// Get total number of frames rendered
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get total number of ticks executed
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Check if the simulation is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause the simulation
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("Simulation paused");
        }
    }

    /// Resume the simulation
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            log::info!("Simulation resumed");
        }
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }
}
