use std::f64::consts::FRAC_PI_2;

use anyhow::{bail, Context, Result};
use log::info;

use mechanics_lab::core::geometry::polygon_from_coords;
use mechanics_lab::core::math::Vec2;
use mechanics_lab::engine::config::{
    SimulationConfig, DEFAULT_TICKS_PER_FRAME, FRAME_RENDER_TIME,
};
use mechanics_lab::engine::game_loop::FrameDriver;
use mechanics_lab::engine::physics::body::{presets, BodyBuilder};
use mechanics_lab::engine::physics::{
    DebugRenderer, Integrator, MutualGravitation, SimulationModel, Spring,
};

const USAGE: &str = "usage: mechanics-lab [balls|spring|drop|orbit|ramp|pendulums] \
                     [integrator] [frames] [time scale]";

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let scenario = args.first().map(String::as_str).unwrap_or("balls");
    let integrator: Integrator = match args.get(1) {
        Some(name) => name.parse()?,
        None => Integrator::default(),
    };
    let frames: u32 = match args.get(2) {
        Some(count) => count
            .parse()
            .with_context(|| format!("Invalid frame count: {count}"))?,
        None => 120,
    };
    let time_scale: f64 = match args.get(3) {
        Some(scale) => scale
            .parse()
            .with_context(|| format!("Invalid time scale: {scale}"))?,
        None => 1.0,
    };

    let config = SimulationConfig::from_frame_rate(
        FRAME_RENDER_TIME,
        DEFAULT_TICKS_PER_FRAME,
        time_scale,
    )
    .with_integrator(integrator);
    let mut model = match scenario {
        "balls" => balls(config)?,
        "spring" => spring(config)?,
        "drop" => drop(config)?,
        "orbit" => orbit(config)?,
        "ramp" => ramp(config)?,
        "pendulums" => pendulums(config)?,
        other => bail!("Unknown scenario: {other}\n{USAGE}"),
    };

    info!("Starting scenario '{}' with {} for {} frames", scenario, integrator, frames);

    let mut driver = FrameDriver::for_model(&model);
    let mut renderer = DebugRenderer::new();
    let initial_energy = model.full_energy();

    for frame in 1..=frames {
        driver.run_frame(&mut model, &mut renderer);
        if frame % 30 == 0 {
            info!(
                "t={:.3}s energy={:.6} drawn={}",
                model.time(),
                model.full_energy(),
                renderer.commands().len()
            );
        }
    }

    let final_energy = model.full_energy();
    info!(
        "Finished after {} ticks: energy {:.6} -> {:.6} ({:+.3e} relative)",
        driver.update_count(),
        initial_energy,
        final_energy,
        (final_energy - initial_energy) / initial_energy.abs().max(f64::EPSILON)
    );
    for (index, body) in model.bodies().iter().enumerate() {
        info!("body {}: position {:?} velocity {:?}", index, body.position, body.velocity);
    }

    Ok(())
}

/// Two equal balls meeting head-on between two walls
fn balls(config: SimulationConfig) -> Result<SimulationModel> {
    let mut model = SimulationModel::new(config.with_gravity_enabled(false))?;
    model.add_object(presets::line(Vec2::new(-4.0, -2.0), Vec2::new(0.0, 4.0))?);
    model.add_object(presets::line(Vec2::new(4.0, 2.0), Vec2::new(0.0, -4.0))?);
    for (x, vx) in [(-1.5, 2.0), (1.5, -2.0)] {
        let mut ball = presets::circle(0.5, Vec2::new(x, 0.0), 1.0)?;
        ball.velocity = Vec2::new(vx, 0.0);
        model.add_object(ball);
    }
    Ok(model)
}

/// A weight on a spring hanging from a fixed anchor
fn spring(config: SimulationConfig) -> Result<SimulationModel> {
    let mut model = SimulationModel::new(config)?;
    let anchor = model.add_object(presets::anchor(Vec2::new(0.0, 3.0)));
    let weight = model.dynamic_body().position(0.5, 1.0).mass(2.0).build()?;
    let weight = model.add_object(weight);
    model.add_force_generator(Spring::new(anchor, weight, 1.5, 40.0))?;
    model.add_trail(weight, 10, 200)?;
    Ok(model)
}

/// A ball dropped onto the ground from five metres
fn drop(config: SimulationConfig) -> Result<SimulationModel> {
    let mut model = SimulationModel::new(config)?;
    model.add_object(presets::line(Vec2::new(-10.0, 0.0), Vec2::new(20.0, 0.0))?);
    let ball = presets::circle(0.5, Vec2::new(0.0, 5.0), 1.0)?;
    let ball = model.add_object(ball);
    model.add_trail(ball, 20, 0)?;
    model.set_render_velocities(true);
    Ok(model)
}

/// A light body circling a heavy one
fn orbit(config: SimulationConfig) -> Result<SimulationModel> {
    let mut model = SimulationModel::new(config.with_gravity_enabled(false))?;
    let sun = model.dynamic_body().mass(1000.0).build()?;
    model.add_object(sun);
    // Circular speed sqrt(G * M / r) for G = 1, M = 1000, r = 10
    let planet = model
        .dynamic_body()
        .position(10.0, 0.0)
        .velocity(0.0, 10.0)
        .build()?;
    let planet = model.add_object(planet);
    model.add_force_generator(MutualGravitation::new(1.0))?;
    model.add_trail(planet, 50, 500)?;
    Ok(model)
}

/// A ball dropped onto a fixed triangular ramp
fn ramp(config: SimulationConfig) -> Result<SimulationModel> {
    let mut model = SimulationModel::new(config)?;
    let triangle = polygon_from_coords(&[-6.0, 0.0, -6.0, 3.0, 6.0, 0.0])?;
    model.add_object(BodyBuilder::new_static().shape(triangle).build()?);
    model.add_object(presets::line(Vec2::new(-10.0, 0.0), Vec2::new(20.0, 0.0))?);
    let ball = model.add_object(presets::circle(0.3, Vec2::new(-2.0, 5.0), 1.0)?);
    model.add_trail(ball, 20, 300)?;
    Ok(model)
}

/// Two damped pendulums coupled by a spring between their weights
fn pendulums(config: SimulationConfig) -> Result<SimulationModel> {
    let mut model = SimulationModel::new(config)?;
    let arm = 2.0;
    let left = presets::pendulum(Vec2::new(-1.0, 3.0), arm, -FRAC_PI_2 + 0.4, 1.0, 0.05)?;
    let right = presets::pendulum(Vec2::new(1.0, 3.0), arm, -FRAC_PI_2, 1.0, 0.05)?;
    let left = model.add_object(left);
    let right = model.add_object(right);
    let weight = Vec2::new(arm, 0.0);
    model.add_force_generator(Spring::new(left, right, 2.0, 8.0).with_anchors(weight, weight))?;
    model.add_trail(left, 20, 300)?;
    Ok(model)
}
