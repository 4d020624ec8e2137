/// Vista terminal viewer
///
/// Usage: vista-terminal [config.toml]
///
/// Controls:
///   - W/S A/D F/C: Move the camera
///   - Left drag: Yaw and pitch the camera, right drag: roll
///   - Scroll: Field of view
///   - J/L I/K N/M: Turn the active mesh
///   - 1-6, 7/8: Move and scale the active mesh
///   - -/=: Previous/next mesh
///   - P [ O: Symmetric, asymmetric and orthographic projections
///   - R: Reset the camera
///   - Q/ESC: Quit
use log::info;
use std::env;
use vista_terminal::{AppError, DemoConfig, TerminalApp};

fn main() -> Result<(), AppError> {
    env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => {
            info!("loading configuration from {}", path);
            DemoConfig::load(path)?
        }
        None => DemoConfig::default(),
    };

    let mut app = TerminalApp::new(config)?;
    app.run()
}
