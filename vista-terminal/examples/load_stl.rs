/// Example: View an STL model next to the demo meshes
///
/// Usage: cargo run --example load_stl -- path/to/file.stl
use std::env;
use vista_terminal::{AppError, DemoConfig, TerminalApp};

fn main() -> Result<(), AppError> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = DemoConfig::default();
    match args.get(1) {
        Some(path) => config.model = Some(path.into()),
        None => eprintln!("Usage: {} <stl-file>\n\nNo STL file provided, showing the demo meshes only", args[0]),
    }

    // the model sits below the other meshes, C lowers the camera
    let mut app = TerminalApp::new(config)?;
    app.run()
}
