/// Interactive terminal viewer for vista scenes
use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use log::{info, warn};
use std::cell::RefCell;
use std::io::{self, stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};
use vista_core::{Camera, Device, MathError, ProjectionMode, Scene, SceneError, SharedDevice, Vec3};

pub mod config;
pub mod controls;
pub mod demo;
pub mod input;
pub mod raster;

pub use config::{ConfigError, DemoConfig};
pub use raster::TerminalDevice;

use controls::{Command, ViewState};
use demo::{DemoError, DemoShaders};
use input::InputMapper;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Demo(#[from] DemoError),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    terminal: Rc<RefCell<TerminalDevice>>,
    device: SharedDevice,
    scene: Scene,
    camera: Camera,
    view: ViewState,
    input: InputMapper,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Build the demo scene sized to the current terminal.
    pub fn new(config: DemoConfig) -> Result<Self, AppError> {
        let (columns, rows) = terminal::size()?;
        Self::with_size(config, columns, rows)
    }

    pub fn with_size(config: DemoConfig, columns: u16, rows: u16) -> Result<Self, AppError> {
        let terminal = Rc::new(RefCell::new(TerminalDevice::new(columns as usize, rows as usize)));
        let device: SharedDevice = terminal.clone();

        let shaders = DemoShaders::new(&device)?;
        let scene = demo::build_scene(&device, &shaders, &config, &mut rand::thread_rng())?;

        let view = ViewState::new(config, columns, rows);
        let camera_config = &view.config.camera;
        let camera = Camera::new(
            Vec3::from(camera_config.eye),
            Vec3::from(camera_config.back),
            camera_config.near,
            camera_config.far,
            view.aspect,
            view.vertical_fov,
        )?;

        Ok(Self {
            terminal,
            device,
            scene,
            camera,
            view,
            input: InputMapper::new(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn is_running(&self) -> bool {
        self.view.running
    }

    pub fn run(&mut self) -> Result<(), AppError> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide, EnableMouseCapture)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> Result<(), AppError> {
        let target_frame_time = Duration::from_secs(1) / self.view.config.render.target_fps;
        let mut stdout = stdout();

        while self.view.running {
            let frame_start = Instant::now();

            while event::poll(Duration::ZERO)? {
                let event = event::read()?;
                for command in self.input.map_event(&event) {
                    self.handle(command);
                }
            }

            self.render(&mut stdout)?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        info!("viewer closed");
        Ok(())
    }

    /// Apply one command. Failures such as a mesh command on an empty scene
    /// are logged and the frame goes on.
    pub fn handle(&mut self, command: Command) {
        if let Command::Resize { columns, rows } = command {
            self.device.borrow_mut().viewport(0, 0, columns as u32, rows as u32);
        }
        if let Err(e) = controls::apply(command, &mut self.camera, &mut self.scene, &mut self.view) {
            warn!("{:?} ignored: {}", command, e);
        }
    }

    /// Draw the scene and the status line to `out`.
    pub fn render<W: Write>(&mut self, out: &mut W) -> Result<(), AppError> {
        self.device.borrow_mut().clear();
        self.scene
            .draw(&self.camera.view_matrix(), &self.camera.projection_matrix())?;

        let terminal = self.terminal.borrow();
        terminal.present(out)?;

        let (width, _) = terminal.size();
        let status: String = self.status_line().chars().take(width).collect();
        queue!(
            out,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(status),
            ResetColor
        )?;

        out.flush()?;
        Ok(())
    }

    fn status_line(&self) -> String {
        let projection = match self.camera.projection_mode() {
            ProjectionMode::SymmetricPerspective { vertical_fov, .. } => {
                format!("perspective {:.0} deg", vertical_fov)
            }
            ProjectionMode::AsymmetricPerspective { .. } => "asymmetric frustum".to_string(),
            ProjectionMode::Orthographic { .. } => "orthographic".to_string(),
        };
        format!(
            "vista | {} | {} | FPS: {:.1} | WASD/CF move, JL/IK/NM turn, -/= mesh, P/[/O projection, Q quit",
            self.scene.active_name().unwrap_or("-"),
            projection,
            self.fps
        )
    }
}
