/// Commands that drive the camera, the active mesh and the projection
use log::{debug, info};
use vista_core::{Camera, MathError, ProjectionMode, Scene, SceneError};

use crate::config::DemoConfig;

/// Asymmetric frustum preset: left, right, bottom, top, near, far
pub const ASYMMETRIC_PRESET: [f64; 6] = [-4.0, 6.0, -6.0, 5.0, 2.0, 20.0];
/// Orthographic box preset: left, right, bottom, top, near, far
pub const ORTHOGRAPHIC_PRESET: [f64; 6] = [-4.0, 6.0, -6.0, 5.0, 0.01, 30.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Right,
    Up,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Pitch,
    Yaw,
    Roll,
}

/// One user action. Amounts are in steps; [`apply`] scales them by the
/// configured deltas, and the sign picks the direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    MoveCamera(Axis, f32),
    /// Mouse drag, in cells
    TurnCamera(Turn, f32),
    ResetCamera,
    MoveMesh(Axis, f32),
    TurnMesh(Turn, f32),
    ScaleMeshUp,
    ScaleMeshDown,
    NextMesh,
    PreviousMesh,
    SymmetricPerspective,
    AsymmetricPerspective,
    Orthographic,
    /// Widen (positive) or narrow (negative) the field of view
    AdjustFov(f64),
    Resize { columns: u16, rows: u16 },
    Quit,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Math(#[from] MathError),
}

/// Settings and view parameters the commands read and update
#[derive(Debug, Clone)]
pub struct ViewState {
    pub config: DemoConfig,
    /// Degrees
    pub vertical_fov: f64,
    pub aspect: f64,
    pub running: bool,
}

impl ViewState {
    pub fn new(config: DemoConfig, columns: u16, rows: u16) -> Self {
        let aspect = config.aspect_ratio(columns, rows);
        Self {
            vertical_fov: config.camera.vertical_fov,
            aspect,
            running: true,
            config,
        }
    }

    fn apply_symmetric(&self, camera: &mut Camera) {
        let camera_config = &self.config.camera;
        camera.set_projection_symmetric_perspective(
            self.vertical_fov,
            self.aspect,
            camera_config.near,
            camera_config.far,
        );
    }
}

/// Carry out `command`. Mesh commands act on the scene's active mesh and fail
/// with [`SceneError::Empty`] when there is none.
pub fn apply(
    command: Command,
    camera: &mut Camera,
    scene: &mut Scene,
    view: &mut ViewState,
) -> Result<(), CommandError> {
    let controls = view.config.controls.clone();
    match command {
        Command::MoveCamera(axis, steps) => {
            let distance = controls.move_delta * steps;
            match axis {
                Axis::Right => camera.move_right(distance),
                Axis::Up => camera.move_up(distance),
                Axis::Back => camera.move_back(distance),
            }
        }
        Command::TurnCamera(turn, cells) => {
            let degrees = controls.mouse_degrees * cells;
            match turn {
                Turn::Pitch => camera.pitch(degrees),
                Turn::Yaw => camera.yaw(degrees),
                Turn::Roll => camera.roll(degrees),
            }
        }
        Command::ResetCamera => camera.reset_pose()?,
        Command::MoveMesh(axis, steps) => {
            let mesh = scene.active_mesh_mut()?;
            let distance = controls.move_delta * steps;
            match axis {
                Axis::Right => mesh.move_right(distance),
                Axis::Up => mesh.move_up(distance),
                Axis::Back => mesh.move_back(distance),
            }
        }
        Command::TurnMesh(turn, steps) => {
            let mesh = scene.active_mesh_mut()?;
            let degrees = controls.degree_delta * steps;
            match turn {
                Turn::Pitch => mesh.pitch(degrees),
                Turn::Yaw => mesh.yaw(degrees),
                Turn::Roll => mesh.roll(degrees),
            }
        }
        Command::ScaleMeshUp => scene.active_mesh_mut()?.scale_local(controls.scale_up),
        Command::ScaleMeshDown => scene.active_mesh_mut()?.scale_local(controls.scale_down),
        Command::NextMesh => {
            let name = scene.activate_next_mesh()?;
            info!("active mesh: {}", name);
        }
        Command::PreviousMesh => {
            let name = scene.activate_previous_mesh()?;
            info!("active mesh: {}", name);
        }
        Command::SymmetricPerspective => {
            view.vertical_fov = view.config.camera.vertical_fov;
            view.apply_symmetric(camera);
        }
        Command::AsymmetricPerspective => {
            let [l, r, b, t, n, f] = ASYMMETRIC_PRESET;
            camera.set_projection_asymmetric_perspective(l, r, b, t, n, f);
        }
        Command::Orthographic => {
            let [l, r, b, t, n, f] = ORTHOGRAPHIC_PRESET;
            camera.set_projection_orthographic(l, r, b, t, n, f);
        }
        Command::AdjustFov(steps) => {
            let camera_config = &view.config.camera;
            view.vertical_fov = (view.vertical_fov + steps * controls.fov_step)
                .clamp(camera_config.min_fov, camera_config.max_fov);
            view.apply_symmetric(camera);
            debug!("vertical fov {:.1}", view.vertical_fov);
        }
        Command::Resize { columns, rows } => {
            view.aspect = view.config.aspect_ratio(columns, rows);
            if let ProjectionMode::SymmetricPerspective { .. } = camera.projection_mode() {
                view.apply_symmetric(camera);
            }
        }
        Command::Quit => view.running = false,
    }
    Ok(())
}
