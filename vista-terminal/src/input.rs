/// Keyboard and mouse mapping from crossterm events to [`Command`]s
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

use crate::controls::{Axis, Command, Turn};

/// Key bindings:
///
/// | keys        | action                              |
/// |-------------|-------------------------------------|
/// | W/S A/D F/C | camera forward/back, left/right, up/down |
/// | R           | reset camera                        |
/// | J/L I/K N/M | active mesh yaw, pitch, roll        |
/// | 1-6         | active mesh right/left, up/down, back/forward |
/// | 7/8         | active mesh scale up/down           |
/// | - / =       | previous / next mesh                |
/// | P [ O       | symmetric, asymmetric, orthographic |
/// | Q Esc       | quit                                |
pub fn map_key(code: KeyCode) -> Option<Command> {
    let c = match code {
        KeyCode::Esc => return Some(Command::Quit),
        KeyCode::Char(c) => c.to_ascii_lowercase(),
        _ => return None,
    };
    let command = match c {
        'w' => Command::MoveCamera(Axis::Back, -1.0),
        's' => Command::MoveCamera(Axis::Back, 1.0),
        'a' => Command::MoveCamera(Axis::Right, -1.0),
        'd' => Command::MoveCamera(Axis::Right, 1.0),
        'c' => Command::MoveCamera(Axis::Up, -1.0),
        'f' => Command::MoveCamera(Axis::Up, 1.0),
        'r' => Command::ResetCamera,
        'j' => Command::TurnMesh(Turn::Yaw, 1.0),
        'l' => Command::TurnMesh(Turn::Yaw, -1.0),
        'i' => Command::TurnMesh(Turn::Pitch, 1.0),
        'k' => Command::TurnMesh(Turn::Pitch, -1.0),
        'n' => Command::TurnMesh(Turn::Roll, 1.0),
        'm' => Command::TurnMesh(Turn::Roll, -1.0),
        '1' => Command::MoveMesh(Axis::Right, 1.0),
        '2' => Command::MoveMesh(Axis::Right, -1.0),
        '3' => Command::MoveMesh(Axis::Up, 1.0),
        '4' => Command::MoveMesh(Axis::Up, -1.0),
        '5' => Command::MoveMesh(Axis::Back, 1.0),
        '6' => Command::MoveMesh(Axis::Back, -1.0),
        '7' => Command::ScaleMeshUp,
        '8' => Command::ScaleMeshDown,
        '-' => Command::PreviousMesh,
        '=' => Command::NextMesh,
        'p' => Command::SymmetricPerspective,
        '[' => Command::AsymmetricPerspective,
        'o' => Command::Orthographic,
        'q' => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// Turns terminal events into commands, tracking the mouse between drags.
///
/// Left drag yaws and pitches the camera, right drag rolls it, and the scroll
/// wheel changes the field of view.
#[derive(Debug, Default)]
pub struct InputMapper {
    last_mouse: Option<(u16, u16)>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_event(&mut self, event: &Event) -> Vec<Command> {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if *kind != KeyEventKind::Release => {
                map_key(*code).into_iter().collect()
            }
            Event::Mouse(mouse) => self.map_mouse(mouse),
            Event::Resize(columns, rows) => vec![Command::Resize {
                columns: *columns,
                rows: *rows,
            }],
            _ => Vec::new(),
        }
    }

    fn map_mouse(&mut self, mouse: &MouseEvent) -> Vec<Command> {
        let position = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(_) => {
                self.last_mouse = Some(position);
                Vec::new()
            }
            MouseEventKind::Up(_) => {
                self.last_mouse = None;
                Vec::new()
            }
            MouseEventKind::Drag(button) => {
                let (dx, dy) = match self.last_mouse.replace(position) {
                    Some((x, y)) => (
                        mouse.column as f32 - x as f32,
                        mouse.row as f32 - y as f32,
                    ),
                    None => return Vec::new(),
                };
                match button {
                    MouseButton::Left => vec![
                        Command::TurnCamera(Turn::Yaw, dx),
                        Command::TurnCamera(Turn::Pitch, dy),
                    ],
                    MouseButton::Right => vec![Command::TurnCamera(Turn::Roll, dx)],
                    MouseButton::Middle => Vec::new(),
                }
            }
            MouseEventKind::ScrollUp => vec![Command::AdjustFov(1.0)],
            MouseEventKind::ScrollDown => vec![Command::AdjustFov(-1.0)],
            _ => Vec::new(),
        }
    }
}
