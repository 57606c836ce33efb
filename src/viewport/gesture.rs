use eframe::egui::{self, Key, Pos2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetRole {
    Background,
    Node,
    Edge,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureKind {
    Wheel { delta_y: f32 },
    DragStart,
    DragMove,
    DragEnd,
    DoubleClick,
}

/// Input descriptor independent of egui's event shapes. For drag events
/// `target` is the role under the pointer when the drag began.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub pointer: Pos2,
    pub target: TargetRole,
}

impl GestureEvent {
    pub fn new(kind: GestureKind, pointer: Pos2, target: TargetRole) -> Self {
        Self {
            kind,
            pointer,
            target,
        }
    }

    pub fn is_drag(&self) -> bool {
        matches!(
            self.kind,
            GestureKind::DragStart | GestureKind::DragMove | GestureKind::DragEnd
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureOutcome {
    Consumed,
    Ignored,
}

pub type GestureFilter = Box<dyn Fn(&GestureEvent) -> bool>;

pub fn allow_all(_event: &GestureEvent) -> bool {
    true
}

/// Leaves drags that start on an element to the pane; wheel and background
/// gestures still pan and zoom.
pub fn background_drags_only(event: &GestureEvent) -> bool {
    !(event.is_drag() && event.target != TargetRole::Background)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportCommand {
    ZoomIn,
    ZoomOut,
    Reset,
    FitToContent,
}

pub fn command_for_key(key: Key) -> Option<ViewportCommand> {
    match key {
        Key::Plus | Key::Equals => Some(ViewportCommand::ZoomIn),
        Key::Minus => Some(ViewportCommand::ZoomOut),
        Key::Home => Some(ViewportCommand::Reset),
        Key::Num0 => Some(ViewportCommand::FitToContent),
        _ => None,
    }
}

/// Removes handled key presses from the frame's event queue so no other
/// widget acts on them, and returns the commands in press order.
pub fn take_viewport_commands(input: &mut egui::InputState) -> Vec<ViewportCommand> {
    let mut commands = Vec::new();
    input.events.retain(|event| {
        let egui::Event::Key {
            key,
            pressed,
            modifiers,
            ..
        } = event
        else {
            return true;
        };

        if modifiers.command || modifiers.alt {
            return true;
        }

        match command_for_key(*key) {
            Some(command) => {
                if *pressed {
                    commands.push(command);
                }
                false
            }
            None => true,
        }
    });
    commands
}
