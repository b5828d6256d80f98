use std::hash::Hash;
use fxhash::FxHashSet;
use glam::Vec2;

/// Pointer input forwarded by a host, in logical pixels.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum PointerEvent {
    Pressed { button: PointerButton },
    Released { button: PointerButton },
    Moved { position: Vec2 },
    /// Positive values scroll down, towards the user.
    Wheel { delta: f32 },
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/**
 * Pointer state accumulated from [`PointerEvent`]s.
 */
#[derive(Default, Debug)]
pub struct Pointer {
    buttons: ButtonState<PointerButton>,
    position: Option<Vec2>,
    movement: Vec2,
}

impl Pointer {

    /// Applies an event, returning the movement it caused.
    pub fn apply(&mut self, event: PointerEvent) -> Vec2 {
        match event {
            PointerEvent::Pressed { button } => self.buttons.press(button),
            PointerEvent::Released { button } => self.buttons.release(button),
            PointerEvent::Moved { position } => {
                let movement = self.position.map_or(Vec2::ZERO, |previous| position - previous);
                self.position = Some(position);
                self.movement += movement;
                return movement;
            },
            PointerEvent::Wheel { .. } => {},
        }
        Vec2::ZERO
    }

    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    // Movement of the pointer since the last sync.
    pub fn movement(&self) -> Vec2 {
        self.movement
    }

    pub fn buttons(&self) -> &ButtonState<PointerButton> {
        &self.buttons
    }

    pub fn sync_previous_state(&mut self) {
        self.buttons.sync_previous_state();
        self.movement = Vec2::ZERO;
    }
}

/**
 * The state of a collection of buttons coming from some device.
 * For example, the buttons on a mouse, or the keys on a keyboard.
 */
#[derive(Debug)]
pub struct ButtonState<B> {
    previous_state: FxHashSet<B>,
    current_state: FxHashSet<B>,
}

impl<B> Default for ButtonState<B> {
    fn default() -> Self {
        Self {
            previous_state: FxHashSet::default(),
            current_state: FxHashSet::default(),
        }
    }
}

impl<B> ButtonState<B>
where
    B: Copy + Eq + Hash
{
    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Simulates a button press.
    */
    pub fn press(&mut self, button: B) {
        self.current_state.insert(button);
    }

    /**
     * Simulates a button release.
    */
    pub fn release(&mut self, button: B) {
        self.current_state.remove(&button);
    }

    /**
     * True if a button is pressed.
    */
    pub fn is_pressed(&self, button: B) -> bool {
        self.current_state.contains(&button)
    }

    /**
     * True if a button is pressed, but wasn't in the previous sync.
    */
    pub fn is_just_pressed(&self, button: B) -> bool {
        self.current_state.contains(&button) && !self.previous_state.contains(&button)
    }

    /**
     * True if a button is not pressed, but was in the previous sync.
    */
    pub fn is_just_released(&self, button: B) -> bool {
        !self.current_state.contains(&button) && self.previous_state.contains(&button)
    }

    /**
     * Sync previous button state with current button state.
    */
    pub fn sync_previous_state(&mut self) {
        self.previous_state.clone_from(&self.current_state);
    }
}


#[cfg(test)]
mod test {
    use glam::Vec2;
    use super::{ButtonState, Pointer, PointerButton, PointerEvent};

    #[test]
    fn just_pressed_until_synced() {
        let mut buttons = ButtonState::new();
        buttons.press(PointerButton::Left);
        assert!(buttons.is_just_pressed(PointerButton::Left));
        buttons.sync_previous_state();
        assert!(buttons.is_pressed(PointerButton::Left));
        assert!(!buttons.is_just_pressed(PointerButton::Left));
        buttons.release(PointerButton::Left);
        assert!(buttons.is_just_released(PointerButton::Left));
    }

    #[test]
    fn first_move_has_no_movement() {
        let mut pointer = Pointer::default();
        assert_eq!(Vec2::ZERO, pointer.apply(PointerEvent::Moved { position: Vec2::new(10.0, 10.0) }));
        assert_eq!(Vec2::new(5.0, -2.0), pointer.apply(PointerEvent::Moved { position: Vec2::new(15.0, 8.0) }));
        assert_eq!(Vec2::new(5.0, -2.0), pointer.movement());
        pointer.sync_previous_state();
        assert_eq!(Vec2::ZERO, pointer.movement());
    }
}
