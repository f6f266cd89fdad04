//! Window events to demo actions.

use glfw::{Action, Key, WindowEvent};
use penumbra::camera::{CameraMovement, InputState};
use penumbra::motion_blur::{MAX_BLUR_SCALE, MAX_SAMPLES};
use penumbra::renderer::Controls;

/// Something the user asked for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputAction {
  Quit,
  Move(CameraMovement, bool),
  CursorMoved { x: f32, y: f32 },
  CursorLeft,
  VScroll { amount: f32 },
  ToggleBlinn,
  ToggleGamma,
  ToggleMotionBlur,
  /// Add to the number of blur samples.
  BlurSamples(i32),
  /// Add to the blur scale.
  BlurScale(f32),
}

pub fn adapt_events(event: WindowEvent) -> Option<InputAction> {
  match event {
    WindowEvent::Close | WindowEvent::Key(Key::Escape, _, Action::Release, _) => {
      Some(InputAction::Quit)
    }

    WindowEvent::Key(key, _, action @ (Action::Press | Action::Release), _)
      if movement(key).is_some() =>
    {
      movement(key).map(|m| InputAction::Move(m, action == Action::Press))
    }

    WindowEvent::Key(key, _, Action::Release, _) => match key {
      Key::B => Some(InputAction::ToggleBlinn),
      Key::G => Some(InputAction::ToggleGamma),
      Key::M => Some(InputAction::ToggleMotionBlur),
      _ => None,
    },

    WindowEvent::Key(key, _, Action::Press, _) | WindowEvent::Key(key, _, Action::Repeat, _) => {
      log::debug!("key press: {:?}", key);
      match key {
        Key::RightBracket => Some(InputAction::BlurSamples(1)),
        Key::LeftBracket => Some(InputAction::BlurSamples(-1)),
        Key::Equal => Some(InputAction::BlurScale(0.25)),
        Key::Minus => Some(InputAction::BlurScale(-0.25)),
        _ => None,
      }
    }

    WindowEvent::CursorPos(x, y) => Some(InputAction::CursorMoved {
      x: x as _,
      y: y as _,
    }),

    WindowEvent::CursorEnter(false) => Some(InputAction::CursorLeft),

    WindowEvent::Scroll(_, amount) => Some(InputAction::VScroll {
      amount: amount as f32,
    }),

    _ => None,
  }
}

fn movement(key: Key) -> Option<CameraMovement> {
  match key {
    Key::W => Some(CameraMovement::Forward),
    Key::S => Some(CameraMovement::Backward),
    Key::A => Some(CameraMovement::Left),
    Key::D => Some(CameraMovement::Right),
    _ => None,
  }
}

/// Apply an action to the camera input or to the renderer controls.
///
/// Returns `false` if the demo should stop.
pub fn apply(action: InputAction, input: &mut InputState, controls: &mut Controls) -> bool {
  match action {
    InputAction::Quit => return false,
    InputAction::Move(movement, pressed) => input.set_movement(movement, pressed),
    InputAction::CursorMoved { x, y } => input.cursor_moved(x, y),
    InputAction::CursorLeft => input.reset_cursor(),
    InputAction::VScroll { amount } => input.add_scroll(amount),

    InputAction::ToggleBlinn => {
      controls.blinn = !controls.blinn;
      log::info!("{}", if controls.blinn { "Blinn-Phong" } else { "Phong" });
    }

    InputAction::ToggleGamma => {
      controls.gamma = !controls.gamma;
      log::info!("gamma correction: {}", controls.gamma);
    }

    InputAction::ToggleMotionBlur => {
      controls.motion_blur = !controls.motion_blur;
      log::info!("motion blur: {}", controls.motion_blur);
    }

    InputAction::BlurSamples(delta) => {
      let samples = controls.blur_samples as i32 + delta;
      controls.blur_samples = samples.clamp(1, MAX_SAMPLES as i32) as u32;
      log::info!("blur samples: {}", controls.blur_samples);
    }

    InputAction::BlurScale(delta) => {
      controls.blur_scale = (controls.blur_scale + delta).clamp(0., MAX_BLUR_SCALE);
      log::info!("blur scale: {}", controls.blur_scale);
    }
  }

  true
}
