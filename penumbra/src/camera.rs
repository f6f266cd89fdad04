//! Free-fly camera and the input state driving it.
//!
//! Input handlers never touch the camera directly: they accumulate into an [`InputState`], which
//! the renderer hands to [`Camera::update`] once per frame, before deriving the view matrix of
//! that frame.

use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, Vector3};

/// Default yaw, in degrees. Looks down -Z.
pub const YAW: f32 = -90.;
/// Default pitch, in degrees.
pub const PITCH: f32 = 0.;
/// Movement speed, in units per second.
pub const SPEED: f32 = 2.5;
/// Degrees per cursor pixel.
pub const SENSITIVITY: f32 = 0.1;
/// Default (and maximum) vertical field of view, in degrees.
pub const ZOOM: f32 = 45.;

const MIN_ZOOM: f32 = 1.;
const MAX_PITCH: f32 = 89.;

/// Near plane of the camera projection.
pub const Z_NEAR: f32 = 0.1;
/// Far plane of the camera projection.
pub const Z_FAR: f32 = 100.;

/// Movement direction, relative to the camera orientation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CameraMovement {
  Forward,
  Backward,
  Left,
  Right,
}

/// Input accumulated between two frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputState {
  forward: bool,
  backward: bool,
  left: bool,
  right: bool,
  last_cursor: Option<[f32; 2]>,
  look: [f32; 2],
  scroll: f32,
}

impl InputState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a movement key being pressed or released.
  pub fn set_movement(&mut self, movement: CameraMovement, pressed: bool) {
    match movement {
      CameraMovement::Forward => self.forward = pressed,
      CameraMovement::Backward => self.backward = pressed,
      CameraMovement::Left => self.left = pressed,
      CameraMovement::Right => self.right = pressed,
    }
  }

  /// Is a movement key held?
  pub fn is_moving(&self, movement: CameraMovement) -> bool {
    match movement {
      CameraMovement::Forward => self.forward,
      CameraMovement::Backward => self.backward,
      CameraMovement::Left => self.left,
      CameraMovement::Right => self.right,
    }
  }

  /// Record an absolute cursor position, in screen coordinates (y growing downward).
  ///
  /// The first position only primes the tracking and produces no look delta.
  pub fn cursor_moved(&mut self, x: f32, y: f32) {
    if let Some([last_x, last_y]) = self.last_cursor {
      // screen y grows downward, pitch grows upward
      self.add_look(x - last_x, last_y - y);
    }

    self.last_cursor = Some([x, y]);
  }

  /// Forget the last cursor position, e.g. when the cursor leaves the window.
  pub fn reset_cursor(&mut self) {
    self.last_cursor = None;
  }

  /// Add a look delta, in pixels, x to the right and y upward.
  pub fn add_look(&mut self, dx: f32, dy: f32) {
    self.look[0] += dx;
    self.look[1] += dy;
  }

  /// Add a vertical scroll amount.
  pub fn add_scroll(&mut self, amount: f32) {
    self.scroll += amount;
  }

  /// Accumulated look delta.
  pub fn look(&self) -> [f32; 2] {
    self.look
  }

  /// Accumulated scroll.
  pub fn scroll(&self) -> f32 {
    self.scroll
  }

  // take the accumulated deltas, leaving held keys untouched
  fn take_deltas(&mut self) -> ([f32; 2], f32) {
    let look = std::mem::take(&mut self.look);
    let scroll = std::mem::take(&mut self.scroll);
    (look, scroll)
  }
}

/// Euler-angle camera.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
  position: Point3<f32>,
  front: Vector3<f32>,
  up: Vector3<f32>,
  right: Vector3<f32>,
  world_up: Vector3<f32>,
  yaw: f32,
  pitch: f32,
  movement_speed: f32,
  mouse_sensitivity: f32,
  zoom: f32,
}

impl Camera {
  /// Camera at a given position, looking down -Z.
  pub fn new(position: Point3<f32>) -> Self {
    Self::with_angles(position, Vector3::unit_y(), YAW, PITCH)
  }

  /// Camera with explicit world up vector and yaw / pitch, in degrees.
  pub fn with_angles(position: Point3<f32>, world_up: Vector3<f32>, yaw: f32, pitch: f32) -> Self {
    let mut camera = Camera {
      position,
      front: -Vector3::unit_z(),
      up: world_up,
      right: Vector3::unit_x(),
      world_up,
      yaw,
      pitch: pitch.clamp(-MAX_PITCH, MAX_PITCH),
      movement_speed: SPEED,
      mouse_sensitivity: SENSITIVITY,
      zoom: ZOOM,
    };

    camera.update_vectors();
    camera
  }

  pub fn position(&self) -> Point3<f32> {
    self.position
  }

  pub fn front(&self) -> Vector3<f32> {
    self.front
  }

  pub fn yaw(&self) -> f32 {
    self.yaw
  }

  pub fn pitch(&self) -> f32 {
    self.pitch
  }

  /// Vertical field of view, in degrees.
  pub fn zoom(&self) -> f32 {
    self.zoom
  }

  /// Look-at view matrix.
  pub fn view_matrix(&self) -> Matrix4<f32> {
    Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
  }

  /// Perspective projection for a given aspect ratio.
  pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
    perspective(Deg(self.zoom), aspect, Z_NEAR, Z_FAR)
  }

  /// Move along the camera axes.
  pub fn process_keyboard(&mut self, movement: CameraMovement, dt: f32) {
    let velocity = self.movement_speed * dt;

    match movement {
      CameraMovement::Forward => self.position += self.front * velocity,
      CameraMovement::Backward => self.position -= self.front * velocity,
      CameraMovement::Left => self.position -= self.right * velocity,
      CameraMovement::Right => self.position += self.right * velocity,
    }
  }

  /// Rotate the camera by a look delta, in pixels.
  pub fn process_mouse_movement(&mut self, dx: f32, dy: f32, constrain_pitch: bool) {
    self.yaw += dx * self.mouse_sensitivity;
    self.pitch += dy * self.mouse_sensitivity;

    if constrain_pitch {
      self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }

    self.update_vectors();
  }

  /// Zoom in (positive amounts) or out.
  pub fn process_mouse_scroll(&mut self, amount: f32) {
    self.zoom = (self.zoom - amount).clamp(MIN_ZOOM, ZOOM);
  }

  /// Apply the input accumulated since the last frame.
  ///
  /// Look and scroll deltas are consumed; held movement keys move the camera proportionally to
  /// `dt`, in seconds.
  pub fn update(&mut self, input: &mut InputState, dt: f32) {
    let movements = [
      CameraMovement::Forward,
      CameraMovement::Backward,
      CameraMovement::Left,
      CameraMovement::Right,
    ];

    for movement in movements {
      if input.is_moving(movement) {
        self.process_keyboard(movement, dt);
      }
    }

    let ([dx, dy], scroll) = input.take_deltas();

    if dx != 0. || dy != 0. {
      self.process_mouse_movement(dx, dy, true);
    }

    if scroll != 0. {
      self.process_mouse_scroll(scroll);
    }
  }

  fn update_vectors(&mut self) {
    let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
    let front = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());

    self.front = front.normalize();
    self.right = self.front.cross(self.world_up).normalize();
    self.up = self.right.cross(self.front).normalize();
  }
}

impl Default for Camera {
  fn default() -> Self {
    Camera::new(Point3::new(0., 0., 3.))
  }
}
