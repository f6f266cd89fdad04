//! Camera motion blur post-process.
//!
//! The lit scene is rendered into an offscreen color + depth framebuffer. The same geometry is
//! then rendered a second time into an auxiliary framebuffer whose single-channel float color
//! attachment receives the window-space depth of every fragment. The composite pass finally
//! reconstructs, for every display fragment, the world position out of that depth and the current
//! view-projection matrix, reprojects it with the previous one and averages a few taps of the
//! scene color along the resulting screen-space velocity.
//!
//! The [`kernel`] module mirrors the composite shader on the CPU.

use cgmath::{Matrix4, SquareMatrix};

use crate::backend::Backend;
use crate::context::GraphicsContext;
use crate::error::RenderError;
use crate::framebuffer::Framebuffer;
use crate::geometry::QUAD_VERTICES;
use crate::pipeline::{Pipeline, PipelineState, ProgramInterface, RenderState};
use crate::pixel::{DepthPrecision, PixelFormat};
use crate::shader::Program;
use crate::tess::{Mode, Tess};
use crate::texture::{MagFilter, MinFilter, Sampler, Texture};
use crate::transform::FrameTransform;

const COMPOSITE_VS: &str = include_str!("shaders/motion-blur-vs.glsl");
const COMPOSITE_FS: &str = include_str!("shaders/motion-blur-fs.glsl");
const VELOCITY_VS: &str = include_str!("shaders/velocity-depth-vs.glsl");
const VELOCITY_FS: &str = include_str!("shaders/velocity-depth-fs.glsl");

/// Default number of taps of the composite.
pub const DEFAULT_SAMPLES: u32 = 12;
/// Maximum number of taps of the composite.
pub const MAX_SAMPLES: u32 = 64;
/// Maximum velocity scale.
pub const MAX_BLUR_SCALE: f32 = 10.;

/// Motion blur configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionBlurSettings {
  pub enabled: bool,
  /// Number of taps along the velocity, in *[1;64]*.
  pub samples: u32,
  /// Velocity multiplier, in *[0;10]*.
  pub blur_scale: f32,
}

impl Default for MotionBlurSettings {
  fn default() -> Self {
    MotionBlurSettings {
      enabled: true,
      samples: DEFAULT_SAMPLES,
      blur_scale: 1.,
    }
  }
}

impl MotionBlurSettings {
  /// Bring the settings back into their valid ranges.
  pub fn clamped(self) -> Self {
    let blur_scale = if self.blur_scale.is_finite() {
      self.blur_scale.max(0.).min(MAX_BLUR_SCALE)
    } else {
      1.
    };

    MotionBlurSettings {
      samples: self.samples.max(1).min(MAX_SAMPLES),
      blur_scale,
      ..self
    }
  }
}

/// The view-projection matrices of the last two frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemporalMatrixPair {
  previous: Matrix4<f32>,
  current: Matrix4<f32>,
  updates: u64,
}

impl TemporalMatrixPair {
  /// Both matrices start as identity.
  pub fn new() -> Self {
    TemporalMatrixPair {
      previous: Matrix4::identity(),
      current: Matrix4::identity(),
      updates: 0,
    }
  }

  /// Shift the current matrix into the previous slot, then store the new current one.
  pub fn update(&mut self, current: Matrix4<f32>) {
    self.previous = self.current;
    self.current = current;
    self.updates = self.updates.saturating_add(1);
  }

  pub fn previous(&self) -> &Matrix4<f32> {
    &self.previous
  }

  pub fn current(&self) -> &Matrix4<f32> {
    &self.current
  }

  /// Number of updates so far.
  pub fn updates(&self) -> u64 {
    self.updates
  }

  /// `(previous, current)` as the composite should use them.
  ///
  /// Until two frames have been seen, the previous matrix is the initial identity and not a real
  /// camera; the current matrix is used twice instead, which yields zero velocity.
  pub fn blur_pair(&self) -> (Matrix4<f32>, Matrix4<f32>) {
    if self.updates < 2 {
      (self.current, self.current)
    } else {
      (self.previous, self.current)
    }
  }
}

impl Default for TemporalMatrixPair {
  fn default() -> Self {
    Self::new()
  }
}

/// Sampler of the velocity depth texture: its texels are exact depths, never interpolated.
fn velocity_depth_sampler() -> Sampler {
  Sampler {
    min_filter: MinFilter::Nearest,
    mag_filter: MagFilter::Nearest,
    ..Sampler::default()
  }
}

/// Scene and velocity framebuffers of a given size.
fn build_targets<C>(
  ctx: &mut C,
  size: [u32; 2],
) -> Result<(Framebuffer<C::Backend>, Framebuffer<C::Backend>), RenderError>
where
  C: GraphicsContext,
{
  let scene_color = ctx
    .new_color_texture(size)
    .map_err(RenderError::texture("motion blur scene color"))?;
  let scene_depth = ctx
    .new_depth_texture(size, DepthPrecision::Bits24)
    .map_err(RenderError::texture("motion blur scene depth"))?;
  let scene = ctx
    .new_framebuffer(Some(scene_color), Some(scene_depth.into()))
    .map_err(RenderError::framebuffer("motion blur scene"))?;

  let velocity_color = Texture::new(ctx, size, PixelFormat::R32F, velocity_depth_sampler())
    .map_err(RenderError::texture("velocity depth"))?;
  let velocity_depth = ctx
    .new_depth_renderbuffer(size, DepthPrecision::Bits16)
    .map_err(RenderError::texture("velocity occlusion"))?;
  let velocity = ctx
    .new_framebuffer(Some(velocity_color), Some(velocity_depth.into()))
    .map_err(RenderError::framebuffer("velocity depth"))?;

  Ok((scene, velocity))
}

/// The motion blur effect.
///
/// Owns the scene framebuffer, the velocity depth framebuffer, the full-screen quad, both of its
/// shader programs and the [`TemporalMatrixPair`].
pub struct MotionBlurEffect<B>
where
  B: Backend,
{
  scene: Framebuffer<B>,
  velocity: Framebuffer<B>,
  quad: Tess<B>,
  composite_program: Program<B>,
  velocity_program: Program<B>,
  matrices: TemporalMatrixPair,
  settings: MotionBlurSettings,
}

impl<B> MotionBlurEffect<B>
where
  B: Backend,
{
  /// Create the effect for a display of a given size.
  pub fn new<C>(
    ctx: &mut C,
    size: [u32; 2],
    settings: MotionBlurSettings,
  ) -> Result<Self, RenderError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let (scene, velocity) = build_targets(ctx, size)?;
    let quad = ctx.new_tess(&QUAD_VERTICES, None, Mode::Triangle)?;
    let composite_program = ctx
      .new_shader_program(COMPOSITE_VS, COMPOSITE_FS)
      .map_err(RenderError::program("motion blur composite"))?;
    let velocity_program = ctx
      .new_shader_program(VELOCITY_VS, VELOCITY_FS)
      .map_err(RenderError::program("velocity depth"))?;

    log::debug!("motion blur ready: {}×{} targets", size[0], size[1]);

    Ok(MotionBlurEffect {
      scene,
      velocity,
      quad,
      composite_program,
      velocity_program,
      matrices: TemporalMatrixPair::new(),
      settings: settings.clamped(),
    })
  }

  pub fn settings(&self) -> &MotionBlurSettings {
    &self.settings
  }

  /// Change the settings; out-of-range values are clamped.
  pub fn set_settings(&mut self, settings: MotionBlurSettings) {
    let clamped = settings.clamped();

    if clamped != settings {
      log::warn!(
        "motion blur settings clamped: {} samples, blur scale {}",
        clamped.samples,
        clamped.blur_scale
      );
    }

    self.settings = clamped;
  }

  pub fn is_enabled(&self) -> bool {
    self.settings.enabled
  }

  pub fn matrices(&self) -> &TemporalMatrixPair {
    &self.matrices
  }

  /// Size of the offscreen targets.
  pub fn size(&self) -> [u32; 2] {
    self.scene.size()
  }

  /// Feed the view-projection matrix of the frame.
  ///
  /// Must be called once per frame, whether the effect is enabled or not.
  pub fn update_view_proj_matrix(&mut self, current: Matrix4<f32>) {
    self.matrices.update(current);
  }

  /// Rebuild the offscreen targets for a new display size.
  ///
  /// On failure, the current targets are kept.
  pub fn resize<C>(&mut self, ctx: &mut C, size: [u32; 2]) -> Result<(), RenderError>
  where
    C: GraphicsContext<Backend = B>,
  {
    if size == self.size() {
      return Ok(());
    }

    let (scene, velocity) = build_targets(ctx, size)?;
    self.scene = scene;
    self.velocity = velocity;

    log::debug!("motion blur targets resized to {}×{}", size[0], size[1]);
    Ok(())
  }

  /// Render the lit scene into the scene framebuffer.
  ///
  /// Color and depth are cleared before `draw` is called. The scene framebuffer is still bound on
  /// return.
  pub fn render_scene_to_framebuffer<C, F, R>(
    &mut self,
    ctx: &mut C,
    clear_color: [f32; 4],
    draw: F,
  ) -> R
  where
    C: GraphicsContext<Backend = B>,
    F: FnOnce(Pipeline<'_, B>) -> R,
  {
    let state = PipelineState::new().set_clear_color(Some(clear_color));
    ctx.pipeline(&self.scene, &state, draw)
  }

  /// Render the window-space depth of the scene into the velocity depth framebuffer.
  ///
  /// The velocity depth program is in use with the view and projection matrices of `frame` set
  /// when `draw` is called; `draw` sets the `model` uniform and renders each object.
  pub fn render_depth_to_framebuffer<C, F>(&mut self, ctx: &mut C, frame: &FrameTransform, draw: F)
  where
    C: GraphicsContext<Backend = B>,
    F: FnOnce(&mut ProgramInterface<B>),
  {
    // where nothing is drawn, the depth is the far plane’s
    let state = PipelineState::new().set_clear_color(Some([1., 1., 1., 1.]));
    let program = &mut self.velocity_program;

    ctx.pipeline(&self.velocity, &state, |mut pipeline| {
      let mut iface = pipeline.shade(program);
      iface.set("view", frame.view);
      iface.set("projection", frame.projection);
      draw(&mut iface);
    });
  }

  /// Composite the blurred scene into the display framebuffer.
  ///
  /// The display viewport covers the whole back buffer and depth testing is disabled.
  pub fn apply_motion_blur<C>(&mut self, ctx: &mut C, back_buffer: &Framebuffer<B>)
  where
    C: GraphicsContext<Backend = B>,
  {
    let (previous, current) = self.matrices.blur_pair();
    let (previous, current, inverse) = kernel::composite_matrices(previous, current);

    let MotionBlurEffect {
      scene,
      velocity,
      quad,
      composite_program,
      settings,
      ..
    } = self;

    let (scene_color, velocity_depth) = match (scene.color_texture(), velocity.color_texture()) {
      (Some(scene_color), Some(velocity_depth)) => (scene_color, velocity_depth),
      _ => return,
    };

    let state = PipelineState::new().set_clear_depth(None);
    let render_state = RenderState::default()
      .set_depth_test(false)
      .set_depth_write(false);

    ctx.pipeline(back_buffer, &state, |mut pipeline| {
      let mut iface = pipeline.shade(composite_program);
      iface.bind_texture("scene_texture", 0, scene_color);
      iface.bind_texture("depth_texture", 1, velocity_depth);
      iface.set("prev_view_proj", previous);
      iface.set("curr_view_proj", current);
      iface.set("inv_view_proj", inverse);
      iface.set("samples", settings.samples as i32);
      iface.set("blur_scale", settings.blur_scale);
      iface.render(&render_state, quad);
    });
  }
}

/// CPU mirror of the composite pass.
///
/// Textures are plain float images whose first row is the bottom one, as on the GPU. Sampling is
/// bilinear with clamp-to-edge wrapping, like the scene color sampler.
pub mod kernel {
  use cgmath::{Matrix4, Point3, SquareMatrix, Vector2, Vector4};
  use image::{ImageBuffer, Luma, Rgba};

  /// RGBA float color buffer.
  pub type ColorImage = ImageBuffer<Rgba<f32>, Vec<f32>>;
  /// Single-channel window-space depth buffer.
  pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

  /// Previous view-projection, current view-projection and inverse of the current one, as fed to
  /// the composite.
  ///
  /// A singular current matrix has no inverse. All three are identities then, which gives every
  /// fragment a zero velocity.
  pub fn composite_matrices(
    previous: Matrix4<f32>,
    current: Matrix4<f32>,
  ) -> (Matrix4<f32>, Matrix4<f32>, Matrix4<f32>) {
    match current.invert() {
      Some(inverse) => (previous, current, inverse),
      None => {
        log::warn!("singular view-projection matrix, no motion blur this frame");
        let identity = Matrix4::identity();
        (identity, identity, identity)
      }
    }
  }

  /// World position of a fragment out of its texture coordinates and window-space depth.
  pub fn reconstruct_world(
    uv: Vector2<f32>,
    depth: f32,
    inv_view_proj: &Matrix4<f32>,
  ) -> Point3<f32> {
    let ndc = Vector4::new(uv.x * 2. - 1., uv.y * 2. - 1., depth * 2. - 1., 1.);
    let world = inv_view_proj * ndc;

    Point3::new(world.x / world.w, world.y / world.w, world.z / world.w)
  }

  /// Texture coordinates of a world point seen through a view-projection matrix.
  pub fn to_screen(view_proj: &Matrix4<f32>, world: Point3<f32>) -> Vector2<f32> {
    let clip = view_proj * Vector4::new(world.x, world.y, world.z, 1.);
    Vector2::new(clip.x / clip.w * 0.5 + 0.5, clip.y / clip.w * 0.5 + 0.5)
  }

  /// Screen-space displacement of a world point between two frames, scaled by `blur_scale`.
  pub fn screen_velocity(
    world: Point3<f32>,
    previous: &Matrix4<f32>,
    current: &Matrix4<f32>,
    blur_scale: f32,
  ) -> Vector2<f32> {
    (to_screen(current, world) - to_screen(previous, world)) * blur_scale
  }

  /// Position of the `i`-th tap along the velocity, in *[-0.5;0.5]*.
  pub fn tap_offset(i: u32, samples: u32) -> f32 {
    if samples > 1 {
      i as f32 / (samples - 1) as f32 - 0.5
    } else {
      0.
    }
  }

  fn texel(image: &ColorImage, x: i64, y: i64) -> Vector4<f32> {
    let (w, h) = image.dimensions();
    let x = x.max(0).min(w as i64 - 1) as u32;
    let y = y.max(0).min(h as i64 - 1) as u32;
    let [r, g, b, a] = image.get_pixel(x, y).0;

    Vector4::new(r, g, b, a)
  }

  /// Bilinear, clamp-to-edge sample of a color image.
  pub fn sample(image: &ColorImage, uv: Vector2<f32>) -> Vector4<f32> {
    let (w, h) = image.dimensions();

    if w == 0 || h == 0 {
      return Vector4::new(0., 0., 0., 0.);
    }

    let x = uv.x * w as f32 - 0.5;
    let y = uv.y * h as f32 - 0.5;
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let bottom = texel(image, x0, y0) * (1. - fx) + texel(image, x0 + 1, y0) * fx;
    let top = texel(image, x0, y0 + 1) * (1. - fx) + texel(image, x0 + 1, y0 + 1) * fx;

    bottom * (1. - fy) + top * fy
  }

  fn sample_depth(depth: &DepthImage, uv: Vector2<f32>) -> f32 {
    let (w, h) = depth.dimensions();
    let x = ((uv.x * w as f32) as i64).max(0).min(w as i64 - 1) as u32;
    let y = ((uv.y * h as f32) as i64).max(0).min(h as i64 - 1) as u32;

    depth.get_pixel(x, y).0[0]
  }

  /// Composite a whole frame.
  ///
  /// The output has the size of `scene`; `depth` is sampled with nearest filtering.
  pub fn resolve(
    scene: &ColorImage,
    depth: &DepthImage,
    previous: &Matrix4<f32>,
    current: &Matrix4<f32>,
    inv_view_proj: &Matrix4<f32>,
    samples: u32,
    blur_scale: f32,
  ) -> ColorImage {
    let (w, h) = scene.dimensions();
    let samples = samples.max(1);

    if depth.width() == 0 || depth.height() == 0 {
      return scene.clone();
    }

    ImageBuffer::from_fn(w, h, |x, y| {
      let uv = Vector2::new((x as f32 + 0.5) / w as f32, (y as f32 + 0.5) / h as f32);
      let world = reconstruct_world(uv, sample_depth(depth, uv), inv_view_proj);
      let velocity = screen_velocity(world, previous, current, blur_scale);

      let sum = (0..samples).fold(Vector4::new(0., 0., 0., 0.), |acc, i| {
        acc + sample(scene, uv + velocity * tap_offset(i, samples))
      });
      let color = sum / samples as f32;

      Rgba([color.x, color.y, color.z, color.w])
    })
  }
}
