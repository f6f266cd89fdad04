//! Shadow mapping depth pass.
//!
//! The scene is rendered from the light’s point of view, through an orthographic projection, into
//! a depth-only framebuffer of fixed resolution. The resulting depth map and the light-space
//! matrix are then used by the lighting pass to decide which fragments are in shadow.
//!
//! The shadow map resolution has nothing to do with the display resolution. Once
//! [`ShadowPass::render_depth`] returns, the shadow framebuffer and its viewport are still bound:
//! callers must restore the display framebuffer and viewport (see
//! [`GraphicsContext::restore_display`]) before rendering anything else.
//!
//! [`GraphicsContext::restore_display`]: crate::context::GraphicsContext::restore_display

use cgmath::{ortho, Matrix4, Point3, Vector3, Vector4};

use crate::backend::Backend;
use crate::context::GraphicsContext;
use crate::error::RenderError;
use crate::framebuffer::{DepthAttachment, Framebuffer};
use crate::pipeline::{PipelineState, ProgramInterface, Viewport};
use crate::pixel::DepthPrecision;
use crate::shader::Program;
use crate::texture::Texture;

const VS: &str = include_str!("shaders/shadow-depth-vs.glsl");
const FS: &str = include_str!("shaders/shadow-depth-fs.glsl");

/// Default shadow map resolution, in texels.
pub const SHADOW_MAP_RESOLUTION: u32 = 1024;

/// Orthographic bounds of the light frustum, in light view space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthoBounds {
  pub left: f32,
  pub right: f32,
  pub bottom: f32,
  pub top: f32,
}

impl OrthoBounds {
  /// Square bounds centered on the light axis.
  pub fn symmetric(half_extent: f32) -> Self {
    OrthoBounds {
      left: -half_extent,
      right: half_extent,
      bottom: -half_extent,
      top: half_extent,
    }
  }
}

/// Shadow pass configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
  /// Width and height of the shadow map.
  pub resolution: u32,
  pub light_position: Point3<f32>,
  pub bounds: OrthoBounds,
  pub near: f32,
  pub far: f32,
  pub precision: DepthPrecision,
}

impl Default for ShadowSettings {
  fn default() -> Self {
    ShadowSettings {
      resolution: SHADOW_MAP_RESOLUTION,
      light_position: Point3::new(-2., 4., -1.),
      bounds: OrthoBounds::symmetric(10.),
      near: 1.,
      far: 7.5,
      precision: DepthPrecision::Bits32F,
    }
  }
}

/// Transforms from world space to the light clip space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSpaceTransform {
  pub ortho_projection: Matrix4<f32>,
  pub light_view: Matrix4<f32>,
  /// `ortho_projection * light_view`.
  pub light_space_matrix: Matrix4<f32>,
}

impl LightSpaceTransform {
  /// Orthographic projection over `bounds` and a view from the light toward the origin, +Y up.
  pub fn compute(light_position: Point3<f32>, bounds: OrthoBounds, near: f32, far: f32) -> Self {
    let ortho_projection = ortho(
      bounds.left,
      bounds.right,
      bounds.bottom,
      bounds.top,
      near,
      far,
    );
    let origin = Point3::new(0., 0., 0.);
    let light_view = Matrix4::look_at_rh(light_position, origin, Vector3::unit_y());

    LightSpaceTransform {
      ortho_projection,
      light_view,
      light_space_matrix: ortho_projection * light_view,
    }
  }

  /// Normalized device coordinates of a world point, seen from the light.
  pub fn project(&self, world: Point3<f32>) -> Point3<f32> {
    let clip = self.light_space_matrix * Vector4::new(world.x, world.y, world.z, 1.);
    Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
  }

  /// Depth a world point writes into the shadow map, in *[0;1]* inside the light frustum.
  pub fn depth(&self, world: Point3<f32>) -> f32 {
    self.project(world).z * 0.5 + 0.5
  }
}

/// Light-space matrix of a light looking at the origin.
///
/// This is a pure function: the same inputs always yield the same matrix.
pub fn compute_light_space_matrix(
  light_position: Point3<f32>,
  bounds: OrthoBounds,
  near: f32,
  far: f32,
) -> Matrix4<f32> {
  LightSpaceTransform::compute(light_position, bounds, near, far).light_space_matrix
}

/// The shadow depth pass.
///
/// Owns its depth-only framebuffer and depth shader. The light-space transform is cached and
/// recomputed whenever the light position or the frustum changes.
pub struct ShadowPass<B>
where
  B: Backend,
{
  framebuffer: Framebuffer<B>,
  program: Program<B>,
  settings: ShadowSettings,
  transform: LightSpaceTransform,
}

impl<B> ShadowPass<B>
where
  B: Backend,
{
  pub fn new<C>(ctx: &mut C, settings: ShadowSettings) -> Result<Self, RenderError>
  where
    C: GraphicsContext<Backend = B>,
  {
    if settings.precision < DepthPrecision::Bits24 {
      return Err(RenderError::UnsupportedDepthPrecision(settings.precision));
    }

    let size = [settings.resolution, settings.resolution];
    let depth_map = ctx
      .new_depth_texture(size, settings.precision)
      .map_err(RenderError::texture("shadow map"))?;
    let framebuffer = ctx
      .new_framebuffer(None, Some(DepthAttachment::Texture(depth_map)))
      .map_err(RenderError::framebuffer("shadow map"))?;
    let program = ctx
      .new_shader_program(VS, FS)
      .map_err(RenderError::program("shadow depth"))?;

    let transform = LightSpaceTransform::compute(
      settings.light_position,
      settings.bounds,
      settings.near,
      settings.far,
    );

    log::debug!(
      "shadow pass ready: {}×{} {:?} depth map",
      settings.resolution,
      settings.resolution,
      settings.precision
    );

    Ok(ShadowPass {
      framebuffer,
      program,
      settings,
      transform,
    })
  }

  pub fn settings(&self) -> &ShadowSettings {
    &self.settings
  }

  /// Shadow map resolution.
  pub fn resolution(&self) -> u32 {
    self.settings.resolution
  }

  /// Current light-space transform.
  pub fn light_space(&self) -> &LightSpaceTransform {
    &self.transform
  }

  /// Move the light.
  pub fn set_light_position(&mut self, light_position: Point3<f32>) {
    if light_position != self.settings.light_position {
      self.settings.light_position = light_position;
      self.recompute();
    }
  }

  /// Change the light frustum.
  pub fn set_frustum(&mut self, bounds: OrthoBounds, near: f32, far: f32) {
    if bounds != self.settings.bounds || near != self.settings.near || far != self.settings.far {
      self.settings.bounds = bounds;
      self.settings.near = near;
      self.settings.far = far;
      self.recompute();
    }
  }

  /// Depth map produced by the last [`ShadowPass::render_depth`].
  pub fn depth_map(&self) -> Option<&Texture<B>> {
    self.framebuffer.depth_texture()
  }

  /// Depth a world point writes into the shadow map.
  pub fn light_depth(&self, world: Point3<f32>) -> f32 {
    self.transform.depth(world)
  }

  /// Render the depth of the scene from the light.
  ///
  /// The depth buffer is cleared (there is no color buffer), the depth shader is in use and its
  /// light-space matrix set when `draw` is called. `draw` sets the `model` uniform and renders
  /// each object.
  ///
  /// On return, the shadow framebuffer and viewport are still bound.
  pub fn render_depth<C, F>(&mut self, ctx: &mut C, draw: F)
  where
    C: GraphicsContext<Backend = B>,
    F: FnOnce(&mut ProgramInterface<B>),
  {
    // the framebuffer is resolution × resolution
    let state = PipelineState::new()
      .set_clear_color(None)
      .set_viewport(Viewport::Whole);
    let program = &mut self.program;
    let transform = &self.transform;

    ctx.pipeline(&self.framebuffer, &state, |mut pipeline| {
      let mut iface = pipeline.shade(program);
      iface.set("light_space_matrix", transform.light_space_matrix);
      draw(&mut iface);
    });
  }

  fn recompute(&mut self) {
    self.transform = LightSpaceTransform::compute(
      self.settings.light_position,
      self.settings.bounds,
      self.settings.near,
      self.settings.far,
    );

    log::debug!(
      "light-space transform recomputed for light at {:?}",
      self.settings.light_position
    );
  }
}
