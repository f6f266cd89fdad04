//! Shadow-mapped forward renderer.
//!
//! [`ForwardRenderer`] owns every GPU resource of the demo and renders one frame per call to
//! [`ForwardRenderer::render_frame`], always in the same order:
//!
//! 1. The camera consumes the input accumulated since the last frame and the frame transforms are
//!    derived.
//! 2. The shadow pass renders the scene depth from the light.
//! 3. The display framebuffer and viewport are restored.
//! 4. The motion blur effect records the view-projection matrix of the frame.
//! 5. With motion blur, the lit scene goes to the offscreen scene framebuffer, the velocity depth
//!    pass runs and the composite is drawn on the display. Without it, the lit scene goes straight
//!    to the display.
//!
//! Scheduling frames is the host’s business.

use cgmath::{EuclideanSpace, Point3};
use image::RgbaImage;

use crate::backend::Backend;
use crate::camera::{Camera, InputState};
use crate::context::GraphicsContext;
use crate::error::RenderError;
use crate::framebuffer::Framebuffer;
use crate::geometry::SceneGeometry;
use crate::loader::LoadError;
use crate::material::{checkerboard, DiffuseMaps};
use crate::mesh::{Mesh, MeshData, DEFAULT_SHININESS};
use crate::motion_blur::{MotionBlurEffect, MotionBlurSettings, TemporalMatrixPair};
use crate::pipeline::{Pipeline, PipelineState, ProgramInterface, RenderState, Viewport};
use crate::scene::Scene;
use crate::shader::Program;
use crate::shadow::{LightSpaceTransform, ShadowPass, ShadowSettings};
use crate::transform::{BaseTransform, FrameTransform, SceneObjectInstance};

const LIGHTING_VS: &str = include_str!("shaders/lighting-vs.glsl");
const LIGHTING_FS: &str = include_str!("shaders/lighting-fs.glsl");

/// Background color of the scene.
pub const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.];
/// Ambient light intensity.
pub const AMBIENT: f32 = 0.3;
/// Depth bias of the shadow test.
pub const SHADOW_BIAS: f32 = 0.005;

const DIFFUSE_MAP_UNIT: u32 = 0;
const SHADOW_MAP_UNIT: u32 = 1;

/// Lifecycle of a [`ForwardRenderer`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RendererState {
  /// Resources are allocated but no frame has been rendered yet.
  Initializing,
  /// At least one frame was rendered.
  Running,
  /// Every GPU resource was released.
  Disposed,
}

/// Knobs read every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Controls {
  /// Blinn-Phong specular highlights instead of Phong.
  pub blinn: bool,
  /// sRGB diffuse texture, quadratic attenuation and gamma-encoded output.
  pub gamma: bool,
  pub motion_blur: bool,
  pub blur_samples: u32,
  pub blur_scale: f32,
}

impl Default for Controls {
  fn default() -> Self {
    let blur = MotionBlurSettings::default();

    Controls {
      blinn: true,
      gamma: false,
      motion_blur: blur.enabled,
      blur_samples: blur.samples,
      blur_scale: blur.blur_scale,
    }
  }
}

impl Controls {
  pub fn motion_blur_settings(&self) -> MotionBlurSettings {
    MotionBlurSettings {
      enabled: self.motion_blur,
      samples: self.blur_samples,
      blur_scale: self.blur_scale,
    }
  }

  /// Bring the blur knobs back into their valid ranges.
  pub fn clamped(self) -> Self {
    let blur = self.motion_blur_settings().clamped();

    Controls {
      blur_samples: blur.samples,
      blur_scale: blur.blur_scale,
      ..self
    }
  }
}

/// Everything a renderer starts with.
#[derive(Clone, Debug, Default)]
pub struct RendererConfig {
  pub shadow: ShadowSettings,
  pub controls: Controls,
  pub camera: Camera,
  pub scene: Scene,
}

/// A render pass, as executed by [`ForwardRenderer::render_frame`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Pass {
  ShadowDepth,
  /// The lit scene, rendered offscreen for the motion blur or directly on the display.
  SceneLighting { offscreen: bool },
  VelocityDepth,
  MotionBlurComposite,
}

/// What happened during a frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FrameReport {
  /// Index of the frame, starting at 0.
  pub frame: u64,
  /// Passes, in execution order. Empty when the display has no area.
  pub passes: Vec<Pass>,
  /// Viewport the display was restored to.
  pub display_viewport: [u32; 4],
}

struct GpuResources<B>
where
  B: Backend,
{
  geometry: SceneGeometry<B>,
  lighting: Program<B>,
  shadow: ShadowPass<B>,
  motion_blur: MotionBlurEffect<B>,
  diffuse: DiffuseMaps<B>,
  model: Option<Mesh<B>>,
}

/// What gets drawn by every pass.
struct Drawables<'a, B>
where
  B: Backend,
{
  geometry: &'a SceneGeometry<B>,
  scene: &'a Scene,
  model: Option<(&'a Mesh<B>, SceneObjectInstance)>,
}

impl<'a, B> Drawables<'a, B>
where
  B: Backend,
{
  /// Render every object with the program in use.
  ///
  /// Per-object uniforms the program doesn’t declare are ignored, so the same draw list serves
  /// the depth passes and the lighting pass.
  fn draw(&self, iface: &mut ProgramInterface<B>) {
    let state = RenderState::default();

    for object in self.scene.objects() {
      let instance = object.instance();

      iface.set("model", instance.model);
      iface.set("normal_matrix", instance.normal);
      iface.set("use_diffuse_map", true);
      iface.set("shininess", DEFAULT_SHININESS);
      iface.render(&state, self.geometry.get(object.primitive));
    }

    if let Some((mesh, instance)) = self.model {
      iface.set("model", instance.model);
      iface.set("normal_matrix", instance.normal);
      iface.set("use_diffuse_map", false);
      iface.set("material_color", mesh.color());
      iface.set("shininess", mesh.shininess());
      iface.render(&state, mesh.tess());
    }
  }
}

/// Per-frame inputs of the lighting pass.
struct Lighting<'a, B>
where
  B: Backend,
{
  frame: &'a FrameTransform,
  view_position: Point3<f32>,
  controls: &'a Controls,
  shadow: &'a ShadowPass<B>,
  diffuse: &'a DiffuseMaps<B>,
}

impl<'a, B> Lighting<'a, B>
where
  B: Backend,
{
  fn shade(&self, mut pipeline: Pipeline<B>, program: &mut Program<B>, drawables: &Drawables<B>) {
    let light = self.shadow.light_space();
    let light_position = self.shadow.settings().light_position;

    let mut iface = pipeline.shade(program);
    iface.set("view", self.frame.view);
    iface.set("projection", self.frame.projection);
    iface.set("light_space_matrix", light.light_space_matrix);
    iface.set("view_position", self.view_position.to_vec());
    iface.set("light_position", light_position.to_vec());
    iface.set("ambient", AMBIENT);
    iface.set("shadow_bias", SHADOW_BIAS);
    iface.set("blinn", self.controls.blinn);
    iface.set("gamma", self.controls.gamma);
    iface.bind_texture(
      "diffuse_map",
      DIFFUSE_MAP_UNIT,
      self.diffuse.get(self.controls.gamma),
    );

    if let Some(shadow_map) = self.shadow.depth_map() {
      iface.bind_texture("shadow_map", SHADOW_MAP_UNIT, shadow_map);
    }

    drawables.draw(&mut iface);
  }
}

/// The renderer.
pub struct ForwardRenderer<B>
where
  B: Backend,
{
  state: RendererState,
  resources: Option<GpuResources<B>>,
  camera: Camera,
  scene: Scene,
  controls: Controls,
  model_transform: BaseTransform,
  display_size: [u32; 2],
  frame: u64,
}

impl<B> ForwardRenderer<B>
where
  B: Backend,
{
  /// Allocate every resource and compile every shader for a display of a given size.
  ///
  /// Any failure is fatal: nothing is partially built.
  pub fn new<C>(
    ctx: &mut C,
    display_size: [u32; 2],
    config: RendererConfig,
  ) -> Result<Self, RenderError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let display_size = [display_size[0].max(1), display_size[1].max(1)];
    let controls = config.controls.clamped();

    let geometry = SceneGeometry::new(ctx)?;
    let lighting = ctx
      .new_shader_program(LIGHTING_VS, LIGHTING_FS)
      .map_err(RenderError::program("lighting"))?;
    let shadow = ShadowPass::new(ctx, config.shadow)?;
    let motion_blur = MotionBlurEffect::new(ctx, display_size, controls.motion_blur_settings())?;
    let diffuse = DiffuseMaps::upload(ctx, &checkerboard(64, 2))
      .map_err(RenderError::texture("diffuse"))?;

    log::info!(
      "renderer initialized for a {}×{} display",
      display_size[0],
      display_size[1]
    );

    Ok(ForwardRenderer {
      state: RendererState::Initializing,
      resources: Some(GpuResources {
        geometry,
        lighting,
        shadow,
        motion_blur,
        diffuse,
        model: None,
      }),
      camera: config.camera,
      scene: config.scene,
      controls,
      model_transform: BaseTransform::identity(),
      display_size,
      frame: 0,
    })
  }

  pub fn state(&self) -> RendererState {
    self.state
  }

  pub fn camera(&self) -> &Camera {
    &self.camera
  }

  pub fn camera_mut(&mut self) -> &mut Camera {
    &mut self.camera
  }

  pub fn scene(&self) -> &Scene {
    &self.scene
  }

  pub fn scene_mut(&mut self) -> &mut Scene {
    &mut self.scene
  }

  pub fn controls(&self) -> &Controls {
    &self.controls
  }

  /// Change the controls; out-of-range blur knobs are clamped.
  pub fn set_controls(&mut self, controls: Controls) {
    let clamped = controls.clamped();

    if clamped != controls {
      log::warn!(
        "blur controls clamped: {} samples, blur scale {}",
        clamped.blur_samples,
        clamped.blur_scale
      );
    }

    self.controls = clamped;
  }

  /// Number of frames rendered so far.
  pub fn frame_count(&self) -> u64 {
    self.frame
  }

  /// View-projection matrices of the last two frames, if not disposed.
  pub fn temporal_matrices(&self) -> Option<&TemporalMatrixPair> {
    self.resources.as_ref().map(|r| r.motion_blur.matrices())
  }

  /// Light-space transform of the shadow pass, if not disposed.
  pub fn light_space(&self) -> Option<&LightSpaceTransform> {
    self.resources.as_ref().map(|r| r.shadow.light_space())
  }

  /// Move the light.
  pub fn set_light_position(&mut self, light_position: Point3<f32>) -> Result<(), RenderError> {
    let resources = self.resources.as_mut().ok_or(RenderError::Disposed)?;
    resources.shadow.set_light_position(light_position);
    Ok(())
  }

  /// Replace the diffuse texture of the static objects.
  ///
  /// On failure, the previous texture stays in place.
  pub fn set_diffuse_texture<C>(
    &mut self,
    ctx: &mut C,
    image: &RgbaImage,
  ) -> Result<(), RenderError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let resources = self.resources.as_mut().ok_or(RenderError::Disposed)?;
    let diffuse = DiffuseMaps::upload(ctx, image).map_err(RenderError::texture("diffuse"))?;

    log::info!(
      "diffuse texture replaced ({}×{})",
      image.width(),
      image.height()
    );
    resources.diffuse = diffuse;
    Ok(())
  }

  /// Take the outcome of an asynchronous texture load.
  ///
  /// Neither a failed load nor a failed upload is fatal: both are logged and the previous texture
  /// stays in place. Returns whether the texture was replaced.
  pub fn accept_diffuse_texture<C>(
    &mut self,
    ctx: &mut C,
    loaded: Result<RgbaImage, LoadError>,
  ) -> bool
  where
    C: GraphicsContext<Backend = B>,
  {
    let outcome = match loaded {
      Ok(image) => self.set_diffuse_texture(ctx, &image),
      Err(e) => {
        log::warn!("cannot load the diffuse texture, keeping the previous one: {}", e);
        return false;
      }
    };

    match outcome {
      Ok(()) => true,
      Err(e) => {
        log::warn!("cannot upload the diffuse texture, keeping the previous one: {}", e);
        false
      }
    }
  }

  /// Validate, upload and draw a user mesh along with the static objects.
  ///
  /// On failure, the previous model stays in place.
  pub fn replace_model<C>(&mut self, ctx: &mut C, data: &MeshData) -> Result<(), RenderError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let resources = self.resources.as_mut().ok_or(RenderError::Disposed)?;
    let mesh = Mesh::upload(ctx, data)?;

    log::info!("model replaced ({} vertices)", data.positions.len());
    resources.model = Some(mesh);
    Ok(())
  }

  /// Where the user mesh stands.
  pub fn set_model_transform(&mut self, transform: BaseTransform) {
    self.model_transform = transform;
  }

  /// Render one frame on the display.
  ///
  /// `back_buffer` is the display framebuffer; when its size changes, the offscreen targets
  /// follow. `dt` is the time elapsed since the last frame, in seconds.
  pub fn render_frame<C>(
    &mut self,
    ctx: &mut C,
    back_buffer: &Framebuffer<B>,
    input: &mut InputState,
    dt: f32,
  ) -> Result<FrameReport, RenderError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let resources = self.resources.as_mut().ok_or(RenderError::Disposed)?;
    let size = back_buffer.size();
    let display_viewport = Viewport::Whole.resolve(size);

    if size[0] == 0 || size[1] == 0 {
      // minimized display: nothing to render into
      log::trace!("skipping frame {}: empty display", self.frame);
      return Ok(FrameReport {
        frame: self.frame,
        passes: Vec::new(),
        display_viewport,
      });
    }

    if size != self.display_size {
      resources.motion_blur.resize(ctx, size)?;
      self.display_size = size;
    }

    if self.state == RendererState::Initializing {
      log::info!("renderer running");
      self.state = RendererState::Running;
    }

    let GpuResources {
      geometry,
      lighting,
      shadow,
      motion_blur,
      diffuse,
      model,
    } = resources;
    let mut passes = Vec::with_capacity(4);

    // 1. camera
    self.camera.update(input, dt);
    let aspect = size[0] as f32 / size[1] as f32;
    let frame = FrameTransform::new(
      self.camera.view_matrix(),
      self.camera.projection_matrix(aspect),
    );

    let drawables = Drawables {
      geometry: &*geometry,
      scene: &self.scene,
      model: model
        .as_ref()
        .map(|mesh| (mesh, SceneObjectInstance::from(&self.model_transform))),
    };

    // 2. shadow depth, then 3. back to the display
    shadow.render_depth(ctx, |iface| drawables.draw(iface));
    passes.push(Pass::ShadowDepth);
    ctx.restore_display(back_buffer);

    // 4. temporal matrices move whether the blur is on or not
    motion_blur.update_view_proj_matrix(frame.view_projection);
    motion_blur.set_settings(self.controls.motion_blur_settings());

    let light = Lighting {
      frame: &frame,
      view_position: self.camera.position(),
      controls: &self.controls,
      shadow: &*shadow,
      diffuse: &*diffuse,
    };

    // 5. lit scene, blurred or not
    if motion_blur.is_enabled() {
      motion_blur.render_scene_to_framebuffer(ctx, CLEAR_COLOR, |pipeline| {
        light.shade(pipeline, lighting, &drawables)
      });
      passes.push(Pass::SceneLighting { offscreen: true });

      motion_blur.render_depth_to_framebuffer(ctx, &frame, |iface| drawables.draw(iface));
      passes.push(Pass::VelocityDepth);

      motion_blur.apply_motion_blur(ctx, back_buffer);
      passes.push(Pass::MotionBlurComposite);
    } else {
      let state = PipelineState::new().set_clear_color(Some(CLEAR_COLOR));
      ctx.pipeline(back_buffer, &state, |pipeline| {
        light.shade(pipeline, lighting, &drawables)
      });
      passes.push(Pass::SceneLighting { offscreen: false });
    }

    log::trace!("frame {}: {:?}", self.frame, passes);

    let report = FrameReport {
      frame: self.frame,
      passes,
      display_viewport,
    };
    self.frame += 1;

    Ok(report)
  }

  /// Release every GPU resource.
  ///
  /// Rendering afterwards fails with [`RenderError::Disposed`]. Disposing twice does nothing.
  pub fn dispose(&mut self) {
    if let Some(resources) = self.resources.take() {
      if resources.model.is_some() {
        log::debug!("releasing the user model");
      }

      // shadow map, motion blur targets, programs, tessellations and diffuse maps
      drop(resources);
      log::info!("renderer disposed after {} frames", self.frame);
    }

    self.state = RendererState::Disposed;
  }
}
