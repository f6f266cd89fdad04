mod common;

use approx::assert_relative_eq;
use cgmath::{Matrix4, Point3};
use image::{Rgba, RgbaImage};

use common::{Draw, Event, Kind, Recorder, TestContext};
use penumbra::camera::{CameraMovement, InputState};
use penumbra::context::GraphicsContext;
use penumbra::error::RenderError;
use penumbra::framebuffer::Framebuffer;
use penumbra::loader::LoadError;
use penumbra::mesh::{MeshData, MeshError};
use penumbra::pixel::PixelFormat;
use penumbra::renderer::{
  Controls, ForwardRenderer, FrameReport, Pass, RendererConfig, RendererState, CLEAR_COLOR,
};
use penumbra::shader::UniformValue;

const DISPLAY: [u32; 2] = [800, 600];
const DT: f32 = 1. / 60.;

fn setup(size: [u32; 2], controls: Controls) -> (TestContext, ForwardRenderer<Recorder>, Framebuffer<Recorder>) {
  let mut ctx = TestContext::new();
  let config = RendererConfig {
    controls,
    ..RendererConfig::default()
  };
  let renderer = ForwardRenderer::new(&mut ctx, size, config).unwrap();
  let back_buffer = ctx.back_buffer(size).unwrap();

  // forget about the setup
  ctx.take_events();

  (ctx, renderer, back_buffer)
}

fn frame(
  ctx: &mut TestContext,
  renderer: &mut ForwardRenderer<Recorder>,
  back_buffer: &Framebuffer<Recorder>,
  input: &mut InputState,
) -> (FrameReport, Vec<Event>) {
  let report = renderer.render_frame(ctx, back_buffer, input, DT).unwrap();
  (report, ctx.take_events())
}

#[derive(Debug, PartialEq)]
enum Role {
  ShadowDepth,
  Lighting,
  VelocityDepth,
  Composite,
}

fn role(draw: &Draw) -> Role {
  if draw.declares("blur_scale") {
    Role::Composite
  } else if draw.declares("shadow_map") {
    Role::Lighting
  } else if draw.declares("light_space_matrix") {
    Role::ShadowDepth
  } else {
    Role::VelocityDepth
  }
}

fn binds(events: &[Event]) -> Vec<(u32, [u32; 4])> {
  events
    .iter()
    .filter_map(|e| match *e {
      Event::BindFramebuffer {
        framebuffer,
        viewport,
      } => Some((framebuffer, viewport)),
      _ => None,
    })
    .collect()
}

fn mat4(value: Option<&UniformValue>) -> Matrix4<f32> {
  match value {
    Some(UniformValue::Mat4(cols)) => Matrix4::from(*cols),
    v => panic!("not a matrix: {:?}", v),
  }
}

/// View-projection matrix the lighting pass of a frame used.
fn lighting_view_proj(events: &[Event]) -> Matrix4<f32> {
  let draws = common::draws(events);
  let lighting = draws
    .iter()
    .find(|d| role(d) == Role::Lighting)
    .expect("no lighting draw");

  mat4(lighting.uniform("projection")) * mat4(lighting.uniform("view"))
}

fn composite(events: &[Event]) -> Draw {
  common::draws(events)
    .into_iter()
    .find(|d| role(d) == Role::Composite)
    .cloned()
    .expect("no composite draw")
}

#[test]
fn motion_blur_pass_order() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();
  let display = [0, 0, DISPLAY[0], DISPLAY[1]];

  let (report, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);

  assert_eq!(report.frame, 0);
  assert_eq!(report.display_viewport, display);
  assert_eq!(
    report.passes,
    vec![
      Pass::ShadowDepth,
      Pass::SceneLighting { offscreen: true },
      Pass::VelocityDepth,
      Pass::MotionBlurComposite,
    ]
  );

  let binds = binds(&events);
  assert_eq!(binds.len(), 5);
  // shadow map, display restored, scene, velocity depth, display
  assert_ne!(binds[0].0, 0);
  assert_eq!(binds[0].1, [0, 0, 1024, 1024]);
  assert_eq!(binds[1], (0, display));
  assert_ne!(binds[2].0, 0);
  assert_eq!(binds[2].1, display);
  assert_ne!(binds[3].0, 0);
  assert_ne!(binds[3].0, binds[2].0);
  assert_eq!(binds[3].1, display);
  assert_eq!(binds[4], (0, display));

  let roles: Vec<_> = common::draws(&events).into_iter().map(role).collect();
  let objects = renderer.scene().objects().len();
  let mut expected = Vec::new();
  expected.extend((0..objects).map(|_| Role::ShadowDepth));
  expected.extend((0..objects).map(|_| Role::Lighting));
  expected.extend((0..objects).map(|_| Role::VelocityDepth));
  expected.push(Role::Composite);
  assert_eq!(roles, expected);

  assert!(ctx.violations().is_empty());
}

#[test]
fn direct_pass_order_without_motion_blur() {
  let controls = Controls {
    motion_blur: false,
    ..Controls::default()
  };
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, controls);
  let mut input = InputState::new();

  let (report, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);

  assert_eq!(
    report.passes,
    vec![Pass::ShadowDepth, Pass::SceneLighting { offscreen: false }]
  );

  let draws = common::draws(&events);
  assert!(draws.iter().all(|d| role(d) != Role::Composite));
  assert!(draws.iter().all(|d| role(d) != Role::VelocityDepth));

  for lighting in draws.iter().filter(|d| role(d) == Role::Lighting) {
    assert_eq!(lighting.framebuffer, 0);
    assert_eq!(lighting.viewport, [0, 0, DISPLAY[0], DISPLAY[1]]);
  }

  assert!(events.contains(&Event::Clear {
    color: Some(CLEAR_COLOR),
    depth: Some(1.)
  }));
}

#[test]
fn shadow_pass_clears_depth_only() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);

  // the first clear belongs to the shadow map
  let first_clear = events.iter().find(|e| matches!(e, Event::Clear { .. }));
  assert_eq!(
    first_clear,
    Some(&Event::Clear {
      color: None,
      depth: Some(1.)
    })
  );

  let light_space = renderer.light_space().unwrap().light_space_matrix;
  for draw in common::draws(&events) {
    if role(draw) == Role::ShadowDepth {
      assert_eq!(draw.viewport, [0, 0, 1024, 1024]);
      assert_eq!(mat4(draw.uniform("light_space_matrix")), light_space);
    }
  }
}

#[test]
fn composite_covers_the_display_not_the_shadow_map() {
  for &size in &[[1920, 1080], [640, 360], [1024, 1024]] {
    let (mut ctx, mut renderer, back_buffer) = setup(size, Controls::default());
    let mut input = InputState::new();

    let (report, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
    let composite = composite(&events);

    assert_eq!(composite.framebuffer, 0);
    assert_eq!(composite.viewport, [0, 0, size[0], size[1]]);
    assert_eq!(report.display_viewport, [0, 0, size[0], size[1]]);
    assert!(!composite.render_state.depth_test);
    assert!(ctx.violations().is_empty());
  }
}

#[test]
fn composite_samples_scene_and_velocity_depth() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  let composite = composite(&events);

  assert_eq!(composite.uniform("scene_texture"), Some(&UniformValue::Int(0)));
  assert_eq!(composite.uniform("depth_texture"), Some(&UniformValue::Int(1)));
  assert_eq!(composite.uniform("samples"), Some(&UniformValue::Int(12)));
  assert_eq!(composite.uniform("blur_scale"), Some(&UniformValue::Float(1.)));

  let journal = ctx.journal();
  let scene = &journal.textures[&composite.textures[&0]];
  let depth = &journal.textures[&composite.textures[&1]];

  assert_eq!(scene.format, PixelFormat::RGBA8);
  assert_eq!(scene.size, DISPLAY);
  assert_eq!(depth.format, PixelFormat::R32F);
  assert_eq!(depth.size, DISPLAY);
}

#[test]
fn lighting_samples_the_shadow_map() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  let draws = common::draws(&events);
  let lighting = draws.iter().find(|d| role(d) == Role::Lighting).unwrap();

  assert_eq!(lighting.uniform("shadow_map"), Some(&UniformValue::Int(1)));
  assert_eq!(lighting.uniform("diffuse_map"), Some(&UniformValue::Int(0)));

  let journal = ctx.journal();
  let shadow_map = &journal.textures[&lighting.textures[&1]];
  let diffuse = &journal.textures[&lighting.textures[&0]];

  assert_eq!(shadow_map.format, PixelFormat::Depth32F);
  assert_eq!(shadow_map.size, [1024, 1024]);
  assert_eq!(diffuse.format, PixelFormat::RGBA8);
}

#[test]
fn gamma_selects_the_srgb_diffuse_map() {
  let controls = Controls {
    gamma: true,
    ..Controls::default()
  };
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, controls);
  let mut input = InputState::new();

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  let draws = common::draws(&events);
  let lighting = draws.iter().find(|d| role(d) == Role::Lighting).unwrap();

  assert_eq!(lighting.uniform("gamma"), Some(&UniformValue::Bool(true)));
  assert_eq!(
    ctx.journal().textures[&lighting.textures[&0]].format,
    PixelFormat::SRGBA8
  );
}

#[test]
fn temporal_matrices_follow_the_frames() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();
  input.set_movement(CameraMovement::Forward, true);

  let mut view_projs = Vec::new();
  let mut composites = Vec::new();

  for _ in 0..4 {
    let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
    view_projs.push(lighting_view_proj(&events));
    composites.push(composite(&events));
  }

  let pair = renderer.temporal_matrices().unwrap();
  assert_eq!(pair.updates(), 4);
  assert_relative_eq!(*pair.previous(), view_projs[2], epsilon = 1e-6);
  assert_relative_eq!(*pair.current(), view_projs[3], epsilon = 1e-6);
  assert_ne!(pair.previous(), pair.current());

  // no velocity on the very first frame
  let first = &composites[0];
  assert_eq!(
    mat4(first.uniform("prev_view_proj")),
    mat4(first.uniform("curr_view_proj"))
  );

  for i in 1..4 {
    let c = &composites[i];
    assert_relative_eq!(mat4(c.uniform("prev_view_proj")), view_projs[i - 1], epsilon = 1e-6);
    assert_relative_eq!(mat4(c.uniform("curr_view_proj")), view_projs[i], epsilon = 1e-6);
  }
}

#[test]
fn temporal_matrices_move_while_disabled() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();
  input.set_movement(CameraMovement::Right, true);

  frame(&mut ctx, &mut renderer, &back_buffer, &mut input);

  renderer.set_controls(Controls {
    motion_blur: false,
    ..*renderer.controls()
  });
  let (report, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  assert_eq!(report.passes.len(), 2);
  let disabled_view_proj = lighting_view_proj(&events);
  assert_eq!(renderer.temporal_matrices().unwrap().updates(), 2);

  renderer.set_controls(Controls {
    motion_blur: true,
    ..*renderer.controls()
  });
  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);

  // the frame rendered without blur is the previous one, no stale matrix
  let c = composite(&events);
  assert_relative_eq!(mat4(c.uniform("prev_view_proj")), disabled_view_proj, epsilon = 1e-6);
  assert_relative_eq!(mat4(c.uniform("curr_view_proj")), lighting_view_proj(&events), epsilon = 1e-6);
}

#[test]
fn uniforms_unknown_to_a_pass_are_ignored() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);

  for draw in common::draws(&events) {
    if role(draw) != Role::Lighting {
      assert!(draw.uniform("use_diffuse_map").is_none());
      assert!(draw.uniform("shininess").is_none());
    }
  }

  assert!(ctx.violations().is_empty());
}

#[test]
fn light_moves_invalidate_the_light_space() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();

  let before = renderer.light_space().unwrap().light_space_matrix;
  renderer.set_light_position(Point3::new(2., 5., 1.)).unwrap();
  let after = renderer.light_space().unwrap().light_space_matrix;
  assert_ne!(before, after);

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  let draws = common::draws(&events);
  let shadow = draws.iter().find(|d| role(d) == Role::ShadowDepth).unwrap();

  assert_eq!(mat4(shadow.uniform("light_space_matrix")), after);
}

#[test]
fn display_resize_follows_the_back_buffer() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();
  frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  let framebuffers = ctx.live(Kind::Framebuffer);

  let resized = ctx.back_buffer([1280, 720]).unwrap();
  let (report, events) = frame(&mut ctx, &mut renderer, &resized, &mut input);

  assert_eq!(report.display_viewport, [0, 0, 1280, 720]);
  assert_eq!(composite(&events).viewport, [0, 0, 1280, 720]);
  assert!(binds(&events).iter().all(|&(_, vp)| vp == [0, 0, 1024, 1024] || vp == [0, 0, 1280, 720]));
  assert_eq!(ctx.live(Kind::Framebuffer), framebuffers);
  assert!(ctx.violations().is_empty());
}

#[test]
fn empty_display_skips_the_frame() {
  let (mut ctx, mut renderer, _) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();
  let minimized = ctx.back_buffer([0, 0]).unwrap();

  let (report, events) = frame(&mut ctx, &mut renderer, &minimized, &mut input);

  assert!(report.passes.is_empty());
  assert!(events.is_empty());
  assert_eq!(renderer.frame_count(), 0);
}

#[test]
fn lifecycle_and_disposal() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();

  assert_eq!(renderer.state(), RendererState::Initializing);
  assert!(ctx.live_total() > 0);

  frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  assert_eq!(renderer.state(), RendererState::Running);
  assert_eq!(renderer.frame_count(), 1);

  renderer.dispose();
  assert_eq!(renderer.state(), RendererState::Disposed);
  assert_eq!(ctx.live_total(), 0);
  assert!(renderer.temporal_matrices().is_none());

  assert!(matches!(
    renderer.render_frame(&mut ctx, &back_buffer, &mut input, DT),
    Err(RenderError::Disposed)
  ));

  // twice is fine
  renderer.dispose();
  assert!(ctx.violations().is_empty());
}

#[test]
fn dropping_the_renderer_releases_everything() {
  let (ctx, renderer, back_buffer) = setup(DISPLAY, Controls::default());

  assert_eq!(ctx.live(Kind::Framebuffer), 3);
  assert_eq!(ctx.live(Kind::Program), 4);

  drop(renderer);
  drop(back_buffer);

  assert_eq!(ctx.live_total(), 0);
  assert!(ctx.violations().is_empty());
}

#[test]
fn failed_texture_upload_keeps_the_previous_one() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  let diffuse = |events: &[Event]| {
    let draws = common::draws(events);
    draws.iter().find(|d| role(d) == Role::Lighting).unwrap().textures[&0]
  };
  let original = diffuse(&events);
  let textures = ctx.live(Kind::Texture);

  let result = renderer.set_diffuse_texture(&mut ctx, &RgbaImage::new(0, 0));
  assert!(matches!(result, Err(RenderError::Texture { .. })));
  assert_eq!(ctx.live(Kind::Texture), textures);

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  assert_eq!(diffuse(&events), original);

  let image = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
  renderer.set_diffuse_texture(&mut ctx, &image).unwrap();

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  let replaced = diffuse(&events);
  assert_ne!(replaced, original);
  assert_eq!(ctx.journal().textures[&replaced].size, [4, 4]);
  assert_eq!(ctx.journal().textures[&replaced].uploads, 1);
  assert_eq!(ctx.live(Kind::Texture), textures);
}

#[test]
fn texture_loads_never_stop_the_frame_loop() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  let diffuse = |events: &[Event]| {
    let draws = common::draws(events);
    draws.iter().find(|d| role(d) == Role::Lighting).unwrap().textures[&0]
  };
  let original = diffuse(&events);

  let missing = LoadError::Disconnected("floor.png".to_owned());
  assert!(!renderer.accept_diffuse_texture(&mut ctx, Err(missing)));
  assert!(!renderer.accept_diffuse_texture(&mut ctx, Ok(RgbaImage::new(0, 0))));
  assert_eq!(renderer.state(), RendererState::Running);

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  assert_eq!(diffuse(&events), original);

  let image = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]));
  assert!(renderer.accept_diffuse_texture(&mut ctx, Ok(image)));

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  assert_ne!(diffuse(&events), original);
  assert!(ctx.violations().is_empty());
}

#[test]
fn user_model_is_drawn_by_every_pass() {
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, Controls::default());
  let mut input = InputState::new();
  let objects = renderer.scene().objects().len();

  let triangle = MeshData::new(
    vec![[0., 0., 0.], [1., 0., 0.], [0., 1., 0.]],
    vec![[0., 0., 1.]; 3],
  )
  .with_material([1., 0., 0.], 32.);

  let mut broken = triangle.clone();
  broken.normals.pop();

  let result = renderer.replace_model(&mut ctx, &broken);
  assert!(matches!(
    result,
    Err(RenderError::Mesh(MeshError::LengthMismatch { .. }))
  ));

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  assert_eq!(common::draws(&events).len(), 3 * objects + 1);

  renderer.replace_model(&mut ctx, &triangle).unwrap();
  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  let draws = common::draws(&events);
  assert_eq!(draws.len(), 3 * (objects + 1) + 1);

  let model = draws
    .iter()
    .filter(|d| role(d) == Role::Lighting)
    .last()
    .unwrap();
  assert_eq!(model.vertex_count, 3);
  assert_eq!(model.uniform("use_diffuse_map"), Some(&UniformValue::Bool(false)));
  assert_eq!(model.uniform("material_color"), Some(&UniformValue::Vec3([1., 0., 0.])));
  assert_eq!(model.uniform("shininess"), Some(&UniformValue::Float(32.)));

  // a bad mesh doesn’t replace a good one
  assert!(renderer.replace_model(&mut ctx, &broken).is_err());
  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  assert_eq!(common::draws(&events).len(), 3 * (objects + 1) + 1);
}

#[test]
fn out_of_range_controls_are_clamped() {
  let controls = Controls {
    blur_samples: 500,
    blur_scale: -3.,
    ..Controls::default()
  };
  let (mut ctx, mut renderer, back_buffer) = setup(DISPLAY, controls);
  let mut input = InputState::new();

  assert_eq!(renderer.controls().blur_samples, 64);
  assert_eq!(renderer.controls().blur_scale, 0.);

  let (_, events) = frame(&mut ctx, &mut renderer, &back_buffer, &mut input);
  let c = composite(&events);
  assert_eq!(c.uniform("samples"), Some(&UniformValue::Int(64)));
  assert_eq!(c.uniform("blur_scale"), Some(&UniformValue::Float(0.)));
}
