mod common;

use common::{Kind, TestContext};
use penumbra::context::GraphicsContext;
use penumbra::pipeline::PipelineState;
use penumbra::shader::{ProgramError, StageError, StageType, UniformValue};

const VS: &str = "#version 330 core
uniform mat4 model;
void main() {}
";

const FS: &str = "#version 330 core
uniform float alpha;
void main() {}
";

#[test]
fn compilation_error_names_the_stage() {
  let mut ctx = TestContext::new();
  let broken = "#version 330 core\n#error nope\n";

  match ctx.new_shader_program(VS, broken) {
    Err(ProgramError::StageError(StageError::CompilationFailed(ty, log))) => {
      assert_eq!(ty, StageType::FragmentShader);
      assert_eq!(log, "0:2: #error directive");
    }
    Err(e) => panic!("unexpected error: {}", e),
    Ok(_) => panic!("broken fragment shader compiled"),
  }

  match ctx.new_shader_program(broken, FS) {
    Err(e) => assert!(e.to_string().contains("vertex shader")),
    Ok(_) => panic!("broken vertex shader compiled"),
  }

  assert_eq!(ctx.live(Kind::Program), 0);
}

#[test]
fn unknown_uniforms_are_ignored() {
  let mut ctx = TestContext::new();
  let back_buffer = ctx.back_buffer([32, 32]).unwrap();
  let mut program = ctx.new_shader_program(VS, FS).unwrap();

  assert!(program.is_active("model"));
  assert!(program.is_active("alpha"));
  assert!(!program.is_active("does_not_exist"));

  ctx.pipeline(&back_buffer, &PipelineState::new(), |mut pipeline| {
    let mut iface = pipeline.shade(&mut program);

    assert!(iface.set("alpha", 0.5f32));
    assert!(!iface.set("does_not_exist", 1f32));
    // asking twice hits the cache and still does nothing
    assert!(!iface.set("does_not_exist", 2f32));
  });

  assert!(ctx.violations().is_empty());
}

#[test]
fn uniforms_reach_the_program_in_use() {
  let mut ctx = TestContext::new();
  let back_buffer = ctx.back_buffer([32, 32]).unwrap();
  let mut program = ctx.new_shader_program(VS, FS).unwrap();
  let quad = ctx
    .new_tess(&penumbra::geometry::QUAD_VERTICES, None, penumbra::tess::Mode::Triangle)
    .unwrap();

  ctx.pipeline(&back_buffer, &PipelineState::new(), |mut pipeline| {
    let mut iface = pipeline.shade(&mut program);
    iface.set("alpha", 0.25f32);
    iface.render(&Default::default(), &quad);
  });

  let events = ctx.take_events();
  let draws = common::draws(&events);

  assert_eq!(draws.len(), 1);
  assert_eq!(draws[0].uniform("alpha"), Some(&UniformValue::Float(0.25)));
  assert_eq!(draws[0].vertex_count, 6);
  assert_eq!(draws[0].viewport, [0, 0, 32, 32]);
}
