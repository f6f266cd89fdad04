//! A backend that records what it is asked to do instead of talking to a GPU.
//!
//! Every created object gets a non-zero id (the back buffer is framebuffer 0) and is counted as
//! live until its representation is dropped. Every draw call is recorded along with the bound
//! framebuffer, the viewport, the program in use, its uniform values, the bound textures and the
//! render state.
//!
//! Shader “compilation” scans the sources for `uniform <type> <name>;` declarations, which become
//! the active uniforms of the linked program. A source containing `#error` fails to compile.

#![allow(dead_code)]

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use penumbra::backend::framebuffer::FramebufferBackend;
use penumbra::backend::pipeline::PipelineBackend;
use penumbra::backend::shader::ShaderBackend;
use penumbra::backend::tess::{TessBackend, TessDesc};
use penumbra::backend::texture::TextureBackend;
use penumbra::context::GraphicsContext;
use penumbra::framebuffer::{FramebufferError, IncompleteReason};
use penumbra::pipeline::RenderState;
use penumbra::pixel::PixelFormat;
use penumbra::shader::{ProgramError, StageError, StageType, UniformValue};
use penumbra::tess::TessError;
use penumbra::texture::{Sampler, TextureError};

/// Kinds of GPU objects.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
  Texture,
  Renderbuffer,
  Framebuffer,
  Program,
  Tess,
}

/// A recorded draw call.
#[derive(Clone, Debug, PartialEq)]
pub struct Draw {
  pub framebuffer: u32,
  pub viewport: [u32; 4],
  pub program: u32,
  /// Uniforms declared by the program.
  pub declared: Vec<String>,
  /// Values of the uniforms of the program at draw time.
  pub uniforms: HashMap<String, UniformValue>,
  /// Texture id bound to each unit.
  pub textures: HashMap<u32, u32>,
  pub render_state: RenderState,
  pub vertex_count: usize,
}

impl Draw {
  /// Does the program of this draw declare a uniform?
  pub fn declares(&self, name: &str) -> bool {
    self.declared.iter().any(|n| n == name)
  }

  pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
    self.uniforms.get(name)
  }
}

/// Something the backend was asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
  BindFramebuffer { framebuffer: u32, viewport: [u32; 4] },
  Clear {
    color: Option<[f32; 4]>,
    depth: Option<f32>,
  },
  Draw(Draw),
}

#[derive(Clone, Debug)]
pub struct TextureInfo {
  pub size: [u32; 2],
  pub format: PixelFormat,
  pub sampler: Sampler,
  pub uploads: usize,
}

#[derive(Debug, Default)]
pub struct Journal {
  next_id: u32,
  live: HashMap<Kind, usize>,
  created: HashMap<Kind, usize>,
  pub textures: HashMap<u32, TextureInfo>,
  program_uniforms: HashMap<u32, Vec<String>>,
  uniform_values: HashMap<u32, HashMap<String, UniformValue>>,
  framebuffer: u32,
  viewport: [u32; 4],
  program: Option<u32>,
  bound_textures: HashMap<u32, u32>,
  render_state: Option<RenderState>,
  pub events: Vec<Event>,
  /// Misuses of the backend, such as setting a uniform of a program not in use.
  pub violations: Vec<String>,
  /// Status the next validated framebuffer reports.
  pub framebuffer_status: Option<IncompleteReason>,
}

impl Journal {
  fn create(&mut self, kind: Kind) -> u32 {
    self.next_id += 1;
    *self.live.entry(kind).or_default() += 1;
    *self.created.entry(kind).or_default() += 1;
    self.next_id
  }

  fn release(&mut self, kind: Kind) {
    match self.live.get_mut(&kind) {
      Some(n) if *n > 0 => *n -= 1,
      _ => self.violations.push(format!("{:?} released twice", kind)),
    }
  }

  pub fn live(&self, kind: Kind) -> usize {
    self.live.get(&kind).copied().unwrap_or(0)
  }

  pub fn live_total(&self) -> usize {
    self.live.values().sum()
  }

  pub fn created(&self, kind: Kind) -> usize {
    self.created.get(&kind).copied().unwrap_or(0)
  }

  pub fn draws(&self) -> impl Iterator<Item = &Draw> {
    self.events.iter().filter_map(|e| match e {
      Event::Draw(d) => Some(d),
      _ => None,
    })
  }
}

type SharedJournal = Rc<RefCell<Journal>>;

pub struct TextureRepr {
  pub id: u32,
  journal: SharedJournal,
}

impl Drop for TextureRepr {
  fn drop(&mut self) {
    let mut journal = self.journal.borrow_mut();
    journal.textures.remove(&self.id);
    journal.release(Kind::Texture);
  }
}

pub struct RenderbufferRepr {
  pub id: u32,
  journal: SharedJournal,
}

impl Drop for RenderbufferRepr {
  fn drop(&mut self) {
    self.journal.borrow_mut().release(Kind::Renderbuffer);
  }
}

pub struct FramebufferRepr {
  pub id: u32,
  size: [u32; 2],
  has_color: bool,
  has_depth: bool,
  journal: SharedJournal,
}

impl Drop for FramebufferRepr {
  fn drop(&mut self) {
    // the back buffer is not owned
    if self.id != 0 {
      self.journal.borrow_mut().release(Kind::Framebuffer);
    }
  }
}

pub struct StageRepr {
  uniforms: Vec<String>,
}

pub struct ProgramRepr {
  pub id: u32,
  journal: SharedJournal,
}

impl Drop for ProgramRepr {
  fn drop(&mut self) {
    self.journal.borrow_mut().release(Kind::Program);
  }
}

pub struct TessRepr {
  pub id: u32,
  render_count: usize,
  journal: SharedJournal,
}

impl Drop for TessRepr {
  fn drop(&mut self) {
    self.journal.borrow_mut().release(Kind::Tess);
  }
}

/// The recording backend.
pub struct Recorder {
  journal: SharedJournal,
}

fn declared_uniforms(src: &str) -> Vec<String> {
  src
    .lines()
    .filter_map(|line| {
      let mut words = line.trim().strip_prefix("uniform ")?.split_whitespace();
      let _ty = words.next()?;
      let name = words.next()?.trim_end_matches(';');
      Some(name.to_owned())
    })
    .collect()
}

unsafe impl TextureBackend for Recorder {
  type TextureRepr = TextureRepr;
  type RenderbufferRepr = RenderbufferRepr;

  unsafe fn new_texture(
    &mut self,
    size: [u32; 2],
    format: PixelFormat,
    sampler: &Sampler,
  ) -> Result<Self::TextureRepr, TextureError> {
    let mut journal = self.journal.borrow_mut();
    let id = journal.create(Kind::Texture);
    journal.textures.insert(
      id,
      TextureInfo {
        size,
        format,
        sampler: *sampler,
        uploads: 0,
      },
    );

    Ok(TextureRepr {
      id,
      journal: self.journal.clone(),
    })
  }

  unsafe fn upload_texels(
    texture: &mut Self::TextureRepr,
    _texels: &[u8],
  ) -> Result<(), TextureError> {
    if let Some(info) = texture.journal.borrow_mut().textures.get_mut(&texture.id) {
      info.uploads += 1;
    }

    Ok(())
  }

  unsafe fn new_renderbuffer(
    &mut self,
    _size: [u32; 2],
    _format: PixelFormat,
  ) -> Result<Self::RenderbufferRepr, TextureError> {
    let id = self.journal.borrow_mut().create(Kind::Renderbuffer);

    Ok(RenderbufferRepr {
      id,
      journal: self.journal.clone(),
    })
  }
}

unsafe impl FramebufferBackend for Recorder {
  type FramebufferRepr = FramebufferRepr;

  unsafe fn new_framebuffer(
    &mut self,
    size: [u32; 2],
  ) -> Result<Self::FramebufferRepr, FramebufferError> {
    let id = self.journal.borrow_mut().create(Kind::Framebuffer);

    Ok(FramebufferRepr {
      id,
      size,
      has_color: false,
      has_depth: false,
      journal: self.journal.clone(),
    })
  }

  unsafe fn attach_color_texture(
    framebuffer: &mut Self::FramebufferRepr,
    _texture: &Self::TextureRepr,
  ) -> Result<(), FramebufferError> {
    framebuffer.has_color = true;
    Ok(())
  }

  unsafe fn attach_depth_texture(
    framebuffer: &mut Self::FramebufferRepr,
    _texture: &Self::TextureRepr,
  ) -> Result<(), FramebufferError> {
    framebuffer.has_depth = true;
    Ok(())
  }

  unsafe fn attach_depth_renderbuffer(
    framebuffer: &mut Self::FramebufferRepr,
    _renderbuffer: &Self::RenderbufferRepr,
  ) -> Result<(), FramebufferError> {
    framebuffer.has_depth = true;
    Ok(())
  }

  unsafe fn validate_framebuffer(
    framebuffer: Self::FramebufferRepr,
  ) -> Result<Self::FramebufferRepr, FramebufferError> {
    let status = framebuffer.journal.borrow_mut().framebuffer_status.take();

    match status {
      Some(reason) => Err(FramebufferError::Incomplete(reason)),
      None if !framebuffer.has_color && !framebuffer.has_depth => Err(
        FramebufferError::Incomplete(IncompleteReason::MissingAttachment),
      ),
      None => Ok(framebuffer),
    }
  }

  unsafe fn back_buffer(
    &mut self,
    size: [u32; 2],
  ) -> Result<Self::FramebufferRepr, FramebufferError> {
    Ok(FramebufferRepr {
      id: 0,
      size,
      has_color: true,
      has_depth: true,
      journal: self.journal.clone(),
    })
  }
}

unsafe impl ShaderBackend for Recorder {
  type StageRepr = StageRepr;
  type ProgramRepr = ProgramRepr;
  type UniformRepr = String;

  unsafe fn new_stage(&mut self, ty: StageType, src: &str) -> Result<Self::StageRepr, StageError> {
    if let Some((line, _)) = src
      .lines()
      .enumerate()
      .find(|(_, l)| l.trim_start().starts_with("#error"))
    {
      return Err(StageError::CompilationFailed(
        ty,
        format!("0:{}: #error directive", line + 1),
      ));
    }

    Ok(StageRepr {
      uniforms: declared_uniforms(src),
    })
  }

  unsafe fn new_program(
    &mut self,
    vertex: &Self::StageRepr,
    fragment: &Self::StageRepr,
  ) -> Result<Self::ProgramRepr, ProgramError> {
    let mut uniforms = vertex.uniforms.clone();
    for name in &fragment.uniforms {
      if !uniforms.contains(name) {
        uniforms.push(name.clone());
      }
    }

    let mut journal = self.journal.borrow_mut();
    let id = journal.create(Kind::Program);
    journal.program_uniforms.insert(id, uniforms);

    Ok(ProgramRepr {
      id,
      journal: self.journal.clone(),
    })
  }

  unsafe fn uniform_location(program: &Self::ProgramRepr, name: &str) -> Option<Self::UniformRepr> {
    let journal = program.journal.borrow();
    let declared = journal.program_uniforms.get(&program.id)?;

    declared.iter().find(|n| *n == name).cloned()
  }

  unsafe fn set_uniform(
    program: &mut Self::ProgramRepr,
    uniform: &Self::UniformRepr,
    value: &UniformValue,
  ) {
    let mut journal = program.journal.borrow_mut();

    if journal.program != Some(program.id) {
      let violation = format!("{} set on program {} while not in use", uniform, program.id);
      journal.violations.push(violation);
    }

    journal
      .uniform_values
      .entry(program.id)
      .or_default()
      .insert(uniform.clone(), value.clone());
  }
}

unsafe impl TessBackend for Recorder {
  type TessRepr = TessRepr;

  unsafe fn new_tess(&mut self, desc: TessDesc<'_>) -> Result<Self::TessRepr, TessError> {
    if desc.vertices.len() != desc.stride * desc.vertex_count {
      return Err(TessError::CannotCreate("vertex bytes don’t match the stride".to_owned()));
    }

    let id = self.journal.borrow_mut().create(Kind::Tess);

    Ok(TessRepr {
      id,
      render_count: desc.indices.map_or(desc.vertex_count, <[u32]>::len),
      journal: self.journal.clone(),
    })
  }
}

unsafe impl PipelineBackend for Recorder {
  unsafe fn bind_framebuffer(&mut self, framebuffer: &Self::FramebufferRepr, viewport: [u32; 4]) {
    let mut journal = self.journal.borrow_mut();

    if viewport[0] + viewport[2] > framebuffer.size[0] || viewport[1] + viewport[3] > framebuffer.size[1] {
      let violation = format!(
        "viewport {:?} out of framebuffer {} of size {:?}",
        viewport, framebuffer.id, framebuffer.size
      );
      journal.violations.push(violation);
    }

    journal.framebuffer = framebuffer.id;
    journal.viewport = viewport;
    journal.events.push(Event::BindFramebuffer {
      framebuffer: framebuffer.id,
      viewport,
    });
  }

  unsafe fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>) {
    self.journal.borrow_mut().events.push(Event::Clear { color, depth });
  }

  unsafe fn use_program(&mut self, program: &Self::ProgramRepr) {
    self.journal.borrow_mut().program = Some(program.id);
  }

  unsafe fn bind_texture(&mut self, unit: u32, texture: &Self::TextureRepr) {
    self.journal.borrow_mut().bound_textures.insert(unit, texture.id);
  }

  unsafe fn set_render_state(&mut self, state: &RenderState) {
    self.journal.borrow_mut().render_state = Some(*state);
  }

  unsafe fn render_tess(&mut self, tess: &Self::TessRepr) {
    let mut journal = self.journal.borrow_mut();

    let program = match journal.program {
      Some(program) => program,
      None => {
        journal.violations.push("draw without a program".to_owned());
        return;
      }
    };

    let draw = Draw {
      framebuffer: journal.framebuffer,
      viewport: journal.viewport,
      program,
      declared: journal.program_uniforms.get(&program).cloned().unwrap_or_default(),
      uniforms: journal.uniform_values.get(&program).cloned().unwrap_or_default(),
      textures: journal.bound_textures.clone(),
      render_state: journal.render_state.unwrap_or_default(),
      vertex_count: tess.render_count,
    };

    journal.events.push(Event::Draw(draw));
  }
}

/// A graphics context running the recording backend.
pub struct TestContext {
  backend: Recorder,
}

impl TestContext {
  pub fn new() -> Self {
    TestContext {
      backend: Recorder {
        journal: Rc::new(RefCell::new(Journal::default())),
      },
    }
  }

  pub fn journal(&self) -> Ref<'_, Journal> {
    self.backend.journal.borrow()
  }

  /// Make the next framebuffer validation fail with a given reason.
  pub fn fail_next_framebuffer(&self, reason: IncompleteReason) {
    self.backend.journal.borrow_mut().framebuffer_status = Some(reason);
  }

  /// Take the events recorded so far.
  pub fn take_events(&self) -> Vec<Event> {
    std::mem::take(&mut self.backend.journal.borrow_mut().events)
  }

  pub fn live(&self, kind: Kind) -> usize {
    self.journal().live(kind)
  }

  pub fn live_total(&self) -> usize {
    self.journal().live_total()
  }

  pub fn violations(&self) -> Vec<String> {
    self.journal().violations.clone()
  }
}

unsafe impl GraphicsContext for TestContext {
  type Backend = Recorder;

  fn backend(&mut self) -> &mut Self::Backend {
    &mut self.backend
  }
}

/// Draws of a list of events.
pub fn draws(events: &[Event]) -> Vec<&Draw> {
  events
    .iter()
    .filter_map(|e| match e {
      Event::Draw(d) => Some(d),
      _ => None,
    })
    .collect()
}
