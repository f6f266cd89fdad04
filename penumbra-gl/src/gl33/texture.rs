use gl::{self, types::*};
use std::cell::RefCell;
use std::os::raw::c_void;
use std::ptr;
use std::rc::Rc;

use crate::gl33::state::GLState;
use crate::gl33::GL33;
use penumbra::backend::texture::TextureBackend;
use penumbra::pixel::PixelFormat;
use penumbra::texture::{MagFilter, MinFilter, Sampler, TextureError, Wrap};

pub struct Texture {
  pub(crate) handle: GLuint,
  size: [u32; 2],
  format: PixelFormat,
  mipmaps: bool,
  state: Rc<RefCell<GLState>>,
}

impl Drop for Texture {
  fn drop(&mut self) {
    unsafe {
      gl::DeleteTextures(1, &self.handle);
    }

    if let Ok(mut state) = self.state.try_borrow_mut() {
      state.texture_deleted(self.handle);
    }
  }
}

pub struct Renderbuffer {
  pub(crate) handle: GLuint,
}

impl Drop for Renderbuffer {
  fn drop(&mut self) {
    unsafe {
      gl::DeleteRenderbuffers(1, &self.handle);
    }
  }
}

// Texture unit used while creating and uploading textures.
const SCRATCH_UNIT: u32 = 0;

unsafe impl TextureBackend for GL33 {
  type TextureRepr = Texture;
  type RenderbufferRepr = Renderbuffer;

  unsafe fn new_texture(
    &mut self,
    size: [u32; 2],
    format: PixelFormat,
    sampler: &Sampler,
  ) -> Result<Self::TextureRepr, TextureError> {
    let (glformat, iformat, encoding) = opengl_pixel_format(format);
    let mipmaps = sampler.min_filter.uses_mipmaps();

    let mut handle: GLuint = 0;
    gl::GenTextures(1, &mut handle);

    // the texture is released on error from now on
    let texture = Texture {
      handle,
      size,
      format,
      mipmaps,
      state: self.state.clone(),
    };

    self.state.borrow_mut().bind_texture(SCRATCH_UNIT, handle);

    set_texture_levels(mipmap_levels(size, mipmaps));
    apply_sampler_to_texture(sampler);

    // drain stale errors so that only the storage creation is checked
    for _ in 0..16 {
      if gl::GetError() == gl::NO_ERROR {
        break;
      }
    }

    gl::TexImage2D(
      gl::TEXTURE_2D,
      0,
      iformat as GLint,
      size[0] as GLsizei,
      size[1] as GLsizei,
      0,
      glformat,
      encoding,
      ptr::null(),
    );

    match gl::GetError() {
      gl::NO_ERROR => Ok(texture),
      err => Err(TextureError::TextureStorageCreationFailed(format!(
        "cannot allocate {}×{} {} storage (OpenGL error {:#x})",
        size[0], size[1], format, err
      ))),
    }
  }

  unsafe fn upload_texels(
    texture: &mut Self::TextureRepr,
    texels: &[u8],
  ) -> Result<(), TextureError> {
    let (glformat, _, encoding) = opengl_pixel_format(texture.format);

    texture
      .state
      .borrow_mut()
      .bind_texture(SCRATCH_UNIT, texture.handle);

    // texels are tightly packed
    gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);

    gl::TexSubImage2D(
      gl::TEXTURE_2D,
      0,
      0,
      0,
      texture.size[0] as GLsizei,
      texture.size[1] as GLsizei,
      glformat,
      encoding,
      texels.as_ptr() as *const c_void,
    );

    if texture.mipmaps {
      gl::GenerateMipmap(gl::TEXTURE_2D);
    }

    Ok(())
  }

  unsafe fn new_renderbuffer(
    &mut self,
    size: [u32; 2],
    format: PixelFormat,
  ) -> Result<Self::RenderbufferRepr, TextureError> {
    let (_, iformat, _) = opengl_pixel_format(format);

    let mut handle: GLuint = 0;
    gl::GenRenderbuffers(1, &mut handle);
    gl::BindRenderbuffer(gl::RENDERBUFFER, handle);
    gl::RenderbufferStorage(
      gl::RENDERBUFFER,
      iformat,
      size[0] as GLsizei,
      size[1] as GLsizei,
    );
    gl::BindRenderbuffer(gl::RENDERBUFFER, 0);

    Ok(Renderbuffer { handle })
  }
}

/// Map a pixel format to its OpenGL (format, internal format, encoding) triple.
pub(crate) fn opengl_pixel_format(pf: PixelFormat) -> (GLenum, GLenum, GLenum) {
  match pf {
    PixelFormat::RGBA8 => (gl::RGBA, gl::RGBA8, gl::UNSIGNED_BYTE),
    PixelFormat::SRGBA8 => (gl::RGBA, gl::SRGB8_ALPHA8, gl::UNSIGNED_BYTE),
    PixelFormat::RGB8 => (gl::RGB, gl::RGB8, gl::UNSIGNED_BYTE),
    PixelFormat::R32F => (gl::RED, gl::R32F, gl::FLOAT),
    PixelFormat::Depth16 => (gl::DEPTH_COMPONENT, gl::DEPTH_COMPONENT16, gl::UNSIGNED_SHORT),
    PixelFormat::Depth24 => (gl::DEPTH_COMPONENT, gl::DEPTH_COMPONENT24, gl::UNSIGNED_INT),
    PixelFormat::Depth32F => (gl::DEPTH_COMPONENT, gl::DEPTH_COMPONENT32F, gl::FLOAT),
  }
}

/// Number of mipmap levels below the base level.
fn mipmap_levels(size: [u32; 2], mipmaps: bool) -> u32 {
  if mipmaps {
    31 - size[0].max(size[1]).max(1).leading_zeros()
  } else {
    0
  }
}

fn set_texture_levels(mipmaps: u32) {
  unsafe {
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_BASE_LEVEL, 0);
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAX_LEVEL, mipmaps as GLint);
  }
}

fn apply_sampler_to_texture(sampler: &Sampler) {
  unsafe {
    gl::TexParameteri(
      gl::TEXTURE_2D,
      gl::TEXTURE_WRAP_S,
      opengl_wrap(sampler.wrap_s) as GLint,
    );
    gl::TexParameteri(
      gl::TEXTURE_2D,
      gl::TEXTURE_WRAP_T,
      opengl_wrap(sampler.wrap_t) as GLint,
    );
    gl::TexParameteri(
      gl::TEXTURE_2D,
      gl::TEXTURE_MIN_FILTER,
      opengl_min_filter(sampler.min_filter) as GLint,
    );
    gl::TexParameteri(
      gl::TEXTURE_2D,
      gl::TEXTURE_MAG_FILTER,
      opengl_mag_filter(sampler.mag_filter) as GLint,
    );

    // depth maps are sampled as plain values; the shadow test happens in the shader
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_COMPARE_MODE, gl::NONE as GLint);
  }
}

fn opengl_wrap(wrap: Wrap) -> GLenum {
  match wrap {
    Wrap::ClampToEdge => gl::CLAMP_TO_EDGE,
    Wrap::Repeat => gl::REPEAT,
  }
}

fn opengl_min_filter(filter: MinFilter) -> GLenum {
  match filter {
    MinFilter::Nearest => gl::NEAREST,
    MinFilter::Linear => gl::LINEAR,
    MinFilter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
  }
}

fn opengl_mag_filter(filter: MagFilter) -> GLenum {
  match filter {
    MagFilter::Nearest => gl::NEAREST,
    MagFilter::Linear => gl::LINEAR,
  }
}
