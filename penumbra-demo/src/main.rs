mod input;

use cgmath::Point3;
use glfw::{Context as _, CursorMode};
use image::RgbaImage;
use input::{adapt_events, apply};
use penumbra::camera::InputState;
use penumbra::loader::{self, PendingAsset};
use penumbra::motion_blur::{DEFAULT_SAMPLES, MAX_SAMPLES};
use penumbra::renderer::{Controls, ForwardRenderer, RendererConfig};
use penumbra::shadow::{ShadowSettings, SHADOW_MAP_RESOLUTION};
use penumbra_gl::GL33;
use penumbra_glfw::GlfwSurface;
use std::{error::Error, path::PathBuf, process, time::Instant};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
  name = "penumbra-demo",
  about = "Shadow mapping and camera motion blur.\n\nWASD and the mouse move the camera. B toggles \
           Blinn-Phong, G gamma correction, M motion blur. [ and ] change the number of blur \
           samples, - and = the blur scale."
)]
pub struct CLIOpts {
  #[structopt(long, default_value = "1280")]
  /// Width of the window.
  width: u32,

  #[structopt(long, default_value = "720")]
  /// Height of the window.
  height: u32,

  #[structopt(short, long)]
  /// Diffuse texture of the floor and cubes; a checkerboard is used otherwise.
  texture: Option<PathBuf>,

  #[structopt(long)]
  /// Use Phong specular highlights instead of Blinn-Phong.
  phong: bool,

  #[structopt(short, long)]
  /// Enable gamma correction.
  gamma: bool,

  #[structopt(long)]
  /// Start with motion blur disabled.
  no_motion_blur: bool,

  #[structopt(long, default_value = "12")]
  /// Number of samples taken along the velocity of every fragment.
  blur_samples: u32,

  #[structopt(long, default_value = "1")]
  /// Factor applied to the screen-space velocity.
  blur_scale: f32,

  #[structopt(long, default_value = "1024")]
  /// Width and height of the shadow map.
  shadow_resolution: u32,

  #[structopt(long, number_of_values = 3, allow_hyphen_values = true)]
  /// Position of the light, as three coordinates.
  light: Option<Vec<f32>>,
}

impl CLIOpts {
  fn renderer_config(&self) -> RendererConfig {
    let mut shadow = ShadowSettings {
      resolution: self.shadow_resolution.max(1),
      ..ShadowSettings::default()
    };

    if let Some([x, y, z]) = self.light.as_deref().and_then(|l| <[f32; 3]>::try_from(l).ok()) {
      shadow.light_position = Point3::new(x, y, z);
    }

    if shadow.resolution != SHADOW_MAP_RESOLUTION {
      log::info!("shadow map resolution: {}", shadow.resolution);
    }

    if self.blur_samples > MAX_SAMPLES {
      log::warn!(
        "{} blur samples requested, using {} (default is {})",
        self.blur_samples,
        MAX_SAMPLES,
        DEFAULT_SAMPLES
      );
    }

    RendererConfig {
      shadow,
      controls: Controls {
        blinn: !self.phong,
        gamma: self.gamma,
        motion_blur: !self.no_motion_blur,
        blur_samples: self.blur_samples,
        blur_scale: self.blur_scale,
      },
      ..RendererConfig::default()
    }
  }
}

fn run(cli_opts: CLIOpts) -> Result<(), Box<dyn Error>> {
  let surface = GlfwSurface::new_windowed(cli_opts.width, cli_opts.height, "penumbra")?;
  let mut context = surface.context;
  let events = surface.events_rx;

  context.window.set_cursor_mode(CursorMode::Disabled);

  let back_buffer = context.back_buffer()?;
  let mut renderer =
    ForwardRenderer::<GL33>::new(&mut context, back_buffer.size(), cli_opts.renderer_config())?;

  let mut texture: Option<PendingAsset<RgbaImage>> = match cli_opts.texture {
    Some(ref path) => Some(loader::spawn_image(path)?),
    None => None,
  };

  let mut input = InputState::new();
  let mut last_t = Instant::now();

  'app: loop {
    // handle events
    context.window.glfw.poll_events();

    let mut controls = *renderer.controls();
    for (_, event) in glfw::flush_messages(&events) {
      if let Some(action) = adapt_events(event) {
        if !apply(action, &mut input, &mut controls) {
          break 'app;
        }
      }
    }

    if controls != *renderer.controls() {
      renderer.set_controls(controls);
    }

    // upload the texture once decoded
    if let Some(result) = texture.as_mut().and_then(PendingAsset::poll) {
      renderer.accept_diffuse_texture(&mut context, result);
      texture = None;
    }

    let now = Instant::now();
    let dt = now.duration_since(last_t).as_secs_f32();
    last_t = now;

    let back_buffer = context.back_buffer()?;
    renderer.render_frame(&mut context, &back_buffer, &mut input, dt)?;

    context.window.swap_buffers();

    if context.window.should_close() {
      break;
    }
  }

  log::info!("{} frames rendered", renderer.frame_count());
  renderer.dispose();

  Ok(())
}

fn main() {
  env_logger::builder()
    .filter_level(log::LevelFilter::Info)
    .parse_default_env()
    .init();
  let cli_opts = CLIOpts::from_args();

  if let Err(e) = run(cli_opts) {
    log::error!("{}", e);
    process::exit(1);
  }
}
