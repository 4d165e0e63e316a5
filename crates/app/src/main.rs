//! Entry point for objview.
//! Loads an OBJ, builds it, optionally prints it back, draws and unloads.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use renderer::{HeadlessBackend, MeshBackend, ObjModel, RenderSettings, WgpuBackend};

#[derive(Debug)]
struct Options {
    obj: PathBuf,
    print: bool,
    gpu: bool,
    backends: wgpu::Backends,
    frames: u32,
    settings: RenderSettings,
}

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_flag(args: &[String], name: &str) -> bool {
    // --name[=on|off], default off
    let eq = format!("{name}=");
    for arg in args {
        if arg == name {
            return true;
        }
        if let Some(val) = arg.strip_prefix(eq.as_str()) {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_vec3(val: &str) -> Option<[f32; 3]> {
    let mut it = val.split(',').map(|c| c.trim().parse::<f32>());
    match (it.next(), it.next(), it.next(), it.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Some([x, y, z]),
        _ => None,
    }
}

fn parse_settings(args: &[String]) -> RenderSettings {
    let mut settings = RenderSettings::default();
    for arg in args {
        if let Some(v) = arg.strip_prefix("--color=") {
            match parse_vec3(v) {
                Some(c) => settings.color = c,
                None => log::warn!("Ignoring malformed --color '{}', expected r,g,b", v),
            }
        } else if let Some(v) = arg.strip_prefix("--light=") {
            match parse_vec3(v) {
                Some(l) => settings.light_direction = l,
                None => log::warn!("Ignoring malformed --light '{}', expected x,y,z", v),
            }
        } else if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(w), Ok(h)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    settings.width = w.max(1);
                    settings.height = h.max(1);
                }
            }
        }
    }
    settings
}

fn parse_options(args: &[String]) -> Result<Options> {
    let obj = args
        .iter()
        .find_map(|a| a.strip_prefix("--obj="))
        .or_else(|| args.iter().map(String::as_str).find(|a| !a.starts_with("--")))
        .map(PathBuf::from);
    let Some(obj) = obj else {
        bail!("usage: app <file.obj> [--print] [--gpu] [--gpu-backend=..] [--frames=N] [--color=r,g,b] [--light=x,y,z] [--size=WxH]");
    };
    let frames = args
        .iter()
        .find_map(|a| a.strip_prefix("--frames="))
        .map(|v| v.parse::<u32>().with_context(|| format!("Invalid --frames '{v}'")))
        .transpose()?
        .unwrap_or(1);

    Ok(Options {
        obj,
        print: parse_flag(args, "--print"),
        gpu: parse_flag(args, "--gpu"),
        backends: parse_backend_arg(args),
        frames,
        settings: parse_settings(args),
    })
}

fn run<B: MeshBackend>(backend: B, opts: &Options) -> Result<()> {
    let mut model = ObjModel::new(backend);
    model
        .load(&opts.obj)
        .with_context(|| format!("Unable to load model {}", opts.obj.display()))?;

    if opts.print {
        model.print().context("Failed to print mesh data")?;
    }

    model.build().context("Failed to build mesh")?;
    for _ in 0..opts.frames {
        model.draw().context("Draw failed")?;
    }
    log::info!(
        "Drew {} frame(s) of {} triangles",
        opts.frames,
        model.mesh().indices.len() / 3
    );

    model.destroy();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let opts = parse_options(&args)?;
    log::info!(
        "Starting objview. model={}, gpu={}, backends={:?}, frames={}",
        opts.obj.display(),
        opts.gpu,
        opts.backends,
        opts.frames
    );

    if opts.gpu {
        let backend = WgpuBackend::new_blocking(opts.backends, opts.settings)
            .context("Failed to initialise GPU backend")?;
        run(backend, &opts)?;
    } else {
        run(HeadlessBackend::new(), &opts)?;
    }

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn positional_path_and_flags() {
        let opts = parse_options(&args(&["teapot.obj", "--print", "--frames=3"])).unwrap();
        assert_eq!(opts.obj, PathBuf::from("teapot.obj"));
        assert!(opts.print);
        assert!(!opts.gpu);
        assert_eq!(opts.frames, 3);
        assert_eq!(opts.settings, RenderSettings::default());
    }

    #[test]
    fn obj_flag_wins_and_settings_parse() {
        let opts = parse_options(&args(&[
            "--obj=bunny.obj",
            "--gpu=on",
            "--gpu-backend=vulkan",
            "--color=1,0.5,0",
            "--light=0, 0, -1",
            "--size=640x480",
        ]))
        .unwrap();
        assert_eq!(opts.obj, PathBuf::from("bunny.obj"));
        assert!(opts.gpu);
        assert_eq!(opts.backends, wgpu::Backends::VULKAN);
        assert_eq!(opts.settings.color, [1.0, 0.5, 0.0]);
        assert_eq!(opts.settings.light_direction, [0.0, 0.0, -1.0]);
        assert_eq!((opts.settings.width, opts.settings.height), (640, 480));
    }

    #[test]
    fn malformed_values() {
        assert!(parse_options(&args(&["--print"])).is_err());
        assert!(parse_options(&args(&["a.obj", "--frames=lots"])).is_err());
        let settings = parse_settings(&args(&["--color=1,2"]));
        assert_eq!(settings.color, RenderSettings::default().color);
    }

    #[test]
    fn headless_run_loads_builds_and_draws() {
        let path = std::env::temp_dir().join(format!("objview-app-{}.obj", std::process::id()));
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n").unwrap();
        let opts = parse_options(&args(&[path.to_str().unwrap(), "--frames=2"])).unwrap();
        let result = run(HeadlessBackend::new(), &opts);
        std::fs::remove_file(&path).ok();
        result.expect("headless run");
    }
}
