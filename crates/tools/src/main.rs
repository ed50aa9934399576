use std::env;
use std::fs;
use std::path::PathBuf;

use model::Visualization;
use render::StyleDocument;
use serde::Serialize;
use session::{HttpStyleProvider, SessionConfig, StyleConfig, acquire_style, check_style};
use tools::{ReplayOptions, check_features, replay};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "replay" => cmd_replay(args),
        "validate" => cmd_validate(args),
        "style" => cmd_style(args),
        _ => Err(usage()),
    }
}

fn cmd_replay(args: Vec<String>) -> Result<(), String> {
    // circle30 replay <visualization.json> [--style style.json] [--twice]
    let mut input: Option<PathBuf> = None;
    let mut options = ReplayOptions {
        config: SessionConfig::from_env(),
        ..ReplayOptions::default()
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--style" => {
                i += 1;
                let path = args.get(i).ok_or("--style requires a value")?;
                let text = fs::read_to_string(path).map_err(|e| format!("read {path}: {e}"))?;
                let value = serde_json::from_str(&text).map_err(|e| format!("parse {path}: {e}"))?;
                options.style = Some(check_style(value).map_err(|e| format!("{path}: {e}"))?);
            }
            "--twice" => options.twice = true,
            s if s.starts_with('-') => {
                return Err(format!("unknown arg: {s}\n\n{}", usage()));
            }
            s => {
                if input.replace(PathBuf::from(s)).is_some() {
                    return Err("replay takes one visualization file".to_string());
                }
            }
        }
        i += 1;
    }

    let visualization = read_visualization(input.ok_or_else(usage)?)?;
    print_json(&replay(visualization, &options))
}

fn cmd_validate(args: Vec<String>) -> Result<(), String> {
    // circle30 validate <visualization.json>
    let [path] = args.as_slice() else {
        return Err(usage());
    };
    let visualization = read_visualization(PathBuf::from(path))?;
    print_json(&check_features(&visualization))
}

fn cmd_style(args: Vec<String>) -> Result<(), String> {
    // circle30 style [--out style.json]
    let mut out: Option<PathBuf> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                i += 1;
                out = Some(PathBuf::from(args.get(i).ok_or("--out requires a value")?));
            }
            s => return Err(format!("unknown arg: {s}\n\n{}", usage())),
        }
        i += 1;
    }

    let config = StyleConfig::from_env();
    let provider = HttpStyleProvider::new(config.clone()).map_err(|e| e.to_string())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("start runtime: {e}"))?;
    let style: StyleDocument = runtime
        .block_on(acquire_style(&provider, &config.version_pattern))
        .map_err(|e| e.to_string())?;

    let text = serde_json::to_string_pretty(style.as_value()).map_err(|e| e.to_string())?;
    match out {
        Some(path) => {
            fs::write(&path, text).map_err(|e| format!("write {}: {e}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn read_visualization(path: PathBuf) -> Result<Visualization, String> {
    let text = fs::read_to_string(&path).map_err(|e| format!("read {}: {e}", path.display()))?;
    Visualization::from_json_str(&text).map_err(|e| format!("parse {}: {e}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn usage() -> String {
    let exe = env::args().next().unwrap_or_else(|| "circle30".to_string());
    format!(
        "Usage:\n  {exe} replay <visualization.json> [--style style.json] [--twice]\n  {exe} validate <visualization.json>\n  {exe} style [--out style.json]\n\nNotes:\n- `replay` runs the document against a headless map and prints the installed objects, skipped features and camera.\n- `style` fetches the basemap style with TOMTOM_API_KEY; CIRCLE30_STYLE_* variables override the defaults.\n- Set RUST_LOG=debug for pass details on stderr.\n"
    )
}
