use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use signoscopio::controller::RecognitionController;
use signoscopio::csv_loader::load_session_from_csv;
use signoscopio::reference_store::ReferenceStore;

struct MatchOptions {
    dump_frames: bool,
}

fn parse_args() -> Result<(PathBuf, PathBuf, MatchOptions)> {
    let mut dump_frames = false;
    let mut positional: Vec<PathBuf> = Vec::new();

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dump-frames" => dump_frames = true,
            _ => {
                if positional.len() >= 2 {
                    bail!("Uso: match_session [--dump-frames] <plantillas_dir> <sesion.csv>");
                }
                positional.push(PathBuf::from(arg));
            }
        }
    }

    if positional.len() != 2 {
        bail!("Uso: match_session [--dump-frames] <plantillas_dir> <sesion.csv>");
    }

    let session_path = positional.pop().unwrap();
    let templates_dir = positional.pop().unwrap();
    Ok((templates_dir, session_path, MatchOptions { dump_frames }))
}

fn main() -> Result<()> {
    let (templates_dir, session_path, opts) = parse_args()?;

    let store = ReferenceStore::load_from_dir(&templates_dir)?;
    if store.is_empty() {
        return Err(anyhow!("No hay plantillas en {:?}", templates_dir));
    }
    println!("✅ {} plantillas cargadas", store.len());

    println!("🎞️  Evaluando sesión {:?}", session_path);
    let ticks = load_session_from_csv(&session_path)?;

    let mut controller = RecognitionController::default();
    controller.start_recording();
    for tick in ticks {
        controller.feed(tick);
    }

    let frames = controller.stop_recording();
    println!(
        "🎬 {} frames normalizados ({} descartados)",
        frames.len(),
        controller.frames_dropped()
    );

    let results = RecognitionController::match_frames(&store, &frames);

    let best = results
        .first()
        .ok_or_else(|| anyhow!("El almacén no devolvió resultados"))?;
    println!(
        "\n🥇 Mejor candidata: {} (puntaje {:.4})",
        best.name.as_deref().unwrap_or("(sin nombre)"),
        best.score
    );

    println!("\nTop-5 plantillas:");
    for (idx, result) in results.iter().take(5).enumerate() {
        println!(
            "  {:>2}. [{:05}] {:<25} {:>10.4}",
            idx + 1,
            result.template_id,
            result.name.as_deref().unwrap_or("(sin nombre)"),
            result.score
        );
    }

    if opts.dump_frames {
        println!("\n📊 Frames normalizados (orden exacto):");
        for frame in &frames {
            println!(
                "  frame {:03} t={:.3}s side={} landmarks={}",
                frame.id,
                frame.timestamp,
                frame.side.as_str(),
                frame.landmarks.len()
            );
            for (name, p) in &frame.landmarks {
                println!("    {:<16} ({:>8.5}, {:>8.5}) conf={:.2}", name, p.x, p.y, p.confidence);
            }
        }
    }

    Ok(())
}
