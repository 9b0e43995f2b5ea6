/*
Signoscopio - Reconocimiento de señas en tiempo real por DTW

Pipeline que:
1. Recibe ticks de landmarks desde la fuente (aquí, replay de sesiones CSV)
2. Filtra cada frame por cantidad y confianza de landmarks
3. Normaliza las coordenadas a un marco canónico (caja unitaria)
4. Acumula la sesión en un buffer de grabación
5. Al terminar, compara contra las plantillas con DTW y rankea

Para compilar y ejecutar:
    ./target/release/signoscopio plantillas/ sesion.csv

Modo debug (elige una sesión al azar de sesiones/):
    ./target/release/signoscopio plantillas/
*/

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, unbounded};

use signoscopio::controller::RecognitionController;
use signoscopio::csv_loader::load_session_from_csv;
use signoscopio::reference_store::ReferenceStore;
use signoscopio::source::start_replay_source;
use signoscopio::types::{CaptureTick, MatchResult, NormalizedFrame, CAPTURE_RATE};

/// Carpeta donde el modo debug busca sesiones grabadas
const SESSIONS_DIR: &str = "sesiones";

fn print_ranking(results: &[MatchResult]) {
    if results.is_empty() {
        println!("⚠️  No hay plantillas contra las que comparar");
        return;
    }

    let best = &results[0];
    println!(
        "\n🥇 Mejor candidata: {} (puntaje {:.4})",
        best.name.as_deref().unwrap_or("(sin nombre)"),
        best.score
    );

    println!("\nTop-5 plantillas (menor puntaje = más parecida):");
    for (idx, result) in results.iter().take(5).enumerate() {
        println!(
            "  {:>2}. [{:05}] {:<25} {:>10.4}",
            idx + 1,
            result.template_id,
            result.name.as_deref().unwrap_or("(sin nombre)"),
            result.score
        );
    }
}

fn main() -> Result<()> {
    println!("🖐️  Signoscopio - reconocimiento de señas por DTW\n");

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Uso: signoscopio <plantillas_dir> [sesion.csv]");
        return Ok(());
    }

    let templates_dir = PathBuf::from(&args[1]);
    let store = ReferenceStore::load_from_dir(&templates_dir)?;
    println!(
        "✅ {} plantillas cargadas desde {:?}",
        store.len(),
        templates_dir
    );

    if args.len() < 3 {
        println!("🔧 Modo: DEBUG - sesión al azar de {}/\n", SESSIONS_DIR);
        return debug_mode(store);
    }

    let session_path = PathBuf::from(&args[2]);
    println!("🎞️  Reproduciendo sesión desde {:?}\n", session_path);

    let ticks = load_session_from_csv(&session_path)?;

    // Canal acotado productor → consumidor, como la fuente en vivo
    let (tx, rx) = bounded::<CaptureTick>(100);
    std::thread::spawn(move || {
        start_replay_source(ticks, CAPTURE_RATE, tx);
    });

    // Hilo de matching: recibe el snapshot al detener la grabación,
    // de modo que el consumidor de ticks nunca espera al DTW
    let (tx_match, rx_match) = unbounded::<Vec<NormalizedFrame>>();
    let matcher = std::thread::spawn(move || {
        for frames in rx_match {
            let results = RecognitionController::match_frames(&store, &frames);
            print_ranking(&results);
        }
    });

    let mut controller = RecognitionController::default();
    controller.start_recording();

    for tick in rx {
        controller.feed(tick);
    }

    println!(
        "🎬 Sesión terminada: {} frames en buffer, {} descartados",
        controller.buffer_len(),
        controller.frames_dropped()
    );

    let frames = controller.stop_recording();
    tx_match
        .send(frames)
        .map_err(|_| anyhow!("El hilo de matching terminó antes de tiempo"))?;
    drop(tx_match);

    matcher
        .join()
        .map_err(|_| anyhow!("El hilo de matching entró en pánico"))?;

    Ok(())
}

/// Modo DEBUG: elige una sesión CSV al azar y la compara de una vez
fn debug_mode(store: ReferenceStore) -> Result<()> {
    use rand::Rng;

    let sessions_dir = PathBuf::from(SESSIONS_DIR);
    if !sessions_dir.exists() {
        return Err(anyhow!("Carpeta no existe: {}", SESSIONS_DIR));
    }

    let csv_files: Vec<PathBuf> = fs::read_dir(&sessions_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();

    if csv_files.is_empty() {
        return Err(anyhow!("No hay archivos CSV en {}", SESSIONS_DIR));
    }

    let random_idx = rand::thread_rng().gen_range(0..csv_files.len());
    let session_path = &csv_files[random_idx];
    println!("📄 Sesión elegida: {:?}", session_path);

    let ticks = load_session_from_csv(session_path)?;

    let mut controller = RecognitionController::default();
    controller.start_recording();
    for tick in ticks {
        controller.feed(tick);
    }

    println!(
        "🎬 {} frames en buffer, {} descartados",
        controller.buffer_len(),
        controller.frames_dropped()
    );

    let results = controller.stop_and_match(&store);
    print_ranking(&results);

    Ok(())
}
