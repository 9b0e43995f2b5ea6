use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;

use crate::types::{CaptureTick, Frame, Landmark, Side};

/// Carga una sesión grabada desde un CSV en el formato
/// `frame,timestamp,side,tilt_deg,name,x,y,confidence`, una fila por
/// landmark, ordenado por índice de frame.
pub fn load_session_from_csv(path: impl AsRef<Path>) -> Result<Vec<CaptureTick>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("No se pudo abrir el CSV {:?}", path))?;

    struct PendingFrame {
        timestamp: f64,
        side: Side,
        tilt_deg: Option<f32>,
        landmarks: BTreeMap<String, Landmark>,
    }

    let mut pending: BTreeMap<u64, PendingFrame> = BTreeMap::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("Fila {} inválida en {:?}", row_idx + 1, path))?;
        if record.len() < 8 {
            bail!("La fila {} no tiene 8 columnas", row_idx + 1);
        }

        let frame_idx: u64 = record[0]
            .parse()
            .with_context(|| format!("frame inválido en fila {}", row_idx + 1))?;
        let timestamp: f64 = record[1]
            .parse()
            .with_context(|| format!("timestamp inválido en fila {}", row_idx + 1))?;
        let side = Side::from_str(&record[2]);
        let tilt_deg: Option<f32> = if record[3].is_empty() {
            None
        } else {
            Some(
                record[3]
                    .parse()
                    .with_context(|| format!("tilt_deg inválido en fila {}", row_idx + 1))?,
            )
        };

        let name = record[4].to_string();
        let x: f32 = record[5].parse()?;
        let y: f32 = record[6].parse()?;
        let confidence: f32 = record[7].parse()?;

        let entry = pending.entry(frame_idx).or_insert_with(|| PendingFrame {
            timestamp,
            side,
            tilt_deg,
            landmarks: BTreeMap::new(),
        });
        entry.landmarks.insert(name, Landmark::new(x, y, confidence));
    }

    if pending.is_empty() {
        return Err(anyhow!("El CSV {:?} no contiene datos", path));
    }

    // Agrupar frames consecutivos con el mismo timestamp en un tick
    // (captura multi-mano: varios apéndices por instante)
    let mut ticks: Vec<CaptureTick> = Vec::new();
    for (frame_idx, frame) in pending {
        let detection = Frame::new(frame_idx, frame.timestamp, frame.side, frame.landmarks);

        match ticks.last_mut() {
            Some(tick) if tick.timestamp == frame.timestamp => {
                if tick.tilt_deg.is_none() {
                    tick.tilt_deg = frame.tilt_deg;
                }
                tick.detections.push(detection);
            }
            _ => ticks.push(CaptureTick {
                timestamp: frame.timestamp,
                tilt_deg: frame.tilt_deg,
                detections: vec![detection],
            }),
        }
    }

    Ok(ticks)
}

/// Escribe una sesión en el mismo formato CSV que entiende el cargador
pub fn write_session_csv(path: impl AsRef<Path>, ticks: &[CaptureTick]) -> std::io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "frame,timestamp,side,tilt_deg,name,x,y,confidence")?;

    for tick in ticks {
        let tilt = tick
            .tilt_deg
            .map(|t| t.to_string())
            .unwrap_or_default();

        for frame in &tick.detections {
            for (name, p) in &frame.landmarks {
                writeln!(
                    file,
                    "{},{},{},{},{},{},{},{}",
                    frame.id,
                    tick.timestamp,
                    frame.side.as_str(),
                    tilt,
                    name,
                    p.x,
                    p.y,
                    p.confidence,
                )?;
            }
        }
    }

    Ok(())
}
