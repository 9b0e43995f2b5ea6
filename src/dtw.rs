use crate::types::NormalizedFrame;

/// Distancia entre dos frames: media de las distancias euclídeas sobre los
/// landmarks presentes en ambos. Sin nombres en común la distancia es
/// infinita, un centinela válido que el puntaje propaga.
pub fn frame_cost(a: &NormalizedFrame, b: &NormalizedFrame) -> f64 {
    let mut total = 0.0f64;
    let mut matches = 0u32;

    for (name, p1) in &a.landmarks {
        if let Some(p2) = b.landmarks.get(name) {
            let dx = (p1.x - p2.x) as f64;
            let dy = (p1.y - p2.y) as f64;
            total += (dx * dx + dy * dy).sqrt();
            matches += 1;
        }
    }

    if matches > 0 {
        total / matches as f64
    } else {
        f64::INFINITY
    }
}

/// Puntaje de alineamiento DTW entre una plantilla (m frames) y el buffer
/// terminado (n frames). Menor es mejor; infinito significa "sin
/// comparación útil".
///
/// La primera fila vale 0 (inicio abierto: la plantilla puede empezar en
/// cualquier offset del buffer) y el puntaje final es el mínimo de la
/// última fila dividido por m (fin abierto), de modo que los frames de
/// reposo antes y después de la seña no penalizan.
pub fn score(template: &[NormalizedFrame], buffer: &[NormalizedFrame]) -> f64 {
    let m = template.len();
    let n = buffer.len();

    if n == 0 || m == 0 {
        return f64::INFINITY;
    }

    let mut dtw = vec![vec![f64::INFINITY; n + 1]; m + 1];
    for j in 0..=n {
        dtw[0][j] = 0.0;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = frame_cost(&template[i - 1], &buffer[j - 1]);

            let best = dtw[i - 1][j] // inserción en el buffer
                .min(dtw[i][j - 1]) // borrado del buffer
                .min(dtw[i - 1][j - 1]); // correspondencia directa

            dtw[i][j] = cost + best;
        }
    }

    let min_final = dtw[m].iter().copied().fold(f64::INFINITY, f64::min);
    min_final / m as f64
}
