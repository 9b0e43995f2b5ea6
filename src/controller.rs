use std::cmp::Ordering;

use crate::dtw;
use crate::live_buffer::LiveBuffer;
use crate::normalizer::FrameNormalizer;
use crate::quality_filter::FrameQualityFilter;
use crate::reference_store::ReferenceStore;
use crate::types::{CaptureTick, MatchResult, NormalizedFrame};

/// Orquestador del pipeline: por cada tick de la fuente pasa las
/// detecciones por el filtro de calidad y el normalizador, y anexa al
/// buffer mientras hay grabación. Al detener, compara la secuencia contra
/// todas las plantillas y devuelve el ranking por puntaje.
pub struct RecognitionController {
    filter: FrameQualityFilter,
    normalizer: FrameNormalizer,
    buffer: LiveBuffer,
    fed: u64,
    dropped: u64,
}

impl RecognitionController {
    pub fn new(filter: FrameQualityFilter, normalizer: FrameNormalizer) -> Self {
        Self {
            filter,
            normalizer,
            buffer: LiveBuffer::new(),
            fed: 0,
            dropped: 0,
        }
    }

    pub fn start_recording(&mut self) {
        self.buffer.start();
    }

    /// Procesa un tick de la fuente. Trabajo O(landmarks) por detección:
    /// nunca bloquea al productor. Cero detecciones es un tick válido.
    pub fn feed(&mut self, tick: CaptureTick) {
        if !self.buffer.is_recording() {
            return;
        }

        for frame in tick.detections {
            self.fed += 1;

            if !self.filter.accept(&frame) {
                self.dropped += 1;
                continue;
            }

            match self.normalizer.normalize(&frame, tick.tilt_deg) {
                Ok(normalized) => {
                    if !self.buffer.push(normalized) {
                        self.dropped += 1;
                    }
                }
                Err(_) => {
                    // fallo de normalización: se descarta y se sigue
                    self.dropped += 1;
                }
            }
        }
    }

    /// Cierra la sesión y entrega la secuencia filtrada por valor.
    /// El matching puede correr en otro hilo sobre esta copia mientras
    /// el productor arranca una grabación nueva.
    pub fn stop_recording(&mut self) -> Vec<NormalizedFrame> {
        self.buffer.stop(&self.filter)
    }

    /// Compara una secuencia terminada contra todas las plantillas.
    /// Devuelve el ranking ascendente por puntaje; los empates se
    /// resuelven por id para que el orden sea determinista.
    pub fn match_frames(store: &ReferenceStore, frames: &[NormalizedFrame]) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> = store
            .all()
            .iter()
            .map(|template| MatchResult {
                template_id: template.id,
                name: template.name.clone(),
                score: dtw::score(&template.frames, frames),
            })
            .collect();

        results.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.template_id.cmp(&b.template_id))
        });

        results
    }

    /// La plantilla mejor rankeada, si el almacén tiene alguna
    pub fn best_match(store: &ReferenceStore, frames: &[NormalizedFrame]) -> Option<MatchResult> {
        Self::match_frames(store, frames).into_iter().next()
    }

    /// Atajo: detener y comparar en el mismo hilo
    pub fn stop_and_match(&mut self, store: &ReferenceStore) -> Vec<MatchResult> {
        let frames = self.stop_recording();
        Self::match_frames(store, &frames)
    }

    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_recording(&self) -> bool {
        self.buffer.is_recording()
    }

    pub fn state(&self) -> &'static str {
        self.buffer.state()
    }

    /// Detecciones procesadas desde el arranque
    pub fn frames_fed(&self) -> u64 {
        self.fed
    }

    /// Detecciones descartadas por filtro, normalización u orden
    pub fn frames_dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for RecognitionController {
    fn default() -> Self {
        Self::new(FrameQualityFilter::default(), FrameNormalizer::default())
    }
}
