use crate::types::{Frame, LandmarkMap, NormalizedFrame, MIN_LANDMARKS, MIN_MEAN_CONF, SCREEN_CONF};

/// Parámetros del filtro de calidad
#[derive(Debug, Clone, Copy)]
pub struct QualityParams {
    /// Umbral para contar un landmark individual
    pub screen_conf: f32,
    /// Mínimo de landmarks que superan el umbral
    pub min_landmarks: usize,
    /// Confianza media mínima sobre los landmarks retenidos
    pub min_mean_conf: f32,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            screen_conf: SCREEN_CONF,
            min_landmarks: MIN_LANDMARKS,
            min_mean_conf: MIN_MEAN_CONF,
        }
    }
}

/// Motivo de rechazo de un frame, inspeccionable en tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// Landmarks válidos encontrados, por debajo del mínimo
    TooFewLandmarks(usize),
    /// Confianza media sobre los retenidos
    LowMeanConfidence(f32),
}

/// Compuerta pasa/no-pasa sobre un frame individual.
/// Se aplica en streaming por cada captura y retroactivamente sobre
/// un buffer terminado antes de promoverlo o compararlo.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameQualityFilter {
    params: QualityParams,
}

impl FrameQualityFilter {
    pub fn new(params: QualityParams) -> Self {
        Self { params }
    }

    /// Evalúa un mapa de landmarks sin mutarlo
    pub fn evaluate(&self, landmarks: &LandmarkMap) -> Result<(), RejectReason> {
        let mut count = 0usize;
        let mut conf_sum = 0.0f32;

        for landmark in landmarks.values() {
            if landmark.confidence > self.params.screen_conf {
                count += 1;
                conf_sum += landmark.confidence;
            }
        }

        if count < self.params.min_landmarks {
            return Err(RejectReason::TooFewLandmarks(count));
        }

        let mean = conf_sum / count as f32;
        if mean < self.params.min_mean_conf {
            return Err(RejectReason::LowMeanConfidence(mean));
        }

        Ok(())
    }

    pub fn accept(&self, frame: &Frame) -> bool {
        self.evaluate(&frame.landmarks).is_ok()
    }

    /// Pasada retroactiva sobre una secuencia terminada: descarta los
    /// frames cuyas estadísticas agregadas no alcanzan el umbral
    pub fn retain_pass(&self, frames: Vec<NormalizedFrame>) -> Vec<NormalizedFrame> {
        frames
            .into_iter()
            .filter(|frame| self.evaluate(&frame.landmarks).is_ok())
            .collect()
    }
}
