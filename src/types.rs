use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Umbral de confianza para contar un landmark individual como válido
pub const SCREEN_CONF: f32 = 0.3;
/// Mínimo de landmarks válidos para aceptar un frame
pub const MIN_LANDMARKS: usize = 12;
/// Confianza media mínima sobre los landmarks válidos
pub const MIN_MEAN_CONF: f32 = 0.7;
/// Umbral de confianza para incluir un landmark en la caja de normalización
pub const BOX_CONF: f32 = 0.5;
/// Mínimo de landmarks confiables para definir una caja con sentido
pub const MIN_BOX_LANDMARKS: usize = 3;
/// Frecuencia de captura de la fuente de landmarks (Hz)
pub const CAPTURE_RATE: f32 = 24.0;

/// Un punto anatómico con posición 2D y confianza del detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Confianza igual o superior al umbral
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

/// Mapa ordenado nombre → landmark; el orden determinista importa para el matcher
pub type LandmarkMap = BTreeMap<String, Landmark>;

/// Lateralidad del apéndice detectado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Unknown,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "left" => Side::Left,
            "right" => Side::Right,
            _ => Side::Unknown,
        }
    }
}

/// Pose de un apéndice en un instante de captura
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: u64,
    /// Segundos desde el inicio de la captura, monótono
    pub timestamp: f64,
    pub side: Side,
    pub landmarks: LandmarkMap,
}

impl Frame {
    pub fn new(id: u64, timestamp: f64, side: Side, landmarks: LandmarkMap) -> Self {
        Self {
            id,
            timestamp,
            side,
            landmarks,
        }
    }

    pub fn landmark(&self, name: &str) -> Option<&Landmark> {
        self.landmarks.get(name)
    }
}

/// Parámetros de la transformación aplicada por el normalizador.
/// Se conservan en el frame normalizado para diagnóstico y tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub tilt_deg: Option<f32>,
    pub bbox: Option<BoundBox>,
    /// Escala uniforme aplicada tras la traslación
    pub scale: f32,
    pub tx: f32,
    pub ty: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            tilt_deg: None,
            bbox: None,
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
            pad_x: 0.0,
            pad_y: 0.0,
        }
    }
}

/// Caja alineada a los ejes sobre los landmarks confiables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundBox {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Frame cuyas coordenadas pasaron por el normalizador
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFrame {
    pub id: u64,
    pub timestamp: f64,
    pub side: Side,
    pub landmarks: LandmarkMap,
    pub transform: Transform,
}

impl NormalizedFrame {
    pub fn landmark(&self, name: &str) -> Option<&Landmark> {
        self.landmarks.get(name)
    }
}

/// Mensaje por tick de la fuente de landmarks: cero o más apéndices detectados
#[derive(Debug, Clone, Default)]
pub struct CaptureTick {
    pub timestamp: f64,
    /// Inclinación del dispositivo (pitch) en grados, si el sensor la reporta
    pub tilt_deg: Option<f32>,
    pub detections: Vec<Frame>,
}

/// Puntaje de una plantilla contra el buffer; menor es mejor
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub template_id: u64,
    pub name: Option<String>,
    pub score: f64,
}
