use thiserror::Error;

use crate::types::{
    BoundBox, Frame, LandmarkMap, NormalizedFrame, Transform, BOX_CONF, MIN_BOX_LANDMARKS,
};

/// Lado mínimo de la caja para considerarla no degenerada
const MIN_EXTENT: f32 = 1e-6;

/// Motivo por el que una etapa se negó a normalizar el frame.
/// El frame se descarta y el pipeline continúa con la siguiente captura.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum NormalizeReject {
    #[error("tilt too close to the singularity (cos = {0})")]
    TiltSingularity(f32),

    #[error("only {0} landmarks above the box threshold")]
    TooFewForBox(usize),

    #[error("degenerate bounding box (longest side = {0})")]
    DegenerateBox(f32),

    #[error("missing anchor landmark `{0}`")]
    MissingAnchor(&'static str),

    #[error("anchor landmarks are coincident")]
    DegenerateAnchor,
}

/// Corrección de inclinación del dispositivo.
///
/// Cada coordenada vertical se recentra sobre la línea media de la imagen,
/// se divide por cos(θ) y se vuelve a centrar: compensa la compresión
/// aparente cuando la cámara no está perpendicular al firmante.
#[derive(Debug, Clone, Copy)]
pub struct TiltCorrection {
    /// Altura de referencia de la imagen; 1.0 para coordenadas normalizadas
    pub ref_height: f32,
}

impl TiltCorrection {
    /// Por debajo de este |cos θ| la corrección explota numéricamente
    pub const MIN_COS: f32 = 0.1;

    pub fn apply(&self, landmarks: &LandmarkMap, tilt_deg: f32) -> Result<LandmarkMap, NormalizeReject> {
        let cos_t = tilt_deg.to_radians().cos();
        if cos_t.abs() <= Self::MIN_COS {
            return Err(NormalizeReject::TiltSingularity(cos_t));
        }

        let mid = self.ref_height / 2.0;
        let corrected = landmarks
            .iter()
            .map(|(name, p)| {
                let mut p = *p;
                p.y = (p.y - mid) / cos_t + mid;
                (name.clone(), p)
            })
            .collect();

        Ok(corrected)
    }
}

impl Default for TiltCorrection {
    fn default() -> Self {
        Self { ref_height: 1.0 }
    }
}

/// Parámetros de la normalización a caja unitaria
#[derive(Debug, Clone, Copy)]
pub struct UnitBox {
    /// Confianza mínima para que un landmark participe de la caja
    pub box_conf: f32,
    /// Mínimo de landmarks confiables para definir la caja
    pub min_landmarks: usize,
    /// Centrar la caja escalada dentro del cuadrado unitario
    pub center: bool,
}

impl Default for UnitBox {
    fn default() -> Self {
        Self {
            box_conf: BOX_CONF,
            min_landmarks: MIN_BOX_LANDMARKS,
            center: true,
        }
    }
}

/// Resultado del ajuste de caja, expuesto para diagnóstico
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxFit {
    pub bbox: BoundBox,
    pub scale: f32,
    pub tx: f32,
    pub ty: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl UnitBox {
    /// Calcula la caja sobre los landmarks confiables y el ajuste
    /// `x' = (x + tx) * scale + pad_x` que la lleva al cuadrado unitario.
    /// El escalado es uniforme: preserva la forma de la mano, que es lo
    /// que comparan las distancias del matcher.
    pub fn fit(&self, landmarks: &LandmarkMap) -> Result<BoxFit, NormalizeReject> {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        let mut count = 0usize;

        for p in landmarks.values() {
            if !p.is_valid(self.box_conf) {
                continue;
            }
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
            count += 1;
        }

        if count < self.min_landmarks {
            return Err(NormalizeReject::TooFewForBox(count));
        }

        let bbox = BoundBox {
            min_x,
            min_y,
            max_x,
            max_y,
        };
        let longest = bbox.width().max(bbox.height());
        if longest <= MIN_EXTENT {
            return Err(NormalizeReject::DegenerateBox(longest));
        }

        let scale = 1.0 / longest;
        let (pad_x, pad_y) = if self.center {
            (
                (1.0 - bbox.width() * scale) / 2.0,
                (1.0 - bbox.height() * scale) / 2.0,
            )
        } else {
            (0.0, 0.0)
        };

        Ok(BoxFit {
            bbox,
            scale,
            tx: -min_x,
            ty: -min_y,
            pad_x,
            pad_y,
        })
    }

    pub fn apply(&self, landmarks: &LandmarkMap) -> Result<(LandmarkMap, BoxFit), NormalizeReject> {
        let fit = self.fit(landmarks)?;

        let mapped = landmarks
            .iter()
            .map(|(name, p)| {
                let mut p = *p;
                p.x = (p.x + fit.tx) * fit.scale + fit.pad_x;
                p.y = (p.y + fit.ty) * fit.scale + fit.pad_y;
                (name.clone(), p)
            })
            .collect();

        Ok((mapped, fit))
    }
}

/// Normalización anclada a la muñeca: traslada al origen de la muñeca,
/// rota para que muñeca→MCP medio apunte hacia arriba y escala por esa
/// distancia. Deja la pose invariante a posición, rotación y tamaño.
#[derive(Debug, Clone, Copy)]
pub struct WristAnchor {
    /// Corrección de aspecto para el eje x (ancho/alto del sensor)
    pub aspect: f32,
}

impl WristAnchor {
    pub const WRIST: &'static str = "wrist";
    pub const MIDDLE_MCP: &'static str = "middleMCP";

    pub fn apply(&self, landmarks: &LandmarkMap) -> Result<(LandmarkMap, f32), NormalizeReject> {
        let wrist = landmarks
            .get(Self::WRIST)
            .ok_or(NormalizeReject::MissingAnchor(Self::WRIST))?;
        let mcp = landmarks
            .get(Self::MIDDLE_MCP)
            .ok_or(NormalizeReject::MissingAnchor(Self::MIDDLE_MCP))?;

        let wx = wrist.x * self.aspect;
        let wy = wrist.y;
        let dx = mcp.x * self.aspect - wx;
        let dy = mcp.y - wy;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance <= MIN_EXTENT {
            return Err(NormalizeReject::DegenerateAnchor);
        }

        let angle = dy.atan2(dx) - std::f32::consts::FRAC_PI_2;
        let cos_t = (-angle).cos();
        let sin_t = (-angle).sin();

        let mapped = landmarks
            .iter()
            .map(|(name, p)| {
                let mut p = *p;
                let tx = p.x * self.aspect - wx;
                let ty = p.y - wy;
                p.x = (tx * cos_t - ty * sin_t) / distance;
                p.y = (tx * sin_t + ty * cos_t) / distance;
                (name.clone(), p)
            })
            .collect();

        Ok((mapped, distance))
    }
}

impl Default for WristAnchor {
    fn default() -> Self {
        Self {
            aspect: 720.0 / 1280.0,
        }
    }
}

/// Normalizador de frames: etapas puras y componibles.
///
/// Cualquier subconjunto puede estar activo; la corrección de inclinación,
/// si está activa, siempre corre primero. El fallo de una etapa descarta
/// el frame en lugar de producir salida degenerada.
#[derive(Debug, Clone, Copy)]
pub struct FrameNormalizer {
    pub tilt: Option<TiltCorrection>,
    pub wrist_anchor: Option<WristAnchor>,
    pub unit_box: Option<UnitBox>,
}

impl Default for FrameNormalizer {
    fn default() -> Self {
        Self {
            tilt: None,
            wrist_anchor: None,
            unit_box: Some(UnitBox::default()),
        }
    }
}

impl FrameNormalizer {
    pub fn normalize(
        &self,
        frame: &Frame,
        tilt_deg: Option<f32>,
    ) -> Result<NormalizedFrame, NormalizeReject> {
        let mut landmarks = frame.landmarks.clone();
        let mut transform = Transform::default();

        if let (Some(tilt), Some(deg)) = (self.tilt, tilt_deg) {
            landmarks = tilt.apply(&landmarks, deg)?;
            transform.tilt_deg = Some(deg);
        }

        if let Some(anchor) = self.wrist_anchor {
            let (mapped, distance) = anchor.apply(&landmarks)?;
            if let Some(wrist) = landmarks.get(WristAnchor::WRIST) {
                transform.tx = -(wrist.x * anchor.aspect);
                transform.ty = -wrist.y;
            }
            transform.scale = 1.0 / distance;
            landmarks = mapped;
        }

        if let Some(unit_box) = self.unit_box {
            let (mapped, fit) = unit_box.apply(&landmarks)?;
            landmarks = mapped;
            transform.bbox = Some(fit.bbox);
            transform.scale = fit.scale;
            transform.tx = fit.tx;
            transform.ty = fit.ty;
            transform.pad_x = fit.pad_x;
            transform.pad_y = fit.pad_y;
        }

        Ok(NormalizedFrame {
            id: frame.id,
            timestamp: frame.timestamp,
            side: frame.side,
            landmarks,
            transform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Landmark, LandmarkMap, Side};

    fn frame_from(points: &[(&str, f32, f32, f32)]) -> Frame {
        let mut map = LandmarkMap::new();
        for (name, x, y, conf) in points {
            map.insert(name.to_string(), Landmark::new(*x, *y, *conf));
        }
        Frame::new(0, 0.0, Side::Right, map)
    }

    #[test]
    fn tilt_refuses_near_horizontal_device() {
        let tilt = TiltCorrection::default();
        let frame = frame_from(&[("wrist", 0.5, 0.2, 1.0)]);

        // 90 grados: cos θ = 0, dentro de la banda prohibida
        let result = tilt.apply(&frame.landmarks, 90.0);
        assert!(matches!(result, Err(NormalizeReject::TiltSingularity(_))));

        // 85 grados: |cos| ≈ 0.087 ≤ 0.1, también rechazado
        let result = tilt.apply(&frame.landmarks, 85.0);
        assert!(matches!(result, Err(NormalizeReject::TiltSingularity(_))));
    }

    #[test]
    fn tilt_stretches_about_the_midline() {
        let tilt = TiltCorrection::default();
        let frame = frame_from(&[("wrist", 0.5, 0.25, 1.0), ("nose", 0.5, 0.5, 1.0)]);

        let corrected = tilt.apply(&frame.landmarks, 60.0).unwrap();

        // cos 60° = 0.5: la distancia a la línea media se duplica
        let wrist = corrected["wrist"];
        assert!((wrist.y - 0.0).abs() < 1e-5);
        // un punto sobre la línea media no se mueve
        let nose = corrected["nose"];
        assert!((nose.y - 0.5).abs() < 1e-6);
        // x queda intacta
        assert!((wrist.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn unit_box_requires_three_confident_landmarks() {
        let unit_box = UnitBox::default();
        let frame = frame_from(&[
            ("wrist", 0.1, 0.1, 0.9),
            ("thumbTip", 0.4, 0.3, 0.9),
            // por debajo del umbral 0.5, no cuenta
            ("indexTip", 0.8, 0.8, 0.2),
        ]);

        assert_eq!(
            unit_box.fit(&frame.landmarks),
            Err(NormalizeReject::TooFewForBox(2))
        );
    }

    #[test]
    fn unit_box_rejects_coincident_points() {
        let unit_box = UnitBox::default();
        let frame = frame_from(&[
            ("a", 0.5, 0.5, 1.0),
            ("b", 0.5, 0.5, 1.0),
            ("c", 0.5, 0.5, 1.0),
        ]);

        assert!(matches!(
            unit_box.fit(&frame.landmarks),
            Err(NormalizeReject::DegenerateBox(_))
        ));
    }

    #[test]
    fn unit_box_output_fits_the_unit_square() {
        let unit_box = UnitBox::default();
        let frame = frame_from(&[
            ("wrist", 100.0, 200.0, 1.0),
            ("thumbTip", 140.0, 220.0, 1.0),
            ("indexTip", 120.0, 260.0, 1.0),
        ]);

        let (mapped, fit) = unit_box.apply(&frame.landmarks).unwrap();
        for p in mapped.values() {
            assert!(p.x >= -1e-5 && p.x <= 1.0 + 1e-5);
            assert!(p.y >= -1e-5 && p.y <= 1.0 + 1e-5);
        }
        // escala uniforme por el lado largo (60 px de alto)
        assert!((fit.scale - 1.0 / 60.0).abs() < 1e-7);
        // el lado corto queda centrado con padding simétrico
        assert!(fit.pad_x > 0.0);
        assert!((fit.pad_y - 0.0).abs() < 1e-6);
    }

    #[test]
    fn unit_box_is_scale_invariant() {
        let unit_box = UnitBox::default();
        let base = frame_from(&[
            ("wrist", 0.2, 0.3, 1.0),
            ("thumbTip", 0.5, 0.4, 1.0),
            ("indexTip", 0.35, 0.7, 1.0),
            ("middleTip", 0.4, 0.25, 1.0),
        ]);

        let k = 3.7f32;
        let scaled_map: LandmarkMap = base
            .landmarks
            .iter()
            .map(|(name, p)| {
                (
                    name.clone(),
                    Landmark::new(p.x * k, p.y * k, p.confidence),
                )
            })
            .collect();

        let (a, _) = unit_box.apply(&base.landmarks).unwrap();
        let (b, _) = unit_box.apply(&scaled_map).unwrap();

        for (name, p) in &a {
            let q = b[name];
            assert!((p.x - q.x).abs() < 1e-4, "x difiere para {}", name);
            assert!((p.y - q.y).abs() < 1e-4, "y difiere para {}", name);
        }
    }

    #[test]
    fn wrist_anchor_places_mcp_above_wrist() {
        let anchor = WristAnchor { aspect: 1.0 };
        let frame = frame_from(&[
            ("wrist", 0.5, 0.5, 1.0),
            ("middleMCP", 0.7, 0.5, 1.0),
            ("thumbTip", 0.6, 0.6, 1.0),
        ]);

        let (mapped, distance) = anchor.apply(&frame.landmarks).unwrap();
        assert!((distance - 0.2).abs() < 1e-6);

        // la muñeca queda en el origen
        let wrist = mapped["wrist"];
        assert!(wrist.x.abs() < 1e-5 && wrist.y.abs() < 1e-5);

        // el MCP medio queda a distancia unitaria sobre el eje vertical
        let mcp = mapped["middleMCP"];
        assert!(mcp.x.abs() < 1e-4);
        assert!((mcp.y.abs() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn wrist_anchor_fails_without_anchors() {
        let anchor = WristAnchor::default();
        let frame = frame_from(&[("thumbTip", 0.6, 0.6, 1.0)]);

        assert_eq!(
            anchor.apply(&frame.landmarks),
            Err(NormalizeReject::MissingAnchor("wrist"))
        );
    }

    #[test]
    fn normalizer_composes_tilt_before_unit_box() {
        let normalizer = FrameNormalizer {
            tilt: Some(TiltCorrection::default()),
            wrist_anchor: None,
            unit_box: Some(UnitBox::default()),
        };
        let frame = frame_from(&[
            ("wrist", 0.3, 0.3, 1.0),
            ("thumbTip", 0.5, 0.45, 1.0),
            ("indexTip", 0.4, 0.6, 1.0),
        ]);

        let normalized = normalizer.normalize(&frame, Some(30.0)).unwrap();
        assert_eq!(normalized.transform.tilt_deg, Some(30.0));
        assert!(normalized.transform.bbox.is_some());

        // sin ángulo reportado la etapa de tilt se omite sin fallar
        let no_tilt = normalizer.normalize(&frame, None).unwrap();
        assert_eq!(no_tilt.transform.tilt_deg, None);
    }
}
