use crate::quality_filter::FrameQualityFilter;
use crate::types::NormalizedFrame;

/// Estados de la máquina de grabación
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Sin sesión activa; el buffer no admite escrituras
    Idle,
    /// Sesión en curso; solo el productor puede anexar
    Recording,
}

/// Secuencia ordenada de frames normalizados para una sesión de grabación.
///
/// Un solo escritor (el callback por captura) anexa mientras el estado es
/// Recording; `stop()` transfiere la secuencia filtrada por valor, de modo
/// que el matcher trabaja sobre una copia inmutable y nunca comparte el
/// buffer vivo con el productor.
pub struct LiveBuffer {
    frames: Vec<NormalizedFrame>,
    state: State,
    start_time: Option<f64>,
}

impl LiveBuffer {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            state: State::Idle,
            start_time: None,
        }
    }

    /// Inicia una sesión. Solo válido desde Idle; en Recording no hace nada.
    pub fn start(&mut self) {
        if self.state != State::Idle {
            return;
        }
        self.frames.clear();
        self.start_time = None;
        self.state = State::Recording;
    }

    /// Anexa un frame si hay sesión activa y el timestamp no retrocede.
    /// Devuelve si el frame quedó en el buffer.
    pub fn push(&mut self, frame: NormalizedFrame) -> bool {
        if self.state != State::Recording {
            return false;
        }

        if let Some(last) = self.frames.last() {
            if frame.timestamp < last.timestamp {
                return false;
            }
        }

        if self.start_time.is_none() {
            self.start_time = Some(frame.timestamp);
        }
        self.frames.push(frame);
        true
    }

    /// Termina la sesión: vuelve a Idle, aplica la pasada retroactiva del
    /// filtro de calidad y entrega la secuencia resultante por valor.
    /// Desde Idle devuelve una secuencia vacía.
    pub fn stop(&mut self, filter: &FrameQualityFilter) -> Vec<NormalizedFrame> {
        if self.state != State::Recording {
            return Vec::new();
        }
        self.state = State::Idle;
        self.start_time = None;

        let frames = std::mem::take(&mut self.frames);
        filter.retain_pass(frames)
    }

    /// Descarta los frames acumulados sin tocar el estado
    pub fn clear(&mut self) {
        self.frames.clear();
        self.start_time = None;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_recording(&self) -> bool {
        self.state == State::Recording
    }

    /// Timestamp del primer frame aceptado de la sesión actual
    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    /// Estado actual como texto (para debugging)
    pub fn state(&self) -> &'static str {
        match self.state {
            State::Idle => "IDLE",
            State::Recording => "RECORDING",
        }
    }
}

impl Default for LiveBuffer {
    fn default() -> Self {
        Self::new()
    }
}
