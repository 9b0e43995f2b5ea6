use std::time::Duration;

use crossbeam_channel::Sender;

use crate::types::CaptureTick;

/// Reproduce una sesión grabada por el canal, al ritmo de captura dado.
/// Hace las veces de la fuente de landmarks en vivo: un productor que
/// empuja un tick por intervalo y nunca espera al consumidor más allá
/// de la capacidad del canal.
pub fn start_replay_source(ticks: Vec<CaptureTick>, rate_hz: f32, tx: Sender<CaptureTick>) {
    let interval = Duration::from_secs_f32(1.0 / rate_hz.max(1.0));

    for tick in ticks {
        if tx.send(tick).is_err() {
            // receptor cerrado: terminar el hilo productor
            return;
        }
        std::thread::sleep(interval);
    }
}
