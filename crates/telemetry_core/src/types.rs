//! Definição do pacote de telemetria emitido pelo dispositivo.
//!
//! O tipo em si não impõe invariantes: faixas e frescor do timestamp são
//! verificados pelo [`crate::validation`] antes do pacote entrar no lote.

use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// Pacote
// ──────────────────────────────────────────────

/// Uma leitura de telemetria de um dispositivo simulado.
///
/// Inteiros com sinal permitem representar entradas inválidas
/// (`sequence_no <= 0`) para que o validador as rejeite.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Packet {
    /// Identificador do dispositivo de origem
    pub device_id: String,
    /// Número de sequência (> 0, crescente por dispositivo)
    pub sequence_no: i64,
    /// Temperatura (°C)
    pub temperature: f32,
    /// Umidade relativa (%)
    pub humidity: f32,
    /// Taxa de pacotes reportada pelo dispositivo
    pub packet_rate: i32,
    /// Uso de CPU (0–100%)
    pub cpu_usage: f32,
    /// Nível de bateria (0–100%)
    pub battery_level: f32,
    /// Segundos desde a epoch Unix, definido na criação
    pub timestamp: i64,
}

/// Formato CSV usado pelo sink de console.
impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}, {}, {}",
            self.device_id,
            self.sequence_no,
            self.temperature,
            self.humidity,
            self.packet_rate,
            self.cpu_usage,
            self.battery_level,
            self.timestamp
        )
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
