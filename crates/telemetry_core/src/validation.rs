//! Validação de pacotes – faixas dos campos e frescor do timestamp.
//!
//! Predicado puro: o tempo atual é sempre passado pelo chamador.

use crate::types::Packet;
use std::ops::RangeInclusive;

/// Tolerância de relógio para timestamps no futuro (segundos).
pub const MAX_FUTURE_SKEW_SECS: i64 = 5;

/// Faixa aceita de temperatura (°C).
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = -20.0..=100.0;

/// Faixa aceita para percentuais (CPU, bateria).
pub const PERCENT_RANGE: RangeInclusive<f32> = 0.0..=100.0;

/// Motivo de rejeição de um pacote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("sequência não positiva")]
    NonPositiveSequence,

    #[error("temperatura fora da faixa [-20, 100]")]
    TemperatureOutOfRange,

    #[error("uso de CPU fora da faixa [0, 100]")]
    CpuUsageOutOfRange,

    #[error("bateria fora da faixa [0, 100]")]
    BatteryOutOfRange,

    #[error("timestamp no futuro além da tolerância")]
    TimestampInFuture,
}

/// Validador de pacotes com tolerância de relógio configurável.
#[derive(Debug, Clone, Copy)]
pub struct PacketValidator {
    pub max_future_skew_secs: i64,
}

impl Default for PacketValidator {
    fn default() -> Self {
        Self {
            max_future_skew_secs: MAX_FUTURE_SKEW_SECS,
        }
    }
}

impl PacketValidator {
    pub fn new(max_future_skew_secs: i64) -> Self {
        Self {
            max_future_skew_secs,
        }
    }

    /// Verifica o pacote e retorna o primeiro motivo de rejeição.
    ///
    /// NaN falha nas checagens de faixa.
    pub fn check(&self, packet: &Packet, now: i64) -> Result<(), Rejection> {
        if packet.sequence_no <= 0 {
            return Err(Rejection::NonPositiveSequence);
        }
        if !TEMPERATURE_RANGE.contains(&packet.temperature) {
            return Err(Rejection::TemperatureOutOfRange);
        }
        if !PERCENT_RANGE.contains(&packet.cpu_usage) {
            return Err(Rejection::CpuUsageOutOfRange);
        }
        if !PERCENT_RANGE.contains(&packet.battery_level) {
            return Err(Rejection::BatteryOutOfRange);
        }
        if packet.timestamp > now.saturating_add(self.max_future_skew_secs) {
            return Err(Rejection::TimestampInFuture);
        }
        Ok(())
    }

    pub fn validate(&self, packet: &Packet, now: i64) -> bool {
        self.check(packet, now).is_ok()
    }
}

/// Valida com a tolerância padrão de [`MAX_FUTURE_SKEW_SECS`].
pub fn validate(packet: &Packet, now: i64) -> bool {
    PacketValidator::default().validate(packet, now)
}
