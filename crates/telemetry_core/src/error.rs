//! Erros do gateway.

use crate::validation::Rejection;

/// Erros do pipeline do gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Pacote reprovado pelo validador; descartado sem retry.
    #[error("Pacote inválido (seq {sequence_no}): {reason}")]
    InvalidPacket { sequence_no: i64, reason: Rejection },

    /// Falha do sink ao entregar o lote; o mesmo lote pode ser reenviado.
    #[error("Falha na entrega do lote de {batch_len} pacotes: {message}")]
    DeliveryFailure { batch_len: usize, message: String },

    /// O lote nunca poderá ser entregue (ex.: frame grande demais); é descartado.
    #[error("Lote de {batch_len} pacotes não entregável: {message}")]
    UndeliverableBatch { batch_len: usize, message: String },
}

impl GatewayError {
    pub fn delivery(batch_len: usize, message: impl Into<String>) -> Self {
        Self::DeliveryFailure {
            batch_len,
            message: message.into(),
        }
    }

    pub fn undeliverable(batch_len: usize, message: impl Into<String>) -> Self {
        Self::UndeliverableBatch {
            batch_len,
            message: message.into(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DeliveryFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
