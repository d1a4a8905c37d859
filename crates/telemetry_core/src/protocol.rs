//! Protocolo binário dos lotes enviados ao servidor.
//!
//! Formato do frame:
//!
//! ```text
//! ┌──────────┬─────────┬──────────────────────────┐
//! │ Magic(1) │ Ver.(1) │ BatchEnvelope bincode(N) │
//! └──────────┴─────────┴──────────────────────────┘
//! ```
//!
//! - Magic byte `0x49` ('I') identifica um lote do gateway IoT
//! - Versão do protocolo (1 byte)
//! - Envelope serializado com bincode
//!
//! O envelope carrega o tamanho do lote e o SHA-256 dos pacotes serializados;
//! [`decode_batch`] confere os dois.

use crate::types::Packet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Magic byte que identifica frames de lote.
pub const MAGIC_BYTE: u8 = 0x49; // 'I'

/// Versão atual do protocolo.
pub const PROTOCOL_VERSION: u8 = 1;

/// Tamanho do header (magic + version).
const HEADER_SIZE: usize = 2;

/// Tamanho máximo de frame (payload UDP seguro).
pub const MAX_FRAME_SIZE: usize = 65507;

/// Envelope de um lote: identifica o gateway e numera os lotes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchEnvelope {
    pub gateway_id: String,
    /// Contador de lotes do gateway, começa em 1
    pub batch_no: u64,
    /// Timestamp do último pacote do lote
    pub created_at: i64,
    pub batch_size: u32,
    /// SHA-256 de `packets` serializado com bincode
    pub batch_hash: [u8; 32],
    pub packets: Vec<Packet>,
}

impl BatchEnvelope {
    pub fn new(
        gateway_id: impl Into<String>,
        batch_no: u64,
        packets: &[Packet],
    ) -> Result<Self, ProtocolError> {
        let batch_size =
            u32::try_from(packets.len()).map_err(|_| ProtocolError::BatchTooLarge(packets.len()))?;
        Ok(Self {
            gateway_id: gateway_id.into(),
            batch_no,
            created_at: packets.last().map(|p| p.timestamp).unwrap_or_default(),
            batch_size,
            batch_hash: batch_hash(packets)?,
            packets: packets.to_vec(),
        })
    }

    /// Hex do hash, usado nos logs.
    pub fn hash_hex(&self) -> String {
        self.batch_hash.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// SHA-256 dos pacotes serializados com bincode.
pub fn batch_hash(packets: &[Packet]) -> Result<[u8; 32], ProtocolError> {
    let bytes = bincode::serialize(packets).map_err(|e| ProtocolError::Serialize(e.to_string()))?;
    Ok(Sha256::digest(&bytes).into())
}

/// Erros do protocolo.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Frame muito curto ({0} bytes, mínimo {HEADER_SIZE})")]
    TooShort(usize),

    #[error("Magic byte inválido: 0x{0:02X} (esperado 0x{MAGIC_BYTE:02X})")]
    InvalidMagic(u8),

    #[error("Versão incompatível: {0} (suportada: {PROTOCOL_VERSION})")]
    VersionMismatch(u8),

    #[error("Frame muito grande: {0} bytes (máximo {MAX_FRAME_SIZE})")]
    FrameTooLarge(usize),

    #[error("Lote com pacotes demais: {0}")]
    BatchTooLarge(usize),

    #[error("Tamanho do lote divergente: declarado {declared}, recebido {actual}")]
    SizeMismatch { declared: u32, actual: usize },

    #[error("Hash do lote não confere")]
    HashMismatch,

    #[error("Erro de serialização: {0}")]
    Serialize(String),

    #[error("Erro de deserialização: {0}")]
    Deserialize(String),
}

/// Codifica um [`BatchEnvelope`] no formato `[MAGIC][VERSION][bincode...]`.
pub fn encode_batch(envelope: &BatchEnvelope) -> Result<Vec<u8>, ProtocolError> {
    let body = bincode::serialize(envelope).map_err(|e| ProtocolError::Serialize(e.to_string()))?;

    let size = HEADER_SIZE + body.len();
    if size > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(size));
    }

    let mut frame = Vec::with_capacity(size);
    frame.push(MAGIC_BYTE);
    frame.push(PROTOCOL_VERSION);
    frame.extend_from_slice(&body);

    Ok(frame)
}

/// Decodifica um frame de lote, validando magic byte, versão, tamanho e hash.
pub fn decode_batch(data: &[u8]) -> Result<BatchEnvelope, ProtocolError> {
    if data.len() < HEADER_SIZE {
        return Err(ProtocolError::TooShort(data.len()));
    }

    let magic = data[0];
    if magic != MAGIC_BYTE {
        return Err(ProtocolError::InvalidMagic(magic));
    }

    let version = data[1];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::VersionMismatch(version));
    }

    let payload_bytes = &data[HEADER_SIZE..];
    let envelope: BatchEnvelope = bincode::deserialize(payload_bytes)
        .map_err(|e| ProtocolError::Deserialize(e.to_string()))?;

    if envelope.batch_size as usize != envelope.packets.len() {
        return Err(ProtocolError::SizeMismatch {
            declared: envelope.batch_size,
            actual: envelope.packets.len(),
        });
    }
    if batch_hash(&envelope.packets)? != envelope.batch_hash {
        return Err(ProtocolError::HashMismatch);
    }

    Ok(envelope)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
