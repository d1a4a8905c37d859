//! Destinos dos lotes descarregados pelo gateway.
//!
//! - [`ConsoleSink`] – imprime o lote (stub do servidor)
//! - [`FrameSink`] – codifica cada lote em frame binário e guarda em memória
//! - [`MemorySink`] – registra os lotes como recebidos

use crate::error::{GatewayError, Result};
use crate::protocol::{BatchEnvelope, encode_batch};
use crate::types::Packet;
use std::io::{self, Stdout, Write};
use tracing::debug;

/// Consumidor de lotes completos.
///
/// Chamado uma vez por lote, com o lote inteiro, em ordem. Um lote que falhou
/// pode ser reenviado intacto em um flush posterior.
pub trait Sink {
    fn send(&mut self, batch: &[Packet]) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn send(&mut self, batch: &[Packet]) -> Result<()> {
        (**self).send(batch)
    }
}

// ──────────────────────────────────────────────
// Console
// ──────────────────────────────────────────────

/// Cabeçalho impresso antes de cada lote.
pub const BATCH_HEADER: &str = "[SENDING BATCH TO SERVER]";

/// Escreve o cabeçalho e uma linha por pacote.
pub struct ConsoleSink<W: Write = Stdout> {
    out: W,
}

impl ConsoleSink<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_batch(&mut self, batch: &[Packet]) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{BATCH_HEADER}")?;
        for packet in batch {
            writeln!(self.out, "{packet}")?;
        }
        self.out.flush()
    }
}

impl<W: Write> Sink for ConsoleSink<W> {
    fn send(&mut self, batch: &[Packet]) -> Result<()> {
        self.write_batch(batch)
            .map_err(|e| GatewayError::delivery(batch.len(), e.to_string()))
    }
}

// ──────────────────────────────────────────────
// Frames binários
// ──────────────────────────────────────────────

/// Codifica cada lote com [`encode_batch`] e guarda os frames.
#[derive(Debug, Default)]
pub struct FrameSink {
    gateway_id: String,
    next_batch_no: u64,
    frames: Vec<Vec<u8>>,
}

impl FrameSink {
    pub fn new(gateway_id: impl Into<String>) -> Self {
        Self {
            gateway_id: gateway_id.into(),
            next_batch_no: 1,
            frames: Vec::new(),
        }
    }

    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    pub fn bytes_sent(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }
}

impl Sink for FrameSink {
    fn send(&mut self, batch: &[Packet]) -> Result<()> {
        // Um lote que não codifica hoje não codificará na retentativa.
        let frame = BatchEnvelope::new(self.gateway_id.clone(), self.next_batch_no, batch)
            .and_then(|envelope| encode_batch(&envelope))
            .map_err(|e| GatewayError::undeliverable(batch.len(), e.to_string()))?;

        debug!(
            "Lote #{} codificado: {} pacotes, {} bytes",
            self.next_batch_no,
            batch.len(),
            frame.len()
        );
        self.frames.push(frame);
        self.next_batch_no += 1;
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Memória
// ──────────────────────────────────────────────

/// Guarda cada lote recebido. Pode ser forçado a falhar.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Vec<Vec<Packet>>,
    failing: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink que rejeita toda entrega até [`set_failing(false)`](Self::set_failing).
    pub fn failing() -> Self {
        Self {
            batches: Vec::new(),
            failing: true,
        }
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn batches(&self) -> &[Vec<Packet>] {
        &self.batches
    }

    /// Total de pacotes entregues.
    pub fn delivered(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

impl Sink for MemorySink {
    fn send(&mut self, batch: &[Packet]) -> Result<()> {
        if self.failing {
            return Err(GatewayError::delivery(batch.len(), "sink indisponível"));
        }
        self.batches.push(batch.to_vec());
        Ok(())
    }
}
