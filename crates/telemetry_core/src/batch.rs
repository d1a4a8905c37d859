//! Buffer de lote – acumula pacotes aceitos até o limite e descarrega no sink.
//!
//! Lotes cuja entrega falhou vão para uma fila de retentativa limitada e são
//! reenviados intactos, na ordem, antes do próximo lote.

use crate::error::GatewayError;
use crate::sink::Sink;
use crate::types::Packet;
use std::collections::VecDeque;
use tracing::{error, warn};

/// Tamanho padrão do lote.
pub const BATCH_THRESHOLD: usize = 5;

/// Lotes aguardando retentativa antes de descartar o mais antigo.
pub const MAX_PENDING_BATCHES: usize = 8;

/// Resultado de um [`BatchBuffer::flush`].
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Lotes entregues
    pub batches: usize,
    /// Pacotes entregues
    pub packets: usize,
    /// Pacotes descartados (fila cheia ou lote não entregável)
    pub dropped_packets: usize,
    /// Falha recuperável que interrompeu a entrega
    pub failure: Option<GatewayError>,
}

/// Sequência ordenada de pacotes aceitos.
///
/// O buffer não limita o próprio tamanho; quem chama [`flush`](Self::flush)
/// ao atingir o limite é o pipeline.
#[derive(Debug, Clone)]
pub struct BatchBuffer {
    packets: Vec<Packet>,
    threshold: usize,
    retry: VecDeque<Vec<Packet>>,
    retry_capacity: usize,
}

impl Default for BatchBuffer {
    fn default() -> Self {
        Self::new(BATCH_THRESHOLD)
    }
}

impl BatchBuffer {
    pub fn new(threshold: usize) -> Self {
        Self {
            packets: Vec::with_capacity(threshold),
            threshold,
            retry: VecDeque::new(),
            retry_capacity: MAX_PENDING_BATCHES,
        }
    }

    /// Limite da fila de retentativa (0 = lote que falhou é descartado).
    pub fn with_retry_capacity(mut self, capacity: usize) -> Self {
        self.retry_capacity = capacity;
        self
    }

    pub fn append(&mut self, packet: Packet) {
        self.packets.push(packet);
    }

    /// Pacotes no lote corrente (sem contar a fila de retentativa).
    pub fn size(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.packets.len() >= self.threshold
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn retry_capacity(&self) -> usize {
        self.retry_capacity
    }

    /// Lotes que falharam e aguardam nova tentativa, do mais antigo ao mais novo.
    pub fn pending_batches(&self) -> impl Iterator<Item = &[Packet]> {
        self.retry.iter().map(Vec::as_slice)
    }

    pub fn pending_batch_count(&self) -> usize {
        self.retry.len()
    }

    pub fn pending_packets(&self) -> usize {
        self.retry.iter().map(Vec::len).sum()
    }

    /// Nada no lote corrente nem na fila de retentativa.
    pub fn is_drained(&self) -> bool {
        self.packets.is_empty() && self.retry.is_empty()
    }

    /// Fecha o lote corrente e entrega a fila ao sink, um lote por chamada
    /// de [`Sink::send`], do mais antigo ao mais novo.
    ///
    /// O lote corrente sempre sai do buffer. Uma falha recuperável interrompe
    /// a entrega e mantém os lotes restantes na fila; um lote não entregável
    /// é descartado. Se a fila passar do limite, os lotes mais antigos são
    /// descartados.
    pub fn flush<S: Sink + ?Sized>(&mut self, sink: &mut S) -> FlushReport {
        let mut report = FlushReport::default();

        if !self.packets.is_empty() {
            let batch = std::mem::replace(&mut self.packets, Vec::with_capacity(self.threshold));
            self.retry.push_back(batch);
        }

        while let Some(batch) = self.retry.front() {
            match sink.send(batch) {
                Ok(()) => {
                    report.batches += 1;
                    report.packets += batch.len();
                    self.retry.pop_front();
                }
                Err(e) if e.is_recoverable() => {
                    report.failure = Some(e);
                    break;
                }
                Err(e) => {
                    error!("{e}; lote descartado");
                    report.dropped_packets += batch.len();
                    self.retry.pop_front();
                }
            }
        }

        while self.retry.len() > self.retry_capacity {
            if let Some(oldest) = self.retry.pop_front() {
                warn!(
                    "Fila de retentativa cheia ({}); lote de {} pacotes descartado (Seq: {}..)",
                    self.retry_capacity,
                    oldest.len(),
                    oldest.first().map(|p| p.sequence_no).unwrap_or_default()
                );
                report.dropped_packets += oldest.len();
            }
        }

        report
    }
}
