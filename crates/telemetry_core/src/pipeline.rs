//! Pipeline do gateway: validação → lote → sink.
//!
//! Cada pacote recebido termina em um de dois estados:
//! - **Rejeitado**: o validador reprovou; o pacote é descartado e logado.
//! - **Aceito**: entra no lote; ao atingir o limite o lote é descarregado.
//!
//! Nenhum erro sai de [`GatewayPipeline::process`]; falhas de entrega são
//! logadas e o lote vai para a fila de retentativa do buffer.

use crate::anomaly::AnomalyClassifier;
use crate::batch::BatchBuffer;
use crate::clock::Clock;
use crate::config::{AnomalyThresholds, GatewayConfig};
use crate::error::{GatewayError, Result};
use crate::sink::Sink;
use crate::types::Packet;
use crate::validation::{PacketValidator, Rejection};
use tracing::{debug, error, info, warn};

/// Contadores do pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub received: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub anomalies: u64,
    pub flushes: u64,
    pub packets_flushed: u64,
    pub delivery_failures: u64,
    /// Pacotes aceitos que nunca serão entregues
    pub packets_dropped: u64,
}

/// Linha de log de um pacote rejeitado.
pub fn rejection_message(sequence_no: i64, reason: Rejection) -> String {
    let err = GatewayError::InvalidPacket {
        sequence_no,
        reason,
    };
    format!("[INVALID PACKET DROPPED] Seq: {sequence_no} – {err}")
}

/// Orquestra validador, buffer e sink para cada pacote.
pub struct GatewayPipeline<S: Sink, C: Clock> {
    validator: PacketValidator,
    classifier: AnomalyClassifier,
    buffer: BatchBuffer,
    sink: S,
    clock: C,
    alert_on_anomaly: bool,
    stats: PipelineStats,
}

impl<S: Sink, C: Clock> GatewayPipeline<S, C> {
    /// Pipeline com validador, limites e alertas padrão (os mesmos de
    /// [`GatewayConfig::default`]).
    pub fn new(buffer: BatchBuffer, sink: S, clock: C) -> Self {
        Self {
            validator: PacketValidator::default(),
            classifier: AnomalyClassifier::default(),
            buffer,
            sink,
            clock,
            alert_on_anomaly: true,
            stats: PipelineStats::default(),
        }
    }

    pub fn from_config(
        gateway: &GatewayConfig,
        anomaly: &AnomalyThresholds,
        sink: S,
        clock: C,
    ) -> Self {
        Self {
            validator: gateway.validator(),
            classifier: anomaly.classifier(),
            buffer: BatchBuffer::new(gateway.batch_threshold)
                .with_retry_capacity(gateway.max_pending_batches),
            sink,
            clock,
            alert_on_anomaly: gateway.alert_on_anomaly,
            stats: PipelineStats::default(),
        }
    }

    pub fn with_validator(mut self, validator: PacketValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_classifier(mut self, classifier: AnomalyClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_alert_on_anomaly(mut self, enabled: bool) -> Self {
        self.alert_on_anomaly = enabled;
        self
    }

    /// Processa um pacote. Nunca falha: rejeições e falhas de entrega são
    /// apenas logadas.
    pub fn process(&mut self, packet: Packet) {
        self.stats.received += 1;

        if let Err(reason) = self.validator.check(&packet, self.clock.now()) {
            self.stats.rejected += 1;
            warn!("{}", rejection_message(packet.sequence_no, reason));
            return;
        }

        self.stats.accepted += 1;
        if self.alert_on_anomaly {
            self.report_anomalies(&packet);
        }

        self.buffer.append(packet);
        debug!(
            "Lote: {}/{} pacotes",
            self.buffer.size(),
            self.buffer.threshold()
        );

        if self.buffer.is_full() {
            if let Err(e) = self.flush_buffer() {
                error!(
                    "{e}; {} lote(s) na fila de retentativa",
                    self.buffer.pending_batch_count()
                );
            }
        }
    }

    /// Descarrega o lote parcial e a fila de retentativa (encerramento).
    /// Retorna quantos pacotes foram entregues; 0 se não havia nada.
    pub fn flush_pending(&mut self) -> Result<usize> {
        if self.buffer.is_drained() {
            return Ok(0);
        }
        self.flush_buffer()
    }

    fn flush_buffer(&mut self) -> Result<usize> {
        let report = self.buffer.flush(&mut self.sink);
        self.stats.flushes += report.batches as u64;
        self.stats.packets_flushed += report.packets as u64;
        self.stats.packets_dropped += report.dropped_packets as u64;
        if report.batches > 0 {
            info!(
                "{} lote(s) descarregado(s): {} pacotes (total {} lotes)",
                report.batches, report.packets, self.stats.flushes
            );
        }

        match report.failure {
            Some(e) => {
                self.stats.delivery_failures += 1;
                Err(e)
            }
            None => Ok(report.packets),
        }
    }

    fn report_anomalies(&mut self, packet: &Packet) {
        let anomalies = self.classifier.classify(packet);
        if anomalies.is_empty() {
            return;
        }
        self.stats.anomalies += 1;
        for a in &anomalies {
            warn!(
                "[ANOMALY] {} Seq: {} – {} {:.1}{} > {:.1}{}",
                packet.device_id, packet.sequence_no, a.label, a.value, a.unit, a.limit, a.unit
            );
        }
    }

    pub fn buffer(&self) -> &BatchBuffer {
        &self.buffer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BATCH_THRESHOLD;
    use crate::clock::FixedClock;
    use crate::sink::{FrameSink, MemorySink};
    use crate::source::{PacketSource, ReplaySource};

    const NOW: i64 = 1_700_000_000;

    fn packet(seq: i64) -> Packet {
        Packet {
            device_id: "ESP32_SIM_01".into(),
            sequence_no: seq,
            temperature: 28.0,
            humidity: 50.0,
            packet_rate: 15,
            cpu_usage: 45.0,
            battery_level: 75.0,
            timestamp: NOW,
        }
    }

    fn pipeline() -> GatewayPipeline<MemorySink, FixedClock> {
        GatewayPipeline::new(
            BatchBuffer::new(BATCH_THRESHOLD),
            MemorySink::new(),
            FixedClock::new(NOW),
        )
    }

    fn seqs(batch: &[Packet]) -> Vec<i64> {
        batch.iter().map(|p| p.sequence_no).collect()
    }

    #[test]
    fn threshold_packets_trigger_one_flush() {
        let mut gw = pipeline();
        for seq in 1..=5 {
            gw.process(packet(seq));
        }
        assert_eq!(gw.sink().batches().len(), 1);
        assert_eq!(gw.buffer().size(), 0);
        assert_eq!(gw.stats().flushes, 1);
    }

    #[test]
    fn below_threshold_does_not_flush() {
        let mut gw = pipeline();
        for seq in 1..=4 {
            gw.process(packet(seq));
        }
        assert!(gw.sink().batches().is_empty());
        assert_eq!(gw.buffer().size(), BATCH_THRESHOLD - 1);
    }

    #[test]
    fn flush_preserves_append_order() {
        let mut gw = pipeline();
        for seq in [3, 1, 4, 15, 9] {
            gw.process(packet(seq));
        }
        assert_eq!(seqs(&gw.sink().batches()[0]), vec![3, 1, 4, 15, 9]);
    }

    #[test]
    fn rejected_packets_are_dropped() {
        let mut gw = pipeline();
        gw.process(Packet {
            sequence_no: 0,
            ..packet(0)
        });
        gw.process(Packet {
            temperature: 150.0,
            ..packet(2)
        });
        gw.process(Packet {
            timestamp: NOW + 6,
            ..packet(3)
        });
        gw.process(packet(4));

        let stats = gw.stats();
        assert_eq!(stats.received, 4);
        assert_eq!(stats.rejected, 3);
        assert_eq!(stats.accepted, 1);
        assert_eq!(seqs(gw.buffer().packets()), vec![4]);
    }

    #[test]
    fn rejections_do_not_count_toward_batch() {
        let mut gw = pipeline();
        for seq in 1..=4 {
            gw.process(packet(seq));
        }
        gw.process(Packet {
            battery_level: -5.0,
            ..packet(5)
        });
        assert!(gw.sink().batches().is_empty());
        gw.process(packet(6));
        assert_eq!(seqs(&gw.sink().batches()[0]), vec![1, 2, 3, 4, 6]);
    }

    #[test]
    fn validation_uses_injected_clock() {
        let mut gw = pipeline();
        gw.process(Packet {
            timestamp: NOW + 60,
            ..packet(1)
        });
        assert_eq!(gw.stats().rejected, 1);

        gw.clock_mut().advance(60);
        gw.process(Packet {
            timestamp: NOW + 60,
            ..packet(2)
        });
        assert_eq!(gw.stats().accepted, 1);
    }

    #[test]
    fn twelve_packet_run() {
        let mut source = ReplaySource::new((1..=12).map(packet));
        let mut gw = pipeline();
        for _ in 0..12 {
            gw.process(source.next_packet());
        }

        let batches = gw.sink().batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(seqs(&batches[0]), vec![1, 2, 3, 4, 5]);
        assert_eq!(seqs(&batches[1]), vec![6, 7, 8, 9, 10]);
        assert_eq!(seqs(gw.buffer().packets()), vec![11, 12]);
        assert_eq!(gw.stats().packets_flushed, 10);
    }

    #[test]
    fn flush_pending_drains_partial_batch() {
        let mut gw = pipeline();
        assert_eq!(gw.flush_pending().unwrap(), 0);
        assert!(gw.sink().batches().is_empty());

        gw.process(packet(1));
        gw.process(packet(2));
        assert_eq!(gw.flush_pending().unwrap(), 2);
        assert!(gw.buffer().is_empty());
        assert_eq!(seqs(&gw.sink().batches()[0]), vec![1, 2]);
    }

    #[test]
    fn delivery_failure_keeps_batch_for_retry() {
        let mut gw = GatewayPipeline::new(
            BatchBuffer::new(2),
            MemorySink::failing(),
            FixedClock::new(NOW),
        );
        gw.process(packet(1));
        gw.process(packet(2));
        assert_eq!(gw.stats().delivery_failures, 1);
        assert!(gw.buffer().is_empty());
        assert_eq!(gw.buffer().pending_packets(), 2);

        gw.sink_mut().set_failing(false);
        gw.process(packet(3));
        assert!(gw.sink().batches().is_empty());
        gw.process(packet(4));

        let batches = gw.sink().batches();
        assert_eq!(seqs(&batches[0]), vec![1, 2]);
        assert_eq!(seqs(&batches[1]), vec![3, 4]);
        assert!(gw.buffer().is_drained());
        assert_eq!(gw.stats().flushes, 2);
    }

    #[test]
    fn outage_never_produces_oversized_batch() {
        let mut gw = pipeline();
        for seq in 1..=12 {
            gw.process(packet(seq));
        }
        assert_eq!(gw.stats().delivery_failures, 0);
        gw.sink_mut().set_failing(true);
        for seq in 13..=24 {
            gw.process(packet(seq));
        }
        assert_eq!(gw.stats().delivery_failures, 2);
        assert!(gw.buffer().size() < BATCH_THRESHOLD);

        gw.sink_mut().set_failing(false);
        gw.process(packet(25));

        let batches = gw.sink().batches();
        assert!(batches.iter().all(|b| b.len() <= BATCH_THRESHOLD));
        let delivered: Vec<i64> = batches.iter().flat_map(|b| seqs(b)).collect();
        assert_eq!(delivered, (1..=25).collect::<Vec<_>>());
        assert!(gw.buffer().is_drained());
        assert_eq!(gw.stats().packets_flushed, 25);
    }

    #[test]
    fn undeliverable_batch_is_dropped() {
        let gateway = GatewayConfig {
            batch_threshold: 1,
            ..Default::default()
        };
        let mut gw = GatewayPipeline::from_config(
            &gateway,
            &AnomalyThresholds::default(),
            FrameSink::new(gateway.gateway_id.clone()),
            FixedClock::new(NOW),
        );
        gw.process(Packet {
            device_id: "x".repeat(crate::protocol::MAX_FRAME_SIZE),
            ..packet(1)
        });
        gw.process(packet(2));

        let stats = gw.stats();
        assert_eq!(stats.packets_dropped, 1);
        assert_eq!(stats.delivery_failures, 0);
        assert_eq!(stats.packets_flushed, 1);
        assert!(gw.buffer().is_drained());
        assert_eq!(gw.into_sink().frames().len(), 1);
    }

    #[test]
    fn flush_pending_reports_delivery_failure() {
        let mut gw = GatewayPipeline::new(
            BatchBuffer::new(5),
            MemorySink::failing(),
            FixedClock::new(NOW),
        );
        gw.process(packet(1));
        let err = gw.flush_pending().unwrap_err();
        assert!(matches!(err, GatewayError::DeliveryFailure { batch_len: 1, .. }));
        assert_eq!(gw.buffer().pending_packets(), 1);

        gw.sink_mut().set_failing(false);
        assert_eq!(gw.flush_pending().unwrap(), 1);
        assert!(gw.buffer().is_drained());
    }

    #[test]
    fn anomalies_are_counted_but_accepted() {
        let mut gw = pipeline().with_classifier(AnomalyClassifier::default());
        gw.process(Packet {
            temperature: 75.0,
            ..packet(1)
        });
        gw.process(Packet {
            packet_rate: 180,
            ..packet(2)
        });
        gw.process(packet(3));

        let stats = gw.stats();
        assert_eq!(stats.accepted, 3);
        assert_eq!(stats.anomalies, 2);
        assert_eq!(gw.buffer().size(), 3);
    }

    #[test]
    fn anomalies_ignored_without_alerts() {
        let mut gw = pipeline().with_alert_on_anomaly(false);
        gw.process(Packet {
            temperature: 75.0,
            ..packet(1)
        });
        assert_eq!(gw.stats().anomalies, 0);
        assert_eq!(gw.stats().accepted, 1);
    }

    #[test]
    fn constructors_share_alert_default() {
        let hot = Packet {
            temperature: 75.0,
            ..packet(1)
        };
        let mut plain = pipeline();
        let mut configured = GatewayPipeline::from_config(
            &GatewayConfig::default(),
            &AnomalyThresholds::default(),
            MemorySink::new(),
            FixedClock::new(NOW),
        );
        plain.process(hot.clone());
        configured.process(hot);
        assert_eq!(plain.stats().anomalies, 1);
        assert_eq!(configured.stats().anomalies, 1);
    }

    #[test]
    fn rejection_message_names_sequence_and_reason() {
        let msg = rejection_message(7, Rejection::TemperatureOutOfRange);
        assert!(msg.starts_with("[INVALID PACKET DROPPED] Seq: 7 – "), "{msg}");
        assert!(msg.contains("seq 7"), "{msg}");
        assert!(msg.contains(&Rejection::TemperatureOutOfRange.to_string()), "{msg}");
    }

    #[test]
    fn from_config_applies_settings() {
        let gateway = GatewayConfig {
            batch_threshold: 3,
            max_future_skew_secs: 0,
            max_pending_batches: 2,
            ..Default::default()
        };
        let mut gw = GatewayPipeline::from_config(
            &gateway,
            &AnomalyThresholds::default(),
            FrameSink::new(gateway.gateway_id.clone()),
            FixedClock::new(NOW),
        );
        gw.process(Packet {
            timestamp: NOW + 1,
            ..packet(1)
        });
        assert_eq!(gw.stats().rejected, 1);

        for seq in 2..=4 {
            gw.process(packet(seq));
        }
        assert_eq!(gw.buffer().threshold(), 3);
        assert_eq!(gw.buffer().retry_capacity(), 2);
        assert_eq!(gw.into_sink().frames().len(), 1);
    }

    #[test]
    fn custom_validator() {
        let mut gw = pipeline().with_validator(PacketValidator::new(100));
        gw.process(Packet {
            timestamp: NOW + 90,
            ..packet(1)
        });
        assert_eq!(gw.stats().accepted, 1);
    }
}
