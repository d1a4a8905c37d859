//! Classificador de anomalias – limites de segurança por métrica.
//!
//! Independente da validação: um pacote pode ser válido e anômalo.

use crate::config::AnomalyThresholds;
use crate::types::Packet;

/// Uma métrica acima do limite.
#[derive(Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub metric: String,
    pub label: String,
    pub value: f32,
    pub limit: f32,
    pub unit: String,
}

/// Classificador sem estado.
#[derive(Debug, Clone, Default)]
pub struct AnomalyClassifier {
    pub thresholds: AnomalyThresholds,
}

impl AnomalyClassifier {
    pub fn new(thresholds: AnomalyThresholds) -> Self {
        Self { thresholds }
    }

    /// `true` se qualquer métrica passar estritamente do limite.
    pub fn is_anomalous(&self, packet: &Packet) -> bool {
        packet.temperature > self.thresholds.temperature
            || packet.packet_rate > self.thresholds.packet_rate
    }

    /// Lista as métricas que dispararam.
    pub fn classify(&self, packet: &Packet) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        if packet.temperature > self.thresholds.temperature {
            anomalies.push(Anomaly {
                metric: "temperature".into(),
                label: "Temperatura".into(),
                value: packet.temperature,
                limit: self.thresholds.temperature,
                unit: "°C".into(),
            });
        }

        if packet.packet_rate > self.thresholds.packet_rate {
            anomalies.push(Anomaly {
                metric: "packet_rate".into(),
                label: "Taxa de pacotes".into(),
                value: packet.packet_rate as f32,
                limit: self.thresholds.packet_rate as f32,
                unit: "pkt/s".into(),
            });
        }

        anomalies
    }
}

/// Classifica com os limites padrão (60 °C, 100 pkt/s).
pub fn is_anomalous(packet: &Packet) -> bool {
    AnomalyClassifier::default().is_anomalous(packet)
}
