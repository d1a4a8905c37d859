//! Simulador de dispositivo ESP32 – gera leituras pseudo-aleatórias.
//!
//! Faixas de geração (valores inteiros convertidos para float):
//! - temperatura 25–34 °C
//! - umidade 45–64 %
//! - taxa de pacotes 10–19
//! - CPU 20–79 %
//! - bateria 30–99 %
//!
//! As faixas são conveniência de geração, não limites do validador.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use telemetry_core::clock::{Clock, SystemClock};
use telemetry_core::config::DeviceConfig;
use telemetry_core::source::PacketSource;
use telemetry_core::types::Packet;
use tracing::{debug, info};

pub const TEMPERATURE_RANGE: Range<i32> = 25..35;
pub const HUMIDITY_RANGE: Range<i32> = 45..65;
pub const PACKET_RATE_RANGE: Range<i32> = 10..20;
pub const CPU_USAGE_RANGE: Range<i32> = 20..80;
pub const BATTERY_RANGE: Range<i32> = 30..100;

/// Acréscimos aplicados a uma leitura anômala injetada.
pub const ANOMALY_TEMPERATURE_BOOST: f32 = 40.0;
pub const ANOMALY_PACKET_RATE_BOOST: i32 = 100;

/// Dispositivo simulado.
pub struct DeviceSimulator<C: Clock = SystemClock> {
    device_id: String,
    /// Último número de sequência emitido
    sequence_no: i64,
    rng: StdRng,
    clock: C,
    anomaly_probability: f64,
}

impl DeviceSimulator<SystemClock> {
    /// Cria o simulador a partir da config, usando o relógio do sistema.
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> DeviceSimulator<C> {
    pub fn with_clock(config: &DeviceConfig, clock: C) -> Self {
        let rng = match config.seed {
            Some(seed) => {
                debug!("Simulador com semente fixa {seed}");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        info!(
            "Dispositivo {} inicializado (relógio: {})",
            config.device_id,
            clock.name()
        );

        Self {
            device_id: config.device_id.clone(),
            sequence_no: 0,
            rng,
            clock,
            anomaly_probability: config.anomaly_probability.clamp(0.0, 1.0),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Quantos pacotes já foram emitidos.
    pub fn emitted(&self) -> i64 {
        self.sequence_no
    }

    /// Gera o próximo pacote.
    pub fn generate(&mut self) -> Packet {
        self.sequence_no += 1;

        let mut packet = Packet {
            device_id: self.device_id.clone(),
            sequence_no: self.sequence_no,
            temperature: self.rng.gen_range(TEMPERATURE_RANGE) as f32,
            humidity: self.rng.gen_range(HUMIDITY_RANGE) as f32,
            packet_rate: self.rng.gen_range(PACKET_RATE_RANGE),
            cpu_usage: self.rng.gen_range(CPU_USAGE_RANGE) as f32,
            battery_level: self.rng.gen_range(BATTERY_RANGE) as f32,
            timestamp: self.clock.now(),
        };

        if self.anomaly_probability > 0.0 && self.rng.gen_bool(self.anomaly_probability) {
            packet.temperature += ANOMALY_TEMPERATURE_BOOST;
            packet.packet_rate += ANOMALY_PACKET_RATE_BOOST;
            debug!("Leitura anômala injetada em Seq:{}", packet.sequence_no);
        }

        packet
    }
}

impl<C: Clock> PacketSource for DeviceSimulator<C> {
    fn next_packet(&mut self) -> Packet {
        self.generate()
    }
}
