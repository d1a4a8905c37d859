//! Configuração unificada via TOML.
//!
//! Valores padrão: 12 pacotes, lote de 5, tolerância de 5 s e saída no
//! console.

use crate::anomaly::AnomalyClassifier;
use crate::batch::{BATCH_THRESHOLD, MAX_PENDING_BATCHES};
use crate::validation::{MAX_FUTURE_SKEW_SECS, PacketValidator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Sinks aceitos em `gateway.sink`.
pub const SINK_MODES: [&str; 2] = ["console", "frame"];

/// Configuração do dispositivo simulado.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Identificador reportado nos pacotes
    pub device_id: String,
    /// Quantos pacotes gerar antes de encerrar
    pub packet_count: u32,
    /// Pausa entre pacotes (ms, 0 = sem pausa)
    pub interval_ms: u64,
    /// Semente do gerador (ausente = entropia do sistema)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Probabilidade de injetar uma leitura anômala (0.0–1.0)
    pub anomaly_probability: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: "ESP32_SIM_01".into(),
            packet_count: 12,
            interval_ms: 0,
            seed: None,
            anomaly_probability: 0.0,
        }
    }
}

/// Configuração do pipeline do gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub gateway_id: String,
    /// Pacotes por lote
    pub batch_threshold: usize,
    /// Tolerância para timestamps no futuro (s)
    pub max_future_skew_secs: i64,
    /// Destino dos lotes: "console" ou "frame"
    pub sink: String,
    /// Emite alerta para pacotes aceitos que forem anômalos
    pub alert_on_anomaly: bool,
    /// Descarrega o lote parcial ao encerrar
    pub flush_on_shutdown: bool,
    /// Lotes guardados para retentativa quando o sink falha (0 = descarta)
    pub max_pending_batches: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_id: "gateway_001".into(),
            batch_threshold: BATCH_THRESHOLD,
            max_future_skew_secs: MAX_FUTURE_SKEW_SECS,
            sink: "console".into(),
            alert_on_anomaly: true,
            flush_on_shutdown: false,
            max_pending_batches: MAX_PENDING_BATCHES,
        }
    }
}

impl GatewayConfig {
    pub fn validator(&self) -> PacketValidator {
        PacketValidator::new(self.max_future_skew_secs)
    }
}

/// Limites do classificador de anomalias (comparação estrita).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyThresholds {
    /// °C
    pub temperature: f32,
    pub packet_rate: i32,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            temperature: 60.0,
            packet_rate: 100,
        }
    }
}

impl AnomalyThresholds {
    pub fn classifier(&self) -> AnomalyClassifier {
        AnomalyClassifier::new(self.clone())
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub gateway: GatewayConfig,
    pub anomaly: AnomalyThresholds,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.device.device_id.trim().is_empty() {
            errors.push("device_id não pode ser vazio".into());
        }
        if !(0.0..=1.0).contains(&self.device.anomaly_probability) {
            errors.push(format!(
                "Probabilidade de anomalia inválida: {} (0.0–1.0)",
                self.device.anomaly_probability
            ));
        }
        if self.gateway.gateway_id.trim().is_empty() {
            errors.push("gateway_id não pode ser vazio".into());
        }
        if self.gateway.batch_threshold == 0 {
            errors.push("Tamanho do lote não pode ser 0".into());
        }
        if self.gateway.max_future_skew_secs < 0 {
            errors.push(format!(
                "Tolerância de relógio negativa: {}",
                self.gateway.max_future_skew_secs
            ));
        }
        if !SINK_MODES.contains(&self.gateway.sink.as_str()) {
            errors.push(format!(
                "Sink desconhecido: {:?} (esperado: {})",
                self.gateway.sink,
                SINK_MODES.join(", ")
            ));
        }

        errors
    }
}
