//! # Telemetry Core
//!
//! Crate compartilhada do gateway IoT: modelo de pacote, validação,
//! classificação de anomalias, buffer de lote e o pipeline que liga a fonte
//! de pacotes ao sink.
//!
//! ## Módulos
//! - [`types`] – Pacote de telemetria
//! - [`validation`] – Faixas dos campos e frescor do timestamp
//! - [`anomaly`] – Limites de segurança por métrica
//! - [`batch`] – Buffer de lote com flush por limite
//! - [`pipeline`] – Orquestração validador → lote → sink
//! - [`sink`] / [`source`] – Pontos de injeção do destino e da origem
//! - [`clock`] – Fonte de tempo injetável
//! - [`protocol`] – Frame binário (bincode) dos lotes
//! - [`config`] – Configuração unificada via TOML
//! - [`error`] – Tipos de erro

pub mod types;
pub mod validation;
pub mod anomaly;
pub mod batch;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod clock;
pub mod protocol;
pub mod config;
pub mod error;

// Re-exports convenientes
pub use types::Packet;
pub use validation::{PacketValidator, Rejection, validate};
pub use anomaly::{AnomalyClassifier, is_anomalous};
pub use batch::{BATCH_THRESHOLD, BatchBuffer, FlushReport, MAX_PENDING_BATCHES};
pub use pipeline::{GatewayPipeline, PipelineStats};
pub use sink::{ConsoleSink, FrameSink, MemorySink, Sink};
pub use source::{PacketSource, ReplaySource};
pub use clock::{Clock, FixedClock, SystemClock};
pub use protocol::{PROTOCOL_VERSION, decode_batch, encode_batch};
pub use config::{AppConfig, DeviceConfig, GatewayConfig};
pub use error::GatewayError;
