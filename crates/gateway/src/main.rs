//! # Telemetry Gateway
//!
//! Simula um dispositivo ESP32 e o gateway que valida, agrupa em lotes e
//! envia os pacotes ao servidor (stub: console ou frames em memória).
//!
//! ## Uso
//! ```bash
//! telemetry_gateway                      # Execução padrão (12 pacotes)
//! RUST_LOG=debug telemetry_gateway       # Log detalhado do pipeline
//! ```
//!
//! Parâmetros vêm do `config.toml` ao lado do executável.

mod session;

use session::{SessionPlan, run_session};
use std::time::Duration;
use telemetry_core::clock::SystemClock;
use telemetry_core::config::AppConfig;
use telemetry_core::pipeline::{GatewayPipeline, PipelineStats};
use telemetry_core::sink::{ConsoleSink, FrameSink, Sink};
use telemetry_device::DeviceSimulator;
use tracing::{error, info, warn};

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let mut config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Config inválida: {e}");
        }
        warn!("Usando configuração padrão");
        config = AppConfig::default();
    }

    let plan = SessionPlan {
        packet_count: config.device.packet_count,
        interval: Duration::from_millis(config.device.interval_ms),
        flush_on_shutdown: config.gateway.flush_on_shutdown,
    };

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⚡ IOT GATEWAY – ATIVO");
    println!("══════════════════════════════════════════════");
    println!("  Gateway:     {}", config.gateway.gateway_id);
    println!("  Dispositivo: {}", config.device.device_id);
    println!("  Pacotes:     {}", plan.packet_count);
    println!("  Lote:        {}", config.gateway.batch_threshold);
    println!("  Sink:        {}", config.gateway.sink);
    println!("══════════════════════════════════════════════");
    println!();

    let mut device = DeviceSimulator::from_config(&config.device);

    let stats = match config.gateway.sink.as_str() {
        "frame" => {
            let sink = FrameSink::new(config.gateway.gateway_id.clone());
            let (stats, sink) = run(&config, sink, &mut device, plan);
            info!(
                "{} frames codificados ({} bytes, protocolo v{})",
                sink.frames().len(),
                sink.bytes_sent(),
                telemetry_core::PROTOCOL_VERSION
            );
            stats
        }
        _ => run(&config, ConsoleSink::stdout(), &mut device, plan).0,
    };

    info!(
        "Sessão encerrada: {} recebidos | {} aceitos | {} rejeitados | {} anômalos | {} lotes ({} pacotes) | {} falhas de entrega | {} descartados",
        stats.received,
        stats.accepted,
        stats.rejected,
        stats.anomalies,
        stats.flushes,
        stats.packets_flushed,
        stats.delivery_failures,
        stats.packets_dropped
    );
}

fn run<S: Sink>(
    config: &AppConfig,
    sink: S,
    device: &mut DeviceSimulator,
    plan: SessionPlan,
) -> (PipelineStats, S) {
    let mut pipeline =
        GatewayPipeline::from_config(&config.gateway, &config.anomaly, sink, SystemClock);
    let stats = run_session(device, &mut pipeline, plan);
    (stats, pipeline.into_sink())
}
