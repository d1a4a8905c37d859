//! Laço de simulação: fonte → pipeline, um pacote por passo.

use std::time::Duration;
use telemetry_core::clock::Clock;
use telemetry_core::pipeline::{GatewayPipeline, PipelineStats};
use telemetry_core::sink::Sink;
use telemetry_core::source::PacketSource;
use tracing::{error, info};

/// Parâmetros de uma sessão.
#[derive(Debug, Clone, Copy)]
pub struct SessionPlan {
    pub packet_count: u32,
    pub interval: Duration,
    pub flush_on_shutdown: bool,
}

/// Gera `packet_count` pacotes e passa cada um ao pipeline.
pub fn run_session<P, S, C>(
    source: &mut P,
    pipeline: &mut GatewayPipeline<S, C>,
    plan: SessionPlan,
) -> PipelineStats
where
    P: PacketSource,
    S: Sink,
    C: Clock,
{
    for _ in 0..plan.packet_count {
        let packet = source.next_packet();
        info!(
            "[DEVICE LOG] {} Seq:{} Temp:{} CPU:{} Battery:{}",
            packet.device_id,
            packet.sequence_no,
            packet.temperature,
            packet.cpu_usage,
            packet.battery_level
        );

        pipeline.process(packet);

        if !plan.interval.is_zero() {
            std::thread::sleep(plan.interval);
        }
    }

    let pending = pipeline.buffer().size() + pipeline.buffer().pending_packets();
    if plan.flush_on_shutdown {
        match pipeline.flush_pending() {
            Ok(0) => {}
            Ok(n) => info!("Lote parcial descarregado no encerramento: {n} pacotes"),
            Err(e) => error!("Falha ao descarregar lote parcial: {e}"),
        }
    } else if pending > 0 {
        info!("{pending} pacotes aguardando o próximo lote");
    }

    pipeline.stats()
}
