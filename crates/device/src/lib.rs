//! # Telemetry Device
//!
//! Dispositivo ESP32 simulado: emite um pacote de telemetria por passo,
//! com sequência crescente a partir de 1 e timestamp do relógio injetado.
//!
//! Implementa [`telemetry_core::source::PacketSource`] para alimentar o
//! pipeline do gateway.

pub mod simulator;

pub use simulator::DeviceSimulator;
