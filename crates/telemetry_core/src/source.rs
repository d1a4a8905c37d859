//! Fonte de pacotes consumida pelo gateway.

use crate::types::Packet;
use std::collections::VecDeque;

/// Produz um pacote por passo de simulação.
pub trait PacketSource {
    fn next_packet(&mut self) -> Packet;
}

impl<P: PacketSource + ?Sized> PacketSource for &mut P {
    fn next_packet(&mut self) -> Packet {
        (**self).next_packet()
    }
}

/// Reproduz uma sequência fixa de pacotes.
///
/// Depois do último, repete o último pacote com a sequência incrementada
/// para manter o contrato de `sequence_no` crescente.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    pending: VecDeque<Packet>,
    last: Option<Packet>,
}

impl ReplaySource {
    pub fn new(packets: impl IntoIterator<Item = Packet>) -> Self {
        Self {
            pending: packets.into_iter().collect(),
            last: None,
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl PacketSource for ReplaySource {
    fn next_packet(&mut self) -> Packet {
        let packet = match self.pending.pop_front() {
            Some(packet) => packet,
            None => match &self.last {
                Some(last) => Packet {
                    sequence_no: last.sequence_no + 1,
                    ..last.clone()
                },
                None => Packet {
                    sequence_no: 1,
                    ..Default::default()
                },
            },
        };
        self.last = Some(packet.clone());
        packet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(seq: i64) -> Packet {
        Packet {
            device_id: "fixture".into(),
            sequence_no: seq,
            ..Default::default()
        }
    }

    #[test]
    fn replays_in_order() {
        let mut source = ReplaySource::new([packet(1), packet(2), packet(3)]);
        assert_eq!(source.remaining(), 3);
        let seqs: Vec<i64> = (0..3).map(|_| source.next_packet().sequence_no).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn continues_sequence_when_exhausted() {
        let mut source = ReplaySource::new([packet(7)]);
        source.next_packet();
        let extra = source.next_packet();
        assert_eq!(extra.sequence_no, 8);
        assert_eq!(extra.device_id, "fixture");
        assert_eq!(ReplaySource::default().next_packet().sequence_no, 1);
    }
}
