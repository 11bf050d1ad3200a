use gfx_core::{ensure_fixed_part_size, Decode, DecodeResult, Encode, EncodeResult, ReadCursor, WriteCursor};

/// Outbound `FACK`: `frameId`, `totalFramesDecoded`, `queueDepth`.
///
/// `queue_depth` carries the two reserved sentinels alongside the ordinary pending-ops
/// count.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameAck {
    pub frame_id: u32,
    pub total_frames_decoded: u32,
    pub queue_depth: QueueDepth,
}

impl FrameAck {
    const NAME: &'static str = "FACK";

    const FIXED_PART_SIZE: usize = 4 /* magic */ + 4 /* frameId */ + 4 /* totalFramesDecoded */ + 4 /* queueDepth */;
}

impl Encode for FrameAck {
    fn encode(&self, dst: &mut WriteCursor<'_>) -> EncodeResult<()> {
        ensure_fixed_part_size!(in: dst);

        dst.write_slice(b"FACK");
        dst.write_u32(self.frame_id);
        dst.write_u32(self.total_frames_decoded);
        dst.write_u32(self.queue_depth.to_u32());

        Ok(())
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn size(&self) -> usize {
        Self::FIXED_PART_SIZE
    }
}

impl<'de> Decode<'de> for FrameAck {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        let _magic = src.read_array::<4>();
        let frame_id = src.read_u32();
        let total_frames_decoded = src.read_u32();
        let queue_depth = QueueDepth::from_u32(src.read_u32());

        Ok(Self {
            frame_id,
            total_frames_decoded,
            queue_depth,
        })
    }
}

/// Reserved `queueDepth` sentinels: `0` means unavailable, `0xFFFF_FFFF` suspends acking.
/// Any other value is the number of decode operations still pending in the client.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QueueDepth {
    Unavailable,
    Pending(u32),
    Suspend,
}

impl QueueDepth {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0x0000_0000 => Self::Unavailable,
            0xFFFF_FFFF => Self::Suspend,
            pending => Self::Pending(pending),
        }
    }

    pub fn to_u32(self) -> u32 {
        match self {
            Self::Unavailable => 0x0000_0000,
            Self::Pending(pending) => pending,
            Self::Suspend => 0xFFFF_FFFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_ack_round_trips() {
        let ack = FrameAck {
            frame_id: 7,
            total_frames_decoded: 1,
            queue_depth: QueueDepth::Pending(3),
        };

        let mut buf = [0u8; FrameAck::FIXED_PART_SIZE];
        let mut writer = WriteCursor::new(&mut buf);
        ack.encode(&mut writer).unwrap();

        let mut reader = ReadCursor::new(&buf);
        let decoded = FrameAck::decode(&mut reader).unwrap();
        assert_eq!(ack, decoded);
    }

    #[test]
    fn queue_depth_sentinels_round_trip() {
        assert_eq!(QueueDepth::from_u32(0).to_u32(), 0);
        assert_eq!(QueueDepth::from_u32(0xFFFF_FFFF).to_u32(), 0xFFFF_FFFF);
        assert!(matches!(QueueDepth::from_u32(0xFFFF_FFFF), QueueDepth::Suspend));
        assert!(matches!(QueueDepth::from_u32(0), QueueDepth::Unavailable));
        assert!(matches!(QueueDepth::from_u32(42), QueueDepth::Pending(42)));
    }
}
