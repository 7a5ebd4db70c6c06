//! Observer -> Authority intents.

use bytes::Bytes;

use super::IntentOpcode;
use crate::{BinaryReader, BinaryWriter, Position, ProtocolError};

/// An advisory input sent by an Observer. The Authority consumes it on its
/// next tick; it never mutates state on the sending side.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Create a player named `name`. `ticket` is chosen by the Observer
    /// (non-zero) and echoed on the spawned player's broadcast record.
    SpawnRequest { ticket: u32, name: String },
    /// Steer all owned cells toward `target`.
    Move { target: Position },
    /// Split every eligible owned cell.
    Split,
    /// No movement target this tick.
    Floating,
}

impl Intent {
    /// Opcode of this intent.
    pub fn opcode(&self) -> IntentOpcode {
        match self {
            Intent::SpawnRequest { .. } => IntentOpcode::SpawnRequest,
            Intent::Move { .. } => IntentOpcode::Move,
            Intent::Split => IntentOpcode::Split,
            Intent::Floating => IntentOpcode::Floating,
        }
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Bytes {
        let mut w = BinaryWriter::with_capacity(16);
        w.put_u8(self.opcode() as u8);
        match self {
            Intent::SpawnRequest { ticket, name } => {
                w.put_u32(*ticket);
                w.put_string_utf8(name);
            }
            Intent::Move { target } => {
                w.put_f32(target.x);
                w.put_f32(target.y);
            }
            Intent::Split | Intent::Floating => {}
        }
        w.finish()
    }

    /// Parse an intent from raw bytes.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = BinaryReader::new(data.to_vec());
        let opcode = reader.get_u8()?;

        let intent = match opcode {
            0x00 => {
                let ticket = reader.get_u32()?;
                let name = reader.get_string_utf8()?;
                Intent::SpawnRequest { ticket, name }
            }
            0x10 => {
                let x = reader.get_f32("target.x")?;
                let y = reader.get_f32("target.y")?;
                Intent::Move {
                    target: Position::new(x, y),
                }
            }
            0x11 => Intent::Split,
            0x12 => Intent::Floating,
            _ => return Err(ProtocolError::InvalidOpcode(opcode)),
        };
        reader.finish()?;
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_request_wire_layout() {
        let bytes = Intent::SpawnRequest {
            ticket: 7,
            name: "ab".into(),
        }
        .encode();
        assert_eq!(&bytes[..], &[0x00, 7, 0, 0, 0, b'a', b'b', 0]);
    }

    #[test]
    fn test_move_decodes() {
        let bytes = Intent::Move {
            target: Position::new(12.5, -3.0),
        }
        .encode();
        assert_eq!(
            Intent::decode(&bytes),
            Ok(Intent::Move {
                target: Position::new(12.5, -3.0)
            })
        );
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(Intent::decode(&[0x42]), Err(ProtocolError::InvalidOpcode(0x42)));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert_eq!(Intent::decode(&[0x11, 0x00]), Err(ProtocolError::TrailingBytes(1)));
    }

    #[test]
    fn test_empty_is_eof() {
        assert_eq!(Intent::decode(&[]), Err(ProtocolError::UnexpectedEof));
    }
}
