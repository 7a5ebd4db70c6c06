//! Authority -> Observer state broadcasts.

use bytes::Bytes;

use super::{BroadcastOpcode, MAX_RECORDS};
use crate::{BinaryReader, BinaryWriter, Position, ProtocolError};

/// A player as seen by observers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub id: u32,
    /// Spawn ticket the player was created under (0 = not a remote request).
    pub ticket: u32,
    pub name: String,
}

/// A player cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub id: u32,
    pub owner: u32,
    pub position: Position,
    pub mass: f32,
}

/// A food pellet or a virus.
#[derive(Debug, Clone, PartialEq)]
pub struct PelletRecord {
    pub id: u32,
    pub position: Position,
    pub mass: f32,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct RankRecord {
    pub name: String,
    pub score: f32,
}

/// Full snapshot of the canonical world at `tick`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateBroadcast {
    pub tick: u64,
    pub players: Vec<PlayerRecord>,
    pub cells: Vec<CellRecord>,
    pub food: Vec<PelletRecord>,
    pub viruses: Vec<PelletRecord>,
    /// Present only on broadcasts that follow a leaderboard recompute.
    pub leaderboard: Option<Vec<RankRecord>>,
}

impl StateBroadcast {
    /// Encode to wire bytes. Fails when a collection holds more than
    /// [`MAX_RECORDS`] entries, which no reader would accept.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let capacity = 16
            + self.players.len() * 24
            + self.cells.len() * 20
            + (self.food.len() + self.viruses.len()) * 16;
        let mut w = BinaryWriter::with_capacity(capacity);
        w.put_u8(BroadcastOpcode::State as u8);
        w.put_u64(self.tick);

        w.put_len(self.players.len(), MAX_RECORDS)?;
        for p in &self.players {
            w.put_u32(p.id);
            w.put_u32(p.ticket);
            w.put_string_utf8(&p.name);
        }

        w.put_len(self.cells.len(), MAX_RECORDS)?;
        for c in &self.cells {
            w.put_u32(c.id);
            w.put_u32(c.owner);
            w.put_f32(c.position.x);
            w.put_f32(c.position.y);
            w.put_f32(c.mass);
        }

        write_pellets(&mut w, &self.food)?;
        write_pellets(&mut w, &self.viruses)?;

        match &self.leaderboard {
            Some(rows) => {
                w.put_u8(1);
                w.put_len(rows.len(), MAX_RECORDS)?;
                for row in rows {
                    w.put_string_utf8(&row.name);
                    w.put_f32(row.score);
                }
            }
            None => w.put_u8(0),
        }
        Ok(w.finish())
    }

    /// Parse a broadcast from raw bytes.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = BinaryReader::new(data.to_vec());
        let opcode = r.get_u8()?;
        if opcode != BroadcastOpcode::State as u8 {
            return Err(ProtocolError::InvalidOpcode(opcode));
        }
        let tick = r.get_u64()?;

        let count = r.get_len(MAX_RECORDS)?;
        let mut players = Vec::with_capacity(count);
        for _ in 0..count {
            players.push(PlayerRecord {
                id: r.get_u32()?,
                ticket: r.get_u32()?,
                name: r.get_string_utf8()?,
            });
        }

        let count = r.get_len(MAX_RECORDS)?;
        let mut cells = Vec::with_capacity(count);
        for _ in 0..count {
            let id = r.get_u32()?;
            let owner = r.get_u32()?;
            let x = r.get_f32("cell.x")?;
            let y = r.get_f32("cell.y")?;
            let mass = r.get_f32("cell.mass")?;
            cells.push(CellRecord {
                id,
                owner,
                position: Position::new(x, y),
                mass,
            });
        }

        let food = read_pellets(&mut r)?;
        let viruses = read_pellets(&mut r)?;

        let leaderboard = match r.get_u8()? {
            0 => None,
            _ => {
                let count = r.get_len(MAX_RECORDS)?;
                let mut rows = Vec::with_capacity(count);
                for _ in 0..count {
                    let name = r.get_string_utf8()?;
                    let score = r.get_f32("rank.score")?;
                    rows.push(RankRecord { name, score });
                }
                Some(rows)
            }
        };
        r.finish()?;

        Ok(Self {
            tick,
            players,
            cells,
            food,
            viruses,
            leaderboard,
        })
    }
}

fn write_pellets(w: &mut BinaryWriter, pellets: &[PelletRecord]) -> Result<(), ProtocolError> {
    w.put_len(pellets.len(), MAX_RECORDS)?;
    for p in pellets {
        w.put_u32(p.id);
        w.put_f32(p.position.x);
        w.put_f32(p.position.y);
        w.put_f32(p.mass);
    }
    Ok(())
}

fn read_pellets(r: &mut BinaryReader) -> Result<Vec<PelletRecord>, ProtocolError> {
    let count = r.get_len(MAX_RECORDS)?;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let id = r.get_u32()?;
        let x = r.get_f32("pellet.x")?;
        let y = r.get_f32("pellet.y")?;
        let mass = r.get_f32("pellet.mass")?;
        out.push(PelletRecord {
            id,
            position: Position::new(x, y),
            mass,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StateBroadcast {
        StateBroadcast {
            tick: 42,
            players: vec![PlayerRecord {
                id: 3,
                ticket: 99,
                name: "observer".into(),
            }],
            cells: vec![CellRecord {
                id: 10,
                owner: 3,
                position: Position::new(1.0, 2.0),
                mass: 25.0,
            }],
            food: vec![PelletRecord {
                id: 11,
                position: Position::new(-4.0, 8.0),
                mass: 1.0,
            }],
            viruses: vec![],
            leaderboard: Some(vec![RankRecord {
                name: "observer".into(),
                score: 25.0,
            }]),
        }
    }

    #[test]
    fn test_broadcast_decodes_what_it_encodes() {
        let state = sample();
        assert_eq!(StateBroadcast::decode(&state.encode().unwrap()), Ok(state));
    }

    #[test]
    fn test_truncated_broadcast_is_rejected() {
        let bytes = sample().encode().unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert_eq!(StateBroadcast::decode(cut), Err(ProtocolError::UnexpectedEof));
    }

    #[test]
    fn test_intent_opcode_is_not_a_broadcast() {
        assert_eq!(
            StateBroadcast::decode(&[0x11]),
            Err(ProtocolError::InvalidOpcode(0x11))
        );
    }

    #[test]
    fn test_hostile_length_prefix() {
        let mut w = BinaryWriter::new();
        w.put_u8(0x20);
        w.put_u64(1);
        w.put_u32(u32::MAX);
        assert_eq!(
            StateBroadcast::decode(w.as_slice()),
            Err(ProtocolError::TooManyItems(u32::MAX, MAX_RECORDS))
        );
    }

    #[test]
    fn test_oversized_pool_refuses_to_encode() {
        let pellet = PelletRecord {
            id: 1,
            position: Position::ZERO,
            mass: 1.0,
        };
        let state = StateBroadcast {
            food: vec![pellet; MAX_RECORDS as usize + 1],
            ..sample()
        };
        assert_eq!(
            state.encode(),
            Err(ProtocolError::TooManyItems(MAX_RECORDS + 1, MAX_RECORDS))
        );
    }
}
