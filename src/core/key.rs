//! Composite pose variable keys
//!
//! Every pose variable in the global pose graph is addressed by a raw 64-bit [`Key`] that
//! packs the owning robot and the robot-local pose index, laid out like a labeled symbol:
//!
//! ```text
//! | 63 .. 56 | 55 .. 48          | 47 .. 0    |
//! |   'g'    | 'A' + robot_id    | pose index |
//! ```
//!
//! Decoding needs no side table: the robot a pose belongs to is recovered from the key alone.

use std::fmt;

use crate::error::{DiagnosticsError, DiagnosticsResult};

/// Raw variable key as stored in factor graphs and value maps
pub type Key = u64;

/// Character stored in the top byte of every pose key
pub const GRAPH_CHAR: u8 = b'g';

const LABEL_BASE: u8 = b'A';
const CHAR_SHIFT: u32 = 56;
const LABEL_SHIFT: u32 = 48;
const INDEX_MASK: u64 = (1 << LABEL_SHIFT) - 1;

/// Largest robot id whose label still fits in one byte
pub const MAX_ROBOT_ID: u32 = (u8::MAX - LABEL_BASE) as u32;

/// Largest pose index representable in the payload bits
pub const MAX_POSE_INDEX: u64 = INDEX_MASK;

/// Decoded pose key: which robot a pose belongs to and its sequential index on that robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoseKey {
    pub robot_id: u32,
    pub index: u64,
}

impl PoseKey {
    /// Build a pose key, rejecting robot ids or indices that do not fit the layout
    pub fn new(robot_id: u32, index: u64) -> DiagnosticsResult<Self> {
        if robot_id > MAX_ROBOT_ID {
            return Err(DiagnosticsError::InvalidInput(format!(
                "robot id {robot_id} exceeds the maximum label {MAX_ROBOT_ID}"
            )));
        }
        if index > MAX_POSE_INDEX {
            return Err(DiagnosticsError::InvalidInput(format!(
                "pose index {index} exceeds 48 bits"
            )));
        }
        Ok(Self { robot_id, index })
    }

    /// Pack into the raw key representation
    pub fn key(&self) -> Key {
        ((GRAPH_CHAR as u64) << CHAR_SHIFT)
            | (((LABEL_BASE as u64) + self.robot_id as u64) << LABEL_SHIFT)
            | self.index
    }

    /// Recover (robot id, pose index) from a raw key.
    ///
    /// Keys must have been built through [`PoseKey::new`]; any other bit pattern decodes to
    /// some pose key but carries no meaning.
    pub fn decode(key: Key) -> Self {
        let label = ((key >> LABEL_SHIFT) & 0xff) as u8;
        Self {
            robot_id: label.wrapping_sub(LABEL_BASE) as u32,
            index: key & INDEX_MASK,
        }
    }

    /// Robot label character, `'A'` for robot 0
    pub fn label(&self) -> char {
        LABEL_BASE.wrapping_add(self.robot_id as u8) as char
    }
}

impl From<PoseKey> for Key {
    fn from(pose_key: PoseKey) -> Self {
        pose_key.key()
    }
}

impl fmt::Display for PoseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", GRAPH_CHAR as char, self.label(), self.index)
    }
}

/// Raw key of pose `index` on robot `robot_id`, for tests
#[cfg(test)]
pub(crate) fn pose_key(robot_id: u32, index: u64) -> Key {
    match PoseKey::new(robot_id, index) {
        Ok(k) => k.key(),
        Err(e) => panic!("{e}"),
    }
}
