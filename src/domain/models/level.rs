use super::CefrLevel;

/// Fired once when the evaluated level strictly increases between two
/// recognized levels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LevelUp {
    pub from: CefrLevel,
    pub to: CefrLevel,
}
