//! Spawn-point resolution.

use crate::geometry::WorldPos;

/// The candidate closest to `pos` by Euclidean distance. Ties go to the
/// earlier candidate.
pub fn nearest(candidates: &[WorldPos], pos: WorldPos) -> Option<WorldPos> {
    let mut best: Option<(f32, WorldPos)> = None;
    for &c in candidates {
        let d = c.distance_squared(&pos);
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, c));
        }
    }
    best.map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_spawn() {
        assert_eq!(nearest(&[], WorldPos::ZERO), None);
    }

    #[test]
    fn test_picks_closest() {
        let spawns = [
            WorldPos::new(10.0, 0.0),
            WorldPos::new(-3.0, 4.0),
            WorldPos::new(2.0, 2.0),
        ];
        assert_eq!(nearest(&spawns, WorldPos::ZERO), Some(WorldPos::new(2.0, 2.0)));
        assert_eq!(nearest(&spawns, WorldPos::new(9.0, 1.0)), Some(WorldPos::new(10.0, 0.0)));
    }

    #[test]
    fn test_tie_keeps_first() {
        let spawns = [WorldPos::new(1.0, 0.0), WorldPos::new(-1.0, 0.0)];
        assert_eq!(nearest(&spawns, WorldPos::ZERO), Some(WorldPos::new(1.0, 0.0)));
    }
}
