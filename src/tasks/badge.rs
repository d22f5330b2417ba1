use serde::Serialize;

/// Display tier derived from cumulative points; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Badge {
    Bronze,
    Silver,
    Gold,
}

const GOLD_FROM: i32 = 51;
const SILVER_FROM: i32 = 21;

pub fn badge_for(total_points: i32) -> Badge {
    if total_points >= GOLD_FROM {
        Badge::Gold
    } else if total_points >= SILVER_FROM {
        Badge::Silver
    } else {
        Badge::Bronze
    }
}
