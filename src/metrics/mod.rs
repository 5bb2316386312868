pub mod ctr;
pub mod gap;
pub mod sos;
pub mod sov;

pub use ctr::{ctr, MAX_CTR, SISTRIX_CTR_CURVE};
pub use gap::{growth_gap, GapScheme, GapStatus, GrowthGap};
pub use sos::{share_of_search, SosBreakdown};
pub use sov::{market_volume, share_of_voice, visible_volume, SovBreakdown};
