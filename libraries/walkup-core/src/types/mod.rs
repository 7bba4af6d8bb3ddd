mod batting_order;
mod game;
mod ids;
mod player;
mod segment;
mod track;

pub use batting_order::BattingOrder;
pub use game::GameSession;
pub use ids::{PlayerId, TrackId};
pub use player::Player;
pub use segment::{SegmentPolicy, SongSegment};
pub use track::Track;
