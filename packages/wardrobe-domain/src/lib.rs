pub mod catalog;
pub mod garment;
pub mod outfit;

use uuid::Uuid;

/// Anything the ranker can exclude by identity.
pub trait Identified {
	fn id(&self) -> Uuid;
}
