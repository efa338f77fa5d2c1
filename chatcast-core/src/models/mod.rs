pub mod channel;
pub mod event;
pub mod id;
pub mod protocol;
pub mod stats;

pub use channel::{ChannelKey, IdentifierKind, Platform};
pub use event::{
    AuthorRoles, Badge, BadgeKind, ChatAuthor, ChatEvent, ElementKind, EmoteMetadata,
    MessageContent, MessageElement, MessageKind, MessageMetadata, MonetaryData, Sticker,
};
pub use id::ConnectionId;
pub use protocol::{ClientRequest, ErrorCode, ServerMessage, StatusKind};
pub use stats::{ChannelStats, UserStat};
