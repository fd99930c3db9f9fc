//! Link-based sharing: fragment routing and the snapshot codec.

pub mod codec;
mod route;

pub use codec::{decode, encode, DecodeError, EncodeError};
pub use route::{parse_fragment, share_fragment, share_url, ShareToken, SHARE_PREFIX};
