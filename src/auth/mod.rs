//! Credential acquisition flows
//!
//! Device authorization grant for OAuth-capable providers, manual token entry
//! for providers that only issue personal access tokens.

mod device_flow;
mod pat;

pub use device_flow::{
    DEVICE_CODE_GRANT_TYPE, DeviceEndpoints, DeviceFlow, PollTiming, resolve_client_id,
};
pub use pat::{PAT_SCOPES, PatAuth, TOKEN_SETTINGS_PATH};
