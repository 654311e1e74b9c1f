//! On-wire operation and error code registry
//!
//! These values are part of the contract protocol and must not change.

/// Matrix contract, place and invite operations (32-bit)
pub mod op {
    pub const ADD_CHILD: u32 = 0xcea08332;
    pub const ADD_GRANDCHILD: u32 = 0xfec063b3;
    pub const ADD_REFERAL: u32 = 0x7a3eae1c;
    pub const BONUS: u32 = 0x39cb9dfb;
    pub const BUY_PLACE: u32 = 0x179b74a8;
    pub const CANCEL_TASK: u32 = 0xba25f1e9;
    pub const DEPLOY_PLACE: u32 = 0x609ecd5a;
    pub const EXCESSES: u32 = 0x7d7aec1d;
    pub const LOCK_POS: u32 = 0x6d31ad42;
    pub const PROXY: u32 = 0xd5212b3f;
    pub const REFUND: u32 = 0xc135f40c;
    pub const REPORT_OF_INVITE: u32 = 0x5cdb127e;
    pub const REWARD: u32 = 0xd4c89207;
    pub const SET_OWNER: u32 = 0x0a31c7c0;
    pub const UNLOCK_POS: u32 = 0x77d27591;
    pub const UPDATE_MAX_TASKS: u32 = 0x54f512f6;
    pub const UPDATE_PROCESSOR: u32 = 0x2a50577e;
    pub const UPDATE_ADMIN: u32 = 0x8a3447f9;
    pub const UPDATE_FEES: u32 = 0xf74a44af;
    pub const UPGRADE: u32 = 0xdbfaf817;
    pub const CHOOSE_INVITER: u32 = 0xef27e2d6;
    pub const WITHDRAW: u32 = 0xcb03bfaf;
}

/// Profile collection operations
pub mod collection_op {
    pub const DEPLOY_ITEM: u32 = 1;
    pub const CHANGE_OWNER: u32 = 3;
    pub const CHANGE_CONTENT: u32 = 4;
    pub const WITHDRAW: u32 = 5;
}

/// Profile item (NFT) operations
pub mod item_op {
    pub const TRANSFER: u32 = 0x5fcc3d14;
    pub const OWNERSHIP_ASSIGNED: u32 = 0x05138d91;
    pub const EXCESSES: u32 = 0xd53276db;
    pub const EDIT_CONTENT: u32 = 0x1a0b9d51;
    pub const GET_STATIC_DATA: u32 = 0x2fcb26a2;
    pub const REPORT_STATIC_DATA: u32 = 0x8b771735;
    pub use super::op::{ADD_REFERAL, BONUS, CHOOSE_INVITER, PROXY, REPORT_OF_INVITE, WITHDRAW};
}

/// Program identifiers used as dictionary keys in profile programs
pub mod program {
    pub const MULTI: u32 = 0x1ce8c484;
}

/// Exit codes thrown by the matrix contracts
pub mod exit_code {
    pub const BAD_REQUEST: u32 = 400;
    pub const UNAUTHORIZED: u32 = 401;
    pub const INSUFFICIENT_FUNDS: u32 = 402;
    pub const FORBIDDEN: u32 = 403;
    pub const NOT_FOUND: u32 = 404;
    pub const INVALID_WORKCHAIN: u32 = 333;

    /// Human-readable name of a matrix contract exit code.
    pub fn describe(code: u32) -> Option<&'static str> {
        match code {
            BAD_REQUEST => Some("bad request"),
            UNAUTHORIZED => Some("unauthorized"),
            INSUFFICIENT_FUNDS => Some("insufficient funds"),
            FORBIDDEN => Some("forbidden"),
            NOT_FOUND => Some("not found"),
            INVALID_WORKCHAIN => Some("invalid workchain"),
            _ => None,
        }
    }
}

/// Exit codes thrown by profile items
pub mod item_exit_code {
    pub const INVALID_SENDER: u32 = 401;
    pub const NOT_ENOUGH_GAS: u32 = 402;
    pub const FORBIDDEN: u32 = 403;
    pub const UNINIT: u32 = 405;
    pub const INVALID_PAYLOAD: u32 = 708;
}
