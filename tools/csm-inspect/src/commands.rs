use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Subcommand, ValueEnum};
use csm_cell::{boc, Address, FriendlyFlags};
use csm_contracts::messages::{
    AddReferal, AnyMessage, BuyPlace, ChooseInviter, LockPos, MessageBody, SetOwner, UnlockPos,
    Withdraw,
};
use csm_contracts::opcodes::program;
use csm_contracts::records::{
    CellCodec, InviteRecord, MatrixLevel, MultiAggregate, NftContent, PlacePos, PlaceRecord,
    ProfileContent, ProfileItemRecord, ProfilePrograms, Side, TaskItem,
};
use csm_matrix::{Channel, InMemoryChain, MatrixApi, MatrixService, SubtreeQuery};
use serde_json::{json, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DecodeKind {
    /// Place contract storage
    Place,
    /// Invite contract storage
    Invite,
    /// Multi contract storage
    Multi,
    /// One queued task
    Task,
    /// NFT content cell, also shown as profile fields when it has them
    Content,
    /// Profile item storage
    ProfileItem,
    /// Program dictionary of a profile
    Programs,
    /// Any known message body
    Message,
    /// Raw cell structure
    Cell,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum BuildArgs {
    /// buy_place at the next position, or at --parent/--side
    BuyPlace {
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
        level: u8,
        #[arg(long)]
        profile: Address,
        #[arg(long, requires = "side")]
        parent: Option<Address>,
        #[arg(long, value_enum, requires = "parent")]
        side: Option<SideArg>,
    },
    LockPos {
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
        level: u8,
        #[arg(long)]
        profile: Address,
        #[arg(long)]
        parent: Address,
        #[arg(long, value_enum)]
        side: SideArg,
    },
    UnlockPos {
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
        level: u8,
        #[arg(long)]
        profile: Address,
        #[arg(long)]
        parent: Address,
        #[arg(long, value_enum)]
        side: SideArg,
    },
    ChooseInviter {
        #[arg(long, default_value_t = program::MULTI)]
        program: u32,
        #[arg(long)]
        inviter: Address,
        #[arg(long)]
        seq_no: u32,
        #[arg(long)]
        invite: Address,
    },
    AddReferal {
        #[arg(long, default_value_t = program::MULTI)]
        program: u32,
        #[arg(long)]
        seq_no: u32,
        #[arg(long)]
        invite: Address,
    },
    SetOwner {
        #[arg(long)]
        owner: Address,
    },
    /// withdraw from a profile item, amount in nanotons
    Withdraw {
        #[arg(long)]
        amount: u128,
    },
}

fn level(m: u8) -> Result<MatrixLevel> {
    MatrixLevel::new(m).ok_or_else(|| anyhow!("matrix level must be 1 to 6, got {m}"))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("serializing output")
}

/// Decode `text` (hex or base64 bag of cells) as `kind`.
pub fn decode(kind: DecodeKind, text: &str) -> Result<Value> {
    let cell = boc::from_text(text).context("reading bag of cells")?;
    let bytes = boc::to_boc(&cell)?;

    Ok(match kind {
        DecodeKind::Place => to_json(&PlaceRecord::from_boc(&bytes)?)?,
        DecodeKind::Invite => to_json(&InviteRecord::from_boc(&bytes)?)?,
        DecodeKind::Task => to_json(&TaskItem::from_boc(&bytes)?)?,
        DecodeKind::ProfileItem => to_json(&ProfileItemRecord::from_boc(&bytes)?)?,
        DecodeKind::Multi => {
            let multi = MultiAggregate::from_boc(&bytes)?;
            let queue: Vec<Value> = multi
                .queue
                .iter()
                .map(|(key, task)| -> Result<Value> {
                    Ok(json!({ "key": key, "task": to_json(task)? }))
                })
                .collect::<Result<_>>()?;
            json!({
                "processor": multi.processor,
                "max_tasks": multi.max_tasks,
                "queue_size": multi.queue_size,
                "seq_no": multi.seq_no,
                "fees": multi.fees.0.iter().map(|fee| fee.to_string()).collect::<Vec<_>>(),
                "admin": multi.security.admin,
                "place_code_hash": multi.place_code.hash_hex(),
                "queue": queue,
            })
        }
        DecodeKind::Content => {
            let content = NftContent::from_boc(&bytes)?;
            let profile = ProfileContent::from_nft_content(&content).ok();
            json!({ "content": to_json(&content)?, "profile": to_json(&profile)? })
        }
        DecodeKind::Programs => {
            let programs = ProfilePrograms::load_root(&cell)?;
            let entries: Vec<Value> = programs
                .iter()
                .map(|(id, data)| -> Result<Value> {
                    Ok(json!({ "program": id, "data": to_json(data)? }))
                })
                .collect::<Result<_>>()?;
            Value::Array(entries)
        }
        DecodeKind::Message => {
            let (query_id, message) = AnyMessage::decode(&cell)?;
            json!({
                "op": message.name(),
                "query_id": query_id,
                "body": format!("{message:?}"),
            })
        }
        DecodeKind::Cell => cell_json(&cell),
    })
}

fn cell_json(cell: &csm_cell::CellRef) -> Value {
    json!({
        "hash": cell.hash_hex(),
        "bits": cell.bit_len(),
        "depth": cell.depth(),
        "unique_cells": cell.unique_cell_count(),
        "refs": cell.refs().iter().map(cell_json).collect::<Vec<_>>(),
    })
}

fn encoded<B: MessageBody>(body: &B, query_id: u64) -> Result<Value> {
    let cell = body.to_cell(query_id)?;
    Ok(json!({
        "op": B::NAME,
        "query_id": query_id,
        "hex": boc::to_hex(&cell)?,
        "base64": boc::to_base64(&cell)?,
    }))
}

/// Build the message body described by `args`.
pub fn build_message(args: &BuildArgs, query_id: u64) -> Result<Value> {
    match *args {
        BuildArgs::BuyPlace {
            level: m,
            profile,
            parent,
            side,
        } => {
            let pos = parent.zip(side).map(|(parent, side)| PlacePos::new(parent, side.into()));
            let body = BuyPlace {
                m: level(m)?,
                profile,
                pos,
            };
            encoded(&body, query_id)
        }
        BuildArgs::LockPos {
            level: m,
            profile,
            parent,
            side,
        } => {
            let body = LockPos {
                m: level(m)?,
                profile,
                pos: PlacePos::new(parent, side.into()),
            };
            encoded(&body, query_id)
        }
        BuildArgs::UnlockPos {
            level: m,
            profile,
            parent,
            side,
        } => {
            let body = UnlockPos {
                m: level(m)?,
                profile,
                pos: PlacePos::new(parent, side.into()),
            };
            encoded(&body, query_id)
        }
        BuildArgs::ChooseInviter {
            program,
            inviter,
            seq_no,
            invite,
        } => encoded(
            &ChooseInviter {
                program,
                inviter,
                seq_no,
                invite,
            },
            query_id,
        ),
        BuildArgs::AddReferal {
            program,
            seq_no,
            invite,
        } => encoded(
            &AddReferal {
                program,
                seq_no,
                invite,
            },
            query_id,
        ),
        BuildArgs::SetOwner { owner } => encoded(&SetOwner { owner }, query_id),
        BuildArgs::Withdraw { amount } => encoded(&Withdraw { amount }, query_id),
    }
}

/// Every representation of an address.
pub fn address_info(text: &str) -> Result<Value> {
    let address = Address::parse(text).with_context(|| format!("parsing address `{text}`"))?;
    let form = |bounceable, testnet| {
        address.to_friendly(FriendlyFlags {
            bounceable,
            testnet,
        })
    };
    Ok(json!({
        "workchain": address.workchain(),
        "raw": address.to_raw(),
        "bounceable": form(true, false),
        "non_bounceable": form(false, false),
        "testnet_bounceable": form(true, true),
        "testnet_non_bounceable": form(false, true),
    }))
}

/// Seed an in-memory matrix with `places` places and load it the way a
/// viewer on the owner's side would.
pub async fn demo_matrix(m: u8, places: u32, depth: usize) -> Result<Value> {
    let level = level(m)?;
    let owner = Address::new(0, [0x11; 32]);
    let chain = Arc::new(InMemoryChain::new());
    let root = chain
        .seed_matrix(owner, level, places)?
        .ok_or_else(|| anyhow!("a demo matrix needs at least one place"))?;

    let service = MatrixService::new(chain.clone(), chain.clone(), chain);
    let token = service.begin(Channel::Subtree);
    let tree = service
        .load_subtree(
            &token,
            SubtreeQuery {
                level,
                root,
                viewer: Some(owner),
                depth: Some(depth),
            },
        )
        .await?;
    let next = service.next_position(&token, level, root, owner).await?;

    Ok(json!({
        "root": root,
        "next_position": next.map(|n| n.position.get()),
        "tree": to_json(&tree)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new(0, [b; 32])
    }

    #[test]
    fn test_build_then_decode_message() {
        let args = BuildArgs::LockPos {
            level: 2,
            profile: addr(1),
            parent: addr(2),
            side: SideArg::Right,
        };
        let built = build_message(&args, 42).unwrap();
        assert_eq!(built["op"], "LockPos");

        let decoded = decode(DecodeKind::Message, built["base64"].as_str().unwrap()).unwrap();
        assert_eq!(decoded["op"], "LockPos");
        assert_eq!(decoded["query_id"], 42);
    }

    #[test]
    fn test_decode_rejects_wrong_kind() {
        let built = build_message(&BuildArgs::Withdraw { amount: 5 }, 0).unwrap();
        assert!(decode(DecodeKind::Place, built["hex"].as_str().unwrap()).is_err());
        assert!(decode(DecodeKind::Cell, built["hex"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_address_forms_agree() {
        let raw = addr(7).to_raw();
        let info = address_info(&raw).unwrap();
        assert_eq!(info["raw"], raw);
        let friendly = info["non_bounceable"].as_str().unwrap();
        assert_eq!(address_info(friendly).unwrap()["raw"], raw);
        assert!(address_info("not an address").is_err());
    }

    #[tokio::test]
    async fn test_demo_matrix() {
        let out = demo_matrix(1, 6, 2).await.unwrap();
        assert_eq!(out["next_position"], 7);
        assert_eq!(out["tree"]["kind"], "filled");
        assert!(demo_matrix(1, 0, 2).await.is_err());
    }
}
