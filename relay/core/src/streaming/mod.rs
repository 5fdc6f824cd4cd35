//! Streaming Consumption
//!
//! Drives one upstream completion stream through a [`ChunkBuffer`] and
//! forwards ready chunks to the caller.
//!
//! # Architecture
//!
//! ```text
//!  upstream deltas        StreamConsumer (one task)          caller
//! ┌──────────────┐   ┌──────────────────────────────┐   ┌──────────────┐
//! │ Completion   │──▶│ Deadline::bound(recv)        │   │ ChunkReceiver│
//! │ Stream       │   │   append ─▶ ChunkBuffer      │   │   .recv()    │
//! └──────────────┘   │   try_chunk loop ─▶ send ────┼──▶│              │
//!                    │ residual ─▶ send, End, close │   └──────────────┘
//!                    └──────────────────────────────┘
//! ```
//!
//! The consumer task is the only writer of its buffer and the only sender on
//! its channel. The channel holds at most one event, so a slow caller slows
//! down upstream reads.
//!
//! [`ChunkBuffer`]: crate::chunk::ChunkBuffer

mod channel;
mod consumer;
mod deadline;

pub use channel::{chunk_channel, ChunkEvent, ChunkReceiver, ChunkSender, ReceiverDropped};
pub use consumer::{ConsumerReport, ConsumerStats, Outcome, StreamConsumer};
pub use deadline::Deadline;
