#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod animation;
mod common;
mod config;
pub mod domain;
mod effects;
mod interaction;
pub mod reconcile;
mod store;
#[cfg(feature = "std")]
pub mod client_node;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod poller;
#[cfg(feature = "std")]
pub mod protocol;
#[cfg(feature = "std")]
pub mod skeleton;
#[cfg(feature = "std")]
pub mod stub;
#[cfg(feature = "std")]
pub mod submission;
#[cfg(feature = "std")]
pub mod transport;
#[cfg(feature = "std")]
pub mod ui;

pub use animation::*;
pub use common::*;
pub use config::*;
pub use domain::*;
pub use effects::*;
pub use interaction::*;
pub use reconcile::*;
pub use store::*;
#[cfg(feature = "std")]
pub use client_node::*;
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use poller::*;
#[cfg(feature = "std")]
pub use protocol::*;
#[cfg(feature = "std")]
pub use skeleton::*;
#[cfg(feature = "std")]
pub use stub::*;
#[cfg(feature = "std")]
pub use submission::*;
#[cfg(feature = "std")]
pub use transport::{in_memory::InMemoryTransport, tcp::TcpTransport, Transport};
#[cfg(feature = "std")]
pub use ui::*;
